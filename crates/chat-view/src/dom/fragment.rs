//! Rendered message fragments

use std::collections::BTreeMap;

use html_escape::encode_double_quoted_attribute;

/// Which template produced a fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    Chat,
    Info,
    Error,
    ChatState,
    FileProgress,
    Spinner,
}

impl FragmentKind {
    /// Only chat messages carry a reaction container
    #[inline]
    pub fn accepts_reactions(self) -> bool {
        matches!(self, Self::Chat)
    }
}

/// The element rendered for one message: root classes, attributes and inner markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    kind: FragmentKind,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    html: String,
}

impl Fragment {
    pub fn new(kind: FragmentKind, html: impl Into<String>) -> Self {
        Self {
            kind,
            classes: Vec::new(),
            attributes: BTreeMap::new(),
            html: html.into(),
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.add_class(class);
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn kind(&self) -> FragmentKind {
        self.kind
    }

    pub fn accepts_reactions(&self) -> bool {
        self.kind.accepts_reactions()
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn set_html(&mut self, html: impl Into<String>) {
        self.html = html.into();
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: impl Into<String>) {
        let class = class.into();
        if !class.is_empty() && !self.has_class(&class) {
            self.classes.push(class);
        }
    }

    pub fn remove_class(&mut self, class: &str) {
        self.classes.retain(|c| c != class);
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Opening tag attributes: class list followed by the sorted attributes
    pub(crate) fn open_tag_attributes(&self) -> String {
        let mut out = format!(
            r#"class="{}""#,
            encode_double_quoted_attribute(&self.classes.join(" "))
        );
        for (name, value) in &self.attributes {
            out.push_str(&format!(
                r#" {name}="{}""#,
                encode_double_quoted_attribute(value)
            ));
        }
        out
    }
}
