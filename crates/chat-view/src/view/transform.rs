//! Body text transform pipeline
//!
//! before hooks → strip `/me ` → mention markup → geo URIs, hyperlinks and
//! escaping of the plain text in between → line breaks → after hooks

use std::sync::{Arc, LazyLock};

use chat_common::ViewConfig;
use chat_core::{BodyHook, Message, Reference, ME_COMMAND};
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use linkify::{LinkFinder, LinkKind};
use regex::Regex;

static GEO_URI: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"geo:([\-0-9.]+),([\-0-9.]+)(?:,[\-0-9.]+)?(?:\?[^\s]*)?").ok()
});

/// Turns raw body text into safe markup
#[derive(Clone)]
pub struct BodyTransformer {
    geouri_replacement: String,
    hooks: Vec<Arc<dyn BodyHook>>,
}

impl std::fmt::Debug for BodyTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BodyTransformer")
            .field("geouri_replacement", &self.geouri_replacement)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

impl BodyTransformer {
    pub fn new(config: &ViewConfig) -> Self {
        Self {
            geouri_replacement: config.geouri_replacement.clone(),
            hooks: Vec::new(),
        }
    }

    pub fn with_hook(mut self, hook: Arc<dyn BodyHook>) -> Self {
        self.add_hook(hook);
        self
    }

    /// Hooks run in registration order
    pub fn add_hook(&mut self, hook: Arc<dyn BodyHook>) {
        self.hooks.push(hook);
    }

    pub async fn transform(&self, message: &Message, raw: &str) -> String {
        let mut body = raw.to_string();
        for hook in &self.hooks {
            body = hook.before_transform(message, body).await;
        }

        let (body, offset) = match body.strip_prefix(ME_COMMAND) {
            Some(rest) if message.is_me_command() => (rest, ME_COMMAND.chars().count()),
            _ => (body.as_str(), 0),
        };

        let mut html = self.markup(body, &message.references, offset);
        html = html.replace('\n', "<br/>");

        for hook in &self.hooks {
            html = hook.after_transform(message, html).await;
        }
        html
    }

    /// Mention spans from references, everything else through [`Self::plain`]
    fn markup(&self, body: &str, references: &[Reference], offset: usize) -> String {
        let mut refs: Vec<&Reference> = references
            .iter()
            .filter(|r| r.begin >= offset && r.end > r.begin)
            .collect();
        refs.sort_by_key(|r| r.begin);

        let mut out = String::with_capacity(body.len());
        let mut cursor = 0;
        for reference in refs {
            let (Some(start), Some(end)) = (
                reference
                    .begin
                    .checked_sub(offset)
                    .and_then(|begin| byte_offset(body, begin)),
                reference
                    .end
                    .checked_sub(offset)
                    .and_then(|end| byte_offset(body, end)),
            ) else {
                continue;
            };
            if start < cursor || start >= end {
                continue;
            }
            out.push_str(&self.plain(&body[cursor..start]));
            out.push_str(&format!(
                r#"<span class="mention" data-uri="{}">{}</span>"#,
                attr(&reference.uri),
                text(&body[start..end])
            ));
            cursor = end;
        }
        out.push_str(&self.plain(&body[cursor..]));
        out
    }

    /// Geo URIs and hyperlinks in escaped plain text
    fn plain(&self, segment: &str) -> String {
        if segment.is_empty() {
            return String::new();
        }
        let segment = match GEO_URI.as_ref() {
            Some(re) => re.replace_all(segment, self.geouri_replacement.as_str()),
            None => segment.into(),
        };

        let finder = LinkFinder::new();
        let mut out = String::with_capacity(segment.len());
        for span in finder.spans(&segment) {
            let s = span.as_str();
            match span.kind() {
                Some(LinkKind::Url) => out.push_str(&format!(
                    r#"<a target="_blank" rel="noopener" href="{}">{}</a>"#,
                    attr(s),
                    text(s)
                )),
                Some(LinkKind::Email) => out.push_str(&format!(
                    r#"<a href="mailto:{}">{}</a>"#,
                    attr(s),
                    text(s)
                )),
                _ => out.push_str(&text(s)),
            }
        }
        out
    }
}

/// Byte offset of the `chars`-th character; the length when it is one past the end
fn byte_offset(s: &str, chars: usize) -> Option<usize> {
    s.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(s.len()))
        .nth(chars)
}
