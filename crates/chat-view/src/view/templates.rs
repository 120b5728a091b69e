//! Fragment templates for each message kind

use std::fmt::Write as _;

use chat_core::{ChatState, DomainError, Message, MessageType, Sender};
use chrono::{DateTime, SecondsFormat, Utc};
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use crate::dom::{Fragment, FragmentKind};

/// Class of a message that continues the previous sender's run
pub const FOLLOWUP_CLASS: &str = "chat-msg--followup";
/// Class flashed on a message after it was edited
pub const HIGHLIGHT_CLASS: &str = "onload";

const FALLBACK_TIME_FORMAT: &str = "%H:%M";

/// ISO 8601 timestamp with millisecond precision
pub fn iso_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Format `time` with a strftime pattern, falling back to `%H:%M` on a bad pattern
pub fn pretty_time(time: &DateTime<Utc>, format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", time.format(format)).is_err() {
        out = time.format(FALLBACK_TIME_FORMAT).to_string();
    }
    out
}

/// Human readable file size, binary units
pub fn filesize(bytes: u64) -> String {
    const UNITS: [&str; 7] = ["B", "KB", "MB", "GB", "TB", "PB", "EB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        return format!("{bytes} B");
    }
    let rounded = format!("{value:.2}");
    let rounded = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{rounded} {}", UNITS[unit])
}

/// Typing indicator text, or `None` for states that show nothing
pub fn chat_state(message: &Message, state: ChatState, now: DateTime<Utc>) -> Option<Fragment> {
    let name = message.display_name();
    let own_device = message.sender == Sender::Me;
    let line = match state {
        ChatState::Composing if own_device => "Typing from another device".to_string(),
        ChatState::Composing => format!("{name} is typing"),
        ChatState::Paused if own_device => "Stopped typing on the other device".to_string(),
        ChatState::Paused => format!("{name} has stopped typing"),
        ChatState::Gone => format!("{name} has gone away"),
        ChatState::Active | ChatState::Inactive => return None,
    };

    Some(
        Fragment::new(FragmentKind::ChatState, text(&line))
            .with_class("message")
            .with_class("chat-info")
            .with_class("chat-state-notification")
            .with_attribute("data-csn", message.from.as_str())
            .with_attribute("data-isodate", iso_time(&now)),
    )
}

/// Upload progress bar
pub fn file_progress(message: &Message) -> Result<Fragment, DomainError> {
    let upload = message
        .upload
        .as_ref()
        .ok_or_else(|| DomainError::MissingFileData(message.msgid.clone()))?;

    let html = format!(
        r#"<div class="chat-msg__content"><span class="chat-msg__text">Uploading file: <strong>{name}</strong>, {size}</span><progress value="{progress}"></progress></div>"#,
        name = text(&upload.name),
        size = filesize(upload.size),
        progress = message.progress.clamp(0.0, 1.0),
    );

    Ok(Fragment::new(FragmentKind::FileProgress, html)
        .with_class("message")
        .with_class("chat-msg")
        .with_attribute("data-isodate", iso_time(&message.time)))
}

/// Informational notice
pub fn info(message: &Message) -> Fragment {
    notice(message, FragmentKind::Info, "chat-info")
}

/// Error notice
pub fn error(message: &Message) -> Fragment {
    notice(message, FragmentKind::Error, "chat-error")
}

fn notice(message: &Message, kind: FragmentKind, class: &str) -> Fragment {
    let body = message.text().unwrap_or_default();
    Fragment::new(kind, text(body))
        .with_class("message")
        .with_class("chat-info")
        .with_class(class)
        .with_attribute("data-isodate", iso_time(&message.time))
}

/// Placeholder shown while a retry runs
pub fn spinner() -> Fragment {
    Fragment::new(
        FragmentKind::Spinner,
        r#"<span class="spinner fa fa-spinner centered"></span>"#,
    )
    .with_class("message")
}

/// Pieces of a chat message computed by the view
#[derive(Debug, Clone, Default)]
pub struct ChatParts {
    pub pretty_time: String,
    /// Transformed body markup
    pub body: Option<String>,
    /// OOB media markup
    pub media: Option<String>,
    pub extra_classes: Vec<String>,
}

/// Regular chat message
pub fn chat_message(message: &Message, parts: ChatParts) -> Fragment {
    let is_me_message = message.is_me_command();
    let edited = if message.edited {
        r#"<i class="fa fa-edit chat-msg__edit-modal" title="This message has been edited"></i>"#
    } else {
        ""
    };
    let content_class = if is_me_message {
        "chat-msg__content chat-msg__content--me"
    } else {
        "chat-msg__content"
    };
    let author = if is_me_message {
        format!("**{}", message.display_name())
    } else {
        message.display_name().to_string()
    };

    let html = format!(
        concat!(
            r#"<div class="{content_class}">"#,
            r#"<span class="chat-msg__heading"><span class="chat-msg__author">{author}</span> "#,
            r#"<time timestamp="{iso}" class="chat-msg__time">{pretty}</time>{edited}</span>"#,
            r#"<div class="chat-msg__body"><div class="chat-msg__message">"#,
            r#"<div class="chat-msg__text">{body}</div><div class="chat-msg__media">{media}</div>"#,
            "</div></div></div>",
        ),
        content_class = content_class,
        author = text(&author),
        iso = attr(&iso_time(&message.time)),
        pretty = text(&parts.pretty_time),
        edited = edited,
        body = parts.body.unwrap_or_default(),
        media = parts.media.unwrap_or_default(),
    );

    let mut fragment = Fragment::new(FragmentKind::Chat, html)
        .with_class("message")
        .with_class("chat-msg")
        .with_class(type_class(message.msg_type))
        .with_attribute("data-isodate", iso_time(&message.time))
        .with_attribute("data-from", message.from.as_str());
    if is_me_message {
        fragment.add_class("chat-msg--action");
    }
    for class in parts.extra_classes {
        fragment.add_class(class);
    }
    fragment
}

fn type_class(msg_type: MessageType) -> &'static str {
    match msg_type {
        MessageType::Chat => "chat",
        MessageType::Groupchat => "groupchat",
        MessageType::Headline => "headline",
        MessageType::Normal => "normal",
        MessageType::Error => "error",
        MessageType::Info => "info",
    }
}
