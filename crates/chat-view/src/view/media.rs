//! Out-of-band media URLs rendered by file extension

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use url::Url;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "svg", "webp", "bmp"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "ogg", "oga", "opus", "wav", "flac"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mkv", "mov", "ogv"];

/// What kind of player a URL gets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Audio,
    Video,
    File,
}

impl MediaKind {
    /// Unparsable URLs are plain file links
    pub fn of(url: &str) -> Self {
        let Some(ext) = Url::parse(url).ok().as_ref().and_then(extension) else {
            return Self::File;
        };
        let ext = ext.as_str();
        if IMAGE_EXTENSIONS.contains(&ext) {
            Self::Image
        } else if AUDIO_EXTENSIONS.contains(&ext) {
            Self::Audio
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            Self::Video
        } else {
            Self::File
        }
    }
}

/// Last non-empty path segment; query and fragment are not part of the path
fn last_segment(url: &Url) -> Option<&str> {
    url.path_segments()?.rev().find(|s| !s.is_empty())
}

/// Lowercased extension of the last path segment
fn extension(url: &Url) -> Option<String> {
    let name = url.path_segments()?.next_back()?;
    let (_, ext) = name.rsplit_once('.')?;
    (!ext.is_empty()).then(|| ext.to_ascii_lowercase())
}

/// Label of a download link, the whole URL when it has no path
fn file_name(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| last_segment(&parsed).map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

/// Markup for an OOB URL
pub fn render(url: &str, show_images_inline: bool) -> String {
    let href = attr(url);
    match MediaKind::of(url) {
        MediaKind::Image if show_images_inline => format!(
            r#"<a href="{href}" class="chat-image__link" target="_blank" rel="noopener"><img class="chat-image img-thumbnail" src="{href}"/></a>"#
        ),
        MediaKind::Audio => format!(r#"<audio controls src="{href}"></audio>"#),
        MediaKind::Video => {
            format!(r#"<video controls preload="metadata" src="{href}"></video>"#)
        }
        MediaKind::Image | MediaKind::File => format!(
            r#"<a target="_blank" rel="noopener" href="{href}">Download file "{name}"</a>"#,
            name = text(&file_name(url))
        ),
    }
}
