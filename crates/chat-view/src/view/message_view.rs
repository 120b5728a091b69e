//! Message view - renders one message record and routes its changes

use chat_common::ViewConfig;
use chat_core::{ChangedFields, Message, MessageId, MessageType, ReactionEvent, Sender};
use chrono::Utc;
use tracing::instrument;

use super::kind::MessageKind;
use super::media;
use super::templates::{self, ChatParts};
use super::transform::BodyTransformer;
use crate::dom::Fragment;
use crate::error::ViewResult;

/// Shared inputs for rendering
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub config: &'a ViewConfig,
    pub transformer: &'a BodyTransformer,
    /// Our own nickname, for mention highlighting
    pub nickname: Option<&'a str>,
}

/// What a render produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Fragment(Fragment),
    /// The record is a reaction and belongs in its target's badges
    Reaction(ReactionEvent),
    /// Nothing to show; the current element stays as it is
    Nothing,
}

/// How much of a changed message to redraw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderScope {
    Skip,
    /// Only the upload progress bar
    Progress,
    Full,
}

/// Reaction to a change notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeAction {
    pub render: RenderScope,
    /// Flash the edited marker
    pub highlight: bool,
}

/// View over one message record
#[derive(Debug, Clone)]
pub struct MessageView {
    model: Message,
}

impl MessageView {
    pub fn new(model: Message) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &Message {
        &self.model
    }

    pub fn set_model(&mut self, model: Message) {
        self.model = model;
    }

    pub fn msgid(&self) -> &MessageId {
        &self.model.msgid
    }

    pub fn kind(&self) -> MessageKind {
        MessageKind::classify(&self.model)
    }

    #[instrument(skip_all, fields(msgid = %self.model.msgid))]
    pub async fn render(&self, ctx: &RenderContext<'_>) -> ViewResult<Rendered> {
        let rendered = match self.kind() {
            MessageKind::ChatState(state) => templates::chat_state(&self.model, state, Utc::now())
                .map_or(Rendered::Nothing, Rendered::Fragment),
            MessageKind::FileUpload => Rendered::Fragment(templates::file_progress(&self.model)?),
            MessageKind::Error => Rendered::Fragment(templates::error(&self.model)),
            MessageKind::Info => Rendered::Fragment(templates::info(&self.model)),
            MessageKind::Reaction(event) => Rendered::Reaction(event),
            MessageKind::Chat => Rendered::Fragment(self.render_chat_message(ctx).await),
        };
        Ok(rendered)
    }

    /// Redraw just the upload progress bar
    pub fn render_progress(&self) -> ViewResult<Fragment> {
        Ok(templates::file_progress(&self.model)?)
    }

    /// Decide what a change notification requires
    pub fn on_changed(&self, changed: ChangedFields) -> ChangeAction {
        if changed.contains(ChangedFields::PROGRESS) {
            return ChangeAction {
                render: RenderScope::Progress,
                highlight: false,
            };
        }
        let render = if changed.needs_render() {
            RenderScope::Full
        } else {
            RenderScope::Skip
        };
        ChangeAction {
            render,
            highlight: changed.contains(ChangedFields::EDITED) && !self.model.is_archived,
        }
    }

    async fn render_chat_message(&self, ctx: &RenderContext<'_>) -> Fragment {
        let url = self.model.oob_url.as_deref();
        let media = url.map(|u| media::render(u, ctx.config.show_images_inline));

        let body = match self.model.text() {
            Some(text) if Some(text) != url => {
                Some(ctx.transformer.transform(&self.model, text).await)
            }
            _ => None,
        };

        templates::chat_message(
            &self.model,
            ChatParts {
                pretty_time: templates::pretty_time(&self.model.time, &ctx.config.time_format),
                body,
                media,
                extra_classes: self.extra_classes(ctx.nickname),
            },
        )
    }

    fn extra_classes(&self, nickname: Option<&str>) -> Vec<String> {
        let mut classes = Vec::new();
        if self.model.is_delayed {
            classes.push("delayed".to_string());
        }
        if self.model.msg_type == MessageType::Groupchat {
            if let Some(occupant) = &self.model.occupant {
                classes.extend(occupant.role.iter().cloned());
                classes.extend(occupant.affiliation.iter().cloned());
            }
            let mentioned = nickname.is_some_and(|nick| self.model.mentions(nick));
            if self.model.sender == Sender::Them && mentioned {
                classes.push("mentioned".to_string());
            }
        }
        if self.model.correcting {
            classes.push("correcting".to_string());
        }
        classes
    }
}
