//! End-to-end message rendering tests
//!
//! Run with: `cargo test -p integration-tests --test view_tests`

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chat_common::{ReactionConfig, ViewConfig};
use chat_core::{BodyHook, ChangedFields, ChatState, Message, MessageEvent, MessageId, MessageType, Reference};
use chat_view::{ChatView, FragmentKind};
use integration_tests::*;

fn kind_of(t: &TestView, msgid: &MessageId) -> Option<FragmentKind> {
    t.view.document().fragment(msgid).map(|f| f.kind())
}

fn has_class(t: &TestView, msgid: &MessageId, class: &str) -> bool {
    t.view
        .document()
        .fragment(msgid)
        .is_some_and(|f| f.has_class(class))
}

// ============================================================================
// Message kinds
// ============================================================================

#[tokio::test]
async fn test_each_kind_renders_its_fragment() {
    let mut t = TestView::new();

    let plain = t.add(chat(ALICE, "hello")).await;
    let info = t.add(notice(MessageType::Info, "Bob joined")).await;
    let error = t.add(notice(MessageType::Error, "Delivery failed")).await;
    let file = t.add(upload(ALICE, "cat.png", 1536)).await;
    let mut typing = chat(BOB, "");
    typing.chat_state = Some(ChatState::Composing);
    let typing = t.add(typing).await;

    assert_eq!(kind_of(&t, &plain), Some(FragmentKind::Chat));
    assert_eq!(kind_of(&t, &info), Some(FragmentKind::Info));
    assert_eq!(kind_of(&t, &error), Some(FragmentKind::Error));
    assert_eq!(kind_of(&t, &file), Some(FragmentKind::FileProgress));
    assert_eq!(kind_of(&t, &typing), Some(FragmentKind::ChatState));

    let html = t.view.document().node_html(&file).expect("upload attached");
    assert!(html.contains("<strong>cat.png</strong>, 1.5 KB"));
    let html = t.view.document().node_html(&typing).expect("state attached");
    assert!(html.contains("bob@example.org is typing"));
}

#[tokio::test]
async fn test_only_chat_messages_accept_reactions() {
    let mut t = TestView::sweep_only();
    let info = t.add(notice(MessageType::Info, "Bob joined")).await;

    t.react(ALICE, "👍", &info).await;
    assert!(t.tally(&info).is_empty());
    assert_eq!(t.pending(), 1);
}

#[tokio::test]
async fn test_inactive_chat_state_shows_nothing() {
    let mut t = TestView::new();
    let mut msg = chat(BOB, "");
    msg.chat_state = Some(ChatState::Active);
    let msgid = t.add(msg).await;
    assert!(!t.view.document().contains(&msgid));
}

#[tokio::test]
async fn test_upload_without_file_data_is_skipped() {
    let mut t = TestView::new();
    let mut msg = chat(ALICE, "");
    msg.file = true;
    let msgid = t.add(msg).await;

    assert!(!t.view.document().contains(&msgid));
    assert!(t.view.message(&msgid).is_some());
}

#[tokio::test]
async fn test_message_without_id_is_rejected() {
    let mut t = TestView::new();
    let err = t
        .view
        .apply(added(chat_with_id("", ALICE, "hi")))
        .await
        .unwrap_err();
    assert!(err.is_malformed());
}

#[tokio::test]
async fn test_change_to_unknown_message_fails() {
    let mut t = TestView::new();
    let err = t
        .change(chat(ALICE, "hi"), ChangedFields::MESSAGE)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

// ============================================================================
// Body transformation
// ============================================================================

#[tokio::test]
async fn test_body_is_escaped_and_linkified() {
    let mut t = TestView::new();
    let msgid = t
        .add(chat(ALICE, "<b>see</b> https://example.org/a?b=1\nbye"))
        .await;

    let html = t.view.document().node_html(&msgid).expect("attached");
    assert!(html.contains("&lt;b&gt;see&lt;/b&gt;"));
    assert!(html.contains(r#"<a target="_blank" rel="noopener" href="https://example.org/a?b=1">"#));
    assert!(html.contains("<br/>bye"));
}

#[tokio::test]
async fn test_me_command_renders_as_action() {
    let mut t = TestView::new();
    let msgid = t.add(chat(ALICE, "/me waves")).await;

    assert!(has_class(&t, &msgid, "chat-msg--action"));
    let html = t.view.document().node_html(&msgid).expect("attached");
    assert!(html.contains("**alice@example.org"));
    assert!(html.contains(r#"<div class="chat-msg__text">waves</div>"#));
}

#[tokio::test]
async fn test_groupchat_mention_is_highlighted() {
    let mut t = TestView {
        view: ChatView::new(test_view_config(), &ReactionConfig::default()).with_nickname("me"),
    };
    let mut msg = groupchat("bob", "hi @me");
    msg.references = vec![Reference {
        begin: 3,
        end: 6,
        uri: format!("xmpp:{ROOM}/me"),
    }];
    let msgid = t.add(msg).await;

    assert!(has_class(&t, &msgid, "mentioned"));
    let html = t.view.document().node_html(&msgid).expect("attached");
    assert!(html.contains(r#"<span class="mention" data-uri="xmpp:room@conference.example.org/me">@me</span>"#));
}

struct Shout;

#[async_trait]
impl BodyHook for Shout {
    async fn before_transform(&self, _message: &Message, text: String) -> String {
        text.to_uppercase()
    }

    async fn after_transform(&self, _message: &Message, html: String) -> String {
        format!("{html}!")
    }
}

#[tokio::test]
async fn test_hooks_wrap_the_transform() {
    let mut t = TestView {
        view: ChatView::new(test_view_config(), &ReactionConfig::default()).with_hook(Arc::new(Shout)),
    };
    let msgid = t.add(chat(ALICE, "quiet <please>")).await;

    let html = t.view.document().node_html(&msgid).expect("attached");
    assert!(html.contains(r#"<div class="chat-msg__text">QUIET &lt;PLEASE&gt;!</div>"#));
}

// ============================================================================
// Grouping and change handling
// ============================================================================

#[tokio::test]
async fn test_consecutive_messages_are_grouped() {
    let mut t = TestView::new();
    let first = t.add(chat(ALICE, "one")).await;
    let second = t.add(chat(ALICE, "two")).await;
    let other = t.add(chat(BOB, "three")).await;
    let again = t.add(chat(ALICE, "four")).await;

    assert!(!has_class(&t, &first, "chat-msg--followup"));
    assert!(has_class(&t, &second, "chat-msg--followup"));
    assert!(!has_class(&t, &other, "chat-msg--followup"));
    assert!(!has_class(&t, &again, "chat-msg--followup"));
}

#[tokio::test]
async fn test_messages_far_apart_are_not_grouped() {
    let mut t = TestView::new();
    let mut early = chat(ALICE, "morning");
    early.time -= chrono::Duration::minutes(30);
    t.add(early).await;
    let later = t.add(chat(ALICE, "afternoon")).await;

    assert!(!has_class(&t, &later, "chat-msg--followup"));
}

#[tokio::test]
async fn test_edit_keeps_grouping_and_highlights() {
    let mut t = TestView::new();
    t.add(chat(ALICE, "one")).await;
    let mut second = chat(ALICE, "tow");
    let msgid = t.add(second.clone()).await;

    second.message = Some("two".to_string());
    second.edited = true;
    t.change(second, ChangedFields::MESSAGE | ChangedFields::EDITED)
        .await
        .expect("edit");

    assert!(has_class(&t, &msgid, "chat-msg--followup"));
    assert!(has_class(&t, &msgid, "onload"));
    let html = t.view.document().node_html(&msgid).expect("attached");
    assert!(html.contains("chat-msg__edit-modal"));
}

#[tokio::test]
async fn test_archived_edit_is_not_highlighted() {
    let mut t = TestView::new();
    let mut msg = chat(ALICE, "tow");
    msg.is_archived = true;
    let msgid = t.add(msg.clone()).await;

    msg.message = Some("two".to_string());
    t.change(msg, ChangedFields::MESSAGE | ChangedFields::EDITED)
        .await
        .expect("edit");
    assert!(!has_class(&t, &msgid, "onload"));
}

#[tokio::test]
async fn test_upload_progress_then_completion() {
    let mut t = TestView::new();
    let mut msg = upload(ALICE, "cat.png", 2048);
    let msgid = t.add(msg.clone()).await;

    msg.progress = 0.5;
    t.change(msg.clone(), ChangedFields::PROGRESS).await.expect("progress");
    let html = t.view.document().node_html(&msgid).expect("attached");
    assert!(html.contains(r#"<progress value="0.5">"#));

    msg.oob_url = Some("https://example.org/cat.png".to_string());
    msg.message = msg.oob_url.clone();
    t.change(msg, ChangedFields::UPLOAD | ChangedFields::OOB_URL)
        .await
        .expect("uploaded");
    assert_eq!(kind_of(&t, &msgid), Some(FragmentKind::Chat));
    let html = t.view.document().node_html(&msgid).expect("attached");
    assert!(html.contains(r#"<img class="chat-image img-thumbnail" src="https://example.org/cat.png"/>"#));
}

#[tokio::test]
async fn test_unrelated_change_does_not_rerender() {
    let mut t = TestView::new();
    let mut msg = chat(ALICE, "hi");
    let msgid = t.add(msg.clone()).await;
    let before = t.view.document().node_html(&msgid);

    msg.message = Some("changed behind our back".to_string());
    t.change(msg, ChangedFields::CHAT_STATE).await.expect("change");
    assert_eq!(t.view.document().node_html(&msgid), before);
}

// ============================================================================
// Retry and removal
// ============================================================================

#[tokio::test]
async fn test_successful_retry_removes_message() {
    let mut t = TestView::new();
    let msgid = t.add(notice(MessageType::Error, "Delivery failed")).await;

    t.view
        .retry(&msgid, async { Ok::<(), String>(()) })
        .await
        .expect("retry succeeds");
    assert!(!t.view.document().contains(&msgid));
    assert!(t.view.message(&msgid).is_none());
}

#[tokio::test]
async fn test_failed_retry_restores_message() {
    let mut t = TestView::new();
    let msgid = t.add(notice(MessageType::Error, "Delivery failed")).await;

    let err = t
        .view
        .retry(&msgid, async { Err::<(), _>("still offline") })
        .await
        .unwrap_err();
    assert_eq!(err.code(), "RETRY_FAILED");
    assert_eq!(kind_of(&t, &msgid), Some(FragmentKind::Error));
}

#[tokio::test(start_paused = true)]
async fn test_destroyed_message_fades_out() {
    let config = ViewConfig {
        animate: true,
        fade_out_ms: 600,
        ..ViewConfig::default()
    };
    let mut t = TestView::with_config(config, ReactionConfig::default());
    let msgid = t.add(chat(ALICE, "bye")).await;

    t.destroy(&msgid).await.expect("destroy");
    assert!(has_class(&t, &msgid, "fade-out"));

    tokio::time::advance(Duration::from_millis(300)).await;
    t.view.sweep();
    assert!(t.view.document().contains(&msgid));

    tokio::time::advance(Duration::from_millis(400)).await;
    t.view.sweep();
    assert!(!t.view.document().contains(&msgid));
}

// ============================================================================
// Event stream
// ============================================================================

#[tokio::test]
async fn test_json_event_stream() {
    let lines = [
        r#"{"type":"MESSAGE_ADDED","message":{"msgid":"m1","from":"carol@example.org/desk","jid":"carol@example.org","message":"lunch?"}}"#,
        r#"{"type":"MESSAGE_ADDED","message":{"msgid":"r1","from":"alice@example.org/laptop","jid":"alice@example.org","message":"👍","reactsTo":"m1"}}"#,
        r#"{"type":"MESSAGE_ADDED","message":{"msgid":"r2","from":"bob@example.org/phone","jid":"bob@example.org","message":"👍","reacts_to":"m1"}}"#,
        r#"{"type":"MESSAGE_CHANGED","message":{"msgid":"m1","from":"carol@example.org/desk","jid":"carol@example.org","message":"lunch at noon?","edited":true},"changed":["message","edited","unknown"]}"#,
        r#"{"type":"MESSAGE_DESTROYED","msgid":"r1"}"#,
    ];

    let mut t = TestView::new();
    for line in lines {
        let event: MessageEvent = serde_json::from_str(line).expect("valid event");
        t.view.apply(event).await.expect("applied");
    }

    let m1 = MessageId::new("m1");
    let thumbs = t.badge(&m1, "👍").expect("badge");
    assert_eq!(thumbs.count, 1);
    assert_eq!(thumbs.reaction_ids, vec![MessageId::new("r2")]);

    let html = t.view.to_html();
    assert!(html.starts_with(r#"<div class="chat-content">"#));
    assert!(html.contains("lunch at noon?"));

    let tallies = t.view.tallies();
    assert_eq!(tallies.len(), 1);
    let json = serde_json::to_value(&tallies[0].1).expect("serializable");
    assert_eq!(json[0]["label"], "👍");
    assert_eq!(json[0]["count"], 1);
}
