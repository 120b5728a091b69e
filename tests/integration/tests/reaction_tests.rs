//! End-to-end reaction aggregation tests
//!
//! Run with: `cargo test -p integration-tests --test reaction_tests`

use std::sync::Arc;
use std::time::Duration;

use chat_core::{ChangedFields, Jid, MessageType, ReactionEvent};
use chat_view::{ReconcileOutcome, ReconciliationScheduler, TOMBSTONE_CAPACITY};
use integration_tests::*;
use tokio::sync::{watch, Mutex};

// ============================================================================
// Aggregation
// ============================================================================

#[tokio::test]
async fn test_reaction_scenario() {
    let mut t = TestView::new();
    let m1 = t.add(chat(CAROL, "lunch?")).await;

    t.react(ALICE, "👍", &m1).await;
    let tally = t.tally(&m1);
    assert_eq!(tally.len(), 1);
    assert_eq!(tally[0].label, "👍");
    assert_eq!(tally[0].count, 1);
    assert_eq!(tally[0].users, vec![Jid::new(ALICE)]);

    t.react(BOB, "👍", &m1).await;
    let thumbs = t.badge(&m1, "👍").expect("thumbs badge");
    assert_eq!(thumbs.count, 2);
    assert_eq!(thumbs.users, vec![Jid::new(ALICE), Jid::new(BOB)]);

    t.react(ALICE, "🎉", &m1).await;
    let tally = t.tally(&m1);
    assert_eq!(tally.len(), 2);
    assert_eq!(tally[0].label, "👍");
    assert_eq!(tally[0].users, vec![Jid::new(BOB)]);
    assert_eq!(tally[1].label, "🎉");
    assert_eq!(tally[1].users, vec![Jid::new(ALICE)]);

    t.react(ALICE, "🎉", &m1).await;
    assert!(t.badge(&m1, "🎉").is_none());
    assert_eq!(t.count(&m1, "👍"), 1);
    t.assert_consistent();
}

#[tokio::test]
async fn test_badges_render_into_message_markup() {
    let mut t = TestView::new();
    let m1 = t.add(chat(CAROL, "hi")).await;
    let r1 = t.react(ALICE, "👍", &m1).await;

    let html = t.view.document().node_html(&m1).expect("m1 attached");
    assert!(html.contains(r#"<div class="chat-msg__reacts">"#));
    assert!(html.contains(&format!(r#"data-reactionid="{r1}""#)));
    assert!(html.contains(&format!(r#"data-reactusers="{ALICE}">1</span>"#)));
}

#[tokio::test]
async fn test_replayed_reaction_is_idempotent() {
    let mut t = TestView::new();
    let m1 = t.add(chat(CAROL, "hi")).await;
    let record = reaction(ALICE, "👍", &m1);
    let event = ReactionEvent::try_from(&record).expect("valid reaction");

    t.add(record.clone()).await;
    t.add(record).await;
    assert_eq!(t.view.render_reaction(&event), ReconcileOutcome::Duplicate);
    assert_eq!(t.view.render_reaction(&event), ReconcileOutcome::Duplicate);

    assert_eq!(t.count(&m1, "👍"), 1);
    assert_eq!(t.view.reactions().len(), 1);
}

#[tokio::test]
async fn test_one_label_per_user() {
    let mut t = TestView::new();
    let m1 = t.add(chat(CAROL, "hi")).await;

    t.react(ALICE, "👍", &m1).await;
    t.react(ALICE, "🎉", &m1).await;
    t.react(ALICE, "❤️", &m1).await;

    assert_eq!(t.labels_of(&m1, ALICE), vec!["❤️".to_string()]);
    assert_eq!(t.tally(&m1).len(), 1);
}

#[tokio::test]
async fn test_reactions_on_different_messages_are_independent() {
    let mut t = TestView::new();
    let m1 = t.add(chat(CAROL, "one")).await;
    let m2 = t.add(chat(CAROL, "two")).await;

    t.react(ALICE, "👍", &m1).await;
    t.react(ALICE, "🎉", &m2).await;

    assert_eq!(t.labels_of(&m1, ALICE), vec!["👍".to_string()]);
    assert_eq!(t.labels_of(&m2, ALICE), vec!["🎉".to_string()]);
}

#[tokio::test]
async fn test_toggle_round_trip() {
    let mut t = TestView::new();
    let m1 = t.add(chat(CAROL, "hi")).await;

    let first = t.react(ALICE, "👍", &m1).await;
    let second = t.react(ALICE, "👍", &m1).await;
    assert!(t.tally(&m1).is_empty());
    for id in [&first, &second] {
        let record = t.view.reactions().find(id).expect("record kept");
        assert!(record.removed);
        assert!(!record.rendered);
    }

    // Retracted records stay retracted when replayed
    let replay = ReactionEvent::try_from(&reaction_with_id(
        first.as_str(),
        ALICE,
        "👍",
        m1.as_str(),
    ))
    .expect("valid reaction");
    assert_eq!(t.view.render_reaction(&replay), ReconcileOutcome::Stale);
    assert!(t.tally(&m1).is_empty());

    t.react(ALICE, "👍", &m1).await;
    assert_eq!(t.count(&m1, "👍"), 1);
}

#[tokio::test]
async fn test_counter_matches_contributors_under_churn() {
    const USERS: [&str; 3] = [ALICE, BOB, CAROL];
    const LABELS: [&str; 3] = ["👍", "🎉", "❤️"];

    let mut t = TestView::new();
    let targets = [
        t.add(chat(ALICE, "one")).await,
        t.add(chat(BOB, "two")).await,
    ];

    // Deterministic pseudo-random walk over (user, label, target)
    let mut state: u32 = 7;
    for _ in 0..60 {
        state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let pick = (state >> 16) as usize;
        let user = USERS[pick % USERS.len()];
        let label = LABELS[(pick / 3) % LABELS.len()];
        let target = &targets[(pick / 9) % targets.len()];

        t.react(user, label, target).await;
        t.assert_consistent();
    }

    for target in &targets {
        let total: usize = t.tally(target).iter().map(|b| b.count).sum();
        assert!(total <= USERS.len());
    }
}

// ============================================================================
// Deferred resolution
// ============================================================================

#[tokio::test]
async fn test_reaction_before_target_resolves_on_attach() {
    let mut t = TestView::new();
    let m1 = chat(CAROL, "late");
    let target = m1.msgid.clone();

    let r1 = t.react(ALICE, "👍", &target).await;
    assert_eq!(t.pending(), 1);
    assert!(t.tally(&target).is_empty());

    t.add(m1).await;
    assert_eq!(t.pending(), 0);
    assert_eq!(t.count(&target, "👍"), 1);
    assert!(t.view.reactions().find(&r1).is_some_and(|r| r.rendered));
}

#[tokio::test]
async fn test_reaction_before_target_resolves_on_sweep() {
    let mut t = TestView::sweep_only();
    let m1 = chat(CAROL, "late");
    let target = m1.msgid.clone();

    t.react(ALICE, "👍", &target).await;
    t.react(BOB, "👍", &target).await;
    t.add(m1).await;
    assert_eq!(t.pending(), 2);
    assert!(t.tally(&target).is_empty());

    let report = t.view.sweep();
    assert_eq!(report.attempted, 2);
    assert_eq!(report.resolved, 2);
    assert_eq!(report.still_pending(), 0);
    assert_eq!(t.count(&target, "👍"), 2);

    // Nothing left to retry
    assert_eq!(t.view.sweep().attempted, 0);
}

#[tokio::test]
async fn test_sweep_keeps_unresolvable_reactions_pending() {
    let mut t = TestView::sweep_only();
    let missing = unique_msgid();
    t.react(ALICE, "👍", &missing).await;

    let report = t.view.sweep();
    assert_eq!(report.attempted, 1);
    assert_eq!(report.still_pending(), 1);
    assert_eq!(t.pending(), 1);
}

#[tokio::test]
async fn test_deferred_toggle_pair_cancels_out() {
    let mut t = TestView::sweep_only();
    let m1 = chat(CAROL, "late");
    let target = m1.msgid.clone();

    t.react(ALICE, "👍", &target).await;
    t.react(ALICE, "👍", &target).await;
    t.add(m1).await;
    t.view.sweep();

    assert!(t.tally(&target).is_empty());
    assert_eq!(t.pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_scheduler_resolves_deferred_reactions() {
    let mut t = TestView::sweep_only();
    let m1 = chat(CAROL, "late");
    let target = m1.msgid.clone();
    t.react(ALICE, "👍", &target).await;
    t.add(m1).await;

    let view = Arc::new(Mutex::new(t.view));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = ReconciliationScheduler::new(Duration::from_secs(2)).spawn(view.clone(), shutdown_rx);

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert!(view.lock().await.tally(&target).is_empty());

    tokio::time::sleep(Duration::from_millis(1_000)).await;
    assert_eq!(view.lock().await.tally(&target).len(), 1);

    shutdown_tx.send(true).expect("scheduler alive");
    handle.await.expect("scheduler stopped cleanly");
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn test_destroyed_target_drops_its_reactions() {
    let mut t = TestView::new();
    let m1 = t.add(chat(CAROL, "bye")).await;
    let r1 = t.react(ALICE, "👍", &m1).await;

    t.destroy(&m1).await.expect("destroy m1");
    assert!(!t.view.document().contains(&m1));
    assert!(t.view.reactions().find(&r1).is_none());

    let late = reaction(BOB, "👍", &m1);
    let event = ReactionEvent::try_from(&late).expect("valid reaction");
    assert_eq!(t.view.render_reaction(&event), ReconcileOutcome::Orphaned);
    assert_eq!(t.pending(), 0);
}

#[tokio::test]
async fn test_destroyed_ids_are_bounded() {
    let mut t = TestView::new();
    let mut ids = Vec::with_capacity(TOMBSTONE_CAPACITY + 1);
    for i in 0..=TOMBSTONE_CAPACITY {
        let msgid = t.add(chat(CAROL, &format!("msg {i}"))).await;
        t.destroy(&msgid).await.expect("destroy");
        ids.push(msgid);
    }
    assert_eq!(t.view.tombstones(), TOMBSTONE_CAPACITY);

    let newest = ReactionEvent::try_from(&reaction(ALICE, "👍", &ids[TOMBSTONE_CAPACITY]))
        .expect("valid reaction");
    assert_eq!(t.view.render_reaction(&newest), ReconcileOutcome::Orphaned);

    let oldest = ReactionEvent::try_from(&reaction(ALICE, "👍", &ids[0])).expect("valid reaction");
    assert_eq!(t.view.render_reaction(&oldest), ReconcileOutcome::Deferred);
}

#[tokio::test]
async fn test_readded_message_is_no_longer_tombstoned() {
    let mut t = TestView::new();
    let m1 = chat(CAROL, "back again");
    let target = t.add(m1.clone()).await;
    t.destroy(&target).await.expect("destroy");
    assert_eq!(t.view.tombstones(), 1);

    t.add(m1).await;
    assert_eq!(t.view.tombstones(), 0);
    t.react(ALICE, "👍", &target).await;
    assert_eq!(t.count(&target, "👍"), 1);
}

#[tokio::test]
async fn test_destroyed_reaction_retracts_its_badge() {
    let mut t = TestView::new();
    let m1 = t.add(chat(CAROL, "hi")).await;
    let r1 = t.react(ALICE, "👍", &m1).await;
    t.react(BOB, "👍", &m1).await;

    t.destroy(&r1).await.expect("destroy reaction");
    let thumbs = t.badge(&m1, "👍").expect("badge kept");
    assert_eq!(thumbs.users, vec![Jid::new(BOB)]);
    assert!(t.view.reactions().find(&r1).is_none());
}

#[tokio::test]
async fn test_destroy_unknown_message_fails() {
    let mut t = TestView::new();
    let err = t.destroy(&unique_msgid()).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_rerender_keeps_badges() {
    let mut t = TestView::new();
    let mut m1 = chat(CAROL, "helo");
    let target = t.add(m1.clone()).await;
    t.react(ALICE, "👍", &target).await;

    m1.message = Some("hello".to_string());
    m1.edited = true;
    t.change(m1, ChangedFields::MESSAGE | ChangedFields::EDITED)
        .await
        .expect("edit");

    assert_eq!(t.count(&target, "👍"), 1);
    let html = t.view.document().node_html(&target).expect("attached");
    assert!(html.contains("hello"));
    assert!(html.contains("chat-msg__reacts"));
}

#[tokio::test]
async fn test_rerender_as_error_resets_reactions_to_pending() {
    let mut t = TestView::new();
    let mut m1 = chat(CAROL, "hi");
    let target = t.add(m1.clone()).await;
    let r1 = t.react(ALICE, "👍", &target).await;

    m1.msg_type = MessageType::Error;
    t.change(m1.clone(), ChangedFields::TYPE).await.expect("to error");
    assert!(t.tally(&target).is_empty());
    assert!(t.view.reactions().find(&r1).is_some_and(|r| r.is_pending()));

    m1.msg_type = MessageType::Chat;
    t.change(m1, ChangedFields::TYPE).await.expect("back to chat");
    assert_eq!(t.count(&target, "👍"), 1);
    assert_eq!(t.pending(), 0);
}

#[tokio::test]
async fn test_message_turning_into_reaction_leaves_the_list() {
    let mut t = TestView::new();
    let m1 = t.add(chat(CAROL, "hi")).await;
    let mut record = chat(ALICE, "👍");
    let rid = t.add(record.clone()).await;
    assert!(t.view.document().contains(&rid));

    record.reacts_to = Some(m1.clone());
    t.change(record, ChangedFields::MESSAGE | ChangedFields::REACTS_TO)
        .await
        .expect("becomes reaction");

    assert!(!t.view.document().contains(&rid));
    assert_eq!(t.count(&m1, "👍"), 1);
}
