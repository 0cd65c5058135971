//! End-to-end behaviour of a profile session against an in-memory store.

mod support;

use std::sync::Arc;

use profilesync_core::{
    changed_fields, is_dirty, LeaveDecision, NavigationGuard, NavigationVerdict, Presence,
    ProfileSession, ReconcileOutcome, ReconcileTrigger, SaveOutcome, SkipReason,
};
use profilesync_domain::{
    CompanionCatalog, CompanionId, Interest, ProfileField, ProfileFields, ProfileSyncError, Theme,
};
use serde_json::json;
use support::{record_body, InMemoryProfileStore, RecordingInterceptor, ScriptedPrompt, StoreOp};

fn catalog() -> Arc<CompanionCatalog> {
    Arc::new(CompanionCatalog::builtin())
}

async fn mount(store: &Arc<InMemoryProfileStore>) -> ProfileSession {
    ProfileSession::mount("stu-1", store.clone(), catalog()).await
}

fn existing_store() -> Arc<InMemoryProfileStore> {
    InMemoryProfileStore::new().with_record(record_body("r1", "stu-1", "Ada", "emerald", 1))
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dirty_check_is_stable_without_mutation() {
    let store = existing_store();
    let session = mount(&store).await;
    assert!(!session.is_dirty());

    session.set_name("Grace").unwrap();
    let first = (session.is_dirty(), session.changed_fields());
    let second = (session.is_dirty(), session.changed_fields());
    assert_eq!(first, second);
    assert_eq!(first, (true, vec![ProfileField::Name]));
}

#[tokio::test]
async fn successful_save_clears_dirty_without_refetch() {
    let store = existing_store();
    let session = mount(&store).await;
    session.set_theme(Theme::Violet).unwrap();
    let fetches_before = store.calls(StoreOp::Fetch);

    let ack = session.save().await.unwrap();

    assert!(!ack.created);
    assert_eq!(ack.record_id, "r1");
    assert!(!session.is_dirty());
    assert!(!session.has_uncommitted_local_change());
    assert_eq!(session.baseline().theme, Theme::Violet);
    assert_eq!(store.calls(StoreOp::Fetch), fetches_before);
    assert_eq!(store.last_update().unwrap().profile.theme, Theme::Violet);
}

#[tokio::test]
async fn guarded_field_survives_reconciliation() {
    let store = existing_store();
    let session = mount(&store).await;
    session.set_name("Grace").unwrap();

    store.set_profile_value("r1", "name", json!("Renamed Elsewhere"));
    store.set_profile_value("r1", "theme", json!("sky"));

    let outcome = session.reconcile(ReconcileTrigger::Interval).await;

    assert_eq!(
        outcome,
        ReconcileOutcome::Applied {
            changed: vec![ProfileField::Theme],
            suppressed: vec![ProfileField::Name],
        }
    );
    let draft = session.draft();
    assert_eq!(draft.name.as_deref(), Some("Grace"));
    assert_eq!(draft.theme, Theme::Sky);
    assert_eq!(session.baseline().name.as_deref(), Some("Ada"));
}

#[test]
fn interest_order_is_significant() {
    let baseline = ProfileFields {
        interests: vec![Interest::freeform("a"), Interest::freeform("b")],
        ..ProfileFields::default()
    };
    let draft = ProfileFields {
        interests: vec![Interest::freeform("b"), Interest::freeform("a")],
        ..ProfileFields::default()
    };
    assert!(is_dirty(&draft, &baseline));
    assert_eq!(changed_fields(&draft, &baseline), vec![ProfileField::Interests]);
}

#[test]
fn mixed_interest_shapes_always_differ() {
    let baseline =
        ProfileFields { interests: vec![Interest::freeform("x")], ..ProfileFields::default() };
    let draft =
        ProfileFields { interests: vec![Interest::tagged("x", "x")], ..ProfileFields::default() };
    assert!(is_dirty(&draft, &baseline));
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_save_creates_the_record() {
    let store = InMemoryProfileStore::new();
    let session = mount(&store).await;

    assert_eq!(session.presence(), Presence::Absent);
    assert_eq!(store.calls(StoreOp::Find), 1);
    assert_eq!(store.calls(StoreOp::Fetch), 0);
    assert!(!session.is_dirty());

    session.set_name("  Ada  ").unwrap();
    let ack = session.save().await.unwrap();

    assert!(ack.created);
    assert_eq!(session.presence(), Presence::Present { record_id: ack.record_id.clone() });
    assert!(session.presence().exists_on_server());
    assert!(!session.is_dirty());
    assert_eq!(store.record_count(), 1);
    assert_eq!(store.last_create().unwrap().profile.name.as_deref(), Some("Ada"));

    // The next save updates instead of creating again.
    session.set_tts_enabled(true).unwrap();
    let second = session.save().await.unwrap();
    assert!(!second.created);
    assert_eq!(second.record_id, ack.record_id);
    assert_eq!(store.record_count(), 1);
}

#[tokio::test]
async fn unguarded_server_change_reaches_draft_and_baseline() {
    let store = existing_store();
    let session = mount(&store).await;
    assert_eq!(session.draft().theme, Theme::Emerald);

    store.set_profile_value("r1", "theme", json!("sky"));
    let outcome = session.reconcile(ReconcileTrigger::Interval).await;

    assert_eq!(
        outcome,
        ReconcileOutcome::Applied { changed: vec![ProfileField::Theme], suppressed: vec![] }
    );
    assert_eq!(session.baseline().theme, Theme::Sky);
    assert_eq!(session.draft().theme, Theme::Sky);
    assert!(!session.is_dirty());
}

#[tokio::test]
async fn picked_companion_is_not_reverted_by_reconciliation() {
    let store = existing_store();
    let session = mount(&store).await;
    assert_eq!(session.draft().companion.map(|c| c.id), Some(CompanionId(1)));

    // Previewing alone does not touch the draft or the guard.
    session.preview_companion(CompanionId(2)).unwrap();
    assert!(!session.has_uncommitted_local_change());

    session.set_companion(CompanionId(2)).unwrap();
    let outcome = session.reconcile(ReconcileTrigger::FocusRegained).await;
    assert!(outcome.is_applied());
    assert_eq!(session.draft().companion.map(|c| c.id), Some(CompanionId(2)));

    // A server-side change to the companion is suppressed as well.
    store.set_record_value("r1", "companion", json!({ "id": 5 }));
    let outcome = session.reconcile(ReconcileTrigger::VisibilityRegained).await;
    assert_eq!(
        outcome,
        ReconcileOutcome::Applied { changed: vec![], suppressed: vec![ProfileField::Companion] }
    );
    assert_eq!(session.draft().companion.map(|c| c.id), Some(CompanionId(2)));

    // Saving lifts the guard; the pick is now the baseline.
    session.save().await.unwrap();
    assert!(!session.is_dirty());
    assert_eq!(session.baseline().companion.as_ref().map(|c| c.id), Some(CompanionId(2)));
}

#[tokio::test]
async fn staying_cancels_navigation_and_keeps_draft() {
    let store = existing_store();
    let session = mount(&store).await;
    session.set_name("Grace").unwrap();

    let prompt = ScriptedPrompt::answering(LeaveDecision::Stay);
    let guard = NavigationGuard::new(session.clone(), prompt.clone());

    assert_eq!(guard.before_navigate("/dashboard").await, NavigationVerdict::Cancel);
    assert_eq!(prompt.asked(), vec![vec![ProfileField::Name]]);
    assert_eq!(session.draft().name.as_deref(), Some("Grace"));
    assert!(session.is_dirty());
}

// ---------------------------------------------------------------------------
// Save state machine
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_save_leaves_draft_baseline_and_guard() {
    let store = existing_store();
    let session = mount(&store).await;
    session.set_theme(Theme::Rose).unwrap();
    store.fail(StoreOp::Update, ProfileSyncError::Network("timeout".into()));

    let result = session.save().await;

    assert!(matches!(result, Err(ProfileSyncError::Network(_))));
    assert_eq!(session.draft().theme, Theme::Rose);
    assert_eq!(session.baseline().theme, Theme::Emerald);
    assert!(session.is_dirty());
    assert_eq!(session.guarded_fields(), vec![ProfileField::Theme]);
    assert!(matches!(session.snapshot().last_save, Some(SaveOutcome::Failed(_))));

    store.clear_failures();
    session.save().await.unwrap();
    assert!(!session.is_dirty());
    assert!(matches!(session.snapshot().last_save, Some(SaveOutcome::Succeeded(_))));
}

#[tokio::test]
async fn overly_long_name_is_rejected_before_sending() {
    let store = existing_store();
    let session = mount(&store).await;
    session.set_name("x".repeat(61)).unwrap();

    let result = session.save().await;

    assert!(matches!(result, Err(ProfileSyncError::Validation(_))));
    assert_eq!(store.calls(StoreOp::Update), 0);
    assert!(session.is_dirty());
    assert!(matches!(
        session.snapshot().last_save,
        Some(SaveOutcome::Failed(ProfileSyncError::Validation(_)))
    ));
}

#[tokio::test]
async fn create_with_lost_response_is_not_repeated() {
    let store = InMemoryProfileStore::new();
    let session = mount(&store).await;
    assert_eq!(session.presence(), Presence::Absent);
    session.set_name("Lin").unwrap();
    store.lose_next_response(StoreOp::Create, ProfileSyncError::Network("response lost".into()));

    let first = session.save().await;

    assert!(matches!(first, Err(ProfileSyncError::Network(_))));
    assert_eq!(session.presence(), Presence::Unknown);
    assert!(session.is_dirty());

    let ack = session.save().await.unwrap();

    assert!(!ack.created);
    assert_eq!(ack.record_id, "rec-1");
    assert_eq!(store.calls(StoreOp::Create), 1);
    assert_eq!(store.calls(StoreOp::Update), 1);
    assert_eq!(store.record_count(), 1);
    assert!(!session.is_dirty());
}

#[tokio::test]
async fn concurrent_save_is_refused_and_reconcile_waits() {
    let store = existing_store();
    let session = mount(&store).await;
    session.set_theme(Theme::Amber).unwrap();
    let gate = store.gate(StoreOp::Update);

    let saving = session.clone();
    let first = tokio::spawn(async move { saving.save().await });
    gate.entered().await;

    assert_eq!(session.save().await, Err(ProfileSyncError::SaveInProgress));
    assert_eq!(
        session.reconcile(ReconcileTrigger::Interval).await,
        ReconcileOutcome::Skipped(SkipReason::SaveInFlight)
    );

    gate.release();
    first.await.unwrap().unwrap();
    assert_eq!(store.calls(StoreOp::Update), 1);
    assert!(!session.is_dirty());
}

#[tokio::test]
async fn edits_during_save_stay_dirty_and_guarded() {
    let store = existing_store();
    let session = mount(&store).await;
    session.set_name("Grace").unwrap();
    let gate = store.gate(StoreOp::Update);

    let saving = session.clone();
    let save = tokio::spawn(async move { saving.save().await });
    gate.entered().await;
    session.set_theme(Theme::Teal).unwrap();
    gate.release();
    save.await.unwrap().unwrap();

    assert_eq!(session.baseline().name.as_deref(), Some("Grace"));
    assert_eq!(session.changed_fields(), vec![ProfileField::Theme]);
    assert_eq!(session.guarded_fields(), vec![ProfileField::Theme]);
    assert_eq!(store.last_update().unwrap().profile.theme, Theme::Emerald);
}

#[tokio::test]
async fn fetch_that_overlaps_a_save_is_discarded() {
    let store = existing_store();
    let session = mount(&store).await;
    let gate = store.gate(StoreOp::Fetch);

    let reconciling = session.clone();
    let reconcile =
        tokio::spawn(async move { reconciling.reconcile(ReconcileTrigger::Interval).await });
    gate.entered().await;

    session.set_tts_enabled(true).unwrap();
    session.save().await.unwrap();
    store.set_profile_value("r1", "theme", json!("rose"));
    gate.release();

    assert_eq!(
        reconcile.await.unwrap(),
        ReconcileOutcome::Skipped(SkipReason::StaleAfterSave)
    );
    assert_eq!(session.draft().theme, Theme::Emerald);
    assert!(session.draft().tts_enabled);
}

#[tokio::test]
async fn reload_that_overlaps_a_save_is_discarded() {
    let store = existing_store();
    let session = mount(&store).await;
    let gate = store.gate(StoreOp::Fetch);

    let loading = session.clone();
    let reload = tokio::spawn(async move { loading.load().await });
    gate.entered().await;

    session.set_tts_enabled(true).unwrap();
    session.save().await.unwrap();
    // The held fetch answers with the value from before the save.
    store.set_profile_value("r1", "ttsEnabled", json!(false));
    gate.release();

    assert!(reload.await.unwrap().is_ok());
    assert!(session.draft().tts_enabled);
    assert!(session.baseline().tts_enabled);
    assert!(!session.is_dirty());
}

#[tokio::test]
async fn failed_load_looks_record_up_before_saving() {
    let store = existing_store();
    store.fail(StoreOp::Find, ProfileSyncError::Network("offline".into()));
    let session = mount(&store).await;

    assert_eq!(session.presence(), Presence::Unknown);
    assert!(matches!(session.snapshot().load_error, Some(ProfileSyncError::Network(_))));
    assert!(!session.is_dirty());

    store.clear_failures();
    session.set_name("Grace").unwrap();
    let ack = session.save().await.unwrap();

    assert!(!ack.created);
    assert_eq!(ack.record_id, "r1");
    assert_eq!(store.calls(StoreOp::Find), 2);
    assert_eq!(store.record_count(), 1);
    assert!(session.snapshot().load_error.is_none());
}

#[tokio::test]
async fn duplicate_identity_uses_first_match() {
    let store = InMemoryProfileStore::new()
        .with_record(record_body("r1", "stu-1", "Ada", "rose", 1))
        .with_record(record_body("r2", "stu-1", "Ada Again", "sky", 2));
    let session = mount(&store).await;

    assert_eq!(session.presence().record_id(), Some("r1"));
    assert_eq!(session.draft().theme, Theme::Rose);
}

// ---------------------------------------------------------------------------
// Reconciliation edge cases
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reconcile_without_server_record_is_skipped() {
    let store = InMemoryProfileStore::new();
    let session = mount(&store).await;

    assert_eq!(
        session.reconcile(ReconcileTrigger::Interval).await,
        ReconcileOutcome::Skipped(SkipReason::NoServerRecord)
    );
    assert_eq!(store.calls(StoreOp::Fetch), 0);
}

#[tokio::test]
async fn reconcile_failure_is_reported_not_raised() {
    let store = existing_store();
    let session = mount(&store).await;
    session.set_name("Grace").unwrap();
    store.fail(StoreOp::Fetch, ProfileSyncError::Network("reset".into()));

    let outcome = session.reconcile(ReconcileTrigger::Manual).await;

    assert!(matches!(outcome, ReconcileOutcome::Failed(ProfileSyncError::Network(_))));
    assert_eq!(session.draft().name.as_deref(), Some("Grace"));
    assert!(session.is_dirty());
}

#[tokio::test]
async fn missing_record_during_reconcile_keeps_presence() {
    let store = existing_store();
    let session = mount(&store).await;
    store.fail(StoreOp::Fetch, ProfileSyncError::NotFound("record r1".into()));

    assert_eq!(
        session.reconcile(ReconcileTrigger::Interval).await,
        ReconcileOutcome::Skipped(SkipReason::RecordMissing)
    );
    assert_eq!(session.presence().record_id(), Some("r1"));
}

// ---------------------------------------------------------------------------
// Unmount
// ---------------------------------------------------------------------------

#[tokio::test]
async fn save_result_after_unmount_is_not_applied() {
    let store = existing_store();
    let session = mount(&store).await;
    session.set_theme(Theme::Sky).unwrap();
    let gate = store.gate(StoreOp::Update);

    let saving = session.clone();
    let save = tokio::spawn(async move { saving.save().await });
    gate.entered().await;
    session.unmount();
    gate.release();
    save.await.unwrap().unwrap();

    assert_eq!(session.baseline().theme, Theme::Emerald);
    assert_eq!(session.set_theme(Theme::Rose), Err(ProfileSyncError::Detached));
    assert_eq!(session.save().await, Err(ProfileSyncError::Detached));
    assert_eq!(
        session.reconcile(ReconcileTrigger::Interval).await,
        ReconcileOutcome::Skipped(SkipReason::Detached)
    );
}

#[tokio::test]
async fn unload_interceptor_follows_dirty_state() {
    let store = existing_store();
    let session = mount(&store).await;
    let guard = NavigationGuard::new(session.clone(), ScriptedPrompt::answering(LeaveDecision::Leave));
    let interceptor = RecordingInterceptor::new();
    let task = guard.track_unload(interceptor.clone());

    session.set_name("Grace").unwrap();
    interceptor.next_transition().await;
    assert!(interceptor.is_armed());

    session.save().await.unwrap();
    interceptor.next_transition().await;
    assert!(!interceptor.is_armed());

    session.set_theme(Theme::Rose).unwrap();
    interceptor.next_transition().await;
    assert!(interceptor.is_armed());

    session.unmount();
    task.await.unwrap();
    assert!(!interceptor.is_armed());
    assert_eq!(interceptor.transitions(), vec![true, false, true, false]);
}
