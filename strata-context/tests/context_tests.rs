use serde::{Deserialize, Serialize};
use strata_context::{Context, ContextError};
use strata_store::mock::{FailingStore, FailureMode, RecordingStore};
use strata_store::{MemoryStore, Mutation, StoreBackend};
use strata_types::{Entity, EntityState};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Note {
    id: String,
    title: String,
}

impl Entity for Note {
    fn entity_type() -> &'static str {
        "note"
    }

    fn id(&self) -> String {
        self.id.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Folder {
    id: String,
    name: String,
}

impl Entity for Folder {
    fn entity_type() -> &'static str {
        "folder"
    }

    fn id(&self) -> String {
        self.id.clone()
    }
}

fn note(id: &str, title: &str) -> Note {
    Note {
        id: id.into(),
        title: title.into(),
    }
}

fn memory_context() -> Context {
    Context::new(MemoryStore::new())
}

// ── Staging state machine ───────────────────────────────────────

#[test]
fn add_stages_added() {
    let ctx = memory_context();
    ctx.add(note("n1", "draft"));
    assert_eq!(ctx.tracked_state::<Note>("n1"), Some(EntityState::Added));
    assert!(ctx.has_changes());
}

#[test]
fn attach_tracks_unchanged() {
    let ctx = memory_context();
    ctx.attach(note("n1", "draft"));
    assert_eq!(ctx.tracked_state::<Note>("n1"), Some(EntityState::Unchanged));
    assert!(!ctx.has_changes());
}

#[test]
fn update_attaches_detached_entity_as_modified() {
    let ctx = memory_context();
    ctx.update(note("n1", "edited"));
    assert_eq!(ctx.tracked_state::<Note>("n1"), Some(EntityState::Modified));
}

#[test]
fn update_on_added_entity_stays_added() {
    let ctx = memory_context();
    ctx.add(note("n1", "draft"));
    ctx.update(note("n1", "edited"));
    assert_eq!(ctx.tracked_state::<Note>("n1"), Some(EntityState::Added));
}

#[test]
fn remove_attaches_detached_entity_as_deleted() {
    let ctx = memory_context();
    ctx.remove(note("n1", "whatever"));
    assert_eq!(ctx.tracked_state::<Note>("n1"), Some(EntityState::Deleted));
}

#[test]
fn remove_after_add_detaches_without_store_write() {
    let backend = RecordingStore::new();
    let ctx = Context::new(backend);
    ctx.add(note("n1", "ephemeral"));
    ctx.remove(note("n1", "ephemeral"));

    assert_eq!(ctx.tracked_state::<Note>("n1"), None);
    assert!(!ctx.has_changes());
}

#[test]
fn untracked_entity_is_detached() {
    let ctx = memory_context();
    assert_eq!(ctx.tracked_state::<Note>("nope"), None);
}

// ── Save ────────────────────────────────────────────────────────

#[test]
fn save_commits_added_entity_and_resets_state() {
    let ctx = memory_context();
    ctx.add(note("n1", "draft"));
    ctx.save_changes().unwrap();

    assert_eq!(ctx.tracked_state::<Note>("n1"), Some(EntityState::Unchanged));
    assert!(!ctx.has_changes());
    let notes: Vec<Note> = ctx.fetch_all().unwrap();
    assert_eq!(notes, vec![note("n1", "draft")]);
}

#[test]
fn save_commits_full_row_update() {
    let ctx = memory_context();
    ctx.add(note("n1", "old"));
    ctx.save_changes().unwrap();

    ctx.update(note("n1", "new"));
    ctx.save_changes().unwrap();

    let notes: Vec<Note> = ctx.fetch_all().unwrap();
    assert_eq!(notes[0].title, "new");
}

#[test]
fn save_evicts_deleted_entities() {
    let ctx = memory_context();
    ctx.add(note("n1", "doomed"));
    ctx.save_changes().unwrap();

    ctx.remove(note("n1", "doomed"));
    ctx.save_changes().unwrap();

    assert_eq!(ctx.tracked_state::<Note>("n1"), None);
    let notes: Vec<Note> = ctx.fetch_all().unwrap();
    assert!(notes.is_empty());
}

#[test]
fn save_with_nothing_pending_commits_nothing() {
    let probe = std::sync::Arc::new(RecordingStore::new());
    let ctx = Context::new(ProbeStore(probe.clone()));
    ctx.save_changes().unwrap();
    assert!(probe.batches().is_empty());
}

/// Forwarding wrapper so a test can keep a handle on the store it hands
/// to a context.
struct ProbeStore(std::sync::Arc<RecordingStore>);

impl StoreBackend for ProbeStore {
    fn fetch_all(&self, entity_type: &str) -> strata_store::StoreResult<Vec<strata_store::Record>> {
        self.0.fetch_all(entity_type)
    }

    fn fetch_one(
        &self,
        entity_type: &str,
        id: &str,
    ) -> strata_store::StoreResult<Option<strata_store::Record>> {
        self.0.fetch_one(entity_type, id)
    }

    fn commit(&self, batch: &[Mutation]) -> strata_store::StoreResult<()> {
        self.0.commit(batch)
    }
}

#[test]
fn mutations_commit_in_accumulation_order_across_types() {
    let probe = std::sync::Arc::new(RecordingStore::new());
    let ctx = Context::new(ProbeStore(probe.clone()));

    ctx.add(note("n1", "first"));
    ctx.add(Folder {
        id: "f1".into(),
        name: "inbox".into(),
    });
    ctx.add(note("n2", "third"));
    ctx.save_changes().unwrap();

    let batches = probe.batches();
    assert_eq!(batches.len(), 1);
    let order: Vec<(&str, &str)> = batches[0]
        .iter()
        .map(|m| (m.entity_type(), m.id()))
        .collect();
    assert_eq!(order, vec![("note", "n1"), ("folder", "f1"), ("note", "n2")]);
}

#[test]
fn restaging_keeps_the_original_accumulation_slot() {
    let probe = std::sync::Arc::new(RecordingStore::new());
    let ctx = Context::new(ProbeStore(probe.clone()));

    ctx.add(note("a", "one"));
    ctx.save_changes().unwrap();
    ctx.attach(note("b", "two"));

    ctx.update(note("a", "one edited"));
    ctx.update(note("b", "two edited"));
    ctx.update(note("a", "one edited again"));
    ctx.save_changes().unwrap();

    let batches = probe.batches();
    let order: Vec<&str> = batches[1].iter().map(|m| m.id()).collect();
    // "a" was staged first; editing it again later does not move it back
    assert_eq!(order, vec!["a", "b"]);
}

#[test]
fn failed_save_keeps_the_pending_change_set() {
    let ctx = Context::new(FailingStore::new(FailureMode::Driver));
    ctx.add(note("n1", "stuck"));

    assert!(ctx.save_changes().is_err());
    assert!(ctx.has_changes());
    assert_eq!(ctx.tracked_state::<Note>("n1"), Some(EntityState::Added));
}

#[test]
fn store_failure_surfaces_untouched() {
    let ctx = Context::new(FailingStore::new(FailureMode::ForeignKey));
    ctx.add(note("n1", "orphan"));

    let err = ctx.save_changes().unwrap_err();
    match err {
        ContextError::Store(store_err) => {
            assert_eq!(
                store_err.constraint_kind(),
                Some(strata_store::ConstraintKind::ForeignKey)
            );
        }
        other => panic!("unexpected error: {other}"),
    }
}

// ── Reload ──────────────────────────────────────────────────────

#[test]
fn reload_overwrites_local_changes_with_store_state() {
    let ctx = memory_context();
    ctx.add(note("n1", "persisted"));
    ctx.save_changes().unwrap();

    let mut local = note("n1", "locally mangled");
    ctx.attach(local.clone());
    ctx.reload(&mut local).unwrap();

    assert_eq!(local.title, "persisted");
    assert_eq!(ctx.tracked_state::<Note>("n1"), Some(EntityState::Unchanged));
}

#[test]
fn reload_resets_a_modified_entry() {
    let ctx = memory_context();
    ctx.add(note("n1", "persisted"));
    ctx.save_changes().unwrap();

    let mut local = note("n1", "edited");
    ctx.update(local.clone());
    assert!(ctx.has_changes());

    ctx.reload(&mut local).unwrap();
    assert!(!ctx.has_changes());
    assert_eq!(local.title, "persisted");
}

#[test]
fn reload_of_untracked_entity_is_an_error() {
    let ctx = memory_context();
    let mut stray = note("n1", "stray");
    let err = ctx.reload(&mut stray).unwrap_err();
    assert!(matches!(err, ContextError::NotTracked { .. }));
}

#[test]
fn reload_of_vanished_row_is_an_error() {
    let ctx = memory_context();
    let mut ghost = note("n1", "ghost");
    ctx.attach(ghost.clone());

    let err = ctx.reload(&mut ghost).unwrap_err();
    assert!(matches!(err, ContextError::Missing { .. }));
}

// ── Async path ──────────────────────────────────────────────────

#[tokio::test]
async fn async_save_and_fetch() {
    let ctx = memory_context();
    ctx.add(note("n1", "async"));
    ctx.save_changes_async().await.unwrap();

    let notes: Vec<Note> = ctx.fetch_all_async().await.unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(ctx.tracked_state::<Note>("n1"), Some(EntityState::Unchanged));
}

#[tokio::test]
async fn async_reload() {
    let ctx = memory_context();
    ctx.add(note("n1", "kept"));
    ctx.save_changes_async().await.unwrap();

    let mut local = note("n1", "mangled");
    ctx.attach(local.clone());
    ctx.reload_async(&mut local).await.unwrap();
    assert_eq!(local.title, "kept");
}

#[tokio::test]
async fn async_save_failure_keeps_pending_set() {
    let ctx = Context::new(FailingStore::new(FailureMode::Unique));
    ctx.add(note("n1", "dup"));

    assert!(ctx.save_changes_async().await.is_err());
    assert!(ctx.has_changes());
}
