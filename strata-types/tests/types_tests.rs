use serde::{Deserialize, Serialize};
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

// ── Entity ──────────────────────────────────────────────────────

#[test]
fn entity_type_is_collection_name() {
    assert_eq!(Note::entity_type(), "note");
}

#[test]
fn entity_id_is_stable_across_clones() {
    let note = Note {
        id: uuid::Uuid::now_v7().to_string(),
        title: "first".into(),
    };
    assert_eq!(note.id(), note.clone().id());
}

#[test]
fn entity_serde_roundtrip() {
    let note = Note {
        id: "n1".into(),
        title: "draft".into(),
    };
    let value = serde_json::to_value(&note).unwrap();
    let back: Note = serde_json::from_value(value).unwrap();
    assert_eq!(back, note);
}

// ── EntityState ─────────────────────────────────────────────────

#[test]
fn unchanged_is_not_pending() {
    assert!(!EntityState::Unchanged.is_pending());
}

#[test]
fn staged_states_are_pending() {
    assert!(EntityState::Added.is_pending());
    assert!(EntityState::Modified.is_pending());
    assert!(EntityState::Deleted.is_pending());
}

#[test]
fn state_display() {
    assert_eq!(EntityState::Added.to_string(), "added");
    assert_eq!(EntityState::Deleted.to_string(), "deleted");
}
