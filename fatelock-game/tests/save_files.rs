use fatelock_game::{
    Catalog, Category, FixedClock, LogKind, Progression, ProgressionState, SnapshotError,
    TaskSources, apply_snapshot,
};
use serde_json::Value;
use std::sync::Arc;

const LEGACY_SAVE: &str = include_str!("fixtures/legacy_save.json");

fn catalog() -> Catalog {
    Catalog::bundled().unwrap()
}

#[test]
fn legacy_save_migrates_content_list() {
    let catalog = catalog();
    let state = apply_snapshot(&catalog, LEGACY_SAVE).unwrap();

    assert_eq!(state.keys(), 4);
    assert_eq!(state.omni_keys(), 1);
    assert_eq!(state.fate_points(), 17);
    assert_eq!(state.tier(Category::Equipment, "Weapon"), 3);
    assert_eq!(state.tier(Category::Equipment, "Ring"), 0);
    assert_eq!(state.tier(Category::Skills, "Hitpoints"), 2);
    assert_eq!(state.level("Hitpoints"), 14);
    assert_eq!(state.level("Mining"), 1);

    let bosses: Vec<&str> = state.unlocks().bosses.iter().collect();
    assert_eq!(bosses, ["Wintertodt"]);
    let minigames: Vec<&str> = state.unlocks().minigames.iter().collect();
    assert_eq!(minigames, ["Pest Control", "Castle Wars"]);
    assert_eq!(state.history().len(), 2);
    assert_eq!(state.history().entries()[1].kind, LogKind::Unlock);
}

#[test]
fn migrated_save_exports_without_content_key() {
    let catalog = catalog();
    let state = apply_snapshot(&catalog, LEGACY_SAVE).unwrap();
    let exported: Value = serde_json::to_value(state.snapshot()).unwrap();
    let unlocks = exported["unlocks"].as_object().unwrap();
    assert!(!unlocks.contains_key("content"));
    for key in [
        "equipment", "skills", "levels", "regions", "mobility", "power", "minigames", "bosses",
    ] {
        assert!(unlocks.contains_key(key), "missing {key}");
    }
    assert_eq!(
        exported["history"][0]["id"],
        "0b5e6a1c-2f0e-4d5b-9a57-1c2d3e4f5a6b"
    );
}

#[test]
fn exported_save_reimports_identically() {
    let catalog = Arc::new(catalog());
    let sources = Arc::new(TaskSources::bundled());
    let mut session =
        Progression::seeded(Arc::clone(&catalog), sources, 5150).with_clock(FixedClock(42));
    for source in ["quest_master", "diary_hard", "clue_elite", "slayer_task"] {
        for _ in 0..6 {
            session.complete_task(source).unwrap();
        }
    }
    while session.pull(Category::Regions).is_ok() {
        session.finalize();
    }

    let json = session.export().to_json_pretty().unwrap();
    let restored = apply_snapshot(&catalog, &json).unwrap();
    assert_eq!(restored.snapshot(), session.export());
}

#[test]
fn rejected_import_leaves_progress_alone() {
    let catalog = catalog();
    let mut state = apply_snapshot(&catalog, LEGACY_SAVE).unwrap();
    let before = state.clone();
    for bad in ["", "null", "\"save\"", r#"{"fatePoints":-3}"#, r#"{"history":{}}"#] {
        let err = state.import(&catalog, bad).unwrap_err();
        assert!(
            matches!(
                err,
                SnapshotError::InvalidJson(_)
                    | SnapshotError::NotAnObject { .. }
                    | SnapshotError::Malformed(_)
            ),
            "{bad}: {err}"
        );
        assert_eq!(state, before);
    }
}

#[test]
fn new_ids_do_not_collide_with_imported_ones() {
    let catalog = catalog();
    let mut state: ProgressionState = apply_snapshot(&catalog, LEGACY_SAVE).unwrap();
    let mut dice = fatelock_game::ScriptedDice::new([1, 1, 1, 1]);
    state.roll("Quest (Novice)", 20, &mut dice, 1_714_000_000_000);
    state.roll("Quest (Novice)", 20, &mut dice, 1_714_000_000_000);
    let mut ids: Vec<&str> = state.history().iter().map(|e| e.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 4);
}
