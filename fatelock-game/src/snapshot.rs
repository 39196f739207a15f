//! Persisted save shape, export, and the merging import loader.
//!
//! Imports are lenient in the way old saves need: missing scalars become 0,
//! category maps merge over new-game defaults, and the pre-split `content`
//! list is partitioned into bosses and minigames. Values the engine cannot
//! represent are repaired with a warning rather than rejected.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::catalog::{Catalog, Category, level_cap};
use crate::constants::{DEFAULT_SKILL_LEVEL, PITY_THRESHOLD};
use crate::history::{History, LogEntry};
use crate::state::{Currency, ProgressionState};
use crate::unlocks::{UnlockRecord, UnlockedSet};

/// Serializable save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub keys: u32,
    /// Omni-keys; the name predates the rename.
    pub special_keys: u32,
    pub fate_points: u8,
    pub unlocks: UnlockRecord,
    pub history: Vec<LogEntry>,
}

impl Snapshot {
    /// Pretty JSON, as written to export files.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Errors raised by [`apply_snapshot`]. The caller's state is never touched.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("save file is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("save file must be a JSON object, found {found}")]
    NotAnObject { found: &'static str },
    #[error("save file has a malformed field: {0}")]
    Malformed(#[source] serde_json::Error),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncomingSnapshot {
    #[serde(default)]
    keys: Option<u32>,
    #[serde(default)]
    special_keys: Option<u32>,
    #[serde(default)]
    fate_points: Option<u32>,
    #[serde(default)]
    unlocks: Option<IncomingUnlocks>,
    #[serde(default)]
    history: Option<Vec<LogEntry>>,
}

#[derive(Debug, Default, Deserialize)]
struct IncomingUnlocks {
    #[serde(default)]
    equipment: Option<BTreeMap<String, u8>>,
    #[serde(default)]
    skills: Option<BTreeMap<String, u8>>,
    #[serde(default)]
    levels: Option<BTreeMap<String, u8>>,
    #[serde(default)]
    regions: Option<Vec<String>>,
    #[serde(default)]
    mobility: Option<Vec<String>>,
    #[serde(default)]
    power: Option<Vec<String>>,
    #[serde(default)]
    minigames: Option<Vec<String>>,
    #[serde(default)]
    bosses: Option<Vec<String>>,
    /// Bosses and minigames shared one list before they were split.
    #[serde(default)]
    content: Option<Vec<String>>,
}

/// Capture the persisted part of a state. The pending slot is not saved.
#[must_use]
pub fn export_snapshot(state: &ProgressionState) -> Snapshot {
    let currency = state.currency();
    Snapshot {
        keys: currency.keys,
        special_keys: currency.omni_keys,
        fate_points: currency.fate_points,
        unlocks: state.unlocks().clone(),
        history: state.history().entries().to_vec(),
    }
}

/// Build a state from save JSON.
///
/// # Errors
///
/// Returns a [`SnapshotError`] if the text is not JSON, is not an object, or
/// a known field has the wrong type.
pub fn apply_snapshot(catalog: &Catalog, json: &str) -> Result<ProgressionState, SnapshotError> {
    let value: Value = serde_json::from_str(json).map_err(SnapshotError::InvalidJson)?;
    apply_snapshot_value(catalog, value)
}

/// Build a state from an already parsed save.
///
/// # Errors
///
/// See [`apply_snapshot`].
pub fn apply_snapshot_value(
    catalog: &Catalog,
    value: Value,
) -> Result<ProgressionState, SnapshotError> {
    if !value.is_object() {
        return Err(SnapshotError::NotAnObject {
            found: json_kind(&value),
        });
    }
    let incoming: IncomingSnapshot =
        serde_json::from_value(value).map_err(SnapshotError::Malformed)?;

    let max_fate = PITY_THRESHOLD - 1;
    let fate = incoming.fate_points.unwrap_or(0);
    let fate_points = u8::try_from(fate)
        .ok()
        .filter(|fate| *fate <= max_fate)
        .unwrap_or_else(|| {
            log::warn!("fate points {fate} clamped to {max_fate}");
            max_fate
        });
    let currency = Currency {
        keys: incoming.keys.unwrap_or(0),
        omni_keys: incoming.special_keys.unwrap_or(0),
        fate_points,
    };

    let unlocks = merge_unlocks(catalog, incoming.unlocks.unwrap_or_default());
    let history = History::from_entries(incoming.history.unwrap_or_default());
    Ok(ProgressionState::from_parts(currency, unlocks, history))
}

impl ProgressionState {
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        export_snapshot(self)
    }

    /// Replace this state with an imported save. On error nothing changes.
    /// Ticket numbering continues, so display data for a reveal made before
    /// the import never lands on a later one.
    ///
    /// # Errors
    ///
    /// See [`apply_snapshot`].
    pub fn import(&mut self, catalog: &Catalog, json: &str) -> Result<(), SnapshotError> {
        let next_ticket = self.next_ticket;
        *self = apply_snapshot(catalog, json)?;
        self.next_ticket = next_ticket;
        Ok(())
    }
}

fn merge_unlocks(catalog: &Catalog, incoming: IncomingUnlocks) -> UnlockRecord {
    let mut record = UnlockRecord::new_game(catalog);

    for (category, entries) in [
        (Category::Equipment, incoming.equipment),
        (Category::Skills, incoming.skills),
    ] {
        let Some(max) = category.tier_max() else {
            continue;
        };
        let Some(map) = record.tier_map_mut(category) else {
            continue;
        };
        for (item, tier) in entries.unwrap_or_default() {
            if !catalog.contains(category, &item) {
                log::warn!("dropping unknown {category} entry {item:?}");
                continue;
            }
            if tier > max {
                log::warn!("{category} {item} tier {tier} clamped to {max}");
            }
            map.insert(item, tier.min(max));
        }
    }

    for (skill, level) in incoming.levels.unwrap_or_default() {
        if !catalog.contains(Category::Skills, &skill) {
            log::warn!("dropping level for unknown skill {skill:?}");
            continue;
        }
        record.levels.insert(skill, level);
    }
    let skills = record.skills.clone();
    for (skill, level) in &mut record.levels {
        let cap = level_cap(skills.get(skill).copied().unwrap_or(0));
        let bounded = (*level).clamp(DEFAULT_SKILL_LEVEL, cap);
        if bounded != *level {
            log::warn!("{skill} level {level} clamped to {bounded}");
            *level = bounded;
        }
    }

    for (category, entries) in [
        (Category::Regions, incoming.regions),
        (Category::Mobility, incoming.mobility),
        (Category::Power, incoming.power),
        (Category::Minigames, incoming.minigames),
        (Category::Bosses, incoming.bosses),
    ] {
        if let Some(entries) = entries
            && let Some(set) = record.set_mut(category)
        {
            *set = known_items(catalog, category, entries);
        }
    }

    for item in incoming.content.unwrap_or_default() {
        match catalog.legacy_content_category(&item) {
            Some(category) => {
                if let Some(set) = record.set_mut(category) {
                    set.insert(&item);
                }
            }
            None => log::warn!("dropping legacy content entry {item:?}"),
        }
    }

    record
}

fn known_items(catalog: &Catalog, category: Category, entries: Vec<String>) -> UnlockedSet {
    let total = entries.len();
    let set: UnlockedSet = entries
        .into_iter()
        .filter(|item| {
            let known = catalog.contains(category, item);
            if !known {
                log::warn!("dropping unknown {category} entry {item:?}");
            }
            known
        })
        .collect();
    if set.len() < total {
        log::warn!("{category}: kept {} of {total} imported entries", set.len());
    }
    set
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
