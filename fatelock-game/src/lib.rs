//! Fate-Locked Progression Engine
//!
//! Platform-agnostic core for the Fate-Locked unlock tracker: key rolls with a
//! pity meter, gacha pulls with a duplicate re-roll, a two-phase unlock
//! lifecycle, skill levels, omni-key unlocks, and save import/export.
//! This crate performs no I/O; storage is supplied by the host.

pub mod catalog;
pub mod clock;
pub mod constants;
pub mod dice;
pub mod gacha;
pub mod history;
pub mod pending;
pub mod roll;
pub mod session;
pub mod snapshot;
pub mod sources;
pub mod state;
pub mod unlocks;

use anyhow::Context;
use std::sync::Arc;

// Re-export commonly used types
pub use catalog::{BaselineSkill, Catalog, CatalogError, Category, RegionGroup, level_cap};
pub use clock::{Clock, FixedClock, SystemClock};
pub use dice::{CountingDice, Dice, DiceStreams, ScriptedDice};
pub use gacha::{GachaDraw, resolve_gacha};
pub use history::{History, LogEntry, LogKind, NewEntry, RollResult};
pub use pending::{CostKind, DisplayMeta, FinalizedUnlock, PendingUnlock};
pub use roll::{RollOutcome, RollReward, resolve_roll};
pub use session::Progression;
pub use snapshot::{Snapshot, SnapshotError, apply_snapshot, apply_snapshot_value, export_snapshot};
pub use sources::{TaskSource, TaskSources};
pub use state::{Currency, ProgressionState, Progress, PullOutcome, Rejection};
pub use unlocks::{UnlockRecord, UnlockedSet};

/// Trait for abstracting save/load operations
/// Platform-specific implementations should provide this
pub trait SnapshotStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save serialized snapshot JSON under `slot`
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be written.
    fn save(&self, slot: &str, json: &str) -> Result<(), Self::Error>;

    /// Load the raw JSON saved under `slot`
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be read.
    fn load(&self, slot: &str) -> Result<Option<String>, Self::Error>;

    /// Delete a saved slot
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    fn delete(&self, slot: &str) -> Result<(), Self::Error>;
}

/// Main engine for creating, saving, and restoring progression sessions
pub struct ProgressionEngine<S>
where
    S: SnapshotStore,
{
    catalog: Arc<Catalog>,
    sources: Arc<TaskSources>,
    storage: S,
}

impl<S> ProgressionEngine<S>
where
    S: SnapshotStore,
{
    /// Create an engine over explicit catalog data and storage
    pub const fn new(catalog: Arc<Catalog>, sources: Arc<TaskSources>, storage: S) -> Self {
        Self {
            catalog,
            sources,
            storage,
        }
    }

    /// Create an engine over the bundled catalog and task sources
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled catalog fails validation.
    pub fn with_bundled_data(storage: S) -> Result<Self, CatalogError> {
        let catalog = Catalog::bundled()?;
        Ok(Self::new(
            Arc::new(catalog),
            Arc::new(TaskSources::bundled()),
            storage,
        ))
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Start a new game whose dice derive from `seed`
    #[must_use]
    pub fn create_session(&self, seed: u64) -> Progression {
        Progression::seeded(Arc::clone(&self.catalog), Arc::clone(&self.sources), seed)
    }

    /// Save a progression state
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be serialized or written.
    pub fn save_game(&self, slot: &str, state: &ProgressionState) -> Result<(), anyhow::Error>
    where
        S::Error: Into<anyhow::Error>,
    {
        let json = state
            .snapshot()
            .to_json_pretty()
            .context("serializing progression snapshot")?;
        self.storage.save(slot, &json).map_err(Into::into)
    }

    /// Load a saved game and resume it with dice derived from `seed`
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be read or is malformed.
    pub fn load_game(&self, slot: &str, seed: u64) -> Result<Option<Progression>, anyhow::Error>
    where
        S::Error: Into<anyhow::Error>,
    {
        let Some(json) = self.storage.load(slot).map_err(Into::into)? else {
            return Ok(None);
        };
        let state = apply_snapshot(&self.catalog, &json)
            .with_context(|| format!("restoring save slot {slot:?}"))?;
        Ok(Some(Progression::from_state(
            state,
            Arc::clone(&self.catalog),
            Arc::clone(&self.sources),
            seed,
        )))
    }

    /// Delete a saved game
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    pub fn delete_game(&self, slot: &str) -> Result<(), S::Error> {
        self.storage.delete(slot)
    }
}
