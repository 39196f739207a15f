use rand_chacha::ChaCha20Rng;
use std::sync::Arc;

use crate::catalog::{Catalog, Category};
use crate::clock::{Clock, SystemClock};
use crate::dice::{CountingDice, Dice, DiceStreams};
use crate::pending::{DisplayMeta, FinalizedUnlock, PendingUnlock};
use crate::roll::RollOutcome;
use crate::snapshot::{Snapshot, SnapshotError};
use crate::sources::TaskSources;
use crate::state::{ProgressionState, PullOutcome, Rejection};

/// Progression state bound to its catalog, dice streams, and clock.
#[derive(Debug, Clone)]
pub struct Progression<D = CountingDice<ChaCha20Rng>, C = SystemClock> {
    state: ProgressionState,
    catalog: Arc<Catalog>,
    sources: Arc<TaskSources>,
    roll_dice: D,
    gacha_dice: D,
    clock: C,
}

impl Progression {
    /// Fresh game with dice derived from `seed`.
    #[must_use]
    pub fn seeded(catalog: Arc<Catalog>, sources: Arc<TaskSources>, seed: u64) -> Self {
        let state = ProgressionState::new_game(&catalog);
        Self::from_state(state, catalog, sources, seed)
    }

    /// Resume an existing state with dice derived from `seed`.
    #[must_use]
    pub fn from_state(
        state: ProgressionState,
        catalog: Arc<Catalog>,
        sources: Arc<TaskSources>,
        seed: u64,
    ) -> Self {
        let DiceStreams { roll, gacha } = DiceStreams::from_user_seed(seed);
        Self::new(state, catalog, sources, roll, gacha, SystemClock)
    }
}

impl<D: Dice, C: Clock> Progression<D, C> {
    #[must_use]
    pub const fn new(
        state: ProgressionState,
        catalog: Arc<Catalog>,
        sources: Arc<TaskSources>,
        roll_dice: D,
        gacha_dice: D,
        clock: C,
    ) -> Self {
        Self {
            state,
            catalog,
            sources,
            roll_dice,
            gacha_dice,
            clock,
        }
    }

    /// Swap the clock, keeping everything else.
    #[must_use]
    pub fn with_clock<C2: Clock>(self, clock: C2) -> Progression<D, C2> {
        Progression {
            state: self.state,
            catalog: self.catalog,
            sources: self.sources,
            roll_dice: self.roll_dice,
            gacha_dice: self.gacha_dice,
            clock,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &ProgressionState {
        &self.state
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn sources(&self) -> &TaskSources {
        &self.sources
    }

    #[must_use]
    pub const fn roll_dice(&self) -> &D {
        &self.roll_dice
    }

    #[must_use]
    pub const fn gacha_dice(&self) -> &D {
        &self.gacha_dice
    }

    #[must_use]
    pub fn into_state(self) -> ProgressionState {
        self.state
    }

    /// Roll for a key with a task source's odds.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::UnknownSource`] for an unknown source id.
    pub fn complete_task(&mut self, source_id: &str) -> Result<RollOutcome, Rejection> {
        let now = self.clock.now_millis();
        self.state
            .complete_task(&self.sources, source_id, &mut self.roll_dice, now)
    }

    /// Roll for a key against an arbitrary threshold.
    pub fn roll(&mut self, source: &str, threshold: u32) -> RollOutcome {
        let now = self.clock.now_millis();
        self.state.roll(source, threshold, &mut self.roll_dice, now)
    }

    /// Spend a key on a random item.
    ///
    /// # Errors
    ///
    /// See [`ProgressionState::pull`].
    pub fn pull(&mut self, category: Category) -> Result<PullOutcome, Rejection> {
        let now = self.clock.now_millis();
        self.state
            .pull(&self.catalog, category, &mut self.gacha_dice, now)
    }

    /// Spend an omni-key on a chosen item.
    ///
    /// # Errors
    ///
    /// See [`ProgressionState::special_unlock`].
    pub fn special_unlock(
        &mut self,
        category: Category,
        item: &str,
    ) -> Result<&PendingUnlock, Rejection> {
        self.state.special_unlock(&self.catalog, category, item)
    }

    pub fn finalize(&mut self) -> Option<FinalizedUnlock> {
        let now = self.clock.now_millis();
        self.state.finalize(&self.catalog, now)
    }

    /// Level a skill and roll at the new level.
    ///
    /// # Errors
    ///
    /// See [`ProgressionState::level_up`].
    pub fn level_up(&mut self, skill: &str) -> Result<RollOutcome, Rejection> {
        let now = self.clock.now_millis();
        self.state
            .level_up(&self.catalog, skill, &mut self.roll_dice, now)
    }

    pub fn enrich_pending(&mut self, ticket: u64, meta: DisplayMeta) -> bool {
        self.state.enrich_pending(ticket, meta)
    }

    pub fn report_enrichment_failure(&self, ticket: u64, reason: &str) {
        self.state.report_enrichment_failure(ticket, reason);
    }

    #[must_use]
    pub fn export(&self) -> Snapshot {
        self.state.snapshot()
    }

    /// Replace the state with an imported save; dice and clock are kept.
    ///
    /// # Errors
    ///
    /// Returns a [`SnapshotError`] and leaves the state untouched if the save
    /// is malformed.
    pub fn import(&mut self, json: &str) -> Result<(), SnapshotError> {
        self.state.import(&self.catalog, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::dice::ScriptedDice;

    fn shared() -> (Arc<Catalog>, Arc<TaskSources>) {
        (
            Arc::new(Catalog::bundled().unwrap()),
            Arc::new(TaskSources::bundled()),
        )
    }

    #[test]
    fn seeded_sessions_replay_identically() {
        let (catalog, sources) = shared();
        let mut a = Progression::seeded(Arc::clone(&catalog), Arc::clone(&sources), 77)
            .with_clock(FixedClock(1));
        let mut b = Progression::seeded(catalog, sources, 77).with_clock(FixedClock(1));
        for _ in 0..40 {
            a.complete_task("clue_hard").unwrap();
            b.complete_task("clue_hard").unwrap();
            if a.pull(Category::Regions).is_ok() {
                a.finalize();
            }
            if b.pull(Category::Regions).is_ok() {
                b.finalize();
            }
        }
        assert_eq!(a.export(), b.export());
        assert!(a.roll_dice().throws() >= 40);
    }

    #[test]
    fn scripted_session_runs_a_full_cycle() {
        let (catalog, sources) = shared();
        let state = ProgressionState::new_game(&catalog);
        let inferno = catalog
            .items(Category::Bosses)
            .iter()
            .position(|boss| boss == "Inferno")
            .unwrap();
        let mut session = Progression::new(
            state,
            catalog,
            sources,
            ScriptedDice::new([5, 40]),
            ScriptedDice::new([u32::try_from(inferno).unwrap()]),
            FixedClock(1_700_000_000_000),
        );

        let outcome = session.complete_task("quest_novice").unwrap();
        assert!(outcome.success);
        assert_eq!(session.state().keys(), 4);

        let PullOutcome::Revealed(pending) = session.pull(Category::Bosses).unwrap() else {
            panic!("expected a reveal");
        };
        assert!(session.enrich_pending(
            pending.ticket,
            DisplayMeta {
                display_type: "Boss".into(),
                image_url: Some("inferno.png".into()),
            }
        ));
        let done = session.finalize().unwrap();
        assert_eq!(done.item, "Inferno");
        assert_eq!(session.state().keys(), 3);
        assert!(
            session
                .state()
                .history()
                .iter()
                .all(|entry| entry.timestamp == 1_700_000_000_000)
        );
    }

    #[test]
    fn import_keeps_session_on_error() {
        let (catalog, sources) = shared();
        let mut session = Progression::seeded(catalog, sources, 1);
        session.roll("Manual", 100);
        let before = session.export();
        assert!(session.import("42").is_err());
        assert_eq!(session.export(), before);
        session.import(r#"{"keys":9}"#).unwrap();
        assert_eq!(session.state().keys(), 9);
    }
}
