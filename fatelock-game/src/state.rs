//! Owned progression state and the player-facing operations on it.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{Catalog, Category};
use crate::constants::{
    LOG_KEY_CRUMBLES, LOG_KEY_CRUMBLES_NO_UNLOCK, STARTING_KEYS, STARTING_OMNI_KEYS,
};
use crate::dice::Dice;
use crate::gacha::resolve_gacha;
use crate::history::{History, NewEntry, RollResult};
use crate::pending::{CostKind, PendingUnlock};
use crate::roll::{RollOutcome, resolve_roll};
use crate::sources::TaskSources;
use crate::unlocks::UnlockRecord;

/// Spendable currencies and the pity meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Currency {
    pub keys: u32,
    pub omni_keys: u32,
    /// Consecutive failed rolls, always below the pity threshold between
    /// operations.
    pub fate_points: u8,
}

/// Reasons a request was refused. A refused request changes nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("no keys left")]
    NoKeys,
    #[error("no omni-keys left")]
    NoOmniKeys,
    #[error("every {category} item is already unlocked")]
    CategoryComplete { category: Category },
    #[error("an unlock is already waiting to be finalized")]
    PendingOutstanding,
    #[error("{item:?} is not in the {category} table")]
    UnknownItem { category: Category, item: String },
    #[error("{item:?} is already fully unlocked")]
    AlreadyComplete { category: Category, item: String },
    #[error("{skill} has no tier yet")]
    SkillLocked { skill: String },
    #[error("{skill} is at level {level}, the cap for its tier")]
    LevelCapped { skill: String, level: u8 },
    #[error("unknown task source {id:?}")]
    UnknownSource { id: String },
}

/// Outcome of spending a key on a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullOutcome {
    /// An item was revealed and awaits finalize; the key is not spent yet.
    Revealed(PendingUnlock),
    /// Both draws were ineligible; the key was spent.
    Crumbled { item: String },
}

/// Owned/maximum progress pair for a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub owned: u32,
    pub max: u32,
}

/// Complete progression state. The only way to mutate it is through its
/// operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressionState {
    pub(crate) currency: Currency,
    pub(crate) unlocks: UnlockRecord,
    pub(crate) history: History,
    pub(crate) pending: Option<PendingUnlock>,
    pub(crate) next_ticket: u64,
}

impl ProgressionState {
    /// Fresh save with starting keys and the baseline skill.
    #[must_use]
    pub fn new_game(catalog: &Catalog) -> Self {
        Self::from_parts(
            Currency {
                keys: STARTING_KEYS,
                omni_keys: STARTING_OMNI_KEYS,
                fate_points: 0,
            },
            UnlockRecord::new_game(catalog),
            History::new(),
        )
    }

    pub(crate) const fn from_parts(
        currency: Currency,
        unlocks: UnlockRecord,
        history: History,
    ) -> Self {
        Self {
            currency,
            unlocks,
            history,
            pending: None,
            next_ticket: 1,
        }
    }

    #[must_use]
    pub const fn currency(&self) -> Currency {
        self.currency
    }

    #[must_use]
    pub const fn keys(&self) -> u32 {
        self.currency.keys
    }

    #[must_use]
    pub const fn omni_keys(&self) -> u32 {
        self.currency.omni_keys
    }

    #[must_use]
    pub const fn fate_points(&self) -> u8 {
        self.currency.fate_points
    }

    #[must_use]
    pub const fn unlocks(&self) -> &UnlockRecord {
        &self.unlocks
    }

    #[must_use]
    pub const fn history(&self) -> &History {
        &self.history
    }

    /// Roll for a key against an arbitrary threshold.
    pub fn roll<D: Dice + ?Sized>(
        &mut self,
        source: &str,
        threshold: u32,
        dice: &mut D,
        now: i64,
    ) -> RollOutcome {
        resolve_roll(
            &mut self.currency,
            &mut self.history,
            dice,
            source,
            threshold,
            now,
        )
    }

    /// Roll for a key using a task source's odds.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::UnknownSource`] when `source_id` is not in the
    /// source table.
    pub fn complete_task<D: Dice + ?Sized>(
        &mut self,
        sources: &TaskSources,
        source_id: &str,
        dice: &mut D,
        now: i64,
    ) -> Result<RollOutcome, Rejection> {
        let source = sources.get(source_id).ok_or_else(|| Rejection::UnknownSource {
            id: source_id.to_string(),
        })?;
        Ok(self.roll(&source.label, source.chance, dice, now))
    }

    /// Spend a key on a random item from `category`.
    ///
    /// # Errors
    ///
    /// Rejects when no key is held, an unlock is pending, or every item in
    /// the table is already complete.
    pub fn pull<D: Dice + ?Sized>(
        &mut self,
        catalog: &Catalog,
        category: Category,
        dice: &mut D,
        now: i64,
    ) -> Result<PullOutcome, Rejection> {
        if self.currency.keys == 0 {
            return Err(Rejection::NoKeys);
        }
        if self.pending.is_some() {
            return Err(Rejection::PendingOutstanding);
        }
        if !self.can_unlock(catalog, category) {
            return Err(Rejection::CategoryComplete { category });
        }

        let unlocks = &self.unlocks;
        let draw = resolve_gacha(
            catalog.items(category),
            |item| unlocks.is_eligible(category, item),
            dice,
            &mut self.history,
            now,
        )
        .ok_or(Rejection::CategoryComplete { category })?;

        if draw.accepted {
            let pending = self.begin_pending(catalog, category, &draw.item, CostKind::Standard)?;
            return Ok(PullOutcome::Revealed(pending.clone()));
        }

        self.currency.keys -= 1;
        let details = if category.is_tiered() {
            LOG_KEY_CRUMBLES
        } else {
            LOG_KEY_CRUMBLES_NO_UNLOCK
        };
        self.history.push(
            NewEntry::roll(RollResult::Fail, format!("Re-roll: {} (Duplicate).", draw.item))
                .details(details),
            now,
        );
        log::debug!("{category} pull crumbled on {}", draw.item);
        Ok(PullOutcome::Crumbled { item: draw.item })
    }

    /// Spend an omni-key on a chosen item.
    ///
    /// # Errors
    ///
    /// Rejects when no omni-key is held, an unlock is pending, or the item is
    /// unknown or already complete.
    pub fn special_unlock(
        &mut self,
        catalog: &Catalog,
        category: Category,
        item: &str,
    ) -> Result<&PendingUnlock, Rejection> {
        self.check_special_unlock(catalog, category, item)?;
        self.begin_pending(catalog, category, item, CostKind::Rare)
    }

    fn check_special_unlock(
        &self,
        catalog: &Catalog,
        category: Category,
        item: &str,
    ) -> Result<(), Rejection> {
        if self.currency.omni_keys == 0 {
            return Err(Rejection::NoOmniKeys);
        }
        if self.pending.is_some() {
            return Err(Rejection::PendingOutstanding);
        }
        if !catalog.contains(category, item) {
            return Err(Rejection::UnknownItem {
                category,
                item: item.to_string(),
            });
        }
        if !self.unlocks.is_eligible(category, item) {
            return Err(Rejection::AlreadyComplete {
                category,
                item: item.to_string(),
            });
        }
        Ok(())
    }

    /// Raise a skill one level and roll with the new level as the threshold.
    ///
    /// # Errors
    ///
    /// Rejects unknown skills, skills without a tier (the baseline skill is
    /// exempt), and skills already at their tier's level cap.
    pub fn level_up<D: Dice + ?Sized>(
        &mut self,
        catalog: &Catalog,
        skill: &str,
        dice: &mut D,
        now: i64,
    ) -> Result<RollOutcome, Rejection> {
        self.check_level_up(catalog, skill)?;
        let level = self.unlocks.level(skill) + 1;
        self.unlocks.levels.insert(skill.to_string(), level);
        log::debug!("{skill} levelled to {level}");
        Ok(self.roll(
            &format!("{skill} Level {level}"),
            u32::from(level),
            dice,
            now,
        ))
    }

    fn check_level_up(&self, catalog: &Catalog, skill: &str) -> Result<(), Rejection> {
        if !catalog.contains(Category::Skills, skill) {
            return Err(Rejection::UnknownItem {
                category: Category::Skills,
                item: skill.to_string(),
            });
        }
        let tier = self.unlocks.tier(Category::Skills, skill);
        if tier == 0 && skill != catalog.baseline_skill().name {
            return Err(Rejection::SkillLocked {
                skill: skill.to_string(),
            });
        }
        let level = self.unlocks.level(skill);
        if level >= self.unlocks.level_cap(skill) {
            return Err(Rejection::LevelCapped {
                skill: skill.to_string(),
                level,
            });
        }
        Ok(())
    }

    // Queries ---------------------------------------------------------------

    /// Whether any item in `category` can still gain progress.
    #[must_use]
    pub fn can_unlock(&self, catalog: &Catalog, category: Category) -> bool {
        catalog
            .items(category)
            .iter()
            .any(|item| self.unlocks.is_eligible(category, item))
    }

    /// Progress units still available in `category`.
    #[must_use]
    pub fn remaining(&self, catalog: &Catalog, category: Category) -> u32 {
        let progress = self.progress(catalog, category);
        progress.max.saturating_sub(progress.owned)
    }

    #[must_use]
    pub fn progress(&self, catalog: &Catalog, category: Category) -> Progress {
        Progress {
            owned: self.unlocks.progress(category),
            max: catalog.max_progress(category),
        }
    }

    #[must_use]
    pub fn tier(&self, category: Category, item: &str) -> u8 {
        self.unlocks.tier(category, item)
    }

    #[must_use]
    pub fn level(&self, skill: &str) -> u8 {
        self.unlocks.level(skill)
    }

    #[must_use]
    pub fn level_cap(&self, skill: &str) -> u8 {
        self.unlocks.level_cap(skill)
    }

    #[must_use]
    pub fn can_level_up(&self, catalog: &Catalog, skill: &str) -> bool {
        self.check_level_up(catalog, skill).is_ok()
    }

    #[must_use]
    pub fn can_special_unlock(&self, catalog: &Catalog, category: Category, item: &str) -> bool {
        self.check_special_unlock(catalog, category, item).is_ok()
    }

    #[must_use]
    pub const fn pending(&self) -> Option<&PendingUnlock> {
        self.pending.as_ref()
    }
}
