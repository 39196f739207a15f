//! Two-phase unlocks: a revealed item waits here until it is finalized.
//!
//! A pull or special unlock only *reveals* an item. The currency is debited
//! and the record updated in [`ProgressionState::finalize`], which consumes
//! the pending slot exactly once. Display metadata arriving later is matched
//! by ticket so a late result can never decorate a different reveal.
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, Category, level_cap};
use crate::history::NewEntry;
use crate::state::{ProgressionState, Rejection};

/// Currency a pending unlock is paid with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostKind {
    /// One key, from a gacha pull.
    Standard,
    /// One omni-key, from a chosen unlock.
    Rare,
}

/// Presentation hints for the reveal.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisplayMeta {
    pub display_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Revealed item awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingUnlock {
    pub category: Category,
    pub item: String,
    pub cost: CostKind,
    pub ticket: u64,
    pub display: DisplayMeta,
}

/// What a finalize applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizedUnlock {
    pub category: Category,
    pub item: String,
    pub cost: CostKind,
    /// Tier after the upgrade, for tiered tables.
    pub tier: Option<u8>,
    /// False when a set item was already present.
    pub newly_added: bool,
}

impl ProgressionState {
    /// Open the pending slot.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::PendingOutstanding`] if an unlock is already
    /// waiting, or [`Rejection::UnknownItem`] if `item` is not in the
    /// catalog table for `category`.
    pub fn begin_pending(
        &mut self,
        catalog: &Catalog,
        category: Category,
        item: &str,
        cost: CostKind,
    ) -> Result<&PendingUnlock, Rejection> {
        if self.pending.is_some() {
            return Err(Rejection::PendingOutstanding);
        }
        if !catalog.contains(category, item) {
            return Err(Rejection::UnknownItem {
                category,
                item: item.to_string(),
            });
        }
        let ticket = self.next_ticket;
        self.next_ticket = self.next_ticket.wrapping_add(1);
        log::debug!("revealed {category} {item} (ticket {ticket}, {cost:?})");
        Ok(&*self.pending.insert(PendingUnlock {
            category,
            item: item.to_string(),
            cost,
            ticket,
            display: DisplayMeta {
                display_type: category.item_label().to_string(),
                image_url: None,
            },
        }))
    }

    /// Apply the pending unlock: debit its cost, raise the tier or insert
    /// into the set, and log it. Returns `None` when nothing is pending.
    pub fn finalize(&mut self, catalog: &Catalog, now: i64) -> Option<FinalizedUnlock> {
        let PendingUnlock {
            category,
            item,
            cost,
            ..
        } = self.pending.take()?;

        match cost {
            CostKind::Standard => self.currency.keys = self.currency.keys.saturating_sub(1),
            CostKind::Rare => {
                self.currency.omni_keys = self.currency.omni_keys.saturating_sub(1);
            }
        }

        let mut tier = None;
        let mut newly_added = false;
        let entry = match category.tier_max() {
            Some(max) => {
                let new_tier = self
                    .unlocks
                    .tier_map_mut(category)
                    .map_or(0, |map| {
                        let slot = map.entry(item.clone()).or_insert(0);
                        *slot = slot.saturating_add(1).min(max);
                        *slot
                    });
                tier = Some(new_tier);
                let details = if category == Category::Skills {
                    format!(
                        "Tier {new_tier} Unlocked (Levels 1-{})",
                        level_cap(new_tier)
                    )
                } else {
                    format!("Tier {new_tier} Unlocked")
                };
                NewEntry::unlock(format!("Upgraded: {item}")).details(details)
            }
            None => {
                newly_added = self
                    .unlocks
                    .set_mut(category)
                    .is_some_and(|set| set.insert(&item));
                set_unlock_entry(catalog, category, &item)
            }
        };
        self.history.push(entry, now);
        log::info!("unlocked {category} {item} ({cost:?})");

        Some(FinalizedUnlock {
            category,
            item,
            cost,
            tier,
            newly_added,
        })
    }

    /// Attach display metadata if `ticket` is still the pending reveal.
    /// Returns whether it was applied.
    pub fn enrich_pending(&mut self, ticket: u64, meta: DisplayMeta) -> bool {
        match self.pending.as_mut() {
            Some(pending) if pending.ticket == ticket => {
                pending.display = meta;
                true
            }
            _ => {
                log::debug!("dropping stale display data for ticket {ticket}");
                false
            }
        }
    }

    /// Record that display enrichment failed. Never affects state.
    pub fn report_enrichment_failure(&self, ticket: u64, reason: &str) {
        log::warn!("display enrichment for ticket {ticket} failed: {reason}");
    }
}

fn set_unlock_entry(catalog: &Catalog, category: Category, item: &str) -> NewEntry {
    match category {
        Category::Regions => {
            let details = catalog
                .region_group(item)
                .map_or_else(|| "New Territory".to_string(), |group| format!("({group})"));
            NewEntry::unlock(format!("Unlocked Area: {item}")).details(details)
        }
        Category::Mobility => NewEntry::unlock(format!("Unlocked Mobility: {item}"))
            .details("Travel Network Expanded"),
        Category::Power => NewEntry::unlock(format!("Unlocked Power: {item}"))
            .details("Ancient secrets revealed..."),
        Category::Minigames => NewEntry::unlock(format!("Unlocked Minigame: {item}"))
            .details("New activity available"),
        Category::Bosses => NewEntry::unlock(format!("Unlocked Boss: {item}"))
            .details("A major threat appears..."),
        Category::Equipment | Category::Skills => {
            NewEntry::unlock(format!("Upgraded: {item}"))
        }
    }
}
