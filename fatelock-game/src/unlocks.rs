//! Per-category unlock records.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::{Catalog, Category, level_cap};
use crate::constants::DEFAULT_SKILL_LEVEL;

/// Insertion-ordered set of unlocked names.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnlockedSet(Vec<String>);

impl UnlockedSet {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Add `item`; returns `false` when it was already present.
    pub fn insert(&mut self, item: &str) -> bool {
        if self.contains(item) {
            return false;
        }
        self.0.push(item.to_string());
        true
    }

    #[must_use]
    pub fn contains(&self, item: &str) -> bool {
        self.0.iter().any(|owned| owned == item)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for UnlockedSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for item in iter {
            let item = item.into();
            set.insert(&item);
        }
        set
    }
}

/// Everything the player has unlocked, keyed by table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnlockRecord {
    /// Slot name to tier.
    pub equipment: BTreeMap<String, u8>,
    /// Skill name to tier.
    pub skills: BTreeMap<String, u8>,
    /// Skill name to level.
    pub levels: BTreeMap<String, u8>,
    pub regions: UnlockedSet,
    pub mobility: UnlockedSet,
    pub power: UnlockedSet,
    pub minigames: UnlockedSet,
    pub bosses: UnlockedSet,
}

impl UnlockRecord {
    /// Fresh-save record: every slot at tier 0, the baseline skill seeded.
    #[must_use]
    pub fn new_game(catalog: &Catalog) -> Self {
        let baseline = catalog.baseline_skill();
        let equipment = catalog
            .items(Category::Equipment)
            .iter()
            .map(|slot| (slot.clone(), 0))
            .collect();
        let levels = catalog
            .items(Category::Skills)
            .iter()
            .map(|skill| {
                let level = if *skill == baseline.name {
                    baseline.level
                } else {
                    DEFAULT_SKILL_LEVEL
                };
                (skill.clone(), level)
            })
            .collect();
        let skills = BTreeMap::from([(baseline.name.clone(), baseline.tier)]);

        Self {
            equipment,
            skills,
            levels,
            ..Self::default()
        }
    }

    /// Current tier of a tiered item; 0 for set tables and unknown names.
    #[must_use]
    pub fn tier(&self, category: Category, item: &str) -> u8 {
        self.tier_map(category)
            .and_then(|map| map.get(item).copied())
            .unwrap_or(0)
    }

    #[must_use]
    pub fn level(&self, skill: &str) -> u8 {
        self.levels
            .get(skill)
            .copied()
            .unwrap_or(DEFAULT_SKILL_LEVEL)
    }

    /// Highest level reachable at the skill's current tier.
    #[must_use]
    pub fn level_cap(&self, skill: &str) -> u8 {
        level_cap(self.tier(Category::Skills, skill))
    }

    #[must_use]
    pub const fn tier_map(&self, category: Category) -> Option<&BTreeMap<String, u8>> {
        match category {
            Category::Equipment => Some(&self.equipment),
            Category::Skills => Some(&self.skills),
            _ => None,
        }
    }

    pub const fn tier_map_mut(&mut self, category: Category) -> Option<&mut BTreeMap<String, u8>> {
        match category {
            Category::Equipment => Some(&mut self.equipment),
            Category::Skills => Some(&mut self.skills),
            _ => None,
        }
    }

    #[must_use]
    pub const fn set(&self, category: Category) -> Option<&UnlockedSet> {
        match category {
            Category::Regions => Some(&self.regions),
            Category::Mobility => Some(&self.mobility),
            Category::Power => Some(&self.power),
            Category::Minigames => Some(&self.minigames),
            Category::Bosses => Some(&self.bosses),
            Category::Equipment | Category::Skills => None,
        }
    }

    pub const fn set_mut(&mut self, category: Category) -> Option<&mut UnlockedSet> {
        match category {
            Category::Regions => Some(&mut self.regions),
            Category::Mobility => Some(&mut self.mobility),
            Category::Power => Some(&mut self.power),
            Category::Minigames => Some(&mut self.minigames),
            Category::Bosses => Some(&mut self.bosses),
            Category::Equipment | Category::Skills => None,
        }
    }

    /// Whether `item` can still gain progress: below its tier max, or not
    /// yet in its set.
    #[must_use]
    pub fn is_eligible(&self, category: Category, item: &str) -> bool {
        match (category.tier_max(), self.set(category)) {
            (Some(max), _) => self.tier(category, item) < max,
            (None, Some(set)) => !set.contains(item),
            (None, None) => false,
        }
    }

    /// Progress units owned in a table: summed tiers, or set size.
    #[must_use]
    pub fn progress(&self, category: Category) -> u32 {
        if let Some(map) = self.tier_map(category) {
            map.values().map(|tier| u32::from(*tier)).sum()
        } else {
            self.set(category)
                .map_or(0, |set| u32::try_from(set.len()).unwrap_or(u32::MAX))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::bundled().unwrap()
    }

    #[test]
    fn new_game_seeds_baseline_skill() {
        let catalog = catalog();
        let record = UnlockRecord::new_game(&catalog);
        assert_eq!(record.tier(Category::Skills, "Hitpoints"), 1);
        assert_eq!(record.level("Hitpoints"), 10);
        assert_eq!(record.level("Attack"), 1);
        assert_eq!(record.tier(Category::Skills, "Attack"), 0);
        assert_eq!(record.equipment.len(), 11);
        assert!(record.equipment.values().all(|tier| *tier == 0));
        assert_eq!(record.levels.len(), 24);
        assert!(record.regions.is_empty());
    }

    #[test]
    fn level_cap_tracks_skill_tier() {
        let catalog = catalog();
        let mut record = UnlockRecord::new_game(&catalog);
        assert_eq!(record.level_cap("Attack"), 1);
        assert_eq!(record.level_cap("Hitpoints"), 10);
        record.skills.insert("Attack".into(), 10);
        assert_eq!(record.level_cap("Attack"), 99);
    }

    #[test]
    fn eligibility_respects_tier_max_and_sets() {
        let catalog = catalog();
        let mut record = UnlockRecord::new_game(&catalog);
        assert!(record.is_eligible(Category::Equipment, "Head"));
        record.equipment.insert("Head".into(), 9);
        assert!(!record.is_eligible(Category::Equipment, "Head"));

        assert!(record.is_eligible(Category::Bosses, "Wintertodt"));
        assert!(record.bosses.insert("Wintertodt"));
        assert!(!record.bosses.insert("Wintertodt"));
        assert!(!record.is_eligible(Category::Bosses, "Wintertodt"));
    }

    #[test]
    fn progress_sums_tiers_and_counts_sets() {
        let catalog = catalog();
        let mut record = UnlockRecord::new_game(&catalog);
        assert_eq!(record.progress(Category::Skills), 1);
        record.equipment.insert("Head".into(), 3);
        record.equipment.insert("Cape".into(), 2);
        assert_eq!(record.progress(Category::Equipment), 5);
        record.power.insert("Protection Prayers");
        assert_eq!(record.progress(Category::Power), 1);
    }

    #[test]
    fn unlocked_set_collects_without_duplicates() {
        let set: UnlockedSet = ["Boats", "Boats", "Gliders"].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), ["Boats", "Gliders"]);
    }
}
