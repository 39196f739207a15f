//! Static unlock catalog.
//!
//! Every unlockable item lives in `assets/data/catalog.json`. The catalog is
//! validated once at load so the resolvers can assume unique, non-empty pools.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::constants::{
    EQUIPMENT_TIER_MAX, LEVELS_PER_TIER, LOCKED_LEVEL_CAP, MAX_SKILL_LEVEL, SKILL_TIER_MAX,
};

const DEFAULT_CATALOG_DATA: &str = include_str!("../assets/data/catalog.json");

/// Content table a key can be spent on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Equipment,
    Skills,
    Regions,
    Mobility,
    Power,
    Minigames,
    Bosses,
}

impl Category {
    pub const ALL: [Self; 7] = [
        Self::Equipment,
        Self::Skills,
        Self::Regions,
        Self::Mobility,
        Self::Power,
        Self::Minigames,
        Self::Bosses,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equipment => "equipment",
            Self::Skills => "skills",
            Self::Regions => "regions",
            Self::Mobility => "mobility",
            Self::Power => "power",
            Self::Minigames => "minigames",
            Self::Bosses => "bosses",
        }
    }

    /// Human readable table name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Equipment => "Equipment",
            Self::Skills => "Skills",
            Self::Regions => "Regions",
            Self::Mobility => "Mobility",
            Self::Power => "Power",
            Self::Minigames => "Minigames",
            Self::Bosses => "Bosses",
        }
    }

    /// Name of one item of this table, shown on the reveal card.
    #[must_use]
    pub const fn item_label(self) -> &'static str {
        match self {
            Self::Equipment => "Equipment",
            Self::Skills => "Skill",
            Self::Regions => "Region",
            Self::Mobility => "Mobility",
            Self::Power => "Power",
            Self::Minigames => "Minigame",
            Self::Bosses => "Boss",
        }
    }

    /// Highest tier for tiered tables, `None` for tables that unlock once.
    #[must_use]
    pub const fn tier_max(self) -> Option<u8> {
        match self {
            Self::Skills => Some(SKILL_TIER_MAX),
            Self::Equipment => Some(EQUIPMENT_TIER_MAX),
            Self::Regions | Self::Mobility | Self::Power | Self::Minigames | Self::Bosses => None,
        }
    }

    #[must_use]
    pub const fn is_tiered(self) -> bool {
        self.tier_max().is_some()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "equipment" => Ok(Self::Equipment),
            "skill" | "skills" => Ok(Self::Skills),
            "region" | "regions" => Ok(Self::Regions),
            "mobility" => Ok(Self::Mobility),
            "power" => Ok(Self::Power),
            "minigame" | "minigames" => Ok(Self::Minigames),
            "boss" | "bosses" => Ok(Self::Bosses),
            _ => Err(()),
        }
    }
}

/// Level cap unlocked by a skill tier.
#[must_use]
pub const fn level_cap(tier: u8) -> u8 {
    if tier == 0 {
        LOCKED_LEVEL_CAP
    } else if tier >= SKILL_TIER_MAX {
        MAX_SKILL_LEVEL
    } else {
        tier * LEVELS_PER_TIER
    }
}

/// Skill that every fresh save starts with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineSkill {
    pub name: String,
    pub tier: u8,
    pub level: u8,
}

/// Named cluster of areas, used for log details and dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionGroup {
    pub name: String,
    pub areas: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogData {
    skills: Vec<String>,
    baseline_skill: BaselineSkill,
    equipment: Vec<String>,
    starting_areas: RegionGroup,
    region_groups: Vec<RegionGroup>,
    mobility: Vec<String>,
    power: Vec<String>,
    minigames: Vec<String>,
    bosses: Vec<String>,
}

/// Errors raised when catalog data violates its invariants.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog data is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{category} table is empty")]
    EmptyTable { category: Category },
    #[error("{category} table lists {item:?} more than once")]
    DuplicateItem { category: Category, item: String },
    #[error("region group {group:?} lists {item:?} more than once")]
    DuplicateArea { group: String, item: String },
    #[error("baseline skill {name:?} is not in the skills table")]
    UnknownBaseline { name: String },
    #[error("baseline skill tier {tier} is outside 1..={max}")]
    BaselineTier { tier: u8, max: u8 },
    #[error("baseline skill level {level} exceeds its tier cap {cap}")]
    BaselineLevel { level: u8, cap: u8 },
    #[error("{item:?} is listed as both a boss and a minigame")]
    AmbiguousLegacyItem { item: String },
}

/// Validated catalog of every unlockable item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    skills: Vec<String>,
    baseline_skill: BaselineSkill,
    equipment: Vec<String>,
    starting_areas: RegionGroup,
    region_groups: Vec<RegionGroup>,
    regions: Vec<String>,
    mobility: Vec<String>,
    power: Vec<String>,
    minigames: Vec<String>,
    bosses: Vec<String>,
}

impl Catalog {
    /// Load the catalog shipped with the crate.
    ///
    /// # Errors
    ///
    /// Returns a `CatalogError` if the bundled asset is malformed.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_json(DEFAULT_CATALOG_DATA)
    }

    /// Parse and validate catalog JSON.
    ///
    /// # Errors
    ///
    /// Returns a `CatalogError` if the JSON cannot be parsed or a table is
    /// empty, repeats an item, or the baseline skill is inconsistent.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let data: CatalogData = serde_json::from_str(json)?;
        Self::from_data(data)
    }

    fn from_data(data: CatalogData) -> Result<Self, CatalogError> {
        for group in &data.region_groups {
            ensure_unique_areas(group)?;
        }
        ensure_unique_areas(&data.starting_areas)?;

        // Areas may sit in two groups; the pool keeps the first occurrence.
        let mut seen = HashSet::new();
        let regions: Vec<String> = data
            .region_groups
            .iter()
            .flat_map(|group| group.areas.iter())
            .filter(|area| seen.insert(area.as_str()))
            .cloned()
            .collect();

        let catalog = Self {
            skills: data.skills,
            baseline_skill: data.baseline_skill,
            equipment: data.equipment,
            starting_areas: data.starting_areas,
            region_groups: data.region_groups,
            regions,
            mobility: data.mobility,
            power: data.power,
            minigames: data.minigames,
            bosses: data.bosses,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        for category in Category::ALL {
            let items = self.items(category);
            if items.is_empty() {
                return Err(CatalogError::EmptyTable { category });
            }
            let mut seen = HashSet::new();
            if let Some(dup) = items.iter().find(|item| !seen.insert(item.as_str())) {
                return Err(CatalogError::DuplicateItem {
                    category,
                    item: dup.clone(),
                });
            }
        }

        let baseline = &self.baseline_skill;
        if !self.contains(Category::Skills, &baseline.name) {
            return Err(CatalogError::UnknownBaseline {
                name: baseline.name.clone(),
            });
        }
        if baseline.tier == 0 || baseline.tier > SKILL_TIER_MAX {
            return Err(CatalogError::BaselineTier {
                tier: baseline.tier,
                max: SKILL_TIER_MAX,
            });
        }
        let cap = level_cap(baseline.tier);
        if baseline.level > cap {
            return Err(CatalogError::BaselineLevel {
                level: baseline.level,
                cap,
            });
        }

        if let Some(item) = self.bosses.iter().find(|boss| self.minigames.contains(boss)) {
            return Err(CatalogError::AmbiguousLegacyItem { item: item.clone() });
        }
        Ok(())
    }

    /// Draw pool for a table.
    #[must_use]
    pub fn items(&self, category: Category) -> &[String] {
        match category {
            Category::Equipment => &self.equipment,
            Category::Skills => &self.skills,
            Category::Regions => &self.regions,
            Category::Mobility => &self.mobility,
            Category::Power => &self.power,
            Category::Minigames => &self.minigames,
            Category::Bosses => &self.bosses,
        }
    }

    #[must_use]
    pub fn contains(&self, category: Category, item: &str) -> bool {
        self.items(category).iter().any(|candidate| candidate == item)
    }

    /// Total progress units a table can hold: tiers for tiered tables,
    /// items for one-shot tables.
    #[must_use]
    pub fn max_progress(&self, category: Category) -> u32 {
        let count = u32::try_from(self.items(category).len()).unwrap_or(u32::MAX);
        match category.tier_max() {
            Some(max) => count.saturating_mul(u32::from(max)),
            None => count,
        }
    }

    #[must_use]
    pub const fn baseline_skill(&self) -> &BaselineSkill {
        &self.baseline_skill
    }

    /// Areas available without an unlock.
    #[must_use]
    pub const fn starting_areas(&self) -> &RegionGroup {
        &self.starting_areas
    }

    #[must_use]
    pub fn region_groups(&self) -> &[RegionGroup] {
        &self.region_groups
    }

    /// Name of the first region group listing `area`.
    #[must_use]
    pub fn region_group(&self, area: &str) -> Option<&str> {
        self.region_groups
            .iter()
            .find(|group| group.areas.iter().any(|candidate| candidate == area))
            .map(|group| group.name.as_str())
    }

    /// Table a pre-split `content` entry from old saves belongs to.
    #[must_use]
    pub fn legacy_content_category(&self, item: &str) -> Option<Category> {
        if self.contains(Category::Bosses, item) {
            Some(Category::Bosses)
        } else if self.contains(Category::Minigames, item) {
            Some(Category::Minigames)
        } else {
            None
        }
    }
}

fn ensure_unique_areas(group: &RegionGroup) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    match group.areas.iter().find(|area| !seen.insert(area.as_str())) {
        Some(dup) => Err(CatalogError::DuplicateArea {
            group: group.name.clone(),
            item: dup.clone(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_json(skills: &str, bosses: &str, minigames: &str) -> String {
        format!(
            r#"{{
                "skills": {skills},
                "baseline_skill": {{ "name": "Hitpoints", "tier": 1, "level": 10 }},
                "equipment": ["Head"],
                "starting_areas": {{ "name": "Home", "areas": ["Town"] }},
                "region_groups": [
                    {{ "name": "North", "areas": ["Fort", "Camp"] }},
                    {{ "name": "South", "areas": ["Camp", "Port"] }}
                ],
                "mobility": ["Boats"],
                "power": ["Prayers"],
                "minigames": {minigames},
                "bosses": {bosses}
            }}"#
        )
    }

    #[test]
    fn bundled_catalog_loads_every_table() {
        let catalog = Catalog::bundled().unwrap();
        assert_eq!(catalog.items(Category::Skills).len(), 24);
        assert_eq!(catalog.items(Category::Equipment).len(), 11);
        assert_eq!(catalog.items(Category::Mobility).len(), 6);
        assert_eq!(catalog.items(Category::Power).len(), 5);
        assert_eq!(catalog.items(Category::Bosses).len(), 7);
        assert_eq!(catalog.items(Category::Minigames).len(), 43);
        assert_eq!(catalog.baseline_skill().name, "Hitpoints");
    }

    #[test]
    fn region_pool_collapses_areas_shared_between_groups() {
        let catalog = Catalog::bundled().unwrap();
        let regions = catalog.items(Category::Regions);
        let bandit_camps = regions.iter().filter(|r| *r == "Bandit Camp").count();
        assert_eq!(bandit_camps, 1);
        assert_eq!(catalog.region_group("Bandit Camp"), Some("Kharidian Desert"));
        assert_eq!(catalog.region_group("Varrock"), None);
        assert!(catalog.starting_areas().areas.contains(&"Varrock".to_string()));
    }

    #[test]
    fn max_progress_counts_tiers_for_tiered_tables() {
        let catalog = Catalog::bundled().unwrap();
        assert_eq!(catalog.max_progress(Category::Skills), 240);
        assert_eq!(catalog.max_progress(Category::Equipment), 99);
        assert_eq!(catalog.max_progress(Category::Power), 5);
    }

    #[test]
    fn level_cap_follows_tier_table() {
        assert_eq!(level_cap(0), 1);
        assert_eq!(level_cap(1), 10);
        assert_eq!(level_cap(3), 30);
        assert_eq!(level_cap(9), 90);
        assert_eq!(level_cap(10), 99);
    }

    #[test]
    fn category_parses_singular_and_plural_names() {
        assert_eq!("skill".parse::<Category>(), Ok(Category::Skills));
        assert_eq!("Bosses".parse::<Category>(), Ok(Category::Bosses));
        assert_eq!(" minigame ".parse::<Category>(), Ok(Category::Minigames));
        assert!("pets".parse::<Category>().is_err());
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
    }

    #[test]
    fn legacy_content_prefers_bosses() {
        let catalog = Catalog::bundled().unwrap();
        assert_eq!(
            catalog.legacy_content_category("Wintertodt"),
            Some(Category::Bosses)
        );
        assert_eq!(
            catalog.legacy_content_category("Pest Control"),
            Some(Category::Minigames)
        );
        assert_eq!(catalog.legacy_content_category("Duck Hunt"), None);
    }

    #[test]
    fn minimal_catalog_validates() {
        let json = minimal_json(r#"["Hitpoints"]"#, r#"["Giant"]"#, r#"["Races"]"#);
        let catalog = Catalog::from_json(&json).unwrap();
        assert_eq!(catalog.items(Category::Regions), ["Fort", "Camp", "Port"]);
    }

    #[test]
    fn duplicate_items_are_rejected() {
        let json = minimal_json(
            r#"["Hitpoints", "Attack", "Attack"]"#,
            r#"["Giant"]"#,
            r#"["Races"]"#,
        );
        let err = Catalog::from_json(&json).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::DuplicateItem {
                category: Category::Skills,
                ..
            }
        ));
    }

    #[test]
    fn empty_tables_and_unknown_baseline_are_rejected() {
        let empty = minimal_json(r#"["Hitpoints"]"#, "[]", r#"["Races"]"#);
        assert!(matches!(
            Catalog::from_json(&empty).unwrap_err(),
            CatalogError::EmptyTable {
                category: Category::Bosses
            }
        ));

        let no_baseline = minimal_json(r#"["Attack"]"#, r#"["Giant"]"#, r#"["Races"]"#);
        assert!(matches!(
            Catalog::from_json(&no_baseline).unwrap_err(),
            CatalogError::UnknownBaseline { .. }
        ));
    }

    #[test]
    fn overlapping_boss_and_minigame_is_rejected() {
        let json = minimal_json(r#"["Hitpoints"]"#, r#"["Giant"]"#, r#"["Giant"]"#);
        assert!(matches!(
            Catalog::from_json(&json).unwrap_err(),
            CatalogError::AmbiguousLegacyItem { .. }
        ));
    }

    #[test]
    fn malformed_json_reports_parse_error() {
        assert!(matches!(
            Catalog::from_json("{ not json").unwrap_err(),
            CatalogError::Parse(_)
        ));
    }
}
