//! Centralized balance and tuning constants for Fate-Locked progression logic.
//!
//! These values define the deterministic math for the key economy. Catalog
//! contents live in JSON assets; the odds live here so they only change
//! through reviewed code.

// Dice ---------------------------------------------------------------------
/// Faces on every percentile die used by the roll resolver.
pub const PERCENTILE_SIDES: u32 = 100;
/// Bonus die face that converts a standard key into an omni-key.
pub const OMNI_KEY_FACE: u32 = 100;

// Pity ---------------------------------------------------------------------
/// Consecutive failures that grant a pity key.
pub const PITY_THRESHOLD: u8 = 50;

// New game -----------------------------------------------------------------
pub const STARTING_KEYS: u32 = 3;
pub const STARTING_OMNI_KEYS: u32 = 0;

// Tiers --------------------------------------------------------------------
pub const SKILL_TIER_MAX: u8 = 10;
pub const EQUIPMENT_TIER_MAX: u8 = 9;

// Skill levels -------------------------------------------------------------
/// Level available to a skill that has no tier yet.
pub const LOCKED_LEVEL_CAP: u8 = 1;
/// Levels granted per skill tier below the top tier.
pub const LEVELS_PER_TIER: u8 = 10;
/// Level cap once a skill reaches its top tier.
pub const MAX_SKILL_LEVEL: u8 = 99;
/// Level assigned to every skill in a fresh save.
pub const DEFAULT_SKILL_LEVEL: u8 = 1;

// Log text -----------------------------------------------------------------
pub(crate) const LOG_OMNI_KEY_FOUND: &str = "LEGENDARY DROP! You found an Omni-Key!";
pub(crate) const LOG_OMNI_KEY_DETAILS: &str = "Can be used to unlock ANY specific item directly.";
pub(crate) const LOG_KEY_DETAILS: &str = "Fate points reset to 0.";
pub(crate) const LOG_PITY_DETAILS: &str = "MAX FATE REACHED! Pity Key granted.";
pub(crate) const LOG_PITY_MESSAGE: &str = "The Fates take pity on you.";
pub(crate) const LOG_PITY_REWARD: &str = "+1 Key Added";
pub(crate) const LOG_REROLL_DETAILS: &str = "Fate allows one re-roll.";
pub(crate) const LOG_KEY_CRUMBLES: &str = "The key crumbles to dust.";
pub(crate) const LOG_KEY_CRUMBLES_NO_UNLOCK: &str = "The key crumbles to dust. No unlock.";
