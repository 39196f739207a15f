//! Threshold key rolls with the omni-key bonus and the pity counter.
use serde::{Deserialize, Serialize};

use crate::constants::{
    LOG_KEY_DETAILS, LOG_OMNI_KEY_DETAILS, LOG_OMNI_KEY_FOUND, LOG_PITY_DETAILS, LOG_PITY_MESSAGE,
    LOG_PITY_REWARD, OMNI_KEY_FACE, PERCENTILE_SIDES, PITY_THRESHOLD,
};
use crate::dice::Dice;
use crate::history::{History, NewEntry, RollResult};
use crate::state::Currency;

/// What a roll paid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollReward {
    Key,
    OmniKey,
    /// Failed roll that filled the pity meter.
    PityKey,
    Nothing,
}

/// Result of a single roll, for callers that want more than the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollOutcome {
    pub roll: u32,
    pub threshold: u32,
    pub success: bool,
    pub reward: RollReward,
    /// Pity counter after the roll.
    pub fate_points: u8,
}

/// Roll a percentile die against `threshold` and settle currency and pity.
///
/// A roll succeeds when it is at or under the threshold. Success throws a
/// second die; [`OMNI_KEY_FACE`] pays an omni-key, anything else a key.
/// Failure adds a fate point and pays a key when the meter fills. Exactly one
/// ROLL entry is logged, followed by a PITY entry on pity.
pub fn resolve_roll<D: Dice + ?Sized>(
    currency: &mut Currency,
    history: &mut History,
    dice: &mut D,
    source: &str,
    threshold: u32,
    now: i64,
) -> RollOutcome {
    let roll = dice.roll(PERCENTILE_SIDES);
    let success = roll <= threshold;

    let reward = if success {
        let bonus = dice.roll(PERCENTILE_SIDES);
        currency.fate_points = 0;
        if bonus == OMNI_KEY_FACE {
            currency.omni_keys = currency.omni_keys.saturating_add(1);
            history.push(
                NewEntry::roll(RollResult::Success, LOG_OMNI_KEY_FOUND)
                    .source(source)
                    .dice(roll, threshold)
                    .details(LOG_OMNI_KEY_DETAILS),
                now,
            );
            log::info!("{source}: rolled {roll} under {threshold}, omni-key drop");
            RollReward::OmniKey
        } else {
            currency.keys = currency.keys.saturating_add(1);
            history.push(
                NewEntry::roll(
                    RollResult::Success,
                    format!("Key Found! Rolled {roll} (needed ≤ {threshold})"),
                )
                .source(source)
                .dice(roll, threshold)
                .details(LOG_KEY_DETAILS),
                now,
            );
            log::debug!("{source}: rolled {roll} under {threshold}, key found");
            RollReward::Key
        }
    } else {
        let fate = currency.fate_points.saturating_add(1);
        let failure = NewEntry::roll(
            RollResult::Fail,
            format!("No Key. Rolled {roll} (needed ≤ {threshold})"),
        )
        .source(source)
        .dice(roll, threshold);

        if fate >= PITY_THRESHOLD {
            currency.fate_points = 0;
            currency.keys = currency.keys.saturating_add(1);
            history.push(failure.details(LOG_PITY_DETAILS), now);
            history.push(
                NewEntry::pity(LOG_PITY_MESSAGE).details(LOG_PITY_REWARD),
                now,
            );
            log::info!("{source}: pity meter full, key granted");
            RollReward::PityKey
        } else {
            currency.fate_points = fate;
            history.push(
                failure.details(format!("Fate Points: {fate}/{PITY_THRESHOLD}")),
                now,
            );
            log::debug!("{source}: rolled {roll} over {threshold}, fate {fate}");
            RollReward::Nothing
        }
    };

    RollOutcome {
        roll,
        threshold,
        success,
        reward,
        fate_points: currency.fate_points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::{CountingDice, ScriptedDice};
    use crate::history::LogKind;

    fn roll_with(
        currency: &mut Currency,
        history: &mut History,
        script: &[u32],
        threshold: u32,
    ) -> RollOutcome {
        let mut dice = ScriptedDice::new(script.iter().copied());
        resolve_roll(currency, history, &mut dice, "Test", threshold, 0)
    }

    #[test]
    fn success_pays_a_key_and_clears_pity() {
        let mut currency = Currency {
            fate_points: 12,
            ..Currency::default()
        };
        let mut history = History::new();
        let outcome = roll_with(&mut currency, &mut history, &[20, 5], 20);
        assert!(outcome.success);
        assert_eq!(outcome.reward, RollReward::Key);
        assert_eq!(currency.keys, 1);
        assert_eq!(currency.fate_points, 0);
        let entry = history.last().unwrap();
        assert_eq!(entry.message, "Key Found! Rolled 20 (needed ≤ 20)");
        assert_eq!(entry.result, Some(RollResult::Success));
        assert_eq!(entry.source.as_deref(), Some("Test"));
    }

    #[test]
    fn bonus_face_pays_an_omni_key_instead() {
        let mut currency = Currency::default();
        let mut history = History::new();
        let outcome = roll_with(&mut currency, &mut history, &[1, 100], 50);
        assert_eq!(outcome.reward, RollReward::OmniKey);
        assert_eq!(currency.keys, 0);
        assert_eq!(currency.omni_keys, 1);
        assert_eq!(history.last().unwrap().message, LOG_OMNI_KEY_FOUND);
    }

    #[test]
    fn failure_adds_a_fate_point() {
        let mut currency = Currency::default();
        let mut history = History::new();
        let outcome = roll_with(&mut currency, &mut history, &[21], 20);
        assert!(!outcome.success);
        assert_eq!(outcome.fate_points, 1);
        assert_eq!(currency.keys, 0);
        let entry = history.last().unwrap();
        assert_eq!(entry.details.as_deref(), Some("Fate Points: 1/50"));
        assert_eq!(entry.roll_value, Some(21));
        assert_eq!(entry.threshold, Some(20));
    }

    #[test]
    fn failure_does_not_throw_the_bonus_die() {
        let mut currency = Currency::default();
        let mut history = History::new();
        let mut dice = ScriptedDice::new([90, 100]);
        resolve_roll(&mut currency, &mut history, &mut dice, "Test", 10, 0);
        assert_eq!(dice.remaining(), 1);
    }

    #[test]
    fn forty_ninth_failure_triggers_pity_on_next() {
        let mut currency = Currency {
            fate_points: 49,
            ..Currency::default()
        };
        let mut history = History::new();
        let outcome = roll_with(&mut currency, &mut history, &[100], 99);
        assert_eq!(outcome.reward, RollReward::PityKey);
        assert_eq!(currency.keys, 1);
        assert_eq!(currency.fate_points, 0);
        assert_eq!(history.len(), 2);
        assert_eq!(history.entries()[0].details.as_deref(), Some(LOG_PITY_DETAILS));
        assert_eq!(history.entries()[1].kind, LogKind::Pity);
        assert_eq!(history.entries()[1].details.as_deref(), Some(LOG_PITY_REWARD));
    }

    #[test]
    fn certain_threshold_always_succeeds() {
        let mut currency = Currency::default();
        let mut history = History::new();
        let mut dice = CountingDice::seeded(9);
        for _ in 0..200 {
            let outcome = resolve_roll(&mut currency, &mut history, &mut dice, "Test", 100, 0);
            assert!(outcome.success);
        }
        assert_eq!(currency.fate_points, 0);
        assert_eq!(u64::from(currency.keys + currency.omni_keys), 200);
    }
}
