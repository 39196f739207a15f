//! Uniform item draws with a single duplicate re-roll.
use crate::constants::LOG_REROLL_DETAILS;
use crate::dice::Dice;
use crate::history::{History, NewEntry, RollResult};

/// Result of a gacha draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GachaDraw {
    pub accepted: bool,
    /// Accepted item, or the second rejected item.
    pub item: String,
    /// Whether the first draw was ineligible.
    pub rerolled: bool,
}

/// Draw from `pool`, re-rolling once if the first item is ineligible.
///
/// The re-roll draws from the whole pool again, so it may repeat the first
/// item. Nothing is debited here. Returns `None` for an empty pool.
pub fn resolve_gacha<D, F>(
    pool: &[String],
    is_eligible: F,
    dice: &mut D,
    history: &mut History,
    now: i64,
) -> Option<GachaDraw>
where
    D: Dice + ?Sized,
    F: Fn(&str) -> bool,
{
    let first = pool.get(dice.pick(pool.len()))?;
    if is_eligible(first) {
        return Some(GachaDraw {
            accepted: true,
            item: first.clone(),
            rerolled: false,
        });
    }

    history.push(
        NewEntry::roll(
            RollResult::Fail,
            format!("Rolled {first} (Duplicate/Maxed). Re-rolling..."),
        )
        .details(LOG_REROLL_DETAILS),
        now,
    );
    log::debug!("gacha drew ineligible {first}, re-rolling");

    let second = pool.get(dice.pick(pool.len()))?;
    Some(GachaDraw {
        accepted: is_eligible(second),
        item: second.clone(),
        rerolled: true,
    })
}
