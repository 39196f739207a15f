//! Injectable randomness for the roll and gacha resolvers.
use hmac::{Hmac, Mac};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;
use std::collections::VecDeque;

/// Random integer source used by every resolver.
pub trait Dice {
    /// Uniform integer in `1..=sides`.
    fn roll(&mut self, sides: u32) -> u32;

    /// Uniform index in `0..len`.
    fn pick(&mut self, len: usize) -> usize;
}

impl<D: Dice + ?Sized> Dice for &mut D {
    fn roll(&mut self, sides: u32) -> u32 {
        (**self).roll(sides)
    }

    fn pick(&mut self, len: usize) -> usize {
        (**self).pick(len)
    }
}

/// Counting wrapper turning any RNG into dice.
#[derive(Debug, Clone)]
pub struct CountingDice<R> {
    rng: R,
    throws: u64,
}

impl<R: RngCore> CountingDice<R> {
    #[must_use]
    pub const fn new(rng: R) -> Self {
        Self { rng, throws: 0 }
    }

    /// Number of dice thrown against this stream.
    #[must_use]
    pub const fn throws(&self) -> u64 {
        self.throws
    }
}

impl CountingDice<ChaCha20Rng> {
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha20Rng::seed_from_u64(seed))
    }
}

impl<R: RngCore> Dice for CountingDice<R> {
    fn roll(&mut self, sides: u32) -> u32 {
        self.throws = self.throws.saturating_add(1);
        self.rng.gen_range(1..=sides.max(1))
    }

    fn pick(&mut self, len: usize) -> usize {
        self.throws = self.throws.saturating_add(1);
        if len == 0 {
            return 0;
        }
        self.rng.gen_range(0..len)
    }
}

/// Independent dice streams for key rolls and gacha draws.
///
/// Splitting the streams keeps a run's roll sequence stable no matter how
/// many gacha draws happen in between.
#[derive(Debug, Clone)]
pub struct DiceStreams {
    pub roll: CountingDice<ChaCha20Rng>,
    pub gacha: CountingDice<ChaCha20Rng>,
}

impl DiceStreams {
    /// Construct both streams from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            roll: CountingDice::seeded(derive_stream_seed(seed, b"roll")),
            gacha: CountingDice::seeded(derive_stream_seed(seed, b"gacha")),
        }
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed ^ u64::from_le_bytes(pad_tag(domain_tag));
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}

fn pad_tag(tag: &[u8]) -> [u8; 8] {
    let mut bytes = [0u8; 8];
    for (slot, byte) in bytes.iter_mut().zip(tag) {
        *slot = *byte;
    }
    bytes
}

/// Replays a fixed script of faces and indices.
///
/// `roll` returns the next value clamped to `1..=sides`; `pick` returns the
/// next value modulo `len`. An exhausted script yields 1 and index 0.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    script: VecDeque<u32>,
}

impl ScriptedDice {
    #[must_use]
    pub fn new(script: impl IntoIterator<Item = u32>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }

    /// Values left in the script.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    fn next_value(&mut self) -> Option<u32> {
        let value = self.script.pop_front();
        if value.is_none() {
            log::warn!("scripted dice exhausted; falling back to the lowest face");
        }
        value
    }
}

impl Dice for ScriptedDice {
    fn roll(&mut self, sides: u32) -> u32 {
        self.next_value().map_or(1, |v| v.clamp(1, sides.max(1)))
    }

    fn pick(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.next_value()
            .map_or(0, |v| usize::try_from(v).unwrap_or(0) % len)
    }
}
