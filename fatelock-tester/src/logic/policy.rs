use clap::ValueEnum;
use std::fmt;

use fatelock_game::{Catalog, Category, ProgressionState};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Something the simulated player does between tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Pull(Category),
    LevelUp(String),
    Special(Category, String),
}

/// Spending interface for automated runs.
pub trait SpendingPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Next action to take, or `None` to go back to completing tasks.
    fn next_action(&mut self, state: &ProgressionState, catalog: &Catalog) -> Option<Action>;
}

/// Built-in spending strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum)]
pub enum SpendingStrategy {
    /// Level what it can, then pull on the least complete table
    Balanced,
    /// Spend every key the moment it arrives
    Greedy,
    /// Save up keys and spend them in bursts
    Hoarder,
    /// Pour everything into skills
    SkillFocus,
    /// Pick uniformly among the legal actions
    Random,
}

impl SpendingStrategy {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Balanced => "Balanced",
            Self::Greedy => "Greedy",
            Self::Hoarder => "Hoarder",
            Self::SkillFocus => "Skill Focus",
            Self::Random => "Random",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn SpendingPolicy + Send> {
        match self {
            Self::Balanced => Box::new(BalancedPolicy::default()),
            Self::Greedy => Box::new(GreedyPolicy),
            Self::Hoarder => Box::new(HoarderPolicy::default()),
            Self::SkillFocus => Box::new(SkillFocusPolicy),
            Self::Random => Box::new(RandomPolicy::new(seed)),
        }
    }
}

impl fmt::Display for SpendingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const HOARD_TARGET: u32 = 5;

#[derive(Default)]
struct BalancedPolicy {
    levelled_this_turn: bool,
}

struct GreedyPolicy;

#[derive(Default)]
struct HoarderPolicy {
    spending: bool,
}

struct SkillFocusPolicy;

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl SpendingPolicy for BalancedPolicy {
    fn name(&self) -> &'static str {
        "Balanced"
    }

    fn next_action(&mut self, state: &ProgressionState, catalog: &Catalog) -> Option<Action> {
        if let Some(action) = special_target(state, catalog) {
            return Some(action);
        }
        if !self.levelled_this_turn
            && let Some(skill) = first_levelable(state, catalog)
        {
            self.levelled_this_turn = true;
            return Some(Action::LevelUp(skill));
        }
        if state.keys() == 0 {
            self.levelled_this_turn = false;
            return None;
        }
        least_complete(state, catalog).map(Action::Pull).or_else(|| {
            self.levelled_this_turn = false;
            None
        })
    }
}

impl SpendingPolicy for GreedyPolicy {
    fn name(&self) -> &'static str {
        "Greedy"
    }

    fn next_action(&mut self, state: &ProgressionState, catalog: &Catalog) -> Option<Action> {
        if let Some(action) = special_target(state, catalog) {
            return Some(action);
        }
        if state.keys() == 0 {
            return None;
        }
        Category::ALL
            .into_iter()
            .filter(|category| state.can_unlock(catalog, *category))
            .max_by_key(|category| state.remaining(catalog, *category))
            .map(Action::Pull)
    }
}

impl SpendingPolicy for HoarderPolicy {
    fn name(&self) -> &'static str {
        "Hoarder"
    }

    fn next_action(&mut self, state: &ProgressionState, catalog: &Catalog) -> Option<Action> {
        if state.keys() >= HOARD_TARGET {
            self.spending = true;
        }
        if !self.spending || state.keys() == 0 {
            self.spending = false;
            return first_levelable(state, catalog).map(Action::LevelUp);
        }
        least_complete(state, catalog).map(Action::Pull)
    }
}

impl SpendingPolicy for SkillFocusPolicy {
    fn name(&self) -> &'static str {
        "Skill Focus"
    }

    fn next_action(&mut self, state: &ProgressionState, catalog: &Catalog) -> Option<Action> {
        if let Some(skill) = first_levelable(state, catalog) {
            return Some(Action::LevelUp(skill));
        }
        if state.omni_keys() > 0
            && let Some(skill) = catalog
                .items(Category::Skills)
                .iter()
                .find(|skill| state.can_special_unlock(catalog, Category::Skills, skill))
        {
            return Some(Action::Special(Category::Skills, skill.clone()));
        }
        if state.keys() == 0 {
            return None;
        }
        [Category::Skills, Category::Equipment]
            .into_iter()
            .chain(Category::ALL)
            .find(|category| state.can_unlock(catalog, *category))
            .map(Action::Pull)
    }
}

impl SpendingPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn next_action(&mut self, state: &ProgressionState, catalog: &Catalog) -> Option<Action> {
        let mut options: Vec<Action> = Vec::new();
        if state.keys() > 0 {
            options.extend(
                Category::ALL
                    .into_iter()
                    .filter(|category| state.can_unlock(catalog, *category))
                    .map(Action::Pull),
            );
        }
        options.extend(special_target(state, catalog));
        if self.rng.gen_range(0..4) == 0 {
            options.extend(first_levelable(state, catalog).map(Action::LevelUp));
        }
        if options.is_empty() || self.rng.gen_range(0..3) == 0 {
            return None;
        }
        let idx = self.rng.gen_range(0..options.len());
        Some(options.swap_remove(idx))
    }
}

fn first_levelable(state: &ProgressionState, catalog: &Catalog) -> Option<String> {
    catalog
        .items(Category::Skills)
        .iter()
        .find(|skill| state.can_level_up(catalog, skill))
        .cloned()
}

/// Table with the lowest owned/max ratio that still has something to give.
fn least_complete(state: &ProgressionState, catalog: &Catalog) -> Option<Category> {
    Category::ALL
        .into_iter()
        .filter(|category| state.can_unlock(catalog, *category))
        .min_by(|a, b| {
            let pa = state.progress(catalog, *a);
            let pb = state.progress(catalog, *b);
            // owned_a / max_a vs owned_b / max_b without floats
            let lhs = u64::from(pa.owned) * u64::from(pb.max);
            let rhs = u64::from(pb.owned) * u64::from(pa.max);
            lhs.cmp(&rhs)
        })
}

/// Spend an omni-key on the first open boss, falling back to any open item.
fn special_target(state: &ProgressionState, catalog: &Catalog) -> Option<Action> {
    if state.omni_keys() == 0 {
        return None;
    }
    [Category::Bosses]
        .into_iter()
        .chain(Category::ALL)
        .find_map(|category| {
            catalog
                .items(category)
                .iter()
                .find(|item| state.can_special_unlock(catalog, category, item))
                .map(|item| Action::Special(category, item.clone()))
        })
}
