use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use fatelock_game::{
    Catalog, Category, CostKind, DisplayMeta, Progression, ProgressionState, PullOutcome,
    RollOutcome, RollReward, TaskSources, level_cap,
};

use crate::logic::policy::{Action, SpendingPolicy, SpendingStrategy};

/// Actions a policy may take between two tasks before the run moves on.
const MAX_ACTIONS_PER_TASK: usize = 256;

/// Configuration for a simulation session.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub seed: u64,
    pub tasks: u32,
    pub strategy: SpendingStrategy,
}

impl SimulationConfig {
    #[must_use]
    pub const fn new(strategy: SpendingStrategy, seed: u64) -> Self {
        Self {
            seed,
            tasks: 500,
            strategy,
        }
    }

    #[must_use]
    pub const fn with_tasks(mut self, tasks: u32) -> Self {
        self.tasks = tasks;
        self
    }
}

/// Owned/max progress of one table at the end of a run.
#[derive(Debug, Clone, Serialize)]
pub struct TableProgress {
    pub category: Category,
    pub owned: u32,
    pub max: u32,
}

/// Tallies and invariant checks for one seeded run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulationReport {
    pub seed: u64,
    pub strategy: String,
    pub tasks_completed: u32,
    pub successful_rolls: u32,
    pub keys_earned: u32,
    pub omni_keys_earned: u32,
    pub pity_keys: u32,
    pub level_ups: u32,
    pub pulls: u32,
    pub crumbled_pulls: u32,
    pub unlocks: u32,
    pub special_unlocks: u32,
    pub final_keys: u32,
    pub final_omni_keys: u32,
    pub final_fate_points: u8,
    pub history_entries: usize,
    pub progress: Vec<TableProgress>,
    pub violations: Vec<String>,
    #[serde(skip)]
    pub duration: Duration,
}

impl SimulationReport {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Successful task rolls as a share of all task rolls.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.tasks_completed == 0 {
            return 0.0;
        }
        f64::from(self.successful_rolls) / f64::from(self.tasks_completed)
    }
}

/// Seeded run of task completions and policy-driven spending.
pub struct SimulationSession {
    progression: Progression,
    planner: ChaCha20Rng,
    config: SimulationConfig,
    report: SimulationReport,
    /// Keys received minus keys spent; must always equal the wallet.
    key_ledger: i64,
    omni_ledger: i64,
}

impl SimulationSession {
    #[must_use]
    pub fn new(
        config: SimulationConfig,
        catalog: Arc<Catalog>,
        sources: Arc<TaskSources>,
        start: Option<ProgressionState>,
    ) -> Self {
        let state = start.unwrap_or_else(|| ProgressionState::new_game(&catalog));
        let key_ledger = i64::from(state.keys());
        let omni_ledger = i64::from(state.omni_keys());
        let progression = Progression::from_state(state, catalog, sources, config.seed);
        Self {
            progression,
            planner: ChaCha20Rng::seed_from_u64(config.seed ^ 0x7A5C_5EED),
            config,
            report: SimulationReport {
                seed: config.seed,
                strategy: config.strategy.label().to_string(),
                ..SimulationReport::default()
            },
            key_ledger,
            omni_ledger,
        }
    }

    #[must_use]
    pub fn state(&self) -> &ProgressionState {
        self.progression.state()
    }

    /// Run every task and return the report alongside the final state.
    pub fn run(mut self) -> (SimulationReport, ProgressionState) {
        let started = Instant::now();
        let mut policy = self.config.strategy.create_policy(self.config.seed);
        for _ in 0..self.config.tasks {
            self.complete_random_task();
            self.spend(policy.as_mut());
        }
        self.finish(started.elapsed())
    }

    fn complete_random_task(&mut self) {
        let count = self.progression.sources().len();
        if count == 0 {
            return;
        }
        let idx = self.planner.gen_range(0..count);
        let Some(id) = self
            .progression
            .sources()
            .iter()
            .nth(idx)
            .map(|source| source.id.clone())
        else {
            return;
        };
        match self.progression.complete_task(&id) {
            Ok(outcome) => {
                self.report.tasks_completed += 1;
                self.tally_roll(outcome);
            }
            Err(err) => self.violation(format!("task {id} rejected: {err}")),
        }
        self.check_invariants("task");
    }

    fn spend(&mut self, policy: &mut dyn SpendingPolicy) {
        for _ in 0..MAX_ACTIONS_PER_TASK {
            let Some(action) = policy.next_action(self.state(), self.progression.catalog()) else {
                return;
            };
            log::debug!("{} chose {action:?}", policy.name());
            if !self.apply(&action) {
                return;
            }
            self.check_invariants("spend");
        }
        log::warn!(
            "{} hit the per-task action limit on seed {}",
            policy.name(),
            self.config.seed
        );
    }

    /// Execute one action; false when the engine refused it.
    fn apply(&mut self, action: &Action) -> bool {
        match action {
            Action::Pull(category) => match self.progression.pull(*category) {
                Ok(PullOutcome::Revealed(pending)) => {
                    self.report.pulls += 1;
                    self.progression.enrich_pending(
                        pending.ticket,
                        DisplayMeta {
                            display_type: pending.display.display_type.clone(),
                            image_url: Some(format!("sim://{}", pending.item)),
                        },
                    );
                    self.finalize_pending();
                    true
                }
                Ok(PullOutcome::Crumbled { item }) => {
                    log::debug!("pull on {category} crumbled at {item}");
                    self.report.pulls += 1;
                    self.report.crumbled_pulls += 1;
                    self.key_ledger -= 1;
                    true
                }
                Err(err) => {
                    log::debug!("pull refused: {err}");
                    false
                }
            },
            Action::LevelUp(skill) => match self.progression.level_up(skill) {
                Ok(outcome) => {
                    self.report.level_ups += 1;
                    self.tally_reward(outcome.reward);
                    true
                }
                Err(err) => {
                    log::debug!("level up refused: {err}");
                    false
                }
            },
            Action::Special(category, item) => {
                if let Err(err) = self.progression.special_unlock(*category, item) {
                    log::debug!("special unlock refused: {err}");
                    return false;
                }
                self.finalize_pending();
                true
            }
        }
    }

    fn finalize_pending(&mut self) {
        let Some(done) = self.progression.finalize() else {
            self.violation("finalize found nothing pending".to_string());
            return;
        };
        self.report.unlocks += 1;
        match done.cost {
            CostKind::Standard => self.key_ledger -= 1,
            CostKind::Rare => {
                self.report.special_unlocks += 1;
                self.omni_ledger -= 1;
            }
        }
        if self.progression.finalize().is_some() {
            self.violation("second finalize applied an unlock".to_string());
        }
    }

    fn tally_roll(&mut self, outcome: RollOutcome) {
        if outcome.success {
            self.report.successful_rolls += 1;
        }
        self.tally_reward(outcome.reward);
    }

    fn tally_reward(&mut self, reward: RollReward) {
        match reward {
            RollReward::Key => {
                self.report.keys_earned += 1;
                self.key_ledger += 1;
            }
            RollReward::PityKey => {
                self.report.keys_earned += 1;
                self.report.pity_keys += 1;
                self.key_ledger += 1;
            }
            RollReward::OmniKey => {
                self.report.omni_keys_earned += 1;
                self.omni_ledger += 1;
            }
            RollReward::Nothing => {}
        }
    }

    fn check_invariants(&mut self, phase: &str) {
        let mut problems = Vec::new();
        {
            let state = self.progression.state();
            let catalog = self.progression.catalog();

            if i64::from(state.keys()) != self.key_ledger {
                problems.push(format!(
                    "{phase}: wallet holds {} keys, ledger says {}",
                    state.keys(),
                    self.key_ledger
                ));
            }
            if i64::from(state.omni_keys()) != self.omni_ledger {
                problems.push(format!(
                    "{phase}: wallet holds {} omni-keys, ledger says {}",
                    state.omni_keys(),
                    self.omni_ledger
                ));
            }
            if state.fate_points() >= 50 {
                problems.push(format!("{phase}: fate points {}", state.fate_points()));
            }
            if state.pending().is_some() {
                problems.push(format!("{phase}: unlock left pending"));
            }
            for category in Category::ALL {
                let progress = state.progress(catalog, category);
                if progress.owned > progress.max {
                    problems.push(format!(
                        "{phase}: {category} progress {}/{}",
                        progress.owned, progress.max
                    ));
                }
            }
            for skill in catalog.items(Category::Skills) {
                let cap = level_cap(state.tier(Category::Skills, skill));
                if state.level(skill) > cap {
                    problems.push(format!(
                        "{phase}: {skill} level {} above cap {cap}",
                        state.level(skill)
                    ));
                }
            }
        }
        for problem in problems {
            self.violation(problem);
        }
    }

    fn violation(&mut self, message: String) {
        log::error!("seed {}: {message}", self.config.seed);
        self.report.violations.push(message);
    }

    fn finish(mut self, duration: Duration) -> (SimulationReport, ProgressionState) {
        let catalog = self.progression.catalog();
        let state = self.progression.state();
        self.report.progress = Category::ALL
            .into_iter()
            .map(|category| {
                let progress = state.progress(catalog, category);
                TableProgress {
                    category,
                    owned: progress.owned,
                    max: progress.max,
                }
            })
            .collect();
        self.report.final_keys = state.keys();
        self.report.final_omni_keys = state.omni_keys();
        self.report.final_fate_points = state.fate_points();
        self.report.history_entries = state.history().len();
        self.report.duration = duration;
        (self.report, self.progression.into_state())
    }
}

/// Convenience wrapper: build a session and run it.
#[must_use]
pub fn run_simulation(
    config: SimulationConfig,
    catalog: &Arc<Catalog>,
    sources: &Arc<TaskSources>,
    start: Option<ProgressionState>,
) -> (SimulationReport, ProgressionState) {
    SimulationSession::new(config, Arc::clone(catalog), Arc::clone(sources), start).run()
}
