mod logic;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use fatelock_game::{Catalog, ProgressionState, TaskSources, apply_snapshot};
use logic::{SimulationConfig, SimulationReport, SpendingStrategy, run_simulation};

#[derive(Debug, Parser)]
#[command(name = "fatelock-tester", version = "0.1.0")]
#[command(about = "Seeded headless simulations of the Fate-Locked progression engine")]
struct Args {
    /// Seeds to run (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Tasks completed per run
    #[arg(long, default_value_t = 500)]
    tasks: u32,

    /// How the simulated player spends keys
    #[arg(long, value_enum, default_value_t = SpendingStrategy::Balanced)]
    strategy: SpendingStrategy,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Start every run from this save file instead of a new game
    #[arg(long)]
    import: Option<PathBuf>,

    /// Write the final state of the last run as a save file
    #[arg(long)]
    export: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    announce_banner();

    let start_time = Instant::now();
    let seeds = parse_seeds(&args.seeds)?;
    let catalog = Arc::new(Catalog::bundled().context("loading bundled catalog")?);
    let sources = Arc::new(TaskSources::bundled());
    let start = match args.import.as_deref() {
        Some(path) => Some(load_start_state(&catalog, path)?),
        None => None,
    };

    let mut results = Vec::with_capacity(seeds.len());
    let mut last_state = None;
    for seed in seeds {
        let config = SimulationConfig::new(args.strategy, seed).with_tasks(args.tasks);
        let (report, state) = run_simulation(config, &catalog, &sources, start.clone());
        if args.verbose {
            let status = if report.passed() {
                "✅".to_string()
            } else {
                format!("❌ {} violations", report.violations.len())
            };
            println!(
                "{status} seed {seed}: {} unlocks in {:?}",
                report.unlocks, report.duration
            );
        }
        results.push(report);
        last_state = Some(state);
    }

    write_reports(&args, &results, start_time)?;

    if let (Some(path), Some(state)) = (args.export.as_deref(), last_state.as_ref()) {
        export_state(state, path)?;
    }

    if results.iter().any(|r| !r.passed()) {
        std::process::exit(1);
    }

    Ok(())
}

fn announce_banner() {
    println!("{}", "🎲 Fate-Locked Simulation Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

fn parse_seeds(raw: &str) -> Result<Vec<u64>> {
    split_csv(raw)
        .iter()
        .map(|token| {
            token
                .parse::<u64>()
                .with_context(|| format!("invalid seed {token:?}"))
        })
        .collect()
}

fn load_start_state(catalog: &Catalog, path: &Path) -> Result<ProgressionState> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    apply_snapshot(catalog, &raw).with_context(|| format!("failed to import {}", path.display()))
}

fn export_state(state: &ProgressionState, path: &Path) -> Result<()> {
    let json = state.snapshot().to_json_pretty()?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    println!("💾 Saved final state to {}", path.display());
    Ok(())
}

fn write_reports(args: &Args, results: &[SimulationReport], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(&mut output_target, results)?,
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Fate-Locked Simulation Results\n\n_No seeds executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        _ => {
            let duration = start_time.elapsed();
            if results.is_empty() {
                writeln!(&mut output_target, "No seeds executed.")?;
            } else {
                logic::reports::generate_console_report(&mut output_target, results, duration)?;
            }
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            seeds: "1337".to_string(),
            tasks: 20,
            strategy: SpendingStrategy::Balanced,
            report: "json".to_string(),
            output: None,
            import: None,
            export: None,
            verbose: false,
        }
    }

    fn temp_path(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "fatelock-main-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    #[test]
    fn split_csv_trims_and_filters() {
        let parts = split_csv(" alpha, ,beta,  gamma ");
        assert_eq!(parts, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn parse_seeds_rejects_words() {
        assert_eq!(parse_seeds("1, 2,3").unwrap(), vec![1, 2, 3]);
        assert!(parse_seeds("1,banana").is_err());
    }

    #[test]
    fn json_report_goes_to_output_file() {
        let path = temp_path("json");
        let mut args = base_args();
        args.output = Some(path.clone());
        let report = SimulationReport {
            seed: 1337,
            strategy: "Balanced".to_string(),
            ..SimulationReport::default()
        };
        write_reports(&args, &[report], Instant::now()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed[0]["seed"], 1337);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn markdown_report_handles_no_runs() {
        let path = temp_path("md");
        let mut args = base_args();
        args.report = "markdown".to_string();
        args.output = Some(path.clone());
        write_reports(&args, &[], Instant::now()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("_No seeds executed._"));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn exported_state_loads_back() {
        let catalog = Catalog::bundled().unwrap();
        let path = temp_path("save");
        let state = ProgressionState::new_game(&catalog);
        export_state(&state, &path).unwrap();
        let loaded = load_start_state(&catalog, &path).unwrap();
        assert_eq!(loaded.keys(), state.keys());
        assert_eq!(loaded.unlocks(), state.unlocks());
        let _ = std::fs::remove_file(path);
    }
}
