use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use super::SimulationReport;

pub fn generate_console_report<W: Write + ?Sized>(
    out: &mut W,
    results: &[SimulationReport],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Simulation Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "==============================".cyan())?;

    let total_runs = results.len();
    let passed_runs = results.iter().filter(|r| r.passed()).count();
    let failed_runs = total_runs - passed_runs;

    writeln!(out, "Total runs: {total_runs}")?;
    writeln!(out, "Passed: {}", passed_runs.to_string().green())?;
    writeln!(out, "Failed: {}", failed_runs.to_string().red())?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed() {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };

        writeln!(
            out,
            "{} {}",
            status,
            format!("seed {} ({})", result.seed, result.strategy).bold()
        )?;
        let rate = result.success_rate() * 100.0;
        writeln!(
            out,
            "   Tasks: {} ({rate:.1}% rolled a key)",
            result.tasks_completed
        )?;
        writeln!(
            out,
            "   Keys earned: {} ({} pity), omni-keys: {}",
            result.keys_earned, result.pity_keys, result.omni_keys_earned
        )?;
        writeln!(
            out,
            "   Pulls: {} ({} crumbled), unlocks: {} ({} omni), level-ups: {}",
            result.pulls,
            result.crumbled_pulls,
            result.unlocks,
            result.special_unlocks,
            result.level_ups
        )?;
        writeln!(
            out,
            "   Wallet: {} keys, {} omni-keys, fate {}/50",
            result.final_keys, result.final_omni_keys, result.final_fate_points
        )?;
        let tables: Vec<String> = result
            .progress
            .iter()
            .map(|p| format!("{} {}/{}", p.category, p.owned, p.max))
            .collect();
        writeln!(out, "   Progress: {}", tables.join(", "))?;
        writeln!(out, "   Run time: {:?}", result.duration)?;

        if !result.violations.is_empty() {
            writeln!(out, "   Violations:")?;
            for violation in &result.violations {
                writeln!(out, "     • {}", violation.red())?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn generate_json_report<W: Write + ?Sized>(
    out: &mut W,
    results: &[SimulationReport],
) -> Result<()> {
    let json_output = serde_json::to_string_pretty(results)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report<W: Write + ?Sized>(
    out: &mut W,
    results: &[SimulationReport],
) -> Result<()> {
    writeln!(out, "# Fate-Locked Simulation Results\n")?;

    let total_runs = results.len();
    let passed_runs = results.iter().filter(|r| r.passed()).count();

    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total runs**: {total_runs}")?;
    writeln!(out, "- **Passed**: {passed_runs}")?;
    writeln!(out, "- **Failed**: {}\n", total_runs - passed_runs)?;

    writeln!(out, "## Runs\n")?;
    writeln!(
        out,
        "| Seed | Strategy | Tasks | Keys | Pity | Omni | Pulls | Crumbled | Unlocks | Level-ups |"
    )?;
    writeln!(out, "|---|---|---|---|---|---|---|---|---|---|")?;
    for r in results {
        writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} | {} | {} | {} | {} |",
            r.seed,
            r.strategy,
            r.tasks_completed,
            r.keys_earned,
            r.pity_keys,
            r.omni_keys_earned,
            r.pulls,
            r.crumbled_pulls,
            r.unlocks,
            r.level_ups
        )?;
    }

    for result in results.iter().filter(|r| !r.passed()) {
        writeln!(out, "\n### ❌ seed {}\n", result.seed)?;
        for violation in &result.violations {
            writeln!(out, "- {violation}")?;
        }
    }
    Ok(())
}
