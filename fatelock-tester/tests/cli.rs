use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "fatelock-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_writes_json_report() {
    let exe = env!("CARGO_BIN_EXE_fatelock-tester");
    let output_path = temp_path("run");
    let output = Command::new(exe)
        .args([
            "--report", "json", "--seeds", "1,2", "--tasks", "60", "--strategy", "greedy",
            "--output",
        ])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Fate-Locked Simulation Tester"));

    let content = std::fs::read_to_string(&output_path).expect("read output");
    let parsed: serde_json::Value = serde_json::from_str(&content).expect("json report");
    let runs = parsed.as_array().expect("array of runs");
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0]["tasks_completed"], 60);
    assert_eq!(runs[1]["strategy"], "Greedy");
}

#[test]
fn cli_exported_save_can_be_imported() {
    let exe = env!("CARGO_BIN_EXE_fatelock-tester");
    let save_path = temp_path("save");
    let status = Command::new(exe)
        .args(["--seeds", "9", "--tasks", "80", "--export"])
        .arg(&save_path)
        .status()
        .expect("run cli");
    assert!(status.success());

    let save = std::fs::read_to_string(&save_path).expect("read save");
    let parsed: serde_json::Value = serde_json::from_str(&save).expect("save json");
    assert!(parsed["history"].as_array().is_some_and(|h| !h.is_empty()));

    let report_path = temp_path("resumed");
    let status = Command::new(exe)
        .args(["--seeds", "10", "--tasks", "20", "--report", "markdown", "--import"])
        .arg(&save_path)
        .arg("--output")
        .arg(&report_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let report = std::fs::read_to_string(report_path).expect("read report");
    assert!(report.contains("# Fate-Locked Simulation Results"));
}

#[test]
fn cli_rejects_unreadable_import() {
    let exe = env!("CARGO_BIN_EXE_fatelock-tester");
    let bad = temp_path("bad");
    std::fs::write(&bad, "[1,2,3]").expect("write bad save");
    let output = Command::new(exe)
        .args(["--tasks", "1", "--import"])
        .arg(&bad)
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to import"));
}
