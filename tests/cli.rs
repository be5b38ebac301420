//! End-to-end tests for the `streams_vs_hwq` binary.

#![allow(deprecated)] // cargo_bin still works, just deprecated for custom build-dir

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const SAMPLE: &str = "\
gpu_max_hw_queues,num_streams,run_id,time_ms
1,1,0,40.0
1,1,1,42.0
1,2,0,10.0
1,2,1,20.0
1,4,0,11.0
2,1,0,38.5
2,2,0,15.0
2,4,0,9.0
2,4,1,9.0
4,4,0,7.5
";

fn streams_vs_hwq() -> Command {
    Command::cargo_bin("streams_vs_hwq").expect("Failed to find streams_vs_hwq binary")
}

fn write_sample(dir: &Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, SAMPLE).expect("write sample CSV");
    path
}

#[test]
fn test_help_lists_flags() {
    streams_vs_hwq()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--csv"))
        .stdout(predicate::str::contains("--out"))
        .stdout(predicate::str::contains("--legend"));
}

#[test]
fn test_missing_input_fails_with_path() {
    let dir = TempDir::new().expect("temp dir");
    let missing = dir.path().join("no_such_results.csv");

    streams_vs_hwq()
        .arg("--csv")
        .arg(&missing)
        .arg("--out")
        .arg(dir.path().join("out.png"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("CSV file not found"))
        .stderr(predicate::str::contains("no_such_results.csv"));

    assert!(!dir.path().join("out.png").exists());
}

#[test]
fn test_missing_default_input_fails() {
    let dir = TempDir::new().expect("temp dir");

    streams_vs_hwq()
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("results_hwq_streams.csv"));
}

#[test]
fn test_missing_column_fails() {
    let dir = TempDir::new().expect("temp dir");
    let csv = dir.path().join("bad.csv");
    fs::write(&csv, "gpu_max_hw_queues,time_ms\n1,3.0\n").expect("write CSV");

    streams_vs_hwq()
        .arg("--csv")
        .arg(&csv)
        .arg("--out")
        .arg(dir.path().join("out.png"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("num_streams"));
}

#[test]
fn test_defaults_write_png_in_working_dir() {
    let dir = TempDir::new().expect("temp dir");
    write_sample(dir.path(), "results_hwq_streams.csv");

    streams_vs_hwq()
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Aggregated data:"))
        .stdout(predicate::str::contains("Saved plot to streams_vs_hwq.png"));

    let png = fs::read(dir.path().join("streams_vs_hwq.png")).expect("read PNG");
    assert!(png.starts_with(b"\x89PNG"));
}

#[test]
fn test_svg_output_has_legend_entries() {
    let dir = TempDir::new().expect("temp dir");
    let csv = write_sample(dir.path(), "runs.csv");
    let out = dir.path().join("chart.svg");

    streams_vs_hwq()
        .arg("--csv")
        .arg(&csv)
        .arg("--out")
        .arg(&out)
        .arg("--legend")
        .arg("AMD W7900")
        .assert()
        .success()
        .stdout(predicate::str::contains("7.071068"))
        .stdout(predicate::str::contains("NaN"));

    let svg = fs::read_to_string(&out).expect("read SVG");
    let texts = svg_texts(&svg);
    assert_eq!(texts.iter().filter(|t| *t == "AMD W7900").count(), 1);
    for hwq in [1, 2, 4] {
        let label = format!("GPU_MAX_HW_QUEUES={hwq}");
        assert_eq!(texts.iter().filter(|t| **t == label).count(), 1, "{label}");
    }
    assert_eq!(
        texts.iter().filter(|t| t.starts_with("GPU_MAX_HW_QUEUES=")).count(),
        3
    );
    assert!(texts.iter().any(|t| t == "number of streams"));
}

/// Trimmed contents of every `<text>` element in an SVG document
fn svg_texts(svg: &str) -> Vec<String> {
    svg.split("</text>")
        .filter_map(|chunk| {
            let start = chunk.rfind("<text")?;
            let body = &chunk[start..];
            let open_end = body.find('>')?;
            Some(body[open_end + 1..].trim().to_string())
        })
        .collect()
}
