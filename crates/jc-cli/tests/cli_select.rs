use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_jetcal"))
}

fn repo_root() -> PathBuf {
    // crates/jc-cli -> repo root
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..").canonicalize().unwrap()
}

fn fixture_path(name: &str) -> PathBuf {
    repo_root().join("tests/fixtures").join(name)
}

fn tmp_path(filename: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let mut p = std::env::temp_dir();
    p.push(format!("jetcal_cli_{}_{}_{}", std::process::id(), nanos, filename));
    p
}

fn run(args: &[&str]) -> Output {
    Command::new(bin_path())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to run {:?} {:?}: {}", bin_path(), args, e))
}

fn select(config: &str, events: &str, extra: &[&str]) -> serde_json::Value {
    let config = fixture_path(config);
    let events = fixture_path(events);
    let mut args = vec!["select", "--config", config.to_str().unwrap(), "--events", events.to_str().unwrap()];
    args.extend_from_slice(extra);
    let out = run(&args);
    assert!(
        out.status.success(),
        "select should succeed, stderr={}",
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).expect("stdout should be valid JSON")
}

fn cutflow(v: &serde_json::Value) -> Vec<(String, u64)> {
    v.get("cutflow")
        .and_then(|x| x.as_array())
        .expect("cutflow should be an array")
        .iter()
        .map(|e| {
            (
                e.get("stage").and_then(|s| s.as_str()).unwrap().to_string(),
                e.get("pass").and_then(|p| p.as_u64()).unwrap(),
            )
        })
        .collect()
}

fn owned(flow: &[(&str, u64)]) -> Vec<(String, u64)> {
    flow.iter().map(|(s, n)| (s.to_string(), *n)).collect()
}

#[test]
fn select_dijet_data_cutflow() {
    let v = select("run_dijet_data.yaml", "events_dijet.jsonl", &[]);
    assert_eq!(v.get("channel").and_then(|x| x.as_str()), Some("dijet"));
    assert_eq!(v.get("is_mc").and_then(|x| x.as_bool()), Some(false));
    assert_eq!(v.get("n_events").and_then(|x| x.as_u64()), Some(5));
    let levels = v.get("jec_levels").and_then(|x| x.as_array()).unwrap();
    assert_eq!(levels.len(), 3);
    assert_eq!(
        cutflow(&v),
        owned(&[("all", 5), ("golden_json", 3), ("tag_probe", 2), ("jets_not_vetoed", 1)])
    );
}

#[test]
fn select_zmm_mc_cutflow() {
    let v = select("run_zmm_mc.json", "events_zmm.jsonl", &[]);
    assert_eq!(v.get("smearing").and_then(|x| x.as_bool()), Some(true));
    assert_eq!(
        cutflow(&v),
        owned(&[("all", 5), ("lepton_pair", 4), ("trigger_match", 3), ("leading_jet", 1)])
    );
}

#[test]
fn select_is_thread_count_independent() {
    for config in ["run_dijet_data.yaml", "run_zmm_mc.json"] {
        let events = if config.contains("zmm") { "events_zmm.jsonl" } else { "events_dijet.jsonl" };
        let one = select(config, events, &["--threads", "1"]);
        let four = select(config, events, &["--threads", "4"]);
        assert_eq!(one, four, "{config}: output must not depend on --threads");
    }
}

#[test]
fn select_is_chunk_size_independent() {
    for (config, events) in [("run_dijet_data.yaml", "events_dijet.jsonl"), ("run_zmm_mc.json", "events_zmm.jsonl")] {
        let whole = select(config, events, &[]);
        let chunked = select(config, events, &["--chunk-size", "2", "--threads", "3"]);
        assert_eq!(whole, chunked, "{config}: output must not depend on --chunk-size");
    }
}

#[test]
fn select_rejects_zero_chunk_size() {
    let config = fixture_path("run_dijet_data.yaml");
    let events = fixture_path("events_dijet.jsonl");
    let out = run(&[
        "select",
        "--config",
        config.to_str().unwrap(),
        "--events",
        events.to_str().unwrap(),
        "--chunk-size",
        "0",
    ]);
    assert!(!out.status.success());
}

#[test]
fn select_writes_output_file() {
    let out_path = tmp_path("cutflow.json");
    let config = fixture_path("run_dijet_data.yaml");
    let events = fixture_path("events_dijet.jsonl");
    let out = run(&[
        "select",
        "--config",
        config.to_str().unwrap(),
        "--events",
        events.to_str().unwrap(),
        "--seed",
        "123",
        "--output",
        out_path.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    let bytes = std::fs::read(&out_path).expect("output file should exist");
    let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(v.get("seed").and_then(|x| x.as_u64()), Some(123));
    let _ = std::fs::remove_file(&out_path);
}

#[test]
fn select_missing_payload_fails() {
    let config = fixture_path("run_missing_payload.yaml");
    let events = fixture_path("events_dijet.jsonl");
    let out = run(&["select", "--config", config.to_str().unwrap(), "--events", events.to_str().unwrap()]);
    assert!(!out.status.success(), "missing payload must fail");
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("L2Relative"), "stderr should name the stage: {stderr}");
}
