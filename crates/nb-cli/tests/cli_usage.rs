#[path = "../../nb-root/tests/common/mod.rs"]
mod common;

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

use common::NtupleBuilder;

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_nnbar-plots"))
}

fn run_in(dir: &Path, args: &[&str], config: Option<&Path>) -> Output {
    let mut cmd = Command::new(bin_path());
    cmd.args(args).current_dir(dir).env_remove("NNBAR_PLOTS_CONFIG");
    if let Some(cfg) = config {
        cmd.env("NNBAR_PLOTS_CONFIG", cfg);
    }
    cmd.output().unwrap_or_else(|e| panic!("failed to run {:?} {:?}: {}", bin_path(), args, e))
}

fn tmp_dir(tag: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let dir = std::env::temp_dir().join(format!("nnbar_plots_{tag}_{}_{nanos}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Two events with every branch the plot catalog reads.
fn analyzer_file() -> NtupleBuilder {
    let mut b = NtupleBuilder::new("nnbar", "nnbar");
    for name in [
        "NumberPrimaries",
        "NumberPrimariesTrackLike",
        "NumberPrimariesShowerLike",
        "NumberMCTracks",
        "NumberMCShowers",
        "NumberHits",
        "HitWires",
        "NumberTracks",
        "NumberShowers",
        "TrackMultiplicityDiff",
        "ShowerMultiplicityDiff",
    ] {
        b = b.int(name, &[3, 1]);
    }
    for name in [
        "TrueEventMomentum",
        "TrueEventEnergy",
        "TrueEventInvariantMass",
        "MCRecoEventMomentum",
        "MCRecoEventEnergy",
        "MCRecoEventInvariantMass",
    ] {
        b = b.double(name, &[0.25, 1.5]);
    }
    for name in [
        "MCTrackLength",
        "MCTrackMomentum",
        "MCShowerEnergy",
        "HitStartTime",
        "HitPeakAmp",
        "HitRMS",
        "HitIntegral",
        "ShowerEnergy",
        "RecoEventMomentum",
        "RecoEventEnergy",
        "RecoEventInvariantMass",
    ] {
        b = b.vector(name, &[vec![0.5, 12.0], vec![]]);
    }
    b.vector("TrackLength", &[vec![10.0, 55.5, 130.0], vec![2.0]])
        .vector("TrackMomentum", &[vec![0.1, 0.45, 0.9], vec![0.05]])
}

#[test]
fn no_arguments_is_usage_error() {
    let dir = tmp_dir("noargs");
    let out = run_in(&dir, &[], None);
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Usage"), "stderr={stderr}");
    assert!(std::fs::read_dir(&dir).unwrap().next().is_none(), "nothing may be created");
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn two_positionals_is_usage_error() {
    let dir = tmp_dir("twoargs");
    let out = run_in(&dir, &["a", "b"], None);
    assert_eq!(out.status.code(), Some(2));
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn renders_every_plot_and_skips_missing_files() {
    let dir = tmp_dir("e2e");
    let input = dir.join("nnbarana").join("signal");
    std::fs::create_dir_all(&input).unwrap();
    analyzer_file().write_to(&input.join("anahist_0.root"));
    analyzer_file().compressed(true).write_to(&input.join("anahist_2.root"));
    std::fs::create_dir_all(dir.join("plots").join("signal")).unwrap();

    let cfg = dir.join("run.yaml");
    std::fs::write(&cfg, "input:\n  max_files: 3\n").unwrap();

    let out = run_in(&dir, &["signal"], Some(&cfg));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(out.status.success(), "stdout={stdout} stderr={}", String::from_utf8_lossy(&out.stderr));
    assert!(stdout.contains("anahist_1.root does not exist"), "stdout={stdout}");
    assert!(stdout.contains("TrackLength size is 8"), "stdout={stdout}");
    assert!(stdout.contains("NumberTracks size is 4"), "stdout={stdout}");

    let plots = dir.join("plots").join("signal");
    for name in ["NumberPrimaries", "TrackLength", "TrackMultiplicityDiff", "EventEnergy", "TrackLengthVsMomentum"] {
        let bytes = std::fs::read(plots.join(format!("{name}.png"))).unwrap();
        assert_eq!(&bytes[..8], PNG_MAGIC, "{name}");
    }
    assert_eq!(std::fs::read_dir(&plots).unwrap().count(), 20);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn missing_output_directory_fails() {
    let dir = tmp_dir("noout");
    let input = dir.join("nnbarana").join("signal");
    std::fs::create_dir_all(&input).unwrap();
    analyzer_file().write_to(&input.join("anahist_0.root"));
    let cfg = dir.join("run.yaml");
    std::fs::write(&cfg, "input:\n  max_files: 1\n").unwrap();

    let out = run_in(&dir, &["signal"], Some(&cfg));
    assert!(!out.status.success());
    assert!(!dir.join("plots").exists());
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn unknown_column_is_fatal() {
    let dir = tmp_dir("badcol");
    let input = dir.join("nnbarana").join("signal");
    std::fs::create_dir_all(&input).unwrap();
    NtupleBuilder::new("nnbar", "nnbar").int("NumberTracks", &[1]).write_to(&input.join("anahist_0.root"));
    std::fs::create_dir_all(dir.join("plots").join("signal")).unwrap();
    let cfg = dir.join("run.yaml");
    std::fs::write(&cfg, "input:\n  max_files: 1\n").unwrap();

    let out = run_in(&dir, &["signal"], Some(&cfg));
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("failed to aggregate sample 'signal'"));
    assert_eq!(std::fs::read_dir(dir.join("plots").join("signal")).unwrap().count(), 0);
    let _ = std::fs::remove_dir_all(dir);
}
