//! Round trips through the `balloon` binary.

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use tempfile::tempdir;

fn balloon(db: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("balloon");
    cmd.env_remove("BALLOON_CONFIG")
        .env_remove("BALLOON_HASHER")
        .env("RUST_LOG", "warn")
        .arg("--db")
        .arg(db);
    cmd
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn add_prove_and_verify() {
    let dir = tempdir().expect("Failed to create temp dir");
    let db = dir.path().join("db");
    let proof_path = dir.path().join("proof.json");

    for (expected, event) in [(0, "alpha"), (1, "beta"), (2, "gamma")] {
        let output = balloon(&db)
            .args(["add", "--event", event])
            .output()
            .expect("Failed to run add");
        assert!(output.status.success());
        assert_eq!(stdout_json(&output)["version"], expected);
    }

    balloon(&db)
        .args(["membership", "--event", "beta", "--proof-out"])
        .arg(&proof_path)
        .assert()
        .success();
    assert!(proof_path.exists(), "Proof file should exist");

    let info = balloon(&db).arg("info").output().expect("Failed to run info");
    assert!(info.status.success());
    let info = stdout_json(&info);
    assert_eq!(info["version"], 3);
    assert_eq!(info["hasher"], "sha256");
    let root = info["root"].as_str().expect("root is hex").to_owned();

    balloon(&db)
        .args(["verify", "--event", "beta", "--root", &root, "--proof"])
        .arg(&proof_path)
        .assert()
        .success();
}

#[test]
fn verify_rejects_a_wrong_root_or_event() {
    let dir = tempdir().expect("Failed to create temp dir");
    let db = dir.path().join("db");
    let proof_path = dir.path().join("proof.json");

    balloon(&db)
        .args(["add", "--event", "alpha"])
        .assert()
        .success();
    balloon(&db)
        .args(["membership", "--event", "alpha", "--proof-out"])
        .arg(&proof_path)
        .assert()
        .success();

    let wrong_root = "00".repeat(32);
    balloon(&db)
        .args(["verify", "--root", &wrong_root, "--proof"])
        .arg(&proof_path)
        .assert()
        .failure();

    let info = balloon(&db).arg("info").output().expect("Failed to run info");
    let root = stdout_json(&info)["root"]
        .as_str()
        .expect("root is hex")
        .to_owned();

    balloon(&db)
        .args(["verify", "--event", "beta", "--root", &root, "--proof"])
        .arg(&proof_path)
        .assert()
        .failure();

    // The root recorded in the proof is not a substitute for a trusted one.
    balloon(&db)
        .args(["verify", "--proof"])
        .arg(&proof_path)
        .assert()
        .failure();

    balloon(&db)
        .args(["verify", "--event", "alpha", "--root", &root, "--proof"])
        .arg(&proof_path)
        .assert()
        .success();
}

#[test]
fn verify_rejects_a_proof_from_another_log() {
    let dir = tempdir().expect("Failed to create temp dir");
    let ours = dir.path().join("ours");
    let theirs = dir.path().join("theirs");
    let proof_path = dir.path().join("proof.json");

    balloon(&ours)
        .args(["add", "--event", "alpha"])
        .assert()
        .success();
    balloon(&theirs)
        .args(["add", "--event", "forged"])
        .assert()
        .success();
    balloon(&theirs)
        .args(["membership", "--event", "forged", "--proof-out"])
        .arg(&proof_path)
        .assert()
        .success();

    let info = balloon(&ours).arg("info").output().expect("Failed to run info");
    let our_root = stdout_json(&info)["root"]
        .as_str()
        .expect("root is hex")
        .to_owned();

    balloon(&ours)
        .args(["verify", "--event", "forged", "--root", &our_root, "--proof"])
        .arg(&proof_path)
        .assert()
        .failure();
}

#[test]
fn membership_of_unknown_event_fails() {
    let dir = tempdir().expect("Failed to create temp dir");
    let db = dir.path().join("db");

    balloon(&db)
        .args(["add", "--event", "alpha"])
        .assert()
        .success();
    balloon(&db)
        .args(["membership", "--event", "omega"])
        .assert()
        .failure();
}

#[test]
fn hasher_flag_selects_the_tree() {
    let dir = tempdir().expect("Failed to create temp dir");
    let db = dir.path().join("db");

    let output = balloon(&db)
        .args(["add", "--event", "alpha", "--hasher", "blake2b256"])
        .output()
        .expect("Failed to run add");
    assert!(output.status.success());
    let digest = stdout_json(&output)["hyper_digest"]
        .as_str()
        .expect("digest is hex")
        .len();
    assert_eq!(digest, 64);

    // The store remembers its hasher.
    balloon(&db)
        .args(["add", "--event", "beta", "--hasher", "sha256"])
        .assert()
        .failure();
}

#[test]
fn config_schema_is_json() {
    let dir = tempdir().expect("Failed to create temp dir");
    let output = balloon(&dir.path().join("db"))
        .arg("config-schema")
        .output()
        .expect("Failed to run config-schema");
    assert!(output.status.success());
    assert!(stdout_json(&output)["properties"]["storage"].is_object());
}
