use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn test_init_creates_config_file() {
    let temp = tempdir().unwrap();
    let config_path = temp.path().join("heritage.json");

    let mut cmd = Command::cargo_bin("heritage").unwrap();
    cmd.arg("init")
        .arg("--output")
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration written"));

    assert!(config_path.exists());
}

#[test]
fn test_init_refuses_to_overwrite() {
    let temp = tempdir().unwrap();
    let config_path = temp.path().join("heritage.json");
    std::fs::write(&config_path, "{}").unwrap();

    let mut cmd = Command::cargo_bin("heritage").unwrap();
    cmd.arg("init")
        .arg("--output")
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_validate_accepts_generated_config() {
    let temp = tempdir().unwrap();
    let config_path = temp.path().join("heritage.json");

    Command::cargo_bin("heritage")
        .unwrap()
        .arg("init")
        .arg("--output")
        .arg(&config_path)
        .assert()
        .success();

    Command::cargo_bin("heritage")
        .unwrap()
        .arg("validate")
        .arg("--config")
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}

#[test]
fn test_validate_rejects_bad_config() {
    let temp = tempdir().unwrap();
    let config_path = temp.path().join("bad.json");
    std::fs::write(
        &config_path,
        r#"{ "genome": { "num_linkage_subunits": 10, "haploid_chromosome_number": 4 } }"#,
    )
    .unwrap();

    Command::cargo_bin("heritage")
        .unwrap()
        .arg("validate")
        .arg("--config")
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a valid configuration"));
}

#[test]
fn test_run_small_simulation_with_output() {
    let temp = tempdir().unwrap();
    let config_path = temp.path().join("heritage.json");
    let out_dir = temp.path().join("results");
    std::fs::write(
        &config_path,
        r#"{
            "execution": { "pop_size": 10, "num_generations": 2, "seed": 42 },
            "genome": { "num_linkage_subunits": 12, "haploid_chromosome_number": 4 },
            "mutation": { "mutn_rate": 2.0 }
        }"#,
    )
    .unwrap();

    Command::cargo_bin("heritage")
        .unwrap()
        .arg("run")
        .arg("--config")
        .arg(&config_path)
        .arg("--output")
        .arg(&out_dir)
        .arg("--progress")
        .arg("false")
        .assert()
        .success()
        .stdout(predicate::str::contains("Simulation complete!"));

    assert!(out_dir.join("history.tsv").exists());
    assert!(out_dir.join("fitness.tsv").exists());
}

#[test]
fn test_run_seed_override_is_deterministic() {
    let temp = tempdir().unwrap();
    let config_path = temp.path().join("heritage.json");
    std::fs::write(
        &config_path,
        r#"{
            "execution": { "pop_size": 20, "num_generations": 3 },
            "genome": { "num_linkage_subunits": 12, "haploid_chromosome_number": 4 },
            "mutation": { "mutn_rate": 5.0 }
        }"#,
    )
    .unwrap();
    let out_a = temp.path().join("a");
    let out_b = temp.path().join("b");

    for out in [&out_a, &out_b] {
        Command::cargo_bin("heritage")
            .unwrap()
            .arg("run")
            .arg("--config")
            .arg(&config_path)
            .arg("--seed")
            .arg("7")
            .arg("--output")
            .arg(out)
            .arg("--progress")
            .arg("false")
            .assert()
            .success();
    }

    let a = std::fs::read_to_string(out_a.join("fitness.tsv")).unwrap();
    let b = std::fs::read_to_string(out_b.join("fitness.tsv")).unwrap();
    assert_eq!(a, b);
}
