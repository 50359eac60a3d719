use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

// 4-cycle plus a pendant node 4 attached to 0.
const DATASET: &str = r#"{
    "learning_type": "transductive",
    "graph": {
        "num_nodes": 5,
        "edges": [[0, 1], [1, 2], [2, 3], [3, 0], [0, 4]],
        "features": [[1.0, 0.0], [0.0, 1.0], [1.0, 1.0], [0.5, 0.5], [1.0, 0.0]],
        "labels": [0, 1, 0, 1, 2]
    },
    "split": { "train": [0, 1], "val": [2], "test": [3, 4] }
}"#;

fn write_dataset(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("dataset.json");
    fs::write(&path, DATASET).unwrap();
    path
}

#[test]
fn test_cli_stats() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let input = write_dataset(dir.path());

    let mut cmd = Command::cargo_bin("edgedrop")?;
    cmd.arg("stats").arg(&input);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Learning type:  transductive"))
        .stdout(predicate::str::contains("Nodes:          5"))
        .stdout(predicate::str::contains("Edges:          5"))
        .stdout(predicate::str::contains("Classes:        3"))
        .stdout(predicate::str::contains("2 train / 1 val / 2 test"));
    Ok(())
}

#[test]
fn test_cli_sample_full_retention() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let input = write_dataset(dir.path());

    let mut cmd = Command::cargo_bin("edgedrop")?;
    cmd.arg("sample")
        .arg(&input)
        .arg("--percent")
        .arg("1.0")
        .arg("--rounds")
        .arg("3");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("kept 5 / 5 edges"))
        .stdout(predicate::str::contains("Round   3"));
    Ok(())
}

#[test]
fn test_cli_sample_rejects_negative_percent() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let input = write_dataset(dir.path());

    let mut cmd = Command::cargo_bin("edgedrop")?;
    cmd.arg("sample").arg(&input).arg("--percent=-0.5");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid retain probability"));
    Ok(())
}

#[test]
fn test_cli_unknown_scheme() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let input = write_dataset(dir.path());

    let mut cmd = Command::cargo_bin("edgedrop")?;
    cmd.arg("sample").arg(&input).arg("--normalization").arg("SymNorm");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unknown normalization scheme"));
    Ok(())
}

#[test]
fn test_cli_normalize() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let input = write_dataset(dir.path());
    let output = dir.path().join("op.json");

    let mut cmd = Command::cargo_bin("edgedrop")?;
    cmd.arg("normalize")
        .arg(&input)
        .arg("--normalization")
        .arg("NoNorm")
        .arg("--view")
        .arg("val")
        .arg("-o")
        .arg(&output);
    cmd.assert().success().stdout(predicate::str::contains("Wrote 10 entries"));

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output)?)?;
    assert_eq!(json["normalization"], "NoNorm");
    assert_eq!(json["num_nodes"], 5);
    assert_eq!(json["triplets"].as_array().map(Vec::len), Some(10));
    Ok(())
}

#[test]
fn test_cli_missing_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("edgedrop")?;
    cmd.arg("stats").arg("does/not/exist.json");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load dataset"));
    Ok(())
}

#[test]
fn test_cli_report() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    for (run, acc) in [("layers_2-seed_1", "0.8"), ("layers_2-seed_2", "0.6")] {
        let run_dir = dir.path().join("cora_init").join(run);
        fs::create_dir_all(&run_dir)?;
        fs::write(run_dir.join("acc_test.json"), acc)?;
    }

    let mut cmd = Command::cargo_bin("edgedrop")?;
    cmd.arg("report")
        .arg("--loss-dir")
        .arg(dir.path())
        .arg("--datasets")
        .arg("cora")
        .arg("--inits")
        .arg("init")
        .arg("--layers")
        .arg("2,4");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Max:"))
        .stdout(predicate::str::contains("cora_init"))
        .stdout(predicate::str::contains("0.800000"))
        .stdout(predicate::str::contains("0.700000"))
        .stdout(predicate::str::contains("NaN"));
    Ok(())
}
