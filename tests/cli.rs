use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

const TWO_PARAGRAPHS: &str = "The quick brown fox ran.\n\nThe lazy dog slept late.";

fn storyloom(data_dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("storyloom").unwrap();
    cmd.arg("--data-dir").arg(data_dir).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    let dir = tempdir().unwrap();
    storyloom(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("chunk")
                .and(predicate::str::contains("ingest"))
                .and(predicate::str::contains("search"))
                .and(predicate::str::contains("download"))
                .and(predicate::str::contains("story"))
                .and(predicate::str::contains("models"))
                .and(predicate::str::contains("stats")),
        );
}

#[test]
fn test_chunk_with_overlap() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("fox.txt");
    std::fs::write(&file, TWO_PARAGRAPHS).unwrap();

    storyloom(dir.path())
        .args(["chunk", "--max-size", "30", "--overlap", "5"])
        .arg(&file)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--- chunk 0 (24 chars) ---\nThe quick brown fox ran.")
                .and(predicate::str::contains("ran.\n\nThe lazy dog slept late."))
                .and(predicate::str::contains("2 chunks")),
        );
}

#[test]
fn test_chunk_bytes_budget() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("cafe.txt");
    std::fs::write(&file, "café au lait").unwrap();

    storyloom(dir.path())
        .args(["chunk", "--bytes", "--max-size", "64", "--overlap", "0"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("(13 bytes)").and(predicate::str::contains("1 chunks")));
}

#[test]
fn test_chunk_rejects_overlap_not_smaller_than_max() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("fox.txt");
    std::fs::write(&file, TWO_PARAGRAPHS).unwrap();

    storyloom(dir.path())
        .args(["chunk", "--max-size", "10", "--overlap", "10"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("overlap"));
}

#[test]
fn test_chunk_missing_file_fails() {
    let dir = tempdir().unwrap();
    storyloom(dir.path())
        .args(["chunk"])
        .arg(dir.path().join("missing.txt"))
        .assert()
        .failure();
}

#[test]
fn test_stats_without_store() {
    let dir = tempdir().unwrap();
    storyloom(dir.path())
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("No vector store"));
}

#[test]
fn test_config_file_is_applied() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("storyloom.toml"),
        "[chunking]\nmax_size = 30\noverlap = 5\n",
    )
    .unwrap();
    let file = dir.path().join("fox.txt");
    std::fs::write(&file, TWO_PARAGRAPHS).unwrap();

    storyloom(dir.path())
        .arg("chunk")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 chunks"));
}

#[test]
fn test_invalid_config_fails() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("bad.toml");
    std::fs::write(&config, "[chunking]\nmax_size = 0\n").unwrap();

    storyloom(dir.path())
        .arg("--config")
        .arg(&config)
        .arg("stats")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid config"));
}
