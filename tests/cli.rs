use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn gptprep() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("gptprep"))
}

#[test]
fn flatten_writes_delimited_records() {
    let temp = tempdir().unwrap();
    let repo = temp.path().join("repo");
    write_file(&repo.join("a.txt"), "alpha");
    write_file(&repo.join("sub/b.txt"), "beta");

    let output = temp.path().join("flat.txt");

    gptprep()
        .arg("flatten")
        .arg("--repo-path")
        .arg(&repo)
        .arg("--output")
        .arg(&output)
        .arg("--ignore-file")
        .arg(temp.path().join(".gptignore"))
        .assert()
        .success()
        .stderr(predicate::str::contains("repository contents written to"));

    let flat = fs::read_to_string(&output).unwrap();
    assert_eq!(flat, "----\na.txt\nalpha\n----\nsub/b.txt\nbeta\n--END--");
}

#[test]
fn flatten_respects_ignore_patterns() {
    let temp = tempdir().unwrap();
    let repo = temp.path().join("repo");
    write_file(&repo.join("src/main.rs"), "fn main() {}");
    write_file(&repo.join("debug.log"), "noise");
    write_file(&repo.join("build/out.log"), "noise");

    let ignore_file = temp.path().join("patterns");
    write_file(&ignore_file, "*.log\nbuild/*\n");

    let output = temp.path().join("flat.txt");

    gptprep()
        .arg("flatten")
        .arg("--repo-path")
        .arg(&repo)
        .arg("--output")
        .arg(&output)
        .arg("--ignore-file")
        .arg(&ignore_file)
        .assert()
        .success();

    let flat = fs::read_to_string(&output).unwrap();
    assert!(flat.contains("src/main.rs"));
    assert!(!flat.contains("debug.log"));
    assert!(!flat.contains("out.log"));
}

#[test]
fn flatten_missing_ignore_file_ignores_nothing() {
    let temp = tempdir().unwrap();
    let repo = temp.path().join("repo");
    write_file(&repo.join("only.txt"), "here");

    let output = temp.path().join("flat.txt");

    gptprep()
        .arg("flatten")
        .arg("--repo-path")
        .arg(&repo)
        .arg("--output")
        .arg(&output)
        .arg("--ignore-file")
        .arg(temp.path().join("no-such-file"))
        .assert()
        .success();

    let flat = fs::read_to_string(&output).unwrap();
    assert!(flat.contains("only.txt"));
}

#[test]
fn flatten_stats_prints_json_on_stdout() {
    let temp = tempdir().unwrap();
    let repo = temp.path().join("repo");
    write_file(&repo.join("a.txt"), "a");
    write_file(&repo.join("b.log"), "b");

    let ignore_file = temp.path().join("patterns");
    write_file(&ignore_file, "*.log\n");

    let assert = gptprep()
        .arg("--stats")
        .arg("flatten")
        .arg("--repo-path")
        .arg(&repo)
        .arg("--output")
        .arg(temp.path().join("flat.txt"))
        .arg("--ignore-file")
        .arg(&ignore_file)
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    let stats: Value = serde_json::from_str(stdout.trim()).expect("valid stats json");
    assert_eq!(stats["files_written"], 1);
    assert_eq!(stats["files_ignored"], 1);
    assert_eq!(stats["patterns"], 1);
}

#[test]
fn flatten_missing_repo_path_fails() {
    let temp = tempdir().unwrap();

    gptprep()
        .arg("flatten")
        .arg("--repo-path")
        .arg(temp.path().join("absent"))
        .arg("--output")
        .arg(temp.path().join("flat.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to walk"));
}

#[test]
fn chunk_splits_into_numbered_files() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("input.txt");
    write_file(
        &input,
        "the first line of the document\nthe second line of the document\nthe third line of the document\n",
    );

    let pattern = temp.path().join("part_{chunk_id}.txt");

    let assert = gptprep()
        .arg("chunk")
        .arg("--input")
        .arg(&input)
        .arg("--max-tokens")
        .arg("8")
        .arg("--output-pattern")
        .arg(pattern.to_str().unwrap())
        .assert()
        .success()
        .stderr(predicate::str::contains("token count"))
        .stderr(predicate::str::contains("chunks"));

    drop(assert);

    // every line is ~7 tokens under cl100k, so each lands in its own chunk
    let mut pieces = String::new();
    let mut id = 1;
    loop {
        let piece = temp.path().join(format!("part_{}.txt", id));
        if !piece.exists() {
            break;
        }
        pieces.push_str(&fs::read_to_string(&piece).unwrap());
        id += 1;
    }
    assert!(id > 2, "expected multiple chunks, got {}", id - 1);
    assert_eq!(pieces, fs::read_to_string(&input).unwrap());
}

#[test]
fn chunk_empty_input_creates_no_files() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("empty.txt");
    write_file(&input, "");

    let pattern = temp.path().join("part_{chunk_id}.txt");

    gptprep()
        .arg("chunk")
        .arg("--input")
        .arg(&input)
        .arg("--max-tokens")
        .arg("100")
        .arg("--output-pattern")
        .arg(pattern.to_str().unwrap())
        .assert()
        .success()
        .stderr(predicate::str::contains("0 chunks"));

    assert!(!temp.path().join("part_1.txt").exists());
}

#[test]
fn chunk_stats_prints_json_on_stdout() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("input.txt");
    write_file(&input, "a line of text\nanother line of text\n");

    let assert = gptprep()
        .arg("--stats")
        .arg("chunk")
        .arg("--input")
        .arg(&input)
        .arg("--max-tokens")
        .arg("1000")
        .arg("--output-pattern")
        .arg(temp.path().join("c{chunk_id}.txt").to_str().unwrap())
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    let stats: Value = serde_json::from_str(stdout.trim()).expect("valid stats json");
    assert_eq!(stats["chunks"], 1);
    assert_eq!(stats["max_tokens"], 1000);
    assert_eq!(stats["encoding"], "cl100k");
    assert_eq!(stats["oversized_chunks"], 0);
}

#[test]
fn chunk_missing_input_fails() {
    let temp = tempdir().unwrap();

    gptprep()
        .arg("chunk")
        .arg("--input")
        .arg(temp.path().join("absent.txt"))
        .arg("--max-tokens")
        .arg("10")
        .arg("--output-pattern")
        .arg(temp.path().join("c{chunk_id}.txt").to_str().unwrap())
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open"));
}

#[test]
fn chunk_pattern_without_placeholder_fails() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("input.txt");
    write_file(&input, "text\n");

    gptprep()
        .arg("chunk")
        .arg("--input")
        .arg(&input)
        .arg("--max-tokens")
        .arg("10")
        .arg("--output-pattern")
        .arg(temp.path().join("chunk.txt").to_str().unwrap())
        .assert()
        .failure()
        .stderr(predicate::str::contains("{chunk_id}"));
}

#[test]
fn chunk_zero_max_tokens_is_rejected_by_the_parser() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("input.txt");
    write_file(&input, "text\n");

    gptprep()
        .arg("chunk")
        .arg("--input")
        .arg(&input)
        .arg("--max-tokens")
        .arg("0")
        .arg("--output-pattern")
        .arg(temp.path().join("c{chunk_id}.txt").to_str().unwrap())
        .assert()
        .failure();
}

#[test]
fn chunk_unknown_encoding_fails() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("input.txt");
    write_file(&input, "text\n");

    gptprep()
        .arg("chunk")
        .arg("--input")
        .arg(&input)
        .arg("--max-tokens")
        .arg("10")
        .arg("--encoding")
        .arg("gpt97")
        .arg("--output-pattern")
        .arg(temp.path().join("c{chunk_id}.txt").to_str().unwrap())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown encoding"));
}
