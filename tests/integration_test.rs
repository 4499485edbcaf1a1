// tests/integration_test.rs
use std::fs;
use std::path::Path;
use std::process::Command;

use git2::{Oid, Repository, RepositoryInitOptions, Signature};
use git_stamp::config::GitStampConfig;
use git_stamp::engine::{calculate_version, CalculateOptions};
use git_stamp::git::Git2Repository;
use tempfile::TempDir;

fn commit_file(repo: &Repository, dir: &Path, content: &str, message: &str) -> Oid {
    let path = dir.join("README.md");
    fs::write(&path, content).expect("Could not write file");

    let mut index = repo.index().expect("Could not get index");
    index
        .add_path(Path::new("README.md"))
        .expect("Could not add file to index");
    index.write().expect("Could not write index");

    let tree_id = index.write_tree().expect("Could not write tree");
    let tree = repo.find_tree(tree_id).expect("Could not find tree");
    let sig = Signature::now("Test User", "test@example.com").expect("Could not build signature");

    let parent = repo
        .head()
        .ok()
        .and_then(|head| head.target())
        .map(|id| repo.find_commit(id).expect("Could not find parent"));
    let parents: Vec<&git2::Commit> = parent.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .expect("Could not create commit")
}

// A `main` repository with `v1.0.0` on the first commit and one commit after it
fn setup_test_repo() -> TempDir {
    let temp_dir = TempDir::new().expect("Could not create temp dir");
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("main");
    let repo = Repository::init_opts(temp_dir.path(), &opts).expect("Could not init git repo");

    let first = commit_file(&repo, temp_dir.path(), "Initial content\n", "Initial commit");
    {
        let object = repo.find_object(first, None).expect("Could not find commit");
        repo.tag_lightweight("v1.0.0", &object, false)
            .expect("Could not create tag");
    }
    commit_file(&repo, temp_dir.path(), "Updated content\n", "fix: handle empty input");

    temp_dir
}

fn git_stamp(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_git-stamp"));
    cmd.arg("--path")
        .arg(dir)
        .env_remove("GITSTAMP_CONFIG")
        .env_remove("RUST_LOG")
        .env("XDG_CONFIG_HOME", dir)
        .env("HOME", dir);
    cmd
}

#[test]
fn test_version_from_on_disk_repository() {
    let dir = setup_test_repo();
    let repo = Git2Repository::open(dir.path()).unwrap();

    let result =
        calculate_version(&repo, &GitStampConfig::default(), &CalculateOptions::default()).unwrap();
    assert_eq!(result.version.to_string(), "1.0.1-ci.1");
    assert_eq!(result.branch, "main");
    assert_eq!(result.commits_since_source, 1);
}

#[test]
fn test_annotated_tag_on_head() {
    let dir = setup_test_repo();
    {
        let raw = Repository::open(dir.path()).unwrap();
        let head = raw.head().unwrap().peel_to_commit().unwrap();
        let sig = Signature::now("Test User", "test@example.com").unwrap();
        raw.tag("v1.0.1", head.as_object(), &sig, "release 1.0.1", false)
            .unwrap();
    }
    let repo = Git2Repository::open(dir.path()).unwrap();

    let result =
        calculate_version(&repo, &GitStampConfig::default(), &CalculateOptions::default()).unwrap();
    assert_eq!(result.version.to_string(), "1.0.1");
    assert_eq!(result.commits_since_source, 0);
}

#[test]
fn test_cli_prints_version() {
    let dir = setup_test_repo();
    let output = git_stamp(dir.path())
        .arg("--quiet")
        .output()
        .expect("Failed to execute git-stamp");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.trim(), "1.0.1-ci.1+1");
}

#[test]
fn test_cli_output_kinds() {
    let dir = setup_test_repo();

    let semver = git_stamp(dir.path())
        .args(["--quiet", "--output", "semver"])
        .output()
        .unwrap();
    assert_eq!(String::from_utf8(semver.stdout).unwrap().trim(), "1.0.1-ci.1");

    let json = git_stamp(dir.path())
        .args(["--quiet", "--output", "json"])
        .output()
        .unwrap();
    assert!(json.status.success());
    let value: serde_json::Value = serde_json::from_slice(&json.stdout).unwrap();
    assert_eq!(value["branch"], "main");
    assert_eq!(value["variables"]["MajorMinorPatch"], "1.0.1");

    let template = git_stamp(dir.path())
        .args(["--quiet", "--format", "v{MajorMinorPatch}"])
        .output()
        .unwrap();
    assert_eq!(String::from_utf8(template.stdout).unwrap().trim(), "v1.0.1");
}

#[test]
fn test_cli_reads_repository_config() {
    let dir = setup_test_repo();
    fs::write(
        dir.path().join("gitstamp.toml"),
        "mode = \"ContinuousDeployment\"\n",
    )
    .unwrap();

    let output = git_stamp(dir.path())
        .args(["--quiet", "--output", "semver"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap().trim(), "1.0.1");
}

#[test]
fn test_cli_show_config() {
    let dir = setup_test_repo();
    let output = git_stamp(dir.path())
        .args(["--quiet", "--show-config"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let parsed: GitStampConfig = toml::from_str(&stdout).unwrap();
    assert!(parsed.branches.contains_key("main"));
    assert!(parsed.branches.contains_key("pull-request"));
}

#[test]
fn test_cli_fails_on_invalid_config() {
    let dir = setup_test_repo();
    fs::write(dir.path().join("gitstamp.toml"), "tag_prefix = \"(\"\n").unwrap();

    let output = git_stamp(dir.path()).output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Invalid pattern"));
}

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_git-stamp"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("git-stamp"));
    assert!(stdout.contains("semantic version"));
}
