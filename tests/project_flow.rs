use std::path::Path;
use std::process::Command;

fn git(repo: &Path, args: &[&str]) {
    let output = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(args)
        .env("GIT_AUTHOR_NAME", "Test")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_NAME", "Test")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

fn seed_repo(repo: &Path) {
    git(repo, &["init", "-q", "-b", "main"]);
    std::fs::write(repo.join("lib.rs"), "fn main() {}\n").unwrap();
    git(repo, &["add", "."]);
    git(repo, &["commit", "-q", "-m", "initial"]);
}

fn collabscope(workdir: &Path, db: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_collabscope"))
        .arg("--db")
        .arg(db)
        .args(args)
        .current_dir(workdir)
        .output()
        .unwrap()
}

fn assert_success(output: &std::process::Output) -> String {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn add_refresh_list_export_round_trip() {
    let work = tempfile::tempdir().unwrap();
    let repo = tempfile::tempdir().unwrap();
    seed_repo(repo.path());
    let db = work.path().join("scope.db");

    let out = collabscope(
        work.path(),
        &db,
        &["project", "add", "demo", repo.path().to_str().unwrap()],
    );
    let stdout = assert_success(&out);
    assert!(stdout.contains("Registered 'demo'"));

    let out = collabscope(work.path(), &db, &["project", "list"]);
    let stdout = assert_success(&out);
    assert!(stdout.contains("demo"));
    assert!(stdout.contains("not analyzed"));

    let out = collabscope(work.path(), &db, &["refresh"]);
    let stdout = assert_success(&out);
    assert!(stdout.contains("Refreshed 1 projects, 0 failed"));

    let out = collabscope(work.path(), &db, &["project", "list"]);
    let stdout = assert_success(&out);
    assert!(stdout.contains("individual"));
    assert!(stdout.contains("Test"));

    let out = collabscope(work.path(), &db, &["export", "demo"]);
    let stdout = assert_success(&out);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["classification"], "individual");
    assert_eq!(json["mainAuthor"]["email"], "test@example.com");

    let out = collabscope(work.path(), &db, &["export", "demo", "--format", "csv"]);
    let stdout = assert_success(&out);
    assert!(stdout.starts_with("Name,Email,Type"));
    assert!(stdout.contains("test@example.com"));
}

#[test]
fn add_rejects_missing_path() {
    let work = tempfile::tempdir().unwrap();
    let db = work.path().join("scope.db");

    let out = collabscope(
        work.path(),
        &db,
        &["project", "add", "ghost", "/definitely/not/here"],
    );
    assert!(!out.status.success());
}

#[test]
fn refresh_survives_a_broken_project() {
    let work = tempfile::tempdir().unwrap();
    let good = tempfile::tempdir().unwrap();
    seed_repo(good.path());
    let bad = tempfile::tempdir().unwrap(); // exists but is not a repository
    let db = work.path().join("scope.db");

    assert_success(&collabscope(
        work.path(),
        &db,
        &["project", "add", "bad", bad.path().to_str().unwrap()],
    ));
    assert_success(&collabscope(
        work.path(),
        &db,
        &["project", "add", "good", good.path().to_str().unwrap()],
    ));

    let out = collabscope(work.path(), &db, &["refresh"]);
    // The broken project makes the batch exit nonzero, but the good project
    // still refreshes and exports.
    assert!(!out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Refreshed 1 projects, 1 failed"));

    let out = collabscope(work.path(), &db, &["export", "good"]);
    assert_success(&out);
}

#[test]
fn export_unknown_project_fails() {
    let work = tempfile::tempdir().unwrap();
    let db = work.path().join("scope.db");

    let out = collabscope(work.path(), &db, &["export", "ghost"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Unknown project"), "stderr: {stderr}");
}
