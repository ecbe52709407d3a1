use std::path::Path;
use std::process::Command;

use collabscope_engine::extract::{extract_history, ExtractOptions};
use collabscope_engine::{analyze, AnalyzeOptions};

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

fn commit_as(repo: &Path, file: &str, content: &str, name: &str, email: &str, messages: &[&str]) {
    std::fs::write(repo.join(file), content).unwrap();
    git(repo, &["add", "."]);
    let mut args = vec!["commit", "-q"];
    for message in messages {
        args.push("-m");
        args.push(message);
    }
    let output = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(&args)
        .env("GIT_AUTHOR_NAME", name)
        .env("GIT_AUTHOR_EMAIL", email)
        .env("GIT_COMMITTER_NAME", name)
        .env("GIT_COMMITTER_EMAIL", email)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git commit failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn extracts_real_history_with_trailers_and_numstat() {
    let dir = tempfile::tempdir().unwrap();
    git(dir.path(), &["init", "-q", "-b", "main"]);
    commit_as(
        dir.path(),
        "a.txt",
        "one\ntwo\n",
        "Alice",
        "alice@example.com",
        &["first"],
    );
    commit_as(
        dir.path(),
        "b.txt",
        "pair\n",
        "Bob",
        "bob@example.com",
        &[
            "pair work",
            "Co-authored-by: Alice <alice@example.com>\nReviewed-by: Carol <carol@example.com>",
        ],
    );

    let commits = extract_history(dir.path(), &ExtractOptions::default()).unwrap();
    assert_eq!(commits.len(), 2);

    // git log is newest-first.
    let pair = &commits[0];
    assert_eq!(pair.subject, "pair work");
    assert_eq!(pair.co_authors.len(), 1);
    assert_eq!(pair.co_authors[0].email.as_deref(), Some("alice@example.com"));
    assert_eq!(pair.reviewers.len(), 1);
    assert_eq!(pair.reviewers[0].email.as_deref(), Some("carol@example.com"));
    assert_eq!(pair.files.len(), 1);
    assert_eq!(pair.files[0].path, "b.txt");
    assert_eq!(pair.lines_added, 1);

    let first = &commits[1];
    assert_eq!(first.author.name.as_deref(), Some("Alice"));
    assert_eq!(first.lines_added, 2);
    assert!(first.timestamp.is_some());
}

#[test]
fn empty_repository_extracts_to_nothing() {
    let dir = tempfile::tempdir().unwrap();
    git(dir.path(), &["init", "-q", "-b", "main"]);

    let commits = extract_history(dir.path(), &ExtractOptions::default()).unwrap();
    assert!(commits.is_empty());
}

#[test]
fn end_to_end_analysis_of_a_real_repository() {
    let dir = tempfile::tempdir().unwrap();
    git(dir.path(), &["init", "-q", "-b", "main"]);
    commit_as(dir.path(), "a.txt", "a\n", "Alice", "alice@example.com", &["a1"]);
    commit_as(
        dir.path(),
        "b.txt",
        "b\n",
        "Bob",
        "bob@example.com",
        &["b1", "Co-authored-by: Alice <alice@example.com>"],
    );

    let result = analyze(dir.path(), &AnalyzeOptions::default()).unwrap();
    assert_eq!(result.totals.total_commits, 2);
    assert_eq!(result.human_contributor_count, 2);
    assert_eq!(result.classification.to_string(), "collaborative");

    let alice = result
        .contributors_detailed
        .iter()
        .find(|c| c.email.as_deref() == Some("alice@example.com"))
        .unwrap();
    assert_eq!(alice.metrics.commits_authored, 1);
    assert_eq!(alice.metrics.commit_participation, 2);
    assert!((alice.metrics.commit_weighted - 1.5).abs() < 1e-9);

    let main = result.main_author.as_ref().unwrap();
    assert_eq!(main.email.as_deref(), Some("alice@example.com"));
}

#[test]
fn merge_commits_set_timeframe_but_not_credit() {
    let dir = tempfile::tempdir().unwrap();
    git(dir.path(), &["init", "-q", "-b", "main"]);
    commit_as(dir.path(), "a.txt", "a\n", "Alice", "alice@example.com", &["base"]);
    git(dir.path(), &["checkout", "-q", "-b", "feature"]);
    commit_as(dir.path(), "b.txt", "b\n", "Alice", "alice@example.com", &["feature"]);
    git(dir.path(), &["checkout", "-q", "main"]);
    commit_as(dir.path(), "c.txt", "c\n", "Alice", "alice@example.com", &["mainline"]);
    git(dir.path(), &["merge", "-q", "--no-ff", "-m", "merge feature", "feature"]);

    let result = analyze(dir.path(), &AnalyzeOptions::default()).unwrap();
    // Three real commits; the merge is excluded from attribution.
    assert_eq!(result.totals.total_commits, 3);
    assert_eq!(result.contributors_detailed.len(), 1);
    let alice = &result.contributors_detailed[0];
    assert_eq!(alice.metrics.commits_authored, 3);
    assert!(result.timeframe.first_commit_at.is_some());
}
