//! # Git Checkout Tests
//!
//! Builds a throwaway repository with the local `git` binary and extracts
//! packages from it by tag. Skipped when `git` is not installed.

use std::path::Path;
use std::process::Command;

use mssdk_extract::{ExtractError, GitExtractor, GitSource, PackageRoots, SourceExtractor};

const TAG: &str = "v1.0.0";

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn git(repo: &Path, args: &[&str]) {
    let status = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(["-c", "user.name=Test", "-c", "user.email=test@example.org"])
        .args(args)
        .status()
        .expect("git should run");
    assert!(status.success(), "git {args:?} failed");
}

/// A repository with two packages under `mappings/` and one unrelated dir.
fn make_repo(root: &Path) {
    for pkg in ["package_a", "package_b"] {
        let dir = root.join("mappings").join(pkg);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("metadata.json"), format!(r#"{{"identifier":"{pkg}"}}"#)).unwrap();
    }
    std::fs::create_dir_all(root.join("docs")).unwrap();
    std::fs::write(root.join("docs/README.md"), "docs").unwrap();
    git(root, &["init", "-q"]);
    git(root, &["add", "--all"]);
    git(root, &["commit", "-q", "-m", "commit for test"]);
    git(root, &["tag", TAG]);
}

#[test]
fn extract_returns_package_path_inside_checkout() {
    if !git_available() {
        eprintln!("git not available; skipping");
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let repo = tmp.path().join("repo");
    std::fs::create_dir_all(&repo).unwrap();
    make_repo(&repo);
    let dest = tmp.path().join("dest");
    std::fs::create_dir_all(&dest).unwrap();

    let result = GitExtractor::new()
        .extract(
            repo.to_str().unwrap(),
            &dest,
            Path::new("mappings/package_a"),
            Some(TAG),
        )
        .unwrap();

    assert!(result.starts_with(&dest));
    assert!(result.join("metadata.json").is_file());
}

#[test]
fn extract_temporary_matches_pattern_and_cleans_up() {
    if !git_available() {
        eprintln!("git not available; skipping");
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let repo = tmp.path().join("repo");
    std::fs::create_dir_all(&repo).unwrap();
    make_repo(&repo);

    let source = GitSource::new(repo.to_str().unwrap(), "mappings/package_*").at(TAG);
    let scoped = SourceExtractor::extract_temporary(&GitExtractor::new(), &source).unwrap();
    let roots: Vec<_> = scoped.roots().iter().map(|p| p.to_path_buf()).collect();
    assert_eq!(roots.len(), 2);
    for root in &roots {
        let pattern = glob::Pattern::new("*/mappings/package_*").unwrap();
        assert!(pattern.matches_path(root), "{} does not match", root.display());
        assert!(root.join("metadata.json").is_file());
    }
    drop(scoped);
    for root in &roots {
        assert!(!root.exists());
    }
}

#[test]
fn unmatched_pattern_is_an_error() {
    if !git_available() {
        eprintln!("git not available; skipping");
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let repo = tmp.path().join("repo");
    std::fs::create_dir_all(&repo).unwrap();
    make_repo(&repo);

    let err = GitExtractor::new()
        .extract_temporary(repo.to_str().unwrap(), "nothing/here_*", Some(TAG))
        .unwrap_err();
    assert!(matches!(err, ExtractError::NoPackagesMatched { .. }));
}

#[test]
fn missing_tag_is_ref_not_found() {
    if !git_available() {
        eprintln!("git not available; skipping");
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let repo = tmp.path().join("repo");
    std::fs::create_dir_all(&repo).unwrap();
    make_repo(&repo);

    let err = GitExtractor::new()
        .extract_temporary(repo.to_str().unwrap(), "mappings/*", Some("v9.9.9"))
        .unwrap_err();
    assert!(matches!(err, ExtractError::RefNotFound { .. }), "{err:?}");
}

#[test]
fn missing_repository_is_unreachable() {
    if !git_available() {
        eprintln!("git not available; skipping");
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let missing = tmp.path().join("no-such-repo");
    let err = GitExtractor::new()
        .extract_temporary(missing.to_str().unwrap(), "mappings/*", None)
        .unwrap_err();
    assert!(
        matches!(err, ExtractError::RepositoryUnreachable { .. }),
        "{err:?}"
    );
}

#[test]
fn missing_package_path_is_reported() {
    if !git_available() {
        eprintln!("git not available; skipping");
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let repo = tmp.path().join("repo");
    std::fs::create_dir_all(&repo).unwrap();
    make_repo(&repo);
    let dest = tmp.path().join("dest");
    std::fs::create_dir_all(&dest).unwrap();

    let err = GitExtractor::new()
        .extract(repo.to_str().unwrap(), &dest, Path::new("mappings/absent"), None)
        .unwrap_err();
    assert!(matches!(err, ExtractError::PackagePathNotFound { .. }));
}

#[test]
fn second_extract_into_same_destination_keeps_first_checkout() {
    if !git_available() {
        eprintln!("git not available; skipping");
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let repo = tmp.path().join("repo");
    std::fs::create_dir_all(&repo).unwrap();
    make_repo(&repo);
    let dest = tmp.path().join("dest");
    std::fs::create_dir_all(&dest).unwrap();
    let extractor = GitExtractor::new();

    let first = extractor
        .extract(repo.to_str().unwrap(), &dest, Path::new("mappings/package_a"), None)
        .unwrap();
    std::fs::write(first.join("notes.txt"), "local edits").unwrap();

    let err = extractor
        .extract(repo.to_str().unwrap(), &dest, Path::new("mappings/package_b"), None)
        .unwrap_err();
    assert!(matches!(err, ExtractError::AlreadyExists { .. }), "{err:?}");
    assert_eq!(
        std::fs::read_to_string(first.join("notes.txt")).unwrap(),
        "local edits"
    );
}
