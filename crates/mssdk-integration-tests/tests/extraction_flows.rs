//! # Extraction Flows
//!
//! Packages acquired from archives and git checkouts, validated, and their
//! scoped directories cleaned up afterwards.

use std::path::{Path, PathBuf};
use std::process::Command;

use mssdk_extract::{
    ArchiveExtractor, ExtractError, GitExtractor, GitSource, PackageRoots, SourceExtractor,
};
use mssdk_integration_tests::{sign_in_place, write_scenario, PackageFixture};
use mssdk_pack::{
    load_from_archive, load_from_git, validate_bulk_from_archives, validate_bulk_from_git,
    BulkOptions, BulkOutcome, PackError, ValidationPipeline,
};

fn options() -> BulkOptions {
    BulkOptions {
        workers: Some(2),
        update_hash: false,
    }
}

#[test]
fn every_archive_format_round_trips_a_signed_package() {
    let fixture = PackageFixture::signed("package_archived").unwrap();
    let expected = fixture.load().unwrap();
    for name in ["pkg.zip", "pkg.tar", "pkg.tar.gz", "pkg.tgz"] {
        let archive = fixture.scratch().join(name);
        ArchiveExtractor::new().pack(fixture.root(), &archive).unwrap();
        let loaded = load_from_archive(&archive).unwrap();
        assert_eq!(loaded, expected, "{name}");
        assert!(ValidationPipeline::standard().validate(&loaded).unwrap());
    }
}

#[test]
fn scoped_extraction_is_removed_on_drop() {
    let fixture = PackageFixture::signed("package_scoped").unwrap();
    let archive = fixture.scratch().join("pkg.zip");
    ArchiveExtractor::new().pack(fixture.root(), &archive).unwrap();

    let extractor = ArchiveExtractor::new();
    let scoped = SourceExtractor::extract_temporary(&extractor, archive.as_path()).unwrap();
    let root: PathBuf = scoped.roots()[0].to_path_buf();
    assert!(root.join("metadata.json").is_file());
    drop(scoped);
    assert!(!root.exists());
}

#[test]
fn scoped_extraction_is_removed_on_panic() {
    let fixture = PackageFixture::signed("package_unwind").unwrap();
    let archive = fixture.scratch().join("pkg.tar");
    ArchiveExtractor::new().pack(fixture.root(), &archive).unwrap();

    let mut seen: Option<PathBuf> = None;
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let scoped = ArchiveExtractor::new().extract_temporary(&archive).unwrap();
        seen = Some(scoped.path().to_path_buf());
        panic!("consumer failed");
    }));
    assert!(result.is_err());
    let seen = seen.unwrap();
    assert!(!seen.exists());
}

#[test]
fn corrupt_archive_is_an_archive_error() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("broken.zip");
    std::fs::write(&archive, b"PK\x03\x04 definitely not a zip").unwrap();
    let err = load_from_archive(&archive).unwrap_err();
    assert!(
        matches!(err, PackError::Extraction(ExtractError::Archive { .. })),
        "{err:?}"
    );
    assert!(err.to_string().contains("failed to extract archive"));
}

#[test]
fn directory_passed_as_archive_is_not_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_from_archive(dir.path()).unwrap_err();
    assert!(matches!(
        err,
        PackError::Extraction(ExtractError::NotAFile { .. })
    ));
}

#[test]
fn bulk_archives_report_each_package() {
    let good = PackageFixture::signed("package_good").unwrap();
    let stale = PackageFixture::unsigned("package_stale").unwrap();
    let good_archive = good.scratch().join("good.zip");
    let stale_archive = stale.scratch().join("stale.tar.gz");
    ArchiveExtractor::new().pack(good.root(), &good_archive).unwrap();
    ArchiveExtractor::new().pack(stale.root(), &stale_archive).unwrap();

    let report = validate_bulk_from_archives(
        &[good_archive, stale_archive],
        &ValidationPipeline::standard(),
        &options(),
    )
    .unwrap();
    assert_eq!(report.len(), 2);
    assert_eq!(report.entries[0].outcome, BulkOutcome::Valid);
    assert!(matches!(report.entries[1].outcome, BulkOutcome::Invalid(_)));
    assert!(!report.all_valid());
}

// -- git ----------------------------------------------------------------------

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

/// A repository with two signed packages and one unsigned one under `mappings/`.
fn make_repo(repo: &Path) {
    for id in ["package_a", "package_b"] {
        let root = repo.join("mappings").join(id);
        write_scenario(&root, id).unwrap();
        sign_in_place(&root).unwrap();
    }
    write_scenario(&repo.join("mappings/draft_c"), "draft_c").unwrap();
    git(repo, &["init", "-q"]);
    git(repo, &["add", "--all"]);
    git(repo, &["commit", "-q", "-m", "packages"]);
    git(repo, &["tag", "2.0.0"]);
}

#[test]
fn git_packages_load_by_pattern() {
    if !git_available() {
        eprintln!("git not available; skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let repo = dir.path().join("repo");
    std::fs::create_dir_all(&repo).unwrap();
    make_repo(&repo);

    let source = GitSource::new(repo.to_str().unwrap(), "mappings/package_*").at("2.0.0");
    let packages = load_from_git(&source).unwrap();
    let ids: Vec<_> = packages.iter().map(|p| p.identifier().to_string()).collect();
    assert_eq!(ids, ["package_a", "package_b"]);
}

#[test]
fn git_bulk_validation_reports_drafts() {
    if !git_available() {
        eprintln!("git not available; skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let repo = dir.path().join("repo");
    std::fs::create_dir_all(&repo).unwrap();
    make_repo(&repo);

    let source = GitSource::new(repo.to_str().unwrap(), "mappings/*");
    let report = validate_bulk_from_git(
        &GitExtractor::new(),
        &source,
        &ValidationPipeline::standard(),
        &options(),
    )
    .unwrap();
    assert_eq!(report.len(), 3);
    assert_eq!(report.valid_count(), 2);
    let draft = report
        .entries
        .iter()
        .find(|e| e.package.as_deref() == Some("draft_c"))
        .unwrap();
    assert_eq!(draft.source, "mappings/draft_c");
    assert!(matches!(draft.outcome, BulkOutcome::Invalid(_)));
}

#[test]
fn git_unmatched_pattern_fails_whole_operation() {
    if !git_available() {
        eprintln!("git not available; skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let repo = dir.path().join("repo");
    std::fs::create_dir_all(&repo).unwrap();
    make_repo(&repo);

    let source = GitSource::new(repo.to_str().unwrap(), "nothing/*");
    let err = validate_bulk_from_git(
        &GitExtractor::new(),
        &source,
        &ValidationPipeline::standard(),
        &options(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        PackError::Extraction(ExtractError::NoPackagesMatched { .. })
    ));
}
