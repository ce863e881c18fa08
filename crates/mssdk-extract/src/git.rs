//! # Git source extraction
//!
//! Packages published in a git repository are fetched with a shallow clone
//! of one branch or tag, then selected with a glob pattern relative to the
//! repository root (`mappings/package_*`). The `git` binary does the
//! transport; its stderr is classified into typed errors.
//!
//! Arguments are validated before anything touches the filesystem or the
//! network. Clones run with `GIT_TERMINAL_PROMPT=0` so a private repository
//! fails instead of blocking on a credential prompt, and honour the
//! configured timeout and cancellation token.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{ExtractError, ExtractResult};
use crate::process::run_bounded;
use crate::scoped::{ScopedDir, ScopedPackages};

#[derive(Debug, Clone)]
pub struct GitExtractor {
    git_binary: PathBuf,
    timeout: Option<Duration>,
    cancel: Option<CancellationToken>,
    scratch: Option<PathBuf>,
}

impl Default for GitExtractor {
    fn default() -> Self {
        Self {
            git_binary: PathBuf::from("git"),
            timeout: None,
            cancel: None,
            scratch: None,
        }
    }
}

impl GitExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_git_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.git_binary = binary.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Create temporary checkouts under `dir` instead of the system temp dir.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch = Some(dir.into());
        self
    }

    /// Clone `url` at `reference` into a new directory under `destination`
    /// and return `<checkout>/<package_path>`.
    ///
    /// `destination` must already exist. The checkout directory is named
    /// after the repository and must not exist yet; a partially written
    /// checkout is removed on failure.
    pub fn extract(
        &self,
        url: &str,
        destination: &Path,
        package_path: &Path,
        reference: Option<&str>,
    ) -> ExtractResult<PathBuf> {
        let _span = tracing::info_span!("extract_git", url, reference).entered();
        validate_url(url)?;
        validate_reference(reference)?;
        validate_relative(package_path.to_string_lossy().as_ref(), "package path")?;
        if !destination.exists() {
            return Err(ExtractError::NotFound {
                path: destination.to_path_buf(),
            });
        }
        if !destination.is_dir() {
            return Err(ExtractError::NotADirectory {
                path: destination.to_path_buf(),
            });
        }

        let checkout = destination.join(checkout_dir_name(url));
        if fs::symlink_metadata(&checkout).is_ok() {
            return Err(ExtractError::AlreadyExists { path: checkout });
        }
        if let Err(e) = self.clone_into(url, &checkout, reference) {
            if checkout.exists() {
                if let Err(cleanup) = std::fs::remove_dir_all(&checkout) {
                    tracing::warn!(path = %checkout.display(), error = %cleanup, "failed to remove partial checkout");
                }
            }
            return Err(e);
        }

        let package_root = checkout.join(package_path);
        if !package_root.exists() {
            return Err(ExtractError::PackagePathNotFound {
                url: url.to_string(),
                package_path: package_path.to_path_buf(),
            });
        }
        Ok(package_root)
    }

    /// Clone `url` at `reference` into a temporary directory and select
    /// every directory matching `pattern`.
    ///
    /// Zero matches is an error. Everything is removed when the returned
    /// guard drops.
    pub fn extract_temporary(
        &self,
        url: &str,
        pattern: &str,
        reference: Option<&str>,
    ) -> ExtractResult<ScopedPackages> {
        let _span = tracing::info_span!("extract_git", url, pattern, reference).entered();
        validate_url(url)?;
        validate_reference(reference)?;
        validate_pattern(pattern)?;

        let scoped = ScopedDir::create_in(self.scratch.as_deref())?;
        self.clone_into(url, scoped.path(), reference)?;
        let package_roots = match_package_dirs(scoped.path(), pattern)?;
        if package_roots.is_empty() {
            return Err(ExtractError::NoPackagesMatched {
                url: url.to_string(),
                pattern: pattern.to_string(),
            });
        }
        tracing::info!(count = package_roots.len(), "packages selected from checkout");
        Ok(ScopedPackages::new(scoped, package_roots))
    }

    fn clone_into(&self, url: &str, target: &Path, reference: Option<&str>) -> ExtractResult<()> {
        let mut cmd = Command::new(&self.git_binary);
        cmd.env("GIT_TERMINAL_PROMPT", "0")
            .args(["clone", "--quiet", "--depth", "1", "--single-branch"]);
        if let Some(reference) = reference {
            cmd.arg("--branch").arg(reference);
        }
        cmd.arg("--").arg(url).arg(target);

        tracing::debug!(url, target = %target.display(), "cloning repository");
        let output = run_bounded(cmd, "clone", self.timeout, self.cancel.as_ref())?;
        if output.status.success() {
            return Ok(());
        }
        Err(classify_clone_failure(url, reference, &output.stderr))
    }
}

/// Map `git clone` stderr to a typed error.
fn classify_clone_failure(url: &str, reference: Option<&str>, stderr: &str) -> ExtractError {
    let lower = stderr.to_ascii_lowercase();
    if let Some(reference) = reference {
        if (lower.contains("remote branch") && lower.contains("not found"))
            || lower.contains("could not find remote branch")
        {
            return ExtractError::RefNotFound {
                url: url.to_string(),
                reference: reference.to_string(),
            };
        }
    }
    const UNREACHABLE: &[&str] = &[
        "does not appear to be a git repository",
        "could not read from remote repository",
        "could not resolve host",
        "unable to access",
        "repository not found",
        "does not exist",
        "connection refused",
        "connection timed out",
    ];
    if UNREACHABLE.iter().any(|needle| lower.contains(needle)) {
        return ExtractError::RepositoryUnreachable {
            url: url.to_string(),
            detail: stderr.trim().to_string(),
        };
    }
    ExtractError::Git {
        operation: "clone",
        detail: stderr.trim().to_string(),
    }
}

fn validate_url(url: &str) -> ExtractResult<()> {
    if url.trim().is_empty() {
        return Err(ExtractError::InvalidArgument(
            "repository URL must not be empty".to_string(),
        ));
    }
    if url.starts_with('-') {
        return Err(ExtractError::InvalidArgument(format!(
            "repository URL must not start with '-': {url:?}"
        )));
    }
    Ok(())
}

fn validate_reference(reference: Option<&str>) -> ExtractResult<()> {
    match reference {
        Some(r) if r.trim().is_empty() => Err(ExtractError::InvalidArgument(
            "branch or tag name must not be empty".to_string(),
        )),
        Some(r) if r.starts_with('-') => Err(ExtractError::InvalidArgument(format!(
            "branch or tag name must not start with '-': {r:?}"
        ))),
        _ => Ok(()),
    }
}

fn validate_pattern(pattern: &str) -> ExtractResult<()> {
    validate_relative(pattern, "package path pattern")?;
    glob::Pattern::new(pattern).map_err(|e| ExtractError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.msg.to_string(),
    })?;
    Ok(())
}

fn validate_relative(value: &str, what: &str) -> ExtractResult<()> {
    if value.trim().is_empty() {
        return Err(ExtractError::InvalidArgument(format!("{what} must not be empty")));
    }
    let path = Path::new(value);
    if path.is_absolute() || value.starts_with('/') {
        return Err(ExtractError::InvalidArgument(format!(
            "{what} must be relative: {value:?}"
        )));
    }
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(ExtractError::InvalidArgument(format!(
            "{what} must not contain '..': {value:?}"
        )));
    }
    Ok(())
}

/// Directory name for a checkout: last URL segment without `.git`.
fn checkout_dir_name(url: &str) -> String {
    let trimmed = url.trim_end_matches(['/', '\\']);
    let last = trimmed
        .rsplit(['/', '\\', ':'])
        .next()
        .unwrap_or_default();
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() || name == "." || name == ".." {
        "repository".to_string()
    } else {
        name.to_string()
    }
}

fn match_package_dirs(checkout: &Path, pattern: &str) -> ExtractResult<Vec<PathBuf>> {
    let base = glob::Pattern::escape(&checkout.to_string_lossy());
    let full = format!("{base}/{pattern}");
    let options = glob::MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };
    let paths = glob::glob_with(&full, options).map_err(|e| ExtractError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.msg.to_string(),
    })?;
    let mut roots = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            ExtractError::io(path, std::io::Error::from(e))
        })?;
        // Linked directories may point outside the checkout.
        let is_dir = fs::symlink_metadata(&path)
            .map(|m| m.file_type().is_dir())
            .unwrap_or(false);
        if is_dir && !is_git_internal(checkout, &path) {
            roots.push(path);
        }
    }
    roots.sort();
    Ok(roots)
}

fn is_git_internal(checkout: &Path, path: &Path) -> bool {
    path.strip_prefix(checkout)
        .map(|rel| rel.components().any(|c| c.as_os_str() == ".git"))
        .unwrap_or(false)
}
