//! Git source mirrors
//!
//! Remote card sources are mirrored under a local base directory before
//! scanning: cloned when absent, fetched and fast-forwarded when present.
//! Reconciliation must never invent content, so a mirror whose history has
//! diverged from its remote is an error rather than a merge.

use std::path::{Path, PathBuf};

use git2::Repository;

/// Git source error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    /// Underlying libgit2 error
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),
    /// URL that maps to no mirror directory
    #[error("Could not parse git URL: {0}")]
    BadUrl(String),
    /// Mirror history no longer fast-forwards to the remote
    #[error("Local mirror of {0} has diverged from its remote")]
    NonFastForward(String),
}

/// Map a git URL to its mirror directory under `base`.
///
/// `https://host/owner/repo(.git)` and `git@host:owner/repo(.git)` both map
/// to `base/host/owner/repo`, so the same repository reached over either
/// scheme shares one mirror.
pub fn mirror_path(base: &Path, url: &str) -> Result<PathBuf, GitError> {
    if let Some(rest) = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
    {
        let rest = rest.trim_end_matches('/');
        let rest = rest.strip_suffix(".git").unwrap_or(rest);
        if let Some((host, path)) = rest.split_once('/') {
            if !host.is_empty() && !path.is_empty() {
                return Ok(base.join(host).join(path));
            }
        }
        return Err(GitError::BadUrl(url.to_string()));
    }

    // scp-like syntax: git@host:owner/repo.git
    if let Some((user_host, path)) = url.split_once(':') {
        if let Some((_, host)) = user_host.split_once('@') {
            let path = path.strip_suffix(".git").unwrap_or(path);
            if !host.is_empty() && !path.is_empty() {
                return Ok(base.join(host).join(path));
            }
        }
    }

    Err(GitError::BadUrl(url.to_string()))
}

/// Clone `url` into `dest`, or bring an existing mirror up to date.
///
/// Pulls are fast-forward only: fetch `origin`, then advance the local HEAD
/// branch to the fetched tip. An already-current mirror is a no-op.
pub fn clone_or_pull(url: &str, dest: &Path) -> Result<(), GitError> {
    if !dest.exists() {
        tracing::info!(url, dest = %dest.display(), "cloning card source");
        Repository::clone(url, dest)?;
        return Ok(());
    }

    tracing::info!(dest = %dest.display(), "updating card source mirror");
    let repo = Repository::open(dest)?;
    let mut remote = repo.find_remote("origin")?;
    // Empty refspec list = the remote's configured fetch refspecs
    remote.fetch(&[] as &[&str], None, None)?;

    let fetch_head = repo.find_reference("FETCH_HEAD")?;
    let fetch_commit = repo.reference_to_annotated_commit(&fetch_head)?;
    let (analysis, _) = repo.merge_analysis(&[&fetch_commit])?;

    if analysis.is_up_to_date() {
        tracing::debug!(dest = %dest.display(), "mirror already up to date");
        return Ok(());
    }

    if analysis.is_fast_forward() {
        let head_name = repo
            .head()?
            .name()
            .map(str::to_string)
            .ok_or_else(|| GitError::NonFastForward(url.to_string()))?;
        let mut reference = repo.find_reference(&head_name)?;
        reference.set_target(fetch_commit.id(), "recall: fast-forward")?;
        repo.set_head(&head_name)?;
        repo.checkout_head(Some(git2::build::CheckoutBuilder::default().force()))?;
        return Ok(());
    }

    Err(GitError::NonFastForward(url.to_string()))
}
