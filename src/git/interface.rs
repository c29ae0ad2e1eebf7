//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module provides the **single doorway** to all Git operations in
//! gitsnap: cloning, remote ref listing, targeted fetches, checkout and the
//! read-only queries used to describe a working tree. It normalizes errors
//! into typed failure categories.
//!
//! # Cancellation
//!
//! Every network or checkout step takes an [`OpContext`]. The libgit2
//! callbacks poll it and return `false` once it is cancelled or past its
//! deadline, which aborts the operation inside libgit2. The resulting error is
//! reported as [`GitError::Interrupted`], not as a clone or checkout failure.
//!
//! # Error Handling
//!
//! - [`GitError::NotARepo`]: path is not a git working tree
//! - [`GitError::CloneFailed`]: remote missing, unreachable or refused
//! - [`GitError::UnsupportedTransport`]: this build cannot speak the URL's
//!   protocol (e.g. `https://` without TLS support)
//! - [`GitError::RefNotFound`]: requested ref does not exist
//! - [`GitError::ObjectNotFound`]: requested object is not in the history
//! - [`GitError::Interrupted`]: the operation context stopped the operation

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::context::{Interrupted, OpContext};
use crate::core::types::{BranchName, Oid, RefName, TypeError};
use crate::ui::output;

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not a Git working tree.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was opened
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// Cloning failed before any history was transferred.
    #[error("clone of {url} failed: {message}")]
    CloneFailed {
        /// The URL being cloned
        url: String,
        /// libgit2's description of the failure
        message: String,
    },

    /// The URL's transport is not available in this build.
    #[error("unsupported transport for {url}: {message}")]
    UnsupportedTransport {
        /// The URL being cloned
        url: String,
        /// libgit2's description of the failure
        message: String,
    },

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The OID or revision that was not found
        oid: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// The operation context was cancelled or hit its deadline.
    #[error(transparent)]
    Interrupted(#[from] Interrupted),

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => {
                if context.starts_with("refs/") {
                    GitError::RefNotFound {
                        refname: context.to_string(),
                    }
                } else {
                    GitError::ObjectNotFound {
                        oid: context.to_string(),
                    }
                }
            }
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: context.to_string(),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }

    /// Classify a failed clone of `url`.
    ///
    /// A missing transport (no TLS stream, unknown URL protocol) is kept apart
    /// from remote failures. The libgit2 class and code stay in the message.
    fn clone_failure(err: &git2::Error, url: &str) -> Self {
        let message = format!(
            "{} (class: {:?}, code: {:?})",
            err.message(),
            err.class(),
            err.code()
        );
        let unsupported = err.message().contains("no TLS stream")
            || err.message().contains("unsupported URL protocol");
        if unsupported {
            GitError::UnsupportedTransport {
                url: url.to_string(),
                message,
            }
        } else {
            GitError::CloneFailed {
                url: url.to_string(),
                message,
            }
        }
    }

    /// Map a failure from a step guarded by `ctx`: if the context stopped the
    /// step, report that instead of libgit2's "callback refused" error.
    fn guarded(err: git2::Error, ctx: &OpContext, context: &str) -> Self {
        match ctx.check() {
            Err(interrupted) => GitError::Interrupted(interrupted),
            Ok(()) => Self::from_git2(err, context),
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            other => GitError::Internal {
                message: other.to_string(),
            },
        }
    }
}

/// Information about a commit.
#[derive(Debug, Clone)]
pub struct CommitInfo {
    /// First line of the commit message
    pub summary: String,
    /// Author as `Name <email>`
    pub author: String,
    /// Committer as `Name <email>`
    pub committer: String,
    /// Committer timestamp
    pub commit_time: chrono::DateTime<chrono::Utc>,
}

/// Render a signature as `Name <email>`.
fn format_signature(sig: &git2::Signature<'_>) -> String {
    format!("{} <{}>", sig.name().unwrap_or(""), sig.email().unwrap_or(""))
}

/// Remote callbacks that report transfer progress (when asked) and abort the
/// transfer once `ctx` is done.
fn remote_callbacks(ctx: &OpContext, show_progress: bool) -> git2::RemoteCallbacks<'_> {
    let mut callbacks = git2::RemoteCallbacks::new();
    callbacks.transfer_progress(move |stats| {
        if show_progress {
            output::transfer_progress(stats.received_objects(), stats.total_objects());
        }
        !ctx.is_done()
    });
    callbacks.sideband_progress(move |_| !ctx.is_done());
    callbacks
}

/// Checkout options that overwrite the working tree and abort once `ctx`
/// is done.
fn checkout_builder(ctx: &OpContext) -> git2::build::CheckoutBuilder<'_> {
    let mut builder = git2::build::CheckoutBuilder::new();
    builder.force();
    builder.notify_on(git2::CheckoutNotificationType::UPDATED);
    builder.notify(move |_, _, _, _, _| !ctx.is_done());
    builder
}

/// The Git interface.
///
/// This is the **single point of interaction** with Git. No other module
/// imports `git2` directly.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Opening and Cloning
    // =========================================================================

    /// Open the repository whose working tree root is `path`.
    ///
    /// Unlike discovery, this does not walk up to a parent repository: a
    /// plain directory inside someone else's checkout is not a repository.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if `path` is not a repository root
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::open(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;
        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }
        Ok(Self { repo })
    }

    /// Clone `url` into `dest` and check out the remote's default branch.
    ///
    /// `dest` must be empty or not exist. On failure libgit2 may leave
    /// partial content in `dest`; the caller owns removing it.
    ///
    /// # Errors
    ///
    /// - [`GitError::Interrupted`] if `ctx` stopped the clone
    /// - [`GitError::UnsupportedTransport`] if the URL's protocol is not
    ///   compiled in
    /// - [`GitError::CloneFailed`] for every other failure (missing remote,
    ///   network or authentication errors)
    pub fn clone_into(
        url: &str,
        dest: &Path,
        ctx: &OpContext,
        show_progress: bool,
    ) -> Result<Self, GitError> {
        ctx.check()?;

        let mut fetch = git2::FetchOptions::new();
        fetch.remote_callbacks(remote_callbacks(ctx, show_progress));

        let result = git2::build::RepoBuilder::new()
            .fetch_options(fetch)
            .with_checkout(checkout_builder(ctx))
            .clone(url, dest);

        match result {
            Ok(repo) => Ok(Self { repo }),
            Err(err) => {
                ctx.check()?;
                Err(GitError::clone_failure(&err, url))
            }
        }
    }

    // =========================================================================
    // Remote Refs
    // =========================================================================

    /// Ask the remote which object `refname` points at (`git ls-remote`).
    ///
    /// Returns `Ok(None)` when the remote has no such ref. For annotated tags
    /// this is the tag object, not the commit.
    pub fn find_remote_ref(
        &self,
        remote: &str,
        refname: &RefName,
        ctx: &OpContext,
    ) -> Result<Option<Oid>, GitError> {
        ctx.check()?;
        let mut remote = self
            .repo
            .find_remote(remote)
            .map_err(|e| GitError::from_git2(e, remote))?;

        let connection = remote
            .connect_auth(
                git2::Direction::Fetch,
                Some(remote_callbacks(ctx, false)),
                None,
            )
            .map_err(|e| GitError::guarded(e, ctx, "connect"))?;

        let heads = connection
            .list()
            .map_err(|e| GitError::guarded(e, ctx, "list remote refs"))?;

        let found = heads
            .iter()
            .find(|head| head.name() == refname.as_str())
            .map(|head| head.oid().to_string());
        ctx.check()?;

        Ok(found.map(Oid::new).transpose()?)
    }

    /// Fetch a single refspec from `remote`.
    pub fn fetch_refspec(
        &self,
        remote: &str,
        refspec: &str,
        ctx: &OpContext,
        show_progress: bool,
    ) -> Result<(), GitError> {
        ctx.check()?;
        let mut remote = self
            .repo
            .find_remote(remote)
            .map_err(|e| GitError::from_git2(e, remote))?;

        let mut fetch = git2::FetchOptions::new();
        fetch.remote_callbacks(remote_callbacks(ctx, show_progress));
        remote
            .fetch(&[refspec], Some(&mut fetch), None)
            .map_err(|e| GitError::guarded(e, ctx, refspec))
    }

    // =========================================================================
    // Object Resolution and Checkout
    // =========================================================================

    /// Peel any object (commit or annotated tag) to the commit it names.
    pub fn peel_to_commit(&self, oid: &Oid) -> Result<Oid, GitError> {
        let git_oid =
            git2::Oid::from_str(oid.as_str()).map_err(|e| GitError::from_git2(e, oid.as_str()))?;
        let commit = self
            .repo
            .find_object(git_oid, None)
            .and_then(|obj| obj.peel_to_commit())
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;
        Ok(Oid::new(commit.id().to_string())?)
    }

    /// Resolve a full or abbreviated commit hash present in the local history.
    ///
    /// Anything other than 4 to 64 hex digits is treated as absent, so
    /// revision syntax such as `HEAD~1` or branch names never sneaks in.
    ///
    /// # Errors
    ///
    /// - [`GitError::ObjectNotFound`] if no commit matches (or the prefix is
    ///   ambiguous)
    pub fn resolve_commit(&self, hash: &str) -> Result<Oid, GitError> {
        let not_found = || GitError::ObjectNotFound {
            oid: hash.to_string(),
        };
        if !(4..=64).contains(&hash.len()) || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(not_found());
        }
        let commit = self
            .repo
            .revparse_single(hash)
            .and_then(|obj| obj.peel_to_commit())
            .map_err(|_| not_found())?;
        Ok(Oid::new(commit.id().to_string())?)
    }

    /// Force the working tree to `commit` and move HEAD.
    ///
    /// With `branch`, the local branch is created (or reset) at `commit` and
    /// HEAD is attached to it. Without, HEAD is detached at `commit`.
    pub fn checkout(
        &self,
        commit: &Oid,
        branch: Option<&BranchName>,
        ctx: &OpContext,
    ) -> Result<(), GitError> {
        ctx.check()?;
        let git_oid = git2::Oid::from_str(commit.as_str())
            .map_err(|e| GitError::from_git2(e, commit.as_str()))?;
        let target = self
            .repo
            .find_commit(git_oid)
            .map_err(|e| GitError::from_git2(e, commit.as_str()))?;

        let mut builder = checkout_builder(ctx);
        self.repo
            .checkout_tree(target.as_object(), Some(&mut builder))
            .map_err(|e| GitError::guarded(e, ctx, commit.as_str()))?;

        match branch {
            Some(branch) => {
                let refname = RefName::for_branch(branch);
                self.repo
                    .reference(refname.as_str(), git_oid, true, "gitsnap: checkout")
                    .map_err(|e| GitError::from_git2(e, refname.as_str()))?;
                self.repo
                    .set_head(refname.as_str())
                    .map_err(|e| GitError::from_git2(e, refname.as_str()))?;
            }
            None => self
                .repo
                .set_head_detached(git_oid)
                .map_err(|e| GitError::from_git2(e, commit.as_str()))?,
        }
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Get the OID that HEAD points to.
    pub fn head_oid(&self) -> Result<Oid, GitError> {
        let head = self
            .repo
            .head()
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;
        let oid = head.target().ok_or_else(|| GitError::RefNotFound {
            refname: "HEAD".to_string(),
        })?;
        Ok(Oid::new(oid.to_string())?)
    }

    /// Get the checked-out branch, or `None` when HEAD is detached.
    pub fn current_branch(&self) -> Result<Option<BranchName>, GitError> {
        if self.repo.head_detached().unwrap_or(false) {
            return Ok(None);
        }
        let head = match self.repo.head() {
            Ok(head) => head,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(GitError::from_git2(e, "HEAD")),
        };
        match head.shorthand() {
            Some(name) if head.is_branch() => Ok(Some(BranchName::new(name).map_err(|e| {
                GitError::Internal {
                    message: e.to_string(),
                }
            })?)),
            _ => Ok(None),
        }
    }

    /// Names of all tags whose target peels to `commit`, sorted.
    pub fn tags_pointing_at(&self, commit: &Oid) -> Result<Vec<String>, GitError> {
        let names = self
            .repo
            .tag_names(None)
            .map_err(|e| GitError::from_git2(e, "refs/tags"))?;

        let mut tags = Vec::new();
        for name in names.iter().flatten() {
            let peeled = self
                .repo
                .revparse_single(&format!("refs/tags/{name}"))
                .and_then(|obj| obj.peel_to_commit());
            if matches!(peeled, Ok(c) if c.id().to_string() == commit.as_str()) {
                tags.push(name.to_string());
            }
        }
        tags.sort();
        Ok(tags)
    }

    /// Get information about a commit.
    pub fn commit_info(&self, oid: &Oid) -> Result<CommitInfo, GitError> {
        let git_oid =
            git2::Oid::from_str(oid.as_str()).map_err(|e| GitError::from_git2(e, oid.as_str()))?;
        let commit = self
            .repo
            .find_commit(git_oid)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;

        let commit_time = chrono::DateTime::from_timestamp(commit.time().seconds(), 0)
            .unwrap_or(chrono::DateTime::UNIX_EPOCH);

        let info = CommitInfo {
            summary: commit.summary().unwrap_or("").to_string(),
            author: format_signature(&commit.author()),
            committer: format_signature(&commit.committer()),
            commit_time,
        };
        Ok(info)
    }

    /// Get the URL for a remote.
    ///
    /// Returns `None` if the remote doesn't exist.
    pub fn remote_url(&self, name: &str) -> Result<Option<String>, GitError> {
        match self.repo.find_remote(name) {
            Ok(remote) => Ok(remote.url().map(String::from)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::Internal {
                message: e.message().to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod git_error {
        use super::*;

        #[test]
        fn display_formatting() {
            let err = GitError::CloneFailed {
                url: "file:///nope".to_string(),
                message: "not found".to_string(),
            };
            assert_eq!(err.to_string(), "clone of file:///nope failed: not found");

            let err = GitError::Interrupted(Interrupted::Cancelled);
            assert_eq!(err.to_string(), "operation cancelled");
        }

        #[test]
        fn from_git2_classifies_not_found() {
            let err = git2::Error::new(
                git2::ErrorCode::NotFound,
                git2::ErrorClass::Reference,
                "missing",
            );
            assert!(matches!(
                GitError::from_git2(err, "refs/heads/x"),
                GitError::RefNotFound { .. }
            ));

            let err = git2::Error::new(
                git2::ErrorCode::NotFound,
                git2::ErrorClass::Odb,
                "missing",
            );
            assert!(matches!(
                GitError::from_git2(err, "deadbeef"),
                GitError::ObjectNotFound { .. }
            ));
        }

        #[test]
        fn clone_failure_separates_missing_transport() {
            let err = git2::Error::new(
                git2::ErrorCode::GenericError,
                git2::ErrorClass::Ssl,
                "there is no TLS stream available",
            );
            let classified = GitError::clone_failure(&err, "https://example.com/r");
            assert!(matches!(classified, GitError::UnsupportedTransport { .. }));
            assert!(classified.to_string().contains("class: Ssl"));

            let err = git2::Error::new(
                git2::ErrorCode::GenericError,
                git2::ErrorClass::Net,
                "unsupported URL protocol",
            );
            assert!(matches!(
                GitError::clone_failure(&err, "foo://example.com/r"),
                GitError::UnsupportedTransport { .. }
            ));

            let err = git2::Error::new(
                git2::ErrorCode::Auth,
                git2::ErrorClass::Http,
                "authentication required",
            );
            let classified = GitError::clone_failure(&err, "https://example.com/r");
            match classified {
                GitError::CloneFailed { message, .. } => {
                    assert!(message.starts_with("authentication required"));
                    assert!(message.contains("class: Http"));
                    assert!(message.contains("code: Auth"));
                }
                other => panic!("expected CloneFailed, got {other:?}"),
            }
        }

        #[test]
        fn guarded_prefers_interruption() {
            let ctx = OpContext::new();
            ctx.cancel();
            let err = git2::Error::new(
                git2::ErrorCode::User,
                git2::ErrorClass::Callback,
                "callback refused",
            );
            assert!(matches!(
                GitError::guarded(err, &ctx, "clone"),
                GitError::Interrupted(Interrupted::Cancelled)
            ));
        }
    }

    #[test]
    fn open_plain_directory_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            Git::open(dir.path()),
            Err(GitError::NotARepo { .. })
        ));
    }

    #[test]
    fn clone_with_cancelled_context_is_interrupted() {
        let dir = tempfile::TempDir::new().unwrap();
        let ctx = OpContext::new();
        ctx.cancel();
        let err = Git::clone_into("file:///does/not/matter", dir.path(), &ctx, false).unwrap_err();
        assert!(matches!(err, GitError::Interrupted(Interrupted::Cancelled)));
    }

    #[test]
    fn clone_missing_local_remote_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("missing.git");
        let dest = dir.path().join("dest");
        let url = format!("file://{}", missing.display());
        let err = Git::clone_into(&url, &dest, &OpContext::new(), false).unwrap_err();
        assert!(matches!(err, GitError::CloneFailed { .. }));
    }
}
