//! artifact
//!
//! Repository references materialized as content-addressed artifacts.
//!
//! # Flow
//!
//! ```text
//! raw reference ──► normalize ──► Acquirer::acquire ──► RepositoryArtifact
//!                                      │                      │
//!                                      ▼                      ▼
//!                                  Cleanup               inspect() ──► Reference
//! ```
//!
//! - [`normalize`] - raw string to canonical URL
//! - [`Acquirer`] - local reuse or clone + checkout of a selected ref
//! - [`identity`] - whole-tree SHA-256
//! - [`lifecycle`] - ownership of working trees and their release
//!
//! # Invariants
//!
//! - Every call to [`Acquirer::acquire`] returns a [`lifecycle::Cleanup`],
//!   on success and on failure alike.
//! - A caller's local directory is never modified or deleted.
//! - The identity depends only on the bytes in the working tree.

pub mod identity;
pub mod lifecycle;
pub mod normalize;
mod repo;

pub use repo::{Acquirer, ArtifactOptions, RepositoryArtifact};

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::cache::CacheError;
use crate::core::context::Interrupted;
use crate::core::types::{ContentId, TypeError};
use crate::git::GitError;
use crate::walker::WalkError;
use normalize::ReferenceError;

/// Kind of artifact a reference describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactType {
    /// A source repository working tree
    Repository,
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactType::Repository => write!(f, "repository"),
        }
    }
}

/// Git facts about an acquired tree. Informational only; never part of the
/// identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepoMetadata {
    /// Origin URL with any password removed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
    /// Checked-out branch, absent when HEAD is detached
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Tags pointing at HEAD
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// HEAD commit hash
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    /// First line of the HEAD commit message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_msg: Option<String>,
    /// HEAD committer timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_time: Option<chrono::DateTime<chrono::Utc>>,
    /// HEAD author as `Name <email>`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// HEAD committer as `Name <email>`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub committer: Option<String>,
}

/// Descriptor returned by [`RepositoryArtifact::inspect`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    /// The raw reference exactly as supplied
    pub name: String,
    /// Always [`ArtifactType::Repository`]
    #[serde(rename = "type")]
    pub artifact_type: ArtifactType,
    /// Content identity of the tree
    pub id: ContentId,
    /// Constituent blob ids; the whole tree is the single blob
    pub blob_ids: Vec<ContentId>,
    /// Git facts, when the tree is a repository
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_metadata: Option<RepoMetadata>,
}

/// Errors from acquiring or inspecting an artifact.
///
/// Display strings start with a stable, classifiable prefix.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The reference could not be turned into a URL.
    #[error("url parse error: {0}")]
    UrlParse(#[from] ReferenceError),

    /// The remote is missing, unreachable or refused access.
    #[error("repository not found: {url}: {message}")]
    RepositoryNotFound {
        /// Redacted URL that was cloned
        url: String,
        /// Transport's description
        message: String,
    },

    /// The URL's transport is not available in this build.
    #[error("unsupported transport: {url}: {message}")]
    UnsupportedTransport {
        /// Redacted URL that was cloned
        url: String,
        /// Transport's description
        message: String,
    },

    /// The requested branch or tag does not exist on the remote.
    #[error("couldn't find remote ref \"{refname}\"")]
    RemoteRefNotFound {
        /// Full ref path, e.g. `refs/heads/main`
        refname: String,
    },

    /// The requested commit is not in the cloned history.
    #[error("git checkout error: object not found: {oid}")]
    ObjectNotFound {
        /// The hash as supplied
        oid: String,
    },

    /// Selector invalid or more than one selector given.
    #[error("invalid ref selector: {0}")]
    InvalidSelector(#[from] TypeError),

    /// The target exists but is not a directory.
    #[error("not a directory: {path}")]
    NotADirectory {
        /// The offending path
        path: PathBuf,
    },

    /// The temporary directory could not be created.
    #[error("failed to create temporary directory: {0}")]
    TempDir(#[source] std::io::Error),

    /// The operation context was cancelled or hit its deadline.
    #[error(transparent)]
    Interrupted(#[from] Interrupted),

    /// Any other git failure.
    #[error("git error: {0}")]
    Git(GitError),

    /// Enumerating the working tree failed.
    #[error("walk error: {0}")]
    Walk(#[from] WalkError),

    /// The cache store failed.
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
}

impl From<GitError> for ArtifactError {
    fn from(err: GitError) -> Self {
        match err {
            GitError::Interrupted(interrupted) => ArtifactError::Interrupted(interrupted),
            other => ArtifactError::Git(other),
        }
    }
}

impl ArtifactError {
    /// Whether the error came from cancellation or a deadline.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, ArtifactError::Interrupted(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_prefixes_are_classifiable() {
        let err = ArtifactError::from(normalize::normalize_url("ht tp://foo.com").unwrap_err());
        assert!(err.to_string().starts_with("url parse error"));
        assert!(err
            .to_string()
            .contains("first path segment in URL cannot contain colon"));

        let err = ArtifactError::RepositoryNotFound {
            url: "file:///srv/unknown.git".into(),
            message: "not found".into(),
        };
        assert!(err.to_string().starts_with("repository not found"));

        let err = ArtifactError::UnsupportedTransport {
            url: "https://github.com/org/repo".into(),
            message: "there is no TLS stream available".into(),
        };
        assert!(err.to_string().starts_with("unsupported transport"));

        let err = ArtifactError::RemoteRefNotFound {
            refname: "refs/heads/invalid-branch".into(),
        };
        assert_eq!(
            err.to_string(),
            r#"couldn't find remote ref "refs/heads/invalid-branch""#
        );

        let err = ArtifactError::ObjectNotFound {
            oid: "6ac152fe".into(),
        };
        assert!(err
            .to_string()
            .starts_with("git checkout error: object not found"));
    }

    #[test]
    fn git_interruption_is_not_a_git_error() {
        let err = ArtifactError::from(GitError::Interrupted(Interrupted::Cancelled));
        assert!(err.is_interrupted());
        assert_eq!(err.to_string(), "operation cancelled");

        let err = ArtifactError::from(GitError::BareRepo);
        assert!(matches!(err, ArtifactError::Git(_)));
    }

    #[test]
    fn reference_serializes_type_field() {
        let id = ContentId::sha256_of(b"tree");
        let reference = Reference {
            name: "github.com/org/repo".into(),
            artifact_type: ArtifactType::Repository,
            id: id.clone(),
            blob_ids: vec![id.clone()],
            repo_metadata: None,
        };
        let json = serde_json::to_value(&reference).unwrap();
        assert_eq!(json["type"], "repository");
        assert_eq!(json["id"], id.as_str());
        assert_eq!(json["blob_ids"][0], id.as_str());
        assert!(json.get("repo_metadata").is_none());
    }
}
