//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`BranchName`] - Validated Git branch name
//! - [`TagName`] - Validated Git tag name
//! - [`RefName`] - Validated fully-qualified Git reference name
//! - [`Oid`] - Git object identifier (SHA)
//! - [`RefSelector`] - Which state of history to materialize
//! - [`ContentId`] - Algorithm-tagged content digest
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use gitsnap::core::types::{BranchName, Oid, RefName};
//!
//! let branch = BranchName::new("feature/my-branch").unwrap();
//! let refname = RefName::for_branch(&branch);
//! assert_eq!(refname.as_str(), "refs/heads/feature/my-branch");
//!
//! assert!(BranchName::new("invalid..name").is_err());
//! assert!(Oid::new("not-a-sha").is_err());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid tag name: {0}")]
    InvalidTagName(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("invalid ref name: {0}")]
    InvalidRefName(String),

    #[error("invalid content id: {0}")]
    InvalidContentId(String),

    #[error("at most one of branch, tag or commit may be specified (got {0})")]
    ConflictingSelectors(String),
}

/// Characters Git forbids anywhere in a refname.
const FORBIDDEN_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];

/// Check a short ref name (the part after `refs/heads/` or `refs/tags/`)
/// against Git's refname rules. Returns the reason on failure.
fn check_short_ref(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name cannot be empty".into());
    }
    if name == "@" {
        return Err("name cannot be '@' (reserved)".into());
    }
    if name.starts_with('-') {
        return Err("name cannot start with '-'".into());
    }
    if name.starts_with('/') {
        return Err("name cannot start with '/'".into());
    }
    if name.ends_with('/') {
        return Err("name cannot end with '/'".into());
    }
    for bad in ["..", "@{", "//"] {
        if name.contains(bad) {
            return Err(format!("name cannot contain '{bad}'"));
        }
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(format!("name cannot contain '{c}'"));
    }
    if name.chars().any(|c| c.is_ascii_control()) {
        return Err("name cannot contain control characters".into());
    }
    for component in name.split('/') {
        if component.starts_with('.') {
            return Err("path component cannot start with '.'".into());
        }
        if component.ends_with(".lock") {
            return Err("path component cannot end with '.lock'".into());
        }
    }
    Ok(())
}

macro_rules! string_newtype_impls {
    ($ty:ident) => {
        impl TryFrom<String> for $ty {
            type Error = TypeError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

/// A validated Git branch name.
///
/// Branch names must conform to Git's refname rules (see `git check-ref-format`).
///
/// ```
/// use gitsnap::core::types::BranchName;
///
/// assert!(BranchName::new("feature/my-branch").is_ok());
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new(".hidden").is_err());
/// assert!(BranchName::new("branch.lock").is_err());
/// assert!(BranchName::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        check_short_ref(&name).map_err(TypeError::InvalidBranchName)?;
        Ok(Self(name))
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

string_newtype_impls!(BranchName);

/// A validated Git tag name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TagName(String);

impl TagName {
    /// Create a new validated tag name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidTagName` if the name violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        check_short_ref(&name).map_err(TypeError::InvalidTagName)?;
        Ok(Self(name))
    }

    /// Get the tag name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

string_newtype_impls!(TagName);

/// A Git object identifier (SHA-1 or SHA-256).
///
/// OIDs are normalized to lowercase for consistency.
///
/// ```
/// use gitsnap::core::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert_eq!(oid.short(7), "abc123d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a full hex OID.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid("object id must be hexadecimal".into()));
        }
        Ok(Self(oid))
    }

    /// Get an abbreviated form of the OID.
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

string_newtype_impls!(Oid);

/// A validated, fully-qualified Git reference name.
///
/// ```
/// use gitsnap::core::types::{BranchName, RefName, TagName};
///
/// let branch = BranchName::new("feature/foo").unwrap();
/// assert_eq!(RefName::for_branch(&branch).as_str(), "refs/heads/feature/foo");
///
/// let tag = TagName::new("v1.0.0").unwrap();
/// assert_eq!(RefName::for_tag(&tag).as_str(), "refs/tags/v1.0.0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefName(String);

impl RefName {
    /// Create a new validated ref name. Must live under `refs/`.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRefName` if the name violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        let rest = name
            .strip_prefix("refs/")
            .ok_or_else(|| TypeError::InvalidRefName(format!("'{name}' is not under refs/")))?;
        check_short_ref(rest).map_err(TypeError::InvalidRefName)?;
        Ok(Self(name))
    }

    /// Ref name for a branch on the remote (`refs/heads/<branch>`).
    pub fn for_branch(branch: &BranchName) -> Self {
        Self(format!("refs/heads/{}", branch.as_str()))
    }

    /// Ref name for a tag (`refs/tags/<tag>`).
    pub fn for_tag(tag: &TagName) -> Self {
        Self(format!("refs/tags/{}", tag.as_str()))
    }

    /// Get the ref name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

string_newtype_impls!(RefName);

/// Which state of the repository history to materialize.
///
/// Selectors are mutually exclusive by construction. Absence of a selector
/// (`Option<RefSelector>::None`) means the default branch head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefSelector {
    /// A remote branch, resolved under `refs/heads/`.
    Branch(BranchName),
    /// A remote tag, resolved under `refs/tags/`.
    Tag(TagName),
    /// A commit hash, full or abbreviated. Not validated beyond being
    /// non-empty: a hash that does not exist surfaces at checkout.
    Commit(String),
}

impl RefSelector {
    /// Build a selector from the three optional user inputs.
    ///
    /// Empty strings count as absent. More than one present input is an error
    /// rather than a silent precedence pick.
    ///
    /// ```
    /// use gitsnap::core::types::RefSelector;
    ///
    /// assert_eq!(RefSelector::from_parts(None, None, None).unwrap(), None);
    /// assert!(matches!(
    ///     RefSelector::from_parts(Some("main"), None, None).unwrap(),
    ///     Some(RefSelector::Branch(_))
    /// ));
    /// assert!(RefSelector::from_parts(Some("main"), Some("v1"), None).is_err());
    /// ```
    pub fn from_parts(
        branch: Option<&str>,
        tag: Option<&str>,
        commit: Option<&str>,
    ) -> Result<Option<Self>, TypeError> {
        fn present(v: Option<&str>) -> Option<&str> {
            v.filter(|s| !s.is_empty())
        }
        let (branch, tag, commit) = (present(branch), present(tag), present(commit));

        let given: Vec<&str> = [
            branch.map(|_| "branch"),
            tag.map(|_| "tag"),
            commit.map(|_| "commit"),
        ]
        .into_iter()
        .flatten()
        .collect();
        if given.len() > 1 {
            return Err(TypeError::ConflictingSelectors(given.join(", ")));
        }

        Ok(match (branch, tag, commit) {
            (Some(b), _, _) => Some(Self::Branch(BranchName::new(b)?)),
            (_, Some(t), _) => Some(Self::Tag(TagName::new(t)?)),
            (_, _, Some(c)) => Some(Self::Commit(c.trim().to_ascii_lowercase())),
            _ => None,
        })
    }

    /// The remote ref this selector resolves through, if any.
    pub fn remote_ref(&self) -> Option<RefName> {
        match self {
            Self::Branch(b) => Some(RefName::for_branch(b)),
            Self::Tag(t) => Some(RefName::for_tag(t)),
            Self::Commit(_) => None,
        }
    }
}

impl fmt::Display for RefSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Branch(b) => write!(f, "branch {b}"),
            Self::Tag(t) => write!(f, "tag {t}"),
            Self::Commit(c) => write!(f, "commit {c}"),
        }
    }
}

/// A self-describing content digest: `<algorithm>:<hex>`.
///
/// ```
/// use gitsnap::core::types::ContentId;
///
/// let id = ContentId::sha256_of(b"hello");
/// assert!(id.as_str().starts_with("sha256:"));
/// assert_eq!(id.algorithm(), "sha256");
/// assert_eq!(id.hex().len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentId(String);

impl ContentId {
    /// Algorithm tag for SHA-256 digests.
    pub const SHA256: &'static str = "sha256";

    /// Parse an algorithm-tagged digest.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidContentId` if the tag is missing or the digest
    /// is not lowercase hex of the algorithm's length.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        let (algo, hex) = id
            .split_once(':')
            .ok_or_else(|| TypeError::InvalidContentId(format!("missing algorithm in '{id}'")))?;
        if algo != Self::SHA256 {
            return Err(TypeError::InvalidContentId(format!(
                "unsupported algorithm '{algo}'"
            )));
        }
        if hex.len() != 64 || !hex.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')) {
            return Err(TypeError::InvalidContentId(
                "digest must be 64 lowercase hex characters".into(),
            ));
        }
        Ok(Self(id))
    }

    /// Wrap a finished SHA-256 hasher.
    pub fn from_sha256(hasher: Sha256) -> Self {
        Self(format!("{}:{}", Self::SHA256, hex::encode(hasher.finalize())))
    }

    /// Digest a byte slice.
    pub fn sha256_of(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self::from_sha256(hasher)
    }

    /// The algorithm tag (before the colon).
    pub fn algorithm(&self) -> &str {
        self.0.split_once(':').map_or("", |(a, _)| a)
    }

    /// The hex digest (after the colon).
    pub fn hex(&self) -> &str {
        self.0.split_once(':').map_or("", |(_, h)| h)
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

string_newtype_impls!(ContentId);
