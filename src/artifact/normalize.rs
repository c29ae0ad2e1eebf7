//! artifact::normalize
//!
//! Turn a raw repository reference into a canonical URL.
//!
//! # Rules
//!
//! - A string with an explicit scheme (`https://`, `ssh://`, `file://`, ...)
//!   is parsed as-is.
//! - A string without a scheme is parsed with `https://` prefixed, so
//!   `github.com/org/repo` becomes `https://github.com/org/repo`.
//! - A scheme-less string whose first path segment contains a colon is
//!   rejected. Parsed bare, `ht tp://foo.com` or `git@host:org/repo` would
//!   read as a scheme separator in the wrong place; guessing is worse than
//!   failing.
//!
//! Existence of local paths is not checked here; the acquisition engine
//! tries the filesystem before calling into this module.
//!
//! # Example
//!
//! ```
//! use gitsnap::artifact::normalize::normalize_url;
//!
//! let url = normalize_url("github.com/org/repo").unwrap();
//! assert_eq!(url.as_str(), "https://github.com/org/repo");
//!
//! let err = normalize_url("ht tp://foo.com").unwrap_err();
//! assert!(err.to_string().contains("first path segment in URL cannot contain colon"));
//! ```

use thiserror::Error;
use url::Url;

/// Scheme prefixed to references that do not carry one.
pub const DEFAULT_SCHEME: &str = "https";

/// Errors from reference normalization. All are raised before any I/O.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReferenceError {
    /// Empty or whitespace-only input.
    #[error("empty repository reference")]
    Empty,

    /// The input starts with `:`.
    #[error("parse \"{input}\": missing protocol scheme")]
    MissingScheme {
        /// The raw input
        input: String,
    },

    /// A scheme-less input whose first path segment contains a colon.
    #[error("parse \"{input}\": first path segment in URL cannot contain colon")]
    ColonInFirstSegment {
        /// The raw input
        input: String,
    },

    /// A scheme-less input that looks like a filesystem path, not a host.
    #[error("parse \"{input}\": no such directory and not a host name")]
    NotAHost {
        /// The raw input
        input: String,
    },

    /// The URL parser rejected the input.
    #[error("parse \"{input}\": {source}")]
    Invalid {
        /// The string handed to the parser
        input: String,
        /// The parser's reason
        #[source]
        source: url::ParseError,
    },
}

/// Split off an RFC 3986 scheme, the way URL parsers decide whether one is
/// present: letters first, then letters, digits, `+`, `-` or `.`, ended by
/// `:`. Any other character before the first colon means "no scheme".
fn scheme_of(raw: &str) -> Result<Option<&str>, ReferenceError> {
    for (i, c) in raw.char_indices() {
        match c {
            'a'..='z' | 'A'..='Z' => {}
            '0'..='9' | '+' | '-' | '.' if i > 0 => {}
            ':' if i == 0 => {
                return Err(ReferenceError::MissingScheme {
                    input: raw.to_string(),
                })
            }
            ':' => return Ok(Some(&raw[..i])),
            _ => return Ok(None),
        }
    }
    Ok(None)
}

/// Normalize a repository reference into a canonical, schemed URL.
///
/// # Errors
///
/// - [`ReferenceError::ColonInFirstSegment`] for ambiguous scheme-less input
/// - [`ReferenceError::Invalid`] when the URL parser rejects the input
/// - [`ReferenceError::NotAHost`] for scheme-less input shaped like a path
pub fn normalize_url(raw: &str) -> Result<Url, ReferenceError> {
    if raw.trim().is_empty() {
        return Err(ReferenceError::Empty);
    }

    if scheme_of(raw)?.is_some() {
        return Url::parse(raw).map_err(|source| ReferenceError::Invalid {
            input: raw.to_string(),
            source,
        });
    }

    let first_segment = raw.split('/').next().unwrap_or(raw);
    if first_segment.contains(':') {
        return Err(ReferenceError::ColonInFirstSegment {
            input: raw.to_string(),
        });
    }
    if raw.starts_with('/') || raw.starts_with('.') || raw.starts_with('~') {
        return Err(ReferenceError::NotAHost {
            input: raw.to_string(),
        });
    }

    let prefixed = format!("{DEFAULT_SCHEME}://{raw}");
    Url::parse(&prefixed).map_err(|source| ReferenceError::Invalid {
        input: prefixed,
        source,
    })
}

/// Drop the password from a URL's userinfo, keeping the username.
///
/// Used whenever a URL leaves the process (metadata, logs).
pub fn redact(url: &Url) -> String {
    if url.password().is_none() {
        return url.to_string();
    }
    let mut clean = url.clone();
    // Only fails for cannot-be-a-base URLs, which cannot carry a password.
    let _ = clean.set_password(None);
    clean.to_string()
}

/// Redact a URL given as a string; non-URLs (scp-like remotes, paths) pass
/// through unchanged.
pub fn redact_str(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(url) => redact(&url),
        Err(_) => raw.to_string(),
    }
}
