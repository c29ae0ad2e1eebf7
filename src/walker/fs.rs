//! walker::fs
//!
//! `walkdir`-based walker.
//!
//! # Skip Rules
//!
//! - `.git` is always skipped, whether it is a directory or the gitlink file
//!   of a worktree or submodule checkout
//! - a skip entry containing `/` matches a tree-relative path exactly
//! - a skip entry without `/` matches any entry with that name
//!
//! Symlinks are reported as symlinks and never followed, so a link cannot
//! pull files from outside the tree into the enumeration.

use std::ffi::OsStr;
use std::path::{Component, Path};

use walkdir::WalkDir;

use super::{EntryKind, FileEntry, WalkError, Walker};
use crate::core::config::WalkerConfig;

/// Entry name that is never reported or descended into.
const GIT_DIR: &str = ".git";

/// Walker over the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FsWalker {
    skip_dirs: Vec<String>,
    skip_files: Vec<String>,
}

impl FsWalker {
    /// A walker that skips only `.git`.
    pub fn new() -> Self {
        Self::default()
    }

    /// A walker with configured skip rules.
    pub fn with_config(config: &WalkerConfig) -> Self {
        let clean = |entries: &[String]| {
            entries
                .iter()
                .map(|e| e.trim_matches('/').to_string())
                .filter(|e| !e.is_empty())
                .collect()
        };
        Self {
            skip_dirs: clean(&config.skip_dirs),
            skip_files: clean(&config.skip_files),
        }
    }

    fn matches(rules: &[String], rel_path: &str, name: &str) -> bool {
        rules.iter().any(|rule| {
            if rule.contains('/') {
                rule == rel_path
            } else {
                rule == name
            }
        })
    }
}

/// Join the normal components of `path` with `/`.
fn relative_slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

impl Walker for FsWalker {
    fn walk(
        &self,
        root: &Path,
        visit: &mut dyn FnMut(&FileEntry) -> Result<(), WalkError>,
    ) -> Result<(), WalkError> {
        if !root.is_dir() {
            return Err(WalkError::NotADirectory(root.to_path_buf()));
        }

        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 {
                    return true;
                }
                if entry.file_name() == OsStr::new(GIT_DIR) {
                    return false;
                }
                if !entry.file_type().is_dir() {
                    return true;
                }
                let name = entry.file_name().to_string_lossy();
                let rel = entry
                    .path()
                    .strip_prefix(root)
                    .map(relative_slash_path)
                    .unwrap_or_default();
                !Self::matches(&self.skip_dirs, &rel, &name)
            });

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                WalkError::Io {
                    path,
                    source: e.into(),
                }
            })?;

            let file_type = entry.file_type();
            let kind = if file_type.is_symlink() {
                EntryKind::Symlink
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                continue;
            };

            let rel_path = entry
                .path()
                .strip_prefix(root)
                .map(relative_slash_path)
                .unwrap_or_default();
            let name = entry.file_name().to_string_lossy();
            if Self::matches(&self.skip_files, &rel_path, &name) {
                continue;
            }

            let metadata = entry.metadata().map_err(|e| WalkError::Io {
                path: entry.path().to_path_buf(),
                source: e.into(),
            })?;

            visit(&FileEntry {
                rel_path,
                abs_path: entry.path().to_path_buf(),
                kind,
                size: metadata.len(),
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn collect(walker: &FsWalker, root: &Path) -> Vec<String> {
        let mut seen = Vec::new();
        walker
            .walk(root, &mut |entry| {
                seen.push(entry.rel_path.clone());
                Ok(())
            })
            .unwrap();
        seen.sort();
        seen
    }

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join(".git/objects")).unwrap();
        fs::write(root.join(".git/HEAD"), "ref: refs/heads/main\n").unwrap();
        fs::create_dir_all(root.join("src/nested")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::write(root.join("README.md"), "# hi\n").unwrap();
        fs::write(root.join("src/main.rs"), "fn main() {}\n").unwrap();
        fs::write(root.join("src/nested/lock.json"), "{}").unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), "").unwrap();
        dir
    }

    #[test]
    fn skips_git_and_reports_files_only() {
        let dir = tree();
        let seen = collect(&FsWalker::new(), dir.path());
        assert_eq!(
            seen,
            vec![
                "README.md",
                "node_modules/pkg/index.js",
                "src/main.rs",
                "src/nested/lock.json",
            ]
        );
    }

    #[test]
    fn gitlink_file_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".git"), "gitdir: /elsewhere/.git/worktrees/wt\n").unwrap();
        fs::create_dir_all(dir.path().join("vendor/lib")).unwrap();
        fs::write(dir.path().join("vendor/lib/.git"), "gitdir: ../../.git/modules/lib\n").unwrap();
        fs::write(dir.path().join("vendor/lib/mod.rs"), "").unwrap();
        fs::write(dir.path().join("main.tf"), "").unwrap();

        assert_eq!(
            collect(&FsWalker::new(), dir.path()),
            vec!["main.tf", "vendor/lib/mod.rs"]
        );
    }

    #[test]
    fn skip_rules_by_name_and_path() {
        let dir = tree();
        let walker = FsWalker::with_config(&WalkerConfig {
            skip_dirs: vec!["node_modules".into()],
            skip_files: vec!["src/nested/lock.json".into(), "README.md".into()],
        });
        assert_eq!(collect(&walker, dir.path()), vec!["src/main.rs"]);
    }

    #[test]
    fn path_rule_does_not_match_elsewhere() {
        let dir = tree();
        fs::write(dir.path().join("lock.json"), "{}").unwrap();
        let walker = FsWalker::with_config(&WalkerConfig {
            skip_files: vec!["src/nested/lock.json".into()],
            ..Default::default()
        });
        assert!(collect(&walker, dir.path()).contains(&"lock.json".to_string()));
    }

    #[test]
    fn missing_root_is_error() {
        let dir = TempDir::new().unwrap();
        let err = FsWalker::new()
            .walk(&dir.path().join("nope"), &mut |_| Ok(()))
            .unwrap_err();
        assert!(matches!(err, WalkError::NotADirectory(_)));
    }

    #[test]
    fn visitor_error_stops_walk() {
        let dir = tree();
        let mut calls = 0;
        let err = FsWalker::new()
            .walk(dir.path(), &mut |_| {
                calls += 1;
                Err(WalkError::Aborted("stop".into()))
            })
            .unwrap_err();
        assert!(matches!(err, WalkError::Aborted(_)));
        assert_eq!(calls, 1);
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_reported_not_followed() {
        let dir = tree();
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("secret"), "x").unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("escape")).unwrap();

        let mut kinds = Vec::new();
        FsWalker::new()
            .walk(dir.path(), &mut |entry| {
                if entry.rel_path.starts_with("escape") {
                    kinds.push((entry.rel_path.clone(), entry.kind));
                }
                Ok(())
            })
            .unwrap();
        assert_eq!(kinds, vec![("escape".to_string(), EntryKind::Symlink)]);
    }
}
