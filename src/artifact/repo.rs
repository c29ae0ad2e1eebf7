//! artifact::repo
//!
//! Acquisition engine and the repository artifact.
//!
//! # Acquisition
//!
//! 1. An existing local directory is used in place as a borrowed tree. No
//!    temporary directory is created and running the cleanup deletes
//!    nothing. Selectors are ignored for local trees: the caller's checkout
//!    is never moved.
//! 2. Anything else is normalized to a URL and cloned into a private
//!    temporary directory. From that moment the returned cleanup owns the
//!    directory, whatever happens next.
//! 3. A selector moves the clone to the requested state:
//!    - branch: `refs/heads/<name>` is looked up on the remote, fetched, and
//!      checked out as a local branch
//!    - tag: `refs/tags/<name>` is looked up, fetched, peeled to its commit,
//!      and checked out detached
//!    - commit: the hash is resolved in the cloned history and checked out
//!      detached

use std::path::{Path, PathBuf};
use std::sync::Arc;

use url::Url;

use super::identity::compute_identity;
use super::lifecycle::{Cleanup, WorkTree};
use super::normalize::{normalize_url, redact, redact_str};
use super::{ArtifactError, ArtifactType, Reference, RepoMetadata};
use crate::cache::{ArtifactCache, BlobInfo, FsCache};
use crate::core::config::Config;
use crate::core::context::OpContext;
use crate::core::types::{Oid, RefName, RefSelector};
use crate::git::{Git, GitError};
use crate::walker::{FileEntry, FsWalker, WalkError, Walker};

/// Prefix of temporary clone directories.
const TEMP_PREFIX: &str = "gitsnap-";

/// Remote name used for clones.
const ORIGIN: &str = "origin";

/// Per-acquisition options.
#[derive(Debug, Clone, Default)]
pub struct ArtifactOptions {
    /// Branch, tag or commit to check out; `None` keeps the default branch.
    pub selector: Option<RefSelector>,
    /// Suppress clone progress even when the acquirer shows it.
    pub no_progress: bool,
}

impl ArtifactOptions {
    /// Options selecting `selector`.
    pub fn with_selector(selector: RefSelector) -> Self {
        Self {
            selector: Some(selector),
            ..Self::default()
        }
    }
}

/// Acquires repository references.
///
/// Holds the collaborators every artifact shares: where clones go, the walker
/// and the optional cache. Build one per process and pass it by reference.
///
/// The walker (and its skip rules) only shapes [`RepositoryArtifact::walk`].
/// Identities always cover every file outside `.git`, so an id never depends
/// on configuration.
#[derive(Debug, Clone)]
pub struct Acquirer {
    temp_dir: Option<PathBuf>,
    progress: bool,
    walker: Arc<dyn Walker>,
    cache: Option<Arc<dyn ArtifactCache>>,
}

impl Acquirer {
    /// Create an acquirer that clones under `temp_dir` (the system temporary
    /// directory when `None`), walks with a default [`FsWalker`], shows no
    /// progress and has no cache.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::NotADirectory`] if `temp_dir` exists and is
    /// not a directory.
    pub fn new(temp_dir: Option<PathBuf>) -> Result<Self, ArtifactError> {
        if let Some(dir) = &temp_dir {
            if dir.exists() && !dir.is_dir() {
                return Err(ArtifactError::NotADirectory { path: dir.clone() });
            }
        }
        Ok(Self {
            temp_dir,
            progress: false,
            walker: Arc::new(FsWalker::new()),
            cache: None,
        })
    }

    /// Create an acquirer from loaded configuration: temp dir, progress,
    /// walker skip rules and, when `cache_dir` is set, a [`FsCache`].
    pub fn from_config(config: &Config) -> Result<Self, ArtifactError> {
        let mut acquirer = Self::new(config.temp_dir())?
            .with_progress(config.progress())
            .with_walker(Arc::new(FsWalker::with_config(&config.walker())));
        if let Some(dir) = config.cache_dir() {
            acquirer = acquirer.with_cache(Arc::new(FsCache::open(dir)?));
        }
        Ok(acquirer)
    }

    /// Show clone progress on stderr.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Replace the walker.
    pub fn with_walker(mut self, walker: Arc<dyn Walker>) -> Self {
        self.walker = walker;
        self
    }

    /// Attach a cache store.
    pub fn with_cache(mut self, cache: Arc<dyn ArtifactCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Acquire `target`.
    ///
    /// Always returns a cleanup handle, also when acquisition fails; run it
    /// once the artifact (or the error) has been dealt with.
    pub fn acquire(
        &self,
        target: &str,
        options: &ArtifactOptions,
        ctx: &OpContext,
    ) -> (Result<RepositoryArtifact, ArtifactError>, Cleanup) {
        let path = Path::new(target);
        match std::fs::metadata(path) {
            Ok(meta) if meta.is_dir() => {
                if let Some(selector) = &options.selector {
                    tracing::warn!(%selector, reference = target, "ignoring ref selector for local directory");
                }
                tracing::debug!(reference = target, "using local directory");
                let cleanup = Cleanup::owning(WorkTree::Borrowed(path.to_path_buf()));
                let artifact = self.artifact(target, path.to_path_buf(), None, cleanup.clone());
                (Ok(artifact), cleanup)
            }
            Ok(_) => (
                Err(ArtifactError::NotADirectory {
                    path: path.to_path_buf(),
                }),
                Cleanup::noop(),
            ),
            Err(_) => self.acquire_remote(target, options, ctx),
        }
    }

    fn acquire_remote(
        &self,
        target: &str,
        options: &ArtifactOptions,
        ctx: &OpContext,
    ) -> (Result<RepositoryArtifact, ArtifactError>, Cleanup) {
        let url = match normalize_url(target) {
            Ok(url) => url,
            Err(e) => return (Err(e.into()), Cleanup::noop()),
        };
        if let Err(e) = ctx.check() {
            return (Err(e.into()), Cleanup::noop());
        }

        let tree = match WorkTree::temporary(self.temp_dir.as_deref(), TEMP_PREFIX) {
            Ok(tree) => tree,
            Err(e) => return (Err(ArtifactError::TempDir(e)), Cleanup::noop()),
        };
        let root = tree.path().to_path_buf();
        let cleanup = Cleanup::owning(tree);
        tracing::debug!(url = %redact(&url), dest = %root.display(), "cloning");

        let show_progress = self.progress && !options.no_progress;
        let result = clone_and_checkout(&url, &root, options.selector.as_ref(), ctx, show_progress)
            .map(|()| self.artifact(target, root, Some(redact(&url)), cleanup.clone()));
        (result, cleanup)
    }

    fn artifact(
        &self,
        name: &str,
        root: PathBuf,
        repo_url: Option<String>,
        cleanup: Cleanup,
    ) -> RepositoryArtifact {
        RepositoryArtifact {
            name: name.to_string(),
            root,
            repo_url,
            cleanup,
            walker: Arc::clone(&self.walker),
            cache: self.cache.clone(),
        }
    }
}

/// Clone `url` into `root` and move it to `selector`.
fn clone_and_checkout(
    url: &Url,
    root: &Path,
    selector: Option<&RefSelector>,
    ctx: &OpContext,
    show_progress: bool,
) -> Result<(), ArtifactError> {
    let git = Git::clone_into(url.as_str(), root, ctx, show_progress).map_err(|e| match e {
        GitError::CloneFailed { message, .. } => ArtifactError::RepositoryNotFound {
            url: redact(url),
            message,
        },
        GitError::UnsupportedTransport { message, .. } => ArtifactError::UnsupportedTransport {
            url: redact(url),
            message,
        },
        other => other.into(),
    })?;

    let Some(selector) = selector else {
        return Ok(());
    };

    let commit = match (selector, selector.remote_ref()) {
        (RefSelector::Commit(hash), _) => git.resolve_commit(hash).map_err(|e| match e {
            GitError::ObjectNotFound { .. } | GitError::InvalidOid { .. } => {
                ArtifactError::ObjectNotFound { oid: hash.clone() }
            }
            other => other.into(),
        })?,
        (_, Some(refname)) => {
            let oid = resolve_remote(&git, &refname, ctx)?;
            let refspec = match selector {
                RefSelector::Branch(branch) => format!("+{refname}:refs/remotes/{ORIGIN}/{branch}"),
                _ => format!("+{refname}:{refname}"),
            };
            git.fetch_refspec(ORIGIN, &refspec, ctx, show_progress)?;
            git.peel_to_commit(&oid)?
        }
        (_, None) => return Ok(()),
    };

    let branch = match selector {
        RefSelector::Branch(branch) => Some(branch),
        _ => None,
    };
    git.checkout(&commit, branch, ctx)?;
    tracing::debug!(%selector, commit = commit.short(12), "checked out");
    Ok(())
}

fn resolve_remote(
    git: &Git,
    refname: &RefName,
    ctx: &OpContext,
) -> Result<Oid, ArtifactError> {
    git.find_remote_ref(ORIGIN, refname, ctx)?
        .ok_or_else(|| ArtifactError::RemoteRefNotFound {
            refname: refname.to_string(),
        })
}

/// An acquired working tree.
///
/// Holds a clone of the cleanup handle returned by [`Acquirer::acquire`]; the
/// tree stays on disk until that handle runs or every clone is dropped.
#[derive(Debug, Clone)]
pub struct RepositoryArtifact {
    name: String,
    root: PathBuf,
    repo_url: Option<String>,
    cleanup: Cleanup,
    walker: Arc<dyn Walker>,
    cache: Option<Arc<dyn ArtifactCache>>,
}

impl RepositoryArtifact {
    /// The raw reference this artifact was acquired from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Root of the working tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the tree is a temporary clone (as opposed to a local directory).
    pub fn is_temporary(&self) -> bool {
        self.repo_url.is_some()
    }

    /// The cleanup handle bound to this artifact.
    pub fn cleanup(&self) -> &Cleanup {
        &self.cleanup
    }

    /// Enumerate the working tree through the walker.
    pub fn walk(
        &self,
        visit: &mut dyn FnMut(&FileEntry) -> Result<(), WalkError>,
    ) -> Result<(), WalkError> {
        self.walker.walk(&self.root, visit)
    }

    /// Compute the identity of the tree and describe it.
    ///
    /// The identity is taken over every file outside `.git`, regardless of the
    /// walker's skip rules. With a cache attached, stores the tree's [`BlobInfo`] when the cache
    /// does not already hold it.
    ///
    /// # Errors
    ///
    /// - [`ArtifactError::Interrupted`] if `ctx` stops the walk
    /// - [`ArtifactError::Walk`] if the tree cannot be read (for example
    ///   after its cleanup has run)
    /// - [`ArtifactError::Cache`] if the cache fails
    pub fn inspect(&self, ctx: &OpContext) -> Result<Reference, ArtifactError> {
        ctx.check()?;
        let tree = compute_identity(&self.root, &FsWalker::new(), ctx).map_err(|e| {
            match ctx.check() {
                Err(interrupted) => ArtifactError::Interrupted(interrupted),
                Ok(()) => ArtifactError::Walk(e),
            }
        })?;

        if let Some(cache) = &self.cache {
            let missing = cache.missing_blobs(std::slice::from_ref(&tree.id))?;
            if missing.is_empty() {
                tracing::debug!(id = %tree.id, "blob already cached");
            } else {
                cache.put_blob(&tree.id, &BlobInfo::new(tree.id.clone(), tree.files))?;
            }
        }

        Ok(Reference {
            name: self.name.clone(),
            artifact_type: ArtifactType::Repository,
            id: tree.id.clone(),
            blob_ids: vec![tree.id],
            repo_metadata: self.metadata(),
        })
    }

    /// Collect git facts about the tree. Failures only lose metadata.
    fn metadata(&self) -> Option<RepoMetadata> {
        let git = match Git::open(&self.root) {
            Ok(git) => git,
            Err(e) => {
                tracing::debug!(error = %e, "no repository metadata");
                return None;
            }
        };

        let repo_url = match &self.repo_url {
            Some(url) => Some(url.clone()),
            None => git.remote_url(ORIGIN).ok().flatten().map(|u| redact_str(&u)),
        };
        let mut metadata = RepoMetadata {
            repo_url,
            branch: git
                .current_branch()
                .ok()
                .flatten()
                .map(|b| b.to_string()),
            ..RepoMetadata::default()
        };

        if let Ok(head) = git.head_oid() {
            metadata.tags = git.tags_pointing_at(&head).unwrap_or_default();
            if let Ok(info) = git.commit_info(&head) {
                metadata.commit_msg = Some(info.summary);
                metadata.commit_time = Some(info.commit_time);
                metadata.author = Some(info.author);
                metadata.committer = Some(info.committer);
            }
            metadata.commit = Some(head.to_string());
        }
        Some(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::core::config::WalkerConfig;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn new_rejects_file_as_temp_dir() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file");
        fs::write(&file, "x").unwrap();
        assert!(matches!(
            Acquirer::new(Some(file)),
            Err(ArtifactError::NotADirectory { .. })
        ));
        assert!(Acquirer::new(Some(dir.path().join("later"))).is_ok());
    }

    #[test]
    fn local_directory_used_in_place() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.tf"), "resource {}").unwrap();
        let target = dir.path().to_string_lossy().into_owned();

        let acquirer = Acquirer::new(None).unwrap();
        let (result, cleanup) = acquirer.acquire(&target, &ArtifactOptions::default(), &OpContext::new());
        let artifact = result.unwrap();

        assert_eq!(artifact.root(), dir.path());
        assert!(!artifact.is_temporary());
        assert!(!cleanup.owns_temporary());

        cleanup.run();
        cleanup.run();
        assert!(dir.path().join("main.tf").exists());
    }

    #[test]
    fn existing_file_rejected() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file");
        fs::write(&file, "x").unwrap();

        let acquirer = Acquirer::new(None).unwrap();
        let (result, cleanup) = acquirer.acquire(
            &file.to_string_lossy(),
            &ArtifactOptions::default(),
            &OpContext::new(),
        );
        assert!(matches!(result, Err(ArtifactError::NotADirectory { .. })));
        cleanup.run();
    }

    #[test]
    fn invalid_url_creates_nothing() {
        let parent = TempDir::new().unwrap();
        let acquirer = Acquirer::new(Some(parent.path().to_path_buf())).unwrap();
        let (result, cleanup) =
            acquirer.acquire("ht tp://foo.com", &ArtifactOptions::default(), &OpContext::new());

        let err = result.unwrap_err();
        assert!(err.to_string().contains("url parse error"));
        assert!(cleanup.is_released());
        assert_eq!(fs::read_dir(parent.path()).unwrap().count(), 0);
        cleanup.run();
    }

    #[test]
    fn cancelled_before_clone_creates_nothing() {
        let parent = TempDir::new().unwrap();
        let acquirer = Acquirer::new(Some(parent.path().to_path_buf())).unwrap();
        let ctx = OpContext::new();
        ctx.cancel();
        let (result, cleanup) =
            acquirer.acquire("github.com/org/repo", &ArtifactOptions::default(), &ctx);
        assert!(result.unwrap_err().is_interrupted());
        assert_eq!(fs::read_dir(parent.path()).unwrap().count(), 0);
        cleanup.run();
    }

    #[test]
    fn inspect_local_plain_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        let target = dir.path().to_string_lossy().into_owned();

        let cache = Arc::new(MemoryCache::new());
        let acquirer = Acquirer::new(None).unwrap().with_cache(cache.clone());
        let (result, cleanup) = acquirer.acquire(&target, &ArtifactOptions::default(), &OpContext::new());
        let artifact = result.unwrap();

        let reference = artifact.inspect(&OpContext::new()).unwrap();
        assert_eq!(reference.name, target);
        assert_eq!(reference.artifact_type, ArtifactType::Repository);
        assert_eq!(reference.blob_ids, vec![reference.id.clone()]);
        assert!(reference.repo_metadata.is_none());

        let stored = cache.get_blob(&reference.id).unwrap().unwrap();
        assert_eq!(stored.files.len(), 1);
        assert_eq!(stored.files[0].path, "a.txt");

        let again = artifact.inspect(&OpContext::new()).unwrap();
        assert_eq!(again.id, reference.id);
        assert_eq!(cache.len(), 1);
        cleanup.run();
    }

    #[test]
    fn inspect_with_cancelled_context() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().to_string_lossy().into_owned();
        let acquirer = Acquirer::new(None).unwrap();
        let (result, _cleanup) =
            acquirer.acquire(&target, &ArtifactOptions::default(), &OpContext::new());
        let ctx = OpContext::new();
        ctx.cancel();
        assert!(result.unwrap().inspect(&ctx).unwrap_err().is_interrupted());
    }

    #[test]
    fn identity_ignores_walker_skip_rules() {
        let one = TempDir::new().unwrap();
        let two = TempDir::new().unwrap();
        for (dir, secret) in [(&one, "one"), (&two, "two")] {
            fs::write(dir.path().join("main.tf"), "resource {}").unwrap();
            fs::write(dir.path().join("secret.env"), secret).unwrap();
        }

        let skipping = Acquirer::new(None).unwrap().with_walker(Arc::new(FsWalker::with_config(
            &WalkerConfig {
                skip_files: vec!["secret.env".into()],
                ..WalkerConfig::default()
            },
        )));
        let inspect = |acquirer: &Acquirer, dir: &TempDir| {
            let target = dir.path().to_string_lossy().into_owned();
            let (result, _cleanup) =
                acquirer.acquire(&target, &ArtifactOptions::default(), &OpContext::new());
            let artifact = result.unwrap();
            (artifact.inspect(&OpContext::new()).unwrap().id, artifact)
        };

        let (id_one, artifact) = inspect(&skipping, &one);
        let (id_two, _) = inspect(&skipping, &two);
        assert_ne!(id_one, id_two);

        let (plain_id, _) = inspect(&Acquirer::new(None).unwrap(), &one);
        assert_eq!(id_one, plain_id);

        let mut seen = Vec::new();
        artifact
            .walk(&mut |entry| {
                seen.push(entry.rel_path.clone());
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, vec!["main.tf"]);
    }

    #[test]
    fn walk_delegates_to_walker() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/HEAD"), "x").unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        let target = dir.path().to_string_lossy().into_owned();

        let acquirer = Acquirer::new(None).unwrap();
        let (result, _cleanup) =
            acquirer.acquire(&target, &ArtifactOptions::default(), &OpContext::new());
        let mut seen = Vec::new();
        result
            .unwrap()
            .walk(&mut |entry| {
                seen.push(entry.rel_path.clone());
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, vec!["a.txt"]);
    }
}
