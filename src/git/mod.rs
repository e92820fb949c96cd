//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the repository
//! operations the draft workflows need, with a real implementation and a
//! mock for testing.
//!
//! # Overview
//!
//! - [repository::Git2Repository]: A real implementation using the `git2` crate
//! - [mock::MockRepository]: An in-memory implementation for testing
//!
//! Workflows depend on the [Repository] trait rather than on a concrete
//! implementation.
//!
//! ```rust
//! # use blogtool::git::Repository;
//! # fn example<R: Repository>(repo: &R) -> blogtool::Result<()> {
//! if let Some(base) = repo.merge_base("master", "draft/test-post")? {
//!     for commit in repo.commits_since(base, "draft/test-post")? {
//!         println!("{} {}", commit.hash, commit.message);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use std::path::{Path, PathBuf};

use crate::domain::FileChange;
use crate::error::Result;
use git2::Oid;

/// One commit on a draft branch and the file changes it made
/// relative to its first parent
#[derive(Debug, Clone, PartialEq)]
pub struct CommitInfo {
    /// The commit hash
    pub hash: String,
    /// The commit message
    pub message: String,
    /// Added, renamed and deleted files, in diff order
    pub changes: Vec<FileChange>,
}

/// Repository operations used by the blogtool workflows
///
/// All paths passed to or returned from these methods are relative to
/// the root of the working tree.
pub trait Repository {
    /// Root of the working tree
    fn workdir(&self) -> Result<PathBuf>;

    /// Names of all local branches, in repository ref order
    fn branch_names(&self) -> Result<Vec<String>>;

    /// Whether a local branch named `name` exists
    fn branch_exists(&self, name: &str) -> Result<bool>;

    /// Name of the checked-out branch
    ///
    /// # Returns
    /// * `Err` - If HEAD is detached or unborn
    fn current_branch(&self) -> Result<String>;

    /// Whether tracked files in the working tree differ from the index
    fn has_unstaged_changes(&self) -> Result<bool>;

    /// Whether the index differs from the HEAD commit
    fn has_staged_changes(&self) -> Result<bool>;

    /// Switch the working tree and HEAD to an existing branch
    fn checkout_branch(&self, name: &str) -> Result<()>;

    /// Create `name` at the tip of `start_point` and switch to it
    fn create_branch(&self, name: &str, start_point: &str) -> Result<()>;

    /// Most recent common ancestor of two branches
    ///
    /// # Returns
    /// * `Ok(None)` - If the branches share no history
    /// * `Err` - If either branch does not exist
    fn merge_base(&self, a: &str, b: &str) -> Result<Option<Oid>>;

    /// First-parent commits from `base` (exclusive) to the tip of `branch`
    /// (inclusive), oldest first, each diffed against its predecessor
    /// with rename detection
    fn commits_since(&self, base: Oid, branch: &str) -> Result<Vec<CommitInfo>>;

    /// Stage `path`: its current contents, or its removal if it is gone
    fn add_path(&self, path: &Path) -> Result<()>;

    /// Commit the index on the current branch
    fn commit(&self, message: &str) -> Result<Oid>;
}
