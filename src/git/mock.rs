use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{BlogtoolError, Result};
use crate::git::{CommitInfo, Repository};
use git2::Oid;

/// Mock repository for testing without actual git operations
///
/// Branch history is scripted with [MockRepository::add_commit]; file
/// contents live in a real directory so workflows can read and write posts.
/// Checkouts, staged paths and commit messages are recorded for assertions.
pub struct MockRepository {
    workdir: PathBuf,
    branches: RefCell<Vec<String>>,
    current: RefCell<String>,
    unstaged: Cell<bool>,
    history: HashMap<String, Vec<CommitInfo>>,
    merge_bases: HashMap<String, Oid>,
    staged: RefCell<Vec<PathBuf>>,
    commits: RefCell<Vec<String>>,
    checkouts: RefCell<Vec<String>>,
}

impl MockRepository {
    /// Create a mock repository on `master` rooted at `workdir`
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        MockRepository {
            workdir: workdir.into(),
            branches: RefCell::new(vec!["master".to_string()]),
            current: RefCell::new("master".to_string()),
            unstaged: Cell::new(false),
            history: HashMap::new(),
            merge_bases: HashMap::new(),
            staged: RefCell::new(Vec::new()),
            commits: RefCell::new(Vec::new()),
            checkouts: RefCell::new(Vec::new()),
        }
    }

    /// Add a local branch
    pub fn add_branch(&mut self, name: impl Into<String>) {
        self.branches.get_mut().push(name.into());
    }

    /// Set the checked-out branch without recording a checkout
    pub fn set_current_branch(&mut self, name: impl Into<String>) {
        *self.current.get_mut() = name.into();
    }

    /// Pretend the working tree has (or lacks) unstaged edits
    pub fn set_unstaged(&self, dirty: bool) {
        self.unstaged.set(dirty);
    }

    /// Append a commit to a branch's history past its merge base
    pub fn add_commit(&mut self, branch: impl Into<String>, info: CommitInfo) {
        self.history.entry(branch.into()).or_default().push(info);
    }

    /// Set the merge base reported for `branch`
    pub fn set_merge_base(&mut self, branch: impl Into<String>, oid: Oid) {
        self.merge_bases.insert(branch.into(), oid);
    }

    /// Branches switched to, in order
    pub fn checkouts(&self) -> Vec<String> {
        self.checkouts.borrow().clone()
    }

    /// Paths staged since the last commit
    pub fn staged_paths(&self) -> Vec<PathBuf> {
        self.staged.borrow().clone()
    }

    /// Messages of commits made through the mock
    pub fn commit_messages(&self) -> Vec<String> {
        self.commits.borrow().clone()
    }

    fn require_branch(&self, name: &str) -> Result<()> {
        if self.branches.borrow().iter().any(|b| b == name) {
            Ok(())
        } else {
            Err(BlogtoolError::branch(format!("Branch not found: {}", name)))
        }
    }
}

impl Repository for MockRepository {
    fn workdir(&self) -> Result<PathBuf> {
        Ok(self.workdir.clone())
    }

    fn branch_names(&self) -> Result<Vec<String>> {
        Ok(self.branches.borrow().clone())
    }

    fn branch_exists(&self, name: &str) -> Result<bool> {
        Ok(self.branches.borrow().iter().any(|b| b == name))
    }

    fn current_branch(&self) -> Result<String> {
        Ok(self.current.borrow().clone())
    }

    fn has_unstaged_changes(&self) -> Result<bool> {
        Ok(self.unstaged.get())
    }

    fn has_staged_changes(&self) -> Result<bool> {
        Ok(!self.staged.borrow().is_empty())
    }

    fn checkout_branch(&self, name: &str) -> Result<()> {
        self.require_branch(name)?;
        self.checkouts.borrow_mut().push(name.to_string());
        *self.current.borrow_mut() = name.to_string();
        Ok(())
    }

    fn create_branch(&self, name: &str, start_point: &str) -> Result<()> {
        self.require_branch(start_point)?;
        if self.branch_exists(name)? {
            return Err(BlogtoolError::BranchExists(name.to_string()));
        }
        self.branches.borrow_mut().push(name.to_string());
        self.checkout_branch(name)
    }

    fn merge_base(&self, a: &str, b: &str) -> Result<Option<Oid>> {
        self.require_branch(a)?;
        self.require_branch(b)?;
        Ok(self
            .merge_bases
            .get(b)
            .or_else(|| self.merge_bases.get(a))
            .copied())
    }

    fn commits_since(&self, _base: Oid, branch: &str) -> Result<Vec<CommitInfo>> {
        self.require_branch(branch)?;
        Ok(self.history.get(branch).cloned().unwrap_or_default())
    }

    fn add_path(&self, path: &Path) -> Result<()> {
        self.staged.borrow_mut().push(path.to_path_buf());
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<Oid> {
        self.staged.borrow_mut().clear();
        self.commits.borrow_mut().push(message.to_string());
        let n = self.commits.borrow().len() as u8;
        Ok(Oid::from_bytes(&[n; 20])?)
    }
}
