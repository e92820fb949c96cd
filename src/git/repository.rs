use std::path::{Path, PathBuf};

use crate::domain::FileChange;
use crate::error::{BlogtoolError, Result};
use crate::git::CommitInfo;
use git2::build::CheckoutBuilder;
use git2::{BranchType, Delta, DiffDelta, DiffFindOptions, Oid, Repository as Git2Repo, Sort};

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    fn branch_oid(&self, branch_name: &str) -> Result<Oid> {
        let branch = self
            .repo
            .find_branch(branch_name, BranchType::Local)
            .map_err(|e| {
                BlogtoolError::branch(format!("Cannot find branch '{}': {}", branch_name, e))
            })?;

        branch.get().target().ok_or_else(|| {
            BlogtoolError::branch(format!("Branch '{}' has no target", branch_name))
        })
    }
}

/// Reduce a diff delta to the changes draft tracking cares about.
fn file_change(delta: &DiffDelta<'_>) -> Option<FileChange> {
    let old = delta.old_file().path().map(Path::to_path_buf);
    let new = delta.new_file().path().map(Path::to_path_buf);

    match delta.status() {
        Delta::Added => new.map(FileChange::Added),
        Delta::Deleted => old.map(FileChange::Deleted),
        Delta::Renamed => match (old, new) {
            (Some(from), Some(to)) => Some(FileChange::Renamed { from, to }),
            _ => None,
        },
        _ => None,
    }
}

impl super::Repository for Git2Repository {
    fn workdir(&self) -> Result<PathBuf> {
        self.repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or(BlogtoolError::BareRepository)
    }

    fn branch_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();

        for branch in self.repo.branches(Some(BranchType::Local))? {
            let (branch, _) = branch?;
            if let Some(name) = branch.name()? {
                names.push(name.to_string());
            }
        }

        Ok(names)
    }

    fn branch_exists(&self, name: &str) -> Result<bool> {
        match self.repo.find_branch(name, BranchType::Local) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn current_branch(&self) -> Result<String> {
        let head = self.repo.head()?;
        if !head.is_branch() {
            return Err(BlogtoolError::branch("HEAD is detached"));
        }

        head.shorthand()
            .map(str::to_string)
            .ok_or_else(|| BlogtoolError::branch("HEAD is not valid UTF-8"))
    }

    fn has_unstaged_changes(&self) -> Result<bool> {
        let diff = self.repo.diff_index_to_workdir(None, None)?;
        Ok(diff.deltas().next().is_some())
    }

    fn has_staged_changes(&self) -> Result<bool> {
        let head_tree = self.repo.head()?.peel_to_tree()?;
        let diff = self.repo.diff_tree_to_index(Some(&head_tree), None, None)?;
        Ok(diff.deltas().next().is_some())
    }

    fn checkout_branch(&self, name: &str) -> Result<()> {
        let reference = format!("refs/heads/{}", name);
        let target = self.repo.revparse_single(&reference)?;

        // the tree goes first so HEAD still describes what is on disk
        self.repo
            .checkout_tree(&target, Some(CheckoutBuilder::new().safe()))?;
        self.repo.set_head(&reference)?;

        Ok(())
    }

    fn create_branch(&self, name: &str, start_point: &str) -> Result<()> {
        let start = self.repo.find_commit(self.branch_oid(start_point)?)?;
        self.repo.branch(name, &start, false)?;
        self.checkout_branch(name)
    }

    fn merge_base(&self, a: &str, b: &str) -> Result<Option<Oid>> {
        let a = self.branch_oid(a)?;
        let b = self.branch_oid(b)?;

        match self.repo.merge_base(a, b) {
            Ok(oid) => Ok(Some(oid)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn commits_since(&self, base: Oid, branch: &str) -> Result<Vec<CommitInfo>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;
        revwalk.push(self.branch_oid(branch)?)?;
        revwalk.hide(base)?;
        revwalk.simplify_first_parent()?;

        let mut find_opts = DiffFindOptions::new();
        find_opts.renames(true);

        let mut commits = Vec::new();

        for oid in revwalk {
            let oid = oid?;
            let commit = self.repo.find_commit(oid)?;
            let message = commit.message().unwrap_or("(empty message)").to_string();

            // a merge only brings in work from the other side
            if commit.parent_count() > 1 {
                log::debug!("skipping merge commit {}", oid);
                commits.push(CommitInfo {
                    hash: oid.to_string(),
                    message,
                    changes: Vec::new(),
                });
                continue;
            }

            let tree = commit.tree()?;
            let parent_tree = match commit.parent_count() {
                0 => None,
                _ => Some(commit.parent(0)?.tree()?),
            };

            log::debug!("examining commit {}", oid);
            let mut diff =
                self.repo
                    .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;
            diff.find_similar(Some(&mut find_opts))?;

            let changes = diff
                .deltas()
                .filter_map(|delta| {
                    log::debug!(
                        "change {:?} old {:?} new {:?}",
                        delta.status(),
                        delta.old_file().path(),
                        delta.new_file().path()
                    );
                    file_change(&delta)
                })
                .collect();

            commits.push(CommitInfo {
                hash: oid.to_string(),
                message,
                changes,
            });
        }

        Ok(commits)
    }

    fn add_path(&self, path: &Path) -> Result<()> {
        let mut index = self.repo.index()?;

        if self.workdir()?.join(path).exists() {
            index.add_path(path)?;
        } else {
            index.remove_path(path)?;
        }
        index.write()?;

        Ok(())
    }

    fn commit(&self, message: &str) -> Result<Oid> {
        let mut index = self.repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;

        let signature = self.repo.signature()?;
        let parent = self.repo.head()?.peel_to_commit()?;

        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&parent],
        )?;

        Ok(oid)
    }
}
