use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Prefix shared by every draft branch
pub const DRAFT_PREFIX: &str = "draft/";

/// Branch holding the draft of the post with `slug`
pub fn branch_for_slug(slug: &str) -> String {
    format!("{}{}", DRAFT_PREFIX, slug)
}

pub fn is_draft_branch(name: &str) -> bool {
    name.starts_with(DRAFT_PREFIX)
}

/// Branch names a user-supplied draft name may refer to, in lookup order:
/// the literal name, then `draft/{name}`.
pub fn candidate_branches(name: &str) -> Vec<String> {
    let mut candidates = vec![name.to_string()];
    if !is_draft_branch(name) {
        candidates.push(branch_for_slug(name));
    }
    candidates
}

/// A file-level change recorded by one commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    Added(PathBuf),
    Renamed { from: PathBuf, to: PathBuf },
    Deleted(PathBuf),
}

/// Post files introduced on a branch that still exist at its tip.
///
/// Fed one [FileChange] at a time in commit order; a post renamed away or
/// deleted leaves the set, a rename target inside the post directory
/// replaces it.
#[derive(Debug, Clone)]
pub struct LivePosts {
    post_directory: PathBuf,
    live: BTreeSet<PathBuf>,
}

impl LivePosts {
    pub fn new(post_directory: impl Into<PathBuf>) -> Self {
        LivePosts {
            post_directory: post_directory.into(),
            live: BTreeSet::new(),
        }
    }

    fn in_post_directory(&self, path: &Path) -> bool {
        path.starts_with(&self.post_directory)
    }

    pub fn apply(&mut self, change: &FileChange) {
        match change {
            FileChange::Added(path) => {
                if self.in_post_directory(path) {
                    log::info!("found post {}", path.display());
                    self.live.insert(path.clone());
                }
            }
            FileChange::Renamed { from, to } => {
                log::debug!("discarding {}", from.display());
                self.live.remove(from);
                if self.in_post_directory(to) {
                    log::info!("found post {}", to.display());
                    self.live.insert(to.clone());
                }
            }
            FileChange::Deleted(path) => {
                log::debug!("discarding {}", path.display());
                self.live.remove(path);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn into_paths(self) -> BTreeSet<PathBuf> {
        self.live
    }
}

impl Extend<FileChange> for LivePosts {
    fn extend<T: IntoIterator<Item = FileChange>>(&mut self, iter: T) {
        for change in iter {
            self.apply(&change);
        }
    }
}
