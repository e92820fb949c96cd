use thiserror::Error;

/// Unified error type for blogtool operations
#[derive(Error, Debug)]
pub enum BlogtoolError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metadata error: {0}")]
    Metadata(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Branch error: {0}")]
    Branch(String),

    #[error("a post requires a title")]
    MissingTitle,

    #[error("invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("a post named {0} already exists")]
    PostExists(String),

    #[error("a branch named {0} already exists")]
    BranchExists(String),

    #[error("no branch named {0}")]
    NoSuchBranch(String),

    #[error("no draft named {0}")]
    NoSuchDraft(String),

    #[error("{0}")]
    UnstagedChanges(String),

    #[error("failed to find merge base for {0}")]
    NoMergeBase(String),

    #[error("no posts in {0}")]
    NoPosts(String),

    #[error("repository has no working tree")]
    BareRepository,
}

/// Convenience type alias for Results in blogtool
pub type Result<T> = std::result::Result<T, BlogtoolError>;

impl BlogtoolError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        BlogtoolError::Config(msg.into())
    }

    /// Create a branch lookup error with context
    pub fn branch(msg: impl Into<String>) -> Self {
        BlogtoolError::Branch(msg.into())
    }

    /// Refuse to operate on a dirty working tree
    pub fn unstaged() -> Self {
        BlogtoolError::UnstagedChanges(
            "cannot operate when there are unstaged changes".to_string(),
        )
    }

    /// Refuse to switch branches over a dirty working tree
    pub fn unstaged_switch(from: &str, to: &str) -> Self {
        BlogtoolError::UnstagedChanges(format!(
            "attempt to switch {} -> {} with unstaged changes",
            from, to
        ))
    }
}
