//! Command workflows
//!
//! Each command is a plain function taking a [Context], so it can be driven
//! programmatically (and against a mock repository) without clap.

pub mod lsdraft;
pub mod newpost;
pub mod refresh;

pub use lsdraft::lsdraft;
pub use newpost::{newpost, GitMode, NewPostArgs, NewPostOutcome};
pub use refresh::{refresh, RefreshArgs, RefreshOutcome};

use crate::config::Config;
use crate::git::Repository;

/// Everything a command needs: the repository and the resolved settings
pub struct Context<R: Repository> {
    pub repo: R,
    pub config: Config,
}

impl<R: Repository> Context<R> {
    pub fn new(repo: R, config: Config) -> Self {
        Context { repo, config }
    }
}
