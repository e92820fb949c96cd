use crate::cli::Context;
use crate::domain::draft::is_draft_branch;
use crate::error::Result;
use crate::git::Repository;

/// Names of all draft branches, in repository ref order
pub fn lsdraft<R: Repository>(ctx: &Context<R>) -> Result<Vec<String>> {
    let drafts = ctx
        .repo
        .branch_names()?
        .into_iter()
        .filter(|name| is_draft_branch(name))
        .collect();

    Ok(drafts)
}
