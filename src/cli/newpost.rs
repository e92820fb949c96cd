use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use git2::Oid;
use log::info;

use crate::cli::Context;
use crate::domain::draft::branch_for_slug;
use crate::domain::Post;
use crate::error::{BlogtoolError, Result};
use crate::git::Repository;

/// What to do in git once the post file is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GitMode {
    /// Leave the repository alone
    #[default]
    None,
    /// Stage the new file on the current branch
    AddOnly,
    /// Create `draft/{slug}` off the main branch, stage and commit
    Commit,
}

/// Arguments for the newpost workflow
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewPostArgs {
    pub title: String,
    pub tags: Vec<String>,
    /// Empty means the configured default categories
    pub categories: Vec<String>,
    /// `None` means today
    pub date: Option<NaiveDate>,
    /// Overrides the slug derived from the title
    pub slug: Option<String>,
    pub draft: bool,
    pub weight: Option<i64>,
    /// Overrides the configured slug length limit
    pub max_slug_length: Option<usize>,
    /// Print the post instead of writing it
    pub stdout: bool,
    pub git: GitMode,
}

/// Result of a successful newpost workflow
#[derive(Debug, Clone, PartialEq)]
pub enum NewPostOutcome {
    /// Rendered post text; nothing touched on disk
    Printed(String),
    /// Post written under the post directory
    Written {
        /// Relative to the working tree root
        path: PathBuf,
        branch: Option<String>,
        commit: Option<Oid>,
    },
}

/// Create a new post, optionally on its own draft branch.
///
/// Refuses to overwrite an existing post file, to reuse an existing draft
/// branch or to branch off a missing main branch; all checks run before
/// anything is written.
pub fn newpost<R: Repository>(ctx: &Context<R>, args: &NewPostArgs) -> Result<NewPostOutcome> {
    let config = &ctx.config;

    let categories = if args.categories.is_empty() {
        config.default_categories.clone()
    } else {
        args.categories.clone()
    };

    let mut builder = Post::builder()
        .title(args.title.as_str())
        .tags(args.tags.iter().cloned())
        .categories(categories)
        .weight(args.weight)
        .draft(args.draft.then_some(true))
        .max_slug_length(args.max_slug_length.unwrap_or(config.max_slug_length))
        .body("\n");

    if let Some(date) = args.date {
        builder = builder.date(date);
    }
    if let Some(slug) = &args.slug {
        builder = builder.slug(slug.as_str());
    }

    let post = builder.build()?;
    let text = post.render()?;

    if args.stdout {
        return Ok(NewPostOutcome::Printed(text));
    }

    let path = config.post_directory.join(post.filename());
    let full_path = ctx.repo.workdir()?.join(&path);

    if full_path.exists() {
        return Err(BlogtoolError::PostExists(path.display().to_string()));
    }

    let branch = match args.git {
        GitMode::Commit => {
            let branch = branch_for_slug(&post.slug);
            if ctx.repo.branch_exists(&branch)? {
                return Err(BlogtoolError::BranchExists(branch));
            }
            if !ctx.repo.branch_exists(&config.main_branch)? {
                return Err(BlogtoolError::NoSuchBranch(config.main_branch.clone()));
            }
            Some(branch)
        }
        GitMode::None | GitMode::AddOnly => None,
    };

    if let Some(parent) = full_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&full_path, text)?;
    info!("wrote {}", path.display());

    if let Some(branch) = &branch {
        info!("creating branch {} from {}", branch, config.main_branch);
        ctx.repo.create_branch(branch, &config.main_branch)?;
    }

    if args.git != GitMode::None {
        ctx.repo.add_path(&path)?;
    }

    let commit = match branch {
        Some(_) => Some(ctx.repo.commit(&format!("added {}", path.display()))?),
        None => None,
    };

    Ok(NewPostOutcome::Written {
        path,
        branch,
        commit,
    })
}
