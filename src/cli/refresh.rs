use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use git2::Oid;
use log::{debug, info, warn};

use crate::cli::Context;
use crate::domain::draft::candidate_branches;
use crate::domain::{format_date, today, LivePosts, Post};
use crate::error::{BlogtoolError, Result};
use crate::git::Repository;

/// Draft name meaning "the checked-out branch"
pub const CURRENT_BRANCH: &str = "HEAD";

/// Arguments for the refresh workflow
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RefreshArgs {
    /// Branch name or slug; `None` or `HEAD` means the current branch
    pub draft_name: Option<String>,
    /// `None` means today
    pub date: Option<NaiveDate>,
}

/// Result of a successful refresh
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshOutcome {
    pub branch: String,
    pub date: NaiveDate,
    /// (old path, new path) for every post that moved
    pub renamed: Vec<(PathBuf, PathBuf)>,
    /// `None` when every post already carried the date
    pub commit: Option<Oid>,
}

/// Map a user-supplied draft name to an existing branch.
pub fn resolve_draft<R: Repository>(repo: &R, name: &str) -> Result<String> {
    for candidate in candidate_branches(name) {
        if repo.branch_exists(&candidate)? {
            return Ok(candidate);
        }
    }

    Err(BlogtoolError::NoSuchDraft(name.to_string()))
}

fn switch_branch<R: Repository>(repo: &R, from: &str, to: &str) -> Result<()> {
    if repo.has_unstaged_changes()? {
        return Err(BlogtoolError::unstaged_switch(from, to));
    }

    debug!("switching {} -> {}", from, to);
    repo.checkout_branch(to)
}

/// Run `f` with `target` checked out, then return to the original branch.
///
/// Both switches refuse to run over unstaged changes. The original branch
/// is restored even when `f` fails; the error from `f` takes precedence.
pub fn with_branch<R, T, F>(repo: &R, target: &str, f: F) -> Result<T>
where
    R: Repository,
    F: FnOnce() -> Result<T>,
{
    let original = repo.current_branch()?;
    if original == target {
        return f();
    }

    switch_branch(repo, &original, target)?;
    let result = f();
    let restored = switch_branch(repo, target, &original);

    match (result, restored) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(restore_err)) => {
            warn!("could not switch back to {}: {}", original, restore_err);
            Err(e)
        }
    }
}

/// Post files introduced on `branch` since `merge_base` that still exist
/// at its tip, following renames.
pub fn find_posts<R: Repository>(
    repo: &R,
    branch: &str,
    merge_base: Oid,
    post_directory: &Path,
) -> Result<BTreeSet<PathBuf>> {
    let mut posts = LivePosts::new(post_directory);

    for commit in repo.commits_since(merge_base, branch)? {
        debug!(
            "examining commit {} {}",
            commit.hash,
            commit.message.lines().next().unwrap_or_default()
        );
        posts.extend(commit.changes);
    }

    Ok(posts.into_paths())
}

/// Move every post on a draft branch to a new date.
///
/// Each post is rewritten under its new file name and the old file is
/// removed; one commit records all of them. Refreshing to the date the
/// posts already carry makes no commit.
pub fn refresh<R: Repository>(ctx: &Context<R>, args: &RefreshArgs) -> Result<RefreshOutcome> {
    let repo = &ctx.repo;

    let draft_name = match args.draft_name.as_deref() {
        None | Some(CURRENT_BRANCH) => repo.current_branch()?,
        Some(name) => name.to_string(),
    };
    let branch = resolve_draft(repo, &draft_name)?;

    if repo.has_unstaged_changes()? {
        return Err(BlogtoolError::unstaged());
    }

    let date = args.date.unwrap_or_else(today);

    info!("processing branch {}", branch);
    with_branch(repo, &branch, || refresh_branch(ctx, &branch, &draft_name, date))
}

fn refresh_branch<R: Repository>(
    ctx: &Context<R>,
    branch: &str,
    draft_name: &str,
    date: NaiveDate,
) -> Result<RefreshOutcome> {
    let repo = &ctx.repo;

    let merge_base = repo
        .merge_base(&ctx.config.main_branch, branch)?
        .ok_or_else(|| BlogtoolError::NoMergeBase(draft_name.to_string()))?;
    info!("found merge base {}", merge_base);

    let posts = find_posts(repo, branch, merge_base, &ctx.config.post_directory)?;
    if posts.is_empty() {
        return Err(BlogtoolError::NoPosts(draft_name.to_string()));
    }

    info!("setting date to {}", format_date(date));

    let workdir = repo.workdir()?;
    let mut renamed = Vec::new();

    for path in posts {
        let mut post = Post::from_file(workdir.join(&path))?;
        post.date = date;

        let new_path = match path.parent() {
            Some(parent) => parent.join(post.filename()),
            None => PathBuf::from(post.filename()),
        };

        if new_path != path {
            info!("renaming {} -> {}", path.display(), new_path.display());
            fs::write(workdir.join(&new_path), post.render()?)?;
            fs::remove_file(workdir.join(&path))?;

            repo.add_path(&path)?;
            repo.add_path(&new_path)?;
            renamed.push((path, new_path));
        }
    }

    let commit = if repo.has_staged_changes()? {
        info!("committing changes");
        Some(repo.commit(&format!("updated to date {}", format_date(date)))?)
    } else {
        info!("no changes");
        None
    };

    Ok(RefreshOutcome {
        branch: branch.to_string(),
        date,
        renamed,
        commit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::domain::{parse_date, FileChange};
    use crate::git::{CommitInfo, MockRepository};
    use tempfile::TempDir;

    const BRANCH: &str = "draft/test-post";

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn added(path: &str) -> CommitInfo {
        CommitInfo {
            hash: "abc123".to_string(),
            message: format!("added {}", path),
            changes: vec![FileChange::Added(PathBuf::from(path))],
        }
    }

    // Draft branch whose only commit adds a post dated `on`
    fn draft_context(on: &str) -> (TempDir, Context<MockRepository>, PathBuf) {
        let dir = TempDir::new().unwrap();
        let post = Post::builder()
            .title("Test post")
            .date(date(on))
            .categories(["tech"])
            .body("\nHello.\n")
            .build()
            .unwrap();

        let path = PathBuf::from("post").join(post.filename());
        fs::create_dir_all(dir.path().join("post")).unwrap();
        fs::write(dir.path().join(&path), post.render().unwrap()).unwrap();

        let mut repo = MockRepository::new(dir.path());
        repo.add_branch(BRANCH);
        repo.set_merge_base(BRANCH, Oid::from_bytes(&[7; 20]).unwrap());
        repo.add_commit(BRANCH, added(path.to_str().unwrap()));

        (dir, Context::new(repo, Config::default()), path)
    }

    fn args(name: &str, on: &str) -> RefreshArgs {
        RefreshArgs {
            draft_name: Some(name.to_string()),
            date: Some(date(on)),
        }
    }

    #[test]
    fn test_refresh_renames_and_commits() {
        let (dir, ctx, old) = draft_context("2021-01-01");
        let outcome = refresh(&ctx, &args("test-post", "2021-02-02")).unwrap();

        let new = PathBuf::from("post/2021-02-02-test-post.md");
        assert_eq!(outcome.branch, BRANCH);
        assert_eq!(outcome.renamed, vec![(old.clone(), new.clone())]);
        assert!(outcome.commit.is_some());

        assert!(!dir.path().join(&old).exists());
        let post = Post::from_file(dir.path().join(&new)).unwrap();
        assert_eq!(post.date, date("2021-02-02"));
        assert_eq!(post.body, "\nHello.\n");
        assert_eq!(post.categories, vec!["tech"]);

        assert_eq!(ctx.repo.commit_messages(), vec!["updated to date 2021-02-02"]);
        // switched to the draft and back
        assert_eq!(ctx.repo.checkouts(), vec![BRANCH, "master"]);
    }

    #[test]
    fn test_refresh_with_dotted_post_directory() {
        let (dir, mut ctx, old) = draft_context("2021-01-01");
        ctx.config = Config::default()
            .with_overrides(None, Some(PathBuf::from("./post")))
            .resolve(dir.path())
            .unwrap();

        let outcome = refresh(&ctx, &args("test-post", "2021-02-02")).unwrap();
        assert_eq!(
            outcome.renamed,
            vec![(old, PathBuf::from("post/2021-02-02-test-post.md"))]
        );
    }

    #[test]
    fn test_refresh_same_date_makes_no_commit() {
        let (dir, ctx, path) = draft_context("2021-02-02");
        let outcome = refresh(&ctx, &args(BRANCH, "2021-02-02")).unwrap();

        assert!(outcome.renamed.is_empty());
        assert_eq!(outcome.commit, None);
        assert!(ctx.repo.commit_messages().is_empty());
        assert!(dir.path().join(path).exists());
    }

    #[test]
    fn test_refresh_current_branch_does_not_switch() {
        let (_dir, mut ctx, _) = draft_context("2021-01-01");
        ctx.repo.set_current_branch(BRANCH);

        refresh(
            &ctx,
            &RefreshArgs {
                draft_name: None,
                date: Some(date("2021-03-03")),
            },
        )
        .unwrap();

        assert!(ctx.repo.checkouts().is_empty());
        assert_eq!(ctx.repo.commit_messages(), vec!["updated to date 2021-03-03"]);
    }

    #[test]
    fn test_refresh_with_unstaged_changes() {
        let (_dir, ctx, _) = draft_context("2021-01-01");
        ctx.repo.set_unstaged(true);

        let err = refresh(&ctx, &args("test-post", "2021-02-02")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot operate when there are unstaged changes"
        );
        assert!(ctx.repo.checkouts().is_empty());
        assert!(ctx.repo.commit_messages().is_empty());
    }

    #[test]
    fn test_refresh_unknown_draft() {
        let (_dir, ctx, _) = draft_context("2021-01-01");
        let err = refresh(&ctx, &args("nope", "2021-02-02")).unwrap_err();
        assert!(matches!(err, BlogtoolError::NoSuchDraft(name) if name == "nope"));
    }

    #[test]
    fn test_refresh_without_merge_base() {
        let dir = TempDir::new().unwrap();
        let mut repo = MockRepository::new(dir.path());
        repo.add_branch(BRANCH);
        let ctx = Context::new(repo, Config::default());

        let err = refresh(&ctx, &args(BRANCH, "2021-02-02")).unwrap_err();
        assert_eq!(err.to_string(), "failed to find merge base for draft/test-post");
        assert_eq!(ctx.repo.current_branch().unwrap(), "master");
    }

    #[test]
    fn test_refresh_branch_without_posts() {
        let dir = TempDir::new().unwrap();
        let mut repo = MockRepository::new(dir.path());
        repo.add_branch(BRANCH);
        repo.set_merge_base(BRANCH, Oid::from_bytes(&[7; 20]).unwrap());
        repo.add_commit(BRANCH, added("README.md"));
        let ctx = Context::new(repo, Config::default());

        let err = refresh(&ctx, &args("test-post", "2021-02-02")).unwrap_err();
        assert_eq!(err.to_string(), "no posts in test-post");
        // the original branch is restored after a failure
        assert_eq!(ctx.repo.checkouts(), vec![BRANCH, "master"]);
    }

    #[test]
    fn test_with_branch_same_branch_is_noop() {
        let repo = MockRepository::new("/tmp/blog");
        let value = with_branch(&repo, "master", || Ok(42)).unwrap();
        assert_eq!(value, 42);
        assert!(repo.checkouts().is_empty());
    }

    #[test]
    fn test_with_branch_refuses_to_leave_over_unstaged_changes() {
        let mut repo = MockRepository::new("/tmp/blog");
        repo.add_branch(BRANCH);
        repo.set_unstaged(true);

        let mut ran = false;
        let err = with_branch(&repo, BRANCH, || {
            ran = true;
            Ok(())
        })
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "attempt to switch master -> draft/test-post with unstaged changes"
        );
        assert!(!ran);
        assert!(repo.checkouts().is_empty());
    }

    #[test]
    fn test_with_branch_refuses_to_return_over_unstaged_changes() {
        let mut repo = MockRepository::new("/tmp/blog");
        repo.add_branch(BRANCH);

        let err = with_branch(&repo, BRANCH, || {
            repo.set_unstaged(true);
            Ok(())
        })
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "attempt to switch draft/test-post -> master with unstaged changes"
        );
        // no checkout back to master was attempted
        assert_eq!(repo.checkouts(), vec![BRANCH]);
        assert_eq!(repo.current_branch().unwrap(), BRANCH);
    }

    #[test]
    fn test_with_branch_prefers_the_workflow_error() {
        let mut repo = MockRepository::new("/tmp/blog");
        repo.add_branch(BRANCH);

        let err = with_branch(&repo, BRANCH, || -> Result<()> {
            repo.set_unstaged(true);
            Err(BlogtoolError::NoPosts("test-post".to_string()))
        })
        .unwrap_err();

        assert_eq!(err.to_string(), "no posts in test-post");
        assert_eq!(repo.checkouts(), vec![BRANCH]);
    }
}
