#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use git2::{BranchType, Repository, RepositoryInitOptions};
use tempfile::TempDir;

/// Repository on master with one commit holding post/.gitkeep
pub fn setup_test_repo() -> TempDir {
    let temp_dir = TempDir::new().expect("Could not create temp dir");

    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("master");
    let repo = Repository::init_opts(temp_dir.path(), &opts).expect("Could not init git repo");

    {
        let mut config = repo.config().expect("Could not get config");
        config
            .set_str("user.name", "Test User")
            .expect("Could not set user.name");
        config
            .set_str("user.email", "test@example.com")
            .expect("Could not set user.email");
    }

    let post_dir = temp_dir.path().join("post");
    fs::create_dir(&post_dir).expect("Could not create post directory");
    fs::write(post_dir.join(".gitkeep"), "").expect("Could not write .gitkeep");

    let mut index = repo.index().expect("Could not get index");
    index
        .add_path(Path::new("post/.gitkeep"))
        .expect("Could not add file to index");
    index.write().expect("Could not write index");

    let tree_id = index.write_tree().expect("Could not write tree");
    let tree = repo.find_tree(tree_id).expect("Could not find tree");
    let sig = repo.signature().expect("Could not get sig");
    repo.commit(Some("HEAD"), &sig, &sig, "create post directory", &tree, &[])
        .expect("Could not create commit");

    temp_dir
}

/// Run the blogtool binary inside `dir`, isolated from the user's config
pub fn blogtool(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_blogtool"))
        .args(args)
        .current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .output()
        .expect("Failed to execute blogtool")
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8(output.stderr.clone()).unwrap()
}

pub fn open(dir: &Path) -> Repository {
    Repository::open(dir).expect("Could not open repo")
}

pub fn current_branch(dir: &Path) -> String {
    let repo = open(dir);
    let head = repo.head().unwrap();
    head.shorthand().unwrap().to_string()
}

pub fn commit_count(dir: &Path, branch: &str) -> usize {
    let repo = open(dir);
    let oid = repo
        .refname_to_id(&format!("refs/heads/{}", branch))
        .unwrap();
    let mut walk = repo.revwalk().unwrap();
    walk.push(oid).unwrap();
    walk.count()
}

pub fn tip_message(dir: &Path, branch: &str) -> String {
    let repo = open(dir);
    let branch = repo.find_branch(branch, BranchType::Local).unwrap();
    let commit = branch.get().peel_to_commit().unwrap();
    commit.message().unwrap().to_string()
}

pub fn tip_has_path(dir: &Path, branch: &str, path: &str) -> bool {
    let repo = open(dir);
    let branch = repo.find_branch(branch, BranchType::Local).unwrap();
    let tree = branch.get().peel_to_tree().unwrap();
    let found = tree.get_path(Path::new(path)).is_ok();
    found
}

pub fn post_path(dir: &Path, name: &str) -> PathBuf {
    dir.join("post").join(name)
}
