use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::domain::MAX_SLUG_LENGTH;
use crate::error::{BlogtoolError, Result};

/// Name of the per-repository configuration file
pub const CONFIG_FILE: &str = "blogtool.toml";

/// Represents the complete configuration for blogtool.
///
/// Every key is optional in the file; command-line options override
/// whatever the file says.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Branch drafts are created from and merged back into
    #[serde(default = "default_main_branch")]
    pub main_branch: String,

    /// Directory holding post files, relative to the working tree root
    #[serde(default = "default_post_directory")]
    pub post_directory: PathBuf,

    /// Length limit for slugs derived from titles
    #[serde(default = "default_max_slug_length")]
    pub max_slug_length: usize,

    /// Categories given to a new post when none are named
    #[serde(default = "default_categories")]
    pub default_categories: Vec<String>,
}

fn default_main_branch() -> String {
    "master".to_string()
}

fn default_post_directory() -> PathBuf {
    PathBuf::from("post")
}

fn default_max_slug_length() -> usize {
    MAX_SLUG_LENGTH
}

fn default_categories() -> Vec<String> {
    vec!["tech".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Config {
            main_branch: default_main_branch(),
            post_directory: default_post_directory(),
            max_slug_length: default_max_slug_length(),
            default_categories: default_categories(),
        }
    }
}

impl Config {
    /// Apply command-line overrides
    pub fn with_overrides(
        mut self,
        main_branch: Option<String>,
        post_directory: Option<PathBuf>,
    ) -> Self {
        if let Some(main_branch) = main_branch {
            self.main_branch = main_branch;
        }
        if let Some(post_directory) = post_directory {
            self.post_directory = post_directory;
        }
        self
    }

    /// Rewrite the post directory as a clean path relative to `workdir`.
    ///
    /// `./post`, `post/` and `{workdir}/post` all become `post`. Paths that
    /// leave the working tree are rejected.
    pub fn resolve(mut self, workdir: &Path) -> Result<Self> {
        self.post_directory = normalize_post_directory(&self.post_directory, workdir)?;
        Ok(self)
    }
}

fn normalize_post_directory(dir: &Path, workdir: &Path) -> Result<PathBuf> {
    let relative = if dir.is_absolute() {
        dir.strip_prefix(workdir).map_err(|_| {
            BlogtoolError::config(format!(
                "post directory {} is outside the working tree",
                dir.display()
            ))
        })?
    } else {
        dir
    };

    let mut normalized = PathBuf::new();
    for component in relative.components() {
        match component {
            Component::CurDir => {}
            Component::Normal(part) => normalized.push(part),
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(BlogtoolError::config(format!(
                    "post directory {} is outside the working tree",
                    dir.display()
                )));
            }
        }
    }

    Ok(normalized)
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `blogtool.toml` in the given search directory
/// 3. `.blogtool.toml` in the user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If a file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&Path>, search_dir: &Path) -> Result<Config> {
    let local = search_dir.join(CONFIG_FILE);

    let path = if let Some(path) = config_path {
        path.to_path_buf()
    } else if local.exists() {
        local
    } else if let Some(config_dir) = dirs::config_dir() {
        let user = config_dir.join(format!(".{}", CONFIG_FILE));
        if user.exists() {
            user
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    log::debug!("loading configuration from {}", path.display());
    let config_str = fs::read_to_string(&path)?;
    toml::from_str(&config_str)
        .map_err(|e| BlogtoolError::config(format!("{}: {}", path.display(), e)))
}
