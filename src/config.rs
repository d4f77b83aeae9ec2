use anyhow::{Context, Result, bail};
use std::path::PathBuf;

/// Rows per list page used by every Learnify list view.
pub const DEFAULT_PAGE_SIZE: usize = 6;

const BOOKMARKS_FILE: &str = "bookmarks.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub page_size: usize,
    pub data_dir: PathBuf,
    pub default_user: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            data_dir: PathBuf::from(".learnify"),
            default_user: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let page_size = match lookup("LEARNIFY_PAGE_SIZE") {
            Some(raw) => parse_page_size(&raw).context("LEARNIFY_PAGE_SIZE must be a positive integer")?,
            None => defaults.page_size,
        };

        let data_dir = lookup("LEARNIFY_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let default_user = lookup("LEARNIFY_USER")
            .map(|user| user.trim().to_string())
            .filter(|user| !user.is_empty());

        Ok(Self {
            page_size,
            data_dir,
            default_user,
        })
    }

    pub fn bookmarks_path(&self) -> PathBuf {
        self.data_dir.join(BOOKMARKS_FILE)
    }
}

pub fn parse_page_size(raw: &str) -> Result<usize> {
    let page_size = raw
        .trim()
        .parse::<usize>()
        .with_context(|| format!("'{raw}' is not a number"))?;
    if page_size == 0 {
        bail!("page size must be greater than zero");
    }
    Ok(page_size)
}
