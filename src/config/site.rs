//! Site configuration (cardpress.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::Credentials;
use crate::content::PostFormat;

/// Main configuration, read from `cardpress.yml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub url: String,

    // Directory
    pub content_dir: String,
    /// Relative to `content_dir`
    pub images_dir: String,
    pub output_dir: String,

    // Writing
    pub format: PostFormat,
    /// Characters of body copied into `Summary`; 0 disables it
    pub summary_length: usize,
    pub embed_image: bool,
    /// Remove local `.md` files that the last sync did not produce
    pub prune: bool,

    #[serde(default)]
    pub sync: SyncDefaults,
    #[serde(default)]
    pub trello: TrelloConfig,
    #[serde(default)]
    pub cardpress: WorkerConfig,
    #[serde(default)]
    pub github: GithubConfig,

    pub deploy_hook: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "CardPress".to_string(),
            url: "http://localhost:8000".to_string(),

            content_dir: "blog/content".to_string(),
            images_dir: "imgs".to_string(),
            output_dir: "blog/output".to_string(),

            format: PostFormat::Pelican,
            summary_length: 100,
            embed_image: true,
            prune: false,

            sync: SyncDefaults::default(),
            trello: TrelloConfig::default(),
            cardpress: WorkerConfig::default(),
            github: GithubConfig::default(),

            deploy_hook: None,
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config YAML {:?}", path))?;
        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Let environment values win over the YAML file
    pub fn apply_credentials(&mut self, credentials: &Credentials) {
        if let Some(board) = &credentials.board_id {
            self.trello.board_id = board.clone();
        }
        if let Some(repo) = &credentials.github_repo {
            self.github.repo = repo.clone();
        }
        if let Some(url) = &credentials.worker_url {
            self.cardpress.url = url.clone();
        }
        if let Some(hook) = &credentials.deploy_hook {
            self.deploy_hook = Some(hook.clone());
        }
        if let Some(url) = &credentials.site_url {
            self.url = url.clone();
        }
    }
}

/// Which source `sync` reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Trello,
    Cardpress,
    Github,
}

/// Where `sync` and `publish` write to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Local,
    GithubContents,
    GithubTree,
}

/// Defaults for `cardpress sync` when no flags are given
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncDefaults {
    pub source: SourceKind,
    pub target: TargetKind,
    pub deploy: bool,
}

impl Default for SyncDefaults {
    fn default() -> Self {
        Self {
            source: SourceKind::Trello,
            target: TargetKind::Local,
            deploy: false,
        }
    }
}

/// Trello board settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrelloConfig {
    pub api_base: String,
    pub board_id: String,
    /// Only cards in these lists are published
    pub allowed_lists: Vec<String>,
}

impl Default for TrelloConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.trello.com/1".to_string(),
            board_id: String::new(),
            allowed_lists: vec!["Ready to Publish".to_string(), "Published".to_string()],
        }
    }
}

/// CardPress Worker API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub url: String,
    /// Column a post must be in to be published
    pub status: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            status: "deployed".to_string(),
        }
    }
}

/// GitHub repository settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub api_base: String,
    /// `owner/repo`
    pub repo: String,
    /// Branch that receives markdown content
    pub branch: String,
    /// Branch used as parent when `branch` does not exist yet
    pub base_branch: String,
    /// Branch that receives the generated site (`publish --site`)
    pub site_branch: String,
    /// Directory of the branch holding the posts
    pub content_path: String,
    pub readme: bool,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            repo: String::new(),
            branch: "md".to_string(),
            base_branch: "main".to_string(),
            site_branch: "generated-site".to_string(),
            content_path: "content".to_string(),
            readme: true,
        }
    }
}
