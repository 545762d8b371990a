//! cardpress: sync blog posts from Trello, the CardPress Worker API or a
//! GitHub branch into Pelican-ready markdown, and publish them.
//!
//! The pipeline lives in [`sync`]; sources and targets are behind the
//! [`sources::PostSource`] and [`publish::PublishTarget`] traits.

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod github;
pub mod http;
pub mod images;
pub mod publish;
pub mod sources;
pub mod sync;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Name of the configuration file in the base directory
pub const CONFIG_FILE: &str = "cardpress.yml";

/// The main cardpress application
#[derive(Debug, Clone)]
pub struct Cardpress {
    /// Site configuration, with environment overrides applied
    pub config: config::SiteConfig,
    pub credentials: config::Credentials,
    /// Base directory
    pub base_dir: PathBuf,
    /// Markdown posts
    pub content_dir: PathBuf,
    /// Post images (inside the content directory)
    pub images_dir: PathBuf,
    /// Generated site
    pub output_dir: PathBuf,
}

impl Cardpress {
    /// Load `.env` and `cardpress.yml` from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();

        let env_path = base_dir.join(".env");
        if env_path.exists() {
            dotenvy::from_path(&env_path)?;
            tracing::debug!("Loaded environment from {:?}", env_path);
        }

        let config_path = base_dir.join(CONFIG_FILE);
        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        let credentials = config::Credentials::from_env();
        config.apply_credentials(&credentials);

        Ok(Self::with_config(base_dir, config, credentials))
    }

    /// Build from an explicit configuration, resolving directories
    /// against `base_dir`
    pub fn with_config(
        base_dir: PathBuf,
        config: config::SiteConfig,
        credentials: config::Credentials,
    ) -> Self {
        let content_dir = base_dir.join(&config.content_dir);
        let images_dir = content_dir.join(&config.images_dir);
        let output_dir = base_dir.join(&config.output_dir);

        Self {
            config,
            credentials,
            base_dir,
            content_dir,
            images_dir,
            output_dir,
        }
    }

    /// Load posts from the content directory
    pub fn load_posts(&self) -> Result<Vec<content::Post>> {
        content::ContentLoader::new(&self.content_dir).load_posts()
    }
}
