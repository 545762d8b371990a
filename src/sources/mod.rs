//! Post sources: where blog posts are read from before normalization.
//!
//! Each source hands back [`SourcePost`]s, raw records that still carry
//! the source's own shape (labels, attachment URLs, an optional
//! front-matter block). Turning them into [`crate::content::Post`]s is the
//! job of [`crate::sync`], so every source is normalized the same way.
//!
//! Attachments are downloaded through the source because each API has its
//! own authentication rules (Trello wants key/token query parameters, the
//! Worker wants a bearer token).

mod cardpress;
mod github;
mod trello;

pub use cardpress::CardpressSource;
pub use github::GithubSource;
pub use trello::TrelloSource;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::config::{SiteConfig, SourceKind};
use crate::content::FrontMatter;
use crate::Cardpress;

/// A tag with an optional hex color
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub name: String,
    pub color: Option<String>,
}

impl Label {
    pub fn new(name: impl Into<String>, color: Option<&str>) -> Self {
        Self {
            name: name.into(),
            color: color.map(str::to_string),
        }
    }
}

/// An image attached to a post
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub url: String,
    /// Name to store the image under; derived from the URL when missing
    pub file_name: Option<String>,
    /// Public URL to link when the download fails
    pub fallback_url: Option<String>,
}

impl Attachment {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            file_name: None,
            fallback_url: None,
        }
    }

    /// File name to store the image under: the explicit name or the URL
    /// basename without query string
    pub fn local_name(&self) -> Option<String> {
        if let Some(name) = self.file_name.as_deref().map(str::trim) {
            if !name.is_empty() {
                return Some(name.rsplit('/').next().unwrap_or(name).to_string());
            }
        }
        let path = self.url.split(['?', '#']).next().unwrap_or_default();
        path.rsplit('/')
            .next()
            .filter(|s| !s.is_empty() && s.contains('.'))
            .map(str::to_string)
    }

    /// URL to link when the image could not be stored locally
    pub fn public_url(&self) -> &str {
        self.fallback_url.as_deref().unwrap_or(&self.url)
    }
}

/// A post as delivered by a source, before normalization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourcePost {
    /// Card id, post id or file stem
    pub id: String,
    pub title: String,
    /// Markdown body, front matter already removed
    pub body: String,
    pub front_matter: FrontMatter,
    pub labels: Vec<Label>,
    pub attachment: Option<Attachment>,
    /// Last modification reported by the source
    pub updated: Option<NaiveDate>,
}

/// Where posts come from
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostSource: Send + Sync {
    /// Human-readable name for logs and reports
    fn name(&self) -> String;

    /// Fetch every post that is ready to be published
    async fn fetch_posts(&self) -> Result<Vec<SourcePost>>;

    /// Download an attachment with this source's credentials
    async fn fetch_attachment(&self, attachment: &Attachment) -> Result<Vec<u8>>;
}

/// Build the configured source
pub async fn from_config(app: &Cardpress, kind: SourceKind) -> Result<Box<dyn PostSource>> {
    let config: &SiteConfig = &app.config;
    let source: Box<dyn PostSource> = match kind {
        SourceKind::Trello => Box::new(TrelloSource::new(&config.trello, &app.credentials)?),
        SourceKind::Cardpress => {
            Box::new(CardpressSource::login(&config.cardpress, &app.credentials).await?)
        }
        SourceKind::Github => Box::new(GithubSource::new(&config.github, &app.credentials)?),
    };
    tracing::debug!("Using source {}", source.name());
    Ok(source)
}
