//! Post images: storing attachments next to the content and fixing
//! references in generated HTML

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::publish::{join_path, Document};
use crate::sources::{Attachment, PostSource};

lazy_static! {
    /// A bare file name (optionally under `imgs/`) with an image extension
    static ref BARE_IMAGE_SRC: Regex =
        Regex::new(r#"(?i)src="(?:imgs/)?([\w\-]+\.(?:png|jpe?g|gif|webp|svg))""#).unwrap();
}

/// Where a post's image ended up
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedImage {
    /// Value for the `Image` metadata and the embedded markdown link
    pub reference: String,
    /// The downloaded file, to publish with the posts
    pub document: Option<Document>,
    /// Why the image is linked remotely instead of stored
    pub error: Option<String>,
}

impl ResolvedImage {
    fn remote(attachment: &Attachment, error: String) -> Self {
        Self {
            reference: attachment.public_url().to_string(),
            document: None,
            error: Some(error),
        }
    }
}

/// Downloads attachments through their source and stores them under
/// `images_dir` (relative to the content root)
#[derive(Debug, Clone)]
pub struct ImageResolver {
    images_dir: String,
}

impl ImageResolver {
    pub fn new(images_dir: impl Into<String>) -> Self {
        Self {
            images_dir: images_dir.into(),
        }
    }

    pub async fn resolve(&self, source: &dyn PostSource, attachment: &Attachment) -> ResolvedImage {
        let Some(name) = attachment.local_name() else {
            tracing::warn!("No file name for {}, linking it directly", attachment.url);
            return ResolvedImage::remote(attachment, "no file name in URL".to_string());
        };

        match source.fetch_attachment(attachment).await {
            Ok(bytes) => {
                let path = join_path(&self.images_dir, &name);
                tracing::info!("Downloaded {} -> {}", attachment.url, path);
                ResolvedImage {
                    reference: path.clone(),
                    document: Some(Document::new(path, bytes)),
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!("Failed to download {}: {}", attachment.url, e);
                ResolvedImage::remote(attachment, e.to_string())
            }
        }
    }
}

/// Point bare image names at `/imgs/`. Returns the rewritten text when
/// anything changed.
pub fn fix_html(html: &str) -> Option<String> {
    let fixed = BARE_IMAGE_SRC.replace_all(html, r#"src="/imgs/$1""#);
    if fixed == html {
        None
    } else {
        Some(fixed.into_owned())
    }
}

/// Rewrite every `.html` file under `dir`; returns the number of files changed
pub fn fix_image_paths(dir: &Path) -> Result<usize> {
    let mut changed = 0;
    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        let is_html = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("html"))
            .unwrap_or(false);
        if !path.is_file() || !is_html {
            continue;
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Error processing {:?}: {}", path, e);
                continue;
            }
        };
        if let Some(fixed) = fix_html(&content) {
            fs::write(path, fixed).with_context(|| format!("Failed to write {:?}", path))?;
            tracing::debug!("Fixed image paths in {:?}", path);
            changed += 1;
        }
    }
    Ok(changed)
}
