//! GitHub branch source: markdown files with metadata in one directory

use anyhow::Result;
use async_trait::async_trait;

use super::{Attachment, PostSource, SourcePost};
use crate::config::{require, Credentials, GithubConfig};
use crate::content::{metadata, FrontMatter};
use crate::error::CardpressError;
use crate::github::{ContentEntry, GithubApi, GithubClient};

pub struct GithubSource {
    client: GithubClient,
    branch: String,
    path: String,
}

impl GithubSource {
    pub fn new(config: &GithubConfig, credentials: &Credentials) -> Result<Self> {
        let token = require(&credentials.github_token, "GITHUB_TOKEN")?;
        if config.repo.is_empty() {
            return Err(CardpressError::MissingCredential("GITHUB_REPO").into());
        }
        Ok(Self {
            client: GithubClient::new(&config.api_base, &config.repo, token)?,
            branch: config.branch.clone(),
            path: config.content_path.clone(),
        })
    }
}

#[async_trait]
impl PostSource for GithubSource {
    fn name(&self) -> String {
        format!("github:{}@{}", self.client.repo(), self.branch)
    }

    async fn fetch_posts(&self) -> Result<Vec<SourcePost>> {
        let entries = self.client.list_dir(&self.path, &self.branch).await?;
        let mut posts = Vec::new();

        for entry in entries.iter().filter(|e| is_markdown_file(e)) {
            let Some(url) = entry.download_url.as_deref() else {
                continue;
            };
            let text = match self.client.download(url).await {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(e) => {
                    tracing::warn!("Failed to download {}: {}", entry.path, e);
                    continue;
                }
            };
            match file_to_post(&entry.name, url, &text) {
                Some(post) => posts.push(post),
                None => tracing::warn!("Skipping {}: no metadata header", entry.path),
            }
        }

        tracing::info!("Found {} posts in {}", posts.len(), self.name());
        Ok(posts)
    }

    async fn fetch_attachment(&self, attachment: &Attachment) -> Result<Vec<u8>> {
        self.client.download(&attachment.url).await
    }
}

fn is_markdown_file(entry: &ContentEntry) -> bool {
    entry.kind == "file" && entry.name.ends_with(".md")
}

/// A relative `image` is a file next to the post on the same branch; its
/// raw URL sits beside the post's own `download_url`
fn image_attachment(image: &str, download_url: &str) -> Option<Attachment> {
    let image = image.trim();
    if image.is_empty() || image.contains("://") || image.starts_with('/') {
        return None;
    }
    let base = download_url.split(['?', '#']).next().unwrap_or_default();
    let (dir, _) = base.rsplit_once('/')?;
    Some(Attachment {
        url: format!("{}/{}", dir, image.trim_start_matches("./")),
        file_name: image.rsplit('/').next().map(str::to_string),
        fallback_url: None,
    })
}

fn file_to_post(file_name: &str, download_url: &str, text: &str) -> Option<SourcePost> {
    let (front_matter, body) = metadata::parse(text);
    if front_matter == FrontMatter::default() {
        return None;
    }

    let stem = file_name.trim_end_matches(".md");
    let id = front_matter
        .slug
        .clone()
        .unwrap_or_else(|| stem.to_string());

    Some(SourcePost {
        id,
        title: front_matter.title.clone().unwrap_or_default(),
        body: body.trim().to_string(),
        labels: Vec::new(),
        attachment: front_matter
            .image
            .as_deref()
            .and_then(|image| image_attachment(image, download_url)),
        updated: front_matter.parse_date(),
        front_matter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "https://raw.githubusercontent.com/me/blog/md/content/post.md";

    #[test]
    fn test_file_to_post_front_matter() {
        let text = "---\ntitle: From GitHub\ndate: 2024-07-01\ntags: a, b\n---\n\nBody here\n";
        let post = file_to_post("from-github.md", RAW, text).unwrap();
        assert_eq!(post.id, "from-github");
        assert_eq!(post.title, "From GitHub");
        assert_eq!(post.body, "Body here");
        assert_eq!(post.front_matter.tags, vec!["a", "b"]);
        assert!(post.updated.is_some());
    }

    #[test]
    fn test_file_to_post_uses_slug_as_id() {
        let text = "Title: Pelican\nSlug: custom\n\nBody";
        let post = file_to_post("other.md", RAW, text).unwrap();
        assert_eq!(post.id, "custom");
    }

    #[test]
    fn test_relative_image_becomes_attachment() {
        let text = "Title: Pic\nImage: imgs/cover.png\n\n![Pic](imgs/cover.png)\n\nBody";
        let post = file_to_post("pic.md", RAW, text).unwrap();
        let attachment = post.attachment.unwrap();
        assert_eq!(
            attachment.url,
            "https://raw.githubusercontent.com/me/blog/md/content/imgs/cover.png"
        );
        assert_eq!(attachment.local_name().as_deref(), Some("cover.png"));
        assert_eq!(attachment.public_url(), attachment.url);
    }

    #[test]
    fn test_remote_image_is_kept_as_link() {
        let text = "Title: Pic\nImage: https://cdn.example/cover.png\n\nBody";
        let post = file_to_post("pic.md", RAW, text).unwrap();
        assert!(post.attachment.is_none());
        assert_eq!(
            post.front_matter.image.as_deref(),
            Some("https://cdn.example/cover.png")
        );
    }

    #[test]
    fn test_file_without_metadata_is_skipped() {
        assert!(file_to_post("readme.md", RAW, "# Just markdown").is_none());
    }

    #[test]
    fn test_markdown_entries_only() {
        let entries: Vec<ContentEntry> = serde_json::from_str(
            r#"[{"name":"a.md","path":"content/a.md","sha":"1","type":"file","download_url":"u"},
                {"name":"imgs","path":"content/imgs","sha":"2","type":"dir","download_url":null},
                {"name":"b.txt","path":"content/b.txt","sha":"3","type":"file","download_url":"u"}]"#,
        )
        .unwrap();
        let names: Vec<_> = entries
            .iter()
            .filter(|e| is_markdown_file(e))
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["a.md"]);
    }
}
