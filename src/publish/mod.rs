//! Publish targets: where rendered documents are written

mod deploy_hook;
mod github_contents;
mod github_tree;
mod local;

pub use deploy_hook::{DeployHook, DeployOutcome};
pub use github_contents::GithubContentsTarget;
pub use github_tree::GithubTreeTarget;
pub use local::LocalTarget;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::config::{require, TargetKind};
use crate::error::CardpressError;
use crate::github::GithubClient;
use crate::Cardpress;

/// A file to publish, addressed by its path relative to the target root
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// `/` separated, no leading slash
    pub path: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            bytes: bytes.into(),
        }
    }

    pub fn text(path: impl Into<String>, text: &str) -> Self {
        Self::new(path, text.as_bytes().to_vec())
    }
}

/// What a target did with a batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublishReport {
    pub written: Vec<String>,
    pub deleted: Vec<String>,
    /// Commit created on the target branch, when there is one
    pub commit: Option<String>,
}

/// Where documents go
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PublishTarget: Send + Sync {
    /// Human-readable name for logs and reports
    fn name(&self) -> String;

    /// Write a batch of documents
    async fn publish(&self, documents: &[Document]) -> Result<PublishReport>;
}

/// Join a directory prefix and a relative path with `/`
pub fn join_path(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_matches('/');
    let path = path.trim_start_matches('/');
    if prefix.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", prefix, path)
    }
}

/// Read every file under `dir` as a document at `prefix/<relative path>`
pub fn collect_documents(dir: &Path, prefix: &str) -> Result<Vec<Document>> {
    if !dir.is_dir() {
        return Err(anyhow::anyhow!("Directory {:?} does not exist", dir));
    }

    let mut documents = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let relative = path.strip_prefix(dir).unwrap_or(path);
        if relative
            .components()
            .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
        {
            continue;
        }
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        let bytes = fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
        documents.push(Document::new(join_path(prefix, &relative), bytes));
    }
    Ok(documents)
}

/// Build the configured target
pub fn from_config(
    app: &Cardpress,
    kind: TargetKind,
    branch: Option<&str>,
) -> Result<Box<dyn PublishTarget>> {
    let config = &app.config.github;
    let target: Box<dyn PublishTarget> = match kind {
        TargetKind::Local => Box::new(LocalTarget::new(&app.content_dir, app.config.prune)),
        TargetKind::GithubContents | TargetKind::GithubTree => {
            let token = require(&app.credentials.github_token, "GITHUB_TOKEN")?;
            if config.repo.is_empty() {
                return Err(CardpressError::MissingCredential("GITHUB_REPO").into());
            }
            let client = Box::new(GithubClient::new(&config.api_base, &config.repo, token)?);
            let branch = branch.unwrap_or(&config.branch).to_string();
            if kind == TargetKind::GithubContents {
                Box::new(GithubContentsTarget::new(client, branch, config.readme))
            } else {
                Box::new(GithubTreeTarget::new(
                    client,
                    branch,
                    config.base_branch.clone(),
                ))
            }
        }
    };
    tracing::debug!("Using target {}", target.name());
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("content", "a.md"), "content/a.md");
        assert_eq!(join_path("/content/", "/imgs/b.png"), "content/imgs/b.png");
        assert_eq!(join_path("", "index.html"), "index.html");
    }

    #[test]
    fn test_collect_documents() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("b.md"), "bee").unwrap();
        fs::create_dir_all(temp.path().join("imgs")).unwrap();
        fs::write(temp.path().join("imgs").join("a.png"), [1u8, 2, 3]).unwrap();
        fs::write(temp.path().join(".DS_Store"), "junk").unwrap();

        let documents = collect_documents(temp.path(), "content").unwrap();
        let paths: Vec<_> = documents.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["content/b.md", "content/imgs/a.png"]);
        assert_eq!(documents[1].bytes, vec![1, 2, 3]);
    }

    #[test]
    fn test_collect_missing_dir() {
        let temp = TempDir::new().unwrap();
        assert!(collect_documents(&temp.path().join("nope"), "").is_err());
    }
}
