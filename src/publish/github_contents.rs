//! GitHub branch target, one Contents API commit per file

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashSet;

use super::{Document, PublishReport, PublishTarget};
use crate::github::{GithubApi, TreeEntry};

pub const UPDATE_MESSAGE: &str = "Auto-deploy: Update markdown content";
pub const REMOVE_MESSAGE: &str = "Auto-deploy: Remove outdated files";

const README_PATH: &str = "README.md";

/// Contents of the README kept at the root of the content branch
pub fn readme(content_path: &str) -> String {
    format!(
        "# Markdown Content Branch\n\n\
         This branch contains only the generated markdown files for deployment.\n\n\
         - `{0}/` - Blog post markdown files\n\
         - `{0}/imgs/` - Associated images\n\n\
         This branch is automatically updated by cardpress.\n",
        content_path.trim_matches('/')
    )
}

/// Blobs on the branch that the batch no longer contains
pub fn stale_entries<'a>(existing: &'a [TreeEntry], keep: &HashSet<&str>) -> Vec<&'a TreeEntry> {
    existing
        .iter()
        .filter(|e| !keep.contains(e.path.as_str()))
        .collect()
}

pub struct GithubContentsTarget {
    client: Box<dyn GithubApi>,
    branch: String,
    readme: bool,
}

impl GithubContentsTarget {
    pub fn new(client: Box<dyn GithubApi>, branch: String, readme: bool) -> Self {
        Self {
            client,
            branch,
            readme,
        }
    }

    async fn upload(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let sha = self.client.get_content_sha(path, &self.branch).await?;
        self.client
            .put_content(path, bytes, UPDATE_MESSAGE, &self.branch, sha)
            .await
    }
}

#[async_trait]
impl PublishTarget for GithubContentsTarget {
    fn name(&self) -> String {
        format!("github-contents:{}@{}", self.client.repo(), self.branch)
    }

    async fn publish(&self, documents: &[Document]) -> Result<PublishReport> {
        let existing = self.client.list_tree(&self.branch).await?;

        let mut report = PublishReport::default();
        for document in documents {
            self.upload(&document.path, &document.bytes)
                .await
                .with_context(|| format!("Failed to upload {}", document.path))?;
            tracing::info!("Uploaded {}", document.path);
            report.written.push(document.path.clone());
        }

        if self.readme {
            // Describe the directory that holds the posts, `content` when unknown
            let content_dir = documents
                .iter()
                .find_map(|d| d.path.split_once('/').map(|(dir, _)| dir))
                .unwrap_or("content");
            self.upload(README_PATH, readme(content_dir).as_bytes())
                .await
                .context("Failed to update README.md")?;
            report.written.push(README_PATH.to_string());
        }

        let keep: HashSet<&str> = report.written.iter().map(String::as_str).collect();
        for entry in stale_entries(&existing, &keep) {
            match self
                .client
                .delete_content(&entry.path, &entry.sha, REMOVE_MESSAGE, &self.branch)
                .await
            {
                Ok(()) => {
                    tracing::info!("Deleted {}", entry.path);
                    report.deleted.push(entry.path.clone());
                }
                Err(e) => tracing::warn!("Failed to delete {}: {}", entry.path, e),
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::MockGithubApi;

    #[test]
    fn test_readme_mentions_content_dir() {
        let text = readme("/posts/");
        assert!(text.starts_with("# Markdown Content Branch"));
        assert!(text.contains("- `posts/` - Blog post markdown files"));
        assert!(text.contains("- `posts/imgs/` - Associated images"));
    }

    fn blob(path: &str) -> TreeEntry {
        TreeEntry {
            path: path.to_string(),
            sha: format!("sha-{}", path),
            kind: "blob".to_string(),
        }
    }

    #[test]
    fn test_stale_entries() {
        let existing = vec![blob("README.md"), blob("content/a.md"), blob("content/old.md")];
        let keep: HashSet<&str> = ["README.md", "content/a.md"].into_iter().collect();
        let stale = stale_entries(&existing, &keep);
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].path, "content/old.md");
        assert_eq!(stale[0].sha, "sha-content/old.md");
    }

    fn target(client: MockGithubApi) -> GithubContentsTarget {
        GithubContentsTarget::new(Box::new(client), "md".to_string(), true)
    }

    #[tokio::test]
    async fn test_failed_upload_aborts_before_cleanup() {
        let mut client = MockGithubApi::new();
        client
            .expect_list_tree()
            .returning(|_| Ok(vec![blob("content/old.md")]));
        client.expect_get_content_sha().returning(|_, _| Ok(None));
        client
            .expect_put_content()
            .withf(|path: &str, _: &[u8], _: &str, _: &str, _: &Option<String>| {
                path == "content/a.md"
            })
            .times(1)
            .returning(|_, _, _, _, _| Err(anyhow::anyhow!("422 Unprocessable Entity")));
        client.expect_delete_content().times(0);

        let documents = vec![
            Document::text("content/a.md", "a"),
            Document::text("content/b.md", "b"),
        ];
        let err = target(client).publish(&documents).await.unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to upload content/a.md"));
    }

    #[tokio::test]
    async fn test_publish_writes_readme_and_tolerates_failed_delete() {
        let mut client = MockGithubApi::new();
        client
            .expect_list_tree()
            .withf(|branch: &str| branch == "md")
            .returning(|_| {
                Ok(vec![
                    blob("README.md"),
                    blob("content/a.md"),
                    blob("content/old.md"),
                    blob("content/locked.md"),
                ])
            });
        client
            .expect_get_content_sha()
            .returning(|path: &str, _: &str| Ok(Some(format!("sha-{}", path))));
        client
            .expect_put_content()
            .withf(|path: &str, bytes: &[u8], message: &str, branch: &str, sha: &Option<String>| {
                let readme_ok = path != README_PATH
                    || String::from_utf8_lossy(bytes).contains("- `content/` - Blog post");
                readme_ok
                    && message == UPDATE_MESSAGE
                    && branch == "md"
                    && sha.as_deref() == Some(format!("sha-{}", path).as_str())
            })
            .times(2)
            .returning(|_, _, _, _, _| Ok(()));
        client
            .expect_delete_content()
            .withf(|path: &str, sha: &str, message: &str, _: &str| {
                path == "content/old.md" && sha == "sha-content/old.md" && message == REMOVE_MESSAGE
            })
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        client
            .expect_delete_content()
            .withf(|path: &str, _: &str, _: &str, _: &str| path == "content/locked.md")
            .times(1)
            .returning(|_, _, _, _| Err(anyhow::anyhow!("409 Conflict")));

        let report = target(client)
            .publish(&[Document::text("content/a.md", "a")])
            .await
            .unwrap();
        assert_eq!(report.written, vec!["content/a.md", "README.md"]);
        assert_eq!(report.deleted, vec!["content/old.md"]);
    }
}
