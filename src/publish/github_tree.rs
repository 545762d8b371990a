//! GitHub branch target, the whole batch as a single Git Data API commit

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Local;

use super::{Document, PublishReport, PublishTarget};
use crate::github::GithubApi;

/// Replaces the content of `branch` with the batch in one commit.
///
/// The new commit's parent is the branch head, or the head of `base_branch`
/// when `branch` does not exist yet.
pub struct GithubTreeTarget {
    client: Box<dyn GithubApi>,
    branch: String,
    base_branch: String,
}

impl GithubTreeTarget {
    pub fn new(client: Box<dyn GithubApi>, branch: String, base_branch: String) -> Self {
        Self {
            client,
            branch,
            base_branch,
        }
    }
}

pub fn commit_message() -> String {
    format!("Deploy blog: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))
}

#[async_trait]
impl PublishTarget for GithubTreeTarget {
    fn name(&self) -> String {
        format!("github-tree:{}@{}", self.client.repo(), self.branch)
    }

    async fn publish(&self, documents: &[Document]) -> Result<PublishReport> {
        let head = self.client.get_ref(&self.branch).await?;
        let exists = head.is_some();
        let parent = match head {
            Some(sha) => {
                tracing::info!("Found existing {} branch", self.branch);
                sha
            }
            None => {
                let sha = self
                    .client
                    .get_ref(&self.base_branch)
                    .await?
                    .with_context(|| {
                        format!(
                            "Neither {} nor base branch {} exists",
                            self.branch, self.base_branch
                        )
                    })?;
                tracing::info!(
                    "Will create new {} branch from {}",
                    self.branch,
                    self.base_branch
                );
                sha
            }
        };

        let mut entries = Vec::with_capacity(documents.len());
        for document in documents {
            let sha = self
                .client
                .create_blob(&document.bytes)
                .await
                .with_context(|| format!("Failed to create blob for {}", document.path))?;
            tracing::debug!("Blob {} for {}", sha, document.path);
            entries.push((document.path.clone(), sha));
        }

        tracing::info!("Creating tree with {} files", entries.len());
        let tree = self.client.create_tree(&entries).await?;
        let commit = self
            .client
            .create_commit(&commit_message(), &tree, &[parent])
            .await?;

        if exists {
            self.client.update_ref(&self.branch, &commit).await?;
        } else {
            self.client.create_ref(&self.branch, &commit).await?;
        }
        tracing::info!("Deployed {} files to {} ({})", entries.len(), self.branch, commit);

        Ok(PublishReport {
            written: entries.into_iter().map(|(path, _)| path).collect(),
            deleted: Vec::new(),
            commit: Some(commit),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::MockGithubApi;

    #[test]
    fn test_commit_message_has_timestamp() {
        let message = commit_message();
        assert!(message.starts_with("Deploy blog: "));
        assert_eq!(message.len(), "Deploy blog: 2024-01-01 00:00:00".len());
    }

    fn target(client: MockGithubApi) -> GithubTreeTarget {
        GithubTreeTarget::new(Box::new(client), "site".to_string(), "main".to_string())
    }

    fn documents() -> Vec<Document> {
        vec![
            Document::text("index.html", "<p/>"),
            Document::new("imgs/a.png", vec![1u8, 2]),
        ]
    }

    fn expect_tree_and_commit(client: &mut MockGithubApi, parent: &'static str) {
        client
            .expect_create_blob()
            .times(2)
            .returning(|bytes: &[u8]| Ok(format!("blob-{}", bytes.len())));
        client
            .expect_create_tree()
            .withf(|entries: &[(String, String)]| {
                entries.to_vec()
                    == vec![
                        ("index.html".to_string(), "blob-4".to_string()),
                        ("imgs/a.png".to_string(), "blob-2".to_string()),
                    ]
            })
            .times(1)
            .returning(|_| Ok("tree-sha".to_string()));
        client
            .expect_create_commit()
            .withf(move |message: &str, tree: &str, parents: &[String]| {
                message.starts_with("Deploy blog: ")
                    && tree == "tree-sha"
                    && parents.to_vec() == vec![parent.to_string()]
            })
            .times(1)
            .returning(|_, _, _| Ok("commit-sha".to_string()));
    }

    #[tokio::test]
    async fn test_new_branch_starts_from_base_branch() {
        let mut client = MockGithubApi::new();
        client
            .expect_get_ref()
            .withf(|branch: &str| branch == "site")
            .times(1)
            .returning(|_| Ok(None));
        client
            .expect_get_ref()
            .withf(|branch: &str| branch == "main")
            .times(1)
            .returning(|_| Ok(Some("base-sha".to_string())));
        expect_tree_and_commit(&mut client, "base-sha");
        client
            .expect_create_ref()
            .withf(|branch: &str, sha: &str| branch == "site" && sha == "commit-sha")
            .times(1)
            .returning(|_, _| Ok(()));
        client.expect_update_ref().times(0);

        let report = target(client).publish(&documents()).await.unwrap();
        assert_eq!(report.written, vec!["index.html", "imgs/a.png"]);
        assert_eq!(report.commit.as_deref(), Some("commit-sha"));
        assert!(report.deleted.is_empty());
    }

    #[tokio::test]
    async fn test_existing_branch_is_moved() {
        let mut client = MockGithubApi::new();
        client
            .expect_get_ref()
            .withf(|branch: &str| branch == "site")
            .times(1)
            .returning(|_| Ok(Some("head-sha".to_string())));
        expect_tree_and_commit(&mut client, "head-sha");
        client
            .expect_update_ref()
            .withf(|branch: &str, sha: &str| branch == "site" && sha == "commit-sha")
            .times(1)
            .returning(|_, _| Ok(()));
        client.expect_create_ref().times(0);

        let report = target(client).publish(&documents()).await.unwrap();
        assert_eq!(report.commit.as_deref(), Some("commit-sha"));
    }

    #[tokio::test]
    async fn test_missing_branches_fail_before_upload() {
        let mut client = MockGithubApi::new();
        client.expect_get_ref().times(2).returning(|_| Ok(None));
        client.expect_create_blob().times(0);

        let err = target(client).publish(&documents()).await.unwrap_err();
        assert!(err.to_string().contains("Neither site nor base branch main exists"));
    }
}
