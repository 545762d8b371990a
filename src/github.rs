//! Thin client for the GitHub Contents and Git Data REST APIs

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use crate::error::CardpressError;
use crate::http::{build_client, check_response, header_value};

const SERVICE: &str = "GitHub";

/// Characters escaped inside one path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/');

/// Encode a repository path segment by segment
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| utf8_percent_encode(s, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// One entry of a contents directory listing
#[derive(Debug, Clone, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    pub path: String,
    pub sha: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub download_url: Option<String>,
}

/// One entry of a recursive tree listing
#[derive(Debug, Clone, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    pub sha: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
struct TreeListing {
    #[serde(default)]
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct RefObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct RefResponse {
    object: RefObject,
}

#[derive(Debug, Deserialize)]
struct ShaResponse {
    sha: String,
}

/// The GitHub operations the publish targets rely on
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GithubApi: Send + Sync {
    /// `owner/repo` the client is bound to
    fn repo(&self) -> String;

    /// Head commit of a branch, `None` when the branch does not exist
    async fn get_ref(&self, branch: &str) -> Result<Option<String>>;

    /// Blob SHA of an existing file, `None` when it does not exist
    async fn get_content_sha(&self, path: &str, branch: &str) -> Result<Option<String>>;

    /// Create or update one file, `sha` is required when it already exists
    async fn put_content(
        &self,
        path: &str,
        bytes: &[u8],
        message: &str,
        branch: &str,
        sha: Option<String>,
    ) -> Result<()>;

    async fn delete_content(&self, path: &str, sha: &str, message: &str, branch: &str)
        -> Result<()>;

    /// All blobs of a branch, empty when the branch does not exist
    async fn list_tree(&self, branch: &str) -> Result<Vec<TreeEntry>>;

    async fn create_blob(&self, bytes: &[u8]) -> Result<String>;

    /// Create a tree from `(path, blob_sha)` pairs
    async fn create_tree(&self, entries: &[(String, String)]) -> Result<String>;

    async fn create_commit(&self, message: &str, tree: &str, parents: &[String])
        -> Result<String>;

    /// Move an existing branch to `sha`
    async fn update_ref(&self, branch: &str, sha: &str) -> Result<()>;

    async fn create_ref(&self, branch: &str, sha: &str) -> Result<()>;
}

/// Authenticated client bound to one `owner/repo`
#[derive(Debug, Clone)]
pub struct GithubClient {
    client: reqwest::Client,
    api_base: String,
    repo: String,
}

impl GithubClient {
    pub fn new(api_base: &str, repo: &str, token: &str) -> Result<Self> {
        if repo.split('/').filter(|s| !s.is_empty()).count() != 2 {
            return Err(CardpressError::InvalidConfig(format!(
                "GitHub repository must be owner/repo, got {:?}",
                repo
            ))
            .into());
        }

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, header_value(&format!("token {}", token))?);
        headers.insert(ACCEPT, header_value("application/vnd.github.v3+json")?);

        Ok(Self {
            client: build_client(headers)?,
            api_base: api_base.trim_end_matches('/').to_string(),
            repo: repo.to_string(),
        })
    }

    fn url(&self, tail: &str) -> String {
        format!("{}/repos/{}/{}", self.api_base, self.repo, tail)
    }

    fn contents_url(&self, path: &str) -> String {
        self.url(&format!("contents/{}", encode_path(path)))
    }

    /// Entries of one directory
    pub async fn list_dir(&self, path: &str, branch: &str) -> Result<Vec<ContentEntry>> {
        let response = self
            .client
            .get(self.contents_url(path))
            .query(&[("ref", branch)])
            .send()
            .await
            .with_context(|| format!("Failed to list {}", path))?;
        let response = check_response(response, SERVICE).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse listing of {}", path))
    }

    /// Download raw bytes (a `download_url`, authenticated for private repos)
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to download {}", url))?;
        let response = check_response(response, SERVICE).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn post_for_sha(&self, tail: &str, body: &serde_json::Value) -> Result<String> {
        let response = self
            .client
            .post(self.url(tail))
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to POST {}", tail))?;
        let response = check_response(response, SERVICE).await?;
        let value: serde_json::Value = response.json().await?;
        // `git/refs` answers with the ref object, the others with a top-level sha
        value
            .get("sha")
            .or_else(|| value.get("object").and_then(|o| o.get("sha")))
            .and_then(|s| s.as_str())
            .map(str::to_string)
            .with_context(|| format!("No sha in response to {}", tail))
    }
}

#[async_trait]
impl GithubApi for GithubClient {
    fn repo(&self) -> String {
        self.repo.clone()
    }

    async fn get_ref(&self, branch: &str) -> Result<Option<String>> {
        let url = self.url(&format!("git/refs/heads/{}", encode_path(branch)));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch ref {}", branch))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_response(response, SERVICE).await?;
        let reference: RefResponse = response.json().await.context("Failed to parse ref")?;
        Ok(Some(reference.object.sha))
    }

    async fn get_content_sha(&self, path: &str, branch: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(self.contents_url(path))
            .query(&[("ref", branch)])
            .send()
            .await
            .with_context(|| format!("Failed to look up {}", path))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_response(response, SERVICE).await?;
        let existing: ShaResponse = response.json().await.context("Failed to parse content")?;
        Ok(Some(existing.sha))
    }

    async fn put_content(
        &self,
        path: &str,
        bytes: &[u8],
        message: &str,
        branch: &str,
        sha: Option<String>,
    ) -> Result<()> {
        let mut body = json!({
            "message": message,
            "content": base64::engine::general_purpose::STANDARD.encode(bytes),
            "branch": branch,
        });
        if let Some(sha) = sha {
            body["sha"] = json!(sha);
        }

        let response = self
            .client
            .put(self.contents_url(path))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to upload {}", path))?;
        check_response(response, SERVICE).await?;
        Ok(())
    }

    async fn delete_content(
        &self,
        path: &str,
        sha: &str,
        message: &str,
        branch: &str,
    ) -> Result<()> {
        let body = json!({
            "message": message,
            "sha": sha,
            "branch": branch,
        });
        let response = self
            .client
            .delete(self.contents_url(path))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to delete {}", path))?;
        check_response(response, SERVICE).await?;
        Ok(())
    }

    async fn list_tree(&self, branch: &str) -> Result<Vec<TreeEntry>> {
        let url = self.url(&format!("git/trees/{}", encode_path(branch)));
        let response = self
            .client
            .get(&url)
            .query(&[("recursive", "1")])
            .send()
            .await
            .with_context(|| format!("Failed to list tree of {}", branch))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let response = check_response(response, SERVICE).await?;
        let listing: TreeListing = response.json().await.context("Failed to parse tree")?;
        if listing.truncated {
            tracing::warn!("Tree listing of {} is truncated", branch);
        }
        Ok(listing
            .tree
            .into_iter()
            .filter(|e| e.kind == "blob")
            .collect())
    }

    async fn create_blob(&self, bytes: &[u8]) -> Result<String> {
        let body = json!({
            "content": base64::engine::general_purpose::STANDARD.encode(bytes),
            "encoding": "base64",
        });
        self.post_for_sha("git/blobs", &body).await
    }

    async fn create_tree(&self, entries: &[(String, String)]) -> Result<String> {
        let tree: Vec<_> = entries
            .iter()
            .map(|(path, sha)| {
                json!({
                    "path": path,
                    "mode": "100644",
                    "type": "blob",
                    "sha": sha,
                })
            })
            .collect();
        self.post_for_sha("git/trees", &json!({ "tree": tree })).await
    }

    async fn create_commit(&self, message: &str, tree: &str, parents: &[String]) -> Result<String> {
        let body = json!({
            "message": message,
            "tree": tree,
            "parents": parents,
        });
        self.post_for_sha("git/commits", &body).await
    }

    async fn update_ref(&self, branch: &str, sha: &str) -> Result<()> {
        let url = self.url(&format!("git/refs/heads/{}", encode_path(branch)));
        let response = self
            .client
            .patch(&url)
            .json(&json!({ "sha": sha }))
            .send()
            .await
            .with_context(|| format!("Failed to update ref {}", branch))?;
        check_response(response, SERVICE).await?;
        Ok(())
    }

    async fn create_ref(&self, branch: &str, sha: &str) -> Result<()> {
        let body = json!({
            "ref": format!("refs/heads/{}", branch),
            "sha": sha,
        });
        self.post_for_sha("git/refs", &body).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_path() {
        assert_eq!(encode_path("content/hello world.md"), "content/hello%20world.md");
        assert_eq!(encode_path("/content//a#b.md"), "content/a%23b.md");
        assert_eq!(encode_path("imgs/ünï.png"), "imgs/%C3%BCn%C3%AF.png");
    }

    #[test]
    fn test_urls() {
        let client = GithubClient::new("https://api.github.com/", "me/blog", "t").unwrap();
        assert_eq!(
            client.contents_url("content/a b.md"),
            "https://api.github.com/repos/me/blog/contents/content/a%20b.md"
        );
        assert_eq!(client.repo(), "me/blog");
    }

    #[test]
    fn test_repo_must_be_owner_slash_name() {
        assert!(GithubClient::new("https://api.github.com", "blog", "t").is_err());
    }

    #[test]
    fn test_parse_listing() {
        let json = r#"[{"name":"a.md","path":"content/a.md","sha":"1","type":"file",
            "download_url":"https://raw.example/a.md"},
            {"name":"imgs","path":"content/imgs","sha":"2","type":"dir","download_url":null}]"#;
        let entries: Vec<ContentEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries[0].kind, "file");
        assert!(entries[1].download_url.is_none());
    }
}
