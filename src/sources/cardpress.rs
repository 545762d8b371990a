//! CardPress Worker API source

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{Attachment, Label, PostSource, SourcePost};
use crate::config::{require, Credentials, WorkerConfig};
use crate::content::{colors, parse_date_string, FrontMatter};
use crate::error::CardpressError;
use crate::http::{build_client, check_response, header_value};

const SERVICE: &str = "CardPress";

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WorkerPost {
    #[serde(default)]
    id: Value,
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    labels: Value,
    colors: Option<String>,
    image_url: Option<String>,
    image_path: Option<String>,
    updated_at: Option<String>,
    column_status: Option<String>,
    status: Option<String>,
}

/// Posts of the CardPress admin, read through its Worker API
#[derive(Debug)]
pub struct CardpressSource {
    client: reqwest::Client,
    base_url: String,
    status: String,
}

impl CardpressSource {
    /// Log in with the admin account and keep the bearer token
    pub async fn login(config: &WorkerConfig, credentials: &Credentials) -> Result<Self> {
        if config.url.is_empty() {
            return Err(CardpressError::MissingCredential("WORKER_URL").into());
        }
        let email = require(&credentials.admin_email, "ADMIN_EMAIL")?;
        let password = require(&credentials.admin_password, "ADMIN_PASSWORD")?;
        let base_url = config.url.trim_end_matches('/').to_string();

        let response = build_client(HeaderMap::new())?
            .post(format!("{}/auth/login", base_url))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .context("Failed to reach CardPress login")?;
        let response = match check_response(response, SERVICE).await {
            Ok(response) => response,
            Err(e) if e.is_status(StatusCode::UNAUTHORIZED) => {
                return Err(
                    anyhow::Error::new(e).context("CardPress rejected ADMIN_EMAIL/ADMIN_PASSWORD")
                );
            }
            Err(e) => return Err(e.into()),
        };
        let login: LoginResponse = response
            .json()
            .await
            .context("Failed to parse CardPress login response")?;
        let token = login_token(login)?;
        tracing::info!("Authenticated with CardPress at {}", base_url);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", token))?);

        Ok(Self {
            client: build_client(headers)?,
            base_url,
            status: config.status.clone(),
        })
    }
}

#[async_trait]
impl PostSource for CardpressSource {
    fn name(&self) -> String {
        format!("cardpress:{}", self.base_url)
    }

    async fn fetch_posts(&self) -> Result<Vec<SourcePost>> {
        let response = self
            .client
            .get(format!("{}/posts", self.base_url))
            .send()
            .await
            .context("Failed to fetch CardPress posts")?;
        let response = check_response(response, SERVICE).await?;
        let posts: Vec<WorkerPost> = response
            .json()
            .await
            .context("Failed to parse CardPress posts")?;
        let total = posts.len();

        let posts: Vec<SourcePost> = posts
            .into_iter()
            .filter(|p| is_publishable(p, &self.status))
            .map(|p| worker_post_to_post(p, &self.base_url))
            .collect();
        tracing::info!("Found {} {} posts out of {}", posts.len(), self.status, total);
        Ok(posts)
    }

    async fn fetch_attachment(&self, attachment: &Attachment) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(&attachment.url)
            .send()
            .await
            .with_context(|| format!("Failed to download {}", attachment.url))?;
        let response = check_response(response, SERVICE).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

fn login_token(login: LoginResponse) -> Result<String> {
    login
        .token
        .filter(|t| !t.is_empty())
        .context("CardPress login succeeded but returned no token")
}

/// The board column wins over the legacy `status` field
fn is_publishable(post: &WorkerPost, status: &str) -> bool {
    post.column_status.as_deref().or(post.status.as_deref()) == Some(status)
}

/// `labels` is stored as a JSON-encoded string by the Worker, older rows
/// return a plain array
fn parse_labels(value: &Value) -> Vec<String> {
    let items = match value {
        Value::Array(items) => items.clone(),
        Value::String(s) => match serde_json::from_str::<Vec<Value>>(s) {
            Ok(items) => items,
            Err(_) => return colors::split_list(s),
        },
        _ => Vec::new(),
    };
    items
        .iter()
        .filter_map(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn id_string(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        Value::Null => "unknown".to_string(),
        other => other.to_string(),
    }
}

fn worker_post_to_post(post: WorkerPost, base_url: &str) -> SourcePost {
    let id = id_string(&post.id);

    // The content may carry its own front matter when it was imported from GitHub
    let content = post.content.unwrap_or_default();
    let (mut front_matter, body) = FrontMatter::parse(&content);
    let body = body.to_string();

    if front_matter.colors.is_empty() {
        front_matter.colors = post
            .colors
            .as_deref()
            .map(colors::split_list)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(colors::default_palette);
    }

    let image_url = post.image_url.filter(|u| !u.trim().is_empty());
    let attachment = match post.image_path.filter(|p| !p.trim().is_empty()) {
        Some(path) => Some(Attachment {
            url: format!("{}/images/{}", base_url, path.trim_start_matches('/')),
            file_name: path.rsplit('/').next().map(str::to_string),
            fallback_url: image_url,
        }),
        None => image_url.map(Attachment::new),
    };

    SourcePost {
        title: post.title.unwrap_or_default(),
        body,
        front_matter,
        labels: parse_labels(&post.labels)
            .into_iter()
            .map(|name| Label::new(name, None))
            .collect(),
        attachment,
        updated: post.updated_at.as_deref().and_then(parse_date_string),
        id,
    }
}
