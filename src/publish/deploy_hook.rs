//! Deploy hook (Cloudflare Pages style): an empty POST that starts a build

use anyhow::Result;
use reqwest::header::HeaderMap;

use crate::http::{build_client, check_response};

/// Result of triggering the hook
#[derive(Debug, Clone, PartialEq)]
pub enum DeployOutcome {
    Triggered,
    /// No hook configured
    Skipped,
    Failed(String),
}

pub struct DeployHook {
    client: reqwest::Client,
    url: String,
}

impl DeployHook {
    pub fn new(url: &str) -> Result<Self> {
        Ok(Self {
            client: build_client(HeaderMap::new())?,
            url: url.to_string(),
        })
    }

    /// Trigger the hook if one is configured
    pub async fn trigger_optional(url: Option<&str>) -> DeployOutcome {
        let Some(url) = url.filter(|u| !u.trim().is_empty()) else {
            tracing::info!("No deploy hook configured, skipping");
            return DeployOutcome::Skipped;
        };
        match DeployHook::new(url) {
            Ok(hook) => hook.trigger().await,
            Err(e) => DeployOutcome::Failed(e.to_string()),
        }
    }

    /// POST to the hook; failures are reported, not raised
    pub async fn trigger(&self) -> DeployOutcome {
        tracing::info!("Triggering deployment");
        let result = async {
            let response = self.client.post(&self.url).send().await?;
            check_response(response, "Deploy hook").await?;
            Ok::<_, anyhow::Error>(())
        }
        .await;

        match result {
            Ok(()) => {
                tracing::info!("Deployment triggered");
                DeployOutcome::Triggered
            }
            Err(e) => {
                tracing::warn!("Failed to trigger deployment: {}", e);
                DeployOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_hook_is_skipped() {
        assert_eq!(DeployHook::trigger_optional(None).await, DeployOutcome::Skipped);
        assert_eq!(
            DeployHook::trigger_optional(Some("  ")).await,
            DeployOutcome::Skipped
        );
    }

    #[tokio::test]
    async fn test_unreachable_hook_fails_softly() {
        let hook = DeployHook::new("http://127.0.0.1:1/hook").unwrap();
        assert!(matches!(hook.trigger().await, DeployOutcome::Failed(_)));
    }
}
