//! Secrets read from the environment (never from cardpress.yml)

use crate::error::CardpressError;

/// API keys and tokens, plus the few settings that are traditionally
/// provided through `.env`
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub trello_api_key: Option<String>,
    pub trello_token: Option<String>,
    pub board_id: Option<String>,
    pub github_token: Option<String>,
    pub github_repo: Option<String>,
    pub worker_url: Option<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub deploy_hook: Option<String>,
    pub site_url: Option<String>,
}

impl Credentials {
    /// Read credentials from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through an arbitrary lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            trello_api_key: get("TRELLO_API_KEY"),
            trello_token: get("TRELLO_TOKEN"),
            board_id: get("BOARD_ID"),
            github_token: get("GITHUB_TOKEN"),
            github_repo: get("GITHUB_REPO"),
            worker_url: get("WORKER_URL"),
            admin_email: get("ADMIN_EMAIL"),
            admin_password: get("ADMIN_PASSWORD"),
            deploy_hook: get("CLOUDFLARE_DEPLOY_HOOK"),
            site_url: get("SITE_BASE_URL"),
        }
    }
}

/// Unwrap an optional credential or name the variable that is missing
pub fn require<'a>(
    value: &'a Option<String>,
    name: &'static str,
) -> Result<&'a str, CardpressError> {
    value
        .as_deref()
        .ok_or(CardpressError::MissingCredential(name))
}
