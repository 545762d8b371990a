//! Trello board source

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use std::collections::HashMap;

use super::{Attachment, Label, PostSource, SourcePost};
use crate::config::{require, Credentials, TrelloConfig};
use crate::content::{colors, parse_date_string, FrontMatter};
use crate::http::{build_client, check_response};

const SERVICE: &str = "Trello";

#[derive(Debug, Deserialize)]
struct Card {
    id: String,
    name: String,
    #[serde(default)]
    desc: String,
    #[serde(rename = "idList")]
    id_list: String,
    #[serde(default)]
    labels: Vec<CardLabel>,
    #[serde(default)]
    attachments: Vec<CardAttachment>,
    #[serde(rename = "dateLastActivity")]
    date_last_activity: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CardLabel {
    #[serde(default)]
    name: String,
    color: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CardAttachment {
    url: String,
}

#[derive(Debug, Deserialize)]
struct BoardList {
    id: String,
    name: String,
}

/// Reads cards of one board, keeping the ones in publishable lists
pub struct TrelloSource {
    client: reqwest::Client,
    api_base: String,
    board_id: String,
    key: String,
    token: String,
    allowed_lists: Vec<String>,
}

impl TrelloSource {
    pub fn new(config: &TrelloConfig, credentials: &Credentials) -> Result<Self> {
        let key = require(&credentials.trello_api_key, "TRELLO_API_KEY")?.to_string();
        let token = require(&credentials.trello_token, "TRELLO_TOKEN")?.to_string();
        if config.board_id.is_empty() {
            return Err(crate::error::CardpressError::MissingCredential("BOARD_ID").into());
        }

        Ok(Self {
            client: build_client(HeaderMap::new())?,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            board_id: config.board_id.clone(),
            key,
            token,
            allowed_lists: config.allowed_lists.clone(),
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, tail: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/boards/{}/{}", self.api_base, self.board_id, tail);
        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("key", self.key.as_str()), ("token", self.token.as_str())])
            .send()
            .await
            .with_context(|| format!("Failed to fetch Trello {}", tail))?;
        let response = check_response(response, SERVICE).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse Trello {}", tail))
    }
}

#[async_trait]
impl PostSource for TrelloSource {
    fn name(&self) -> String {
        format!("trello:{}", self.board_id)
    }

    async fn fetch_posts(&self) -> Result<Vec<SourcePost>> {
        let cards: Vec<Card> = self
            .get("cards", &[("attachments", "true"), ("labels", "all")])
            .await?;
        let lists: Vec<BoardList> = self.get("lists", &[]).await?;
        tracing::debug!("Fetched {} cards in {} lists", cards.len(), lists.len());
        Ok(cards_to_posts(cards, &lists, &self.allowed_lists))
    }

    async fn fetch_attachment(&self, attachment: &Attachment) -> Result<Vec<u8>> {
        let mut request = self.client.get(&attachment.url);
        // Trello-hosted uploads need the API credentials, external links must not get them
        if attachment.url.contains("trello.com") {
            request = request.query(&[("key", self.key.as_str()), ("token", self.token.as_str())]);
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to download {}", attachment.url))?;
        let response = check_response(response, SERVICE).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

fn cards_to_posts(cards: Vec<Card>, lists: &[BoardList], allowed: &[String]) -> Vec<SourcePost> {
    let list_names: HashMap<&str, &str> = lists
        .iter()
        .map(|l| (l.id.as_str(), l.name.as_str()))
        .collect();

    cards
        .into_iter()
        .filter(|card| {
            let list = list_names.get(card.id_list.as_str()).copied().unwrap_or("");
            let keep = allowed.iter().any(|a| a == list);
            if !keep {
                tracing::debug!("Skipping card {:?} in list {:?}", card.name, list);
            }
            keep
        })
        .map(card_to_post)
        .collect()
}

fn card_to_post(card: Card) -> SourcePost {
    let (front_matter, body) = FrontMatter::parse(&card.desc);
    let body = body.to_string();

    let labels = card
        .labels
        .iter()
        .filter(|l| !l.name.trim().is_empty())
        .map(|l| Label::new(l.name.trim(), l.color.as_deref().and_then(colors::trello_hex)))
        .collect();

    let attachment = card.attachments.first().map(|a| Attachment {
        url: a.url.clone(),
        file_name: front_matter.image.clone(),
        fallback_url: None,
    });

    SourcePost {
        id: card.id,
        title: card.name,
        body,
        labels,
        attachment,
        updated: card.date_last_activity.as_deref().and_then(parse_date_string),
        front_matter,
    }
}
