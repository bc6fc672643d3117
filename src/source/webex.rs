//! Webex REST message source
//!
//! Talks to the Webex REST API with a bearer token. Rooms are listed newest
//! activity first and messages newest first, both paged through the `Link`
//! response header. Sender names are resolved through a shared person cache
//! so each person is fetched at most once per run, even when several spaces
//! ask for the same sender at the same time.

use super::{MessageSource, SpaceQuery};
use crate::calendar::DayWindow;
use crate::config::WebexConfig;
use crate::error::{ConvoscopeError, Result};
use crate::model::{Message, Participant, Space, SpaceKind};

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{HeaderMap, LINK, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::OnceCell;

/// Display name used for people the API no longer knows about
pub const DELETED_USER: &str = "[Deleted User]";

const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

/// One cache slot per person id; concurrent lookups wait on the same fetch
type PersonSlot = Arc<OnceCell<Participant>>;

/// Webex API message source
///
/// # Examples
///
/// ```
/// use convoscope::config::WebexConfig;
/// use convoscope::source::WebexSource;
///
/// let config = WebexConfig {
///     token: Some("token".to_string()),
///     ..WebexConfig::default()
/// };
/// let source = WebexSource::new(config);
/// assert!(source.is_ok());
/// ```
pub struct WebexSource {
    client: Client,
    config: WebexConfig,
    token: String,
    people: Arc<Mutex<HashMap<String, PersonSlot>>>,
}

/// Paged list envelope used by every Webex list endpoint
#[derive(Debug, Deserialize)]
struct ItemsResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

/// Room as returned by `/rooms`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebexRoom {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(rename = "type", default)]
    room_type: String,
    #[serde(default)]
    last_activity: Option<DateTime<Utc>>,
}

impl WebexRoom {
    fn into_space(self) -> Space {
        let kind = if self.room_type == "direct" {
            SpaceKind::Direct
        } else {
            SpaceKind::Group
        };
        Space::new(self.id, kind, self.title)
    }
}

/// Message as returned by `/messages`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebexMessage {
    id: String,
    room_id: String,
    #[serde(default)]
    person_id: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    created: Option<DateTime<Utc>>,
}

/// Person as returned by `/people`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebexPerson {
    id: String,
    #[serde(default)]
    display_name: String,
}

impl From<WebexPerson> for Participant {
    fn from(person: WebexPerson) -> Self {
        Participant::new(person.id, person.display_name)
    }
}

impl WebexSource {
    /// Create a new Webex source
    ///
    /// # Errors
    ///
    /// Returns an authentication error if no token is configured, or a
    /// source error if the HTTP client cannot be built.
    pub fn new(config: WebexConfig) -> Result<Self> {
        let token = config
            .token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                ConvoscopeError::Authentication(
                    "No Webex access token configured. Set WEBEX_TOKEN or webex.token, \
                     or use --input to read an export."
                        .to_string(),
                )
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("convoscope/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConvoscopeError::Source(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!("Initialized Webex source: api_base={}", config.api_base);

        Ok(Self {
            client,
            config,
            token,
            people: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base.trim_end_matches('/'), path)
    }

    /// Send a GET, retrying on HTTP 429 as instructed by `Retry-After`
    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Response> {
        let mut retries = 0;
        loop {
            tracing::debug!("GET {}", url);
            let response = self
                .client
                .get(url)
                .bearer_auth(&self.token)
                .query(query)
                .send()
                .await
                .map_err(|e| {
                    tracing::warn!("Webex request failed: {}", e);
                    ConvoscopeError::Http(e)
                })
                .context("Failed to reach Webex API")?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }

            if retries >= self.config.max_retries {
                tracing::error!("Rate limit persisted after {} retries: {}", retries, url);
                return Err(ConvoscopeError::RateLimited {
                    retries,
                    message: format!("GET {}", url),
                }
                .into());
            }

            let wait = retry_after(response.headers());
            retries += 1;
            tracing::warn!(
                "Rate limited by Webex, retrying in {}s (attempt {}/{})",
                wait.as_secs(),
                retries,
                self.config.max_retries
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// Turn error statuses into typed errors
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            return Err(ConvoscopeError::Authentication(
                "Webex API authentication failed (401). Your access token is invalid; \
                 check WEBEX_TOKEN and try again."
                    .to_string(),
            )
            .into());
        }

        if status == StatusCode::FORBIDDEN {
            return Err(ConvoscopeError::Authentication(
                "Webex API access forbidden (403). The token may have expired \
                 (personal tokens last 12 hours) or lack the spark:messages_read \
                 and spark:rooms_read scopes."
                    .to_string(),
            )
            .into());
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!("Webex returned error {}: {}", status, body);
        Err(ConvoscopeError::Source(format!("Webex returned error {}: {}", status, body)).into())
    }

    /// Fetch one page of a list endpoint, returning its items and the next page URL
    async fn get_page<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<(Vec<T>, Option<String>)> {
        let response = Self::check(self.get(url, query).await?).await?;
        let next = next_link(response.headers());
        let page: ItemsResponse<T> = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Webex list response: {}", e);
            ConvoscopeError::Source(format!("Failed to parse Webex response: {}", e))
        })?;
        Ok((page.items, next))
    }

    /// Walk `/rooms` newest activity first, calling `visit` until it returns false
    async fn walk_rooms<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(WebexRoom) -> bool + Send,
    {
        let mut url = self.url("/rooms");
        let mut query = vec![
            ("sortBy", "lastactivity".to_string()),
            ("max", self.config.page_size.to_string()),
        ];
        loop {
            let (rooms, next) = self.get_page::<WebexRoom>(&url, &query).await?;
            for room in rooms {
                if !visit(room) {
                    return Ok(());
                }
            }
            match next {
                Some(next) => {
                    url = next;
                    query.clear();
                }
                None => return Ok(()),
            }
        }
    }

    /// Resolve a person through the cache; unknown people become a placeholder
    async fn person(&self, person_id: &str) -> Result<Participant> {
        let slot = self.person_slot(person_id)?;
        let participant = slot.get_or_try_init(|| self.fetch_person(person_id)).await?;
        Ok(participant.clone())
    }

    async fn fetch_person(&self, person_id: &str) -> Result<Participant> {
        let response = self.get(&self.url(&format!("/people/{}", person_id)), &[]).await?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::info!("Person {} no longer exists in Webex, using placeholder", person_id);
            return Ok(Participant::new(person_id, DELETED_USER));
        }
        let person: WebexPerson = Self::check(response).await?.json().await.map_err(|e| {
            ConvoscopeError::Source(format!("Failed to parse Webex person: {}", e))
        })?;
        Ok(person.into())
    }

    fn person_slot(&self, person_id: &str) -> Result<PersonSlot> {
        let mut people = self
            .people
            .lock()
            .map_err(|_| ConvoscopeError::Source("Person cache lock poisoned".to_string()))?;
        Ok(people.entry(person_id.to_string()).or_default().clone())
    }

    fn remember(&self, participant: Participant) -> Result<()> {
        let slot = self.person_slot(&participant.id)?;
        if slot.set(participant).is_err() {
            tracing::debug!("Person already cached");
        }
        Ok(())
    }
}

/// Delay requested by a 429 response
fn retry_after(headers: &HeaderMap) -> Duration {
    let secs = headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
    Duration::from_secs(secs)
}

/// URL of the `rel="next"` entry of a `Link` header
fn next_link(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(LINK)?.to_str().ok()?;
    value.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        if !params.split(';').any(|p| p.trim() == "rel=\"next\"") {
            return None;
        }
        let target = target.trim();
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}

#[async_trait]
impl MessageSource for WebexSource {
    fn name(&self) -> &str {
        "webex"
    }

    async fn primary_user(&self) -> Result<Participant> {
        let response = Self::check(self.get(&self.url("/people/me"), &[]).await?).await?;
        let me: WebexPerson = response.json().await.map_err(|e| {
            ConvoscopeError::Source(format!("Failed to parse Webex person: {}", e))
        })?;
        let me: Participant = me.into();
        tracing::info!("Authenticated as {}", me.display_name);
        self.remember(me.clone())?;
        Ok(me)
    }

    async fn active_spaces(&self, since: DateTime<Utc>) -> Result<Vec<Space>> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut spaces: Vec<Space> = Vec::new();

        self.walk_rooms(|room| {
            if !seen.insert(room.id.clone()) {
                tracing::debug!("Room {} already processed, skipping", room.id);
                return true;
            }
            match room.last_activity {
                None => {
                    tracing::debug!("Room {} has no last activity, skipping", room.id);
                    true
                }
                Some(last) if last < since => {
                    tracing::debug!("Room {} last active at {}, stopping scan", room.id, last);
                    false
                }
                Some(_) => {
                    spaces.push(room.into_space());
                    true
                }
            }
        })
        .await?;

        tracing::info!("Total active rooms found: {}", spaces.len());
        Ok(spaces)
    }

    async fn space_messages(
        &self,
        space: &Space,
        window: &DayWindow,
        primary_user_id: &str,
    ) -> Result<Vec<Message>> {
        let cap = self.config.max_messages_per_space;
        let mut raw: Vec<(DateTime<Utc>, WebexMessage)> = Vec::new();
        let mut url = self.url("/messages");
        let mut query = vec![
            ("roomId", space.id.clone()),
            (
                "before",
                window.end.to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
            ("max", self.config.page_size.to_string()),
        ];

        'pages: loop {
            let (page, next) = self.get_page::<WebexMessage>(&url, &query).await?;
            for msg in page {
                let Some(created) = msg.created else {
                    tracing::debug!("Message {} has no creation time, skipping", msg.id);
                    continue;
                };
                if created < window.start {
                    break 'pages;
                }
                if !window.contains(created) {
                    continue;
                }
                raw.push((created, msg));
                if raw.len() >= cap {
                    tracing::warn!(
                        "Reached max_messages_per_space ({}) in room {}",
                        cap,
                        space.label
                    );
                    break 'pages;
                }
            }
            match next {
                Some(next) => {
                    url = next;
                    query.clear();
                }
                None => break,
            }
        }

        let mut messages = Vec::with_capacity(raw.len());
        for (sent_at, msg) in raw {
            let sender = self.person(&msg.person_id).await?;
            messages.push(Message::new(
                msg.id,
                msg.room_id,
                sender,
                sent_at,
                msg.text.unwrap_or_default(),
                primary_user_id,
            ));
        }

        tracing::debug!("Fetched {} messages from room {}", messages.len(), space.label);
        Ok(messages)
    }

    async fn find_space(&self, query: &SpaceQuery) -> Result<Option<Space>> {
        if let SpaceQuery::Id(id) = query {
            let response = self.get(&self.url(&format!("/rooms/{}", id)), &[]).await?;
            if response.status() == StatusCode::NOT_FOUND {
                tracing::info!("Room with id {} not found", id);
                return Ok(None);
            }
            let room: WebexRoom = Self::check(response).await?.json().await.map_err(|e| {
                ConvoscopeError::Source(format!("Failed to parse Webex room: {}", e))
            })?;
            return Ok(Some(room.into_space()));
        }

        let mut found: Option<Space> = None;
        self.walk_rooms(|room| {
            let space = room.into_space();
            if query.matches(&space) {
                found = Some(space);
                false
            } else {
                true
            }
        })
        .await?;
        Ok(found)
    }
}
