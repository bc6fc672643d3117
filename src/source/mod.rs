//! Message sources
//!
//! A message source is the boundary between platform-specific payloads and
//! the session engine. It resolves the primary user, lists spaces with
//! activity, and hands back per-space [`Message`] batches already bounded to a
//! reporting day. Sender resolution and space classification happen here so
//! the engine never sees raw API shapes.

pub mod file;
pub mod webex;

pub use file::FileSource;
pub use webex::WebexSource;

use crate::calendar::DayWindow;
use crate::config::WebexConfig;
use crate::error::Result;
use crate::model::{Message, Participant, Space, SpaceKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;

/// How to locate a single space
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpaceQuery {
    /// Exact space id
    Id(String),
    /// Exact space title
    Title(String),
    /// Display name of the counterpart in a direct space
    Person(String),
}

impl SpaceQuery {
    /// Whether `space` satisfies the query
    pub fn matches(&self, space: &Space) -> bool {
        match self {
            SpaceQuery::Id(id) => space.id == *id,
            SpaceQuery::Title(title) => space.label == *title,
            SpaceQuery::Person(name) => space.kind == SpaceKind::Direct && space.label == *name,
        }
    }

    /// Hint shown when no space matches
    pub fn not_found_hint(&self) -> &'static str {
        match self {
            SpaceQuery::Id(_) => "Verify the space id is correct and you have access to it.",
            SpaceQuery::Title(_) => "Verify the space title is exactly correct (case-sensitive).",
            SpaceQuery::Person(_) => {
                "Verify the person's name is exactly correct and you have a direct space with them."
            }
        }
    }
}

impl std::fmt::Display for SpaceQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpaceQuery::Id(id) => write!(f, "space with id '{}'", id),
            SpaceQuery::Title(title) => write!(f, "space named '{}'", title),
            SpaceQuery::Person(name) => write!(f, "direct space with '{}'", name),
        }
    }
}

/// Supplier of spaces and messages for one authenticated user
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// The user whose activity is being summarized
    async fn primary_user(&self) -> Result<Participant>;

    /// Spaces with activity at or after `since`
    async fn active_spaces(&self, since: DateTime<Utc>) -> Result<Vec<Space>>;

    /// Messages of `space` sent inside `window`
    ///
    /// `is_primary_user` on each message is derived from `primary_user_id`.
    async fn space_messages(
        &self,
        space: &Space,
        window: &DayWindow,
        primary_user_id: &str,
    ) -> Result<Vec<Message>>;

    /// Locate a single space
    async fn find_space(&self, query: &SpaceQuery) -> Result<Option<Space>>;
}

/// Create a message source
///
/// An export path selects the offline [`FileSource`]; otherwise the Webex
/// API is used and a token must be configured.
///
/// # Errors
///
/// Returns error if the export cannot be read or the Webex client cannot be
/// built (for example when no token is available).
pub fn create_source(
    config: &WebexConfig,
    input: Option<&Path>,
) -> Result<Box<dyn MessageSource>> {
    match input {
        Some(path) => Ok(Box::new(FileSource::from_path(path)?)),
        None => Ok(Box::new(WebexSource::new(config.clone())?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_query_matches() {
        let dm = Space::new("d1", SpaceKind::Direct, "Bob Johnson");
        let team = Space::new("g1", SpaceKind::Group, "Bob Johnson");

        assert!(SpaceQuery::Id("d1".to_string()).matches(&dm));
        assert!(!SpaceQuery::Id("d1".to_string()).matches(&team));
        assert!(SpaceQuery::Title("Bob Johnson".to_string()).matches(&team));
        assert!(SpaceQuery::Person("Bob Johnson".to_string()).matches(&dm));
        assert!(!SpaceQuery::Person("Bob Johnson".to_string()).matches(&team));
        assert!(!SpaceQuery::Title("bob johnson".to_string()).matches(&team));
    }

    #[test]
    fn test_space_query_display() {
        assert_eq!(
            SpaceQuery::Title("Standup".to_string()).to_string(),
            "space named 'Standup'"
        );
        assert!(SpaceQuery::Person("Bob".to_string())
            .not_found_hint()
            .contains("direct space"));
    }

    #[test]
    fn test_create_source_without_token_fails() {
        let config = WebexConfig::default();
        let result = create_source(&config, None);
        assert!(result.is_err());
    }
}
