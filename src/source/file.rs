//! Offline message source backed by a JSON export
//!
//! The export has the shape
//!
//! ```json
//! {
//!   "me": { "id": "u1", "display_name": "Alice" },
//!   "spaces": [ { "id": "s1", "kind": "direct", "label": "Bob" } ],
//!   "messages": [
//!     { "id": "m1", "space_id": "s1", "sender_id": "u1", "sender_name": "Alice",
//!       "sent_at": "2025-08-06T09:00:00Z", "text": "hi" }
//!   ]
//! }
//! ```
//!
//! Messages referring to a space missing from `spaces` are reported under a
//! group space labelled by the id.

use super::{MessageSource, SpaceQuery};
use crate::calendar::DayWindow;
use crate::error::{ConvoscopeError, Result};
use crate::model::{Message, Participant, Space, SpaceKind};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Top level of a JSON export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Export {
    /// The primary user
    pub me: Participant,
    /// Space metadata
    #[serde(default)]
    pub spaces: Vec<Space>,
    /// Messages from every space, in any order
    #[serde(default)]
    pub messages: Vec<ExportMessage>,
}

/// One message row of an export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMessage {
    /// Message id, unique within its space
    pub id: String,
    /// Space the message belongs to
    pub space_id: String,
    /// Sender id, compared against the primary user's id
    pub sender_id: String,
    /// Sender display name; the id is shown when absent
    #[serde(default)]
    pub sender_name: Option<String>,
    /// When the message was sent
    pub sent_at: DateTime<Utc>,
    /// Message text
    #[serde(default)]
    pub text: String,
}

/// Message source reading a JSON export held in memory
#[derive(Debug, Clone)]
pub struct FileSource {
    export: Export,
    spaces: BTreeMap<String, Space>,
}

impl FileSource {
    /// Load an export from disk
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not a valid export
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConvoscopeError::Io)
            .with_context(|| format!("Failed to read export {}", path.display()))?;
        let source = Self::from_json(&contents)?;
        tracing::info!(
            path = %path.display(),
            spaces = source.spaces.len(),
            messages = source.export.messages.len(),
            "Loaded message export"
        );
        Ok(source)
    }

    /// Parse an export from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let export: Export = serde_json::from_str(json)
            .map_err(|e| ConvoscopeError::Source(format!("Invalid export: {}", e)))?;
        Ok(Self::new(export))
    }

    /// Wrap an already parsed export
    pub fn new(export: Export) -> Self {
        let mut spaces: BTreeMap<String, Space> = export
            .spaces
            .iter()
            .map(|s| (s.id.clone(), s.clone()))
            .collect();
        for msg in &export.messages {
            spaces
                .entry(msg.space_id.clone())
                .or_insert_with(|| Space::new(msg.space_id.clone(), SpaceKind::Group, msg.space_id.clone()));
        }
        Self { export, spaces }
    }

    fn to_message(&self, row: &ExportMessage, primary_user_id: &str) -> Message {
        let name = row
            .sender_name
            .clone()
            .unwrap_or_else(|| row.sender_id.clone());
        Message::new(
            row.id.clone(),
            row.space_id.clone(),
            Participant::new(row.sender_id.clone(), name),
            row.sent_at,
            row.text.clone(),
            primary_user_id,
        )
    }
}

#[async_trait]
impl MessageSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn primary_user(&self) -> Result<Participant> {
        Ok(self.export.me.clone())
    }

    async fn active_spaces(&self, since: DateTime<Utc>) -> Result<Vec<Space>> {
        let active: Vec<Space> = self
            .spaces
            .values()
            .filter(|space| {
                self.export
                    .messages
                    .iter()
                    .any(|m| m.space_id == space.id && m.sent_at >= since)
            })
            .cloned()
            .collect();
        tracing::debug!(count = active.len(), since = %since, "Active spaces in export");
        Ok(active)
    }

    async fn space_messages(
        &self,
        space: &Space,
        window: &DayWindow,
        primary_user_id: &str,
    ) -> Result<Vec<Message>> {
        Ok(self
            .export
            .messages
            .iter()
            .filter(|m| m.space_id == space.id && window.contains(m.sent_at))
            .map(|m| self.to_message(m, primary_user_id))
            .collect())
    }

    async fn find_space(&self, query: &SpaceQuery) -> Result<Option<Space>> {
        Ok(self.spaces.values().find(|s| query.matches(s)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::ReportTimezone;
    use crate::test_utils::{at, create_test_file, temp_dir};
    use chrono::NaiveDate;

    const EXPORT: &str = r#"{
        "me": { "id": "me", "display_name": "Me" },
        "spaces": [
            { "id": "dm-bob", "kind": "direct", "label": "Bob" },
            { "id": "team", "kind": "group", "label": "Team" }
        ],
        "messages": [
            { "id": "1", "space_id": "dm-bob", "sender_id": "me", "sender_name": "Me",
              "sent_at": "2025-08-06T09:00:00Z", "text": "hi" },
            { "id": "2", "space_id": "dm-bob", "sender_id": "bob", "sender_name": "Bob",
              "sent_at": "2025-08-06T09:05:00Z", "text": "hello" },
            { "id": "3", "space_id": "team", "sender_id": "carol",
              "sent_at": "2025-08-05T23:59:59Z" },
            { "id": "4", "space_id": "stray", "sender_id": "dan",
              "sent_at": "2025-08-06T12:00:00Z", "text": "?" }
        ]
    }"#;

    fn window() -> DayWindow {
        ReportTimezone::from_name(Some("UTC"))
            .unwrap()
            .day_window(NaiveDate::from_ymd_opt(2025, 8, 6).unwrap())
            .unwrap()
    }

    #[tokio::test]
    async fn test_primary_user() {
        let source = FileSource::from_json(EXPORT).unwrap();
        let me = source.primary_user().await.unwrap();
        assert_eq!(me.id, "me");
        assert_eq!(source.name(), "file");
    }

    #[tokio::test]
    async fn test_active_spaces_since() {
        let source = FileSource::from_json(EXPORT).unwrap();
        let spaces = source.active_spaces(window().start).await.unwrap();
        let ids: Vec<&str> = spaces.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["dm-bob", "stray"]);
    }

    #[tokio::test]
    async fn test_space_messages_bounded_by_window() {
        let source = FileSource::from_json(EXPORT).unwrap();
        let team = source
            .find_space(&SpaceQuery::Title("Team".to_string()))
            .await
            .unwrap()
            .unwrap();
        let messages = source.space_messages(&team, &window(), "me").await.unwrap();
        assert!(messages.is_empty());

        let dm = Space::new("dm-bob", SpaceKind::Direct, "Bob");
        let messages = source.space_messages(&dm, &window(), "me").await.unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].is_primary_user);
        assert!(!messages[1].is_primary_user);
        assert_eq!(messages[1].sent_at, at(9, 5));
    }

    #[tokio::test]
    async fn test_unknown_space_falls_back_to_group() {
        let source = FileSource::from_json(EXPORT).unwrap();
        let stray = source
            .find_space(&SpaceQuery::Id("stray".to_string()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stray.kind, SpaceKind::Group);
        assert_eq!(stray.label, "stray");

        let messages = source.space_messages(&stray, &window(), "me").await.unwrap();
        assert_eq!(messages[0].sender.display_name, "dan");
    }

    #[tokio::test]
    async fn test_find_person_only_matches_direct_spaces() {
        let source = FileSource::from_json(EXPORT).unwrap();
        let found = source
            .find_space(&SpaceQuery::Person("Bob".to_string()))
            .await
            .unwrap();
        assert_eq!(found.map(|s| s.id), Some("dm-bob".to_string()));

        let missing = source
            .find_space(&SpaceQuery::Person("Team".to_string()))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_from_path_reads_export() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "export.json", EXPORT);
        let source = FileSource::from_path(&path).unwrap();
        assert_eq!(source.spaces.len(), 3);
    }

    #[test]
    fn test_invalid_or_missing_export_errors() {
        let err = FileSource::from_json("{\"spaces\": []}").unwrap_err();
        assert!(err.to_string().contains("Invalid export"));

        let err = FileSource::from_path(Path::new("/nonexistent/export.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read export"));
        assert!(matches!(
            err.downcast_ref::<ConvoscopeError>(),
            Some(ConvoscopeError::Io(_))
        ));
    }
}
