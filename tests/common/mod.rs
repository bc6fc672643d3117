use chrono::{DateTime, TimeZone, Utc};
use convoscope::model::{Message, Participant};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[allow(dead_code)]
pub const PRIMARY_USER: &str = "me";

/// A sample export with one direct and one group space on 2025-08-06 (UTC)
#[allow(dead_code)]
pub const SAMPLE_EXPORT: &str = r#"{
    "me": { "id": "me", "display_name": "Me" },
    "spaces": [
        { "id": "dm-bob", "kind": "direct", "label": "Bob Johnson" },
        { "id": "standup", "kind": "group", "label": "Team Standup" }
    ],
    "messages": [
        { "id": "1", "space_id": "dm-bob", "sender_id": "me", "sender_name": "Me",
          "sent_at": "2025-08-06T09:00:00Z", "text": "Morning!" },
        { "id": "2", "space_id": "dm-bob", "sender_id": "bob", "sender_name": "Bob Johnson",
          "sent_at": "2025-08-06T09:05:00Z", "text": "Hey" },
        { "id": "3", "space_id": "dm-bob", "sender_id": "me", "sender_name": "Me",
          "sent_at": "2025-08-06T09:21:00Z", "text": "Lunch?" },
        { "id": "4", "space_id": "standup", "sender_id": "carol", "sender_name": "Carol",
          "sent_at": "2025-08-06T10:00:00Z", "text": "Standup in 5" },
        { "id": "5", "space_id": "standup", "sender_id": "me", "sender_name": "Me",
          "sent_at": "2025-08-06T10:02:00Z", "text": "Joining" },
        { "id": "6", "space_id": "standup", "sender_id": "carol", "sender_name": "Carol",
          "sent_at": "2025-08-06T15:00:00Z", "text": "Notes posted" },
        { "id": "7", "space_id": "dm-bob", "sender_id": "bob", "sender_name": "Bob Johnson",
          "sent_at": "2025-08-07T08:00:00Z", "text": "Tomorrow" }
    ]
}"#;

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

#[allow(dead_code)]
pub fn temp_export_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let export_path = temp_dir.path().join("export.json");
    fs::write(&export_path, contents).expect("failed to write export file");
    (temp_dir, export_path)
}

/// Instant on 2025-08-06 UTC
#[allow(dead_code)]
pub fn at(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 6, hour, minute, second)
        .single()
        .expect("valid test timestamp")
}

#[allow(dead_code)]
pub fn message(id: &str, space: &str, sender: &str, sent_at: DateTime<Utc>) -> Message {
    Message::new(
        id,
        space,
        Participant::new(sender, sender),
        sent_at,
        format!("text of {}", id),
        PRIMARY_USER,
    )
}
