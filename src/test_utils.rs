//! Test utilities for Convoscope
//!
//! Fixture builders for messages on a fixed reporting day (2025-08-06 UTC)
//! with `"me"` as the primary user, plus small file helpers.

use crate::config::Config;
use crate::error::ConvoscopeError;
use crate::model::{Message, Participant, Space, SpaceKind};
use chrono::{DateTime, TimeZone, Utc};
use std::path::PathBuf;
use tempfile::TempDir;

/// Primary user id used by every fixture
pub const PRIMARY_USER: &str = "me";

/// Instant on the fixture day at `hour:minute` UTC
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    at_secs(hour, minute, 0)
}

/// Instant on the fixture day at `hour:minute:second` UTC
pub fn at_secs(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 6, hour, minute, second)
        .single()
        .expect("valid fixture time")
}

/// Participant whose display name is the capitalized id
pub fn participant(id: &str) -> Participant {
    let mut chars = id.chars();
    let display = match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    };
    Participant::new(id, display)
}

/// Message from `sender` at `hour:minute` on the fixture day
pub fn message(id: &str, space: &str, sender: &str, hour: u32, minute: u32) -> Message {
    message_at(id, space, sender, at(hour, minute))
}

/// Message from `sender` at an arbitrary instant
pub fn message_at(id: &str, space: &str, sender: &str, sent_at: DateTime<Utc>) -> Message {
    Message::new(
        id,
        space,
        participant(sender),
        sent_at,
        format!("text of {}", id),
        PRIMARY_USER,
    )
}

/// Space fixture labelled after its id
pub fn space(id: &str, kind: SpaceKind) -> Space {
    Space::new(id, kind, format!("{} room", id))
}

/// Create a temporary directory for testing
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Assert that an error contains the expected message
pub fn assert_error_contains<T>(result: Result<T, ConvoscopeError>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = e.to_string();
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// Create a test configuration with default values
pub fn test_config() -> Config {
    Config::default()
}

/// Create a test configuration YAML string
pub fn test_config_yaml() -> String {
    r#"
webex:
  api_base: http://localhost:8080/v1
  page_size: 25
  max_messages_per_space: 200
  max_concurrent_requests: 4
  timeout_seconds: 10
  max_retries: 2

sessions:
  context_window_minutes: 20
  include_passive: true

display:
  time_format: 24h
  timezone: Europe/Berlin

logging:
  level: convoscope=debug
  json_format: true
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_message_primary_flag() {
        assert!(message("m1", "s", PRIMARY_USER, 9, 0).is_primary_user);
        assert!(!message("m2", "s", "bob", 9, 0).is_primary_user);
    }

    #[test]
    fn test_participant_display_name() {
        assert_eq!(participant("bob").display_name, "Bob");
    }

    #[test]
    fn test_create_test_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "test.txt", "content");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "content");
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_error_contains_ok() {
        let result: Result<(), ConvoscopeError> = Ok(());
        assert_error_contains(result, "error");
    }

    #[test]
    fn test_test_config_yaml_parses_and_validates() {
        let config: Config = serde_yaml::from_str(&test_config_yaml()).unwrap();
        assert!(config.validate().is_ok());
        assert!(test_config().validate().is_ok());
    }
}
