//! Integration tests for the phone-number matcher and the file-backed setup
//! the CLI uses.

mod common;

use common::{q, RecordingSource};
use phone_match::commands::build_matcher;
use phone_match::config::{parse_config, MatcherConfig};
use phone_match::contact_matcher::ContactMatcher;
use phone_match::file_store::JsonFileStorage;
use phone_match::traits::SessionFlag;
use phone_match_core::store::Storage;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn contact_matcher(source: Arc<RecordingSource>) -> ContactMatcher {
    let matcher = ContactMatcher::new(
        &MatcherConfig::default(),
        Arc::new(SessionFlag::new(true)),
        None,
    );
    matcher.add_search_source(source).unwrap();
    matcher
}

#[tokio::test]
async fn test_has_match_number() {
    let source = Arc::new(RecordingSource::new("contacts").answer("555", json!({"id": 1})));
    let matcher = contact_matcher(source.clone());
    matcher.on_state_change().await;
    assert_eq!(matcher.name(), "contactMatcher");

    assert!(matcher.has_match_number("555", false).await);
    assert!(!matcher.has_match_number("777", false).await);

    // Cached answers are reused.
    assert!(matcher.has_match_number("555", false).await);
    assert_eq!(source.calls().len(), 2);

    assert!(matcher.has_match_number("555", true).await);
    assert_eq!(source.calls().len(), 3);
}

#[tokio::test]
async fn test_has_match_number_before_init_is_false() {
    let source = Arc::new(RecordingSource::new("contacts").answer("555", json!({"id": 1})));
    let matcher = contact_matcher(source.clone());
    assert!(!matcher.has_match_number("555", false).await);
    assert!(source.calls().is_empty());
}

#[tokio::test]
async fn test_force_match_numbers() {
    let source = Arc::new(
        RecordingSource::new("contacts")
            .answer("555", json!({"id": 1}))
            .answer("556", json!({"id": 2})),
    );
    let matcher = contact_matcher(source.clone());
    matcher.on_state_change().await;

    matcher.match_queries(&q(&["555", "556"]), false).await;
    matcher.force_match_number("555").await;
    assert_eq!(source.calls()[1], q(&["555"]));

    matcher.force_match_batch_numbers(&q(&["555", "556"])).await;
    assert_eq!(source.calls()[2], q(&["555", "556"]));
    assert_eq!(matcher.data_mapping().len(), 2);
}

#[tokio::test]
async fn test_file_backed_matcher_survives_restart() {
    let tmp = TempDir::new().unwrap();
    let directory = tmp.path().join("company.toml");
    std::fs::write(
        &directory,
        r#"
[[contacts]]
id = "c-1"
name = "Ada"
phone_numbers = ["+1 (555) 010-2030"]
"#,
    )
    .unwrap();
    let cache_path = tmp.path().join("data").join("cache.json");
    let config = parse_config(&format!(
        r#"
[storage]
path = "{}"

[directories.company]
path = "{}"
"#,
        cache_path.display(),
        directory.display()
    ))
    .unwrap();

    let matcher = build_matcher(&config).await.unwrap();
    assert!(matcher.ready());
    assert!(matcher.has_match_number("15550102030", false).await);
    drop(matcher);

    let stored = JsonFileStorage::open(&cache_path).unwrap();
    let cache = stored.get_item("contactMatcher-cache").unwrap().unwrap();
    assert_eq!(
        cache["dataMap"]["15550102030"][0],
        json!({"source": "company", "id": "c-1", "name": "Ada", "phoneNumbers": ["+1 (555) 010-2030"]})
    );

    let reopened = build_matcher(&config).await.unwrap();
    assert_eq!(reopened.data_mapping()["15550102030"][0].record["name"], "Ada");
    assert!(reopened
        .cache()
        .entry("company", "15550102030")
        .is_some());
}
