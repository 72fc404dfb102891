use anyhow::Result;
use chrono::{DateTime, Utc};
use mapscene::common::error::FetchError;
use mapscene::config::AppConfig;
use mapscene::domain::{RawEventRecord, RawLocationRecord};
use mapscene::pipeline::indexing::search::SearchIndex;
use mapscene::pipeline::indexing::EventIndexes;
use mapscene::pipeline::ingestion::fetcher::RecordSource;
use mapscene::state::AppState;
use serde_json::json;

fn summer_config() -> AppConfig {
    AppConfig {
        start_date: "2024-06-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap(),
        end_date: "2024-06-30T23:59:59Z".parse::<DateTime<Utc>>().unwrap(),
        flag_emoji_fallback: true,
        ..AppConfig::default()
    }
}

fn locations_payload() -> Vec<RawLocationRecord> {
    serde_json::from_value(json!([
        {
            "lat": "40.1", "lng": "-71.2",
            "name": "Main Pavilion", "short_name": "Pav",
            "emoji": "🎪", "tags": ["camping", "music"]
        },
        {
            "lat": "40.2", "lng": "-71.3",
            "name": "River Stage", "tags": ["music"]
        },
        // Duplicate key: must be discarded whole
        { "lat": "40.1", "lng": "-71.2", "name": "Pretender" }
    ]))
    .unwrap()
}

fn initial_events_payload() -> Vec<RawEventRecord> {
    serde_json::from_value(json!([
        {
            "name": "Opening Ceremony",
            "emoji": "🇺🇸",
            "lat": "40.1", "lng": "-71.2",
            "tags": ["ceremony"],
            "occurrences": [["2024-06-21", "10:00am", "", "12:30pm"]]
        },
        {
            "name": "Caf&eacute; Acoustic Set",
            "description": "Qui&eacute;n sabe",
            "lat": "40.2", "lng": "-71.3",
            "tags": ["music"],
            "occurrences": [["2024-06-22", "8:00pm", "", ""]]
        },
        // No coordinates: silently excluded, still consumes ordinal 2
        {
            "name": "Ghost Event",
            "occurrences": [["2024-06-23", "1:00pm", "", ""]]
        },
        // Outside the June window
        {
            "name": "Winter Gala",
            "lat": "40.1", "lng": "-71.2",
            "occurrences": [["2024-12-01", "6:00pm", "", ""]]
        }
    ]))
    .unwrap()
}

fn append_events_payload() -> Vec<RawEventRecord> {
    serde_json::from_value(json!([
        {
            "name": "Night Market",
            "lat": "40.1", "lng": "-71.2",
            "tags": ["food"],
            "occurrences": [
                ["2024-06-25", "5:00pm", "2024-06-25", "11:00pm"],
                ["2024-06-26", "5:00pm", "", ""]
            ]
        },
        {
            "name": "Closing Jam",
            "lat": "40.2", "lng": "-71.3",
            "tags": ["music"],
            "occurrences": [["2024-06-29", "", "", ""]]
        }
    ]))
    .unwrap()
}

#[test]
fn initial_then_append_load() -> Result<()> {
    let mut state = AppState::new(&summer_config());

    let initial = state.ingest_batch(&locations_payload(), &initial_events_payload());
    assert_eq!(initial.locations_added, 2);
    assert_eq!(initial.events_added, 2);
    assert_eq!(state.locations().get("40.1,-71.2").unwrap().name, "Main Pavilion");

    // Flag emoji swapped for the registry location's emoji under the policy
    let opening = state.event_by_id(0).unwrap();
    assert_eq!(opening.emoji.as_deref(), Some("🎪"));
    // End time on the same day via the end-time field
    assert!(opening.occurrences[0].end > opening.occurrences[0].start);
    assert_eq!(opening.occurrences[0].end_time_text, "12:30pm");

    // Entity decoding flows into the search haystack
    let cafe = state.event_by_id(1).unwrap();
    assert_eq!(cafe.name, "Café Acoustic Set");
    assert_eq!(state.search().events[&1], "cafe acoustic set quien sabe");

    // Append ids continue from the stored count (2), not from the raw
    // initial batch size
    let appended = state.ingest_batch(&[], &append_events_payload());
    assert_eq!(appended.events_added, 2);
    let ids: Vec<u32> = state.events().iter().map(|e| e.id).collect();
    assert_eq!(ids, [0, 1, 2, 3]);
    assert_eq!(state.event_by_id(2).unwrap().name, "Night Market");

    // Noon default applied to the blank-time closing jam, June is UTC-4
    let closing = state.event_by_id(3).unwrap();
    assert_eq!(
        closing.occurrences[0].start,
        "2024-06-29T16:00:00Z".parse::<DateTime<Utc>>()?
    );

    // Grouping in append order; earlier assignments undisturbed
    assert_eq!(state.indexes().by_location["40.1,-71.2"], vec![0, 2]);
    assert_eq!(state.indexes().by_location["40.2,-71.3"], vec![1, 3]);

    // music: own tag on events 1 and 3, location tag of Pavilion events 0, 2
    let mut music = state.indexes().tag_membership["music"].clone();
    music.sort_unstable();
    assert_eq!(music, [0, 1, 2, 3]);

    // Frequency is distinct-location cardinality
    assert_eq!(state.indexes().tag_frequency["music"], 2);
    assert_eq!(state.indexes().tag_frequency["food"], 1);
    assert_eq!(state.indexes().tag_frequency["camping"], 1);
    assert_eq!(
        state.indexes().all_tags,
        ["camping", "ceremony", "food", "music"]
    );

    Ok(())
}

#[test]
fn index_rebuild_is_idempotent_over_the_same_stores() {
    let mut state = AppState::new(&summer_config());
    state.ingest_batch(&locations_payload(), &initial_events_payload());

    let again = EventIndexes::rebuild(state.events(), state.locations(), state.window());
    assert_eq!(state.indexes(), &again);

    let search_again = SearchIndex::build(state.events(), state.locations(), &again.all_tags);
    assert_eq!(state.search(), &search_again);
}

#[test]
fn record_level_failures_never_abort_the_batch() {
    let mut state = AppState::new(&summer_config());
    let events: Vec<RawEventRecord> = serde_json::from_value(json!([
        {
            "name": "Broken Dates",
            "lat": "40.1", "lng": "-71.2",
            "occurrences": [["garbage", "", "", ""]]
        },
        {
            "name": "Survivor",
            "lat": "40.1", "lng": "-71.2",
            "occurrences": [["garbage", "", "", ""], ["2024-06-21", "", "", ""]]
        }
    ]))
    .unwrap();

    let summary = state.ingest_batch(&[], &events);
    assert_eq!(summary.events_added, 1);
    assert_eq!(state.events()[0].name, "Survivor");
    assert_eq!(state.events()[0].occurrences.len(), 1);
}

struct CannedSource;

#[async_trait::async_trait]
impl RecordSource for CannedSource {
    async fn fetch_locations(&self) -> Result<Vec<RawLocationRecord>, FetchError> {
        Ok(locations_payload())
    }

    async fn fetch_events(&self) -> Result<Vec<RawEventRecord>, FetchError> {
        Ok(initial_events_payload())
    }
}

#[tokio::test]
async fn ingest_through_a_record_source() -> Result<()> {
    let source = CannedSource;
    let mut state = AppState::new(&summer_config());
    let summary = state.ingest_batch(&source.fetch_locations().await?, &source.fetch_events().await?);
    assert_eq!(summary.events_added, 2);
    Ok(())
}
