pub mod search;

use crate::domain::Event;
use crate::pipeline::processing::filter::DateWindow;
use crate::pipeline::processing::registry::LocationRegistry;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::info;

/// Derived lookup structures over the admitted event set.
///
/// None of these are authoritative: every batch triggers a full rebuild
/// from the event store and location registry, trading recomputation cost
/// for the absence of index-drift bugs.
#[derive(Debug, Default, PartialEq)]
pub struct EventIndexes {
    /// Event id -> position in the event store.
    pub by_id: HashMap<u32, usize>,
    /// Coordinate key -> event ids at that location, in append order.
    pub by_location: HashMap<String, Vec<u32>>,
    /// Same grouping restricted to the active date window.
    pub by_location_in_window: HashMap<String, Vec<u32>>,
    /// Tag -> ids of events whose own or whose location's tags include it.
    pub tag_membership: HashMap<String, Vec<u32>>,
    /// Tag -> count of distinct coordinate keys carrying it.
    pub tag_frequency: HashMap<String, usize>,
    /// Sorted union of every tag seen on any event or location.
    pub all_tags: Vec<String>,
}

/// Union of an event's own tags and its location's tags, preserving the
/// event-tag order first.
fn merged_tags<'a>(event: &'a Event, registry: &'a LocationRegistry) -> Vec<&'a str> {
    let mut merged: Vec<&str> = event.tags.iter().map(String::as_str).collect();
    if let Some(location) = registry.get(&event.location_key) {
        for tag in &location.tags {
            if !merged.contains(&tag.as_str()) {
                merged.push(tag);
            }
        }
    }
    merged
}

impl EventIndexes {
    /// Full rebuild from the stored events and registry. Pure and
    /// idempotent: rebuilding twice from the same inputs yields identical
    /// contents.
    pub fn rebuild(events: &[Event], registry: &LocationRegistry, window: DateWindow) -> Self {
        let mut indexes = EventIndexes::default();

        let mut tag_locations: HashMap<&str, HashSet<&str>> = HashMap::new();
        let mut tag_universe: BTreeSet<&str> = BTreeSet::new();

        for (position, event) in events.iter().enumerate() {
            indexes.by_id.insert(event.id, position);
            indexes
                .by_location
                .entry(event.location_key.clone())
                .or_default()
                .push(event.id);

            for tag in merged_tags(event, registry) {
                indexes
                    .tag_membership
                    .entry(tag.to_string())
                    .or_default()
                    .push(event.id);
                tag_locations
                    .entry(tag)
                    .or_default()
                    .insert(&event.location_key);
                tag_universe.insert(tag);
            }
        }

        // Location-level tags count toward frequency and the universe even
        // when no event references the location.
        for location in registry.iter() {
            for tag in &location.tags {
                tag_locations.entry(tag).or_default().insert(&location.key);
                tag_universe.insert(tag);
            }
        }

        indexes.tag_frequency = tag_locations
            .into_iter()
            .map(|(tag, keys)| (tag.to_string(), keys.len()))
            .collect();
        indexes.all_tags = tag_universe.into_iter().map(str::to_string).collect();

        indexes.rebuild_window_projection(events, window);

        info!(
            events = events.len(),
            locations = registry.len(),
            tags = indexes.all_tags.len(),
            "rebuilt event indexes"
        );
        indexes
    }

    /// Recomputes only the windowed grouping. Callers invoke this after
    /// changing the active window; ingestion calls it as part of `rebuild`.
    pub fn rebuild_window_projection(&mut self, events: &[Event], window: DateWindow) {
        self.by_location_in_window.clear();
        for event in events {
            if window.admits(&event.occurrences) {
                self.by_location_in_window
                    .entry(event.location_key.clone())
                    .or_default()
                    .push(event.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Occurrence, RawLocationRecord};
    use chrono::{DateTime, Utc};
    use serde_json::json;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn event(id: u32, key: &str, tags: &[&str], start: &str) -> Event {
        let (lat, lng) = key.split_once(',').unwrap();
        Event {
            id,
            name: format!("Event {id}"),
            short_name: None,
            description: None,
            location: None,
            sublocation: None,
            emoji: None,
            lat: lat.to_string(),
            lng: lng.to_string(),
            location_key: key.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            occurrences: vec![Occurrence {
                start: utc(start),
                end: utc(start),
                start_time_text: String::new(),
                end_time_text: String::new(),
            }],
        }
    }

    fn tagged_location(key: &str, tags: &[&str]) -> RawLocationRecord {
        let (lat, lng) = key.split_once(',').unwrap();
        RawLocationRecord {
            lat: Some(json!(lat)),
            lng: Some(json!(lng)),
            name: Some(format!("Location {key}")),
            short_name: None,
            emoji: None,
            tags: Some(tags.iter().map(|t| t.to_string()).collect()),
        }
    }

    fn wide_window() -> DateWindow {
        DateWindow::new(utc("2024-01-01T00:00:00Z"), utc("2024-12-31T00:00:00Z"))
    }

    #[test]
    fn frequency_counts_locations_not_events() {
        let mut registry = LocationRegistry::new();
        registry.register_batch(&[tagged_location("1,1", &[])]);

        // Three co-tagged events at one location: frequency stays 1
        let events = vec![
            event(0, "1,1", &["food"], "2024-06-01T00:00:00Z"),
            event(1, "1,1", &["food"], "2024-06-02T00:00:00Z"),
            event(2, "1,1", &["food"], "2024-06-03T00:00:00Z"),
            event(3, "2,2", &["food"], "2024-06-04T00:00:00Z"),
        ];
        let indexes = EventIndexes::rebuild(&events, &registry, wide_window());

        assert_eq!(indexes.tag_frequency["food"], 2);
        assert_eq!(indexes.tag_membership["food"], vec![0, 1, 2, 3]);
    }

    #[test]
    fn location_tags_join_membership_and_frequency() {
        let mut registry = LocationRegistry::new();
        registry.register_batch(&[
            tagged_location("1,1", &["camping"]),
            // No events reference this one; its tag still counts
            tagged_location("9,9", &["quiet"]),
        ]);

        let events = vec![event(0, "1,1", &["music"], "2024-06-01T00:00:00Z")];
        let indexes = EventIndexes::rebuild(&events, &registry, wide_window());

        assert_eq!(indexes.tag_membership["camping"], vec![0]);
        assert_eq!(indexes.tag_frequency["camping"], 1);
        assert_eq!(indexes.tag_frequency["quiet"], 1);
        assert!(!indexes.tag_membership.contains_key("quiet"));
        assert_eq!(indexes.all_tags, ["camping", "music", "quiet"]);
    }

    #[test]
    fn grouping_preserves_append_order() {
        let registry = LocationRegistry::new();
        let events = vec![
            event(0, "1,1", &[], "2024-06-01T00:00:00Z"),
            event(1, "2,2", &[], "2024-06-01T00:00:00Z"),
            event(2, "1,1", &[], "2024-05-01T00:00:00Z"),
        ];
        let indexes = EventIndexes::rebuild(&events, &registry, wide_window());

        assert_eq!(indexes.by_location["1,1"], vec![0, 2]);
        assert_eq!(indexes.by_location["2,2"], vec![1]);
        assert_eq!(indexes.by_id.len(), 3);
        assert_eq!(indexes.by_id[&2], 2);
    }

    #[test]
    fn window_projection_follows_the_window() {
        let registry = LocationRegistry::new();
        let events = vec![
            event(0, "1,1", &[], "2024-03-01T00:00:00Z"),
            event(1, "1,1", &[], "2024-09-01T00:00:00Z"),
        ];
        let mut indexes = EventIndexes::rebuild(&events, &registry, wide_window());
        assert_eq!(indexes.by_location_in_window["1,1"], vec![0, 1]);

        let narrow = DateWindow::new(utc("2024-08-01T00:00:00Z"), utc("2024-10-01T00:00:00Z"));
        indexes.rebuild_window_projection(&events, narrow);
        assert_eq!(indexes.by_location_in_window["1,1"], vec![1]);
        // The unfiltered grouping is untouched
        assert_eq!(indexes.by_location["1,1"], vec![0, 1]);
    }

    #[test]
    fn rebuild_is_idempotent() {
        let mut registry = LocationRegistry::new();
        registry.register_batch(&[tagged_location("1,1", &["camping"])]);
        let events = vec![
            event(0, "1,1", &["music"], "2024-06-01T00:00:00Z"),
            event(1, "2,2", &["food"], "2024-06-02T00:00:00Z"),
        ];

        let first = EventIndexes::rebuild(&events, &registry, wide_window());
        let second = EventIndexes::rebuild(&events, &registry, wide_window());
        assert_eq!(first, second);
    }
}
