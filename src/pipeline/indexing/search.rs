use crate::domain::Event;
use crate::pipeline::processing::registry::LocationRegistry;
use std::collections::HashMap;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Case-folds and strips diacritics: NFD decomposition, combining marks
/// removed, lowercased. "Café" and "cafe" normalize identically.
pub fn normalize_search_text(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Joins present-and-non-empty fields, each normalized individually, with
/// single spaces.
fn join_normalized<'a>(fields: impl IntoIterator<Item = Option<&'a str>>) -> String {
    fields
        .into_iter()
        .flatten()
        .filter(|f| !f.is_empty())
        .map(normalize_search_text)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Precomputed normalized search text per entity. Pure precomputation:
/// substring/token matching happens elsewhere.
#[derive(Debug, Default, PartialEq)]
pub struct SearchIndex {
    /// Event id -> normalized haystack.
    pub events: HashMap<u32, String>,
    /// Coordinate key -> normalized haystack.
    pub locations: HashMap<String, String>,
    /// Literal tag -> its own normalized form.
    pub tags: HashMap<String, String>,
}

impl SearchIndex {
    pub fn build(events: &[Event], registry: &LocationRegistry, all_tags: &[String]) -> Self {
        let mut index = SearchIndex::default();

        for event in events {
            let text = join_normalized([
                Some(event.name.as_str()),
                event.short_name.as_deref(),
                event.description.as_deref(),
                event.location.as_deref(),
                event.sublocation.as_deref(),
            ]);
            index.events.insert(event.id, text);
        }

        for location in registry.iter() {
            let tag_list = location.tags.join(" ");
            let text = join_normalized([
                Some(location.name.as_str()),
                location.short_name.as_deref(),
                Some(tag_list.as_str()),
            ]);
            index.locations.insert(location.key.clone(), text);
        }

        for tag in all_tags {
            index.tags.insert(tag.clone(), normalize_search_text(tag));
        }

        index
    }
}
