use crate::domain::{coordinate_key, coordinate_text, Location, RawLocationRecord};
use std::collections::HashMap;
use tracing::debug;

/// Deduplicated store of locations keyed by coordinate text.
///
/// First writer for a given key wins; later records with the same key are
/// discarded whole, with no field-level merge. Insertion order is preserved
/// for index building.
#[derive(Debug, Default)]
pub struct LocationRegistry {
    by_key: HashMap<String, usize>,
    locations: Vec<Location>,
}

impl LocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges a raw batch into the registry, returning how many records
    /// were actually inserted. Records without usable coordinates are
    /// skipped.
    pub fn register_batch(&mut self, raw: &[RawLocationRecord]) -> usize {
        let mut inserted = 0;
        for record in raw {
            let (lat, lng) = match (
                coordinate_text(record.lat.as_ref()),
                coordinate_text(record.lng.as_ref()),
            ) {
                (Some(lat), Some(lng)) => (lat, lng),
                _ => {
                    debug!(name = ?record.name, "skipping location without coordinates");
                    continue;
                }
            };
            let key = coordinate_key(&lat, &lng);
            if self.by_key.contains_key(&key) {
                debug!(%key, "discarding duplicate location record");
                continue;
            }

            let location = Location {
                key: key.clone(),
                name: record.name.clone().unwrap_or_default(),
                short_name: record.short_name.clone(),
                emoji: record.emoji.clone(),
                tags: record.tags.clone().unwrap_or_default(),
                lat,
                lng,
            };
            self.by_key.insert(key, self.locations.len());
            self.locations.push(location);
            inserted += 1;
        }
        inserted
    }

    pub fn get(&self, key: &str) -> Option<&Location> {
        self.by_key.get(key).map(|&i| &self.locations[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    /// Locations in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
