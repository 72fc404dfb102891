use crate::config::AppConfig;
use crate::domain::{Event, RawEventRecord, RawLocationRecord};
use crate::pipeline::indexing::search::SearchIndex;
use crate::pipeline::indexing::EventIndexes;
use crate::pipeline::processing::filter::DateWindow;
use crate::pipeline::processing::normalize::{EmojiPolicy, EventNormalizer};
use crate::pipeline::processing::registry::LocationRegistry;
use tracing::info;

/// What one ingestion batch changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    pub locations_added: usize,
    pub events_added: usize,
}

/// The owned application context threaded through the pipeline.
///
/// Stores are append-only: initial and append loads both go through
/// `ingest_batch`, which runs registry merge, normalization, admission,
/// and a full index rebuild as one logical step. Readers only ever see the
/// state from before or after a batch, never the middle.
pub struct AppState {
    window: DateWindow,
    emoji_policy: EmojiPolicy,
    locations: LocationRegistry,
    events: Vec<Event>,
    indexes: EventIndexes,
    search: SearchIndex,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            window: DateWindow::new(config.start_date, config.end_date),
            emoji_policy: EmojiPolicy {
                flag_emoji_fallback: config.flag_emoji_fallback,
            },
            locations: LocationRegistry::new(),
            events: Vec::new(),
            indexes: EventIndexes::default(),
            search: SearchIndex::default(),
        }
    }

    /// Ingests one batch: locations first (normalization reads the
    /// registry), then events with identifiers offset by the current store
    /// length, then a full rebuild of every derived index.
    ///
    /// Serves both the initial load and append loads; batches must be
    /// sequential, or the identifier-uniqueness guarantee breaks.
    pub fn ingest_batch(
        &mut self,
        raw_locations: &[RawLocationRecord],
        raw_events: &[RawEventRecord],
    ) -> IngestSummary {
        let locations_added = self.locations.register_batch(raw_locations);

        let admitted = {
            let normalizer =
                EventNormalizer::new(&self.locations, self.window, self.emoji_policy);
            normalizer.normalize_batch(raw_events, self.events.len() as u32)
        };
        let events_added = admitted.len();
        self.events.extend(admitted);

        self.indexes = EventIndexes::rebuild(&self.events, &self.locations, self.window);
        self.search = SearchIndex::build(&self.events, &self.locations, &self.indexes.all_tags);

        info!(
            locations_added,
            events_added,
            total_events = self.events.len(),
            "ingested batch"
        );
        IngestSummary {
            locations_added,
            events_added,
        }
    }

    /// Changes the active window. The windowed projection is NOT refreshed
    /// implicitly; call `refresh_window_projection` when ready.
    pub fn set_window(&mut self, window: DateWindow) {
        self.window = window;
    }

    /// Recomputes the windowed location grouping against the current
    /// window. Newly ingested batches are filtered by the new window too.
    pub fn refresh_window_projection(&mut self) {
        self.indexes
            .rebuild_window_projection(&self.events, self.window);
    }

    pub fn window(&self) -> DateWindow {
        self.window
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn locations(&self) -> &LocationRegistry {
        &self.locations
    }

    pub fn indexes(&self) -> &EventIndexes {
        &self.indexes
    }

    pub fn search(&self) -> &SearchIndex {
        &self.search
    }

    pub fn event_by_id(&self, id: u32) -> Option<&Event> {
        self.indexes.by_id.get(&id).map(|&i| &self.events[i])
    }
}
