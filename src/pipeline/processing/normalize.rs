use crate::domain::{coordinate_key, coordinate_text, Event, RawEventRecord};
use crate::pipeline::processing::filter::DateWindow;
use crate::pipeline::processing::registry::LocationRegistry;
use crate::pipeline::processing::resolver::resolve_occurrences;
use tracing::{debug, warn};

/// Renderer-capability hint injected by the host environment.
///
/// `flag_emoji_fallback` is true when the embedding renderer draws
/// regional-indicator flag pairs as two-letter boxes, in which case an
/// event's flag emoji is swapped for its location's emoji when one exists.
/// The core never inspects the platform itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmojiPolicy {
    pub flag_emoji_fallback: bool,
}

/// Turns raw records into admitted `Event`s against the current registry
/// and date window. A record either fully becomes a valid event or
/// contributes nothing.
pub struct EventNormalizer<'a> {
    registry: &'a LocationRegistry,
    window: DateWindow,
    emoji_policy: EmojiPolicy,
}

/// Two Unicode code points, both regional indicators (U+1F1E6..=U+1F1FF).
fn is_country_flag(emoji: &str) -> bool {
    let mut chars = emoji.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(a), Some(b), None) => {
            ('\u{1F1E6}'..='\u{1F1FF}').contains(&a) && ('\u{1F1E6}'..='\u{1F1FF}').contains(&b)
        }
        _ => false,
    }
}

fn decode_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).to_string()
}

/// Decoded optional text field; fields whose decoded value begins with a
/// literal "None" or "N/A" placeholder are blanked out.
fn decode_place_field(field: Option<&str>) -> Option<String> {
    let decoded = decode_entities(field?);
    if decoded.starts_with("None") || decoded.starts_with("N/A") {
        return None;
    }
    if decoded.is_empty() {
        return None;
    }
    Some(decoded)
}

impl<'a> EventNormalizer<'a> {
    pub fn new(registry: &'a LocationRegistry, window: DateWindow, emoji_policy: EmojiPolicy) -> Self {
        Self {
            registry,
            window,
            emoji_policy,
        }
    }

    /// Produces zero or one `Event` from a raw record. `id` is the
    /// caller-assigned ordinal for this load generation.
    pub fn normalize(&self, raw: &RawEventRecord, id: u32) -> Option<Event> {
        let name = raw.name.as_deref().map(decode_entities).unwrap_or_default();
        if name.trim().is_empty() {
            debug!(id, "skipping event without a name");
            return None;
        }

        let (lat, lng) = match (
            coordinate_text(raw.lat.as_ref()),
            coordinate_text(raw.lng.as_ref()),
        ) {
            (Some(lat), Some(lng)) => (lat, lng),
            _ => {
                debug!(%name, "skipping event without coordinates");
                return None;
            }
        };

        let raw_occurrences = raw.occurrences.as_deref().unwrap_or_default();
        let occurrences = resolve_occurrences(raw_occurrences);
        if occurrences.is_empty() {
            warn!(%name, "dropping event: no resolvable occurrences");
            return None;
        }
        if !self.window.admits(&occurrences) {
            debug!(%name, "dropping event: no occurrence inside the visible window");
            return None;
        }

        let location_key = coordinate_key(&lat, &lng);

        let mut emoji = raw.emoji.clone().filter(|e| !e.is_empty());
        if self.emoji_policy.flag_emoji_fallback {
            if let Some(flag) = emoji.as_deref().filter(|e| is_country_flag(e)) {
                if let Some(substitute) = self
                    .registry
                    .get(&location_key)
                    .and_then(|l| l.emoji.clone())
                {
                    debug!(%name, %flag, "substituting flag emoji with location emoji");
                    emoji = Some(substitute);
                }
            }
        }

        Some(Event {
            id,
            name,
            short_name: raw
                .short_name
                .as_deref()
                .map(decode_entities)
                .filter(|s| !s.is_empty()),
            description: raw
                .description
                .as_deref()
                .map(decode_entities)
                .filter(|s| !s.is_empty()),
            location: decode_place_field(raw.location.as_deref()),
            sublocation: decode_place_field(raw.sublocation.as_deref()),
            emoji,
            lat,
            lng,
            location_key,
            tags: raw.tags.clone().unwrap_or_default(),
            occurrences,
        })
    }

    /// Normalizes a whole batch, assigning ordinals starting at `base_id`.
    /// Rejected records still consume nothing: ids stay dense over the
    /// input ordinals, so the admitted set keeps the `base + ordinal`
    /// identifiers the append contract requires.
    pub fn normalize_batch(&self, raw: &[RawEventRecord], base_id: u32) -> Vec<Event> {
        raw.iter()
            .enumerate()
            .filter_map(|(ordinal, record)| self.normalize(record, base_id + ordinal as u32))
            .collect()
    }
}
