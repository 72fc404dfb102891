use crate::domain::Occurrence;
use chrono::{DateTime, Utc};

/// The application-configured visible date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Inclusive interval overlap: a single occurrence intersects the window
    /// when it starts no later than the window ends and ends no earlier
    /// than the window starts.
    pub fn intersects(&self, occurrence: &Occurrence) -> bool {
        occurrence.start <= self.end && occurrence.end >= self.start
    }

    /// An event is admitted iff at least one occurrence intersects.
    pub fn admits(&self, occurrences: &[Occurrence]) -> bool {
        occurrences.iter().any(|o| self.intersects(o))
    }
}
