use crate::domain::{Occurrence, RawOccurrence};
use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday,
};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Free-form 12-hour clock text: "2:30pm", "11 AM", "12:00 a.m.".
/// A bare hour with no meridiem marker is not a valid time.
static TWELVE_HOUR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(\d{1,2})(?::(\d{2}))?\s*([ap])\.?\s*m?\.?\s*$").unwrap()
});

const SECONDS_PER_HOUR: i32 = 3600;

/// Nth `weekday` of the given month (1-based n). The result always exists
/// for n <= 4, which covers both DST rule anchors.
fn nth_weekday_of_month(year: i32, month: u32, weekday: Weekday, n: u32) -> NaiveDate {
    let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap();
    let offset = (7 + weekday.num_days_from_sunday() - first.weekday().num_days_from_sunday()) % 7;
    first + chrono::Duration::days((offset + (n - 1) * 7) as i64)
}

/// UTC offset for a civil US Eastern wall-clock instant.
///
/// Standard time is UTC-5; between 02:00 local on the second Sunday of
/// March and 02:00 local on the first Sunday of November the offset is
/// UTC-4. This reproduces the calendar rule directly rather than consulting
/// a tz database, because downstream display logic depends on this exact
/// behavior. Swap this function out to adopt a real timezone library.
pub fn eastern_utc_offset(local: NaiveDateTime) -> FixedOffset {
    let year = local.year();
    let dst_start = nth_weekday_of_month(year, 3, Weekday::Sun, 2)
        .and_hms_opt(2, 0, 0)
        .unwrap();
    let dst_end = nth_weekday_of_month(year, 11, Weekday::Sun, 1)
        .and_hms_opt(2, 0, 0)
        .unwrap();

    let hours_west = if local >= dst_start && local < dst_end {
        4
    } else {
        5
    };
    FixedOffset::west_opt(hours_west * SECONDS_PER_HOUR).unwrap()
}

fn parse_twelve_hour(time: &str) -> Option<NaiveTime> {
    let caps = TWELVE_HOUR_RE.captures(time)?;
    let hour: u32 = caps[1].parse().ok()?;
    if hour == 0 || hour > 12 {
        return None;
    }
    let minute: u32 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    let is_pm = caps[3].eq_ignore_ascii_case("p");
    let hour24 = match (hour, is_pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, false) => h,
        (h, true) => h + 12,
    };
    NaiveTime::from_hms_opt(hour24, minute, 0)
}

/// Resolves a calendar date and 12-hour time-of-day, both expressed in US
/// Eastern civil time, to an absolute instant. Missing or unparseable time
/// defaults to noon; an unparseable date yields `None`. Never panics.
pub fn resolve_instant(date: &str, time: &str) -> Option<DateTime<Utc>> {
    let day = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
    let time_of_day =
        parse_twelve_hour(time).unwrap_or_else(|| NaiveTime::from_hms_opt(12, 0, 0).unwrap());
    let local = day.and_time(time_of_day);
    let offset = eastern_utc_offset(local);
    offset
        .from_local_datetime(&local)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Resolves a raw occurrence list into ordered `Occurrence`s.
///
/// A blank end date falls back to the start date and a blank end time falls
/// back to the start time, so a fully blank end collapses to exactly
/// `start`. Tuples whose start cannot be resolved are dropped. The result
/// is sorted ascending by start; the sort is stable so ties keep their
/// input order.
pub fn resolve_occurrences(raw: &[RawOccurrence]) -> Vec<Occurrence> {
    let mut resolved = Vec::with_capacity(raw.len());
    for (start_date, start_time, end_date, end_time) in raw {
        let start_date = start_date.as_deref().unwrap_or("").trim();
        let start_time = start_time.as_deref().unwrap_or("");
        let end_date = end_date.as_deref().unwrap_or("").trim();
        let end_time = end_time.as_deref().unwrap_or("");

        let start = match resolve_instant(start_date, start_time) {
            Some(start) => start,
            None => {
                debug!(start_date, "dropping occurrence with unresolvable start");
                continue;
            }
        };

        let effective_end_date = if end_date.is_empty() { start_date } else { end_date };
        let effective_end_time = if end_time.trim().is_empty() {
            start_time
        } else {
            end_time
        };
        let end = resolve_instant(effective_end_date, effective_end_time)
            .map(|end| end.max(start))
            .unwrap_or(start);

        resolved.push(Occurrence {
            start,
            end,
            start_time_text: start_time.to_string(),
            end_time_text: end_time.to_string(),
        });
    }

    resolved.sort_by_key(|o| o.start);
    resolved
}
