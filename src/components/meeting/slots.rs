//! Free-slot suggestions for the next few hours.
//!
//! The default check is textual: a candidate is taken only if its timestamp
//! does not appear inside any fetched event's start time. This is not conflict
//! detection. A slot that falls in the middle of an existing event is still
//! offered unless the `Overlap` strategy is selected.
//!
//! Candidates are expressed in the configured calendar zone, so labels, the
//! matching key and the booked wall-clock time all agree.

use crate::components::google_calendar::models::CalendarEvent;
use crate::components::google_calendar::time::event_interval;
use crate::error::{config_error, Error};
use chrono::{DateTime, Duration, Timelike, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Number of hourly candidates considered after now
pub const SLOT_COUNT: i64 = 4;

/// Display format of a slot, also accepted back from the form
pub const SLOT_LABEL_FORMAT: &str = "%Y-%m-%d %H:%M";

/// How candidates are checked against existing events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlotStrategy {
    /// Reject a candidate whose timestamp is a substring of an event's start
    #[default]
    #[serde(alias = "start-match")]
    StartTimeMatch,
    /// Reject a one-hour candidate that overlaps an event interval
    Overlap,
}

impl FromStr for SlotStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start-match" | "start-time-match" => Ok(SlotStrategy::StartTimeMatch),
            "overlap" => Ok(SlotStrategy::Overlap),
            other => Err(config_error(&format!("Unknown slot strategy: {}", other))),
        }
    }
}

/// A candidate meeting start in the calendar's zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Slot {
    start: DateTime<Tz>,
}

impl Slot {
    pub fn new(start: DateTime<Tz>) -> Self {
        Self { start }
    }

    pub fn start(&self) -> DateTime<Tz> {
        self.start
    }

    /// `YYYY-MM-DD HH:MM`
    pub fn label(&self) -> String {
        self.start.format(SLOT_LABEL_FORMAT).to_string()
    }

    /// ISO form used for matching: seconds always, microseconds only when non-zero
    pub fn match_key(&self) -> String {
        let base = self.start.naive_local().format("%Y-%m-%dT%H:%M:%S").to_string();
        let micros = self.start.nanosecond() / 1_000;
        if micros == 0 {
            base
        } else {
            format!("{}.{:06}", base, micros)
        }
    }

    fn is_free(&self, events: &[CalendarEvent], strategy: SlotStrategy) -> bool {
        match strategy {
            SlotStrategy::StartTimeMatch => {
                let key = self.match_key();
                events.iter().all(|event| !event.start_date_time().contains(&key))
            }
            SlotStrategy::Overlap => {
                let start = self.start.with_timezone(&Utc);
                let end = start + Duration::hours(1);
                events
                    .iter()
                    .filter_map(event_interval)
                    .all(|(event_start, event_end)| event_end <= start || event_start >= end)
            }
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Suggest up to [`SLOT_COUNT`] starts, one per hour after `now`, in order
pub fn suggest_slots(
    now: DateTime<Utc>,
    zone: Tz,
    events: &[CalendarEvent],
    strategy: SlotStrategy,
) -> Vec<Slot> {
    (1..=SLOT_COUNT)
        .map(|offset| Slot::new((now + Duration::hours(offset)).with_timezone(&zone)))
        .filter(|slot| slot.is_free(events, strategy))
        .collect()
}
