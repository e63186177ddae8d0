//! Event types for group events.
//!
//! This module provides the core types for events pulled from the group-event
//! API:
//! - [`EventRecord`]: A validated event as returned by the API adapter
//! - [`Venue`]: Where the event takes place, with explicitly optional fields

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// The location of an event.
///
/// Every field except `name` is optional. A field is `Some` only when the API
/// returned a value for it; the adapter never fills in placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    /// The venue name (empty when the API omits it).
    pub name: String,
    /// First address line.
    pub address_1: Option<String>,
    /// Second address line.
    pub address_2: Option<String>,
    /// Third address line.
    pub address_3: Option<String>,
    /// City.
    pub city: Option<String>,
    /// State or region.
    pub state: Option<String>,
    /// Postal code.
    pub zip: Option<String>,
}

impl Venue {
    /// Creates a venue with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Returns the address lines in order (line 1, 2, 3).
    pub fn address_lines(&self) -> [Option<&str>; 3] {
        [
            self.address_1.as_deref(),
            self.address_2.as_deref(),
            self.address_3.as_deref(),
        ]
    }

    /// Returns city, state and zip in order.
    pub fn locality(&self) -> [Option<&str>; 3] {
        [
            self.city.as_deref(),
            self.state.as_deref(),
            self.zip.as_deref(),
        ]
    }

    /// Builder method to set an address line (1-based, 1 to 3).
    ///
    /// Line numbers outside that range are ignored.
    pub fn with_address(mut self, line: usize, value: impl Into<String>) -> Self {
        let value = Some(value.into());
        match line {
            1 => self.address_1 = value,
            2 => self.address_2 = value,
            3 => self.address_3 = value,
            _ => {}
        }
        self
    }

    /// Builder method to set the city.
    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    /// Builder method to set the state.
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Builder method to set the zip code.
    pub fn with_zip(mut self, zip: impl Into<String>) -> Self {
        self.zip = Some(zip.into());
        self
    }
}

/// An event as returned by the event-listing API.
///
/// Records are read-only once built. The display title derived from `name`
/// is carried separately by the export pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Unique identifier for the event within the API.
    pub id: String,
    /// The event name as published by the group.
    pub name: String,
    /// When the event starts.
    pub time: DateTime<Utc>,
    /// Where the event takes place, if announced.
    pub venue: Option<Venue>,
    /// The HTML description.
    pub description: String,
    /// Last update, in milliseconds since the Unix epoch.
    pub updated: i64,
}

impl EventRecord {
    /// Creates a new EventRecord with required fields.
    pub fn new(id: impl Into<String>, name: impl Into<String>, time: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            time,
            venue: None,
            description: String::new(),
            updated: time.timestamp_millis(),
        }
    }

    /// Creates a record from a millisecond epoch start time.
    ///
    /// Returns `None` when the timestamp is out of range.
    pub fn from_millis(id: impl Into<String>, name: impl Into<String>, millis: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(millis).map(|time| Self::new(id, name, time))
    }

    /// Returns the start time in the given timezone.
    pub fn start_in<Tz: TimeZone>(&self, tz: &Tz) -> DateTime<Tz> {
        self.time.with_timezone(tz)
    }

    /// Returns the start time in the local timezone.
    pub fn start_local(&self) -> DateTime<Local> {
        self.start_in(&Local)
    }

    /// Builder method to set the venue.
    pub fn with_venue(mut self, venue: Venue) -> Self {
        self.venue = Some(venue);
        self
    }

    /// Builder method to set the HTML description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder method to set the update timestamp (milliseconds).
    pub fn with_updated(mut self, updated: i64) -> Self {
        self.updated = updated;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn record_defaults() {
        let start = utc(2024, 3, 15, 18, 30);
        let record = EventRecord::new("evt-1", "Rust Night", start);

        assert_eq!(record.id, "evt-1");
        assert_eq!(record.name, "Rust Night");
        assert!(record.venue.is_none());
        assert!(record.description.is_empty());
        assert_eq!(record.updated, start.timestamp_millis());
    }

    #[test]
    fn from_millis_converts_epoch() {
        let record = EventRecord::from_millis("evt-1", "Rust Night", 1_710_527_400_000).unwrap();
        assert_eq!(record.time, utc(2024, 3, 15, 18, 30));
    }

    #[test]
    fn from_millis_rejects_out_of_range() {
        assert!(EventRecord::from_millis("evt-1", "Rust Night", i64::MAX).is_none());
    }

    #[test]
    fn start_in_converts_timezone() {
        let record = EventRecord::new("evt-1", "Rust Night", utc(2024, 3, 15, 23, 30));
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let local = record.start_in(&tz);
        assert_eq!(local.format("%Y-%m-%d %H:%M").to_string(), "2024-03-16 01:30");
    }

    #[test]
    fn venue_builder() {
        let venue = Venue::new("Hack Space")
            .with_address(1, "1 Main St")
            .with_address(3, "Rear entrance")
            .with_address(7, "ignored")
            .with_city("Springfield")
            .with_zip("12345");

        assert_eq!(venue.address_lines(), [Some("1 Main St"), None, Some("Rear entrance")]);
        assert_eq!(venue.locality(), [Some("Springfield"), None, Some("12345")]);
    }
}
