//! Event catalog: ongoing, completed and upcoming buckets.
//!
//! Classification is computed at read time and never persisted. Each event's
//! calendar day is compared with today's calendar day in the configured time
//! zone; the time of day is ignored.

use crate::error::CatalogError;
use crate::types::{Event, EventDetails, EventId};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;

/// Anything that can be placed on the calendar.
pub trait Scheduled {
    /// Identifier used when reporting a rejected entry.
    fn event_id(&self) -> EventId;

    /// Calendar day of the event.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::MalformedDate`] if the date cannot be read.
    fn scheduled_on(&self) -> Result<NaiveDate, CatalogError>;
}

impl Scheduled for Event {
    fn event_id(&self) -> EventId {
        self.id
    }

    fn scheduled_on(&self) -> Result<NaiveDate, CatalogError> {
        Ok(self.date)
    }
}

impl Scheduled for EventDetails {
    fn event_id(&self) -> EventId {
        self.event.id
    }

    fn scheduled_on(&self) -> Result<NaiveDate, CatalogError> {
        Ok(self.event.date)
    }
}

/// Which bucket an event falls into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Takes place today
    Ongoing,
    /// Took place on an earlier day
    Completed,
    /// Takes place on a later day
    Upcoming,
}

impl Phase {
    /// Classify a calendar day against today.
    #[must_use]
    pub fn of(date: NaiveDate, today: NaiveDate) -> Self {
        match date.cmp(&today) {
            std::cmp::Ordering::Equal => Self::Ongoing,
            std::cmp::Ordering::Less => Self::Completed,
            std::cmp::Ordering::Greater => Self::Upcoming,
        }
    }
}

/// Events split into three disjoint buckets, each in input order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Categorized<T> {
    /// Dated today
    pub ongoing: Vec<T>,
    /// Dated before today
    pub completed: Vec<T>,
    /// Dated after today
    pub upcoming: Vec<T>,
    /// Entries excluded because their date could not be read
    #[serde(skip)]
    pub rejected: Vec<CatalogError>,
}

impl<T> Default for Categorized<T> {
    fn default() -> Self {
        Self {
            ongoing: Vec::new(),
            completed: Vec::new(),
            upcoming: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

impl<T> Categorized<T> {
    /// Number of events placed in a bucket.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ongoing.len() + self.completed.len() + self.upcoming.len()
    }

    /// True when no event was placed in any bucket.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Pure classifier bound to the server's time zone.
#[derive(Clone, Copy, Debug)]
pub struct EventCatalog {
    time_zone: Tz,
}

impl EventCatalog {
    /// Create a catalog for the given time zone.
    #[must_use]
    pub const fn new(time_zone: Tz) -> Self {
        Self { time_zone }
    }

    /// The configured time zone.
    #[must_use]
    pub const fn time_zone(&self) -> Tz {
        self.time_zone
    }

    /// Today's calendar day in the configured time zone.
    #[must_use]
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.time_zone).date_naive()
    }

    /// Split `events` into ongoing, completed and upcoming relative to `now`.
    ///
    /// Entries with an unreadable date are logged, reported in
    /// [`Categorized::rejected`], and left out of every bucket.
    pub fn categorize<T, I>(&self, events: I, now: DateTime<Utc>) -> Categorized<T>
    where
        T: Scheduled,
        I: IntoIterator<Item = T>,
    {
        let today = self.today(now);
        let mut out = Categorized::default();

        for event in events {
            match event.scheduled_on() {
                Ok(date) => match Phase::of(date, today) {
                    Phase::Ongoing => out.ongoing.push(event),
                    Phase::Completed => out.completed.push(event),
                    Phase::Upcoming => out.upcoming.push(event),
                },
                Err(err) => {
                    tracing::warn!(
                        event_id = %event.event_id(),
                        error = %err,
                        "Excluding event with malformed date from catalog"
                    );
                    out.rejected.push(err);
                }
            }
        }

        out
    }
}
