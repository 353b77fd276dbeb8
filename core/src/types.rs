//! Domain types for campus event registration.
//!
//! Identifiers, roles, attendance status, slot limits and the event and
//! registration records exchanged with the repositories.

use crate::error::RegistrationError;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an event (store-assigned integer).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(i64);

impl EventId {
    /// Wrap a raw store identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw identifier.
    #[must_use]
    pub const fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EventId {
    type Err = RegistrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| RegistrationError::InvalidArgument(format!("invalid event id: {s}")))
    }
}

/// Identifier of an authenticated user (the student's USN).
///
/// The format is validated at the input boundary; the core treats it as opaque.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a user identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a club.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClubId(i64);

impl ClubId {
    /// Wrap a raw store identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw identifier.
    #[must_use]
    pub const fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ClubId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Roles and status
// ============================================================================

/// The capacity a user takes at an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Attends the event
    Participant,
    /// Helps staff the event
    Volunteer,
}

impl Role {
    /// Both roles, in display order.
    pub const ALL: [Self; 2] = [Self::Participant, Self::Volunteer];

    /// Storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Participant => "participant",
            Self::Volunteer => "volunteer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RegistrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "participant" => Ok(Self::Participant),
            "volunteer" => Ok(Self::Volunteer),
            other => Err(RegistrationError::InvalidArgument(format!(
                "unknown role: {other}"
            ))),
        }
    }
}

/// Attendance status of a registration.
///
/// The only transition is `Registered` to `Attended`, performed by check-in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    /// Signed up, not yet scanned
    #[default]
    Registered,
    /// Ticket scanned at the venue
    Attended,
}

impl AttendanceStatus {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Attended => "attended",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = RegistrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registered" => Ok(Self::Registered),
            "attended" => Ok(Self::Attended),
            other => Err(RegistrationError::InvalidArgument(format!(
                "unknown attendance status: {other}"
            ))),
        }
    }
}

// ============================================================================
// Capacity
// ============================================================================

/// Configured limit for one role on one event.
///
/// Built from the raw stored column: `None` is unlimited, any stored value
/// at or below zero is a limit of zero (fully booked), never unlimited.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotLimit {
    /// No cap configured
    Unlimited,
    /// At most this many registrations
    Limited(u32),
}

impl SlotLimit {
    /// Interpret a stored capacity column.
    #[must_use]
    pub fn from_configured(raw: Option<i32>) -> Self {
        match raw {
            None => Self::Unlimited,
            Some(n) => Self::Limited(u32::try_from(n).unwrap_or(0)),
        }
    }

    /// Remaining slots given the current registration count, floored at zero.
    #[must_use]
    pub const fn remaining(&self, current: u32) -> Slots {
        match self {
            Self::Unlimited => Slots::Unlimited,
            Self::Limited(max) => Slots::Remaining(max.saturating_sub(current)),
        }
    }

    /// Whether one more registration fits.
    #[must_use]
    pub const fn admits(&self, current: u32) -> bool {
        self.remaining(current).is_available()
    }
}

/// Remaining capacity for a role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slots {
    /// Always available
    Unlimited,
    /// Exact number of open slots
    Remaining(u32),
}

impl Slots {
    /// True iff unlimited or at least one slot is open.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        match self {
            Self::Unlimited => true,
            Self::Remaining(n) => *n > 0,
        }
    }
}

// ============================================================================
// Money
// ============================================================================

/// Registration fee in paise (hundredths), never negative.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fee(u64);

impl Fee {
    /// No charge.
    pub const FREE: Self = Self(0);

    /// Create a fee from hundredths of the currency unit.
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Amount in hundredths.
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Checks if the event is free
    #[must_use]
    pub const fn is_free(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Fee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Records
// ============================================================================

/// A stored event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Store-assigned identifier
    pub id: EventId,
    /// Display name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Calendar day the event takes place
    pub date: NaiveDate,
    /// Start time on that day
    pub time: NaiveTime,
    /// Venue
    pub location: String,
    /// Participant capacity as stored (`None` = unlimited)
    pub max_participants: Option<i32>,
    /// Volunteer capacity as stored (`None` = unlimited)
    pub max_volunteers: Option<i32>,
    /// Registration fee
    pub fee: Fee,
    /// User who created the event
    pub organizer: UserId,
    /// Club the event is organized under, if any
    pub club_id: Option<ClubId>,
    /// When the row was written
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Capacity limit configured for a role.
    #[must_use]
    pub fn limit_for(&self, role: Role) -> SlotLimit {
        match role {
            Role::Participant => SlotLimit::from_configured(self.max_participants),
            Role::Volunteer => SlotLimit::from_configured(self.max_volunteers),
        }
    }
}

/// An event joined with the display names of its organizer and club.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetails {
    /// The event row
    #[serde(flatten)]
    pub event: Event,
    /// Organizing club name, when the event belongs to a club
    pub club_name: Option<String>,
    /// Organizer's display name, when known
    pub organizer_name: Option<String>,
}

impl EventDetails {
    /// Details with no display names resolved.
    #[must_use]
    pub const fn bare(event: Event) -> Self {
        Self {
            event,
            club_name: None,
            organizer_name: None,
        }
    }
}

/// Input for creating an event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    /// Display name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Calendar day; must be after today when created
    pub date: NaiveDate,
    /// Start time
    pub time: NaiveTime,
    /// Venue
    pub location: String,
    /// Participant capacity (`None` = unlimited)
    #[serde(default)]
    pub max_participants: Option<i32>,
    /// Volunteer capacity (`None` = unlimited)
    #[serde(default)]
    pub max_volunteers: Option<i32>,
    /// Registration fee, free by default
    #[serde(default)]
    pub fee: Fee,
    /// Club to organize under; the organizer must be a member
    #[serde(default)]
    pub club_id: Option<ClubId>,
}

/// One user's registration for one event in one role.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Event registered for
    pub event_id: EventId,
    /// Registered user
    pub user_id: UserId,
    /// Role held
    pub role: Role,
    /// Attendance status
    pub status: AttendanceStatus,
    /// When the registration was created
    pub registered_at: DateTime<Utc>,
    /// When the ticket was scanned
    pub checked_in_at: Option<DateTime<Utc>>,
}

/// A registration joined with the event it refers to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredEvent {
    /// Event with display names
    pub event: EventDetails,
    /// The user's registration
    pub registration: Registration,
}

/// A student club.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Club {
    /// Club identifier
    pub id: ClubId,
    /// Display name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
}

/// An event as seen by one viewer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventView {
    /// Event with display names
    #[serde(flatten)]
    pub details: EventDetails,
    /// Viewer holds a participant registration
    pub is_participant: bool,
    /// Viewer holds a volunteer registration
    pub is_volunteer: bool,
    /// Viewer created the event
    pub is_organizer: bool,
    /// Open participant slots
    pub participant_slots: Slots,
    /// Open volunteer slots
    pub volunteer_slots: Slots,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_capacity_is_unlimited() {
        assert_eq!(SlotLimit::from_configured(None), SlotLimit::Unlimited);
        assert_eq!(SlotLimit::Unlimited.remaining(10_000), Slots::Unlimited);
    }

    #[test]
    fn zero_or_negative_capacity_is_fully_booked() {
        for raw in [0, -1, i32::MIN] {
            let limit = SlotLimit::from_configured(Some(raw));
            assert_eq!(limit, SlotLimit::Limited(0));
            assert_eq!(limit.remaining(0), Slots::Remaining(0));
            assert!(!limit.admits(0));
        }
    }

    #[test]
    fn remaining_never_goes_negative() {
        let limit = SlotLimit::from_configured(Some(2));
        assert_eq!(limit.remaining(1), Slots::Remaining(1));
        assert_eq!(limit.remaining(2), Slots::Remaining(0));
        assert_eq!(limit.remaining(7), Slots::Remaining(0));
    }

    #[test]
    fn role_parses_storage_names() {
        assert_eq!("participant".parse::<Role>().ok(), Some(Role::Participant));
        assert_eq!("volunteer".parse::<Role>().ok(), Some(Role::Volunteer));
        assert!(matches!(
            "organizer".parse::<Role>(),
            Err(RegistrationError::InvalidArgument(_))
        ));
    }

    #[test]
    fn fee_display() {
        assert_eq!(Fee::from_cents(15_050).to_string(), "150.50");
        assert!(Fee::default().is_free());
    }

    #[test]
    fn event_id_rejects_garbage() {
        assert_eq!("42".parse::<EventId>().ok(), Some(EventId::new(42)));
        assert!("4x2".parse::<EventId>().is_err());
    }
}
