//! Row decoding.

use crate::map_sqlx;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use epass_core::{
    AttendanceStatus, Club, ClubId, Event, EventDetails, EventId, Fee, RegisteredEvent,
    Registration, Role, StoreError, UserId,
};
use sqlx::Row;
use sqlx::postgres::PgRow;

/// Event columns joined with club and organizer display names.
pub(crate) const EVENT_DETAILS_SELECT: &str = r"
    SELECT e.id, e.name, e.description, e.event_date, e.event_time, e.location,
           e.max_participants, e.max_volunteers, e.fee_cents, e.organizer_usn,
           e.club_id, e.created_at,
           c.name AS club_name, s.name AS organizer_name
    FROM events e
    LEFT JOIN clubs c ON c.id = e.club_id
    LEFT JOIN students s ON s.usn = e.organizer_usn
";

/// Registration columns, in the order [`registration`] expects.
pub(crate) const REGISTRATION_COLUMNS: &str =
    "event_id, usn, role, status, registered_at, checked_in_at";

fn get<'r, T>(row: &'r PgRow, column: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column).map_err(map_sqlx)
}

pub(crate) fn fee(cents: i64) -> Result<Fee, StoreError> {
    u64::try_from(cents)
        .map(Fee::from_cents)
        .map_err(|_| StoreError::Decode(format!("negative fee: {cents}")))
}

pub(crate) fn event(row: &PgRow) -> Result<Event, StoreError> {
    Ok(Event {
        id: EventId::new(get(row, "id")?),
        name: get(row, "name")?,
        description: get(row, "description")?,
        date: get::<NaiveDate>(row, "event_date")?,
        time: get::<NaiveTime>(row, "event_time")?,
        location: get(row, "location")?,
        max_participants: get(row, "max_participants")?,
        max_volunteers: get(row, "max_volunteers")?,
        fee: fee(get(row, "fee_cents")?)?,
        organizer: UserId::new(get::<String>(row, "organizer_usn")?),
        club_id: get::<Option<i64>>(row, "club_id")?.map(ClubId::new),
        created_at: get::<DateTime<Utc>>(row, "created_at")?,
    })
}

pub(crate) fn event_details(row: &PgRow) -> Result<EventDetails, StoreError> {
    Ok(EventDetails {
        event: event(row)?,
        club_name: get(row, "club_name")?,
        organizer_name: get(row, "organizer_name")?,
    })
}

pub(crate) fn registration(row: &PgRow) -> Result<Registration, StoreError> {
    let role = get::<String>(row, "role")?
        .parse::<Role>()
        .map_err(|e| StoreError::Decode(e.to_string()))?;
    let status = get::<String>(row, "status")?
        .parse::<AttendanceStatus>()
        .map_err(|e| StoreError::Decode(e.to_string()))?;

    Ok(Registration {
        event_id: EventId::new(get(row, "event_id")?),
        user_id: UserId::new(get::<String>(row, "usn")?),
        role,
        status,
        registered_at: get(row, "registered_at")?,
        checked_in_at: get(row, "checked_in_at")?,
    })
}

/// A registration row joined with its event; registration columns are
/// prefixed `r_`.
pub(crate) fn registered_event(row: &PgRow) -> Result<RegisteredEvent, StoreError> {
    let role = get::<String>(row, "r_role")?
        .parse::<Role>()
        .map_err(|e| StoreError::Decode(e.to_string()))?;
    let status = get::<String>(row, "r_status")?
        .parse::<AttendanceStatus>()
        .map_err(|e| StoreError::Decode(e.to_string()))?;

    let event = event_details(row)?;
    Ok(RegisteredEvent {
        registration: Registration {
            event_id: event.event.id,
            user_id: UserId::new(get::<String>(row, "r_usn")?),
            role,
            status,
            registered_at: get(row, "r_registered_at")?,
            checked_in_at: get(row, "r_checked_in_at")?,
        },
        event,
    })
}

pub(crate) fn club(row: &PgRow) -> Result<Club, StoreError> {
    Ok(Club {
        id: ClubId::new(get(row, "id")?),
        name: get(row, "name")?,
        description: get(row, "description")?,
    })
}
