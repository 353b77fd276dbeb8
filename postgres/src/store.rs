//! [`PostgresStore`]: the production repository implementation.

use crate::map_sqlx;
use crate::rows::{self, EVENT_DETAILS_SELECT, REGISTRATION_COLUMNS};
use chrono::{DateTime, Utc};
use epass_core::{
    CheckInOutcome, Club, ClubId, Event, EventDetails, EventId, EventRepository, IdentityProvider,
    InsertOutcome, MembershipRepository, NewEvent, RegisteredEvent, Registration,
    RegistrationRepository, Role, SlotLimit, StoreError, StoreFuture, StoreStream, UserId,
};
use futures::StreamExt;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Row, Transaction};
use std::time::Duration;

/// `PostgreSQL`-backed events, registrations, clubs and sessions.
///
/// Cloning is cheap; clones share the pool.
#[derive(Clone, Debug)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with default pool settings.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the database cannot be reached.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await
            .map_err(map_sqlx)?;
        Ok(Self { pool })
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Migration failed: {e}")))?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    async fn rollback(tx: Transaction<'_, Postgres>) -> Result<(), StoreError> {
        tx.rollback().await.map_err(map_sqlx)
    }

    async fn conditional_insert(
        &self,
        event_id: EventId,
        user_id: UserId,
        role: Role,
        registered_at: DateTime<Utc>,
    ) -> Result<InsertOutcome, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        // Serialises registrations for this event until commit.
        let locked = sqlx::query(
            "SELECT max_participants, max_volunteers FROM events WHERE id = $1 FOR UPDATE",
        )
        .bind(event_id.get())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        let Some(limits) = locked else {
            Self::rollback(tx).await?;
            return Ok(InsertOutcome::EventMissing);
        };
        let column = match role {
            Role::Participant => "max_participants",
            Role::Volunteer => "max_volunteers",
        };
        let limit = SlotLimit::from_configured(limits.try_get(column).map_err(map_sqlx)?);

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM registrations \
             WHERE event_id = $1 AND usn = $2 AND role = $3)",
        )
        .bind(event_id.get())
        .bind(user_id.as_str())
        .bind(role.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx)?;
        if exists {
            Self::rollback(tx).await?;
            return Ok(InsertOutcome::Duplicate);
        }

        let current: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM registrations WHERE event_id = $1 AND role = $2",
        )
        .bind(event_id.get())
        .bind(role.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx)?;
        if !limit.admits(u32::try_from(current).unwrap_or(u32::MAX)) {
            Self::rollback(tx).await?;
            return Ok(InsertOutcome::Full);
        }

        let inserted = sqlx::query(&format!(
            r"
            INSERT INTO registrations (event_id, usn, role, status, registered_at)
            VALUES ($1, $2, $3, 'registered', $4)
            ON CONFLICT DO NOTHING
            RETURNING {REGISTRATION_COLUMNS}
            "
        ))
        .bind(event_id.get())
        .bind(user_id.as_str())
        .bind(role.as_str())
        .bind(registered_at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        let Some(row) = inserted else {
            Self::rollback(tx).await?;
            return Ok(InsertOutcome::Duplicate);
        };
        let registration = rows::registration(&row)?;
        tx.commit().await.map_err(map_sqlx)?;

        Ok(InsertOutcome::Inserted(registration))
    }

    async fn conditional_check_in(
        &self,
        event_id: EventId,
        user_id: UserId,
        role: Role,
        at: DateTime<Utc>,
    ) -> Result<CheckInOutcome, StoreError> {
        let updated = sqlx::query(&format!(
            r"
            UPDATE registrations
            SET status = 'attended', checked_in_at = $4
            WHERE event_id = $1 AND usn = $2 AND role = $3 AND status = 'registered'
            RETURNING {REGISTRATION_COLUMNS}
            "
        ))
        .bind(event_id.get())
        .bind(user_id.as_str())
        .bind(role.as_str())
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if let Some(row) = updated {
            return Ok(CheckInOutcome::CheckedIn(rows::registration(&row)?));
        }

        // Nothing changed: either no row or already attended.
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM registrations \
             WHERE event_id = $1 AND usn = $2 AND role = $3)",
        )
        .bind(event_id.get())
        .bind(user_id.as_str())
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(if exists {
            CheckInOutcome::AlreadyAttended
        } else {
            CheckInOutcome::NotRegistered
        })
    }
}

impl EventRepository for PostgresStore {
    fn insert_event(
        &self,
        organizer: UserId,
        draft: NewEvent,
        created_at: DateTime<Utc>,
    ) -> StoreFuture<'_, Event> {
        Box::pin(async move {
            let fee_cents = i64::try_from(draft.fee.cents())
                .map_err(|_| StoreError::Database(format!("fee out of range: {}", draft.fee)))?;

            let id: i64 = sqlx::query_scalar(
                r"
                INSERT INTO events (
                    name, description, event_date, event_time, location,
                    max_participants, max_volunteers, fee_cents, organizer_usn,
                    club_id, created_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                RETURNING id
                ",
            )
            .bind(&draft.name)
            .bind(&draft.description)
            .bind(draft.date)
            .bind(draft.time)
            .bind(&draft.location)
            .bind(draft.max_participants)
            .bind(draft.max_volunteers)
            .bind(fee_cents)
            .bind(organizer.as_str())
            .bind(draft.club_id.map(|club| club.get()))
            .bind(created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)?;

            tracing::debug!(event_id = id, organizer = %organizer, "Event row inserted");

            Ok(Event {
                id: EventId::new(id),
                name: draft.name,
                description: draft.description,
                date: draft.date,
                time: draft.time,
                location: draft.location,
                max_participants: draft.max_participants,
                max_volunteers: draft.max_volunteers,
                fee: draft.fee,
                organizer,
                club_id: draft.club_id,
                created_at,
            })
        })
    }

    fn find_event(&self, event_id: EventId) -> StoreFuture<'_, Option<EventDetails>> {
        Box::pin(async move {
            let row = sqlx::query(&format!("{EVENT_DETAILS_SELECT} WHERE e.id = $1"))
                .bind(event_id.get())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx)?;
            row.as_ref().map(rows::event_details).transpose()
        })
    }

    fn list_events(&self) -> StoreFuture<'_, Vec<EventDetails>> {
        Box::pin(async move {
            let found = sqlx::query(&format!("{EVENT_DETAILS_SELECT} ORDER BY e.id"))
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx)?;
            found.iter().map(rows::event_details).collect::<Result<Vec<_>, _>>()
        })
    }

    fn events_organized_by(&self, organizer: UserId) -> StoreFuture<'_, Vec<EventDetails>> {
        Box::pin(async move {
            let found = sqlx::query(&format!(
                "{EVENT_DETAILS_SELECT} WHERE e.organizer_usn = $1 ORDER BY e.id"
            ))
            .bind(organizer.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
            found.iter().map(rows::event_details).collect::<Result<Vec<_>, _>>()
        })
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map_err(map_sqlx)?;
            Ok(())
        })
    }
}

impl RegistrationRepository for PostgresStore {
    fn find_registration(
        &self,
        event_id: EventId,
        user_id: UserId,
        role: Role,
    ) -> StoreFuture<'_, Option<Registration>> {
        Box::pin(async move {
            let row = sqlx::query(&format!(
                "SELECT {REGISTRATION_COLUMNS} FROM registrations \
                 WHERE event_id = $1 AND usn = $2 AND role = $3"
            ))
            .bind(event_id.get())
            .bind(user_id.as_str())
            .bind(role.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
            row.as_ref().map(rows::registration).transpose()
        })
    }

    fn count_registrations(&self, event_id: EventId, role: Role) -> StoreFuture<'_, u32> {
        Box::pin(async move {
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM registrations WHERE event_id = $1 AND role = $2",
            )
            .bind(event_id.get())
            .bind(role.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)?;
            Ok(u32::try_from(count).unwrap_or(u32::MAX))
        })
    }

    fn insert_registration(
        &self,
        event_id: EventId,
        user_id: UserId,
        role: Role,
        registered_at: DateTime<Utc>,
    ) -> StoreFuture<'_, InsertOutcome> {
        Box::pin(self.conditional_insert(event_id, user_id, role, registered_at))
    }

    fn registrations_for_user(
        &self,
        user_id: UserId,
        role: Role,
    ) -> StoreStream<'_, RegisteredEvent> {
        Box::pin(async_stream::stream! {
            let sql = format!(
                r"
                SELECT * FROM (
                    {EVENT_DETAILS_SELECT}
                ) d
                JOIN (
                    SELECT event_id AS r_event_id, usn AS r_usn, role AS r_role,
                           status AS r_status, registered_at AS r_registered_at,
                           checked_in_at AS r_checked_in_at
                    FROM registrations
                    WHERE usn = $1 AND role = $2
                ) r ON r.r_event_id = d.id
                ORDER BY r.r_registered_at, d.id
                "
            );
            let mut fetched = sqlx::query(&sql)
                .bind(user_id.as_str())
                .bind(role.as_str())
                .fetch(&self.pool);

            while let Some(row) = fetched.next().await {
                yield row.map_err(map_sqlx).and_then(|row| rows::registered_event(&row));
            }
        })
    }

    fn mark_attended(
        &self,
        event_id: EventId,
        user_id: UserId,
        role: Role,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, CheckInOutcome> {
        Box::pin(self.conditional_check_in(event_id, user_id, role, at))
    }
}

impl MembershipRepository for PostgresStore {
    fn is_member(&self, user_id: UserId, club_id: ClubId) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let member: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM club_members WHERE usn = $1 AND club_id = $2)",
            )
            .bind(user_id.as_str())
            .bind(club_id.get())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)?;
            Ok(member)
        })
    }

    fn clubs_for_user(&self, user_id: UserId) -> StoreFuture<'_, Vec<Club>> {
        Box::pin(async move {
            let found = sqlx::query(
                r"
                SELECT c.id, c.name, c.description
                FROM clubs c
                JOIN club_members m ON m.club_id = c.id
                WHERE m.usn = $1
                ORDER BY c.id
                ",
            )
            .bind(user_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
            found.iter().map(rows::club).collect::<Result<Vec<_>, _>>()
        })
    }
}

impl IdentityProvider for PostgresStore {
    fn authenticate<'a>(&'a self, token: &'a str) -> StoreFuture<'a, Option<UserId>> {
        Box::pin(async move {
            let usn: Option<String> = sqlx::query_scalar(
                "SELECT usn FROM sessions WHERE token = $1 AND expires_at > now()",
            )
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
            Ok(usn.map(UserId::new))
        })
    }
}
