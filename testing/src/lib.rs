//! # EPASS Testing
//!
//! Test doubles and fixtures for the EPASS registration core.
//!
//! This crate provides:
//! - [`FixedClock`]: deterministic time
//! - [`InMemoryStore`]: every repository trait over one mutex-guarded state
//! - [`FlakyStore`]: wraps an [`InMemoryStore`] and injects transient failures
//! - [`StaticIdentityProvider`]: fixed token → user table
//! - Fixtures and proptest strategies for events and capacities
//!
//! ## Example
//!
//! ```ignore
//! use epass_testing::{InMemoryStore, environment, fixtures, helpers::user, test_clock};
//! use epass_core::{RegistrationLedger, Role};
//!
//! #[tokio::test]
//! async fn registers_once() {
//!     let store = InMemoryStore::new();
//!     let env = environment(&store, test_clock());
//!     let draft = fixtures::capped_event(date, Some(2), None);
//!     let event = store.seed_event(user("1BM20CS100"), draft);
//!
//!     let ledger = RegistrationLedger::new(env);
//!     ledger.register(event.id, user("1BM21CS001"), Role::Participant).await.unwrap();
//! }
//! ```

use chrono::{DateTime, Utc};
use epass_core::environment::Clock;

mod flaky_store;
mod memory_store;

pub use flaky_store::FlakyStore;
pub use memory_store::InMemoryStore;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use epass_core::repository::{IdentityProvider, StoreFuture};
    use epass_core::types::UserId;
    use std::collections::HashMap;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use epass_testing::mocks::FixedClock;
    /// use epass_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-15 06:30:00 UTC, which
    /// is midday in Asia/Kolkata)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-15T06:30:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Identity provider backed by a fixed token table.
    #[derive(Debug, Clone, Default)]
    pub struct StaticIdentityProvider {
        tokens: HashMap<String, UserId>,
    }

    impl StaticIdentityProvider {
        /// Empty table: every token is rejected.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Accept `token` as `user`.
        #[must_use]
        pub fn with_token(mut self, token: impl Into<String>, user: UserId) -> Self {
            self.tokens.insert(token.into(), user);
            self
        }
    }

    impl IdentityProvider for StaticIdentityProvider {
        fn authenticate<'a>(&'a self, token: &'a str) -> StoreFuture<'a, Option<UserId>> {
            Box::pin(async move { Ok(self.tokens.get(token).cloned()) })
        }
    }
}

/// Test helpers and utilities
pub mod helpers {
    use crate::mocks::FixedClock;
    use crate::{FlakyStore, InMemoryStore};
    use epass_core::environment::RegistrationEnvironment;
    use epass_core::types::UserId;
    use std::sync::Arc;

    /// Time zone used by [`environment`].
    pub const TEST_TIME_ZONE: chrono_tz::Tz = chrono_tz::Asia::Kolkata;

    /// Environment wired to one in-memory store for every repository.
    #[must_use]
    pub fn environment(store: &InMemoryStore, clock: FixedClock) -> RegistrationEnvironment {
        let store = Arc::new(store.clone());
        RegistrationEnvironment::new(
            Arc::new(clock),
            store.clone(),
            store.clone(),
            store,
            TEST_TIME_ZONE,
        )
    }

    /// Environment wired to a failure-injecting store.
    #[must_use]
    pub fn flaky_environment(store: &FlakyStore, clock: FixedClock) -> RegistrationEnvironment {
        let store = Arc::new(store.clone());
        RegistrationEnvironment::new(
            Arc::new(clock),
            store.clone(),
            store.clone(),
            store,
            TEST_TIME_ZONE,
        )
    }

    /// Calendar day of [`crate::test_clock`] in [`TEST_TIME_ZONE`].
    #[must_use]
    pub fn test_today() -> chrono::NaiveDate {
        use epass_core::environment::Clock;
        crate::test_clock()
            .now()
            .with_timezone(&TEST_TIME_ZONE)
            .date_naive()
    }

    /// Shorthand for a user identifier.
    #[must_use]
    pub fn user(usn: &str) -> UserId {
        UserId::new(usn)
    }

    /// Distinct, well-formed USNs: `1BM21CS001`, `1BM21CS002`, ...
    #[must_use]
    pub fn users(n: usize) -> Vec<UserId> {
        (1..=n).map(|i| UserId::new(format!("1BM21CS{i:03}"))).collect()
    }

    /// Install a `tracing` subscriber that writes through the test harness.
    ///
    /// Safe to call from every test; only the first call installs.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(tracing_subscriber::EnvFilter::new("epass=debug"))
            .try_init();
    }
}

/// Event fixtures.
pub mod fixtures {
    use chrono::{Duration, NaiveDate, NaiveTime};
    use epass_core::types::{ClubId, Fee, NewEvent};

    /// A draft dated `date`, unlimited in both roles, free.
    #[must_use]
    pub fn event_on(date: NaiveDate) -> NewEvent {
        NewEvent {
            name: format!("Event on {date}"),
            description: "Fixture event".to_string(),
            date,
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap_or_default(),
            location: "Main Auditorium".to_string(),
            max_participants: None,
            max_volunteers: None,
            fee: Fee::FREE,
            club_id: None,
        }
    }

    /// A draft with the given capacities.
    #[must_use]
    pub fn capped_event(
        date: NaiveDate,
        max_participants: Option<i32>,
        max_volunteers: Option<i32>,
    ) -> NewEvent {
        NewEvent {
            max_participants,
            max_volunteers,
            ..event_on(date)
        }
    }

    /// A draft organized under `club`.
    #[must_use]
    pub fn club_event(date: NaiveDate, club: ClubId) -> NewEvent {
        NewEvent {
            club_id: Some(club),
            ..event_on(date)
        }
    }

    /// `today + days`.
    #[must_use]
    pub fn days_from(today: NaiveDate, days: i64) -> NaiveDate {
        today + Duration::days(days)
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;

    /// Stored capacity column: unset, non-positive, or a small positive limit.
    pub fn stored_capacity() -> impl Strategy<Value = Option<i32>> {
        prop_oneof![
            Just(None),
            (-3i32..=0).prop_map(Some),
            (1i32..=8).prop_map(Some),
        ]
    }

    /// A capacity limit together with a number of competing registrants.
    pub fn limit_and_contenders() -> impl Strategy<Value = (i32, usize)> {
        (0i32..=6, 1usize..=12)
    }
}

// Re-export commonly used items
pub use helpers::environment;
pub use mocks::{FixedClock, StaticIdentityProvider, test_clock};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }

    #[test]
    fn generated_users_are_distinct() {
        let users = helpers::users(12);
        let unique: std::collections::HashSet<_> = users.iter().collect();
        assert_eq!(unique.len(), 12);
        assert_eq!(users[0].as_str(), "1BM21CS001");
    }

    #[test]
    fn tracing_init_is_repeatable() {
        helpers::init_test_tracing();
        helpers::init_test_tracing();
        tracing::debug!(target: "epass_testing", "subscriber installed once");
    }

    #[tokio::test]
    async fn static_identity_resolves_known_tokens_only() {
        use epass_core::repository::IdentityProvider;

        let provider =
            StaticIdentityProvider::new().with_token("t-1", helpers::user("1BM21CS001"));

        assert_eq!(
            provider.authenticate("t-1").await,
            Ok(Some(helpers::user("1BM21CS001")))
        );
        assert_eq!(provider.authenticate("nope").await, Ok(None));
    }
}
