//! # EPASS Core
//!
//! Event registration, capacity guarding and check-in for campus events.
//!
//! This crate holds the part of the system with real invariants: slot limits,
//! one registration per (event, user, role), and the one-way
//! `Registered → Attended` transition. It performs no I/O of its own; every
//! read and write goes through the repository traits in [`repository`].
//!
//! ## Components
//!
//! - [`EventCatalog`]: pure classifier into ongoing, completed and upcoming
//! - [`CapacityGuard`]: remaining slots and admission checks
//! - [`RegistrationLedger`]: creates and lists registrations
//! - [`CheckInProcessor`]: marks participants as attended from a scanned ticket
//! - [`EventOrganizer`]: creates events under the date and club-membership rules
//!
//! ## Concurrency
//!
//! The capacity check in the ledger is advisory. The authoritative check runs
//! inside [`RegistrationRepository::insert_registration`], which re-validates
//! the count in the same atomic unit as the insert.
//!
//! ## Example
//!
//! ```ignore
//! use epass_core::{RegistrationEnvironment, RegistrationLedger, Role};
//!
//! let ledger = RegistrationLedger::new(env.clone());
//! let registration = ledger.register(event_id, user_id, Role::Participant).await?;
//! ```

pub mod capacity;
pub mod catalog;
pub mod check_in;
pub mod environment;
pub mod error;
pub mod ledger;
pub mod organizer;
pub mod repository;
pub mod ticket;
pub mod types;

pub use capacity::CapacityGuard;
pub use catalog::{Categorized, EventCatalog, Phase, Scheduled};
pub use check_in::CheckInProcessor;
pub use environment::{Clock, RegistrationEnvironment, SystemClock};
pub use error::{CatalogError, RegistrationError, Result, StoreError};
pub use ledger::RegistrationLedger;
pub use organizer::EventOrganizer;
pub use repository::{
    CheckInOutcome, EventRepository, IdentityProvider, InsertOutcome, MembershipRepository,
    RegistrationRepository, StoreFuture, StoreStream,
};
pub use ticket::TicketCode;
pub use types::{
    AttendanceStatus, Club, ClubId, Event, EventDetails, EventId, EventView, Fee, NewEvent,
    RegisteredEvent, Registration, Role, SlotLimit, Slots, UserId,
};

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use chrono_tz::Tz;
