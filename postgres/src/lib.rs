//! `PostgreSQL` storage for EPASS.
//!
//! [`PostgresStore`] implements every repository trait from `epass-core`
//! plus a session-table [`IdentityProvider`](epass_core::IdentityProvider).
//! It uses sqlx with a shared connection pool and supports:
//!
//! - Atomic conditional registration (row lock on the event, then duplicate
//!   check, count and insert under that lock)
//! - Single-statement conditional check-in
//! - Embedded migrations
//!
//! # Example
//!
//! ```no_run
//! use epass_postgres::PostgresStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = PostgresStore::connect("postgres://localhost/epass").await?;
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod rows;
mod store;

pub use store::PostgresStore;

use epass_core::StoreError;

/// Classify a sqlx failure.
///
/// Connection-level problems are transient; decode problems mean a row does
/// not fit the domain; everything else is a non-transient database error.
pub(crate) fn map_sqlx(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StoreError::Unavailable(err.to_string()),
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::Decode(_)
        | sqlx::Error::TypeNotFound { .. } => StoreError::Decode(err.to_string()),
        // Class 08 is connection exception; 57P03 is "cannot connect now".
        sqlx::Error::Database(db)
            if db
                .code()
                .is_some_and(|code| code.starts_with("08") || code == "57P03") =>
        {
            StoreError::Unavailable(err.to_string())
        }
        _ => StoreError::Database(err.to_string()),
    }
}
