//! Storage layer for the outreach scheduler
//!
//! SQLite-based storage by default, with an optional PostgreSQL backend
//! behind the `postgres` feature. Both implement the async
//! [`LeadStore`] and [`MessageStore`] traits.

pub mod backend;
pub mod error;
#[cfg(feature = "sqlite")]
mod migrations;
#[cfg(feature = "postgres")]
mod pg_migrations;
#[cfg(feature = "postgres")]
pub mod pg_storage;
#[cfg(feature = "sqlite")]
mod sqlite_async;
#[cfg(feature = "sqlite")]
mod storage;
#[cfg(all(test, feature = "sqlite"))]
mod tests;
pub mod traits;
pub mod types;

pub use backend::StorageBackend;
pub use error::StorageError;
#[cfg(feature = "postgres")]
pub use pg_storage::PgStorage;
#[cfg(feature = "sqlite")]
pub use storage::Storage;
pub use traits::{LeadStore, MessageStore};
pub use types::MessageStatusCounts;
