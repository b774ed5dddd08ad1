//! Storage backend trait abstraction
//!
//! Async domain traits for the lead store and the outbound message store,
//! implemented by both the SQLite and PostgreSQL backends.

pub mod lead;
pub mod message;

pub use lead::LeadStore;
pub use message::MessageStore;
