//! Collectors for the platform's media and contacts indexes.
//!
//! Both indexes are platform-owned SQLite databases that the collectors
//! open read-only. An empty index is a valid result and produces an empty
//! list; a missing or unreadable index is an error. The two outcomes are
//! never conflated.

pub mod contacts;
pub mod media;

pub use contacts::{ContactCollection, ContactsIndex};
pub use media::MediaIndex;
