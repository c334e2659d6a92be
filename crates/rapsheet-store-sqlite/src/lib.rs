//! SQLite backend for the rapsheet records directory.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every committed mutation is announced
//! on an in-process broadcast channel, which backs the store's change feeds.

mod encode;
mod feed;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use feed::BroadcastFeed;
pub use store::{DEFAULT_CHANGE_CAPACITY, SqliteStore};
