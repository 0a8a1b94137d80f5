//! SQLite-backed record store.
//!
//! Persists users, phone-number records and authenticated session handles.
//! All statements run on tokio-rusqlite's single background thread; every
//! write is a single-row upsert, so no multi-statement transactions exist.

mod error;
mod store;
mod types;

pub use error::StoreError;
pub use store::AccountStore;
pub use types::*;
