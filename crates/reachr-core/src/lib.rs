//! # Reachr Core
//!
//! Domain logic for Reachr: the contact model, the document [`store`]
//! abstraction, the per-user Record and Preference stores, the weighted
//! substring [`search`], tag aggregation for autocomplete, and the one-time
//! legacy [`migrate`] merge.
//!
//! This crate contains no filesystem, SQL, or HTTP code. Persistence is
//! reached only through the [`store::Store`] trait; the application crate
//! provides the file and SQLite backends.

pub mod catalog;
pub mod error;
pub mod locks;
pub mod migrate;
pub mod models;
pub mod preferences;
pub mod records;
pub mod search;
pub mod store;
pub mod tags;

pub use error::{Error, Result};
pub use models::{
    Contact, ContactFilter, ContactPatch, NewContact, PreferencesUpdate, SearchResult, TagEntry,
    TagSource, UserId, UserPreferences,
};
pub use preferences::PreferenceStore;
pub use records::RecordStore;
