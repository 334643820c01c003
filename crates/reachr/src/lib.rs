//! # Reachr
//!
//! **A personal networking contact book with weighted search and tag
//! autocomplete.**
//!
//! Each user owns one contact collection and one preferences document.
//! Contacts are searched with a fixed per-field weighting, tags are
//! suggested from the user's industry, custom list, and existing contacts,
//! and a one-time migration moves the pre-authentication shared collection
//! into a user's own namespace.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌─────────────────┐   ┌──────────────┐
//! │   CLI    │──▶│          │──▶│  reachr-core    │──▶│ Store        │
//! │ (reachr) │   │   App    │   │ Record/Pref     │   │ files/sqlite │
//! ├──────────┤   │          │   │ Search/Tags     │   └──────────────┘
//! │   HTTP   │──▶│          │   └─────────────────┘
//! └──────────┘   └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! reachr init
//! reachr --user ada add "Grace Hopper" --company Navy --tag mentor
//! reachr --user ada search navy
//! reachr serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`app`] | Operation surface shared by CLI and server |
//! | [`fs_store`] | Per-user JSON files with atomic replace |
//! | [`file_lock`] | Cross-process namespace locks (`fd-lock`) |
//! | [`sqlite_store`] | Single-table SQLite backend |
//! | [`db`] | SQLite connection pool (WAL mode) |
//! | [`schema`] | Idempotent schema creation |
//! | [`identity`] | Maps request credentials to users |
//! | [`server`] | JSON HTTP API (axum) |
//! | [`cli`] | `reachr` command implementations |

pub mod app;
pub mod cli;
pub mod config;
pub mod db;
pub mod file_lock;
pub mod fs_store;
pub mod identity;
pub mod logging;
pub mod schema;
pub mod server;
pub mod sqlite_store;
