//! Core library surface for the Personal Library Manager.
//!
//! The store (`db`), the CSV codec (`transfer`) and the dispatch table
//! (`actions`) make up the core. User actions from the `ui` module and the
//! headless subcommands in `main.rs` go through `actions::dispatch`.
pub mod actions;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod transfer;
pub mod ui;

/// Convenience re-exports for the persistence layer.
pub use db::Library;
pub use error::{LibraryError, LibraryResult};

/// Domain types that other layers manipulate.
pub use models::{Book, NewBook, ReadStatus, Statistics};

pub use actions::{dispatch, Action, Outcome};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
