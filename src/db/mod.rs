//! Persistence module split across logical submodules. `connection` owns the
//! handle and schema; `books` holds the record queries; `stats` the counts.

mod books;
mod connection;
mod stats;

pub use connection::Library;
