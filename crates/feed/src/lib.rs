//! # Feed Crate
//!
//! Reads a movie watchlist published as an RSS/XML feed and turns each
//! `<item><title>Name (Year)</title></item>` into a [`WatchlistEntry`].
//!
//! ## Main Components
//!
//! - **types**: `WatchlistEntry` and the "Title (Year)" extraction rule
//! - **parser**: streaming XML parsing of whole feeds
//! - **error**: Error types for feed loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use feed::load_watchlist;
//! use std::path::Path;
//!
//! let entries = load_watchlist(Path::new("feed.xml"))?;
//! for entry in &entries {
//!     println!("{} ({})", entry.title(), entry.year());
//! }
//! ```

pub mod error;
pub mod types;
pub mod parser;

pub use error::{FeedError, Result};
pub use parser::{load_watchlist, parse_watchlist};
pub use types::WatchlistEntry;
