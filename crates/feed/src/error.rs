//! Error types for the feed crate.

use thiserror::Error;

/// Errors that can occur while loading or parsing a watchlist feed
///
/// Every variant is fatal for a sync run: a feed that cannot be read or is
/// not well-formed produces no entries at all.
#[derive(Error, Debug)]
pub enum FeedError {
    /// Feed file could not be found
    #[error("Failed to open feed file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading the feed
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The document is not well-formed XML
    ///
    /// `position` is the byte offset reported by the reader when the
    /// error was detected.
    #[error("Malformed feed at byte {position}: {reason}")]
    ParseError { position: u64, reason: String },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, FeedError>;
