//! Sync engine for the overseerr-sync tool.
//!
//! This crate contains the orchestrator that pushes every watchlist entry
//! through search and then request, a bounded number at a time, and keeps
//! one entry's failure from affecting the others.

pub mod orchestrator;
pub mod overseerr;
pub mod traits;

pub use orchestrator::{DEFAULT_WORKERS, RequestOutcome, SyncOrchestrator, SyncReport};
pub use traits::MediaService;
