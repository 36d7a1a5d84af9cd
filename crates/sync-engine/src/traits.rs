//! The service seam used by the orchestrator.

use async_trait::async_trait;
use feed::WatchlistEntry;
use overseerr_client::MediaMatch;

/// A media-request service the orchestrator can drive.
///
/// ## Design Note
/// - `Send + Sync` lets one service be shared by every worker task
/// - Neither method returns an error: implementations log failures and
///   report them as "not found" or `false`
#[async_trait]
pub trait MediaService: Send + Sync {
    /// Returns the name of this service (for logging)
    fn name(&self) -> &str;

    /// Locate the movie described by `entry`
    async fn search(&self, entry: &WatchlistEntry) -> Option<MediaMatch>;

    /// Request a located movie; `true` when it is (or already was) requested
    async fn request(&self, media: &MediaMatch) -> bool;
}
