//! `MediaService` backed by the Overseerr HTTP API.

use async_trait::async_trait;
use feed::WatchlistEntry;
use overseerr_client::{MediaMatch, OverseerrClient};

use crate::traits::MediaService;

#[async_trait]
impl MediaService for OverseerrClient {
    fn name(&self) -> &str {
        "overseerr"
    }

    async fn search(&self, entry: &WatchlistEntry) -> Option<MediaMatch> {
        self.search.search(entry.title(), entry.year()).await
    }

    async fn request(&self, media: &MediaMatch) -> bool {
        self.requests.request(media.media_id).await
    }
}
