//! Movie lookup against `GET /api/v1/search`.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::{OverseerrError, Result};
use crate::models::{MediaId, MediaMatch, MediaType, SearchResponse, SearchResult};
use crate::transport::HttpTransport;

pub const SEARCH_PATH: &str = "/api/v1/search";

/// Finds the Overseerr id of a movie from its title and release year
#[derive(Debug, Clone)]
pub struct MediaSearchClient {
    transport: Arc<HttpTransport>,
}

impl MediaSearchClient {
    pub fn new(transport: Arc<HttpTransport>) -> Self {
        Self { transport }
    }

    /// Look up a movie, reporting every failure to the caller
    ///
    /// `Ok(None)` means the service answered but no result was released in
    /// `year`.
    pub async fn find(&self, title: &str, year: &str) -> Result<Option<MediaMatch>> {
        let query = format!("{} {}", title, year);
        let request = self
            .transport
            .get(SEARCH_PATH)
            .query(&[("query", query.as_str()), ("mediaType", MediaType::Movie.as_str())]);

        let response = self.transport.execute(request).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OverseerrError::Status { status, body });
        }

        let body = response.bytes().await?;
        let parsed: SearchResponse = serde_json::from_slice(&body)
            .map_err(|e| OverseerrError::InvalidResponse(e.to_string()))?;

        let results = parsed.results.unwrap_or_default();
        Ok(select_match(&results, year).map(MediaMatch::movie))
    }

    /// Look up a movie, treating any failure as "not found"
    ///
    /// Errors are logged and swallowed, so `None` does not prove the movie
    /// is missing upstream; it only means nothing will be requested for it.
    pub async fn search(&self, title: &str, year: &str) -> Option<MediaMatch> {
        match self.find(title, year).await {
            Ok(Some(found)) => {
                info!("Found movie: {} ({}) - ID: {}", title, year, found.media_id);
                Some(found)
            }
            Ok(None) => {
                warn!("Movie not found: {} ({})", title, year);
                None
            }
            Err(e) => {
                error!("Search failed for {} ({}): {}", title, year, e);
                None
            }
        }
    }
}

/// First result, in response order, whose release date starts with `year`
///
/// A missing release date only matches an empty year.
pub(crate) fn select_match(results: &[SearchResult], year: &str) -> Option<MediaId> {
    results
        .iter()
        .find(|result| result.release_date.as_deref().unwrap_or_default().starts_with(year))
        .map(|result| result.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: MediaId, release_date: Option<&str>) -> SearchResult {
        SearchResult {
            id,
            release_date: release_date.map(str::to_string),
        }
    }

    #[test]
    fn test_select_first_matching_year() {
        let results = vec![
            result(1, Some("1984-12-14")),
            result(2, Some("2021-09-15")),
            result(3, Some("2021-10-22")),
        ];
        assert_eq!(select_match(&results, "2021"), Some(2));
    }

    #[test]
    fn test_select_no_match() {
        let results = vec![result(1, Some("1984-12-14")), result(2, None)];
        assert_eq!(select_match(&results, "2021"), None);
        assert_eq!(select_match(&[], "2021"), None);
    }

    #[test]
    fn test_select_is_a_prefix_match() {
        let results = vec![result(1, Some("2021")), result(2, Some("20210101"))];
        assert_eq!(select_match(&results, "2021"), Some(1));
        assert_eq!(select_match(&results, "202"), Some(1));
    }

    #[test]
    fn test_select_empty_year_matches_first_result() {
        let results = vec![result(4, None), result(5, Some("1999-03-31"))];
        assert_eq!(select_match(&results, ""), Some(4));
    }
}
