//! Wire types for the Overseerr search and request endpoints.

use serde::{Deserialize, Serialize};

/// Overseerr's internal identifier for a media item (a TMDB id)
pub type MediaId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
        }
    }
}

/// A located movie, ready to be requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MediaMatch {
    pub media_id: MediaId,
    pub media_type: MediaType,
}

impl MediaMatch {
    pub fn movie(media_id: MediaId) -> Self {
        Self {
            media_id,
            media_type: MediaType::Movie,
        }
    }
}

/// Body of `GET /api/v1/search`
///
/// Only the fields used for matching are decoded. `results` may be absent
/// or null, both of which mean "no results".
#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub results: Option<Vec<SearchResult>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchResult {
    pub id: MediaId,
    #[serde(default)]
    pub release_date: Option<String>,
}

/// Body of `POST /api/v1/request`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MediaRequestBody {
    pub media_type: MediaType,
    pub media_id: MediaId,
    pub is4k: bool,
}

impl MediaRequestBody {
    /// Standard-quality movie request
    pub fn movie(media_id: MediaId) -> Self {
        Self {
            media_type: MediaType::Movie,
            media_id,
            is4k: false,
        }
    }
}
