//! Movie requests against `POST /api/v1/request`.

use std::sync::Arc;

use tracing::{error, info};

use crate::error::{OverseerrError, Result};
use crate::models::{MediaId, MediaRequestBody};
use crate::transport::HttpTransport;

pub const REQUEST_PATH: &str = "/api/v1/request";

/// Message Overseerr returns when the media item was requested before
///
/// This substring is the only signal that a failed request is a duplicate.
pub const ALREADY_REQUESTED_MESSAGE: &str = "Request for this media item already exists";

/// Result of a request that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Created,
    AlreadyRequested,
}

/// Submits standard-quality movie requests
#[derive(Debug, Clone)]
pub struct MediaRequestClient {
    transport: Arc<HttpTransport>,
}

impl MediaRequestClient {
    pub fn new(transport: Arc<HttpTransport>) -> Self {
        Self { transport }
    }

    /// Submit a request, reporting failures to the caller
    ///
    /// A rejection carrying [`ALREADY_REQUESTED_MESSAGE`] is not a failure.
    pub async fn submit(&self, media_id: MediaId) -> Result<RequestStatus> {
        let request = self
            .transport
            .post(REQUEST_PATH)
            .json(&MediaRequestBody::movie(media_id));

        let response = self.transport.execute(request).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(RequestStatus::Created);
        }

        let body = response.text().await.unwrap_or_default();
        if is_already_requested(&body) {
            return Ok(RequestStatus::AlreadyRequested);
        }

        Err(OverseerrError::Status { status, body })
    }

    /// Submit a request; `true` when the movie is now requested
    ///
    /// Requesting the same movie twice returns `true` both times.
    pub async fn request(&self, media_id: MediaId) -> bool {
        match self.submit(media_id).await {
            Ok(RequestStatus::Created) => {
                info!("Movie requested successfully (ID: {})", media_id);
                true
            }
            Ok(RequestStatus::AlreadyRequested) => {
                info!("Movie already requested (ID: {})", media_id);
                true
            }
            Err(e) => {
                error!("Request failed for movie {}: {}", media_id, e);
                false
            }
        }
    }
}

fn is_already_requested(message: &str) -> bool {
    message.contains(ALREADY_REQUESTED_MESSAGE)
}
