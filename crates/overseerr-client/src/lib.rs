//! Client for the Overseerr media-request API.
//!
//! This crate provides the two calls a watchlist sync needs:
//! - [`MediaSearchClient`]: find a movie's id from its title and year
//! - [`MediaRequestClient`]: request a movie, treating duplicates as success
//!
//! Both share one [`HttpTransport`], which carries the API key, the request
//! timeout and the retry policy for transient 5xx responses.
//!
//! ## Example Usage
//!
//! ```ignore
//! use overseerr_client::{HttpTransport, OverseerrClient};
//! use std::sync::Arc;
//!
//! let transport = Arc::new(HttpTransport::builder("http://localhost:5055", api_key).build()?);
//! let client = OverseerrClient::new(transport);
//!
//! if let Some(found) = client.search.search("Dune", "2021").await {
//!     client.requests.request(found.media_id).await;
//! }
//! ```

pub mod error;
pub mod models;
pub mod request;
pub mod search;
pub mod transport;

use std::sync::Arc;

pub use error::{OverseerrError, Result};
pub use models::{MediaId, MediaMatch, MediaType};
pub use request::{ALREADY_REQUESTED_MESSAGE, MediaRequestClient, RequestStatus};
pub use search::MediaSearchClient;
pub use transport::{HttpTransport, RetryPolicy, TransportBuilder};

/// Search and request clients bound to the same transport
#[derive(Debug, Clone)]
pub struct OverseerrClient {
    pub search: MediaSearchClient,
    pub requests: MediaRequestClient,
}

impl OverseerrClient {
    pub fn new(transport: Arc<HttpTransport>) -> Self {
        Self {
            search: MediaSearchClient::new(Arc::clone(&transport)),
            requests: MediaRequestClient::new(transport),
        }
    }
}
