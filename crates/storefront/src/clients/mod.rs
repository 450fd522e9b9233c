//! HTTP clients for the three remote services the storefront composes.
//!
//! # Architecture
//!
//! - One client per service: [`AuthClient`], [`CatalogClient`], [`OrderClient`]
//! - Plain JSON over HTTP via `reqwest`; authenticated calls attach the
//!   visitor's bearer token per request
//! - The services are the source of truth - no local sync, direct API calls
//! - Catalog reads are cached in-memory via `moka` (5 minute TTL)
//!
//! # Example
//!
//! ```rust,ignore
//! use copperleaf_storefront::clients::CatalogClient;
//!
//! let catalog = CatalogClient::new(&config.services.catalog);
//! let products = catalog.list_products(&ProductFilter::default()).await?;
//! ```

pub mod auth;
pub mod catalog;
pub mod orders;
pub mod types;

pub use auth::AuthClient;
pub use catalog::CatalogClient;
pub use orders::OrderClient;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when calling a remote service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (connect, timeout, malformed body). The only
    /// retryable class, and only retried in the third-party profile-fetch
    /// path.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service rejected the bearer token (401-equivalent).
    #[error("authorization denied by remote service")]
    Unauthorized,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success response.
    #[error("Service error ({status}): {message}")]
    Service {
        status: reqwest::StatusCode,
        message: String,
    },
}

/// Error body shape shared by all three services.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Map a non-success response to an [`ApiError`], reading the JSON `message`
/// field when the service provides one.
pub(crate) async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }

    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_else(|| status.to_string());

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound(message));
    }

    Err(ApiError::Service { status, message })
}

impl ApiError {
    /// Whether this error carries an authorization-denied status.
    ///
    /// Such responses trigger the global session clear regardless of which
    /// view issued the call.
    #[must_use]
    pub const fn is_authorization_denied(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn get(server: &MockServer, route: &str) -> Result<reqwest::Response, ApiError> {
        let response = reqwest::Client::new()
            .get(format!("{}{route}", server.uri()))
            .send()
            .await?;
        check(response).await
    }

    #[tokio::test]
    async fn test_check_passes_success_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        assert!(get(&server, "/ok").await.is_ok());
    }

    #[tokio::test]
    async fn test_check_maps_401_to_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/denied"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = get(&server, "/denied").await.unwrap_err();
        assert!(err.is_authorization_denied());
    }

    #[tokio::test]
    async fn test_check_reads_service_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/invalid"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"message": "Stock insufficient"})),
            )
            .mount(&server)
            .await;

        let err = get(&server, "/invalid").await.unwrap_err();
        match err {
            ApiError::Service { status, message } => {
                assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
                assert_eq!(message, "Stock insufficient");
            }
            other => panic!("expected Service error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_check_maps_404_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"message": "Order not found"})),
            )
            .mount(&server)
            .await;

        let err = get(&server, "/missing").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(msg) if msg == "Order not found"));
    }
}
