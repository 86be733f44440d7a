//! Storefront REST API client.
//!
//! Every request reads the session credential at send time and carries
//! exactly one identity header: `Authorization: Bearer <token>` for a
//! signed-in account, `x-guest-id: <uuid>` otherwise.
//!
//! Endpoint methods are grouped by resource in the submodules; they return
//! [`ApiError`] and leave translating failures for the shopper to the
//! callers.

mod account;
mod auth;
mod cart;
mod catalog;
mod checkout;
mod orders;
pub mod types;
mod wishlist;

pub use checkout::{
    CheckoutError, CheckoutRequest, GuestCheckout, NewCardCheckout, SavedCardCheckout,
    ShippingDetails,
};

use std::sync::Arc;

use greenshoes_core::ProductId;
use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::session::Session;

use types::{Product, ProductDetail, ProductQuery};

/// Endpoints whose 401 means "wrong password", not "session expired".
const AUTH_PATHS: [&str; 2] = ["/auth/login", "/auth/register"];

/// Longest response excerpt written to logs.
const LOG_BODY_LIMIT: usize = 500;

/// Maximum cached catalog entries.
const CATALOG_CACHE_CAPACITY: u64 = 1000;

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the storefront REST API.
///
/// Cheaply cloneable via `Arc`; clones share the HTTP pool, the catalog
/// cache and the [`Session`].
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: String,
    session: Session,
    products: Cache<ProductQuery, Vec<Product>>,
    product_details: Cache<ProductId, ProductDetail>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for `config.api_url` acting on behalf of `session`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built (e.g. no
    /// TLS backend).
    pub fn new(config: &ClientConfig, session: Session) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("greenshoes-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let products = Cache::builder()
            .max_capacity(CATALOG_CACHE_CAPACITY)
            .time_to_live(config.catalog_cache_ttl)
            .build();
        let product_details = Cache::builder()
            .max_capacity(CATALOG_CACHE_CAPACITY)
            .time_to_live(config.catalog_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.base_url(),
                session,
                products,
                product_details,
            }),
        })
    }

    /// The session this client identifies as.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Start a request to `path` carrying the current identity header.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let (name, value) = self.inner.session.resolve_credential().header();
        self.inner
            .http
            .request(method, format!("{}{path}", self.inner.base_url))
            .header(name, value)
    }

    /// Send a request and decode its JSON body.
    ///
    /// An empty body decodes as JSON `null`. A 401 outside the auth
    /// endpoints invalidates the session before the error is returned.
    #[instrument(skip_all, fields(method = %method, path = %path))]
    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await.inspect_err(|e| {
            warn!(error = %e, "Storefront API request failed");
        })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = error_message(&body);
            debug!(
                status = %status,
                body = %excerpt(&body),
                "Storefront API returned non-success status"
            );

            if status == StatusCode::UNAUTHORIZED {
                if !AUTH_PATHS.contains(&path) {
                    warn!("Credential rejected; signing out");
                    self.inner.session.invalidate();
                }
                return Err(ApiError::Unauthorized { message });
            }
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let text = if body.trim().is_empty() { "null" } else { &body };
        serde_json::from_str(text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %excerpt(&body),
                "Failed to parse storefront API response"
            );
            ApiError::Parse(e)
        })
    }

    // =========================================================================
    // Verb helpers
    // =========================================================================

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.request(Method::GET, path);
        self.execute(Method::GET, path, request).await
    }

    pub(crate) async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let request = self.request(Method::GET, path).query(query);
        self.execute(Method::GET, path, request).await
    }

    pub(crate) async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.request(Method::POST, path).json(body);
        self.execute(Method::POST, path, request).await
    }

    pub(crate) async fn post_empty(&self, path: &str) -> Result<IgnoredAny, ApiError> {
        let request = self.request(Method::POST, path);
        self.execute(Method::POST, path, request).await
    }

    pub(crate) async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.request(Method::PUT, path).json(body);
        self.execute(Method::PUT, path, request).await
    }

    pub(crate) async fn patch<B>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<IgnoredAny, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let mut request = self.request(Method::PATCH, path);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.execute(Method::PATCH, path, request).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<IgnoredAny, ApiError> {
        let request = self.request(Method::DELETE, path);
        self.execute(Method::DELETE, path, request).await
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Pull the human-readable reason out of an error body.
///
/// The API answers `{"error": "..."}`; some middleware answers
/// `{"message": "..."}`.
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error", "message"]
        .into_iter()
        .find_map(|key| value.get(key).and_then(serde_json::Value::as_str))
        .filter(|message| !message.trim().is_empty())
        .map(str::to_string)
}

fn excerpt(body: &str) -> String {
    body.chars().take(LOG_BODY_LIMIT).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_error_field() {
        assert_eq!(
            error_message(r#"{"error":"Out of stock","message":"Bad Request"}"#).as_deref(),
            Some("Out of stock")
        );
        assert_eq!(
            error_message(r#"{"message":"Invalid token"}"#).as_deref(),
            Some("Invalid token")
        );
    }

    #[test]
    fn test_error_message_ignores_non_json() {
        assert_eq!(error_message("<html>502 Bad Gateway</html>"), None);
        assert_eq!(error_message(r#"{"error":""}"#), None);
        assert_eq!(error_message(""), None);
    }

    #[test]
    fn test_excerpt_is_bounded() {
        let body = "x".repeat(LOG_BODY_LIMIT * 2);
        assert_eq!(excerpt(&body).len(), LOG_BODY_LIMIT);
    }

    #[test]
    fn test_request_carries_exactly_one_identity_header() {
        let session = Session::in_memory();
        let config = ClientConfig::new("http://127.0.0.1:9/api").unwrap();
        let client = ApiClient::new(&config, session.clone()).unwrap();

        let request = client.request(Method::GET, "/cart").build().unwrap();
        assert_eq!(request.url().as_str(), "http://127.0.0.1:9/api/cart");
        assert!(request.headers().get("authorization").is_none());
        assert_eq!(
            request.headers().get("x-guest-id").unwrap().to_str().unwrap(),
            session.guest_id().to_string()
        );
    }
}
