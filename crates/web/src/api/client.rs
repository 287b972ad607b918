//! HTTP transport for the POS API.

use axum::http::StatusCode;
use reqwest::{Client, Method, header};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use sellapp_core::envelope::{EnvelopeError, GENERIC_FAILURE, error_message, unwrap_envelope};

use super::ApiError;
use crate::config::ApiConfig;

/// The bearer token a request acts with.
///
/// Built per request by [`crate::middleware::ApiCredentials`]. Anonymous
/// credentials send no `Authorization` header, so the API decides what an
/// unauthenticated caller may see. The service token is only reachable
/// through [`ApiClient::service_credentials`].
#[derive(Clone, Default)]
pub struct Credentials {
    token: Option<SecretString>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Credentials {
    /// No token at all.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: Some(SecretString::from(token.into())),
        }
    }

    #[must_use]
    pub const fn from_secret(token: Option<SecretString>) -> Self {
        Self { token }
    }

    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        self.token.is_none()
    }
}

/// A binary download passed through from the API.
#[derive(Debug, Clone)]
pub struct Download {
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub bytes: Vec<u8>,
}

/// POS API client.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    base_path: String,
    service_token: Option<SecretString>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("base_path", &self.base_path)
            .field("service_token", &self.service_token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for the configured API.
    ///
    /// # Errors
    ///
    /// Returns a `Network` error if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("sellapp-web/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: config.url.clone(),
            base_path: config.base_path.clone(),
            service_token: config.service_token.clone(),
        })
    }

    /// Resolve an endpoint path (e.g. `/api/customers`) to a full URL.
    ///
    /// Query pairs with empty values are dropped.
    ///
    /// # Errors
    ///
    /// Returns a `Network` error if the path does not form a valid URL.
    pub fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ApiError> {
        let full_path = format!("{}{path}", self.base_path);
        let mut url = self
            .base_url
            .join(&full_path)
            .map_err(|e| ApiError::network(format!("invalid endpoint {full_path}: {e}")))?;

        let pairs: Vec<_> = query.iter().filter(|(_, v)| !v.trim().is_empty()).collect();
        if !pairs.is_empty() {
            let mut serializer = url.query_pairs_mut();
            for (key, value) in pairs {
                serializer.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Credentials carrying the configured service token, for background
    /// feeds and health checks. Never used for a user's request.
    #[must_use]
    pub fn service_credentials(&self) -> Credentials {
        Credentials::from_secret(self.service_token.clone())
    }

    fn build(
        &self,
        method: Method,
        url: Url,
        credentials: &Credentials,
    ) -> reqwest::RequestBuilder {
        let request = self.http.request(method, url);
        match credentials.token.as_ref() {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    /// Send a request and unwrap the response envelope.
    #[instrument(skip(self, query, body, credentials), fields(method = %method, path = %path))]
    pub(crate) async fn request_value(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
        credentials: &Credentials,
    ) -> Result<Value, ApiError> {
        let url = self.endpoint(path, query)?;
        let mut request = self
            .build(method, url, credentials)
            .header(header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(&body);
        }

        let result = match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                match response.text().await {
                    Ok(text) => interpret_response(status, &text, path),
                    Err(e) => Err(ApiError::network(e.to_string())),
                }
            }
            Err(e) => Err(ApiError::network(e.to_string())),
        };

        match &result {
            Ok(_) => debug!("API call succeeded"),
            Err(err) => warn!(kind = %err.kind(), detail = %err.detail(), "API call failed"),
        }
        result
    }

    /// GET and deserialize the payload.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        credentials: &Credentials,
    ) -> Result<T, ApiError> {
        let value = self
            .request_value(Method::GET, path, query, None, credentials)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Send a JSON body and deserialize the payload.
    pub(crate) async fn send_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        credentials: &Credentials,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)?;
        let value = self
            .request_value(method, path, &[], Some(body), credentials)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Fetch a binary response as-is.
    ///
    /// # Errors
    ///
    /// Non-2xx responses are classified like JSON calls.
    #[instrument(skip(self, query, credentials), fields(path = %path))]
    pub async fn download(
        &self,
        path: &str,
        query: &[(&str, String)],
        credentials: &Credentials,
    ) -> Result<Download, ApiError> {
        let url = self.endpoint(path, query)?;
        let response = self
            .build(Method::GET, url, credentials)
            .send()
            .await
            .map_err(|e| ApiError::network(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let text = response.text().await.unwrap_or_default();
            let err = match interpret_response(status, &text, path) {
                Err(err) => err,
                Ok(_) => ApiError::api(GENERIC_FAILURE, StatusCode::from_u16(status).ok()),
            };
            warn!(kind = %err.kind(), detail = %err.detail(), "Download failed");
            return Err(err);
        }

        let header_text = |name: header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };
        let content_type = header_text(header::CONTENT_TYPE);
        let content_disposition = header_text(header::CONTENT_DISPOSITION);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::network(e.to_string()))?
            .to_vec();

        Ok(Download {
            content_type,
            content_disposition,
            bytes,
        })
    }

    /// Check that the API answers with the configured service token.
    ///
    /// # Errors
    ///
    /// Returns the classified failure.
    pub async fn ping(&self) -> Result<(), ApiError> {
        self.request_value(
            Method::GET,
            "/api/pos/products",
            &[],
            None,
            &self.service_credentials(),
        )
        .await
        .map(|_| ())
    }
}

/// Classify a response by status and body.
///
/// - 404 is `NotFound`.
/// - Other non-2xx statuses are `ApiError` with the body's message, or a
///   generic one.
/// - An empty or non-JSON body is `ParseError`.
/// - `{success: false, error}` is `ApiError` carrying exactly that text.
fn interpret_response(status: u16, body: &str, path: &str) -> Result<Value, ApiError> {
    if status == 404 {
        return Err(ApiError::not_found(path));
    }

    let parsed: Option<Value> = if body.trim().is_empty() {
        None
    } else {
        serde_json::from_str(body).ok()
    };

    if !(200..300).contains(&status) {
        let message = parsed
            .as_ref()
            .and_then(error_message)
            .unwrap_or_else(|| GENERIC_FAILURE.to_string());
        return Err(ApiError::api(message, StatusCode::from_u16(status).ok()));
    }

    if body.trim().is_empty() {
        return Err(ApiError::parse("empty response body"));
    }
    let Some(value) = parsed else {
        return Err(ApiError::parse("response body is not JSON"));
    };

    unwrap_envelope(value).map_err(|err| match err {
        EnvelopeError::Rejected(text) => ApiError::api(text, StatusCode::from_u16(status).ok()),
        EnvelopeError::Empty => ApiError::parse("empty response envelope"),
    })
}

/// Pull a list out of a payload that is either a bare array or an object
/// holding the array under `key`.
pub(crate) fn extract_list<T: DeserializeOwned>(value: Value, key: &str) -> Result<Vec<T>, ApiError> {
    let list = match value {
        Value::Object(mut map) => map
            .remove(key)
            .or_else(|| map.remove("items"))
            .unwrap_or_else(|| Value::Array(Vec::new())),
        other => other,
    };
    Ok(serde_json::from_value(list)?)
}

/// Pull a record out of a payload that is either the record itself or an
/// object wrapping it under `key`.
pub(crate) fn extract_record<T: DeserializeOwned>(value: Value, key: &str) -> Result<T, ApiError> {
    let record = match value {
        Value::Object(mut map) => match map.remove(key) {
            Some(inner @ Value::Object(_)) => inner,
            Some(other) => {
                map.insert(key.to_string(), other);
                Value::Object(map)
            }
            None => Value::Object(map),
        },
        other => other,
    };
    Ok(serde_json::from_value(record)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::ErrorKind;
    use std::time::Duration;

    fn client(base_path: &str) -> ApiClient {
        ApiClient::new(&ApiConfig {
            url: Url::parse("http://pos.internal:8080").unwrap(),
            base_path: base_path.to_string(),
            service_token: None,
            timeout: Duration::from_secs(1),
        })
        .unwrap()
    }

    #[test]
    fn test_service_token_only_through_service_credentials() {
        let client = ApiClient::new(&ApiConfig {
            url: Url::parse("http://pos.internal:8080").unwrap(),
            base_path: String::new(),
            service_token: Some(SecretString::from("svc_7Hq2mZ9xK4pL")),
            timeout: Duration::from_secs(1),
        })
        .unwrap();
        let url = client.endpoint("/api/customers", &[]).unwrap();
        let auth = |credentials: &Credentials| {
            client
                .build(Method::GET, url.clone(), credentials)
                .build()
                .unwrap()
                .headers()
                .get(header::AUTHORIZATION)
                .map(|v| v.to_str().unwrap().to_string())
        };

        assert_eq!(auth(&Credentials::anonymous()), None);
        assert_eq!(auth(&Credentials::bearer("user_tok")).as_deref(), Some("Bearer user_tok"));
        assert_eq!(
            auth(&client.service_credentials()).as_deref(),
            Some("Bearer svc_7Hq2mZ9xK4pL")
        );
    }

    #[test]
    fn test_endpoint_joins_base_path_and_query() {
        let url = client("/v1")
            .endpoint(
                "/api/customers/search",
                &[("q", "ama k".to_string()), ("page", String::new())],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://pos.internal:8080/v1/api/customers/search?q=ama+k"
        );
    }

    #[test]
    fn test_rejection_carries_exact_text() {
        let err = interpret_response(200, r#"{"success":false,"error":"Insufficient stock"}"#, "/api/pos")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ApiError);
        assert_eq!(err.user_message(), "Insufficient stock");
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(
            interpret_response(404, "", "/api/customers/1").unwrap_err().kind(),
            ErrorKind::NotFound
        );

        let err = interpret_response(422, r#"{"message":"Phone already exists"}"#, "/x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ApiError);
        assert_eq!(err.detail(), "Phone already exists");
        assert_eq!(err.status(), Some(StatusCode::UNPROCESSABLE_ENTITY));

        let err = interpret_response(500, "<html>oops</html>", "/x").unwrap_err();
        assert_eq!(err.detail(), GENERIC_FAILURE);
    }

    #[test]
    fn test_bad_bodies_are_parse_errors() {
        for body in ["", "   ", "<html></html>", "null", "{}"] {
            assert_eq!(
                interpret_response(200, body, "/x").unwrap_err().kind(),
                ErrorKind::ParseError,
                "body {body:?}"
            );
        }
    }

    #[test]
    fn test_success_unwraps_data() {
        let value =
            interpret_response(200, r#"{"success":true,"data":[{"id":1}]}"#, "/x").unwrap();
        assert_eq!(value, serde_json::json!([{"id": 1}]));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let client = ApiClient::new(&ApiConfig {
            url: Url::parse("http://127.0.0.1:9").unwrap(),
            base_path: String::new(),
            service_token: None,
            timeout: Duration::from_secs(2),
        })
        .unwrap();
        let err = client.ping().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(err.user_message().contains("Unable to reach the server"));
    }

    #[test]
    fn test_extract_list_and_record_shapes() {
        let bare: Vec<Value> = extract_list(serde_json::json!([1, 2]), "customers").unwrap();
        assert_eq!(bare.len(), 2);
        let keyed: Vec<Value> =
            extract_list(serde_json::json!({"customers": [1], "total": 1}), "customers").unwrap();
        assert_eq!(keyed.len(), 1);
        let missing: Vec<Value> = extract_list(serde_json::json!({"total": 0}), "customers").unwrap();
        assert!(missing.is_empty());

        let wrapped: Value =
            extract_record(serde_json::json!({"customer": {"id": 4}}), "customer").unwrap();
        assert_eq!(wrapped, serde_json::json!({"id": 4}));
        let plain: Value =
            extract_record(serde_json::json!({"id": 4, "customer": "walk-in"}), "customer").unwrap();
        assert_eq!(plain["customer"], "walk-in");
    }
}
