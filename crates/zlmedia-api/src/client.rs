//! `ZlmClient` - ZLMediaKit REST API client implementation.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use url::Url;

use crate::endpoint::{ApiRequest, Method};
use crate::envelope::Envelope;
use crate::error::{Error, Result};
use crate::params::Params;

/// Timeout applied when none (or zero) is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Name of the credential parameter injected into every request.
const SECRET_PARAM: &str = "secret";

/// Default User-Agent.
const DEFAULT_USER_AGENT: &str = concat!("zlmedia-api/", env!("CARGO_PKG_VERSION"));

/// ZLMediaKit REST API client.
///
/// Immutable after [`build`](ZlmClientBuilder::build). Cloning is cheap and
/// shares the underlying connection pool.
#[derive(Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct ZlmClient {
    /// HTTP client (reqwest, timeout applied).
    http_client: Client,
    /// Base URL without trailing slash.
    base_url: String,
    /// Shared secret sent as the `secret` parameter.
    secret: String,
    /// Per-request timeout.
    timeout: Duration,
    /// Caller cancellation signal.
    cancel: Option<CancellationToken>,
    /// Caller deadline.
    deadline: Option<Instant>,
}

impl fmt::Debug for ZlmClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZlmClient")
            .field("base_url", &self.base_url)
            .field("secret", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("cancel", &self.cancel)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

/// Builder for `ZlmClient`.
#[derive(Debug, Default)]
#[allow(clippy::module_name_repetitions)]
pub struct ZlmClientBuilder {
    base_url: Option<String>,
    secret: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl ZlmClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            secret: None,
            timeout: None,
            user_agent: None,
        }
    }

    /// Sets the server base URL, e.g. `http://127.0.0.1:80` (required).
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the API secret (required).
    #[must_use]
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Sets the request timeout (default: 10s, zero means default).
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Overrides the User-Agent.
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if:
    /// - `base_url` is not set, empty, or not an absolute http(s) URL.
    /// - `secret` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<ZlmClient> {
        let raw_url = self
            .base_url
            .ok_or_else(|| Error::Config(String::from("base_url is required")))?;
        let base_url = normalize_base_url(&raw_url)?;
        let secret = self
            .secret
            .ok_or_else(|| Error::Config(String::from("secret is required")))?;
        let timeout = self
            .timeout
            .filter(|t| !t.is_zero())
            .unwrap_or(DEFAULT_TIMEOUT);
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| String::from(DEFAULT_USER_AGENT));

        let http_client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        tracing::debug!(%base_url, ?timeout, "ZLMediaKit client configured");

        Ok(ZlmClient {
            http_client,
            base_url,
            secret,
            timeout,
            cancel: None,
            deadline: None,
        })
    }
}

/// Validates a base URL and strips trailing slashes.
fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::Config(String::from("base_url must not be empty")));
    }
    let parsed =
        Url::parse(trimmed).map_err(|e| Error::Config(format!("invalid base_url {trimmed}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::Config(format!(
            "unsupported base_url scheme: {}",
            parsed.scheme()
        )));
    }
    Ok(String::from(trimmed))
}

impl ZlmClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> ZlmClientBuilder {
        ZlmClientBuilder::new()
    }

    /// Returns the normalized base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the configured request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns a client whose calls abort with [`Error::Cancelled`] once
    /// `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            cancel: Some(token),
            ..self.clone()
        }
    }

    /// Returns a client whose calls abort with [`Error::DeadlineExceeded`]
    /// once `deadline` passes. The configured timeout still applies.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            ..self.clone()
        }
    }

    /// Sends a typed request and decodes the envelope.
    ///
    /// # Errors
    ///
    /// Returns any error of [`call`](Self::call) or
    /// [`Envelope::decode`].
    #[instrument(skip_all, fields(endpoint = %R::ENDPOINT))]
    pub async fn execute<R: ApiRequest + Sync>(&self, request: &R) -> Result<Envelope> {
        let params = request.params();
        let endpoint = R::ENDPOINT;
        let body = self
            .call(endpoint.method, endpoint.path, params.as_ref())
            .await?;
        Envelope::decode(&body)
    }

    /// Sends one request and returns the raw response body.
    ///
    /// - `GET`: `secret` and `params` go to the query string.
    /// - `POST` with `params`: `params` plus `secret` as a JSON body.
    /// - `POST` without `params`: `secret` alone as a form body.
    ///
    /// `secret` is always sent exactly once; a `secret` key in `params` is
    /// replaced by the configured one.
    ///
    /// # Errors
    ///
    /// - [`Error::BuildRequest`] / [`Error::Serialize`] if the request cannot
    ///   be constructed.
    /// - [`Error::Transport`] on connection failure or timeout.
    /// - [`Error::Cancelled`] / [`Error::DeadlineExceeded`] when the caller's
    ///   token or deadline fires first.
    /// - [`Error::HttpStatus`] if the status is outside `200..300`.
    #[instrument(skip_all, fields(method = %method, path = %path))]
    pub async fn call(&self, method: Method, path: &str, params: Option<&Params>) -> Result<Bytes> {
        let request = self.build_request(method, path, params)?;
        tracing::debug!(
            param_count = params.map_or(0, Params::len),
            "ZLMediaKit API request"
        );
        self.guard(self.round_trip(request)).await
    }

    /// Builds the outbound request.
    fn build_request(
        &self,
        method: Method,
        path: &str,
        params: Option<&Params>,
    ) -> Result<reqwest::Request> {
        let url = format!("{}{}", self.base_url, path);

        let builder = match (method, params) {
            (Method::Get, params) => {
                let mut query: Vec<(&str, String)> = vec![(SECRET_PARAM, self.secret.clone())];
                if let Some(params) = params {
                    let pairs = params.to_query_pairs().map_err(Error::Serialize)?;
                    query.extend(
                        pairs
                            .into_iter()
                            .filter(|(name, _)| *name != SECRET_PARAM),
                    );
                }
                self.http_client.get(&url).query(&query)
            }
            (Method::Post, Some(params)) => {
                let mut body = params.clone();
                body.insert(SECRET_PARAM, self.secret.as_str());
                let json = serde_json::to_vec(&body).map_err(Error::Serialize)?;
                self.http_client
                    .post(&url)
                    .header(CONTENT_TYPE, "application/json")
                    .body(json)
            }
            (Method::Post, None) => self
                .http_client
                .post(&url)
                .form(&[(SECRET_PARAM, self.secret.as_str())]),
        };

        builder
            .header(ACCEPT, "application/json")
            .build()
            .map_err(Error::BuildRequest)
    }

    /// Executes the request and reads the body, rejecting non-2xx statuses.
    async fn round_trip(&self, request: reqwest::Request) -> Result<Bytes> {
        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(Error::Transport)?;

        let status = response.status();
        let body = response.bytes().await.map_err(Error::Transport)?;
        tracing::debug!(
            status = status.as_u16(),
            body_len = body.len(),
            "ZLMediaKit API response"
        );

        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        Ok(body)
    }

    /// Races `fut` against the caller's cancellation token and deadline.
    async fn guard<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        let cancelled = async {
            match &self.cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };
        let deadline_passed = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            () = cancelled => {
                tracing::debug!("ZLMediaKit API request cancelled");
                Err(Error::Cancelled)
            }
            () = deadline_passed => {
                tracing::debug!("ZLMediaKit API request deadline exceeded");
                Err(Error::DeadlineExceeded)
            }
            result = fut => result,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::params::ParamValue;

    const OK_BODY: &str = r#"{"code":0}"#;

    fn test_client(base_url: &str) -> ZlmClient {
        ZlmClient::builder()
            .base_url(base_url)
            .secret("s3cret")
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_base_url() {
        // Arrange & Act
        let result = ZlmClient::builder().secret("s3cret").build();

        // Assert
        let err = result.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("base_url is required"));
    }

    #[test]
    fn test_builder_rejects_empty_base_url() {
        // Arrange & Act
        let result = ZlmClient::builder().base_url(" / ").secret("s3cret").build();

        // Assert
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("base_url must not be empty")
        );
    }

    #[test]
    fn test_builder_rejects_relative_and_non_http_urls() {
        // Arrange & Act
        let relative = ZlmClient::builder()
            .base_url("localhost/index")
            .secret("s3cret")
            .build();
        let ftp = ZlmClient::builder()
            .base_url("ftp://127.0.0.1")
            .secret("s3cret")
            .build();

        // Assert
        assert!(matches!(relative.unwrap_err(), Error::Config(_)));
        assert!(ftp.unwrap_err().to_string().contains("unsupported base_url scheme"));
    }

    #[test]
    fn test_builder_requires_secret() {
        // Arrange & Act
        let result = ZlmClient::builder().base_url("http://127.0.0.1").build();

        // Assert
        assert!(result.unwrap_err().to_string().contains("secret is required"));
    }

    #[test]
    fn test_builder_strips_trailing_slash() {
        // Arrange & Act
        let client = test_client("http://127.0.0.1:8080//");

        // Assert
        assert_eq!(client.base_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_builder_default_timeout() {
        // Arrange & Act
        let unset = test_client("http://127.0.0.1");
        let zero = ZlmClient::builder()
            .base_url("http://127.0.0.1")
            .secret("s3cret")
            .timeout(Duration::ZERO)
            .build()
            .unwrap();
        let custom = ZlmClient::builder()
            .base_url("http://127.0.0.1")
            .secret("s3cret")
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap();

        // Assert
        assert_eq!(unset.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(zero.timeout(), Duration::from_secs(10));
        assert_eq!(custom.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_debug_redacts_secret() {
        // Arrange
        let client = test_client("http://127.0.0.1");

        // Act
        let text = format!("{client:?}");

        // Assert
        assert!(!text.contains("s3cret"));
        assert!(text.contains("<redacted>"));
    }

    #[tokio::test]
    async fn test_get_without_params_sends_only_secret() {
        // Arrange
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/index/api/listStreamProxy"))
            .and(query_param("secret", "s3cret"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(OK_BODY))
            .expect(1)
            .mount(&mock_server)
            .await;
        let client = test_client(&mock_server.uri());

        // Act
        let body = client
            .call(Method::Get, "/index/api/listStreamProxy", None)
            .await
            .unwrap();

        // Assert
        assert_eq!(&body[..], OK_BODY.as_bytes());
        let requests = mock_server.received_requests().await.unwrap();
        let pairs: Vec<_> = requests[0].url.query_pairs().collect();
        assert_eq!(pairs.len(), 1);
    }

    #[tokio::test]
    async fn test_get_secret_is_sent_exactly_once() {
        // Arrange
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(OK_BODY))
            .mount(&mock_server)
            .await;
        let client = test_client(&mock_server.uri());
        let mut params = Params::new();
        params.insert("app", "live");
        params.insert("secret", "spoofed");

        // Act
        client
            .call(Method::Get, "/index/api/getMediaList", Some(&params))
            .await
            .unwrap();

        // Assert
        let requests = mock_server.received_requests().await.unwrap();
        let secrets: Vec<String> = requests[0]
            .url
            .query_pairs()
            .filter(|(k, _)| k == "secret")
            .map(|(_, v)| v.into_owned())
            .collect();
        assert_eq!(secrets, vec![String::from("s3cret")]);
    }

    #[tokio::test]
    async fn test_get_stringifies_scalars() {
        // Arrange
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("port", "0"))
            .and(query_param("timeout_sec", "2.5"))
            .and(query_param("raw", "true"))
            .and(query_param("stream_id", "gb 28181"))
            .respond_with(ResponseTemplate::new(200).set_body_string(OK_BODY))
            .expect(1)
            .mount(&mock_server)
            .await;
        let client = test_client(&mock_server.uri());
        let params = Params::builder()
            .required("port", 0_i32)
            .required("timeout_sec", 2.5)
            .required("raw", ParamValue::Bool(true))
            .required("stream_id", "gb 28181")
            .build();

        // Act & Assert (mock expect(1) verifies the query string)
        client
            .call(Method::Get, "/index/api/openRtpServer", Some(&params))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_post_with_params_sends_json_body() {
        // Arrange
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/index/api/webrtc"))
            .and(header("content-type", "application/json"))
            .and(header("accept", "application/json"))
            .and(body_json(serde_json::json!({
                "app": "live",
                "sdp": "v=0",
                "secret": "s3cret",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(OK_BODY))
            .expect(1)
            .mount(&mock_server)
            .await;
        let client = test_client(&mock_server.uri());
        let params = Params::builder()
            .required("app", "live")
            .required("sdp", "v=0")
            .build();

        // Act & Assert (mock expect(1) verifies the body)
        client
            .call(Method::Post, "/index/api/webrtc", Some(&params))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_post_without_params_sends_form_secret() {
        // Arrange
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string("secret=s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_string(OK_BODY))
            .expect(1)
            .mount(&mock_server)
            .await;
        let client = test_client(&mock_server.uri());

        // Act & Assert (mock expect(1) verifies the form body)
        client
            .call(Method::Post, "/index/api/webrtc", None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_non_finite_float_fails_before_sending() {
        // Arrange
        let mock_server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(200).set_body_string(OK_BODY))
            .expect(0)
            .mount(&mock_server)
            .await;
        let client = test_client(&mock_server.uri());
        let nan = Params::builder().required("x", f64::NAN).build();
        let inf = Params::builder().required("timeout_sec", f64::INFINITY).build();

        // Act
        let post = client
            .call(Method::Post, "/index/api/webrtc", Some(&nan))
            .await;
        let get = client
            .call(Method::Get, "/index/api/addStreamProxy", Some(&inf))
            .await;

        // Assert
        assert!(matches!(post.unwrap_err(), Error::Serialize(_)));
        assert!(matches!(get.unwrap_err(), Error::Serialize(_)));
        assert!(mock_server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_http_500_returns_status_and_body() {
        // Arrange
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string(r#"{"code":0}"#))
            .mount(&mock_server)
            .await;
        let client = test_client(&mock_server.uri());

        // Act
        let err = client
            .call(Method::Get, "/index/api/getStatistic", None)
            .await
            .unwrap_err();

        // Assert
        assert_eq!(err.status(), Some(500));
        assert!(
            matches!(&err, Error::HttpStatus { body, .. } if body == r#"{"code":0}"#),
            "{err}"
        );
    }

    #[tokio::test]
    async fn test_execute_decodes_logical_error() {
        // Arrange
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/index/api/getApiList"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"code":-100,"msg":"Incorrect secret"}"#),
            )
            .mount(&mock_server)
            .await;
        let client = test_client(&mock_server.uri());

        // Act
        let err = client
            .execute(&crate::api::GetApiListRequest)
            .await
            .unwrap_err();

        // Assert
        assert_eq!(err.api_code(), Some(-100));
        assert_eq!(err.envelope().unwrap().message(), "Incorrect secret");
    }

    #[tokio::test]
    async fn test_execute_non_json_body_is_decode_error() {
        // Arrange
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;
        let client = test_client(&mock_server.uri());

        // Act
        let err = client
            .execute(&crate::api::GetStatisticRequest)
            .await
            .unwrap_err();

        // Assert
        assert!(matches!(err, Error::Decode(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        // Arrange
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(OK_BODY)
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;
        let client = ZlmClient::builder()
            .base_url(mock_server.uri())
            .secret("s3cret")
            .timeout(Duration::from_millis(100))
            .build()
            .unwrap();

        // Act
        let err = client
            .call(Method::Get, "/index/api/getStatistic", None)
            .await
            .unwrap_err();

        // Assert
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_cancellation_aborts_in_flight_request() {
        // Arrange
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(OK_BODY)
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&mock_server)
            .await;
        let token = CancellationToken::new();
        let client = test_client(&mock_server.uri()).with_cancellation(token.clone());
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        });

        // Act
        let err = client
            .call(Method::Get, "/index/api/getStatistic", None)
            .await
            .unwrap_err();
        canceller.await.unwrap();

        // Assert
        assert!(matches!(err, Error::Cancelled));
    }

    #[tokio::test]
    async fn test_already_cancelled_token_sends_nothing() {
        // Arrange
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(OK_BODY))
            .expect(0)
            .mount(&mock_server)
            .await;
        let token = CancellationToken::new();
        token.cancel();
        let client = test_client(&mock_server.uri()).with_cancellation(token);

        // Act
        let err = client
            .call(Method::Get, "/index/api/getStatistic", None)
            .await
            .unwrap_err();

        // Assert
        assert!(matches!(err, Error::Cancelled));
    }

    #[tokio::test]
    async fn test_deadline_fires_before_timeout() {
        // Arrange
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(OK_BODY)
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&mock_server)
            .await;
        let deadline = Instant::now() + Duration::from_millis(100);
        let client = test_client(&mock_server.uri()).with_deadline(deadline);

        // Act
        let err = client
            .call(Method::Get, "/index/api/getStatistic", None)
            .await
            .unwrap_err();

        // Assert
        assert!(matches!(err, Error::DeadlineExceeded));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Arrange: nothing listens on port 9 (discard) on loopback
        let client = test_client("http://127.0.0.1:9");

        // Act
        let err = client
            .call(Method::Get, "/index/api/getStatistic", None)
            .await
            .unwrap_err();

        // Assert
        assert!(matches!(err, Error::Transport(_)));
    }
}
