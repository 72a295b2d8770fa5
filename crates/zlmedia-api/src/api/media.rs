//! Stream listing and closing.
#![allow(clippy::future_not_send)]

use tracing::instrument;

use crate::client::ZlmClient;
use crate::endpoint::{ApiRequest, Endpoint};
use crate::envelope::Envelope;
use crate::error::Result;
use crate::params::Params;

/// Request for `getMediaList`. Every filter is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetMediaListRequest {
    /// Protocol filter, e.g. `rtsp` or `rtmp`.
    pub schema: Option<String>,
    /// Virtual host filter, e.g. `__defaultVhost__`.
    pub vhost: Option<String>,
    /// Application filter, e.g. `live`.
    pub app: Option<String>,
    /// Stream id filter.
    pub stream: Option<String>,
}

impl GetMediaListRequest {
    /// Creates an unfiltered request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters by protocol.
    #[must_use]
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Filters by virtual host.
    #[must_use]
    pub fn vhost(mut self, vhost: impl Into<String>) -> Self {
        self.vhost = Some(vhost.into());
        self
    }

    /// Filters by application.
    #[must_use]
    pub fn app(mut self, app: impl Into<String>) -> Self {
        self.app = Some(app.into());
        self
    }

    /// Filters by stream id.
    #[must_use]
    pub fn stream(mut self, stream: impl Into<String>) -> Self {
        self.stream = Some(stream.into());
        self
    }
}

impl ApiRequest for GetMediaListRequest {
    const ENDPOINT: Endpoint = Endpoint::GET_MEDIA_LIST;

    fn params(&self) -> Option<Params> {
        Some(
            Params::builder()
                .optional("schema", self.schema.as_deref())
                .optional("vhost", self.vhost.as_deref())
                .optional("app", self.app.as_deref())
                .optional("stream", self.stream.as_deref())
                .build(),
        )
    }
}

/// Request for `close_stream`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseStreamRequest {
    /// Protocol, e.g. `rtmp`.
    pub schema: String,
    /// Virtual host.
    pub vhost: String,
    /// Application name.
    pub app: String,
    /// Stream id.
    pub stream: String,
    /// Close even while players are attached.
    pub force: Option<bool>,
}

impl CloseStreamRequest {
    /// Creates a request for one stream.
    pub fn new(
        schema: impl Into<String>,
        vhost: impl Into<String>,
        app: impl Into<String>,
        stream: impl Into<String>,
    ) -> Self {
        Self {
            schema: schema.into(),
            vhost: vhost.into(),
            app: app.into(),
            stream: stream.into(),
            force: None,
        }
    }

    /// Sets the `force` flag.
    #[must_use]
    pub const fn force(mut self, force: bool) -> Self {
        self.force = Some(force);
        self
    }
}

impl ApiRequest for CloseStreamRequest {
    const ENDPOINT: Endpoint = Endpoint::CLOSE_STREAM;

    fn params(&self) -> Option<Params> {
        Some(
            Params::builder()
                .required("schema", &self.schema)
                .required("vhost", &self.vhost)
                .required("app", &self.app)
                .required("stream", &self.stream)
                .flag("force", self.force)
                .build(),
        )
    }
}

/// Request for `close_streams`. Unset filters match every stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseStreamsRequest {
    /// Protocol filter.
    pub schema: Option<String>,
    /// Virtual host filter.
    pub vhost: Option<String>,
    /// Application filter.
    pub app: Option<String>,
    /// Stream id filter.
    pub stream: Option<String>,
    /// Close even while players are attached.
    pub force: Option<bool>,
}

impl CloseStreamsRequest {
    /// Creates a request matching every stream.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters by protocol.
    #[must_use]
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Filters by virtual host.
    #[must_use]
    pub fn vhost(mut self, vhost: impl Into<String>) -> Self {
        self.vhost = Some(vhost.into());
        self
    }

    /// Filters by application.
    #[must_use]
    pub fn app(mut self, app: impl Into<String>) -> Self {
        self.app = Some(app.into());
        self
    }

    /// Filters by stream id.
    #[must_use]
    pub fn stream(mut self, stream: impl Into<String>) -> Self {
        self.stream = Some(stream.into());
        self
    }

    /// Sets the `force` flag.
    #[must_use]
    pub const fn force(mut self, force: bool) -> Self {
        self.force = Some(force);
        self
    }
}

impl ApiRequest for CloseStreamsRequest {
    const ENDPOINT: Endpoint = Endpoint::CLOSE_STREAMS;

    fn params(&self) -> Option<Params> {
        Some(
            Params::builder()
                .optional("schema", self.schema.as_deref())
                .optional("vhost", self.vhost.as_deref())
                .optional("app", self.app.as_deref())
                .optional("stream", self.stream.as_deref())
                .flag("force", self.force)
                .build(),
        )
    }
}

/// Stream management API.
///
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(MediaApi: Send)]
pub trait LocalMediaApi {
    /// Lists running streams (`getMediaList`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server reports a
    /// non-zero code.
    async fn get_media_list(&self, req: &GetMediaListRequest) -> Result<Envelope>;

    /// Closes one stream (`close_stream`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server reports a
    /// non-zero code.
    async fn close_stream(&self, req: &CloseStreamRequest) -> Result<Envelope>;

    /// Closes every stream matching the filters (`close_streams`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server reports a
    /// non-zero code.
    async fn close_streams(&self, req: &CloseStreamsRequest) -> Result<Envelope>;
}

impl LocalMediaApi for ZlmClient {
    #[instrument(skip_all)]
    async fn get_media_list(&self, req: &GetMediaListRequest) -> Result<Envelope> {
        self.execute(req).await
    }

    #[instrument(skip_all)]
    async fn close_stream(&self, req: &CloseStreamRequest) -> Result<Envelope> {
        self.execute(req).await
    }

    #[instrument(skip_all)]
    async fn close_streams(&self, req: &CloseStreamsRequest) -> Result<Envelope> {
        self.execute(req).await
    }
}
