//! Pull and push stream proxies.
#![allow(clippy::future_not_send)]

use tracing::instrument;

use crate::client::ZlmClient;
use crate::endpoint::{ApiRequest, Endpoint, empty_request};
use crate::envelope::Envelope;
use crate::error::Result;
use crate::params::Params;

/// Request for `addStreamProxy` (pull an rtsp/rtmp/hls/srt source).
///
/// The `enable_*` conversion switches default to the server's
/// configuration when unset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddStreamProxyRequest {
    /// Virtual host of the created stream.
    pub vhost: String,
    /// Application name of the created stream.
    pub app: String,
    /// Stream id of the created stream.
    pub stream: String,
    /// Source URL, e.g. `rtmp://example.com/live/hks2`.
    pub url: String,
    /// RTSP pull mode: 0 tcp, 1 udp, 2 multicast.
    pub rtp_type: Option<i32>,
    /// Pull timeout in seconds.
    pub timeout_sec: Option<f64>,
    /// Retry count; `<= 0` retries forever.
    pub retry_count: Option<i32>,
    /// Remux to HLS-TS.
    pub enable_hls: Option<bool>,
    /// Remux to HLS-fMP4.
    pub enable_hls_fmp4: Option<bool>,
    /// Record MP4.
    pub enable_mp4: Option<bool>,
    /// Remux to RTSP/WebRTC.
    pub enable_rtsp: Option<bool>,
    /// Remux to RTMP/FLV.
    pub enable_rtmp: Option<bool>,
    /// Remux to HTTP-TS/WS-TS.
    pub enable_ts: Option<bool>,
    /// Remux to HTTP-fMP4/WS-fMP4.
    pub enable_fmp4: Option<bool>,
    /// Keep audio when remuxing.
    pub enable_audio: Option<bool>,
    /// Add a silent AAC track when the source has no audio.
    pub add_mute_audio: Option<bool>,
    /// MP4 recording root directory.
    pub mp4_save_path: Option<String>,
    /// MP4 segment length in seconds.
    pub mp4_max_second: Option<i32>,
    /// HLS root directory.
    pub hls_save_path: Option<String>,
    /// Timestamp rewrite mode.
    pub modify_stamp: Option<i32>,
    /// Close the proxy when nobody is watching.
    pub auto_close: Option<bool>,
    /// SRT latency in milliseconds.
    pub latency: Option<i32>,
    /// SRT passphrase.
    pub passphrase: Option<String>,
}

impl AddStreamProxyRequest {
    /// Creates a request with the required stream identity and source URL.
    pub fn new(
        vhost: impl Into<String>,
        app: impl Into<String>,
        stream: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            vhost: vhost.into(),
            app: app.into(),
            stream: stream.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    /// Sets the RTSP pull mode.
    #[must_use]
    pub const fn rtp_type(mut self, rtp_type: i32) -> Self {
        self.rtp_type = Some(rtp_type);
        self
    }

    /// Sets the pull timeout in seconds.
    #[must_use]
    pub const fn timeout_sec(mut self, secs: f64) -> Self {
        self.timeout_sec = Some(secs);
        self
    }

    /// Sets the retry count.
    #[must_use]
    pub const fn retry_count(mut self, count: i32) -> Self {
        self.retry_count = Some(count);
        self
    }

    /// Toggles HLS-TS.
    #[must_use]
    pub const fn enable_hls(mut self, enable: bool) -> Self {
        self.enable_hls = Some(enable);
        self
    }

    /// Toggles HLS-fMP4.
    #[must_use]
    pub const fn enable_hls_fmp4(mut self, enable: bool) -> Self {
        self.enable_hls_fmp4 = Some(enable);
        self
    }

    /// Toggles MP4 recording.
    #[must_use]
    pub const fn enable_mp4(mut self, enable: bool) -> Self {
        self.enable_mp4 = Some(enable);
        self
    }

    /// Toggles RTSP/WebRTC.
    #[must_use]
    pub const fn enable_rtsp(mut self, enable: bool) -> Self {
        self.enable_rtsp = Some(enable);
        self
    }

    /// Toggles RTMP/FLV.
    #[must_use]
    pub const fn enable_rtmp(mut self, enable: bool) -> Self {
        self.enable_rtmp = Some(enable);
        self
    }

    /// Toggles HTTP-TS/WS-TS.
    #[must_use]
    pub const fn enable_ts(mut self, enable: bool) -> Self {
        self.enable_ts = Some(enable);
        self
    }

    /// Toggles HTTP-fMP4/WS-fMP4.
    #[must_use]
    pub const fn enable_fmp4(mut self, enable: bool) -> Self {
        self.enable_fmp4 = Some(enable);
        self
    }

    /// Toggles audio.
    #[must_use]
    pub const fn enable_audio(mut self, enable: bool) -> Self {
        self.enable_audio = Some(enable);
        self
    }

    /// Toggles the silent AAC track.
    #[must_use]
    pub const fn add_mute_audio(mut self, enable: bool) -> Self {
        self.add_mute_audio = Some(enable);
        self
    }

    /// Sets the MP4 recording root.
    #[must_use]
    pub fn mp4_save_path(mut self, path: impl Into<String>) -> Self {
        self.mp4_save_path = Some(path.into());
        self
    }

    /// Sets the MP4 segment length.
    #[must_use]
    pub const fn mp4_max_second(mut self, secs: i32) -> Self {
        self.mp4_max_second = Some(secs);
        self
    }

    /// Sets the HLS root.
    #[must_use]
    pub fn hls_save_path(mut self, path: impl Into<String>) -> Self {
        self.hls_save_path = Some(path.into());
        self
    }

    /// Sets the timestamp rewrite mode.
    #[must_use]
    pub const fn modify_stamp(mut self, mode: i32) -> Self {
        self.modify_stamp = Some(mode);
        self
    }

    /// Toggles auto close.
    #[must_use]
    pub const fn auto_close(mut self, enable: bool) -> Self {
        self.auto_close = Some(enable);
        self
    }

    /// Sets the SRT latency.
    #[must_use]
    pub const fn latency(mut self, millis: i32) -> Self {
        self.latency = Some(millis);
        self
    }

    /// Sets the SRT passphrase.
    #[must_use]
    pub fn passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = Some(passphrase.into());
        self
    }
}

impl ApiRequest for AddStreamProxyRequest {
    const ENDPOINT: Endpoint = Endpoint::ADD_STREAM_PROXY;

    fn params(&self) -> Option<Params> {
        Some(
            Params::builder()
                .required("vhost", &self.vhost)
                .required("app", &self.app)
                .required("stream", &self.stream)
                .required("url", &self.url)
                .optional("rtp_type", self.rtp_type)
                .optional("timeout_sec", self.timeout_sec)
                .optional("retry_count", self.retry_count)
                .flag("enable_hls", self.enable_hls)
                .flag("enable_hls_fmp4", self.enable_hls_fmp4)
                .flag("enable_mp4", self.enable_mp4)
                .flag("enable_rtsp", self.enable_rtsp)
                .flag("enable_rtmp", self.enable_rtmp)
                .flag("enable_ts", self.enable_ts)
                .flag("enable_fmp4", self.enable_fmp4)
                .flag("enable_audio", self.enable_audio)
                .flag("add_mute_audio", self.add_mute_audio)
                .optional("mp4_save_path", self.mp4_save_path.as_deref())
                .optional("mp4_max_second", self.mp4_max_second)
                .optional("hls_save_path", self.hls_save_path.as_deref())
                .optional("modify_stamp", self.modify_stamp)
                .flag("auto_close", self.auto_close)
                .optional("latency", self.latency)
                .optional("passphrase", self.passphrase.as_deref())
                .build(),
        )
    }
}

/// Request for `delStreamProxy`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelStreamProxyRequest {
    /// Key returned by `addStreamProxy`.
    pub key: String,
}

impl DelStreamProxyRequest {
    /// Creates a request for the given proxy key.
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl ApiRequest for DelStreamProxyRequest {
    const ENDPOINT: Endpoint = Endpoint::DEL_STREAM_PROXY;

    fn params(&self) -> Option<Params> {
        Some(Params::builder().required("key", &self.key).build())
    }
}

/// Request for `addStreamPusherProxy` (push a local stream out).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddStreamPusherProxyRequest {
    /// Push protocol, `rtsp` or `rtmp` (case sensitive).
    pub schema: String,
    /// Virtual host of the local stream.
    pub vhost: String,
    /// Application name of the local stream.
    pub app: String,
    /// Stream id of the local stream.
    pub stream: String,
    /// Destination URL, matching `schema`.
    pub dst_url: String,
    /// RTSP push mode: 0 tcp, 1 udp.
    pub rtp_type: Option<i32>,
    /// Push timeout in seconds.
    pub timeout_sec: Option<f64>,
    /// Retry count; `<= 0` retries forever.
    pub retry_count: Option<i32>,
}

impl AddStreamPusherProxyRequest {
    /// Creates a request with the required fields.
    pub fn new(
        schema: impl Into<String>,
        vhost: impl Into<String>,
        app: impl Into<String>,
        stream: impl Into<String>,
        dst_url: impl Into<String>,
    ) -> Self {
        Self {
            schema: schema.into(),
            vhost: vhost.into(),
            app: app.into(),
            stream: stream.into(),
            dst_url: dst_url.into(),
            ..Self::default()
        }
    }

    /// Sets the RTSP push mode.
    #[must_use]
    pub const fn rtp_type(mut self, rtp_type: i32) -> Self {
        self.rtp_type = Some(rtp_type);
        self
    }

    /// Sets the push timeout in seconds.
    #[must_use]
    pub const fn timeout_sec(mut self, secs: f64) -> Self {
        self.timeout_sec = Some(secs);
        self
    }

    /// Sets the retry count.
    #[must_use]
    pub const fn retry_count(mut self, count: i32) -> Self {
        self.retry_count = Some(count);
        self
    }
}

impl ApiRequest for AddStreamPusherProxyRequest {
    const ENDPOINT: Endpoint = Endpoint::ADD_STREAM_PUSHER_PROXY;

    fn params(&self) -> Option<Params> {
        Some(
            Params::builder()
                .required("schema", &self.schema)
                .required("vhost", &self.vhost)
                .required("app", &self.app)
                .required("stream", &self.stream)
                .required("dst_url", &self.dst_url)
                .optional("rtp_type", self.rtp_type)
                .optional("timeout_sec", self.timeout_sec)
                .optional("retry_count", self.retry_count)
                .build(),
        )
    }
}

empty_request! {
    /// Request for `listStreamProxy`.
    ListStreamProxyRequest => LIST_STREAM_PROXY;
    /// Request for `listStreamPusherProxy`.
    ListStreamPusherProxyRequest => LIST_STREAM_PUSHER_PROXY;
}

/// Stream proxy API.
///
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(ProxyApi: Send)]
pub trait LocalProxyApi {
    /// Adds a pull proxy (`addStreamProxy`). The key is in `data.key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server reports a
    /// non-zero code.
    async fn add_stream_proxy(&self, req: &AddStreamProxyRequest) -> Result<Envelope>;

    /// Removes a pull proxy (`delStreamProxy`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server reports a
    /// non-zero code.
    async fn del_stream_proxy(&self, req: &DelStreamProxyRequest) -> Result<Envelope>;

    /// Lists pull proxies (`listStreamProxy`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server reports a
    /// non-zero code.
    async fn list_stream_proxy(&self, req: &ListStreamProxyRequest) -> Result<Envelope>;

    /// Adds a push proxy (`addStreamPusherProxy`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server reports a
    /// non-zero code.
    async fn add_stream_pusher_proxy(&self, req: &AddStreamPusherProxyRequest)
    -> Result<Envelope>;

    /// Lists push proxies (`listStreamPusherProxy`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server reports a
    /// non-zero code.
    async fn list_stream_pusher_proxy(
        &self,
        req: &ListStreamPusherProxyRequest,
    ) -> Result<Envelope>;
}

impl LocalProxyApi for ZlmClient {
    #[instrument(skip_all)]
    async fn add_stream_proxy(&self, req: &AddStreamProxyRequest) -> Result<Envelope> {
        self.execute(req).await
    }

    #[instrument(skip_all)]
    async fn del_stream_proxy(&self, req: &DelStreamProxyRequest) -> Result<Envelope> {
        self.execute(req).await
    }

    #[instrument(skip_all)]
    async fn list_stream_proxy(&self, req: &ListStreamProxyRequest) -> Result<Envelope> {
        self.execute(req).await
    }

    #[instrument(skip_all)]
    async fn add_stream_pusher_proxy(
        &self,
        req: &AddStreamPusherProxyRequest,
    ) -> Result<Envelope> {
        self.execute(req).await
    }

    #[instrument(skip_all)]
    async fn list_stream_pusher_proxy(
        &self,
        req: &ListStreamPusherProxyRequest,
    ) -> Result<Envelope> {
        self.execute(req).await
    }
}
