//! GB28181 RTP receive ports and RTP forwarding.
#![allow(clippy::future_not_send)]

use tracing::instrument;

use crate::client::ZlmClient;
use crate::endpoint::{ApiRequest, Endpoint, empty_request};
use crate::envelope::Envelope;
use crate::error::Result;
use crate::params::Params;

/// Request for `openRtpServer`.
///
/// The integer switches take `1`/`0` and are forwarded as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRtpServerRequest {
    /// Receive port; `0` picks a random one.
    pub port: u16,
    /// Stream id bound to the port.
    pub stream_id: String,
    /// TCP mode switch (server default `0`).
    pub enable_tcp: Option<i32>,
    /// Port reuse switch (server default `1`).
    pub re_use_port: Option<i32>,
    /// SSRC filter switch (server default `0`).
    pub ssrc_filter: Option<i32>,
}

impl OpenRtpServerRequest {
    /// Creates a request binding `stream_id` to `port`.
    pub fn new(port: u16, stream_id: impl Into<String>) -> Self {
        Self {
            port,
            stream_id: stream_id.into(),
            enable_tcp: None,
            re_use_port: None,
            ssrc_filter: None,
        }
    }

    /// Sets the TCP mode switch.
    #[must_use]
    pub const fn enable_tcp(mut self, value: i32) -> Self {
        self.enable_tcp = Some(value);
        self
    }

    /// Sets the port reuse switch.
    #[must_use]
    pub const fn re_use_port(mut self, value: i32) -> Self {
        self.re_use_port = Some(value);
        self
    }

    /// Sets the SSRC filter switch.
    #[must_use]
    pub const fn ssrc_filter(mut self, value: i32) -> Self {
        self.ssrc_filter = Some(value);
        self
    }
}

impl ApiRequest for OpenRtpServerRequest {
    const ENDPOINT: Endpoint = Endpoint::OPEN_RTP_SERVER;

    fn params(&self) -> Option<Params> {
        Some(
            Params::builder()
                .required("port", self.port)
                .required("stream_id", &self.stream_id)
                .optional("enable_tcp", self.enable_tcp)
                .optional("re_use_port", self.re_use_port)
                .optional("ssrc_filter", self.ssrc_filter)
                .build(),
        )
    }
}

/// Request for `closeRtpServer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseRtpServerRequest {
    /// Stream id given to `openRtpServer`.
    pub stream_id: String,
}

impl CloseRtpServerRequest {
    /// Creates a request.
    pub fn new(stream_id: impl Into<String>) -> Self {
        Self {
            stream_id: stream_id.into(),
        }
    }
}

impl ApiRequest for CloseRtpServerRequest {
    const ENDPOINT: Endpoint = Endpoint::CLOSE_RTP_SERVER;

    fn params(&self) -> Option<Params> {
        Some(Params::builder().required("stream_id", &self.stream_id).build())
    }
}

/// Request for `startSendRtp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartSendRtpRequest {
    /// Virtual host of the source stream.
    pub vhost: String,
    /// Application name of the source stream.
    pub app: String,
    /// Stream id of the source stream.
    pub stream: String,
    /// SSRC of the outgoing RTP; distinct SSRCs fan out to several peers.
    pub ssrc: String,
    /// Destination host or IP.
    pub dst_url: String,
    /// Destination port.
    pub dst_port: u16,
    /// UDP (`1`) or TCP (`0`) transport.
    pub is_udp: Option<i32>,
    /// Local port; `0` picks a random one.
    pub src_port: Option<i32>,
    /// RTP payload type (server default 96).
    pub pt: Option<i32>,
    /// PS (`1`) or ES (`0`) payload (server default `1`).
    pub use_ps: Option<i32>,
    /// With ES payload, send audio (`1`) or video (`0`).
    pub only_audio: Option<i32>,
}

impl StartSendRtpRequest {
    /// Creates a request with the required fields.
    pub fn new(
        vhost: impl Into<String>,
        app: impl Into<String>,
        stream: impl Into<String>,
        ssrc: impl Into<String>,
        dst_url: impl Into<String>,
        dst_port: u16,
    ) -> Self {
        Self {
            vhost: vhost.into(),
            app: app.into(),
            stream: stream.into(),
            ssrc: ssrc.into(),
            dst_url: dst_url.into(),
            dst_port,
            is_udp: None,
            src_port: None,
            pt: None,
            use_ps: None,
            only_audio: None,
        }
    }

    /// Sets the transport switch.
    #[must_use]
    pub const fn is_udp(mut self, value: i32) -> Self {
        self.is_udp = Some(value);
        self
    }

    /// Sets the local port.
    #[must_use]
    pub const fn src_port(mut self, port: i32) -> Self {
        self.src_port = Some(port);
        self
    }

    /// Sets the RTP payload type.
    #[must_use]
    pub const fn pt(mut self, pt: i32) -> Self {
        self.pt = Some(pt);
        self
    }

    /// Sets the PS/ES switch.
    #[must_use]
    pub const fn use_ps(mut self, value: i32) -> Self {
        self.use_ps = Some(value);
        self
    }

    /// Sets the audio-only switch.
    #[must_use]
    pub const fn only_audio(mut self, value: i32) -> Self {
        self.only_audio = Some(value);
        self
    }
}

impl ApiRequest for StartSendRtpRequest {
    const ENDPOINT: Endpoint = Endpoint::START_SEND_RTP;

    fn params(&self) -> Option<Params> {
        Some(
            Params::builder()
                .required("vhost", &self.vhost)
                .required("app", &self.app)
                .required("stream", &self.stream)
                .required("ssrc", &self.ssrc)
                .required("dst_url", &self.dst_url)
                .required("dst_port", self.dst_port)
                .optional("is_udp", self.is_udp)
                .optional("src_port", self.src_port)
                .optional("pt", self.pt)
                .optional("use_ps", self.use_ps)
                .optional("only_audio", self.only_audio)
                .build(),
        )
    }
}

/// Request for `stopSendRtp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopSendRtpRequest {
    /// Virtual host of the source stream.
    pub vhost: String,
    /// Application name of the source stream.
    pub app: String,
    /// Stream id of the source stream.
    pub stream: String,
    /// SSRC given to `startSendRtp`.
    pub ssrc: String,
}

impl StopSendRtpRequest {
    /// Creates a request.
    pub fn new(
        vhost: impl Into<String>,
        app: impl Into<String>,
        stream: impl Into<String>,
        ssrc: impl Into<String>,
    ) -> Self {
        Self {
            vhost: vhost.into(),
            app: app.into(),
            stream: stream.into(),
            ssrc: ssrc.into(),
        }
    }
}

impl ApiRequest for StopSendRtpRequest {
    const ENDPOINT: Endpoint = Endpoint::STOP_SEND_RTP;

    fn params(&self) -> Option<Params> {
        Some(
            Params::builder()
                .required("vhost", &self.vhost)
                .required("app", &self.app)
                .required("stream", &self.stream)
                .required("ssrc", &self.ssrc)
                .build(),
        )
    }
}

/// Request for `getRtpInfo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetRtpInfoRequest {
    /// Stream id.
    pub stream_id: String,
}

impl GetRtpInfoRequest {
    /// Creates a request.
    pub fn new(stream_id: impl Into<String>) -> Self {
        Self {
            stream_id: stream_id.into(),
        }
    }
}

impl ApiRequest for GetRtpInfoRequest {
    const ENDPOINT: Endpoint = Endpoint::GET_RTP_INFO;

    fn params(&self) -> Option<Params> {
        Some(Params::builder().required("stream_id", &self.stream_id).build())
    }
}

empty_request! {
    /// Request for `listRtpServer`.
    ListRtpServerRequest => LIST_RTP_SERVER;
}

/// RTP API.
///
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(RtpApi: Send)]
pub trait LocalRtpApi {
    /// Opens a receive port (`openRtpServer`). The bound port is in `port`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server reports a
    /// non-zero code.
    async fn open_rtp_server(&self, req: &OpenRtpServerRequest) -> Result<Envelope>;

    /// Closes a receive port (`closeRtpServer`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server reports a
    /// non-zero code.
    async fn close_rtp_server(&self, req: &CloseRtpServerRequest) -> Result<Envelope>;

    /// Lists receive ports (`listRtpServer`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server reports a
    /// non-zero code.
    async fn list_rtp_server(&self, req: &ListRtpServerRequest) -> Result<Envelope>;

    /// Starts forwarding a stream as RTP (`startSendRtp`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server reports a
    /// non-zero code.
    async fn start_send_rtp(&self, req: &StartSendRtpRequest) -> Result<Envelope>;

    /// Stops forwarding (`stopSendRtp`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server reports a
    /// non-zero code.
    async fn stop_send_rtp(&self, req: &StopSendRtpRequest) -> Result<Envelope>;

    /// Returns RTP receive state of a stream (`getRtpInfo`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server reports a
    /// non-zero code.
    async fn get_rtp_info(&self, req: &GetRtpInfoRequest) -> Result<Envelope>;
}

impl LocalRtpApi for ZlmClient {
    #[instrument(skip_all)]
    async fn open_rtp_server(&self, req: &OpenRtpServerRequest) -> Result<Envelope> {
        self.execute(req).await
    }

    #[instrument(skip_all)]
    async fn close_rtp_server(&self, req: &CloseRtpServerRequest) -> Result<Envelope> {
        self.execute(req).await
    }

    #[instrument(skip_all)]
    async fn list_rtp_server(&self, req: &ListRtpServerRequest) -> Result<Envelope> {
        self.execute(req).await
    }

    #[instrument(skip_all)]
    async fn start_send_rtp(&self, req: &StartSendRtpRequest) -> Result<Envelope> {
        self.execute(req).await
    }

    #[instrument(skip_all)]
    async fn stop_send_rtp(&self, req: &StopSendRtpRequest) -> Result<Envelope> {
        self.execute(req).await
    }

    #[instrument(skip_all)]
    async fn get_rtp_info(&self, req: &GetRtpInfoRequest) -> Result<Envelope> {
        self.execute(req).await
    }
}
