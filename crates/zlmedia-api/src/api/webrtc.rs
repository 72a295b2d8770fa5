//! WebRTC signalling.
#![allow(clippy::future_not_send)]

use tracing::instrument;

use crate::client::ZlmClient;
use crate::endpoint::{ApiRequest, Endpoint, empty_request};
use crate::envelope::Envelope;
use crate::error::Result;
use crate::params::{ParamValue, Params};

empty_request! {
    /// Request for `getWebRTCApi`.
    GetWebRtcApiRequest => GET_WEBRTC_API;
}

/// Request for the `webrtc` offer/answer exchange, sent as a JSON body.
///
/// Entries in [`extra`](Self::extra) are merged into the body after the
/// named fields and replace them on key collision.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebRtcRequest {
    /// `play` or `publish`.
    pub api: String,
    /// SDP kind, `offer` or `answer`.
    pub kind: String,
    /// SDP text.
    pub sdp: String,
    /// Virtual host.
    pub vhost: String,
    /// Application name.
    pub app: String,
    /// Stream id.
    pub stream: String,
    /// Additional scalar parameters.
    pub extra: Params,
}

impl WebRtcRequest {
    /// Creates a request with the required fields.
    pub fn new(
        api: impl Into<String>,
        kind: impl Into<String>,
        sdp: impl Into<String>,
        vhost: impl Into<String>,
        app: impl Into<String>,
        stream: impl Into<String>,
    ) -> Self {
        Self {
            api: api.into(),
            kind: kind.into(),
            sdp: sdp.into(),
            vhost: vhost.into(),
            app: app.into(),
            stream: stream.into(),
            extra: Params::new(),
        }
    }

    /// Adds one extra parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.extra.insert(name, value);
        self
    }
}

impl ApiRequest for WebRtcRequest {
    const ENDPOINT: Endpoint = Endpoint::WEBRTC;

    fn params(&self) -> Option<Params> {
        Some(
            Params::builder()
                .required("api", &self.api)
                .required("type", &self.kind)
                .required("sdp", &self.sdp)
                .required("vhost", &self.vhost)
                .required("app", &self.app)
                .required("stream", &self.stream)
                .extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())))
                .build(),
        )
    }
}

/// WebRTC API.
///
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(WebRtcApi: Send)]
pub trait LocalWebRtcApi {
    /// Returns WebRTC signalling information (`getWebRTCApi`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server reports a
    /// non-zero code.
    async fn get_webrtc_api(&self, req: &GetWebRtcApiRequest) -> Result<Envelope>;

    /// Exchanges an SDP offer for an answer (`webrtc`). The answer SDP is
    /// in the top-level `sdp` field.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server reports a
    /// non-zero code.
    async fn webrtc(&self, req: &WebRtcRequest) -> Result<Envelope>;
}

impl LocalWebRtcApi for ZlmClient {
    #[instrument(skip_all)]
    async fn get_webrtc_api(&self, req: &GetWebRtcApiRequest) -> Result<Envelope> {
        self.execute(req).await
    }

    #[instrument(skip_all)]
    async fn webrtc(&self, req: &WebRtcRequest) -> Result<Envelope> {
        self.execute(req).await
    }
}
