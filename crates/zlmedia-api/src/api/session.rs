//! TCP session listing and kicking.
#![allow(clippy::future_not_send)]

use tracing::instrument;

use crate::client::ZlmClient;
use crate::endpoint::{ApiRequest, Endpoint};
use crate::envelope::Envelope;
use crate::error::Result;
use crate::params::Params;

/// Request for `getAllSession`. Unset filters match every session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetAllSessionRequest {
    /// Local port filter, e.g. `554` for RTSP.
    pub local_port: Option<u16>,
    /// Peer IP filter.
    pub peer_ip: Option<String>,
}

impl GetAllSessionRequest {
    /// Creates an unfiltered request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters by local port.
    #[must_use]
    pub const fn local_port(mut self, port: u16) -> Self {
        self.local_port = Some(port);
        self
    }

    /// Filters by peer IP.
    #[must_use]
    pub fn peer_ip(mut self, ip: impl Into<String>) -> Self {
        self.peer_ip = Some(ip.into());
        self
    }
}

impl ApiRequest for GetAllSessionRequest {
    const ENDPOINT: Endpoint = Endpoint::GET_ALL_SESSION;

    fn params(&self) -> Option<Params> {
        Some(
            Params::builder()
                .optional("local_port", self.local_port)
                .optional("peer_ip", self.peer_ip.as_deref())
                .build(),
        )
    }
}

/// Request for `kick_session`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KickSessionRequest {
    /// Session id as listed by `getAllSession`.
    pub id: String,
}

impl KickSessionRequest {
    /// Creates a request.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl ApiRequest for KickSessionRequest {
    const ENDPOINT: Endpoint = Endpoint::KICK_SESSION;

    fn params(&self) -> Option<Params> {
        Some(Params::builder().required("id", &self.id).build())
    }
}

/// Request for `kick_sessions`. Unset filters kick every session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KickSessionsRequest {
    /// Local port filter.
    pub local_port: Option<u16>,
    /// Peer IP filter.
    pub peer_ip: Option<String>,
}

impl KickSessionsRequest {
    /// Creates an unfiltered request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters by local port.
    #[must_use]
    pub const fn local_port(mut self, port: u16) -> Self {
        self.local_port = Some(port);
        self
    }

    /// Filters by peer IP.
    #[must_use]
    pub fn peer_ip(mut self, ip: impl Into<String>) -> Self {
        self.peer_ip = Some(ip.into());
        self
    }
}

impl ApiRequest for KickSessionsRequest {
    const ENDPOINT: Endpoint = Endpoint::KICK_SESSIONS;

    fn params(&self) -> Option<Params> {
        Some(
            Params::builder()
                .optional("local_port", self.local_port)
                .optional("peer_ip", self.peer_ip.as_deref())
                .build(),
        )
    }
}

/// Session API.
///
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(SessionApi: Send)]
pub trait LocalSessionApi {
    /// Lists TCP sessions (`getAllSession`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server reports a
    /// non-zero code.
    async fn get_all_session(&self, req: &GetAllSessionRequest) -> Result<Envelope>;

    /// Disconnects one session (`kick_session`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server reports a
    /// non-zero code.
    async fn kick_session(&self, req: &KickSessionRequest) -> Result<Envelope>;

    /// Disconnects every matching session (`kick_sessions`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server reports a
    /// non-zero code.
    async fn kick_sessions(&self, req: &KickSessionsRequest) -> Result<Envelope>;
}

impl LocalSessionApi for ZlmClient {
    #[instrument(skip_all)]
    async fn get_all_session(&self, req: &GetAllSessionRequest) -> Result<Envelope> {
        self.execute(req).await
    }

    #[instrument(skip_all)]
    async fn kick_session(&self, req: &KickSessionRequest) -> Result<Envelope> {
        self.execute(req).await
    }

    #[instrument(skip_all)]
    async fn kick_sessions(&self, req: &KickSessionsRequest) -> Result<Envelope> {
        self.execute(req).await
    }
}
