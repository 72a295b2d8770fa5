//! Endpoint catalog, grouped the way the server documents its API.
//!
//! Every request type implements [`ApiRequest`](crate::ApiRequest) and every
//! group trait is implemented for [`ZlmClient`](crate::ZlmClient) by
//! delegating to [`ZlmClient::execute`](crate::ZlmClient::execute).

mod media;
mod proxy;
mod record;
mod rtp;
mod server;
mod session;
mod webrtc;

/// Virtual host used when none is configured on the server.
pub const DEFAULT_VHOST: &str = "__defaultVhost__";

pub use media::{
    CloseStreamRequest, CloseStreamsRequest, GetMediaListRequest, LocalMediaApi, MediaApi,
};
pub use proxy::{
    AddStreamProxyRequest, AddStreamPusherProxyRequest, DelStreamProxyRequest, LocalProxyApi,
    ListStreamProxyRequest, ListStreamPusherProxyRequest, ProxyApi,
};
pub use record::{
    DeleteRecordDirectoryRequest, GetMp4RecordFileRequest, GetSnapRequest, IsRecordingRequest,
    LocalRecordApi, RecordApi, RecordType, StartRecordRequest, StopRecordRequest,
};
pub use rtp::{
    CloseRtpServerRequest, GetRtpInfoRequest, ListRtpServerRequest, LocalRtpApi,
    OpenRtpServerRequest, RtpApi, StartSendRtpRequest, StopSendRtpRequest,
};
pub use server::{
    GetApiListRequest, GetServerConfigRequest, GetStatisticRequest, GetThreadsLoadRequest,
    GetWorkThreadsLoadRequest, LocalServerApi, RestartServerRequest, ServerApi,
    SetServerConfigRequest,
};
pub use session::{
    GetAllSessionRequest, KickSessionRequest, KickSessionsRequest, LocalSessionApi, SessionApi,
};
pub use webrtc::{GetWebRtcApiRequest, LocalWebRtcApi, WebRtcApi, WebRtcRequest};

#[cfg(test)]
pub(crate) mod test_support {
    #![allow(clippy::unwrap_used)]

    use wiremock::MockServer;

    use crate::client::ZlmClient;

    /// Starts a mock server and a client pointed at it.
    pub(crate) async fn mock_client() -> (MockServer, ZlmClient) {
        let mock_server = MockServer::start().await;
        let client = ZlmClient::builder()
            .base_url(mock_server.uri())
            .secret("test-secret")
            .build()
            .unwrap();
        (mock_server, client)
    }
}
