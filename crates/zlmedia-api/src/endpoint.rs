//! Endpoint catalog: HTTP method and path of every remote operation.

use std::fmt;

use crate::params::Params;

/// HTTP method used by an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Parameters travel in the query string.
    Get,
    /// Parameters travel in the request body.
    Post,
}

impl Method {
    /// Returns the method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A remote operation identified by method and path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// HTTP method.
    pub method: Method,
    /// Path below the base URL.
    pub path: &'static str,
}

impl Endpoint {
    const fn get(path: &'static str) -> Self {
        Self {
            method: Method::Get,
            path,
        }
    }

    const fn post(path: &'static str) -> Self {
        Self {
            method: Method::Post,
            path,
        }
    }

    /// `getApiList`
    pub const GET_API_LIST: Self = Self::get("/index/api/getApiList");
    /// `getThreadsLoad`
    pub const GET_THREADS_LOAD: Self = Self::get("/index/api/getThreadsLoad");
    /// `getStatistic`
    pub const GET_STATISTIC: Self = Self::get("/index/api/getStatistic");
    /// `getWorkThreadsLoad`
    pub const GET_WORK_THREADS_LOAD: Self = Self::get("/index/api/getWorkThreadsLoad");
    /// `getServerConfig`
    pub const GET_SERVER_CONFIG: Self = Self::get("/index/api/getServerConfig");
    /// `setServerConfig`
    pub const SET_SERVER_CONFIG: Self = Self::get("/index/api/setServerConfig");
    /// `restartServer`
    pub const RESTART_SERVER: Self = Self::get("/index/api/restartServer");
    /// `getMediaList`
    pub const GET_MEDIA_LIST: Self = Self::get("/index/api/getMediaList");
    /// `close_stream`
    pub const CLOSE_STREAM: Self = Self::get("/index/api/close_stream");
    /// `close_streams`
    pub const CLOSE_STREAMS: Self = Self::get("/index/api/close_streams");
    /// `addStreamProxy`
    pub const ADD_STREAM_PROXY: Self = Self::get("/index/api/addStreamProxy");
    /// `delStreamProxy`
    pub const DEL_STREAM_PROXY: Self = Self::get("/index/api/delStreamProxy");
    /// `listStreamProxy`
    pub const LIST_STREAM_PROXY: Self = Self::get("/index/api/listStreamProxy");
    /// `addStreamPusherProxy`
    pub const ADD_STREAM_PUSHER_PROXY: Self = Self::get("/index/api/addStreamPusherProxy");
    /// `listStreamPusherProxy`
    pub const LIST_STREAM_PUSHER_PROXY: Self = Self::get("/index/api/listStreamPusherProxy");
    /// `isRecording`
    pub const IS_RECORDING: Self = Self::get("/index/api/isRecording");
    /// `startRecord`
    pub const START_RECORD: Self = Self::get("/index/api/startRecord");
    /// `stopRecord`
    pub const STOP_RECORD: Self = Self::get("/index/api/stopRecord");
    /// `getMp4RecordFile`
    pub const GET_MP4_RECORD_FILE: Self = Self::get("/index/api/getMp4RecordFile");
    /// `deleteRecordDirectory`
    pub const DELETE_RECORD_DIRECTORY: Self = Self::get("/index/api/deleteRecordDirectory");
    /// `getSnap`
    pub const GET_SNAP: Self = Self::get("/index/api/getSnap");
    /// `openRtpServer`
    pub const OPEN_RTP_SERVER: Self = Self::get("/index/api/openRtpServer");
    /// `closeRtpServer`
    pub const CLOSE_RTP_SERVER: Self = Self::get("/index/api/closeRtpServer");
    /// `listRtpServer`
    pub const LIST_RTP_SERVER: Self = Self::get("/index/api/listRtpServer");
    /// `startSendRtp`
    pub const START_SEND_RTP: Self = Self::get("/index/api/startSendRtp");
    /// `stopSendRtp`
    pub const STOP_SEND_RTP: Self = Self::get("/index/api/stopSendRtp");
    /// `getRtpInfo`
    pub const GET_RTP_INFO: Self = Self::get("/index/api/getRtpInfo");
    /// `getAllSession`
    pub const GET_ALL_SESSION: Self = Self::get("/index/api/getAllSession");
    /// `kick_session`
    pub const KICK_SESSION: Self = Self::get("/index/api/kick_session");
    /// `kick_sessions`
    pub const KICK_SESSIONS: Self = Self::get("/index/api/kick_sessions");
    /// `getWebRTCApi`
    pub const GET_WEBRTC_API: Self = Self::get("/index/api/getWebRTCApi");
    /// `webrtc` offer/answer exchange, the only POST endpoint.
    pub const WEBRTC: Self = Self::post("/index/api/webrtc");

    /// Every endpoint in the catalog.
    pub const ALL: &'static [Self] = &[
        Self::GET_API_LIST,
        Self::GET_THREADS_LOAD,
        Self::GET_STATISTIC,
        Self::GET_WORK_THREADS_LOAD,
        Self::GET_SERVER_CONFIG,
        Self::SET_SERVER_CONFIG,
        Self::RESTART_SERVER,
        Self::GET_MEDIA_LIST,
        Self::CLOSE_STREAM,
        Self::CLOSE_STREAMS,
        Self::ADD_STREAM_PROXY,
        Self::DEL_STREAM_PROXY,
        Self::LIST_STREAM_PROXY,
        Self::ADD_STREAM_PUSHER_PROXY,
        Self::LIST_STREAM_PUSHER_PROXY,
        Self::IS_RECORDING,
        Self::START_RECORD,
        Self::STOP_RECORD,
        Self::GET_MP4_RECORD_FILE,
        Self::DELETE_RECORD_DIRECTORY,
        Self::GET_SNAP,
        Self::OPEN_RTP_SERVER,
        Self::CLOSE_RTP_SERVER,
        Self::LIST_RTP_SERVER,
        Self::START_SEND_RTP,
        Self::STOP_SEND_RTP,
        Self::GET_RTP_INFO,
        Self::GET_ALL_SESSION,
        Self::KICK_SESSION,
        Self::KICK_SESSIONS,
        Self::GET_WEBRTC_API,
        Self::WEBRTC,
    ];
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// A typed request bound to one endpoint.
///
/// `params` returns `None` for operations without fields; only the secret
/// is sent for those.
pub trait ApiRequest {
    /// The endpoint this request is sent to.
    const ENDPOINT: Endpoint;

    /// Maps the request onto wire parameter names.
    fn params(&self) -> Option<Params>;
}

/// Declares field-less request types bound to an endpoint.
macro_rules! empty_request {
    ($($(#[$meta:meta])* $name:ident => $endpoint:ident;)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
            pub struct $name;

            impl $crate::endpoint::ApiRequest for $name {
                const ENDPOINT: $crate::endpoint::Endpoint = $crate::endpoint::Endpoint::$endpoint;

                fn params(&self) -> Option<$crate::params::Params> {
                    None
                }
            }
        )*
    };
}

pub(crate) use empty_request;

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_catalog_has_unique_paths() {
        // Arrange & Act
        let paths: HashSet<&str> = Endpoint::ALL.iter().map(|e| e.path).collect();

        // Assert
        assert_eq!(paths.len(), Endpoint::ALL.len());
        assert_eq!(Endpoint::ALL.len(), 32);
    }

    #[test]
    fn test_only_webrtc_is_post() {
        // Arrange & Act
        let posts: Vec<&Endpoint> = Endpoint::ALL
            .iter()
            .filter(|e| e.method == Method::Post)
            .collect();

        // Assert
        assert_eq!(posts, vec![&Endpoint::WEBRTC]);
    }

    #[test]
    fn test_paths_share_api_prefix() {
        // Arrange & Act & Assert
        for endpoint in Endpoint::ALL {
            assert!(endpoint.path.starts_with("/index/api/"), "{endpoint}");
        }
    }

    #[test]
    fn test_display() {
        // Arrange & Act & Assert
        assert_eq!(
            Endpoint::GET_MEDIA_LIST.to_string(),
            "GET /index/api/getMediaList"
        );
    }
}
