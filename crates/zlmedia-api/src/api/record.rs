//! Recording control, recorded file listing, and snapshots.
#![allow(clippy::future_not_send)]

use tracing::instrument;

use crate::client::ZlmClient;
use crate::endpoint::{ApiRequest, Endpoint};
use crate::envelope::Envelope;
use crate::error::Result;
use crate::params::{Params, ParamsBuilder};

/// Recording format, sent as the integer `type` parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RecordType {
    /// HLS recording (`0`).
    Hls,
    /// MP4 recording (`1`).
    #[default]
    Mp4,
}

impl RecordType {
    /// Wire value of the recording format.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::Hls => 0,
            Self::Mp4 => 1,
        }
    }
}

impl From<RecordType> for i32 {
    fn from(value: RecordType) -> Self {
        value.as_i32()
    }
}

/// Identity shared by every stream-scoped recording request.
fn stream_params(kind: RecordType, vhost: &str, app: &str, stream: &str) -> ParamsBuilder {
    Params::builder()
        .required("type", kind.as_i32())
        .required("vhost", vhost)
        .required("app", app)
        .required("stream", stream)
}

/// Request for `isRecording`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsRecordingRequest {
    /// Recording format.
    pub kind: RecordType,
    /// Virtual host.
    pub vhost: String,
    /// Application name.
    pub app: String,
    /// Stream id.
    pub stream: String,
}

impl IsRecordingRequest {
    /// Creates a request for one stream.
    pub fn new(
        kind: RecordType,
        vhost: impl Into<String>,
        app: impl Into<String>,
        stream: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            vhost: vhost.into(),
            app: app.into(),
            stream: stream.into(),
        }
    }
}

impl ApiRequest for IsRecordingRequest {
    const ENDPOINT: Endpoint = Endpoint::IS_RECORDING;

    fn params(&self) -> Option<Params> {
        Some(stream_params(self.kind, &self.vhost, &self.app, &self.stream).build())
    }
}

/// Request for `startRecord`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRecordRequest {
    /// Recording format.
    pub kind: RecordType,
    /// Virtual host.
    pub vhost: String,
    /// Application name.
    pub app: String,
    /// Stream id.
    pub stream: String,
    /// Recording root directory; the server default when unset.
    pub customized_path: Option<String>,
    /// MP4 segment length in seconds; the server default when unset.
    pub max_second: Option<i32>,
}

impl StartRecordRequest {
    /// Creates a request for one stream.
    pub fn new(
        kind: RecordType,
        vhost: impl Into<String>,
        app: impl Into<String>,
        stream: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            vhost: vhost.into(),
            app: app.into(),
            stream: stream.into(),
            customized_path: None,
            max_second: None,
        }
    }

    /// Sets the recording root directory.
    #[must_use]
    pub fn customized_path(mut self, path: impl Into<String>) -> Self {
        self.customized_path = Some(path.into());
        self
    }

    /// Sets the MP4 segment length.
    #[must_use]
    pub const fn max_second(mut self, secs: i32) -> Self {
        self.max_second = Some(secs);
        self
    }
}

impl ApiRequest for StartRecordRequest {
    const ENDPOINT: Endpoint = Endpoint::START_RECORD;

    fn params(&self) -> Option<Params> {
        Some(
            stream_params(self.kind, &self.vhost, &self.app, &self.stream)
                .optional("customized_path", self.customized_path.as_deref())
                .optional("max_second", self.max_second)
                .build(),
        )
    }
}

/// Request for `stopRecord`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopRecordRequest {
    /// Recording format.
    pub kind: RecordType,
    /// Virtual host.
    pub vhost: String,
    /// Application name.
    pub app: String,
    /// Stream id.
    pub stream: String,
}

impl StopRecordRequest {
    /// Creates a request for one stream.
    pub fn new(
        kind: RecordType,
        vhost: impl Into<String>,
        app: impl Into<String>,
        stream: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            vhost: vhost.into(),
            app: app.into(),
            stream: stream.into(),
        }
    }
}

impl ApiRequest for StopRecordRequest {
    const ENDPOINT: Endpoint = Endpoint::STOP_RECORD;

    fn params(&self) -> Option<Params> {
        Some(stream_params(self.kind, &self.vhost, &self.app, &self.stream).build())
    }
}

/// Request for `getMp4RecordFile`.
///
/// `period` is a date such as `2020-02-01`. A partial date lists the
/// recording folders instead of the files of one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetMp4RecordFileRequest {
    /// Virtual host.
    pub vhost: String,
    /// Application name.
    pub app: String,
    /// Stream id.
    pub stream: String,
    /// Recording date or date prefix.
    pub period: String,
}

impl GetMp4RecordFileRequest {
    /// Creates a request for one stream and period.
    pub fn new(
        vhost: impl Into<String>,
        app: impl Into<String>,
        stream: impl Into<String>,
        period: impl Into<String>,
    ) -> Self {
        Self {
            vhost: vhost.into(),
            app: app.into(),
            stream: stream.into(),
            period: period.into(),
        }
    }
}

impl ApiRequest for GetMp4RecordFileRequest {
    const ENDPOINT: Endpoint = Endpoint::GET_MP4_RECORD_FILE;

    fn params(&self) -> Option<Params> {
        Some(
            Params::builder()
                .required("vhost", &self.vhost)
                .required("app", &self.app)
                .required("stream", &self.stream)
                .required("period", &self.period)
                .build(),
        )
    }
}

/// Request for `deleteRecordDirectory`.
///
/// A full date deletes that day's files; a partial one deletes the folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRecordDirectoryRequest {
    /// Virtual host.
    pub vhost: String,
    /// Application name.
    pub app: String,
    /// Stream id.
    pub stream: String,
    /// Recording date or date prefix.
    pub period: String,
}

impl DeleteRecordDirectoryRequest {
    /// Creates a request for one stream and period.
    pub fn new(
        vhost: impl Into<String>,
        app: impl Into<String>,
        stream: impl Into<String>,
        period: impl Into<String>,
    ) -> Self {
        Self {
            vhost: vhost.into(),
            app: app.into(),
            stream: stream.into(),
            period: period.into(),
        }
    }
}

impl ApiRequest for DeleteRecordDirectoryRequest {
    const ENDPOINT: Endpoint = Endpoint::DELETE_RECORD_DIRECTORY;

    fn params(&self) -> Option<Params> {
        Some(
            Params::builder()
                .required("vhost", &self.vhost)
                .required("app", &self.app)
                .required("stream", &self.stream)
                .required("period", &self.period)
                .build(),
        )
    }
}

/// Request for `getSnap`. The server answers with a JPEG on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetSnapRequest {
    /// Source URL to grab a frame from.
    pub url: String,
    /// Snapshot timeout in seconds.
    pub timeout_sec: i32,
    /// Cache lifetime of the snapshot in seconds.
    pub expire_sec: i32,
}

impl GetSnapRequest {
    /// Creates a request.
    pub fn new(url: impl Into<String>, timeout_sec: i32, expire_sec: i32) -> Self {
        Self {
            url: url.into(),
            timeout_sec,
            expire_sec,
        }
    }
}

impl ApiRequest for GetSnapRequest {
    const ENDPOINT: Endpoint = Endpoint::GET_SNAP;

    fn params(&self) -> Option<Params> {
        Some(
            Params::builder()
                .required("url", &self.url)
                .required("timeout_sec", self.timeout_sec)
                .required("expire_sec", self.expire_sec)
                .build(),
        )
    }
}

/// Recording API.
///
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(RecordApi: Send)]
pub trait LocalRecordApi {
    /// Reports whether a stream is being recorded (`isRecording`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server reports a
    /// non-zero code.
    async fn is_recording(&self, req: &IsRecordingRequest) -> Result<Envelope>;

    /// Starts recording (`startRecord`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server reports a
    /// non-zero code.
    async fn start_record(&self, req: &StartRecordRequest) -> Result<Envelope>;

    /// Stops recording (`stopRecord`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server reports a
    /// non-zero code.
    async fn stop_record(&self, req: &StopRecordRequest) -> Result<Envelope>;

    /// Lists recorded MP4 files or folders (`getMp4RecordFile`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server reports a
    /// non-zero code.
    async fn get_mp4_record_file(&self, req: &GetMp4RecordFileRequest) -> Result<Envelope>;

    /// Deletes recorded files (`deleteRecordDirectory`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server reports a
    /// non-zero code.
    async fn delete_record_directory(&self, req: &DeleteRecordDirectoryRequest)
    -> Result<Envelope>;

    /// Takes a snapshot (`getSnap`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails, or [`Error::Decode`] when
    /// the server answers with image bytes instead of an envelope.
    ///
    /// [`Error::Decode`]: crate::Error::Decode
    async fn get_snap(&self, req: &GetSnapRequest) -> Result<Envelope>;
}

impl LocalRecordApi for ZlmClient {
    #[instrument(skip_all)]
    async fn is_recording(&self, req: &IsRecordingRequest) -> Result<Envelope> {
        self.execute(req).await
    }

    #[instrument(skip_all)]
    async fn start_record(&self, req: &StartRecordRequest) -> Result<Envelope> {
        self.execute(req).await
    }

    #[instrument(skip_all)]
    async fn stop_record(&self, req: &StopRecordRequest) -> Result<Envelope> {
        self.execute(req).await
    }

    #[instrument(skip_all)]
    async fn get_mp4_record_file(&self, req: &GetMp4RecordFileRequest) -> Result<Envelope> {
        self.execute(req).await
    }

    #[instrument(skip_all)]
    async fn delete_record_directory(
        &self,
        req: &DeleteRecordDirectoryRequest,
    ) -> Result<Envelope> {
        self.execute(req).await
    }

    #[instrument(skip_all)]
    async fn get_snap(&self, req: &GetSnapRequest) -> Result<Envelope> {
        self.execute(req).await
    }
}
