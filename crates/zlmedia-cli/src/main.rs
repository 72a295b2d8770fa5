//! zlmctl - ZLMediaKit control-plane CLI.

/// Connection settings (TOML).
mod config;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{AppConfig, ConnectionOverrides, ConnectionSettings, resolve_config_path};
use zlmedia_api::api::{
    AddStreamProxyRequest, AddStreamPusherProxyRequest, CloseRtpServerRequest,
    CloseStreamRequest, CloseStreamsRequest, DEFAULT_VHOST, DelStreamProxyRequest,
    DeleteRecordDirectoryRequest, GetAllSessionRequest, GetApiListRequest, GetMediaListRequest,
    GetMp4RecordFileRequest, GetRtpInfoRequest, GetServerConfigRequest, GetSnapRequest,
    GetStatisticRequest, GetThreadsLoadRequest, GetWebRtcApiRequest, GetWorkThreadsLoadRequest,
    IsRecordingRequest, KickSessionRequest, KickSessionsRequest, ListRtpServerRequest,
    ListStreamProxyRequest, ListStreamPusherProxyRequest, LocalMediaApi, LocalProxyApi,
    LocalRecordApi, LocalRtpApi, LocalServerApi, LocalSessionApi, LocalWebRtcApi,
    OpenRtpServerRequest, RecordType, RestartServerRequest, SetServerConfigRequest,
    StartRecordRequest, StartSendRtpRequest, StopRecordRequest, StopSendRtpRequest,
    WebRtcRequest,
};
use zlmedia_api::{ApiRequest, Envelope, ZlmClient};

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Server base URL (overrides `ZLM_BASE_URL` and the config file).
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// API secret (overrides `ZLM_SECRET` and the config file).
    #[arg(long, global = true)]
    secret: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Connection values given as flags.
    fn overrides(&self) -> ConnectionOverrides {
        ConnectionOverrides {
            base_url: self.base_url.clone(),
            secret: self.secret.clone(),
            timeout_secs: self.timeout,
        }
    }
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Server status and configuration.
    Server(ServerCommand),
    /// Running streams.
    Media(MediaCommand),
    /// Pull and push proxies.
    Proxy(ProxyCommand),
    /// Recording and snapshots.
    Record(RecordCommand),
    /// GB28181 RTP ports and RTP forwarding.
    Rtp(RtpCommand),
    /// TCP sessions.
    Session(SessionCommand),
    /// WebRTC signalling.
    Webrtc(WebrtcCommand),
    /// Saved connection settings.
    Config(ConfigCommand),
}

/// Stream identity shared by stream-scoped subcommands.
#[derive(clap::Args)]
struct StreamArgs {
    /// Virtual host.
    #[arg(long, default_value = DEFAULT_VHOST)]
    vhost: String,

    /// Application name, e.g. `live`.
    #[arg(long)]
    app: String,

    /// Stream id.
    #[arg(long)]
    stream: String,
}

/// Optional stream filters.
#[derive(clap::Args)]
struct StreamFilterArgs {
    /// Protocol filter, e.g. `rtsp` or `rtmp`.
    #[arg(long)]
    schema: Option<String>,

    /// Virtual host filter.
    #[arg(long)]
    vhost: Option<String>,

    /// Application filter.
    #[arg(long)]
    app: Option<String>,

    /// Stream id filter.
    #[arg(long)]
    stream: Option<String>,
}

// ---------------------------------------------------------------------------
// server
// ---------------------------------------------------------------------------

/// Arguments for the `server` subcommand.
#[derive(clap::Args)]
struct ServerCommand {
    /// Server subcommand to run.
    #[command(subcommand)]
    command: ServerSubcommands,
}

/// Available server subcommands.
#[derive(Subcommand)]
enum ServerSubcommands {
    /// List supported API endpoints (`getApiList`).
    ApiList,
    /// Network thread load (`getThreadsLoad`).
    ThreadsLoad,
    /// Object counts (`getStatistic`).
    Statistic,
    /// Background thread load (`getWorkThreadsLoad`).
    WorkThreadsLoad,
    /// Dump the server configuration (`getServerConfig`).
    Config,
    /// Change configuration values (`setServerConfig`).
    SetConfig(SetConfigArgs),
    /// Restart the server (`restartServer`).
    Restart,
}

/// Arguments for the `server set-config` subcommand.
#[derive(clap::Args)]
struct SetConfigArgs {
    /// Settings as `section.key=value`, e.g. `api.apiDebug=0`.
    #[arg(required = true, value_parser = parse_key_value)]
    entries: Vec<(String, String)>,
}

// ---------------------------------------------------------------------------
// media
// ---------------------------------------------------------------------------

/// Arguments for the `media` subcommand.
#[derive(clap::Args)]
struct MediaCommand {
    /// Media subcommand to run.
    #[command(subcommand)]
    command: MediaSubcommands,
}

/// Available media subcommands.
#[derive(Subcommand)]
enum MediaSubcommands {
    /// List running streams (`getMediaList`).
    List(StreamFilterArgs),
    /// Close one stream (`close_stream`).
    Close(MediaCloseArgs),
    /// Close every matching stream (`close_streams`).
    CloseAll(MediaCloseAllArgs),
}

/// Arguments for the `media close` subcommand.
#[derive(clap::Args)]
struct MediaCloseArgs {
    /// Protocol, e.g. `rtmp`.
    #[arg(long)]
    schema: String,

    #[command(flatten)]
    stream: StreamArgs,

    /// Close even while players are attached.
    #[arg(long)]
    force: Option<bool>,
}

/// Arguments for the `media close-all` subcommand.
#[derive(clap::Args)]
struct MediaCloseAllArgs {
    #[command(flatten)]
    filter: StreamFilterArgs,

    /// Close even while players are attached.
    #[arg(long)]
    force: Option<bool>,
}

// ---------------------------------------------------------------------------
// proxy
// ---------------------------------------------------------------------------

/// Arguments for the `proxy` subcommand.
#[derive(clap::Args)]
struct ProxyCommand {
    /// Proxy subcommand to run.
    #[command(subcommand)]
    command: ProxySubcommands,
}

/// Available proxy subcommands.
#[derive(Subcommand)]
enum ProxySubcommands {
    /// Pull a remote stream (`addStreamProxy`).
    Add(ProxyAddArgs),
    /// Remove a pull proxy (`delStreamProxy`).
    Del(ProxyDelArgs),
    /// List pull proxies (`listStreamProxy`).
    List,
    /// Push a local stream out (`addStreamPusherProxy`).
    PushAdd(ProxyPushAddArgs),
    /// List push proxies (`listStreamPusherProxy`).
    PushList,
}

/// Arguments for the `proxy add` subcommand.
#[derive(clap::Args)]
struct ProxyAddArgs {
    #[command(flatten)]
    stream: StreamArgs,

    /// Source URL (rtsp/rtmp/hls/srt).
    #[arg(long)]
    url: String,

    /// RTSP pull mode: 0 tcp, 1 udp, 2 multicast.
    #[arg(long)]
    rtp_type: Option<i32>,

    /// Pull timeout in seconds.
    #[arg(long)]
    timeout_sec: Option<f64>,

    /// Retry count (<= 0 retries forever).
    #[arg(long, allow_negative_numbers = true)]
    retry_count: Option<i32>,

    /// Remux to HLS-TS.
    #[arg(long)]
    enable_hls: Option<bool>,

    /// Remux to HLS-fMP4.
    #[arg(long)]
    enable_hls_fmp4: Option<bool>,

    /// Record MP4.
    #[arg(long)]
    enable_mp4: Option<bool>,

    /// Remux to RTSP/WebRTC.
    #[arg(long)]
    enable_rtsp: Option<bool>,

    /// Remux to RTMP/FLV.
    #[arg(long)]
    enable_rtmp: Option<bool>,

    /// Remux to HTTP-TS/WS-TS.
    #[arg(long)]
    enable_ts: Option<bool>,

    /// Remux to HTTP-fMP4/WS-fMP4.
    #[arg(long)]
    enable_fmp4: Option<bool>,

    /// Keep audio.
    #[arg(long)]
    enable_audio: Option<bool>,

    /// Add a silent AAC track when the source has no audio.
    #[arg(long)]
    add_mute_audio: Option<bool>,

    /// MP4 recording root directory.
    #[arg(long)]
    mp4_save_path: Option<String>,

    /// MP4 segment length in seconds.
    #[arg(long)]
    mp4_max_second: Option<i32>,

    /// HLS root directory.
    #[arg(long)]
    hls_save_path: Option<String>,

    /// Timestamp rewrite mode.
    #[arg(long)]
    modify_stamp: Option<i32>,

    /// Close when nobody is watching.
    #[arg(long)]
    auto_close: Option<bool>,

    /// SRT latency in milliseconds.
    #[arg(long)]
    latency: Option<i32>,

    /// SRT passphrase.
    #[arg(long)]
    passphrase: Option<String>,
}

/// Arguments for the `proxy del` subcommand.
#[derive(clap::Args)]
struct ProxyDelArgs {
    /// Key returned by `proxy add`.
    #[arg(long)]
    key: String,
}

/// Arguments for the `proxy push-add` subcommand.
#[derive(clap::Args)]
struct ProxyPushAddArgs {
    /// Push protocol, `rtsp` or `rtmp`.
    #[arg(long)]
    schema: String,

    #[command(flatten)]
    stream: StreamArgs,

    /// Destination URL.
    #[arg(long)]
    dst_url: String,

    /// RTSP push mode: 0 tcp, 1 udp.
    #[arg(long)]
    rtp_type: Option<i32>,

    /// Push timeout in seconds.
    #[arg(long)]
    timeout_sec: Option<f64>,

    /// Retry count (<= 0 retries forever).
    #[arg(long, allow_negative_numbers = true)]
    retry_count: Option<i32>,
}

// ---------------------------------------------------------------------------
// record
// ---------------------------------------------------------------------------

/// Arguments for the `record` subcommand.
#[derive(clap::Args)]
struct RecordCommand {
    /// Record subcommand to run.
    #[command(subcommand)]
    command: RecordSubcommands,
}

/// Available record subcommands.
#[derive(Subcommand)]
enum RecordSubcommands {
    /// Whether a stream is being recorded (`isRecording`).
    Status(RecordArgs),
    /// Start recording (`startRecord`).
    Start(RecordStartArgs),
    /// Stop recording (`stopRecord`).
    Stop(RecordArgs),
    /// List recorded MP4 files or folders (`getMp4RecordFile`).
    Files(RecordPeriodArgs),
    /// Delete recorded files (`deleteRecordDirectory`).
    Delete(RecordPeriodArgs),
    /// Take a snapshot (`getSnap`).
    Snap(SnapArgs),
}

/// Recording format.
#[derive(Clone, Copy, ValueEnum)]
enum RecordKind {
    /// HLS.
    Hls,
    /// MP4.
    Mp4,
}

impl From<RecordKind> for RecordType {
    fn from(kind: RecordKind) -> Self {
        match kind {
            RecordKind::Hls => Self::Hls,
            RecordKind::Mp4 => Self::Mp4,
        }
    }
}

/// Arguments for `record status` and `record stop`.
#[derive(clap::Args)]
struct RecordArgs {
    /// Recording format.
    #[arg(long = "type", value_enum, default_value = "mp4")]
    kind: RecordKind,

    #[command(flatten)]
    stream: StreamArgs,
}

/// Arguments for the `record start` subcommand.
#[derive(clap::Args)]
struct RecordStartArgs {
    #[command(flatten)]
    record: RecordArgs,

    /// Recording root directory.
    #[arg(long)]
    customized_path: Option<String>,

    /// MP4 segment length in seconds.
    #[arg(long)]
    max_second: Option<i32>,
}

/// Arguments for `record files` and `record delete`.
#[derive(clap::Args)]
struct RecordPeriodArgs {
    #[command(flatten)]
    stream: StreamArgs,

    /// Recording date (`2020-02-01`) or prefix (`2020-02`).
    #[arg(long)]
    period: String,
}

/// Arguments for the `record snap` subcommand.
#[derive(clap::Args)]
struct SnapArgs {
    /// Source URL.
    #[arg(long)]
    url: String,

    /// Snapshot timeout in seconds.
    #[arg(long, default_value_t = 10)]
    timeout_sec: i32,

    /// Cache lifetime in seconds.
    #[arg(long, default_value_t = 30)]
    expire_sec: i32,

    /// Write the image to this file instead of logging the response.
    #[arg(long)]
    output: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// rtp
// ---------------------------------------------------------------------------

/// Arguments for the `rtp` subcommand.
#[derive(clap::Args)]
struct RtpCommand {
    /// RTP subcommand to run.
    #[command(subcommand)]
    command: RtpSubcommands,
}

/// Available RTP subcommands.
#[derive(Subcommand)]
enum RtpSubcommands {
    /// Open a receive port (`openRtpServer`).
    Open(RtpOpenArgs),
    /// Close a receive port (`closeRtpServer`).
    Close(RtpStreamIdArgs),
    /// List receive ports (`listRtpServer`).
    List,
    /// Forward a stream as RTP (`startSendRtp`).
    SendStart(RtpSendStartArgs),
    /// Stop forwarding (`stopSendRtp`).
    SendStop(RtpSendStopArgs),
    /// RTP receive state of a stream (`getRtpInfo`).
    Info(RtpStreamIdArgs),
}

/// Arguments for the `rtp open` subcommand.
#[derive(clap::Args)]
struct RtpOpenArgs {
    /// Receive port; 0 picks a random one.
    #[arg(long, default_value_t = 0)]
    port: u16,

    /// Stream id bound to the port.
    #[arg(long)]
    stream_id: String,

    /// TCP mode (1/0).
    #[arg(long)]
    enable_tcp: Option<i32>,

    /// Port reuse (1/0).
    #[arg(long)]
    re_use_port: Option<i32>,

    /// SSRC filter (1/0).
    #[arg(long)]
    ssrc_filter: Option<i32>,
}

/// Arguments for subcommands addressing one RTP stream id.
#[derive(clap::Args)]
struct RtpStreamIdArgs {
    /// Stream id.
    #[arg(long)]
    stream_id: String,
}

/// Arguments for the `rtp send-start` subcommand.
#[derive(clap::Args)]
struct RtpSendStartArgs {
    #[command(flatten)]
    stream: StreamArgs,

    /// SSRC of the outgoing RTP.
    #[arg(long)]
    ssrc: String,

    /// Destination host or IP.
    #[arg(long)]
    dst_url: String,

    /// Destination port.
    #[arg(long)]
    dst_port: u16,

    /// UDP (1) or TCP (0).
    #[arg(long)]
    is_udp: Option<i32>,

    /// Local port; 0 picks a random one.
    #[arg(long)]
    src_port: Option<i32>,

    /// RTP payload type.
    #[arg(long)]
    pt: Option<i32>,

    /// PS (1) or ES (0) payload.
    #[arg(long)]
    use_ps: Option<i32>,

    /// With ES payload, audio (1) or video (0).
    #[arg(long)]
    only_audio: Option<i32>,
}

/// Arguments for the `rtp send-stop` subcommand.
#[derive(clap::Args)]
struct RtpSendStopArgs {
    #[command(flatten)]
    stream: StreamArgs,

    /// SSRC given to `rtp send-start`.
    #[arg(long)]
    ssrc: String,
}

// ---------------------------------------------------------------------------
// session
// ---------------------------------------------------------------------------

/// Arguments for the `session` subcommand.
#[derive(clap::Args)]
struct SessionCommand {
    /// Session subcommand to run.
    #[command(subcommand)]
    command: SessionSubcommands,
}

/// Available session subcommands.
#[derive(Subcommand)]
enum SessionSubcommands {
    /// List TCP sessions (`getAllSession`).
    List(SessionFilterArgs),
    /// Disconnect one session (`kick_session`).
    Kick(SessionKickArgs),
    /// Disconnect every matching session (`kick_sessions`).
    KickAll(SessionFilterArgs),
}

/// Session filters.
#[derive(clap::Args)]
struct SessionFilterArgs {
    /// Local port filter, e.g. 554.
    #[arg(long)]
    local_port: Option<u16>,

    /// Peer IP filter.
    #[arg(long)]
    peer_ip: Option<String>,
}

/// Arguments for the `session kick` subcommand.
#[derive(clap::Args)]
struct SessionKickArgs {
    /// Session id from `session list`.
    #[arg(long)]
    id: String,
}

// ---------------------------------------------------------------------------
// webrtc
// ---------------------------------------------------------------------------

/// Arguments for the `webrtc` subcommand.
#[derive(clap::Args)]
struct WebrtcCommand {
    /// WebRTC subcommand to run.
    #[command(subcommand)]
    command: WebrtcSubcommands,
}

/// Available WebRTC subcommands.
#[derive(Subcommand)]
enum WebrtcSubcommands {
    /// Signalling information (`getWebRTCApi`).
    Api,
    /// Exchange an SDP offer for an answer (`webrtc`).
    Exchange(WebrtcExchangeArgs),
}

/// Arguments for the `webrtc exchange` subcommand.
#[derive(clap::Args)]
struct WebrtcExchangeArgs {
    /// `play` or `publish`.
    #[arg(long, default_value = "play")]
    api: String,

    /// SDP kind, `offer` or `answer`.
    #[arg(long = "type", default_value = "offer")]
    kind: String,

    /// File holding the local SDP.
    #[arg(long)]
    sdp_file: PathBuf,

    #[command(flatten)]
    stream: StreamArgs,

    /// Extra parameters as `key=value` (repeatable).
    #[arg(long = "param", value_parser = parse_key_value)]
    params: Vec<(String, String)>,
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

/// Arguments for the `config` subcommand.
#[derive(clap::Args)]
struct ConfigCommand {
    /// Config subcommand to run.
    #[command(subcommand)]
    command: ConfigSubcommands,
}

/// Available config subcommands.
#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Show the saved settings (secret masked).
    Show,
    /// Save the given --base-url, --secret, and --timeout.
    Set,
}

/// Parses a `key=value` argument.
fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (String::from(key), String::from(value)))
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))
}

/// Builds the client from flags, environment, and the config file, and
/// arms Ctrl-C to cancel the in-flight request.
///
/// # Errors
///
/// Returns an error if the config file cannot be read, no secret is
/// configured, or the client rejects the settings.
fn connect(config_path: &Path, overrides: &ConnectionOverrides) -> Result<ZlmClient> {
    let file = AppConfig::load(config_path)?;
    let settings =
        ConnectionSettings::resolve(overrides, &file.server, |name| std::env::var(name).ok())?;

    let mut builder = ZlmClient::builder()
        .base_url(settings.base_url)
        .secret(settings.secret)
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
    if let Some(timeout) = settings.timeout {
        builder = builder.timeout(timeout);
    }
    let client = builder.build().context("failed to build ZLMediaKit client")?;

    Ok(client.with_cancellation(cancel_on_ctrl_c()))
}

/// Returns a token cancelled on the first Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling request");
            trigger.cancel();
        }
    });
    token
}

/// Logs a response envelope as pretty JSON.
///
/// # Errors
///
/// Returns an error if the envelope cannot be serialized.
fn log_envelope(envelope: &Envelope) -> Result<()> {
    let pretty = serde_json::to_string_pretty(envelope).context("failed to format response")?;
    tracing::info!("{pretty}");
    Ok(())
}

/// Logs the outcome of one API call.
///
/// A logical failure still logs the envelope before failing.
///
/// # Errors
///
/// Returns the call's error with `operation` as context.
fn report(operation: &str, result: zlmedia_api::Result<Envelope>) -> Result<()> {
    match result {
        Ok(envelope) => log_envelope(&envelope),
        Err(err) => {
            if let Some(envelope) = err.envelope() {
                log_envelope(envelope)?;
            }
            Err(err).with_context(|| format!("{operation} failed"))
        }
    }
}

/// Runs a `server` subcommand.
///
/// # Errors
///
/// Returns an error if the API request fails.
#[instrument(skip_all)]
async fn run_server(client: &ZlmClient, command: ServerSubcommands) -> Result<()> {
    match command {
        ServerSubcommands::ApiList => {
            report("getApiList", client.get_api_list(&GetApiListRequest).await)
        }
        ServerSubcommands::ThreadsLoad => report(
            "getThreadsLoad",
            client.get_threads_load(&GetThreadsLoadRequest).await,
        ),
        ServerSubcommands::Statistic => {
            report("getStatistic", client.get_statistic(&GetStatisticRequest).await)
        }
        ServerSubcommands::WorkThreadsLoad => report(
            "getWorkThreadsLoad",
            client
                .get_work_threads_load(&GetWorkThreadsLoadRequest)
                .await,
        ),
        ServerSubcommands::Config => report(
            "getServerConfig",
            client.get_server_config(&GetServerConfigRequest).await,
        ),
        ServerSubcommands::SetConfig(args) => {
            let req: SetServerConfigRequest = args.entries.into_iter().collect();
            report("setServerConfig", client.set_server_config(&req).await)
        }
        ServerSubcommands::Restart => {
            report("restartServer", client.restart_server(&RestartServerRequest).await)
        }
    }
}

/// Runs a `media` subcommand.
///
/// # Errors
///
/// Returns an error if the API request fails.
#[instrument(skip_all)]
async fn run_media(client: &ZlmClient, command: MediaSubcommands) -> Result<()> {
    match command {
        MediaSubcommands::List(filter) => {
            let req = GetMediaListRequest {
                schema: filter.schema,
                vhost: filter.vhost,
                app: filter.app,
                stream: filter.stream,
            };
            report("getMediaList", client.get_media_list(&req).await)
        }
        MediaSubcommands::Close(args) => {
            let StreamArgs { vhost, app, stream } = args.stream;
            let req = CloseStreamRequest {
                force: args.force,
                ..CloseStreamRequest::new(args.schema, vhost, app, stream)
            };
            report("close_stream", client.close_stream(&req).await)
        }
        MediaSubcommands::CloseAll(args) => {
            let req = CloseStreamsRequest {
                schema: args.filter.schema,
                vhost: args.filter.vhost,
                app: args.filter.app,
                stream: args.filter.stream,
                force: args.force,
            };
            report("close_streams", client.close_streams(&req).await)
        }
    }
}

/// Runs a `proxy` subcommand.
///
/// # Errors
///
/// Returns an error if the API request fails.
#[instrument(skip_all)]
async fn run_proxy(client: &ZlmClient, command: ProxySubcommands) -> Result<()> {
    match command {
        ProxySubcommands::Add(args) => {
            let StreamArgs { vhost, app, stream } = args.stream;
            let req = AddStreamProxyRequest {
                rtp_type: args.rtp_type,
                timeout_sec: args.timeout_sec,
                retry_count: args.retry_count,
                enable_hls: args.enable_hls,
                enable_hls_fmp4: args.enable_hls_fmp4,
                enable_mp4: args.enable_mp4,
                enable_rtsp: args.enable_rtsp,
                enable_rtmp: args.enable_rtmp,
                enable_ts: args.enable_ts,
                enable_fmp4: args.enable_fmp4,
                enable_audio: args.enable_audio,
                add_mute_audio: args.add_mute_audio,
                mp4_save_path: args.mp4_save_path,
                mp4_max_second: args.mp4_max_second,
                hls_save_path: args.hls_save_path,
                modify_stamp: args.modify_stamp,
                auto_close: args.auto_close,
                latency: args.latency,
                passphrase: args.passphrase,
                ..AddStreamProxyRequest::new(vhost, app, stream, args.url)
            };
            report("addStreamProxy", client.add_stream_proxy(&req).await)
        }
        ProxySubcommands::Del(args) => report(
            "delStreamProxy",
            client
                .del_stream_proxy(&DelStreamProxyRequest::new(args.key))
                .await,
        ),
        ProxySubcommands::List => report(
            "listStreamProxy",
            client.list_stream_proxy(&ListStreamProxyRequest).await,
        ),
        ProxySubcommands::PushAdd(args) => {
            let StreamArgs { vhost, app, stream } = args.stream;
            let req = AddStreamPusherProxyRequest {
                rtp_type: args.rtp_type,
                timeout_sec: args.timeout_sec,
                retry_count: args.retry_count,
                ..AddStreamPusherProxyRequest::new(args.schema, vhost, app, stream, args.dst_url)
            };
            report(
                "addStreamPusherProxy",
                client.add_stream_pusher_proxy(&req).await,
            )
        }
        ProxySubcommands::PushList => report(
            "listStreamPusherProxy",
            client
                .list_stream_pusher_proxy(&ListStreamPusherProxyRequest)
                .await,
        ),
    }
}

/// Runs a `record` subcommand.
///
/// # Errors
///
/// Returns an error if the API request fails or the snapshot cannot be
/// written.
#[instrument(skip_all)]
async fn run_record(client: &ZlmClient, command: RecordSubcommands) -> Result<()> {
    match command {
        RecordSubcommands::Status(args) => {
            let StreamArgs { vhost, app, stream } = args.stream;
            let req = IsRecordingRequest::new(args.kind.into(), vhost, app, stream);
            report("isRecording", client.is_recording(&req).await)
        }
        RecordSubcommands::Start(args) => {
            let StreamArgs { vhost, app, stream } = args.record.stream;
            let req = StartRecordRequest {
                customized_path: args.customized_path,
                max_second: args.max_second,
                ..StartRecordRequest::new(args.record.kind.into(), vhost, app, stream)
            };
            report("startRecord", client.start_record(&req).await)
        }
        RecordSubcommands::Stop(args) => {
            let StreamArgs { vhost, app, stream } = args.stream;
            let req = StopRecordRequest::new(args.kind.into(), vhost, app, stream);
            report("stopRecord", client.stop_record(&req).await)
        }
        RecordSubcommands::Files(args) => {
            let StreamArgs { vhost, app, stream } = args.stream;
            let req = GetMp4RecordFileRequest::new(vhost, app, stream, args.period);
            report("getMp4RecordFile", client.get_mp4_record_file(&req).await)
        }
        RecordSubcommands::Delete(args) => {
            let StreamArgs { vhost, app, stream } = args.stream;
            let req = DeleteRecordDirectoryRequest::new(vhost, app, stream, args.period);
            report(
                "deleteRecordDirectory",
                client.delete_record_directory(&req).await,
            )
        }
        RecordSubcommands::Snap(args) => run_record_snap(client, args).await,
    }
}

/// Runs the `record snap` subcommand.
///
/// With `--output`, the raw response body (a JPEG) is written to disk.
///
/// # Errors
///
/// Returns an error if the API request fails or the file cannot be written.
async fn run_record_snap(client: &ZlmClient, args: SnapArgs) -> Result<()> {
    let req = GetSnapRequest::new(args.url, args.timeout_sec, args.expire_sec);
    let Some(output) = args.output else {
        return report("getSnap", client.get_snap(&req).await);
    };

    let endpoint = GetSnapRequest::ENDPOINT;
    let body = client
        .call(endpoint.method, endpoint.path, req.params().as_ref())
        .await
        .context("getSnap failed")?;
    if body.first() == Some(&b'{') {
        report("getSnap", Envelope::decode(&body))?;
        bail!("getSnap returned JSON instead of an image");
    }
    std::fs::write(&output, &body)
        .with_context(|| format!("failed to write {}", output.display()))?;
    tracing::info!("Saved snapshot ({} bytes) to {}", body.len(), output.display());
    Ok(())
}

/// Runs an `rtp` subcommand.
///
/// # Errors
///
/// Returns an error if the API request fails.
#[instrument(skip_all)]
async fn run_rtp(client: &ZlmClient, command: RtpSubcommands) -> Result<()> {
    match command {
        RtpSubcommands::Open(args) => {
            let req = OpenRtpServerRequest {
                enable_tcp: args.enable_tcp,
                re_use_port: args.re_use_port,
                ssrc_filter: args.ssrc_filter,
                ..OpenRtpServerRequest::new(args.port, args.stream_id)
            };
            report("openRtpServer", client.open_rtp_server(&req).await)
        }
        RtpSubcommands::Close(args) => report(
            "closeRtpServer",
            client
                .close_rtp_server(&CloseRtpServerRequest::new(args.stream_id))
                .await,
        ),
        RtpSubcommands::List => report(
            "listRtpServer",
            client.list_rtp_server(&ListRtpServerRequest).await,
        ),
        RtpSubcommands::SendStart(args) => {
            let StreamArgs { vhost, app, stream } = args.stream;
            let req = StartSendRtpRequest {
                is_udp: args.is_udp,
                src_port: args.src_port,
                pt: args.pt,
                use_ps: args.use_ps,
                only_audio: args.only_audio,
                ..StartSendRtpRequest::new(vhost, app, stream, args.ssrc, args.dst_url, args.dst_port)
            };
            report("startSendRtp", client.start_send_rtp(&req).await)
        }
        RtpSubcommands::SendStop(args) => {
            let StreamArgs { vhost, app, stream } = args.stream;
            let req = StopSendRtpRequest::new(vhost, app, stream, args.ssrc);
            report("stopSendRtp", client.stop_send_rtp(&req).await)
        }
        RtpSubcommands::Info(args) => report(
            "getRtpInfo",
            client
                .get_rtp_info(&GetRtpInfoRequest::new(args.stream_id))
                .await,
        ),
    }
}

/// Runs a `session` subcommand.
///
/// # Errors
///
/// Returns an error if the API request fails.
#[instrument(skip_all)]
async fn run_session(client: &ZlmClient, command: SessionSubcommands) -> Result<()> {
    match command {
        SessionSubcommands::List(filter) => {
            let req = GetAllSessionRequest {
                local_port: filter.local_port,
                peer_ip: filter.peer_ip,
            };
            report("getAllSession", client.get_all_session(&req).await)
        }
        SessionSubcommands::Kick(args) => report(
            "kick_session",
            client.kick_session(&KickSessionRequest::new(args.id)).await,
        ),
        SessionSubcommands::KickAll(filter) => {
            let req = KickSessionsRequest {
                local_port: filter.local_port,
                peer_ip: filter.peer_ip,
            };
            report("kick_sessions", client.kick_sessions(&req).await)
        }
    }
}

/// Runs a `webrtc` subcommand.
///
/// # Errors
///
/// Returns an error if the SDP file cannot be read or the API request fails.
#[instrument(skip_all)]
async fn run_webrtc(client: &ZlmClient, command: WebrtcSubcommands) -> Result<()> {
    match command {
        WebrtcSubcommands::Api => report(
            "getWebRTCApi",
            client.get_webrtc_api(&GetWebRtcApiRequest).await,
        ),
        WebrtcSubcommands::Exchange(args) => {
            let sdp = std::fs::read_to_string(&args.sdp_file)
                .with_context(|| format!("failed to read {}", args.sdp_file.display()))?;
            let StreamArgs { vhost, app, stream } = args.stream;
            let mut req = WebRtcRequest::new(args.api, args.kind, sdp, vhost, app, stream);
            req.extra.extend(args.params);
            report("webrtc", client.webrtc(&req).await)
        }
    }
}

/// Runs a `config` subcommand.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or written, or
/// `config set` is given nothing to save.
fn run_config(
    command: &ConfigSubcommands,
    config_path: &Path,
    overrides: &ConnectionOverrides,
) -> Result<()> {
    let mut config = AppConfig::load(config_path)?;
    match command {
        ConfigSubcommands::Show => {
            let content = toml::to_string_pretty(&config.redacted())
                .context("failed to serialize config to TOML")?;
            tracing::info!("{}:\n{content}", config_path.display());
        }
        ConfigSubcommands::Set => {
            if !config.apply(overrides) {
                bail!("nothing to set; pass --base-url, --secret, or --timeout");
            }
            config.save(config_path)?;
            tracing::info!("Saved settings to {}", config_path.display());
        }
    }
    Ok(())
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let cli = Cli::parse();
    let overrides = cli.overrides();
    let config_path =
        resolve_config_path(cli.dir.as_deref(), |name| std::env::var(name).ok())?;
    match cli.command {
        Commands::Config(cmd) => run_config(&cmd.command, &config_path, &overrides),
        Commands::Server(cmd) => run_server(&connect(&config_path, &overrides)?, cmd.command).await,
        Commands::Media(cmd) => run_media(&connect(&config_path, &overrides)?, cmd.command).await,
        Commands::Proxy(cmd) => run_proxy(&connect(&config_path, &overrides)?, cmd.command).await,
        Commands::Record(cmd) => {
            run_record(&connect(&config_path, &overrides)?, cmd.command).await
        }
        Commands::Rtp(cmd) => run_rtp(&connect(&config_path, &overrides)?, cmd.command).await,
        Commands::Session(cmd) => {
            run_session(&connect(&config_path, &overrides)?, cmd.command).await
        }
        Commands::Webrtc(cmd) => {
            run_webrtc(&connect(&config_path, &overrides)?, cmd.command).await
        }
    }
}
