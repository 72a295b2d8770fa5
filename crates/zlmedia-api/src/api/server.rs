//! Server inspection, configuration, and restart.
#![allow(clippy::future_not_send)]

use std::collections::BTreeMap;

use tracing::instrument;

use crate::client::ZlmClient;
use crate::endpoint::{ApiRequest, Endpoint, empty_request};
use crate::envelope::Envelope;
use crate::error::Result;
use crate::params::Params;

empty_request! {
    /// Request for `getApiList`.
    GetApiListRequest => GET_API_LIST;
    /// Request for `getThreadsLoad`.
    GetThreadsLoadRequest => GET_THREADS_LOAD;
    /// Request for `getStatistic`.
    GetStatisticRequest => GET_STATISTIC;
    /// Request for `getWorkThreadsLoad`.
    GetWorkThreadsLoadRequest => GET_WORK_THREADS_LOAD;
    /// Request for `getServerConfig`.
    GetServerConfigRequest => GET_SERVER_CONFIG;
    /// Request for `restartServer`.
    RestartServerRequest => RESTART_SERVER;
}

/// Request for `setServerConfig`.
///
/// Keys use the server's `section.key` form (e.g. `api.apiDebug`) and are
/// sent verbatim as parameter names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetServerConfigRequest {
    /// Settings to change.
    pub config: BTreeMap<String, String>,
}

impl SetServerConfigRequest {
    /// Creates an empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one setting.
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SetServerConfigRequest {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            config: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl ApiRequest for SetServerConfigRequest {
    const ENDPOINT: Endpoint = Endpoint::SET_SERVER_CONFIG;

    fn params(&self) -> Option<Params> {
        Some(Params::builder().extend(&self.config).build())
    }
}

/// Server API.
///
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(ServerApi: Send)]
pub trait LocalServerApi {
    /// Lists the API endpoints the server supports (`getApiList`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server reports a
    /// non-zero code.
    async fn get_api_list(&self, req: &GetApiListRequest) -> Result<Envelope>;

    /// Returns network thread load (`getThreadsLoad`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server reports a
    /// non-zero code.
    async fn get_threads_load(&self, req: &GetThreadsLoadRequest) -> Result<Envelope>;

    /// Returns object counts (`getStatistic`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server reports a
    /// non-zero code.
    async fn get_statistic(&self, req: &GetStatisticRequest) -> Result<Envelope>;

    /// Returns background thread load (`getWorkThreadsLoad`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server reports a
    /// non-zero code.
    async fn get_work_threads_load(&self, req: &GetWorkThreadsLoadRequest) -> Result<Envelope>;

    /// Returns the full configuration (`getServerConfig`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server reports a
    /// non-zero code.
    async fn get_server_config(&self, req: &GetServerConfigRequest) -> Result<Envelope>;

    /// Changes configuration values at runtime (`setServerConfig`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server reports a
    /// non-zero code.
    async fn set_server_config(&self, req: &SetServerConfigRequest) -> Result<Envelope>;

    /// Restarts the server, dropping every stream (`restartServer`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server reports a
    /// non-zero code.
    async fn restart_server(&self, req: &RestartServerRequest) -> Result<Envelope>;
}

impl LocalServerApi for ZlmClient {
    #[instrument(skip_all)]
    async fn get_api_list(&self, req: &GetApiListRequest) -> Result<Envelope> {
        self.execute(req).await
    }

    #[instrument(skip_all)]
    async fn get_threads_load(&self, req: &GetThreadsLoadRequest) -> Result<Envelope> {
        self.execute(req).await
    }

    #[instrument(skip_all)]
    async fn get_statistic(&self, req: &GetStatisticRequest) -> Result<Envelope> {
        self.execute(req).await
    }

    #[instrument(skip_all)]
    async fn get_work_threads_load(&self, req: &GetWorkThreadsLoadRequest) -> Result<Envelope> {
        self.execute(req).await
    }

    #[instrument(skip_all)]
    async fn get_server_config(&self, req: &GetServerConfigRequest) -> Result<Envelope> {
        self.execute(req).await
    }

    #[instrument(skip_all)]
    async fn set_server_config(&self, req: &SetServerConfigRequest) -> Result<Envelope> {
        self.execute(req).await
    }

    #[instrument(skip_all)]
    async fn restart_server(&self, req: &RestartServerRequest) -> Result<Envelope> {
        self.execute(req).await
    }
}
