//! Typed client library for the ZLMediaKit REST control-plane API.
//!
//! [`ZlmClient`] handles transport: it injects the shared secret, encodes
//! parameters, enforces the timeout, and decodes the uniform
//! `{code, msg, data}` [`Envelope`]. The [`api`] module maps every remote
//! operation onto a typed request and an async group trait.
//!
//! ```no_run
//! use zlmedia_api::ZlmClient;
//! use zlmedia_api::api::{GetMediaListRequest, LocalMediaApi};
//!
//! # async fn run() -> zlmedia_api::Result<()> {
//! let client = ZlmClient::builder()
//!     .base_url("http://127.0.0.1:80")
//!     .secret("your-secret")
//!     .build()?;
//! let envelope = client
//!     .get_media_list(&GetMediaListRequest::new().app("live"))
//!     .await?;
//! println!("{:?}", envelope.data);
//! # Ok(())
//! # }
//! ```

/// Endpoint catalog grouped by server feature.
pub mod api;

/// HTTP transport.
pub mod client;

/// Endpoint descriptors and the request trait.
pub mod endpoint;

/// Response envelope.
pub mod envelope;

/// Error types.
pub mod error;

/// Process-wide client handle.
pub mod global;

/// Request parameters.
pub mod params;

pub use client::{DEFAULT_TIMEOUT, ZlmClient, ZlmClientBuilder};
pub use endpoint::{ApiRequest, Endpoint, Method};
pub use envelope::Envelope;
pub use error::{Error, Result};
pub use params::{ParamValue, Params, ParamsBuilder};
pub use tokio_util::sync::CancellationToken;
