//! Optional process-wide client handle.
//!
//! Explicit [`ZlmClient`] values are the primary API; this module exists for
//! programs that want one shared target without threading a handle through.

use std::sync::OnceLock;

use crate::client::ZlmClient;
use crate::error::{Error, Result};

static CLIENT: OnceLock<ZlmClient> = OnceLock::new();

/// Installs the process-wide client.
///
/// The first call wins. Later calls leave the stored client unchanged, log a
/// warning, and return the existing handle.
pub fn init(client: ZlmClient) -> &'static ZlmClient {
    install(&CLIENT, client)
}

/// Returns the process-wide client.
///
/// # Errors
///
/// Returns [`Error::NotConfigured`] if [`init`] has not been called.
pub fn client() -> Result<&'static ZlmClient> {
    CLIENT.get().ok_or(Error::NotConfigured)
}

/// Returns `true` once [`init`] has been called.
#[must_use]
pub fn is_initialized() -> bool {
    CLIENT.get().is_some()
}

fn install(cell: &OnceLock<ZlmClient>, client: ZlmClient) -> &ZlmClient {
    let mut installed = false;
    let stored = cell.get_or_init(|| {
        installed = true;
        client.clone()
    });
    if !installed {
        tracing::warn!(
            current = %stored.base_url(),
            ignored = %client.base_url(),
            "ZLMediaKit client already initialized; ignoring new configuration"
        );
    }
    stored
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use tracing::subscriber::with_default;
    use tracing_mock::{expect, subscriber};

    use super::*;

    fn client_for(base_url: &str) -> ZlmClient {
        ZlmClient::builder()
            .base_url(base_url)
            .secret("s3cret")
            .build()
            .unwrap()
    }

    #[test]
    fn test_first_install_wins() {
        // Arrange
        let cell = OnceLock::new();

        // Act
        let first = install(&cell, client_for("http://10.0.0.1")).base_url().to_owned();
        let second = install(&cell, client_for("http://10.0.0.2")).base_url().to_owned();

        // Assert
        assert_eq!(first, "http://10.0.0.1");
        assert_eq!(second, "http://10.0.0.1");
        assert_eq!(cell.get().unwrap().base_url(), "http://10.0.0.1");
    }

    #[test]
    fn test_second_install_warns() {
        // Arrange
        let cell = OnceLock::new();
        install(&cell, client_for("http://10.0.0.1"));
        let late = client_for("http://10.0.0.2");
        let (subscriber, handle) = subscriber::mock()
            .event(expect::event().at_level(tracing::Level::WARN))
            .only()
            .run_with_handle();

        // Act
        with_default(subscriber, || {
            install(&cell, late);
        });

        // Assert
        handle.assert_finished();
    }

    #[test]
    fn test_first_install_is_silent() {
        // Arrange
        let cell = OnceLock::new();
        let first = client_for("http://10.0.0.1");
        let (subscriber, handle) = subscriber::mock().only().run_with_handle();

        // Act
        with_default(subscriber, || {
            install(&cell, first);
        });

        // Assert
        handle.assert_finished();
    }

    #[test]
    fn test_concurrent_installs_store_one_client() {
        // Arrange
        let cell: OnceLock<ZlmClient> = OnceLock::new();

        // Act
        let urls: Vec<String> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|i| {
                    let cell = &cell;
                    scope.spawn(move || {
                        install(cell, client_for(&format!("http://10.0.0.{i}")))
                            .base_url()
                            .to_owned()
                    })
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        // Assert
        let stored = cell.get().unwrap().base_url();
        assert!(urls.iter().all(|url| url == stored));
    }
}
