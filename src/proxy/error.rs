//! Error types for proxy pool configuration and validation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating the proxy pool.
///
/// All of these are configuration failures: they surface at pool
/// initialization (which happens lazily on first use) and are never
/// retried by the resilient request layer.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// A non-empty proxy source was configured but no entry survived the
    /// validation probe. Proceeding without a proxy would silently expose
    /// direct egress, so this is fatal.
    #[error("no working proxy among {configured} configured entries")]
    NoWorkingProxies {
        /// Number of proxies the source declared.
        configured: usize,
    },

    /// A proxy URI could not be parsed into scheme, host, and port.
    #[error("invalid proxy URI `{uri}`: {reason}")]
    InvalidProxyUri {
        /// The offending URI string.
        uri: String,
        /// Why parsing rejected it.
        reason: String,
    },

    /// The proxy list file could not be read.
    #[error("failed to read proxy list {path}: {source}")]
    Io {
        /// Path of the proxy list file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// reqwest rejected the proxy configuration when building the probe
    /// client.
    #[error("failed to build proxy client for `{uri}`: {source}")]
    ClientBuild {
        /// The proxy URI the client was being built for.
        uri: String,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
}

impl ProxyError {
    /// Creates a no-working-proxies configuration failure.
    #[must_use]
    pub fn no_working_proxies(configured: usize) -> Self {
        Self::NoWorkingProxies { configured }
    }

    /// Creates an invalid-URI error.
    pub fn invalid_uri(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidProxyUri {
            uri: uri.into(),
            reason: reason.into(),
        }
    }

    /// Creates an IO error for the proxy list file.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a client-build error.
    pub fn client_build(uri: impl Into<String>, source: reqwest::Error) -> Self {
        Self::ClientBuild {
            uri: uri.into(),
            source,
        }
    }
}
