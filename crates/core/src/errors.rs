//! Error types shared by the now-playing pipeline

use std::path::PathBuf;

/// Failures reported by a [`MediaInfoProvider`](crate::MediaInfoProvider)
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// No media session is running. Expected and frequent, skipped silently.
    #[error("no media session running")]
    NoMediaSession,
    /// The OS call failed for some other reason. Logged, then the tick is skipped.
    #[error("media provider failed: {0:#}")]
    Transient(#[from] anyhow::Error),
}

/// Errors raised while loading the configuration at startup
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to obtain user's config directory")]
    DirectoriesNotFound,
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Deserialize {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// A chatbox message could not be delivered. Never retried.
#[derive(Debug, thiserror::Error)]
#[error("failed to send chatbox message: {0}")]
pub struct TransportError(#[source] pub Box<dyn std::error::Error + Send + Sync>);

impl TransportError {
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Box::new(err))
    }
}
