use crate::errors::{ProviderError, TransportError};
use crate::models::{BlacklistDecision, MediaSnapshot};
use anyhow::Result;

/// Source of the OS "current" media session
pub trait MediaInfoProvider {
    /// Read the current session. `ProviderError::NoMediaSession` when nothing is playing.
    fn poll(&self) -> Result<MediaSnapshot, ProviderError>;

    /// Identifiers of the players the provider can currently see
    fn list_active_players(&self) -> Vec<String>;
}

/// Decides whether chatbox output is currently forbidden
pub trait BlacklistOracle {
    fn evaluate(&mut self) -> Result<BlacklistDecision>;
}

/// Destination for finished chatbox messages
pub trait ChatboxSink {
    fn send_chatbox(&self, text: &str) -> Result<(), TransportError>;
}

/// Oracle used when no blacklist is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl BlacklistOracle for AllowAll {
    fn evaluate(&mut self) -> Result<BlacklistDecision> {
        Ok(BlacklistDecision::allowed())
    }
}
