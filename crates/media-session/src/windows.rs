//! Windows media session detection via System Media Transport Controls (SMTC)
//!
//! Uses the Windows Runtime API to read the session Windows itself considers
//! current (Spotify, browsers, foobar2000, ...), including its timeline.
//!
//! Requires Windows 10 version 1803 or later.

use anyhow::{anyhow, Result};
use std::time::Duration;
use tracing::{debug, warn};
use vrcnp_core::{MediaInfoProvider, MediaSnapshot, PlaybackStatus, ProviderError};
use windows::{
    Foundation::{IAsyncOperation, TimeSpan},
    Media::Control::{
        GlobalSystemMediaTransportControlsSession, GlobalSystemMediaTransportControlsSessionManager,
        GlobalSystemMediaTransportControlsSessionPlaybackStatus,
    },
};

pub struct SmtcSession {
    manager: Option<GlobalSystemMediaTransportControlsSessionManager>,
}

impl SmtcSession {
    pub fn new() -> Self {
        let manager = match Self::request_manager_blocking() {
            Ok(mgr) => Some(mgr),
            Err(e) => {
                warn!("Failed to request SMTC manager: {}", e);
                None
            }
        };
        Self { manager }
    }

    fn request_manager_blocking() -> Result<GlobalSystemMediaTransportControlsSessionManager> {
        let operation = GlobalSystemMediaTransportControlsSessionManager::RequestAsync()
            .map_err(|e| anyhow!("Failed to create RequestAsync operation: {}", e))?;
        Self::block_on_async_operation(operation)
    }

    /// Block on an async Windows operation, giving up after two seconds
    fn block_on_async_operation<T>(operation: IAsyncOperation<T>) -> Result<T>
    where
        T: windows::core::RuntimeType + Clone,
    {
        use std::time::Instant;
        use windows::Foundation::AsyncStatus;

        let timeout = Duration::from_secs(2);
        let start = Instant::now();

        loop {
            let status = operation
                .Status()
                .map_err(|e| anyhow!("Failed to get operation status: {}", e))?;

            match status {
                AsyncStatus::Completed => {
                    return operation
                        .GetResults()
                        .map_err(|e| anyhow!("Failed to get operation results: {}", e));
                }
                AsyncStatus::Error => return Err(anyhow!("Async operation failed with error")),
                AsyncStatus::Canceled => return Err(anyhow!("Async operation was canceled")),
                AsyncStatus::Started => {
                    if start.elapsed() > timeout {
                        return Err(anyhow!("Async operation timed out"));
                    }
                    std::thread::sleep(Duration::from_millis(10));
                }
                _ => return Err(anyhow!("Unknown async status")),
            }
        }
    }

    fn manager(&self) -> Result<&GlobalSystemMediaTransportControlsSessionManager> {
        self.manager
            .as_ref()
            .ok_or_else(|| anyhow!("SMTC manager not initialized"))
    }

    /// `None` when no app currently owns a session
    fn current_session(&self) -> Result<Option<GlobalSystemMediaTransportControlsSession>> {
        match self.manager()?.GetCurrentSession() {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                debug!("No current session: {}", e);
                Ok(None)
            }
        }
    }

    fn snapshot(session: &GlobalSystemMediaTransportControlsSession) -> Result<MediaSnapshot> {
        let operation = session
            .TryGetMediaPropertiesAsync()
            .map_err(|e| anyhow!("Failed to get media properties: {}", e))?;
        let media_props = Self::block_on_async_operation(operation)?;

        let artist = media_props.Artist()?.to_string();
        let title = media_props.Title()?.to_string();

        let status = match session.GetPlaybackInfo()?.PlaybackStatus()? {
            GlobalSystemMediaTransportControlsSessionPlaybackStatus::Playing => PlaybackStatus::Playing,
            GlobalSystemMediaTransportControlsSessionPlaybackStatus::Paused => PlaybackStatus::Paused,
            _ => PlaybackStatus::Other,
        };

        let timeline = session.GetTimelineProperties()?;
        let position = timespan_to_duration(timeline.Position()?);
        let end_time = timespan_to_duration(timeline.EndTime()?);

        debug!(
            "SMTC: artist={}, title={}, status={:?}, position={:?}, end={:?}",
            artist, title, status, position, end_time
        );

        Ok(MediaSnapshot::new(artist, title, status).with_timeline(position, end_time))
    }
}

fn timespan_to_duration(span: TimeSpan) -> Duration {
    crate::parse::parse_hundred_nanos(span.Duration)
}

impl MediaInfoProvider for SmtcSession {
    fn poll(&self) -> Result<MediaSnapshot, ProviderError> {
        let session = self.current_session()?.ok_or(ProviderError::NoMediaSession)?;
        Ok(Self::snapshot(&session)?)
    }

    fn list_active_players(&self) -> Vec<String> {
        // SMTC only exposes the current session here
        self.current_session()
            .ok()
            .flatten()
            .and_then(|session| session.SourceAppUserModelId().ok())
            .map(|source| vec![source.to_string()])
            .unwrap_or_default()
    }
}
