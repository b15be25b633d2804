//! macOS media session detection via AppleScript
//!
//! macOS has no public API for the system-wide Now Playing session, so this
//! asks the players that expose a scripting dictionary: Spotify and Music.app.
//! A playing app wins over a paused one.

use crate::parse::{parse_applescript_track, APPLESCRIPT_SEPARATOR};
use anyhow::{anyhow, Result};
use std::process::Command;
use tracing::debug;
use vrcnp_core::{MediaInfoProvider, MediaSnapshot, PlaybackStatus, ProviderError};

struct ScriptableApp {
    name: &'static str,
    duration_in_millis: bool,
}

const APPS: [ScriptableApp; 2] = [
    ScriptableApp {
        name: "Spotify",
        duration_in_millis: true,
    },
    ScriptableApp {
        name: "Music",
        duration_in_millis: false,
    },
];

pub struct MacOsSession;

impl MacOsSession {
    pub fn new() -> Self {
        Self
    }

    fn osascript(script: &str) -> Result<String> {
        let output = Command::new("osascript").arg("-e").arg(script).output()?;
        if !output.status.success() {
            return Err(anyhow!(
                "osascript failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn is_running(app: &str) -> bool {
        Self::osascript(&format!(
            "tell application \"System Events\" to (name of processes) contains \"{}\"",
            app
        ))
        .map(|out| out == "true")
        .unwrap_or(false)
    }

    /// Read the track of one app. `Ok(None)` if it is not running or idle.
    fn get_app_track(app: &ScriptableApp) -> Result<Option<MediaSnapshot>> {
        if !Self::is_running(app.name) {
            debug!("{} is not running", app.name);
            return Ok(None);
        }

        let sep = APPLESCRIPT_SEPARATOR;
        let stdout = Self::osascript(&format!(
            r#"
                tell application "{app}"
                    if player state is playing or player state is paused then
                        return (player state as string) & "{sep}" & (artist of current track) & "{sep}" & (name of current track) & "{sep}" & (player position as string) & "{sep}" & (duration of current track as string)
                    else
                        return ""
                    end if
                end tell
            "#,
            app = app.name,
            sep = sep,
        ))?;

        if stdout.is_empty() {
            return Ok(None);
        }

        parse_applescript_track(&stdout, app.duration_in_millis)
            .map(Some)
            .ok_or_else(|| anyhow!("Unexpected output from {}: {}", app.name, stdout))
    }
}

impl MediaInfoProvider for MacOsSession {
    fn poll(&self) -> Result<MediaSnapshot, ProviderError> {
        let mut fallback = None;

        for app in &APPS {
            if let Some(snapshot) = Self::get_app_track(app)? {
                if snapshot.playback_status == PlaybackStatus::Playing {
                    debug!("Got playing track from {}", app.name);
                    return Ok(snapshot);
                }
                fallback.get_or_insert(snapshot);
            }
        }

        fallback.ok_or(ProviderError::NoMediaSession)
    }

    fn list_active_players(&self) -> Vec<String> {
        APPS.iter()
            .filter(|app| Self::is_running(app.name))
            .map(|app| app.name.to_string())
            .collect()
    }
}
