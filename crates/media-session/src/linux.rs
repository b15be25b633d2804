//! Linux media session detection via MPRIS over D-Bus
//!
//! Queries D-Bus through `dbus-send` for MPRIS players. MPRIS has no notion of
//! a single current session, so the first playing player wins, falling back
//! to the first player found. Browsers are tried last.

use crate::parse::{parse_metadata, parse_micros, parse_property};
use anyhow::{anyhow, Context, Result};
use std::process::Command;
use tracing::debug;
use vrcnp_core::{MediaInfoProvider, MediaSnapshot, PlaybackStatus, ProviderError};

const MPRIS_PREFIX: &str = "org.mpris.MediaPlayer2.";

pub struct MprisSession;

impl MprisSession {
    pub fn new() -> Self {
        Self
    }

    fn dbus_send(args: &[&str]) -> Result<String> {
        let output = Command::new("dbus-send")
            .args(["--session", "--print-reply"])
            .args(args)
            .output()
            .context("failed to run dbus-send")?;

        if !output.status.success() {
            return Err(anyhow!(
                "dbus-send failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// All MPRIS bus names, dedicated players before browsers
    fn get_all_players(&self) -> Result<Vec<String>> {
        let stdout = Self::dbus_send(&[
            "--dest=org.freedesktop.DBus",
            "/org/freedesktop/DBus",
            "org.freedesktop.DBus.ListNames",
        ])?;

        let (mut players, browsers): (Vec<String>, Vec<String>) = stdout
            .lines()
            .filter(|line| line.contains(MPRIS_PREFIX))
            .map(|line| {
                line.trim()
                    .trim_start_matches("string \"")
                    .trim_end_matches('"')
                    .to_string()
            })
            .partition(|player| {
                !(player.contains("firefox") || player.contains("chrome") || player.contains("chromium"))
            });

        players.extend(browsers);
        Ok(players)
    }

    fn get_mpris_property(&self, player: &str, property: &str) -> Result<String> {
        let stdout = Self::dbus_send(&[
            &format!("--dest={}", player),
            "/org/mpris/MediaPlayer2",
            "org.freedesktop.DBus.Properties.Get",
            "string:org.mpris.MediaPlayer2.Player",
            &format!("string:{}", property),
        ])?;

        parse_property(&stdout).ok_or_else(|| anyhow!("Failed to parse property: {}", property))
    }

    fn playback_status(&self, player: &str) -> Result<PlaybackStatus> {
        Ok(match self.get_mpris_property(player, "PlaybackStatus")?.as_str() {
            "Playing" => PlaybackStatus::Playing,
            "Paused" => PlaybackStatus::Paused,
            _ => PlaybackStatus::Other,
        })
    }

    /// Pick the player treated as the current session
    fn get_active_player(&self, players: Vec<String>) -> Option<(String, PlaybackStatus)> {
        let mut fallback = None;

        for player in players {
            match self.playback_status(&player) {
                Ok(PlaybackStatus::Playing) => {
                    debug!("Found playing player: {}", player);
                    return Some((player, PlaybackStatus::Playing));
                }
                Ok(status) if fallback.is_none() => fallback = Some((player, status)),
                Ok(_) => {}
                Err(e) => debug!("Skipping {}: {}", player, e),
            }
        }

        fallback
    }
}

impl MediaInfoProvider for MprisSession {
    fn poll(&self) -> Result<MediaSnapshot, ProviderError> {
        let players = self.get_all_players()?;
        let (player, status) = self.get_active_player(players).ok_or(ProviderError::NoMediaSession)?;

        let metadata = parse_metadata(&Self::dbus_send(&[
            &format!("--dest={}", player),
            "/org/mpris/MediaPlayer2",
            "org.freedesktop.DBus.Properties.Get",
            "string:org.mpris.MediaPlayer2.Player",
            "string:Metadata",
        ])?);

        let artist = metadata
            .get("xesam:artist")
            .or_else(|| metadata.get("xesam:albumArtist"))
            .cloned()
            .unwrap_or_default();
        let title = metadata.get("xesam:title").cloned().unwrap_or_default();

        let mut snapshot = MediaSnapshot::new(artist, title, status);

        // Players without a seekable timeline simply omit these
        let length = metadata.get("mpris:length").and_then(|v| parse_micros(v));
        let position = self
            .get_mpris_property(&player, "Position")
            .ok()
            .and_then(|v| parse_micros(&v));
        if let (Some(position), Some(length)) = (position, length) {
            snapshot = snapshot.with_timeline(position, length);
        }

        debug!(
            "MPRIS {}: artist={}, title={}, status={:?}, position={:?}, length={:?}",
            player, snapshot.artist, snapshot.title, status, position, length
        );

        Ok(snapshot)
    }

    fn list_active_players(&self) -> Vec<String> {
        self.get_all_players().unwrap_or_default()
    }
}
