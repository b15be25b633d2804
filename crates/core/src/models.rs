use std::time::Duration;

/// Playback state reported by the media session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    /// Stopped, changing tracks, opening, or anything else the OS reports
    Other,
}

/// Track and playback facts read from the OS during one tick
#[derive(Clone, Debug, PartialEq)]
pub struct MediaSnapshot {
    pub artist: String,
    pub title: String,
    pub playback_status: PlaybackStatus,
    /// Current position, `None` when the track has no timeline
    pub position: Option<Duration>,
    /// Total length, `None` when the track has no timeline
    pub total_duration: Option<Duration>,
}

impl MediaSnapshot {
    pub fn new(artist: impl Into<String>, title: impl Into<String>, playback_status: PlaybackStatus) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
            playback_status,
            position: None,
            total_duration: None,
        }
    }

    /// Attach timeline information. A zero end time means the session has no
    /// timeline, so both fields stay empty in that case.
    pub fn with_timeline(mut self, position: Duration, total_duration: Duration) -> Self {
        if total_duration.is_zero() {
            self.position = None;
            self.total_duration = None;
        } else {
            self.position = Some(position);
            self.total_duration = Some(total_duration);
        }
        self
    }

    pub fn track_key(&self) -> TrackKey {
        TrackKey::new(&self.artist, &self.title)
    }
}

/// (artist, title) pair used for change detection
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TrackKey {
    pub artist: String,
    pub title: String,
}

impl TrackKey {
    pub fn new(artist: &str, title: &str) -> Self {
        Self {
            artist: artist.to_string(),
            title: title.to_string(),
        }
    }

    /// The reset value, never equal to a reported track unless both fields are empty
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Whether chatbox output is currently forbidden, and why
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlacklistDecision {
    pub suppressed: bool,
    pub reason: String,
}

impl BlacklistDecision {
    pub fn allowed() -> Self {
        Self::default()
    }

    pub fn suppressed(reason: impl Into<String>) -> Self {
        Self {
            suppressed: true,
            reason: reason.into(),
        }
    }
}
