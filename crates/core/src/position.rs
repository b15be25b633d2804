//! Playback position smoothing.
//!
//! Media providers often refresh their position value less often than we
//! poll, so the same stale position comes back for several ticks in a row.
//! [`PositionSmoother`] turns that into a clock that keeps moving forward.

use crate::models::MediaSnapshot;
use std::time::Duration;

/// Time between two polls of the media session
pub const TICK_INTERVAL: Duration = Duration::from_millis(1500);

/// End time SMTC reports for YouTube live streams (14 hours).
pub const LIVE_SENTINEL_DURATION: Duration = Duration::from_secs(50_400);

pub const LIVE_MARKER: &str = " <LIVE>";

/// Heuristic live-stream check: the total duration is exactly the sentinel.
///
/// This only reflects how one upstream provider labels indefinite content. A
/// real 14 hour track would also be shown as live.
pub fn is_live_stream(total_duration: Duration) -> bool {
    total_duration.as_secs() == LIVE_SENTINEL_DURATION.as_secs()
}

/// Format a duration as `m:ss`, minutes unpadded.
pub fn format_timestamp(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[derive(Clone, Debug)]
pub struct PositionSmoother {
    tick: Duration,
    displayed_elapsed: Option<Duration>,
    last_sampled_position: Option<Duration>,
}

impl Default for PositionSmoother {
    fn default() -> Self {
        Self::new(TICK_INTERVAL)
    }
}

impl PositionSmoother {
    pub fn new(tick: Duration) -> Self {
        Self {
            tick,
            displayed_elapsed: None,
            last_sampled_position: None,
        }
    }

    pub fn displayed_elapsed(&self) -> Option<Duration> {
        self.displayed_elapsed
    }

    /// Forget the previous sample so a later resume starts fresh
    pub fn reset(&mut self) {
        self.displayed_elapsed = None;
        self.last_sampled_position = None;
    }

    /// Advance-on-stale-sample rule: a new position is trusted verbatim, a
    /// repeated one moves the displayed clock forward by one tick.
    pub fn advance(&mut self, sampled: Duration) -> Duration {
        let elapsed = match self.displayed_elapsed {
            Some(previous) if self.last_sampled_position == Some(sampled) => previous + self.tick,
            _ => {
                self.last_sampled_position = Some(sampled);
                sampled
            }
        };
        self.displayed_elapsed = Some(elapsed);
        elapsed
    }

    /// Build the `{song_position}` suffix for a playing snapshot.
    ///
    /// Returns ` <elapsed / total>`, [`LIVE_MARKER`], or an empty string when
    /// the track has no timeline.
    pub fn position_suffix(&mut self, snapshot: &MediaSnapshot) -> String {
        let (Some(position), Some(total)) = (snapshot.position, snapshot.total_duration) else {
            return String::new();
        };

        if is_live_stream(total) {
            return LIVE_MARKER.to_string();
        }

        let elapsed = self.advance(position);
        format!(" <{} / {}>", format_timestamp(elapsed), format_timestamp(total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlaybackStatus;

    fn playing_at(position: Duration, total: Duration) -> MediaSnapshot {
        MediaSnapshot::new("Artist", "Song", PlaybackStatus::Playing).with_timeline(position, total)
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(Duration::ZERO), "0:00");
        assert_eq!(format_timestamp(Duration::from_millis(65_900)), "1:05");
        assert_eq!(format_timestamp(Duration::from_secs(3_725)), "62:05");
    }

    #[test]
    fn test_stale_samples_advance_one_tick_each() {
        let mut smoother = PositionSmoother::default();
        let sample = Duration::from_secs(30);

        let mut previous = smoother.advance(sample);
        assert_eq!(previous, sample);

        for _ in 0..5 {
            let next = smoother.advance(sample);
            assert_eq!(next, previous + TICK_INTERVAL);
            previous = next;
        }
    }

    #[test]
    fn test_new_sample_is_trusted_verbatim() {
        let mut smoother = PositionSmoother::default();
        smoother.advance(Duration::from_secs(10));
        smoother.advance(Duration::from_secs(10));

        // A seek backwards is shown as reported
        assert_eq!(smoother.advance(Duration::from_secs(4)), Duration::from_secs(4));
        assert_eq!(smoother.displayed_elapsed(), Some(Duration::from_secs(4)));
    }

    #[test]
    fn test_reset_forgets_previous_sample() {
        let mut smoother = PositionSmoother::default();
        smoother.advance(Duration::from_secs(10));
        smoother.reset();

        assert_eq!(smoother.displayed_elapsed(), None);
        assert_eq!(smoother.advance(Duration::from_secs(10)), Duration::from_secs(10));
    }

    #[test]
    fn test_live_marker_ignores_position() {
        let mut smoother = PositionSmoother::default();
        for secs in [0, 17, 50_399, 90_000] {
            let snapshot = playing_at(Duration::from_secs(secs), LIVE_SENTINEL_DURATION);
            assert_eq!(smoother.position_suffix(&snapshot), LIVE_MARKER);
        }
        assert_eq!(smoother.displayed_elapsed(), None);
    }

    #[test]
    fn test_suffix_formats_elapsed_and_total() {
        let mut smoother = PositionSmoother::default();
        let snapshot = playing_at(Duration::from_secs(61), Duration::from_secs(215));

        assert_eq!(smoother.position_suffix(&snapshot), " <1:01 / 3:35>");
        // Same cached sample: 61s + 1.5s
        assert_eq!(smoother.position_suffix(&snapshot), " <1:02 / 3:35>");
    }

    #[test]
    fn test_no_timeline_gives_empty_suffix() {
        let mut smoother = PositionSmoother::default();
        let snapshot = MediaSnapshot::new("Artist", "Song", PlaybackStatus::Playing);
        assert_eq!(smoother.position_suffix(&snapshot), "");
    }
}
