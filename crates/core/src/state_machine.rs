//! The now-playing state machine.
//!
//! Called once per tick with the latest snapshot and blacklist decision, it
//! decides whether a chatbox message goes out and what it says.
//!
//! - Playing: announce track changes, and resend every tick unless
//!   `OnlyShowOnChange` is set.
//! - Paused: send the paused message once per pause episode and forget the
//!   last track, so resuming the same song announces it again.
//! - Anything else: stay quiet.
//!
//! A suppressed blacklist decision blocks the send but not the bookkeeping.

use crate::config::Config;
use crate::format::{render, truncate_chars, CHATBOX_MAX_CHARS};
use crate::models::{BlacklistDecision, MediaSnapshot, PlaybackStatus, TrackKey};
use crate::position::PositionSmoother;
use tracing::{debug, info};

/// Everything the state machine remembers between ticks
#[derive(Clone, Debug, Default)]
pub struct DisplayState {
    pub last_displayed_track: TrackKey,
    pub smoother: PositionSmoother,
    pub was_paused: bool,
    pub was_suppressed: bool,
}

#[derive(Clone, Debug)]
pub struct NowPlayingStateMachine {
    display_format: String,
    paused_format: String,
    only_show_on_change: bool,
    state: DisplayState,
}

impl NowPlayingStateMachine {
    pub fn new(config: &Config) -> Self {
        Self::with_state(config, DisplayState::default())
    }

    pub fn with_state(config: &Config, state: DisplayState) -> Self {
        Self {
            display_format: config.display_format.clone(),
            paused_format: config.paused_format.clone(),
            only_show_on_change: config.only_show_on_change,
            state,
        }
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    /// Process one snapshot. Returns the message to dispatch, if any.
    pub fn on_snapshot(&mut self, snapshot: &MediaSnapshot, decision: &BlacklistDecision) -> Option<String> {
        self.observe_blacklist(decision);

        let message = match snapshot.playback_status {
            PlaybackStatus::Playing => self.on_playing(snapshot),
            PlaybackStatus::Paused => {
                self.state.smoother.reset();
                self.on_paused()
            }
            PlaybackStatus::Other => {
                self.state.smoother.reset();
                None
            }
        };

        message.filter(|_| !decision.suppressed)
    }

    /// No session, or the provider failed. Only the smoothing state lapses.
    pub fn on_idle(&mut self) {
        self.state.smoother.reset();
    }

    fn on_playing(&mut self, snapshot: &MediaSnapshot) -> Option<String> {
        let position = self.state.smoother.position_suffix(snapshot);
        let rendered = render(&self.display_format, &snapshot.artist, &snapshot.title, &position);
        let message = truncate_chars(&rendered, CHATBOX_MAX_CHARS).to_string();

        let mut send = !self.only_show_on_change;
        let track = snapshot.track_key();
        if track != self.state.last_displayed_track {
            send = true;
            self.state.last_displayed_track = track;
            info!("{}", message);
        }

        self.state.was_paused = false;
        send.then_some(message)
    }

    fn on_paused(&mut self) -> Option<String> {
        if self.state.was_paused {
            return None;
        }

        info!("{}", self.paused_format);
        self.state.last_displayed_track = TrackKey::empty();
        self.state.was_paused = true;
        Some(self.paused_format.clone())
    }

    fn observe_blacklist(&mut self, decision: &BlacklistDecision) {
        if decision.suppressed && !self.state.was_suppressed {
            info!(
                "Not outputting chatbox as current world ({}) does not allow NP chatboxes.",
                decision.reason
            );
        } else if !decision.suppressed && self.state.was_suppressed {
            debug!("Chatbox output allowed again");
        }
        self.state.was_suppressed = decision.suppressed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::{LIVE_SENTINEL_DURATION, TICK_INTERVAL};
    use std::time::Duration;

    fn playing(artist: &str, title: &str) -> MediaSnapshot {
        MediaSnapshot::new(artist, title, PlaybackStatus::Playing)
    }

    fn paused(artist: &str, title: &str) -> MediaSnapshot {
        MediaSnapshot::new(artist, title, PlaybackStatus::Paused)
    }

    fn machine(only_show_on_change: bool) -> NowPlayingStateMachine {
        let config = Config {
            only_show_on_change,
            ..Config::default()
        };
        NowPlayingStateMachine::new(&config)
    }

    fn allowed() -> BlacklistDecision {
        BlacklistDecision::allowed()
    }

    #[test]
    fn test_only_show_on_change_sends_once() {
        let mut sm = machine(true);
        let snapshot = playing("Boards of Canada", "Roygbiv");

        let sent: Vec<_> = (0..10).filter_map(|_| sm.on_snapshot(&snapshot, &allowed())).collect();
        assert_eq!(sent, vec!["( NP: Boards of Canada - Roygbiv )".to_string()]);
    }

    #[test]
    fn test_continuous_mode_sends_every_tick() {
        let mut sm = machine(false);
        let snapshot = playing("Boards of Canada", "Roygbiv");

        let sent = (0..4).filter_map(|_| sm.on_snapshot(&snapshot, &allowed())).count();
        assert_eq!(sent, 4);
    }

    #[test]
    fn test_track_change_always_sends() {
        let mut sm = machine(true);
        assert!(sm.on_snapshot(&playing("A", "One"), &allowed()).is_some());
        assert!(sm.on_snapshot(&playing("A", "One"), &allowed()).is_none());
        assert!(sm.on_snapshot(&playing("A", "Two"), &allowed()).is_some());
        assert_eq!(sm.state().last_displayed_track, TrackKey::new("A", "Two"));
    }

    #[test]
    fn test_pause_sent_once_per_episode() {
        let mut sm = machine(true);
        sm.on_snapshot(&playing("A", "One"), &allowed());

        let sent: Vec<_> = (0..3)
            .filter_map(|_| sm.on_snapshot(&paused("A", "One"), &allowed()))
            .collect();
        assert_eq!(sent, vec!["( Playback Paused )".to_string()]);
        assert!(sm.state().was_paused);
    }

    #[test]
    fn test_resume_resends_same_track() {
        let mut sm = machine(true);
        let track = playing("A", "One");

        assert!(sm.on_snapshot(&track, &allowed()).is_some());
        assert!(sm.on_snapshot(&paused("A", "One"), &allowed()).is_some());
        assert_eq!(sm.state().last_displayed_track, TrackKey::empty());

        assert_eq!(
            sm.on_snapshot(&track, &allowed()).as_deref(),
            Some("( NP: A - One )")
        );
        assert!(!sm.state().was_paused);
    }

    #[test]
    fn test_second_pause_after_resume_is_sent() {
        let mut sm = machine(true);
        sm.on_snapshot(&playing("A", "One"), &allowed());
        assert!(sm.on_snapshot(&paused("A", "One"), &allowed()).is_some());
        sm.on_snapshot(&playing("A", "One"), &allowed());
        assert!(sm.on_snapshot(&paused("A", "One"), &allowed()).is_some());
    }

    #[test]
    fn test_suppressed_blocks_send_but_updates_state() {
        let mut sm = machine(true);
        let blocked = BlacklistDecision::suppressed("Quiet world");

        assert!(sm.on_snapshot(&playing("A", "One"), &blocked).is_none());
        assert_eq!(sm.state().last_displayed_track, TrackKey::new("A", "One"));
        assert!(sm.state().was_suppressed);

        assert!(sm.on_snapshot(&paused("A", "One"), &blocked).is_none());
        assert!(sm.state().was_paused);
        assert_eq!(sm.state().last_displayed_track, TrackKey::empty());

        // Leaving the world does not replay the pause message
        assert!(sm.on_snapshot(&paused("A", "One"), &allowed()).is_none());
        assert!(!sm.state().was_suppressed);
    }

    #[test]
    fn test_long_messages_are_truncated() {
        let mut sm = machine(false);
        let title = "x".repeat(300);

        let message = sm.on_snapshot(&playing("Artist", &title), &allowed()).unwrap();
        assert_eq!(message.chars().count(), CHATBOX_MAX_CHARS);
        assert!(message.starts_with("( NP: Artist - xxx"));
    }

    #[test]
    fn test_displayed_position_advances_on_stale_samples() {
        let mut sm = machine(false);
        let snapshot = playing("A", "One").with_timeline(Duration::from_secs(10), Duration::from_secs(200));

        sm.on_snapshot(&snapshot, &allowed());
        let mut previous = sm.state().smoother.displayed_elapsed().unwrap();
        for _ in 0..4 {
            sm.on_snapshot(&snapshot, &allowed());
            let current = sm.state().smoother.displayed_elapsed().unwrap();
            assert_eq!(current, previous + TICK_INTERVAL);
            previous = current;
        }
    }

    #[test]
    fn test_live_stream_message() {
        let mut sm = machine(false);
        let snapshot = playing("Lofi Girl", "beats to relax to")
            .with_timeline(Duration::from_secs(42), LIVE_SENTINEL_DURATION);

        assert_eq!(
            sm.on_snapshot(&snapshot, &allowed()).as_deref(),
            Some("( NP: Lofi Girl - beats to relax to <LIVE> )")
        );
    }

    #[test]
    fn test_idle_keeps_track_but_drops_smoothing() {
        let mut sm = machine(true);
        let snapshot = playing("A", "One").with_timeline(Duration::from_secs(10), Duration::from_secs(200));
        sm.on_snapshot(&snapshot, &allowed());

        sm.on_idle();
        assert_eq!(sm.state().smoother.displayed_elapsed(), None);
        assert_eq!(sm.state().last_displayed_track, TrackKey::new("A", "One"));

        // Same track after a provider hiccup is not a change
        assert!(sm.on_snapshot(&snapshot, &allowed()).is_none());
    }

    #[test]
    fn test_stopped_sends_nothing() {
        let mut sm = machine(false);
        let stopped = MediaSnapshot::new("A", "One", PlaybackStatus::Other);
        assert!(sm.on_snapshot(&stopped, &allowed()).is_none());
        assert_eq!(sm.state().last_displayed_track, TrackKey::empty());
    }
}
