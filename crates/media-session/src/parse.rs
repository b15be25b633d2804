//! Text parsing for the command-line tools the Linux and macOS backends shell out to,
//! plus WinRT time conversion.

use std::collections::HashMap;
use std::time::Duration;
use vrcnp_core::{MediaSnapshot, PlaybackStatus};

/// Field separator used by the AppleScript snippets
pub const APPLESCRIPT_SEPARATOR: &str = "|||";

/// Value of a `variant` line from `dbus-send --print-reply`.
///
/// `variant string "Playing"` gives `Playing`, `variant int64 1500` gives `1500`.
fn scalar_value(after_variant: &str) -> Option<String> {
    let text = after_variant.trim();
    if let (Some(start), Some(end)) = (text.find('"'), text.rfind('"')) {
        if end > start {
            return Some(text[start + 1..end].to_string());
        }
    }
    text.split_whitespace().last().map(str::to_string)
}

/// Value of a single `org.freedesktop.DBus.Properties.Get` reply
pub fn parse_property(stdout: &str) -> Option<String> {
    let mut lines = stdout.lines().map(str::trim);
    while let Some(line) = lines.next() {
        if let Some(rest) = line.strip_prefix("variant") {
            if !rest.trim().is_empty() {
                return scalar_value(rest);
            }
            // Value printed on the following line
            return lines.next().and_then(scalar_value);
        }
    }
    None
}

/// Flatten an MPRIS `Metadata` reply into key -> first value.
///
/// Arrays (`xesam:artist` is a list) keep their first string element.
pub fn parse_metadata(stdout: &str) -> HashMap<String, String> {
    let lines: Vec<&str> = stdout.lines().map(str::trim).collect();
    let mut metadata = HashMap::new();

    let mut i = 0;
    while i < lines.len() {
        if lines[i] != "dict entry(" {
            i += 1;
            continue;
        }

        let key = lines
            .get(i + 1)
            .and_then(|l| l.strip_prefix("string \""))
            .and_then(|l| l.strip_suffix('"'));
        let variant = lines.get(i + 2).and_then(|l| l.strip_prefix("variant"));

        if let (Some(key), Some(variant)) = (key, variant) {
            let value = if variant.trim_start().starts_with("array [") {
                lines[i + 3..]
                    .iter()
                    .take_while(|l| !l.starts_with(']'))
                    .find_map(|l| l.strip_prefix("string").and_then(scalar_value))
            } else {
                scalar_value(variant)
            };
            if let Some(value) = value {
                metadata.insert(key.to_string(), value);
            }
        }
        i += 3;
    }

    metadata
}

/// MPRIS positions and lengths are integer microseconds
pub fn parse_micros(value: &str) -> Option<Duration> {
    let micros: i64 = value.trim().parse().ok()?;
    u64::try_from(micros).ok().map(Duration::from_micros)
}

/// AppleScript prints fractional seconds, with a comma in some locales
pub fn parse_seconds(value: &str) -> Option<Duration> {
    let secs: f64 = value.trim().replace(',', ".").parse().ok()?;
    (secs.is_finite() && secs >= 0.0).then(|| Duration::from_secs_f64(secs))
}

/// WinRT `TimeSpan` counts 100ns ticks. Negative counts clamp to zero.
pub fn parse_hundred_nanos(ticks: i64) -> Duration {
    let ticks = u64::try_from(ticks).unwrap_or(0);
    Duration::from_micros(ticks / 10) + Duration::from_nanos(ticks % 10 * 100)
}

/// Parse `state|||artist|||title|||position|||duration` as printed by the
/// macOS player scripts. Spotify reports durations in milliseconds, Music.app
/// in seconds.
pub fn parse_applescript_track(stdout: &str, duration_in_millis: bool) -> Option<MediaSnapshot> {
    let fields: Vec<&str> = stdout.trim().split(APPLESCRIPT_SEPARATOR).collect();
    let [state, artist, title, position, duration] = fields.as_slice() else {
        return None;
    };

    let status = match state.trim() {
        "playing" => PlaybackStatus::Playing,
        "paused" => PlaybackStatus::Paused,
        _ => PlaybackStatus::Other,
    };

    let mut snapshot = MediaSnapshot::new(*artist, *title, status);
    let duration = if duration_in_millis {
        parse_seconds(duration).map(|ms| ms / 1000)
    } else {
        parse_seconds(duration)
    };
    if let (Some(position), Some(duration)) = (parse_seconds(position), duration) {
        snapshot = snapshot.with_timeline(position, duration);
    }
    Some(snapshot)
}
