//! Per-world chatbox blacklist
//!
//! VRChat writes the world it joins to `output_log_*.txt`. [`WorldBlacklist`]
//! follows the newest log file, remembers the last world joined and suppresses
//! chatbox output while that world is on the user's list.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use vrcnp_core::{BlacklistDecision, BlacklistOracle, Config};

const LOG_PREFIX: &str = "output_log_";
const JOIN_MARKER: &str = "Joining wrld_";
const LEFT_MARKER: &str = "OnLeftRoom";

/// `~/AppData/LocalLow/VRChat/VRChat`, where VRChat keeps its logs
pub fn default_log_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join("AppData").join("LocalLow").join("VRChat").join("VRChat"))
}

/// World id from a `Joining wrld_...` log line, without the instance suffix
pub fn parse_joined_world(line: &str) -> Option<&str> {
    let start = line.find(JOIN_MARKER)? + JOIN_MARKER.len() - "wrld_".len();
    let id = &line[start..];
    let end = id
        .find(|c: char| c == ':' || c.is_whitespace())
        .unwrap_or(id.len());
    Some(&id[..end])
}

/// Read position inside the log file currently followed
#[derive(Debug)]
struct LogTail {
    path: PathBuf,
    offset: u64,
}

#[derive(Debug)]
pub struct WorldBlacklist {
    log_dir: PathBuf,
    worlds: BTreeMap<String, String>,
    tail: Option<LogTail>,
    current_world: Option<String>,
}

impl WorldBlacklist {
    pub fn new(log_dir: impl Into<PathBuf>, worlds: BTreeMap<String, String>) -> Self {
        Self {
            log_dir: log_dir.into(),
            worlds,
            tail: None,
            current_world: None,
        }
    }

    /// `None` when the config lists no worlds or no log folder can be found
    pub fn from_config(config: &Config) -> Option<Self> {
        if config.world_blacklist.is_empty() {
            return None;
        }
        let log_dir = config.vrchat_log_directory.clone().or_else(default_log_dir)?;
        info!(
            "Watching VRChat logs in {} for {} blacklisted world(s)",
            log_dir.display(),
            config.world_blacklist.len()
        );
        Some(Self::new(log_dir, config.world_blacklist.clone()))
    }

    pub fn current_world(&self) -> Option<&str> {
        self.current_world.as_deref()
    }

    fn newest_log(&self) -> Result<Option<PathBuf>> {
        if !self.log_dir.is_dir() {
            return Ok(None);
        }

        let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;
        for entry in fs::read_dir(&self.log_dir)
            .with_context(|| format!("Failed to list {}", self.log_dir.display()))?
        {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !name.starts_with(LOG_PREFIX) || !name.ends_with(".txt") {
                continue;
            }
            let modified = entry.metadata()?.modified()?;
            if newest.as_ref().map_or(true, |(time, _)| modified > *time) {
                newest = Some((modified, entry.path()));
            }
        }

        Ok(newest.map(|(_, path)| path))
    }

    /// Read lines appended since the last call and update the current world
    pub fn refresh(&mut self) -> Result<()> {
        let Some(path) = self.newest_log()? else {
            return Ok(());
        };

        if self.tail.as_ref().map(|t| t.path.as_path()) != Some(path.as_path()) {
            debug!("Following VRChat log {}", path.display());
            self.tail = Some(LogTail { path, offset: 0 });
            self.current_world = None;
        }
        let Some(tail) = self.tail.as_mut() else {
            return Ok(());
        };

        let appended = read_complete_lines(&tail.path, &mut tail.offset)?;
        for line in appended.lines() {
            if let Some(world) = parse_joined_world(line) {
                debug!("Joined world {}", world);
                self.current_world = Some(world.to_string());
            } else if line.contains(LEFT_MARKER) {
                self.current_world = None;
            }
        }
        Ok(())
    }
}

/// Read everything after `offset` up to the last newline, advancing `offset`.
/// A partially written last line is left for the next call.
fn read_complete_lines(path: &Path, offset: &mut u64) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let len = file.metadata()?.len();
    if len < *offset {
        // Truncated or replaced in place
        *offset = 0;
    }

    file.seek(SeekFrom::Start(*offset))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;

    let complete = buf.iter().rposition(|&b| b == b'\n').map_or(0, |idx| idx + 1);
    *offset += complete as u64;
    Ok(String::from_utf8_lossy(&buf[..complete]).into_owned())
}

impl BlacklistOracle for WorldBlacklist {
    fn evaluate(&mut self) -> Result<BlacklistDecision> {
        self.refresh()?;

        let decision = self
            .current_world
            .as_ref()
            .and_then(|world| self.worlds.get(world))
            .map(BlacklistDecision::suppressed)
            .unwrap_or_else(BlacklistDecision::allowed);
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const JOIN_QUIET: &str = "2024.05.01 21:14:03 Log        -  [Behaviour] Joining wrld_4cf554b4-430c-4f8f-b53e-1f294eed230b:51234~hidden(usr_x)~region(eu)\n";
    const JOIN_CLUB: &str = "2024.05.01 21:30:11 Log        -  [Behaviour] Joining wrld_ba913a96-fac4-4048-a062-9aa5db092812:777\n";
    const LEFT: &str = "2024.05.01 21:40:00 Log        -  [Behaviour] OnLeftRoom\n";

    fn blacklist(dir: &Path) -> WorldBlacklist {
        let worlds = BTreeMap::from([(
            "wrld_4cf554b4-430c-4f8f-b53e-1f294eed230b".to_string(),
            "Quiet Library".to_string(),
        )]);
        WorldBlacklist::new(dir, worlds)
    }

    fn append(path: &Path, text: &str) {
        let mut file = fs::OpenOptions::new().create(true).append(true).open(path).unwrap();
        file.write_all(text.as_bytes()).unwrap();
    }

    #[test]
    fn test_parse_joined_world() {
        assert_eq!(
            parse_joined_world(JOIN_QUIET),
            Some("wrld_4cf554b4-430c-4f8f-b53e-1f294eed230b")
        );
        assert_eq!(parse_joined_world("[Behaviour] Joining wrld_abc\n"), Some("wrld_abc"));
        assert_eq!(parse_joined_world("[Behaviour] Entering Room: Home"), None);
    }

    #[test]
    fn test_missing_log_dir_allows_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut oracle = blacklist(&dir.path().join("missing"));
        assert_eq!(oracle.evaluate().unwrap(), BlacklistDecision::allowed());
    }

    #[test]
    fn test_blacklisted_world_suppresses_until_left() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("output_log_2024-05-01_21-00-00.txt");
        append(&log, JOIN_QUIET);

        let mut oracle = blacklist(dir.path());
        assert_eq!(oracle.evaluate().unwrap(), BlacklistDecision::suppressed("Quiet Library"));

        append(&log, JOIN_CLUB);
        assert!(!oracle.evaluate().unwrap().suppressed);
        assert_eq!(oracle.current_world(), Some("wrld_ba913a96-fac4-4048-a062-9aa5db092812"));

        append(&log, JOIN_QUIET);
        assert!(oracle.evaluate().unwrap().suppressed);

        append(&log, LEFT);
        assert!(!oracle.evaluate().unwrap().suppressed);
        assert_eq!(oracle.current_world(), None);
    }

    #[test]
    fn test_partial_line_waits_for_newline() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("output_log_2024-05-01_21-00-00.txt");
        let (head, rest) = JOIN_QUIET.split_at(60);
        append(&log, head);

        let mut oracle = blacklist(dir.path());
        assert!(!oracle.evaluate().unwrap().suppressed);

        append(&log, rest);
        assert!(oracle.evaluate().unwrap().suppressed);
    }

    #[test]
    fn test_other_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        append(&dir.path().join("Player.log"), JOIN_QUIET);

        let mut oracle = blacklist(dir.path());
        assert!(!oracle.evaluate().unwrap().suppressed);
    }

    #[test]
    fn test_from_config_needs_worlds() {
        let config = Config::default();
        assert!(WorldBlacklist::from_config(&config).is_none());

        let config = Config {
            world_blacklist: BTreeMap::from([("wrld_1".to_string(), "x".to_string())]),
            vrchat_log_directory: Some(PathBuf::from("/tmp/vrchat-logs")),
            ..Config::default()
        };
        let oracle = WorldBlacklist::from_config(&config).unwrap();
        assert_eq!(oracle.log_dir, PathBuf::from("/tmp/vrchat-logs"));
    }
}
