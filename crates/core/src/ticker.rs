//! One tick of the polling loop: read a source, decide, dispatch.

use crate::config::Config;
use crate::errors::ProviderError;
use crate::state_machine::NowPlayingStateMachine;
use crate::text_file::TextFileMode;
use crate::traits::{BlacklistOracle, ChatboxSink, MediaInfoProvider};
use tracing::{debug, info, warn};

/// Where chatbox text comes from. Chosen once at startup.
pub enum Source {
    Media {
        provider: Box<dyn MediaInfoProvider>,
        oracle: Box<dyn BlacklistOracle>,
        machine: NowPlayingStateMachine,
    },
    TextFile(TextFileMode),
}

/// What a tick did
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// A message was handed to the sink
    Sent(String),
    /// Nothing to send this tick
    Quiet,
    /// The source or oracle failed; state left as it was
    Skipped,
    /// The message was decided but the sink rejected it
    DispatchFailed(String),
}

pub struct Ticker {
    source: Source,
    sink: Box<dyn ChatboxSink>,
    announced: bool,
}

impl Ticker {
    pub fn new(source: Source, sink: Box<dyn ChatboxSink>) -> Self {
        Self {
            source,
            sink,
            announced: false,
        }
    }

    /// Pick text file mode or the media session based on `UseTextFile`
    pub fn from_config(
        config: &Config,
        provider: Box<dyn MediaInfoProvider>,
        oracle: Box<dyn BlacklistOracle>,
        sink: Box<dyn ChatboxSink>,
    ) -> Self {
        let source = if config.use_text_file {
            Source::TextFile(TextFileMode::new(
                config.text_file_location.clone(),
                config.text_file_update_always,
            ))
        } else {
            Source::Media {
                provider,
                oracle,
                machine: NowPlayingStateMachine::new(config),
            }
        };
        Self::new(source, sink)
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Run one tick. Never fails; problems are logged and the tick skipped.
    pub fn tick(&mut self) -> TickOutcome {
        let message = match &mut self.source {
            Source::TextFile(mode) => {
                if !self.announced {
                    self.announced = true;
                    info!("Watching the text file at {} and displaying it", mode.path().display());
                }

                match mode.tick() {
                    Ok(Some(message)) => {
                        if message.is_new {
                            info!("{}", message.text);
                        }
                        Some(message.text)
                    }
                    Ok(None) => None,
                    Err(e) => {
                        warn!("Failed to read {}: {}", mode.path().display(), e);
                        return TickOutcome::Skipped;
                    }
                }
            }
            Source::Media {
                provider,
                oracle,
                machine,
            } => {
                let snapshot = match provider.poll() {
                    Ok(snapshot) => snapshot,
                    Err(ProviderError::NoMediaSession) => {
                        machine.on_idle();
                        return TickOutcome::Skipped;
                    }
                    Err(e) => {
                        warn!("Unexpected media provider error: {:?}", e);
                        machine.on_idle();
                        return TickOutcome::Skipped;
                    }
                };

                let decision = match oracle.evaluate() {
                    Ok(decision) => decision,
                    Err(e) => {
                        warn!("Blacklist check failed: {:#}", e);
                        return TickOutcome::Skipped;
                    }
                };

                machine.on_snapshot(&snapshot, &decision)
            }
        };

        let Some(message) = message else {
            return TickOutcome::Quiet;
        };

        match self.sink.send_chatbox(&message) {
            Ok(()) => {
                debug!("Sent chatbox message ({} chars)", message.chars().count());
                TickOutcome::Sent(message)
            }
            Err(e) => {
                warn!("{}", e);
                TickOutcome::DispatchFailed(message)
            }
        }
    }
}
