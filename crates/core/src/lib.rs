pub mod config;
pub mod errors;
pub mod format;
pub mod models;
pub mod position;
pub mod state_machine;
pub mod text_file;
pub mod ticker;
pub mod traits;

pub use config::Config;
pub use errors::*;
pub use models::*;
pub use position::{PositionSmoother, TICK_INTERVAL};
pub use state_machine::{DisplayState, NowPlayingStateMachine};
pub use text_file::{TextFileMode, TextFileState};
pub use ticker::{Source, TickOutcome, Ticker};
pub use traits::*;
