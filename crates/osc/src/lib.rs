//! OSC transport for the VRChat chatbox

pub mod message;
pub mod udp;

pub use message::{OscArg, OscError, OscMessage};
pub use udp::{chatbox_message, UdpChatbox, CHATBOX_INPUT, DEFAULT_OSC_TARGET};
