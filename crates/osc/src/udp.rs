//! Fire-and-forget chatbox dispatch over UDP

use crate::message::{OscArg, OscMessage};
use std::io;
use std::net::{SocketAddr, UdpSocket};
use tracing::debug;
use vrcnp_core::{ChatboxSink, TransportError};

/// Where VRChat listens for OSC input
pub const DEFAULT_OSC_TARGET: &str = "127.0.0.1:9000";

/// OSC address of the chatbox text input
pub const CHATBOX_INPUT: &str = "/chatbox/input";

/// `/chatbox/input` arguments: text, send immediately, play notification sound
pub fn chatbox_message(text: &str) -> OscMessage {
    OscMessage::new(
        CHATBOX_INPUT,
        vec![OscArg::Str(text.to_string()), OscArg::Bool(true), OscArg::Bool(false)],
    )
}

/// Sends chatbox messages as single datagrams. No acknowledgement, no retry.
#[derive(Debug)]
pub struct UdpChatbox {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpChatbox {
    pub fn new(target: SocketAddr) -> io::Result<Self> {
        let bind_addr: SocketAddr = if target.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(bind_addr)?;
        debug!("OSC socket bound to {}, sending to {}", socket.local_addr()?, target);
        Ok(Self { socket, target })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl ChatboxSink for UdpChatbox {
    fn send_chatbox(&self, text: &str) -> Result<(), TransportError> {
        let payload = chatbox_message(text).encode().map_err(TransportError::new)?;
        self.socket
            .send_to(&payload, self.target)
            .map_err(TransportError::new)?;
        Ok(())
    }
}
