//! OSC 1.0 message encoding
//!
//! Only the subset VRChat listens for: a single message (no bundles) with
//! int32, float32, string and boolean arguments. All numbers are big-endian
//! and every string is NUL terminated and padded to a multiple of 4 bytes.

/// Errors raised while encoding or decoding OSC packets
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OscError {
    #[error("OSC address must start with '/': {0:?}")]
    InvalidAddress(String),
    #[error("OSC strings cannot contain NUL bytes")]
    NulInString,
    #[error("truncated OSC packet")]
    Truncated,
    #[error("unsupported OSC type tag '{0}'")]
    UnsupportedTag(char),
    #[error("OSC string is not valid UTF-8")]
    InvalidUtf8,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OscArg {
    Int(i32),
    Float(f32),
    Str(String),
    Bool(bool),
}

impl OscArg {
    fn type_tag(&self) -> char {
        match self {
            OscArg::Int(_) => 'i',
            OscArg::Float(_) => 'f',
            OscArg::Str(_) => 's',
            OscArg::Bool(true) => 'T',
            OscArg::Bool(false) => 'F',
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OscMessage {
    pub addr: String,
    pub args: Vec<OscArg>,
}

impl OscMessage {
    pub fn new(addr: impl Into<String>, args: Vec<OscArg>) -> Self {
        Self {
            addr: addr.into(),
            args,
        }
    }

    /// Pack the message into a datagram payload
    pub fn encode(&self) -> Result<Vec<u8>, OscError> {
        if !self.addr.starts_with('/') {
            return Err(OscError::InvalidAddress(self.addr.clone()));
        }

        let mut bytes = Vec::with_capacity(64);
        write_padded_str(&mut bytes, &self.addr)?;

        let tags: String = std::iter::once(',').chain(self.args.iter().map(OscArg::type_tag)).collect();
        write_padded_str(&mut bytes, &tags)?;

        for arg in &self.args {
            match arg {
                OscArg::Int(v) => bytes.extend_from_slice(&v.to_be_bytes()),
                OscArg::Float(v) => bytes.extend_from_slice(&v.to_be_bytes()),
                OscArg::Str(s) => write_padded_str(&mut bytes, s)?,
                // Booleans live entirely in the type tag
                OscArg::Bool(_) => {}
            }
        }

        Ok(bytes)
    }

    /// Parse a datagram payload produced by [`OscMessage::encode`]
    pub fn decode(bytes: &[u8]) -> Result<Self, OscError> {
        let mut cursor = 0;
        let addr = read_padded_str(bytes, &mut cursor)?;
        if !addr.starts_with('/') {
            return Err(OscError::InvalidAddress(addr));
        }

        let tags = read_padded_str(bytes, &mut cursor)?;
        let tags = tags.strip_prefix(',').ok_or(OscError::Truncated)?;

        let mut args = Vec::with_capacity(tags.len());
        for tag in tags.chars() {
            let arg = match tag {
                'i' => OscArg::Int(i32::from_be_bytes(read_word(bytes, &mut cursor)?)),
                'f' => OscArg::Float(f32::from_be_bytes(read_word(bytes, &mut cursor)?)),
                's' => OscArg::Str(read_padded_str(bytes, &mut cursor)?),
                'T' => OscArg::Bool(true),
                'F' => OscArg::Bool(false),
                other => return Err(OscError::UnsupportedTag(other)),
            };
            args.push(arg);
        }

        Ok(Self { addr, args })
    }
}

fn write_padded_str(bytes: &mut Vec<u8>, s: &str) -> Result<(), OscError> {
    if s.as_bytes().contains(&0) {
        return Err(OscError::NulInString);
    }
    bytes.extend_from_slice(s.as_bytes());
    // At least one NUL, then up to the next 4-byte boundary
    let padding = 4 - s.len() % 4;
    bytes.extend(std::iter::repeat(0u8).take(padding));
    Ok(())
}

fn read_padded_str(bytes: &[u8], cursor: &mut usize) -> Result<String, OscError> {
    let rest = bytes.get(*cursor..).ok_or(OscError::Truncated)?;
    let len = rest.iter().position(|&b| b == 0).ok_or(OscError::Truncated)?;
    let s = std::str::from_utf8(&rest[..len]).map_err(|_| OscError::InvalidUtf8)?;

    let padded = len + (4 - len % 4);
    if padded > rest.len() {
        return Err(OscError::Truncated);
    }
    *cursor += padded;
    Ok(s.to_string())
}

fn read_word(bytes: &[u8], cursor: &mut usize) -> Result<[u8; 4], OscError> {
    let word = bytes
        .get(*cursor..*cursor + 4)
        .ok_or(OscError::Truncated)?
        .try_into()
        .map_err(|_| OscError::Truncated)?;
    *cursor += 4;
    Ok(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chatbox_message_layout() {
        let msg = OscMessage::new(
            "/chatbox/input",
            vec![OscArg::Str("hi".to_string()), OscArg::Bool(true), OscArg::Bool(false)],
        );
        let bytes = msg.encode().unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(b"/chatbox/input\0\0"); // 14 bytes + 2 padding
        expected.extend_from_slice(b",sTF\0\0\0\0"); // 4 bytes + full NUL word
        expected.extend_from_slice(b"hi\0\0");
        assert_eq!(bytes, expected);
        assert_eq!(bytes.len() % 4, 0);
    }

    #[test]
    fn test_numbers_are_big_endian() {
        let bytes = OscMessage::new("/a", vec![OscArg::Int(1), OscArg::Float(1.0)])
            .encode()
            .unwrap();
        assert_eq!(&bytes[8..12], &[0, 0, 0, 1]);
        assert_eq!(&bytes[12..16], &[0x3f, 0x80, 0, 0]);
    }

    #[test]
    fn test_invalid_messages_rejected() {
        assert_eq!(
            OscMessage::new("chatbox", vec![]).encode(),
            Err(OscError::InvalidAddress("chatbox".to_string()))
        );
        assert_eq!(
            OscMessage::new("/a", vec![OscArg::Str("nul\0".to_string())]).encode(),
            Err(OscError::NulInString)
        );
    }

    #[test]
    fn test_decode_chatbox_message() {
        let msg = OscMessage::new(
            "/chatbox/input",
            vec![
                OscArg::Str("( NP: Ólafur Arnalds - saman )".to_string()),
                OscArg::Bool(true),
                OscArg::Bool(false),
            ],
        );
        assert_eq!(OscMessage::decode(&msg.encode().unwrap()).unwrap(), msg);
    }

    #[test]
    fn test_decode_truncated() {
        let bytes = OscMessage::new("/a", vec![OscArg::Int(7)]).encode().unwrap();
        assert_eq!(OscMessage::decode(&bytes[..bytes.len() - 1]), Err(OscError::Truncated));
        assert_eq!(OscMessage::decode(b"/abc"), Err(OscError::Truncated));
    }
}
