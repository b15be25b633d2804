//! Text file mode: show whatever another program writes to a file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextFileState {
    pub last_text: String,
}

/// Result of one text file tick that should reach the chatbox
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextFileMessage {
    pub text: String,
    /// `false` for a resend of content that was already logged
    pub is_new: bool,
}

#[derive(Clone, Debug)]
pub struct TextFileMode {
    path: PathBuf,
    update_always: bool,
    state: TextFileState,
}

impl TextFileMode {
    pub fn new(path: impl Into<PathBuf>, update_always: bool) -> Self {
        Self {
            path: path.into(),
            update_always,
            state: TextFileState::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> &TextFileState {
        &self.state
    }

    /// Read the file and decide what to send. A missing file is not an error.
    /// Windows line endings are read as plain `\n`.
    pub fn tick(&mut self) -> io::Result<Option<TextFileMessage>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path)?.replace("\r\n", "\n");
        Ok(self.accept(text))
    }

    fn accept(&mut self, text: String) -> Option<TextFileMessage> {
        let is_new = text != self.state.last_text;
        if !is_new && !self.update_always {
            return None;
        }

        // Blank files keep whatever is already on display
        if text.trim().is_empty() {
            return None;
        }

        self.state.last_text.clone_from(&text);
        Some(TextFileMessage { text, is_new })
    }
}
