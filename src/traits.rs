use std::ops::Range;

use async_trait::async_trait;

use crate::action::HostAction;
use crate::error::HostError;
use crate::keymap::ModeKeymap;
use crate::types::{Mode, Position, Selection, Status};

/// Text returned by [`Host::read_text`].
///
/// Hosts may widen or narrow the requested range to char boundaries; `start`
/// is the byte offset of the first byte of `text` in the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSlice {
    pub start: usize,
    pub text: String,
}

impl TextSlice {
    /// Translates a buffer offset into an index into `text`.
    pub fn local(&self, offset: usize) -> Option<usize> {
        offset
            .checked_sub(self.start)
            .filter(|i| *i <= self.text.len() && self.text.is_char_boundary(*i))
    }
}

/// The editor the engine drives.
///
/// Offsets are byte offsets into the buffer. The host owns text storage,
/// clipboard, undo history and rendering; the engine only issues the calls
/// below. Reads are asynchronous because the host may need to fetch text
/// from another task; the engine never has more than one read in flight.
#[async_trait(?Send)]
pub trait Host {
    /// Runs a primitive action `count` times (count >= 1).
    fn invoke(&mut self, action: &HostAction, count: u32) -> Result<(), HostError>;

    fn cursor(&self) -> usize;
    fn cursor_position(&self) -> Position;
    /// Moves the cursor and collapses any selection.
    fn set_cursor(&mut self, offset: usize);

    fn buffer_len(&self) -> usize;

    /// The byte range of the active selection, if any.
    fn selection(&self) -> Option<Range<usize>>;
    fn set_selection(&mut self, selection: Option<Selection>);

    fn delete_range(&mut self, range: Range<usize>) -> Result<(), HostError>;
    /// Inserts `text` at `at` without moving the cursor.
    fn insert_text(&mut self, at: usize, text: &str) -> Result<(), HostError>;

    async fn read_text(&self, range: Range<usize>) -> Result<TextSlice, HostError>;

    /// Called once per mode when the engine is activated.
    fn register_keymap(&mut self, keymap: &ModeKeymap);
    fn set_active_keymap(&mut self, mode: Mode);

    /// Opens the `:` command line. The confirmed text comes back through
    /// [`Engine::submit_command_line`](crate::Engine::submit_command_line).
    fn start_prompt(&mut self, prompt: &str);
    fn set_status(&mut self, status: Status);

    /// Whether the current buffer has unsaved changes.
    fn is_modified(&self) -> bool;
}
