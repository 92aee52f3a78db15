//! The vocabulary of primitive actions the engine asks the host to perform.
//!
//! Every action may be invoked with a repeat count; the host runs it that
//! many times in one batch. Cursor and selection motions work in grapheme
//! columns. Selection motions extend the host selection from its anchor, or
//! from the cursor when no selection is active.

use crate::types::{Motion, Operator};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostAction {
    // Cursor motions. Left/right stay on the current line.
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    MoveWordForward,
    MoveWordBackward,
    MoveWordEnd,
    MoveLineStart,
    MoveFirstNonBlank,
    /// Past the last character of the line, before its newline.
    MoveLineEnd,
    MoveBufferStart,
    MoveBufferEnd,

    // Selection-extending motions. Left/right cross line ends.
    SelectLeft,
    SelectRight,
    SelectUp,
    SelectDown,
    SelectWordForward,
    SelectWordBackward,
    SelectWordEnd,
    SelectLineStart,
    SelectLineEnd,
    SelectBufferStart,
    SelectBufferEnd,

    // Compound deletes from the cursor.
    DeleteWordForward,
    DeleteWordBackward,
    DeleteToLineEnd,
    DeleteToLineStart,
    DeleteCharForward,
    DeleteCharBackward,

    // Whole lines.
    DeleteLine,
    CopyLine,
    /// Removes the content of the cursor line, keeping the line itself.
    ClearLine,
    OpenLineBelow,
    OpenLineAbove,
    JoinLines,

    // Clipboard.
    Cut,
    Copy,
    /// Characterwise paste after the cursor.
    Paste,
    /// Characterwise paste at the cursor.
    PasteBefore,
    PasteLineBelow,
    PasteLineAbove,

    Undo,
    Redo,

    // Files, buffers and windows.
    Save,
    SaveAs(String),
    SaveAll,
    Edit(String),
    Revert,
    NewBuffer,
    /// Closes the current window. Closing the last one quits.
    Close,
    CloseOthers,
    QuitAll,
    NextBuffer,
    PreviousBuffer,
    SwitchBuffer(String),
    DeleteBuffer(Option<String>),
    SplitHorizontal(Option<String>),
    SplitVertical(Option<String>),
    ShowFileInfo,
    ShowHelp(Option<String>),
}

impl Motion {
    /// The plain cursor movement for this motion.
    pub fn cursor_action(self) -> HostAction {
        match self {
            Motion::Left => HostAction::MoveLeft,
            Motion::Right => HostAction::MoveRight,
            Motion::Up => HostAction::MoveUp,
            Motion::Down => HostAction::MoveDown,
            Motion::WordForward => HostAction::MoveWordForward,
            Motion::WordBackward => HostAction::MoveWordBackward,
            Motion::WordEnd => HostAction::MoveWordEnd,
            Motion::LineStart => HostAction::MoveLineStart,
            Motion::FirstNonBlank => HostAction::MoveFirstNonBlank,
            Motion::LineEnd => HostAction::MoveLineEnd,
            Motion::BufferStart => HostAction::MoveBufferStart,
            Motion::BufferEnd => HostAction::MoveBufferEnd,
        }
    }

    /// The selection-extending equivalent, if the host has one.
    pub fn selection_action(self) -> Option<HostAction> {
        let action = match self {
            Motion::Left => HostAction::SelectLeft,
            Motion::Right => HostAction::SelectRight,
            Motion::Up => HostAction::SelectUp,
            Motion::Down => HostAction::SelectDown,
            Motion::WordForward => HostAction::SelectWordForward,
            Motion::WordBackward => HostAction::SelectWordBackward,
            Motion::WordEnd => HostAction::SelectWordEnd,
            Motion::LineStart => HostAction::SelectLineStart,
            Motion::LineEnd => HostAction::SelectLineEnd,
            Motion::BufferStart => HostAction::SelectBufferStart,
            Motion::BufferEnd => HostAction::SelectBufferEnd,
            Motion::FirstNonBlank => return None,
        };
        Some(action)
    }
}

/// The direct host action for an `(operator, motion)` pair, if one exists.
///
/// Change shares the delete action; the caller enters insert mode afterwards.
pub fn compound_action(operator: Operator, motion: Motion) -> Option<HostAction> {
    if !operator.mutates() {
        return None;
    }
    match motion {
        Motion::WordForward => Some(HostAction::DeleteWordForward),
        Motion::WordBackward => Some(HostAction::DeleteWordBackward),
        Motion::LineEnd => Some(HostAction::DeleteToLineEnd),
        Motion::LineStart => Some(HostAction::DeleteToLineStart),
        _ => None,
    }
}
