//! A vi-style modal command engine.
//!
//! The engine turns keystrokes into calls on a [`Host`] editor: cursor and
//! selection primitives, text reads, deletes and inserts, clipboard and file
//! actions. It owns only modal state (mode, counts, pending operators, the
//! last change and the last find) and never stores buffer text.

pub mod action;
mod compose;
pub mod config;
mod count;
pub mod engine;
pub mod error;
pub mod ex;
pub mod find;
pub mod key;
pub mod keymap;
mod repeat;
pub mod text_object;
pub mod traits;
pub mod types;
mod visual;

pub use crate::action::HostAction;
pub use crate::config::EngineConfig;
pub use crate::engine::{Engine, EngineBuilder, EngineSnapshot, KeyOutcome};
pub use crate::error::{ConfigError, EngineError, ExError, HostError};
pub use crate::key::{KeyCode, KeyEvent, Modifiers};
pub use crate::keymap::{Binding, Handler, InsertEntry, Keymaps, MODE_KEYMAPS, ModeKeymap};
pub use crate::traits::{Host, TextSlice};
pub use crate::types::{
    ChangeRecord, FindKind, FindTarget, LineOp, Mode, Motion, Operator, Position, PromptResult,
    Selection, Status, TextObjectKind, TextObjectModifier, VisualKind,
};
