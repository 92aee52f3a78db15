//! Declarative per-mode keymaps and the typed dispatch table built from them.
//!
//! Each mode declares its bindings as static groups. [`Keymaps::new`] folds
//! them once into a `(Mode, KeyEvent) -> Handler` table; lookups fall back to
//! the mode's parent when a key has no binding of its own.

use std::collections::HashMap;

use crate::key::KeyEvent;
use crate::types::{
    FindKind, Mode, Motion, Operator, TextObjectKind, TextObjectModifier, VisualKind,
};

/// How an insert session is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InsertEntry {
    /// `i`
    Before,
    /// `a`
    After,
    /// `I`
    LineStart,
    /// `A`
    LineEnd,
    /// `o`
    OpenBelow,
    /// `O`
    OpenAbove,
}

/// Everything a key can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handler {
    Digit(u8),
    Motion(Motion),
    /// First `g` of `gg`.
    GPrefix,
    Operator(Operator),
    DeleteCharForward,
    DeleteCharBackward,
    SubstituteChar,
    SubstituteLine,
    DeleteToLineEnd,
    ChangeToLineEnd,
    JoinLines,
    Paste,
    PasteBefore,
    Undo,
    Redo,
    Insert(InsertEntry),
    RepeatChange,
    BeginFind(FindKind),
    FindTarget(char),
    RepeatFind,
    RepeatFindReversed,
    EnterVisual(VisualKind),
    TextObjectModifier(TextObjectModifier),
    TextObject(TextObjectKind),
    CommandLine,
    Cancel,
}

/// A single binding in a mode's keymap.
#[derive(Debug, Clone, Copy)]
pub enum Binding {
    Key(KeyEvent, Handler),
    /// Any key that types a character, e.g. the target of `f`.
    AnyChar(fn(char) -> Handler),
}

/// The keymap registered with the host for one mode.
#[derive(Debug, Clone, Copy)]
pub struct ModeKeymap {
    pub mode: Mode,
    /// Typed characters must not reach the buffer while this mode is active.
    pub read_only: bool,
    /// Consulted for keys this mode does not bind.
    pub parent: Option<Mode>,
    pub groups: &'static [&'static [Binding]],
}

impl ModeKeymap {
    pub fn bindings(&self) -> impl Iterator<Item = &'static Binding> + '_ {
        self.groups.iter().flat_map(|group| group.iter())
    }
}

const fn key(c: char, handler: Handler) -> Binding {
    Binding::Key(KeyEvent::char(c), handler)
}

const fn ctrl(c: char, handler: Handler) -> Binding {
    Binding::Key(KeyEvent::ctrl(c), handler)
}

const CANCEL: &[Binding] = &[Binding::Key(KeyEvent::ESC, Handler::Cancel)];

const DIGITS: &[Binding] = &[
    key('0', Handler::Digit(0)),
    key('1', Handler::Digit(1)),
    key('2', Handler::Digit(2)),
    key('3', Handler::Digit(3)),
    key('4', Handler::Digit(4)),
    key('5', Handler::Digit(5)),
    key('6', Handler::Digit(6)),
    key('7', Handler::Digit(7)),
    key('8', Handler::Digit(8)),
    key('9', Handler::Digit(9)),
];

const MOTIONS: &[Binding] = &[
    key('h', Handler::Motion(Motion::Left)),
    key('l', Handler::Motion(Motion::Right)),
    key('j', Handler::Motion(Motion::Down)),
    key('k', Handler::Motion(Motion::Up)),
    key('w', Handler::Motion(Motion::WordForward)),
    key('b', Handler::Motion(Motion::WordBackward)),
    key('e', Handler::Motion(Motion::WordEnd)),
    key('^', Handler::Motion(Motion::FirstNonBlank)),
    key('$', Handler::Motion(Motion::LineEnd)),
    key('G', Handler::Motion(Motion::BufferEnd)),
];

const OPERATORS: &[Binding] = &[
    key('d', Handler::Operator(Operator::Delete)),
    key('c', Handler::Operator(Operator::Change)),
    key('y', Handler::Operator(Operator::Yank)),
];

const VISUAL_ENTRY: &[Binding] = &[
    key('v', Handler::EnterVisual(VisualKind::CharWise)),
    key('V', Handler::EnterVisual(VisualKind::LineWise)),
    ctrl('v', Handler::EnterVisual(VisualKind::BlockWise)),
];

const NORMAL: &[Binding] = &[
    key('g', Handler::GPrefix),
    key('x', Handler::DeleteCharForward),
    key('X', Handler::DeleteCharBackward),
    key('s', Handler::SubstituteChar),
    key('S', Handler::SubstituteLine),
    key('D', Handler::DeleteToLineEnd),
    key('C', Handler::ChangeToLineEnd),
    key('J', Handler::JoinLines),
    key('p', Handler::Paste),
    key('P', Handler::PasteBefore),
    key('u', Handler::Undo),
    ctrl('r', Handler::Redo),
    key('i', Handler::Insert(InsertEntry::Before)),
    key('a', Handler::Insert(InsertEntry::After)),
    key('I', Handler::Insert(InsertEntry::LineStart)),
    key('A', Handler::Insert(InsertEntry::LineEnd)),
    key('o', Handler::Insert(InsertEntry::OpenBelow)),
    key('O', Handler::Insert(InsertEntry::OpenAbove)),
    key('.', Handler::RepeatChange),
    key('f', Handler::BeginFind(FindKind::Forward)),
    key('t', Handler::BeginFind(FindKind::TillForward)),
    key('F', Handler::BeginFind(FindKind::Backward)),
    key('T', Handler::BeginFind(FindKind::TillBackward)),
    key(';', Handler::RepeatFind),
    key(',', Handler::RepeatFindReversed),
    key(':', Handler::CommandLine),
];

const OPERATOR_PENDING: &[Binding] = &[
    key('i', Handler::TextObjectModifier(TextObjectModifier::Inner)),
    key('a', Handler::TextObjectModifier(TextObjectModifier::Around)),
];

const TEXT_OBJECTS: &[Binding] = &[
    key('w', Handler::TextObject(TextObjectKind::Word)),
    key('W', Handler::TextObject(TextObjectKind::BigWord)),
    key('"', Handler::TextObject(TextObjectKind::Quote('"'))),
    key('\'', Handler::TextObject(TextObjectKind::Quote('\''))),
    key('`', Handler::TextObject(TextObjectKind::Quote('`'))),
    key('(', Handler::TextObject(TextObjectKind::Bracket('('))),
    key(')', Handler::TextObject(TextObjectKind::Bracket('('))),
    key('b', Handler::TextObject(TextObjectKind::Bracket('('))),
    key('{', Handler::TextObject(TextObjectKind::Bracket('{'))),
    key('}', Handler::TextObject(TextObjectKind::Bracket('{'))),
    key('B', Handler::TextObject(TextObjectKind::Bracket('{'))),
    key('[', Handler::TextObject(TextObjectKind::Bracket('['))),
    key(']', Handler::TextObject(TextObjectKind::Bracket('['))),
    key('<', Handler::TextObject(TextObjectKind::Bracket('<'))),
    key('>', Handler::TextObject(TextObjectKind::Bracket('<'))),
];

const FIND_TARGET: &[Binding] = &[Binding::AnyChar(Handler::FindTarget)];

const VISUAL: &[Binding] = &[
    key('g', Handler::GPrefix),
    key('x', Handler::Operator(Operator::Delete)),
    key('s', Handler::Operator(Operator::Change)),
];

/// The static keymap declarations, one per mode.
pub const MODE_KEYMAPS: [ModeKeymap; 8] = [
    ModeKeymap {
        mode: Mode::Normal,
        read_only: true,
        parent: None,
        groups: &[CANCEL, DIGITS, MOTIONS, OPERATORS, VISUAL_ENTRY, NORMAL],
    },
    ModeKeymap {
        mode: Mode::Insert,
        read_only: false,
        parent: None,
        groups: &[CANCEL],
    },
    ModeKeymap {
        mode: Mode::OperatorPending,
        read_only: true,
        parent: None,
        groups: &[CANCEL, DIGITS, MOTIONS, OPERATORS, OPERATOR_PENDING],
    },
    ModeKeymap {
        mode: Mode::FindChar,
        read_only: true,
        parent: None,
        groups: &[CANCEL, FIND_TARGET],
    },
    ModeKeymap {
        mode: Mode::Visual(VisualKind::CharWise),
        read_only: true,
        parent: None,
        groups: &[CANCEL, DIGITS, MOTIONS, OPERATORS, VISUAL_ENTRY, VISUAL],
    },
    ModeKeymap {
        mode: Mode::Visual(VisualKind::LineWise),
        read_only: true,
        parent: Some(Mode::Visual(VisualKind::CharWise)),
        groups: &[],
    },
    ModeKeymap {
        mode: Mode::Visual(VisualKind::BlockWise),
        read_only: true,
        parent: Some(Mode::Visual(VisualKind::CharWise)),
        groups: &[],
    },
    ModeKeymap {
        mode: Mode::TextObject,
        read_only: true,
        parent: None,
        groups: &[CANCEL, TEXT_OBJECTS],
    },
];

/// Typed dispatch table resolved once from [`MODE_KEYMAPS`].
#[derive(Debug, Clone)]
pub struct Keymaps {
    keys: HashMap<(Mode, KeyEvent), Handler>,
    any_char: HashMap<Mode, fn(char) -> Handler>,
    parents: HashMap<Mode, Mode>,
}

impl Default for Keymaps {
    fn default() -> Self {
        Self::new(&MODE_KEYMAPS)
    }
}

impl Keymaps {
    pub fn new(declarations: &[ModeKeymap]) -> Self {
        let mut keys = HashMap::new();
        let mut any_char = HashMap::new();
        let mut parents = HashMap::new();
        for map in declarations {
            if let Some(parent) = map.parent {
                parents.insert(map.mode, parent);
            }
            for binding in map.bindings() {
                match *binding {
                    Binding::Key(key, handler) => {
                        keys.insert((map.mode, key), handler);
                    }
                    Binding::AnyChar(make) => {
                        any_char.insert(map.mode, make);
                    }
                }
            }
        }
        Self {
            keys,
            any_char,
            parents,
        }
    }

    /// Finds the handler for `key` in `mode`, walking up parent modes.
    pub fn resolve(&self, mode: Mode, key: KeyEvent) -> Option<Handler> {
        let mut current = Some(mode);
        while let Some(mode) = current {
            if let Some(handler) = self.keys.get(&(mode, key)) {
                return Some(*handler);
            }
            if let (Some(make), Some(c)) = (self.any_char.get(&mode), key.typed_char()) {
                return Some(make(c));
            }
            current = self.parents.get(&mode).copied();
        }
        None
    }
}
