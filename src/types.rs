use crate::action::HostAction;

/// A position within a text buffer.
///
/// Positions are zero-indexed and column values are counted in grapheme clusters,
/// not bytes or chars. This ensures correct handling of emoji and combining characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// Zero-based line number.
    pub line: u32,
    /// Zero-based column position in grapheme clusters.
    pub col: u32,
}

impl Position {
    /// The origin position (0, 0).
    pub const ZERO: Position = Position { line: 0, col: 0 };
}

/// The current mode of the engine.
///
/// Exactly one mode is active at a time. Each mode owns a keymap registered
/// with the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Navigation, operators and mode switches.
    Normal,
    /// Typing text; the host inserts everything except `Esc`.
    Insert,
    /// An operator is waiting for its motion or text object.
    OperatorPending,
    /// `f`/`t`/`F`/`T` is waiting for its target character.
    FindChar,
    /// A selection is active.
    Visual(VisualKind),
    /// An operator plus `i`/`a` is waiting for the object key.
    TextObject,
}

impl Mode {
    /// Every mode, in registration order.
    pub const ALL: [Mode; 8] = [
        Mode::Normal,
        Mode::Insert,
        Mode::OperatorPending,
        Mode::FindChar,
        Mode::Visual(VisualKind::CharWise),
        Mode::Visual(VisualKind::LineWise),
        Mode::Visual(VisualKind::BlockWise),
        Mode::TextObject,
    ];

    pub fn is_visual(self) -> bool {
        matches!(self, Mode::Visual(_))
    }

    /// Whether a pending count survives entering this mode.
    pub fn preserves_count(self) -> bool {
        matches!(self, Mode::OperatorPending | Mode::TextObject | Mode::Visual(_))
    }

    /// Whether this mode keeps the pending operator alive.
    pub fn holds_operator(self) -> bool {
        matches!(self, Mode::OperatorPending | Mode::TextObject)
    }

    /// Human readable label shown on the status line.
    pub fn label(self) -> &'static str {
        match self {
            Mode::Normal => "NORMAL",
            Mode::Insert => "INSERT",
            Mode::OperatorPending => "OPERATOR",
            Mode::FindChar => "FIND",
            Mode::Visual(VisualKind::CharWise) => "VISUAL",
            Mode::Visual(VisualKind::LineWise) => "VISUAL LINE",
            Mode::Visual(VisualKind::BlockWise) => "VISUAL BLOCK",
            Mode::TextObject => "TEXT OBJECT",
        }
    }
}

/// The type of visual selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualKind {
    /// Character-wise selection (v).
    CharWise,
    /// Line-wise selection (V).
    LineWise,
    /// Rectangular selection (Ctrl-v).
    BlockWise,
}

/// A selection the engine asks the host to display.
///
/// The anchor stays where the selection began and the head follows the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Position,
    pub head: Position,
    pub kind: VisualKind,
}

/// An operator that needs a span to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Delete,
    Change,
    Yank,
}

impl Operator {
    /// Whether applying this operator mutates the buffer and so is repeatable.
    pub fn mutates(self) -> bool {
        !matches!(self, Operator::Yank)
    }

    pub fn key(self) -> char {
        match self {
            Operator::Delete => 'd',
            Operator::Change => 'c',
            Operator::Yank => 'y',
        }
    }
}

/// Cursor motions the engine knows how to compose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    WordForward,
    WordBackward,
    WordEnd,
    LineStart,
    FirstNonBlank,
    LineEnd,
    BufferStart,
    BufferEnd,
}

/// The four single-character find motions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FindKind {
    /// `f`: forward, onto the match.
    Forward,
    /// `t`: forward, one short of the match.
    TillForward,
    /// `F`: backward, onto the match.
    Backward,
    /// `T`: backward, one short of the match.
    TillBackward,
}

impl FindKind {
    pub fn reversed(self) -> Self {
        match self {
            FindKind::Forward => FindKind::Backward,
            FindKind::Backward => FindKind::Forward,
            FindKind::TillForward => FindKind::TillBackward,
            FindKind::TillBackward => FindKind::TillForward,
        }
    }

    pub fn is_forward(self) -> bool {
        matches!(self, FindKind::Forward | FindKind::TillForward)
    }

    pub fn is_till(self) -> bool {
        matches!(self, FindKind::TillForward | FindKind::TillBackward)
    }

    pub fn key(self) -> char {
        match self {
            FindKind::Forward => 'f',
            FindKind::TillForward => 't',
            FindKind::Backward => 'F',
            FindKind::TillBackward => 'T',
        }
    }
}

/// A completed find motion, remembered for `;` and `,`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindTarget {
    pub kind: FindKind,
    pub ch: char,
}

/// Whether a text object includes its delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextObjectModifier {
    /// `i`: delimiters and surrounding blanks excluded.
    Inner,
    /// `a`: delimiters (or trailing blanks for words) included.
    Around,
}

/// The lexical spans a text object can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextObjectKind {
    /// `w`: a run of word, punctuation or blank characters.
    Word,
    /// `W`: a run of non-blank characters.
    BigWord,
    /// `"`, `'` or `` ` ``.
    Quote(char),
    /// A bracket pair, stored as its opening character.
    Bracket(char),
}

/// Linewise operations triggered by doubling an operator key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineOp {
    Delete,
    Change,
}

/// The last buffer-mutating command, kept for `.`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeRecord {
    Simple {
        action: HostAction,
        count: u32,
        inserted_text: Option<String>,
    },
    LineOp {
        op: LineOp,
        count: u32,
        inserted_text: Option<String>,
    },
    OperatorMotion {
        operator: Operator,
        motion: Motion,
        count: u32,
        inserted_text: Option<String>,
    },
    OperatorTextObject {
        operator: Operator,
        modifier: TextObjectModifier,
        object: TextObjectKind,
        inserted_text: Option<String>,
    },
    Insert {
        inserted_text: String,
    },
}

impl ChangeRecord {
    /// Attaches text typed during the insert session this change opened.
    pub(crate) fn attach_inserted(&mut self, text: String) {
        match self {
            ChangeRecord::Simple { inserted_text, .. }
            | ChangeRecord::LineOp { inserted_text, .. }
            | ChangeRecord::OperatorMotion { inserted_text, .. }
            | ChangeRecord::OperatorTextObject { inserted_text, .. } => {
                *inserted_text = Some(text);
            }
            ChangeRecord::Insert { inserted_text } => inserted_text.push_str(&text),
        }
    }

    pub fn inserted_text(&self) -> Option<&str> {
        match self {
            ChangeRecord::Simple { inserted_text, .. }
            | ChangeRecord::LineOp { inserted_text, .. }
            | ChangeRecord::OperatorMotion { inserted_text, .. }
            | ChangeRecord::OperatorTextObject { inserted_text, .. } => inserted_text.as_deref(),
            ChangeRecord::Insert { inserted_text } => Some(inserted_text),
        }
    }
}

/// What the engine shows on the host status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Mode indicator, e.g. `-- VISUAL LINE -- 3`.
    Mode(String),
    /// Informational result of a command.
    Message(String),
    /// A user-facing error.
    Error(String),
}

/// The outcome of a `:` prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptResult {
    Confirmed(String),
    Cancelled,
}
