/// Key codes representing individual keys on the keyboard.
///
/// This enum provides a platform-agnostic representation of keys.
/// Hosts should map their platform-specific key events to these codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A character key. Shifted letters arrive as their uppercase form
    /// without the SHIFT modifier, so `A` is `Char('A')`.
    Char(char),
    /// The Escape key, used to exit modes and cancel pending commands.
    Esc,
    /// The Enter/Return key.
    Enter,
    /// The Backspace key.
    Backspace,
}

bitflags::bitflags! {
    /// Keyboard modifier flags.
    ///
    /// These can be combined to represent multiple modifiers held simultaneously.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
        const META  = 0b1000;
    }
}

/// A key press event with optional modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    /// The key that was pressed.
    pub code: KeyCode,
    /// Modifier keys held during the key press.
    pub mods: Modifiers,
}

impl KeyEvent {
    /// The Escape key with no modifiers.
    pub const ESC: KeyEvent = KeyEvent {
        code: KeyCode::Esc,
        mods: Modifiers::empty(),
    };

    /// An unmodified character key.
    pub const fn char(c: char) -> Self {
        Self {
            code: KeyCode::Char(c),
            mods: Modifiers::empty(),
        }
    }

    /// A character key with CTRL held, e.g. `Ctrl-r`.
    pub const fn ctrl(c: char) -> Self {
        Self {
            code: KeyCode::Char(c),
            mods: Modifiers::CTRL,
        }
    }

    /// The character this key produces when typed, if any.
    ///
    /// Keys chorded with CTRL, ALT or META produce nothing.
    pub fn typed_char(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(c) if !self.mods.intersects(Modifiers::CTRL | Modifiers::ALT | Modifiers::META) => {
                Some(c)
            }
            _ => None,
        }
    }

    /// Parses a sequence in angle-bracket notation into key events.
    ///
    /// Plain characters map to themselves; `<Esc>`, `<CR>`, `<BS>`, `<lt>`
    /// and `<C-x>` are recognised. An unterminated `<` is taken literally.
    pub fn parse_sequence(keys: &str) -> Vec<KeyEvent> {
        let mut out = Vec::new();
        let mut rest = keys;
        while let Some(c) = rest.chars().next() {
            if c == '<'
                && let Some(close) = rest.find('>')
                && let Some(key) = Self::parse_named(&rest[1..close])
            {
                out.push(key);
                rest = &rest[close + 1..];
                continue;
            }
            out.push(KeyEvent::char(c));
            rest = &rest[c.len_utf8()..];
        }
        out
    }

    fn parse_named(name: &str) -> Option<KeyEvent> {
        let key = match name {
            "Esc" | "esc" => KeyEvent::ESC,
            "CR" | "Enter" => KeyEvent {
                code: KeyCode::Enter,
                mods: Modifiers::empty(),
            },
            "BS" => KeyEvent {
                code: KeyCode::Backspace,
                mods: Modifiers::empty(),
            },
            "lt" => KeyEvent::char('<'),
            _ => {
                let c = name.strip_prefix("C-")?;
                let mut chars = c.chars();
                let (Some(ch), None) = (chars.next(), chars.next()) else {
                    return None;
                };
                KeyEvent::ctrl(ch)
            }
        };
        Some(key)
    }
}
