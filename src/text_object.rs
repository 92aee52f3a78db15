//! Text-object resolution (`iw`, `a"`, `ib`, ...).
//!
//! [`resolve`] is a pure function over a window of buffer text; the engine
//! reads the window, resolves, then deletes or copies the range.

use std::ops::Range;

use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use crate::action::HostAction;
use crate::engine::{Engine, Run};
use crate::error::EngineError;
use crate::traits::Host;
use crate::types::{ChangeRecord, Mode, Operator, TextObjectKind, TextObjectModifier};

/// Finds the byte range of a text object around `cursor` in `text`.
///
/// Returns `None` when the cursor is not inside such an object.
pub fn resolve(
    text: &str,
    cursor: usize,
    modifier: TextObjectModifier,
    kind: TextObjectKind,
) -> Option<Range<usize>> {
    if cursor > text.len() || !text.is_char_boundary(cursor) {
        return None;
    }
    match kind {
        TextObjectKind::Word => word(text, cursor, modifier, word_class),
        TextObjectKind::BigWord => word(text, cursor, modifier, big_word_class),
        TextObjectKind::Quote(quote) => quoted(text, cursor, modifier, quote),
        TextObjectKind::Bracket(open) => bracketed(text, cursor, modifier, open, closer_for(open)?),
    }
}

pub fn closer_for(open: char) -> Option<char> {
    match open {
        '(' => Some(')'),
        '{' => Some('}'),
        '[' => Some(']'),
        '<' => Some('>'),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Newline,
    Blank,
    Word,
    Punct,
}

fn word_class(c: char) -> Class {
    match c {
        '\n' => Class::Newline,
        c if c.is_whitespace() => Class::Blank,
        c if c.is_ascii_alphanumeric() || c == '_' => Class::Word,
        _ => Class::Punct,
    }
}

fn big_word_class(c: char) -> Class {
    match word_class(c) {
        Class::Punct => Class::Word,
        class => class,
    }
}

/// End of the run of `class` characters starting at `from`.
fn run_end(text: &str, from: usize, class: Class, classify: fn(char) -> Class) -> usize {
    text[from..]
        .char_indices()
        .find(|(_, c)| classify(*c) != class)
        .map_or(text.len(), |(i, _)| from + i)
}

/// Start of the run of `class` characters ending at `to`.
fn run_start(text: &str, to: usize, class: Class, classify: fn(char) -> Class) -> usize {
    text[..to]
        .char_indices()
        .rev()
        .take_while(|(_, c)| classify(*c) == class)
        .last()
        .map_or(to, |(i, _)| i)
}

fn word(
    text: &str,
    cursor: usize,
    modifier: TextObjectModifier,
    classify: fn(char) -> Class,
) -> Option<Range<usize>> {
    let class = classify(text[cursor..].chars().next()?);
    if class == Class::Newline {
        return None;
    }
    let start = run_start(text, cursor, class, classify);
    let end = run_end(text, cursor, class, classify);
    if modifier == TextObjectModifier::Inner {
        return Some(start..end);
    }

    if class == Class::Blank {
        // blanks plus the word after them
        let next = text[end..].chars().next().map(classify);
        return Some(match next {
            Some(next) if next != Class::Newline => start..run_end(text, end, next, classify),
            _ => start..end,
        });
    }
    let trailing = run_end(text, end, Class::Blank, classify);
    if trailing > end {
        Some(start..trailing)
    } else {
        Some(run_start(text, start, Class::Blank, classify)..end)
    }
}

fn quoted(text: &str, cursor: usize, modifier: TextObjectModifier, quote: char) -> Option<Range<usize>> {
    let line_start = text[..cursor].rfind('\n').map_or(0, |i| i + 1);
    let line_end = text[cursor..].find('\n').map_or(text.len(), |i| cursor + i);
    let line = &text[line_start..line_end];

    let mut quotes = Vec::new();
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            quotes.push(line_start + i);
        }
    }

    let width = quote.len_utf8();
    quotes
        .chunks_exact(2)
        .find(|pair| pair[0] <= cursor && cursor <= pair[1])
        .map(|pair| match modifier {
            TextObjectModifier::Inner => pair[0] + width..pair[1],
            TextObjectModifier::Around => pair[0]..pair[1] + width,
        })
}

fn bracketed(
    text: &str,
    cursor: usize,
    modifier: TextObjectModifier,
    open: char,
    close: char,
) -> Option<Range<usize>> {
    let open_at = if text[cursor..].starts_with(open) {
        cursor
    } else {
        let mut depth = 0usize;
        let mut found = None;
        for (i, c) in text[..cursor].char_indices().rev() {
            if c == close {
                depth += 1;
            } else if c == open {
                if depth == 0 {
                    found = Some(i);
                    break;
                }
                depth -= 1;
            }
        }
        found?
    };

    let body = open_at + open.len_utf8();
    let mut depth = 0usize;
    let mut close_at = None;
    for (i, c) in text[body..].char_indices() {
        if c == open {
            depth += 1;
        } else if c == close {
            if depth == 0 {
                close_at = Some(body + i);
                break;
            }
            depth -= 1;
        }
    }
    let close_at = close_at.filter(|at| *at >= cursor)?;

    Some(match modifier {
        TextObjectModifier::Inner => body..close_at,
        TextObjectModifier::Around => open_at..close_at + close.len_utf8(),
    })
}

impl Engine {
    pub(crate) async fn resolve_and_apply<H: Host>(
        &mut self,
        host: &mut H,
        object: TextObjectKind,
    ) -> Result<(), EngineError> {
        let (Some(operator), Some(modifier)) = (self.pending_operator, self.pending_text_object) else {
            return self.transition_to(host, Mode::Normal).await;
        };
        let applied = self
            .apply_text_object(host, operator, modifier, object, Run::Live)
            .await?;
        let next = if applied && operator == Operator::Change {
            Mode::Insert
        } else {
            Mode::Normal
        };
        self.transition_to(host, next).await
    }

    /// Resolves the object around the cursor and applies `operator` to it.
    ///
    /// Returns `false` when nothing matched; the buffer is left untouched.
    pub(crate) async fn apply_text_object<H: Host>(
        &mut self,
        host: &mut H,
        operator: Operator,
        modifier: TextObjectModifier,
        object: TextObjectKind,
        run: Run,
    ) -> Result<bool, EngineError> {
        let Some((slice, local)) = self.read_around_cursor(host).await? else {
            return Ok(false);
        };
        let Some(range) = resolve(&slice.text, local, modifier, object) else {
            debug!(target: "engine.textobj", ?modifier, ?object, "no object at cursor");
            return Ok(false);
        };
        let start = slice.start + range.start;
        let end = slice.start + range.end;
        debug!(target: "engine.textobj", ?operator, ?modifier, ?object, start, end, "resolved");

        if run == Run::Live && operator.mutates() {
            self.repeat.record(
                ChangeRecord::OperatorTextObject {
                    operator,
                    modifier,
                    object,
                    inserted_text: None,
                },
                operator == Operator::Change,
            );
        }

        match operator {
            Operator::Delete | Operator::Change => {
                host.delete_range(start..end)?;
                host.set_cursor(start);
            }
            Operator::Yank => {
                let steps = slice.text[range].graphemes(true).count() as u32;
                host.set_cursor(start);
                if steps > 0 {
                    host.invoke(&HostAction::SelectRight, steps)?;
                    host.invoke(&HostAction::Copy, 1)?;
                }
                host.set_cursor(start);
                self.last_yank_linewise = false;
            }
        }
        Ok(true)
    }
}
