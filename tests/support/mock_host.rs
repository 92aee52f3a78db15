use std::ops::Range;

use async_trait::async_trait;
use ropey::Rope;
use unicode_segmentation::UnicodeSegmentation;
use vi_modal::{
    Host, HostAction, HostError, Mode, ModeKeymap, Position, Selection, Status, TextSlice,
    VisualKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Blank,
    Word,
    Punct,
}

fn class(c: char) -> Class {
    if c.is_whitespace() {
        Class::Blank
    } else if c.is_alphanumeric() || c == '_' {
        Class::Word
    } else {
        Class::Punct
    }
}

fn next_grapheme(text: &str, off: usize) -> usize {
    text[off..].graphemes(true).next().map_or(off, |g| off + g.len())
}

fn prev_grapheme(text: &str, off: usize) -> usize {
    text[..off].graphemes(true).next_back().map_or(off, |g| off - g.len())
}

fn word_forward(text: &str, from: usize) -> usize {
    let mut it = text[from..].char_indices().peekable();
    let Some(&(_, first)) = it.peek() else {
        return from;
    };
    let first = class(first);
    if first != Class::Blank {
        while it.next_if(|&(_, c)| class(c) == first).is_some() {}
    }
    while it.next_if(|&(_, c)| c.is_whitespace()).is_some() {}
    it.peek().map_or(text.len(), |&(i, _)| from + i)
}

fn word_backward(text: &str, from: usize) -> usize {
    let mut it = text[..from].char_indices().rev().peekable();
    while it.next_if(|&(_, c)| c.is_whitespace()).is_some() {}
    let Some(&(mut start, c)) = it.peek() else {
        return 0;
    };
    let k = class(c);
    while let Some((i, _)) = it.next_if(|&(_, c)| class(c) == k) {
        start = i;
    }
    start
}

fn word_end(text: &str, from: usize) -> usize {
    let mut it = text[from..].char_indices().skip(1).peekable();
    while it.next_if(|&(_, c)| c.is_whitespace()).is_some() {}
    let Some(&(mut last, c)) = it.peek() else {
        return from;
    };
    let k = class(c);
    while let Some((i, _)) = it.next_if(|&(_, c)| class(c) == k) {
        last = i;
    }
    from + last
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Left,
    Right,
    // Grapheme steps that cross line ends.
    Back,
    Forward,
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

/// A rope-backed editor implementing every host primitive.
///
/// Selections are anchor + cursor with an exclusive head; line-wise
/// selections cover whole lines including their newlines.
pub struct MockHost {
    rope: Rope,
    saved: String,
    cursor: usize,
    anchor: Option<(usize, VisualKind)>,
    clipboard: String,
    undo: Vec<(String, usize)>,
    redo: Vec<(String, usize)>,
    modified: bool,
    pub stall_reads: bool,
    pub fail_on: Option<HostAction>,
    pub invoked: Vec<(HostAction, u32)>,
    pub statuses: Vec<Status>,
    pub prompts: Vec<String>,
    pub registered: Vec<Mode>,
    pub active: Option<Mode>,
}

impl MockHost {
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            saved: text.to_string(),
            cursor: 0,
            anchor: None,
            clipboard: String::new(),
            undo: Vec::new(),
            redo: Vec::new(),
            modified: false,
            stall_reads: false,
            fail_on: None,
            invoked: Vec::new(),
            statuses: Vec::new(),
            prompts: Vec::new(),
            registered: Vec::new(),
            active: None,
        }
    }

    /// Places the cursor on the first occurrence of `needle`.
    pub fn at(mut self, needle: &str) -> Self {
        self.cursor = self.text().find(needle).expect("needle in buffer");
        self
    }

    pub fn at_offset(mut self, offset: usize) -> Self {
        self.cursor = offset;
        self
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn cursor_offset(&self) -> usize {
        self.cursor
    }

    pub fn clipboard(&self) -> &str {
        &self.clipboard
    }

    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    pub fn has_selection(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn last_status(&self) -> Option<&Status> {
        self.statuses.last()
    }

    pub fn was_invoked(&self, action: &HostAction) -> bool {
        self.invoked.iter().any(|(a, _)| a == action)
    }

    pub fn line_count(&self) -> usize {
        let text = self.text();
        text.lines().count()
    }

    /// Types one character the way a host does for unbound insert-mode keys.
    pub fn type_char(&mut self, c: char) {
        let mut buf = [0u8; 4];
        let s = c.encode_utf8(&mut buf);
        let at = self.cursor;
        self.splice(at..at, s);
        self.cursor = at + s.len();
        self.modified = true;
    }

    fn line_of(&self, off: usize) -> usize {
        self.rope.byte_to_line(off)
    }

    fn line_start(&self, line: usize) -> usize {
        self.rope.line_to_byte(line)
    }

    fn content_end(&self, line: usize) -> usize {
        let start = self.line_start(line);
        let slice = self.rope.line(line);
        let len = slice.len_bytes();
        if len > 0 && slice.byte(len - 1) == b'\n' {
            start + len - 1
        } else {
            start + len
        }
    }

    fn next_line_start(&self, line: usize) -> usize {
        if line + 1 < self.rope.len_lines() {
            self.line_start(line + 1)
        } else {
            self.rope.len_bytes()
        }
    }

    fn position_of(&self, off: usize) -> Position {
        let text = self.text();
        let line = self.line_of(off);
        let col = text[self.line_start(line)..off].graphemes(true).count();
        Position {
            line: line as u32,
            col: col as u32,
        }
    }

    fn offset_of(&self, pos: Position) -> usize {
        let text = self.text();
        let line = (pos.line as usize).min(self.rope.len_lines() - 1);
        self.offset_in_line(&text, line, pos.col as usize)
    }

    fn offset_in_line(&self, text: &str, line: usize, col: usize) -> usize {
        let start = self.line_start(line);
        let end = self.content_end(line);
        text[start..end]
            .grapheme_indices(true)
            .nth(col)
            .map_or(end, |(i, _)| start + i)
    }

    fn step(&self, text: &str, step: Step, from: usize) -> usize {
        let line = self.line_of(from);
        match step {
            Step::Left if from > self.line_start(line) => prev_grapheme(text, from),
            Step::Left => from,
            Step::Right if from < self.content_end(line) => next_grapheme(text, from),
            Step::Right => from,
            Step::Back => prev_grapheme(text, from),
            Step::Forward => next_grapheme(text, from),
            Step::Up | Step::Down => {
                let col = text[self.line_start(line)..from].graphemes(true).count();
                let target = match step {
                    Step::Up => line.saturating_sub(1),
                    _ => (line + 1).min(self.rope.len_lines() - 1),
                };
                self.offset_in_line(text, target, col)
            }
            Step::WordForward => word_forward(text, from),
            Step::WordBackward => word_backward(text, from),
            Step::WordEnd => word_end(text, from),
            Step::LineStart => self.line_start(line),
            Step::FirstNonBlank => {
                let start = self.line_start(line);
                let end = self.content_end(line);
                text[start..end]
                    .find(|c: char| c != ' ' && c != '\t')
                    .map_or(end, |i| start + i)
            }
            Step::LineEnd => self.content_end(line),
            Step::BufferStart => 0,
            Step::BufferEnd => {
                let lines = self.rope.len_lines();
                if lines > 1 && text.ends_with('\n') {
                    self.line_start(lines - 2)
                } else {
                    self.line_start(lines - 1)
                }
            }
        }
    }

    fn walk(&self, step: Step, count: u32) -> usize {
        let text = self.text();
        (0..count).fold(self.cursor, |at, _| self.step(&text, step, at))
    }

    fn move_cursor(&mut self, step: Step, count: u32) {
        self.cursor = self.walk(step, count);
        self.anchor = None;
    }

    fn extend(&mut self, step: Step, count: u32) {
        if self.anchor.is_none() {
            self.anchor = Some((self.cursor, VisualKind::CharWise));
        }
        self.cursor = self.walk(step, count);
    }

    fn checkpoint(&mut self) {
        self.undo.push((self.text(), self.cursor));
        self.redo.clear();
        self.modified = true;
    }

    fn splice(&mut self, range: Range<usize>, with: &str) {
        let start = self.rope.byte_to_char(range.start);
        let end = self.rope.byte_to_char(range.end);
        self.rope.remove(start..end);
        self.rope.insert(start, with);
    }

    fn edit(&mut self, range: Range<usize>, with: &str) -> String {
        self.checkpoint();
        let removed = self.text()[range.clone()].to_string();
        self.splice(range, with);
        removed
    }

    fn restore(&mut self, from_undo: bool) {
        let (stack, other) = if from_undo {
            (&mut self.undo, &mut self.redo)
        } else {
            (&mut self.redo, &mut self.undo)
        };
        if let Some((text, cursor)) = stack.pop() {
            other.push((self.rope.to_string(), self.cursor));
            self.rope = Rope::from_str(&text);
            self.cursor = cursor.min(text.len());
            self.anchor = None;
        }
    }

    fn lines_text(&self, line: usize, count: u32) -> String {
        let text = self.text();
        let last = (line + count as usize - 1).min(self.rope.len_lines() - 1);
        let mut lines = text[self.line_start(line)..self.next_line_start(last)].to_string();
        if !lines.ends_with('\n') {
            lines.push('\n');
        }
        lines
    }

    fn apply(&mut self, action: &HostAction, count: u32) {
        use HostAction as A;
        let line = self.line_of(self.cursor);
        match action {
            A::MoveLeft => self.move_cursor(Step::Left, count),
            A::MoveRight => self.move_cursor(Step::Right, count),
            A::MoveUp => self.move_cursor(Step::Up, count),
            A::MoveDown => self.move_cursor(Step::Down, count),
            A::MoveWordForward => self.move_cursor(Step::WordForward, count),
            A::MoveWordBackward => self.move_cursor(Step::WordBackward, count),
            A::MoveWordEnd => self.move_cursor(Step::WordEnd, count),
            A::MoveLineStart => self.move_cursor(Step::LineStart, count),
            A::MoveFirstNonBlank => self.move_cursor(Step::FirstNonBlank, count),
            A::MoveLineEnd => self.move_cursor(Step::LineEnd, count),
            A::MoveBufferStart => self.move_cursor(Step::BufferStart, count),
            A::MoveBufferEnd => self.move_cursor(Step::BufferEnd, count),
            A::SelectLeft => self.extend(Step::Back, count),
            A::SelectRight => self.extend(Step::Forward, count),
            A::SelectUp => self.extend(Step::Up, count),
            A::SelectDown => self.extend(Step::Down, count),
            A::SelectWordForward => self.extend(Step::WordForward, count),
            A::SelectWordBackward => self.extend(Step::WordBackward, count),
            A::SelectWordEnd => self.extend(Step::WordEnd, count),
            A::SelectLineStart => self.extend(Step::LineStart, count),
            A::SelectLineEnd => self.extend(Step::LineEnd, count),
            A::SelectBufferStart => self.extend(Step::BufferStart, count),
            A::SelectBufferEnd => self.extend(Step::BufferEnd, count),
            A::DeleteWordForward => {
                let mut removed = String::new();
                for _ in 0..count {
                    let text = self.text();
                    let mut end = word_forward(&text, self.cursor);
                    if let Some(nl) = text[self.cursor..end].find('\n') {
                        end = if nl == 0 { self.cursor + 1 } else { self.cursor + nl };
                    }
                    if end == self.cursor {
                        break;
                    }
                    removed.push_str(&self.edit(self.cursor..end, ""));
                }
                self.clipboard = removed;
            }
            A::DeleteWordBackward => {
                let start = self.walk(Step::WordBackward, count);
                self.clipboard = self.edit(start..self.cursor, "");
                self.cursor = start;
            }
            A::DeleteToLineEnd => {
                let last = (line + count as usize - 1).min(self.rope.len_lines() - 1);
                let end = self.content_end(last);
                self.clipboard = self.edit(self.cursor..end, "");
            }
            A::DeleteToLineStart => {
                let start = self.line_start(line);
                self.clipboard = self.edit(start..self.cursor, "");
                self.cursor = start;
            }
            A::DeleteCharForward => {
                let end = self.walk(Step::Right, count);
                if end > self.cursor {
                    self.clipboard = self.edit(self.cursor..end, "");
                }
            }
            A::DeleteCharBackward => {
                let start = self.walk(Step::Left, count);
                if start < self.cursor {
                    self.clipboard = self.edit(start..self.cursor, "");
                    self.cursor = start;
                }
            }
            A::DeleteLine => {
                self.clipboard = self.lines_text(line, count);
                let mut start = self.line_start(line);
                let last = (line + count as usize - 1).min(self.rope.len_lines() - 1);
                let end = self.next_line_start(last);
                let text = self.text();
                let joined_up = end == text.len() && start > 0 && !text[start..end].ends_with('\n');
                if joined_up {
                    start -= 1;
                }
                self.edit(start..end, "");
                let start = start.min(self.rope.len_bytes());
                self.cursor = self.line_start(self.line_of(start));
            }
            A::CopyLine => self.clipboard = self.lines_text(line, count),
            A::ClearLine => {
                let start = self.line_start(line);
                let end = self.content_end(line);
                self.edit(start..end, "");
                self.cursor = start;
            }
            A::OpenLineBelow => {
                let at = self.content_end(line);
                self.edit(at..at, "\n");
                self.cursor = at + 1;
            }
            A::OpenLineAbove => {
                let at = self.line_start(line);
                self.edit(at..at, "\n");
                self.cursor = at;
            }
            A::JoinLines => {
                for _ in 0..count.saturating_sub(1).max(1) {
                    let end = self.content_end(self.line_of(self.cursor));
                    let text = self.text();
                    if end >= text.len() {
                        break;
                    }
                    let blanks = text[end + 1..]
                        .find(|c: char| c != ' ' && c != '\t')
                        .unwrap_or(text.len() - end - 1);
                    let rest = end + 1 + blanks;
                    let joiner = if text[rest..].starts_with('\n') || rest == text.len() {
                        ""
                    } else {
                        " "
                    };
                    self.edit(end..rest, joiner);
                    self.cursor = end;
                }
            }
            A::Cut => {
                if let Some(range) = self.selection() {
                    self.clipboard = self.edit(range.clone(), "");
                    self.cursor = range.start;
                    self.anchor = None;
                }
            }
            A::Copy => {
                if let Some(range) = self.selection() {
                    self.clipboard = self.text()[range].to_string();
                }
            }
            A::Paste | A::PasteBefore => {
                let pasted = self.clipboard.repeat(count as usize);
                let at = if matches!(action, A::Paste) {
                    self.walk(Step::Right, 1)
                } else {
                    self.cursor
                };
                self.edit(at..at, &pasted);
                self.cursor = at;
            }
            A::PasteLineBelow => {
                let mut lines = self.clipboard.repeat(count as usize);
                let mut at = self.next_line_start(line);
                if at == self.rope.len_bytes() && !self.text().ends_with('\n') {
                    lines = format!("\n{}", lines.trim_end_matches('\n'));
                    self.edit(at..at, &lines);
                    at += 1;
                } else {
                    self.edit(at..at, &lines);
                }
                self.cursor = at;
            }
            A::PasteLineAbove => {
                let lines = self.clipboard.repeat(count as usize);
                let at = self.line_start(line);
                self.edit(at..at, &lines);
                self.cursor = at;
            }
            A::Undo => (0..count).for_each(|_| self.restore(true)),
            A::Redo => (0..count).for_each(|_| self.restore(false)),
            A::Save | A::SaveAs(_) | A::SaveAll => {
                self.saved = self.text();
                self.modified = false;
            }
            A::Revert => {
                self.rope = Rope::from_str(&self.saved);
                self.cursor = self.cursor.min(self.saved.len());
                self.modified = false;
            }
            A::Edit(_)
            | A::NewBuffer
            | A::Close
            | A::CloseOthers
            | A::QuitAll
            | A::NextBuffer
            | A::PreviousBuffer
            | A::SwitchBuffer(_)
            | A::DeleteBuffer(_)
            | A::SplitHorizontal(_)
            | A::SplitVertical(_)
            | A::ShowFileInfo
            | A::ShowHelp(_) => {}
        }
    }
}

#[async_trait(?Send)]
impl Host for MockHost {
    fn invoke(&mut self, action: &HostAction, count: u32) -> Result<(), HostError> {
        self.invoked.push((action.clone(), count));
        if self.fail_on.as_ref() == Some(action) {
            return Err(HostError::new(format!("{action:?} failed")));
        }
        self.apply(action, count.max(1));
        Ok(())
    }

    fn cursor(&self) -> usize {
        self.cursor
    }

    fn cursor_position(&self) -> Position {
        self.position_of(self.cursor)
    }

    fn set_cursor(&mut self, offset: usize) {
        let text = self.text();
        let mut offset = offset.min(text.len());
        while !text.is_char_boundary(offset) {
            offset -= 1;
        }
        self.cursor = offset;
        self.anchor = None;
    }

    fn buffer_len(&self) -> usize {
        self.rope.len_bytes()
    }

    fn selection(&self) -> Option<Range<usize>> {
        let (anchor, kind) = self.anchor?;
        let (lo, hi) = (anchor.min(self.cursor), anchor.max(self.cursor));
        Some(match kind {
            VisualKind::LineWise => {
                self.line_start(self.line_of(lo))..self.next_line_start(self.line_of(hi))
            }
            VisualKind::CharWise | VisualKind::BlockWise => lo..hi,
        })
    }

    fn set_selection(&mut self, selection: Option<Selection>) {
        match selection {
            Some(sel) => {
                self.anchor = Some((self.offset_of(sel.anchor), sel.kind));
                self.cursor = self.offset_of(sel.head);
            }
            None => self.anchor = None,
        }
    }

    fn delete_range(&mut self, range: Range<usize>) -> Result<(), HostError> {
        if range.end > self.rope.len_bytes() || range.start > range.end {
            return Err(HostError::new("range out of bounds"));
        }
        self.edit(range, "");
        Ok(())
    }

    fn insert_text(&mut self, at: usize, text: &str) -> Result<(), HostError> {
        if at > self.rope.len_bytes() {
            return Err(HostError::new("insert past end of buffer"));
        }
        self.edit(at..at, text);
        Ok(())
    }

    async fn read_text(&self, range: Range<usize>) -> Result<TextSlice, HostError> {
        if self.stall_reads {
            std::future::pending::<()>().await;
        }
        let text = self.text();
        let mut start = range.start.min(text.len());
        let mut end = range.end.clamp(start, text.len());
        while !text.is_char_boundary(start) {
            start -= 1;
        }
        while !text.is_char_boundary(end) {
            end += 1;
        }
        Ok(TextSlice {
            start,
            text: text[start..end].to_string(),
        })
    }

    fn register_keymap(&mut self, keymap: &ModeKeymap) {
        self.registered.push(keymap.mode);
    }

    fn set_active_keymap(&mut self, mode: Mode) {
        self.active = Some(mode);
    }

    fn start_prompt(&mut self, prompt: &str) {
        self.prompts.push(prompt.to_string());
    }

    fn set_status(&mut self, status: Status) {
        self.statuses.push(status);
    }

    fn is_modified(&self) -> bool {
        self.modified
    }
}
