use tracing::{debug, trace, warn};

use crate::action::HostAction;
use crate::config::EngineConfig;
use crate::count::Counts;
use crate::error::{EngineError, HostError};
use crate::key::KeyEvent;
use crate::keymap::{Handler, InsertEntry, Keymaps, MODE_KEYMAPS, ModeKeymap};
use crate::repeat::RepeatLog;
use crate::traits::{Host, TextSlice};
use crate::types::{
    ChangeRecord, FindKind, FindTarget, LineOp, Mode, Motion, Operator, Position, Status,
    TextObjectModifier,
};
use crate::visual::VisualAnchor;

/// What happened to a key passed to [`Engine::handle_key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled(Handler),
    /// The active mode has no binding for the key. In insert mode the host
    /// should insert the typed text itself.
    Unbound,
}

/// The modal command engine. One per editor window.
#[derive(Debug, Clone)]
pub struct Engine {
    pub(crate) mode: Mode,
    pub(crate) config: EngineConfig,
    declarations: &'static [ModeKeymap],
    keymaps: Keymaps,
    pub(crate) counts: Counts,
    pub(crate) pending_operator: Option<Operator>,
    pub(crate) pending_find: Option<FindKind>,
    pub(crate) pending_text_object: Option<TextObjectModifier>,
    pending_g: bool,
    pub(crate) last_find: Option<FindTarget>,
    pub(crate) repeat: RepeatLog,
    pub(crate) last_yank_linewise: bool,
    pub(crate) visual: Option<VisualAnchor>,
    pub(crate) insert_start: Option<usize>,
    busy: bool,
}

/// A read-only copy of the engine state, for hosts and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSnapshot {
    pub mode: Mode,
    pub pending_count: Option<u32>,
    pub pending_operator: Option<Operator>,
    pub pending_find: Option<FindKind>,
    pub pending_text_object: Option<TextObjectModifier>,
    pub last_find: Option<FindTarget>,
    pub last_change: Option<ChangeRecord>,
    pub last_yank_linewise: bool,
    pub visual_anchor: Option<usize>,
    pub visual_block_anchor: Option<Position>,
    pub insert_start: Option<usize>,
}

pub struct EngineBuilder {
    config: EngineConfig,
    keymaps: &'static [ModeKeymap],
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            keymaps: &MODE_KEYMAPS,
        }
    }
}

impl EngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the built-in keymap declarations.
    pub fn keymaps(mut self, keymaps: &'static [ModeKeymap]) -> Self {
        self.keymaps = keymaps;
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            mode: Mode::Normal,
            counts: Counts::new(self.config.max_count),
            config: self.config,
            declarations: self.keymaps,
            keymaps: Keymaps::new(self.keymaps),
            pending_operator: None,
            pending_find: None,
            pending_text_object: None,
            pending_g: false,
            last_find: None,
            repeat: RepeatLog::default(),
            last_yank_linewise: false,
            visual: None,
            insert_start: None,
            busy: false,
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        EngineBuilder::default().build()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            mode: self.mode,
            pending_count: self.counts.peek(),
            pending_operator: self.pending_operator,
            pending_find: self.pending_find,
            pending_text_object: self.pending_text_object,
            last_find: self.last_find,
            last_change: self.repeat.last().cloned(),
            last_yank_linewise: self.last_yank_linewise,
            visual_anchor: self.visual.map(|a| a.offset),
            visual_block_anchor: self.visual.map(|a| a.position),
            insert_start: self.insert_start,
        }
    }

    /// Registers every mode's keymap with the host and enters normal mode.
    pub fn activate<H: Host>(&mut self, host: &mut H) {
        for keymap in self.declarations {
            host.register_keymap(keymap);
        }
        self.reset(host);
    }

    /// Routes one keystroke through the active mode's keymap.
    pub async fn handle_key<H: Host>(
        &mut self,
        host: &mut H,
        key: KeyEvent,
    ) -> Result<KeyOutcome, EngineError> {
        if self.busy {
            return Err(EngineError::Busy);
        }
        let Some(handler) = self.lookup(key) else {
            trace!(target: "engine.dispatch", mode = ?self.mode, ?key, "unbound key");
            return Ok(KeyOutcome::Unbound);
        };
        self.run(host, handler).await?;
        Ok(KeyOutcome::Handled(handler))
    }

    /// Runs a handler directly, as if its key had been pressed.
    pub async fn invoke<H: Host>(&mut self, host: &mut H, handler: Handler) -> Result<(), EngineError> {
        if self.busy {
            return Err(EngineError::Busy);
        }
        self.run(host, handler).await
    }

    /// Recovers after a keystroke future was dropped before completing.
    ///
    /// Pending operator, find, text-object and visual state are discarded and
    /// the engine returns to normal mode.
    pub fn abort_in_flight<H: Host>(&mut self, host: &mut H) {
        if self.busy {
            warn!(target: "engine.dispatch", mode = ?self.mode, "discarding abandoned keystroke");
        }
        self.busy = false;
        self.reset(host);
    }

    pub(crate) fn begin(&mut self) -> Result<(), EngineError> {
        if self.busy {
            return Err(EngineError::Busy);
        }
        self.busy = true;
        Ok(())
    }

    pub(crate) fn end(&mut self) {
        self.busy = false;
    }

    fn lookup(&mut self, key: KeyEvent) -> Option<Handler> {
        if std::mem::take(&mut self.pending_g) && key == KeyEvent::char('g') {
            return Some(Handler::Motion(Motion::BufferStart));
        }
        self.keymaps.resolve(self.mode, key)
    }

    async fn run<H: Host>(&mut self, host: &mut H, handler: Handler) -> Result<(), EngineError> {
        self.begin()?;
        let before = self.mode;
        let result = self.dispatch(host, handler).await;
        self.end();
        match result {
            Ok(()) => {
                let entered_counting_mode = self.mode != before && self.mode.preserves_count();
                if !matches!(handler, Handler::Digit(_) | Handler::GPrefix) && !entered_counting_mode {
                    self.counts.clear();
                }
                Ok(())
            }
            Err(err) => {
                warn!(target: "engine.dispatch", ?handler, error = %err, "handler failed; returning to normal mode");
                self.reset(host);
                Err(err)
            }
        }
    }

    async fn dispatch<H: Host>(&mut self, host: &mut H, handler: Handler) -> Result<(), EngineError> {
        trace!(target: "engine.dispatch", mode = ?self.mode, ?handler, "dispatch");
        match handler {
            Handler::Cancel => self.transition_to(host, Mode::Normal).await,
            Handler::Digit(d) => self.on_digit(host, d).await,
            Handler::GPrefix => {
                self.pending_g = true;
                Ok(())
            }
            Handler::Motion(motion) => self.on_motion(host, motion).await,
            Handler::Operator(operator) => self.on_operator(host, operator).await,
            Handler::TextObjectModifier(modifier) => {
                if self.pending_operator.is_none() {
                    return self.transition_to(host, Mode::Normal).await;
                }
                self.pending_text_object = Some(modifier);
                self.transition_to(host, Mode::TextObject).await
            }
            Handler::TextObject(object) => self.resolve_and_apply(host, object).await,
            Handler::BeginFind(kind) => {
                self.pending_find = Some(kind);
                self.transition_to(host, Mode::FindChar).await
            }
            Handler::FindTarget(ch) => self.on_find_target(host, ch).await,
            Handler::RepeatFind => self.repeat_find(host, false).await,
            Handler::RepeatFindReversed => self.repeat_find(host, true).await,
            Handler::EnterVisual(kind) => self.on_visual_key(host, kind).await,
            Handler::RepeatChange => {
                let count = self.counts.take();
                self.replay_last_change(host, count).await
            }
            Handler::CommandLine => {
                host.start_prompt(":");
                Ok(())
            }
            Handler::Undo => {
                host.invoke(&HostAction::Undo, self.counts.consume())?;
                Ok(())
            }
            Handler::Redo => {
                host.invoke(&HostAction::Redo, self.counts.consume())?;
                Ok(())
            }
            Handler::DeleteCharForward => self.simple_change(host, HostAction::DeleteCharForward, false).await,
            Handler::DeleteCharBackward => self.simple_change(host, HostAction::DeleteCharBackward, false).await,
            Handler::SubstituteChar => self.simple_change(host, HostAction::DeleteCharForward, true).await,
            Handler::JoinLines => self.simple_change(host, HostAction::JoinLines, false).await,
            Handler::Paste => {
                let action = if self.last_yank_linewise {
                    HostAction::PasteLineBelow
                } else {
                    HostAction::Paste
                };
                self.simple_change(host, action, false).await
            }
            Handler::PasteBefore => {
                let action = if self.last_yank_linewise {
                    HostAction::PasteLineAbove
                } else {
                    HostAction::PasteBefore
                };
                self.simple_change(host, action, false).await
            }
            Handler::SubstituteLine => {
                let count = self.counts.consume();
                self.line_operation(host, Operator::Change, count).await
            }
            Handler::DeleteToLineEnd => {
                let count = self.counts.consume();
                self.apply_operator(host, Operator::Delete, Motion::LineEnd, count, Run::Live)
                    .await
                    .map(drop)
            }
            Handler::ChangeToLineEnd => {
                let count = self.counts.consume();
                self.apply_operator(host, Operator::Change, Motion::LineEnd, count, Run::Live)
                    .await
                    .map(drop)
            }
            Handler::Insert(entry) => self.enter_insert(host, entry).await,
        }
    }

    async fn on_digit<H: Host>(&mut self, host: &mut H, digit: u8) -> Result<(), EngineError> {
        if self.counts.push_digit(u32::from(digit)) {
            self.publish_mode(host);
            return Ok(());
        }
        self.on_motion(host, Motion::LineStart).await
    }

    async fn on_motion<H: Host>(&mut self, host: &mut H, motion: Motion) -> Result<(), EngineError> {
        match self.mode {
            Mode::Normal => {
                let count = self.counts.take();
                if let (Motion::BufferStart | Motion::BufferEnd, Some(line)) = (motion, count) {
                    self.goto_line(host, line as usize).await?;
                    return Ok(());
                }
                host.invoke(&motion.cursor_action(), count.unwrap_or(1))?;
                Ok(())
            }
            Mode::OperatorPending => {
                let Some(operator) = self.pending_operator else {
                    return self.transition_to(host, Mode::Normal).await;
                };
                let count = self.counts.consume();
                self.apply_operator(host, operator, motion, count, Run::Live)
                    .await
                    .map(drop)
            }
            Mode::Visual(kind) => self.extend_selection(host, kind, motion).await,
            Mode::Insert | Mode::FindChar | Mode::TextObject => Ok(()),
        }
    }

    async fn on_operator<H: Host>(&mut self, host: &mut H, operator: Operator) -> Result<(), EngineError> {
        match self.mode {
            Mode::Normal => {
                self.pending_operator = Some(operator);
                self.transition_to(host, Mode::OperatorPending).await
            }
            Mode::OperatorPending if self.pending_operator == Some(operator) => {
                let count = self.counts.consume();
                self.line_operation(host, operator, count).await
            }
            Mode::Visual(kind) => self.apply_visual_operator(host, kind, operator).await,
            _ => self.transition_to(host, Mode::Normal).await,
        }
    }

    async fn enter_insert<H: Host>(&mut self, host: &mut H, entry: InsertEntry) -> Result<(), EngineError> {
        match entry {
            InsertEntry::Before => {}
            InsertEntry::After => host.invoke(&HostAction::MoveRight, 1)?,
            InsertEntry::LineStart => host.invoke(&HostAction::MoveFirstNonBlank, 1)?,
            InsertEntry::LineEnd => host.invoke(&HostAction::MoveLineEnd, 1)?,
            InsertEntry::OpenBelow => {
                return self.simple_change(host, HostAction::OpenLineBelow, true).await;
            }
            InsertEntry::OpenAbove => {
                return self.simple_change(host, HostAction::OpenLineAbove, true).await;
            }
        }
        self.transition_to(host, Mode::Insert).await
    }

    /// Runs a single recorded primitive, optionally opening an insert session.
    async fn simple_change<H: Host>(
        &mut self,
        host: &mut H,
        action: HostAction,
        opens_insert: bool,
    ) -> Result<(), EngineError> {
        let count = self.counts.consume();
        self.repeat.record(
            ChangeRecord::Simple {
                action: action.clone(),
                count,
                inserted_text: None,
            },
            opens_insert,
        );
        host.invoke(&action, count)?;
        if opens_insert {
            self.transition_to(host, Mode::Insert).await?;
        }
        Ok(())
    }

    /// Handles `dd`, `cc`/`S` and `yy`.
    pub(crate) async fn line_operation<H: Host>(
        &mut self,
        host: &mut H,
        operator: Operator,
        count: u32,
    ) -> Result<(), EngineError> {
        let op = match operator {
            Operator::Delete => LineOp::Delete,
            Operator::Change => LineOp::Change,
            Operator::Yank => {
                host.invoke(&HostAction::CopyLine, count)?;
                self.last_yank_linewise = true;
                return self.transition_to(host, Mode::Normal).await;
            }
        };
        self.repeat.record(
            ChangeRecord::LineOp {
                op,
                count,
                inserted_text: None,
            },
            op == LineOp::Change,
        );
        run_line_op(host, op, count)?;
        let next = if op == LineOp::Change { Mode::Insert } else { Mode::Normal };
        self.transition_to(host, next).await
    }

    /// Switches modes, applying the exit and entry side effects in order.
    pub(crate) async fn transition_to<H: Host>(&mut self, host: &mut H, next: Mode) -> Result<(), EngineError> {
        let prev = self.mode;
        if prev == Mode::Insert && next != Mode::Insert {
            self.capture_insert(host).await?;
        }
        if !next.holds_operator() {
            self.pending_operator = None;
            self.pending_text_object = None;
        }
        if next != Mode::FindChar {
            self.pending_find = None;
        }
        if !next.preserves_count() {
            self.counts.clear();
        }
        self.pending_g = false;
        if prev.is_visual() && !next.is_visual() {
            self.visual = None;
            let here = host.cursor();
            host.set_selection(None);
            host.invoke(&HostAction::MoveLeft, 1)?;
            host.invoke(&HostAction::MoveRight, 1)?;
            if host.cursor() != here {
                host.set_cursor(here);
            }
        }
        if next == Mode::Insert && prev != Mode::Insert {
            self.insert_start = Some(host.cursor());
        }
        debug!(target: "engine.mode", from = ?prev, to = ?next, "transition");
        self.mode = next;
        host.set_active_keymap(next);
        self.publish_mode(host);
        Ok(())
    }

    async fn capture_insert<H: Host>(&mut self, host: &mut H) -> Result<(), EngineError> {
        let Some(start) = self.insert_start.take() else {
            return Ok(());
        };
        let end = host.cursor();
        let text = if end > start {
            host.read_text(start..end).await?.text
        } else {
            String::new()
        };
        trace!(target: "engine.repeat", start, end, len = text.len(), "captured insert session");
        self.repeat.finish_insert(text);
        Ok(())
    }

    fn reset<H: Host>(&mut self, host: &mut H) {
        if self.mode.is_visual() {
            host.set_selection(None);
        }
        self.mode = Mode::Normal;
        self.pending_operator = None;
        self.pending_find = None;
        self.pending_text_object = None;
        self.pending_g = false;
        self.counts.clear();
        self.visual = None;
        self.insert_start = None;
        self.repeat.cancel_insert();
        host.set_active_keymap(Mode::Normal);
        self.publish_mode(host);
    }

    fn publish_mode<H: Host>(&self, host: &mut H) {
        let mut indicator = match (self.mode, self.pending_operator, self.pending_find) {
            (Mode::OperatorPending | Mode::TextObject, Some(op), _) => {
                format!("-- {} ({}) --", self.mode.label(), op.key())
            }
            (Mode::FindChar, _, Some(kind)) => format!("-- {} ({}) --", self.mode.label(), kind.key()),
            _ => format!("-- {} --", self.mode.label()),
        };
        if self.config.show_count_in_status
            && let Some(count) = self.counts.peek()
        {
            indicator.push_str(&format!(" {count}"));
        }
        host.set_status(Status::Mode(indicator));
    }

    /// Reads the bounded window around the cursor.
    ///
    /// Returns the slice and the cursor's index into it, or `None` when the
    /// host returned text that does not contain the cursor.
    pub(crate) async fn read_around_cursor<H: Host>(
        &self,
        host: &H,
    ) -> Result<Option<(TextSlice, usize)>, HostError> {
        let cursor = host.cursor();
        let window = self.config.text_window;
        let range = cursor.saturating_sub(window)..cursor.saturating_add(window).min(host.buffer_len());
        let slice = host.read_text(range).await?;
        Ok(slice.local(cursor).map(|local| (slice, local)))
    }

    /// Moves the cursor to the start of 1-based `line`, clamped to the buffer.
    pub(crate) async fn goto_line<H: Host>(&self, host: &mut H, line: usize) -> Result<(), HostError> {
        let slice = host.read_text(0..host.buffer_len()).await?;
        let offset = slice.start + line_start_offset(&slice.text, line);
        debug!(target: "engine.mode", line, offset, "goto line");
        host.set_cursor(offset);
        Ok(())
    }
}

/// Whether a composed command is being typed or replayed by `.`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Run {
    Live,
    Replay,
}

pub(crate) fn run_line_op<H: Host>(host: &mut H, op: LineOp, count: u32) -> Result<(), HostError> {
    match op {
        LineOp::Delete => host.invoke(&HostAction::DeleteLine, count),
        LineOp::Change => {
            if count > 1 {
                host.invoke(&HostAction::DeleteLine, count - 1)?;
            }
            host.invoke(&HostAction::ClearLine, 1)
        }
    }
}

/// Byte offset where 1-based `line` starts. Line 0 means line 1; lines past
/// the end clamp to the last line. A trailing newline does not start a line.
pub(crate) fn line_start_offset(text: &str, line: usize) -> usize {
    let target = line.max(1) - 1;
    std::iter::once(0)
        .chain(
            text.match_indices('\n')
                .map(|(i, _)| i + 1)
                .filter(|start| *start < text.len()),
        )
        .take(target.saturating_add(1))
        .last()
        .unwrap_or(0)
}
