use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use crate::action::HostAction;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::traits::Host;
use crate::types::{FindKind, FindTarget, Mode};

/// Where an `f`/`t`/`F`/`T` search for `target` lands, as a byte offset into
/// `text`. The search never leaves the cursor's line.
pub fn locate(text: &str, cursor: usize, kind: FindKind, target: char) -> Option<usize> {
    if cursor > text.len() || !text.is_char_boundary(cursor) {
        return None;
    }
    let line_start = text[..cursor].rfind('\n').map_or(0, |i| i + 1);
    let line_end = text[cursor..].find('\n').map_or(text.len(), |i| cursor + i);

    if kind.is_forward() {
        let from = cursor + text[cursor..line_end].chars().next()?.len_utf8();
        let hit = from + text[from..line_end].find(target)?;
        if kind.is_till() {
            text[..hit].char_indices().next_back().map(|(i, _)| i)
        } else {
            Some(hit)
        }
    } else {
        let hit = line_start + text[line_start..cursor].rfind(target)?;
        if kind.is_till() {
            Some(hit + target.len_utf8())
        } else {
            Some(hit)
        }
    }
}

impl Engine {
    pub(crate) async fn on_find_target<H: Host>(&mut self, host: &mut H, ch: char) -> Result<(), EngineError> {
        if let Some(kind) = self.pending_find {
            let target = FindTarget { kind, ch };
            if self.execute_find(host, target).await? {
                self.last_find = Some(target);
            }
        }
        self.transition_to(host, Mode::Normal).await
    }

    /// `;` and `,`. The remembered search itself is not changed.
    pub(crate) async fn repeat_find<H: Host>(&mut self, host: &mut H, reversed: bool) -> Result<(), EngineError> {
        let Some(last) = self.last_find else {
            debug!(target: "engine.find", "no previous find");
            return Ok(());
        };
        let target = if reversed {
            FindTarget {
                kind: last.kind.reversed(),
                ..last
            }
        } else {
            last
        };
        self.execute_find(host, target).await.map(drop)
    }

    /// Moves the cursor to the target. Returns whether it was found.
    async fn execute_find<H: Host>(&mut self, host: &mut H, target: FindTarget) -> Result<bool, EngineError> {
        let Some((slice, local)) = self.read_around_cursor(host).await? else {
            return Ok(false);
        };
        let Some(landing) = locate(&slice.text, local, target.kind, target.ch) else {
            debug!(target: "engine.find", ?target, "not found on line");
            return Ok(false);
        };
        let (action, span) = if landing >= local {
            (HostAction::MoveRight, &slice.text[local..landing])
        } else {
            (HostAction::MoveLeft, &slice.text[landing..local])
        };
        let steps = span.graphemes(true).count() as u32;
        debug!(target: "engine.find", ?target, ?action, steps, "found");
        if steps > 0 {
            host.invoke(&action, steps)?;
        }
        Ok(true)
    }
}
