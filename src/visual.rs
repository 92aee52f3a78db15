use tracing::{debug, trace};

use crate::action::HostAction;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::traits::Host;
use crate::types::{Mode, Motion, Operator, Position, Selection, VisualKind};

/// Where a visual selection started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct VisualAnchor {
    pub(crate) offset: usize,
    pub(crate) position: Position,
}

impl Engine {
    /// `v`, `V` and `Ctrl-v`: enter, switch shape, or leave when the key
    /// matches the active kind.
    pub(crate) async fn on_visual_key<H: Host>(&mut self, host: &mut H, kind: VisualKind) -> Result<(), EngineError> {
        match (self.mode, self.visual) {
            (Mode::Visual(current), _) if current == kind => self.transition_to(host, Mode::Normal).await,
            (Mode::Visual(_), Some(anchor)) => {
                host.set_selection(Some(Selection {
                    anchor: anchor.position,
                    head: host.cursor_position(),
                    kind,
                }));
                self.transition_to(host, Mode::Visual(kind)).await
            }
            _ => {
                let anchor = VisualAnchor {
                    offset: host.cursor(),
                    position: host.cursor_position(),
                };
                debug!(target: "engine.visual", ?kind, offset = anchor.offset, "selection started");
                self.visual = Some(anchor);
                host.set_selection(Some(Selection {
                    anchor: anchor.position,
                    head: anchor.position,
                    kind,
                }));
                self.transition_to(host, Mode::Visual(kind)).await
            }
        }
    }

    pub(crate) async fn extend_selection<H: Host>(
        &mut self,
        host: &mut H,
        kind: VisualKind,
        motion: Motion,
    ) -> Result<(), EngineError> {
        let count = self.counts.consume();
        let Some(select) = motion.selection_action() else {
            debug!(target: "engine.visual", ?motion, "motion cannot extend a selection");
            return Ok(());
        };
        trace!(target: "engine.visual", ?select, count, "extend");
        host.invoke(&select, count)?;
        if kind != VisualKind::CharWise
            && let Some(anchor) = self.visual
        {
            host.set_selection(Some(Selection {
                anchor: anchor.position,
                head: host.cursor_position(),
                kind,
            }));
        }
        Ok(())
    }

    pub(crate) async fn apply_visual_operator<H: Host>(
        &mut self,
        host: &mut H,
        kind: VisualKind,
        operator: Operator,
    ) -> Result<(), EngineError> {
        debug!(target: "engine.visual", ?kind, ?operator, selection = ?host.selection(), "operator on selection");
        match operator {
            Operator::Delete => host.invoke(&HostAction::Cut, 1)?,
            Operator::Change => {
                host.invoke(&HostAction::Cut, 1)?;
                return self.transition_to(host, Mode::Insert).await;
            }
            Operator::Yank => {
                let start = host.selection().map(|range| range.start);
                host.invoke(&HostAction::Copy, 1)?;
                self.last_yank_linewise = kind == VisualKind::LineWise;
                if let Some(start) = start {
                    host.set_cursor(start);
                }
            }
        }
        self.transition_to(host, Mode::Normal).await
    }
}
