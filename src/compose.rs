//! Operator + motion composition.
//!
//! A pending operator is applied to a motion either through one of the
//! host's compound primitives (`DeleteWordForward`, `DeleteToLineEnd`, ...)
//! or by extending a selection with the motion's selection twin and then
//! cutting or copying it.

use tracing::{debug, trace};

use crate::action::{HostAction, compound_action};
use crate::engine::{Engine, Run};
use crate::error::EngineError;
use crate::traits::Host;
use crate::types::{ChangeRecord, Mode, Motion, Operator};

enum Plan {
    Compound(HostAction),
    Select(HostAction),
}

fn plan(operator: Operator, motion: Motion) -> Option<Plan> {
    compound_action(operator, motion)
        .map(Plan::Compound)
        .or_else(|| motion.selection_action().map(Plan::Select))
}

impl Engine {
    /// Applies `operator` over `count` repetitions of `motion`.
    ///
    /// Returns `false` when the pair cannot be expressed with host
    /// primitives; nothing is changed or recorded in that case. Live runs
    /// record mutating operators and leave the composer through a single
    /// mode transition. Replays do neither.
    pub(crate) async fn apply_operator<H: Host>(
        &mut self,
        host: &mut H,
        operator: Operator,
        motion: Motion,
        count: u32,
        run: Run,
    ) -> Result<bool, EngineError> {
        let Some(plan) = plan(operator, motion) else {
            debug!(target: "engine.compose", ?operator, ?motion, "no host primitive for operator and motion");
            if run == Run::Live {
                self.transition_to(host, Mode::Normal).await?;
            }
            return Ok(false);
        };

        if run == Run::Live && operator.mutates() {
            self.repeat.record(
                ChangeRecord::OperatorMotion {
                    operator,
                    motion,
                    count,
                    inserted_text: None,
                },
                operator == Operator::Change,
            );
        }

        match plan {
            Plan::Compound(action) => {
                trace!(target: "engine.compose", ?action, count, "compound");
                host.invoke(&action, count)?;
            }
            Plan::Select(select) => {
                trace!(target: "engine.compose", ?select, count, "select then apply");
                let origin = host.cursor();
                host.invoke(&select, count)?;
                match operator {
                    Operator::Delete | Operator::Change => host.invoke(&HostAction::Cut, 1)?,
                    Operator::Yank => {
                        host.invoke(&HostAction::Copy, 1)?;
                        host.set_cursor(origin);
                        self.last_yank_linewise = false;
                    }
                }
            }
        }

        if run == Run::Live {
            let next = if operator == Operator::Change {
                Mode::Insert
            } else {
                Mode::Normal
            };
            self.transition_to(host, next).await?;
        }
        Ok(true)
    }
}
