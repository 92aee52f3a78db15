use tracing::debug;

use crate::engine::{Engine, Run, run_line_op};
use crate::error::EngineError;
use crate::traits::Host;
use crate::types::{ChangeRecord, Mode, Operator, Status};

/// The last change and whether its insert session is still open.
#[derive(Debug, Clone, Default)]
pub(crate) struct RepeatLog {
    last: Option<ChangeRecord>,
    awaiting_insert: bool,
}

impl RepeatLog {
    /// Replaces the last change. When `opens_insert` is set, the text typed
    /// before the next insert exit is attached to it.
    pub(crate) fn record(&mut self, record: ChangeRecord, opens_insert: bool) {
        debug!(target: "engine.repeat", ?record, opens_insert, "recorded change");
        self.last = Some(record);
        self.awaiting_insert = opens_insert;
    }

    /// Closes an insert session with the text it produced.
    pub(crate) fn finish_insert(&mut self, text: String) {
        if std::mem::take(&mut self.awaiting_insert) {
            if let Some(record) = &mut self.last {
                record.attach_inserted(text);
            }
        } else if !text.is_empty() {
            self.record(ChangeRecord::Insert { inserted_text: text }, false);
        }
    }

    pub(crate) fn cancel_insert(&mut self) {
        self.awaiting_insert = false;
    }

    pub(crate) fn last(&self) -> Option<&ChangeRecord> {
        self.last.as_ref()
    }
}

impl Engine {
    /// Replays the last change. An explicit `count` overrides the recorded one.
    pub(crate) async fn replay_last_change<H: Host>(
        &mut self,
        host: &mut H,
        count: Option<u32>,
    ) -> Result<(), EngineError> {
        let Some(record) = self.repeat.last().cloned() else {
            host.set_status(Status::Message("nothing to repeat".to_string()));
            return Ok(());
        };
        debug!(target: "engine.repeat", ?record, ?count, "replaying");

        let inserted = match &record {
            ChangeRecord::Simple {
                action,
                count: recorded,
                inserted_text,
            } => {
                host.invoke(action, count.unwrap_or(*recorded))?;
                inserted_text.clone()
            }
            ChangeRecord::LineOp {
                op,
                count: recorded,
                inserted_text,
            } => {
                run_line_op(host, *op, count.unwrap_or(*recorded))?;
                inserted_text.clone()
            }
            ChangeRecord::OperatorMotion {
                operator,
                motion,
                count: recorded,
                inserted_text,
            } => {
                let applied = self
                    .apply_operator(host, *operator, *motion, count.unwrap_or(*recorded), Run::Replay)
                    .await?;
                inserted_text.clone().filter(|_| applied && *operator == Operator::Change)
            }
            ChangeRecord::OperatorTextObject {
                operator,
                modifier,
                object,
                inserted_text,
            } => {
                let applied = self
                    .apply_text_object(host, *operator, *modifier, *object, Run::Replay)
                    .await?;
                inserted_text.clone().filter(|_| applied && *operator == Operator::Change)
            }
            ChangeRecord::Insert { inserted_text } => Some(inserted_text.clone()),
        };

        if let Some(text) = inserted.filter(|t| !t.is_empty()) {
            let at = host.cursor();
            host.insert_text(at, &text)?;
            host.set_cursor(at + text.len());
            debug!(target: "engine.repeat", at, len = text.len(), "re-inserted text");
        }
        self.transition_to(host, Mode::Normal).await
    }
}
