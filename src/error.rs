use thiserror::Error;

/// A failure reported by the host editor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HostError {
    message: String,
}

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors returned from key and prompt handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A previous keystroke was abandoned while waiting on the host.
    #[error("engine busy: a previous keystroke is still in flight")]
    Busy,
    #[error("host error: {0}")]
    Host(#[from] HostError),
}

/// Ex command failures, shown on the status line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExError {
    #[error("Not an editor command: {0}")]
    NotAnEditorCommand(String),
    #[error("Ambiguous command: {0}")]
    Ambiguous(String),
    #[error("No ! allowed: {0}")]
    BangNotAllowed(&'static str),
    #[error("Trailing characters: {0}")]
    TrailingCharacters(String),
    #[error("Invalid line number: {0}")]
    InvalidLine(String),
    #[error("No write since last change (add ! to override)")]
    UnsavedChanges,
    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("{0}")]
    Host(#[from] HostError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid engine config: {0}")]
    Parse(#[from] serde_json::Error),
}
