//! Failures reported by a container runtime

use thiserror::Error;

use crate::model::ResourceId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandKind {
    Start,
    Stop,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Start => "start",
            CommandKind::Stop => "stop",
        }
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RuntimeError {
    /// The daemon did not answer at all
    #[error("container runtime unavailable: {message}")]
    Unavailable { message: String },

    #[error("failed to {action} {id}: {message}")]
    Command {
        action: CommandKind,
        id: ResourceId,
        message: String,
    },

    #[error("failed to read logs for {id}: {message}")]
    Logs { id: ResourceId, message: String },

    /// The daemon answered the listing with an error
    #[error("failed to list containers: {message}")]
    Listing { message: String },
}

impl RuntimeError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn command(action: CommandKind, id: impl Into<ResourceId>, message: impl Into<String>) -> Self {
        Self::Command {
            action,
            id: id.into(),
            message: message.into(),
        }
    }

    pub fn logs(id: impl Into<ResourceId>, message: impl Into<String>) -> Self {
        Self::Logs {
            id: id.into(),
            message: message.into(),
        }
    }

    pub fn listing(message: impl Into<String>) -> Self {
        Self::Listing {
            message: message.into(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
