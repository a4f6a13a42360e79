use crate::types::EntityKind;

/// Failure reported by the host construction API.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HostError {
    #[error("sketch {0} does not exist")]
    UnknownSketch(u32),

    #[error("face {0} does not exist")]
    UnknownFace(u32),

    #[error("body {0} does not exist")]
    UnknownBody(u32),

    #[error("sketch {0} has no closed profile")]
    EmptyProfile(u32),

    #[error("{0}")]
    Rejected(String),
}

/// A command cannot run in the current document state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PreconditionError {
    #[error("No active design found. Please create or open a design first.")]
    NoActiveDesign,

    #[error("{guidance}")]
    NothingSelected {
        expected: EntityKind,
        guidance: &'static str,
    },

    #[error("Please select a {} (not {}).", kind_label(.expected), other_kinds(.expected))]
    WrongSelection {
        expected: EntityKind,
        found: EntityKind,
    },

    #[error("Please select exactly one {}; {count} entities are selected.", kind_label(.expected))]
    AmbiguousSelection { expected: EntityKind, count: usize },
}

fn kind_label(kind: &EntityKind) -> &'static str {
    kind.label()
}

fn other_kinds(kind: &EntityKind) -> &'static str {
    match kind {
        EntityKind::Face => "an edge or body",
        EntityKind::Body => "a face or edge",
        EntityKind::Edge => "a face or body",
    }
}

/// Everything the dispatcher can report instead of a success.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DispatchError {
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Invalid parameter '{name}' for {action}: {reason}")]
    InvalidParameter {
        action: &'static str,
        name: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error("Failed to {verb}: {source}")]
    Execution {
        verb: &'static str,
        #[source]
        source: HostError,
    },
}

/// Transport-level failure talking to the completion endpoint.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    #[error("Invalid API key. Please check your API key.")]
    InvalidCredential,

    #[error("API rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("HTTP Error {status}: {reason}")]
    Http { status: u16, reason: String },

    #[error("Network error: request timed out after {0}s")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response from AI service: {0}")]
    UnexpectedReply(String),
}

/// Free text could not be turned into a command.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InterpretError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("AI returned invalid JSON format")]
    InvalidJson { raw: String },

    #[error("AI reply did not name an action")]
    MissingAction { raw: String },

    #[error("{message}")]
    Declined { message: String, raw: String },

    #[error("Command not recognized. Try {}", crate::fallback::EXAMPLE_PHRASES.join(", "))]
    Unrecognized,
}

impl InterpretError {
    /// The model's raw reply, when there was one.
    pub fn raw_reply(&self) -> Option<&str> {
        match self {
            InterpretError::InvalidJson { raw }
            | InterpretError::MissingAction { raw }
            | InterpretError::Declined { raw, .. } => Some(raw),
            _ => None,
        }
    }
}
