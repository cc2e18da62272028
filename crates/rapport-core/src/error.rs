use std::fmt;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    EngineNotConfigured,
    EntityNotFound,
    ScoreOutOfRange,
    SelfRating,
    UnknownGraphNode,
    TraversalContractViolation,
    EngineTranslationFailed,
    EngineInvocationFailed,
    StoreWriteFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::EngineNotConfigured => "E1003",
            Self::EntityNotFound => "E2001",
            Self::ScoreOutOfRange => "E2002",
            Self::SelfRating => "E2003",
            Self::UnknownGraphNode => "E3001",
            Self::TraversalContractViolation => "E3002",
            Self::EngineTranslationFailed => "E4001",
            Self::EngineInvocationFailed => "E4002",
            Self::StoreWriteFailed => "E5001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Project not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::EngineNotConfigured => "No scoring engine configured",
            Self::EntityNotFound => "Entity not found",
            Self::ScoreOutOfRange => "Rating score out of range",
            Self::SelfRating => "Entity cannot rate itself",
            Self::UnknownGraphNode => "Rating references an unknown entity",
            Self::TraversalContractViolation => "Edge vanished during neighborhood traversal",
            Self::EngineTranslationFailed => "Scoring engine returned an unusable result",
            Self::EngineInvocationFailed => "Scoring engine invocation failed",
            Self::StoreWriteFailed => "Store read/write failed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `rp init` to initialize this directory."),
            Self::ConfigParseError => Some("Fix syntax in .rapport/config.toml and retry."),
            Self::EngineNotConfigured => {
                Some("Set `engine.command` in .rapport/config.toml to the scoring engine program.")
            }
            Self::EntityNotFound => Some("Register the entity with `rp entity add <id>` first."),
            Self::ScoreOutOfRange => Some("Use a score between 1 and 10."),
            Self::SelfRating | Self::TraversalContractViolation => None,
            Self::UnknownGraphNode => {
                Some("Every rating endpoint must be a registered entity; check the store.")
            }
            Self::EngineTranslationFailed => {
                Some("The engine must return integer entity ids mapped to finite scores.")
            }
            Self::EngineInvocationFailed => {
                Some("Check that the engine program runs standalone and reads JSON on stdin.")
            }
            Self::StoreWriteFailed => Some("Check disk space and write permissions."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
