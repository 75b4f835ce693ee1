use std::fmt::{Display, Formatter};

use crate::page::ElementId;

/// Result type used by the engine crate.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors produced by engine commands and the page backend.
///
/// Domain conditions such as an unseekable element or an empty undo stack
/// are not errors; they degrade to no-ops and are only logged.
#[derive(Debug)]
pub enum EngineError {
    NotRunning,
    AlreadyStarted,
    InvalidConfig {
        reason: String,
    },
    ConfigParse {
        source: serde_json::Error,
    },
    ElementUnreachable {
        element: ElementId,
    },
    Page(page_sim::SimError),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotRunning => write!(f, "engine is not running"),
            Self::AlreadyStarted => write!(f, "engine has already been started"),
            Self::InvalidConfig { reason } => write!(f, "invalid engine config: {reason}"),
            Self::ConfigParse { source } => write!(f, "engine config could not be parsed ({source})"),
            Self::ElementUnreachable { element } => {
                write!(f, "media element is no longer reachable: {element}")
            }
            Self::Page(err) => write!(f, "page backend error: {err}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ConfigParse { source } => Some(source),
            Self::Page(err) => Some(err),
            _ => None,
        }
    }
}

impl From<page_sim::SimError> for EngineError {
    fn from(value: page_sim::SimError) -> Self {
        Self::Page(value)
    }
}
