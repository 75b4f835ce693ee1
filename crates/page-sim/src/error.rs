use std::fmt::{Display, Formatter};

use crate::dom::NodeId;

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, SimError>;

/// Error type for simulated DOM and media operations.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    NodeNotFound { node: NodeId },
    NotMedia { node: NodeId },
    ShadowRootExists { host: NodeId },
    NotAContainer { node: NodeId },
    CannotRemoveDocument,
    InvalidPosition(f64),
    InvalidDuration(f64),
}

impl Display for SimError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NodeNotFound { node } => write!(f, "node not found: {node}"),
            Self::NotMedia { node } => write!(f, "node is not a media element: {node}"),
            Self::ShadowRootExists { host } => {
                write!(f, "shadow root already attached to {host}")
            }
            Self::NotAContainer { node } => {
                write!(f, "cannot append children under {node}")
            }
            Self::CannotRemoveDocument => write!(f, "the document node cannot be removed"),
            Self::InvalidPosition(value) => write!(f, "invalid playback position: {value}"),
            Self::InvalidDuration(value) => write!(f, "invalid media duration: {value}"),
        }
    }
}

impl std::error::Error for SimError {}
