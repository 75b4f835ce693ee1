use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug)]
pub enum CliError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    UnknownNode {
        name: String,
    },
    DuplicateNode {
        name: String,
    },
    Engine(engine::EngineError),
    Page(page_sim::SimError),
    Output(std::io::Error),
    Encode(serde_json::Error),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse {}: {source}", path.display())
            }
            Self::UnknownNode { name } => write!(f, "scenario refers to unknown node {name:?}"),
            Self::DuplicateNode { name } => write!(f, "scenario defines node {name:?} twice"),
            Self::Engine(err) => write!(f, "{err}"),
            Self::Page(err) => write!(f, "page step failed: {err}"),
            Self::Output(err) => write!(f, "failed to write events: {err}"),
            Self::Encode(err) => write!(f, "failed to encode event: {err}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Engine(err) => Some(err),
            Self::Page(err) => Some(err),
            Self::Output(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::UnknownNode { .. } | Self::DuplicateNode { .. } => None,
        }
    }
}

impl From<engine::EngineError> for CliError {
    fn from(value: engine::EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<page_sim::SimError> for CliError {
    fn from(value: page_sim::SimError) -> Self {
        Self::Page(value)
    }
}
