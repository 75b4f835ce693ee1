//! Seek-history engine: records large playback-position jumps on page
//! media elements and replays them through undo/redo shortcuts.

pub mod api;
pub mod arbiter;
pub mod config;
pub mod detector;
pub mod discovery;
pub mod error;
pub mod gate;
pub mod history;
pub mod navigation;
pub mod page;
pub mod scheduler;
pub mod time;

pub use api::{Command, Engine, EngineErrorEvent, EngineErrorKind, Event, Timer};
pub use config::{EngineConfig, KeyInput, Modifier, ShortcutConfig};
pub use error::{EngineError, Result};
pub use history::JumpRecord;
pub use navigation::{NavigationEpoch, NavigationSignal};
pub use page::{ElementId, MediaSignal, MediaState, PageBackend};
