//! In-memory host page used to drive the seek-history engine: a small DOM
//! with open shadow roots, media elements and a session history.

mod dom;
mod error;
mod location;
mod media;

pub use dom::{NodeId, NodeKind, SimDocument};
pub use error::{Result, SimError};
pub use location::SessionHistory;
pub use media::{ReadyState, SimMedia, TimeRange};
