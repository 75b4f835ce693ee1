use std::fmt::{Display, Formatter};

use page_sim::{NodeId, SimDocument};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::time::is_usable_duration;

/// Opaque identity of one node in the host page.
///
/// The engine keys its state by id and never owns the node itself, so a
/// node the page drops simply stops resolving through [`PageBackend`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ElementId(pub u64);

impl Display for ElementId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

impl From<NodeId> for ElementId {
    fn from(value: NodeId) -> Self {
        Self(value.0)
    }
}

impl From<ElementId> for NodeId {
    fn from(value: ElementId) -> Self {
        NodeId(value.0)
    }
}

/// Observable state of one media element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaState {
    pub position: f64,
    pub duration: f64,
    pub seekable_ranges: usize,
    pub paused: bool,
    pub ended: bool,
    pub ready_state: u8,
}

impl MediaState {
    /// Playing means neither paused nor ended.
    pub fn is_playing(&self) -> bool {
        !self.paused && !self.ended
    }

    /// A non-empty seekable range and a finite, positive duration.
    pub fn is_seekable(&self) -> bool {
        self.seekable_ranges > 0 && is_usable_duration(self.duration)
    }
}

/// Media element events the engine listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaSignal {
    LoadedMetadata,
    DurationChanged,
    CanPlay,
    Playing,
    Paused,
    Ended,
}

impl MediaSignal {
    /// Signals after which an unseekable element may have become seekable.
    pub fn is_readiness(self) -> bool {
        matches!(
            self,
            Self::LoadedMetadata | Self::DurationChanged | Self::CanPlay
        )
    }
}

/// Host page operations required by the engine.
pub trait PageBackend {
    /// Canonical location identifier (`location.href`).
    fn location(&self) -> String;

    /// Document root used as the traversal start.
    fn document(&self) -> ElementId;

    /// Light-DOM children of `node` in document order.
    fn children(&self, node: ElementId) -> Vec<ElementId>;

    /// Open shadow root hosted by `node`.
    fn shadow_root(&self, node: ElementId) -> Option<ElementId>;

    fn is_media(&self, node: ElementId) -> bool;

    /// Current state of a media element, or `None` once it is unreachable.
    fn media_state(&self, media: ElementId) -> Option<MediaState>;

    /// Programmatically repositions playback.
    fn set_position(&mut self, media: ElementId, seconds: f64) -> Result<()>;
}

impl PageBackend for SimDocument {
    fn location(&self) -> String {
        SimDocument::location(self).to_owned()
    }

    fn document(&self) -> ElementId {
        self.root().into()
    }

    fn children(&self, node: ElementId) -> Vec<ElementId> {
        SimDocument::children(self, node.into())
            .iter()
            .copied()
            .map(ElementId::from)
            .collect()
    }

    fn shadow_root(&self, node: ElementId) -> Option<ElementId> {
        SimDocument::shadow_root(self, node.into()).map(ElementId::from)
    }

    fn is_media(&self, node: ElementId) -> bool {
        self.media(node.into()).is_some()
    }

    fn media_state(&self, media: ElementId) -> Option<MediaState> {
        let media = self.media(media.into())?;
        Some(MediaState {
            position: media.position(),
            duration: media.duration(),
            seekable_ranges: media.seekable().len(),
            paused: media.paused(),
            ended: media.ended(),
            ready_state: media.ready_state().level(),
        })
    }

    fn set_position(&mut self, media: ElementId, seconds: f64) -> Result<()> {
        if !self.contains(media.into()) {
            return Err(EngineError::ElementUnreachable { element: media });
        }
        self.media_mut(media.into())?.seek(seconds)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use page_sim::{SimDocument, SimMedia};

    use super::{ElementId, MediaState, PageBackend};
    use crate::error::EngineError;

    #[test]
    fn media_state_reports_none_after_removal() {
        let mut doc = SimDocument::new("https://example.test/");
        let video = doc
            .append_media(doc.root(), SimMedia::loaded(60.0).expect("duration"))
            .expect("append");
        let id = ElementId::from(video);
        assert!(doc.media_state(id).is_some());

        doc.remove(video).expect("remove");

        assert!(doc.media_state(id).is_none());
        assert!(matches!(
            doc.set_position(id, 1.0),
            Err(EngineError::ElementUnreachable { element }) if element == id
        ));
    }

    #[test]
    fn live_stream_is_not_seekable() {
        let mut doc = SimDocument::new("https://example.test/");
        let video = doc
            .append_media(doc.root(), SimMedia::live())
            .expect("append");

        let state = doc.media_state(video.into()).expect("state");

        assert!(!state.is_seekable());
    }

    #[test]
    fn ended_media_is_not_playing() {
        let state = MediaState {
            position: 10.0,
            duration: 10.0,
            seekable_ranges: 1,
            paused: false,
            ended: true,
            ready_state: 4,
        };

        assert!(!state.is_playing());
        assert!(state.is_seekable());
    }
}
