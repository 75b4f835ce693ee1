use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use tracing::debug;

use crate::error::{Result, SimError};
use crate::location::SessionHistory;
use crate::media::SimMedia;

/// Identifier of a node in a [`SimDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// What a node is.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Document,
    Element { tag: String },
    ShadowRoot,
    Media(SimMedia),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    shadow_root: Option<NodeId>,
}

/// Arena-backed document with open shadow roots and a session history.
///
/// Nodes are always created attached. Removing a node drops its whole
/// subtree (shadow roots included), after which the ids are unreachable.
///
/// # Example
/// ```
/// use page_sim::{SimDocument, SimMedia};
///
/// let mut doc = SimDocument::new("https://example.test/");
/// let player = doc.append_element(doc.root(), "div").expect("append");
/// let shadow = doc.attach_shadow(player).expect("attach");
/// let video = doc
///     .append_media(shadow, SimMedia::loaded(60.0).expect("duration"))
///     .expect("append media");
///
/// assert_eq!(doc.shadow_root(player), Some(shadow));
/// assert!(doc.media(video).is_some());
/// ```
#[derive(Debug, Clone)]
pub struct SimDocument {
    nodes: HashMap<NodeId, Node>,
    root: NodeId,
    next_id: u64,
    history: SessionHistory,
}

impl SimDocument {
    pub fn new(location: impl Into<String>) -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
                shadow_root: None,
            },
        );
        Self {
            nodes,
            root,
            next_id: 1,
            history: SessionHistory::new(location),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn location(&self) -> &str {
        self.history.current()
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut SessionHistory {
        &mut self.history
    }

    /// Returns true while `node` is part of the document.
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    pub fn kind(&self, node: NodeId) -> Option<&NodeKind> {
        self.nodes.get(&node).map(|node| &node.kind)
    }

    /// Light-DOM children in document order; empty for unknown nodes.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(&node)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.nodes.get(&host).and_then(|node| node.shadow_root)
    }

    pub fn media(&self, node: NodeId) -> Option<&SimMedia> {
        match self.nodes.get(&node).map(|node| &node.kind) {
            Some(NodeKind::Media(media)) => Some(media),
            _ => None,
        }
    }

    pub fn media_mut(&mut self, node: NodeId) -> Result<&mut SimMedia> {
        match self.nodes.get_mut(&node).map(|node| &mut node.kind) {
            Some(NodeKind::Media(media)) => Ok(media),
            Some(_) => Err(SimError::NotMedia { node }),
            None => Err(SimError::NodeNotFound { node }),
        }
    }

    pub fn append_element(&mut self, parent: NodeId, tag: impl Into<String>) -> Result<NodeId> {
        self.append(parent, NodeKind::Element { tag: tag.into() })
    }

    pub fn append_media(&mut self, parent: NodeId, media: SimMedia) -> Result<NodeId> {
        self.append(parent, NodeKind::Media(media))
    }

    /// Attaches an open shadow root to `host`.
    pub fn attach_shadow(&mut self, host: NodeId) -> Result<NodeId> {
        let host_node = self
            .nodes
            .get(&host)
            .ok_or(SimError::NodeNotFound { node: host })?;
        if host_node.shadow_root.is_some() {
            return Err(SimError::ShadowRootExists { host });
        }
        if !matches!(host_node.kind, NodeKind::Element { .. }) {
            return Err(SimError::NotAContainer { node: host });
        }

        let id = self.allocate_id();
        self.nodes.insert(
            id,
            Node {
                kind: NodeKind::ShadowRoot,
                parent: Some(host),
                children: Vec::new(),
                shadow_root: None,
            },
        );
        if let Some(host_node) = self.nodes.get_mut(&host) {
            host_node.shadow_root = Some(id);
        }
        Ok(id)
    }

    /// Removes `node` and its subtree, shadow roots included.
    pub fn remove(&mut self, node: NodeId) -> Result<()> {
        if node == self.root {
            return Err(SimError::CannotRemoveDocument);
        }
        let parent = self
            .nodes
            .get(&node)
            .ok_or(SimError::NodeNotFound { node })?
            .parent;

        if let Some(parent) = parent.and_then(|parent| self.nodes.get_mut(&parent)) {
            parent.children.retain(|child| *child != node);
            if parent.shadow_root == Some(node) {
                parent.shadow_root = None;
            }
        }

        let mut stack = vec![node];
        let mut removed = 0usize;
        while let Some(current) = stack.pop() {
            let Some(entry) = self.nodes.remove(&current) else {
                continue;
            };
            removed += 1;
            stack.extend(entry.children);
            stack.extend(entry.shadow_root);
        }
        debug!(%node, removed, "subtree removed");
        Ok(())
    }

    /// Advances every playing media element by `ms`.
    pub fn advance_playback(&mut self, ms: u64) {
        for node in self.nodes.values_mut() {
            if let NodeKind::Media(media) = &mut node.kind {
                media.advance(ms);
            }
        }
    }

    fn append(&mut self, parent: NodeId, kind: NodeKind) -> Result<NodeId> {
        let parent_node = self
            .nodes
            .get(&parent)
            .ok_or(SimError::NodeNotFound { node: parent })?;
        if matches!(parent_node.kind, NodeKind::Media(_)) {
            return Err(SimError::NotAContainer { node: parent });
        }

        let id = self.allocate_id();
        self.nodes.insert(
            id,
            Node {
                kind,
                parent: Some(parent),
                children: Vec::new(),
                shadow_root: None,
            },
        );
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.push(id);
        }
        Ok(id)
    }

    fn allocate_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::{NodeKind, SimDocument};
    use crate::error::SimError;
    use crate::media::SimMedia;

    #[test]
    fn children_keep_insertion_order() {
        let mut doc = SimDocument::new("https://example.test/");
        let a = doc.append_element(doc.root(), "div").expect("append a");
        let b = doc.append_element(doc.root(), "div").expect("append b");

        assert_eq!(doc.children(doc.root()), &[a, b]);
    }

    #[test]
    fn media_elements_cannot_host_children() {
        let mut doc = SimDocument::new("https://example.test/");
        let video = doc
            .append_media(doc.root(), SimMedia::unloaded())
            .expect("append media");

        let result = doc.append_element(video, "track");

        assert_eq!(result, Err(SimError::NotAContainer { node: video }));
    }

    #[test]
    fn attaching_a_second_shadow_root_fails() {
        let mut doc = SimDocument::new("https://example.test/");
        let host = doc.append_element(doc.root(), "player").expect("append");
        doc.attach_shadow(host).expect("first attach");

        assert_eq!(
            doc.attach_shadow(host),
            Err(SimError::ShadowRootExists { host })
        );
    }

    #[test]
    fn removing_a_host_drops_its_shadow_tree() {
        let mut doc = SimDocument::new("https://example.test/");
        let host = doc.append_element(doc.root(), "player").expect("append");
        let shadow = doc.attach_shadow(host).expect("attach");
        let video = doc
            .append_media(shadow, SimMedia::unloaded())
            .expect("append media");

        doc.remove(host).expect("remove host");

        assert!(!doc.contains(host));
        assert!(!doc.contains(shadow));
        assert!(!doc.contains(video));
        assert!(doc.children(doc.root()).is_empty());
    }

    #[test]
    fn media_mut_rejects_plain_elements() {
        let mut doc = SimDocument::new("https://example.test/");
        let div = doc.append_element(doc.root(), "div").expect("append");

        assert!(matches!(doc.kind(div), Some(NodeKind::Element { .. })));
        assert_eq!(
            doc.media_mut(div).map(|_| ()),
            Err(SimError::NotMedia { node: div })
        );
    }

    #[test]
    fn document_root_cannot_be_removed() {
        let mut doc = SimDocument::new("https://example.test/");

        assert_eq!(doc.remove(doc.root()), Err(SimError::CannotRemoveDocument));
    }
}
