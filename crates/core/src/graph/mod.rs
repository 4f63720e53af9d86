use std::sync::Arc;

use crate::{
    assets::Texture,
    geometry::{Point, Rectangle},
    Result, StageError,
};

/// Handle to a node stored in a [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// What a node draws.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Groups children; draws nothing itself.
    Container,
    /// Draws a texture with its top-left corner at the node position.
    Sprite(Arc<Texture>),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    position: Point,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena of visual nodes. Nodes are never freed; detaching a subtree only
/// unlinks it from its parent so the handle stays valid for re-attachment.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<Node>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn create_container(&mut self) -> NodeId {
        self.push(NodeKind::Container)
    }

    pub fn create_sprite(&mut self, texture: Arc<Texture>) -> NodeId {
        self.push(NodeKind::Sprite(texture))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            position: Point::ORIGIN,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Appends `child` to `parent`, unlinking it from any previous parent first.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.node(parent)?;
        self.node(child)?;

        if parent == child {
            return Err(StageError::InvalidHierarchy("a node cannot contain itself"));
        }
        if self.ancestors(parent).any(|ancestor| ancestor == child) {
            return Err(StageError::InvalidHierarchy(
                "a node cannot be attached below one of its descendants",
            ));
        }

        if let Some(previous) = self.nodes[child.0].parent {
            if previous == parent {
                return Ok(());
            }
            self.unlink(previous, child);
        }

        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.node(parent)?;
        if self.node(child)?.parent != Some(parent) {
            return Err(StageError::InvalidHierarchy("node is not a child of the given parent"));
        }

        self.unlink(parent, child);
        self.nodes[child.0].parent = None;
        Ok(())
    }

    fn unlink(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.retain(|&id| id != child);
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(&self.node(id)?.children)
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    pub fn kind(&self, id: NodeId) -> Result<&NodeKind> {
        Ok(&self.node(id)?.kind)
    }

    pub fn position(&self, id: NodeId) -> Result<Point> {
        Ok(self.node(id)?.position)
    }

    pub fn set_position(&mut self, id: NodeId, position: Point) -> Result<()> {
        self.node_mut(id)?.position = position;
        Ok(())
    }

    /// Position of the node after applying every ancestor's offset.
    pub fn world_position(&self, id: NodeId) -> Result<Point> {
        let mut position = self.node(id)?.position;
        for ancestor in self.ancestors(id) {
            position = position.offset(self.nodes[ancestor.0].position);
        }
        Ok(position)
    }

    /// Bounds in the node's own coordinate space, covering its whole subtree.
    pub fn local_bounds(&self, id: NodeId) -> Result<Rectangle> {
        let node = self.node(id)?;
        let own = match &node.kind {
            NodeKind::Container => Rectangle::EMPTY,
            NodeKind::Sprite(texture) => {
                Rectangle::new(0.0, 0.0, texture.width() as f32, texture.height() as f32)
            }
        };

        node.children.iter().try_fold(own, |acc, &child| -> Result<Rectangle> {
            let offset = self.nodes[child.0].position;
            Ok(acc.union(self.local_bounds(child)?.translate(offset)))
        })
    }

    /// Bounds of the node's subtree in world space.
    pub fn bounds(&self, id: NodeId) -> Result<Rectangle> {
        let local = self.local_bounds(id)?;
        if local.is_empty() {
            return Ok(local);
        }
        Ok(local.translate(self.world_position(id)?))
    }

    /// Depth-first, parent-before-children traversal starting at `root`.
    pub fn walk(&self, root: NodeId) -> Result<Vec<NodeId>> {
        self.node(root)?;
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev());
        }
        Ok(order)
    }

    fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.nodes.get(id.0).and_then(|n| n.parent), |current| {
            self.nodes[current.0].parent
        })
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id.0).ok_or(StageError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(id.0).ok_or(StageError::UnknownNode(id))
    }
}
