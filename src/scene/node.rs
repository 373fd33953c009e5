use std::collections::HashMap;

use generational_arena::{Arena, Index};
use glam::Mat4;

#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
pub struct NodeId(pub Index);
impl Into<Index> for NodeId {
    fn into(self) -> Index {
        self.0
    }
}

pub struct Node {
    pub name: String,
    /// Parent-relative.
    pub transform: Mat4,
    /// Indices into the owning model's meshes.
    pub meshes: Vec<usize>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}
impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Hierarchy with a single root. A node is owned by exactly one parent's
/// children list; the parent link is a plain back-reference.
pub struct NodeTree {
    nodes: Arena<Node>,
    root: NodeId,
}

/// One node in the flattened, pre-order array.
#[derive(Clone, Copy, Debug)]
pub struct NodeEntry {
    pub node: NodeId,
    /// Index of the parent's entry, always smaller than this entry's index.
    pub parent: Option<usize>,
    /// World transform from the last propagation pass.
    pub world: Mat4,
}
impl NodeEntry {
    /// Parent index with the root encoded as -1.
    pub fn parent_index(&self) -> isize {
        self.parent.map(|p| p as isize).unwrap_or(-1)
    }
}

impl NodeTree {
    pub fn new(root_name: impl Into<String>, transform: Mat4, meshes: Vec<usize>) -> Self {
        let mut nodes = Arena::new();
        let root = NodeId(nodes.insert(Node {
            name: root_name.into(),
            transform,
            meshes,
            parent: None,
            children: vec![],
        }));
        Self { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.into())
    }

    /// Appends a new node under `parent`. Returns `None` if `parent` is not in
    /// the tree.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        transform: Mat4,
        meshes: Vec<usize>,
    ) -> Option<NodeId> {
        if !self.nodes.contains(parent.into()) {
            return None;
        }
        let child = NodeId(self.nodes.insert(Node {
            name: name.into(),
            transform,
            meshes,
            parent: Some(parent),
            children: vec![],
        }));
        self.nodes.get_mut(parent.into())?.children.push(child);
        Some(child)
    }

    /// True if `ancestor` lies on the parent chain of `node`.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.get(node).and_then(|n| n.parent);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.get(id).and_then(|n| n.parent);
        }
        false
    }

    /// Depth-first search, first match wins.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.pre_order().into_iter().map(|(id, _)| id).find(|&id| {
            self.get(id).is_some_and(|n| n.name == name)
        })
    }

    /// Removes `id` and its descendants, children before parents.
    fn release(&mut self, id: NodeId) {
        let children = match self.nodes.get_mut(id.into()) {
            Some(node) => std::mem::take(&mut node.children),
            None => return,
        };
        for child in children {
            self.release(child);
        }
        self.nodes.remove(id.into());
    }

    /// (node, parent entry index) in pre-order, children in stored order.
    fn pre_order(&self) -> Vec<(NodeId, Option<usize>)> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(self.root, None)];
        while let Some((id, parent)) = stack.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            let index = order.len();
            order.push((id, parent));
            // reversed so the first child is popped first
            for &child in node.children.iter().rev() {
                stack.push((child, Some(index)));
            }
        }
        order
    }

    /// Flattens the tree into pre-order entries with world transforms reset to
    /// identity.
    pub fn flatten(&self) -> Vec<NodeEntry> {
        self.pre_order()
            .into_iter()
            .map(|(node, parent)| NodeEntry {
                node,
                parent,
                world: Mat4::IDENTITY,
            })
            .collect()
    }

    /// Single forward pass over `entries`: `world = parent world * local`,
    /// with `root_world` standing in for the root's parent.
    pub fn propagate(&self, entries: &mut [NodeEntry], root_world: Mat4) {
        for i in 0..entries.len() {
            let parent_world = match entries[i].parent {
                Some(p) => {
                    debug_assert!(p < i, "entry {i} precedes its parent {p}");
                    entries[p].world
                }
                None => root_world,
            };
            let local = self
                .get(entries[i].node)
                .map(|n| n.transform)
                .unwrap_or(Mat4::IDENTITY);
            entries[i].world = parent_world * local;
        }
    }

    /// Name to entry index, keeping the first entry for duplicated names.
    pub fn index_by_name(&self, entries: &[NodeEntry]) -> HashMap<String, usize> {
        let mut map = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if let Some(node) = self.get(entry.node) {
                map.entry(node.name.clone()).or_insert(i);
            }
        }
        map
    }
}

impl Drop for NodeTree {
    fn drop(&mut self) {
        let root = self.root;
        self.release(root);
    }
}
