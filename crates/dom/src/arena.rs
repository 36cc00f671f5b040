//! Node storage for one document tree
//!
//! Nodes live in a single `Vec` and refer to each other by index.
//! Slots are never freed: detaching a node only unlinks it, so a
//! `NodeId` held by a caller stays valid for the life of the arena.
//!
//! ```text
//! nodes: [#document][html][head][body][div (detached)]...
//!             0        1     2     3         4
//! ```

use crate::error::{DomError, Result};
use crate::types::{DomNode, NodeId, NodeType};
use smallvec::SmallVec;

/// Index-linked tree of `DomNode`s
#[derive(Debug, Clone)]
pub struct DomArena {
    /// All nodes stored sequentially (cache-friendly)
    nodes: Vec<DomNode>,

    /// Root node ID (if set)
    root_id: Option<NodeId>,
}

impl DomArena {
    /// Create a new empty arena
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Create arena with specific capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            root_id: None,
        }
    }

    /// Add a detached node to the arena, returns its ID
    pub fn add_node(&mut self, mut node: DomNode) -> NodeId {
        let node_id = self.nodes.len() as NodeId;
        node.node_id = node_id;
        node.parent_id = None;
        node.children_ids.clear();
        self.nodes.push(node);
        node_id
    }

    /// Get node by ID (immutable)
    pub fn get(&self, node_id: NodeId) -> Result<&DomNode> {
        self.nodes
            .get(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by ID (mutable)
    pub fn get_mut(&mut self, node_id: NodeId) -> Result<&mut DomNode> {
        self.nodes
            .get_mut(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Set root node
    pub fn set_root(&mut self, node_id: NodeId) -> Result<()> {
        // Verify node exists
        self.get(node_id)?;
        self.root_id = Some(node_id);
        Ok(())
    }

    /// Get root node ID
    pub fn root_id(&self) -> Option<NodeId> {
        self.root_id
    }

    /// Total number of nodes, attached or not
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if arena is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterator over all nodes
    pub fn iter(&self) -> impl Iterator<Item = &DomNode> {
        self.nodes.iter()
    }

    /// Child IDs of a node, in order
    pub fn child_ids(&self, node_id: NodeId) -> Result<&[NodeId]> {
        Ok(&self.get(node_id)?.children_ids)
    }

    /// Get children of a node
    pub fn children(&self, node_id: NodeId) -> Result<Vec<&DomNode>> {
        let node = self.get(node_id)?;
        node.children_ids
            .iter()
            .map(|&child_id| self.get(child_id))
            .collect()
    }

    /// Get parent ID of a node
    pub fn parent_id(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.get(node_id)?.parent_id)
    }

    /// Whether `ancestor` is `node` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node_id: NodeId) -> Result<bool> {
        let mut cursor = Some(node_id);
        while let Some(current) = cursor {
            if current == ancestor {
                return Ok(true);
            }
            cursor = self.get(current)?.parent_id;
        }
        Ok(false)
    }

    /// Whether the node is reachable from the root
    pub fn is_connected(&self, node_id: NodeId) -> Result<bool> {
        match self.root_id {
            Some(root_id) => self.is_inclusive_ancestor(root_id, node_id),
            None => Ok(false),
        }
    }

    /// Preorder walk from `start_id`, iterative
    pub fn traverse_df<F>(&self, start_id: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(&DomNode) -> Result<()>,
    {
        let mut stack = vec![start_id];

        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id)?;
            visit(node)?;

            // Push children in reverse order (so they're visited left-to-right)
            for &child_id in node.children_ids.iter().rev() {
                stack.push(child_id);
            }
        }

        Ok(())
    }

    /// Descendants of a node in document order, excluding the node itself
    pub fn descendants(&self, node_id: NodeId) -> Result<Vec<NodeId>> {
        let mut out = Vec::new();
        self.traverse_df(node_id, |node| {
            if node.node_id != node_id {
                out.push(node.node_id);
            }
            Ok(())
        })?;
        Ok(out)
    }

    /// Find nodes matching predicate, attached or not
    pub fn find<F>(&self, predicate: F) -> Vec<NodeId>
    where
        F: Fn(&DomNode) -> bool,
    {
        self.nodes
            .iter()
            .filter(|node| predicate(node))
            .map(|node| node.node_id)
            .collect()
    }

    /// Find all elements by tag name
    pub fn find_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.find(|node| node.is_element() && node.node_name.eq_ignore_ascii_case(tag))
    }

    /// First connected element carrying the given id attribute
    pub fn find_by_id(&self, id: &str) -> Result<Option<NodeId>> {
        let Some(root_id) = self.root_id else {
            return Ok(None);
        };
        Ok(self
            .descendants(root_id)?
            .into_iter()
            .find(|&node_id| {
                self.get(node_id)
                    .is_ok_and(|node| node.is_element() && node.attr("id") == Some(id))
            }))
    }

    /// Append `child` as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference`, or at the end when `reference` is None.
    ///
    /// A child that already has a parent is moved, not copied.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        let parent_node = self.get(parent)?;
        if !parent_node.node_type.is_container() {
            return Err(DomError::HierarchyRequest(format!(
                "{} cannot have children",
                parent_node.node_name
            )));
        }
        if self.get(child)?.node_type == NodeType::Document {
            return Err(DomError::HierarchyRequest(
                "a document cannot be inserted".to_string(),
            ));
        }
        if self.is_inclusive_ancestor(child, parent)? {
            return Err(DomError::HierarchyRequest(
                "a node cannot be inserted into itself or its descendant".to_string(),
            ));
        }
        if let Some(reference) = reference {
            if self.get(reference)?.parent_id != Some(parent) {
                return Err(DomError::NotFound(format!(
                    "node {reference} is not a child of node {parent}"
                )));
            }
            if reference == child {
                return Ok(());
            }
        }

        self.detach(child)?;

        let parent_node = self.get_mut(parent)?;
        let index = reference
            .and_then(|reference| {
                parent_node
                    .children_ids
                    .iter()
                    .position(|&id| id == reference)
            })
            .unwrap_or(parent_node.children_ids.len());
        parent_node.children_ids.insert(index, child);
        self.get_mut(child)?.parent_id = Some(parent);
        Ok(())
    }

    /// Remove `child` from `parent`; fails if it is not a direct child
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.get(child)?.parent_id != Some(parent) {
            return Err(DomError::NotFound(format!(
                "node {child} is not a child of node {parent}"
            )));
        }
        self.detach(child).map(|_| ())
    }

    /// Unlink a node from its parent, returns whether it had one
    pub fn detach(&mut self, node_id: NodeId) -> Result<bool> {
        let Some(parent_id) = self.get_mut(node_id)?.parent_id.take() else {
            return Ok(false);
        };
        self.get_mut(parent_id)?
            .children_ids
            .retain(|id| *id != node_id);
        Ok(true)
    }

    /// Replace every child of `parent` with `children`
    pub fn replace_children(&mut self, parent: NodeId, children: &[NodeId]) -> Result<()> {
        let old: SmallVec<[NodeId; 4]> = std::mem::take(&mut self.get_mut(parent)?.children_ids);
        for child in old {
            self.get_mut(child)?.parent_id = None;
        }
        for &child in children {
            self.append_child(parent, child)?;
        }
        Ok(())
    }

    /// Copy a node (and, when `deep`, its subtree) into new detached slots
    pub fn clone_subtree(&mut self, node_id: NodeId, deep: bool) -> Result<NodeId> {
        let mut copy = self.get(node_id)?.clone();
        let children = std::mem::take(&mut copy.children_ids);
        let copy_id = self.add_node(copy);

        if deep {
            for child in children {
                let child_copy = self.clone_subtree(child, true)?;
                self.append_child(copy_id, child_copy)?;
            }
        }

        Ok(copy_id)
    }
}

impl Default for DomArena {
    fn default() -> Self {
        Self::new()
    }
}
