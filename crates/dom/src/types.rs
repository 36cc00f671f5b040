//! Core type definitions for the document tree
//!
//! Key design principles:
//! 1. Use u32 for indices (4 bytes vs 8 bytes pointer)
//! 2. Use SmallVec for small arrays (avoid heap allocation)
//! 3. Keep attribute order: serialization must be deterministic

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Node identifier (index into arena)
/// u32 allows 4 billion nodes, enough for any webpage
pub type NodeId = u32;

/// Node type, numbered as `Node.nodeType`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeType {
    Element = 1,
    Text = 3,
    Comment = 8,
    Document = 9,
    DocumentType = 10,
}

impl NodeType {
    /// Whether nodes of this type may hold children
    pub fn is_container(self) -> bool {
        matches!(self, NodeType::Element | NodeType::Document)
    }
}

/// Document loading phase (`document.readyState`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadyState {
    Loading,
    Interactive,
    #[default]
    Complete,
}

/// Which listener API the document exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventModel {
    /// `addEventListener` / `removeEventListener`
    #[default]
    Standard,
    /// `attachEvent` / `detachEvent` with `on`-prefixed names
    Legacy,
    /// Only `on<event>` handler properties
    Property,
}

/// Ordered attribute list. Most elements carry fewer than four.
pub type Attributes = SmallVec<[(String, String); 4]>;

/// The main DOM tree node structure
///
/// Design philosophy:
/// - Small fixed-size fields first (better packing)
/// - Use indices instead of pointers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomNode {
    pub node_id: NodeId,
    pub node_type: NodeType, // 1 byte

    pub parent_id: Option<NodeId>,
    pub children_ids: SmallVec<[NodeId; 4]>, // Most nodes have <4 children

    /// Lowercase local name for elements, `#text`, `#comment` or
    /// `#document` otherwise, the doctype name for doctypes
    pub node_name: String,
    pub node_value: String,
    pub attributes: Attributes,
}

impl DomNode {
    /// Create a detached node; the arena assigns its id
    pub fn new(node_type: NodeType, node_name: impl Into<String>) -> Self {
        Self {
            node_id: 0,
            node_type,
            parent_id: None,
            children_ids: SmallVec::new(),
            node_name: node_name.into(),
            node_value: String::new(),
            attributes: SmallVec::new(),
        }
    }

    pub fn element(tag: &str) -> Self {
        Self::new(NodeType::Element, tag.to_ascii_lowercase())
    }

    pub fn text(value: impl Into<String>) -> Self {
        let mut node = Self::new(NodeType::Text, "#text");
        node.node_value = value.into();
        node
    }

    pub fn comment(value: impl Into<String>) -> Self {
        let mut node = Self::new(NodeType::Comment, "#comment");
        node.node_value = value.into();
        node
    }

    /// Get tag name for element nodes
    pub fn tag_name(&self) -> Option<&str> {
        if self.node_type == NodeType::Element {
            Some(&self.node_name)
        } else {
            None
        }
    }

    /// Check if node is an element
    pub fn is_element(&self) -> bool {
        self.node_type == NodeType::Element
    }

    /// Check if node is text
    pub fn is_text(&self) -> bool {
        self.node_type == NodeType::Text
    }

    /// Get attribute value
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set attribute, replacing an existing value in place
    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => {
                existing.clear();
                existing.push_str(value);
            }
            None => self.attributes.push((name.to_string(), value.to_string())),
        }
    }

    /// Remove attribute, returns whether it was present
    pub fn remove_attr(&mut self, name: &str) -> bool {
        let before = self.attributes.len();
        self.attributes.retain(|(key, _)| key != name);
        before != self.attributes.len()
    }
}

/// Elements serialized without an end tag
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose text children serialize unescaped
pub const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_attr_keeps_position() {
        let mut node = DomNode::element("DIV");
        node.set_attr("id", "a");
        node.set_attr("class", "b");
        node.set_attr("id", "c");

        assert_eq!(node.node_name, "div");
        assert_eq!(node.attr("id"), Some("c"));
        assert_eq!(node.attributes[0].0, "id");
        assert!(node.remove_attr("id"));
        assert!(!node.remove_attr("id"));
        assert_eq!(node.attr("id"), None);
    }

    #[test]
    fn test_config_enums_are_lowercase() {
        let state: ReadyState = serde_json::from_str("\"loading\"").unwrap();
        assert_eq!(state, ReadyState::Loading);
        assert_eq!(
            serde_json::to_string(&EventModel::Legacy).unwrap(),
            "\"legacy\""
        );
    }
}
