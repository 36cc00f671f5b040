//! DOM Serializer - Convert subtrees back to markup
//!
//! This module handles:
//! - HTML serialization (`innerHTML` / `outerHTML`)
//! - Text extraction (`textContent`)
//! - XPath generation for element identification in logs

use crate::arena::DomArena;
use crate::error::Result;
use crate::types::*;

/// DOM Tree Serializer
pub struct DomSerializer<'a> {
    arena: &'a DomArena,
}

impl<'a> DomSerializer<'a> {
    pub fn new(arena: &'a DomArena) -> Self {
        Self { arena }
    }

    /// Markup of the node's children
    pub fn inner_html(&self, node_id: NodeId) -> Result<String> {
        let mut output = String::new();
        let node = self.arena.get(node_id)?;
        let raw = is_raw_text_container(node);
        for &child_id in &node.children_ids {
            self.serialize_node(child_id, raw, &mut output)?;
        }
        Ok(output)
    }

    /// Markup of the node itself
    pub fn outer_html(&self, node_id: NodeId) -> Result<String> {
        let mut output = String::new();
        let raw = match self.arena.get(node_id)?.parent_id {
            Some(parent_id) => is_raw_text_container(self.arena.get(parent_id)?),
            None => false,
        };
        self.serialize_node(node_id, raw, &mut output)?;
        Ok(output)
    }

    /// Concatenated text of every descendant text node
    pub fn text_content(&self, node_id: NodeId) -> Result<String> {
        let node = self.arena.get(node_id)?;
        if matches!(node.node_type, NodeType::Text | NodeType::Comment) {
            return Ok(node.node_value.clone());
        }

        let mut text = String::new();
        self.arena.traverse_df(node_id, |node| {
            if node.node_type == NodeType::Text {
                text.push_str(&node.node_value);
            }
            Ok(())
        })?;
        Ok(text)
    }

    /// Serialize a single node recursively
    fn serialize_node(&self, node_id: NodeId, raw_text: bool, output: &mut String) -> Result<()> {
        let node = self.arena.get(node_id)?;

        match node.node_type {
            NodeType::Element => {
                output.push('<');
                output.push_str(&node.node_name);
                for (name, value) in &node.attributes {
                    output.push(' ');
                    output.push_str(name);
                    output.push_str("=\"");
                    escape_into(value, true, output);
                    output.push('"');
                }
                output.push('>');

                if VOID_ELEMENTS.contains(&node.node_name.as_str()) {
                    return Ok(());
                }

                let raw = is_raw_text_container(node);
                for &child_id in &node.children_ids {
                    self.serialize_node(child_id, raw, output)?;
                }

                output.push_str("</");
                output.push_str(&node.node_name);
                output.push('>');
            }
            NodeType::Text => {
                if raw_text {
                    output.push_str(&node.node_value);
                } else {
                    escape_into(&node.node_value, false, output);
                }
            }
            NodeType::Comment => {
                output.push_str("<!--");
                output.push_str(&node.node_value);
                output.push_str("-->");
            }
            NodeType::DocumentType => {
                output.push_str("<!DOCTYPE ");
                output.push_str(&node.node_name);
                output.push('>');
            }
            NodeType::Document => {
                for &child_id in &node.children_ids {
                    self.serialize_node(child_id, false, output)?;
                }
            }
        }

        Ok(())
    }

    /// Positional path of the element ancestors of `node_id`, e.g.
    /// `/html[1]/body[1]/li[2]`. Used to name targets in dispatch logs.
    pub fn generate_xpath(&self, node_id: NodeId) -> Result<String> {
        let mut steps = Vec::new();
        let mut cursor = Some(node_id);
        while let Some(id) = cursor {
            let node = self.arena.get(id)?;
            if node.node_type == NodeType::Element {
                steps.push(format!("{}[{}]", node.node_name, self.same_name_index(node)?));
            }
            cursor = node.parent_id;
        }

        let mut xpath = String::new();
        for step in steps.iter().rev() {
            xpath.push('/');
            xpath.push_str(step);
        }
        Ok(xpath)
    }

    /// 1-based index among element siblings sharing the node's name
    fn same_name_index(&self, node: &DomNode) -> Result<usize> {
        let Some(parent_id) = node.parent_id else {
            return Ok(1);
        };
        let mut index = 0;
        for &sibling_id in &self.arena.get(parent_id)?.children_ids {
            let sibling = self.arena.get(sibling_id)?;
            if sibling.node_type == NodeType::Element && sibling.node_name == node.node_name {
                index += 1;
            }
            if sibling_id == node.node_id {
                break;
            }
        }
        Ok(index.max(1))
    }
}

fn is_raw_text_container(node: &DomNode) -> bool {
    node.tag_name()
        .is_some_and(|tag| RAW_TEXT_ELEMENTS.contains(&tag))
}

fn escape_into(text: &str, attribute: bool, output: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '\u{a0}' => output.push_str("&nbsp;"),
            '"' if attribute => output.push_str("&quot;"),
            '<' if !attribute => output.push_str("&lt;"),
            '>' if !attribute => output.push_str("&gt;"),
            _ => output.push(ch),
        }
    }
}
