//! HTML import: html5ever parses, the arena stores
//!
//! ```text
//! markup → html5ever (RcDom) → import() → DomArena nodes
//! ```
//!
//! html5ever never fails on bad markup; error recovery is part of the
//! HTML tree construction algorithm.

use crate::arena::DomArena;
use crate::error::Result;
use crate::types::{DomNode, NodeId, NodeType};
use html5ever::tendril::TendrilSink;
use html5ever::{namespace_url, ns, parse_document, parse_fragment, LocalName, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// Parse a complete document and make it the arena root
pub fn parse_document_into(arena: &mut DomArena, html: &str) -> Result<NodeId> {
    let dom = parse_document(RcDom::default(), Default::default()).one(html);
    let root = match import(arena, &dom.document)? {
        Some(root) => root,
        None => arena.add_node(DomNode::new(NodeType::Document, "#document")),
    };
    arena.set_root(root)?;
    Ok(root)
}

/// Parse markup as the content of a `context` element (its lowercase
/// local name), returning detached top-level nodes.
///
/// The context decides the insertion mode: `<td>` survives under `tr`
/// but is dropped under `body`.
pub fn parse_fragment_into(arena: &mut DomArena, html: &str, context: &str) -> Result<Vec<NodeId>> {
    let context = QualName::new(None, ns!(html), LocalName::from(context));
    let dom = parse_fragment(RcDom::default(), Default::default(), context, Vec::new()).one(html);

    // The fragment parser wraps its output in a synthetic <html> element
    let children = dom.document.children.borrow();
    let wrapper = children.iter().find(|child| {
        matches!(&child.data, NodeData::Element { name, .. } if &*name.local == "html")
    });
    let top_level: Vec<Handle> = match wrapper {
        Some(wrapper) => wrapper.children.borrow().clone(),
        None => children.clone(),
    };

    let mut out = Vec::with_capacity(top_level.len());
    for handle in &top_level {
        if let Some(node_id) = import(arena, handle)? {
            out.push(node_id);
        }
    }
    Ok(out)
}

/// Copy an html5ever subtree into the arena
fn import(arena: &mut DomArena, handle: &Handle) -> Result<Option<NodeId>> {
    let mut children = handle.children.borrow().clone();

    let node = match &handle.data {
        NodeData::Document => DomNode::new(NodeType::Document, "#document"),
        NodeData::Doctype { name, .. } => DomNode::new(NodeType::DocumentType, name.to_string()),
        NodeData::Text { contents } => DomNode::text(contents.borrow().to_string()),
        NodeData::Comment { contents } => DomNode::comment(contents.to_string()),
        NodeData::Element {
            name,
            attrs,
            template_contents,
            ..
        } => {
            let mut element = DomNode::element(&name.local);
            for attr in attrs.borrow().iter() {
                element.set_attr(&attr.name.local, &attr.value);
            }
            // <template> keeps its parsed children in a separate fragment
            if let Some(contents) = template_contents.borrow().as_ref() {
                children.extend(contents.children.borrow().iter().cloned());
            }
            element
        }
        NodeData::ProcessingInstruction { .. } => return Ok(None),
    };

    let node_id = arena.add_node(node);
    for child in &children {
        if let Some(child_id) = import(arena, child)? {
            arena.append_child(node_id, child_id)?;
        }
    }
    Ok(Some(node_id))
}
