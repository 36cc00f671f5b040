//! Per-member context handed to event handlers and iteration callbacks

use dom::{utils, Document, Event, Listener, NodeId, Result};
use std::fmt;
use std::rc::Rc;

/// An event handler; it receives the member it was bound to
pub type Handler = Rc<dyn Fn(&Element, &Event)>;

pub(crate) fn same_handler(a: &Handler, b: &Handler) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

/// One member of an `ElementSet`
#[derive(Clone)]
pub struct Element {
    doc: Document,
    node: NodeId,
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element").field("node", &self.node).finish()
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node && self.doc.ptr_eq(&other.doc)
    }
}

impl Element {
    pub fn new(doc: &Document, node: NodeId) -> Self {
        Self {
            doc: doc.clone(),
            node,
        }
    }

    pub fn id(&self) -> NodeId {
        self.node
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn tag_name(&self) -> Result<String> {
        self.doc.tag_name(self.node)
    }

    pub fn attr(&self, name: &str) -> Result<Option<String>> {
        self.doc.attribute(self.node, name)
    }

    pub fn set_attr(&self, name: &str, value: &str) -> Result<()> {
        self.doc.set_attribute(self.node, name, value)
    }

    pub fn text(&self) -> Result<String> {
        self.doc.text(self.node)
    }

    pub fn set_text(&self, text: &str) -> Result<()> {
        self.doc.set_text(self.node, text)
    }

    /// Token check on the class attribute; works without a token-list API
    pub fn has_class(&self, token: &str) -> Result<bool> {
        Ok(utils::has_class_token(&self.doc.class_name(self.node)?, token))
    }

    pub fn parent(&self) -> Result<Option<Element>> {
        Ok(self.doc.parent(self.node)?.map(|node| Element::new(&self.doc, node)))
    }
}

/// Wrap `handler` so it sees `node` as its element.
///
/// The listener lives in the document's registry, so it holds the
/// document weakly.
pub(crate) fn bind_to_member(doc: &Document, node: NodeId, handler: &Handler) -> Listener {
    let weak = doc.downgrade();
    let handler = Rc::clone(handler);
    Rc::new(move |event: &Event| {
        if let Some(doc) = weak.upgrade() {
            handler(&Element { doc, node }, event);
        }
    })
}
