//! Document - Main entry point for DOM operations
//!
//! This handles:
//! - Document construction (blank skeleton or parsed markup)
//! - Tree mutation and queries on top of the arena
//! - Attribute, inline style and class-token access
//! - Listener registration and event dispatch
//! - The loading phase (`readyState`) and its notifications
//!
//! `Document` is a cheap handle: clones share one tree. Single-threaded by
//! construction (`Rc`, `RefCell`); borrows never outlive a method call, so
//! listeners invoked during dispatch may use the document freely.

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::events::{same_listener, Event, Listener, ListenerRegistry, Phase};
use crate::parser;
use crate::selector::SelectorList;
use crate::serializer::DomSerializer;
use crate::types::*;
use crate::utils::{self, cap_text_length};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, trace};

/// Configuration for a document: what the host page supports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Whether elements expose a class token list
    pub class_list: bool,
    pub event_model: EventModel,
    /// Loading phase the document starts in
    pub ready_state: ReadyState,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            class_list: true,
            event_model: EventModel::Standard,
            ready_state: ReadyState::Complete,
        }
    }
}

impl DocumentConfig {
    /// Load from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

struct DocumentInner {
    config: DocumentConfig,
    arena: RefCell<DomArena>,
    listeners: RefCell<ListenerRegistry>,
    ready_state: Cell<ReadyState>,
    content_loaded: Cell<bool>,
    loaded: Cell<bool>,
}

/// Shared handle to one document
#[derive(Clone)]
pub struct Document {
    inner: Rc<DocumentInner>,
}

/// Non-owning handle, for listeners stored inside the document itself
#[derive(Clone)]
pub struct WeakDocument {
    inner: Weak<DocumentInner>,
}

impl WeakDocument {
    pub fn upgrade(&self) -> Option<Document> {
        self.inner.upgrade().map(|inner| Document { inner })
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("config", &self.inner.config)
            .field("ready_state", &self.inner.ready_state.get())
            .field("nodes", &self.inner.arena.borrow().len())
            .finish()
    }
}

impl Document {
    /// Blank document with default config
    pub fn new() -> Self {
        Self::with_config(DocumentConfig::default())
    }

    /// Blank `<html><head></head><body></body></html>` document
    pub fn with_config(config: DocumentConfig) -> Self {
        let mut arena = DomArena::new();
        let root = arena.add_node(DomNode::new(NodeType::Document, "#document"));
        let html = arena.add_node(DomNode::element("html"));
        let head = arena.add_node(DomNode::element("head"));
        let body = arena.add_node(DomNode::element("body"));
        // Fresh ids on an empty arena: none of these can fail
        let _ = arena.set_root(root);
        let _ = arena.append_child(root, html);
        let _ = arena.append_child(html, head);
        let _ = arena.append_child(html, body);
        Self::from_arena(arena, config)
    }

    /// Parse a complete HTML document
    pub fn parse_html(html: &str, config: DocumentConfig) -> Result<Self> {
        let mut arena = DomArena::new();
        parser::parse_document_into(&mut arena, html)?;
        debug!("[Document] Parsed {} nodes", arena.len());
        Ok(Self::from_arena(arena, config))
    }

    fn from_arena(arena: DomArena, config: DocumentConfig) -> Self {
        let state = config.ready_state;
        Self {
            inner: Rc::new(DocumentInner {
                arena: RefCell::new(arena),
                listeners: RefCell::new(ListenerRegistry::default()),
                ready_state: Cell::new(state),
                content_loaded: Cell::new(state != ReadyState::Loading),
                loaded: Cell::new(state == ReadyState::Complete),
                config,
            }),
        }
    }

    pub fn downgrade(&self) -> WeakDocument {
        WeakDocument {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Whether two handles refer to the same document
    pub fn ptr_eq(&self, other: &Document) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.inner.config
    }

    /// Borrow the arena; do not hold across calls that mutate the document
    pub fn arena(&self) -> Ref<'_, DomArena> {
        self.inner.arena.borrow()
    }

    pub fn arena_mut(&self) -> RefMut<'_, DomArena> {
        self.inner.arena.borrow_mut()
    }

    /// The document node
    pub fn root(&self) -> NodeId {
        // Every constructor sets a root
        self.arena().root_id().unwrap_or(0)
    }

    /// The `<html>` element
    pub fn document_element(&self) -> Option<NodeId> {
        let arena = self.arena();
        let root = arena.root_id()?;
        let html = arena
            .child_ids(root)
            .ok()?
            .iter()
            .copied()
            .find(|&id| arena.get(id).is_ok_and(DomNode::is_element));
        html
    }

    pub fn head(&self) -> Option<NodeId> {
        self.child_element(self.document_element()?, "head")
    }

    pub fn body(&self) -> Option<NodeId> {
        self.child_element(self.document_element()?, "body")
    }

    fn child_element(&self, parent: NodeId, tag: &str) -> Option<NodeId> {
        let arena = self.arena();
        let found = arena
            .child_ids(parent)
            .ok()?
            .iter()
            .copied()
            .find(|&id| arena.get(id).is_ok_and(|node| node.tag_name() == Some(tag)));
        found
    }

    // ---- queries ----

    /// Connected elements matching `selector`, in document order
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let list = SelectorList::parse(selector)?;
        let arena = self.arena();
        let Some(root) = arena.root_id() else {
            return Ok(Vec::new());
        };
        Ok(arena
            .descendants(root)?
            .into_iter()
            .filter(|&id| list.matches(&arena, id))
            .collect())
    }

    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        Ok(self.query_selector_all(selector)?.into_iter().next())
    }

    /// Whether one node matches `selector`
    pub fn matches(&self, node_id: NodeId, selector: &str) -> Result<bool> {
        let list = SelectorList::parse(selector)?;
        let arena = self.arena();
        arena.get(node_id)?;
        Ok(list.matches(&arena, node_id))
    }

    pub fn get_element_by_id(&self, id: &str) -> Result<Option<NodeId>> {
        self.arena().find_by_id(id)
    }

    // ---- construction ----

    /// Create a detached element. Unknown names are accepted as-is.
    pub fn create_element(&self, tag: &str) -> Result<NodeId> {
        if tag.is_empty() {
            return Err(DomError::InvalidTagName(tag.to_string()));
        }
        Ok(self.arena_mut().add_node(DomNode::element(tag)))
    }

    pub fn create_text_node(&self, text: &str) -> NodeId {
        self.arena_mut().add_node(DomNode::text(text))
    }

    // ---- node inspection ----

    pub fn node_type(&self, node_id: NodeId) -> Result<NodeType> {
        Ok(self.arena().get(node_id)?.node_type)
    }

    /// Uppercase tag name for elements, node name otherwise
    pub fn tag_name(&self, node_id: NodeId) -> Result<String> {
        let arena = self.arena();
        let node = arena.get(node_id)?;
        Ok(match node.tag_name() {
            Some(tag) => tag.to_ascii_uppercase(),
            None => node.node_name.clone(),
        })
    }

    pub fn parent(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        self.arena().parent_id(node_id)
    }

    pub fn children(&self, node_id: NodeId) -> Result<Vec<NodeId>> {
        Ok(self.arena().child_ids(node_id)?.to_vec())
    }

    pub fn first_child(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.arena().child_ids(node_id)?.first().copied())
    }

    pub fn last_child(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.arena().child_ids(node_id)?.last().copied())
    }

    pub fn is_connected(&self, node_id: NodeId) -> Result<bool> {
        self.arena().is_connected(node_id)
    }

    // ---- text and markup ----

    /// Text content; works on every node type
    pub fn text(&self, node_id: NodeId) -> Result<String> {
        DomSerializer::new(&self.arena()).text_content(node_id)
    }

    /// Replace a container's children with one text node (none for ""),
    /// or overwrite a text/comment node's value
    pub fn set_text(&self, node_id: NodeId, text: &str) -> Result<()> {
        let mut arena = self.arena_mut();
        let node_type = arena.get(node_id)?.node_type;
        match node_type {
            NodeType::Text | NodeType::Comment => {
                arena.get_mut(node_id)?.node_value = text.to_string();
                Ok(())
            }
            NodeType::DocumentType => Ok(()),
            NodeType::Element | NodeType::Document => {
                let children = if text.is_empty() {
                    Vec::new()
                } else {
                    vec![arena.add_node(DomNode::text(text))]
                };
                arena.replace_children(node_id, &children)
            }
        }
    }

    pub fn inner_html(&self, node_id: NodeId) -> Result<String> {
        DomSerializer::new(&self.arena()).inner_html(node_id)
    }

    pub fn outer_html(&self, node_id: NodeId) -> Result<String> {
        DomSerializer::new(&self.arena()).outer_html(node_id)
    }

    /// Parse `markup` and make it the element's only content
    pub fn set_inner_html(&self, node_id: NodeId, markup: &str) -> Result<()> {
        let context = element(&self.arena(), node_id)?.node_name.clone();
        let mut arena = self.arena_mut();
        let nodes = parser::parse_fragment_into(&mut arena, markup, &context)?;
        trace!(
            "[Document] innerHTML of {} <- {:?}",
            node_id,
            cap_text_length(markup, 48)
        );
        arena.replace_children(node_id, &nodes)
    }

    pub fn xpath(&self, node_id: NodeId) -> Result<String> {
        DomSerializer::new(&self.arena()).generate_xpath(node_id)
    }

    // ---- attributes ----

    pub fn attribute(&self, node_id: NodeId, name: &str) -> Result<Option<String>> {
        let arena = self.arena();
        let node = element(&arena, node_id)?;
        Ok(node.attr(&name.to_ascii_lowercase()).map(str::to_string))
    }

    pub fn set_attribute(&self, node_id: NodeId, name: &str, value: &str) -> Result<()> {
        validate_attribute_name(name)?;
        let mut arena = self.arena_mut();
        element_mut(&mut arena, node_id)?.set_attr(&name.to_ascii_lowercase(), value);
        Ok(())
    }

    /// Removing an absent attribute is not an error
    pub fn remove_attribute(&self, node_id: NodeId, name: &str) -> Result<()> {
        let mut arena = self.arena_mut();
        element_mut(&mut arena, node_id)?.remove_attr(&name.to_ascii_lowercase());
        Ok(())
    }

    // ---- inline style ----

    /// Inline style value, empty when unset
    pub fn style_property(&self, node_id: NodeId, name: &str) -> Result<String> {
        let arena = self.arena();
        let node = element(&arena, node_id)?;
        let name = utils::css_property_name(name);
        Ok(utils::parse_style_declarations(node.attr("style"))
            .into_iter()
            .find(|(prop, _)| *prop == name)
            .map(|(_, value)| value)
            .unwrap_or_default())
    }

    /// Set one inline declaration; an empty value removes it
    pub fn set_style_property(&self, node_id: NodeId, name: &str, value: &str) -> Result<()> {
        let mut arena = self.arena_mut();
        let node = element_mut(&mut arena, node_id)?;
        let name = utils::css_property_name(name);
        let value = value.trim();

        let mut decls = utils::parse_style_declarations(node.attr("style"));
        match decls.iter().position(|(prop, _)| *prop == name) {
            Some(pos) if value.is_empty() => {
                decls.remove(pos);
            }
            Some(pos) => decls[pos].1 = value.to_string(),
            None if value.is_empty() => {}
            None => decls.push((name, value.to_string())),
        }

        if decls.is_empty() {
            node.remove_attr("style");
        } else {
            node.set_attr("style", &utils::serialize_style_declarations(&decls));
        }
        Ok(())
    }

    // ---- classes ----

    pub fn class_name(&self, node_id: NodeId) -> Result<String> {
        Ok(self.attribute(node_id, "class")?.unwrap_or_default())
    }

    pub fn set_class_name(&self, node_id: NodeId, value: &str) -> Result<()> {
        self.set_attribute(node_id, "class", value)
    }

    pub fn class_list_add(&self, node_id: NodeId, token: &str) -> Result<()> {
        self.require_class_list()?;
        validate_token(token)?;
        let current = self.class_name(node_id)?;
        self.set_class_name(node_id, &utils::add_class_token(&current, token))
    }

    pub fn class_list_remove(&self, node_id: NodeId, token: &str) -> Result<()> {
        self.require_class_list()?;
        validate_token(token)?;
        let current = self.class_name(node_id)?;
        if !utils::has_class_token(&current, token) {
            return Ok(());
        }
        self.set_class_name(node_id, &utils::remove_class_token(&current, token))
    }

    pub fn class_list_contains(&self, node_id: NodeId, token: &str) -> Result<bool> {
        self.require_class_list()?;
        Ok(utils::has_class_token(&self.class_name(node_id)?, token))
    }

    fn require_class_list(&self) -> Result<()> {
        if self.inner.config.class_list {
            Ok(())
        } else {
            Err(DomError::Unsupported("classList"))
        }
    }

    // ---- tree mutation ----

    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<()> {
        self.arena_mut().append_child(parent, child)
    }

    /// `reference` None appends
    pub fn insert_before(&self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> Result<()> {
        self.arena_mut().insert_before(parent, child, reference)
    }

    pub fn remove_child(&self, parent: NodeId, child: NodeId) -> Result<()> {
        self.arena_mut().remove_child(parent, child)
    }

    /// Structural copy; listeners are not copied
    pub fn clone_node(&self, node_id: NodeId, deep: bool) -> Result<NodeId> {
        self.arena_mut().clone_subtree(node_id, deep)
    }

    /// Structural equality (`isEqualNode`): type, name, value, attributes
    /// regardless of order, and children pairwise
    pub fn is_equal_node(&self, a: NodeId, b: NodeId) -> Result<bool> {
        let arena = self.arena();
        equal_nodes(&arena, a, b)
    }

    // ---- events ----

    pub fn add_event_listener(
        &self,
        node_id: NodeId,
        event_type: &str,
        listener: Listener,
        capture: bool,
    ) -> Result<()> {
        self.require_model(EventModel::Standard, "addEventListener")?;
        self.arena().get(node_id)?;
        self.inner
            .listeners
            .borrow_mut()
            .add(node_id, event_type, listener, capture);
        Ok(())
    }

    pub fn remove_event_listener(
        &self,
        node_id: NodeId,
        event_type: &str,
        listener: &Listener,
        capture: bool,
    ) -> Result<()> {
        self.require_model(EventModel::Standard, "removeEventListener")?;
        self.arena().get(node_id)?;
        self.inner
            .listeners
            .borrow_mut()
            .remove(node_id, event_type, listener, capture);
        Ok(())
    }

    /// Legacy registration; `on_type` carries the `on` prefix
    pub fn attach_event(&self, node_id: NodeId, on_type: &str, listener: Listener) -> Result<()> {
        self.require_model(EventModel::Legacy, "attachEvent")?;
        self.arena().get(node_id)?;
        self.inner
            .listeners
            .borrow_mut()
            .attach(node_id, on_type, listener);
        Ok(())
    }

    pub fn detach_event(&self, node_id: NodeId, on_type: &str, listener: &Listener) -> Result<()> {
        self.require_model(EventModel::Legacy, "detachEvent")?;
        self.arena().get(node_id)?;
        self.inner
            .listeners
            .borrow_mut()
            .detach(node_id, on_type, listener);
        Ok(())
    }

    /// Current `on<event>` property handler
    pub fn event_handler(&self, node_id: NodeId, on_type: &str) -> Result<Option<Listener>> {
        self.arena().get(node_id)?;
        Ok(self.inner.listeners.borrow().handler(node_id, on_type))
    }

    /// Assign (or clear, with None) an `on<event>` property handler
    pub fn set_event_handler(
        &self,
        node_id: NodeId,
        on_type: &str,
        handler: Option<Listener>,
    ) -> Result<()> {
        self.arena().get(node_id)?;
        self.inner
            .listeners
            .borrow_mut()
            .set_handler(node_id, on_type, handler);
        Ok(())
    }

    /// Whether `listener` currently occupies the property slot
    pub fn is_event_handler(&self, node_id: NodeId, on_type: &str, listener: &Listener) -> Result<bool> {
        Ok(self
            .event_handler(node_id, on_type)?
            .is_some_and(|current| same_listener(&current, listener)))
    }

    fn require_model(&self, model: EventModel, api: &'static str) -> Result<()> {
        if self.inner.config.event_model == model {
            Ok(())
        } else {
            Err(DomError::Unsupported(api))
        }
    }

    /// Run capture, target and (if `bubbles`) bubble phases for an event
    pub fn dispatch_event(&self, target: NodeId, event_type: &str, bubbles: bool) -> Result<()> {
        let path = {
            let arena = self.arena();
            let mut path = Vec::new();
            let mut cursor = arena.get(target)?.parent_id;
            while let Some(node_id) = cursor {
                path.push(node_id);
                cursor = arena.get(node_id)?.parent_id;
            }
            let xpath = DomSerializer::new(&arena).generate_xpath(target)?;
            trace!(
                "[Document] dispatch {} on {} at {} (path {:?})",
                event_type,
                target,
                xpath,
                path
            );
            path
        };

        let event = Event::new(event_type, target, bubbles);

        for &node_id in path.iter().rev() {
            if self.invoke(&event, node_id, Phase::Capturing) {
                return Ok(());
            }
        }
        if self.invoke(&event, target, Phase::AtTarget) || !bubbles {
            return Ok(());
        }
        for &node_id in &path {
            if self.invoke(&event, node_id, Phase::Bubbling) {
                break;
            }
        }
        Ok(())
    }

    /// Returns whether propagation was stopped
    fn invoke(&self, event: &Event, node_id: NodeId, phase: Phase) -> bool {
        let listeners = self
            .inner
            .listeners
            .borrow()
            .collect(node_id, &event.event_type, phase);
        if !listeners.is_empty() {
            let event = event.at(node_id, phase);
            for listener in listeners {
                listener(&event);
            }
        }
        event.propagation_stopped()
    }

    // ---- loading phase ----

    pub fn ready_state(&self) -> ReadyState {
        self.inner.ready_state.get()
    }

    /// Move to `state` and fire `readystatechange`, then `DOMContentLoaded`
    /// and `load` the first time their condition is reached
    pub fn set_ready_state(&self, state: ReadyState) -> Result<()> {
        let previous = self.inner.ready_state.replace(state);
        if previous == state {
            return Ok(());
        }
        debug!("[Document] readyState {:?} -> {:?}", previous, state);

        let root = self.root();
        self.dispatch_event(root, "readystatechange", false)?;
        if state != ReadyState::Loading && !self.inner.content_loaded.replace(true) {
            self.dispatch_event(root, "DOMContentLoaded", true)?;
        }
        if state == ReadyState::Complete && !self.inner.loaded.replace(true) {
            self.dispatch_event(root, "load", false)?;
        }
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn element(arena: &DomArena, node_id: NodeId) -> Result<&DomNode> {
    let node = arena.get(node_id)?;
    if node.is_element() {
        Ok(node)
    } else {
        Err(not_an_element(node))
    }
}

fn element_mut(arena: &mut DomArena, node_id: NodeId) -> Result<&mut DomNode> {
    let node = arena.get_mut(node_id)?;
    if node.is_element() {
        Ok(node)
    } else {
        Err(not_an_element(node))
    }
}

fn not_an_element(node: &DomNode) -> DomError {
    DomError::InvalidNodeType {
        expected: "element".to_string(),
        actual: node.node_name.clone(),
    }
}

fn validate_attribute_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name
            .chars()
            .any(|ch| ch.is_whitespace() || ch.is_control() || matches!(ch, '"' | '\'' | '>' | '/' | '='));
    if invalid {
        return Err(DomError::InvalidArgument(format!(
            "invalid attribute name {name:?}"
        )));
    }
    Ok(())
}

fn validate_token(token: &str) -> Result<()> {
    if token.is_empty() || token.chars().any(|ch| ch.is_ascii_whitespace()) {
        return Err(DomError::InvalidArgument(format!(
            "invalid class token {token:?}"
        )));
    }
    Ok(())
}

fn equal_nodes(arena: &DomArena, a: NodeId, b: NodeId) -> Result<bool> {
    let (left, right) = (arena.get(a)?, arena.get(b)?);
    if left.node_type != right.node_type
        || left.node_name != right.node_name
        || left.node_value != right.node_value
        || left.attributes.len() != right.attributes.len()
        || left.children_ids.len() != right.children_ids.len()
    {
        return Ok(false);
    }
    let same_attrs = left
        .attributes
        .iter()
        .all(|(name, value)| right.attr(name) == Some(value.as_str()));
    if !same_attrs {
        return Ok(false);
    }
    for (&l, &r) in left.children_ids.iter().zip(right.children_ids.iter()) {
        if !equal_nodes(arena, l, r)? {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn listener(log: &Rc<RefCell<Vec<String>>>, label: &'static str) -> Listener {
        let log = Rc::clone(log);
        Rc::new(move |event: &Event| {
            log.borrow_mut()
                .push(format!("{label}:{}:{:?}", event.current_target, event.phase))
        })
    }

    #[test]
    fn test_blank_document_skeleton() {
        let doc = Document::new();
        let html = doc.document_element().unwrap();
        let body = doc.body().unwrap();

        assert_eq!(doc.tag_name(html).unwrap(), "HTML");
        assert_eq!(doc.parent(body).unwrap(), Some(html));
        assert!(doc.head().is_some());
        assert_eq!(doc.ready_state(), ReadyState::Complete);
    }

    #[test]
    fn test_config_from_json() {
        let json = serde_json::json!({ "event_model": "legacy", "ready_state": "loading" });
        let config = DocumentConfig::from_json(&json.to_string()).unwrap();

        assert!(config.class_list);
        assert_eq!(config.event_model, EventModel::Legacy);
        assert_eq!(config.ready_state, ReadyState::Loading);
        assert!(matches!(
            DocumentConfig::from_json("{"),
            Err(DomError::Config(_))
        ));
    }

    #[test]
    fn test_query_selector_sees_only_connected() {
        let doc = Document::new();
        let body = doc.body().unwrap();
        let div = doc.create_element("div").unwrap();
        assert!(doc.query_selector_all("div").unwrap().is_empty());

        doc.append_child(body, div).unwrap();
        assert_eq!(doc.query_selector_all("div").unwrap(), vec![div]);
        assert_eq!(doc.query_selector("body > div").unwrap(), Some(div));

        doc.remove_child(body, div).unwrap();
        assert!(doc.query_selector_all("div").unwrap().is_empty());
        assert!(matches!(
            doc.query_selector_all(""),
            Err(DomError::Selector(_))
        ));
    }

    #[test]
    fn test_create_element_tolerates_unknown_names() {
        let doc = Document::new();
        let custom = doc.create_element("Fancy-Widget").unwrap();

        assert_eq!(doc.tag_name(custom).unwrap(), "FANCY-WIDGET");
        assert!(matches!(
            doc.create_element(""),
            Err(DomError::InvalidTagName(_))
        ));
    }

    #[test]
    fn test_text_and_markup() {
        let doc = Document::new();
        let div = doc.create_element("div").unwrap();

        doc.set_inner_html(div, "<b>bold</b> text").unwrap();
        assert_eq!(doc.inner_html(div).unwrap(), "<b>bold</b> text");
        assert_eq!(doc.text(div).unwrap(), "bold text");

        doc.set_text(div, "<plain>").unwrap();
        assert_eq!(doc.inner_html(div).unwrap(), "&lt;plain&gt;");
        assert_eq!(doc.children(div).unwrap().len(), 1);

        doc.set_text(div, "").unwrap();
        assert!(doc.first_child(div).unwrap().is_none());
    }

    #[test]
    fn test_inner_html_parses_in_element_context() {
        let doc = Document::parse_html(
            "<table><tbody><tr id=r></tr></tbody></table>",
            DocumentConfig::default(),
        )
        .unwrap();
        let row = doc.get_element_by_id("r").unwrap().unwrap();

        doc.set_inner_html(row, "<td>x</td><td>y</td>").unwrap();
        assert_eq!(doc.inner_html(row).unwrap(), "<td>x</td><td>y</td>");
        assert_eq!(doc.query_selector_all("tr > td").unwrap().len(), 2);

        let body = doc.body().unwrap();
        doc.set_inner_html(body, "<td>z</td>").unwrap();
        assert_eq!(doc.inner_html(body).unwrap(), "z");
    }

    #[test]
    fn test_attributes_on_non_elements_fail() {
        let doc = Document::new();
        let text = doc.create_text_node("x");

        assert!(matches!(
            doc.set_attribute(text, "id", "a"),
            Err(DomError::InvalidNodeType { .. })
        ));
        assert!(matches!(
            doc.set_inner_html(text, "<b></b>"),
            Err(DomError::InvalidNodeType { .. })
        ));
        assert_eq!(doc.text(text).unwrap(), "x");
    }

    #[test]
    fn test_attribute_names() {
        let doc = Document::new();
        let div = doc.create_element("div").unwrap();

        doc.set_attribute(div, "Data-X", "1").unwrap();
        assert_eq!(doc.attribute(div, "data-x").unwrap().as_deref(), Some("1"));
        assert!(matches!(
            doc.set_attribute(div, "bad name", "1"),
            Err(DomError::InvalidArgument(_))
        ));
        doc.remove_attribute(div, "missing").unwrap();
    }

    #[test]
    fn test_inline_style() {
        let doc = Document::new();
        let div = doc.create_element("div").unwrap();

        doc.set_style_property(div, "backgroundColor", "red").unwrap();
        doc.set_style_property(div, "width", "20px").unwrap();
        assert_eq!(
            doc.attribute(div, "style").unwrap().as_deref(),
            Some("background-color: red; width: 20px;")
        );
        assert_eq!(doc.style_property(div, "background-color").unwrap(), "red");
        assert_eq!(doc.style_property(div, "height").unwrap(), "");

        doc.set_style_property(div, "backgroundColor", "").unwrap();
        doc.set_style_property(div, "width", "").unwrap();
        assert_eq!(doc.attribute(div, "style").unwrap(), None);
    }

    #[test]
    fn test_inline_style_keeps_nested_separators() {
        let doc = Document::parse_html(
            r#"<div style="background-image: url(data:image/png;base64,AAAA); width: 5px"></div>"#,
            DocumentConfig::default(),
        )
        .unwrap();
        let div = doc.query_selector("div").unwrap().unwrap();

        assert_eq!(
            doc.style_property(div, "background-image").unwrap(),
            "url(data:image/png;base64,AAAA)"
        );
        doc.set_style_property(div, "color", "red").unwrap();
        assert_eq!(
            doc.attribute(div, "style").unwrap().as_deref(),
            Some("background-image: url(data:image/png;base64,AAAA); width: 5px; color: red;")
        );

        doc.set_style_property(div, "content", r#""a;b""#).unwrap();
        doc.set_style_property(div, "width", "6px").unwrap();
        assert_eq!(doc.style_property(div, "content").unwrap(), r#""a;b""#);
        assert_eq!(doc.style_property(div, "width").unwrap(), "6px");
    }

    #[test]
    fn test_class_list_capability() {
        let doc = Document::new();
        let div = doc.create_element("div").unwrap();
        doc.class_list_add(div, "a").unwrap();
        doc.class_list_add(div, "b").unwrap();
        doc.class_list_remove(div, "a").unwrap();
        assert_eq!(doc.class_name(div).unwrap(), "b");
        assert!(matches!(
            doc.class_list_add(div, "two words"),
            Err(DomError::InvalidArgument(_))
        ));

        let bare = Document::with_config(DocumentConfig {
            class_list: false,
            ..DocumentConfig::default()
        });
        let div = bare.create_element("div").unwrap();
        assert!(matches!(
            bare.class_list_add(div, "a"),
            Err(DomError::Unsupported("classList"))
        ));
    }

    #[test]
    fn test_clone_and_equality() {
        let doc = Document::new();
        let div = doc.create_element("div").unwrap();
        doc.set_inner_html(div, "<p title=t>x</p>").unwrap();

        let deep = doc.clone_node(div, true).unwrap();
        let shallow = doc.clone_node(div, false).unwrap();
        assert!(doc.is_equal_node(div, deep).unwrap());
        assert!(!doc.is_equal_node(div, shallow).unwrap());

        let copied_p = doc.first_child(deep).unwrap().unwrap();
        doc.set_attribute(copied_p, "title", "changed").unwrap();
        assert!(!doc.is_equal_node(div, deep).unwrap());
    }

    #[test]
    fn test_dispatch_phases() {
        let doc = Document::new();
        let body = doc.body().unwrap();
        let div = doc.create_element("div").unwrap();
        doc.append_child(body, div).unwrap();

        let log = Rc::new(RefCell::new(Vec::new()));
        doc.add_event_listener(body, "click", listener(&log, "bubble"), false)
            .unwrap();
        doc.add_event_listener(body, "click", listener(&log, "capture"), true)
            .unwrap();
        doc.add_event_listener(div, "click", listener(&log, "target"), false)
            .unwrap();

        doc.dispatch_event(div, "click", true).unwrap();
        assert_eq!(
            *log.borrow(),
            vec![
                format!("capture:{body}:Capturing"),
                format!("target:{div}:AtTarget"),
                format!("bubble:{body}:Bubbling"),
            ]
        );

        log.borrow_mut().clear();
        doc.dispatch_event(div, "click", false).unwrap();
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_stop_propagation() {
        let doc = Document::new();
        let body = doc.body().unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));

        let stopper: Listener = Rc::new(|event: &Event| event.stop_propagation());
        doc.add_event_listener(body, "click", stopper, false).unwrap();
        doc.add_event_listener(doc.root(), "click", listener(&log, "root"), false)
            .unwrap();

        doc.dispatch_event(body, "click", true).unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_event_model_gates_apis() {
        let doc = Document::with_config(DocumentConfig {
            event_model: EventModel::Legacy,
            ..DocumentConfig::default()
        });
        let body = doc.body().unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));

        assert!(matches!(
            doc.add_event_listener(body, "click", listener(&log, "x"), false),
            Err(DomError::Unsupported("addEventListener"))
        ));
        let legacy = listener(&log, "legacy");
        doc.attach_event(body, "onclick", Rc::clone(&legacy)).unwrap();
        doc.set_event_handler(body, "onclick", Some(listener(&log, "prop")))
            .unwrap();

        doc.dispatch_event(body, "click", true).unwrap();
        assert_eq!(log.borrow().len(), 2);

        doc.detach_event(body, "onclick", &legacy).unwrap();
        doc.set_event_handler(body, "onclick", None).unwrap();
        log.borrow_mut().clear();
        doc.dispatch_event(body, "click", true).unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_listener_may_mutate_document() {
        let doc = Document::new();
        let body = doc.body().unwrap();
        let weak = doc.downgrade();
        let mutate: Listener = Rc::new(move |event: &Event| {
            if let Some(doc) = weak.upgrade() {
                let _ = doc.set_attribute(event.current_target, "data-clicked", "yes");
            }
        });
        doc.add_event_listener(body, "click", mutate, false).unwrap();

        doc.dispatch_event(body, "click", true).unwrap();
        assert_eq!(
            doc.attribute(body, "data-clicked").unwrap().as_deref(),
            Some("yes")
        );
    }

    #[test]
    fn test_ready_state_notifications() {
        let doc = Document::with_config(DocumentConfig {
            ready_state: ReadyState::Loading,
            ..DocumentConfig::default()
        });
        let root = doc.root();
        let log = Rc::new(RefCell::new(Vec::new()));
        for name in ["readystatechange", "DOMContentLoaded", "load"] {
            let log = Rc::clone(&log);
            let record: Listener = Rc::new(move |event: &Event| {
                log.borrow_mut().push(event.event_type.clone())
            });
            doc.add_event_listener(root, name, record, false).unwrap();
        }

        doc.set_ready_state(ReadyState::Interactive).unwrap();
        doc.set_ready_state(ReadyState::Interactive).unwrap();
        doc.set_ready_state(ReadyState::Complete).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                "readystatechange",
                "DOMContentLoaded",
                "readystatechange",
                "load"
            ]
        );
    }

    #[test]
    fn test_parse_html_document() {
        let doc = Document::parse_html(
            "<ul><li class=item>a</li><li class=item>b</li></ul>",
            DocumentConfig::default(),
        )
        .unwrap();

        let items = doc.query_selector_all("li.item").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(doc.text(items[1]).unwrap(), "b");
        assert_eq!(doc.xpath(items[1]).unwrap(), "/html[1]/body[1]/ul[1]/li[2]");
    }
}
