//! ElementSet - ordered, fixed-size collection of document nodes
//!
//! Membership never changes after construction. Every mutator writes
//! through to the document and hands back the same set for chaining;
//! readers collapse their per-member results into `OneOrMany`.

use crate::access::{Access, Field, OneOrMany, Outcome};
use crate::context::Jc;
use crate::element::{bind_to_member, Element, Handler};
use dom::{Document, DomError, NodeId, Result};
use smallvec::SmallVec;
use std::iter::Copied;
use std::ops::Index;
use std::rc::Rc;
use std::slice;
use tracing::trace;

/// What `Jc::select` wraps
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target<'a> {
    /// Every connected element matching a selector, in document order
    Query(&'a str),
    Node(NodeId),
    /// Each node, in the given order
    Nodes(Vec<NodeId>),
}

impl<'a> From<&'a str> for Target<'a> {
    fn from(selector: &'a str) -> Self {
        Target::Query(selector)
    }
}

impl<'a> From<&'a String> for Target<'a> {
    fn from(selector: &'a String) -> Self {
        Target::Query(selector)
    }
}

impl From<NodeId> for Target<'_> {
    fn from(node: NodeId) -> Self {
        Target::Node(node)
    }
}

impl From<Vec<NodeId>> for Target<'_> {
    fn from(nodes: Vec<NodeId>) -> Self {
        Target::Nodes(nodes)
    }
}

impl From<&[NodeId]> for Target<'_> {
    fn from(nodes: &[NodeId]) -> Self {
        Target::Nodes(nodes.to_vec())
    }
}

impl From<&ElementSet> for Target<'_> {
    fn from(set: &ElementSet) -> Self {
        Target::Nodes(set.nodes.to_vec())
    }
}

/// The node `append`/`prepend` insert: a bare node, or the first member
/// of a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Child<'a> {
    Node(NodeId),
    Nodes(&'a [NodeId]),
}

impl Child<'_> {
    fn resolve(self) -> Option<NodeId> {
        match self {
            Child::Node(node) => Some(node),
            Child::Nodes(nodes) => nodes.first().copied(),
        }
    }
}

impl From<NodeId> for Child<'_> {
    fn from(node: NodeId) -> Self {
        Child::Node(node)
    }
}

impl<'a> From<&'a [NodeId]> for Child<'a> {
    fn from(nodes: &'a [NodeId]) -> Self {
        Child::Nodes(nodes)
    }
}

impl<'a> From<&'a ElementSet> for Child<'a> {
    fn from(set: &'a ElementSet) -> Self {
        Child::Nodes(&set.nodes)
    }
}

#[derive(Debug, Clone)]
pub struct ElementSet {
    ctx: Jc,
    nodes: SmallVec<[NodeId; 4]>,
}

impl ElementSet {
    pub(crate) fn new(ctx: &Jc, nodes: Vec<NodeId>) -> Self {
        Self {
            ctx: ctx.clone(),
            nodes: SmallVec::from_vec(nodes),
        }
    }

    pub fn context(&self) -> &Jc {
        &self.ctx
    }

    pub fn document(&self) -> &Document {
        &self.ctx.inner.doc
    }

    // ---- iteration ----

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<NodeId> {
        self.nodes.get(index).copied()
    }

    pub fn iter(&self) -> Copied<slice::Iter<'_, NodeId>> {
        self.nodes.iter().copied()
    }

    pub fn elements(&self) -> impl Iterator<Item = Element> + '_ {
        self.nodes
            .iter()
            .map(move |&node| Element::new(self.document(), node))
    }

    /// One result per member, with the member's index
    pub fn map<T>(&self, mut f: impl FnMut(&Element, usize) -> T) -> Vec<T> {
        self.elements()
            .enumerate()
            .map(|(index, element)| f(&element, index))
            .collect()
    }

    /// `map`, collapsed: the bare value for a one-member set
    pub fn map_one<T>(&self, f: impl FnMut(&Element, usize) -> T) -> OneOrMany<T> {
        OneOrMany::from_vec(self.map(f))
    }

    pub fn for_each(&self, mut f: impl FnMut(&Element, usize)) -> &Self {
        for (index, element) in self.elements().enumerate() {
            f(&element, index);
        }
        self
    }

    // ---- accessors ----

    /// Apply one get/set descriptor to every member
    pub fn access(&self, field: Field, access: Access<'_>) -> Result<Outcome> {
        field.check(&access)?;
        let doc = self.document();
        match access {
            Access::Get(name) => {
                let values = self
                    .nodes
                    .iter()
                    .map(|&node| field.read(doc, node, name))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Outcome::Read(OneOrMany::from_vec(values)))
            }
            Access::SetOne(name, value) => {
                for &node in &self.nodes {
                    field.write(doc, node, name, value)?;
                }
                Ok(Outcome::Written)
            }
            Access::SetMany(pairs) => {
                for &node in &self.nodes {
                    for &(name, value) in pairs {
                        field.write(doc, node, name, value)?;
                    }
                }
                Ok(Outcome::Written)
            }
        }
    }

    fn read(&self, field: Field, name: &str) -> Result<OneOrMany<Option<String>>> {
        match self.access(field, Access::Get(name))? {
            Outcome::Read(values) => Ok(values),
            Outcome::Written => Ok(OneOrMany::Empty),
        }
    }

    fn write(&self, field: Field, access: Access<'_>) -> Result<&Self> {
        self.access(field, access)?;
        Ok(self)
    }

    pub fn text(&self) -> Result<OneOrMany<String>> {
        Ok(self.read(Field::Text, "")?.map(Option::unwrap_or_default))
    }

    pub fn set_text(&self, text: &str) -> Result<&Self> {
        self.write(Field::Text, Access::SetOne("", text))
    }

    pub fn html(&self) -> Result<OneOrMany<String>> {
        Ok(self.read(Field::Html, "")?.map(Option::unwrap_or_default))
    }

    pub fn set_html(&self, markup: &str) -> Result<&Self> {
        self.write(Field::Html, Access::SetOne("", markup))
    }

    /// `None` for members without the attribute
    pub fn attr(&self, name: &str) -> Result<OneOrMany<Option<String>>> {
        self.read(Field::Attribute, name)
    }

    pub fn set_attr(&self, name: &str, value: &str) -> Result<&Self> {
        self.write(Field::Attribute, Access::SetOne(name, value))
    }

    pub fn set_attrs(&self, pairs: &[(&str, &str)]) -> Result<&Self> {
        self.write(Field::Attribute, Access::SetMany(pairs))
    }

    pub fn remove_attr(&self, name: &str) -> Result<&Self> {
        let doc = self.document();
        for &node in &self.nodes {
            doc.remove_attribute(node, name)?;
        }
        Ok(self)
    }

    /// Inline style value per member, empty when unset
    pub fn css(&self, name: &str) -> Result<OneOrMany<String>> {
        Ok(self.read(Field::Style, name)?.map(Option::unwrap_or_default))
    }

    pub fn set_css(&self, name: &str, value: &str) -> Result<&Self> {
        self.write(Field::Style, Access::SetOne(name, value))
    }

    pub fn set_css_map(&self, pairs: &[(&str, &str)]) -> Result<&Self> {
        self.write(Field::Style, Access::SetMany(pairs))
    }

    // ---- classes ----

    pub fn add_class(&self, token: &str) -> Result<&Self> {
        let doc = self.document();
        for &node in &self.nodes {
            self.ctx.inner.classes.add(doc, node, token)?;
        }
        Ok(self)
    }

    pub fn remove_class(&self, token: &str) -> Result<&Self> {
        let doc = self.document();
        for &node in &self.nodes {
            self.ctx.inner.classes.remove(doc, node, token)?;
        }
        Ok(self)
    }

    pub fn has_class(&self, token: &str) -> Result<OneOrMany<bool>> {
        let values = self
            .elements()
            .map(|element| element.has_class(token))
            .collect::<Result<Vec<_>>>()?;
        Ok(OneOrMany::from_vec(values))
    }

    // ---- tree mutation ----

    /// Append the child to every member.
    ///
    /// One node can have one parent: with several members, each append
    /// moves the child, and it ends up under the last member only.
    pub fn append<'c>(&self, child: impl Into<Child<'c>>) -> Result<&Self> {
        let Some(child) = self.child_for_insert(child.into())? else {
            return Ok(self);
        };
        let doc = self.document();
        for &node in &self.nodes {
            doc.append_child(node, child)?;
        }
        Ok(self)
    }

    /// Insert the child before every member's first child; moves like `append`
    pub fn prepend<'c>(&self, child: impl Into<Child<'c>>) -> Result<&Self> {
        let Some(child) = self.child_for_insert(child.into())? else {
            return Ok(self);
        };
        let doc = self.document();
        for &node in &self.nodes {
            let first = doc.first_child(node)?;
            doc.insert_before(node, child, first)?;
        }
        Ok(self)
    }

    fn child_for_insert(&self, child: Child<'_>) -> Result<Option<NodeId>> {
        if self.is_empty() {
            return Ok(None);
        }
        match child.resolve() {
            Some(node) => Ok(Some(node)),
            None => Err(DomError::InvalidArgument(
                "no node to insert: the child set is empty".to_string(),
            )),
        }
    }

    /// Copy the first member into a new one-member set. Bound handlers
    /// are not copied.
    pub fn clone_node(&self, deep: bool) -> Result<ElementSet> {
        let nodes = match self.nodes.first() {
            Some(&node) => vec![self.document().clone_node(node, deep)?],
            None => Vec::new(),
        };
        Ok(ElementSet::new(&self.ctx, nodes))
    }

    /// Detach every member from its parent; parentless members are skipped.
    ///
    /// Handlers bound through `on` on a member or its descendants are
    /// unbound and forgotten, so a removed subtree inserted again fires
    /// none of them.
    pub fn remove(&self) -> Result<&Self> {
        let ctx = &self.ctx.inner;
        let doc = self.document();
        for &node in &self.nodes {
            let bound = {
                let arena = doc.arena();
                let mut subtree = Vec::new();
                for candidate in ctx.bindings.borrow().nodes() {
                    if arena.is_inclusive_ancestor(node, candidate)? {
                        subtree.push(candidate);
                    }
                }
                ctx.bindings.borrow_mut().take_nodes(&subtree)
            };
            for (member, event_type, entry) in bound {
                ctx.binding
                    .unbind(doc, member, &event_type, &entry.listener, entry.capture)?;
            }

            if let Some(parent) = doc.parent(node)? {
                doc.remove_child(parent, node)?;
            }
        }
        Ok(self)
    }

    // ---- events ----

    pub fn on(&self, event_type: &str, handler: &Handler) -> Result<&Self> {
        self.on_capture(event_type, handler, false)
    }

    /// Bind a per-member copy of `handler`; `off` with the same handler
    /// undoes it
    pub fn on_capture(&self, event_type: &str, handler: &Handler, capture: bool) -> Result<&Self> {
        let ctx = &self.ctx.inner;
        for &node in &self.nodes {
            let listener = bind_to_member(&ctx.doc, node, handler);
            ctx.binding
                .bind(&ctx.doc, node, event_type, Rc::clone(&listener), capture)?;
            ctx.bindings
                .borrow_mut()
                .record(node, event_type, handler, listener, capture);
        }
        trace!(
            "[Jc] on {:?} bound on {} element(s) via {}",
            event_type,
            self.len(),
            ctx.binding.name()
        );
        Ok(self)
    }

    /// Unbind everything `on` bound for this handler and event type
    pub fn off(&self, event_type: &str, handler: &Handler) -> Result<&Self> {
        let ctx = &self.ctx.inner;
        for &node in &self.nodes {
            let bound = ctx.bindings.borrow_mut().take(node, event_type, handler);
            for entry in bound {
                ctx.binding
                    .unbind(&ctx.doc, node, event_type, &entry.listener, entry.capture)?;
            }
        }
        Ok(self)
    }

    pub fn ready(&self, callback: impl FnOnce() + 'static) -> Result<&Self> {
        self.ctx.ready(callback)?;
        Ok(self)
    }
}

impl Index<usize> for ElementSet {
    type Output = NodeId;

    fn index(&self, index: usize) -> &NodeId {
        &self.nodes[index]
    }
}

impl<'a> IntoIterator for &'a ElementSet {
    type Item = NodeId;
    type IntoIter = Copied<slice::Iter<'a, NodeId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
