//! Factory context: the explicit replacement for a global `jc` namespace
//!
//! A `Jc` belongs to one document. Capability detection happens once in
//! `Jc::new`; every set created through the context shares the chosen
//! strategies and the handler table `off` relies on.

use crate::binding::{detect, BindingTable, EventBinding};
use crate::set::{ElementSet, Target};
use dom::{utils, Document, NodeId, ReadyState, Result};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// How class tokens are edited on this document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassTokens {
    /// The document's token-list API
    TokenList,
    /// Rewriting the whitespace-separated `class` attribute
    ClassName,
}

impl ClassTokens {
    pub fn add(self, doc: &Document, node: NodeId, token: &str) -> Result<()> {
        match self {
            ClassTokens::TokenList => doc.class_list_add(node, token),
            ClassTokens::ClassName => {
                validate_token(token)?;
                let current = doc.class_name(node)?;
                doc.set_class_name(node, &utils::add_class_token(&current, token))
            }
        }
    }

    pub fn remove(self, doc: &Document, node: NodeId, token: &str) -> Result<()> {
        match self {
            ClassTokens::TokenList => doc.class_list_remove(node, token),
            ClassTokens::ClassName => {
                validate_token(token)?;
                let current = doc.class_name(node)?;
                if !utils::has_class_token(&current, token) {
                    return Ok(());
                }
                doc.set_class_name(node, &utils::remove_class_token(&current, token))
            }
        }
    }
}

fn validate_token(token: &str) -> Result<()> {
    if token.is_empty() || token.chars().any(|ch| ch.is_ascii_whitespace()) {
        return Err(dom::DomError::InvalidArgument(format!(
            "invalid class token {token:?}"
        )));
    }
    Ok(())
}

pub(crate) struct Context {
    pub(crate) doc: Document,
    pub(crate) binding: Box<dyn EventBinding>,
    pub(crate) classes: ClassTokens,
    pub(crate) bindings: RefCell<BindingTable>,
}

/// Entry point: `select`, `create` and `ready` for one document
#[derive(Clone)]
pub struct Jc {
    pub(crate) inner: Rc<Context>,
}

impl fmt::Debug for Jc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Jc")
            .field("binding", &self.inner.binding.name())
            .field("classes", &self.inner.classes)
            .field("bound_handlers", &self.inner.bindings.borrow().len())
            .finish()
    }
}

impl Jc {
    pub fn new(doc: &Document) -> Self {
        let config = doc.config();
        let binding = detect(config.event_model);
        let classes = if config.class_list {
            ClassTokens::TokenList
        } else {
            ClassTokens::ClassName
        };
        debug!(
            "[Jc] Using {} event binding, {:?} class tokens",
            binding.name(),
            classes
        );
        Self {
            inner: Rc::new(Context {
                doc: doc.clone(),
                binding,
                classes,
                bindings: RefCell::new(BindingTable::default()),
            }),
        }
    }

    pub fn document(&self) -> &Document {
        &self.inner.doc
    }

    /// Whether two contexts are the same one
    pub fn ptr_eq(&self, other: &Jc) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Wrap a selector's matches, one node, or a collection of nodes
    pub fn select<'a>(&self, target: impl Into<Target<'a>>) -> Result<ElementSet> {
        let nodes = match target.into() {
            Target::Query(selector) => {
                let nodes = self.inner.doc.query_selector_all(selector)?;
                debug!("[Jc] select {:?}: {} element(s)", selector, nodes.len());
                nodes
            }
            Target::Node(node) => vec![node],
            Target::Nodes(nodes) => nodes,
        };
        Ok(ElementSet::new(self, nodes))
    }

    /// New detached element with attributes applied in order, then markup
    pub fn create(&self, tag: &str, attributes: &[(&str, &str)], markup: Option<&str>) -> Result<ElementSet> {
        let node = self.inner.doc.create_element(tag)?;
        let set = ElementSet::new(self, vec![node]);
        if !attributes.is_empty() {
            set.set_attrs(attributes)?;
        }
        if let Some(markup) = markup.filter(|markup| !markup.is_empty()) {
            set.set_html(markup)?;
        }
        debug!("[Jc] Created <{}> as node {}", tag, node);
        Ok(set)
    }

    /// Run `callback` now if the document is past `Loading`, else once later
    pub fn ready(&self, callback: impl FnOnce() + 'static) -> Result<()> {
        let doc = &self.inner.doc;
        if doc.ready_state() != ReadyState::Loading {
            callback();
            return Ok(());
        }
        debug!("[Jc] Document loading, deferring ready callback");
        self.inner.binding.defer_ready(doc, Box::new(callback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom::{DocumentConfig, DomError, EventModel};
    use std::cell::Cell;

    fn loading(model: EventModel) -> Document {
        Document::with_config(DocumentConfig {
            event_model: model,
            ready_state: ReadyState::Loading,
            ..DocumentConfig::default()
        })
    }

    #[test]
    fn test_select_sees_inserted_and_removed() {
        let doc = Document::new();
        let jc = Jc::new(&doc);
        let body = doc.body().unwrap();
        assert!(jc.select("section").unwrap().is_empty());

        let section = doc.create_element("section").unwrap();
        doc.append_child(body, section).unwrap();
        let found = jc.select("section").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0], section);

        doc.remove_child(body, section).unwrap();
        assert!(jc.select("section").unwrap().is_empty());
    }

    #[test]
    fn test_select_invalid_selector_fails() {
        let jc = Jc::new(&Document::new());
        assert!(matches!(jc.select(""), Err(DomError::Selector(_))));
        assert!(matches!(jc.select("div >"), Err(DomError::Selector(_))));
    }

    #[test]
    fn test_select_wraps_nodes_faithfully() {
        let doc = Document::new();
        let jc = Jc::new(&doc);
        let a = doc.create_element("a").unwrap();
        let b = doc.create_element("b").unwrap();

        let single = jc.select(a).unwrap();
        assert_eq!(single.iter().collect::<Vec<_>>(), vec![a]);

        let pair = jc.select(vec![a, b]).unwrap();
        assert_eq!(pair.iter().collect::<Vec<_>>(), vec![a, b]);

        let again = jc.select(&pair).unwrap();
        assert_eq!(again.len(), 2);
        assert_eq!(jc.select(&[b][..]).unwrap()[0], b);
    }

    #[test]
    fn test_create_applies_attributes_and_markup() {
        let jc = Jc::new(&Document::new());

        let plain = jc.create("div", &[("class", "x")], None).unwrap();
        assert_eq!(plain.attr("class").unwrap().one(), Some(&Some("x".to_string())));

        let filled = jc.create("div", &[("class", "x")], Some("hi")).unwrap();
        assert_eq!(filled.html().unwrap().one().map(String::as_str), Some("hi"));

        let empty = jc.create("div", &[], Some("")).unwrap();
        assert_eq!(empty.html().unwrap().one().map(String::as_str), Some(""));
    }

    #[test]
    fn test_create_tolerates_unknown_tags() {
        let doc = Document::new();
        let jc = Jc::new(&doc);
        let odd = jc.create("not-a-real-tag", &[], None).unwrap();
        assert_eq!(doc.tag_name(odd[0]).unwrap(), "NOT-A-REAL-TAG");
        assert!(matches!(
            jc.create("", &[], None),
            Err(DomError::InvalidTagName(_))
        ));
    }

    #[test]
    fn test_ready_runs_synchronously_when_loaded() {
        let jc = Jc::new(&Document::new());
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        jc.ready(move || flag.set(true)).unwrap();
        assert!(ran.get());
    }

    #[test]
    fn test_ready_deferred_in_registration_order() {
        for model in [EventModel::Standard, EventModel::Legacy, EventModel::Property] {
            let doc = loading(model);
            let jc = Jc::new(&doc);
            let order = Rc::new(RefCell::new(Vec::new()));
            for label in ["first", "second", "third"] {
                let order = Rc::clone(&order);
                jc.ready(move || order.borrow_mut().push(label)).unwrap();
            }
            assert!(order.borrow().is_empty(), "{model:?}");

            doc.set_ready_state(ReadyState::Interactive).unwrap();
            doc.set_ready_state(ReadyState::Complete).unwrap();
            assert_eq!(*order.borrow(), vec!["first", "second", "third"], "{model:?}");
        }
    }

    #[test]
    fn test_class_name_fallback() {
        let doc = Document::with_config(DocumentConfig {
            class_list: false,
            ..DocumentConfig::default()
        });
        let div = doc.create_element("div").unwrap();
        let classes = Jc::new(&doc).inner.classes;
        assert_eq!(classes, ClassTokens::ClassName);

        classes.add(&doc, div, "a").unwrap();
        classes.add(&doc, div, "b").unwrap();
        classes.add(&doc, div, "a").unwrap();
        assert_eq!(doc.class_name(div).unwrap(), "a b");

        classes.remove(&doc, div, "a").unwrap();
        assert_eq!(doc.class_name(div).unwrap(), "b");
        assert!(classes.add(&doc, div, "").is_err());
    }
}
