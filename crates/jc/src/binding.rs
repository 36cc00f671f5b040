//! Event binding strategies
//!
//! A document exposes one listener API. The matching strategy is picked
//! once per context by `detect` and used for every `on`, `off` and
//! deferred `ready` callback after that.

use crate::element::{same_handler, Handler};
use ahash::AHashMap;
use dom::{Document, Event, EventModel, Listener, NodeId, ReadyState, Result};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::rc::Rc;

/// A one-shot callback deferred until the document is ready
pub type ReadyCallback = Box<dyn FnOnce()>;

/// Strategy trait - one per listener API a document may expose
pub trait EventBinding {
    /// Human-readable name for logging
    fn name(&self) -> &'static str;

    fn bind(
        &self,
        doc: &Document,
        node: NodeId,
        event_type: &str,
        listener: Listener,
        capture: bool,
    ) -> Result<()>;

    fn unbind(
        &self,
        doc: &Document,
        node: NodeId,
        event_type: &str,
        listener: &Listener,
        capture: bool,
    ) -> Result<()>;

    /// Run `callback` once the document leaves `Loading`.
    ///
    /// Only called while the document is still loading.
    fn defer_ready(&self, doc: &Document, callback: ReadyCallback) -> Result<()>;
}

/// `addEventListener` / `removeEventListener`
pub struct ListenerBinding;

impl EventBinding for ListenerBinding {
    fn name(&self) -> &'static str {
        "listener"
    }

    fn bind(
        &self,
        doc: &Document,
        node: NodeId,
        event_type: &str,
        listener: Listener,
        capture: bool,
    ) -> Result<()> {
        doc.add_event_listener(node, event_type, listener, capture)
    }

    fn unbind(
        &self,
        doc: &Document,
        node: NodeId,
        event_type: &str,
        listener: &Listener,
        capture: bool,
    ) -> Result<()> {
        doc.remove_event_listener(node, event_type, listener, capture)
    }

    fn defer_ready(&self, doc: &Document, callback: ReadyCallback) -> Result<()> {
        let run = once(callback);
        let listener: Listener = Rc::new(move |_: &Event| run());
        doc.add_event_listener(doc.root(), "DOMContentLoaded", listener, false)
    }
}

/// `attachEvent` / `detachEvent`; capture is not available
pub struct AttachBinding;

impl EventBinding for AttachBinding {
    fn name(&self) -> &'static str {
        "attach"
    }

    fn bind(
        &self,
        doc: &Document,
        node: NodeId,
        event_type: &str,
        listener: Listener,
        _capture: bool,
    ) -> Result<()> {
        doc.attach_event(node, &format!("on{event_type}"), listener)
    }

    fn unbind(
        &self,
        doc: &Document,
        node: NodeId,
        event_type: &str,
        listener: &Listener,
        _capture: bool,
    ) -> Result<()> {
        doc.detach_event(node, &format!("on{event_type}"), listener)
    }

    fn defer_ready(&self, doc: &Document, callback: ReadyCallback) -> Result<()> {
        let run = once(callback);
        let weak = doc.downgrade();
        let listener: Listener = Rc::new(move |_: &Event| {
            if weak.upgrade().is_some_and(|doc| doc.ready_state() != ReadyState::Loading) {
                run();
            }
        });
        doc.attach_event(doc.root(), "onreadystatechange", listener)
    }
}

/// `on<event>` handler properties: one handler per slot
pub struct PropertyBinding;

impl EventBinding for PropertyBinding {
    fn name(&self) -> &'static str {
        "property"
    }

    fn bind(
        &self,
        doc: &Document,
        node: NodeId,
        event_type: &str,
        listener: Listener,
        _capture: bool,
    ) -> Result<()> {
        doc.set_event_handler(node, &format!("on{event_type}"), Some(listener))
    }

    /// Leaves the slot alone if something else replaced our handler
    fn unbind(
        &self,
        doc: &Document,
        node: NodeId,
        event_type: &str,
        listener: &Listener,
        _capture: bool,
    ) -> Result<()> {
        let on_type = format!("on{event_type}");
        if doc.is_event_handler(node, &on_type, listener)? {
            doc.set_event_handler(node, &on_type, None)?;
        }
        Ok(())
    }

    /// Chains onto any existing `onreadystatechange` handler
    fn defer_ready(&self, doc: &Document, callback: ReadyCallback) -> Result<()> {
        let root = doc.root();
        let previous = doc.event_handler(root, "onreadystatechange")?;
        let run = once(callback);
        let weak = doc.downgrade();
        let listener: Listener = Rc::new(move |event: &Event| {
            if let Some(previous) = &previous {
                previous(event);
            }
            if weak.upgrade().is_some_and(|doc| doc.ready_state() != ReadyState::Loading) {
                run();
            }
        });
        doc.set_event_handler(root, "onreadystatechange", Some(listener))
    }
}

/// Pick the strategy for a document's listener API
pub fn detect(model: EventModel) -> Box<dyn EventBinding> {
    match model {
        EventModel::Standard => Box::new(ListenerBinding),
        EventModel::Legacy => Box::new(AttachBinding),
        EventModel::Property => Box::new(PropertyBinding),
    }
}

/// Wrap a one-shot callback so repeated notifications run it at most once
pub(crate) fn once(callback: ReadyCallback) -> Rc<dyn Fn()> {
    let slot = RefCell::new(Some(callback));
    Rc::new(move || {
        let callback = slot.borrow_mut().take();
        if let Some(callback) = callback {
            callback();
        }
    })
}

pub(crate) struct Bound {
    handler: Handler,
    pub(crate) listener: Listener,
    pub(crate) capture: bool,
}

/// Original handler → bound listener, per (member, event type)
#[derive(Default)]
pub(crate) struct BindingTable {
    entries: AHashMap<(NodeId, String), SmallVec<[Bound; 2]>>,
}

impl BindingTable {
    pub fn record(&mut self, node: NodeId, event_type: &str, handler: &Handler, listener: Listener, capture: bool) {
        self.entries
            .entry((node, event_type.to_string()))
            .or_default()
            .push(Bound {
                handler: Rc::clone(handler),
                listener,
                capture,
            });
    }

    /// Remove and return every binding of `handler` on the member
    pub fn take(&mut self, node: NodeId, event_type: &str, handler: &Handler) -> Vec<Bound> {
        let key = (node, event_type.to_string());
        let Some(bound) = self.entries.get_mut(&key) else {
            return Vec::new();
        };
        let (taken, kept): (Vec<Bound>, Vec<Bound>) = bound
            .drain(..)
            .partition(|entry| same_handler(&entry.handler, handler));
        if kept.is_empty() {
            self.entries.remove(&key);
        } else {
            bound.extend(kept);
        }
        taken
    }

    /// Members that still have recorded bindings
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self.entries.keys().map(|(node, _)| *node).collect();
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }

    /// Remove and return every binding recorded on any of `nodes`
    pub fn take_nodes(&mut self, nodes: &[NodeId]) -> Vec<(NodeId, String, Bound)> {
        let keys: Vec<(NodeId, String)> = self
            .entries
            .keys()
            .filter(|(node, _)| nodes.contains(node))
            .cloned()
            .collect();
        let mut taken = Vec::new();
        for key in keys {
            if let Some(bound) = self.entries.remove(&key) {
                let (node, event_type) = key;
                taken.extend(bound.into_iter().map(|entry| (node, event_type.clone(), entry)));
            }
        }
        taken
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(SmallVec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use dom::DocumentConfig;
    use std::cell::Cell;

    fn loading(model: EventModel) -> Document {
        Document::with_config(DocumentConfig {
            event_model: model,
            ready_state: ReadyState::Loading,
            ..DocumentConfig::default()
        })
    }

    fn counter(count: &Rc<Cell<u32>>) -> ReadyCallback {
        let count = Rc::clone(count);
        Box::new(move || count.set(count.get() + 1))
    }

    #[test]
    fn test_detect_matches_model() {
        assert_eq!(detect(EventModel::Standard).name(), "listener");
        assert_eq!(detect(EventModel::Legacy).name(), "attach");
        assert_eq!(detect(EventModel::Property).name(), "property");
    }

    #[test]
    fn test_once_runs_a_single_time() {
        let count = Rc::new(Cell::new(0));
        let run = once(counter(&count));
        run();
        run();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_deferred_ready_each_model() {
        for model in [EventModel::Standard, EventModel::Legacy, EventModel::Property] {
            let doc = loading(model);
            let count = Rc::new(Cell::new(0));
            detect(model).defer_ready(&doc, counter(&count)).unwrap();

            assert_eq!(count.get(), 0, "{model:?}");
            doc.set_ready_state(ReadyState::Interactive).unwrap();
            doc.set_ready_state(ReadyState::Complete).unwrap();
            assert_eq!(count.get(), 1, "{model:?}");
        }
    }

    #[test]
    fn test_property_ready_keeps_existing_handler() {
        let doc = loading(EventModel::Property);
        let page_calls = Rc::new(Cell::new(0));
        let calls = Rc::clone(&page_calls);
        let page: Listener = Rc::new(move |_: &Event| calls.set(calls.get() + 1));
        doc.set_event_handler(doc.root(), "onreadystatechange", Some(page))
            .unwrap();

        let count = Rc::new(Cell::new(0));
        PropertyBinding.defer_ready(&doc, counter(&count)).unwrap();
        doc.set_ready_state(ReadyState::Complete).unwrap();

        assert_eq!(page_calls.get(), 1);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_property_unbind_only_clears_own_handler() {
        let doc = Document::with_config(DocumentConfig {
            event_model: EventModel::Property,
            ..DocumentConfig::default()
        });
        let body = doc.body().unwrap();
        let ours: Listener = Rc::new(|_: &Event| {});
        let theirs: Listener = Rc::new(|_: &Event| {});

        PropertyBinding.bind(&doc, body, "click", Rc::clone(&ours), false).unwrap();
        doc.set_event_handler(body, "onclick", Some(Rc::clone(&theirs))).unwrap();
        PropertyBinding.unbind(&doc, body, "click", &ours, false).unwrap();
        assert!(doc.is_event_handler(body, "onclick", &theirs).unwrap());

        PropertyBinding.unbind(&doc, body, "click", &theirs, false).unwrap();
        assert!(doc.event_handler(body, "onclick").unwrap().is_none());
    }

    #[test]
    fn test_binding_table_take() {
        let mut table = BindingTable::default();
        let a: Handler = Rc::new(|_: &Element, _: &Event| {});
        let b: Handler = Rc::new(|_: &Element, _: &Event| {});
        let listener: Listener = Rc::new(|_: &Event| {});

        table.record(1, "click", &a, Rc::clone(&listener), false);
        table.record(1, "click", &a, Rc::clone(&listener), true);
        table.record(1, "click", &b, Rc::clone(&listener), false);
        assert_eq!(table.len(), 3);

        let taken = table.take(1, "click", &a);
        assert_eq!(taken.len(), 2);
        assert!(taken[1].capture);
        assert_eq!(table.len(), 1);
        assert!(table.take(1, "click", &a).is_empty());
        assert!(table.take(2, "click", &b).is_empty());
    }

    #[test]
    fn test_binding_table_take_nodes() {
        let mut table = BindingTable::default();
        let a: Handler = Rc::new(|_: &Element, _: &Event| {});
        let listener: Listener = Rc::new(|_: &Event| {});

        table.record(1, "click", &a, Rc::clone(&listener), false);
        table.record(1, "keyup", &a, Rc::clone(&listener), false);
        table.record(2, "click", &a, Rc::clone(&listener), true);
        table.record(3, "click", &a, Rc::clone(&listener), false);
        assert_eq!(table.nodes(), vec![1, 2, 3]);

        let mut taken = table.take_nodes(&[1, 2]);
        taken.sort_by(|x, y| (x.0, &x.1).cmp(&(y.0, &y.1)));
        let keys: Vec<(NodeId, &str, bool)> = taken
            .iter()
            .map(|(node, event_type, bound)| (*node, event_type.as_str(), bound.capture))
            .collect();
        assert_eq!(keys, vec![(1, "click", false), (1, "keyup", false), (2, "click", true)]);
        assert_eq!(table.nodes(), vec![3]);
        assert!(table.take_nodes(&[1]).is_empty());
    }
}
