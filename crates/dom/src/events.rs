//! Event listeners and dispatch
//!
//! Design: three registries mirror the three listener APIs a page may
//! find (standard, legacy `attachEvent`, `on<event>` properties).
//! Dispatch snapshots listeners before calling them, so a listener may
//! freely mutate the document or the registries.

use crate::types::NodeId;
use ahash::AHashMap;
use std::cell::Cell;
use std::rc::Rc;

/// A registered callback; identity is pointer identity
pub type Listener = Rc<dyn Fn(&Event)>;

/// Pointer identity for listeners, ignoring vtable addresses
pub fn same_listener(a: &Listener, b: &Listener) -> bool {
    std::ptr::eq(
        Rc::as_ptr(a) as *const (),
        Rc::as_ptr(b) as *const (),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Capturing,
    AtTarget,
    Bubbling,
}

/// Event as seen by one listener invocation
#[derive(Debug, Clone)]
pub struct Event {
    pub event_type: String,
    pub target: NodeId,
    pub current_target: NodeId,
    pub phase: Phase,
    pub bubbles: bool,
    stopped: Rc<Cell<bool>>,
}

impl Event {
    pub(crate) fn new(event_type: &str, target: NodeId, bubbles: bool) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            current_target: target,
            phase: Phase::AtTarget,
            bubbles,
            stopped: Rc::new(Cell::new(false)),
        }
    }

    pub(crate) fn at(&self, node: NodeId, phase: Phase) -> Self {
        Self {
            current_target: node,
            phase,
            ..self.clone()
        }
    }

    /// Stop after the listeners of the current node
    pub fn stop_propagation(&self) {
        self.stopped.set(true);
    }

    pub fn propagation_stopped(&self) -> bool {
        self.stopped.get()
    }
}

struct Registration {
    event_type: String,
    listener: Listener,
    capture: bool,
}

/// Per-node listener storage
#[derive(Default)]
pub struct ListenerRegistry {
    standard: AHashMap<NodeId, Vec<Registration>>,
    /// Keyed by `on`-prefixed name
    attached: AHashMap<NodeId, Vec<(String, Listener)>>,
    /// One slot per (node, `on`-prefixed name)
    properties: AHashMap<(NodeId, String), Listener>,
}

impl ListenerRegistry {
    /// Returns false for a duplicate (type, listener, capture) registration
    pub fn add(&mut self, node: NodeId, event_type: &str, listener: Listener, capture: bool) -> bool {
        let registrations = self.standard.entry(node).or_default();
        let duplicate = registrations.iter().any(|reg| {
            reg.event_type == event_type
                && reg.capture == capture
                && same_listener(&reg.listener, &listener)
        });
        if duplicate {
            return false;
        }
        registrations.push(Registration {
            event_type: event_type.to_string(),
            listener,
            capture,
        });
        true
    }

    pub fn remove(&mut self, node: NodeId, event_type: &str, listener: &Listener, capture: bool) -> bool {
        let Some(registrations) = self.standard.get_mut(&node) else {
            return false;
        };
        let before = registrations.len();
        registrations.retain(|reg| {
            !(reg.event_type == event_type
                && reg.capture == capture
                && same_listener(&reg.listener, listener))
        });
        before != registrations.len()
    }

    pub fn attach(&mut self, node: NodeId, on_type: &str, listener: Listener) {
        self.attached
            .entry(node)
            .or_default()
            .push((on_type.to_string(), listener));
    }

    /// Removes the first matching attachment
    pub fn detach(&mut self, node: NodeId, on_type: &str, listener: &Listener) -> bool {
        let Some(attached) = self.attached.get_mut(&node) else {
            return false;
        };
        match attached
            .iter()
            .position(|(name, existing)| name == on_type && same_listener(existing, listener))
        {
            Some(idx) => {
                attached.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn set_handler(&mut self, node: NodeId, on_type: &str, handler: Option<Listener>) {
        let key = (node, on_type.to_string());
        match handler {
            Some(handler) => {
                self.properties.insert(key, handler);
            }
            None => {
                self.properties.remove(&key);
            }
        }
    }

    pub fn handler(&self, node: NodeId, on_type: &str) -> Option<Listener> {
        self.properties.get(&(node, on_type.to_string())).cloned()
    }

    /// Listeners to run on `node` for this phase, in invocation order:
    /// standard, then legacy, then the property handler
    pub fn collect(&self, node: NodeId, event_type: &str, phase: Phase) -> Vec<Listener> {
        let mut out: Vec<Listener> = self
            .standard
            .get(&node)
            .into_iter()
            .flatten()
            .filter(|reg| reg.event_type == event_type)
            .filter(|reg| match phase {
                Phase::Capturing => reg.capture,
                Phase::AtTarget => true,
                Phase::Bubbling => !reg.capture,
            })
            .map(|reg| Rc::clone(&reg.listener))
            .collect();

        if phase != Phase::Capturing {
            let on_type = format!("on{event_type}");
            out.extend(
                self.attached
                    .get(&node)
                    .into_iter()
                    .flatten()
                    .filter(|(name, _)| *name == on_type)
                    .map(|(_, listener)| Rc::clone(listener)),
            );
            out.extend(self.handler(node, &on_type));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn recorder(log: &Rc<RefCell<Vec<&'static str>>>, label: &'static str) -> Listener {
        let log = Rc::clone(log);
        Rc::new(move |_event: &Event| log.borrow_mut().push(label))
    }

    #[test]
    fn test_duplicate_registration_ignored() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let listener = recorder(&log, "a");
        let mut registry = ListenerRegistry::default();

        assert!(registry.add(1, "click", Rc::clone(&listener), false));
        assert!(!registry.add(1, "click", Rc::clone(&listener), false));
        assert!(registry.add(1, "click", Rc::clone(&listener), true));
        assert_eq!(registry.collect(1, "click", Phase::AtTarget).len(), 2);

        assert!(registry.remove(1, "click", &listener, true));
        assert!(!registry.remove(1, "click", &listener, true));
        assert_eq!(registry.collect(1, "click", Phase::Capturing).len(), 0);
    }

    #[test]
    fn test_collect_order_and_phases() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = ListenerRegistry::default();
        registry.set_handler(1, "onclick", Some(recorder(&log, "property")));
        registry.attach(1, "onclick", recorder(&log, "legacy"));
        registry.add(1, "click", recorder(&log, "standard"), false);

        let event = Event::new("click", 1, true);
        for listener in registry.collect(1, "click", Phase::Bubbling) {
            listener(&event);
        }
        assert_eq!(*log.borrow(), vec!["standard", "legacy", "property"]);
        assert!(registry.collect(1, "click", Phase::Capturing).is_empty());
    }

    #[test]
    fn test_detach_and_clear_handler() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let legacy = recorder(&log, "legacy");
        let mut registry = ListenerRegistry::default();
        registry.attach(2, "onload", Rc::clone(&legacy));
        registry.set_handler(2, "onload", Some(recorder(&log, "property")));

        assert!(registry.detach(2, "onload", &legacy));
        assert!(!registry.detach(2, "onload", &legacy));
        registry.set_handler(2, "onload", None);
        assert!(registry.handler(2, "onload").is_none());
        assert!(registry.collect(2, "load", Phase::AtTarget).is_empty());
    }

    #[test]
    fn test_stop_propagation_is_shared() {
        let event = Event::new("click", 3, true);
        let copy = event.at(1, Phase::Bubbling);
        copy.stop_propagation();
        assert!(event.propagation_stopped());
        assert_eq!(copy.current_target, 1);
    }
}
