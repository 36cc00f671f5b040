//! Host Document Library
//!
//! An in-memory HTML document: arena-backed tree, selector queries,
//! markup parsing and serialization, listeners and the loading phase.
//!
//! ## Core Design
//!
//! ```text
//! markup → html5ever → DomArena (owned) ← Document (Rc handle)
//!                          ↓                   ↓
//!                    NodeId (u32)      listeners, readyState
//! ```
//!
//! Nodes are never freed: a `NodeId` stays valid after its node is
//! detached, so callers may hold ids across mutations.

pub mod arena;
pub mod document;
pub mod error;
pub mod events;
pub mod parser;
pub mod selector;
pub mod serializer;
pub mod types;
pub mod utils;

pub use arena::DomArena;
pub use document::{Document, DocumentConfig, WeakDocument};
pub use error::{DomError, Result, SelectorError};
pub use events::{same_listener, Event, Listener, Phase};
pub use selector::SelectorList;
pub use serializer::DomSerializer;
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_document_creation() {
        let doc = Document::new();
        assert_eq!(doc.node_type(doc.root()).unwrap(), NodeType::Document);
        assert_eq!(doc.outer_html(doc.document_element().unwrap()).unwrap(),
            "<html><head></head><body></body></html>");
    }
}
