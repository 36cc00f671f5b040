//! jc - small chainable wrapper over document elements
//!
//! ```text
//! Jc::new(&doc) → select / create → ElementSet → text, attr, css, on, ...
//! ```
//!
//! ## Example
//!
//! ```
//! use jc::{Document, Jc};
//!
//! let doc = Document::new();
//! let jc = Jc::new(&doc);
//!
//! let card = jc.create("div", &[("class", "card")], Some("<h2>Title</h2>"))?;
//! card.set_css("padding", "4px")?.add_class("open")?;
//! jc.select("body")?.append(&card)?;
//!
//! assert_eq!(jc.select(".card h2")?.text()?.one().map(String::as_str), Some("Title"));
//! # Ok::<(), jc::Error>(())
//! ```

pub mod access;
pub mod binding;
pub mod context;
pub mod element;
pub mod set;

pub use access::{Access, Field, OneOrMany, Outcome};
pub use binding::{detect, EventBinding};
pub use context::{ClassTokens, Jc};
pub use element::{Element, Handler};
pub use set::{Child, ElementSet, Target};

pub use dom::{Document, DocumentConfig, Event, EventModel, NodeId, Phase, ReadyState};
pub use dom::{DomError as Error, Result};
