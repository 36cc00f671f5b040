//! Get/set descriptors for the four accessors
//!
//! `text`, `html`, `attr` and `css` all reduce to one `(Field, Access)`
//! pair resolved once at the call boundary.

use dom::{Document, DomError, NodeId, Result};

/// Which per-member property an access targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Text,
    Html,
    Attribute,
    Style,
}

/// Shape of one accessor call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access<'a> {
    /// Read; the name is ignored for `Text` and `Html`
    Get(&'a str),
    SetOne(&'a str, &'a str),
    /// Attribute and Style only
    SetMany(&'a [(&'a str, &'a str)]),
}

/// Result of `ElementSet::access`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// One value per member; `None` means the attribute is absent
    Read(OneOrMany<Option<String>>),
    Written,
}

/// Per-member results, collapsed the way the accessors report them
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OneOrMany<T> {
    Empty,
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn from_vec(mut values: Vec<T>) -> Self {
        match values.len() {
            0 => Self::Empty,
            1 => match values.pop() {
                Some(value) => Self::One(value),
                None => Self::Empty,
            },
            _ => Self::Many(values),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::One(_) => 1,
            Self::Many(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// The value of a one-member read
    pub fn one(&self) -> Option<&T> {
        match self {
            Self::One(value) => Some(value),
            _ => None,
        }
    }

    pub fn first(&self) -> Option<&T> {
        match self {
            Self::Empty => None,
            Self::One(value) => Some(value),
            Self::Many(values) => values.first(),
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> OneOrMany<U> {
        match self {
            Self::Empty => OneOrMany::Empty,
            Self::One(value) => OneOrMany::One(f(value)),
            Self::Many(values) => OneOrMany::Many(values.into_iter().map(f).collect()),
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Empty => Vec::new(),
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(values: Vec<T>) -> Self {
        Self::from_vec(values)
    }
}

impl Field {
    pub(crate) fn read(self, doc: &Document, node: NodeId, name: &str) -> Result<Option<String>> {
        match self {
            Field::Text => doc.text(node).map(Some),
            Field::Html => doc.inner_html(node).map(Some),
            Field::Attribute => doc.attribute(node, name),
            Field::Style => doc.style_property(node, name).map(Some),
        }
    }

    pub(crate) fn write(self, doc: &Document, node: NodeId, name: &str, value: &str) -> Result<()> {
        match self {
            Field::Text => doc.set_text(node, value),
            Field::Html => doc.set_inner_html(node, value),
            Field::Attribute => doc.set_attribute(node, name, value),
            Field::Style => doc.set_style_property(node, name, value),
        }
    }

    /// Text and markup have no names to map over
    pub(crate) fn check(self, access: &Access<'_>) -> Result<()> {
        match (self, access) {
            (Field::Text | Field::Html, Access::SetMany(_)) => Err(DomError::InvalidArgument(
                format!("{self:?} does not take a name/value mapping"),
            )),
            _ => Ok(()),
        }
    }
}
