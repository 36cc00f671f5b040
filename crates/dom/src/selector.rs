//! CSS selector parsing and matching
//!
//! Supports the subset a query helper needs: type, universal, id, class and
//! attribute selectors, structural pseudo-classes, the four combinators and
//! comma-separated groups. Anything else is a [`SelectorError`], never a
//! silent non-match.

use crate::arena::DomArena;
use crate::error::SelectorError;
use crate::types::{NodeId, NodeType};
use crate::utils::has_class_token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
    AdjacentSibling,
    GeneralSibling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals,
    Includes,
    DashMatch,
    Prefix,
    Suffix,
    Substring,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrCondition {
    name: String,
    op: AttrOp,
    value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pseudo {
    FirstChild,
    LastChild,
    OnlyChild,
    Empty,
    Not(Box<Compound>),
}

/// One compound selector, e.g. `input.big[type="submit"]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    /// None means universal
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attrs: Vec<AttrCondition>,
    pseudos: Vec<Pseudo>,
}

/// Compound steps, left to right. Each combinator relates a step to the
/// one before it; the first step's combinator is unused.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    steps: Vec<(Combinator, Compound)>,
}

/// A parsed selector group list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    groups: Vec<Complex>,
}

impl SelectorList {
    pub fn parse(selector: &str) -> Result<Self, SelectorError> {
        let mut parser = Parser::new(selector);
        let groups = parser.parse_list()?;
        Ok(Self { groups })
    }

    /// Whether the node matches any group
    pub fn matches(&self, arena: &DomArena, node_id: NodeId) -> bool {
        self.groups
            .iter()
            .any(|complex| match_at(arena, node_id, &complex.steps, complex.steps.len() - 1))
    }
}

fn match_at(arena: &DomArena, node_id: NodeId, steps: &[(Combinator, Compound)], idx: usize) -> bool {
    let (combinator, compound) = &steps[idx];
    if !matches_compound(arena, node_id, compound) {
        return false;
    }
    if idx == 0 {
        return true;
    }

    match combinator {
        Combinator::Child => {
            parent_element(arena, node_id).is_some_and(|parent| match_at(arena, parent, steps, idx - 1))
        }
        Combinator::Descendant => {
            let mut cursor = parent_element(arena, node_id);
            while let Some(ancestor) = cursor {
                if match_at(arena, ancestor, steps, idx - 1) {
                    return true;
                }
                cursor = parent_element(arena, ancestor);
            }
            false
        }
        Combinator::AdjacentSibling => previous_element_sibling(arena, node_id)
            .is_some_and(|sibling| match_at(arena, sibling, steps, idx - 1)),
        Combinator::GeneralSibling => {
            let mut cursor = previous_element_sibling(arena, node_id);
            while let Some(sibling) = cursor {
                if match_at(arena, sibling, steps, idx - 1) {
                    return true;
                }
                cursor = previous_element_sibling(arena, sibling);
            }
            false
        }
    }
}

fn matches_compound(arena: &DomArena, node_id: NodeId, compound: &Compound) -> bool {
    let Ok(node) = arena.get(node_id) else {
        return false;
    };
    if !node.is_element() {
        return false;
    }

    if let Some(tag) = &compound.tag {
        if !node.node_name.eq_ignore_ascii_case(tag) {
            return false;
        }
    }

    if compound.ids.iter().any(|id| node.attr("id") != Some(id.as_str())) {
        return false;
    }

    let class_name = node.attr("class").unwrap_or("");
    if compound
        .classes
        .iter()
        .any(|class| !has_class_token(class_name, class))
    {
        return false;
    }

    let attrs_match = compound.attrs.iter().all(|cond| {
        let Some(actual) = node.attr(&cond.name) else {
            return false;
        };
        let value = cond.value.as_str();
        match cond.op {
            AttrOp::Exists => true,
            AttrOp::Equals => actual == value,
            AttrOp::Includes => actual.split_ascii_whitespace().any(|token| token == value),
            AttrOp::DashMatch => {
                actual == value
                    || actual
                        .strip_prefix(value)
                        .is_some_and(|rest| rest.starts_with('-'))
            }
            AttrOp::Prefix => !value.is_empty() && actual.starts_with(value),
            AttrOp::Suffix => !value.is_empty() && actual.ends_with(value),
            AttrOp::Substring => !value.is_empty() && actual.contains(value),
        }
    });
    if !attrs_match {
        return false;
    }

    compound.pseudos.iter().all(|pseudo| match pseudo {
        Pseudo::FirstChild => {
            node.parent_id.is_some() && previous_element_sibling(arena, node_id).is_none()
        }
        Pseudo::LastChild => {
            node.parent_id.is_some() && next_element_sibling(arena, node_id).is_none()
        }
        Pseudo::OnlyChild => {
            node.parent_id.is_some()
                && previous_element_sibling(arena, node_id).is_none()
                && next_element_sibling(arena, node_id).is_none()
        }
        Pseudo::Empty => node.children_ids.iter().all(|&child| {
            arena
                .get(child)
                .is_ok_and(|child| child.node_type == NodeType::Comment)
        }),
        Pseudo::Not(inner) => !matches_compound(arena, node_id, inner),
    })
}

fn parent_element(arena: &DomArena, node_id: NodeId) -> Option<NodeId> {
    let parent = arena.get(node_id).ok()?.parent_id?;
    arena.get(parent).ok()?.is_element().then_some(parent)
}

fn element_siblings(arena: &DomArena, node_id: NodeId) -> Option<(Vec<NodeId>, usize)> {
    let parent = arena.get(node_id).ok()?.parent_id?;
    let siblings: Vec<NodeId> = arena
        .child_ids(parent)
        .ok()?
        .iter()
        .copied()
        .filter(|&id| arena.get(id).is_ok_and(|node| node.is_element()))
        .collect();
    let position = siblings.iter().position(|&id| id == node_id)?;
    Some((siblings, position))
}

fn previous_element_sibling(arena: &DomArena, node_id: NodeId) -> Option<NodeId> {
    let (siblings, position) = element_siblings(arena, node_id)?;
    position.checked_sub(1).map(|idx| siblings[idx])
}

fn next_element_sibling(arena: &DomArena, node_id: NodeId) -> Option<NodeId> {
    let (siblings, position) = element_siblings(arena, node_id)?;
    siblings.get(position + 1).copied()
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> SelectorError {
        SelectorError {
            selector: self.source.to_string(),
            reason: reason.into(),
        }
    }

    fn unexpected(&self) -> SelectorError {
        match self.peek() {
            Some(ch) => self.error(format!("unexpected character '{ch}' at {}", self.pos)),
            None => self.error("unexpected end of selector"),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn expect(&mut self, expected: char) -> Result<(), SelectorError> {
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    /// Returns whether anything was skipped
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(|ch| ch.is_ascii_whitespace()) {
            self.pos += 1;
        }
        self.pos != start
    }

    fn parse_list(&mut self) -> Result<Vec<Complex>, SelectorError> {
        let mut groups = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek().is_none() {
                return Err(self.error(if groups.is_empty() {
                    "empty selector"
                } else {
                    "trailing comma"
                }));
            }
            groups.push(self.parse_complex()?);
            self.skip_whitespace();
            match self.peek() {
                None => return Ok(groups),
                Some(',') => {
                    self.pos += 1;
                }
                Some(_) => return Err(self.unexpected()),
            }
        }
    }

    fn parse_complex(&mut self) -> Result<Complex, SelectorError> {
        let mut steps = vec![(Combinator::Descendant, self.parse_compound()?)];
        loop {
            let had_space = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => Combinator::Child,
                Some('+') => Combinator::AdjacentSibling,
                Some('~') => Combinator::GeneralSibling,
                Some(_) if had_space => Combinator::Descendant,
                Some(_) => return Err(self.unexpected()),
            };
            if combinator != Combinator::Descendant {
                self.pos += 1;
                self.skip_whitespace();
            }
            steps.push((combinator, self.parse_compound()?));
        }
        Ok(Complex { steps })
    }

    fn parse_compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        let mut consumed = false;

        match self.peek() {
            Some('*') => {
                self.pos += 1;
                consumed = true;
            }
            Some(ch) if is_ident_char(ch) => {
                compound.tag = Some(self.parse_ident()?.to_ascii_lowercase());
                consumed = true;
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.ids.push(self.parse_ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.parse_ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attrs.push(self.parse_attribute()?);
                }
                Some(':') => {
                    self.pos += 1;
                    compound.pseudos.push(self.parse_pseudo()?);
                }
                _ => break,
            }
            consumed = true;
        }

        if consumed {
            Ok(compound)
        } else {
            Err(self.unexpected())
        }
    }

    fn parse_ident(&mut self) -> Result<String, SelectorError> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        let ident: String = self.chars[start..self.pos].iter().collect();

        let starts_with_digit = ident
            .trim_start_matches('-')
            .starts_with(|ch: char| ch.is_ascii_digit());
        if ident.is_empty() || ident == "-" || starts_with_digit {
            self.pos = start;
            return Err(match self.peek() {
                Some(_) if !ident.is_empty() => {
                    self.error(format!("invalid identifier '{ident}' at {start}"))
                }
                _ => self.unexpected(),
            });
        }
        Ok(ident)
    }

    fn parse_attribute(&mut self) -> Result<AttrCondition, SelectorError> {
        self.skip_whitespace();
        let name = self.parse_ident()?.to_ascii_lowercase();
        self.skip_whitespace();

        let op = match self.bump() {
            Some(']') => {
                return Ok(AttrCondition {
                    name,
                    op: AttrOp::Exists,
                    value: String::new(),
                })
            }
            Some('=') => AttrOp::Equals,
            Some(prefix @ ('~' | '|' | '^' | '$' | '*')) => {
                self.expect('=')?;
                match prefix {
                    '~' => AttrOp::Includes,
                    '|' => AttrOp::DashMatch,
                    '^' => AttrOp::Prefix,
                    '$' => AttrOp::Suffix,
                    _ => AttrOp::Substring,
                }
            }
            Some(_) => {
                self.pos -= 1;
                return Err(self.unexpected());
            }
            None => return Err(self.error("unterminated attribute selector")),
        };

        self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                self.parse_string(quote)?
            }
            _ => self.parse_ident()?,
        };
        self.skip_whitespace();
        if self.peek().is_none() {
            return Err(self.error("unterminated attribute selector"));
        }
        self.expect(']')?;

        Ok(AttrCondition { name, op, value })
    }

    fn parse_string(&mut self, quote: char) -> Result<String, SelectorError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some('\\') => match self.bump() {
                    Some(ch) => out.push(ch),
                    None => return Err(self.error("unterminated string")),
                },
                Some(ch) if ch == quote => return Ok(out),
                Some(ch) => out.push(ch),
            }
        }
    }

    fn parse_pseudo(&mut self) -> Result<Pseudo, SelectorError> {
        let name = self.parse_ident()?.to_ascii_lowercase();
        match name.as_str() {
            "first-child" => Ok(Pseudo::FirstChild),
            "last-child" => Ok(Pseudo::LastChild),
            "only-child" => Ok(Pseudo::OnlyChild),
            "empty" => Ok(Pseudo::Empty),
            "not" => {
                self.expect('(')?;
                self.skip_whitespace();
                let inner = self.parse_compound()?;
                self.skip_whitespace();
                self.expect(')')?;
                Ok(Pseudo::Not(Box::new(inner)))
            }
            other => Err(self.error(format!("unsupported pseudo-class ':{other}'"))),
        }
    }
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || !ch.is_ascii()
}
