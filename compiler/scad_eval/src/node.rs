//! The instantiated node tree.
//!
//! This is the only output of evaluation. It is built bottom-up, handed to
//! the caller wholesale, and never mutated by the evaluator afterwards.

use std::fmt;

use scad_ir::Tags;

use crate::Value;

/// What produced a node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    /// Top of an instantiation.
    Root,
    /// A user module, or a control module that only groups its children.
    Group,
    /// A builtin geometry or transform module; opaque to the evaluator.
    Builtin,
}

/// One instantiated module.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub kind: NodeKind,
    pub name: String,
    pub tags: Tags,
    /// Bound parameters in declaration order.
    pub attributes: Vec<(String, Value)>,
    pub children: Vec<Node>,
}

impl Node {
    fn new(kind: NodeKind, name: impl Into<String>) -> Self {
        Node {
            kind,
            name: name.into(),
            tags: Tags::empty(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn root() -> Self {
        Self::new(NodeKind::Root, "root")
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Group, name)
    }

    pub fn builtin(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Builtin, name)
    }

    #[must_use]
    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: Vec<(String, Value)>) -> Self {
        self.attributes = attributes;
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// Look up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// True for a node with no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Node::count).sum::<usize>()
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        for _ in 0..depth {
            f.write_str("  ")?;
        }
        if self.tags.contains(Tags::ROOT) {
            f.write_str("!")?;
        }
        if self.tags.contains(Tags::HIGHLIGHT) {
            f.write_str("#")?;
        }
        if self.tags.contains(Tags::BACKGROUND) {
            f.write_str("%")?;
        }
        write!(f, "{}(", self.name)?;
        for (i, (key, value)) in self.attributes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key} = {value}")?;
        }
        if self.children.is_empty() {
            return writeln!(f, ");");
        }
        writeln!(f, ") {{")?;
        for child in &self.children {
            child.write_indented(f, depth + 1)?;
        }
        for _ in 0..depth {
            f.write_str("  ")?;
        }
        writeln!(f, "}}")
    }
}

/// Indented dump, one node per line, in the source language's call syntax.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

#[cfg(test)]
mod tests;
