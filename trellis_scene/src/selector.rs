// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node selectors.
//!
//! A selector is a comma-separated list of simple tokens, each of which
//! matches one node on its own (there are no combinators):
//!
//! - `#key` matches the node whose `id` attribute is `key`.
//! - `.tag` matches nodes whose space-separated `name` contains `tag`.
//! - `Type` matches the node's class name or any role in its lineage.
//!
//! ```
//! use trellis_scene::{Scene, SceneConfig, Selector, ShapeSpec};
//!
//! let mut scene = Scene::new(SceneConfig::default());
//! let group = scene.create_group();
//! let dot = scene.create_shape(ShapeSpec::new("Circle", |_, _| {}));
//! scene.add(group, dot);
//! scene.set_name(dot, "marker selected");
//!
//! assert_eq!(scene.find(group, ".selected"), vec![dot]);
//! assert_eq!(scene.find(group, "Circle, #missing"), vec![dot]);
//! assert!(Selector::parse("circle").is_empty());
//! ```

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use log::warn;
use smallvec::SmallVec;

use crate::attr::{self, builtin};
use crate::{NodeId, Scene};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Id(String),
    Name(String),
    Type(String),
}

/// A parsed selector list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selector {
    tokens: SmallVec<[Token; 2]>,
}

impl Selector {
    /// Parses `source`, dropping invalid tokens with a warning.
    #[must_use]
    pub fn parse(source: &str) -> Self {
        let mut tokens = SmallVec::new();
        for raw in source.split(',') {
            let raw = raw.trim();
            let token = if let Some(key) = raw.strip_prefix('#') {
                (!key.is_empty()).then(|| Token::Id(key.to_string()))
            } else if let Some(tag) = raw.strip_prefix('.') {
                (!tag.is_empty()).then(|| Token::Name(tag.to_string()))
            } else if raw.starts_with(|c: char| c.is_ascii_uppercase()) {
                Some(Token::Type(raw.to_string()))
            } else {
                None
            };
            match token {
                Some(token) => tokens.push(token),
                None => warn!(
                    "selector token \"{raw}\" is invalid; use \"#id\", \".name\" or a capitalised type name"
                ),
            }
        }
        Self { tokens }
    }

    /// Whether no valid token survived parsing; such a selector matches nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Whether `id` matches any token.
    #[must_use]
    pub fn matches(&self, scene: &Scene, id: NodeId) -> bool {
        let Some(node) = scene.nodes.get(&id) else {
            return false;
        };
        self.tokens.iter().any(|token| match token {
            Token::Id(key) => attr::text_in(&node.attrs, &builtin::ID) == key,
            Token::Name(tag) => attr::text_in(&node.attrs, &builtin::NAME)
                .split_whitespace()
                .any(|n| n == tag),
            Token::Type(ty) => {
                node.class_name == ty.as_str() || node.role.lineage().iter().any(|r| r.name() == ty)
            }
        })
    }

    fn single_id(&self) -> Option<&str> {
        match self.tokens.as_slice() {
            [Token::Id(key)] => Some(key),
            _ => None,
        }
    }
}

impl From<&str> for Selector {
    fn from(source: &str) -> Self {
        Self::parse(source)
    }
}

impl Scene {
    /// Descendants of `id` matching `selector`, in depth-first document order.
    ///
    /// `id` itself is never included.
    pub fn find(&self, id: NodeId, selector: impl Into<Selector>) -> Vec<NodeId> {
        let selector = selector.into();
        if selector.is_empty() {
            return Vec::new();
        }
        self.find_by(id, |scene, n| selector.matches(scene, n))
    }

    /// First descendant of `id` matching `selector`.
    pub fn find_one(&self, id: NodeId, selector: impl Into<Selector>) -> Option<NodeId> {
        let selector = selector.into();
        if let Some(key) = selector.single_id() {
            if let Some(hit) = self.node_by_id(key) {
                if self.is_ancestor_of(id, hit) {
                    return Some(hit);
                }
            }
        }
        if selector.is_empty() {
            return None;
        }
        let mut found = None;
        self.walk(id, &mut |scene, n| {
            if selector.matches(scene, n) {
                found = Some(n);
                return false;
            }
            true
        });
        found
    }

    /// Descendants of `id` accepted by `predicate`, in document order.
    pub fn find_by(&self, id: NodeId, predicate: impl Fn(&Self, NodeId) -> bool) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.walk(id, &mut |scene, n| {
            if predicate(scene, n) {
                out.push(n);
            }
            true
        });
        out
    }

    /// Pre-order walk of the descendants of `id`; stops when `visit` returns
    /// `false`. Returns whether the walk ran to completion.
    fn walk(&self, id: NodeId, visit: &mut dyn FnMut(&Self, NodeId) -> bool) -> bool {
        for &child in self.children(id) {
            if !visit(self, child) || !self.walk(child, visit) {
                return false;
            }
        }
        true
    }

    /// Ancestors of `id` matching `selector`, nearest first.
    ///
    /// The walk ends after visiting `stop_at`, if given.
    pub fn find_ancestors(
        &self,
        id: NodeId,
        selector: impl Into<Selector>,
        include_self: bool,
        stop_at: Option<NodeId>,
    ) -> Vec<NodeId> {
        let selector = selector.into();
        let start = include_self.then_some(id);
        let mut out = Vec::new();
        for n in start.into_iter().chain(self.ancestors(id)) {
            if selector.matches(self, n) {
                out.push(n);
            }
            if Some(n) == stop_at {
                break;
            }
        }
        out
    }

    /// Nearest ancestor of `id` matching `selector`.
    pub fn find_ancestor(
        &self,
        id: NodeId,
        selector: impl Into<Selector>,
        include_self: bool,
        stop_at: Option<NodeId>,
    ) -> Option<NodeId> {
        self.find_ancestors(id, selector, include_self, stop_at)
            .first()
            .copied()
    }
}
