// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node identity and roles.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a node.
///
/// Ids are never reused, so a stale id held after [`Scene::destroy`](crate::Scene::destroy)
/// simply stops resolving.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw integer value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The structural role of a node.
///
/// `Node` and `Container` are abstract: no node has them as its role, but
/// role-level listeners registered on them apply to every node (or every
/// container) respectively.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Role {
    /// Base of every node.
    Node,
    /// Base of every node that owns children.
    Container,
    /// The top-level surface. Exactly one per scene.
    Stage,
    /// The unit of redraw and hit resolution.
    Layer,
    /// A plain container.
    Group,
    /// A drawable leaf.
    Shape,
}

impl Role {
    /// Name used by type selectors.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Node => "Node",
            Self::Container => "Container",
            Self::Stage => "Stage",
            Self::Layer => "Layer",
            Self::Group => "Group",
            Self::Shape => "Shape",
        }
    }

    /// Roles whose listener tables apply, from the base role to this one.
    #[must_use]
    pub const fn lineage(self) -> &'static [Self] {
        match self {
            Self::Node => &[Self::Node],
            Self::Container => &[Self::Node, Self::Container],
            Self::Stage => &[Self::Node, Self::Container, Self::Stage],
            Self::Layer => &[Self::Node, Self::Container, Self::Layer],
            Self::Group => &[Self::Node, Self::Container, Self::Group],
            Self::Shape => &[Self::Node, Self::Shape],
        }
    }

    /// Whether nodes of this role own children.
    #[must_use]
    pub const fn is_container(self) -> bool {
        matches!(
            self,
            Self::Container | Self::Stage | Self::Layer | Self::Group
        )
    }

    /// Whether a container of this role accepts a child of role `child`.
    #[must_use]
    pub const fn accepts(self, child: Self) -> bool {
        match self {
            Self::Stage => matches!(child, Self::Layer),
            Self::Layer | Self::Group => matches!(child, Self::Group | Self::Shape),
            _ => false,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = NodeId::next();
        let b = NodeId::next();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }

    #[test]
    fn containment_rules() {
        assert!(Role::Stage.accepts(Role::Layer));
        assert!(!Role::Stage.accepts(Role::Shape));
        assert!(Role::Layer.accepts(Role::Group));
        assert!(!Role::Layer.accepts(Role::Layer));
        assert!(Role::Group.accepts(Role::Shape));
        assert!(!Role::Shape.accepts(Role::Shape));
    }

    #[test]
    fn lineage_starts_at_base() {
        assert_eq!(Role::Shape.lineage(), &[Role::Node, Role::Shape]);
        assert_eq!(Role::Group.lineage()[0], Role::Node);
        assert_eq!(*Role::Layer.lineage().last().unwrap(), Role::Layer);
    }
}
