// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Plain-data copies of subtrees, for serialization collaborators.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::{NodeId, Role, Scene, Value};

/// A node and its descendants, detached from any scene.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeSnapshot {
    /// Class name set by the shape collaborator, or the role name.
    pub class_name: String,
    /// Structural role.
    pub role: Role,
    /// Explicitly stored attributes.
    pub attrs: BTreeMap<String, Value>,
    /// Children in z-order.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub children: Vec<NodeSnapshot>,
}

impl NodeSnapshot {
    /// Number of nodes in this snapshot, itself included.
    #[must_use]
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(Self::len).sum::<usize>()
    }

    /// Always `false`: a snapshot holds at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Scene {
    /// Copies `id` and its subtree. `None` for a missing node.
    #[must_use]
    pub fn snapshot(&self, id: NodeId) -> Option<NodeSnapshot> {
        let node = self.nodes.get(&id)?;
        Some(NodeSnapshot {
            class_name: String::from(node.class_name.as_ref()),
            role: node.role,
            attrs: self.attrs_snapshot(id).into_iter().collect(),
            children: self
                .children(id)
                .iter()
                .filter_map(|c| self.snapshot(*c))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SceneConfig, ShapeSpec};

    #[test]
    fn snapshot_mirrors_tree() {
        let mut scene = Scene::new(SceneConfig::default());
        let group = scene.create_group();
        let rect = scene.create_shape(ShapeSpec::new("Rect", |_, _| {}));
        scene.add(group, rect);
        scene.set_x(rect, 4.0);
        scene.set_attr(rect, "fill", "red");

        let snap = scene.snapshot(group).unwrap();
        assert_eq!(snap.role, Role::Group);
        assert_eq!(snap.len(), 2);
        let child = &snap.children[0];
        assert_eq!(child.class_name, "Rect");
        assert_eq!(child.attrs.get("x"), Some(&Value::from(4.0)));
        assert_eq!(child.attrs.get("fill"), Some(&Value::from("red")));
        assert!(scene.snapshot(NodeId::next()).is_none());
    }
}
