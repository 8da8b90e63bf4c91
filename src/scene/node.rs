//! Scene-graph nodes: local TRS plus a parent handle, world transforms by
//! recursive composition.
//!
//! Parent links are integer handles into the node registry, not owning
//! references, so the graph is a parent-index tree. `set_parent` (on the
//! engine) rejects links that would close a cycle; see
//! [`would_create_cycle`].

use cgmath::{Matrix4, Vector3};

use crate::arena::{Handle, SlotArena};
use crate::math;
use crate::scene::MAX_NODES;

/// One scene-graph node. `parent == 0` means the node hangs off the root.
#[derive(Debug, Clone, Copy)]
pub struct Node {
    pub position: Vector3<f32>,
    /// Euler rotation in degrees, applied in Y-X-Z order.
    pub rotation_deg: Vector3<f32>,
    pub scale: Vector3<f32>,
    /// Mesh drawn by this node, 0 = none.
    pub mesh: Handle,
    pub parent: Handle,
    pub active: bool,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation_deg: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
            mesh: 0,
            parent: 0,
            active: true,
        }
    }
}

impl Node {
    pub fn local_transform(&self) -> Matrix4<f32> {
        math::compose_trs(self.position, self.rotation_deg, self.scale)
    }
}

pub type NodeArena = SlotArena<Node, MAX_NODES>;

/// Composes the world transform of `handle` as `parent_world * local`,
/// walking parent links to the root. Invalid handles yield `None`.
///
/// No caching: the walk is bounded by tree depth, and cycle rejection at
/// parenting time keeps the recursion finite.
pub fn world_transform(nodes: &NodeArena, handle: Handle) -> Option<Matrix4<f32>> {
    let node = nodes.get(handle)?;
    let local = node.local_transform();
    match world_transform(nodes, node.parent) {
        Some(parent_world) => Some(parent_world * local),
        None => Some(local),
    }
}

/// True when parenting `child` under `parent` would close a cycle, i.e.
/// `child` already appears on `parent`'s ancestor chain (or is `parent`
/// itself). A dead handle on the chain terminates the walk.
pub fn would_create_cycle(nodes: &NodeArena, child: Handle, parent: Handle) -> bool {
    let mut cursor = parent;
    while let Some(node) = nodes.get(cursor) {
        if cursor == child {
            return true;
        }
        cursor = node.parent;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::Zero;

    fn node_at(position: Vector3<f32>) -> Node {
        Node {
            position,
            ..Default::default()
        }
    }

    #[test]
    fn world_transform_composes_three_deep_chain() {
        let mut nodes = NodeArena::new();
        let root = nodes.insert(node_at(Vector3::new(1.0, 0.0, 0.0)));
        let mid = nodes.insert(Node {
            position: Vector3::new(0.0, 2.0, 0.0),
            parent: root,
            ..Default::default()
        });
        let leaf = nodes.insert(Node {
            position: Vector3::new(0.0, 0.0, 3.0),
            parent: mid,
            ..Default::default()
        });

        // Reference: explicit root-to-leaf matrix chain.
        let expected = math::compose_trs(
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::zero(),
            Vector3::new(1.0, 1.0, 1.0),
        ) * math::compose_trs(
            Vector3::new(0.0, 2.0, 0.0),
            Vector3::zero(),
            Vector3::new(1.0, 1.0, 1.0),
        ) * math::compose_trs(
            Vector3::new(0.0, 0.0, 3.0),
            Vector3::zero(),
            Vector3::new(1.0, 1.0, 1.0),
        );

        let world = world_transform(&nodes, leaf).unwrap();
        let p = math::transform_point(&world, Vector3::zero());
        let q = math::transform_point(&expected, Vector3::zero());
        assert_relative_eq!(p.x, q.x, epsilon = 1e-5);
        assert_relative_eq!(p.y, q.y, epsilon = 1e-5);
        assert_relative_eq!(p.z, q.z, epsilon = 1e-5);
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(p.y, 2.0, epsilon = 1e-5);
        assert_relative_eq!(p.z, 3.0, epsilon = 1e-5);
    }

    #[test]
    fn parent_rotation_carries_into_child_translation() {
        let mut nodes = NodeArena::new();
        let root = nodes.insert(Node {
            rotation_deg: Vector3::new(0.0, 90.0, 0.0),
            ..Default::default()
        });
        let child = nodes.insert(Node {
            position: Vector3::new(0.0, 0.0, 1.0),
            parent: root,
            ..Default::default()
        });

        let world = world_transform(&nodes, child).unwrap();
        let p = math::transform_point(&world, Vector3::zero());
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn cycle_detection_catches_self_and_ancestry() {
        let mut nodes = NodeArena::new();
        let a = nodes.insert(Node::default());
        let b = nodes.insert(Node {
            parent: a,
            ..Default::default()
        });
        let c = nodes.insert(Node {
            parent: b,
            ..Default::default()
        });

        assert!(would_create_cycle(&nodes, a, a));
        assert!(would_create_cycle(&nodes, a, c));
        assert!(would_create_cycle(&nodes, b, c));
        assert!(!would_create_cycle(&nodes, c, a));
    }

    #[test]
    fn invalid_handle_has_no_world_transform() {
        let nodes = NodeArena::new();
        assert!(world_transform(&nodes, 0).is_none());
        assert!(world_transform(&nodes, 13).is_none());
    }
}
