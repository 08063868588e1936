//! Skeletons: joints plus the matrices needed to skin a mesh.

use std::sync::{Arc, PoisonError, RwLock};

use crate::math::Mat4;
use crate::model::Node;

/// One joint entry of a skeleton.
#[derive(Debug, Clone)]
pub struct SkeletonJoint {
    /// The joint node in the scene graph.
    pub node: Arc<Node>,
    /// Zero-based index in skeleton traversal order. This order defines
    /// the row order of every bone-transform array; consumers must not
    /// reorder joints.
    pub index: usize,
}

/// An ordered joint list with per-joint inverse-bind matrices.
///
/// The `world_transforms` and `skin_transforms` caches are allocated
/// here, sized to the joint count, and populated each frame by the
/// animation/render step.
#[derive(Debug)]
pub struct Skeleton {
    /// Joints in traversal order.
    pub joints: Vec<SkeletonJoint>,
    /// Inverse-bind matrix per joint, parallel to `joints`.
    pub inverse_bind_matrices: Vec<Mat4>,
    /// Bind-shape matrix applied before skinning.
    pub bind_shape_matrix: Mat4,
    world_transforms: RwLock<Vec<Mat4>>,
    skin_transforms: RwLock<Vec<Mat4>>,
}

impl Skeleton {
    /// Create a skeleton; caches start as the joints' current
    /// local-to-root transforms and identity skin transforms.
    pub fn new(
        joints: Vec<SkeletonJoint>,
        inverse_bind_matrices: Vec<Mat4>,
        bind_shape_matrix: Mat4,
    ) -> Self {
        debug_assert_eq!(joints.len(), inverse_bind_matrices.len());
        let world = joints.iter().map(|j| j.node.local_to_root()).collect();
        let skin = vec![Mat4::identity(); joints.len()];
        Self {
            joints,
            inverse_bind_matrices,
            bind_shape_matrix,
            world_transforms: RwLock::new(world),
            skin_transforms: RwLock::new(skin),
        }
    }

    /// Number of joints.
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Snapshot of the per-joint world transforms.
    ///
    /// Writers swap the whole vector, so even a poisoned lock holds a
    /// complete snapshot; poisoning is recovered, not propagated.
    pub fn world_transforms(&self) -> Vec<Mat4> {
        self.world_transforms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot of the per-joint skin transforms.
    pub fn skin_transforms(&self) -> Vec<Mat4> {
        self.skin_transforms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the world-transform cache. Length must equal the joint
    /// count; the animation step owns this data.
    pub fn store_world_transforms(&self, transforms: Vec<Mat4>) {
        debug_assert_eq!(transforms.len(), self.joints.len());
        *self
            .world_transforms
            .write()
            .unwrap_or_else(PoisonError::into_inner) = transforms;
    }

    /// Replace the skin-transform cache.
    pub fn store_skin_transforms(&self, transforms: Vec<Mat4>) {
        debug_assert_eq!(transforms.len(), self.joints.len());
        *self
            .skin_transforms
            .write()
            .unwrap_or_else(PoisonError::into_inner) = transforms;
    }
}
