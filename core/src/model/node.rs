//! Scene graph nodes.

use std::sync::{Arc, OnceLock, Weak};

use crate::math::{Mat4, Vec3, mat4_from_scale_rotation_translation, quat_from_array};
use crate::model::{ModelMesh, Skeleton};

/// Local transform of a node: a full matrix or decomposed TRS.
///
/// The two representations are mutually exclusive at construction; a
/// document that supplies both is rejected by the node reader.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeTransform {
    /// Explicit local matrix.
    Matrix(Mat4),
    /// Decomposed translation / rotation / scale.
    Decomposed {
        /// Translation.
        translation: [f32; 3],
        /// Rotation quaternion `[x, y, z, w]`.
        rotation: [f32; 4],
        /// Per-axis scale.
        scale: [f32; 3],
    },
}

impl NodeTransform {
    /// Identity transform (decomposed form).
    pub const IDENTITY: Self = Self::Decomposed {
        translation: [0.0, 0.0, 0.0],
        rotation: [0.0, 0.0, 0.0, 1.0],
        scale: [1.0, 1.0, 1.0],
    };

    /// The local matrix, composing TRS when decomposed.
    pub fn matrix(&self) -> Mat4 {
        match self {
            Self::Matrix(m) => *m,
            Self::Decomposed {
                translation,
                rotation,
                scale,
            } => mat4_from_scale_rotation_translation(
                Vec3::new(scale[0], scale[1], scale[2]),
                quat_from_array(*rotation),
                Vec3::new(translation[0], translation[1], translation[2]),
            ),
        }
    }
}

/// A node in the scene DAG.
///
/// Nodes marked as joints form a parallel, congruent sub-DAG used by
/// skeletons. Children, parent, meshes and skin are wired by the
/// assembler after construction, each exactly once.
#[derive(Debug)]
pub struct Node {
    /// Node name (the document key).
    pub name: String,
    /// Local transform.
    pub transform: NodeTransform,
    /// Whether this node is a joint in a skeleton.
    pub is_joint: bool,
    parent: OnceLock<Weak<Node>>,
    children: OnceLock<Vec<Arc<Node>>>,
    meshes: OnceLock<Vec<Arc<ModelMesh>>>,
    skin: OnceLock<Arc<Skeleton>>,
    joint_index: OnceLock<usize>,
}

impl Node {
    /// Create a node with no edges wired yet.
    pub fn new(name: impl Into<String>, transform: NodeTransform, is_joint: bool) -> Self {
        Self {
            name: name.into(),
            transform,
            is_joint,
            parent: OnceLock::new(),
            children: OnceLock::new(),
            meshes: OnceLock::new(),
            skin: OnceLock::new(),
            joint_index: OnceLock::new(),
        }
    }

    /// Wire the parent back-reference. A node reached through several
    /// parents keeps the first; later edges leave it untouched.
    pub(crate) fn set_parent(&self, parent: &Arc<Node>) {
        let _ = self.parent.set(Arc::downgrade(parent));
    }

    pub(crate) fn set_children(&self, children: Vec<Arc<Node>>) {
        let already = self.children.set(children).is_err();
        debug_assert!(!already, "node children set twice");
    }

    pub(crate) fn set_meshes(&self, meshes: Vec<Arc<ModelMesh>>) {
        let already = self.meshes.set(meshes).is_err();
        debug_assert!(!already, "node meshes set twice");
    }

    pub(crate) fn set_skin(&self, skin: Arc<Skeleton>) {
        let already = self.skin.set(skin).is_err();
        debug_assert!(!already, "node skin set twice");
    }

    /// Record the joint index assigned by the first skeleton that
    /// claims this node.
    pub(crate) fn set_joint_index(&self, index: usize) {
        let _ = self.joint_index.set(index);
    }

    /// The parent node, upgraded; `None` for roots.
    pub fn parent(&self) -> Option<Arc<Node>> {
        self.parent.get().and_then(Weak::upgrade)
    }

    /// Ordered child nodes.
    pub fn children(&self) -> &[Arc<Node>] {
        self.children.get().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Meshes attached to this node.
    pub fn meshes(&self) -> &[Arc<ModelMesh>] {
        self.meshes.get().map(Vec::as_slice).unwrap_or(&[])
    }

    /// The skeleton skinning this node's meshes, if any.
    pub fn skin(&self) -> Option<&Arc<Skeleton>> {
        self.skin.get()
    }

    /// Zero-based joint index assigned during skeleton assembly.
    pub fn joint_index(&self) -> Option<usize> {
        self.joint_index.get().copied()
    }

    /// Product of this node's local matrix with all its ancestors'.
    pub fn local_to_root(&self) -> Mat4 {
        match self.parent() {
            Some(parent) => parent.local_to_root() * self.transform.matrix(),
            None => self.transform.matrix(),
        }
    }
}
