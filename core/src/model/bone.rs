//! Bones of a model's skeletal hierarchy.

use std::sync::{Arc, OnceLock, Weak};

use crate::math::Mat4;

/// A joint in the skeletal hierarchy.
///
/// Parent/child edges form a forest: the parent back-reference is weak
/// (non-owning) while child references are strong, so dropping a model
/// releases the whole hierarchy. Both edges are set exactly once during
/// load and never reassigned.
#[derive(Debug)]
pub struct ModelBone {
    /// Bone name.
    pub name: String,
    /// Local transform relative to the parent bone.
    pub transform: Mat4,
    /// Position in the model's bone table.
    pub index: usize,
    parent: OnceLock<Weak<ModelBone>>,
    children: OnceLock<Vec<Arc<ModelBone>>>,
}

impl ModelBone {
    /// Create a bone with no hierarchy edges wired yet.
    pub fn new(name: impl Into<String>, transform: Mat4, index: usize) -> Self {
        Self {
            name: name.into(),
            transform,
            index,
            parent: OnceLock::new(),
            children: OnceLock::new(),
        }
    }

    /// Wire the parent back-reference; the first edge wins and later
    /// sets are ignored.
    pub(crate) fn set_parent(&self, parent: &Arc<ModelBone>) {
        let _ = self.parent.set(Arc::downgrade(parent));
    }

    /// Wire the ordered child list.
    pub(crate) fn set_children(&self, children: Vec<Arc<ModelBone>>) {
        let already = self.children.set(children).is_err();
        debug_assert!(!already, "bone children set twice");
    }

    /// The parent bone, upgraded; `None` for roots.
    pub fn parent(&self) -> Option<Arc<ModelBone>> {
        self.parent.get().and_then(Weak::upgrade)
    }

    /// Ordered child bones; empty before wiring and for leaves.
    pub fn children(&self) -> &[Arc<ModelBone>] {
        self.children.get().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Product of this bone's transform with all its ancestors'.
    pub fn local_to_root(&self) -> Mat4 {
        match self.parent() {
            Some(parent) => parent.local_to_root() * self.transform,
            None => self.transform,
        }
    }
}
