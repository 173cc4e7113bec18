//! Bone nodes of a skeleton hierarchy

use crate::BoneIndex;
use crate::transform::Transform;

/// One rigid node of a rig.
///
/// Bones live in their [`Skeleton`](crate::Skeleton)'s arena and refer to
/// each other by [`BoneIndex`]. Parent links are fixed at creation.
#[derive(Clone, Debug, PartialEq)]
pub struct Bone {
    pub(crate) index: BoneIndex,
    pub(crate) name: String,
    pub(crate) parent: Option<BoneIndex>,
    pub(crate) children: Vec<BoneIndex>,
    pub(crate) rest: Transform,
    pub(crate) length: f32,
}

impl Bone {
    pub(crate) fn new(index: BoneIndex, parent: Option<BoneIndex>) -> Self {
        Self {
            index,
            name: String::new(),
            parent,
            children: Vec::new(),
            rest: Transform::IDENTITY,
            length: 0.0,
        }
    }

    /// Dense index within the skeleton
    pub fn index(&self) -> BoneIndex {
        self.index
    }

    /// Bone name; empty means unnamed
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<BoneIndex> {
        self.parent
    }

    /// Children in creation order
    pub fn children(&self) -> &[BoneIndex] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Authored rest transform relative to the parent bone
    pub fn rest_transform(&self) -> &Transform {
        &self.rest
    }

    /// Display length, not used by the pose math
    pub fn length(&self) -> f32 {
        self.length
    }
}
