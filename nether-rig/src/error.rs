//! Rig error types

use crate::BoneIndex;

/// Errors raised while building a skeleton or binding poses to it
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RigError {
    /// `create_bone` called on a skeleton that already has a root
    #[error("skeleton already has a root bone - create further bones as children")]
    RootExists,

    /// Bone index does not exist in the skeleton
    #[error("bone {index} does not exist (skeleton has {bone_count} bones)")]
    UnknownBone { index: BoneIndex, bone_count: usize },

    /// Skeleton is full
    #[error("skeleton has too many bones (max {0})")]
    TooManyBones(usize),

    /// Name is already held by another bone
    #[error("bone name '{name}' is already used by bone {holder}")]
    DuplicateName { name: String, holder: BoneIndex },

    /// Bind pose is missing or older than the skeleton's bones
    #[error("bind pose is out of date - call calculate_bind_pose() after building the skeleton")]
    StaleBindPose,

    /// Two poses bound to different skeletons
    #[error("poses belong to different skeletons")]
    SkeletonMismatch,

    /// Rig description has no bones
    #[error("rig description contains no bones")]
    EmptyRig,

    /// Rig description bone refers to a parent that does not precede it
    #[error("bone {index} has parent {parent}, which must be an earlier bone")]
    InvalidParent { index: BoneIndex, parent: BoneIndex },

    /// Rig description has a second parentless bone
    #[error("bone {0} has no parent, but only the first bone may be the root")]
    MultipleRoots(BoneIndex),
}
