//! Skeleton: bone arena, name lookup and bind pose
//!
//! A skeleton is built once (root first, then children), given rest
//! transforms, and finished with [`Skeleton::calculate_bind_pose`]. After
//! that it is usually wrapped in an `Arc` and shared read-only by every
//! [`Pose`](crate::Pose) animating the rig.

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::bone::Bone;
use crate::error::RigError;
use crate::pose::BindPose;
use crate::transform::Transform;
use crate::{BoneIndex, MAX_BONES};

/// Bone hierarchy of one rig
#[derive(Clone, Debug)]
pub struct Skeleton {
    bones: Vec<Bone>,
    names: HashMap<String, BoneIndex>,
    bind_pose: BindPose,
    /// False once bones or rest transforms changed after the last bind pose
    bind_pose_current: bool,
}

impl Default for Skeleton {
    fn default() -> Self {
        Self::new()
    }
}

impl Skeleton {
    pub fn new() -> Self {
        Self {
            bones: Vec::new(),
            names: HashMap::new(),
            bind_pose: BindPose::empty(),
            bind_pose_current: false,
        }
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// All bones, indexed by [`BoneIndex`]
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    /// Root bone (the first bone created)
    pub fn root(&self) -> Option<&Bone> {
        self.bones.first()
    }

    pub fn bone(&self, index: BoneIndex) -> Option<&Bone> {
        self.bones.get(index)
    }

    /// Look up a bone by name. Empty names never match.
    pub fn bone_by_name(&self, name: &str) -> Option<&Bone> {
        if name.is_empty() {
            return None;
        }
        self.names.get(name).map(|&index| &self.bones[index])
    }

    /// Create the root bone.
    ///
    /// Only valid on an empty skeleton; every other bone is created with
    /// [`create_child`](Self::create_child).
    pub fn create_bone(&mut self) -> Result<BoneIndex, RigError> {
        if !self.bones.is_empty() {
            return Err(RigError::RootExists);
        }
        self.push_bone(None)
    }

    /// Create a new bone under `parent`.
    pub fn create_child(&mut self, parent: BoneIndex) -> Result<BoneIndex, RigError> {
        self.check_index(parent)?;
        let index = self.push_bone(Some(parent))?;
        self.bones[parent].children.push(index);
        Ok(index)
    }

    fn push_bone(&mut self, parent: Option<BoneIndex>) -> Result<BoneIndex, RigError> {
        if self.bones.len() >= MAX_BONES {
            return Err(RigError::TooManyBones(MAX_BONES));
        }
        let index = self.bones.len();
        self.bones.push(Bone::new(index, parent));
        self.bind_pose_current = false;
        Ok(index)
    }

    /// Rename a bone.
    ///
    /// A non-empty name already held by a different bone is rejected and the
    /// skeleton is left unchanged. An empty name clears the bone's name.
    pub fn rename_bone(&mut self, index: BoneIndex, name: &str) -> Result<(), RigError> {
        self.check_index(index)?;

        if !name.is_empty() {
            if let Some(&holder) = self.names.get(name) {
                if holder == index {
                    return Ok(());
                }
                tracing::warn!(
                    bone = index,
                    holder,
                    bone_name = name,
                    "Bone name already in use - rename rejected"
                );
                return Err(RigError::DuplicateName {
                    name: name.to_string(),
                    holder,
                });
            }
        }

        let old = std::mem::replace(&mut self.bones[index].name, name.to_string());
        if !old.is_empty() {
            self.names.remove(&old);
        }
        if !name.is_empty() {
            self.names.insert(name.to_string(), index);
        }
        Ok(())
    }

    /// Set a bone's authored rest transform (relative to its parent).
    ///
    /// Takes effect for poses after the next [`calculate_bind_pose`](Self::calculate_bind_pose).
    pub fn set_rest_transform(
        &mut self,
        index: BoneIndex,
        transform: Transform,
    ) -> Result<(), RigError> {
        self.check_index(index)?;
        self.bones[index].rest = transform;
        self.bind_pose_current = false;
        Ok(())
    }

    pub fn set_bone_length(&mut self, index: BoneIndex, length: f32) -> Result<(), RigError> {
        self.check_index(index)?;
        self.bones[index].length = length;
        Ok(())
    }

    /// Rebuild the bind pose from the current rest transforms.
    ///
    /// Must run before any pose's skinning matrices are meaningful.
    pub fn calculate_bind_pose(&mut self) {
        self.bind_pose = BindPose::calculate(&self.bones);
        self.bind_pose_current = true;
        tracing::debug!(bones = self.bones.len(), "Calculated bind pose");
    }

    pub fn bind_pose(&self) -> &BindPose {
        &self.bind_pose
    }

    /// Whether the bind pose reflects the current bones and rest transforms
    pub fn has_current_bind_pose(&self) -> bool {
        self.bind_pose_current
    }

    pub fn parent(&self, index: BoneIndex) -> Option<BoneIndex> {
        self.bones.get(index).and_then(Bone::parent)
    }

    pub fn children(&self, index: BoneIndex) -> &[BoneIndex] {
        self.bones.get(index).map(Bone::children).unwrap_or_default()
    }

    /// Depth-first, pre-order walk over `index` and everything below it.
    ///
    /// Yields nothing for an unknown index.
    pub fn descendants(&self, index: BoneIndex) -> Descendants<'_> {
        let mut stack = SmallVec::new();
        if index < self.bones.len() {
            stack.push(index);
        }
        Descendants {
            bones: &self.bones,
            stack,
        }
    }

    /// Number of ancestors between `index` and the root (root is 0)
    pub fn depth(&self, index: BoneIndex) -> Option<usize> {
        self.check_index(index).ok()?;
        let mut depth = 0;
        let mut current = index;
        while let Some(parent) = self.bones[current].parent {
            depth += 1;
            current = parent;
        }
        Some(depth)
    }

    /// True if `ancestor` is a strict ancestor of `bone`
    pub fn is_ancestor(&self, ancestor: BoneIndex, bone: BoneIndex) -> bool {
        let mut current = self.parent(bone);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.bones[parent].parent;
        }
        false
    }

    fn check_index(&self, index: BoneIndex) -> Result<(), RigError> {
        if index < self.bones.len() {
            Ok(())
        } else {
            Err(RigError::UnknownBone {
                index,
                bone_count: self.bones.len(),
            })
        }
    }
}

/// Iterator returned by [`Skeleton::descendants`]
pub struct Descendants<'a> {
    bones: &'a [Bone],
    stack: SmallVec<[BoneIndex; 32]>,
}

impl Iterator for Descendants<'_> {
    type Item = BoneIndex;

    fn next(&mut self) -> Option<BoneIndex> {
        let index = self.stack.pop()?;
        self.stack
            .extend(self.bones[index].children.iter().rev().copied());
        Some(index)
    }
}
