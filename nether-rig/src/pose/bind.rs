//! Bind pose: the rig's rest state and its inverse bind matrices

use glam::Mat4;

use super::cache::{ConcatenationHooks, PoseCache};
use crate::BoneIndex;
use crate::bone::Bone;
use crate::transform::Transform;

/// Rest pose of a skeleton.
///
/// Resolved eagerly when built, so every accessor is read-only. Its palette
/// holds the inverse bind matrix of each bone, which ordinary poses multiply
/// into their skinning matrices.
#[derive(Clone, Debug)]
pub struct BindPose {
    cache: PoseCache,
    inverse_absolute: Vec<Transform>,
}

/// Stores inverse absolute transforms and inverse bind matrices.
struct BindHooks<'a> {
    inverse_absolute: &'a mut [Transform],
}

impl ConcatenationHooks for BindHooks<'_> {
    fn absolute_resolved(&mut self, bone: BoneIndex, absolute: &Transform) {
        self.inverse_absolute[bone] = absolute.inverse();
    }

    fn palette_entry(&self, _bone: BoneIndex, absolute: &Transform) -> Mat4 {
        absolute.to_mat4().inverse()
    }
}

impl BindPose {
    pub(crate) fn empty() -> Self {
        Self {
            cache: PoseCache::new(Vec::new()),
            inverse_absolute: Vec::new(),
        }
    }

    /// Copy each bone's rest transform and resolve the whole hierarchy.
    pub(crate) fn calculate(bones: &[Bone]) -> Self {
        let relative = bones.iter().map(|bone| bone.rest).collect();
        let mut cache = PoseCache::new(relative);
        let mut inverse_absolute = vec![Transform::IDENTITY; bones.len()];
        cache.concatenate(
            bones,
            &mut BindHooks {
                inverse_absolute: &mut inverse_absolute,
            },
        );
        debug_assert_eq!(cache.dirty_count(), 0);
        Self {
            cache,
            inverse_absolute,
        }
    }

    pub fn bone_count(&self) -> usize {
        self.cache.bone_count()
    }

    pub fn relative_transform(&self, index: BoneIndex) -> Transform {
        self.cache.check_index(index);
        self.cache.relative()[index]
    }

    pub fn absolute_transform(&self, index: BoneIndex) -> Transform {
        self.cache.check_index(index);
        self.cache.absolute()[index]
    }

    pub fn inverse_absolute_transform(&self, index: BoneIndex) -> Transform {
        self.cache.check_index(index);
        self.inverse_absolute[index]
    }

    pub fn relative_transforms(&self) -> &[Transform] {
        self.cache.relative()
    }

    pub fn absolute_transforms(&self) -> &[Transform] {
        self.cache.absolute()
    }

    pub fn inverse_absolute_transforms(&self) -> &[Transform] {
        &self.inverse_absolute
    }

    /// `inverse(absolute.to_mat4())` per bone
    pub fn inverse_bind_matrices(&self) -> &[Mat4] {
        self.cache.palette()
    }
}
