//! Per-instance pose cache
//!
//! A [`Pose`] holds one animated instance's relative bone transforms and
//! lazily derives absolute transforms and skinning matrices from them.
//!
//! # Dirty propagation
//!
//! Writing a relative transform marks that bone and its whole subtree dirty.
//! Nothing is recomputed until a query needs it: reading one absolute
//! transform resolves only the dirty chain above it (from the topmost dirty
//! ancestor down), while [`Pose::concatenate`] resolves everything. Each
//! affected bone is recomputed at most once per write.
//!
//! # Skinning
//!
//! The palette entry of a bone is `absolute.to_mat4() * inverse_bind`, where
//! the inverse bind matrix comes from the skeleton's [`BindPose`]. A pose at
//! rest therefore has an identity palette.
//!
//! # Panics
//!
//! Per-bone accessors and setters panic when given an index outside
//! `0..bone_count()`.

mod bind;
mod cache;


pub use bind::BindPose;

use std::sync::Arc;

use glam::Mat4;

use crate::BoneIndex;
use crate::error::RigError;
use crate::palette::BoneMatrix3x4;
use crate::skeleton::Skeleton;
use crate::transform::Transform;
use cache::{ConcatenationHooks, PoseCache};

/// Animated pose of one skeleton instance
#[derive(Clone, Debug)]
pub struct Pose {
    skeleton: Arc<Skeleton>,
    cache: PoseCache,
}

/// Multiplies each absolute matrix by the bind pose's inverse bind matrix.
struct InstanceHooks<'a> {
    inverse_bind: &'a [Mat4],
}

impl ConcatenationHooks for InstanceHooks<'_> {
    fn palette_entry(&self, bone: BoneIndex, absolute: &Transform) -> Mat4 {
        absolute.to_mat4() * self.inverse_bind[bone]
    }
}

impl Pose {
    /// Create a pose at the skeleton's bind pose.
    ///
    /// Fails with [`RigError::StaleBindPose`] when the skeleton's bind pose
    /// has not been calculated since its last change.
    pub fn new(skeleton: Arc<Skeleton>) -> Result<Self, RigError> {
        if !skeleton.has_current_bind_pose() {
            return Err(RigError::StaleBindPose);
        }
        let relative = skeleton.bind_pose().relative_transforms().to_vec();
        Ok(Self {
            skeleton,
            cache: PoseCache::new(relative),
        })
    }

    pub fn skeleton(&self) -> &Arc<Skeleton> {
        &self.skeleton
    }

    pub fn bone_count(&self) -> usize {
        self.cache.bone_count()
    }

    /// Number of bones whose cached data is stale
    pub fn dirty_count(&self) -> usize {
        self.cache.dirty_count()
    }

    pub fn is_dirty(&self, index: BoneIndex) -> bool {
        self.cache.is_dirty(index)
    }

    pub fn relative_transform(&self, index: BoneIndex) -> Transform {
        self.cache.check_index(index);
        self.cache.relative()[index]
    }

    /// Overwrite a bone's relative transform, invalidating its subtree.
    pub fn set_relative_transform(&mut self, index: BoneIndex, transform: Transform) {
        self.cache
            .set_relative(self.skeleton.bones(), index, transform);
    }

    /// Restore one bone to its bind pose relative transform.
    pub fn reset_bone(&mut self, index: BoneIndex) {
        let rest = self.skeleton.bind_pose().relative_transform(index);
        self.set_relative_transform(index, rest);
    }

    /// Restore every bone to the bind pose.
    pub fn reset(&mut self) {
        for index in 0..self.bone_count() {
            self.reset_bone(index);
        }
    }

    /// Copy every relative transform from `other`, bone by bone.
    pub fn copy_from(&mut self, other: &Pose) -> Result<(), RigError> {
        if !Arc::ptr_eq(&self.skeleton, &other.skeleton) {
            return Err(RigError::SkeletonMismatch);
        }
        for (index, transform) in other.cache.relative().iter().enumerate() {
            self.cache
                .set_relative(self.skeleton.bones(), index, *transform);
        }
        Ok(())
    }

    /// Absolute (model space) transform of a bone, resolving it if stale.
    pub fn absolute_transform(&mut self, index: BoneIndex) -> &Transform {
        let skeleton = &self.skeleton;
        self.cache.resolve(
            skeleton.bones(),
            index,
            &mut InstanceHooks {
                inverse_bind: skeleton.bind_pose().inverse_bind_matrices(),
            },
        )
    }

    /// Resolve every dirty bone.
    pub fn concatenate(&mut self) {
        let skeleton = &self.skeleton;
        self.cache.concatenate(
            skeleton.bones(),
            &mut InstanceHooks {
                inverse_bind: skeleton.bind_pose().inverse_bind_matrices(),
            },
        );
    }

    /// Cached skinning matrices, indexed by bone.
    ///
    /// Entries of dirty bones are stale; call [`concatenate`](Self::concatenate)
    /// first or use [`skinning_matrices`](Self::skinning_matrices).
    pub fn matrix_palette(&self) -> &[Mat4] {
        self.cache.palette()
    }

    /// Concatenate, then return the skinning matrices.
    pub fn skinning_matrices(&mut self) -> &[Mat4] {
        self.concatenate();
        self.cache.palette()
    }

    /// Concatenate, then return all absolute transforms.
    pub fn absolute_transforms(&mut self) -> &[Transform] {
        self.concatenate();
        self.cache.absolute()
    }

    /// Concatenate and append the palette to `out` in 3x4 upload format.
    pub fn write_gpu_palette(&mut self, out: &mut Vec<BoneMatrix3x4>) {
        let palette = self.skinning_matrices();
        out.extend(palette.iter().copied().map(BoneMatrix3x4::from));
    }
}
