//! Dirty-tracking concatenation engine shared by [`Pose`](super::Pose) and
//! [`BindPose`](super::BindPose)
//!
//! Both pose kinds store the same per-bone arrays and run the same
//! propagation/resolution walk. They differ only in what gets written into
//! the palette slot, which is supplied through [`ConcatenationHooks`].
//!
//! Invariants:
//! - a clean bone's absolute transform equals its parent's absolute transform
//!   composed with its current relative transform
//! - a clean bone never has a dirty ancestor
//! - `dirty_count` equals the number of set dirty flags

use glam::Mat4;
use smallvec::SmallVec;

use crate::BoneIndex;
use crate::bone::Bone;
use crate::transform::Transform;

type BoneStack = SmallVec<[BoneIndex; 32]>;

/// Per-bone payload computed while resolving a dirty bone.
pub(crate) trait ConcatenationHooks {
    /// Called once a bone's absolute transform has been recomputed.
    fn absolute_resolved(&mut self, _bone: BoneIndex, _absolute: &Transform) {}

    /// Value stored in the bone's palette slot.
    fn palette_entry(&self, bone: BoneIndex, absolute: &Transform) -> Mat4;
}

#[derive(Clone, Debug)]
pub(crate) struct PoseCache {
    relative: Vec<Transform>,
    absolute: Vec<Transform>,
    palette: Vec<Mat4>,
    dirty: Vec<bool>,
    dirty_count: usize,
}

impl PoseCache {
    /// New cache with every bone dirty.
    pub(crate) fn new(relative: Vec<Transform>) -> Self {
        let bone_count = relative.len();
        Self {
            relative,
            absolute: vec![Transform::IDENTITY; bone_count],
            palette: vec![Mat4::IDENTITY; bone_count],
            dirty: vec![true; bone_count],
            dirty_count: bone_count,
        }
    }

    pub(crate) fn bone_count(&self) -> usize {
        self.relative.len()
    }

    pub(crate) fn dirty_count(&self) -> usize {
        self.dirty_count
    }

    pub(crate) fn relative(&self) -> &[Transform] {
        &self.relative
    }

    pub(crate) fn absolute(&self) -> &[Transform] {
        &self.absolute
    }

    pub(crate) fn palette(&self) -> &[Mat4] {
        &self.palette
    }

    pub(crate) fn is_dirty(&self, index: BoneIndex) -> bool {
        self.check_index(index);
        self.dirty[index]
    }

    #[track_caller]
    pub(crate) fn check_index(&self, index: BoneIndex) {
        assert!(
            index < self.relative.len(),
            "bone index {} out of range (pose has {} bones)",
            index,
            self.relative.len()
        );
    }

    /// Overwrite a relative transform and dirty the bone's subtree.
    #[track_caller]
    pub(crate) fn set_relative(&mut self, bones: &[Bone], index: BoneIndex, transform: Transform) {
        self.check_index(index);
        self.relative[index] = transform;
        self.mark_dirty(bones, index);
    }

    /// Dirty `index` and every descendant.
    ///
    /// An already dirty bone already has a dirty subtree, so the walk stops there.
    fn mark_dirty(&mut self, bones: &[Bone], index: BoneIndex) {
        let mut stack = BoneStack::new();
        stack.push(index);
        while let Some(bone) = stack.pop() {
            if self.dirty[bone] {
                continue;
            }
            self.dirty[bone] = true;
            self.dirty_count += 1;
            stack.extend(bones[bone].children.iter().copied());
        }
    }

    /// Highest dirty bone on the chain from `index` to the root.
    fn topmost_dirty(&self, bones: &[Bone], index: BoneIndex) -> BoneIndex {
        let mut top = index;
        while let Some(parent) = bones[top].parent {
            if !self.dirty[parent] {
                break;
            }
            top = parent;
        }
        top
    }

    /// Absolute transform of `index`, resolving its dirty chain first.
    #[track_caller]
    pub(crate) fn resolve<H: ConcatenationHooks>(
        &mut self,
        bones: &[Bone],
        index: BoneIndex,
        hooks: &mut H,
    ) -> &Transform {
        self.check_index(index);
        if self.dirty[index] {
            let top = self.topmost_dirty(bones, index);
            self.resolve_subtree(bones, top, hooks);
        }
        &self.absolute[index]
    }

    /// Resolve every dirty bone.
    pub(crate) fn concatenate<H: ConcatenationHooks>(&mut self, bones: &[Bone], hooks: &mut H) {
        let pending = self.dirty_count;
        let mut index = 0;
        while self.dirty_count > 0 && index < self.dirty.len() {
            if self.dirty[index] {
                let top = self.topmost_dirty(bones, index);
                self.resolve_subtree(bones, top, hooks);
            }
            index += 1;
        }
        if pending > 0 {
            tracing::trace!(resolved = pending, scanned = index, "Concatenated pose");
        }
    }

    /// Recompute `top` and its whole subtree, parents before children.
    ///
    /// `top` must have a clean parent (or be the root).
    fn resolve_subtree<H: ConcatenationHooks>(
        &mut self,
        bones: &[Bone],
        top: BoneIndex,
        hooks: &mut H,
    ) {
        let mut stack = BoneStack::new();
        stack.push(top);
        while let Some(bone) = stack.pop() {
            let absolute = match bones[bone].parent {
                Some(parent) => self.absolute[parent] * self.relative[bone],
                None => self.relative[bone],
            };
            hooks.absolute_resolved(bone, &absolute);
            self.palette[bone] = hooks.palette_entry(bone, &absolute);
            self.absolute[bone] = absolute;

            if self.dirty[bone] {
                self.dirty[bone] = false;
                self.dirty_count -= 1;
            }
            stack.extend(bones[bone].children.iter().rev().copied());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::Skeleton;
    use glam::Vec3;
    use std::cell::Cell;

    /// Counts palette computations per bone
    struct CountingHooks {
        computed: Vec<Cell<u32>>,
    }

    impl CountingHooks {
        fn new(bone_count: usize) -> Self {
            Self {
                computed: (0..bone_count).map(|_| Cell::new(0)).collect(),
            }
        }

        /// Per-bone counts since the last call
        fn take(&self) -> Vec<u32> {
            self.computed.iter().map(|c| c.replace(0)).collect()
        }
    }

    impl ConcatenationHooks for CountingHooks {
        fn palette_entry(&self, bone: BoneIndex, absolute: &Transform) -> Mat4 {
            let count = &self.computed[bone];
            count.set(count.get() + 1);
            absolute.to_mat4()
        }
    }

    /// root(0) -> { a(1) -> { a1(3), a2(4) }, b(2) -> { b1(5) } }
    fn branching_skeleton() -> Skeleton {
        let mut skeleton = Skeleton::new();
        let root = skeleton.create_bone().unwrap();
        let a = skeleton.create_child(root).unwrap();
        let b = skeleton.create_child(root).unwrap();
        skeleton.create_child(a).unwrap();
        skeleton.create_child(a).unwrap();
        skeleton.create_child(b).unwrap();
        skeleton
    }

    fn fresh_cache(skeleton: &Skeleton) -> PoseCache {
        let relative = skeleton
            .bones()
            .iter()
            .map(|bone| Transform::from_translation(Vec3::new(bone.index() as f32, 1.0, 0.0)))
            .collect();
        PoseCache::new(relative)
    }

    #[test]
    fn test_full_pass_computes_each_bone_once() {
        let skeleton = branching_skeleton();
        let bones = skeleton.bones();
        let mut cache = fresh_cache(&skeleton);
        let mut hooks = CountingHooks::new(bones.len());

        cache.concatenate(bones, &mut hooks);
        assert_eq!(hooks.take(), vec![1; 6]);
        assert_eq!(cache.dirty_count(), 0);
    }

    #[test]
    fn test_clean_cache_computes_nothing() {
        let skeleton = branching_skeleton();
        let bones = skeleton.bones();
        let mut cache = fresh_cache(&skeleton);
        let mut hooks = CountingHooks::new(bones.len());
        cache.concatenate(bones, &mut hooks);
        hooks.take();

        cache.concatenate(bones, &mut hooks);
        assert_eq!(hooks.take(), vec![0; 6]);

        cache.resolve(bones, 4, &mut hooks);
        cache.resolve(bones, 0, &mut hooks);
        assert_eq!(hooks.take(), vec![0; 6]);
    }

    #[test]
    fn test_write_recomputes_only_its_subtree() {
        let skeleton = branching_skeleton();
        let bones = skeleton.bones();
        let mut cache = fresh_cache(&skeleton);
        let mut hooks = CountingHooks::new(bones.len());
        cache.concatenate(bones, &mut hooks);
        hooks.take();

        cache.set_relative(bones, 1, Transform::from_translation(Vec3::Z));
        cache.concatenate(bones, &mut hooks);
        assert_eq!(hooks.take(), vec![0, 1, 0, 1, 1, 0]);
    }

    #[test]
    fn test_repeated_writes_before_read_compute_once() {
        let skeleton = branching_skeleton();
        let bones = skeleton.bones();
        let mut cache = fresh_cache(&skeleton);
        let mut hooks = CountingHooks::new(bones.len());
        cache.concatenate(bones, &mut hooks);
        hooks.take();

        cache.set_relative(bones, 3, Transform::from_translation(Vec3::X));
        cache.set_relative(bones, 1, Transform::from_translation(Vec3::Y));
        cache.set_relative(bones, 3, Transform::from_translation(Vec3::Z));

        // Lazy read of a leaf resolves from the topmost dirty bone (1) down
        cache.resolve(bones, 3, &mut hooks);
        assert_eq!(hooks.take(), vec![0, 1, 0, 1, 1, 0]);

        cache.concatenate(bones, &mut hooks);
        assert_eq!(hooks.take(), vec![0; 6]);
    }
}
