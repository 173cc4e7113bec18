//! Nether-Rig: skeleton hierarchy and lazy pose cache for skeletal animation
//!
//! This crate keeps, for every animated instance of a rig, a set of bone
//! transforms that stays consistent with the shared bone hierarchy while
//! recomputing as little as possible.
//!
//! # Overview
//!
//! - [`Skeleton`] - bone arena with dense indices, name lookup and the
//!   canonical [`BindPose`]
//! - [`Pose`] - per-instance relative transforms with lazily derived absolute
//!   transforms and skinning matrices
//! - [`BindPose`] - the rest pose; provides the inverse bind matrices every
//!   pose multiplies into its skinning matrices
//! - [`RigDesc`] - serializable rig description for asset pipelines
//! - [`BoneMatrix3x4`] - 48-byte GPU upload format for palette entries
//!
//! # Data flow
//!
//! An animation evaluator writes relative transforms into a [`Pose`] each
//! step. A renderer then reads the palette, which concatenates whatever went
//! stale since the last read.
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use glam::Vec3;
//! use nether_rig::{Pose, Skeleton, Transform};
//!
//! let mut skeleton = Skeleton::new();
//! let root = skeleton.create_bone().unwrap();
//! let arm = skeleton.create_child(root).unwrap();
//! skeleton.rename_bone(arm, "arm").unwrap();
//! skeleton
//!     .set_rest_transform(arm, Transform::from_translation(Vec3::X))
//!     .unwrap();
//! skeleton.calculate_bind_pose();
//!
//! let skeleton = Arc::new(skeleton);
//! let mut pose = Pose::new(Arc::clone(&skeleton)).unwrap();
//! pose.set_relative_transform(arm, Transform::from_translation(Vec3::new(2.0, 0.0, 0.0)));
//!
//! let palette = pose.skinning_matrices();
//! assert_eq!(palette.len(), 2);
//! ```
//!
//! # Threading
//!
//! A pose is mutated and queried from one thread at a time. A skeleton is
//! read-only once shared through an `Arc`, so many poses on different threads
//! can reference the same rig.

mod bone;
mod desc;
mod error;
mod palette;
mod pose;
mod skeleton;
mod transform;

pub use bone::Bone;
pub use desc::{BoneDesc, RigDesc};
pub use error::RigError;
pub use palette::{BONE_MATRIX_SIZE, BoneMatrix3x4};
pub use pose::{BindPose, Pose};
pub use skeleton::{Descendants, Skeleton};
pub use transform::Transform;

/// Dense bone index within a skeleton, in `0..bone_count`
pub type BoneIndex = usize;

/// Maximum bones per skeleton (matches the console skinning palette size)
pub const MAX_BONES: usize = 256;
