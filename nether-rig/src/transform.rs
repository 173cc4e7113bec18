//! Bone transforms (translation, rotation, non-uniform scale)
//!
//! A [`Transform`] applies scale first, then rotation, then translation.
//! Composition `parent * child` yields the child's transform expressed in the
//! parent's space, which is how absolute transforms are built up the bone
//! chain.

use std::ops::Mul;

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Scale/rotate/translate transform of a single bone.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// No rotation, no translation, unit scale
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub const fn from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    pub const fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub const fn from_rotation(rotation: Quat) -> Self {
        Self {
            rotation,
            ..Self::IDENTITY
        }
    }

    pub const fn from_scale(scale: Vec3) -> Self {
        Self {
            scale,
            ..Self::IDENTITY
        }
    }

    /// Build from the decoded keyframe layout: quaternion `[x, y, z, w]`,
    /// position and scale.
    pub fn from_arrays(rotation: [f32; 4], position: [f32; 3], scale: [f32; 3]) -> Self {
        Self {
            translation: Vec3::from_array(position),
            rotation: Quat::from_array(rotation),
            scale: Vec3::from_array(scale),
        }
    }

    /// Transform a point from this transform's local space into its parent space.
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.translation + self.rotation * (self.scale * point)
    }

    /// Inverse transform.
    ///
    /// Exact for uniform scale. With non-uniform scale and rotation the true
    /// inverse contains shear, which a TRS transform cannot hold; the result
    /// is then the usual component-wise approximation.
    pub fn inverse(&self) -> Self {
        let scale = self.scale.recip();
        let rotation = self.rotation.inverse();
        let translation = -(scale * (rotation * self.translation));
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Affine 4x4 matrix of this transform.
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Tolerance comparison. `q` and `-q` are treated as the same rotation.
    pub fn abs_diff_eq(&self, other: &Self, max_abs_diff: f32) -> bool {
        let rotation_eq = self.rotation.abs_diff_eq(other.rotation, max_abs_diff)
            || self.rotation.abs_diff_eq(-other.rotation, max_abs_diff);
        rotation_eq
            && self.translation.abs_diff_eq(other.translation, max_abs_diff)
            && self.scale.abs_diff_eq(other.scale, max_abs_diff)
    }
}

impl Mul for Transform {
    type Output = Transform;

    fn mul(self, child: Transform) -> Transform {
        Transform {
            translation: self.transform_point(child.translation),
            rotation: self.rotation * child.rotation,
            scale: self.scale * child.scale,
        }
    }
}

impl Mul<&Transform> for &Transform {
    type Output = Transform;

    fn mul(self, child: &Transform) -> Transform {
        *self * *child
    }
}
