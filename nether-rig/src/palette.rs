//! GPU-ready skinning palette entries
//!
//! The pose cache works with full `Mat4` skinning matrices. Renderers that
//! upload 3x4 affine bone matrices convert them with [`BoneMatrix3x4::from_mat4`]
//! and cast the resulting slice with `bytemuck::cast_slice`.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};
use serde::{Deserialize, Serialize};

/// 3x4 affine bone matrix (row-major storage, POD type)
///
/// Stores 3 rows of a 4x4 affine matrix. The implicit 4th row is [0, 0, 0, 1].
///
/// Memory layout (48 bytes):
/// - row0: rotation/scale row 0 + translation X
/// - row1: rotation/scale row 1 + translation Y
/// - row2: rotation/scale row 2 + translation Z
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, Pod, Zeroable)]
#[repr(C)]
pub struct BoneMatrix3x4 {
    /// First row: [m00, m01, m02, tx]
    pub row0: [f32; 4],
    /// Second row: [m10, m11, m12, ty]
    pub row1: [f32; 4],
    /// Third row: [m20, m21, m22, tz]
    pub row2: [f32; 4],
}

/// Size of one palette entry in bytes (12 floats × 4 bytes)
pub const BONE_MATRIX_SIZE: usize = 48;

impl BoneMatrix3x4 {
    /// Identity bone matrix (no transformation)
    pub const IDENTITY: Self = Self {
        row0: [1.0, 0.0, 0.0, 0.0],
        row1: [0.0, 1.0, 0.0, 0.0],
        row2: [0.0, 0.0, 1.0, 0.0],
    };

    pub const fn from_rows(row0: [f32; 4], row1: [f32; 4], row2: [f32; 4]) -> Self {
        Self { row0, row1, row2 }
    }

    /// Drop the last row of an affine matrix.
    ///
    /// The bottom row of `matrix` is assumed to be [0, 0, 0, 1].
    pub fn from_mat4(matrix: &Mat4) -> Self {
        Self {
            row0: matrix.row(0).to_array(),
            row1: matrix.row(1).to_array(),
            row2: matrix.row(2).to_array(),
        }
    }

    pub fn to_mat4(&self) -> Mat4 {
        let [r0, r1, r2] = [self.row0, self.row1, self.row2];
        Mat4::from_cols(
            Vec4::new(r0[0], r1[0], r2[0], 0.0),
            Vec4::new(r0[1], r1[1], r2[1], 0.0),
            Vec4::new(r0[2], r1[2], r2[2], 0.0),
            Vec4::new(r0[3], r1[3], r2[3], 1.0),
        )
    }

    /// Flat f32 array for GPU upload (row-major)
    pub fn to_array(&self) -> [f32; 12] {
        bytemuck::cast(*self)
    }

    /// Create from flat f32 array (row-major)
    pub fn from_array(arr: [f32; 12]) -> Self {
        bytemuck::cast(arr)
    }
}

impl From<Mat4> for BoneMatrix3x4 {
    fn from(matrix: Mat4) -> Self {
        Self::from_mat4(&matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    #[test]
    fn test_identity_from_mat4() {
        assert_eq!(BoneMatrix3x4::from_mat4(&Mat4::IDENTITY), BoneMatrix3x4::IDENTITY);
    }

    #[test]
    fn test_translation_lands_in_last_column() {
        let m = BoneMatrix3x4::from_mat4(&Mat4::from_translation(Vec3::new(4.0, 5.0, 6.0)));
        assert_eq!(m.row0, [1.0, 0.0, 0.0, 4.0]);
        assert_eq!(m.row1, [0.0, 1.0, 0.0, 5.0]);
        assert_eq!(m.row2, [0.0, 0.0, 1.0, 6.0]);
    }

    #[test]
    fn test_to_mat4_restores_affine_matrix() {
        let original = Mat4::from_scale_rotation_translation(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_rotation_y(0.9),
            Vec3::new(-1.0, 0.5, 7.0),
        );
        let restored = BoneMatrix3x4::from_mat4(&original).to_mat4();
        assert!(restored.abs_diff_eq(original, 1e-6));
    }

    #[test]
    fn test_from_rows_matches_mat4_conversion() {
        let m = BoneMatrix3x4::from_rows(
            [1.0, 0.0, 0.0, 4.0],
            [0.0, 1.0, 0.0, 5.0],
            [0.0, 0.0, 1.0, 6.0],
        );
        let converted: BoneMatrix3x4 = Mat4::from_translation(Vec3::new(4.0, 5.0, 6.0)).into();
        assert_eq!(m, converted);
    }

    #[test]
    fn test_array_layout_is_row_major() {
        let arr = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0];
        let m = BoneMatrix3x4::from_array(arr);
        assert_eq!(m.row0, [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(m.row2, [9.0, 10.0, 11.0, 12.0]);
        assert_eq!(m.to_array(), arr);
    }

    #[test]
    fn test_palette_byte_size() {
        let palette = [BoneMatrix3x4::IDENTITY; 3];
        let bytes: &[u8] = bytemuck::cast_slice(&palette);
        assert_eq!(bytes.len(), 3 * BONE_MATRIX_SIZE);
    }
}
