//! Math type aliases and helper functions.
//!
//! Thin f32 aliases over `nalgebra` types, plus the handful of
//! constructors the pipeline needs.

pub use nalgebra;

/// 2D vector (f32).
pub type Vec2 = nalgebra::Vector2<f32>;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// 4D vector (f32).
pub type Vec4 = nalgebra::Vector4<f32>;

/// 4x4 matrix (f32), column-major storage.
pub type Mat4 = nalgebra::Matrix4<f32>;

/// Quaternion (f32). Stored as `[x, y, z, w]` in memory.
/// Use [`quat_from_xyzw`] or `Quaternion::new(w, x, y, z)` to construct.
pub type Quat = nalgebra::Quaternion<f32>;

/// Build a 4x4 TRS matrix from scale, rotation (quaternion), and translation.
pub fn mat4_from_scale_rotation_translation(
    scale: Vec3,
    rotation: Quat,
    translation: Vec3,
) -> Mat4 {
    let r = nalgebra::UnitQuaternion::new_unchecked(rotation);
    let rm = r.to_rotation_matrix();
    let rm = rm.matrix();
    #[rustfmt::skip]
    let result = Mat4::new(
        rm[(0, 0)] * scale.x, rm[(0, 1)] * scale.y, rm[(0, 2)] * scale.z, translation.x,
        rm[(1, 0)] * scale.x, rm[(1, 1)] * scale.y, rm[(1, 2)] * scale.z, translation.y,
        rm[(2, 0)] * scale.x, rm[(2, 1)] * scale.y, rm[(2, 2)] * scale.z, translation.z,
        0.0,                  0.0,                  0.0,                  1.0,
    );
    result
}

/// Build a translation-only 4x4 matrix.
pub fn mat4_from_translation(t: Vec3) -> Mat4 {
    Mat4::new_translation(&t)
}

/// Create a quaternion from x, y, z, w components.
pub fn quat_from_xyzw(x: f32, y: f32, z: f32, w: f32) -> Quat {
    nalgebra::Quaternion::new(w, x, y, z)
}

/// Create a quaternion from a `[x, y, z, w]` array.
pub fn quat_from_array(a: [f32; 4]) -> Quat {
    nalgebra::Quaternion::new(a[3], a[0], a[1], a[2])
}

/// Build a `Mat4` from 16 floats in column-major order.
pub fn mat4_from_column_slice(values: &[f32; 16]) -> Mat4 {
    Mat4::from_column_slice(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trs_translation_only() {
        let m = mat4_from_scale_rotation_translation(
            Vec3::new(1.0, 1.0, 1.0),
            quat_from_xyzw(0.0, 0.0, 0.0, 1.0),
            Vec3::new(1.0, 2.0, 3.0),
        );
        assert_eq!(m, mat4_from_translation(Vec3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_quat_array_round_trip() {
        let q = quat_from_array([0.1, 0.2, 0.3, 0.9]);
        assert_eq!(q.coords.x, 0.1);
        assert_eq!(q.coords.w, 0.9);
    }

    #[test]
    fn test_mat4_column_slice() {
        let mut values = [0.0f32; 16];
        values[0] = 1.0; // m11
        values[13] = 5.0; // column 3, row 1 -> translation y
        let m = mat4_from_column_slice(&values);
        assert_eq!(m[(0, 0)], 1.0);
        assert_eq!(m[(1, 3)], 5.0);
    }
}
