use std::ops::Mul;

use crate::Vec3;

/// A 4x4 homogeneous transform stored as sixteen components in column-major order.
///
/// Component `m[col * 4 + row]` holds row `row` of column `col`, so the translation
/// of an affine transform sits in components 12, 13 and 14. The `set_*` methods
/// overwrite all sixteen components of `self`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    m: [f64; 16],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    #[rustfmt::skip]
    pub const IDENTITY: Self = Self {
        m: [
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    pub const fn from_cols_array(m: [f64; 16]) -> Self {
        Self { m }
    }

    pub fn as_array(&self) -> &[f64; 16] {
        &self.m
    }

    /// Single-precision copy in the same column-major order, for GPU upload.
    pub fn to_cols_array_f32(&self) -> [f32; 16] {
        self.m.map(|v| v as f32)
    }

    /// Build a pure translation matrix.
    pub fn translation(v: Vec3) -> Self {
        let mut out = Self::IDENTITY;
        out.set_translation(v);
        out
    }

    /// Build a rotation matrix. See [`Mat4::set_rotation`].
    pub fn rotation(angle: f64, axis: Vec3) -> Self {
        let mut out = Self::IDENTITY;
        out.set_rotation(angle, axis);
        out
    }

    /// Build a perspective projection. See [`Mat4::set_perspective`].
    pub fn perspective(fov_y: f64, aspect: f64, near: f64, far: f64) -> Self {
        let mut out = Self::IDENTITY;
        out.set_perspective(fov_y, aspect, near, far);
        out
    }

    pub fn set_identity(&mut self) {
        *self = Self::IDENTITY;
    }

    #[rustfmt::skip]
    pub fn set_translation(&mut self, v: Vec3) {
        self.m = [
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            v.x, v.y, v.z, 1.0,
        ];
    }

    /// Rotation of `angle` radians about `axis` (Rodrigues' formula).
    ///
    /// The axis is normalized. A zero-length axis is not special-cased: it is
    /// treated as `(0, 0, 0)` and the formula is evaluated anyway, which leaves
    /// `cos(angle)` on the first three diagonal entries. Callers must not rely on
    /// that producing the identity.
    #[rustfmt::skip]
    pub fn set_rotation(&mut self, angle: f64, axis: Vec3) {
        let length = axis.length();
        let (x, y, z) = if length <= 0.0 {
            (0.0, 0.0, 0.0)
        } else {
            (axis.x / length, axis.y / length, axis.z / length)
        };

        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;

        self.m = [
            x * x * t + c,     y * x * t + z * s, z * x * t - y * s, 0.0,
            x * y * t - z * s, y * y * t + c,     z * y * t + x * s, 0.0,
            x * z * t + y * s, y * z * t - x * s, z * z * t + c,     0.0,
            0.0,               0.0,               0.0,               1.0,
        ];
    }

    /// Right-handed perspective projection with OpenGL clip depth.
    ///
    /// Points on the near plane (`z = -near`) land at clip depth -1 and points on
    /// the far plane at +1 after the perspective divide.
    #[rustfmt::skip]
    pub fn set_perspective(&mut self, fov_y: f64, aspect: f64, near: f64, far: f64) {
        let f = 1.0 / (fov_y / 2.0).tan();
        let nf = 1.0 / (near - far);

        self.m = [
            f / aspect, 0.0, 0.0,                   0.0,
            0.0,        f,   0.0,                   0.0,
            0.0,        0.0, (far + near) * nf,     -1.0,
            0.0,        0.0, 2.0 * far * near * nf, 0.0,
        ];
    }

    /// Left-multiply in place: `self = m * self`.
    pub fn left_multiply(&mut self, m: &Mat4) {
        let t = self.m;
        let a = &m.m;
        for col in 0..4 {
            let c = col * 4;
            for row in 0..4 {
                self.m[c + row] = a[row] * t[c]
                    + a[4 + row] * t[c + 1]
                    + a[8 + row] * t[c + 2]
                    + a[12 + row] * t[c + 3];
            }
        }
    }

    /// Apply the matrix to a homogeneous column vector.
    pub fn transform_point(&self, p: [f64; 4]) -> [f64; 4] {
        let m = &self.m;
        std::array::from_fn(|row| {
            m[row] * p[0] + m[4 + row] * p[1] + m[8 + row] * p[2] + m[12 + row] * p[3]
        })
    }
}

impl Mul for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Mat4 {
        let mut out = rhs;
        out.left_multiply(&self);
        out
    }
}

impl From<Mat4> for glam::DMat4 {
    fn from(m: Mat4) -> Self {
        glam::DMat4::from_cols_array(&m.m)
    }
}

impl From<glam::DMat4> for Mat4 {
    fn from(m: glam::DMat4) -> Self {
        Self::from_cols_array(m.to_cols_array())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{DMat4, DVec3};
    use std::f64::consts::PI;

    const EPS: f64 = 1e-9;

    fn assert_close(a: &Mat4, b: &Mat4) {
        for (i, (x, y)) in a.as_array().iter().zip(b.as_array()).enumerate() {
            assert!((x - y).abs() < EPS, "component {i}: {x} != {y}");
        }
    }

    fn sample() -> Mat4 {
        Mat4::from_cols_array(std::array::from_fn(|i| (i as f64) * 0.5 - 3.0))
    }

    #[test]
    fn default_is_identity() {
        assert_eq!(Mat4::default(), Mat4::IDENTITY);
    }

    #[test]
    fn identity_is_left_and_right_neutral() {
        let m = sample();

        let mut left = m;
        left.left_multiply(&Mat4::IDENTITY);
        assert_eq!(left, m);

        let mut right = Mat4::IDENTITY;
        right.left_multiply(&m);
        assert_eq!(right, m);
    }

    #[test]
    fn set_identity_resets() {
        let mut m = sample();
        m.set_identity();
        assert_eq!(m, Mat4::IDENTITY);
    }

    #[test]
    fn translation_moves_points() {
        let t = Mat4::translation(Vec3::new(1.0, -2.0, 3.5));
        let p = t.transform_point([1.0, 1.0, 1.0, 1.0]);
        assert_eq!(p, [2.0, -1.0, 4.5, 1.0]);
        assert_eq!(&t.as_array()[12..], &[1.0, -2.0, 3.5, 1.0]);
    }

    #[test]
    fn zero_angle_rotation_is_identity() {
        for axis in [
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, -4.0),
            Vec3::new(3.0, 5.0, 7.0),
        ] {
            assert_close(&Mat4::rotation(0.0, axis), &Mat4::IDENTITY);
        }
    }

    #[test]
    fn rotation_matches_glam() {
        let axis = Vec3::new(3.0, 5.0, 7.0);
        let angle = 1.234;
        let expected = DMat4::from_axis_angle(DVec3::from(axis).normalize(), angle);
        assert_close(&Mat4::rotation(angle, axis), &expected.into());
    }

    #[test]
    fn quarter_turn_about_z() {
        let r = Mat4::rotation(PI / 2.0, Vec3::new(0.0, 0.0, 2.0));
        let p = r.transform_point([1.0, 0.0, 0.0, 1.0]);
        assert!((p[0]).abs() < EPS);
        assert!((p[1] - 1.0).abs() < EPS);
    }

    // Boundary case: a zero axis is not normalized and does not yield identity.
    #[test]
    fn zero_axis_rotation_is_degenerate() {
        let angle: f64 = 0.75;
        let c = angle.cos();
        let r = Mat4::rotation(angle, Vec3::ZERO);
        #[rustfmt::skip]
        let expected = Mat4::from_cols_array([
            c,   0.0, 0.0, 0.0,
            0.0, c,   0.0, 0.0,
            0.0, 0.0, c,   0.0,
            0.0, 0.0, 0.0, 1.0,
        ]);
        assert_close(&r, &expected);
        assert_ne!(r, Mat4::IDENTITY);
    }

    #[test]
    fn perspective_maps_near_and_far_planes() {
        let (near, far) = (0.1, 100.0);
        let p = Mat4::perspective(60f64.to_radians(), 1.0, near, far);

        let n = p.transform_point([0.0, 0.0, -near, 1.0]);
        assert!((n[2] / n[3] + 1.0).abs() < EPS);

        let f = p.transform_point([0.0, 0.0, -far, 1.0]);
        assert!((f[2] / f[3] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn perspective_matches_glam_gl_convention() {
        let p = Mat4::perspective(1.1, 16.0 / 9.0, 0.0625, 16.0);
        let expected = DMat4::perspective_rh_gl(1.1, 16.0 / 9.0, 0.0625, 16.0);
        assert_close(&p, &expected.into());
        assert_eq!(p.as_array()[11], -1.0);
        assert_eq!(p.as_array()[15], 0.0);
    }

    #[test]
    fn perspective_degenerate_inputs_propagate() {
        let p = Mat4::perspective(0.0, 1.0, 1.0, 1.0);
        assert!(p.as_array()[0].is_infinite());
        assert!(p.as_array()[10].is_nan() || p.as_array()[10].is_infinite());
    }

    #[test]
    fn left_multiply_matches_glam_product() {
        let a = sample();
        let b = Mat4::rotation(0.4, Vec3::new(1.0, 2.0, 3.0));

        let mut target = a;
        target.left_multiply(&b);

        let expected = DMat4::from(b) * DMat4::from(a);
        assert_close(&target, &expected.into());
        assert_close(&(b * a), &target);
    }

    #[test]
    fn left_multiply_by_self_reads_prior_state() {
        let mut m = sample();
        let copy = m;
        m.left_multiply(&copy);
        let expected = DMat4::from(copy) * DMat4::from(copy);
        assert_close(&m, &expected.into());
    }

    #[test]
    fn f32_upload_copy_keeps_order() {
        let t = Mat4::translation(Vec3::new(4.0, 5.0, 6.0));
        let cols = t.to_cols_array_f32();
        assert_eq!(cols[12], 4.0);
        assert_eq!(cols[14], 6.0);
        assert_eq!(cols[15], 1.0);
    }
}
