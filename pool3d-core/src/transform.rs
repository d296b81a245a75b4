/// 4x4 / 3x3 transform construction and composition
///
/// All matrices are column-major with the column-vector convention (`v' = M * v`),
/// so `as_slice()` on any of them is already in uniform upload order.
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};

pub type Vec3 = Vector3<f32>;
pub type Mat4 = Matrix4<f32>;
pub type Mat3 = Matrix3<f32>;

/// Right-handed perspective projection mapping view depth `[-near, -far]` to NDC `[-1, 1]`.
///
/// Callers guarantee `aspect > 0` and `near < far`; otherwise the result is degenerate
/// (non-finite entries) rather than a panic.
#[rustfmt::skip]
pub fn perspective(fovy: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let f = 1.0 / (fovy / 2.0).tan();
    let nf = 1.0 / (near - far);
    Matrix4::new(
        f / aspect, 0.0, 0.0, 0.0,
        0.0, f, 0.0, 0.0,
        0.0, 0.0, (far + near) * nf, 2.0 * far * near * nf,
        0.0, 0.0, -1.0, 0.0,
    )
}

/// View matrix looking from `eye` towards `center`.
///
/// Degenerates when `up` is parallel to the view direction.
pub fn look_at(eye: &Point3<f32>, center: &Point3<f32>, up: &Vec3) -> Mat4 {
    Matrix4::look_at_rh(eye, center, up)
}

/// `a * b`: applies `b` first, then `a` (world = parent * child).
pub fn multiply(a: &Mat4, b: &Mat4) -> Mat4 {
    a * b
}

/// Right-multiplies `m` by a translation.
pub fn translate(m: &Mat4, offset: &Vec3) -> Mat4 {
    m * Matrix4::new_translation(offset)
}

/// Right-multiplies `m` by a (possibly non-uniform) scale.
pub fn scale(m: &Mat4, factors: &Vec3) -> Mat4 {
    m * Matrix4::new_nonuniform_scaling(factors)
}

/// Right-multiplies `m` by a rotation of `angle` radians about +Y.
pub fn rotate_y(m: &Mat4, angle: f32) -> Mat4 {
    m * Matrix4::from_axis_angle(&Vector3::y_axis(), angle)
}

/// Inverse-transpose of the upper 3x3, for transforming normals under non-uniform scale.
///
/// A singular model (e.g. scaled to zero) yields the identity.
pub fn normal_matrix(model: &Mat4) -> Mat3 {
    let upper: Mat3 = model.fixed_view::<3, 3>(0, 0).clone_owned();
    upper
        .try_inverse()
        .map(|inverse| inverse.transpose())
        .unwrap_or_else(Mat3::identity)
}

pub fn mat4_to_array(m: &Mat4) -> [f32; 16] {
    let mut out = [0.0; 16];
    out.copy_from_slice(m.as_slice());
    out
}

pub fn mat3_to_array(m: &Mat3) -> [f32; 9] {
    let mut out = [0.0; 9];
    out.copy_from_slice(m.as_slice());
    out
}
