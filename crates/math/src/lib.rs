//! Transform math: 3-vectors and column-major 4x4 homogeneous matrices.
//!
//! Matrix operations write into a caller-owned [`Mat4`] so per-frame transforms
//! can be rebuilt without allocating.
//!
//! # Invariants
//! - A default-constructed matrix is the identity.
//! - Composition reads the full prior state of the target before writing.
//! - Degenerate inputs (zero fov, `near == far`) follow IEEE-754 rules; nothing is clamped.

mod mat4;
mod vec3;

pub use mat4::Mat4;
pub use vec3::Vec3;

pub fn crate_info() -> &'static str {
    "framekit-math v0.1.0"
}
