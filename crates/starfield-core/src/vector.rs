//! Minimal 3-component vector math.
//!
//! Every physics calculation goes through these helpers. The z component is
//! carried along for API symmetry but is always 0 in this 2D game.

/// 3-component vector. Serializes as `[x, y, z]`.
pub type Vec3 = glam::DVec3;

pub fn add(a: Vec3, b: Vec3) -> Vec3 {
    a + b
}

pub fn subtract(a: Vec3, b: Vec3) -> Vec3 {
    a - b
}

pub fn scale(v: Vec3, factor: f64) -> Vec3 {
    v * factor
}

pub fn dot(a: Vec3, b: Vec3) -> f64 {
    a.dot(b)
}

pub fn length(v: Vec3) -> f64 {
    v.length()
}

/// Unit vector in the direction of `v`. The zero vector is returned unchanged.
pub fn normalize(v: Vec3) -> Vec3 {
    let len = v.length();
    if len > 0.0 && len.is_finite() {
        v / len
    } else {
        v
    }
}

pub fn distance(a: Vec3, b: Vec3) -> f64 {
    a.distance(b)
}

/// Perpendicular of `v` in the XY plane (rotated +90°).
pub fn perpendicular(v: Vec3) -> Vec3 {
    Vec3::new(-v.y, v.x, 0.0)
}

/// Facing direction for a heading angle: angle 0 points along +Y.
pub fn facing(angle: f64) -> Vec3 {
    Vec3::new(-angle.sin(), angle.cos(), 0.0)
}
