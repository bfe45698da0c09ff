/// Planar geometry helpers for keypoint analysis
///
/// Every function returns `None` instead of a number when its inputs are not
/// finite or the geometry is degenerate.

use crate::models::keypoint::Keypoint;

/// Euclidean distance between two keypoints
pub fn distance(a: &Keypoint, b: &Keypoint) -> Option<f32> {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let d = (dx * dx + dy * dy).sqrt();
    d.is_finite().then_some(d)
}

/// Angle at `vertex` formed by `a`-`vertex`-`c`, in degrees
///
/// The cosine is clamped to [-1, 1] before `acos` so rounding never yields NaN.
pub fn angle_at(a: &Keypoint, vertex: &Keypoint, c: &Keypoint) -> Option<f32> {
    let ba = (a.x - vertex.x, a.y - vertex.y);
    let bc = (c.x - vertex.x, c.y - vertex.y);

    let dot = ba.0 * bc.0 + ba.1 * bc.1;
    let mag_ba = (ba.0 * ba.0 + ba.1 * ba.1).sqrt();
    let mag_bc = (bc.0 * bc.0 + bc.1 * bc.1).sqrt();

    if !(mag_ba.is_finite() && mag_bc.is_finite()) || mag_ba == 0.0 || mag_bc == 0.0 {
        return None;
    }

    let cos_angle = (dot / (mag_ba * mag_bc)).clamp(-1.0, 1.0);
    let degrees = cos_angle.acos().to_degrees();
    degrees.is_finite().then_some(degrees)
}

/// Mean of two values, `None` if the result is not finite
pub fn midpoint(a: f32, b: f32) -> Option<f32> {
    let m = (a + b) / 2.0;
    m.is_finite().then_some(m)
}
