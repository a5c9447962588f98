//! Math utilities and types
//!
//! Provides the vector and rotation types used by the built-in components,
//! plus the tolerant equality used to dirty-check component properties.

use approx::AbsDiffEq;

pub use nalgebra::{Matrix4, Quaternion, Unit, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Tolerance used when comparing floating point properties
pub const FLOAT_EPSILON: f32 = 1.0e-6;

/// Equality used by property setters to decide whether a value changed
///
/// Floating point types compare within [`FLOAT_EPSILON`].
pub trait PropertyEq {
    /// Returns true if both values are considered identical
    fn property_eq(&self, other: &Self) -> bool;
}

impl PropertyEq for f32 {
    fn property_eq(&self, other: &Self) -> bool {
        self.abs_diff_eq(other, FLOAT_EPSILON)
    }
}

impl PropertyEq for Vec3 {
    fn property_eq(&self, other: &Self) -> bool {
        self.abs_diff_eq(other, FLOAT_EPSILON)
    }
}

impl PropertyEq for Quat {
    fn property_eq(&self, other: &Self) -> bool {
        self.abs_diff_eq(other, FLOAT_EPSILON)
    }
}

impl PropertyEq for bool {
    fn property_eq(&self, other: &Self) -> bool {
        self == other
    }
}

impl PropertyEq for String {
    fn property_eq(&self, other: &Self) -> bool {
        self == other
    }
}

/// Returns true if the scalar is usable as a physical quantity (finite and positive)
pub fn is_positive_finite(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_within_epsilon_are_equal() {
        assert!(1.0_f32.property_eq(&(1.0 + FLOAT_EPSILON * 0.5)));
        assert!(!1.0_f32.property_eq(&1.001));
    }

    #[test]
    fn vectors_compare_component_wise() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        assert!(a.property_eq(&Vec3::new(1.0, 2.0, 3.0)));
        assert!(!a.property_eq(&Vec3::new(1.0, 2.0, 3.5)));
    }

    #[test]
    fn rotations_compare_within_tolerance() {
        let a = Quat::from_axis_angle(&Vec3::y_axis(), 0.5);
        let b = Quat::from_axis_angle(&Vec3::y_axis(), 0.5);
        let c = Quat::from_axis_angle(&Vec3::y_axis(), 0.6);
        assert!(a.property_eq(&b));
        assert!(!a.property_eq(&c));
    }

    #[test]
    fn positive_finite_rejects_degenerate_values() {
        assert!(is_positive_finite(2.5));
        assert!(!is_positive_finite(0.0));
        assert!(!is_positive_finite(-1.0));
        assert!(!is_positive_finite(f32::NAN));
        assert!(!is_positive_finite(f32::INFINITY));
    }
}
