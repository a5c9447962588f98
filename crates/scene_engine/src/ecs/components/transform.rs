//! Spatial transform component
//!
//! Right-handed, Y-up. The local forward direction is -Z.

use serde::{Deserialize, Serialize};

use crate::ecs::component::{set_tracked, PropertyChange};
use crate::foundation::math::{Mat4, Quat, Vec3, FLOAT_EPSILON};

/// Position, scale and orientation of an entity in world space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    position: Vec3,
    scale: Vec3,
    orientation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            orientation: Quat::identity(),
        }
    }
}

impl Transform {
    /// Identity transform
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Builder: set scale
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Builder: set uniform scale
    pub fn with_uniform_scale(self, scale: f32) -> Self {
        self.with_scale(Vec3::new(scale, scale, scale))
    }

    /// Builder: set orientation
    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.orientation = orientation;
        self
    }

    /// World space position
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Scale factors
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// World space orientation
    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    /// Set the position ("Position")
    pub fn set_position(&mut self, position: Vec3) -> Option<PropertyChange> {
        set_tracked(&mut self.position, position, "Position")
    }

    /// Set the scale ("Scale")
    pub fn set_scale(&mut self, scale: Vec3) -> Option<PropertyChange> {
        set_tracked(&mut self.scale, scale, "Scale")
    }

    /// Set the orientation ("Orientation")
    pub fn set_orientation(&mut self, orientation: Quat) -> Option<PropertyChange> {
        set_tracked(&mut self.orientation, orientation, "Orientation")
    }

    /// Move by `delta` ("Position")
    pub fn translate(&mut self, delta: Vec3) -> Option<PropertyChange> {
        self.set_position(self.position + delta)
    }

    /// Scale, then rotate, then translate
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.orientation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Local -Z in world space
    pub fn forward(&self) -> Vec3 {
        self.orientation * -Vec3::z()
    }

    /// Local +Z in world space
    pub fn backward(&self) -> Vec3 {
        -self.forward()
    }

    /// Local +Y in world space
    pub fn up(&self) -> Vec3 {
        self.orientation * Vec3::y()
    }

    /// Local +X in world space
    pub fn right(&self) -> Vec3 {
        self.orientation * Vec3::x()
    }

    /// Rotate around a world space axis ("Orientation")
    pub fn rotate_global(&mut self, axis: Vec3, degrees: f32) -> Option<PropertyChange> {
        if axis.norm() < FLOAT_EPSILON {
            return None;
        }
        let rotation = Quat::from_axis_angle(&nalgebra::Unit::new_normalize(axis), degrees.to_radians());
        self.set_orientation(rotation * self.orientation)
    }

    /// Rotate around an axis given in local space ("Orientation")
    pub fn rotate_local(&mut self, axis: Vec3, degrees: f32) -> Option<PropertyChange> {
        self.rotate_global(self.orientation * axis, degrees)
    }

    /// Turn so the forward direction points at `point` ("Orientation")
    ///
    /// Degenerate requests (target at the position, or straight along `up`)
    /// leave the orientation untouched.
    pub fn look_at(&mut self, point: Vec3, up: Vec3) -> Option<PropertyChange> {
        let direction = point - self.position;
        if direction.norm() < FLOAT_EPSILON || direction.cross(&up).norm() < FLOAT_EPSILON {
            return None;
        }
        self.set_orientation(Quat::face_towards(&-direction, &up))
    }

    /// Reset to the identity orientation ("Orientation")
    pub fn reset_orientation(&mut self) -> Option<PropertyChange> {
        self.set_orientation(Quat::identity())
    }
}
