//! Linear and angular motion state

use serde::{Deserialize, Serialize};

use crate::ecs::component::{set_tracked, PropertyChange};
use crate::foundation::math::Vec3;

/// Velocities and momenta of a moving entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    linear_velocity: Vec3,
    linear_momentum: Vec3,
    angular_velocity: Vec3,
    angular_momentum: Vec3,
}

impl Default for Movement {
    fn default() -> Self {
        Self {
            linear_velocity: Vec3::zeros(),
            linear_momentum: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            angular_momentum: Vec3::zeros(),
        }
    }
}

impl Movement {
    /// At rest
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set linear velocity
    pub fn with_linear_velocity(mut self, velocity: Vec3) -> Self {
        self.linear_velocity = velocity;
        self
    }

    /// Builder: set angular velocity
    pub fn with_angular_velocity(mut self, velocity: Vec3) -> Self {
        self.angular_velocity = velocity;
        self
    }

    /// Linear velocity in units per second
    pub fn linear_velocity(&self) -> Vec3 {
        self.linear_velocity
    }

    /// Linear momentum
    pub fn linear_momentum(&self) -> Vec3 {
        self.linear_momentum
    }

    /// Angular velocity in radians per second
    pub fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }

    /// Angular momentum
    pub fn angular_momentum(&self) -> Vec3 {
        self.angular_momentum
    }

    /// Set linear velocity ("LinearVelocity")
    pub fn set_linear_velocity(&mut self, value: Vec3) -> Option<PropertyChange> {
        set_tracked(&mut self.linear_velocity, value, "LinearVelocity")
    }

    /// Set linear momentum ("LinearMomentum")
    pub fn set_linear_momentum(&mut self, value: Vec3) -> Option<PropertyChange> {
        set_tracked(&mut self.linear_momentum, value, "LinearMomentum")
    }

    /// Set angular velocity ("AngularVelocity")
    pub fn set_angular_velocity(&mut self, value: Vec3) -> Option<PropertyChange> {
        set_tracked(&mut self.angular_velocity, value, "AngularVelocity")
    }

    /// Set angular momentum ("AngularMomentum")
    pub fn set_angular_momentum(&mut self, value: Vec3) -> Option<PropertyChange> {
        set_tracked(&mut self.angular_momentum, value, "AngularMomentum")
    }

    /// True when both velocities are zero
    pub fn is_at_rest(&self) -> bool {
        self.linear_velocity == Vec3::zeros() && self.angular_velocity == Vec3::zeros()
    }
}
