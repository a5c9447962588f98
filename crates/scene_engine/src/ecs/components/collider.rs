//! Physical body description consumed by the physics domain system

use serde::{Deserialize, Serialize};

use crate::ecs::component::{set_tracked, PropertyChange};
use crate::foundation::math::{is_positive_finite, PropertyEq};

/// Collision and rigid body settings
///
/// A collider is either kinematic (moved by game code) or dynamic (moved by
/// the simulation); the two flags are always opposite. A dynamic body needs a
/// positive finite mass, so assigning anything else demotes it to kinematic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    mass: f32,
    is_kinematic: bool,
    is_dynamic: bool,
    is_penetratable: bool,
    is_affected_by_gravity: bool,
    is_input_controlled: bool,
    be_precise: bool,
}

impl Default for Collider {
    fn default() -> Self {
        Self {
            mass: 1.0,
            is_kinematic: true,
            is_dynamic: false,
            is_penetratable: false,
            is_affected_by_gravity: true,
            is_input_controlled: false,
            be_precise: false,
        }
    }
}

impl Collider {
    /// Kinematic collider with unit mass
    pub fn new() -> Self {
        Self::default()
    }

    /// Dynamic collider with the given mass
    ///
    /// Falls back to kinematic if `mass` is not positive and finite.
    pub fn dynamic(mass: f32) -> Self {
        let usable = is_positive_finite(mass);
        Self {
            mass,
            is_kinematic: !usable,
            is_dynamic: usable,
            ..Self::default()
        }
    }

    /// Mass
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Moved by game code
    pub fn is_kinematic(&self) -> bool {
        self.is_kinematic
    }

    /// Moved by the simulation
    pub fn is_dynamic(&self) -> bool {
        self.is_dynamic
    }

    /// Other bodies pass through it
    pub fn is_penetratable(&self) -> bool {
        self.is_penetratable
    }

    /// Gravity applies
    pub fn is_affected_by_gravity(&self) -> bool {
        self.is_affected_by_gravity
    }

    /// Driven by player input
    pub fn is_input_controlled(&self) -> bool {
        self.is_input_controlled
    }

    /// Use continuous collision detection
    pub fn be_precise(&self) -> bool {
        self.be_precise
    }

    /// Set mass ("Mass"); an unusable mass on a dynamic body makes it kinematic
    pub fn set_mass(&mut self, mass: f32) -> Option<PropertyChange> {
        if self.mass.property_eq(&mass) {
            return None;
        }
        let old = std::mem::replace(&mut self.mass, mass);
        if self.is_dynamic && !is_positive_finite(mass) {
            self.is_dynamic = false;
            self.is_kinematic = true;
        }
        Some(PropertyChange::with_old("Mass", old))
    }

    /// Set kinematic ("IsKinematic"), clearing or setting dynamic accordingly
    pub fn set_kinematic(&mut self, value: bool) -> Option<PropertyChange> {
        let change = set_tracked(&mut self.is_kinematic, value, "IsKinematic")?;
        self.is_dynamic = !value;
        Some(change)
    }

    /// Set dynamic ("IsDynamic"), clearing or setting kinematic accordingly
    pub fn set_dynamic(&mut self, value: bool) -> Option<PropertyChange> {
        let change = set_tracked(&mut self.is_dynamic, value, "IsDynamic")?;
        self.is_kinematic = !value;
        Some(change)
    }

    /// Set penetratable ("IsPenetratable")
    pub fn set_penetratable(&mut self, value: bool) -> Option<PropertyChange> {
        set_tracked(&mut self.is_penetratable, value, "IsPenetratable")
    }

    /// Set gravity ("IsAffectedByGravity")
    pub fn set_affected_by_gravity(&mut self, value: bool) -> Option<PropertyChange> {
        set_tracked(&mut self.is_affected_by_gravity, value, "IsAffectedByGravity")
    }

    /// Set input control ("IsInputControlled")
    pub fn set_input_controlled(&mut self, value: bool) -> Option<PropertyChange> {
        set_tracked(&mut self.is_input_controlled, value, "IsInputControlled")
    }

    /// Set precise collision detection ("BePrecise")
    pub fn set_be_precise(&mut self, value: bool) -> Option<PropertyChange> {
        set_tracked(&mut self.be_precise, value, "BePrecise")
    }
}
