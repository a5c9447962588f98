//! Component trait, type tags and property change records
//!
//! Every component type carries an explicit [`ComponentKind`] tag used as the
//! key of the per-type indices. The database stores components type-erased as
//! [`ComponentData`]; [`Component::from_data`] recovers the concrete type.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ecs::components::{AudioListener, AudioSource, Collider, EntityInfo, Movement, Transform};
use crate::foundation::math::{PropertyEq, Quat, Vec3};

/// Implemented by every type that can be attached to an entity
pub trait Component: Clone + fmt::Debug + 'static {
    /// Type tag of this component type
    const KIND: ComponentKind;

    /// Wrap the value into the type-erased payload
    fn into_data(self) -> ComponentData;

    /// Borrow the concrete value if the payload holds this type
    fn from_data(data: &ComponentData) -> Option<&Self>;

    /// Mutably borrow the concrete value if the payload holds this type
    fn from_data_mut(data: &mut ComponentData) -> Option<&mut Self>;
}

macro_rules! component_kinds {
    ($($name:ident => $label:literal),* $(,)?) => {
        /// Explicit type tag of a component type
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum ComponentKind {
            $(
                #[doc = concat!("Tag of [`", stringify!($name), "`]")]
                $name,
            )*
        }

        impl ComponentKind {
            /// Every known component kind
            pub const ALL: &'static [Self] = &[$(Self::$name),*];

            /// Human readable type name
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$name => $label,)*
                }
            }
        }

        /// Type-erased component payload, as stored by the database and in snapshots
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub enum ComponentData {
            $(
                #[doc = concat!("A [`", stringify!($name), "`] component")]
                $name($name),
            )*
        }

        impl ComponentData {
            /// Type tag of the payload
            pub const fn kind(&self) -> ComponentKind {
                match self {
                    $(Self::$name(_) => ComponentKind::$name,)*
                }
            }
        }

        $(
            impl Component for $name {
                const KIND: ComponentKind = ComponentKind::$name;

                fn into_data(self) -> ComponentData {
                    ComponentData::$name(self)
                }

                #[allow(unreachable_patterns)]
                fn from_data(data: &ComponentData) -> Option<&Self> {
                    match data {
                        ComponentData::$name(value) => Some(value),
                        _ => None,
                    }
                }

                #[allow(unreachable_patterns)]
                fn from_data_mut(data: &mut ComponentData) -> Option<&mut Self> {
                    match data {
                        ComponentData::$name(value) => Some(value),
                        _ => None,
                    }
                }
            }
        )*
    };
}

component_kinds! {
    Transform => "Transform",
    Movement => "Movement",
    Collider => "Collider",
    AudioSource => "AudioSource",
    AudioListener => "AudioListener",
    EntityInfo => "EntityInfo",
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Previous value of a changed property
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Flag
    Bool(bool),
    /// Scalar
    Float(f32),
    /// Vector
    Vector(Vec3),
    /// Rotation
    Rotation(Quat),
    /// Text
    Text(String),
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f32> for PropertyValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<Vec3> for PropertyValue {
    fn from(value: Vec3) -> Self {
        Self::Vector(value)
    }
}

impl From<Quat> for PropertyValue {
    fn from(value: Quat) -> Self {
        Self::Rotation(value)
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Record of a property write that changed the stored value
///
/// Setters return `Some(PropertyChange)` only when the new value differs from
/// the old one; the owning handle publishes it on the component channel.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyChange {
    /// Property name, e.g. `"Position"`
    pub property: &'static str,
    /// Value before the write, if meaningful
    pub old_value: Option<PropertyValue>,
}

impl PropertyChange {
    /// Change carrying its previous value
    pub fn with_old(property: &'static str, old_value: impl Into<PropertyValue>) -> Self {
        Self {
            property,
            old_value: Some(old_value.into()),
        }
    }
}

/// Write `value` into `slot` if it differs, returning the change record
pub(crate) fn set_tracked<V>(slot: &mut V, value: V, property: &'static str) -> Option<PropertyChange>
where
    V: PropertyEq + Into<PropertyValue>,
{
    if slot.property_eq(&value) {
        return None;
    }
    let old = std::mem::replace(slot, value);
    Some(PropertyChange::with_old(property, old))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_reports_its_kind() {
        let data = Collider::default().into_data();
        assert_eq!(data.kind(), ComponentKind::Collider);
        assert!(Collider::from_data(&data).is_some());
        assert!(Transform::from_data(&data).is_none());
    }

    #[test]
    fn every_kind_has_a_distinct_name() {
        let mut names: Vec<_> = ComponentKind::ALL.iter().map(|k| k.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ComponentKind::ALL.len());
        assert_eq!(ComponentKind::Transform.to_string(), "Transform");
    }

    #[test]
    fn tracked_write_skips_equal_values() {
        let mut value = 1.0_f32;
        assert!(set_tracked(&mut value, 1.0, "Mass").is_none());

        let change = set_tracked(&mut value, 2.0, "Mass").unwrap();
        assert_eq!(change.property, "Mass");
        assert_eq!(change.old_value, Some(PropertyValue::Float(1.0)));
        assert!((value - 2.0).abs() < f32::EPSILON);
    }
}
