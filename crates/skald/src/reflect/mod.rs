//! # Property Reflection
//!
//! Every actor and component describes its editable fields through
//! [`Reflect::props`], which returns a [`Properties`] collection of typed
//! borrows into the live object. Generic code (save files, templates, actor
//! duplication, editor panels) works only against that collection and never
//! needs to know the concrete type.
//!
//! ```text
//! MeshComponent::props()
//!   ├── SpatialComponent::props()     "Position", "Rotation", "Scale"
//!   │     └── ComponentBase::props()  "Active"
//!   └── own fields                    "Mesh", "Texture", "Casts Shadow", ...
//! ```
//!
//! Derived types call their base's `props()` first and add their own fields
//! after it, so base fields always come first in the collection. Names are
//! unique within a collection.
//!
//! ## Comparison
//!
//! - **Bevy**: `bevy_reflect` derives reflection for arbitrary types, with a
//!   type registry and dynamic structs. Much more general.
//! - **Unreal**: `UPROPERTY` macros and a code generator build the tables.
//!
//! Here the table is written by hand in each `props()` and the kind set is
//! closed, which keeps serialisation a plain `match`.

mod properties;
mod property;
mod venum;

pub use properties::{Properties, PropertySnapshot};
pub use property::{Property, PropertyField, PropertyKind, PropertyRef, PropertyValue};
pub use venum::VEnum;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Objects that expose their fields as [`Properties`].
pub trait Reflect {
    /// Build the property table. Calling this twice on an unchanged object
    /// yields the same names, kinds and values.
    fn props(&mut self) -> Properties<'_>;

    /// Called after a property registered with [`Property::notify`] was written
    /// through [`set_property`](Self::set_property).
    fn property_changed(&mut self, _name: &str) {}

    /// Write one property by name, then run the change hook if it asked for it.
    ///
    /// Returns whether the hook ran.
    fn set_property(&mut self, name: &str, value: PropertyValue) -> Result<bool> {
        let notify = self.props().set_value(name, value)?;
        if notify {
            self.property_changed(name);
        }
        Ok(notify)
    }
}

/// A texture file reference, relative to the asset root.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextureRef(String);

impl TextureRef {
    pub fn new(filename: impl Into<String>) -> Self {
        Self(filename.into())
    }

    pub fn filename(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A mesh file reference, relative to the asset root.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeshRef(String);

impl MeshRef {
    pub fn new(filename: impl Into<String>) -> Self {
        Self(filename.into())
    }

    pub fn filename(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Door {
        open: bool,
        opened_count: i32,
    }

    impl Reflect for Door {
        fn props(&mut self) -> Properties<'_> {
            let mut props = Properties::new("Door");
            props.add("Open", &mut self.open).notify();
            props
        }

        fn property_changed(&mut self, name: &str) {
            if name == "Open" && self.open {
                self.opened_count += 1;
            }
        }
    }

    #[test]
    fn set_property_runs_change_hook() {
        let mut door = Door::default();
        assert!(door.set_property("Open", PropertyValue::Bool(true)).unwrap());
        assert!(door.open);
        assert_eq!(door.opened_count, 1);
    }

    #[test]
    fn set_property_on_missing_name_leaves_object_alone() {
        let mut door = Door::default();
        assert!(door.set_property("Locked", PropertyValue::Bool(true)).is_err());
        assert_eq!(door.opened_count, 0);
    }

    #[test]
    fn asset_refs_expose_filename() {
        let t = TextureRef::new("brick.png");
        assert_eq!(t.filename(), "brick.png");
        assert!(MeshRef::default().is_empty());
    }
}
