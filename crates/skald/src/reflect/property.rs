//! A single reflected field.
//!
//! A [`Property`] is a named, kind-tagged `&mut` borrow of one field on a live
//! object. The kind set is closed ([`PropertyKind`]), so every property can be
//! read, written and serialised without per-type code, and nothing that holds
//! a pointer can ever be reflected.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::math::{Quat, Vec2, Vec3, Vec4};
use crate::uid::Uid;

use super::{MeshRef, TextureRef, VEnum};

/// The kinds of field the reflection layer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKind {
    Bool,
    Int,
    Float,
    String,
    Vec2,
    Vec3,
    Vec4,
    Quat,
    Uid,
    Enum,
    Texture,
    Mesh,
}

/// An owned copy of a property's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    String(String),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Quat(Quat),
    Uid(Uid),
    Enum(VEnum),
    Texture(TextureRef),
    Mesh(MeshRef),
}

impl PropertyValue {
    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::Bool(_) => PropertyKind::Bool,
            Self::Int(_) => PropertyKind::Int,
            Self::Float(_) => PropertyKind::Float,
            Self::String(_) => PropertyKind::String,
            Self::Vec2(_) => PropertyKind::Vec2,
            Self::Vec3(_) => PropertyKind::Vec3,
            Self::Vec4(_) => PropertyKind::Vec4,
            Self::Quat(_) => PropertyKind::Quat,
            Self::Uid(_) => PropertyKind::Uid,
            Self::Enum(_) => PropertyKind::Enum,
            Self::Texture(_) => PropertyKind::Texture,
            Self::Mesh(_) => PropertyKind::Mesh,
        }
    }
}

/// A mutable borrow of a reflected field, tagged by kind.
#[derive(Debug)]
pub enum PropertyRef<'a> {
    Bool(&'a mut bool),
    Int(&'a mut i32),
    Float(&'a mut f32),
    String(&'a mut String),
    Vec2(&'a mut Vec2),
    Vec3(&'a mut Vec3),
    Vec4(&'a mut Vec4),
    Quat(&'a mut Quat),
    Uid(&'a mut Uid),
    Enum(&'a mut VEnum),
    Texture(&'a mut TextureRef),
    Mesh(&'a mut MeshRef),
}

impl PropertyRef<'_> {
    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::Bool(_) => PropertyKind::Bool,
            Self::Int(_) => PropertyKind::Int,
            Self::Float(_) => PropertyKind::Float,
            Self::String(_) => PropertyKind::String,
            Self::Vec2(_) => PropertyKind::Vec2,
            Self::Vec3(_) => PropertyKind::Vec3,
            Self::Vec4(_) => PropertyKind::Vec4,
            Self::Quat(_) => PropertyKind::Quat,
            Self::Uid(_) => PropertyKind::Uid,
            Self::Enum(_) => PropertyKind::Enum,
            Self::Texture(_) => PropertyKind::Texture,
            Self::Mesh(_) => PropertyKind::Mesh,
        }
    }

    fn to_value(&self) -> PropertyValue {
        match self {
            Self::Bool(v) => PropertyValue::Bool(**v),
            Self::Int(v) => PropertyValue::Int(**v),
            Self::Float(v) => PropertyValue::Float(**v),
            Self::String(v) => PropertyValue::String((**v).clone()),
            Self::Vec2(v) => PropertyValue::Vec2(**v),
            Self::Vec3(v) => PropertyValue::Vec3(**v),
            Self::Vec4(v) => PropertyValue::Vec4(**v),
            Self::Quat(v) => PropertyValue::Quat(**v),
            Self::Uid(v) => PropertyValue::Uid(**v),
            Self::Enum(v) => PropertyValue::Enum((**v).clone()),
            Self::Texture(v) => PropertyValue::Texture((**v).clone()),
            Self::Mesh(v) => PropertyValue::Mesh((**v).clone()),
        }
    }

    /// Write `value` if the kinds agree. Returns the rejected value otherwise.
    fn assign(&mut self, value: PropertyValue) -> std::result::Result<(), PropertyValue> {
        match (self, value) {
            (Self::Bool(dst), PropertyValue::Bool(v)) => **dst = v,
            (Self::Int(dst), PropertyValue::Int(v)) => **dst = v,
            (Self::Float(dst), PropertyValue::Float(v)) => **dst = v,
            (Self::String(dst), PropertyValue::String(v)) => **dst = v,
            (Self::Vec2(dst), PropertyValue::Vec2(v)) => **dst = v,
            (Self::Vec3(dst), PropertyValue::Vec3(v)) => **dst = v,
            (Self::Vec4(dst), PropertyValue::Vec4(v)) => **dst = v,
            (Self::Quat(dst), PropertyValue::Quat(v)) => **dst = v,
            (Self::Uid(dst), PropertyValue::Uid(v)) => **dst = v,
            (Self::Enum(dst), PropertyValue::Enum(v)) => **dst = v,
            (Self::Texture(dst), PropertyValue::Texture(v)) => **dst = v,
            (Self::Mesh(dst), PropertyValue::Mesh(v)) => **dst = v,
            (_, v) => return Err(v),
        }
        Ok(())
    }
}

/// Rust types that can be registered as a property.
pub trait PropertyField: 'static {
    const KIND: PropertyKind;

    fn reference(&mut self) -> PropertyRef<'_>;
    fn view<'r>(r: &'r PropertyRef<'_>) -> Option<&'r Self>;
    fn view_mut<'r>(r: &'r mut PropertyRef<'_>) -> Option<&'r mut Self>;
}

macro_rules! property_field {
    ($ty:ty, $variant:ident) => {
        impl PropertyField for $ty {
            const KIND: PropertyKind = PropertyKind::$variant;

            fn reference(&mut self) -> PropertyRef<'_> {
                PropertyRef::$variant(self)
            }

            fn view<'r>(r: &'r PropertyRef<'_>) -> Option<&'r Self> {
                match r {
                    PropertyRef::$variant(v) => Some(&**v),
                    _ => None,
                }
            }

            fn view_mut<'r>(r: &'r mut PropertyRef<'_>) -> Option<&'r mut Self> {
                match r {
                    PropertyRef::$variant(v) => Some(&mut **v),
                    _ => None,
                }
            }
        }
    };
}

property_field!(bool, Bool);
property_field!(i32, Int);
property_field!(f32, Float);
property_field!(String, String);
property_field!(Vec2, Vec2);
property_field!(Vec3, Vec3);
property_field!(Vec4, Vec4);
property_field!(Quat, Quat);
property_field!(Uid, Uid);
property_field!(VEnum, Enum);
property_field!(TextureRef, Texture);
property_field!(MeshRef, Mesh);

/// A named borrow of one field, with editor metadata.
#[derive(Debug)]
pub struct Property<'a> {
    name: String,
    value: PropertyRef<'a>,
    notify: bool,
    read_only: bool,
    autocomplete: Option<String>,
}

impl<'a> Property<'a> {
    pub(crate) fn new(name: impl Into<String>, value: PropertyRef<'a>) -> Self {
        Self {
            name: name.into(),
            value,
            notify: false,
            read_only: false,
            autocomplete: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PropertyKind {
        self.value.kind()
    }

    /// Ask editors to call [`Reflect::property_changed`](super::Reflect::property_changed)
    /// after writing this property.
    pub fn notify(&mut self) -> &mut Self {
        self.notify = true;
        self
    }

    /// Mark as not writable through [`Properties::set_value`](super::Properties::set_value).
    pub fn read_only(&mut self) -> &mut Self {
        self.read_only = true;
        self
    }

    /// Attach an asset directory editors offer completions from.
    pub fn autocomplete(&mut self, path: impl Into<String>) -> &mut Self {
        self.autocomplete = Some(path.into());
        self
    }

    pub fn notifies(&self) -> bool {
        self.notify
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn autocomplete_path(&self) -> Option<&str> {
        self.autocomplete.as_deref()
    }

    pub fn value_ref(&self) -> &PropertyRef<'a> {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut PropertyRef<'a> {
        &mut self.value
    }

    /// Copy the current value out.
    pub fn value(&self) -> PropertyValue {
        self.value.to_value()
    }

    /// Overwrite the field. Kinds must match.
    pub fn set(&mut self, value: PropertyValue) -> Result<()> {
        let actual = self.kind();
        self.value.assign(value).map_err(|rejected| EngineError::TypeMismatch {
            name: self.name.clone(),
            expected: rejected.kind(),
            actual,
        })
    }

    /// Borrow the field as `T`.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if `T` is not the registered kind: that is a
    /// bug in whoever built the property table. Release builds return
    /// [`EngineError::TypeMismatch`].
    pub fn get<T: PropertyField>(&self) -> Result<&T> {
        T::view(&self.value).ok_or_else(|| self.mismatch(T::KIND))
    }

    /// Mutable counterpart of [`get`](Self::get).
    pub fn get_mut<T: PropertyField>(&mut self) -> Result<&mut T> {
        let actual = self.kind();
        if actual != T::KIND {
            return Err(self.mismatch(T::KIND));
        }
        let name = &self.name;
        T::view_mut(&mut self.value).ok_or_else(|| EngineError::TypeMismatch {
            name: name.clone(),
            expected: T::KIND,
            actual,
        })
    }

    fn mismatch(&self, expected: PropertyKind) -> EngineError {
        let actual = self.kind();
        if cfg!(debug_assertions) {
            panic!(
                "property \"{}\" accessed as {expected:?} but registered as {actual:?}",
                self.name
            );
        }
        EngineError::TypeMismatch {
            name: self.name.clone(),
            expected,
            actual,
        }
    }
}
