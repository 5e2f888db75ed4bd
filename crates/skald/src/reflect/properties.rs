use crate::error::{EngineError, Result};

use super::property::{Property, PropertyField, PropertyValue};

/// Owned name/value pairs captured from a [`Properties`] collection.
pub type PropertySnapshot = Vec<(String, PropertyValue)>;

/// An ordered, name-unique collection of [`Property`] borrows plus a title.
///
/// Built fresh by [`Reflect::props`](super::Reflect::props) every time an
/// object is introspected, and dropped before the object is touched again.
#[derive(Debug, Default)]
pub struct Properties<'a> {
    title: String,
    entries: Vec<Property<'a>>,
}

impl<'a> Properties<'a> {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            entries: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Register `field` under `name`.
    ///
    /// Names are unique within a collection. Adding a name twice is a bug in
    /// the property table: debug builds panic, release builds replace the
    /// earlier entry in place so the order stays stable.
    pub fn add<T: PropertyField>(&mut self, name: &str, field: &'a mut T) -> &mut Property<'a> {
        self.insert(Property::new(name, T::reference(field)))
    }

    /// Append every entry of `other`, keeping this collection's title.
    pub fn merge(&mut self, other: Properties<'a>) {
        for prop in other.entries {
            self.insert(prop);
        }
    }

    fn insert(&mut self, prop: Property<'a>) -> &mut Property<'a> {
        let existing = self.position(prop.name());
        debug_assert!(
            existing.is_none(),
            "duplicate property \"{}\" in \"{}\"",
            prop.name(),
            self.title
        );
        let index = match existing {
            Some(i) => {
                self.entries[i] = prop;
                i
            }
            None => {
                self.entries.push(prop);
                self.entries.len() - 1
            }
        };
        &mut self.entries[index]
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|p| p.name() == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property<'a>> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Property<'a>> {
        self.entries.iter_mut()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|p| p.name())
    }

    pub fn find(&self, name: &str) -> Option<&Property<'a>> {
        self.entries.iter().find(|p| p.name() == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Property<'a>> {
        self.entries.iter_mut().find(|p| p.name() == name)
    }

    fn require(&self, name: &str) -> Result<&Property<'a>> {
        self.find(name)
            .ok_or_else(|| EngineError::PropertyNotFound(name.to_owned()))
    }

    fn require_mut(&mut self, name: &str) -> Result<&mut Property<'a>> {
        self.find_mut(name)
            .ok_or_else(|| EngineError::PropertyNotFound(name.to_owned()))
    }

    /// Borrow a field as `T`. See [`Property::get`] for the mismatch behaviour.
    pub fn get<T: PropertyField>(&self, name: &str) -> Result<&T> {
        self.require(name)?.get::<T>()
    }

    pub fn get_mut<T: PropertyField>(&mut self, name: &str) -> Result<&mut T> {
        self.require_mut(name)?.get_mut::<T>()
    }

    pub fn value(&self, name: &str) -> Result<PropertyValue> {
        Ok(self.require(name)?.value())
    }

    /// Editor-style write. Rejects read-only properties.
    ///
    /// Returns whether the property asked to be notified of changes.
    pub fn set_value(&mut self, name: &str, value: PropertyValue) -> Result<bool> {
        let prop = self.require_mut(name)?;
        if prop.is_read_only() {
            return Err(EngineError::ReadOnlyProperty(name.to_owned()));
        }
        prop.set(value)?;
        Ok(prop.notifies())
    }

    pub fn snapshot(&self) -> PropertySnapshot {
        self.entries
            .iter()
            .map(|p| (p.name().to_owned(), p.value()))
            .collect()
    }

    /// Write back a snapshot by name. Unknown names are skipped with a
    /// warning, read-only entries are left alone.
    pub fn apply_snapshot(&mut self, snapshot: &[(String, PropertyValue)]) -> Result<()> {
        for (name, value) in snapshot {
            match self.find_mut(name) {
                Some(prop) if prop.is_read_only() => {}
                Some(prop) => prop.set(value.clone())?,
                None => log::warn!("\"{}\" has no property \"{name}\", skipped", self.title),
            }
        }
        Ok(())
    }

    /// Copy every value from `src` into `dst`.
    ///
    /// Both collections must have the same shape: same names with the same
    /// kinds in the same order. The shape is checked before anything is
    /// written, so a mismatch leaves `dst` untouched.
    pub fn copy_properties(src: &Properties<'_>, dst: &mut Properties<'_>) -> Result<()> {
        if src.len() != dst.len() {
            let missing = src
                .names()
                .find(|n| dst.find(n).is_none())
                .or_else(|| dst.names().find(|n| src.find(n).is_none()))
                .unwrap_or(src.title());
            return Err(EngineError::PropertyNotFound(missing.to_owned()));
        }
        for (s, d) in src.entries.iter().zip(&dst.entries) {
            if s.name() != d.name() {
                return Err(EngineError::PropertyNotFound(s.name().to_owned()));
            }
            if s.kind() != d.kind() {
                return Err(EngineError::TypeMismatch {
                    name: s.name().to_owned(),
                    expected: s.kind(),
                    actual: d.kind(),
                });
            }
        }
        for (s, d) in src.entries.iter().zip(dst.entries.iter_mut()) {
            d.set(s.value())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;
    use crate::reflect::{PropertyKind, VEnum};

    struct Light {
        color: Vec3,
        intensity: f32,
        mode: VEnum,
    }

    impl Light {
        fn new() -> Self {
            Self {
                color: Vec3::ONE,
                intensity: 2.0,
                mode: VEnum::new(&["Point", "Spot"]),
            }
        }

        fn props(&mut self) -> Properties<'_> {
            let mut props = Properties::new("Light");
            props.add("Color", &mut self.color);
            props.add("Intensity", &mut self.intensity).notify();
            props.add("Mode", &mut self.mode);
            props
        }
    }

    #[test]
    fn add_keeps_insertion_order() {
        let mut light = Light::new();
        let props = light.props();
        let names: Vec<_> = props.names().collect();
        assert_eq!(names, ["Color", "Intensity", "Mode"]);
        assert_eq!(props.title(), "Light");
    }

    #[test]
    fn merge_appends_after_base() {
        let mut base_flag = true;
        let mut derived_value = 3;
        let mut props = Properties::new("Derived");
        let mut base = Properties::new("Base");
        base.add("Active", &mut base_flag);
        props.merge(base);
        props.add("Count", &mut derived_value);

        let names: Vec<_> = props.names().collect();
        assert_eq!(names, ["Active", "Count"]);
        assert_eq!(props.title(), "Derived");
    }

    #[test]
    fn set_value_writes_through_and_reports_notify() {
        let mut light = Light::new();
        {
            let mut props = light.props();
            assert!(props.set_value("Intensity", PropertyValue::Float(5.0)).unwrap());
            assert!(!props.set_value("Color", PropertyValue::Vec3(Vec3::X)).unwrap());
        }
        assert_eq!(light.intensity, 5.0);
        assert_eq!(light.color, Vec3::X);
    }

    #[test]
    fn set_value_unknown_name() {
        let mut light = Light::new();
        let mut props = light.props();
        assert!(matches!(
            props.set_value("Range", PropertyValue::Float(1.0)),
            Err(EngineError::PropertyNotFound(name)) if name == "Range"
        ));
    }

    #[test]
    fn read_only_rejects_editor_writes() {
        let mut id = 7;
        let mut props = Properties::new("Thing");
        props.add("Id", &mut id).read_only();
        assert!(matches!(
            props.set_value("Id", PropertyValue::Int(8)),
            Err(EngineError::ReadOnlyProperty(_))
        ));
        drop(props);
        assert_eq!(id, 7);
    }

    #[test]
    fn props_twice_is_identical() {
        let mut light = Light::new();
        let first = light.props().snapshot();
        let second = light.props().snapshot();
        assert_eq!(first, second);
    }

    #[test]
    fn snapshot_round_trip() {
        let mut a = Light::new();
        a.intensity = 9.0;
        a.mode.set("Spot");
        let snap = a.props().snapshot();

        let mut b = Light::new();
        b.props().apply_snapshot(&snap).unwrap();
        assert_eq!(b.intensity, 9.0);
        assert_eq!(b.mode.value(), "Spot");
    }

    #[test]
    fn copy_properties_copies_every_value() {
        let mut src = Light::new();
        src.color = Vec3::new(0.1, 0.2, 0.3);
        src.intensity = 0.5;
        src.mode.set("Spot");
        let mut dst = Light::new();

        {
            let src_props = src.props();
            let mut dst_props = dst.props();
            Properties::copy_properties(&src_props, &mut dst_props).unwrap();
            assert_eq!(dst_props.len(), 3);
            let kinds: Vec<_> = dst_props.iter().map(|p| p.kind()).collect();
            assert_eq!(kinds, [PropertyKind::Vec3, PropertyKind::Float, PropertyKind::Enum]);
        }
        assert_eq!(dst.color, Vec3::new(0.1, 0.2, 0.3));
        assert_eq!(dst.intensity, 0.5);
        assert_eq!(dst.mode.value(), "Spot");
    }

    #[test]
    fn copy_properties_rejects_different_shape() {
        let mut src = Light::new();
        let mut other = 1.0_f32;
        let mut dst = Properties::new("Other");
        dst.add("Intensity", &mut other);

        let src_props = src.props();
        assert!(Properties::copy_properties(&src_props, &mut dst).is_err());
        drop(dst);
        assert_eq!(other, 1.0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "duplicate property \"Intensity\"")]
    fn duplicate_names_panic_in_debug() {
        let mut a = 1.0_f32;
        let mut b = 2.0_f32;
        let mut props = Properties::new("Light");
        props.add("Intensity", &mut a);
        props.add("Intensity", &mut b);
    }
}
