use serde::{Deserialize, Serialize};

/// A string-valued enumeration that editors present as a drop-down.
///
/// Holds the ordered list of allowed names and the current value. Reflected
/// and serialised as the current name only.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VEnum {
    names: Vec<String>,
    value: String,
}

impl VEnum {
    /// Build from the allowed names; the first one becomes the value.
    pub fn new<S: AsRef<str>>(names: &[S]) -> Self {
        let names: Vec<String> = names.iter().map(|n| n.as_ref().to_owned()).collect();
        let value = names.first().cloned().unwrap_or_default();
        Self { names, value }
    }

    /// Build and select `value`. Falls back to the first name if `value` is not allowed.
    pub fn with_value<S: AsRef<str>>(names: &[S], value: &str) -> Self {
        let mut e = Self::new(names);
        e.set(value);
        e
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn index(&self) -> Option<usize> {
        self.names.iter().position(|n| *n == self.value)
    }

    /// Select `value`. Returns `false` and leaves the selection unchanged if
    /// it is not one of the allowed names.
    pub fn set(&mut self, value: &str) -> bool {
        if self.names.iter().any(|n| n == value) {
            self.value = value.to_owned();
            true
        } else {
            false
        }
    }
}
