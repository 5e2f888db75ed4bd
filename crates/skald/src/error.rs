//! Engine error type.
//!
//! Recoverable conditions (name clashes, missing lookups, malformed files) are
//! returned as [`EngineError`]. Broken invariants inside the engine itself,
//! such as reading a property with the wrong Rust type, additionally trip a
//! `debug_assert!` at the call site so they halt in debug builds.

use crate::reflect::PropertyKind;
use crate::uid::Uid;

/// Alias for `Result<T, EngineError>`.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors produced by the world, reflection, serialisation and asset layers.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// An actor or component with this name already exists in its scope.
    #[error("name already in use: \"{0}\"")]
    DuplicateName(String),

    #[error("component not found: {0}")]
    ComponentNotFound(String),

    #[error("actor not found: {0}")]
    ActorNotFound(String),

    /// No actor or component system is registered under this name or type.
    #[error("no system registered for \"{0}\"")]
    UnknownSystem(String),

    #[error("property not found: \"{0}\"")]
    PropertyNotFound(String),

    /// A property was accessed as a different kind than it was registered with.
    #[error("property \"{name}\" is {actual:?}, not {expected:?}")]
    TypeMismatch {
        name: String,
        expected: PropertyKind,
        actual: PropertyKind,
    },

    /// The property exists but cannot be written through the generic path.
    #[error("property \"{0}\" is read-only")]
    ReadOnlyProperty(String),

    #[error("joint not found: \"{0}\"")]
    JointNotFound(String),

    #[error("animation not found: \"{0}\"")]
    AnimationNotFound(String),

    /// A joint's parent must come strictly before it in the skeleton.
    #[error("joint {index} has invalid parent {parent}")]
    InvalidJointParent { index: usize, parent: usize },

    /// Linking these components would make one its own ancestor.
    #[error("attaching {child} under {parent} would create a cycle")]
    HierarchyCycle { parent: Uid, child: Uid },

    /// The component has no transform and cannot take part in the hierarchy.
    #[error("component {0} is not spatial")]
    NotSpatial(Uid),

    /// Properties can only be copied between instances of one system.
    #[error("{src} and {dst} belong to different systems")]
    SystemMismatch { src: Uid, dst: Uid },

    /// An actor's root component cannot be removed on its own.
    #[error("component {0} is an actor root")]
    RootRemoval(Uid),

    /// Malformed text or binary input.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// An asset importer rejected its input.
    #[error("import failed: {0}")]
    Import(String),
}

impl EngineError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offender() {
        let err = EngineError::DuplicateName("Mesh".into());
        assert_eq!(err.to_string(), "name already in use: \"Mesh\"");

        let err = EngineError::TypeMismatch {
            name: "FOV".into(),
            expected: PropertyKind::Int,
            actual: PropertyKind::Float,
        };
        assert_eq!(err.to_string(), "property \"FOV\" is Float, not Int");
    }

    #[test]
    fn io_errors_convert() {
        fn open() -> Result<()> {
            std::fs::read("/definitely/not/here.skald")?;
            Ok(())
        }
        assert!(matches!(open(), Err(EngineError::Io(_))));
    }
}
