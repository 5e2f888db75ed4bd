//! Actor templates.
//!
//! A template is an actor's system name plus a snapshot of every property
//! on the actor and its components, stored as JSON. The actor's own name and
//! UID are left out, so a template can be spawned any number of times.
//!
//! ```json
//! {
//!   "system": "Enemy",
//!   "actor": [["Active", {"Bool": true}], ["Health", {"Int": 5}]],
//!   "components": [
//!     {"name": "Mesh", "system": "MeshComponent", "properties": [...]}
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::reflect::PropertySnapshot;

/// One component's share of an [`ActorTemplate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentTemplate {
    /// Name within the actor.
    pub name: String,
    /// Component system, used when the actor type does not build this
    /// component itself.
    pub system: String,
    pub properties: PropertySnapshot,
}

/// A reusable description of an actor. Capture one with
/// [`World::capture_template`](crate::world::World::capture_template) and
/// spawn it with
/// [`World::spawn_from_template`](crate::world::World::spawn_from_template).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorTemplate {
    pub system: String,
    pub actor: PropertySnapshot,
    pub components: Vec<ComponentTemplate>,
}

impl ActorTemplate {
    pub fn component(&self, name: &str) -> Option<&ComponentTemplate> {
        self.components.iter().find(|c| c.name == name)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        log::info!("Saved {} template to {}", self.system, path.as_ref().display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }
}
