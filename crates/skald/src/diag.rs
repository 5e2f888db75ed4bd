//! World diagnostics.
//!
//! Enabled by the `diagnostics` feature. [`WorldSnapshot`] is a plain,
//! serialisable picture of the world for external tools: which systems
//! exist, how many instances each holds, how long each took to tick last
//! frame, and which actors are alive.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::uid::Uid;
use crate::world::World;

// ── Snapshot types (wire format) ────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub name: String,
    pub count: usize,
    /// Tick time in milliseconds last frame, if the system ticked.
    pub tick_ms: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorInfo {
    pub uid: Uid,
    pub name: String,
    pub system: String,
    pub components: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub actor_systems: Vec<SystemInfo>,
    pub component_systems: Vec<SystemInfo>,
    pub actors: Vec<ActorInfo>,
}

impl WorldSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl World {
    /// Capture system counts, last tick timings and live actors.
    pub fn snapshot(&self) -> WorldSnapshot {
        let tick_ms = |name: &str| {
            self.timings()
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, ms)| *ms)
        };

        let actor_systems = self
            .actors()
            .systems()
            .map(|s| SystemInfo {
                name: s.name().to_owned(),
                count: s.count(),
                tick_ms: tick_ms(s.name()),
            })
            .collect();
        let component_systems = self
            .components()
            .systems()
            .map(|s| SystemInfo {
                name: s.name().to_owned(),
                count: s.count(),
                tick_ms: tick_ms(s.name()),
            })
            .collect();
        let actors = self
            .actors()
            .uids()
            .into_iter()
            .filter_map(|uid| {
                let base = self.actors().base(uid)?;
                Some(ActorInfo {
                    uid,
                    name: base.name.clone(),
                    system: self.actors().type_name(uid)?.to_owned(),
                    components: base.components().iter().map(|(n, _)| n.clone()).collect(),
                })
            })
            .collect();

        WorldSnapshot {
            actor_systems,
            component_systems,
            actors,
        }
    }
}
