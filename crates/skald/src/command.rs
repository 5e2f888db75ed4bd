//! Deferred world edits.
//!
//! Actors and components only see their own data during a tick. Anything
//! that touches other systems' storage (spawning, destroying, moving some
//! other component) is queued here and applied once every system has ticked.

use crate::math::{Transform, Vec3};
use crate::uid::Uid;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Spawn an actor through the system registered under `system`.
    SpawnActor {
        system: String,
        name: Option<String>,
        transform: Transform,
    },
    DestroyActor(Uid),
    RemoveComponent(Uid),
    /// Set a spatial component's world position.
    SetWorldPosition { component: Uid, position: Vec3 },
    /// Message for the editor's notification list.
    Notify(String),
}

/// Commands queued during one frame, applied in order.
#[derive(Debug, Default)]
pub struct CommandQueue {
    commands: Vec<Command>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn spawn_actor(&mut self, system: &str, name: Option<&str>, transform: Transform) {
        self.push(Command::SpawnActor {
            system: system.to_owned(),
            name: name.map(str::to_owned),
            transform,
        });
    }

    pub fn destroy_actor(&mut self, actor: Uid) {
        self.push(Command::DestroyActor(actor));
    }

    pub fn remove_component(&mut self, component: Uid) {
        self.push(Command::RemoveComponent(component));
    }

    pub fn set_world_position(&mut self, component: Uid, position: Vec3) {
        self.push(Command::SetWorldPosition {
            component,
            position,
        });
    }

    pub fn notify(&mut self, message: impl Into<String>) {
        self.push(Command::Notify(message.into()));
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Take every queued command, oldest first.
    pub fn drain(&mut self) -> std::vec::Drain<'_, Command> {
        self.commands.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_keeps_queue_order() {
        let mut queue = CommandQueue::new();
        let uid = Uid::new();
        queue.notify("hello");
        queue.destroy_actor(uid);
        let drained: Vec<_> = queue.drain().collect();
        assert_eq!(
            drained,
            vec![Command::Notify("hello".into()), Command::DestroyActor(uid)]
        );
        assert!(queue.is_empty());
    }
}
