use crate::component::{
    BoxTriggerComponent, CharacterControllerComponent, Component, ComponentRegistry,
    MeshComponent, TriggerEvent, WidgetComponent,
};
use crate::error::Result;
use crate::input::MouseButton;
use crate::math::Vec3;
use crate::reflect::{Properties, Reflect};
use crate::uid::Uid;

use super::{Actor, ActorBase, ActorBuilder, ActorContext};

/// How long the health label stays up after a change.
const WIDGET_SECS: f32 = 2.0;
const AGGRO_RADIUS: f32 = 5.0;

/// A hostile mesh with an aggro box around it.
///
/// Any character controller that is not part of this actor and walks into
/// the trigger puts the enemy in combat. While in combat, a left click deals
/// one point of damage; at zero health the enemy queues its own destruction.
pub struct Enemy {
    base: ActorBase,
    pub health: i32,
    pub in_combat: bool,
}

impl Default for Enemy {
    fn default() -> Self {
        Self {
            base: ActorBase::default(),
            health: 3,
            in_combat: false,
        }
    }
}

impl Enemy {
    pub const MESH: &'static str = "Mesh";
    pub const AGGRO_TRIGGER: &'static str = "Aggro Trigger";
    pub const HEALTH_WIDGET: &'static str = "Health Widget";

    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }

    /// Subtract `amount` from health and show the new value.
    pub fn inflict_damage(&mut self, amount: i32, components: &mut ComponentRegistry) {
        self.health -= amount;
        log::debug!("{} took {amount} damage, {} left", self.base.name, self.health);
        self.show_health(components);
    }

    fn show_health(&self, components: &mut ComponentRegistry) {
        let Some(widget) = self.base.component(Self::HEALTH_WIDGET) else {
            return;
        };
        if let Some(widget) = components.get_mut::<WidgetComponent>(widget) {
            widget.set_text(format!("{}: {} HP", self.base.name, self.health.max(0)));
            widget.show_for(WIDGET_SECS);
        }
    }
}

/// World positions of every character controller not owned by `owner`.
fn controllers_except(components: &ComponentRegistry, owner: Uid) -> Vec<(Uid, Vec3)> {
    let Some(system) = components.system::<CharacterControllerComponent>() else {
        return Vec::new();
    };
    system
        .iter()
        .filter(|c| c.base().owner != owner)
        .filter_map(|c| {
            let uid = c.base().uid;
            components.world_position(uid).ok().map(|p| (uid, p))
        })
        .collect()
}

impl Reflect for Enemy {
    fn props(&mut self) -> Properties<'_> {
        let mut props = self.base.props();
        props.set_title("Enemy");
        props.add("Health", &mut self.health);
        props.add("In Combat", &mut self.in_combat);
        props
    }
}

impl Actor for Enemy {
    const TYPE_NAME: &'static str = "Enemy";

    fn base(&self) -> &ActorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ActorBase {
        &mut self.base
    }

    fn build(&mut self, builder: &mut ActorBuilder<'_>) -> Result<()> {
        builder.add(Self::MESH, MeshComponent::default())?;
        let trigger = BoxTriggerComponent::new(Vec3::splat(AGGRO_RADIUS));
        builder.add(Self::AGGRO_TRIGGER, trigger)?;
        let mut widget = WidgetComponent::default();
        widget.visible = false;
        builder.add(Self::HEALTH_WIDGET, widget)?;
        Ok(())
    }

    fn start(&mut self, ctx: &mut ActorContext<'_>) {
        self.in_combat = false;
        if let Some(widget) = self.base.component(Self::HEALTH_WIDGET) {
            if let Some(widget) = ctx.component_mut::<WidgetComponent>(widget) {
                widget.visible = false;
            }
        }
    }

    fn tick(&mut self, ctx: &mut ActorContext<'_>) {
        let Some(trigger) = self.base.component(Self::AGGRO_TRIGGER) else {
            return;
        };
        let candidates = controllers_except(ctx.components, self.base.uid);
        let Some(trigger) = ctx.component_mut::<BoxTriggerComponent>(trigger) else {
            return;
        };
        let events = trigger.poll(&candidates);
        let anyone_inside = candidates.iter().any(|(uid, _)| trigger.contains(*uid));

        for event in events {
            match event {
                TriggerEvent::Entered(_) if !self.in_combat => {
                    self.in_combat = true;
                    ctx.commands.notify(format!("{} is attacking", self.base.name));
                    self.show_health(ctx.components);
                }
                TriggerEvent::Exited(_) if !anyone_inside => self.in_combat = false,
                _ => {}
            }
        }

        if self.in_combat && ctx.input.mouse.just_pressed(MouseButton::Left) {
            self.inflict_damage(1, ctx.components);
        }
        if self.is_dead() {
            log::info!("{} defeated", self.base.name);
            ctx.commands.destroy_actor(self.base.uid);
        }
    }
}
