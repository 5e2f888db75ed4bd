use crate::component::PointLightComponent;
use crate::error::Result;
use crate::reflect::{Properties, Reflect};

use super::{Actor, ActorBase, ActorBuilder};

/// A placed point light.
#[derive(Default)]
pub struct LightActor {
    base: ActorBase,
}

impl LightActor {
    pub const LIGHT: &'static str = "Light";
}

impl Reflect for LightActor {
    fn props(&mut self) -> Properties<'_> {
        let mut props = self.base.props();
        props.set_title("Light Actor");
        props
    }
}

impl Actor for LightActor {
    const TYPE_NAME: &'static str = "LightActor";

    fn base(&self) -> &ActorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ActorBase {
        &mut self.base
    }

    fn build(&mut self, builder: &mut ActorBuilder<'_>) -> Result<()> {
        builder.add(Self::LIGHT, PointLightComponent::default())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessRenderer;
    use crate::math::Transform;
    use crate::world::World;

    #[test]
    fn light_is_the_root_and_draws() {
        let mut world = World::new();
        let uid = world.spawn_actor::<LightActor>(None, Transform::IDENTITY).unwrap();
        let base = world.actors().base(uid).unwrap();
        assert_eq!(base.component(LightActor::LIGHT), Some(base.root()));

        let mut renderer = HeadlessRenderer::default();
        world.components().render(&mut renderer);
        assert_eq!(renderer.lights, 1);
    }
}
