use crate::component::MeshComponent;
use crate::error::Result;
use crate::reflect::{Properties, Reflect};

use super::{Actor, ActorBase, ActorBuilder};

/// A static prop: one mesh, nothing else.
#[derive(Default)]
pub struct MeshActor {
    base: ActorBase,
}

impl MeshActor {
    pub const MESH: &'static str = "Mesh";
}

impl Reflect for MeshActor {
    fn props(&mut self) -> Properties<'_> {
        let mut props = self.base.props();
        props.set_title("Mesh Actor");
        props
    }
}

impl Actor for MeshActor {
    const TYPE_NAME: &'static str = "MeshActor";

    fn base(&self) -> &ActorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ActorBase {
        &mut self.base
    }

    fn build(&mut self, builder: &mut ActorBuilder<'_>) -> Result<()> {
        builder.add(Self::MESH, MeshComponent::default())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Transform, Vec3};
    use crate::world::World;

    #[test]
    fn mesh_is_the_root() {
        let mut world = World::new();
        let uid = world
            .spawn_actor::<MeshActor>(Some("Crate"), Transform::from_xyz(1.0, 0.0, 0.0))
            .unwrap();
        let base = world.actors().base(uid).unwrap();
        assert_eq!(base.component(MeshActor::MESH), Some(base.root()));
        let mesh = world.components().get::<MeshComponent>(base.root()).unwrap();
        assert!(mesh.data().is_some());
        assert_eq!(mesh.spatial.transform.position, Vec3::X);
    }
}
