use crate::asset::Assets;
use crate::backend::{Renderer, SpriteDraw};
use crate::math::Vec4;
use crate::reflect::{Properties, Reflect, TextureRef};

use super::{Capabilities, Component, ComponentBase, SpatialComponent, TickContext};

/// A quad showing one cell of a sprite sheet, stepping through the cells
/// row by row.
///
/// `speed` is in cells per second. A sheet that does not loop removes its
/// component after the last cell.
pub struct SpriteComponent {
    pub spatial: SpatialComponent,
    pub texture: TextureRef,
    pub rows: i32,
    pub columns: i32,
    pub speed: f32,
    pub looping: bool,
    timer: f32,
    row: i32,
    column: i32,
    resolved_texture: TextureRef,
}

impl Default for SpriteComponent {
    fn default() -> Self {
        Self {
            spatial: SpatialComponent::default(),
            texture: TextureRef::default(),
            rows: 1,
            columns: 1,
            speed: 1.0,
            looping: true,
            timer: 0.0,
            row: 0,
            column: 0,
            resolved_texture: TextureRef::default(),
        }
    }
}

impl SpriteComponent {
    pub fn new(texture: &str, rows: i32, columns: i32) -> Self {
        Self {
            texture: TextureRef::new(texture),
            rows,
            columns,
            ..Self::default()
        }
    }

    /// Current `(row, column)` cell.
    pub fn cell(&self) -> (i32, i32) {
        (self.row, self.column)
    }

    /// The current cell as `(u, v, width, height)` in UV space.
    pub fn uv_rect(&self) -> Vec4 {
        let w = 1.0 / self.columns.max(1) as f32;
        let h = 1.0 / self.rows.max(1) as f32;
        Vec4::new(w * self.column as f32, h * self.row as f32, w, h)
    }

    /// Move to the next cell. Returns `true` when the sheet wrapped.
    fn step(&mut self) -> bool {
        self.column += 1;
        if self.column >= self.columns {
            self.column = 0;
            self.row += 1;
        }
        if self.row >= self.rows {
            self.row = 0;
            self.column = 0;
            return true;
        }
        false
    }
}

impl Reflect for SpriteComponent {
    fn props(&mut self) -> Properties<'_> {
        let mut props = self.spatial.props();
        props.set_title("Sprite Sheet");
        props.add("Texture", &mut self.texture).notify().autocomplete("textures");
        props.add("Rows", &mut self.rows);
        props.add("Columns", &mut self.columns);
        props.add("Animation Speed", &mut self.speed);
        props.add("Loop", &mut self.looping);
        props
    }
}

impl Component for SpriteComponent {
    const TYPE_NAME: &'static str = "SpriteComponent";

    fn base(&self) -> &ComponentBase {
        &self.spatial.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.spatial.base
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            renderable: true,
            ..Capabilities::SPATIAL
        }
    }

    fn spatial(&self) -> Option<&SpatialComponent> {
        Some(&self.spatial)
    }

    fn spatial_mut(&mut self) -> Option<&mut SpatialComponent> {
        Some(&mut self.spatial)
    }

    fn create(&mut self, assets: &mut Assets) {
        self.resolved_texture = assets.resolve_texture(&self.texture);
    }

    fn tick(&mut self, ctx: &mut TickContext<'_>) {
        self.timer += ctx.dt * self.speed;
        if self.timer < 1.0 {
            return;
        }
        self.timer = 0.0;
        if self.step() && !self.looping {
            ctx.commands.remove_component(self.spatial.base.uid);
        }
    }

    fn render(&self, renderer: &mut dyn Renderer) {
        renderer.draw_sprite(SpriteDraw {
            uid: self.spatial.base.uid,
            world: self.spatial.transform.cached_world_matrix(),
            texture: self.resolved_texture.clone(),
            uv_rect: self.uv_rect(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Command, CommandQueue};
    use crate::input::InputState;

    fn tick(sprite: &mut SpriteComponent, commands: &mut CommandQueue, dt: f32) {
        let input = InputState::new();
        sprite.tick(&mut TickContext {
            dt,
            elapsed: 0.0,
            input: &input,
            commands,
        });
    }

    #[test]
    fn steps_row_by_row() {
        let mut sprite = SpriteComponent::new("smoke.png", 2, 2);
        sprite.speed = 10.0;
        let mut commands = CommandQueue::new();
        let mut cells = Vec::new();
        for _ in 0..4 {
            tick(&mut sprite, &mut commands, 0.11);
            cells.push(sprite.cell());
        }
        assert_eq!(cells, [(0, 1), (1, 0), (1, 1), (0, 0)]);
        assert!(commands.is_empty());
    }

    #[test]
    fn uv_rect_matches_cell() {
        let mut sprite = SpriteComponent::new("smoke.png", 2, 4);
        sprite.row = 1;
        sprite.column = 3;
        assert_eq!(sprite.uv_rect(), Vec4::new(0.75, 0.5, 0.25, 0.5));
    }

    #[test]
    fn one_shot_sheet_asks_to_be_removed() {
        let mut sprite = SpriteComponent::new("spark.png", 1, 2);
        sprite.looping = false;
        sprite.speed = 10.0;
        sprite.spatial.base.uid = crate::uid::Uid::new();
        let mut commands = CommandQueue::new();
        tick(&mut sprite, &mut commands, 0.11);
        tick(&mut sprite, &mut commands, 0.11);
        let queued: Vec<_> = commands.drain().collect();
        assert_eq!(queued, [Command::RemoveComponent(sprite.spatial.base.uid)]);
    }
}
