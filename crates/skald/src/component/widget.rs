use crate::backend::{Renderer, WidgetDraw};
use crate::math::Vec2;
use crate::reflect::{Properties, Reflect};

use super::{Capabilities, Component, ComponentBase, TickContext};

/// A piece of screen-space UI text owned by an actor, e.g. a health label.
///
/// Not spatial: `position` is in screen pixels. [`show_for`](Self::show_for)
/// hides the widget again after a delay, polled in `tick`.
pub struct WidgetComponent {
    pub base: ComponentBase,
    pub text: String,
    pub position: Vec2,
    pub size: Vec2,
    pub visible: bool,
    hide_timer: Option<f32>,
}

impl Default for WidgetComponent {
    fn default() -> Self {
        Self {
            base: ComponentBase::default(),
            text: String::new(),
            position: Vec2::ZERO,
            size: Vec2::new(200.0, 40.0),
            visible: true,
            hide_timer: None,
        }
    }
}

impl WidgetComponent {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_owned(),
            ..Self::default()
        }
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Make visible, then hide after `secs`.
    pub fn show_for(&mut self, secs: f32) {
        self.visible = true;
        self.hide_timer = Some(secs);
    }
}

impl Reflect for WidgetComponent {
    fn props(&mut self) -> Properties<'_> {
        let mut props = self.base.props();
        props.set_title("Widget");
        props.add("Text", &mut self.text);
        props.add("Screen Position", &mut self.position);
        props.add("Size", &mut self.size);
        props.add("Visible", &mut self.visible);
        props
    }
}

impl Component for WidgetComponent {
    const TYPE_NAME: &'static str = "WidgetComponent";

    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            renderable: true,
            ..Capabilities::NONE
        }
    }

    fn tick(&mut self, ctx: &mut TickContext<'_>) {
        if let Some(left) = self.hide_timer {
            let left = left - ctx.dt;
            if left <= 0.0 {
                self.visible = false;
                self.hide_timer = None;
            } else {
                self.hide_timer = Some(left);
            }
        }
    }

    fn render(&self, renderer: &mut dyn Renderer) {
        if !self.visible {
            return;
        }
        renderer.draw_widget(WidgetDraw {
            uid: self.base.uid,
            text: self.text.clone(),
            position: self.position,
            size: self.size,
        });
    }
}
