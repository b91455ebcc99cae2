use crate::{
    core::{bounds::Bounds, geo::Point},
    rendering::style::CircleRenderStyle,
    Result,
};

/// Batch drawing surface for symbol layers.
///
/// Layers queue circles; a backend drains the queue once per frame. The queue
/// carries no hit-testing information, which is why symbol layers keep a
/// separate interaction overlay.
pub struct RenderContext {
    pub width: u32,
    pub height: u32,
    /// Drawing primitives queue
    pub drawing_queue: Vec<DrawCommand>,
    /// Viewport clipping bounds in screen coordinates
    pub clip_bounds: Option<Bounds>,
}

/// Commands that can be issued to the render context
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Circle {
        center: Point,
        style: CircleRenderStyle,
        z_index: i32,
    },
}

impl RenderContext {
    /// Create a new render context
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(crate::MapError::Layer(format!(
                "render surface must be non-empty, got {}x{}",
                width, height
            ))
            .into());
        }

        Ok(Self {
            width,
            height,
            drawing_queue: Vec::new(),
            clip_bounds: None,
        })
    }

    /// Begin a frame
    pub fn begin_frame(&mut self) {
        self.drawing_queue.clear();
    }

    /// Queue a circle; circles entirely outside the clip rectangle are culled.
    /// Returns whether the circle was queued.
    pub fn render_circle(&mut self, center: Point, style: &CircleRenderStyle, z_index: i32) -> bool {
        if let Some(clip) = &self.clip_bounds {
            if !clip.intersects(&Bounds::from_circle(center, style.radius)) {
                return false;
            }
        }

        self.drawing_queue.push(DrawCommand::Circle {
            center,
            style: style.clone(),
            z_index,
        });
        true
    }

    /// Clip to the whole surface
    pub fn clip_to_surface(&mut self) {
        self.clip_bounds = Some(Bounds::from_coords(
            0.0,
            0.0,
            self.width as f64,
            self.height as f64,
        ));
    }

    /// Clear clipping bounds
    pub fn clear_clip_bounds(&mut self) {
        self.clip_bounds = None;
    }

    /// Get the current drawing queue
    pub fn get_drawing_queue(&self) -> &[DrawCommand] {
        &self.drawing_queue
    }
}
