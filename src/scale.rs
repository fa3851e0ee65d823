use tracing::debug;

pub const MIN_SCALE: f32 = 0.01;
pub const MAX_SCALE: f32 = 16.0;

/// Tracks the uniform factor between the natural coordinate space and the
/// rendered width of the overlay's container.
///
/// Height follows width through the pinned aspect ratio, so one scalar is
/// enough.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleController {
    natural_width: f32,
    scale: f32,
}

impl ScaleController {
    pub fn new(natural_width: f32) -> Self {
        Self {
            natural_width,
            scale: 1.0,
        }
    }

    /// Controller already observing `container_width`.
    pub fn observed(natural_width: f32, container_width: f32) -> Self {
        let mut controller = Self::new(natural_width);
        controller.observe(container_width);
        controller
    }

    /// Feed a container resize. A zero width (not laid out yet) keeps the
    /// previous scale.
    pub fn observe(&mut self, container_width: f32) -> Option<f32> {
        if container_width <= 0.0 {
            return None;
        }
        self.scale = container_width / self.natural_width;
        debug!(
            "scale: container={}px natural={}px -> {}",
            container_width, self.natural_width, self.scale
        );
        Some(self.scale)
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn natural_width(&self) -> f32 {
        self.natural_width
    }

    /// Scale restricted to a renderable range; non-finite values fall back to 1.
    pub fn clamped_scale(&self) -> f32 {
        if self.scale.is_finite() {
            self.scale.clamp(MIN_SCALE, MAX_SCALE)
        } else {
            1.0
        }
    }

    /// Replace the current scale with [`Self::clamped_scale`].
    pub fn clamp_to_safe_range(&mut self) -> bool {
        let clamped = self.clamped_scale();
        let changed = clamped != self.scale;
        self.scale = clamped;
        changed
    }
}
