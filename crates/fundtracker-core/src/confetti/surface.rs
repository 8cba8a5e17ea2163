//! Host collaborators for drawing and frame pacing.

use super::config::Rgb;

/// A filled rectangle centred on `(x, y)` and rotated by `rotation` radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub color: Rgb,
}

/// Drawing target owned by the host. Dimensions may change at any time;
/// the simulator reads them at start and on `resize`.
pub trait RenderSurface {
    fn width(&self) -> f64;

    fn height(&self) -> f64;

    fn clear(&mut self);

    fn fill_rotated_rect(&mut self, rect: RotatedRect);

    fn set_visible(&mut self, visible: bool);

    /// Called once after every complete redraw. Hosts that double-buffer
    /// flush here.
    fn present(&mut self) {}
}

/// Host primitive that calls back once before the next repaint.
pub trait FrameDriver {
    fn request_frame(&mut self);

    /// Withdraw an outstanding request, if any.
    fn cancel_frame(&mut self) {}
}

/// Surface that discards all drawing. Used for headless sessions.
#[derive(Debug, Clone, Default)]
pub struct HiddenSurface {
    pub width: f64,
    pub height: f64,
    pub visible: bool,
}

impl HiddenSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            visible: false,
        }
    }
}

impl RenderSurface for HiddenSurface {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn clear(&mut self) {}

    fn fill_rotated_rect(&mut self, _rect: RotatedRect) {}

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}
