use crate::app::{Camera2D, Vec2};

/// Authoring resolution of a scene. Gameplay coordinates are expressed in
/// this space (y grows downward), independent of the window size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalSize {
    pub width: u32,
    pub height: u32,
}

impl LogicalSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for LogicalSize {
    fn default() -> Self {
        Self::new(1024, 768)
    }
}

/// Physical window size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl From<(u32, u32)> for Viewport {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// Uniform scale plus letterbox offset mapping logical space into a window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayTransform {
    pub scale: f32,
    pub offset: Vec2,
}

impl DisplayTransform {
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        offset: Vec2 { x: 0.0, y: 0.0 },
    };

    pub fn fit(logical: LogicalSize, viewport: Viewport) -> Self {
        if logical.width == 0 || logical.height == 0 || viewport.width == 0 || viewport.height == 0
        {
            return Self::IDENTITY;
        }
        let logical_w = logical.width as f32;
        let logical_h = logical.height as f32;
        let viewport_w = viewport.width as f32;
        let viewport_h = viewport.height as f32;
        let scale = (viewport_w / logical_w).min(viewport_h / logical_h);
        Self {
            scale,
            offset: Vec2 {
                x: (viewport_w - logical_w * scale) * 0.5,
                y: (viewport_h - logical_h * scale) * 0.5,
            },
        }
    }

    pub fn screen_to_logical(&self, screen: Vec2) -> Vec2 {
        Vec2 {
            x: (screen.x - self.offset.x) / self.scale,
            y: (screen.y - self.offset.y) / self.scale,
        }
    }

    pub fn logical_to_screen(&self, logical: Vec2) -> Vec2 {
        Vec2 {
            x: logical.x * self.scale + self.offset.x,
            y: logical.y * self.scale + self.offset.y,
        }
    }

    /// False for points on the letterbox bars.
    pub fn contains_screen_point(&self, screen: Vec2, logical: LogicalSize) -> bool {
        let point = self.screen_to_logical(screen);
        point.x >= 0.0
            && point.y >= 0.0
            && point.x <= logical.width as f32
            && point.y <= logical.height as f32
    }
}

pub fn screen_to_world_px(
    camera: &Camera2D,
    logical: LogicalSize,
    window_size: (u32, u32),
    screen_px: Vec2,
) -> Vec2 {
    let transform = DisplayTransform::fit(logical, Viewport::from(window_size));
    camera.view_to_world(transform.screen_to_logical(screen_px))
}

pub fn world_to_screen_px(
    camera: &Camera2D,
    logical: LogicalSize,
    window_size: (u32, u32),
    world: Vec2,
) -> (i32, i32) {
    let transform = DisplayTransform::fit(logical, Viewport::from(window_size));
    let screen = transform.logical_to_screen(camera.world_to_view(world));
    (screen.x.round() as i32, screen.y.round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f32, y: f32) -> Vec2 {
        Vec2 { x, y }
    }

    fn assert_close(actual: Vec2, expected: Vec2) {
        assert!(
            (actual.x - expected.x).abs() < 0.001 && (actual.y - expected.y).abs() < 0.001,
            "{actual:?} != {expected:?}"
        );
    }

    #[test]
    fn matching_window_is_identity() {
        let transform = DisplayTransform::fit(
            LogicalSize::new(1024, 768),
            Viewport {
                width: 1024,
                height: 768,
            },
        );
        assert_eq!(transform, DisplayTransform::IDENTITY);
    }

    #[test]
    fn wide_window_letterboxes_horizontally() {
        let logical = LogicalSize::new(1024, 768);
        let transform = DisplayTransform::fit(logical, Viewport::from((1920, 1080)));
        assert!((transform.scale - 1.40625).abs() < 0.0001);
        assert_close(transform.offset, v(240.0, 0.0));
        assert_close(transform.screen_to_logical(v(240.0, 0.0)), v(0.0, 0.0));
        assert_close(transform.screen_to_logical(v(1680.0, 1080.0)), v(1024.0, 768.0));
        assert!(!transform.contains_screen_point(v(100.0, 500.0), logical));
        assert!(transform.contains_screen_point(v(960.0, 540.0), logical));
    }

    #[test]
    fn tall_window_letterboxes_vertically() {
        let transform =
            DisplayTransform::fit(LogicalSize::new(1024, 768), Viewport::from((800, 1200)));
        assert!((transform.scale - 0.78125).abs() < 0.0001);
        assert_close(transform.offset, v(0.0, 300.0));
    }

    #[test]
    fn screen_logical_round_trip_under_letterbox() {
        let transform =
            DisplayTransform::fit(LogicalSize::new(1024, 768), Viewport::from((1366, 900)));
        for point in [v(0.0, 0.0), v(512.0, 384.0), v(1023.5, 767.25), v(17.0, 600.0)] {
            let back = transform.screen_to_logical(transform.logical_to_screen(point));
            assert_close(back, point);
        }
    }

    #[test]
    fn zero_sized_window_falls_back_to_identity() {
        let transform = DisplayTransform::fit(LogicalSize::new(1024, 768), Viewport::from((0, 0)));
        assert_eq!(transform, DisplayTransform::IDENTITY);
        assert_close(transform.screen_to_logical(v(12.0, 34.0)), v(12.0, 34.0));
    }

    #[test]
    fn camera_scroll_composes_with_display_transform() {
        let logical = LogicalSize::new(1024, 768);
        let camera = Camera2D {
            position: v(200.0, 0.0),
        };
        let world = screen_to_world_px(&camera, logical, (1024, 768), v(10.0, 20.0));
        assert_close(world, v(210.0, 20.0));
        assert_eq!(
            world_to_screen_px(&camera, logical, (1024, 768), v(210.0, 20.0)),
            (10, 20)
        );

        let scaled = screen_to_world_px(&camera, logical, (2048, 1536), v(20.0, 40.0));
        assert_close(scaled, v(210.0, 20.0));
    }
}
