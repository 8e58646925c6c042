mod transform;

pub use transform::{
    screen_to_world_px, world_to_screen_px, DisplayTransform, LogicalSize, Viewport,
};
