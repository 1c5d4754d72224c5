use crate::app::{CameraRig, Vec3};

pub const PIXELS_PER_WORLD: f32 = 12.0;

/// Extra footprint scale per world unit of height, so raised objects read as closer.
const HEIGHT_SCALE_PER_UNIT: f32 = 0.06;
const MIN_FOOTPRINT_HALF_PX: i32 = 2;

#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Top-down orthographic projection: world X maps to screen X, world Z to screen Y.
/// Height (Y) does not move a point on screen.
pub fn world_to_screen(
    world: Vec3,
    camera: &CameraRig,
    viewport: Viewport,
    pixels_per_world: f32,
) -> (i32, i32) {
    let x = (world.x - camera.target.x) * pixels_per_world + viewport.width as f32 * 0.5;
    let y = (world.z - camera.target.z) * pixels_per_world + viewport.height as f32 * 0.5;
    (x.round() as i32, y.round() as i32)
}

pub fn world_to_screen_px(camera: &CameraRig, window_size: (u32, u32), world: Vec3) -> (i32, i32) {
    world_to_screen(
        world,
        camera,
        Viewport {
            width: window_size.0,
            height: window_size.1,
        },
        camera_pixels_per_world(camera),
    )
}

pub(crate) fn camera_pixels_per_world(camera: &CameraRig) -> f32 {
    PIXELS_PER_WORLD * camera.effective_zoom()
}

pub(crate) fn footprint_half_px(half_extent: f32, height: f32, pixels_per_world: f32) -> i32 {
    let height_scale = (1.0 + height.max(0.0) * HEIGHT_SCALE_PER_UNIT).max(0.0);
    let half_px = (half_extent * pixels_per_world * height_scale).round() as i32;
    half_px.max(MIN_FOOTPRINT_HALF_PX)
}
