use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::app::hud::{draw_filled_rect, draw_objective_banner, draw_overlay, write_pixel_rgba};
use crate::app::{CameraRig, Entity, OverlayData, RenderShape, SceneWorld, Vec3};

use super::transform::{camera_pixels_per_world, footprint_half_px};
use super::{world_to_screen, Viewport};

const CLEAR_COLOR: [u8; 4] = [38, 62, 40, 255];
const GRID_CELL_WORLD: f32 = 1.0;
const GRID_MAJOR_EVERY: i32 = 5;
const GRID_MINOR_COLOR: [u8; 4] = [44, 70, 46, 255];
const GRID_MAJOR_COLOR: [u8; 4] = [56, 86, 58, 255];
const SHADOW_COLOR: [u8; 4] = [0, 0, 0, 90];
/// Objects at or below this height cast no separate shadow.
const SHADOW_MIN_HEIGHT: f32 = 0.75;
const RING_THICKNESS_PX: i32 = 2;

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    draw_order: Vec<usize>,
}

impl Renderer {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
            draw_order: Vec::new(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(window: Arc<Window>, width: u32, height: u32) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub(crate) fn render_world(
        &mut self,
        world: &SceneWorld,
        overlay_data: Option<&OverlayData>,
    ) -> Result<(), Error> {
        let Viewport { width, height } = self.viewport;
        if width == 0 || height == 0 {
            return Ok(());
        }

        let frame = self.pixels.frame_mut();
        for chunk in frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&CLEAR_COLOR);
        }
        draw_ground_grid(frame, self.viewport, world.camera());

        collect_draw_order(world, &mut self.draw_order);
        let pixels_per_world = camera_pixels_per_world(world.camera());
        for index in self.draw_order.iter().copied() {
            draw_entity(
                frame,
                self.viewport,
                world.camera(),
                pixels_per_world,
                &world.entities()[index],
            );
        }

        if let Some(text) = world.hud_text() {
            draw_objective_banner(frame, width, height, text);
        }
        if let Some(data) = overlay_data {
            draw_overlay(frame, width, height, data);
        }

        self.pixels.render()
    }
}

/// Visible entities, lowest first so raised objects draw over what is beneath them.
/// Ties keep spawn order for a stable picture.
fn collect_draw_order(world: &SceneWorld, out: &mut Vec<usize>) {
    out.clear();
    out.extend(
        world
            .entities()
            .iter()
            .enumerate()
            .filter(|(_, entity)| entity.visible)
            .map(|(index, _)| index),
    );
    let entities = world.entities();
    out.sort_by(|&a, &b| {
        let ea = &entities[a];
        let eb = &entities[b];
        ea.transform
            .position
            .y
            .total_cmp(&eb.transform.position.y)
            .then(ea.applied_spawn_order().cmp(&eb.applied_spawn_order()))
    });
}

fn draw_entity(
    frame: &mut [u8],
    viewport: Viewport,
    camera: &CameraRig,
    pixels_per_world: f32,
    entity: &Entity,
) {
    let position = entity.transform.position;
    let (cx, cy) = world_to_screen(position, camera, viewport, pixels_per_world);
    let half_extent = entity.renderable.half_extent;

    if position.y > SHADOW_MIN_HEIGHT {
        let shadow_half = footprint_half_px(half_extent, 0.0, pixels_per_world);
        let ground = Vec3::new(position.x, 0.0, position.z);
        let (sx, sy) = world_to_screen(ground, camera, viewport, pixels_per_world);
        draw_square(frame, viewport, sx, sy, shadow_half, SHADOW_COLOR);
    }

    let half = footprint_half_px(half_extent, position.y, pixels_per_world);
    let color = entity.renderable.color;
    match entity.renderable.shape {
        RenderShape::Square => draw_square(frame, viewport, cx, cy, half, color),
        RenderShape::Diamond => draw_diamond(frame, viewport, cx, cy, half, color),
        RenderShape::Ring => draw_ring(frame, viewport, cx, cy, half, color),
    }
}

fn draw_ground_grid(frame: &mut [u8], viewport: Viewport, camera: &CameraRig) {
    let pixels_per_world = camera_pixels_per_world(camera);
    let half_w_world = viewport.width as f32 / (2.0 * pixels_per_world);
    let half_h_world = viewport.height as f32 / (2.0 * pixels_per_world);
    let ix_start = ((camera.target.x - half_w_world) / GRID_CELL_WORLD).floor() as i32 - 1;
    let ix_end = ((camera.target.x + half_w_world) / GRID_CELL_WORLD).ceil() as i32 + 1;
    let iz_start = ((camera.target.z - half_h_world) / GRID_CELL_WORLD).floor() as i32 - 1;
    let iz_end = ((camera.target.z + half_h_world) / GRID_CELL_WORLD).ceil() as i32 + 1;

    for ix in ix_start..=ix_end {
        let world_x = ix as f32 * GRID_CELL_WORLD;
        let (screen_x, _) = world_to_screen(
            Vec3::new(world_x, 0.0, camera.target.z),
            camera,
            viewport,
            pixels_per_world,
        );
        draw_filled_rect(
            frame,
            viewport.width,
            viewport.height,
            screen_x,
            0,
            1,
            viewport.height as i32,
            grid_line_color(ix),
        );
    }

    for iz in iz_start..=iz_end {
        let world_z = iz as f32 * GRID_CELL_WORLD;
        let (_, screen_y) = world_to_screen(
            Vec3::new(camera.target.x, 0.0, world_z),
            camera,
            viewport,
            pixels_per_world,
        );
        draw_filled_rect(
            frame,
            viewport.width,
            viewport.height,
            0,
            screen_y,
            viewport.width as i32,
            1,
            grid_line_color(iz),
        );
    }
}

fn grid_line_color(index: i32) -> [u8; 4] {
    if index.rem_euclid(GRID_MAJOR_EVERY) == 0 {
        GRID_MAJOR_COLOR
    } else {
        GRID_MINOR_COLOR
    }
}

fn draw_square(frame: &mut [u8], viewport: Viewport, cx: i32, cy: i32, half: i32, color: [u8; 4]) {
    draw_filled_rect(
        frame,
        viewport.width,
        viewport.height,
        cx - half,
        cy - half,
        half * 2 + 1,
        half * 2 + 1,
        color,
    );
}

fn draw_diamond(frame: &mut [u8], viewport: Viewport, cx: i32, cy: i32, half: i32, color: [u8; 4]) {
    for dy in -half..=half {
        let span = half - dy.abs();
        draw_filled_rect(
            frame,
            viewport.width,
            viewport.height,
            cx - span,
            cy + dy,
            span * 2 + 1,
            1,
            color,
        );
    }
}

fn draw_ring(frame: &mut [u8], viewport: Viewport, cx: i32, cy: i32, half: i32, color: [u8; 4]) {
    let outer_sq = half * half;
    let inner = (half - RING_THICKNESS_PX).max(0);
    let inner_sq = inner * inner;
    for dy in -half..=half {
        for dx in -half..=half {
            let dist_sq = dx * dx + dy * dy;
            if dist_sq > outer_sq || dist_sq < inner_sq {
                continue;
            }
            let (x, y) = (cx + dx, cy + dy);
            if x < 0 || y < 0 || x >= viewport.width as i32 || y >= viewport.height as i32 {
                continue;
            }
            write_pixel_rgba(frame, viewport.width as usize, x as usize, y as usize, color);
        }
    }
}
