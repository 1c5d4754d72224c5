mod hud;
mod input;
mod loop_runner;
mod metrics;
mod pacing;
mod rendering;
mod scene;

pub use input::InputAction;
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use rendering::{world_to_screen, world_to_screen_px, Renderer, Viewport, PIXELS_PER_WORLD};
pub use scene::{
    CameraRig, Entity, EntityId, InputSnapshot, RenderShape, RenderableDesc, Scene, SceneCommand,
    SceneWorld, Transform, Vec3,
};
pub(crate) use hud::OverlayData;
