use engine::{InputAction, InputSnapshot, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MoveSpeeds {
    pub(crate) ground: f32,
    pub(crate) vertical: f32,
}

/// One fixed tick of player movement. Forward is -Z (up on screen). Diagonal ground
/// movement is normalized; height never drops below `ground_height`.
pub(crate) fn step_player(
    position: Vec3,
    input: &InputSnapshot,
    fixed_dt_seconds: f32,
    speeds: MoveSpeeds,
    ground_height: f32,
) -> Vec3 {
    let mut dx = 0.0f32;
    let mut dz = 0.0f32;
    if input.is_down(InputAction::MoveForward) {
        dz -= 1.0;
    }
    if input.is_down(InputAction::MoveBack) {
        dz += 1.0;
    }
    if input.is_down(InputAction::MoveLeft) {
        dx -= 1.0;
    }
    if input.is_down(InputAction::MoveRight) {
        dx += 1.0;
    }

    let mut next = position;
    let ground_len = (dx * dx + dz * dz).sqrt();
    if ground_len > 0.0 {
        let step = speeds.ground * fixed_dt_seconds / ground_len;
        next.x += dx * step;
        next.z += dz * step;
    }

    let mut dy = 0.0f32;
    if input.is_down(InputAction::Ascend) {
        dy += 1.0;
    }
    if input.is_down(InputAction::Descend) {
        dy -= 1.0;
    }
    next.y = (next.y + dy * speeds.vertical * fixed_dt_seconds).max(ground_height);

    next
}
