use winit::event::{ElementState, MouseScrollDelta};
use winit::keyboard::{KeyCode, PhysicalKey};

use super::InputSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveForward,
    MoveBack,
    MoveLeft,
    MoveRight,
    Ascend,
    Descend,
    Quit,
}

const ACTION_COUNT: usize = 7;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveForward => 0,
            InputAction::MoveBack => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Ascend => 4,
            InputAction::Descend => 5,
            InputAction::Quit => 6,
        }
    }
}

/// What a physical key does. Held keys track state; the rest fire once per press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyBinding {
    Hold(InputAction),
    Restart,
    ToggleOverlay,
    Zoom(i32),
}

fn binding_for(code: KeyCode) -> Option<KeyBinding> {
    use KeyBinding::{Hold, Restart, ToggleOverlay, Zoom};

    let binding = match code {
        KeyCode::KeyW | KeyCode::ArrowUp => Hold(InputAction::MoveForward),
        KeyCode::KeyS | KeyCode::ArrowDown => Hold(InputAction::MoveBack),
        KeyCode::KeyA | KeyCode::ArrowLeft => Hold(InputAction::MoveLeft),
        KeyCode::KeyD | KeyCode::ArrowRight => Hold(InputAction::MoveRight),
        KeyCode::Space | KeyCode::KeyE => Hold(InputAction::Ascend),
        KeyCode::ShiftLeft | KeyCode::KeyQ => Hold(InputAction::Descend),
        KeyCode::Escape => Hold(InputAction::Quit),
        KeyCode::KeyR => Restart,
        KeyCode::F3 => ToggleOverlay,
        KeyCode::Equal | KeyCode::NumpadAdd => Zoom(1),
        KeyCode::Minus | KeyCode::NumpadSubtract => Zoom(-1),
        _ => return None,
    };
    Some(binding)
}

/// Accumulates window input between simulation ticks.
///
/// Held actions are sampled as-is by every tick. One-shot presses (restart, zoom)
/// are handed to the next tick only, and key repeat never produces a second press.
#[derive(Debug, Default)]
pub(crate) struct InputCollector {
    actions: ActionStates,
    held_one_shots: Vec<KeyCode>,
    restart_pending: bool,
    overlay_toggle_pending: bool,
    zoom_steps: i32,
    quit_requested: bool,
    window_size: (u32, u32),
}

impl InputCollector {
    pub(crate) fn new(window_width: u32, window_height: u32) -> Self {
        Self {
            window_size: (window_width, window_height),
            ..Self::default()
        }
    }

    pub(crate) fn handle_key(&mut self, key: PhysicalKey, state: ElementState) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        let Some(binding) = binding_for(code) else {
            return;
        };
        let pressed = state == ElementState::Pressed;

        if let KeyBinding::Hold(action) = binding {
            self.actions.set(action, pressed);
            if action == InputAction::Quit && pressed {
                self.quit_requested = true;
            }
            return;
        }

        if !self.register_press(code, pressed) {
            return;
        }
        match binding {
            KeyBinding::Restart => self.restart_pending = true,
            KeyBinding::ToggleOverlay => self.overlay_toggle_pending = true,
            KeyBinding::Zoom(steps) => self.zoom_steps = self.zoom_steps.saturating_add(steps),
            KeyBinding::Hold(_) => {}
        }
    }

    /// True only for the press that takes a one-shot key from up to down.
    fn register_press(&mut self, code: KeyCode, pressed: bool) -> bool {
        let was_held = self.held_one_shots.contains(&code);
        if pressed && !was_held {
            self.held_one_shots.push(code);
            return true;
        }
        if !pressed {
            self.held_one_shots.retain(|held| *held != code);
        }
        false
    }

    pub(crate) fn handle_mouse_wheel(&mut self, delta: MouseScrollDelta) {
        self.zoom_steps = self.zoom_steps.saturating_add(wheel_zoom_steps(delta));
    }

    pub(crate) fn request_quit(&mut self) {
        self.quit_requested = true;
    }

    pub(crate) fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub(crate) fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_size = (width, height);
    }

    pub(crate) fn take_overlay_toggle(&mut self) -> bool {
        std::mem::take(&mut self.overlay_toggle_pending)
    }

    /// Builds the input for one tick and consumes pending one-shot presses.
    pub(crate) fn next_tick_input(&mut self) -> InputSnapshot {
        let (width, height) = self.window_size;
        InputSnapshot::new(
            self.quit_requested,
            std::mem::take(&mut self.restart_pending),
            self.actions,
            std::mem::take(&mut self.zoom_steps),
            width,
            height,
        )
    }
}

/// Line deltas round to whole steps; trackpad pixel deltas count as one step each way.
fn wheel_zoom_steps(delta: MouseScrollDelta) -> i32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y.round() as i32,
        MouseScrollDelta::PixelDelta(position) if position.y > 0.0 => 1,
        MouseScrollDelta::PixelDelta(position) if position.y < 0.0 => -1,
        MouseScrollDelta::PixelDelta(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use winit::dpi::PhysicalPosition;

    use super::*;

    fn key(input: &mut InputCollector, code: KeyCode, state: ElementState) {
        input.handle_key(PhysicalKey::Code(code), state);
    }

    fn tap(input: &mut InputCollector, code: KeyCode) {
        key(input, code, ElementState::Pressed);
        key(input, code, ElementState::Released);
    }

    #[test]
    fn actions_are_tracked_independently() {
        let mut states = ActionStates::default();
        states.set(InputAction::MoveForward, true);
        states.set(InputAction::Ascend, true);

        assert!(states.is_down(InputAction::MoveForward));
        assert!(states.is_down(InputAction::Ascend));
        assert!(!states.is_down(InputAction::MoveBack));

        states.set(InputAction::MoveForward, false);
        assert!(!states.is_down(InputAction::MoveForward));
    }

    #[test]
    fn arrows_and_letters_share_movement_bindings() {
        assert_eq!(binding_for(KeyCode::KeyW), binding_for(KeyCode::ArrowUp));
        assert_eq!(binding_for(KeyCode::KeyQ), binding_for(KeyCode::ShiftLeft));
        assert_eq!(binding_for(KeyCode::NumpadAdd), Some(KeyBinding::Zoom(1)));
        assert_eq!(binding_for(KeyCode::KeyZ), None);
    }

    #[test]
    fn held_keys_stay_down_until_released() {
        let mut input = InputCollector::new(1280, 720);
        key(&mut input, KeyCode::KeyW, ElementState::Pressed);
        key(&mut input, KeyCode::Space, ElementState::Pressed);

        for _ in 0..2 {
            let tick = input.next_tick_input();
            assert!(tick.is_down(InputAction::MoveForward));
            assert!(tick.is_down(InputAction::Ascend));
            assert!(!tick.is_down(InputAction::MoveRight));
        }

        key(&mut input, KeyCode::KeyW, ElementState::Released);
        assert!(!input.next_tick_input().is_down(InputAction::MoveForward));
    }

    #[test]
    fn restart_reaches_exactly_one_tick() {
        let mut input = InputCollector::new(1280, 720);
        tap(&mut input, KeyCode::KeyR);

        assert!(input.next_tick_input().restart_pressed());
        assert!(!input.next_tick_input().restart_pressed());
    }

    #[test]
    fn key_repeat_does_not_retrigger_one_shots() {
        let mut input = InputCollector::new(1280, 720);

        key(&mut input, KeyCode::KeyR, ElementState::Pressed);
        assert!(input.next_tick_input().restart_pressed());
        key(&mut input, KeyCode::KeyR, ElementState::Pressed);
        assert!(!input.next_tick_input().restart_pressed());

        key(&mut input, KeyCode::KeyR, ElementState::Released);
        key(&mut input, KeyCode::KeyR, ElementState::Pressed);
        assert!(input.next_tick_input().restart_pressed());
    }

    #[test]
    fn overlay_toggle_is_taken_once_per_press() {
        let mut input = InputCollector::default();
        key(&mut input, KeyCode::F3, ElementState::Pressed);
        key(&mut input, KeyCode::F3, ElementState::Pressed);

        assert!(input.take_overlay_toggle());
        assert!(!input.take_overlay_toggle());
    }

    #[test]
    fn zoom_keys_and_wheel_sum_until_the_next_tick() {
        let mut input = InputCollector::new(1280, 720);
        tap(&mut input, KeyCode::Equal);
        tap(&mut input, KeyCode::Equal);
        tap(&mut input, KeyCode::Minus);
        input.handle_mouse_wheel(MouseScrollDelta::LineDelta(0.0, -3.0));

        assert_eq!(input.next_tick_input().zoom_delta_steps(), -2);
        assert_eq!(input.next_tick_input().zoom_delta_steps(), 0);
    }

    #[test]
    fn pixel_wheel_counts_one_step_by_sign() {
        let pixels = |y: f64| {
            wheel_zoom_steps(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, y)))
        };
        assert_eq!(pixels(40.0), 1);
        assert_eq!(pixels(-0.5), -1);
        assert_eq!(pixels(0.0), 0);
    }

    #[test]
    fn escape_latches_quit() {
        let mut input = InputCollector::default();
        tap(&mut input, KeyCode::Escape);

        assert!(input.quit_requested());
        assert!(input.next_tick_input().quit_requested());
        assert!(!input.next_tick_input().is_down(InputAction::Quit));
    }

    #[test]
    fn resize_updates_tick_window_size() {
        let mut input = InputCollector::new(1280, 720);
        input.set_window_size(800, 600);
        assert_eq!(input.next_tick_input().window_size(), (800, 600));
    }
}
