use std::ops::{Add, Mul, Sub};

use serde::Deserialize;

use super::input::{ActionStates, InputAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Restart,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    restart_pressed: bool,
    actions: ActionStates,
    zoom_delta_steps: i32,
    window_width: u32,
    window_height: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(
        quit_requested: bool,
        restart_pressed: bool,
        actions: ActionStates,
        zoom_delta_steps: i32,
        window_width: u32,
        window_height: u32,
    ) -> Self {
        Self {
            quit_requested,
            restart_pressed,
            actions,
            zoom_delta_steps,
            window_width,
            window_height,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn restart_pressed(&self) -> bool {
        self.restart_pressed
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_restart_pressed(mut self, restart_pressed: bool) -> Self {
        self.restart_pressed = restart_pressed;
        self
    }

    pub fn with_zoom_delta_steps(mut self, zoom_delta_steps: i32) -> Self {
        self.zoom_delta_steps = zoom_delta_steps;
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_width = window_size.0;
        self.window_height = window_size.1;
        self
    }

    pub fn zoom_delta_steps(&self) -> i32 {
        self.zoom_delta_steps
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub u64);

/// World-space vector. Y is up; the ground plane is X/Z.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

pub const CAMERA_ZOOM_DEFAULT: f32 = 1.0;
pub const CAMERA_ZOOM_MIN: f32 = 0.5;
pub const CAMERA_ZOOM_MAX: f32 = 2.5;
pub const CAMERA_ZOOM_STEP: f32 = 0.1;

/// Top-down follow camera. `target` is the world point drawn at the viewport center.
#[derive(Debug, Clone, Copy)]
pub struct CameraRig {
    pub target: Vec3,
    pub zoom: f32,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            zoom: CAMERA_ZOOM_DEFAULT,
        }
    }
}

impl CameraRig {
    pub fn effective_zoom(&self) -> f32 {
        clamp_camera_zoom(self.zoom)
    }

    pub fn set_zoom_clamped(&mut self, zoom: f32) {
        self.zoom = clamp_camera_zoom(zoom);
    }

    pub fn apply_zoom_steps(&mut self, steps: i32) {
        if steps == 0 {
            return;
        }
        let target_zoom = self.zoom + steps as f32 * CAMERA_ZOOM_STEP;
        self.set_zoom_clamped(target_zoom);
    }
}

fn clamp_camera_zoom(zoom: f32) -> f32 {
    if !zoom.is_finite() {
        return CAMERA_ZOOM_DEFAULT;
    }
    zoom.clamp(CAMERA_ZOOM_MIN, CAMERA_ZOOM_MAX)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Transform {
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderShape {
    Square,
    Diamond,
    Ring,
}

#[derive(Debug, Clone)]
pub struct RenderableDesc {
    pub shape: RenderShape,
    pub color: [u8; 4],
    /// Footprint half-extent in world units at ground height.
    pub half_extent: f32,
    pub debug_name: &'static str,
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub transform: Transform,
    pub renderable: RenderableDesc,
    pub visible: bool,
    applied_spawn_order: u64,
}

impl Entity {
    pub fn applied_spawn_order(&self) -> u64 {
        self.applied_spawn_order
    }
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Entity store a scene mutates during `update`. Spawns and despawns are deferred
/// until `apply_pending` so a tick never observes a half-applied change.
#[derive(Debug, Default)]
pub struct SceneWorld {
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    pending_spawns: Vec<Entity>,
    pending_despawns: Vec<EntityId>,
    next_applied_spawn_order: u64,
    camera: CameraRig,
    hud_text: Option<String>,
}

impl SceneWorld {
    pub fn spawn(&mut self, transform: Transform, renderable: RenderableDesc) -> EntityId {
        self.spawn_internal(transform, renderable, true)
    }

    pub fn spawn_hidden(&mut self, transform: Transform, renderable: RenderableDesc) -> EntityId {
        self.spawn_internal(transform, renderable, false)
    }

    fn spawn_internal(
        &mut self,
        transform: Transform,
        renderable: RenderableDesc,
        visible: bool,
    ) -> EntityId {
        let id = self.allocator.allocate();
        self.pending_spawns.push(Entity {
            id,
            transform,
            renderable,
            visible,
            applied_spawn_order: 0,
        });
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> bool {
        let exists_now = self.entities.iter().any(|entity| entity.id == id);
        let pending_spawn = self.pending_spawns.iter().any(|entity| entity.id == id);
        if !exists_now && !pending_spawn {
            return false;
        }
        self.pending_despawns.push(id);
        true
    }

    pub fn apply_pending(&mut self) {
        if !self.pending_despawns.is_empty() {
            self.pending_despawns.sort_by_key(|id| id.0);
            self.pending_despawns.dedup();
            let pending = &self.pending_despawns;
            self.entities.retain(|entity| {
                pending
                    .binary_search_by_key(&entity.id.0, |id| id.0)
                    .is_err()
            });
            self.pending_spawns.retain(|entity| {
                pending
                    .binary_search_by_key(&entity.id.0, |id| id.0)
                    .is_err()
            });
            self.pending_despawns.clear();
        }

        for mut entity in self.pending_spawns.drain(..) {
            entity.applied_spawn_order = self.next_applied_spawn_order;
            self.next_applied_spawn_order = self.next_applied_spawn_order.saturating_add(1);
            self.entities.push(entity);
        }
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.pending_spawns.clear();
        self.pending_despawns.clear();
        self.next_applied_spawn_order = 0;
        self.camera = CameraRig::default();
        self.hud_text = None;
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn visible_entity_count(&self) -> usize {
        self.entities.iter().filter(|entity| entity.visible).count()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraRig {
        &mut self.camera
    }

    pub fn set_hud_text(&mut self, text: Option<String>) {
        self.hud_text = text.filter(|value| !value.is_empty());
    }

    pub fn hud_text(&self) -> Option<&str> {
        self.hud_text.as_deref()
    }
}

pub trait Scene {
    fn load(&mut self, world: &mut SceneWorld);
    /// Called once per load, after the loaded entities have been applied.
    fn world_ready(&mut self, _world: &mut SceneWorld) {}
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand;
    fn unload(&mut self, world: &mut SceneWorld);
    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
    fn debug_lines(&self, _world: &SceneWorld) -> Vec<String> {
        Vec::new()
    }
}

pub(crate) struct SceneRuntime {
    scene: Box<dyn Scene>,
    world: SceneWorld,
    is_loaded: bool,
}

impl SceneRuntime {
    pub(crate) fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            scene,
            world: SceneWorld::default(),
            is_loaded: false,
        }
    }

    pub(crate) fn load(&mut self) {
        if self.is_loaded {
            return;
        }
        self.scene.load(&mut self.world);
        self.world.apply_pending();
        self.scene.world_ready(&mut self.world);
        self.is_loaded = true;
    }

    pub(crate) fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand {
        if !self.is_loaded {
            return SceneCommand::None;
        }
        let command = self.scene.update(fixed_dt_seconds, input, &mut self.world);
        self.world.apply_pending();
        command
    }

    pub(crate) fn restart(&mut self) {
        if self.is_loaded {
            self.scene.unload(&mut self.world);
        }
        self.world.clear();
        self.is_loaded = false;
        self.load();
    }

    pub(crate) fn shutdown(&mut self) {
        if self.is_loaded {
            self.scene.unload(&mut self.world);
            self.world.clear();
            self.is_loaded = false;
        }
    }

    pub(crate) fn world(&self) -> &SceneWorld {
        &self.world
    }

    #[cfg(test)]
    pub(crate) fn world_mut(&mut self) -> &mut SceneWorld {
        &mut self.world
    }

    pub(crate) fn debug_title(&self) -> Option<String> {
        self.scene.debug_title(&self.world)
    }

    pub(crate) fn debug_lines(&self) -> Vec<String> {
        self.scene.debug_lines(&self.world)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn placeholder(debug_name: &'static str) -> RenderableDesc {
        RenderableDesc {
            shape: RenderShape::Square,
            color: [255, 255, 255, 255],
            half_extent: 0.5,
            debug_name,
        }
    }

    #[derive(Default)]
    struct Calls {
        loads: u32,
        readies: u32,
        updates: u32,
        unloads: u32,
        ready_saw_entities: Vec<usize>,
    }

    struct TestScene {
        spawn_count: usize,
        calls: Rc<RefCell<Calls>>,
        command: SceneCommand,
    }

    impl Scene for TestScene {
        fn load(&mut self, world: &mut SceneWorld) {
            self.calls.borrow_mut().loads += 1;
            for _ in 0..self.spawn_count {
                world.spawn(Transform::default(), placeholder("test"));
            }
        }

        fn world_ready(&mut self, world: &mut SceneWorld) {
            let mut calls = self.calls.borrow_mut();
            calls.readies += 1;
            calls.ready_saw_entities.push(world.entity_count());
        }

        fn update(
            &mut self,
            _fixed_dt_seconds: f32,
            _input: &InputSnapshot,
            world: &mut SceneWorld,
        ) -> SceneCommand {
            self.calls.borrow_mut().updates += 1;
            world.spawn(Transform::default(), placeholder("per_tick"));
            self.command
        }

        fn unload(&mut self, _world: &mut SceneWorld) {
            self.calls.borrow_mut().unloads += 1;
        }
    }

    fn runtime_with(spawn_count: usize) -> (SceneRuntime, Rc<RefCell<Calls>>) {
        let calls = Rc::new(RefCell::new(Calls::default()));
        let scene = TestScene {
            spawn_count,
            calls: Rc::clone(&calls),
            command: SceneCommand::None,
        };
        (SceneRuntime::new(Box::new(scene)), calls)
    }

    #[test]
    fn vec3_distance_is_euclidean() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 6.0, 3.0);
        assert!((a.distance(b) - 5.0).abs() < 1e-6);
        assert_eq!(a.distance(a), 0.0);
    }

    #[test]
    fn vec3_arithmetic_is_componentwise() {
        let a = Vec3::new(15.0, 5.0, 20.0);
        let offset = Vec3::new(1.5, -1.0, 0.0);
        assert_eq!(a + offset, Vec3::new(16.5, 4.0, 20.0));
        assert_eq!(a - a, Vec3::ZERO);
        assert_eq!(offset * 2.0, Vec3::new(3.0, -2.0, 0.0));
    }

    #[test]
    fn vec3_is_finite_rejects_nan_and_infinity() {
        assert!(Vec3::new(0.0, 1.0, 2.0).is_finite());
        assert!(!Vec3::new(f32::NAN, 0.0, 0.0).is_finite());
        assert!(!Vec3::new(0.0, 0.0, f32::INFINITY).is_finite());
    }

    #[test]
    fn allocator_never_reuses_ids() {
        let mut allocator = EntityIdAllocator::default();
        let a = allocator.allocate();
        let b = allocator.allocate();
        let c = allocator.allocate();
        assert_eq!(a, EntityId(0));
        assert_eq!(b, EntityId(1));
        assert_eq!(c, EntityId(2));
    }

    #[test]
    fn spawn_is_deferred_until_apply_pending() {
        let mut world = SceneWorld::default();
        let id = world.spawn(Transform::default(), placeholder("a"));
        assert_eq!(world.entity_count(), 0);
        assert!(world.find_entity(id).is_none());

        world.apply_pending();
        assert_eq!(world.entity_count(), 1);
        assert!(world.find_entity(id).expect("entity").visible);
    }

    #[test]
    fn spawn_hidden_starts_invisible() {
        let mut world = SceneWorld::default();
        let id = world.spawn_hidden(Transform::default(), placeholder("hidden"));
        world.apply_pending();

        assert!(!world.find_entity(id).expect("entity").visible);
        assert_eq!(world.entity_count(), 1);
        assert_eq!(world.visible_entity_count(), 0);
    }

    #[test]
    fn duplicate_pending_despawns_are_safe_and_idempotent() {
        let mut world = SceneWorld::default();
        let a = world.spawn(Transform::default(), placeholder("a"));
        let b = world.spawn(Transform::default(), placeholder("b"));
        world.apply_pending();

        assert!(world.despawn(a));
        assert!(world.despawn(a));
        world.apply_pending();

        assert_eq!(world.entity_count(), 1);
        assert!(world.find_entity(b).is_some());
        assert!(!world.despawn(a));
    }

    #[test]
    fn despawn_of_pending_spawn_never_materializes() {
        let mut world = SceneWorld::default();
        let id = world.spawn(Transform::default(), placeholder("a"));
        assert!(world.despawn(id));
        world.apply_pending();
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn applied_spawn_order_is_monotonic() {
        let mut world = SceneWorld::default();
        let a = world.spawn(Transform::default(), placeholder("a"));
        world.apply_pending();
        let b = world.spawn(Transform::default(), placeholder("b"));
        world.apply_pending();

        let order_a = world.find_entity(a).expect("a").applied_spawn_order();
        let order_b = world.find_entity(b).expect("b").applied_spawn_order();
        assert!(order_a < order_b);
    }

    #[test]
    fn clear_resets_entities_camera_and_hud() {
        let mut world = SceneWorld::default();
        world.spawn(Transform::default(), placeholder("a"));
        world.apply_pending();
        world.camera_mut().target = Vec3::new(3.0, 0.0, 4.0);
        world.set_hud_text(Some("objective".to_string()));

        world.clear();

        assert_eq!(world.entity_count(), 0);
        assert_eq!(world.camera().target, Vec3::ZERO);
        assert_eq!(world.hud_text(), None);
    }

    #[test]
    fn empty_hud_text_is_stored_as_none() {
        let mut world = SceneWorld::default();
        world.set_hud_text(Some(String::new()));
        assert_eq!(world.hud_text(), None);
        world.set_hud_text(Some("Task".to_string()));
        assert_eq!(world.hud_text(), Some("Task"));
    }

    #[test]
    fn camera_apply_zoom_steps_clamps_at_bounds() {
        let mut camera = CameraRig::default();
        camera.apply_zoom_steps(100);
        assert_eq!(camera.effective_zoom(), CAMERA_ZOOM_MAX);
        camera.apply_zoom_steps(-100);
        assert_eq!(camera.effective_zoom(), CAMERA_ZOOM_MIN);
        camera.set_zoom_clamped(f32::NAN);
        assert_eq!(camera.effective_zoom(), CAMERA_ZOOM_DEFAULT);
    }

    #[test]
    fn load_applies_entities_before_world_ready() {
        let (mut runtime, calls) = runtime_with(3);
        runtime.load();

        let calls = calls.borrow();
        assert_eq!(calls.loads, 1);
        assert_eq!(calls.readies, 1);
        assert_eq!(calls.ready_saw_entities, vec![3]);
    }

    #[test]
    fn load_is_idempotent() {
        let (mut runtime, calls) = runtime_with(1);
        runtime.load();
        runtime.load();
        assert_eq!(calls.borrow().loads, 1);
        assert_eq!(runtime.world().entity_count(), 1);
    }

    #[test]
    fn update_before_load_is_noop() {
        let (mut runtime, calls) = runtime_with(1);
        let command = runtime.update(1.0 / 60.0, &InputSnapshot::empty());
        assert_eq!(command, SceneCommand::None);
        assert_eq!(calls.borrow().updates, 0);
    }

    #[test]
    fn update_applies_pending_spawns_same_tick() {
        let (mut runtime, _calls) = runtime_with(0);
        runtime.load();
        runtime.update(1.0 / 60.0, &InputSnapshot::empty());
        assert_eq!(runtime.world().entity_count(), 1);
    }

    #[test]
    fn restart_unloads_clears_and_reloads() {
        let (mut runtime, calls) = runtime_with(2);
        runtime.load();
        runtime.update(1.0 / 60.0, &InputSnapshot::empty());
        assert_eq!(runtime.world().entity_count(), 3);
        runtime.world_mut().camera_mut().target = Vec3::new(9.0, 0.0, 9.0);

        runtime.restart();

        let calls = calls.borrow();
        assert_eq!(calls.unloads, 1);
        assert_eq!(calls.loads, 2);
        assert_eq!(calls.readies, 2);
        assert_eq!(runtime.world().entity_count(), 2);
        assert_eq!(runtime.world().camera().target, Vec3::ZERO);
    }

    #[test]
    fn shutdown_unloads_only_once() {
        let (mut runtime, calls) = runtime_with(1);
        runtime.load();
        runtime.shutdown();
        runtime.shutdown();
        assert_eq!(calls.borrow().unloads, 1);
        assert_eq!(runtime.world().entity_count(), 0);
    }

    #[test]
    fn input_snapshot_builders_round_trip() {
        let snapshot = InputSnapshot::empty()
            .with_action_down(InputAction::Ascend, true)
            .with_restart_pressed(true)
            .with_zoom_delta_steps(-2)
            .with_window_size((640, 480));

        assert!(snapshot.is_down(InputAction::Ascend));
        assert!(!snapshot.is_down(InputAction::Descend));
        assert!(snapshot.restart_pressed());
        assert!(!snapshot.quit_requested());
        assert_eq!(snapshot.zoom_delta_steps(), -2);
        assert_eq!(snapshot.window_size(), (640, 480));
    }
}
