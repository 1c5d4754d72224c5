use engine::Vec3;
use tracing::{info, warn};

use super::effects::{Effect, EffectDispatcher, ObjectiveSink, TransitionEvent};
use super::registry::{Appearance, WorldObject, WorldObjectId, WorldObjectRegistry};
use super::state::{GameState, Objective, TaskState};

pub(crate) const COMPLETION_RADIUS: f32 = 3.0;
pub(crate) const CRYSTAL_OFFSET: Vec3 = Vec3::new(1.5, -1.0, 0.0);

/// Checks the single guard of the current task against the player position.
/// The radius and the crystal offset are fixed; world config cannot move them.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ProximityEvaluator {
    dispatcher: EffectDispatcher,
}

impl ProximityEvaluator {
    pub(crate) fn completion_radius(&self) -> f32 {
        COMPLETION_RADIUS
    }

    /// The transition the current guard would fire for `player`, if any. Reads only.
    pub(crate) fn evaluate(&self, player: Vec3, state: &GameState) -> Option<TransitionEvent> {
        let registry = &state.registry;
        let from = state.machine.current();
        match from {
            TaskState::AwaitingShrine => {
                let shrine = guard_target(registry, WorldObjectId::Shrine, from)?;
                if !self.is_within(player, shrine) {
                    return None;
                }
                let mut effects = vec![Effect::SetAppearance {
                    object: WorldObjectId::Shrine,
                    appearance: Appearance::SolidGreen,
                }];
                let crystal_hidden = registry
                    .get(WorldObjectId::Crystal)
                    .map_or(true, |crystal| !crystal.visible);
                if crystal_hidden {
                    effects.push(Effect::SetPosition {
                        object: WorldObjectId::Crystal,
                        position: shrine.position + CRYSTAL_OFFSET,
                    });
                    effects.push(Effect::SetVisible {
                        object: WorldObjectId::Crystal,
                        visible: true,
                    });
                }
                effects.push(Effect::SetObjective(Objective::CollectCrystal));
                Some(transition(from, TaskState::AwaitingCrystal, effects))
            }
            TaskState::AwaitingCrystal => {
                let crystal = guard_target(registry, WorldObjectId::Crystal, from)?;
                if !crystal.visible || !self.is_within(player, crystal) {
                    return None;
                }
                Some(transition(
                    from,
                    TaskState::AwaitingDelivery,
                    vec![
                        Effect::SetVisible {
                            object: WorldObjectId::Crystal,
                            visible: false,
                        },
                        Effect::SetObjective(Objective::DeliverCrystal),
                    ],
                ))
            }
            TaskState::AwaitingDelivery => {
                if !state.machine.inventory().has_crystal() {
                    return None;
                }
                let elder = guard_target(registry, WorldObjectId::Elder, from)?;
                if !self.is_within(player, elder) {
                    return None;
                }
                Some(transition(
                    from,
                    TaskState::Complete,
                    vec![
                        Effect::SetAppearance {
                            object: WorldObjectId::Elder,
                            appearance: Appearance::LighterGrey,
                        },
                        Effect::SetObjective(Objective::Complete),
                    ],
                ))
            }
            TaskState::Complete => None,
        }
    }

    /// Evaluates and, when a guard passes, commits the transition and applies its
    /// effects in the same call. Does nothing until the world is ready.
    pub(crate) fn tick(
        &self,
        player: Vec3,
        state: &mut GameState,
        objective_sink: &mut dyn ObjectiveSink,
    ) -> Option<TransitionEvent> {
        if !state.is_world_ready() {
            return None;
        }
        let event = self.evaluate(player, state)?;
        if let Err(error) = state.machine.commit(&event) {
            warn!(error = %error, "task_transition_rejected");
            return None;
        }
        let report = self
            .dispatcher
            .dispatch(&event, &mut state.registry, objective_sink);
        info!(
            from = event.from.ordinal(),
            to = event.to.ordinal(),
            effects_applied = report.applied,
            effects_failed = report.failed,
            "task_transition"
        );
        Some(event)
    }

    /// Distance to whatever the current task points at. `None` when there is nothing
    /// to walk to.
    pub(crate) fn objective_distance(&self, player: Vec3, state: &GameState) -> Option<f32> {
        let target = match state.machine.current() {
            TaskState::AwaitingShrine => WorldObjectId::Shrine,
            TaskState::AwaitingCrystal => WorldObjectId::Crystal,
            TaskState::AwaitingDelivery => WorldObjectId::Elder,
            TaskState::Complete => return None,
        };
        let object = state.registry.get(target).ok()?;
        object
            .visible
            .then(|| player.distance(object.position))
    }

    fn is_within(&self, player: Vec3, target: &WorldObject) -> bool {
        player.distance(target.position) < COMPLETION_RADIUS
    }
}

fn guard_target(
    registry: &WorldObjectRegistry,
    id: WorldObjectId,
    state: TaskState,
) -> Option<&WorldObject> {
    match registry.get(id) {
        Ok(object) => Some(object),
        Err(error) => {
            warn!(state = ?state, error = %error, "guard_target_missing");
            None
        }
    }
}

fn transition(from: TaskState, to: TaskState, effects: Vec<Effect>) -> TransitionEvent {
    TransitionEvent { from, to, effects }
}
