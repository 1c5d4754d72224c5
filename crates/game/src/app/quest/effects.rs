use engine::Vec3;
use thiserror::Error;
use tracing::warn;

use super::registry::{Appearance, RegistryError, WorldObjectId, WorldObjectRegistry};
use super::state::{Objective, TaskState};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Effect {
    SetVisible {
        object: WorldObjectId,
        visible: bool,
    },
    SetPosition {
        object: WorldObjectId,
        position: Vec3,
    },
    SetAppearance {
        object: WorldObjectId,
        appearance: Appearance,
    },
    SetObjective(Objective),
}

impl Effect {
    fn targets_world(&self) -> bool {
        !matches!(self, Self::SetObjective(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TransitionEvent {
    pub(crate) from: TaskState,
    pub(crate) to: TaskState,
    pub(crate) effects: Vec<Effect>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum HudError {
    #[error("objective display is not attached")]
    Detached,
}

/// Where objective text ends up. The scene writes it into the engine HUD.
pub(crate) trait ObjectiveSink {
    fn show_objective(&mut self, objective: Objective) -> Result<(), HudError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct DispatchReport {
    pub(crate) applied: usize,
    pub(crate) failed: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct EffectDispatcher;

impl EffectDispatcher {
    /// Applies every effect of `event`. World effects land before objective text so
    /// the HUD never describes a world the registry has not reached yet. Failures are
    /// logged and skipped.
    pub(crate) fn dispatch(
        &self,
        event: &TransitionEvent,
        registry: &mut WorldObjectRegistry,
        sink: &mut dyn ObjectiveSink,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();

        for effect in application_order(&event.effects) {
            match apply_effect(effect, registry, sink) {
                Ok(()) => report.applied += 1,
                Err(error) => {
                    report.failed += 1;
                    warn!(
                        from = ?event.from,
                        to = ?event.to,
                        effect = ?effect,
                        error = %error,
                        "effect_failed"
                    );
                }
            }
        }

        report
    }
}

fn application_order(effects: &[Effect]) -> impl Iterator<Item = &Effect> {
    let world_effects = effects.iter().filter(|effect| effect.targets_world());
    let hud_effects = effects.iter().filter(|effect| !effect.targets_world());
    world_effects.chain(hud_effects)
}

#[derive(Debug, Error)]
enum EffectError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Hud(#[from] HudError),
}

fn apply_effect(
    effect: &Effect,
    registry: &mut WorldObjectRegistry,
    sink: &mut dyn ObjectiveSink,
) -> Result<(), EffectError> {
    match *effect {
        Effect::SetVisible { object, visible } => {
            registry.set_visible(object, visible)?;
        }
        Effect::SetPosition { object, position } => {
            registry.set_position(object, position)?;
        }
        Effect::SetAppearance { object, appearance } => {
            registry.set_appearance(object, appearance)?;
        }
        Effect::SetObjective(objective) => sink.show_objective(objective)?,
    }
    Ok(())
}
