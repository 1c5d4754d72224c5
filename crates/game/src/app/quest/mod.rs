//! Quest core: the task chain, its proximity guards and the world objects they touch.
//! Nothing in here knows about windows or frames; the scene feeds it a player position.

mod config;
mod effects;
mod evaluator;
mod registry;
mod state;

pub(crate) use config::{load_world_config, WorldConfig, WorldConfigError};
pub(crate) use effects::{HudError, ObjectiveSink};
pub(crate) use evaluator::ProximityEvaluator;
pub(crate) use registry::{Appearance, WorldObject, WorldObjectId};
pub(crate) use state::{GameState, Objective};

#[cfg(test)]
pub(crate) use state::TaskState;
