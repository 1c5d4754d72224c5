use thiserror::Error;

use super::config::WorldConfig;
use super::effects::TransitionEvent;
use super::registry::WorldObjectRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum TaskState {
    AwaitingShrine,
    AwaitingCrystal,
    AwaitingDelivery,
    Complete,
}

impl TaskState {
    pub(crate) const INITIAL: Self = Self::AwaitingShrine;

    /// Task number shown to the player, 1 through 4.
    pub(crate) fn ordinal(self) -> u8 {
        match self {
            Self::AwaitingShrine => 1,
            Self::AwaitingCrystal => 2,
            Self::AwaitingDelivery => 3,
            Self::Complete => 4,
        }
    }

    pub(crate) fn objective(self) -> Objective {
        match self {
            Self::AwaitingShrine => Objective::FindShrine,
            Self::AwaitingCrystal => Objective::CollectCrystal,
            Self::AwaitingDelivery => Objective::DeliverCrystal,
            Self::Complete => Objective::Complete,
        }
    }

    pub(crate) fn is_terminal(self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// One of the fixed HUD objective lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Objective {
    None,
    FindShrine,
    CollectCrystal,
    DeliverCrystal,
    Complete,
}

impl Objective {
    pub(crate) fn text(self) -> &'static str {
        match self {
            Self::None => "",
            Self::FindShrine => "Task 1: Find the Ancient Shrine (Stone Pillar)",
            Self::CollectCrystal => "Task 2: Collect the Sacred Crystal (Blue Crystal)",
            Self::DeliverCrystal => "Task 3: Deliver the Crystal to the Village Elder",
            Self::Complete => "All tasks complete! The village thanks you.",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct PlayerInventory {
    has_crystal: bool,
}

impl PlayerInventory {
    pub(crate) fn has_crystal(self) -> bool {
        self.has_crystal
    }

    /// The crystal is carried exactly while it is being delivered.
    fn for_state(state: TaskState) -> Self {
        Self {
            has_crystal: state == TaskState::AwaitingDelivery,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(crate) enum CommitError {
    #[error("stale transition from {event_from:?}; machine is in {current:?}")]
    StaleEvent {
        event_from: TaskState,
        current: TaskState,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TaskStateMachine {
    current: TaskState,
    inventory: PlayerInventory,
}

impl Default for TaskStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStateMachine {
    pub(crate) fn new() -> Self {
        Self {
            current: TaskState::INITIAL,
            inventory: PlayerInventory::default(),
        }
    }

    /// Resumes at an arbitrary state. An inventory that holds the crystal outside
    /// of delivery is dropped so the machine never carries it in another state.
    #[cfg(test)]
    pub(crate) fn resume_at(current: TaskState, has_crystal: bool) -> Self {
        Self {
            current,
            inventory: PlayerInventory {
                has_crystal: has_crystal && current == TaskState::AwaitingDelivery,
            },
        }
    }

    pub(crate) fn current(&self) -> TaskState {
        self.current
    }

    pub(crate) fn inventory(&self) -> PlayerInventory {
        self.inventory
    }

    /// Moves to `event.to`. State and inventory change together.
    pub(crate) fn commit(&mut self, event: &TransitionEvent) -> Result<(), CommitError> {
        if event.from != self.current {
            return Err(CommitError::StaleEvent {
                event_from: event.from,
                current: self.current,
            });
        }
        self.current = event.to;
        self.inventory = PlayerInventory::for_state(event.to);
        Ok(())
    }
}

/// Everything the quest core mutates. Owned by the scene and passed explicitly.
#[derive(Debug, Clone)]
pub(crate) struct GameState {
    pub(crate) machine: TaskStateMachine,
    pub(crate) registry: WorldObjectRegistry,
    world_ready: bool,
}

impl GameState {
    pub(crate) fn new(registry: WorldObjectRegistry) -> Self {
        Self {
            machine: TaskStateMachine::new(),
            registry,
            world_ready: false,
        }
    }

    pub(crate) fn from_config(config: &WorldConfig) -> Self {
        Self::new(WorldObjectRegistry::from_config(config))
    }

    pub(crate) fn mark_world_ready(&mut self) {
        self.world_ready = true;
    }

    pub(crate) fn is_world_ready(&self) -> bool {
        self.world_ready
    }

    pub(crate) fn objective(&self) -> Objective {
        self.machine.current().objective()
    }
}
