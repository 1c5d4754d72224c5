use std::collections::BTreeMap;
use std::fmt;

use engine::Vec3;
use thiserror::Error;

use super::config::WorldConfig;
use super::evaluator::CRYSTAL_OFFSET;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum WorldObjectId {
    Shrine,
    Crystal,
    Village,
    Elder,
}

impl WorldObjectId {
    #[cfg(test)]
    pub(crate) const ALL: [Self; 4] = [Self::Shrine, Self::Crystal, Self::Village, Self::Elder];

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Shrine => "shrine",
            Self::Crystal => "crystal",
            Self::Village => "village",
            Self::Elder => "elder",
        }
    }
}

impl fmt::Display for WorldObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Material id handed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Appearance {
    ShrineStone,
    SolidGreen,
    CrystalBlue,
    VillageTimber,
    ElderGrey,
    LighterGrey,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WorldObject {
    pub(crate) id: WorldObjectId,
    pub(crate) position: Vec3,
    pub(crate) visible: bool,
    pub(crate) appearance: Appearance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(crate) enum RegistryError {
    #[error("world object '{0}' is not registered")]
    MissingObject(WorldObjectId),
}

/// Task-relevant world objects. Objects are never removed once registered;
/// every setter that changes a value queues the id on the change feed.
#[derive(Debug, Clone, Default)]
pub(crate) struct WorldObjectRegistry {
    objects: BTreeMap<WorldObjectId, WorldObject>,
    changes: Vec<WorldObjectId>,
}

impl WorldObjectRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_config(config: &WorldConfig) -> Self {
        let mut registry = Self::new();
        registry.insert(WorldObject {
            id: WorldObjectId::Shrine,
            position: config.shrine,
            visible: true,
            appearance: Appearance::ShrineStone,
        });
        registry.insert(WorldObject {
            id: WorldObjectId::Crystal,
            position: config.shrine + CRYSTAL_OFFSET,
            visible: false,
            appearance: Appearance::CrystalBlue,
        });
        registry.insert(WorldObject {
            id: WorldObjectId::Village,
            position: config.village,
            visible: true,
            appearance: Appearance::VillageTimber,
        });
        registry.insert(WorldObject {
            id: WorldObjectId::Elder,
            position: config.elder,
            visible: true,
            appearance: Appearance::ElderGrey,
        });
        registry
    }

    pub(crate) fn insert(&mut self, object: WorldObject) {
        let id = object.id;
        self.objects.insert(id, object);
        self.record_change(id);
    }

    pub(crate) fn get(&self, id: WorldObjectId) -> Result<&WorldObject, RegistryError> {
        self.objects.get(&id).ok_or(RegistryError::MissingObject(id))
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &WorldObject> {
        self.objects.values()
    }

    /// Returns whether the value changed.
    pub(crate) fn set_visible(
        &mut self,
        id: WorldObjectId,
        visible: bool,
    ) -> Result<bool, RegistryError> {
        self.update(id, |object| {
            if object.visible == visible {
                return false;
            }
            object.visible = visible;
            true
        })
    }

    pub(crate) fn set_position(
        &mut self,
        id: WorldObjectId,
        position: Vec3,
    ) -> Result<bool, RegistryError> {
        self.update(id, |object| {
            if object.position == position {
                return false;
            }
            object.position = position;
            true
        })
    }

    pub(crate) fn set_appearance(
        &mut self,
        id: WorldObjectId,
        appearance: Appearance,
    ) -> Result<bool, RegistryError> {
        self.update(id, |object| {
            if object.appearance == appearance {
                return false;
            }
            object.appearance = appearance;
            true
        })
    }

    /// Drains the ids changed since the last call, each at most once, in first-change order.
    pub(crate) fn take_changes(&mut self) -> Vec<WorldObjectId> {
        std::mem::take(&mut self.changes)
    }

    #[cfg(test)]
    pub(crate) fn has_pending_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    fn update(
        &mut self,
        id: WorldObjectId,
        apply: impl FnOnce(&mut WorldObject) -> bool,
    ) -> Result<bool, RegistryError> {
        let object = self
            .objects
            .get_mut(&id)
            .ok_or(RegistryError::MissingObject(id))?;
        let changed = apply(object);
        if changed {
            self.record_change(id);
        }
        Ok(changed)
    }

    fn record_change(&mut self, id: WorldObjectId) {
        if !self.changes.contains(&id) {
            self.changes.push(id);
        }
    }
}
