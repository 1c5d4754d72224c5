use std::collections::BTreeMap;

use engine::{
    EntityId, InputSnapshot, RenderShape, RenderableDesc, Scene, SceneCommand, SceneWorld,
    Transform, Vec3,
};
use tracing::{info, warn};

use super::quest::{
    Appearance, GameState, HudError, Objective, ObjectiveSink, ProximityEvaluator, WorldConfig,
    WorldObject, WorldObjectId,
};

mod movement;

use movement::{step_player, MoveSpeeds};

const PLAYER_COLOR: [u8; 4] = [236, 196, 72, 255];
const PLAYER_HALF_EXTENT: f32 = 0.5;

/// Binds the quest core to the engine: owns the game state, moves the player and
/// mirrors registry changes onto scene entities.
pub(crate) struct QuestScene {
    config: WorldConfig,
    evaluator: ProximityEvaluator,
    game: GameState,
    player_id: Option<EntityId>,
    object_entities: BTreeMap<WorldObjectId, EntityId>,
}

impl QuestScene {
    pub(crate) fn new(config: WorldConfig) -> Self {
        Self {
            evaluator: ProximityEvaluator::default(),
            game: GameState::from_config(&config),
            config,
            player_id: None,
            object_entities: BTreeMap::new(),
        }
    }

    fn move_speeds(&self) -> MoveSpeeds {
        MoveSpeeds {
            ground: self.config.player_speed,
            vertical: self.config.vertical_speed,
        }
    }

    fn player_position(&self, world: &SceneWorld) -> Option<Vec3> {
        self.player_id
            .and_then(|id| world.find_entity(id))
            .map(|entity| entity.transform.position)
    }

    /// Pushes every registry change since the last sync onto the matching entity.
    fn sync_world_objects(&mut self, world: &mut SceneWorld) {
        for id in self.game.registry.take_changes() {
            let Ok(object) = self.game.registry.get(id) else {
                continue;
            };
            let Some(entity) = self
                .object_entities
                .get(&id)
                .and_then(|entity_id| world.find_entity_mut(*entity_id))
            else {
                warn!(object = %id, "world_object_entity_missing");
                continue;
            };
            entity.transform.position = object.position;
            entity.visible = object.visible;
            entity.renderable.color = appearance_color(object.appearance);
        }
    }

    #[cfg(test)]
    pub(crate) fn game(&self) -> &GameState {
        &self.game
    }

    #[cfg(test)]
    pub(crate) fn player_id(&self) -> Option<EntityId> {
        self.player_id
    }

    #[cfg(test)]
    pub(crate) fn entity_for(&self, id: WorldObjectId) -> Option<EntityId> {
        self.object_entities.get(&id).copied()
    }
}

impl Scene for QuestScene {
    fn load(&mut self, world: &mut SceneWorld) {
        self.game = GameState::from_config(&self.config);
        self.object_entities.clear();

        let spawn = Vec3::new(
            self.config.player_spawn.x,
            self.config.player_spawn.y.max(self.config.ground_height),
            self.config.player_spawn.z,
        );
        self.player_id = Some(world.spawn(
            Transform { position: spawn },
            RenderableDesc {
                shape: RenderShape::Ring,
                color: PLAYER_COLOR,
                half_extent: PLAYER_HALF_EXTENT,
                debug_name: "player",
            },
        ));
        world.camera_mut().target = spawn;

        for object in self.game.registry.iter() {
            let transform = Transform {
                position: object.position,
            };
            let renderable = renderable_for(object);
            let entity_id = if object.visible {
                world.spawn(transform, renderable)
            } else {
                world.spawn_hidden(transform, renderable)
            };
            self.object_entities.insert(object.id, entity_id);
        }
        // Entities were spawned from the current registry values.
        self.game.registry.take_changes();

        info!(
            objects = self.object_entities.len(),
            task = self.game.machine.current().ordinal(),
            "quest_loaded"
        );
    }

    fn world_ready(&mut self, world: &mut SceneWorld) {
        self.game.mark_world_ready();
        let objective = self.game.objective();
        if let Err(error) = (SceneHud { world: &mut *world }).show_objective(objective) {
            warn!(error = %error, "objective_display_failed");
        }
        info!(task = self.game.machine.current().ordinal(), "world_ready");
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        if input.restart_pressed() {
            info!(
                task = self.game.machine.current().ordinal(),
                "quest_restarted"
            );
            return SceneCommand::Restart;
        }

        let speeds = self.move_speeds();
        let ground_height = self.config.ground_height;
        let Some(player) = self.player_id.and_then(|id| world.find_entity_mut(id)) else {
            return SceneCommand::None;
        };
        let position = step_player(
            player.transform.position,
            input,
            fixed_dt_seconds,
            speeds,
            ground_height,
        );
        player.transform.position = position;

        let camera = world.camera_mut();
        camera.target = position;
        camera.apply_zoom_steps(input.zoom_delta_steps());

        self.evaluator
            .tick(position, &mut self.game, &mut SceneHud { world: &mut *world });
        self.sync_world_objects(world);

        SceneCommand::None
    }

    fn unload(&mut self, world: &mut SceneWorld) {
        if let Err(error) = (SceneHud { world }).show_objective(Objective::None) {
            warn!(error = %error, "objective_display_failed");
        }
        self.player_id = None;
        self.object_entities.clear();
        info!("quest_unloaded");
    }

    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        let task = self.game.machine.current();
        Some(if task.is_terminal() {
            "Shrine Quest | complete".to_string()
        } else {
            format!("Shrine Quest | task {}/3", task.ordinal())
        })
    }

    fn debug_lines(&self, world: &SceneWorld) -> Vec<String> {
        let machine = &self.game.machine;
        let mut lines = vec![
            format!("task: {:?}", machine.current()),
            format!("crystal: {}", machine.inventory().has_crystal()),
            format!("radius: {:.1}", self.evaluator.completion_radius()),
        ];
        if let Some(position) = self.player_position(world) {
            lines.push(format!(
                "player: {:.1} {:.1} {:.1}",
                position.x, position.y, position.z
            ));
            if let Some(distance) = self.evaluator.objective_distance(position, &self.game) {
                lines.push(format!("target: {distance:.1}"));
            }
        }
        lines
    }
}

/// Objective sink that writes into the engine's HUD banner.
struct SceneHud<'a> {
    world: &'a mut SceneWorld,
}

impl ObjectiveSink for SceneHud<'_> {
    fn show_objective(&mut self, objective: Objective) -> Result<(), HudError> {
        self.world.set_hud_text(Some(objective.text().to_string()));
        Ok(())
    }
}

fn renderable_for(object: &WorldObject) -> RenderableDesc {
    let (shape, half_extent, debug_name) = match object.id {
        WorldObjectId::Shrine => (RenderShape::Square, 1.0, "shrine"),
        WorldObjectId::Crystal => (RenderShape::Diamond, 0.6, "crystal"),
        WorldObjectId::Village => (RenderShape::Square, 3.0, "village"),
        WorldObjectId::Elder => (RenderShape::Ring, 0.7, "elder"),
    };
    RenderableDesc {
        shape,
        color: appearance_color(object.appearance),
        half_extent,
        debug_name,
    }
}

fn appearance_color(appearance: Appearance) -> [u8; 4] {
    match appearance {
        Appearance::ShrineStone => [128, 124, 116, 255],
        Appearance::SolidGreen => [60, 200, 90, 255],
        Appearance::CrystalBlue => [80, 160, 255, 255],
        Appearance::VillageTimber => [139, 98, 60, 255],
        Appearance::ElderGrey => [110, 110, 118, 255],
        Appearance::LighterGrey => [200, 200, 208, 255],
    }
}
