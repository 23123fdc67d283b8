pub mod collision;
pub mod config;
pub mod input;
pub mod lanes;
pub mod lights;
pub mod models;
pub mod player;
pub mod road;
pub mod scene;
pub mod traffic;

use nalgebra::Point3;
use rand::rngs::SmallRng;

use crate::error::Result;
use crate::game::collision::{Aabb, Collision};
use crate::game::config::{GameConfig, RestartPolicy};
use crate::game::input::FrameInput;
use crate::game::lanes::Direction;
use crate::game::lights::{LightKind, LightOwner, LightTable};
use crate::game::models::{CarModel, ModelLibrary, PLAYER_COLOR};
use crate::game::player::PlayerController;
use crate::game::road::RoadTiler;
use crate::game::scene::{MeshId, ObjectHandle, SceneGraph};
use crate::game::traffic::{EntityId, TrafficPool};

const FRAME_SECONDS: f32 = 0.016;

/// Meshes the scene must provide before the game starts.
#[derive(Clone, Copy, Debug)]
pub struct BuiltinMeshes {
    pub car_placeholder: MeshId,
    pub light_glow: MeshId,
    pub road_tile: MeshId,
}

pub struct Game<S: SceneGraph> {
    scene: S,
    config: GameConfig,
    meshes: BuiltinMeshes,
    player: PlayerController,
    player_model: CarModel,
    player_handle: ObjectHandle,
    traffic: TrafficPool,
    models: ModelLibrary,
    road: RoadTiler,
    lights: LightTable,
    rng: SmallRng,
    frame: u64,
    time: f32,
    score: f32,
    speed_multiplier: f32,
    last_collision: Option<Collision>,
}

impl<S: SceneGraph> Game<S> {
    pub fn new(mut scene: S, config: GameConfig, meshes: BuiltinMeshes, rng: SmallRng) -> Result<Self> {
        config.validate()?;
        let player = PlayerController::new(&config.player)?;
        let player_model = CarModel::placeholder(meshes.car_placeholder, PLAYER_COLOR);
        let player_handle = scene.add_object(player_model.spec(player.position(), 0.0));
        let road = RoadTiler::new(&config.road, meshes.road_tile, &mut scene);

        let mut lights = LightTable::new(meshes.light_glow);
        lights.attach(
            LightOwner::Player,
            LightKind::Taillights,
            &player.bounds(&player_model.bounds),
            &mut scene,
        );

        Ok(Game {
            scene,
            traffic: TrafficPool::new(config.traffic.clone()),
            config,
            meshes,
            player,
            player_model,
            player_handle,
            models: ModelLibrary::new(),
            road,
            lights,
            rng,
            frame: 0,
            time: 0.0,
            score: 0.0,
            speed_multiplier: 1.0,
            last_collision: None,
        })
    }

    /// Run one frame of the simulation.
    pub fn update(&mut self, input: FrameInput) {
        if self.player.is_crashed() {
            if input.restart {
                self.restart();
            }
            // The world stays frozen while crashed; a restart resumes it next frame.
            return;
        }

        self.frame += 1;
        self.time += FRAME_SECONDS;

        self.player.steer(input.left, input.right);
        self.player.update();
        self.sync_player();

        self.road
            .advance(self.config.road.speed * self.speed_multiplier, &mut self.scene);
        self.update_traffic();

        if let Some(hit) = collision::check(&self.player_bounds(), self.traffic.entities()) {
            log::warn!(
                "crashed into {:?} ({:?}, lane {}) at {:?}, score {}",
                hit.entity,
                hit.direction,
                hit.lane,
                hit.point,
                self.score as i32
            );
            self.player.crash();
            self.last_collision = Some(hit);
            return;
        }

        let scoring = &self.config.scoring;
        self.score += scoring.distance_per_frame * self.speed_multiplier;
        self.speed_multiplier =
            (1.0 + self.score * scoring.speed_ramp).min(scoring.max_speed_multiplier);
    }

    fn update_traffic(&mut self) {
        let spawned = self.traffic.try_spawn(
            self.frame,
            self.speed_multiplier,
            &self.models,
            &mut self.scene,
            &mut self.rng,
        );
        if let Some(id) = spawned {
            self.attach_traffic_lights(id);
        }

        self.traffic.advance(self.time, &mut self.scene);
        for entity in self.traffic.entities() {
            self.lights
                .follow(LightOwner::Traffic(entity.id), &entity.bounds, &mut self.scene);
        }

        for id in self.traffic.sweep_despawn(&mut self.scene) {
            self.lights.release(LightOwner::Traffic(id), &mut self.scene);
        }
    }

    fn attach_traffic_lights(&mut self, id: EntityId) {
        if let Some(entity) = self.traffic.get(id) {
            let kind = match entity.direction {
                Direction::Oncoming => LightKind::Headlights,
                Direction::SameDirection => LightKind::Taillights,
            };
            self.lights
                .attach(LightOwner::Traffic(id), kind, &entity.bounds, &mut self.scene);
        }
    }

    fn restart(&mut self) {
        if let Err(err) = self.player.reset(self.config.player.start_lane) {
            log::error!("restart failed: {}", err);
            return;
        }
        self.frame = 0;
        self.score = 0.0;
        self.speed_multiplier = 1.0;
        self.last_collision = None;
        self.traffic.reset_timer(0);

        if self.config.restart_policy == RestartPolicy::ClearTraffic {
            self.traffic.clear(&mut self.scene);
            self.lights.release_traffic(&mut self.scene);
        }
        self.sync_player();
        log::info!(
            "restarted ({:?}), {} cars on the road",
            self.config.restart_policy,
            self.traffic.len()
        );
    }

    fn sync_player(&mut self) {
        self.scene
            .set_transform(self.player_handle, self.player.position(), self.player_model.yaw_offset);
        let bounds = self.player_bounds();
        self.lights.follow(LightOwner::Player, &bounds, &mut self.scene);
    }

    fn player_bounds(&self) -> Aabb {
        self.scene
            .world_bounds_of(self.player_handle)
            .unwrap_or_else(|| self.player.bounds(&self.player_model.bounds))
    }

    /// Hand over the traffic models once they have loaded. Spawning starts
    /// on the next frame.
    pub fn install_models(&mut self, models: ModelLibrary) {
        log::info!(
            "{} traffic models ready ({} placeholders)",
            models.len(),
            models.placeholder_count()
        );
        self.models = models;
    }

    /// Swap the placeholder player car for a loaded model.
    pub fn install_player_model(&mut self, model: CarModel) {
        self.scene.remove_object(self.player_handle);
        self.player_handle = self
            .scene
            .add_object(model.spec(self.player.position(), 0.0));
        self.player_model = model;
        let bounds = self.player_bounds();
        self.lights
            .attach(LightOwner::Player, LightKind::Taillights, &bounds, &mut self.scene);
        log::info!("player model replaced");
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn is_game_over(&self) -> bool {
        self.player.is_crashed()
    }

    pub fn speed_multiplier(&self) -> f32 {
        self.speed_multiplier
    }

    pub fn last_collision(&self) -> Option<&Collision> {
        self.last_collision.as_ref()
    }

    pub fn player(&self) -> &PlayerController {
        &self.player
    }

    pub fn player_position(&self) -> Point3<f32> {
        self.player.position()
    }

    pub fn traffic(&self) -> &TrafficPool {
        &self.traffic
    }

    pub fn road(&self) -> &RoadTiler {
        &self.road
    }

    pub fn lights(&self) -> &LightTable {
        &self.lights
    }

    pub fn meshes(&self) -> BuiltinMeshes {
        self.meshes
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    #[cfg(test)]
    fn place_car(&mut self, lane: usize, z: f32, speed: f32) -> EntityId {
        let model = CarModel::placeholder(self.meshes.car_placeholder, models::FALLBACK_COLORS[0]);
        let id = self.traffic.spawn_at(lane, z, speed, &model, &mut self.scene);
        self.attach_traffic_lights(id);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::models::FALLBACK_COLORS;
    use crate::game::player::DriveState;
    use crate::game::scene::testing::RecordingScene;
    use rand::SeedableRng;

    const MESHES: BuiltinMeshes = BuiltinMeshes {
        car_placeholder: 0,
        light_glow: 1,
        road_tile: 2,
    };

    fn deterministic_config() -> GameConfig {
        let mut config = GameConfig::default();
        config.traffic.spawn_probability = 1.0;
        config.scoring.speed_ramp = 0.0;
        config
    }

    fn game_with(config: GameConfig) -> Game<RecordingScene> {
        let mut game = Game::new(
            RecordingScene::new(),
            config,
            MESHES,
            SmallRng::seed_from_u64(11),
        )
        .unwrap();
        game.install_models(ModelLibrary::ready(
            FALLBACK_COLORS
                .iter()
                .map(|&color| CarModel::placeholder(MESHES.car_placeholder, color))
                .collect(),
        ));
        game
    }

    fn drive(game: &mut Game<RecordingScene>, frames: usize) {
        for _ in 0..frames {
            game.update(FrameInput::default());
        }
    }

    fn left() -> FrameInput {
        FrameInput { left: true, ..FrameInput::default() }
    }

    fn restart() -> FrameInput {
        FrameInput { restart: true, ..FrameInput::default() }
    }

    #[test]
    fn new_game_registers_player_road_and_lights() {
        let game = game_with(deterministic_config());
        // player + 6 road tiles + 2 taillights
        assert_eq!(game.scene().live(), 9);
        assert!(game.lights().has_lights(LightOwner::Player));
        assert_eq!(game.player().current_lane(), 2);
        assert!(!game.is_game_over());
    }

    #[test]
    fn invalid_start_lane_fails_construction() {
        let mut config = GameConfig::default();
        config.player.start_lane = 4;
        let result = Game::new(RecordingScene::new(), config, MESHES, SmallRng::seed_from_u64(1));
        assert!(result.is_err());
    }

    #[test]
    fn negative_speed_jitter_fails_construction() {
        let mut config = deterministic_config();
        config.traffic.speed_jitter = -0.1;
        let result = Game::new(RecordingScene::new(), config, MESHES, SmallRng::seed_from_u64(1));
        assert!(matches!(
            result.err(),
            Some(crate::error::GameError::InvalidConfig { field: "traffic.speed_jitter", .. })
        ));
    }

    #[test]
    fn exact_overlap_with_same_direction_car_crashes() {
        let mut game = game_with(deterministic_config());
        let car = game.place_car(2, 0.0, 0.0);

        game.update(FrameInput::default());

        assert_eq!(game.player().state(), DriveState::Crashed);
        let hit = game.last_collision().unwrap();
        assert_eq!(hit.entity, car);
        assert_eq!(hit.direction, Direction::SameDirection);
        assert!((hit.point.x - 1.5).abs() < 1e-5);
        assert_eq!(game.score(), 0.0);
    }

    #[test]
    fn car_in_another_lane_does_not_crash() {
        let mut game = game_with(deterministic_config());
        game.place_car(1, 0.0, 0.0);
        game.update(FrameInput::default());
        assert!(!game.is_game_over());
    }

    #[test]
    fn world_is_frozen_while_crashed() {
        let mut game = game_with(deterministic_config());
        drive(&mut game, 100);
        game.place_car(2, 0.0, 0.0);
        game.update(FrameInput::default());
        assert!(game.is_game_over());

        let snapshot: Vec<(EntityId, f32)> = game
            .traffic()
            .entities()
            .iter()
            .map(|e| (e.id, e.position.z))
            .collect();
        let road: Vec<f32> = game.road().segments().iter().map(|s| s.z).collect();
        let (score, x, added) = (game.score(), game.player().current_x(), game.scene().added);

        for _ in 0..200 {
            game.update(left());
        }

        let after: Vec<(EntityId, f32)> = game
            .traffic()
            .entities()
            .iter()
            .map(|e| (e.id, e.position.z))
            .collect();
        assert_eq!(after, snapshot);
        assert_eq!(game.road().segments().iter().map(|s| s.z).collect::<Vec<_>>(), road);
        assert_eq!(game.score(), score);
        assert_eq!(game.player().current_x(), x);
        assert_eq!(game.scene().added, added);
    }

    #[test]
    fn restart_resets_lane_score_and_traffic() {
        let mut game = game_with(deterministic_config());
        game.update(left());
        game.update(left());
        drive(&mut game, 60);
        assert!(game.score() > 0.0);
        game.place_car(0, 0.0, 0.0);
        game.update(FrameInput::default());
        assert!(game.is_game_over());

        game.update(restart());

        assert!(!game.is_game_over());
        assert_eq!(game.player().current_lane(), 2);
        assert_eq!(game.player().current_x(), 1.5);
        assert_eq!(game.score(), 0.0);
        assert_eq!(game.speed_multiplier(), 1.0);
        assert!(game.traffic().is_empty());
        assert!(game.last_collision().is_none());
        // Only the player's taillights survive.
        assert_eq!(game.lights().len(), 1);
        assert_eq!(game.scene().live(), 9);
    }

    #[test]
    fn keep_traffic_policy_leaves_cars_in_place() {
        let mut config = deterministic_config();
        config.restart_policy = RestartPolicy::KeepTraffic;
        let mut game = game_with(config);
        let far = game.place_car(3, -60.0, 0.1);
        game.place_car(2, 0.0, 0.0);
        game.update(FrameInput::default());
        assert!(game.is_game_over());

        game.update(restart());

        assert!(!game.is_game_over());
        assert_eq!(game.traffic().len(), 2);
        assert!(game.traffic().get(far).is_some());
        assert_eq!(game.score(), 0.0);
    }

    #[test]
    fn restart_is_ignored_while_driving() {
        let mut game = game_with(deterministic_config());
        drive(&mut game, 10);
        let score = game.score();
        game.update(restart());
        assert!(game.score() > score);
    }

    #[test]
    fn three_lefts_stop_at_lane_zero() {
        let mut config = deterministic_config();
        config.traffic.spawn_probability = 0.0;
        let mut game = game_with(config);
        game.update(left());
        game.update(left());
        assert_eq!(game.player().current_lane(), 0);
        game.update(left());
        assert_eq!(game.player().current_lane(), 0);
        assert_eq!(game.player().target_x(), -4.5);
        drive(&mut game, 200);
        assert_eq!(game.player().current_x(), -4.5);
    }

    #[test]
    fn spawns_every_45th_frame_at_constant_speed() {
        let mut config = deterministic_config();
        // Keep spawned cars far from the player for the whole run.
        config.traffic.oncoming_speed = 0.0;
        config.traffic.same_direction_speed = 0.0;
        let mut game = game_with(config);

        let mut spawn_frames = Vec::new();
        let mut seen = 0;
        for frame in 1..=225 {
            game.update(FrameInput::default());
            if game.traffic().len() > seen {
                seen = game.traffic().len();
                spawn_frames.push(frame);
            }
        }
        assert_eq!(spawn_frames, vec![45, 90, 135, 180, 225]);
        for entity in game.traffic().entities() {
            assert!(game.lights().has_lights(LightOwner::Traffic(entity.id)));
        }
    }

    #[test]
    fn no_spawns_before_models_are_installed() {
        let mut game = Game::new(
            RecordingScene::new(),
            deterministic_config(),
            MESHES,
            SmallRng::seed_from_u64(5),
        )
        .unwrap();
        drive(&mut game, 200);
        assert!(game.traffic().is_empty());
        assert!(game.score() > 0.0);
    }

    #[test]
    fn despawned_cars_release_their_lights() {
        let mut game = game_with(deterministic_config());
        let car = game.place_car(0, 49.5, 1.0);
        assert!(game.lights().has_lights(LightOwner::Traffic(car)));
        game.update(FrameInput::default());
        assert!(game.traffic().get(car).is_none());
        assert!(!game.lights().has_lights(LightOwner::Traffic(car)));
    }

    #[test]
    fn score_grows_with_speed_multiplier() {
        let mut config = GameConfig::default();
        config.traffic.spawn_probability = 0.0;
        let mut game = game_with(config);
        drive(&mut game, 1000);
        assert!(game.speed_multiplier() > 1.0);
        assert!(game.speed_multiplier() <= 3.0);
        assert!(game.score() > 300.0);
    }

    #[test]
    fn installing_player_model_replaces_scene_object() {
        let mut game = game_with(deterministic_config());
        let live = game.scene().live();
        let raw = Aabb::from_extent(nalgebra::Vector3::new(100.0, 50.0, 200.0));
        let model = CarModel::loaded(7, &raw, &game.config.player.model);
        game.install_player_model(model);
        assert_eq!(game.scene().live(), live);
        assert!(game.scene().objects.values().any(|o| o.mesh == 7));
    }
}
