use nalgebra::{Point3, Vector3};
use rand::Rng;

use crate::game::collision::Aabb;
use crate::game::config::TrafficConfig;
use crate::game::lanes::{self, Direction};
use crate::game::models::{CarModel, ModelLibrary};
use crate::game::scene::{ObjectHandle, SceneGraph};

/// Stable id of a traffic car, never reused within one pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Clone, Debug)]
pub struct TrafficEntity {
    pub id: EntityId,
    pub position: Point3<f32>,
    pub lane: usize,
    pub direction: Direction,
    /// Distance covered per frame, already scaled by the speed multiplier
    /// in effect when the car spawned.
    pub speed: f32,
    pub bounds: Aabb,
    pub handle: ObjectHandle,
    model_bounds: Aabb,
    yaw: f32,
}

impl TrafficEntity {
    fn refresh_bounds(&mut self) {
        self.bounds = self.model_bounds.translated(&self.position.coords);
    }
}

pub struct TrafficPool {
    config: TrafficConfig,
    entities: Vec<TrafficEntity>,
    next_id: u64,
    last_spawn: u64,
}

impl TrafficPool {
    pub fn new(config: TrafficConfig) -> Self {
        TrafficPool {
            config,
            entities: Vec::new(),
            next_id: 1,
            last_spawn: 0,
        }
    }

    /// Frames between spawn attempts. Faster games spawn more often, down
    /// to `min_spawn_interval`.
    pub fn spawn_interval(&self, speed_multiplier: f32) -> f32 {
        (self.config.base_spawn_interval / speed_multiplier).max(self.config.min_spawn_interval)
    }

    /// Restart the spawn cooldown from frame `now`.
    pub fn reset_timer(&mut self, now: u64) {
        self.last_spawn = now;
    }

    /// Attempt a spawn at frame `now` once the cooldown has elapsed.
    ///
    /// Every attempt resets the cooldown, whether or not the probability gate
    /// lets a car through. Without usable models the call does nothing.
    pub fn try_spawn<S: SceneGraph, R: Rng>(
        &mut self,
        now: u64,
        speed_multiplier: f32,
        models: &ModelLibrary,
        scene: &mut S,
        rng: &mut R,
    ) -> Option<EntityId> {
        if !models.is_ready() {
            return None;
        }

        let elapsed = now.saturating_sub(self.last_spawn) as f32;
        if elapsed < self.spawn_interval(speed_multiplier) {
            return None;
        }
        self.last_spawn = now;

        if rng.gen::<f32>() >= self.config.spawn_probability {
            return None;
        }

        let lane = rng.gen_range(0..lanes::lane_count());
        let model = models.choose(rng)?;
        let jitter = self.config.speed_jitter;
        let factor = 1.0 + rng.gen_range(-jitter..=jitter);
        let base = match lanes::lane_direction(lane) {
            Direction::Oncoming => self.config.oncoming_speed,
            Direction::SameDirection => self.config.same_direction_speed,
        };

        let z = self.config.spawn_distance;
        let id = self.insert(lane, z, base * factor * speed_multiplier, model, scene);
        log::debug!("spawned {:?} in lane {} at z={}", id, lane, z);
        Some(id)
    }

    fn insert<S: SceneGraph>(
        &mut self,
        lane: usize,
        z: f32,
        speed: f32,
        model: &CarModel,
        scene: &mut S,
    ) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;

        // Lanes come from `0..lane_count()`, so the lookup cannot miss.
        let x = lanes::LANES[lane];
        let direction = lanes::lane_direction(lane);
        let yaw = match direction {
            Direction::Oncoming => std::f32::consts::PI,
            Direction::SameDirection => 0.0,
        };
        let position = Point3::new(x, 0.0, z);
        let handle = scene.add_object(model.spec(position, yaw));

        let mut entity = TrafficEntity {
            id,
            position,
            lane,
            direction,
            speed,
            bounds: model.bounds,
            handle,
            model_bounds: model.bounds.translated(&Vector3::new(0.0, model.y_offset, 0.0)),
            yaw: yaw + model.yaw_offset,
        };
        entity.refresh_bounds();
        self.entities.push(entity);
        id
    }

    /// Move every car one frame along its direction of travel. `time` only
    /// drives the cosmetic vertical bob.
    pub fn advance<S: SceneGraph>(&mut self, time: f32, scene: &mut S) {
        for entity in &mut self.entities {
            let step = match entity.direction {
                Direction::Oncoming => entity.speed,
                Direction::SameDirection => -entity.speed,
            };
            entity.position += Vector3::new(0.0, 0.0, step);
            entity.position.y = (time * 2.0 + entity.position.x).sin() * 0.02;
            entity.refresh_bounds();
            scene.set_transform(entity.handle, entity.position, entity.yaw);
        }
    }

    /// Near (behind the player) and far (ahead) despawn z.
    fn despawn_bounds(&self) -> (f32, f32) {
        (
            self.config.despawn_distance,
            self.config.spawn_distance - self.config.despawn_margin,
        )
    }

    /// Remove cars that left the playable stretch of road. Both thresholds
    /// are inclusive. Returns the removed ids.
    pub fn sweep_despawn<S: SceneGraph>(&mut self, scene: &mut S) -> Vec<EntityId> {
        let mut removed = Vec::new();
        let (near, far) = self.despawn_bounds();
        self.entities.retain(|entity| {
            let z = entity.position.z;
            if z >= near || z <= far {
                scene.remove_object(entity.handle);
                removed.push(entity.id);
                false
            } else {
                true
            }
        });
        if !removed.is_empty() {
            log::debug!("despawned {} cars, {} live", removed.len(), self.entities.len());
        }
        removed
    }

    /// Despawn everything. Returns the removed ids.
    pub fn clear<S: SceneGraph>(&mut self, scene: &mut S) -> Vec<EntityId> {
        self.entities
            .drain(..)
            .map(|entity| {
                scene.remove_object(entity.handle);
                entity.id
            })
            .collect()
    }

    pub fn entities(&self) -> &[TrafficEntity] {
        &self.entities
    }

    pub fn get(&self, id: EntityId) -> Option<&TrafficEntity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    #[cfg(test)]
    fn is_despawn_z(&self, z: f32) -> bool {
        let (near, far) = self.despawn_bounds();
        z >= near || z <= far
    }

    #[cfg(test)]
    pub(crate) fn spawn_at<S: SceneGraph>(
        &mut self,
        lane: usize,
        z: f32,
        speed: f32,
        model: &CarModel,
        scene: &mut S,
    ) -> EntityId {
        self.insert(lane, z, speed, model, scene)
    }
}
