use std::collections::HashMap;

use nalgebra::{Point3, Vector3};

use crate::game::collision::Aabb;
use crate::game::scene::{MeshId, ObjectHandle, ObjectSpec, SceneGraph};
use crate::game::traffic::EntityId;

const GLOW_SIZE: f32 = 0.2;
const HEADLIGHT: [f32; 3] = [1.0, 1.0, 0.95];
const TAILLIGHT: [f32; 3] = [1.0, 0.05, 0.05];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LightOwner {
    Player,
    Traffic(EntityId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightKind {
    Headlights,
    Taillights,
}

impl LightKind {
    fn color(self) -> [f32; 3] {
        match self {
            LightKind::Headlights => HEADLIGHT,
            LightKind::Taillights => TAILLIGHT,
        }
    }
}

/// Glow markers attached to cars, keyed by the car that owns them.
///
/// Both headlights of oncoming cars and taillights of cars driving away sit
/// on the +z face, the side facing the camera.
pub struct LightTable {
    mesh: MeshId,
    lights: HashMap<LightOwner, Vec<ObjectHandle>>,
}

impl LightTable {
    pub fn new(mesh: MeshId) -> Self {
        LightTable {
            mesh,
            lights: HashMap::new(),
        }
    }

    fn anchors(bounds: &Aabb) -> [Point3<f32>; 2] {
        let extent = bounds.extent();
        let center = bounds.center();
        let y = bounds.min.y + extent.y * 0.6;
        let z = bounds.max.z;
        let dx = extent.x * 0.3;
        [
            Point3::new(center.x - dx, y, z),
            Point3::new(center.x + dx, y, z),
        ]
    }

    /// Attach a pair of lights to `owner`, replacing any it already has.
    pub fn attach<S: SceneGraph>(&mut self, owner: LightOwner, kind: LightKind, bounds: &Aabb, scene: &mut S) {
        self.release(owner, scene);
        let size = Vector3::repeat(GLOW_SIZE);
        let handles: Vec<ObjectHandle> = Self::anchors(bounds)
            .iter()
            .map(|&position| {
                scene.add_object(ObjectSpec {
                    mesh: self.mesh,
                    scale: size,
                    local_bounds: Aabb::from_extent(size),
                    position,
                    yaw: 0.0,
                    offset: Vector3::zeros(),
                    tint: Some(kind.color()),
                })
            })
            .collect();
        self.lights.insert(owner, handles);
    }

    pub fn follow<S: SceneGraph>(&self, owner: LightOwner, bounds: &Aabb, scene: &mut S) {
        if let Some(handles) = self.lights.get(&owner) {
            for (handle, position) in handles.iter().zip(Self::anchors(bounds)) {
                scene.set_transform(*handle, position, 0.0);
            }
        }
    }

    pub fn release<S: SceneGraph>(&mut self, owner: LightOwner, scene: &mut S) {
        if let Some(handles) = self.lights.remove(&owner) {
            for handle in handles {
                scene.remove_object(handle);
            }
        }
    }

    /// Release every traffic car's lights, keeping the player's.
    pub fn release_traffic<S: SceneGraph>(&mut self, scene: &mut S) {
        let owners: Vec<LightOwner> = self
            .lights
            .keys()
            .filter(|owner| matches!(owner, LightOwner::Traffic(_)))
            .copied()
            .collect();
        for owner in owners {
            self.release(owner, scene);
        }
    }

    pub fn has_lights(&self, owner: LightOwner) -> bool {
        self.lights.contains_key(&owner)
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }
}
