use nalgebra::{Point3, Vector3};
use rand::Rng;

use crate::game::collision::Aabb;
use crate::game::config::ModelConfig;
use crate::game::scene::{MeshId, ObjectSpec};

/// Size of the stand-in box used while a model is missing.
pub const PLACEHOLDER_EXTENT: [f32; 3] = [2.0, 1.0, 4.0];

/// Placeholder colors, one per traffic model slot.
pub const FALLBACK_COLORS: [[f32; 3]; 6] = [
    [1.0, 0.27, 0.27],
    [0.27, 1.0, 0.27],
    [0.27, 0.27, 1.0],
    [1.0, 1.0, 0.27],
    [1.0, 0.27, 1.0],
    [0.27, 1.0, 1.0],
];

pub const PLAYER_COLOR: [f32; 3] = [1.0, 0.27, 0.27];

#[derive(Clone, Debug, PartialEq)]
pub struct CarModel {
    pub mesh: MeshId,
    pub scale: f32,
    pub yaw_offset: f32,
    pub y_offset: f32,
    /// Scaled, centered in x/z and resting on y=0.
    pub bounds: Aabb,
    pub tint: Option<[f32; 3]>,
    pub placeholder: bool,
}

impl CarModel {
    pub fn placeholder(mesh: MeshId, color: [f32; 3]) -> Self {
        let [w, h, d] = PLACEHOLDER_EXTENT;
        CarModel {
            mesh,
            scale: 1.0,
            yaw_offset: 0.0,
            y_offset: 0.0,
            bounds: Aabb::from_extent(Vector3::new(w, h, d)),
            tint: Some(color),
            placeholder: true,
        }
    }

    /// `mesh_bounds` are the vertex bounds of a mesh already centered on x/z
    /// and resting on y=0, so the box turns with the model about its center.
    pub fn loaded(mesh: MeshId, mesh_bounds: &Aabb, config: &ModelConfig) -> Self {
        CarModel {
            mesh,
            scale: config.scale,
            yaw_offset: config.rotation_offset_y,
            y_offset: config.position_offset_y,
            bounds: Aabb::from_extent(mesh_bounds.scaled(config.scale).extent())
                .rotated_y(config.rotation_offset_y),
            tint: None,
            placeholder: false,
        }
    }

    pub fn spec(&self, position: Point3<f32>, yaw: f32) -> ObjectSpec {
        ObjectSpec {
            mesh: self.mesh,
            scale: Vector3::repeat(self.scale),
            local_bounds: self.bounds,
            position,
            yaw: yaw + self.yaw_offset,
            offset: Vector3::new(0.0, self.y_offset, 0.0),
            tint: self.tint,
        }
    }
}

/// Traffic car models. Empty and not ready until the loader installs them.
#[derive(Clone, Debug, Default)]
pub struct ModelLibrary {
    models: Vec<CarModel>,
    ready: bool,
}

impl ModelLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ready(models: Vec<CarModel>) -> Self {
        ModelLibrary { models, ready: true }
    }

    pub fn is_ready(&self) -> bool {
        self.ready && !self.models.is_empty()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn placeholder_count(&self) -> usize {
        self.models.iter().filter(|m| m.placeholder).count()
    }

    pub fn choose<R: Rng>(&self, rng: &mut R) -> Option<&CarModel> {
        if self.models.is_empty() {
            return None;
        }
        self.models.get(rng.gen_range(0..self.models.len()))
    }
}
