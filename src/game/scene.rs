use nalgebra::{Point3, Vector3};

use crate::game::collision::Aabb;

pub type MeshId = usize;

/// Display handle issued by a [`SceneGraph`]. Invalid once removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle(pub u64);

#[derive(Clone, Debug, PartialEq)]
pub struct ObjectSpec {
    pub mesh: MeshId,
    pub scale: Vector3<f32>,
    /// Model-space bounds after scaling, used for world-bounds queries.
    pub local_bounds: Aabb,
    pub position: Point3<f32>,
    pub yaw: f32,
    /// Render-only displacement from the logical position.
    pub offset: Vector3<f32>,
    /// Overrides vertex colors when set.
    pub tint: Option<[f32; 3]>,
}

impl ObjectSpec {
    /// Box around the drawn object: local bounds at the render position.
    pub fn world_bounds(&self) -> Aabb {
        self.local_bounds.translated(&(self.position.coords + self.offset))
    }
}

/// The rendering side of the game. The simulation only adds, moves and
/// removes objects; drawing is entirely up to the implementation.
pub trait SceneGraph {
    fn add_object(&mut self, spec: ObjectSpec) -> ObjectHandle;

    fn remove_object(&mut self, handle: ObjectHandle);

    fn set_transform(&mut self, handle: ObjectHandle, position: Point3<f32>, yaw: f32);

    fn world_bounds_of(&self, handle: ObjectHandle) -> Option<Aabb>;
}
