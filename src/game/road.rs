use nalgebra::{Point3, Vector3};

use crate::game::collision::Aabb;
use crate::game::config::RoadConfig;
use crate::game::scene::{MeshId, ObjectHandle, ObjectSpec, SceneGraph};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoadSegment {
    pub z: f32,
    pub handle: ObjectHandle,
}

/// Fixed ring of road tiles recycled from behind the player to the far end.
pub struct RoadTiler {
    segments: Vec<RoadSegment>,
    segment_length: f32,
}

impl RoadTiler {
    /// Lay out `segment_count` tiles at z = 0, -L, -2L, ... and register
    /// them with the scene. `mesh` is a unit tile scaled to road size.
    pub fn new<S: SceneGraph>(config: &RoadConfig, mesh: MeshId, scene: &mut S) -> Self {
        let length = config.segment_length;
        let scale = Vector3::new(config.width, 0.1, length);
        let segments = (0..config.segment_count)
            .map(|i| {
                let z = -(i as f32) * length;
                let handle = scene.add_object(ObjectSpec {
                    mesh,
                    scale,
                    local_bounds: Aabb::from_extent(scale),
                    position: Point3::new(0.0, -0.1, z),
                    yaw: 0.0,
                    offset: Vector3::zeros(),
                    tint: None,
                });
                RoadSegment { z, handle }
            })
            .collect();
        RoadTiler {
            segments,
            segment_length: length,
        }
    }

    pub fn advance<S: SceneGraph>(&mut self, distance: f32, scene: &mut S) {
        let ring = self.covered_span();
        for segment in &mut self.segments {
            segment.z += distance;
            if segment.z > self.segment_length {
                segment.z -= ring;
            }
            scene.set_transform(segment.handle, Point3::new(0.0, -0.1, segment.z), 0.0);
        }
    }

    pub fn covered_span(&self) -> f32 {
        self.segments.len() as f32 * self.segment_length
    }

    pub fn segments(&self) -> &[RoadSegment] {
        &self.segments
    }
}
