use nalgebra::{Point3, Rotation3, Vector3};

use crate::game::lanes::Direction;
use crate::game::traffic::{EntityId, TrafficEntity};

/// Axis-aligned bounding box in world or model space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Aabb { min, max }
    }

    /// Box of the given size resting on y=0, centered in x and z.
    pub fn from_extent(extent: Vector3<f32>) -> Self {
        let (hx, hz) = (extent.x / 2.0, extent.z / 2.0);
        Aabb {
            min: Point3::new(-hx, 0.0, -hz),
            max: Point3::new(hx, extent.y, hz),
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a [f32; 3]>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut min = Point3::new(first[0], first[1], first[2]);
        let mut max = min;
        for p in iter {
            min = Point3::new(min.x.min(p[0]), min.y.min(p[1]), min.z.min(p[2]));
            max = Point3::new(max.x.max(p[0]), max.y.max(p[1]), max.z.max(p[2]));
        }
        Some(Aabb { min, max })
    }

    pub fn scaled(&self, scale: f32) -> Self {
        Aabb {
            min: Point3::from(self.min.coords * scale),
            max: Point3::from(self.max.coords * scale),
        }
    }

    pub fn translated(&self, offset: &Vector3<f32>) -> Self {
        Aabb {
            min: self.min + *offset,
            max: self.max + *offset,
        }
    }

    /// Bounds of this box after turning it by `yaw` about the y axis.
    pub fn rotated_y(&self, yaw: f32) -> Self {
        let rotation = Rotation3::from_axis_angle(&Vector3::y_axis(), yaw);
        let corners: Vec<[f32; 3]> = (0..8)
            .map(|i| {
                let corner = Point3::new(
                    if i & 1 == 0 { self.min.x } else { self.max.x },
                    if i & 2 == 0 { self.min.y } else { self.max.y },
                    if i & 4 == 0 { self.min.z } else { self.max.z },
                );
                let turned = rotation * corner;
                [turned.x, turned.y, turned.z]
            })
            .collect();
        Aabb::from_points(corners.iter()).unwrap_or(*self)
    }

    pub fn extent(&self) -> Vector3<f32> {
        self.max - self.min
    }

    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Strict overlap: boxes that only share a face do not intersect.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x && self.max.x > other.min.x &&
        self.min.y < other.max.y && self.max.y > other.min.y &&
        self.min.z < other.max.z && self.max.z > other.min.z
    }

    pub fn intersection(&self, other: &Aabb) -> Option<Aabb> {
        if !self.intersects(other) {
            return None;
        }
        Some(Aabb {
            min: self.min.sup(&other.min),
            max: self.max.inf(&other.max),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Collision {
    pub entity: EntityId,
    pub lane: usize,
    pub direction: Direction,
    /// Center of the overlap volume.
    pub point: Point3<f32>,
}

/// First traffic entity, in insertion order, whose box overlaps the player's.
pub fn check(player_box: &Aabb, entities: &[TrafficEntity]) -> Option<Collision> {
    entities.iter().find_map(|entity| {
        player_box.intersection(&entity.bounds).map(|overlap| Collision {
            entity: entity.id,
            lane: entity.lane,
            direction: entity.direction,
            point: overlap.center(),
        })
    })
}
