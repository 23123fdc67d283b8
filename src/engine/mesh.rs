use crate::error::{GameError, Result};
use crate::game::collision::Aabb;

/// Interleaved position (3), color (3) and texture coordinate (2).
pub const VERTEX_STRIDE: usize = 8;

pub struct Mesh {
    pub vertices: Vec<f32>,
    pub indices: Vec<u16>,
}

impl Mesh {
    /// Unit cube centered on the origin.
    pub fn cube(r: f32, g: f32, b: f32) -> Self {
        Mesh::cuboid([-0.5, -0.5, -0.5], [0.5, 0.5, 0.5], [r, g, b])
    }

    /// Box of the given size resting on y=0, the shape used for stand-in cars.
    pub fn placeholder_car(w: f32, h: f32, d: f32) -> Self {
        Mesh::cuboid([-w / 2.0, 0.0, -d / 2.0], [w / 2.0, h, d / 2.0], [1.0, 1.0, 1.0])
    }

    fn cuboid(min: [f32; 3], max: [f32; 3], color: [f32; 3]) -> Self {
        let [x0, y0, z0] = min;
        let [x1, y1, z1] = max;
        let [r, g, b] = color;
        let mut vertices = Vec::with_capacity(24 * VERTEX_STRIDE);
        let mut indices = Vec::with_capacity(36);

        let mut add_face = |corners: [[f32; 3]; 4], brightness: f32| {
            let base = (vertices.len() / VERTEX_STRIDE) as u16;
            let uv = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
            for (p, t) in corners.iter().zip(uv.iter()) {
                vertices.extend_from_slice(&[
                    p[0], p[1], p[2],
                    r * brightness, g * brightness, b * brightness,
                    t[0], t[1],
                ]);
            }
            indices.extend_from_slice(&[
                base, base + 1, base + 2,
                base, base + 2, base + 3,
            ]);
        };

        add_face([[x0, y0, z1], [x1, y0, z1], [x1, y1, z1], [x0, y1, z1]], 0.9);
        add_face([[x1, y0, z0], [x0, y0, z0], [x0, y1, z0], [x1, y1, z0]], 0.7);
        add_face([[x0, y1, z1], [x1, y1, z1], [x1, y1, z0], [x0, y1, z0]], 1.1);
        add_face([[x0, y0, z0], [x1, y0, z0], [x1, y0, z1], [x0, y0, z1]], 0.4);
        add_face([[x1, y0, z1], [x1, y0, z0], [x1, y1, z0], [x1, y1, z1]], 0.8);
        add_face([[x0, y0, z0], [x0, y0, z1], [x0, y1, z1], [x0, y1, z0]], 0.6);

        Mesh { vertices, indices }
    }

    pub fn from_gltf(bytes: &[u8]) -> Result<Self> {
        let (document, buffers, _) =
            gltf::import_slice(bytes).map_err(|e| GameError::MeshParse(e.to_string()))?;

        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for mesh in document.meshes() {
            for primitive in mesh.primitives() {
                let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

                let positions: Vec<[f32; 3]> = reader
                    .read_positions()
                    .ok_or_else(|| GameError::MeshParse("primitive without positions".into()))?
                    .collect();
                let colors: Vec<[f32; 3]> = if let Some(iter) = reader.read_colors(0) {
                    iter.into_rgb_f32().collect()
                } else {
                    vec![[0.8, 0.8, 0.8]; positions.len()]
                };

                let base_index = vertices.len() / VERTEX_STRIDE;
                if base_index + positions.len() > u16::MAX as usize {
                    return Err(GameError::MeshParse("mesh exceeds 16-bit index range".into()));
                }

                for (pos, color) in positions.iter().zip(colors.iter()) {
                    vertices.extend_from_slice(&[
                        pos[0], pos[1], pos[2],
                        color[0], color[1], color[2],
                        0.0, 0.0,
                    ]);
                }

                if let Some(iter) = reader.read_indices() {
                    for index in iter.into_u32() {
                        indices.push((base_index + index as usize) as u16);
                    }
                }
            }
        }

        if indices.is_empty() {
            return Err(GameError::MeshParse("no indexed geometry".into()));
        }
        Ok(Mesh { vertices, indices })
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VERTEX_STRIDE
    }

    /// Shift the vertices so the mesh is centered on x/z and rests on y=0.
    /// Returns the new bounds, or `None` for an empty mesh.
    pub fn recenter_on_ground(&mut self) -> Option<Aabb> {
        let bounds = self.bounds()?;
        let center = bounds.center();
        let shift = [-center.x, -bounds.min.y, -center.z];
        for vertex in self.vertices.chunks_exact_mut(VERTEX_STRIDE) {
            for (coord, delta) in vertex.iter_mut().zip(shift) {
                *coord += delta;
            }
        }
        self.bounds()
    }

    /// Bounds of the vertex positions.
    pub fn bounds(&self) -> Option<Aabb> {
        let positions: Vec<[f32; 3]> = self
            .vertices
            .chunks_exact(VERTEX_STRIDE)
            .map(|v| [v[0], v[1], v[2]])
            .collect();
        Aabb::from_points(positions.iter())
    }
}
