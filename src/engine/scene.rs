use std::collections::HashMap;

use nalgebra::{Matrix4, Perspective3, Point3, Vector3};
use wasm_bindgen::JsValue;

use crate::engine::mesh::Mesh;
use crate::engine::renderer::{GpuMesh, Renderer};
use crate::game::collision::Aabb;
use crate::game::scene::{MeshId, ObjectHandle, ObjectSpec, SceneGraph};

const NIGHT: [f32; 3] = [0.0, 0.0, 0.0];
const CRASH_TINT: [f32; 3] = [0.25, 0.0, 0.0];
const FOG_NEAR: f32 = 30.0;
const FOG_FAR: f32 = 150.0;
const FIELD_OF_VIEW: f32 = 75.0;

/// Camera placement behind and above the followed point.
pub fn chase_camera(focus: Point3<f32>) -> (Point3<f32>, Point3<f32>) {
    let eye = Point3::new(focus.x, 4.0, focus.z + 8.0);
    let target = Point3::new(focus.x, focus.y, focus.z - 3.0);
    (eye, target)
}

pub fn model_matrix(spec: &ObjectSpec) -> Matrix4<f32> {
    Matrix4::new_translation(&(spec.position.coords + spec.offset))
        * Matrix4::new_rotation(Vector3::y() * spec.yaw)
        * Matrix4::new_nonuniform_scaling(&spec.scale)
}

/// WebGL-backed scene: a mesh registry and a handle-keyed object table.
pub struct WebScene {
    renderer: Renderer,
    meshes: Vec<GpuMesh>,
    objects: HashMap<ObjectHandle, ObjectSpec>,
    next_handle: u64,
}

impl WebScene {
    pub fn new(renderer: Renderer) -> Self {
        WebScene {
            renderer,
            meshes: Vec::new(),
            objects: HashMap::new(),
            next_handle: 0,
        }
    }

    pub fn register_mesh(&mut self, mesh: &Mesh) -> Result<MeshId, JsValue> {
        let gpu = self.renderer.upload(mesh)?;
        self.meshes.push(gpu);
        Ok(self.meshes.len() - 1)
    }

    pub fn render(&self, focus: Point3<f32>, game_over: bool) {
        let background = if game_over { CRASH_TINT } else { NIGHT };
        self.renderer.clear(background[0], background[1], background[2]);
        self.renderer.enable_depth_test();

        let mut aspect = 1.0;
        if let Some(canvas) = self.renderer.canvas() {
            let (width, height) = (canvas.width(), canvas.height());
            self.renderer.resize(width as i32, height as i32);
            if height > 0 {
                aspect = width as f32 / height as f32;
            }
        }

        let projection =
            Perspective3::new(aspect, FIELD_OF_VIEW.to_radians(), 0.1, 1000.0).to_homogeneous();
        let (eye, target) = chase_camera(focus);
        let view = Matrix4::look_at_rh(&eye, &target, &Vector3::y());
        self.renderer.set_camera(&view, &projection);
        self.renderer.set_fog(background, FOG_NEAR, FOG_FAR);

        for spec in self.objects.values() {
            match self.meshes.get(spec.mesh) {
                Some(mesh) => self.renderer.draw(mesh, &model_matrix(spec), spec.tint),
                None => log::debug!("object references unregistered mesh {}", spec.mesh),
            }
        }
    }
}

impl SceneGraph for WebScene {
    fn add_object(&mut self, spec: ObjectSpec) -> ObjectHandle {
        self.next_handle += 1;
        let handle = ObjectHandle(self.next_handle);
        self.objects.insert(handle, spec);
        handle
    }

    fn remove_object(&mut self, handle: ObjectHandle) {
        if self.objects.remove(&handle).is_none() {
            log::warn!("remove of unknown object {:?}", handle);
        }
    }

    fn set_transform(&mut self, handle: ObjectHandle, position: Point3<f32>, yaw: f32) {
        if let Some(spec) = self.objects.get_mut(&handle) {
            spec.position = position;
            spec.yaw = yaw;
        }
    }

    fn world_bounds_of(&self, handle: ObjectHandle) -> Option<Aabb> {
        self.objects.get(&handle).map(ObjectSpec::world_bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mesh::VERTEX_STRIDE;
    use crate::game::config::ModelConfig;
    use crate::game::models::CarModel;

    /// Corners of an off-origin box, the way exported car models often sit.
    fn raw_car_mesh() -> Mesh {
        let mut vertices = Vec::new();
        for i in 0..8 {
            vertices.extend_from_slice(&[
                if i & 1 == 0 { 0.0 } else { 100.0 },
                if i & 2 == 0 { 0.0 } else { 50.0 },
                if i & 4 == 0 { 0.0 } else { 200.0 },
                1.0, 1.0, 1.0,
                0.0, 0.0,
            ]);
        }
        Mesh { vertices, indices: vec![0, 1, 2] }
    }

    fn drawn_bounds(mesh: &Mesh, spec: &ObjectSpec) -> Aabb {
        let model = model_matrix(spec);
        let points: Vec<[f32; 3]> = mesh
            .vertices
            .chunks_exact(VERTEX_STRIDE)
            .map(|v| {
                let p = model.transform_point(&Point3::new(v[0], v[1], v[2]));
                [p.x, p.y, p.z]
            })
            .collect();
        Aabb::from_points(points.iter()).unwrap()
    }

    fn assert_same_box(a: &Aabb, b: &Aabb) {
        assert!((a.min - b.min).norm() < 1e-4, "{:?} vs {:?}", a, b);
        assert!((a.max - b.max).norm() < 1e-4, "{:?} vs {:?}", a, b);
    }

    fn spec() -> ObjectSpec {
        ObjectSpec {
            mesh: 0,
            scale: Vector3::new(2.0, 1.0, 4.0),
            local_bounds: Aabb::from_extent(Vector3::new(2.0, 1.0, 4.0)),
            position: Point3::new(1.5, 0.0, -10.0),
            yaw: 0.0,
            offset: Vector3::new(0.0, 0.5, 0.0),
            tint: None,
        }
    }

    #[test]
    fn camera_trails_the_player() {
        let (eye, target) = chase_camera(Point3::new(-1.5, 0.0, 0.0));
        assert_eq!(eye, Point3::new(-1.5, 4.0, 8.0));
        assert_eq!(target, Point3::new(-1.5, 0.0, -3.0));
    }

    #[test]
    fn model_matrix_applies_offset_after_scaling() {
        let m = model_matrix(&spec());
        let corner = m.transform_point(&Point3::new(0.5, 1.0, 0.5));
        assert!((corner - Point3::new(2.5, 1.5, -8.0)).norm() < 1e-5);
    }

    #[test]
    fn yaw_turns_the_model_around() {
        let mut turned = spec();
        turned.yaw = std::f32::consts::PI;
        let nose = model_matrix(&turned).transform_point(&Point3::new(0.0, 0.0, -0.5));
        assert!((nose.z - -8.0).abs() < 1e-5);
        assert!((nose.x - 1.5).abs() < 1e-5);
    }

    #[test]
    fn loaded_car_hitbox_matches_drawn_geometry() {
        let mut mesh = raw_car_mesh();
        let bounds = mesh.recenter_on_ground().unwrap();
        let config = ModelConfig {
            scale: 0.02,
            position_offset_y: 0.25,
            ..ModelConfig::default()
        };
        let car = CarModel::loaded(0, &bounds, &config);

        for yaw in [0.0, std::f32::consts::PI] {
            let spec = car.spec(Point3::new(1.5, 0.0, -10.0), yaw);
            assert_same_box(&drawn_bounds(&mesh, &spec), &spec.world_bounds());
        }
        let oncoming = car.spec(Point3::new(1.5, 0.0, -10.0), std::f32::consts::PI);
        assert_same_box(
            &oncoming.world_bounds(),
            &Aabb::new(Point3::new(0.5, 0.25, -12.0), Point3::new(2.5, 1.25, -8.0)),
        );
    }

    #[test]
    fn quarter_turned_model_gets_a_quarter_turned_hitbox() {
        let mut mesh = raw_car_mesh();
        let bounds = mesh.recenter_on_ground().unwrap();
        let config = ModelConfig {
            scale: 0.02,
            rotation_offset_y: std::f32::consts::FRAC_PI_2,
            ..ModelConfig::default()
        };
        let car = CarModel::loaded(0, &bounds, &config);
        let spec = car.spec(Point3::new(-4.5, 0.0, 0.0), std::f32::consts::PI);
        let drawn = drawn_bounds(&mesh, &spec);
        assert_same_box(&drawn, &spec.world_bounds());
        assert!((drawn.extent().x - 4.0).abs() < 1e-4);
    }
}
