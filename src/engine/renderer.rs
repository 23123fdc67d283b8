use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{WebGlRenderingContext, WebGlProgram, WebGlBuffer, WebGlUniformLocation, HtmlCanvasElement};
use nalgebra::Matrix4;
use crate::engine::mesh::{Mesh, VERTEX_STRIDE};

const VERTEX_SHADER: &str = r#"
    attribute vec3 aPosition;
    attribute vec3 aColor;
    uniform mat4 uModel;
    uniform mat4 uViewProjection;
    uniform mat4 uView;
    varying vec3 vColor;
    varying float vDepth;
    void main() {
        vec4 world = uModel * vec4(aPosition, 1.0);
        gl_Position = uViewProjection * world;
        vDepth = -(uView * world).z;
        vColor = aColor;
    }
"#;

const FRAGMENT_SHADER: &str = r#"
    precision mediump float;
    varying vec3 vColor;
    varying float vDepth;
    uniform vec3 uTint;
    uniform bool uUseTint;
    uniform vec3 uFogColor;
    uniform vec2 uFogRange;

    void main() {
        vec3 color = uUseTint ? uTint : vColor;

        // Linear fog between near and far
        float fog = clamp((vDepth - uFogRange.x) / (uFogRange.y - uFogRange.x), 0.0, 1.0);
        color = mix(color, uFogColor, fog);

        gl_FragColor = vec4(color, 1.0);
    }
"#;

/// Mesh uploaded to GPU buffers.
pub struct GpuMesh {
    vertex_buffer: WebGlBuffer,
    index_buffer: WebGlBuffer,
    index_count: i32,
}

pub struct Renderer {
    pub gl: WebGlRenderingContext,
    model_location: WebGlUniformLocation,
    view_projection_location: WebGlUniformLocation,
    view_location: WebGlUniformLocation,
    tint_location: WebGlUniformLocation,
    use_tint_location: WebGlUniformLocation,
    fog_color_location: WebGlUniformLocation,
    fog_range_location: WebGlUniformLocation,
    position_attrib: u32,
    color_attrib: u32,
}

impl Renderer {
    pub fn new(gl: WebGlRenderingContext) -> Result<Self, JsValue> {
        let program = create_program(&gl)?;
        gl.use_program(Some(&program));

        let uniform = |name: &str| {
            gl.get_uniform_location(&program, name)
                .ok_or_else(|| JsValue::from_str(&format!("Failed to get {} location", name)))
        };
        let model_location = uniform("uModel")?;
        let view_projection_location = uniform("uViewProjection")?;
        let view_location = uniform("uView")?;
        let tint_location = uniform("uTint")?;
        let use_tint_location = uniform("uUseTint")?;
        let fog_color_location = uniform("uFogColor")?;
        let fog_range_location = uniform("uFogRange")?;

        let position_attrib = gl.get_attrib_location(&program, "aPosition");
        let color_attrib = gl.get_attrib_location(&program, "aColor");
        if position_attrib < 0 || color_attrib < 0 {
            return Err("Missing vertex attributes".into());
        }

        Ok(Renderer {
            gl,
            model_location,
            view_projection_location,
            view_location,
            tint_location,
            use_tint_location,
            fog_color_location,
            fog_range_location,
            position_attrib: position_attrib as u32,
            color_attrib: color_attrib as u32,
        })
    }

    pub fn upload(&self, mesh: &Mesh) -> Result<GpuMesh, JsValue> {
        let vertex_buffer = self.gl.create_buffer().ok_or("Failed to create vertex buffer")?;
        let index_buffer = self.gl.create_buffer().ok_or("Failed to create index buffer")?;

        self.gl.bind_buffer(WebGlRenderingContext::ARRAY_BUFFER, Some(&vertex_buffer));
        unsafe {
            let vert_array = js_sys::Float32Array::view(&mesh.vertices);
            self.gl.buffer_data_with_array_buffer_view(
                WebGlRenderingContext::ARRAY_BUFFER,
                &vert_array,
                WebGlRenderingContext::STATIC_DRAW
            );
        }

        self.gl.bind_buffer(WebGlRenderingContext::ELEMENT_ARRAY_BUFFER, Some(&index_buffer));
        unsafe {
            let idx_array = js_sys::Uint16Array::view(&mesh.indices);
            self.gl.buffer_data_with_array_buffer_view(
                WebGlRenderingContext::ELEMENT_ARRAY_BUFFER,
                &idx_array,
                WebGlRenderingContext::STATIC_DRAW
            );
        }

        Ok(GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as i32,
        })
    }

    pub fn clear(&self, r: f32, g: f32, b: f32) {
        self.gl.clear_color(r, g, b, 1.0);
        self.gl.clear(WebGlRenderingContext::COLOR_BUFFER_BIT | WebGlRenderingContext::DEPTH_BUFFER_BIT);
    }

    pub fn enable_depth_test(&self) {
        self.gl.enable(WebGlRenderingContext::DEPTH_TEST);
    }

    pub fn resize(&self, width: i32, height: i32) {
        self.gl.viewport(0, 0, width, height);
    }

    pub fn canvas(&self) -> Option<HtmlCanvasElement> {
        self.gl.canvas()?.dyn_into::<HtmlCanvasElement>().ok()
    }

    pub fn set_fog(&self, color: [f32; 3], near: f32, far: f32) {
        self.gl.uniform3f(Some(&self.fog_color_location), color[0], color[1], color[2]);
        self.gl.uniform2f(Some(&self.fog_range_location), near, far);
    }

    pub fn set_camera(&self, view: &Matrix4<f32>, projection: &Matrix4<f32>) {
        let view_projection = projection * view;
        self.gl.uniform_matrix4fv_with_f32_array(Some(&self.view_projection_location), false, view_projection.as_slice());
        self.gl.uniform_matrix4fv_with_f32_array(Some(&self.view_location), false, view.as_slice());
    }

    pub fn draw(&self, mesh: &GpuMesh, model: &Matrix4<f32>, tint: Option<[f32; 3]>) {
        self.gl.bind_buffer(WebGlRenderingContext::ARRAY_BUFFER, Some(&mesh.vertex_buffer));
        self.gl.bind_buffer(WebGlRenderingContext::ELEMENT_ARRAY_BUFFER, Some(&mesh.index_buffer));

        let stride = (VERTEX_STRIDE * 4) as i32;
        self.gl.vertex_attrib_pointer_with_i32(self.position_attrib, 3, WebGlRenderingContext::FLOAT, false, stride, 0);
        self.gl.enable_vertex_attrib_array(self.position_attrib);
        self.gl.vertex_attrib_pointer_with_i32(self.color_attrib, 3, WebGlRenderingContext::FLOAT, false, stride, 12);
        self.gl.enable_vertex_attrib_array(self.color_attrib);

        match tint {
            Some([r, g, b]) => {
                self.gl.uniform1i(Some(&self.use_tint_location), 1);
                self.gl.uniform3f(Some(&self.tint_location), r, g, b);
            }
            None => self.gl.uniform1i(Some(&self.use_tint_location), 0),
        }

        self.gl.uniform_matrix4fv_with_f32_array(Some(&self.model_location), false, model.as_slice());

        self.gl.draw_elements_with_i32(
            WebGlRenderingContext::TRIANGLES,
            mesh.index_count,
            WebGlRenderingContext::UNSIGNED_SHORT,
            0
        );
    }
}

fn create_program(gl: &WebGlRenderingContext) -> Result<WebGlProgram, JsValue> {
    let vert_shader = compile_shader(gl, WebGlRenderingContext::VERTEX_SHADER, VERTEX_SHADER)?;
    let frag_shader = compile_shader(gl, WebGlRenderingContext::FRAGMENT_SHADER, FRAGMENT_SHADER)?;

    let program = gl.create_program().ok_or("Unable to create program")?;
    gl.attach_shader(&program, &vert_shader);
    gl.attach_shader(&program, &frag_shader);
    gl.link_program(&program);

    if gl.get_program_parameter(&program, WebGlRenderingContext::LINK_STATUS).as_bool().unwrap_or(false) {
        Ok(program)
    } else {
        Err(JsValue::from_str(&gl.get_program_info_log(&program).unwrap_or_default()))
    }
}

fn compile_shader(gl: &WebGlRenderingContext, shader_type: u32, source: &str) -> Result<web_sys::WebGlShader, JsValue> {
    let shader = gl.create_shader(shader_type).ok_or("Unable to create shader")?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    if gl.get_shader_parameter(&shader, WebGlRenderingContext::COMPILE_STATUS).as_bool().unwrap_or(false) {
        Ok(shader)
    } else {
        Err(JsValue::from_str(&gl.get_shader_info_log(&shader).unwrap_or_default()))
    }
}
