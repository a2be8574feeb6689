use crate::{
    config::{AppConfig, RenderConfig},
    render::{
        backend::{drain_errors, gl_error_name, GlBackend, ShaderBackend},
        mesh::TriangleMesh,
        shaders::{build_program, ProgramBuild, ShaderError, ShaderProgram},
    },
};
use log::{error, info, warn};
use std::time::Instant;

/// Name of the matrix uniform in the vertex shader.
pub const TRANSFORM_UNIFORM: &str = "transform";

pub struct TriangleDemo {
    program: ShaderProgram,
    mesh: TriangleMesh,
    render: RenderConfig,
    start: Instant,
    frames: u64,
}

impl TriangleDemo {
    /// Uploads the triangle and builds the shader program. Needs a current
    /// context with `gl` loaded.
    pub fn new(config: &AppConfig) -> Result<Self, ShaderError> {
        let mesh = TriangleMesh::new();

        let build = build_program(GlBackend, &config.shaders.vertex, &config.shaders.fragment);
        let program = accept_build(build, config.shaders.abort_on_error)?;

        let [r, g, b, a] = config.render.clear_color;
        unsafe {
            gl::ClearColor(r, g, b, a);
        }

        info!(
            "Triangle ready: program {}, {} vertices",
            program.id(),
            mesh.vertex_count()
        );

        Ok(Self {
            program,
            mesh,
            render: config.render.clone(),
            start: Instant::now(),
            frames: 0,
        })
    }

    pub fn render(&mut self, aspect_ratio: f32) {
        unsafe {
            gl::Clear(gl::COLOR_BUFFER_BIT);
        }

        let time = self.start.elapsed().as_secs_f32();
        let transform = self
            .render
            .transform
            .matrix(time, self.render.scale, aspect_ratio);

        self.program.set_uniform_mat4(TRANSFORM_UNIFORM, &transform);
        self.mesh.draw();

        if self.frames == 0 {
            check_errors(&GlBackend, "first frame");
        }
        self.frames += 1;
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

/// Decides what to do with a finished build. With `abort_on_error` a failed
/// build is an error; otherwise the broken program is kept and rendering
/// carries on.
pub fn accept_build<B: ShaderBackend>(
    build: ProgramBuild<B>,
    abort_on_error: bool,
) -> Result<ShaderProgram<B>, ShaderError> {
    if build.is_linked() {
        return Ok(build.into_program());
    }

    if abort_on_error {
        return build.into_result();
    }

    warn!(
        "Shader program {} failed to build, continuing anyway:\n{}",
        build.handle, build.log
    );
    Ok(build.into_program())
}

/// Logs every pending GL error; returns how many there were.
pub fn check_errors<B: ShaderBackend>(backend: &B, when: &str) -> usize {
    let errors = drain_errors(backend);
    for code in &errors {
        error!("GL error after {}: {} (0x{:04x})", when, gl_error_name(*code), code);
    }
    errors.len()
}
