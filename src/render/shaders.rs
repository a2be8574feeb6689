// shaders.rs - Shader program build and ownership

use crate::render::backend::{GlBackend, ShaderBackend};
use gl::types::*;
use glam::Mat4;
use log::{debug, error, warn};
use std::collections::HashMap;
use std::ffi::NulError;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("{stage} shader source unavailable at {path:?}: {reason}")]
    SourceUnavailable {
        stage: ShaderStage,
        path: PathBuf,
        reason: String,
    },
    #[error("{stage} shader compilation failed: {log}")]
    Compilation { stage: ShaderStage, log: String },
    #[error("Program linking failed: {0}")]
    Linking(String),
    #[error("Null byte error: {0}")]
    Nul(#[from] NulError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn gl_enum(self) -> GLenum {
        match self {
            ShaderStage::Vertex => gl::VERTEX_SHADER,
            ShaderStage::Fragment => gl::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Text of one shader stage, or the reason it could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderSource {
    Loaded(String),
    Unavailable { path: PathBuf, reason: String },
}

impl ShaderSource {
    /// What gets handed to the compiler. Unavailable sources compile as empty.
    pub fn text(&self) -> &str {
        match self {
            ShaderSource::Loaded(text) => text,
            ShaderSource::Unavailable { .. } => "",
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, ShaderSource::Loaded(_))
    }
}

impl From<&str> for ShaderSource {
    fn from(text: &str) -> Self {
        ShaderSource::Loaded(text.to_string())
    }
}

pub fn load_source<P: AsRef<Path>>(path: P) -> ShaderSource {
    let path = path.as_ref();
    // Bytes the compiler would choke on still count as a readable source.
    match fs::read(path) {
        Ok(bytes) => ShaderSource::Loaded(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            warn!("Could not read shader source {:?}: {}", path, e);
            ShaderSource::Unavailable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: ShaderStage,
    pub source: SourceOrigin,
    pub compiled: bool,
    pub log: String,
    /// Set when the driver never saw the source because of an interior NUL.
    pub rejected: Option<NulError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOrigin {
    Provided,
    Unavailable { path: PathBuf, reason: String },
}

/// Compiler and linker output for one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticLog {
    pub vertex: StageReport,
    pub fragment: StageReport,
    pub link: String,
}

impl DiagnosticLog {
    pub fn stage(&self, stage: ShaderStage) -> &StageReport {
        match stage {
            ShaderStage::Vertex => &self.vertex,
            ShaderStage::Fragment => &self.fragment,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertex.log.trim().is_empty()
            && self.fragment.log.trim().is_empty()
            && self.link.trim().is_empty()
    }
}

impl fmt::Display for DiagnosticLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for report in [&self.vertex, &self.fragment] {
            if !report.log.trim().is_empty() {
                writeln!(f, "[{}] {}", report.stage, report.log.trim_end())?;
            }
        }
        if !self.link.trim().is_empty() {
            writeln!(f, "[link] {}", self.link.trim_end())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    Linked,
    Failed,
}

/// Outcome of a program build: the handle is always returned, alongside
/// whether it linked and everything the driver said about it.
///
/// The handle is owned by whoever holds this value; turn it into a
/// [`ShaderProgram`] or call [`ProgramBuild::release`].
#[must_use]
pub struct ProgramBuild<B: ShaderBackend = GlBackend> {
    pub handle: GLuint,
    pub status: BuildStatus,
    pub log: DiagnosticLog,
    backend: B,
}

impl<B: ShaderBackend> ProgramBuild<B> {
    pub fn is_linked(&self) -> bool {
        self.status == BuildStatus::Linked
    }

    /// Takes ownership of the handle whatever the status.
    pub fn into_program(self) -> ShaderProgram<B> {
        ShaderProgram::from_raw(self.backend, self.handle)
    }

    /// Keeps the program only if it linked; otherwise deletes it and reports
    /// the earliest failure.
    pub fn into_result(self) -> Result<ShaderProgram<B>, ShaderError> {
        if self.is_linked() {
            return Ok(self.into_program());
        }

        let err = self.failure();
        self.release();
        Err(err)
    }

    pub fn release(self) {
        if self.handle != 0 {
            self.backend.delete_program(self.handle);
        }
    }

    fn failure(&self) -> ShaderError {
        for report in [&self.log.vertex, &self.log.fragment] {
            if let SourceOrigin::Unavailable { path, reason } = &report.source {
                return ShaderError::SourceUnavailable {
                    stage: report.stage,
                    path: path.clone(),
                    reason: reason.clone(),
                };
            }
        }
        for report in [&self.log.vertex, &self.log.fragment] {
            if let Some(e) = &report.rejected {
                return ShaderError::Nul(e.clone());
            }
        }
        for report in [&self.log.vertex, &self.log.fragment] {
            if !report.compiled {
                return ShaderError::Compilation {
                    stage: report.stage,
                    log: report.log.clone(),
                };
            }
        }
        ShaderError::Linking(self.log.link.clone())
    }
}

impl<B: ShaderBackend> fmt::Debug for ProgramBuild<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgramBuild")
            .field("handle", &self.handle)
            .field("status", &self.status)
            .field("log", &self.log)
            .finish()
    }
}

/// Reads both stage sources and builds a program from them.
pub fn build_program<B, P, Q>(backend: B, vertex_path: P, fragment_path: Q) -> ProgramBuild<B>
where
    B: ShaderBackend,
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let vertex = load_source(vertex_path);
    let fragment = load_source(fragment_path);
    build_program_from_sources(backend, &vertex, &fragment)
}

pub fn build_program_from_sources<B: ShaderBackend>(
    backend: B,
    vertex: &ShaderSource,
    fragment: &ShaderSource,
) -> ProgramBuild<B> {
    let (vertex_id, vertex_report) = compile_stage(&backend, ShaderStage::Vertex, vertex);
    let (fragment_id, fragment_report) = compile_stage(&backend, ShaderStage::Fragment, fragment);

    let program = backend.create_program();
    backend.attach_shader(program, vertex_id);
    backend.attach_shader(program, fragment_id);
    backend.link_program(program);

    let linked = backend.link_status(program);
    let link_log = backend.program_info_log(program);
    report_log("program link", linked, &link_log);

    // Stage objects are dead weight once the program is linked, or failed to.
    backend.detach_shader(program, vertex_id);
    backend.detach_shader(program, fragment_id);
    backend.delete_shader(vertex_id);
    backend.delete_shader(fragment_id);

    let status = if linked && vertex_report.compiled && fragment_report.compiled {
        BuildStatus::Linked
    } else {
        BuildStatus::Failed
    };
    debug!("Built shader program {} ({:?})", program, status);

    ProgramBuild {
        handle: program,
        status,
        log: DiagnosticLog {
            vertex: vertex_report,
            fragment: fragment_report,
            link: link_log,
        },
        backend,
    }
}

fn compile_stage<B: ShaderBackend>(
    backend: &B,
    stage: ShaderStage,
    source: &ShaderSource,
) -> (GLuint, StageReport) {
    let shader = backend.create_shader(stage);

    let rejected = backend.shader_source(shader, source.text()).err();
    if rejected.is_some() {
        // Still compile something so the stage has a defined state.
        let cleared = backend.shader_source(shader, "");
        debug_assert!(cleared.is_ok(), "an empty source has no interior NUL");
    }
    backend.compile_shader(shader);

    let mut compiled = backend.compile_status(shader);
    let mut log = backend.shader_info_log(shader);
    if let Some(e) = &rejected {
        compiled = false;
        log.insert_str(0, &format!("{} shader source rejected: {}\n", stage, e));
    }
    report_log(&format!("{} shader compile", stage), compiled, &log);

    let origin = match source {
        ShaderSource::Loaded(_) => SourceOrigin::Provided,
        ShaderSource::Unavailable { path, reason } => SourceOrigin::Unavailable {
            path: path.clone(),
            reason: reason.clone(),
        },
    };

    (
        shader,
        StageReport {
            stage,
            source: origin,
            compiled,
            log,
            rejected,
        },
    )
}

fn report_log(what: &str, ok: bool, log: &str) {
    let log = log.trim_end();
    if log.is_empty() {
        return;
    }
    if ok {
        warn!("{} produced diagnostics:\n{}", what, log);
    } else {
        error!("{} failed:\n{}", what, log);
    }
}

/// Owned GL program with a uniform location cache. Deleted on drop.
pub struct ShaderProgram<B: ShaderBackend = GlBackend> {
    id: GLuint,
    backend: B,
    uniforms: HashMap<String, GLint>,
}

impl<B: ShaderBackend> ShaderProgram<B> {
    pub fn from_raw(backend: B, id: GLuint) -> Self {
        Self {
            id,
            backend,
            uniforms: HashMap::new(),
        }
    }

    pub fn id(&self) -> GLuint {
        self.id
    }

    pub fn set_used(&self) {
        self.backend.use_program(self.id);
    }

    pub fn uniform_location(&mut self, name: &str) -> GLint {
        if let Some(location) = self.uniforms.get(name) {
            return *location;
        }

        let location = self.backend.uniform_location(self.id, name);
        if location == -1 {
            warn!("Uniform '{}' not found in program {}", name, self.id);
        }

        self.uniforms.insert(name.to_string(), location);
        location
    }

    pub fn set_uniform_mat4(&mut self, name: &str, mat: &Mat4) {
        self.set_used();
        let location = self.uniform_location(name);
        if location != -1 {
            self.backend.uniform_matrix4(location, &mat.to_cols_array());
        }
    }
}

impl<B: ShaderBackend> Drop for ShaderProgram<B> {
    fn drop(&mut self) {
        if self.id != 0 {
            self.backend.delete_program(self.id);
        }
    }
}
