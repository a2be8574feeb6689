use crate::render::shaders::ShaderStage;
use gl::types::*;
use std::ffi::{CString, NulError};
use std::ptr;

/// The slice of the GL API used to build, bind and feed shader programs.
///
/// `GlBackend` forwards to the loaded `gl` function pointers; tests swap in an
/// in-memory implementation so program builds can be checked without a context.
pub trait ShaderBackend {
    fn create_shader(&self, stage: ShaderStage) -> GLuint;
    fn shader_source(&self, shader: GLuint, source: &str) -> Result<(), NulError>;
    fn compile_shader(&self, shader: GLuint);
    fn compile_status(&self, shader: GLuint) -> bool;
    fn shader_info_log(&self, shader: GLuint) -> String;
    fn delete_shader(&self, shader: GLuint);

    fn create_program(&self) -> GLuint;
    fn attach_shader(&self, program: GLuint, shader: GLuint);
    fn detach_shader(&self, program: GLuint, shader: GLuint);
    fn link_program(&self, program: GLuint);
    fn link_status(&self, program: GLuint) -> bool;
    fn program_info_log(&self, program: GLuint) -> String;
    fn delete_program(&self, program: GLuint);

    fn use_program(&self, program: GLuint);
    fn uniform_location(&self, program: GLuint, name: &str) -> GLint;
    fn uniform_matrix4(&self, location: GLint, columns: &[f32; 16]);
    fn get_error(&self) -> GLenum;
}

impl<T: ShaderBackend + ?Sized> ShaderBackend for &T {
    fn create_shader(&self, stage: ShaderStage) -> GLuint {
        (**self).create_shader(stage)
    }
    fn shader_source(&self, shader: GLuint, source: &str) -> Result<(), NulError> {
        (**self).shader_source(shader, source)
    }
    fn compile_shader(&self, shader: GLuint) {
        (**self).compile_shader(shader)
    }
    fn compile_status(&self, shader: GLuint) -> bool {
        (**self).compile_status(shader)
    }
    fn shader_info_log(&self, shader: GLuint) -> String {
        (**self).shader_info_log(shader)
    }
    fn delete_shader(&self, shader: GLuint) {
        (**self).delete_shader(shader)
    }
    fn create_program(&self) -> GLuint {
        (**self).create_program()
    }
    fn attach_shader(&self, program: GLuint, shader: GLuint) {
        (**self).attach_shader(program, shader)
    }
    fn detach_shader(&self, program: GLuint, shader: GLuint) {
        (**self).detach_shader(program, shader)
    }
    fn link_program(&self, program: GLuint) {
        (**self).link_program(program)
    }
    fn link_status(&self, program: GLuint) -> bool {
        (**self).link_status(program)
    }
    fn program_info_log(&self, program: GLuint) -> String {
        (**self).program_info_log(program)
    }
    fn delete_program(&self, program: GLuint) {
        (**self).delete_program(program)
    }
    fn use_program(&self, program: GLuint) {
        (**self).use_program(program)
    }
    fn uniform_location(&self, program: GLuint, name: &str) -> GLint {
        (**self).uniform_location(program, name)
    }
    fn uniform_matrix4(&self, location: GLint, columns: &[f32; 16]) {
        (**self).uniform_matrix4(location, columns)
    }
    fn get_error(&self) -> GLenum {
        (**self).get_error()
    }
}

/// Backend over the global `gl` bindings. Requires `gl::load_with` to have run
/// on a thread with a current context.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlBackend;

impl ShaderBackend for GlBackend {
    fn create_shader(&self, stage: ShaderStage) -> GLuint {
        unsafe { gl::CreateShader(stage.gl_enum()) }
    }

    fn shader_source(&self, shader: GLuint, source: &str) -> Result<(), NulError> {
        let source = CString::new(source)?;
        unsafe {
            gl::ShaderSource(shader, 1, &source.as_ptr(), ptr::null());
        }
        Ok(())
    }

    fn compile_shader(&self, shader: GLuint) {
        unsafe { gl::CompileShader(shader) }
    }

    fn compile_status(&self, shader: GLuint) -> bool {
        let mut status = gl::FALSE as GLint;
        unsafe {
            gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut status);
        }
        status == gl::TRUE as GLint
    }

    fn shader_info_log(&self, shader: GLuint) -> String {
        let mut len = 0;
        unsafe {
            gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut len);
        }
        read_info_log(len, |capacity, written, buffer| unsafe {
            gl::GetShaderInfoLog(shader, capacity, written, buffer)
        })
    }

    fn delete_shader(&self, shader: GLuint) {
        unsafe { gl::DeleteShader(shader) }
    }

    fn create_program(&self) -> GLuint {
        unsafe { gl::CreateProgram() }
    }

    fn attach_shader(&self, program: GLuint, shader: GLuint) {
        unsafe { gl::AttachShader(program, shader) }
    }

    fn detach_shader(&self, program: GLuint, shader: GLuint) {
        unsafe { gl::DetachShader(program, shader) }
    }

    fn link_program(&self, program: GLuint) {
        unsafe { gl::LinkProgram(program) }
    }

    fn link_status(&self, program: GLuint) -> bool {
        let mut status = gl::FALSE as GLint;
        unsafe {
            gl::GetProgramiv(program, gl::LINK_STATUS, &mut status);
        }
        status == gl::TRUE as GLint
    }

    fn program_info_log(&self, program: GLuint) -> String {
        let mut len = 0;
        unsafe {
            gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut len);
        }
        read_info_log(len, |capacity, written, buffer| unsafe {
            gl::GetProgramInfoLog(program, capacity, written, buffer)
        })
    }

    fn delete_program(&self, program: GLuint) {
        unsafe { gl::DeleteProgram(program) }
    }

    fn use_program(&self, program: GLuint) {
        unsafe { gl::UseProgram(program) }
    }

    fn uniform_location(&self, program: GLuint, name: &str) -> GLint {
        match CString::new(name) {
            Ok(name) => unsafe { gl::GetUniformLocation(program, name.as_ptr()) },
            Err(_) => -1,
        }
    }

    fn uniform_matrix4(&self, location: GLint, columns: &[f32; 16]) {
        unsafe {
            gl::UniformMatrix4fv(location, 1, gl::FALSE, columns.as_ptr());
        }
    }

    fn get_error(&self) -> GLenum {
        unsafe { gl::GetError() }
    }
}

// `len` counts the trailing NUL the driver writes.
fn read_info_log<F>(len: GLint, fetch: F) -> String
where
    F: FnOnce(GLsizei, *mut GLsizei, *mut GLchar),
{
    if len <= 0 {
        return String::new();
    }

    let mut buffer = vec![0u8; len as usize];
    let mut written: GLsizei = 0;
    fetch(len, &mut written, buffer.as_mut_ptr() as *mut GLchar);
    buffer.truncate(written.clamp(0, len) as usize);

    String::from_utf8_lossy(&buffer).into_owned()
}

pub fn gl_error_name(code: GLenum) -> &'static str {
    match code {
        gl::NO_ERROR => "GL_NO_ERROR",
        gl::INVALID_ENUM => "GL_INVALID_ENUM",
        gl::INVALID_VALUE => "GL_INVALID_VALUE",
        gl::INVALID_OPERATION => "GL_INVALID_OPERATION",
        gl::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
        gl::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
        gl::STACK_UNDERFLOW => "GL_STACK_UNDERFLOW",
        gl::STACK_OVERFLOW => "GL_STACK_OVERFLOW",
        _ => "GL_UNKNOWN_ERROR",
    }
}

/// Drains the GL error queue, returning every pending error code.
pub fn drain_errors<B: ShaderBackend>(backend: &B) -> Vec<GLenum> {
    let mut errors = Vec::new();
    // GL keeps one flag per error kind, so the queue is short.
    for _ in 0..16 {
        match backend.get_error() {
            gl::NO_ERROR => break,
            code => errors.push(code),
        }
    }
    errors
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Debug)]
    pub struct FakeShader {
        pub stage: ShaderStage,
        pub source: Option<String>,
        pub compiled: Option<bool>,
        pub deleted: bool,
    }

    #[derive(Debug, Default)]
    pub struct FakeProgram {
        pub attached: Vec<GLuint>,
        pub linked: Option<bool>,
        pub deleted: u32,
    }

    #[derive(Debug, Default)]
    pub struct FakeState {
        next_id: GLuint,
        pub shaders: HashMap<GLuint, FakeShader>,
        pub programs: HashMap<GLuint, FakeProgram>,
        pub in_use: Option<GLuint>,
        pub location_queries: usize,
        pub matrices: Vec<(GLint, [f32; 16])>,
        pub errors: Vec<GLenum>,
    }

    /// Pretends to be a driver: a stage compiles when its source declares
    /// `void main`, a program links when one compiled vertex and one compiled
    /// fragment stage are attached.
    #[derive(Debug, Default)]
    pub struct FakeBackend {
        pub state: RefCell<FakeState>,
    }

    impl FakeBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn program_linked(&self, program: GLuint) -> Option<bool> {
            self.state.borrow().programs.get(&program).and_then(|p| p.linked)
        }

        pub fn program_deletions(&self, program: GLuint) -> u32 {
            self.state.borrow().programs.get(&program).map_or(0, |p| p.deleted)
        }

        pub fn live_shaders(&self) -> usize {
            self.state.borrow().shaders.values().filter(|s| !s.deleted).count()
        }

        fn next_id(&self) -> GLuint {
            let mut state = self.state.borrow_mut();
            state.next_id += 1;
            state.next_id
        }
    }

    impl ShaderBackend for FakeBackend {
        fn create_shader(&self, stage: ShaderStage) -> GLuint {
            let id = self.next_id();
            self.state.borrow_mut().shaders.insert(
                id,
                FakeShader {
                    stage,
                    source: None,
                    compiled: None,
                    deleted: false,
                },
            );
            id
        }

        fn shader_source(&self, shader: GLuint, source: &str) -> Result<(), NulError> {
            let source = CString::new(source)?;
            if let Some(s) = self.state.borrow_mut().shaders.get_mut(&shader) {
                s.source = Some(source.to_string_lossy().into_owned());
            }
            Ok(())
        }

        fn compile_shader(&self, shader: GLuint) {
            if let Some(s) = self.state.borrow_mut().shaders.get_mut(&shader) {
                let ok = s.source.as_deref().is_some_and(|src| src.contains("void main"));
                s.compiled = Some(ok);
            }
        }

        fn compile_status(&self, shader: GLuint) -> bool {
            self.state
                .borrow()
                .shaders
                .get(&shader)
                .and_then(|s| s.compiled)
                .unwrap_or(false)
        }

        fn shader_info_log(&self, shader: GLuint) -> String {
            let state = self.state.borrow();
            match state.shaders.get(&shader) {
                Some(s) if s.compiled == Some(false) => {
                    let token = s
                        .source
                        .as_deref()
                        .and_then(|src| src.split_whitespace().next())
                        .unwrap_or("");
                    format!("ERROR: 0:1: '{}' : syntax error\n", token)
                }
                _ => String::new(),
            }
        }

        fn delete_shader(&self, shader: GLuint) {
            if let Some(s) = self.state.borrow_mut().shaders.get_mut(&shader) {
                s.deleted = true;
            }
        }

        fn create_program(&self) -> GLuint {
            let id = self.next_id();
            self.state
                .borrow_mut()
                .programs
                .insert(id, FakeProgram::default());
            id
        }

        fn attach_shader(&self, program: GLuint, shader: GLuint) {
            if let Some(p) = self.state.borrow_mut().programs.get_mut(&program) {
                p.attached.push(shader);
            }
        }

        fn detach_shader(&self, program: GLuint, shader: GLuint) {
            if let Some(p) = self.state.borrow_mut().programs.get_mut(&program) {
                p.attached.retain(|&s| s != shader);
            }
        }

        fn link_program(&self, program: GLuint) {
            let mut state = self.state.borrow_mut();
            let attached = match state.programs.get(&program) {
                Some(p) => p.attached.clone(),
                None => return,
            };
            let compiled = |stage: ShaderStage| {
                attached
                    .iter()
                    .filter_map(|id| state.shaders.get(id))
                    .filter(|s| s.stage == stage && s.compiled == Some(true))
                    .count()
                    == 1
            };
            let ok = compiled(ShaderStage::Vertex) && compiled(ShaderStage::Fragment);
            if let Some(p) = state.programs.get_mut(&program) {
                p.linked = Some(ok);
            }
        }

        fn link_status(&self, program: GLuint) -> bool {
            self.program_linked(program).unwrap_or(false)
        }

        fn program_info_log(&self, program: GLuint) -> String {
            match self.program_linked(program) {
                Some(false) => {
                    "ERROR: Linking failed: attached shaders were not compiled successfully\n"
                        .to_string()
                }
                _ => String::new(),
            }
        }

        fn delete_program(&self, program: GLuint) {
            if let Some(p) = self.state.borrow_mut().programs.get_mut(&program) {
                p.deleted += 1;
            }
        }

        fn use_program(&self, program: GLuint) {
            self.state.borrow_mut().in_use = Some(program);
        }

        fn uniform_location(&self, program: GLuint, name: &str) -> GLint {
            self.state.borrow_mut().location_queries += 1;
            match (self.program_linked(program), name) {
                (Some(true), "transform") => 0,
                _ => -1,
            }
        }

        fn uniform_matrix4(&self, location: GLint, columns: &[f32; 16]) {
            self.state.borrow_mut().matrices.push((location, *columns));
        }

        fn get_error(&self) -> GLenum {
            let mut state = self.state.borrow_mut();
            if state.errors.is_empty() {
                gl::NO_ERROR
            } else {
                state.errors.remove(0)
            }
        }
    }
}
