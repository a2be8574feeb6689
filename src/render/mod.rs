pub mod backend;
pub mod mesh;
pub mod shaders;
pub mod transform;

pub use backend::{GlBackend, ShaderBackend};
pub use mesh::TriangleMesh;
pub use shaders::{build_program, ProgramBuild, ShaderError, ShaderProgram};
pub use transform::TransformMode;
