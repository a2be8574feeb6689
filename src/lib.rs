pub mod config;
pub mod demo;
pub mod input;
pub mod render;

// Re-export commonly used types
pub use config::core::AppConfig;
pub use demo::TriangleDemo;
pub use input::{CloseOnKey, ErrorHandler, InputAction, KeyHandler, LogErrorHandler};
pub use render::shaders::{
    build_program, build_program_from_sources, load_source, BuildStatus, DiagnosticLog,
    ProgramBuild, ShaderError, ShaderProgram, ShaderSource, ShaderStage,
};
