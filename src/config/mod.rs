pub mod core;
pub mod rendering;

pub use self::core::{AppConfig, ContextConfig, WindowConfig};
pub use self::rendering::{InputConfig, RenderConfig, ShaderConfig};
