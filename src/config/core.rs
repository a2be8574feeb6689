use super::rendering::{InputConfig, RenderConfig, ShaderConfig};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub window: WindowConfig,
    pub context: ContextConfig,
    pub shaders: ShaderConfig,
    pub render: RenderConfig,
    pub input: InputConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            window: WindowConfig::default(),
            context: ContextConfig::default(),
            shaders: ShaderConfig::default(),
            render: RenderConfig::default(),
            input: InputConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Hello OpenGL".to_string(),
            width: 1024,
            height: 768,
            resizable: false,
        }
    }
}

/// Requested OpenGL core profile version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    pub major: u8,
    pub minor: u8,
    pub vsync: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            major: 4,
            minor: 2,
            vsync: true,
        }
    }
}

impl AppConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file {:?}", path))
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }
}

/// Loads the config at `path`, writing the defaults there first if it does
/// not exist yet.
pub fn load_or_create_config(path: &Path) -> Result<AppConfig> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    if !path.exists() {
        let default_config = AppConfig::default();
        let toml_content = toml::to_string_pretty(&default_config)?;
        std::fs::write(path, toml_content).context("Failed to write default config")?;
        return Ok(default_config);
    }

    AppConfig::from_file(path)
}

pub fn get_config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "MetroManDevTeam", "hello_opengl")
        .context("Couldn't determine project directory")?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::transform::TransformMode;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_written_on_first_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let created = load_or_create_config(&path).unwrap();
        assert_eq!(created, AppConfig::default());
        assert!(path.exists());

        let reloaded = load_or_create_config(&path).unwrap();
        assert_eq!(reloaded, created);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            log_level = "debug"

            [shaders]
            abort_on_error = true

            [render]
            transform = "model_view_projection"
            "#,
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.log_level(), LevelFilter::Debug);
        assert!(config.shaders.abort_on_error);
        assert_eq!(config.shaders.vertex, ShaderConfig::default().vertex);
        assert_eq!(config.render.transform, TransformMode::ModelViewProjection);
        assert_eq!(config.render.scale, 0.5);
        assert_eq!(config.window.width, 1024);
        assert_eq!(config.context.major, 4);
    }

    #[test]
    fn test_bad_config_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "window = 3").unwrap();

        assert!(AppConfig::from_file(&path).is_err());
        assert!(AppConfig::from_file(dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn test_unknown_log_level_falls_back() {
        let config = AppConfig {
            log_level: "chatty".to_string(),
            ..Default::default()
        };
        assert_eq!(config.log_level(), LevelFilter::Info);
    }
}
