//! Layered configuration: built-in defaults, then the TOML file, then flags.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use renderer::types::{
    DEFAULT_TEXTURE_A, DEFAULT_TEXTURE_B, DEFAULT_WINDOW_SIZE, DEFAULT_WINDOW_TITLE,
};
use renderer::{
    GeometryPolicy, RenderMode, RendererConfig, ShaderFailurePolicy, ShaderSources,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::RunArgs;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse configuration at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub window: WindowSettings,
    pub textures: TextureSettings,
    pub shaders: ShaderSettings,
    pub render: RenderSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowSettings {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub vsync: bool,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: DEFAULT_WINDOW_SIZE.0,
            height: DEFAULT_WINDOW_SIZE.1,
            title: DEFAULT_WINDOW_TITLE.to_owned(),
            vsync: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextureSettings {
    pub a: PathBuf,
    pub b: PathBuf,
}

impl Default for TextureSettings {
    fn default() -> Self {
        Self {
            a: PathBuf::from(DEFAULT_TEXTURE_A),
            b: PathBuf::from(DEFAULT_TEXTURE_B),
        }
    }
}

/// Shader overrides; `None` keeps the built-in GLSL for that stage.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShaderSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertex: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragment: Option<PathBuf>,
    pub strict: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometrySetting {
    #[default]
    Cached,
    Transient,
}

impl From<GeometryPolicy> for GeometrySetting {
    fn from(policy: GeometryPolicy) -> Self {
        match policy {
            GeometryPolicy::Cached => Self::Cached,
            GeometryPolicy::Transient => Self::Transient,
        }
    }
}

impl From<GeometrySetting> for GeometryPolicy {
    fn from(setting: GeometrySetting) -> Self {
        match setting {
            GeometrySetting::Cached => Self::Cached,
            GeometrySetting::Transient => Self::Transient,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSettings {
    pub geometry: GeometrySetting,
    pub initial_mode: u8,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            geometry: GeometrySetting::default(),
            initial_mode: RenderMode::default().digit(),
        }
    }
}

impl Settings {
    pub fn from_toml_str(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads `explicit` if given (it must exist), otherwise `default_path`
    /// when present, otherwise the built-in defaults.
    pub fn load(explicit: Option<&Path>, default_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match (explicit, default_path) {
            (Some(path), _) => path,
            (None, Some(path)) if path.exists() => path,
            (None, _) => {
                tracing::debug!("no configuration file; using defaults");
                return Ok(Self::default());
            }
        };
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml_str(&contents, path)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(settings)
    }

    /// Applies command-line flags on top of the loaded values.
    pub fn apply_overrides(&mut self, args: &RunArgs) {
        if let Some(path) = &args.texture_a {
            self.textures.a = path.clone();
        }
        if let Some(path) = &args.texture_b {
            self.textures.b = path.clone();
        }
        if let Some((width, height)) = args.size {
            self.window.width = width;
            self.window.height = height;
        }
        if let Some(title) = &args.title {
            self.window.title = title.clone();
        }
        if let Some(path) = &args.vertex_shader {
            self.shaders.vertex = Some(path.clone());
        }
        if let Some(path) = &args.fragment_shader {
            self.shaders.fragment = Some(path.clone());
        }
        if let Some(policy) = args.geometry {
            self.render.geometry = policy.into();
        }
        if args.no_vsync {
            self.window.vsync = false;
        }
        if args.strict_shaders {
            self.shaders.strict = true;
        }
        if let Some(mode) = args.mode {
            self.render.initial_mode = mode.digit();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        if RenderMode::from_digit(self.render.initial_mode).is_none() {
            return Err(ConfigError::Invalid(format!(
                "render.initial_mode must be 1, 2, or 3, got {}",
                self.render.initial_mode
            )));
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize configuration to TOML")
    }

    /// Reads any shader overrides and builds the renderer configuration.
    pub fn shader_sources(&self) -> Result<ShaderSources> {
        let mut sources = ShaderSources::default();
        if let Some(path) = &self.shaders.vertex {
            sources.vertex = read_shader(path)?;
        }
        if let Some(path) = &self.shaders.fragment {
            sources.fragment = read_shader(path)?;
        }
        Ok(sources)
    }

    pub fn to_renderer_config(&self) -> Result<RendererConfig> {
        self.validate()?;
        let initial_mode = RenderMode::from_digit(self.render.initial_mode).unwrap_or_default();
        Ok(RendererConfig {
            window_size: (self.window.width, self.window.height),
            title: self.window.title.clone(),
            textures: [self.textures.a.clone(), self.textures.b.clone()],
            shaders: self.shader_sources()?,
            shader_failure: if self.shaders.strict {
                ShaderFailurePolicy::Abort
            } else {
                ShaderFailurePolicy::Continue
            },
            geometry: self.render.geometry.into(),
            vsync: self.window.vsync,
            initial_mode,
        })
    }
}

fn read_shader(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("failed to read shader at {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_default_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(None, Some(&dir.path().join("config.toml"))).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.window.title, "Computer Graphics");
        assert_eq!(settings.render.initial_mode, 1);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = Settings::load(Some(&dir.path().join("nope.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("nope.toml"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let settings = Settings::from_toml_str(
            "[window]\nwidth = 640\n\n[render]\ngeometry = \"transient\"\n",
            Path::new("config.toml"),
        )
        .unwrap();
        assert_eq!(settings.window.width, 640);
        assert_eq!(settings.window.height, 800);
        assert_eq!(settings.render.geometry, GeometrySetting::Transient);
        assert_eq!(settings.textures.a, PathBuf::from("texture1.jpg"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Settings::from_toml_str("[window]\nfullscreen = true\n", Path::new("c.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(Settings::from_toml_str("[audio]\n", Path::new("c.toml")).is_err());
    }

    #[test]
    fn flags_override_file_values() {
        let mut settings = Settings::from_toml_str(
            "[textures]\na = \"from-file.png\"\nb = \"b.png\"\n\n[window]\nvsync = true\n",
            Path::new("config.toml"),
        )
        .unwrap();
        let args = RunArgs {
            texture_a: Some(PathBuf::from("from-flag.png")),
            size: Some((320, 200)),
            no_vsync: true,
            strict_shaders: true,
            mode: Some(RenderMode::Triangle),
            geometry: Some(GeometryPolicy::Transient),
            ..RunArgs::default()
        };
        settings.apply_overrides(&args);

        assert_eq!(settings.textures.a, PathBuf::from("from-flag.png"));
        assert_eq!(settings.textures.b, PathBuf::from("b.png"));
        assert_eq!((settings.window.width, settings.window.height), (320, 200));
        assert!(!settings.window.vsync);
        assert!(settings.shaders.strict);
        assert_eq!(settings.render.initial_mode, 2);
        assert_eq!(settings.render.geometry, GeometrySetting::Transient);
    }

    #[test]
    fn invalid_values_fail_validation() {
        let mut settings = Settings::default();
        settings.window.height = 0;
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(_))));

        let mut settings = Settings::default();
        settings.render.initial_mode = 4;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("initial_mode"));
    }

    #[test]
    fn renderer_config_reads_shader_overrides() {
        let dir = TempDir::new().unwrap();
        let fragment = dir.path().join("custom.frag");
        fs::write(&fragment, "#version 450\nvoid main() {}\n").unwrap();

        let mut settings = Settings::default();
        settings.shaders.fragment = Some(fragment);
        settings.shaders.strict = true;
        let config = settings.to_renderer_config().unwrap();

        assert_eq!(config.shaders.fragment, "#version 450\nvoid main() {}\n");
        assert_eq!(config.shaders.vertex, ShaderSources::default().vertex);
        assert_eq!(config.shader_failure, ShaderFailurePolicy::Abort);
        assert_eq!(config.initial_mode, RenderMode::Square);
    }

    #[test]
    fn unreadable_shader_override_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut settings = Settings::default();
        settings.shaders.vertex = Some(dir.path().join("missing.vert"));
        let err = settings.to_renderer_config().unwrap_err();
        assert!(format!("{err:#}").contains("missing.vert"));
    }

    #[test]
    fn serialized_defaults_round_trip() {
        let text = Settings::default().to_toml().unwrap();
        assert!(text.contains("title = \"Computer Graphics\""));
        assert!(text.contains("geometry = \"cached\""));
        let parsed = Settings::from_toml_str(&text, Path::new("config.toml")).unwrap();
        assert_eq!(parsed, Settings::default());
    }
}
