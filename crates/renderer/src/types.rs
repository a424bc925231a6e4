use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::compile::{FRAGMENT_SHADER_GLSL, VERTEX_SHADER_GLSL};
use crate::input::RenderMode;
use crate::shapes::TextureSlot;

pub const DEFAULT_WINDOW_SIZE: (u32, u32) = (1000, 800);
pub const DEFAULT_WINDOW_TITLE: &str = "Computer Graphics";
pub const DEFAULT_TEXTURE_A: &str = "texture1.jpg";
pub const DEFAULT_TEXTURE_B: &str = "texture2.jpg";

/// How shape vertex/index buffers are managed between draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeometryPolicy {
    /// Upload every shape once and reuse the buffers every frame.
    #[default]
    Cached,
    /// Allocate fresh buffers for every draw and release them once the frame is submitted.
    Transient,
}

impl fmt::Display for GeometryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cached => f.write_str("cached"),
            Self::Transient => f.write_str("transient"),
        }
    }
}

impl FromStr for GeometryPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cached" | "cache" => Ok(Self::Cached),
            "transient" | "per-draw" => Ok(Self::Transient),
            other => Err(format!(
                "unknown geometry policy '{other}'; expected cached or transient"
            )),
        }
    }
}

/// Where the GLSL for each stage comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

impl Default for ShaderSources {
    fn default() -> Self {
        Self {
            vertex: VERTEX_SHADER_GLSL.to_owned(),
            fragment: FRAGMENT_SHADER_GLSL.to_owned(),
        }
    }
}

/// What to do when the shader pair fails to compile or link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShaderFailurePolicy {
    /// Log the diagnostic and keep running with an invalid program.
    #[default]
    Continue,
    /// Abort start-up with the diagnostic.
    Abort,
}

/// Immutable configuration passed to the renderer at start-up.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Initial window size in logical pixels.
    pub window_size: (u32, u32),
    pub title: String,
    /// Texture files for slot A and slot B.
    pub textures: [PathBuf; 2],
    pub shaders: ShaderSources,
    pub shader_failure: ShaderFailurePolicy,
    pub geometry: GeometryPolicy,
    /// Prefer tear-free presentation (`Fifo`).
    pub vsync: bool,
    pub initial_mode: RenderMode,
}

impl RendererConfig {
    pub fn texture_path(&self, slot: TextureSlot) -> &PathBuf {
        &self.textures[slot.index()]
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            title: DEFAULT_WINDOW_TITLE.to_owned(),
            textures: [
                PathBuf::from(DEFAULT_TEXTURE_A),
                PathBuf::from(DEFAULT_TEXTURE_B),
            ],
            shaders: ShaderSources::default(),
            shader_failure: ShaderFailurePolicy::default(),
            geometry: GeometryPolicy::default(),
            vsync: true,
            initial_mode: RenderMode::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_classic_demo() {
        let config = RendererConfig::default();
        assert_eq!(config.window_size, (1000, 800));
        assert_eq!(config.title, "Computer Graphics");
        assert_eq!(config.texture_path(TextureSlot::A), &PathBuf::from("texture1.jpg"));
        assert_eq!(config.texture_path(TextureSlot::B), &PathBuf::from("texture2.jpg"));
        assert_eq!(config.initial_mode, RenderMode::Square);
        assert_eq!(config.shader_failure, ShaderFailurePolicy::Continue);
    }

    #[test]
    fn geometry_policy_parses_and_displays() {
        assert_eq!("cached".parse::<GeometryPolicy>(), Ok(GeometryPolicy::Cached));
        assert_eq!(" Transient ".parse::<GeometryPolicy>(), Ok(GeometryPolicy::Transient));
        assert!("pooled".parse::<GeometryPolicy>().is_err());
        assert_eq!(GeometryPolicy::Transient.to_string(), "transient");
    }
}
