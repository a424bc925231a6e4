//! Renderer crate for grafika, a textured shape viewer.
//!
//! The flow from input to pixels:
//!
//! ```text
//!   winit events ──▶ window::key_input / scroll_offsets ──▶ AppState
//!                                                            │ mode, blend
//!                                                            ▼
//!   RedrawRequested ──▶ GpuState::render ──▶ frame_plan(mode) ──▶ draw_indexed per shape
//! ```
//!
//! The headless modules (`input`, `shapes`, `compile`, `texture`) hold the
//! rules and data and are tested without a GPU. `gpu` and `window` own the
//! device, surface and event loop.

pub mod compile;
mod gpu;
pub mod input;
pub mod shapes;
pub mod texture;
pub mod types;
mod window;

use anyhow::Result;

pub use compile::{compile_program, format_shader_error, LinkedProgram, ShaderError, ShaderStage};
pub use input::{AppState, BlendScalar, KeyAction, KeyInput, RenderMode};
pub use shapes::{frame_plan, DrawCall, ShapeKind, TextureSlot};
pub use types::{GeometryPolicy, RendererConfig, ShaderFailurePolicy, ShaderSources};

/// Entry point that owns the configuration for one window session.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Opens the window and blocks until it is closed.
    ///
    /// Returns an error when the event loop, window or GPU device cannot be
    /// created, or when the shader program is invalid under
    /// [`ShaderFailurePolicy::Abort`]. Texture failures are logged and never
    /// returned.
    pub fn run(self) -> Result<()> {
        window::run_window(self.config)
    }
}
