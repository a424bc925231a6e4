//! GPU side of the renderer.
//!
//! - `context` owns the wgpu instance, surface, device and queue.
//! - `pipeline` builds the shape pipeline and its bind group layouts.
//! - `textures` uploads the two image textures with their mip chains.
//! - `geometry` owns the shape vertex/index buffers.
//! - `state` ties them together and records one frame per call.

mod context;
mod geometry;
mod pipeline;
mod state;
mod textures;

pub(crate) use state::GpuState;
