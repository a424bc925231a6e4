use anyhow::Result;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::dpi::PhysicalSize;

use crate::input::AppState;
use crate::shapes::{frame_plan, BlendUniforms, TextureSlot};
use crate::types::{GeometryPolicy, RendererConfig, ShaderFailurePolicy};

use super::context::GpuContext;
use super::geometry::{GeometryStore, ShapeBuffers};
use super::pipeline::{PipelineLayouts, ShaderProgram};
use super::textures::GpuTexture;

/// Everything the render loop needs on the GPU side.
///
/// Field order is drop order: textures and buffers go before the device and
/// surface held by `context`.
pub(crate) struct GpuState {
    program: ShaderProgram,
    textures: [GpuTexture; 2],
    geometry: GeometryStore,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    _layouts: PipelineLayouts,
    context: GpuContext,
}

impl GpuState {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        config: &RendererConfig,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, initial_size, config.vsync)?;
        let layouts = PipelineLayouts::new(&context.device);

        let program = ShaderProgram::build(
            &context.device,
            &layouts,
            context.surface_format,
            &config.shaders,
        );
        if let (Some(err), ShaderFailurePolicy::Abort) = (program.error(), config.shader_failure) {
            return Err(anyhow::Error::new(err.clone())
                .context("shader program is invalid and strict shaders are enabled"));
        }

        let textures = [TextureSlot::A, TextureSlot::B].map(|slot| {
            GpuTexture::load(
                &context.device,
                &context.queue,
                &layouts,
                slot,
                config.texture_path(slot),
            )
        });

        let geometry = GeometryStore::new(&context.device, config.geometry);

        let uniform_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("blend uniforms"),
            size: std::mem::size_of::<BlendUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("uniform bind group"),
                layout: &layouts.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });

        Ok(Self {
            program,
            textures,
            geometry,
            uniform_buffer,
            uniform_bind_group,
            _layouts: layouts,
            context,
        })
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.context.resize(new_size);
    }

    pub(crate) fn reconfigure(&mut self) {
        self.context.reconfigure();
    }

    /// Clears to black, draws the shapes selected by `app`, and presents.
    pub(crate) fn render(&mut self, app: &AppState) -> Result<(), wgpu::SurfaceError> {
        let frame = self.context.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.context.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&BlendUniforms::new(app.blend())),
        );

        let plan = frame_plan(app.mode());
        // Transient buffers must outlive the render pass and are dropped after submit.
        let transient: Vec<ShapeBuffers> = match self.geometry.policy() {
            GeometryPolicy::Cached => Vec::new(),
            GeometryPolicy::Transient => plan
                .iter()
                .map(|call| ShapeBuffers::create(&self.context.device, call.shape))
                .collect(),
        };

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("render encoder"),
                });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shape pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(pipeline) = self.program.pipeline() {
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                for (index, call) in plan.iter().enumerate() {
                    let Some(buffers) = self
                        .geometry
                        .cached(call.shape)
                        .or_else(|| transient.get(index))
                    else {
                        continue;
                    };
                    render_pass.set_bind_group(
                        1,
                        &self.textures[call.texture.index()].bind_group,
                        &[],
                    );
                    render_pass.set_vertex_buffer(0, buffers.vertex.slice(..));
                    render_pass.set_index_buffer(buffers.index.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..buffers.index_count, 0, 0..1);
                }
            }
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        drop(transient);
        Ok(())
    }
}

impl Drop for GpuState {
    fn drop(&mut self) {
        tracing::debug!(
            geometry = %self.geometry.policy(),
            placeholders = self.textures.iter().filter(|t| t.is_placeholder).count(),
            "releasing GPU resources"
        );
    }
}
