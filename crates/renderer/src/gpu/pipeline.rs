use std::borrow::Cow;
use std::mem;

use wgpu::naga::ShaderStage;

use crate::compile::{compile_program, ShaderError};
use crate::shapes::{Vertex, POSITION_LOCATION, TEX_COORD_LOCATION};
use crate::types::ShaderSources;

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 2] = [
    wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x3,
        offset: mem::offset_of!(Vertex, position) as wgpu::BufferAddress,
        shader_location: POSITION_LOCATION,
    },
    wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x2,
        offset: mem::offset_of!(Vertex, tex_coord) as wgpu::BufferAddress,
        shader_location: TEX_COORD_LOCATION,
    },
];

pub(crate) fn vertex_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRIBUTES,
    }
}

/// Bind group layouts shared by the pipeline and every bind group built against it.
pub(crate) struct PipelineLayouts {
    /// Group 0: the blend uniform block.
    pub uniform_layout: wgpu::BindGroupLayout,
    /// Group 1: one texture and its sampler (texture unit 0).
    pub texture_layout: wgpu::BindGroupLayout,
}

impl PipelineLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        Self {
            uniform_layout,
            texture_layout,
        }
    }
}

/// The linked shader program, or the record of why it could not be built.
///
/// An invalid program is kept rather than propagated so the window still
/// clears and presents; draws are skipped while it is in place.
pub(crate) enum ShaderProgram {
    Ready(wgpu::RenderPipeline),
    Invalid(ShaderError),
}

impl ShaderProgram {
    /// Compiles and links `sources`, then builds the render pipeline.
    pub fn build(
        device: &wgpu::Device,
        layouts: &PipelineLayouts,
        surface_format: wgpu::TextureFormat,
        sources: &ShaderSources,
    ) -> Self {
        match try_build(device, layouts, surface_format, sources) {
            Ok(pipeline) => {
                tracing::debug!("shader program linked");
                Self::Ready(pipeline)
            }
            Err(err) => {
                tracing::error!("{err}");
                Self::Invalid(err)
            }
        }
    }

    pub fn pipeline(&self) -> Option<&wgpu::RenderPipeline> {
        match self {
            Self::Ready(pipeline) => Some(pipeline),
            Self::Invalid(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ShaderError> {
        match self {
            Self::Ready(_) => None,
            Self::Invalid(err) => Some(err),
        }
    }
}

fn try_build(
    device: &wgpu::Device,
    layouts: &PipelineLayouts,
    surface_format: wgpu::TextureFormat,
    sources: &ShaderSources,
) -> Result<wgpu::RenderPipeline, ShaderError> {
    // Headless pass first: naga diagnostics carry line numbers, device errors do not.
    let program = compile_program(&sources.vertex, &sources.fragment)?;

    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("grafika vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(program.vertex.source()),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    });
    let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("grafika fragment"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(program.fragment.source()),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("shape pipeline layout"),
        bind_group_layouts: &[&layouts.uniform_layout, &layouts.texture_layout],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("shape pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &vertex_module,
            entry_point: Some("main"),
            buffers: &[vertex_buffer_layout()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: &fragment_module,
            entry_point: Some("main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview: None,
        cache: None,
    });

    match pollster::block_on(device.pop_error_scope()) {
        Some(error) => Err(ShaderError::Link(error.to_string())),
        None => Ok(pipeline),
    }
}
