use std::path::Path;

use wgpu::util::{DeviceExt, TextureDataOrder};

use crate::shapes::TextureSlot;
use crate::texture::{load_or_placeholder, DecodedImage};

use super::pipeline::PipelineLayouts;

/// A texture uploaded with its full mip chain plus the bind group that exposes
/// it on texture unit 0.
pub(crate) struct GpuTexture {
    _texture: wgpu::Texture,
    _view: wgpu::TextureView,
    _sampler: wgpu::Sampler,
    pub bind_group: wgpu::BindGroup,
    pub is_placeholder: bool,
}

impl GpuTexture {
    /// Loads `path` into `slot`. Files that fail to decode or exceed the
    /// device's texture limit are replaced by a 1×1 black texel so the draws
    /// that sample this slot still run.
    pub fn load(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &PipelineLayouts,
        slot: TextureSlot,
        path: &Path,
    ) -> Self {
        let max_dimension = device.limits().max_texture_dimension_2d;
        let (image, is_placeholder) = load_or_placeholder(path, max_dimension);
        if !is_placeholder {
            tracing::info!(
                ?slot,
                path = %path.display(),
                width = image.width(),
                height = image.height(),
                "loaded texture"
            );
        }
        Self::upload(device, queue, layouts, slot, &image, is_placeholder)
    }

    fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &PipelineLayouts,
        slot: TextureSlot,
        image: &DecodedImage,
        is_placeholder: bool,
    ) -> Self {
        let label = format!("texture slot {slot:?}");
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(&label),
                size: wgpu::Extent3d {
                    width: image.width(),
                    height: image.height(),
                    depth_or_array_layers: 1,
                },
                mip_level_count: image.mip_level_count(),
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: image.format.wgpu_format(),
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            TextureDataOrder::LayerMajor,
            &image.packed_levels(),
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&label),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&label),
            layout: &layouts.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        Self {
            _texture: texture,
            _view: view,
            _sampler: sampler,
            bind_group,
            is_placeholder,
        }
    }
}
