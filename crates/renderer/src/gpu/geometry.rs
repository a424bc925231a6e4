use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::shapes::ShapeKind;
use crate::types::GeometryPolicy;

/// Vertex and index buffers for one shape.
pub(crate) struct ShapeBuffers {
    pub vertex: wgpu::Buffer,
    pub index: wgpu::Buffer,
    pub index_count: u32,
}

impl ShapeBuffers {
    pub fn create(device: &wgpu::Device, shape: ShapeKind) -> Self {
        let geometry = shape.geometry();
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(shape.label()),
            contents: geometry.vertex_bytes(),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(shape.label()),
            contents: geometry.index_bytes(),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex,
            index,
            index_count: geometry.index_count(),
        }
    }
}

/// Hands out shape buffers according to the configured [`GeometryPolicy`].
///
/// Cached buffers are built once up front. Transient buffers are built per
/// request and owned by the caller until the frame has been submitted.
pub(crate) struct GeometryStore {
    policy: GeometryPolicy,
    cached: HashMap<ShapeKind, ShapeBuffers>,
}

impl GeometryStore {
    pub fn new(device: &wgpu::Device, policy: GeometryPolicy) -> Self {
        let cached = match policy {
            GeometryPolicy::Cached => ShapeKind::ALL
                .into_iter()
                .map(|shape| (shape, ShapeBuffers::create(device, shape)))
                .collect(),
            GeometryPolicy::Transient => HashMap::new(),
        };
        tracing::debug!(%policy, cached = cached.len(), "geometry buffers ready");
        Self { policy, cached }
    }

    pub fn policy(&self) -> GeometryPolicy {
        self.policy
    }

    /// Buffers reused across frames, if this store caches `shape`.
    pub fn cached(&self, shape: ShapeKind) -> Option<&ShapeBuffers> {
        self.cached.get(&shape)
    }
}
