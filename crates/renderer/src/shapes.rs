//! Fixed shape geometry and the per-frame draw plan.
//!
//! Every shape is drawn through the same routine; the descriptors below only
//! differ in their vertex and index lists.

use bytemuck::{Pod, Zeroable};

use crate::input::{BlendScalar, RenderMode};

/// Interleaved vertex: position then texture coordinate (stride 5 floats).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub tex_coord: [f32; 2],
}

const fn vertex(x: f32, y: f32, u: f32, v: f32) -> Vertex {
    Vertex {
        position: [x, y, 0.0],
        tex_coord: [u, v],
    }
}

/// Floats per interleaved vertex.
pub const VERTEX_STRIDE_FLOATS: usize = 5;

/// Vertex attribute locations shared with the vertex shader.
pub const POSITION_LOCATION: u32 = 0;
pub const TEX_COORD_LOCATION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Square,
    Triangle,
    InvertedTriangle,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 3] = [Self::Square, Self::Triangle, Self::InvertedTriangle];

    pub fn geometry(self) -> &'static ShapeGeometry {
        match self {
            Self::Square => &SQUARE,
            Self::Triangle => &TRIANGLE,
            Self::InvertedTriangle => &INVERTED_TRIANGLE,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Square => "square",
            Self::Triangle => "triangle",
            Self::InvertedTriangle => "inverted triangle",
        }
    }
}

/// Static vertex and index lists for one shape.
#[derive(Debug)]
pub struct ShapeGeometry {
    pub vertices: &'static [Vertex],
    pub indices: &'static [u32],
}

impl ShapeGeometry {
    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.indices)
    }
}

pub static SQUARE: ShapeGeometry = ShapeGeometry {
    vertices: &[
        vertex(-0.5, -0.5, 0.0, 0.0),
        vertex(0.5, -0.5, 1.0, 0.0),
        vertex(0.5, 0.5, 1.0, 1.0),
        vertex(-0.5, 0.5, 0.0, 1.0),
    ],
    indices: &[0, 1, 2, 0, 2, 3],
};

pub static TRIANGLE: ShapeGeometry = ShapeGeometry {
    vertices: &[
        vertex(-0.5, -0.5, 0.0, 0.0),
        vertex(0.5, -0.5, 1.0, 0.0),
        vertex(0.0, 0.5, 0.5, 1.0),
    ],
    indices: &[0, 1, 2],
};

/// Shares its top edge with the bottom of [`SQUARE`] and points down.
pub static INVERTED_TRIANGLE: ShapeGeometry = ShapeGeometry {
    vertices: &[
        vertex(-0.5, -0.5, 0.0, 0.0),
        vertex(0.5, -0.5, 1.0, 0.0),
        vertex(0.0, -1.0, 0.5, 1.0),
    ],
    indices: &[0, 1, 2],
};

/// Which of the two loaded textures a draw samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    /// `texture1.jpg` by default.
    A,
    /// `texture2.jpg` by default.
    B,
}

impl TextureSlot {
    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

/// One indexed draw: a shape sampled with one texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    pub shape: ShapeKind,
    pub texture: TextureSlot,
}

impl DrawCall {
    pub fn index_count(&self) -> u32 {
        self.shape.geometry().index_count()
    }

    pub fn vertex_count(&self) -> u32 {
        self.shape.geometry().vertex_count()
    }
}

const SQUARE_A: DrawCall = DrawCall {
    shape: ShapeKind::Square,
    texture: TextureSlot::A,
};
const TRIANGLE_B: DrawCall = DrawCall {
    shape: ShapeKind::Triangle,
    texture: TextureSlot::B,
};
const INVERTED_TRIANGLE_B: DrawCall = DrawCall {
    shape: ShapeKind::InvertedTriangle,
    texture: TextureSlot::B,
};

/// Draws issued for one frame, in submission order.
pub fn frame_plan(mode: RenderMode) -> &'static [DrawCall] {
    match mode {
        RenderMode::Square => &[SQUARE_A],
        RenderMode::Triangle => &[TRIANGLE_B],
        RenderMode::SquareAndInvertedTriangle => &[SQUARE_A, INVERTED_TRIANGLE_B],
    }
}

/// Uniform block read by the fragment shader (`mixValue`), padded to 16 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct BlendUniforms {
    pub mix_value: f32,
    _padding: [f32; 3],
}

impl BlendUniforms {
    pub fn new(blend: BlendScalar) -> Self {
        Self {
            mix_value: blend.value(),
            _padding: [0.0; 3],
        }
    }
}
