//! Application state driven by keyboard and scroll input.
//!
//! The window loop translates platform events into [`KeyInput`] and scroll
//! offsets and hands them to [`AppState`]. Nothing in here touches the GPU,
//! which keeps the selection and blend rules testable on their own.

use std::fmt;

/// Blend change applied per scroll-wheel unit.
pub const BLEND_STEP: f64 = 0.1;

/// Pixel-precise scroll deltas are divided by this to get wheel units.
pub const PIXELS_PER_SCROLL_UNIT: f64 = 20.0;

/// Which shapes are drawn each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Key `1`: the square with texture A.
    #[default]
    Square,
    /// Key `2`: the triangle with texture B.
    Triangle,
    /// Key `3`: the square with texture A, then the inverted triangle with texture B.
    SquareAndInvertedTriangle,
}

impl RenderMode {
    /// Maps the digit keys `1`-`3` onto modes.
    pub fn from_digit(digit: u8) -> Option<Self> {
        match digit {
            1 => Some(Self::Square),
            2 => Some(Self::Triangle),
            3 => Some(Self::SquareAndInvertedTriangle),
            _ => None,
        }
    }

    pub fn digit(self) -> u8 {
        match self {
            Self::Square => 1,
            Self::Triangle => 2,
            Self::SquareAndInvertedTriangle => 3,
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Square => f.write_str("square"),
            Self::Triangle => f.write_str("triangle"),
            Self::SquareAndInvertedTriangle => f.write_str("square+inverted-triangle"),
        }
    }
}

/// Mix factor toward opaque black, always within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BlendScalar(f32);

impl BlendScalar {
    pub const MIN: f32 = 0.0;
    pub const MAX: f32 = 1.0;

    /// Clamps into `[MIN, MAX]`. NaN becomes `MIN`.
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self(Self::MIN);
        }
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Adds `y_offset` wheel units and clamps the result.
    pub fn scrolled(self, y_offset: f64) -> Self {
        let next = f64::from(self.0) + y_offset * BLEND_STEP;
        if next.is_nan() {
            return self;
        }
        Self(next.clamp(f64::from(Self::MIN), f64::from(Self::MAX)) as f32)
    }
}

/// Press/repeat/release as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Press,
    Repeat,
    Release,
}

/// A key event reduced to what the mode selection needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    /// Top-row digit for the key, `None` for every other key.
    pub digit: Option<u8>,
    pub action: KeyAction,
}

impl KeyInput {
    pub fn press(digit: u8) -> Self {
        Self {
            digit: Some(digit),
            action: KeyAction::Press,
        }
    }
}

/// Process-wide state shared by the input handlers and the render loop.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    mode: RenderMode,
    blend: BlendScalar,
}

impl AppState {
    pub fn new(mode: RenderMode) -> Self {
        Self {
            mode,
            blend: BlendScalar::default(),
        }
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn blend(&self) -> BlendScalar {
        self.blend
    }

    /// Applies a key event. Returns `true` when the mode changed.
    pub fn handle_key(&mut self, input: KeyInput) -> bool {
        if input.action != KeyAction::Press {
            return false;
        }
        let Some(mode) = input.digit.and_then(RenderMode::from_digit) else {
            return false;
        };
        let changed = self.mode != mode;
        self.mode = mode;
        if changed {
            tracing::debug!(%mode, "render mode selected");
        }
        changed
    }

    /// Applies a scroll event. `x_offset` is ignored.
    pub fn handle_scroll(&mut self, _x_offset: f64, y_offset: f64) {
        let next = self.blend.scrolled(y_offset);
        if next != self.blend {
            tracing::debug!(blend = next.value(), "blend factor changed");
        }
        self.blend = next;
    }
}
