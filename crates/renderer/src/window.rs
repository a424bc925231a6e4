use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{ElementState, Event, KeyEvent, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowBuilder};

use tracing::{error, info, warn};

use crate::gpu::GpuState;
use crate::input::{AppState, KeyAction, KeyInput, PIXELS_PER_SCROLL_UNIT};
use crate::types::RendererConfig;

/// Window, GPU state and input state for the interactive loop.
///
/// `gpu` is declared before `window` so the surface is released first.
struct WindowState {
    gpu: GpuState,
    window: Arc<Window>,
    app: AppState,
}

impl WindowState {
    fn new(window: Arc<Window>, config: &RendererConfig) -> Result<Self> {
        let size = window.inner_size();
        let gpu = GpuState::new(window.as_ref(), size, config)
            .context("failed to initialise GPU renderer")?;
        Ok(Self {
            gpu,
            window,
            app: AppState::new(config.initial_mode),
        })
    }

    fn window(&self) -> &Window {
        self.window.as_ref()
    }

    fn handle_key(&mut self, event: &KeyEvent) {
        self.app.handle_key(key_input(event));
    }

    fn handle_scroll(&mut self, delta: MouseScrollDelta) {
        let (x, y) = scroll_offsets(delta);
        self.app.handle_scroll(x, y);
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.gpu.resize(new_size);
    }

    /// Returns `false` when the loop should stop.
    fn render_frame(&mut self) -> bool {
        match self.gpu.render(&self.app) {
            Ok(()) => true,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.gpu.reconfigure();
                true
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("surface out of memory; closing window");
                false
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("surface timeout; retrying next frame");
                true
            }
            Err(other) => {
                warn!("surface error: {other:?}; retrying next frame");
                true
            }
        }
    }
}

/// Opens the window and runs the render loop until it is closed.
pub(crate) fn run_window(config: RendererConfig) -> Result<()> {
    let event_loop = EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;

    let (width, height) = config.window_size;
    let window = WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(LogicalSize::new(width, height))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = Arc::new(window);

    let mut state = WindowState::new(window, &config)?;
    info!(
        title = %config.title,
        mode = %config.initial_mode,
        size = ?state.gpu.size(),
        "window ready; keys 1-3 select shapes, scroll fades to black"
    );

    event_loop.set_control_flow(ControlFlow::Poll);
    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
                match event {
                    WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                        elwt.exit();
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        state.handle_key(&event);
                    }
                    WindowEvent::MouseWheel { delta, .. } => {
                        state.handle_scroll(delta);
                    }
                    WindowEvent::Resized(new_size) => {
                        state.resize(new_size);
                    }
                    WindowEvent::RedrawRequested => {
                        if !state.render_frame() {
                            elwt.exit();
                        }
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                state.window().request_redraw();
            }
            Event::LoopExiting => {
                info!("window closed");
            }
            _ => {}
        })
        .map_err(|err| anyhow!("window event loop error: {err}"))
}

/// Top-row digit keys only; the numeric keypad does not select modes.
pub(crate) fn digit_from_key_code(code: KeyCode) -> Option<u8> {
    let digit = match code {
        KeyCode::Digit0 => 0,
        KeyCode::Digit1 => 1,
        KeyCode::Digit2 => 2,
        KeyCode::Digit3 => 3,
        KeyCode::Digit4 => 4,
        KeyCode::Digit5 => 5,
        KeyCode::Digit6 => 6,
        KeyCode::Digit7 => 7,
        KeyCode::Digit8 => 8,
        KeyCode::Digit9 => 9,
        _ => return None,
    };
    Some(digit)
}

pub(crate) fn key_action(state: ElementState, repeat: bool) -> KeyAction {
    match (state, repeat) {
        (ElementState::Released, _) => KeyAction::Release,
        (ElementState::Pressed, true) => KeyAction::Repeat,
        (ElementState::Pressed, false) => KeyAction::Press,
    }
}

fn key_input(event: &KeyEvent) -> KeyInput {
    let digit = match event.physical_key {
        PhysicalKey::Code(code) => digit_from_key_code(code),
        PhysicalKey::Unidentified(_) => None,
    };
    KeyInput {
        digit,
        action: key_action(event.state, event.repeat),
    }
}

/// Wheel offsets in scroll units. Pixel deltas (touchpads) are scaled down.
pub(crate) fn scroll_offsets(delta: MouseScrollDelta) -> (f64, f64) {
    match delta {
        MouseScrollDelta::LineDelta(x, y) => (f64::from(x), f64::from(y)),
        MouseScrollDelta::PixelDelta(position) => (
            position.x / PIXELS_PER_SCROLL_UNIT,
            position.y / PIXELS_PER_SCROLL_UNIT,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn only_top_row_digits_map() {
        assert_eq!(digit_from_key_code(KeyCode::Digit1), Some(1));
        assert_eq!(digit_from_key_code(KeyCode::Digit3), Some(3));
        assert_eq!(digit_from_key_code(KeyCode::Numpad1), None);
        assert_eq!(digit_from_key_code(KeyCode::KeyA), None);
    }

    #[test]
    fn repeat_is_distinguished_from_press() {
        assert_eq!(key_action(ElementState::Pressed, false), KeyAction::Press);
        assert_eq!(key_action(ElementState::Pressed, true), KeyAction::Repeat);
        assert_eq!(key_action(ElementState::Released, false), KeyAction::Release);
    }

    #[test]
    fn line_delta_passes_through() {
        assert_eq!(scroll_offsets(MouseScrollDelta::LineDelta(0.0, -2.0)), (0.0, -2.0));
    }

    #[test]
    fn pixel_delta_is_scaled_to_units() {
        let (x, y) = scroll_offsets(MouseScrollDelta::PixelDelta(PhysicalPosition::new(
            10.0, 40.0,
        )));
        assert_eq!(x, 0.5);
        assert_eq!(y, 2.0);
    }

    #[test]
    fn scroll_through_state_clamps_at_one() {
        let mut app = AppState::default();
        let (x, y) = scroll_offsets(MouseScrollDelta::PixelDelta(PhysicalPosition::new(
            0.0, 400.0,
        )));
        app.handle_scroll(x, y);
        assert_eq!(app.blend().value(), 1.0);
    }
}
