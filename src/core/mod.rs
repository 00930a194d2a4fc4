//! # Core Module
//!
//! wgpu context management, timing, and the per-frame scheduler.

mod clock;
mod context;
mod scheduler;

pub use clock::Clock;
pub use context::{Context, ContextError};
pub use scheduler::{FrameScheduler, FrameTiming, SchedulerState};

/// Render configuration options.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Power preference for GPU selection.
    pub power_preference: wgpu::PowerPreference,
    /// Present mode (vsync).
    pub present_mode: wgpu::PresentMode,
    /// Clear color used behind the gradient sky.
    pub clear_color: wgpu::Color,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::HighPerformance,
            present_mode: wgpu::PresentMode::AutoVsync,
            // #060608, the bottom color of the default night gradient.
            clear_color: wgpu::Color {
                r: 0.0235,
                g: 0.0235,
                b: 0.0314,
                a: 1.0,
            },
        }
    }
}
