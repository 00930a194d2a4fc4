//! # Driftfield - GPU Flow-Field Particle Scene
//!
//! Driftfield renders an interactive 3D particle swarm with wgpu. Particle
//! state lives entirely on the GPU in a ping-pong texture pair; a compute
//! pass advances every particle through a time-varying flow field each frame,
//! and an instanced point-sprite pass draws the result over a twinkling
//! starfield and a gradient sky.
//!
//! ## Features
//!
//! - **Feedback compute**: square state textures sized to the particle count,
//!   swapped every tick, never read and written by the same dispatch
//! - **Flow field**: a pure integrator (lifetime cycle, noise displacement,
//!   pull toward the seed shape) mirrored between Rust and WGSL
//! - **Point sprites**: additive, depth-independent billboards colored by the
//!   seed mesh's vertex colors
//! - **Starfield & sky**: self-contained backdrop passes
//!
//! ## Example
//!
//! ```ignore
//! use driftfield::prelude::*;
//!
//! let mesh = SeedMesh::from_glb_bytes(&glb_bytes)?;
//! let mut scene = FlowScene::new(window, 1280, 720, mesh, RenderConfig::default()).await?;
//!
//! // Per frame, driven by the host event loop:
//! scene.render()?;
//!
//! // Host visibility notifications:
//! scene.set_visible(false);
//! ```

#![warn(missing_docs)]

#[cfg(feature = "web")]
use wasm_bindgen::prelude::*;

pub mod camera;
pub mod config;
pub mod core;
pub mod environment;
pub mod loaders;
pub mod particles;
pub mod scene;
pub mod starfield;

// Re-export commonly used types
pub mod prelude {
    //! Convenient re-exports of commonly used types.

    pub use crate::camera::PerspectiveCamera;
    pub use crate::config::SceneSettings;
    pub use crate::core::{
        Clock, Context, ContextError, FrameScheduler, FrameTiming, RenderConfig, SchedulerState,
    };
    pub use crate::environment::{ColorStop, GradientSky};
    pub use crate::loaders::{LoadError, SeedMesh};
    pub use crate::particles::{
        BaseParticle, ComputeInitError, FeedbackCompute, FlowFieldParams, ParticleState,
        ParticleSwarm, StateDebugView,
    };
    pub use crate::scene::{FlowScene, SceneInitError};
    pub use crate::starfield::Starfield;
}

/// Initialize the library for WASM environments.
/// Sets up panic hooks for better error messages in the browser console.
#[cfg(feature = "web")]
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = "Driftfield";
