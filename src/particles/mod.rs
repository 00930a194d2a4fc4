//! # Particles Module
//!
//! The GPU-resident particle swarm: the flow-field integrator, the feedback
//! compute engine that advances per-particle state in a ping-pong texture
//! pair, the instanced point-sprite render path, and the state-texture debug
//! view.

mod debug_view;
mod feedback;
mod flow_field;
mod swarm;

pub use debug_view::StateDebugView;
pub use feedback::{grid_size_for, ComputeInitError, FeedbackCompute, StateTargets};
pub use flow_field::{integrate, BaseParticle, FlowFieldParams, ParticleState};
pub use swarm::ParticleSwarm;
