//! The per-particle flow-field update rule.
//!
//! This is the reference form of the integrator that the compute shader
//! (`shaders/flow_field_compute.wgsl`) runs once per texel per frame. The two
//! implementations are kept structurally identical; this one is the
//! documentation of the rule and the target of the simulation tests.
//!
//! The rule is a pure function of its inputs. No hidden state, no per-call
//! randomness: every random quantity is baked into [`BaseParticle`] at init.
//! That keeps a full compute dispatch bit-reproducible and order-independent
//! across particles.

use crate::config::SceneSettings;
use glam::Vec3;

/// One particle's mutable state: a texel in the feedback textures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleState {
    /// Current world position.
    pub position: Vec3,
    /// Lifetime phase in `[0, 1]`; wrapping past 1 respawns the particle.
    pub lifetime: f32,
}

/// One particle's immutable seed data, set once at init.
#[derive(Debug, Clone, Copy)]
pub struct BaseParticle {
    /// Rest position, taken from the seed mesh vertex.
    pub rest_position: Vec3,
    /// Independent random scalar in `[0, 1)`.
    pub random_seed: f32,
}

/// Parameters of the flow-field integrator.
#[derive(Debug, Clone, Copy)]
pub struct FlowFieldParams {
    /// Pull toward the rest shape, `[0, 1]`. At 1 the field is suppressed.
    pub influence: f32,
    /// Displacement scale per second, `[0, 10]`.
    pub strength: f32,
    /// Spatial frequency of the noise field, `[0, 1]`.
    pub frequency: f32,
    /// Seconds per lifetime cycle.
    pub cycle_duration: f32,
}

impl FlowFieldParams {
    /// Extract the integrator parameters from a settings snapshot.
    pub fn from_settings(settings: &SceneSettings) -> Self {
        Self {
            influence: settings.flow_field_influence(),
            strength: settings.flow_field_strength(),
            frequency: settings.flow_field_frequency(),
            cycle_duration: settings.lifetime_cycle(),
        }
    }
}

/// GLSL-style fract: always in `[0, 1)`, also for negative inputs.
#[inline]
fn fract(x: f32) -> f32 {
    x - x.floor()
}

#[inline]
fn fract3(v: Vec3) -> Vec3 {
    v - v.floor()
}

/// Cheap 3D hash, identical to the WGSL version.
fn hash(p: Vec3) -> f32 {
    let mut p3 = fract3(p * 0.1031);
    p3 += Vec3::splat(p3.dot(Vec3::new(p3.y, p3.z, p3.x) + Vec3::splat(33.33)));
    fract((p3.x + p3.y) * p3.z)
}

/// Smooth hash-based value noise in `[0, 1]`.
fn value_noise(p: Vec3) -> f32 {
    let i = p.floor();
    let f = p - i;
    let u = f * f * (Vec3::splat(3.0) - 2.0 * f);

    let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;

    let x00 = lerp(hash(i), hash(i + Vec3::X), u.x);
    let x10 = lerp(hash(i + Vec3::Y), hash(i + Vec3::new(1.0, 1.0, 0.0)), u.x);
    let x01 = lerp(hash(i + Vec3::Z), hash(i + Vec3::new(1.0, 0.0, 1.0)), u.x);
    let x11 = lerp(
        hash(i + Vec3::new(0.0, 1.0, 1.0)),
        hash(i + Vec3::ONE),
        u.x,
    );

    lerp(lerp(x00, x10, u.y), lerp(x01, x11, u.y), u.z)
}

/// Sample the flow field: a smooth vector in `[-1, 1]^3`.
pub fn flow_vector(p: Vec3, offset: Vec3) -> Vec3 {
    2.0 * Vec3::new(
        value_noise(p + offset) - 0.5,
        value_noise(p + offset + Vec3::new(100.0, 0.0, 0.0)) - 0.5,
        value_noise(p + offset + Vec3::new(0.0, 100.0, 0.0)) - 0.5,
    )
}

/// Advance one particle by one frame.
///
/// 1. The lifetime phase advances by `dt / cycle_duration`. Past 1.0 it wraps
///    and the particle respawns exactly at its rest position, so field
///    displacement can never accumulate unboundedly.
/// 2. Otherwise the flow field is sampled at the particle's position (scaled
///    by frequency, offset by its seed and the scene time) and blended with
///    the vector pointing home, weighted by `influence`. The blend is scaled
///    by `strength * dt` and added to the position.
pub fn integrate(
    prev: ParticleState,
    base: BaseParticle,
    time: f32,
    dt: f32,
    params: &FlowFieldParams,
) -> ParticleState {
    let lifetime = prev.lifetime + dt / params.cycle_duration;
    if lifetime > 1.0 {
        return ParticleState {
            position: base.rest_position,
            lifetime: lifetime - 1.0,
        };
    }

    let t = time * 0.2;
    let offset = Vec3::new(
        base.random_seed * 100.0 + t,
        base.random_seed * 200.0 + t * 0.85,
        base.random_seed * 300.0 + t * 0.7,
    );

    let field = flow_vector(prev.position * params.frequency, offset);
    let home = base.rest_position - prev.position;
    let displacement = field.lerp(home, params.influence);

    ParticleState {
        position: prev.position + displacement * params.strength * dt,
        lifetime,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> FlowFieldParams {
        FlowFieldParams {
            influence: 0.175,
            strength: 2.0,
            frequency: 0.5,
            cycle_duration: 1.0,
        }
    }

    fn base(rest: Vec3, seed: f32) -> BaseParticle {
        BaseParticle {
            rest_position: rest,
            random_seed: seed,
        }
    }

    #[test]
    fn respawn_snaps_exactly_to_rest_position() {
        let rest = Vec3::new(1.25, -3.5, 0.75);
        let prev = ParticleState {
            position: Vec3::new(40.0, 12.0, -7.0),
            lifetime: 0.95,
        };

        let next = integrate(prev, base(rest, 0.42), 10.0, 0.1, &params());

        assert_eq!(next.position, rest);
        assert!((next.lifetime - 0.05).abs() < 1e-6);
        assert!(next.lifetime <= 1.0);
    }

    #[test]
    fn integrator_is_bit_deterministic() {
        let prev = ParticleState {
            position: Vec3::new(0.3, 1.7, -2.1),
            lifetime: 0.4,
        };
        let seed = base(Vec3::new(0.1, 0.2, 0.3), 0.77);

        let a = integrate(prev, seed, 123.456, 0.016, &params());
        let b = integrate(prev, seed, 123.456, 0.016, &params());

        assert_eq!(a.position.to_array().map(f32::to_bits), b.position.to_array().map(f32::to_bits));
        assert_eq!(a.lifetime.to_bits(), b.lifetime.to_bits());
    }

    #[test]
    fn full_influence_holds_particles_at_their_seeds() {
        // Two-particle scenario: with influence = 1.0 the field contribution
        // vanishes and the pull-home vector is zero at the rest position.
        let full = FlowFieldParams {
            influence: 1.0,
            ..params()
        };
        let seeds = [Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)];

        for (i, rest) in seeds.iter().enumerate() {
            let prev = ParticleState {
                position: *rest,
                lifetime: 0.0,
            };
            let next = integrate(prev, base(*rest, i as f32 * 0.5), 0.0, 0.1, &full);
            assert_eq!(next.position, *rest);
        }
    }

    #[test]
    fn flow_vector_stays_in_unit_cube() {
        for i in 0..100 {
            let p = Vec3::new(i as f32 * 0.37, i as f32 * -0.21, i as f32 * 0.13);
            let v = flow_vector(p, Vec3::splat(i as f32));
            assert!(v.abs().max_element() <= 1.0, "out of range at {p:?}: {v:?}");
        }
    }

    #[test]
    fn noise_is_smoothly_bounded() {
        for i in 0..200 {
            let p = Vec3::new(i as f32 * 0.61, -i as f32 * 0.43, i as f32 * 1.9);
            let n = value_noise(p);
            assert!((0.0..=1.0).contains(&n));
        }
    }

    #[test]
    fn lifetime_advances_by_delta_over_cycle() {
        let prev = ParticleState {
            position: Vec3::ZERO,
            lifetime: 0.25,
        };
        let long_cycle = FlowFieldParams {
            cycle_duration: 4.0,
            ..params()
        };
        let next = integrate(prev, base(Vec3::ZERO, 0.0), 1.0, 0.5, &long_cycle);
        assert!((next.lifetime - 0.375).abs() < 1e-6);
    }
}
