//! Scene settings exposed to the host control surface.

use serde::{Deserialize, Serialize};

/// Tunable scene parameters.
///
/// Numeric setters clamp to the declared ranges, so shader code never needs
/// runtime validation. The struct is `Copy`: the scene takes one snapshot per
/// tick and feeds the same values to the compute and render stages, so a
/// concurrent host mutation can never tear within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneSettings {
    flow_field_influence: f32,
    flow_field_strength: f32,
    flow_field_frequency: f32,
    particle_base_size: f32,
    lifetime_cycle: f32,
    /// Draw the twinkling starfield backdrop.
    pub show_starfield: bool,
    /// Draw the state-texture debug view in the corner of the frame.
    pub show_state_debug: bool,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            flow_field_influence: 0.175,
            flow_field_strength: 2.0,
            flow_field_frequency: 0.5,
            particle_base_size: 0.128,
            lifetime_cycle: 1.0 / 0.3,
            show_starfield: true,
            show_state_debug: false,
        }
    }
}

impl SceneSettings {
    /// How strongly particles are pulled back toward their seed shape, in `[0, 1]`.
    /// At `1.0` the flow field is fully suppressed.
    #[inline]
    pub fn flow_field_influence(&self) -> f32 {
        self.flow_field_influence
    }

    /// Set the flow field influence, clamped to `[0, 1]`.
    pub fn set_flow_field_influence(&mut self, value: f32) {
        self.flow_field_influence = value.clamp(0.0, 1.0);
    }

    /// Displacement scale applied per second, in `[0, 10]`.
    #[inline]
    pub fn flow_field_strength(&self) -> f32 {
        self.flow_field_strength
    }

    /// Set the flow field strength, clamped to `[0, 10]`.
    pub fn set_flow_field_strength(&mut self, value: f32) {
        self.flow_field_strength = value.clamp(0.0, 10.0);
    }

    /// Spatial frequency of the noise field, in `[0, 1]`.
    #[inline]
    pub fn flow_field_frequency(&self) -> f32 {
        self.flow_field_frequency
    }

    /// Set the flow field frequency, clamped to `[0, 1]`.
    pub fn set_flow_field_frequency(&mut self, value: f32) {
        self.flow_field_frequency = value.clamp(0.0, 1.0);
    }

    /// Base point-sprite size, in `[0, 1]`.
    #[inline]
    pub fn particle_base_size(&self) -> f32 {
        self.particle_base_size
    }

    /// Set the base point-sprite size, clamped to `[0, 1]`.
    pub fn set_particle_base_size(&mut self, value: f32) {
        self.particle_base_size = value.clamp(0.0, 1.0);
    }

    /// Seconds per particle lifetime cycle (respawn pacing).
    #[inline]
    pub fn lifetime_cycle(&self) -> f32 {
        self.lifetime_cycle
    }

    /// Set the lifetime cycle duration, clamped to `[0.1, 60]` seconds.
    /// Affects only visual pacing, never correctness.
    pub fn set_lifetime_cycle(&mut self, seconds: f32) {
        self.lifetime_cycle = seconds.clamp(0.1, 60.0);
    }

    /// Take a per-tick snapshot of the settings.
    #[inline]
    pub fn snapshot(&self) -> Self {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_in_range() {
        let settings = SceneSettings::default();
        assert!((0.0..=1.0).contains(&settings.flow_field_influence()));
        assert!((0.0..=10.0).contains(&settings.flow_field_strength()));
        assert!((0.0..=1.0).contains(&settings.flow_field_frequency()));
        assert!((0.0..=1.0).contains(&settings.particle_base_size()));
    }

    #[test]
    fn setters_clamp_to_declared_ranges() {
        let mut settings = SceneSettings::default();

        settings.set_flow_field_influence(2.5);
        assert_eq!(settings.flow_field_influence(), 1.0);
        settings.set_flow_field_influence(-1.0);
        assert_eq!(settings.flow_field_influence(), 0.0);

        settings.set_flow_field_strength(100.0);
        assert_eq!(settings.flow_field_strength(), 10.0);

        settings.set_flow_field_frequency(-0.5);
        assert_eq!(settings.flow_field_frequency(), 0.0);

        settings.set_particle_base_size(7.0);
        assert_eq!(settings.particle_base_size(), 1.0);

        settings.set_lifetime_cycle(0.0);
        assert_eq!(settings.lifetime_cycle(), 0.1);
    }

    #[test]
    fn snapshot_is_independent_of_later_mutation() {
        let mut settings = SceneSettings::default();
        let snapshot = settings.snapshot();
        settings.set_flow_field_strength(9.0);
        assert_eq!(snapshot.flow_field_strength(), 2.0);
    }
}
