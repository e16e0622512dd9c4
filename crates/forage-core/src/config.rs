use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How entities behave when a move carries them past a world edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Leave through one edge, re-enter through the opposite one.
    #[default]
    Wrap,
    /// Clamp to the edge and mirror the heading component normal to it.
    Reflect,
}

/// Shape of the region a forager can see.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SensingShape {
    /// Euclidean distance strictly below the sensing radius.
    #[default]
    Disc,
    /// Independent per-axis test: `|dx| <= r && |dy| <= r`.
    Box,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NoTargetBehavior {
    /// Keep moving along the current heading.
    #[default]
    Continue,
    Stationary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TargetSelection {
    /// Steer toward one sensed resource chosen uniformly at random.
    #[default]
    RandomPick,
    /// Steer toward the mean position of every sensed resource.
    Centroid,
}

/// How `population_size` is turned into a regular grid of starting positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PopulationLayout {
    /// Grid spacing `floor(extent / sqrt(n))` on each axis, yielding roughly `n` foragers.
    #[default]
    SquareRootGrid,
    /// `population_size` is the grid spacing itself, in world units.
    FixedSpacing,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub seed: u64,
    pub world_width: f64,
    pub world_height: f64,
    pub population_size: usize,
    pub population_layout: PopulationLayout,
    /// Number of resources scattered at start.
    pub resource_density: usize,
    pub sensing_radius: f64,
    pub tick_limit: usize,
    pub boundary_policy: BoundaryPolicy,
    pub sensing_shape: SensingShape,
    pub no_target_behavior: NoTargetBehavior,
    pub target_selection: TargetSelection,
    /// Global scale applied to entity speeds and sizes (not to sensing).
    pub size_factor: f64,
    pub forager_base_speed: f64,
    pub forager_base_size: f64,
    pub resource_base_speed: f64,
    pub resource_size: f64,
    pub turn_probability: f64,
    pub turn_jitter: f64,
    pub resource_speed_step: f64,
    pub forager_speed_step: f64,
    pub footprint_growth: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            world_width: 800.0,
            world_height: 600.0,
            population_size: 100,
            population_layout: PopulationLayout::SquareRootGrid,
            resource_density: 1000,
            sensing_radius: 10.0,
            tick_limit: 1000,
            boundary_policy: BoundaryPolicy::Wrap,
            sensing_shape: SensingShape::Disc,
            no_target_behavior: NoTargetBehavior::Continue,
            target_selection: TargetSelection::RandomPick,
            size_factor: 0.5,
            forager_base_speed: 2.0,
            forager_base_size: 5.0,
            resource_base_speed: 1.0,
            resource_size: 3.0,
            turn_probability: 0.1,
            turn_jitter: 0.2,
            resource_speed_step: 1.0,
            forager_speed_step: 0.01,
            footprint_growth: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimConfigError {
    #[error("world dimensions must be positive and finite (got {width} x {height})")]
    InvalidWorldSize { width: f64, height: f64 },
    #[error("sensing_radius must be positive and finite (got {0})")]
    InvalidSensingRadius(f64),
    #[error("resource_density must be positive")]
    InvalidResourceDensity,
    #[error("tick_limit must be positive")]
    InvalidTickLimit,
    #[error("population_size must be positive")]
    EmptyPopulation,
    #[error("{name} must be non-negative and finite (got {value})")]
    InvalidMagnitude { name: &'static str, value: f64 },
    #[error("turn_probability must be within [0, 1] (got {0})")]
    InvalidTurnProbability(f64),
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), SimConfigError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.world_width) || !positive(self.world_height) {
            return Err(SimConfigError::InvalidWorldSize {
                width: self.world_width,
                height: self.world_height,
            });
        }
        if !positive(self.sensing_radius) {
            return Err(SimConfigError::InvalidSensingRadius(self.sensing_radius));
        }
        if self.resource_density == 0 {
            return Err(SimConfigError::InvalidResourceDensity);
        }
        if self.tick_limit == 0 {
            return Err(SimConfigError::InvalidTickLimit);
        }
        if self.population_size == 0 {
            return Err(SimConfigError::EmptyPopulation);
        }
        for (name, value) in [
            ("size_factor", self.size_factor),
            ("forager_base_speed", self.forager_base_speed),
            ("forager_base_size", self.forager_base_size),
            ("resource_base_speed", self.resource_base_speed),
            ("resource_size", self.resource_size),
            ("turn_jitter", self.turn_jitter),
            ("resource_speed_step", self.resource_speed_step),
            ("forager_speed_step", self.forager_speed_step),
            ("footprint_growth", self.footprint_growth),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SimConfigError::InvalidMagnitude { name, value });
            }
        }
        if !(0.0..=1.0).contains(&self.turn_probability) {
            return Err(SimConfigError::InvalidTurnProbability(self.turn_probability));
        }
        Ok(())
    }

    pub fn forager_speed(&self) -> f64 {
        self.forager_base_speed * self.size_factor
    }

    pub fn forager_footprint(&self) -> f64 {
        self.forager_base_size * self.size_factor
    }

    pub fn resource_speed(&self) -> f64 {
        self.resource_base_speed * self.size_factor
    }

    pub fn resource_radius(&self) -> f64 {
        self.resource_size * self.size_factor
    }

    pub fn bounds(&self) -> WorldBounds {
        WorldBounds {
            width: self.world_width,
            height: self.world_height,
            policy: self.boundary_policy,
        }
    }

    pub fn turn_rule(&self) -> TurnRule {
        TurnRule {
            probability: self.turn_probability,
            jitter: self.turn_jitter,
        }
    }
}

/// Fixed world rectangle plus the edge policy every entity obeys.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldBounds {
    pub width: f64,
    pub height: f64,
    pub policy: BoundaryPolicy,
}

impl WorldBounds {
    pub fn contains(&self, position: [f64; 2]) -> bool {
        (0.0..=self.width).contains(&position[0]) && (0.0..=self.height).contains(&position[1])
    }

    /// Bring a freshly moved entity back inside the rectangle, adjusting its
    /// heading under `Reflect`.
    pub fn apply(&self, position: &mut [f64; 2], angle: &mut f64) {
        match self.policy {
            BoundaryPolicy::Wrap => {
                position[0] = wrap_coord(position[0], self.width);
                position[1] = wrap_coord(position[1], self.height);
            }
            BoundaryPolicy::Reflect => {
                if position[0] > self.width || position[0] < 0.0 {
                    position[0] = position[0].clamp(0.0, self.width);
                    *angle = std::f64::consts::PI - *angle;
                }
                if position[1] > self.height || position[1] < 0.0 {
                    position[1] = position[1].clamp(0.0, self.height);
                    *angle = -*angle;
                }
                *angle = angle.rem_euclid(std::f64::consts::TAU);
            }
        }
    }
}

fn wrap_coord(value: f64, extent: f64) -> f64 {
    let wrapped = value.rem_euclid(extent);
    // rem_euclid can round up to `extent` for tiny negative inputs.
    if wrapped >= extent {
        0.0
    } else {
        wrapped
    }
}

/// Occasional heading perturbation shared by resources and foragers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TurnRule {
    pub probability: f64,
    pub jitter: f64,
}

impl TurnRule {
    pub fn perturb<R: rand::Rng + ?Sized>(&self, rng: &mut R, angle: f64) -> f64 {
        if rng.random::<f64>() < self.probability && self.jitter > 0.0 {
            angle + rng.random_range(-self.jitter..=self.jitter)
        } else {
            angle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(SimConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_non_positive_inputs() {
        let cases = [
            SimConfig {
                world_width: 0.0,
                ..SimConfig::default()
            },
            SimConfig {
                world_height: f64::NAN,
                ..SimConfig::default()
            },
            SimConfig {
                sensing_radius: -1.0,
                ..SimConfig::default()
            },
            SimConfig {
                resource_density: 0,
                ..SimConfig::default()
            },
            SimConfig {
                tick_limit: 0,
                ..SimConfig::default()
            },
        ];
        for config in cases {
            assert!(config.validate().is_err(), "{config:?} should be rejected");
        }
    }

    #[test]
    fn zero_population_is_its_own_error() {
        let config = SimConfig {
            population_size: 0,
            ..SimConfig::default()
        };
        assert_eq!(config.validate(), Err(SimConfigError::EmptyPopulation));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: SimConfig = serde_json::from_str(
            r#"{"population_size": 16, "boundary_policy": "reflect", "sensing_shape": "box"}"#,
        )
        .expect("parse config");
        assert_eq!(config.population_size, 16);
        assert_eq!(config.boundary_policy, BoundaryPolicy::Reflect);
        assert_eq!(config.sensing_shape, SensingShape::Box);
        assert_eq!(config.tick_limit, 1000);
    }

    #[test]
    fn speeds_and_sizes_scale_with_size_factor() {
        let config = SimConfig::default();
        assert_eq!(config.forager_speed(), 1.0);
        assert_eq!(config.forager_footprint(), 2.5);
        assert_eq!(config.resource_speed(), 0.5);
        assert_eq!(config.resource_radius(), 1.5);
    }

    #[test]
    fn wrap_teleports_to_opposite_edge() {
        let bounds = WorldBounds {
            width: 100.0,
            height: 50.0,
            policy: BoundaryPolicy::Wrap,
        };
        let mut pos = [101.0, -1.0];
        let mut angle = 0.3;
        bounds.apply(&mut pos, &mut angle);
        assert!((pos[0] - 1.0).abs() < 1e-12);
        assert!((pos[1] - 49.0).abs() < 1e-12);
        assert_eq!(angle, 0.3);
    }

    #[test]
    fn reflect_clamps_and_mirrors_normal_component() {
        let bounds = WorldBounds {
            width: 100.0,
            height: 50.0,
            policy: BoundaryPolicy::Reflect,
        };
        let mut pos = [100.5, 25.0];
        let mut angle = 0.25;
        bounds.apply(&mut pos, &mut angle);
        assert_eq!(pos, [100.0, 25.0]);
        // Heading now points back into the world along x.
        assert!(angle.cos() < 0.0);
        assert!((angle.sin() - 0.25f64.sin()).abs() < 1e-12);

        let mut pos = [10.0, -0.5];
        let mut angle = 1.5 * PI;
        bounds.apply(&mut pos, &mut angle);
        assert_eq!(pos, [10.0, 0.0]);
        assert!(angle.sin() > 0.0);
    }
}
