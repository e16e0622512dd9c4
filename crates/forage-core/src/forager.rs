use crate::config::{
    NoTargetBehavior, PopulationLayout, SensingShape, SimConfig, TargetSelection, TurnRule,
    WorldBounds,
};
use crate::resource::ResourceField;
use crate::spatial;
use rand::Rng;
use rayon::prelude::*;
use std::f64::consts::TAU;

/// A mobile agent that accumulates wealth by eating resources.
#[derive(Clone, Debug, PartialEq)]
pub struct Forager {
    pub position: [f64; 2],
    pub angle: f64,
    pub speed: f64,
    pub sensing_radius: f64,
    pub wealth: u64,
    /// Render footprint. Grows by a fixed step per resource eaten.
    pub footprint: f64,
}

impl Forager {
    pub fn new(
        position: [f64; 2],
        angle: f64,
        speed: f64,
        sensing_radius: f64,
        footprint: f64,
    ) -> Self {
        Self {
            position,
            angle,
            speed: speed.max(0.0),
            sensing_radius,
            wealth: 0,
            footprint,
        }
    }

    fn advance_along_heading(&mut self, bounds: &WorldBounds) {
        self.position[0] += self.speed * self.angle.cos();
        self.position[1] += self.speed * self.angle.sin();
        bounds.apply(&mut self.position, &mut self.angle);
    }

    /// Pick a heading from the resources still visible this tick and move.
    pub(crate) fn steer<R: Rng + ?Sized>(
        &mut self,
        visible: &[[f64; 2]],
        rules: &ForagingRules,
        rng: &mut R,
    ) {
        if visible.is_empty() {
            if rules.no_target == NoTargetBehavior::Continue {
                self.advance_along_heading(&rules.bounds);
            }
            return;
        }

        let target = match rules.target_selection {
            TargetSelection::RandomPick => visible[rng.random_range(0..visible.len())],
            TargetSelection::Centroid => {
                let n = visible.len() as f64;
                let (sx, sy) = visible
                    .iter()
                    .fold((0.0, 0.0), |(sx, sy), p| (sx + p[0], sy + p[1]));
                [sx / n, sy / n]
            }
        };
        let heading = (target[1] - self.position[1]).atan2(target[0] - self.position[0]);
        self.angle = rules.turn.perturb(rng, heading);
        self.advance_along_heading(&rules.bounds);
    }

    /// Strict Euclidean reach test from the current position.
    fn reaches(&self, point: [f64; 2]) -> bool {
        let dx = point[0] - self.position[0];
        let dy = point[1] - self.position[1];
        dx * dx + dy * dy < self.sensing_radius * self.sensing_radius
    }

    pub(crate) fn consume(&mut self, footprint_growth: f64) {
        self.wealth += 1;
        self.footprint += footprint_growth;
    }
}

/// Per-run movement and sensing rules, resolved once from `SimConfig`.
#[derive(Clone, Copy, Debug)]
pub struct ForagingRules {
    pub bounds: WorldBounds,
    pub sensing_shape: SensingShape,
    pub no_target: NoTargetBehavior,
    pub target_selection: TargetSelection,
    pub turn: TurnRule,
    pub footprint_growth: f64,
}

impl ForagingRules {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            bounds: config.bounds(),
            sensing_shape: config.sensing_shape,
            no_target: config.no_target_behavior,
            target_selection: config.target_selection,
            turn: config.turn_rule(),
            footprint_growth: config.footprint_growth,
        }
    }
}

/// Owns every forager and runs the per-tick sense/move/eat pass in a fixed order.
#[derive(Clone, Debug)]
pub struct ForagerPopulation {
    foragers: Vec<Forager>,
    rules: ForagingRules,
}

impl ForagerPopulation {
    /// Lay foragers out on a regular grid spanning the world, each with a
    /// random initial heading.
    pub fn lay_out<R: Rng + ?Sized>(config: &SimConfig, rng: &mut R) -> Self {
        let (spacing_x, spacing_y) = match config.population_layout {
            PopulationLayout::SquareRootGrid => {
                let root = (config.population_size as f64).sqrt();
                (
                    (config.world_width / root).floor().max(1.0),
                    (config.world_height / root).floor().max(1.0),
                )
            }
            PopulationLayout::FixedSpacing => {
                let spacing = (config.population_size as f64).max(1.0);
                (spacing, spacing)
            }
        };
        let xs = grid_axis(config.world_width, spacing_x);
        let ys = grid_axis(config.world_height, spacing_y);

        let mut foragers = Vec::with_capacity(xs.len() * ys.len());
        for &y in &ys {
            for &x in &xs {
                foragers.push(Forager::new(
                    [x, y],
                    rng.random::<f64>() * TAU,
                    config.forager_speed(),
                    config.sensing_radius,
                    config.forager_footprint(),
                ));
            }
        }
        Self::from_foragers(config, foragers)
    }

    pub fn from_foragers(config: &SimConfig, foragers: Vec<Forager>) -> Self {
        Self {
            foragers,
            rules: ForagingRules::from_config(config),
        }
    }

    /// Run one tick of foraging against the field and return how many
    /// resources were eaten.
    ///
    /// Sensing is a read-only pass over a snapshot index and runs in
    /// parallel. Moving and eating then run serially in population order:
    /// a resource eaten by an earlier forager is invisible to every later
    /// one, and removals hit the field only after the pass completes.
    pub fn advance<R: Rng + ?Sized>(&mut self, field: &mut ResourceField, rng: &mut R) -> usize {
        if field.is_empty() && self.rules.no_target == NoTargetBehavior::Stationary {
            return 0;
        }
        let tree = spatial::build_index(field.resources());
        let shape = self.rules.sensing_shape;
        let sensed: Vec<Vec<usize>> = self
            .foragers
            .par_iter()
            .map(|f| spatial::query_sensed(&tree, f.position, f.sensing_radius, shape))
            .collect();

        let resources = field.resources();
        let mut consumed = vec![false; resources.len()];
        for (forager, candidates) in self.foragers.iter_mut().zip(sensed) {
            let candidates: Vec<usize> = candidates
                .into_iter()
                .filter(|&idx| !consumed[idx])
                .collect();
            let visible: Vec<[f64; 2]> =
                candidates.iter().map(|&idx| resources[idx].position).collect();
            forager.steer(&visible, &self.rules, rng);

            // Only resources sensed before the move can be eaten after it.
            for idx in candidates {
                if forager.reaches(resources[idx].position) {
                    consumed[idx] = true;
                    forager.consume(self.rules.footprint_growth);
                }
            }
        }
        field.remove_consumed(&consumed)
    }

    /// Add `delta` to every forager's speed, flooring at zero.
    pub fn change_speed(&mut self, delta: f64) {
        for forager in &mut self.foragers {
            forager.speed = (forager.speed + delta).max(0.0);
        }
    }

    pub fn foragers(&self) -> &[Forager] {
        &self.foragers
    }

    pub fn len(&self) -> usize {
        self.foragers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.foragers.is_empty()
    }

    pub fn wealth(&self) -> Vec<u64> {
        self.foragers.iter().map(|f| f.wealth).collect()
    }

    pub fn total_wealth(&self) -> u64 {
        self.foragers.iter().map(|f| f.wealth).sum()
    }
}

/// Coordinates `0, spacing, 2*spacing, ...` strictly below `extent`.
fn grid_axis(extent: f64, spacing: f64) -> Vec<f64> {
    (0..)
        .map(|i| i as f64 * spacing)
        .take_while(|&v| v < extent)
        .collect()
}
