pub mod lifecycle;
pub mod metrics;
#[cfg(test)]
mod tests;

pub use lifecycle::{ControlSignal, SignalSchedule};
pub use metrics::*;

use crate::config::{SimConfig, SimConfigError};
use crate::forager::{Forager, ForagerPopulation};
use crate::resource::{Resource, ResourceField};
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use thiserror::Error;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Running,
    Halted,
}

/// Final state of a run handed to the reporting layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunOutcome {
    pub wealth: Vec<u64>,
    pub population_size: usize,
    pub initial_resources: usize,
    pub remaining_resources: usize,
    pub ticks_run: usize,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] SimConfigError),
    #[error("population layout produced no foragers")]
    EmptyPopulation,
    #[error("forager {index} starts outside the world at {position:?}")]
    ForagerOutOfBounds { index: usize, position: [f64; 2] },
    #[error("resource {index} starts outside the world at {position:?}")]
    ResourceOutOfBounds { index: usize, position: [f64; 2] },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    #[error("sample_every must be positive")]
    InvalidSampleEvery,
}

/// One foraging run: the resource field, the forager population, the
/// seeded random source and the tick clock driving them.
pub struct Simulation {
    pub(crate) config: SimConfig,
    pub(crate) field: ResourceField,
    pub(crate) population: ForagerPopulation,
    pub(crate) rng: ChaCha12Rng,
    pub(crate) tick: usize,
    pub(crate) state: RunState,
    pub(crate) stopped_early: bool,
    pub(crate) consumed_last_tick: usize,
    pub(crate) last_timings: StepTimings,
}

impl Simulation {
    /// Lay out foragers on a grid and scatter resources, all from `config.seed`.
    pub fn new(config: SimConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let mut init_rng = ChaCha12Rng::seed_from_u64(config.seed);
        let population = ForagerPopulation::lay_out(&config, &mut init_rng);
        if population.is_empty() {
            return Err(SimulationError::EmptyPopulation);
        }
        let field = ResourceField::scatter(&config, &mut init_rng);
        Ok(Self::assemble(config, population, field))
    }

    /// Build a run from hand-placed entities. `population_size` and
    /// `resource_density` in `config` are not consulted beyond validation.
    pub fn from_parts(
        config: SimConfig,
        foragers: Vec<Forager>,
        resources: Vec<Resource>,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        if foragers.is_empty() {
            return Err(SimulationError::EmptyPopulation);
        }
        let bounds = config.bounds();
        if let Some((index, f)) = foragers
            .iter()
            .enumerate()
            .find(|(_, f)| !bounds.contains(f.position))
        {
            return Err(SimulationError::ForagerOutOfBounds {
                index,
                position: f.position,
            });
        }
        if let Some((index, r)) = resources
            .iter()
            .enumerate()
            .find(|(_, r)| !bounds.contains(r.position))
        {
            return Err(SimulationError::ResourceOutOfBounds {
                index,
                position: r.position,
            });
        }
        let population = ForagerPopulation::from_foragers(&config, foragers);
        let field = ResourceField::from_resources(&config, resources);
        Ok(Self::assemble(config, population, field))
    }

    fn assemble(config: SimConfig, population: ForagerPopulation, field: ResourceField) -> Self {
        debug!(
            foragers = population.len(),
            resources = field.len(),
            tick_limit = config.tick_limit,
            boundary = ?config.boundary_policy,
            sensing = ?config.sensing_shape,
            no_target = ?config.no_target_behavior,
            selection = ?config.target_selection,
            "simulation constructed"
        );
        Self {
            rng: ChaCha12Rng::seed_from_u64(config.seed.wrapping_add(1)),
            config,
            field,
            population,
            tick: 0,
            state: RunState::Running,
            stopped_early: false,
            consumed_last_tick: 0,
            last_timings: StepTimings::default(),
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn field(&self) -> &ResourceField {
        &self.field
    }

    pub fn population(&self) -> &ForagerPopulation {
        &self.population
    }

    pub fn tick(&self) -> usize {
        self.tick
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == RunState::Halted
    }

    pub fn stopped_early(&self) -> bool {
        self.stopped_early
    }

    pub fn last_timings(&self) -> &StepTimings {
        &self.last_timings
    }

    /// Wealth of every forager in population order. Meaningful at any point;
    /// final once `is_finished()`.
    pub fn final_wealth_vector(&self) -> Vec<u64> {
        self.population.wealth()
    }

    pub fn outcome(&self) -> RunOutcome {
        RunOutcome {
            wealth: self.final_wealth_vector(),
            population_size: self.population.len(),
            initial_resources: self.field.initial_count(),
            remaining_resources: self.field.len(),
            ticks_run: self.tick,
        }
    }

    /// Run the remaining ticks, firing scheduled speed signals, and sample
    /// metrics every `sample_every` ticks and at the final tick.
    pub fn run(
        &mut self,
        schedule: &SignalSchedule,
        sample_every: usize,
    ) -> Result<RunSummary, RunError> {
        if sample_every == 0 {
            return Err(RunError::InvalidSampleEvery);
        }
        let remaining = self.config.tick_limit.saturating_sub(self.tick);
        let mut samples = Vec::with_capacity(remaining / sample_every + 1);
        while !self.is_finished() {
            for signal in schedule.signals_at(self.tick) {
                self.apply_signal(signal);
            }
            self.advance_tick(ControlSignal::None);
            if self.tick % sample_every == 0 || self.is_finished() {
                samples.push(self.collect_tick_metrics());
            }
        }
        Ok(self.summary(sample_every, samples))
    }

    fn summary(&self, sample_every: usize, samples: Vec<TickMetrics>) -> RunSummary {
        RunSummary {
            schema_version: 1,
            ticks_run: self.tick,
            tick_limit: self.config.tick_limit,
            sample_every,
            stopped_early: self.stopped_early,
            population_size: self.population.len(),
            initial_resources: self.field.initial_count(),
            remaining_resources: self.field.len(),
            samples,
            final_wealth: self.final_wealth_vector(),
        }
    }
}
