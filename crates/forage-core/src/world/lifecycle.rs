use super::metrics::StepTimings;
use super::{RunState, Simulation};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// External control input accepted once per tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlSignal {
    #[default]
    None,
    SpeedUp,
    SpeedDown,
}

/// Ticks (0-based, before the tick runs) at which speed signals fire.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalSchedule {
    pub speed_up: Vec<usize>,
    pub speed_down: Vec<usize>,
}

impl SignalSchedule {
    /// At most one `SpeedUp` then one `SpeedDown`, however often a tick is listed.
    pub fn signals_at(&self, tick: usize) -> impl Iterator<Item = ControlSignal> {
        let up = self
            .speed_up
            .contains(&tick)
            .then_some(ControlSignal::SpeedUp);
        let down = self
            .speed_down
            .contains(&tick)
            .then_some(ControlSignal::SpeedDown);
        up.into_iter().chain(down)
    }
}

impl Simulation {
    /// Apply `signal`, then advance one tick. No-op once halted.
    pub fn advance_tick(&mut self, signal: ControlSignal) -> RunState {
        if self.state == RunState::Halted {
            return RunState::Halted;
        }
        self.apply_signal(signal);
        self.last_timings = self.step();
        self.tick += 1;
        if self.tick >= self.config.tick_limit {
            self.halt();
        }
        self.state
    }

    /// Shift every resource's and forager's speed by the configured steps.
    pub fn apply_signal(&mut self, signal: ControlSignal) {
        let (resource_delta, forager_delta) = match signal {
            ControlSignal::None => return,
            ControlSignal::SpeedUp => (
                self.config.resource_speed_step,
                self.config.forager_speed_step,
            ),
            ControlSignal::SpeedDown => (
                -self.config.resource_speed_step,
                -self.config.forager_speed_step,
            ),
        };
        debug!(tick = self.tick, ?signal, "speed signal");
        self.field.change_speed(resource_delta);
        self.population.change_speed(forager_delta);
    }

    /// Halt before the tick limit. The wealth vector reflects the current state.
    pub fn request_stop(&mut self) {
        if self.state == RunState::Running {
            self.stopped_early = true;
            self.halt();
        }
    }

    fn halt(&mut self) {
        self.state = RunState::Halted;
        info!(
            ticks = self.tick,
            early = self.stopped_early,
            remaining_resources = self.field.len(),
            total_wealth = self.population.total_wealth(),
            "simulation halted"
        );
    }

    /// Resources drift, then foragers sense, move and eat.
    pub(crate) fn step(&mut self) -> StepTimings {
        let total_start = Instant::now();

        let t0 = Instant::now();
        self.field.advance(&mut self.rng);
        let resource_us = t0.elapsed().as_micros() as u64;

        let t1 = Instant::now();
        self.consumed_last_tick = self.population.advance(&mut self.field, &mut self.rng);
        let forage_us = t1.elapsed().as_micros() as u64;

        StepTimings {
            resource_us,
            forage_us,
            total_us: total_start.elapsed().as_micros() as u64,
        }
    }
}
