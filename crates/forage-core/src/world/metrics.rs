use super::Simulation;
use crate::analysis;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default)]
pub struct StepTimings {
    pub resource_us: u64,
    pub forage_us: u64,
    pub total_us: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TickMetrics {
    pub tick: usize,
    pub remaining_resources: usize,
    pub consumed_this_tick: usize,
    pub total_wealth: u64,
    pub max_wealth: u64,
    pub mean_footprint: f64,
    pub gini_coefficient: f64,
}

fn default_schema_version() -> u32 {
    1
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub ticks_run: usize,
    pub tick_limit: usize,
    pub sample_every: usize,
    #[serde(default)]
    pub stopped_early: bool,
    pub population_size: usize,
    pub initial_resources: usize,
    pub remaining_resources: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub samples: Vec<TickMetrics>,
    pub final_wealth: Vec<u64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ForagerSprite {
    pub position: [f64; 2],
    pub footprint: f64,
    pub wealth: u64,
}

/// Read-only view of every entity, for a renderer to draw one frame.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub tick: usize,
    pub resource_positions: Vec<[f64; 2]>,
    pub resource_radius: f64,
    pub foragers: Vec<ForagerSprite>,
}

impl Simulation {
    pub(crate) fn collect_tick_metrics(&self) -> TickMetrics {
        let foragers = self.population.foragers();
        let wealth = self.population.wealth();
        let denom = foragers.len().max(1) as f64;
        TickMetrics {
            tick: self.tick,
            remaining_resources: self.field.len(),
            consumed_this_tick: self.consumed_last_tick,
            total_wealth: wealth.iter().sum(),
            max_wealth: wealth.iter().copied().max().unwrap_or(0),
            mean_footprint: foragers.iter().map(|f| f.footprint).sum::<f64>() / denom,
            gini_coefficient: analysis::gini_coefficient(&wealth),
        }
    }

    pub fn entity_snapshot(&self) -> EntitySnapshot {
        EntitySnapshot {
            tick: self.tick,
            resource_positions: self.field.positions(),
            resource_radius: self.field.render_radius(),
            foragers: self
                .population
                .foragers()
                .iter()
                .map(|f| ForagerSprite {
                    position: f.position,
                    footprint: f.footprint,
                    wealth: f.wealth,
                })
                .collect(),
        }
    }
}
