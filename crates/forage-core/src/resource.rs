use crate::config::{SimConfig, TurnRule, WorldBounds};
use rand::Rng;
use std::f64::consts::TAU;

/// A single consumable particle drifting across the world.
#[derive(Clone, Debug, PartialEq)]
pub struct Resource {
    pub position: [f64; 2],
    /// Drift heading in radians. Perturbed occasionally, never re-sampled.
    pub angle: f64,
    pub speed: f64,
}

impl Resource {
    pub fn new(position: [f64; 2], angle: f64, speed: f64) -> Self {
        Self {
            position,
            angle,
            speed: speed.max(0.0),
        }
    }

    fn drift<R: Rng + ?Sized>(&mut self, rng: &mut R, bounds: &WorldBounds, turn: &TurnRule) {
        self.position[0] += self.speed * self.angle.cos();
        self.position[1] += self.speed * self.angle.sin();
        self.angle = turn.perturb(rng, self.angle);
        bounds.apply(&mut self.position, &mut self.angle);
    }
}

/// Owns every live resource. Consumed resources are dropped, never respawned.
#[derive(Clone, Debug)]
pub struct ResourceField {
    resources: Vec<Resource>,
    bounds: WorldBounds,
    turn: TurnRule,
    render_radius: f64,
    initial_count: usize,
}

impl ResourceField {
    /// Scatter `config.resource_density` resources uniformly over the world.
    pub fn scatter<R: Rng + ?Sized>(config: &SimConfig, rng: &mut R) -> Self {
        let speed = config.resource_speed();
        let resources = (0..config.resource_density)
            .map(|_| {
                let position = [
                    rng.random::<f64>() * config.world_width,
                    rng.random::<f64>() * config.world_height,
                ];
                let angle = rng.random::<f64>() * TAU;
                Resource::new(position, angle, speed)
            })
            .collect();
        Self::from_resources(config, resources)
    }

    pub fn from_resources(config: &SimConfig, resources: Vec<Resource>) -> Self {
        let initial_count = resources.len();
        Self {
            resources,
            bounds: config.bounds(),
            turn: config.turn_rule(),
            render_radius: config.resource_radius(),
            initial_count,
        }
    }

    /// Move every resource one tick.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for resource in &mut self.resources {
            resource.drift(rng, &self.bounds, &self.turn);
        }
    }

    /// Add `delta` to every resource's speed, flooring at zero.
    pub fn change_speed(&mut self, delta: f64) {
        for resource in &mut self.resources {
            resource.speed = (resource.speed + delta).max(0.0);
        }
    }

    /// Drop every resource whose slot in `consumed` is set. Survivors keep
    /// their relative order.
    pub(crate) fn remove_consumed(&mut self, consumed: &[bool]) -> usize {
        debug_assert_eq!(consumed.len(), self.resources.len());
        let before = self.resources.len();
        let mut flags = consumed.iter();
        self.resources
            .retain(|_| !flags.next().copied().unwrap_or(false));
        before - self.resources.len()
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn initial_count(&self) -> usize {
        self.initial_count
    }

    pub fn render_radius(&self) -> f64 {
        self.render_radius
    }

    pub fn positions(&self) -> Vec<[f64; 2]> {
        self.resources.iter().map(|r| r.position).collect()
    }
}
