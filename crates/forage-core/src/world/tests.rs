use super::*;
use crate::config::{BoundaryPolicy, NoTargetBehavior, SensingShape, TargetSelection};

fn small_config(seed: u64) -> SimConfig {
    SimConfig {
        seed,
        world_width: 200.0,
        world_height: 150.0,
        population_size: 16,
        resource_density: 300,
        sensing_radius: 12.0,
        tick_limit: 120,
        ..SimConfig::default()
    }
}

fn corner_scenario() -> Simulation {
    let config = SimConfig {
        world_width: 100.0,
        world_height: 100.0,
        sensing_radius: 200.0,
        tick_limit: 1,
        ..SimConfig::default()
    };
    let foragers = [[0.0, 0.0], [100.0, 0.0], [0.0, 100.0], [100.0, 100.0]]
        .into_iter()
        .map(|p| Forager::new(p, 0.0, 1.0, 200.0, 2.5))
        .collect();
    let resources = vec![Resource::new([50.0, 50.0], 0.0, 0.5)];
    Simulation::from_parts(config, foragers, resources).expect("valid scenario")
}

#[test]
fn first_forager_in_order_takes_the_lone_resource() {
    let mut sim = corner_scenario();
    assert_eq!(sim.advance_tick(ControlSignal::None), RunState::Halted);
    assert!(sim.is_finished());
    assert_eq!(sim.final_wealth_vector(), vec![1, 0, 0, 0]);
    assert!(sim.field().is_empty());
    let outcome = sim.outcome();
    assert_eq!(outcome.population_size, 4);
    assert_eq!(outcome.initial_resources, 1);
    assert_eq!(outcome.remaining_resources, 0);
    assert_eq!(outcome.ticks_run, 1);
}

#[test]
fn identical_seeds_replay_identically() {
    let policies = [
        (
            BoundaryPolicy::Wrap,
            SensingShape::Disc,
            NoTargetBehavior::Continue,
            TargetSelection::RandomPick,
        ),
        (
            BoundaryPolicy::Reflect,
            SensingShape::Box,
            NoTargetBehavior::Stationary,
            TargetSelection::Centroid,
        ),
    ];
    for (boundary, sensing, no_target, selection) in policies {
        let config = SimConfig {
            boundary_policy: boundary,
            sensing_shape: sensing,
            no_target_behavior: no_target,
            target_selection: selection,
            ..small_config(99)
        };
        let mut a = Simulation::new(config.clone()).expect("sim a");
        let mut b = Simulation::new(config).expect("sim b");
        let summary_a = a.run(&SignalSchedule::default(), 10).expect("run a");
        let summary_b = b.run(&SignalSchedule::default(), 10).expect("run b");
        assert_eq!(summary_a.final_wealth, summary_b.final_wealth);
        assert_eq!(
            a.entity_snapshot().resource_positions,
            b.entity_snapshot().resource_positions
        );
        let positions = |s: &Simulation| -> Vec<[f64; 2]> {
            s.population().foragers().iter().map(|f| f.position).collect()
        };
        assert_eq!(positions(&a), positions(&b));
    }
}

#[test]
fn wealth_and_footprint_never_shrink() {
    let mut sim = Simulation::new(small_config(5)).expect("sim");
    let mut previous: Vec<(u64, f64)> = sim
        .population()
        .foragers()
        .iter()
        .map(|f| (f.wealth, f.footprint))
        .collect();
    while !sim.is_finished() {
        sim.advance_tick(ControlSignal::None);
        let current: Vec<(u64, f64)> = sim
            .population()
            .foragers()
            .iter()
            .map(|f| (f.wealth, f.footprint))
            .collect();
        for (before, after) in previous.iter().zip(&current) {
            assert!(after.0 >= before.0);
            assert!(after.1 >= before.1);
        }
        previous = current;
    }
}

#[test]
fn every_consumed_resource_becomes_wealth() {
    let mut sim = Simulation::new(small_config(21)).expect("sim");
    let summary = sim.run(&SignalSchedule::default(), 1).expect("run");
    let total: u64 = summary.final_wealth.iter().sum();
    assert_eq!(
        total as usize,
        summary.initial_resources - summary.remaining_resources
    );
    assert!(total > 0, "a dense field should feed someone");
    let consumed: usize = summary.samples.iter().map(|s| s.consumed_this_tick).sum();
    assert_eq!(consumed as u64, total);
}

#[test]
fn entities_stay_in_bounds_for_the_whole_run() {
    for policy in [BoundaryPolicy::Wrap, BoundaryPolicy::Reflect] {
        let config = SimConfig {
            boundary_policy: policy,
            forager_base_speed: 12.0,
            resource_base_speed: 9.0,
            ..small_config(8)
        };
        let bounds = config.bounds();
        let mut sim = Simulation::new(config).expect("sim");
        while !sim.is_finished() {
            sim.advance_tick(ControlSignal::None);
            let snapshot = sim.entity_snapshot();
            assert!(snapshot.resource_positions.iter().all(|&p| bounds.contains(p)));
            assert!(snapshot.foragers.iter().all(|f| bounds.contains(f.position)));
        }
    }
}

#[test]
fn early_stop_returns_current_wealth() {
    let mut sim = Simulation::new(small_config(3)).expect("sim");
    for _ in 0..5 {
        sim.advance_tick(ControlSignal::None);
    }
    sim.request_stop();
    assert!(sim.is_finished());
    assert!(sim.stopped_early());
    assert_eq!(sim.tick(), 5);
    let wealth = sim.final_wealth_vector();
    assert_eq!(wealth.len(), sim.population().len());

    assert_eq!(sim.advance_tick(ControlSignal::SpeedUp), RunState::Halted);
    assert_eq!(sim.tick(), 5);
    assert_eq!(sim.final_wealth_vector(), wealth);
}

#[test]
fn speed_signals_shift_every_entity() {
    let config = SimConfig {
        forager_speed_step: 0.5,
        no_target_behavior: NoTargetBehavior::Stationary,
        ..SimConfig::default()
    };
    let foragers = vec![Forager::new([10.0, 10.0], 0.0, 1.0, 5.0, 2.5)];
    let resources = vec![
        Resource::new([400.0, 300.0], 0.0, 0.5),
        Resource::new([600.0, 300.0], 0.0, 0.0),
    ];
    let mut sim = Simulation::from_parts(config, foragers, resources).expect("sim");

    sim.apply_signal(ControlSignal::SpeedUp);
    assert_eq!(sim.population().foragers()[0].speed, 1.5);
    let speeds: Vec<f64> = sim.field().resources().iter().map(|r| r.speed).collect();
    assert_eq!(speeds, vec![1.5, 1.0]);

    for _ in 0..4 {
        sim.apply_signal(ControlSignal::SpeedDown);
    }
    assert_eq!(sim.population().foragers()[0].speed, 0.0);
    assert!(sim.field().resources().iter().all(|r| r.speed == 0.0));
}

#[test]
fn scheduled_signals_fire_before_their_tick() {
    let config = SimConfig {
        no_target_behavior: NoTargetBehavior::Stationary,
        tick_limit: 3,
        ..SimConfig::default()
    };
    let foragers = vec![Forager::new([10.0, 10.0], 0.0, 1.0, 5.0, 2.5)];
    let resources = vec![Resource::new([400.0, 300.0], 0.0, 0.5)];
    let mut sim = Simulation::from_parts(config, foragers, resources).expect("sim");
    let schedule = SignalSchedule {
        speed_up: vec![0, 2],
        speed_down: vec![2],
    };
    sim.run(&schedule, 1).expect("run");
    assert_eq!(sim.field().resources()[0].speed, 1.5);
}

#[test]
fn repeated_schedule_entries_fire_once_per_tick() {
    let schedule = SignalSchedule {
        speed_up: vec![1, 1, 1],
        speed_down: vec![1, 4, 1],
    };
    let at_one: Vec<ControlSignal> = schedule.signals_at(1).collect();
    assert_eq!(at_one, vec![ControlSignal::SpeedUp, ControlSignal::SpeedDown]);
    assert_eq!(schedule.signals_at(0).count(), 0);

    let config = SimConfig {
        no_target_behavior: NoTargetBehavior::Stationary,
        tick_limit: 2,
        ..SimConfig::default()
    };
    let foragers = vec![Forager::new([10.0, 10.0], 0.0, 1.0, 5.0, 2.5)];
    let resources = vec![Resource::new([400.0, 300.0], 0.0, 0.5)];
    let mut sim = Simulation::from_parts(config, foragers, resources).expect("sim");
    let schedule = SignalSchedule {
        speed_up: vec![0, 0, 0],
        speed_down: vec![],
    };
    sim.run(&schedule, 1).expect("run");
    assert_eq!(sim.field().resources()[0].speed, 1.5);
    assert!((sim.population().foragers()[0].speed - 1.01).abs() < 1e-12);
}

#[test]
fn run_samples_on_cadence_and_final_tick() {
    let config = SimConfig {
        tick_limit: 10,
        ..small_config(4)
    };
    let mut sim = Simulation::new(config).expect("sim");
    let summary = sim.run(&SignalSchedule::default(), 3).expect("run");
    let ticks: Vec<usize> = summary.samples.iter().map(|s| s.tick).collect();
    assert_eq!(ticks, vec![3, 6, 9, 10]);
    assert_eq!(summary.ticks_run, 10);
    assert!(!summary.stopped_early);
    assert!(summary.samples.iter().all(|s| (0.0..=1.0).contains(&s.gini_coefficient)));
}

#[test]
fn run_rejects_zero_sample_interval() {
    let mut sim = Simulation::new(small_config(1)).expect("sim");
    assert_eq!(
        sim.run(&SignalSchedule::default(), 0).unwrap_err(),
        RunError::InvalidSampleEvery
    );
}

#[test]
fn construction_rejects_bad_inputs() {
    let config = SimConfig {
        tick_limit: 0,
        ..SimConfig::default()
    };
    assert_eq!(
        Simulation::new(config).err(),
        Some(SimulationError::Config(SimConfigError::InvalidTickLimit))
    );

    assert_eq!(
        Simulation::from_parts(SimConfig::default(), Vec::new(), Vec::new()).err(),
        Some(SimulationError::EmptyPopulation)
    );

    let foragers = vec![Forager::new([10.0, 10.0], 0.0, 1.0, 5.0, 2.5)];
    let resources = vec![Resource::new([900.0, 10.0], 0.0, 0.5)];
    assert!(matches!(
        Simulation::from_parts(SimConfig::default(), foragers, resources),
        Err(SimulationError::ResourceOutOfBounds { index: 0, .. })
    ));
}

#[test]
fn snapshot_reports_sizes_and_radii() {
    let sim = Simulation::new(small_config(12)).expect("sim");
    let snapshot = sim.entity_snapshot();
    assert_eq!(snapshot.tick, 0);
    assert_eq!(snapshot.resource_positions.len(), 300);
    assert_eq!(snapshot.resource_radius, 1.5);
    assert_eq!(snapshot.foragers.len(), sim.population().len());
    assert!(snapshot.foragers.iter().all(|f| f.footprint == 2.5 && f.wealth == 0));
}
