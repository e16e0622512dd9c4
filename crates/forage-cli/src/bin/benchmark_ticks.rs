use forage_core::{ControlSignal, SignalSchedule, SimConfig, Simulation};
use std::time::{Duration, Instant};

fn main() {
    let population_size = 2_500;
    let resource_density = 50_000;
    println!(
        "Benchmarking with {} foragers and {} resources",
        population_size, resource_density
    );

    let ticks = 50;
    let config = SimConfig {
        world_width: 4000.0,
        world_height: 3000.0,
        population_size,
        resource_density,
        sensing_radius: 25.0,
        tick_limit: ticks,
        seed: 42,
        ..SimConfig::default()
    };

    let mut sim1 = Simulation::new(config.clone()).expect("benchmark config is valid");
    let mut sim2 = Simulation::new(config).expect("benchmark config is valid");

    // Run WITHOUT metrics, tracking the per-phase split.
    let mut resource_time = Duration::ZERO;
    let mut forage_time = Duration::ZERO;
    let start = Instant::now();
    while !sim1.is_finished() {
        sim1.advance_tick(ControlSignal::None);
        let timings = sim1.last_timings();
        resource_time += Duration::from_micros(timings.resource_us);
        forage_time += Duration::from_micros(timings.forage_us);
    }
    let duration_no_metrics = start.elapsed();
    println!("Time for {} ticks WITHOUT metrics: {:?}", ticks, duration_no_metrics);
    println!("Avg time per tick (no metrics): {:?}", duration_no_metrics / ticks as u32);
    println!("  resource drift: {:?}", resource_time / ticks as u32);
    println!("  sense/move/eat: {:?}", forage_time / ticks as u32);

    // Run WITH metrics (every tick)
    let start = Instant::now();
    let summary = sim2
        .run(&SignalSchedule::default(), 1)
        .expect("sample_every is positive");
    let duration_metrics = start.elapsed();

    println!("Time for {} ticks WITH metrics: {:?}", ticks, duration_metrics);
    println!("Avg time per tick (with metrics): {:?}", duration_metrics / ticks as u32);

    let diff = duration_metrics.saturating_sub(duration_no_metrics);
    println!("Total metrics overhead: {:?}", diff);
    println!("Avg metrics overhead per tick: {:?}", diff / ticks as u32);
    println!(
        "Resources eaten: {}",
        summary.initial_resources - summary.remaining_resources
    );
}
