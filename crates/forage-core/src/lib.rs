pub mod analysis;
pub mod config;
pub mod forager;
pub mod resource;
pub mod spatial;
pub mod world;

pub use analysis::{analyze, AnalysisError, InequalityReport, LorenzCurve};
pub use config::{
    BoundaryPolicy, NoTargetBehavior, PopulationLayout, SensingShape, SimConfig, SimConfigError,
    TargetSelection,
};
pub use world::{ControlSignal, RunOutcome, RunState, SignalSchedule, Simulation, SimulationError};
