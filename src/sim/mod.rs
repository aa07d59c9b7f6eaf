pub mod event;
pub mod integrator;
pub mod point_mass;
pub mod runner;

pub use event::{ApoapsisDetector, ElevationDetector, EventDetector, EventKind, PeriapsisDetector, SimEvent};
pub use integrator::{SecondOrderSolver, SolverConfig, SolverStats, StormerExtrapolation};
pub use point_mass::{IntegratorState, PointMassIntegrator};
pub use runner::{simulate, simulate_with, Sample, SimConfig};
