//! Simulation core: timestep, operators, scheduler and the run loop.
//!
//! # Architecture
//!
//! ```text
//! Model::run()
//!   ├─ Emissions::apply()            μg/s  ──► emisFlux [μg/m³/s]
//!   ├─ TimestepController::apply()   one global Dt
//!   └─ with_worker_pool()
//!        loop {
//!          run_iteration()           emissions, then each operator with a barrier
//!          ConvergenceMonitor        every check_period_s of model time
//!        }
//! ```

pub mod convergence;
pub mod emissions;
pub mod framework;
pub mod model;
pub mod operators;
pub mod scheduler;
pub mod timestep;

pub use convergence::{ConvergenceMonitor, ConvergenceReport};
pub use emissions::Emissions;
pub use model::{Model, RunOutput, RunSummary, Termination};
pub use scheduler::{SchedulerSettings, WorkerPool, with_worker_pool};
pub use timestep::{LimitingBound, TimestepController, TimestepReport};
