//! Run driver: emissions, timestep, then the scheduler loop until the
//! iteration cap or convergence.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::convergence::ConvergenceMonitor;
use super::emissions::Emissions;
use super::framework::{OperatorSequence, ScienceOperator};
use super::operators::EmissionsInjection;
use super::scheduler::{SchedulerSettings, with_worker_pool};
use super::timestep::{LimitingBound, TimestepController};
use crate::config::ModelConfig;
use crate::error::Result;
use crate::grid::Domain;
use crate::output::OutputAccessor;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Termination {
    /// The fixed iteration count was reached.
    IterationCap,
    /// Every species' mass changed less than the tolerance between checks.
    Converged,
    /// Convergence mode hit `max_iterations` without converging.
    SafetyCap,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunSummary {
    pub iterations: usize,
    /// Global timestep [s].
    pub dt: f64,
    pub limiting: LimitingBound,
    /// Simulated time [s].
    pub model_time_s: f64,
    pub termination: Termination,
    pub wall_time: Duration,
}

/// Summary plus the standard output map `name -> [layer][cell]`.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    pub summary: RunSummary,
    pub concentrations: BTreeMap<String, Vec<Vec<f64>>>,
}

/// A configured simulation: settings plus the operator sequence.
///
/// Emissions injection is always the first operator; operators added with
/// [`Model::with_operator`] run after it, in insertion order.
pub struct Model {
    config: ModelConfig,
    operators: OperatorSequence,
}

impl Model {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            operators: OperatorSequence::new().with_operator(EmissionsInjection),
        }
    }

    pub fn with_operator<O: ScienceOperator + 'static>(self, operator: O) -> Self {
        self.with_boxed_operator(Box::new(operator))
    }

    pub fn with_boxed_operator(mut self, operator: Box<dyn ScienceOperator>) -> Self {
        self.operators.push(operator);
        self
    }

    /// Appends every operator of `sequence`.
    pub fn with_operators(self, sequence: OperatorSequence) -> Self {
        sequence
            .into_vec()
            .into_iter()
            .fold(self, Self::with_boxed_operator)
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn operator_names(&self) -> Vec<&'static str> {
        self.operators.names()
    }

    /// Runs to termination, leaving the final concentrations on `domain`.
    ///
    /// Clears any previous state, applies `emissions`, computes the timestep
    /// once, then iterates. Convergence is only checked between complete
    /// iterations, while every worker is idle.
    pub fn run(&self, domain: &mut Domain, emissions: &Emissions) -> Result<RunSummary> {
        self.config.validate()?;
        domain.reset_state();
        emissions.apply(domain)?;
        let timestep = TimestepController::from_config(&self.config).apply(domain);
        let dt = timestep.dt;

        let settings = SchedulerSettings {
            workers: self.config.worker_count(),
            top_layer: self.config.top_layer_to_calc,
        };
        info!(
            cells = domain.len(),
            workers = settings.workers,
            operators = ?self.operators.names(),
            "starting run"
        );

        let domain: &Domain = domain;
        let start = Instant::now();
        let (iterations, termination) =
            with_worker_pool(domain, self.operators.as_slice(), settings, |pool| {
                let mut monitor = ConvergenceMonitor::new(self.config.tolerance);
                let mut iterations = 0;
                let mut since_check = 0.0;
                loop {
                    if self.config.num_iterations.is_some_and(|cap| iterations >= cap) {
                        return Ok((iterations, Termination::IterationCap));
                    }
                    pool.run_iteration()?;
                    iterations += 1;
                    debug!(
                        iteration = iterations,
                        model_days = iterations as f64 * dt / SECONDS_PER_DAY,
                        wall_s = start.elapsed().as_secs_f64(),
                        "iteration complete"
                    );
                    if self.config.num_iterations.is_some() {
                        continue;
                    }

                    since_check += dt;
                    if since_check >= self.config.check_period_s {
                        since_check = 0.0;
                        if monitor.check(&domain.species_mass()).converged {
                            return Ok((iterations, Termination::Converged));
                        }
                    }
                    if self.config.max_iterations.is_some_and(|cap| iterations >= cap) {
                        warn!(iterations, "stopped at max_iterations without converging");
                        return Ok((iterations, Termination::SafetyCap));
                    }
                }
            })?;

        let summary = RunSummary {
            iterations,
            dt,
            limiting: timestep.limiting,
            model_time_s: iterations as f64 * dt,
            termination,
            wall_time: start.elapsed(),
        };
        info!(
            iterations,
            model_days = summary.model_time_s / SECONDS_PER_DAY,
            termination = ?termination,
            wall_s = summary.wall_time.as_secs_f64(),
            "run finished"
        );
        Ok(summary)
    }

    /// [`Model::run`] followed by output extraction for the ground layer, or
    /// every layer when `all_layers` is set.
    pub fn run_with_output(
        &self,
        domain: &mut Domain,
        emissions: &Emissions,
        all_layers: bool,
    ) -> Result<RunOutput> {
        let summary = self.run(domain, emissions)?;
        let concentrations = OutputAccessor::new(domain, &self.config).collect(all_layers);
        Ok(RunOutput {
            summary,
            concentrations,
        })
    }
}
