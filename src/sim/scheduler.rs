//! Phase-barrier worker pool applying operators to every active cell.
//!
//! # Architecture
//!
//! ```text
//!              ┌── task queue 0 ──► worker 0: cells 0, W, 2W, ...
//! controller ──┼── task queue 1 ──► worker 1: cells 1, W+1, ...      ──► reports ──► controller
//!              └── task queue W-1 ► worker W-1 ...
//! ```
//!
//! Each phase is one operator. The controller snapshots every `Cf`, hands the
//! operator index and snapshot to every worker through that worker's own
//! queue, then blocks until all workers report. Only then does the next
//! operator start, so operator `k` has touched every cell before operator
//! `k + 1` touches any.
//!
//! Workers are scoped threads created once per run and stopped when the pool
//! is dropped.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, Scope};

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use rayon::prelude::*;
use tracing::{debug, warn};

use super::framework::{OperatorContext, ScienceOperator};
use crate::error::{ModelError, Result};
use crate::grid::Domain;
use crate::species::Concentrations;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Number of worker threads (at least 1).
    pub workers: usize,
    /// Cells whose layer exceeds this are skipped by every operator.
    pub top_layer: usize,
}

struct PhaseTask {
    operator: usize,
    snapshot: Arc<[Concentrations]>,
}

struct PhaseReport {
    worker: usize,
    outcome: std::result::Result<usize, StripeFailure>,
}

enum StripeFailure {
    Operator { cell: usize, message: String },
    Panicked,
}

/// Static striping: worker `w` owns cells `w, w + W, w + 2W, ...`.
#[derive(Debug, Clone, Copy)]
struct Stripe {
    worker: usize,
    workers: usize,
    top_layer: usize,
}

/// Running worker pool bound to one domain and one operator list.
pub struct WorkerPool<'env> {
    domain: &'env Domain,
    operators: &'env [Box<dyn ScienceOperator>],
    tasks: Vec<Sender<PhaseTask>>,
    reports: Receiver<PhaseReport>,
}

/// Starts a pool for the duration of `body`.
///
/// The workers are joined before this function returns, whatever `body`
/// returns.
pub fn with_worker_pool<R>(
    domain: &Domain,
    operators: &[Box<dyn ScienceOperator>],
    settings: SchedulerSettings,
    body: impl FnOnce(&mut WorkerPool<'_>) -> Result<R>,
) -> Result<R> {
    thread::scope(|scope| {
        let mut pool = WorkerPool::spawn(scope, domain, operators, settings);
        body(&mut pool)
    })
}

impl<'env> WorkerPool<'env> {
    fn spawn<'scope>(
        scope: &'scope Scope<'scope, 'env>,
        domain: &'env Domain,
        operators: &'env [Box<dyn ScienceOperator>],
        settings: SchedulerSettings,
    ) -> Self {
        let workers = settings.workers.max(1);
        let (report_tx, reports) = unbounded();
        let tasks = (0..workers)
            .map(|worker| {
                let (task_tx, task_rx) = bounded(1);
                let report_tx = report_tx.clone();
                let stripe = Stripe {
                    worker,
                    workers,
                    top_layer: settings.top_layer,
                };
                scope.spawn(move || worker_loop(stripe, domain, operators, task_rx, report_tx));
                task_tx
            })
            .collect();
        debug!(workers, operators = operators.len(), "worker pool started");

        Self {
            domain,
            operators,
            tasks,
            reports,
        }
    }

    pub fn workers(&self) -> usize {
        self.tasks.len()
    }

    /// Applies every operator once, with a barrier after each.
    pub fn run_iteration(&mut self) -> Result<()> {
        for operator in 0..self.operators.len() {
            self.run_phase(operator)?;
        }
        Ok(())
    }

    /// Applies one operator to every active cell and waits for all workers.
    ///
    /// Returns the number of cells the operator was applied to. If any worker
    /// failed, the first failure is returned after every worker has reported.
    pub fn run_phase(&mut self, operator: usize) -> Result<usize> {
        let snapshot = self.snapshot();
        for (worker, tx) in self.tasks.iter().enumerate() {
            let task = PhaseTask {
                operator,
                snapshot: Arc::clone(&snapshot),
            };
            tx.send(task)
                .map_err(|_| ModelError::WorkerPanicked { worker })?;
        }

        let name = self.operators[operator].name();
        let mut applied = 0;
        let mut failure = None;
        for _ in 0..self.tasks.len() {
            let report = self
                .reports
                .recv()
                .map_err(|_| ModelError::WorkerPanicked { worker: 0 })?;
            let error = match report.outcome {
                Ok(n) => {
                    applied += n;
                    continue;
                }
                Err(StripeFailure::Operator { cell, message }) => ModelError::OperatorFailed {
                    operator: name,
                    cell,
                    message,
                },
                Err(StripeFailure::Panicked) => ModelError::WorkerPanicked {
                    worker: report.worker,
                },
            };
            warn!(operator = name, worker = report.worker, %error, "phase failed");
            failure.get_or_insert(error);
        }

        match failure {
            Some(error) => Err(error),
            None => Ok(applied),
        }
    }

    /// `Cf` of every active cell. Taken while all workers are idle.
    fn snapshot(&self) -> Arc<[Concentrations]> {
        let cf: Vec<Concentrations> = self
            .domain
            .cells()
            .par_iter()
            .map(|cell| cell.read().cf)
            .collect();
        cf.into()
    }
}

fn worker_loop(
    stripe: Stripe,
    domain: &Domain,
    operators: &[Box<dyn ScienceOperator>],
    tasks: Receiver<PhaseTask>,
    reports: Sender<PhaseReport>,
) {
    for task in tasks.iter() {
        let operator = operators[task.operator].as_ref();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            run_stripe(stripe, domain, operator, &task.snapshot)
        }))
        .unwrap_or(Err(StripeFailure::Panicked));

        let report = PhaseReport {
            worker: stripe.worker,
            outcome,
        };
        if reports.send(report).is_err() {
            break;
        }
    }
}

fn run_stripe(
    stripe: Stripe,
    domain: &Domain,
    operator: &dyn ScienceOperator,
    snapshot: &[Concentrations],
) -> std::result::Result<usize, StripeFailure> {
    let cells = domain.cells();
    let mut applied = 0;
    for i in (stripe.worker..cells.len()).step_by(stripe.workers) {
        let cell = &cells[i];
        if cell.layer() > stripe.top_layer {
            continue;
        }
        let ctx = OperatorContext::new(domain, snapshot, i);
        // Guards the state against readers outside the pool; workers never
        // share a cell within a phase.
        let mut state = cell.write();
        operator
            .apply(cell, &mut state, &ctx)
            .map_err(|e| StripeFailure::Operator {
                cell: i,
                message: format!("{e:#}"),
            })?;
        applied += 1;
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Cell, CellProperties, RegularGrid};
    use crate::sim::framework::{FnOperator, OperatorSequence};
    use std::time::Duration;

    fn settings(workers: usize) -> SchedulerSettings {
        SchedulerSettings {
            workers,
            top_layer: usize::MAX,
        }
    }

    fn line(n: usize) -> Domain {
        Domain::new(RegularGrid::new(n, 1, 10.0, 10.0, vec![5.0]).cells()).unwrap()
    }

    #[test]
    fn test_every_cell_sees_a_before_b() {
        // 7 cells over 3 workers: the stripes are uneven.
        let domain = line(7);
        let n = domain.len() as f64;
        let ops = OperatorSequence::new()
            .with_operator(FnOperator::new("a", |_, state, ctx| {
                if ctx.cell_index % 3 == 0 {
                    thread::sleep(Duration::from_millis(5));
                }
                state.cf[0] += 1.0;
                Ok(())
            }))
            .with_operator(FnOperator::new("b", |_, state, ctx| {
                state.cf[1] = ctx.snapshot().iter().map(|c| c[0]).sum();
                Ok(())
            }));

        with_worker_pool(&domain, ops.as_slice(), settings(3), |pool| {
            assert_eq!(pool.workers(), 3);
            pool.run_iteration()
        })
        .unwrap();

        for cell in domain.cells() {
            let s = cell.read();
            assert_eq!(s.cf[0], 1.0);
            assert_eq!(s.cf[1], n);
        }
    }

    #[test]
    fn test_iterations_accumulate() {
        let domain = line(5);
        let ops = OperatorSequence::new().with_operator(FnOperator::new("inc", |_, state, _| {
            state.cf[2] += 1.0;
            Ok(())
        }));
        with_worker_pool(&domain, ops.as_slice(), settings(2), |pool| {
            for _ in 0..4 {
                pool.run_iteration()?;
            }
            Ok(())
        })
        .unwrap();
        assert!(domain.cells().iter().all(|c| c.read().cf[2] == 4.0));
    }

    #[test]
    fn test_cells_above_top_layer_are_skipped() {
        let domain =
            Domain::new(RegularGrid::new(2, 1, 10.0, 10.0, vec![5.0, 5.0, 5.0]).cells()).unwrap();
        let ops = OperatorSequence::new().with_operator(FnOperator::new("mark", |_, state, _| {
            state.cf[0] = 1.0;
            Ok(())
        }));
        let applied = with_worker_pool(
            &domain,
            ops.as_slice(),
            SchedulerSettings {
                workers: 4,
                top_layer: 1,
            },
            |pool| pool.run_phase(0),
        )
        .unwrap();

        assert_eq!(applied, 4);
        for cell in domain.cells() {
            let expected = if cell.layer() <= 1 { 1.0 } else { 0.0 };
            assert_eq!(cell.read().cf[0], expected);
        }
    }

    #[test]
    fn test_operator_error_stops_at_phase_boundary() {
        let domain = line(6);
        let ops = OperatorSequence::new()
            .with_operator(FnOperator::new("fails", |_, _, ctx| {
                anyhow::ensure!(ctx.cell_index != 4, "negative concentration");
                Ok(())
            }))
            .with_operator(FnOperator::new("after", |_, state, _| {
                state.cf[0] = 1.0;
                Ok(())
            }));

        let err = with_worker_pool(&domain, ops.as_slice(), settings(2), |pool| {
            pool.run_iteration()
        })
        .unwrap_err();

        match err {
            ModelError::OperatorFailed {
                operator, cell, message,
            } => {
                assert_eq!(operator, "fails");
                assert_eq!(cell, 4);
                assert!(message.contains("negative concentration"));
            }
            other => panic!("unexpected error: {other}"),
        }
        // The following operator never ran.
        assert!(domain.cells().iter().all(|c| c.read().cf[0] == 0.0));
    }

    #[test]
    fn test_panicking_operator_is_reported() {
        let domain = Domain::new(vec![Cell::new(CellProperties::with_size(1.0, 1.0, 1.0, 0))])
            .unwrap();
        let ops = OperatorSequence::new().with_operator(FnOperator::new("boom", |_, _, _| {
            panic!("operator bug");
        }));
        let err = with_worker_pool(&domain, ops.as_slice(), settings(1), |pool| {
            pool.run_iteration()
        })
        .unwrap_err();
        assert!(matches!(err, ModelError::WorkerPanicked { worker: 0 }));
    }

    #[test]
    fn test_more_workers_than_cells() {
        let domain = line(2);
        let ops = OperatorSequence::new().with_operator(FnOperator::new("one", |_, state, _| {
            state.cf[3] = 1.0;
            Ok(())
        }));
        let applied = with_worker_pool(&domain, ops.as_slice(), settings(8), |pool| {
            pool.run_phase(0)
        })
        .unwrap();
        assert_eq!(applied, 2);
    }
}
