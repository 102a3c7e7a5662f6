//! Global timestep from the CFL (advection) and Von Neumann (diffusion)
//! stability limits.
//!
//! For every cell four bounds are evaluated:
//!
//! - advection: `C / sqrt(3) / max_i((|u_i| + 2 σ_i) / Δx_i)`
//! - vertical diffusion: `C Δz² / (2 Kzz)`
//! - horizontal diffusion: `C Δx² / (2 Kxxyy)` and `C Δy² / (2 Kxxyy)`
//!
//! A non-positive speed or diffusivity makes its bound unbounded, which is
//! excluded from the minimum. When every bound of every cell is unbounded
//! the configured fallback timestep is used.

use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::config::ModelConfig;
use crate::grid::{Cell, CellProperties, Domain};

/// Which stability limit produced the timestep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LimitingBound {
    Advection,
    VerticalDiffusion,
    HorizontalDiffusionX,
    HorizontalDiffusionY,
    /// Every bound was unbounded; the fallback timestep applies.
    Fallback,
}

/// The four per-cell bounds [s]. Unbounded terms are `f64::INFINITY`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellBounds {
    pub advection: f64,
    pub vertical_diffusion: f64,
    pub horizontal_diffusion_x: f64,
    pub horizontal_diffusion_y: f64,
}

impl CellBounds {
    pub fn new(p: &CellProperties, courant: f64) -> Self {
        let speed = |mean: f64, deviation: f64, extent: f64| {
            (mean.abs() + 2.0 * deviation.abs()) / extent
        };
        let max_speed = speed(p.u_avg, p.u_deviation, p.dx)
            .max(speed(p.v_avg, p.v_deviation, p.dy))
            .max(speed(p.w_avg, p.w_deviation, p.dz));

        Self {
            advection: unbounded_unless(max_speed, |s| courant / 3f64.sqrt() / s),
            vertical_diffusion: unbounded_unless(p.kzz, |k| courant * p.dz * p.dz / 2.0 / k),
            horizontal_diffusion_x: unbounded_unless(p.kxxyy, |k| {
                courant * p.dx * p.dx / 2.0 / k
            }),
            horizontal_diffusion_y: unbounded_unless(p.kxxyy, |k| {
                courant * p.dy * p.dy / 2.0 / k
            }),
        }
    }

    /// Smallest bound and its kind.
    pub fn limiting(&self) -> (f64, LimitingBound) {
        [
            (self.advection, LimitingBound::Advection),
            (self.vertical_diffusion, LimitingBound::VerticalDiffusion),
            (self.horizontal_diffusion_x, LimitingBound::HorizontalDiffusionX),
            (self.horizontal_diffusion_y, LimitingBound::HorizontalDiffusionY),
        ]
        .into_iter()
        .filter(|(v, _)| v.is_finite() && *v > 0.0)
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .unwrap_or((f64::INFINITY, LimitingBound::Fallback))
    }
}

fn unbounded_unless(rate: f64, bound: impl Fn(f64) -> f64) -> f64 {
    if rate.is_finite() && rate > 0.0 {
        bound(rate)
    } else {
        f64::INFINITY
    }
}

/// Outcome of a timestep computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimestepReport {
    /// Global timestep [s].
    pub dt: f64,
    pub limiting: LimitingBound,
    /// Cell that produced the limit, if any.
    pub cell: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
pub struct TimestepController {
    courant: f64,
    fallback_dt: f64,
}

impl TimestepController {
    pub fn new(courant: f64, fallback_dt: f64) -> Self {
        Self {
            courant,
            fallback_dt,
        }
    }

    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(config.courant, config.fallback_timestep_s)
    }

    /// Single pass over all cells; minimum over all cells and bounds.
    ///
    /// The minimum is never clamped. `fallback_dt` is only used when no cell
    /// has a finite bound.
    pub fn compute(&self, cells: &[Cell]) -> TimestepReport {
        let best = cells
            .par_iter()
            .enumerate()
            .map(|(i, c)| {
                let (dt, kind) = CellBounds::new(&c.props, self.courant).limiting();
                (dt, kind, i)
            })
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.2.cmp(&b.2)));

        match best {
            Some((dt, limiting, i)) if dt.is_finite() => TimestepReport {
                dt,
                limiting,
                cell: Some(i),
            },
            _ => TimestepReport {
                dt: self.fallback_dt,
                limiting: LimitingBound::Fallback,
                cell: None,
            },
        }
    }

    /// Computes the timestep and stores it on the domain.
    pub fn apply(&self, domain: &mut Domain) -> TimestepReport {
        let report = self.compute(domain.cells());
        domain.set_dt(report.dt);
        info!(
            dt_s = report.dt,
            limiting = ?report.limiting,
            cell = ?report.cell,
            "timestep set"
        );
        report
    }
}
