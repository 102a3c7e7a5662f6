use anyhow::Result;

use super::OperatorContext;
use crate::grid::{Cell, CellState};

/// A per-cell physics transform applied once per iteration.
///
/// `apply` runs with the cell's state locked for writing. It may read the
/// cell's own `Ci`/`Cf` and its neighbors' concentrations as of the last phase
/// barrier (through the context), and must write only `state`.
/// An error stops the whole run at the end of the current phase.
pub trait ScienceOperator: Send + Sync {
    /// Human-readable identifier for logs and errors.
    fn name(&self) -> &'static str;

    fn apply(&self, cell: &Cell, state: &mut CellState, ctx: &OperatorContext) -> Result<()>;
}

/// Adapts a closure into a [`ScienceOperator`].
pub struct FnOperator<F> {
    name: &'static str,
    f: F,
}

impl<F> FnOperator<F>
where
    F: Fn(&Cell, &mut CellState, &OperatorContext) -> Result<()> + Send + Sync,
{
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }
}

impl<F> ScienceOperator for FnOperator<F>
where
    F: Fn(&Cell, &mut CellState, &OperatorContext) -> Result<()> + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn apply(&self, cell: &Cell, state: &mut CellState, ctx: &OperatorContext) -> Result<()> {
        (self.f)(cell, state, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{CellProperties, Domain};

    #[test]
    fn test_fn_operator_writes_own_state() {
        let domain = Domain::new(vec![Cell::new(CellProperties::with_size(1.0, 1.0, 1.0, 0))])
            .unwrap();
        let snapshot = vec![[0.0; 9]];
        let op = FnOperator::new("fill", |_cell, state, _ctx| {
            state.cf[0] = 7.0;
            Ok(())
        });
        let cell = &domain.cells()[0];
        let ctx = OperatorContext::new(&domain, &snapshot, 0);
        let mut state = cell.write();
        op.apply(cell, &mut state, &ctx).unwrap();
        assert_eq!(state.cf[0], 7.0);
        assert_eq!(op.name(), "fill");
    }
}
