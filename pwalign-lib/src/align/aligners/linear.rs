//! Linear gap cost recursions:
//!
//! ```text
//! D[i][j] = optimum(D[i-1][j-1] + score(a_j, b_i), D[i-1][j] + insertion, D[i][j-1] + deletion)
//! ```
//!
//! The global variant (Needleman-Wunsch) initializes the borders to the cumulative gap cost and
//! has the bottom-right cell as its single terminal cell.  The local variant (Smith-Waterman)
//! adds `0` as a candidate, initializes the borders to `0` and terminates in every cell holding
//! the matrix-wide optimum.
use log::trace;

use super::{AlignmentContext, AlignmentStrategy};
use crate::align::{
    aligners::constants::{CalculationMode, MatrixLabel},
    traceback::{
        matrix::{Matrix, ScoreMatrices},
        Position, Step,
    },
};

/// Global alignment with a linear gap cost.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeedlemanWunsch;

/// Local alignment with a linear gap cost.
#[derive(Clone, Copy, Debug, Default)]
pub struct SmithWaterman;

/// The candidates for cell `(i, j)`: diagonal, vertical and horizontal.
#[inline(always)]
fn candidates(ctx: &AlignmentContext<'_>, d: &Matrix<i32>, i: usize, j: usize) -> [i32; 3] {
    let (deletion, insertion) = ctx.costs.linear_costs();
    [
        d.get(i - 1, j - 1) + ctx.diagonal_score(i, j),
        d.get(i - 1, j) + insertion,
        d.get(i, j - 1) + deletion,
    ]
}

/// The predecessors of a cell, diagonal first, then vertical, then horizontal.
pub(crate) fn linear_predecessors(
    ctx: &AlignmentContext<'_>,
    d: &Matrix<i32>,
    position: Position,
) -> Vec<Step> {
    let (deletion, insertion) = ctx.costs.linear_costs();
    let Position { i, j, .. } = position;
    let value = *d.get(i, j);
    let mut steps = Vec::with_capacity(3);
    if i > 0 && j > 0 && d.get(i - 1, j - 1) + ctx.diagonal_score(i, j) == value {
        steps.push(vec![Position::new(i - 1, j - 1)]);
    }
    if i > 0 && d.get(i - 1, j) + insertion == value {
        steps.push(vec![Position::new(i - 1, j)]);
    }
    if j > 0 && d.get(i, j - 1) + deletion == value {
        steps.push(vec![Position::new(i, j - 1)]);
    }
    steps
}

/// Every cell of `d` holding the matrix-wide optimum, provided that optimum is better than `0`.
pub(crate) fn local_terminal_cells(mode: CalculationMode, d: &Matrix<i32>) -> Vec<Position> {
    match mode.optimum(d.cells().map(|(_, _, v)| *v)) {
        Some(best) if mode.is_better(best, 0) => d
            .cells()
            .filter(|(_, _, v)| **v == best)
            .map(|(i, j, _)| Position::new(i, j))
            .collect(),
        _ => Vec::new(),
    }
}

/// The optimal local score, never worse than `0`.
pub(crate) fn local_score(mode: CalculationMode, d: &Matrix<i32>) -> i32 {
    mode.optimum(d.cells().map(|(_, _, v)| *v))
        .map_or(0, |best| mode.pick(best, 0))
}

impl AlignmentStrategy for NeedlemanWunsch {
    fn new_matrices(&self, ctx: &AlignmentContext<'_>) -> ScoreMatrices {
        ScoreMatrices::single(ctx.m(), ctx.n())
    }

    fn init_boundary(&self, ctx: &AlignmentContext<'_>, matrices: &mut ScoreMatrices) {
        let (deletion, insertion) = ctx.costs.linear_costs();
        let d = &mut matrices.d;
        d.set(0, 0, 0);
        for i in 1..=ctx.m() {
            d.set(i, 0, d.get(i - 1, 0) + insertion);
        }
        for j in 1..=ctx.n() {
            d.set(0, j, d.get(0, j - 1) + deletion);
        }
    }

    fn fill_cell(
        &self,
        ctx: &AlignmentContext<'_>,
        matrices: &mut ScoreMatrices,
        i: usize,
        j: usize,
    ) {
        let value = ctx.costs.mode.optimum(candidates(ctx, &matrices.d, i, j));
        matrices.d.set(i, j, value.unwrap_or_default());
    }

    fn terminal_cells(
        &self,
        ctx: &AlignmentContext<'_>,
        _matrices: &ScoreMatrices,
    ) -> Vec<Position> {
        vec![Position::new(ctx.m(), ctx.n())]
    }

    fn is_origin(
        &self,
        _ctx: &AlignmentContext<'_>,
        _matrices: &ScoreMatrices,
        position: Position,
    ) -> bool {
        position.i == 0 && position.j == 0
    }

    fn predecessors(
        &self,
        ctx: &AlignmentContext<'_>,
        matrices: &ScoreMatrices,
        position: Position,
    ) -> Vec<Step> {
        linear_predecessors(ctx, &matrices.d, position)
    }

    fn score(&self, ctx: &AlignmentContext<'_>, matrices: &ScoreMatrices) -> i32 {
        *matrices.d.get(ctx.m(), ctx.n())
    }
}

impl AlignmentStrategy for SmithWaterman {
    fn new_matrices(&self, ctx: &AlignmentContext<'_>) -> ScoreMatrices {
        ScoreMatrices::single(ctx.m(), ctx.n())
    }

    fn init_boundary(&self, _ctx: &AlignmentContext<'_>, _matrices: &mut ScoreMatrices) {
        // borders stay at the floor of 0
    }

    fn fill_cell(
        &self,
        ctx: &AlignmentContext<'_>,
        matrices: &mut ScoreMatrices,
        i: usize,
        j: usize,
    ) {
        let [diagonal, vertical, horizontal] = candidates(ctx, &matrices.d, i, j);
        let value = ctx
            .costs
            .mode
            .optimum([diagonal, vertical, horizontal, 0]);
        matrices.d.set(i, j, value.unwrap_or_default());
    }

    fn terminal_cells(
        &self,
        ctx: &AlignmentContext<'_>,
        matrices: &ScoreMatrices,
    ) -> Vec<Position> {
        local_terminal_cells(ctx.costs.mode, &matrices.d)
    }

    fn is_origin(
        &self,
        _ctx: &AlignmentContext<'_>,
        matrices: &ScoreMatrices,
        position: Position,
    ) -> bool {
        position.label == MatrixLabel::Default && *matrices.d.get(position.i, position.j) == 0
    }

    fn predecessors(
        &self,
        ctx: &AlignmentContext<'_>,
        matrices: &ScoreMatrices,
        position: Position,
    ) -> Vec<Step> {
        linear_predecessors(ctx, &matrices.d, position)
    }

    fn score(&self, ctx: &AlignmentContext<'_>, matrices: &ScoreMatrices) -> i32 {
        local_score(ctx.costs.mode, &matrices.d)
    }
}

/// Computes only the last row of the global linear gap matrix, keeping two rows at a time.
pub fn last_row(ctx: &AlignmentContext<'_>) -> Vec<i32> {
    let (deletion, insertion) = ctx.costs.linear_costs();
    let mode = ctx.costs.mode;
    let n = ctx.n();
    let mut rows: [Vec<i32>; 2] = [Vec::with_capacity(n + 1), vec![0; n + 1]];

    // row 0
    rows[0].push(0);
    for j in 1..=n {
        let prev = rows[0][j - 1];
        rows[0].push(prev + deletion);
    }

    for i in 1..=ctx.m() {
        let curr = i % 2;
        let prev = 1 - curr;
        rows[curr][0] = rows[prev][0] + insertion;
        for j in 1..=n {
            let diagonal = rows[prev][j - 1] + ctx.diagonal_score(i, j);
            let vertical = rows[prev][j] + insertion;
            let horizontal = rows[curr][j - 1] + deletion;
            rows[curr][j] = mode.pick(mode.pick(diagonal, vertical), horizontal);
        }
    }
    let last = ctx.m() % 2;
    trace!("Last row of {}x{}: {:?}", ctx.m() + 1, n + 1, rows[last]);
    rows[last].clone()
}
