//! Affine gap cost recursions (Gotoh), with `gap_open = base_cost + enlargement` and
//! `gap_extend = enlargement`:
//!
//! ```text
//! P[i][j] = optimum(D[i-1][j] + gap_open, P[i-1][j] + gap_extend)
//! Q[i][j] = optimum(D[i][j-1] + gap_open, Q[i][j-1] + gap_extend)
//! D[i][j] = optimum(D[i-1][j-1] + score(a_j, b_i), P[i][j], Q[i][j])
//! ```
//!
//! `P` holds the alignments ending in a vertical gap run (a gap in A), `Q` those ending in a
//! horizontal gap run (a gap in B).  A `None` cell has no alignment ending in that state.
//!
//! A traceback moves between the grids without consuming symbols: from `D` into `P` or `Q` at
//! the same cell when `D` took its value from there, and from `P`/`Q` back into `D` one row or
//! column earlier when the gap run was opened.
use super::{
    linear::{local_score, local_terminal_cells},
    AlignmentContext, AlignmentStrategy,
};
use crate::align::{
    aligners::constants::MatrixLabel::{self, Default as D, Horizontal as H, Vertical as V},
    traceback::{matrix::ScoreMatrices, Position, Step},
};

/// Global alignment with an affine gap cost.
#[derive(Clone, Copy, Debug, Default)]
pub struct Gotoh;

/// Local alignment with an affine gap cost.
#[derive(Clone, Copy, Debug, Default)]
pub struct GotohLocal;

/// The cell one step back along a gap run in the given grid.
#[inline(always)]
fn previous(i: usize, j: usize, label: MatrixLabel) -> (usize, usize) {
    match label {
        V => (i - 1, j),
        H => (i, j - 1),
        D => panic!("The default grid has no gap runs"),
    }
}

/// Computes `P[i][j]` or `Q[i][j]` from the previous cell of the run.
fn gap_state(
    ctx: &AlignmentContext<'_>,
    matrices: &ScoreMatrices,
    i: usize,
    j: usize,
    label: MatrixLabel,
) -> i32 {
    let (gap_open, gap_extend) = ctx.costs.affine_costs();
    let (pi, pj) = previous(i, j, label);
    let open = matrices.d.get(pi, pj) + gap_open;
    match matrices.gap_value(pi, pj, label) {
        Some(run) => ctx.costs.mode.pick(open, run + gap_extend),
        None => open,
    }
}

fn fill_cell(
    ctx: &AlignmentContext<'_>,
    matrices: &mut ScoreMatrices,
    i: usize,
    j: usize,
    local: bool,
) {
    let p = gap_state(ctx, matrices, i, j, V);
    let q = gap_state(ctx, matrices, i, j, H);
    matrices.set_gap_value(i, j, V, Some(p));
    matrices.set_gap_value(i, j, H, Some(q));

    let diagonal = matrices.d.get(i - 1, j - 1) + ctx.diagonal_score(i, j);
    let mode = ctx.costs.mode;
    let mut value = mode.pick(mode.pick(diagonal, p), q);
    if local {
        value = mode.pick(value, 0);
    }
    matrices.d.set(i, j, value);
}

/// The predecessors of a position, shared by the global and local variants.
fn predecessors(
    ctx: &AlignmentContext<'_>,
    matrices: &ScoreMatrices,
    position: Position,
) -> Vec<Step> {
    let Position { i, j, label } = position;
    let mut steps = Vec::with_capacity(3);
    match label {
        D => {
            let value = *matrices.d.get(i, j);
            if i > 0
                && j > 0
                && matrices.d.get(i - 1, j - 1) + ctx.diagonal_score(i, j) == value
            {
                steps.push(vec![Position::new(i - 1, j - 1)]);
            }
            for gap_label in [V, H] {
                if matrices.gap_value(i, j, gap_label) == Some(value) {
                    steps.push(vec![Position::with_label(i, j, gap_label)]);
                }
            }
        }
        V | H => {
            let (gap_open, gap_extend) = ctx.costs.affine_costs();
            let value = matrices
                .gap_value(i, j, label)
                .unwrap_or_else(|| panic!("Bug: traceback entered an empty cell {position:?}"));
            let (pi, pj) = previous(i, j, label);
            if matrices.d.get(pi, pj) + gap_open == value {
                steps.push(vec![Position::new(pi, pj)]);
            }
            if matrices.gap_value(pi, pj, label).map(|run| run + gap_extend) == Some(value) {
                steps.push(vec![Position::with_label(pi, pj, label)]);
            }
        }
    }
    steps
}

impl AlignmentStrategy for Gotoh {
    fn new_matrices(&self, ctx: &AlignmentContext<'_>) -> ScoreMatrices {
        ScoreMatrices::affine(ctx.m(), ctx.n())
    }

    /// Row 0 and column 0 hold a single gap run, so `P` (column 0) and `Q` (row 0) equal `D`
    /// there, and the other gap state is unreachable.
    fn init_boundary(&self, ctx: &AlignmentContext<'_>, matrices: &mut ScoreMatrices) {
        let (gap_open, gap_extend) = ctx.costs.affine_costs();
        matrices.d.set(0, 0, 0);
        for i in 1..=ctx.m() {
            let value = gap_open + gap_extend * (i as i32 - 1);
            matrices.d.set(i, 0, value);
            matrices.set_gap_value(i, 0, V, Some(value));
        }
        for j in 1..=ctx.n() {
            let value = gap_open + gap_extend * (j as i32 - 1);
            matrices.d.set(0, j, value);
            matrices.set_gap_value(0, j, H, Some(value));
        }
    }

    fn fill_cell(
        &self,
        ctx: &AlignmentContext<'_>,
        matrices: &mut ScoreMatrices,
        i: usize,
        j: usize,
    ) {
        fill_cell(ctx, matrices, i, j, false);
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
        position == Position::new(0, 0)
    }

    fn predecessors(
        &self,
        ctx: &AlignmentContext<'_>,
        matrices: &ScoreMatrices,
        position: Position,
    ) -> Vec<Step> {
        predecessors(ctx, matrices, position)
    }

    fn score(&self, ctx: &AlignmentContext<'_>, matrices: &ScoreMatrices) -> i32 {
        *matrices.d.get(ctx.m(), ctx.n())
    }
}

impl AlignmentStrategy for GotohLocal {
    fn new_matrices(&self, ctx: &AlignmentContext<'_>) -> ScoreMatrices {
        ScoreMatrices::affine(ctx.m(), ctx.n())
    }

    fn init_boundary(&self, _ctx: &AlignmentContext<'_>, _matrices: &mut ScoreMatrices) {
        // D borders stay at the floor of 0, no gap run reaches a border
    }

    fn fill_cell(
        &self,
        ctx: &AlignmentContext<'_>,
        matrices: &mut ScoreMatrices,
        i: usize,
        j: usize,
    ) {
        fill_cell(ctx, matrices, i, j, true);
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
        position.label == D && *matrices.d.get(position.i, position.j) == 0
    }

    fn predecessors(
        &self,
        ctx: &AlignmentContext<'_>,
        matrices: &ScoreMatrices,
        position: Position,
    ) -> Vec<Step> {
        predecessors(ctx, matrices, position)
    }

    fn score(&self, ctx: &AlignmentContext<'_>, matrices: &ScoreMatrices) -> i32 {
        local_score(ctx.costs.mode, &matrices.d)
    }
}
