//! Arbitrary gap cost recursion (Waterman-Smith-Beyer):
//!
//! ```text
//! D[i][j] = optimum(D[i-1][j-1] + score(a_j, b_i),
//!                   D[i-k][j] + g(k) for 1 <= k <= i,
//!                   D[i][j-l] + g(l) for 1 <= l <= j)
//! ```
//!
//! Every cell looks back over every gap length, so filling takes `O(n * m * max(n, m))`.  Only
//! the global variant exists.  Gap runs are traced through the `Vertical` and `Horizontal`
//! labels on the positions so that a run reads the same way as an affine one.
use super::{AlignmentContext, AlignmentStrategy};
use crate::align::{
    aligners::constants::MatrixLabel,
    traceback::{matrix::ScoreMatrices, Position, Step},
};

/// Global alignment with a gap cost `g(k)` for any gap length `k`.
#[derive(Clone, Copy, Debug, Default)]
pub struct WatermanSmithBeyer;

/// The step for a gap run of length `k` ending at `(i, j)`: a switch into the gap label, `k - 1`
/// moves inside the run and the move out of the cell that opened it.
fn gap_run(i: usize, j: usize, k: usize, label: MatrixLabel) -> Step {
    let mut step = Vec::with_capacity(k + 1);
    for offset in 0..k {
        let position = match label {
            MatrixLabel::Vertical => Position::with_label(i - offset, j, label),
            MatrixLabel::Horizontal => Position::with_label(i, j - offset, label),
            MatrixLabel::Default => unreachable!("gap runs are vertical or horizontal"),
        };
        step.push(position);
    }
    step.push(match label {
        MatrixLabel::Vertical => Position::new(i - k, j),
        _ => Position::new(i, j - k),
    });
    step
}

impl AlignmentStrategy for WatermanSmithBeyer {
    fn new_matrices(&self, ctx: &AlignmentContext<'_>) -> ScoreMatrices {
        ScoreMatrices::single(ctx.m(), ctx.n())
    }

    /// The borders hold a single gap run from the origin.
    fn init_boundary(&self, ctx: &AlignmentContext<'_>, matrices: &mut ScoreMatrices) {
        let d = &mut matrices.d;
        d.set(0, 0, 0);
        for i in 1..=ctx.m() {
            d.set(i, 0, ctx.costs.gap_run_cost(i, true));
        }
        for j in 1..=ctx.n() {
            d.set(0, j, ctx.costs.gap_run_cost(j, false));
        }
    }

    fn fill_cell(
        &self,
        ctx: &AlignmentContext<'_>,
        matrices: &mut ScoreMatrices,
        i: usize,
        j: usize,
    ) {
        let d = &matrices.d;
        let diagonal = d.get(i - 1, j - 1) + ctx.diagonal_score(i, j);
        let vertical = (1..=i).map(|k| d.get(i - k, j) + ctx.costs.gap_run_cost(k, true));
        let horizontal = (1..=j).map(|k| d.get(i, j - k) + ctx.costs.gap_run_cost(k, false));
        let value = ctx
            .costs
            .mode
            .optimum(std::iter::once(diagonal).chain(vertical).chain(horizontal))
            .unwrap_or(diagonal);
        matrices.d.set(i, j, value);
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

    /// Diagonal first, then vertical runs by increasing length, then horizontal runs by increasing
    /// length.  A border cell only has the single run it was initialized with.
    fn predecessors(
        &self,
        ctx: &AlignmentContext<'_>,
        matrices: &ScoreMatrices,
        position: Position,
    ) -> Vec<Step> {
        let Position { i, j, label } = position;
        assert_eq!(
            label,
            MatrixLabel::Default,
            "Bug: gap runs are traced as whole steps"
        );
        let d = &matrices.d;
        let value = *d.get(i, j);

        match (i, j) {
            (0, 0) => Vec::new(),
            (_, 0) => vec![gap_run(i, 0, i, MatrixLabel::Vertical)],
            (0, _) => vec![gap_run(0, j, j, MatrixLabel::Horizontal)],
            _ => {
                let mut steps = Vec::new();
                if d.get(i - 1, j - 1) + ctx.diagonal_score(i, j) == value {
                    steps.push(vec![Position::new(i - 1, j - 1)]);
                }
                for k in 1..=i {
                    if d.get(i - k, j) + ctx.costs.gap_run_cost(k, true) == value {
                        steps.push(gap_run(i, j, k, MatrixLabel::Vertical));
                    }
                }
                for k in 1..=j {
                    if d.get(i, j - k) + ctx.costs.gap_run_cost(k, false) == value {
                        steps.push(gap_run(i, j, k, MatrixLabel::Horizontal));
                    }
                }
                steps
            }
        }
    }

    fn score(&self, ctx: &AlignmentContext<'_>, matrices: &ScoreMatrices) -> i32 {
        *matrices.d.get(ctx.m(), ctx.n())
    }
}
