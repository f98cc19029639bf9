//! Global alignment with a linear gap cost in linear space (Hirschberg).
//!
//! Sequence A is halved at `mid`.  A forward pass aligns `A[..mid]` against every prefix of B
//! and a backward pass aligns the reversed `A[mid..]` against every reversed suffix of B; the
//! first index `k` optimizing the sum of the two rows splits B, and both halves are solved
//! recursively.  Either side being empty gives a run of gaps, and a single symbol on either side
//! is solved with the full matrix.
//!
//! Only one optimal alignment is produced.
use derive_getters::Getters;
use log::debug;
use serde::Serialize;

use super::{build_matrix, linear::last_row, AlignmentContext, NeedlemanWunsch};
use crate::align::{
    aligners::constants::GAP, alignment::Alignment, scoring::CostModel,
    traceback::enumerate_tracebacks,
};

/// One division of a sub-problem.  Ranges are half-open and index the full sequences.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Getters)]
pub struct SplitStep {
    a_start: usize,
    a_end: usize,
    b_start: usize,
    b_end: usize,
    /// Where A was halved.
    a_split: usize,
    /// The chosen split of B.
    b_split: usize,
    /// Score of `A[a_start..a_split]` against every prefix of `B[b_start..b_end]`.
    forward: Vec<i32>,
    /// Score of `A[a_split..a_end]` against every suffix of `B[b_start..b_end]`, indexed by the
    /// start of the suffix.
    backward: Vec<i32>,
    sums: Vec<i32>,
    /// The optimal sum, i.e. the score of the sub-problem.
    score: i32,
}

/// The single alignment produced in linear space.
#[derive(Clone, Debug, Serialize)]
pub struct LinearSpace {
    pub score: i32,
    pub alignment: Alignment,
    /// Every division in the order it was made.
    pub steps: Vec<SplitStep>,
}

struct Divider<'a> {
    costs: &'a CostModel,
    transposed: CostModel,
    steps: Vec<SplitStep>,
}

impl<'a> Divider<'a> {
    /// Aligns `a` against `b`, where `a` starts at `a_start` in A and `b` at `b_start` in B,
    /// appending to the aligned strings.  Returns the score.
    fn divide(
        &mut self,
        a: &[u8],
        b: &[u8],
        a_start: usize,
        b_start: usize,
        aligned: &mut (String, String),
    ) -> i32 {
        if a.is_empty() || b.is_empty() {
            return self.gap_run(a, b, aligned);
        }
        if a.len() == 1 || b.len() == 1 {
            return self.full_matrix(a, b, aligned);
        }

        let mid = a.len() / 2;
        // B runs along the columns so that the rows are indexed by B
        let forward = last_row(&AlignmentContext::new(b, &a[..mid], &self.transposed));
        let b_reversed = b.iter().rev().copied().collect::<Vec<_>>();
        let a_reversed = a[mid..].iter().rev().copied().collect::<Vec<_>>();
        let mut backward = last_row(&AlignmentContext::new(
            &b_reversed,
            &a_reversed,
            &self.transposed,
        ));
        backward.reverse();

        let sums = forward
            .iter()
            .zip(backward.iter())
            .map(|(f, r)| f + r)
            .collect::<Vec<_>>();
        let mode = self.costs.mode;
        let mut split = 0;
        for (k, sum) in sums.iter().enumerate() {
            if mode.is_better(*sum, sums[split]) {
                split = k;
            }
        }
        let score = sums[split];
        debug!(
            "Split A[{}..{}] at {} and B[{}..{}] at {} with score {}",
            a_start,
            a_start + a.len(),
            a_start + mid,
            b_start,
            b_start + b.len(),
            b_start + split,
            score
        );
        self.steps.push(SplitStep {
            a_start,
            a_end: a_start + a.len(),
            b_start,
            b_end: b_start + b.len(),
            a_split: a_start + mid,
            b_split: b_start + split,
            forward,
            backward,
            sums,
            score,
        });

        self.divide(&a[..mid], &b[..split], a_start, b_start, aligned);
        self.divide(
            &a[mid..],
            &b[split..],
            a_start + mid,
            b_start + split,
            aligned,
        );
        score
    }

    /// One side is empty: everything on the other side is aligned to gaps.
    fn gap_run(&self, a: &[u8], b: &[u8], aligned: &mut (String, String)) -> i32 {
        aligned.0.extend(a.iter().map(|c| *c as char));
        aligned.0.extend(std::iter::repeat(GAP).take(b.len()));
        aligned.1.extend(std::iter::repeat(GAP).take(a.len()));
        aligned.1.extend(b.iter().map(|c| *c as char));
        match (a.len(), b.len()) {
            (0, 0) => 0,
            (0, k) => self.costs.gap_run_cost(k, true),
            (k, _) => self.costs.gap_run_cost(k, false),
        }
    }

    fn full_matrix(&self, a: &[u8], b: &[u8], aligned: &mut (String, String)) -> i32 {
        let ctx = AlignmentContext::new(a, b, self.costs);
        let matrices = build_matrix(&NeedlemanWunsch, &ctx);
        let tracebacks = enumerate_tracebacks(&NeedlemanWunsch, &ctx, &matrices, 1);
        let path = tracebacks
            .paths
            .first()
            .unwrap_or_else(|| panic!("Bug: no traceback for a global alignment"));
        let alignment = Alignment::from_path(a, b, path);
        aligned.0.push_str(&alignment.aligned_a);
        aligned.1.push_str(&alignment.aligned_b);
        *matrices.d.get(b.len(), a.len())
    }
}

/// Computes a single optimal global alignment of `ctx.a` and `ctx.b` under the linear gap
/// model of `ctx.costs`.
pub fn hirschberg(ctx: &AlignmentContext<'_>) -> LinearSpace {
    let mut divider = Divider {
        costs: ctx.costs,
        transposed: ctx.costs.transposed(),
        steps: Vec::new(),
    };
    let mut aligned = (String::with_capacity(ctx.n() + ctx.m()), String::new());
    let score = divider.divide(ctx.a, ctx.b, 0, 0, &mut aligned);
    let alignment = Alignment::new(&aligned.0, &aligned.1);
    LinearSpace {
        score,
        alignment,
        steps: divider.steps,
    }
}
