use std::{fmt, sync::Arc};

use anyhow::{ensure, Result};

use crate::align::{
    aligners::constants::{CalculationMode, GAP},
    alignment::Alignment,
};

/// An arbitrary gap cost `g(k)` for a gap of length `k >= 1`.
#[derive(Clone)]
pub struct GapFunction(Arc<dyn Fn(usize) -> i32 + Send + Sync>);

fn saturate(cost: i64) -> i32 {
    i32::try_from(cost).unwrap_or(if cost < 0 { i32::MIN } else { i32::MAX })
}

impl GapFunction {
    pub fn new<F: Fn(usize) -> i32 + Send + Sync + 'static>(f: F) -> Self {
        Self(Arc::new(f))
    }

    /// `g(k) = base_cost + k * enlargement`, saturating at the bounds of `i32`.
    pub fn affine(base_cost: i32, enlargement: i32) -> Self {
        Self::new(move |k| {
            let k = i64::try_from(k).unwrap_or(i64::MAX);
            saturate(
                i64::from(enlargement)
                    .saturating_mul(k)
                    .saturating_add(i64::from(base_cost)),
            )
        })
    }

    /// `g(k) = base_cost + enlargement * ln(k)`, rounded to the nearest integer.
    pub fn logarithmic(base_cost: i32, enlargement: i32) -> Self {
        Self::new(move |k| base_cost + (f64::from(enlargement) * (k as f64).ln()).round() as i32)
    }

    /// `g(k) = base_cost + enlargement * k^2`, saturating at the bounds of `i32`.
    pub fn quadratic(base_cost: i32, enlargement: i32) -> Self {
        Self::new(move |k| {
            let k = i64::try_from(k).unwrap_or(i64::MAX);
            saturate(
                i64::from(enlargement)
                    .saturating_mul(k.saturating_mul(k))
                    .saturating_add(i64::from(base_cost)),
            )
        })
    }

    #[inline(always)]
    pub fn cost(&self, k: usize) -> i32 {
        (self.0)(k)
    }
}

impl fmt::Debug for GapFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GapFunction(g(1)={}, g(2)={})", self.cost(1), self.cost(2))
    }
}

/// How gaps are scored.
#[derive(Clone, Debug)]
pub enum GapCost {
    /// Every gap symbol costs the same.  `deletion` is charged for a symbol of A aligned to a gap
    /// (a horizontal step), `insertion` for a symbol of B aligned to a gap (a vertical step).
    Linear { deletion: i32, insertion: i32 },
    /// A gap run of length `k` costs `base_cost + k * enlargement`.
    Affine { base_cost: i32, enlargement: i32 },
    /// A gap run of length `k` costs `g(k)`.
    General(GapFunction),
}

/// Details of scoring are encapsulated in this structure.
///
/// The model is not normalized: whether costs are positive or negative is up to the caller, and
/// the `mode` decides if the recursion minimizes (distance) or maximizes (similarity).
#[derive(Clone, Debug)]
pub struct CostModel {
    pub match_score: i32,
    pub mismatch_score: i32,
    pub gap: GapCost,
    pub mode: CalculationMode,
}

impl CostModel {
    /// Create a model with a linear gap cost.
    pub fn linear(
        match_score: i32,
        mismatch_score: i32,
        deletion: i32,
        insertion: i32,
        mode: CalculationMode,
    ) -> Self {
        Self {
            match_score,
            mismatch_score,
            gap: GapCost::Linear {
                deletion,
                insertion,
            },
            mode,
        }
    }

    /// Create a model with an affine gap cost.
    pub fn affine(
        match_score: i32,
        mismatch_score: i32,
        base_cost: i32,
        enlargement: i32,
        mode: CalculationMode,
    ) -> Self {
        Self {
            match_score,
            mismatch_score,
            gap: GapCost::Affine {
                base_cost,
                enlargement,
            },
            mode,
        }
    }

    /// Create a model with an arbitrary gap cost function.
    pub fn general(
        match_score: i32,
        mismatch_score: i32,
        gap_function: GapFunction,
        mode: CalculationMode,
    ) -> Self {
        Self {
            match_score,
            mismatch_score,
            gap: GapCost::General(gap_function),
            mode,
        }
    }

    /// The score for aligning `a` with `b`.
    #[inline(always)]
    pub fn score(&self, a: u8, b: u8) -> i32 {
        if a.eq_ignore_ascii_case(&b) {
            self.match_score
        } else {
            self.mismatch_score
        }
    }

    /// The per-symbol costs of a linear model as `(deletion, insertion)`.
    ///
    /// Panics if the gap cost is not linear.
    pub fn linear_costs(&self) -> (i32, i32) {
        match self.gap {
            GapCost::Linear {
                deletion,
                insertion,
            } => (deletion, insertion),
            _ => panic!("Expected a linear gap cost, found {:?}", self.gap),
        }
    }

    /// The costs of an affine model as `(gap_open, gap_extend)`, where opening includes the first
    /// enlargement.
    ///
    /// Panics if the gap cost is not affine.
    pub fn affine_costs(&self) -> (i32, i32) {
        match self.gap {
            GapCost::Affine {
                base_cost,
                enlargement,
            } => (base_cost + enlargement, enlargement),
            _ => panic!("Expected an affine gap cost, found {:?}", self.gap),
        }
    }

    /// The cost of a gap run of length `k` in A (`vertical`) or in B (horizontal).
    pub fn gap_run_cost(&self, k: usize, vertical: bool) -> i32 {
        match &self.gap {
            GapCost::Linear {
                deletion,
                insertion,
            } => {
                let per_symbol = if vertical { *insertion } else { *deletion };
                per_symbol * k as i32
            }
            GapCost::Affine {
                base_cost,
                enlargement,
            } => base_cost + enlargement * k as i32,
            GapCost::General(g) => g.cost(k),
        }
    }

    /// The same model with the roles of the two sequences exchanged, i.e. with deletion and
    /// insertion costs swapped.  Affine and general models are symmetric already.
    pub fn transposed(&self) -> Self {
        let gap = match &self.gap {
            GapCost::Linear {
                deletion,
                insertion,
            } => GapCost::Linear {
                deletion: *insertion,
                insertion: *deletion,
            },
            other => other.clone(),
        };
        Self {
            gap,
            ..self.clone()
        }
    }

    /// Checks that the signs of the costs agree with the calculation mode.  This is never done by
    /// the builders themselves; callers that accept user supplied costs should call this.
    pub fn validate(&self) -> Result<()> {
        let (gap_ok, pair_ok) = match self.mode {
            CalculationMode::Similarity => (
                self.gap_costs_for_validation().iter().all(|c| *c <= 0),
                self.match_score >= self.mismatch_score,
            ),
            CalculationMode::Distance => (
                self.gap_costs_for_validation().iter().all(|c| *c >= 0),
                self.match_score <= self.mismatch_score,
            ),
        };
        ensure!(
            gap_ok,
            "Gap costs {:?} are inconsistent with the {} mode",
            self.gap,
            self.mode
        );
        ensure!(
            pair_ok,
            "Match score {} and mismatch score {} are inconsistent with the {} mode",
            self.match_score,
            self.mismatch_score,
            self.mode
        );
        Ok(())
    }

    fn gap_costs_for_validation(&self) -> Vec<i32> {
        match &self.gap {
            GapCost::Linear {
                deletion,
                insertion,
            } => vec![*deletion, *insertion],
            GapCost::Affine {
                base_cost,
                enlargement,
            } => vec![*base_cost, *enlargement],
            GapCost::General(g) => (1..=3).map(|k| g.cost(k)).collect(),
        }
    }

    /// Re-scores an alignment under this model.  Each maximal run of gap symbols in one of the
    /// aligned strings is charged as a single gap run.
    pub fn score_alignment(&self, alignment: &Alignment) -> i32 {
        let a = alignment.aligned_a.chars().collect::<Vec<_>>();
        let b = alignment.aligned_b.chars().collect::<Vec<_>>();
        assert_eq!(a.len(), b.len(), "Aligned strings differ in length");

        let mut score = 0;
        let mut index = 0;
        while index < a.len() {
            if a[index] == GAP || b[index] == GAP {
                // A gap symbol in B (horizontal) or in A (vertical)
                let vertical = a[index] == GAP;
                let mut run = 0;
                while index < a.len() && (if vertical { a[index] } else { b[index] }) == GAP {
                    run += 1;
                    index += 1;
                }
                score += self.gap_run_cost(run, vertical);
            } else if a[index].eq_ignore_ascii_case(&b[index]) {
                score += self.match_score;
                index += 1;
            } else {
                score += self.mismatch_score;
                index += 1;
            }
        }
        score
    }
}

#[cfg(test)]
pub mod tests {
    use rstest::rstest;

    use super::{CostModel, GapFunction};
    use crate::align::{aligners::constants::CalculationMode, alignment::Alignment};

    #[rstest]
    fn test_score_is_case_insensitive() {
        let costs = CostModel::linear(1, -1, -2, -2, CalculationMode::Similarity);
        assert_eq!(costs.score(b'a', b'A'), 1);
        assert_eq!(costs.score(b'A', b'C'), -1);
    }

    #[rstest]
    fn test_affine_costs() {
        let costs = CostModel::affine(0, -1, -3, -1, CalculationMode::Similarity);
        assert_eq!(costs.affine_costs(), (-4, -1));
        assert_eq!(costs.gap_run_cost(2, true), -5);
    }

    #[rstest]
    #[should_panic(expected = "Expected a linear gap cost")]
    fn test_linear_costs_of_affine_model() {
        let costs = CostModel::affine(0, -1, -3, -1, CalculationMode::Similarity);
        costs.linear_costs();
    }

    #[rstest]
    #[case(GapFunction::affine(-3, -1), [-4, -5, -6])]
    #[case(GapFunction::quadratic(-1, -1), [-2, -5, -10])]
    #[case(GapFunction::logarithmic(-3, -2), [-3, -4, -5])]
    fn test_gap_functions(#[case] g: GapFunction, #[case] expected: [i32; 3]) {
        assert_eq!([g.cost(1), g.cost(2), g.cost(3)], expected);
    }

    #[rstest]
    #[case(GapFunction::quadratic(-1, -1), 100_000, i32::MIN)]
    #[case(GapFunction::quadratic(0, 1), 100_000, i32::MAX)]
    #[case(GapFunction::quadratic(-1, -1), usize::MAX, i32::MIN)]
    #[case(GapFunction::affine(-3, -1), usize::MAX, i32::MIN)]
    #[case(GapFunction::affine(-3, -1), 1_000, -1_003)]
    fn test_long_gaps_saturate(#[case] g: GapFunction, #[case] k: usize, #[case] expected: i32) {
        assert_eq!(g.cost(k), expected);
    }

    #[rstest]
    fn test_transposed_swaps_linear_costs() {
        let costs = CostModel::linear(1, -1, -2, -3, CalculationMode::Similarity);
        assert_eq!(costs.transposed().linear_costs(), (-3, -2));
    }

    #[rstest]
    #[case(CostModel::linear(1, -1, -2, -2, CalculationMode::Similarity), true)]
    #[case(CostModel::linear(1, -1, 2, -2, CalculationMode::Similarity), false)]
    #[case(CostModel::linear(-1, 1, 2, 2, CalculationMode::Distance), true)]
    #[case(CostModel::linear(1, -1, 2, 2, CalculationMode::Distance), false)]
    #[case(CostModel::affine(0, -1, -3, -1, CalculationMode::Similarity), true)]
    #[case(CostModel::general(1, -1, GapFunction::quadratic(1, 1), CalculationMode::Similarity), false)]
    fn test_validate(#[case] costs: CostModel, #[case] ok: bool) {
        assert_eq!(costs.validate().is_ok(), ok);
    }

    #[rstest]
    fn test_score_alignment() {
        let alignment = Alignment::new("TGGA", "__GG");
        let affine = CostModel::affine(0, -1, -3, -1, CalculationMode::Similarity);
        assert_eq!(affine.score_alignment(&alignment), -6);
        let linear = CostModel::linear(0, -1, -2, -2, CalculationMode::Similarity);
        assert_eq!(linear.score_alignment(&alignment), -5);
        // one column per character
        let alignment = Alignment::new("\u{e9}A", "_A");
        assert_eq!(linear.score_alignment(&alignment), -2);
    }
}
