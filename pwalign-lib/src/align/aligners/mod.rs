pub(crate) mod affine;
pub(crate) mod constants;
pub(crate) mod general;
pub(crate) mod hirschberg;
pub(crate) mod linear;

pub use affine::{Gotoh, GotohLocal};
pub use constants::{CalculationMode, EvaluationKind, MatrixLabel, MAX_NUMBER_TRACEBACKS};
pub use general::WatermanSmithBeyer;
pub use hirschberg::{LinearSpace, SplitStep};
pub use linear::{NeedlemanWunsch, SmithWaterman};

use anyhow::{Context, Result};
use derive_builder::Builder;
use derive_getters::Getters;
use enum_dispatch::enum_dispatch;
use log::{debug, warn};
use serde::Serialize;

use crate::align::{
    alignment::{reconstruct_alignments, Alignment},
    scoring::{CostModel, GapFunction},
    traceback::{enumerate_tracebacks, matrix::ScoreMatrices, Position, Step, Tracebacks},
};

/// The inputs of a single computation.  Every builder and the traceback enumerator receive the
/// context explicitly; nothing about a computation is kept between calls.
#[derive(Clone, Copy, Debug)]
pub struct AlignmentContext<'a> {
    /// Sequence A, indexing the columns of the matrices.
    pub a: &'a [u8],
    /// Sequence B, indexing the rows of the matrices.
    pub b: &'a [u8],
    pub costs: &'a CostModel,
}

impl<'a> AlignmentContext<'a> {
    pub fn new(a: &'a [u8], b: &'a [u8], costs: &'a CostModel) -> Self {
        Self { a, b, costs }
    }

    /// The number of rows minus one, i.e. the length of B.
    pub fn m(&self) -> usize {
        self.b.len()
    }

    /// The number of columns minus one, i.e. the length of A.
    pub fn n(&self) -> usize {
        self.a.len()
    }

    /// The score of the diagonal step into cell `(i, j)`, aligning `a[j - 1]` with `b[i - 1]`.
    #[inline(always)]
    pub fn diagonal_score(&self, i: usize, j: usize) -> i32 {
        self.costs.score(self.a[j - 1], self.b[i - 1])
    }
}

/// The recursion-specific parts of an alignment algorithm.  The matrix fill loop and the
/// traceback enumerator are shared and drive these hooks.
#[enum_dispatch]
pub trait AlignmentStrategy {
    /// Allocates the grid(s) for the context.
    fn new_matrices(&self, ctx: &AlignmentContext<'_>) -> ScoreMatrices;

    /// Sets row 0 and column 0.
    fn init_boundary(&self, ctx: &AlignmentContext<'_>, matrices: &mut ScoreMatrices);

    /// Computes cell `(i, j)` of every grid, for `i, j >= 1`.
    fn fill_cell(
        &self,
        ctx: &AlignmentContext<'_>,
        matrices: &mut ScoreMatrices,
        i: usize,
        j: usize,
    );

    /// The cells a traceback starts from.
    fn terminal_cells(&self, ctx: &AlignmentContext<'_>, matrices: &ScoreMatrices)
        -> Vec<Position>;

    /// True if a traceback ends at this position.
    fn is_origin(
        &self,
        ctx: &AlignmentContext<'_>,
        matrices: &ScoreMatrices,
        position: Position,
    ) -> bool;

    /// Every step leading into `position` along an optimal path.  A step is the sequence of
    /// positions visited, ending with the predecessor.
    fn predecessors(
        &self,
        ctx: &AlignmentContext<'_>,
        matrices: &ScoreMatrices,
        position: Position,
    ) -> Vec<Step>;

    /// The optimal score once the grid(s) are filled.
    fn score(&self, ctx: &AlignmentContext<'_>, matrices: &ScoreMatrices) -> i32;
}

/// The closed set of matrix recursions, selected from an [`EvaluationKind`].
#[enum_dispatch(AlignmentStrategy)]
#[derive(Clone, Copy, Debug)]
pub enum Strategy {
    NeedlemanWunsch(NeedlemanWunsch),
    SmithWaterman(SmithWaterman),
    Gotoh(Gotoh),
    GotohLocal(GotohLocal),
    WatermanSmithBeyer(WatermanSmithBeyer),
}

impl Strategy {
    /// The recursion used for the given kind.  The linear-space kind divides the problem but its
    /// sub-problems are filled with the linear global recursion.
    pub fn for_kind(kind: EvaluationKind) -> Self {
        match kind {
            EvaluationKind::Global | EvaluationKind::LinearSpace => NeedlemanWunsch.into(),
            EvaluationKind::Local => SmithWaterman.into(),
            EvaluationKind::AffineGlobal => Gotoh.into(),
            EvaluationKind::AffineLocal => GotohLocal.into(),
            EvaluationKind::GeneralGap => WatermanSmithBeyer.into(),
        }
    }
}

/// Fills the grid(s) for the context: boundaries first, then row by row.
pub fn build_matrix<S: AlignmentStrategy>(
    strategy: &S,
    ctx: &AlignmentContext<'_>,
) -> ScoreMatrices {
    let mut matrices = strategy.new_matrices(ctx);
    assert_eq!(matrices.rows(), ctx.m() + 1, "Bug: matrix rows");
    assert_eq!(matrices.cols(), ctx.n() + 1, "Bug: matrix columns");
    strategy.init_boundary(ctx, &mut matrices);
    for i in 1..=ctx.m() {
        for j in 1..=ctx.n() {
            strategy.fill_cell(ctx, &mut matrices, i, j);
        }
    }
    matrices
}

#[derive(Clone, Debug, Builder)]
#[builder(name = "Builder", build_fn(name = "build_options"))]
pub struct Options {
    #[builder(default)]
    mode: CalculationMode,
    #[builder(default)]
    kind: EvaluationKind,
    #[builder(default = "1")]
    match_score: i32,
    #[builder(default = "-1")]
    mismatch_score: i32,
    /// Cost of a symbol of A aligned to a gap (linear models).
    #[builder(default = "-2")]
    deletion: i32,
    /// Cost of a symbol of B aligned to a gap (linear models).
    #[builder(default = "-2")]
    insertion: i32,
    #[builder(default = "-3")]
    base_cost: i32,
    #[builder(default = "-1")]
    enlargement: i32,
    /// Gap cost function for the general gap model, affine in `base_cost` and `enlargement` if
    /// not given.
    #[builder(default, setter(strip_option))]
    gap_function: Option<GapFunction>,
    #[builder(default = "MAX_NUMBER_TRACEBACKS")]
    max_tracebacks: usize,
    #[builder(default = "false")]
    validate_costs: bool,
}

impl Options {
    fn cost_model(&self) -> CostModel {
        match self.kind {
            EvaluationKind::Global | EvaluationKind::Local | EvaluationKind::LinearSpace => {
                CostModel::linear(
                    self.match_score,
                    self.mismatch_score,
                    self.deletion,
                    self.insertion,
                    self.mode,
                )
            }
            EvaluationKind::AffineGlobal | EvaluationKind::AffineLocal => CostModel::affine(
                self.match_score,
                self.mismatch_score,
                self.base_cost,
                self.enlargement,
                self.mode,
            ),
            EvaluationKind::GeneralGap => CostModel::general(
                self.match_score,
                self.mismatch_score,
                self.gap_function
                    .clone()
                    .unwrap_or_else(|| GapFunction::affine(self.base_cost, self.enlargement)),
                self.mode,
            ),
        }
    }
}

impl Builder {
    pub fn build_engine(&self) -> Result<Engine> {
        let opts = self.build_options()?;
        let costs = opts.cost_model();
        if opts.validate_costs {
            costs
                .validate()
                .with_context(|| format!("Invalid costs for {} alignment", opts.kind))?;
        }
        if opts.kind.is_local() && opts.mode == CalculationMode::Distance {
            warn!(
                "{} alignment in distance mode: the floor is 0 and only negative cells terminate",
                opts.kind
            );
        }
        Ok(Engine {
            strategy: Strategy::for_kind(opts.kind),
            costs,
            opts,
        })
    }
}

/// Everything produced by a single call to [`Engine::align`].
#[derive(Clone, Debug, Serialize, Getters)]
pub struct AlignmentResult {
    /// The optimal score.
    score: i32,
    /// The distinct co-optimal alignments, at most `max_tracebacks` of them.
    alignments: Vec<Alignment>,
    /// True if more co-optimal tracebacks exist than were returned.  This counts traceback
    /// paths, not distinct alignments: paths differing only in label switches collapse into one
    /// alignment, so `alignments` may be shorter than `paths` whether or not this is set.
    truncated: bool,
    /// The traceback paths, terminal cell first.
    paths: Vec<Vec<Position>>,
    /// The filled grid(s); `None` for linear-space evaluation.
    matrices: Option<ScoreMatrices>,
    /// The split points of a linear-space evaluation.
    steps: Vec<SplitStep>,
}

/// Aligns pairs of sequences under a fixed cost model and evaluation kind.
#[derive(Clone, Debug)]
pub struct Engine {
    strategy: Strategy,
    costs: CostModel,
    opts: Options,
}

impl Engine {
    pub fn costs(&self) -> &CostModel {
        &self.costs
    }

    pub fn kind(&self) -> EvaluationKind {
        self.opts.kind
    }

    pub fn max_tracebacks(&self) -> usize {
        self.opts.max_tracebacks
    }

    /// Fills the grid(s) of the configured recursion.
    pub fn build_matrix(&self, a: &[u8], b: &[u8]) -> ScoreMatrices {
        let ctx = AlignmentContext::new(a, b, &self.costs);
        let matrices = build_matrix(&self.strategy, &ctx);
        debug!(
            "Filled {}x{} {} matrix with score {}",
            matrices.rows(),
            matrices.cols(),
            self.opts.kind,
            self.strategy.score(&ctx, &matrices)
        );
        matrices
    }

    /// Enumerates the co-optimal traceback paths through matrices built by
    /// [`Engine::build_matrix`] for the same sequences.
    pub fn enumerate_tracebacks(
        &self,
        a: &[u8],
        b: &[u8],
        matrices: &ScoreMatrices,
    ) -> Tracebacks {
        let ctx = AlignmentContext::new(a, b, &self.costs);
        enumerate_tracebacks(&self.strategy, &ctx, matrices, self.opts.max_tracebacks)
    }

    /// Computes a single optimal global alignment in linear space.
    pub fn compute_hirschberg(&self, a: &[u8], b: &[u8]) -> LinearSpace {
        let ctx = AlignmentContext::new(a, b, &self.costs);
        hirschberg::hirschberg(&ctx)
    }

    /// Aligns `a` and `b`, both upper-cased first.
    ///
    /// Sequences are expected to be ASCII.  Every byte is one symbol and one alignment column, and
    /// only ASCII letters are upper-cased.
    pub fn align(&self, a: &[u8], b: &[u8]) -> AlignmentResult {
        let a = a.to_ascii_uppercase();
        let b = b.to_ascii_uppercase();

        if self.opts.kind == EvaluationKind::LinearSpace {
            let linear_space = self.compute_hirschberg(&a, &b);
            return AlignmentResult {
                score: linear_space.score,
                alignments: vec![linear_space.alignment],
                truncated: false,
                paths: Vec::new(),
                matrices: None,
                steps: linear_space.steps,
            };
        }

        let ctx = AlignmentContext::new(&a, &b, &self.costs);
        let matrices = self.build_matrix(&a, &b);
        let score = self.strategy.score(&ctx, &matrices);
        let tracebacks = self.enumerate_tracebacks(&a, &b, &matrices);
        if tracebacks.truncated {
            debug!(
                "Stopped after {} tracebacks, more are available",
                tracebacks.paths.len()
            );
        }
        let alignments = reconstruct_alignments(&a, &b, &tracebacks.paths);
        AlignmentResult {
            score,
            alignments,
            truncated: tracebacks.truncated,
            paths: tracebacks.paths,
            matrices: Some(matrices),
            steps: Vec::new(),
        }
    }
}

#[cfg(test)]
pub mod tests {
    use itertools::Itertools;
    use rstest::rstest;

    use super::{Builder, CalculationMode, EvaluationKind, MAX_NUMBER_TRACEBACKS};
    use crate::align::scoring::GapFunction;

    fn aligned_pairs(result: &super::AlignmentResult) -> Vec<(String, String)> {
        result
            .alignments()
            .iter()
            .map(|a| (a.aligned_a.clone(), a.aligned_b.clone()))
            .sorted()
            .collect_vec()
    }

    fn pair(a: &str, b: &str) -> (String, String) {
        (a.to_string(), b.to_string())
    }

    #[rstest]
    fn test_global_linear() {
        let engine = Builder::default()
            .kind(EvaluationKind::Global)
            .mode(CalculationMode::Similarity)
            .match_score(1)
            .mismatch_score(-1)
            .deletion(-2)
            .insertion(-2)
            .build_engine()
            .unwrap();
        let result = engine.align(b"AGTC", b"ATC");
        assert_eq!(*result.score(), 1);
        assert_eq!(aligned_pairs(&result), vec![pair("AGTC", "A_TC")]);
        assert!(!result.truncated());
        assert!(result.matrices().is_some());
    }

    #[rstest]
    fn test_affine_global() {
        let engine = Builder::default()
            .kind(EvaluationKind::AffineGlobal)
            .match_score(0)
            .mismatch_score(-1)
            .base_cost(-3)
            .enlargement(-1)
            .build_engine()
            .unwrap();
        let result = engine.align(b"TGGA", b"GG");
        assert_eq!(*result.score(), -6);
        assert_eq!(
            aligned_pairs(&result),
            vec![pair("TGGA", "GG__"), pair("TGGA", "__GG")]
        );
    }

    #[rstest]
    fn test_local_linear() {
        let engine = Builder::default()
            .kind(EvaluationKind::Local)
            .build_engine()
            .unwrap();
        let result = engine.align(b"AACG", b"AATCG");
        assert_eq!(*result.score(), 2);
        let pairs = aligned_pairs(&result);
        assert!(pairs.contains(&pair("AA", "AA")));
        assert!(pairs.contains(&pair("CG", "CG")));
    }

    #[rstest]
    fn test_affine_local() {
        let engine = Builder::default()
            .kind(EvaluationKind::AffineLocal)
            .base_cost(-3)
            .enlargement(-1)
            .build_engine()
            .unwrap();
        let result = engine.align(b"CG", b"CCGA");
        assert_eq!(*result.score(), 2);
        assert_eq!(aligned_pairs(&result), vec![pair("CG", "CG")]);
    }

    #[rstest]
    fn test_linear_space_matches_global() {
        let mut builder = Builder::default();
        builder
            .mode(CalculationMode::Distance)
            .match_score(-1)
            .mismatch_score(1)
            .deletion(2)
            .insertion(2);
        let global = builder
            .clone()
            .kind(EvaluationKind::Global)
            .build_engine()
            .unwrap()
            .align(b"AATCG", b"ACG");
        let linear_space = builder
            .kind(EvaluationKind::LinearSpace)
            .build_engine()
            .unwrap()
            .align(b"AATCG", b"ACG");
        assert_eq!(linear_space.alignments().len(), 1);
        assert_eq!(linear_space.alignments()[0].aligned_a, "AATCG");
        assert_eq!(linear_space.alignments()[0].aligned_b, "_A_CG");
        assert_eq!(linear_space.alignments()[0], global.alignments()[0]);
        assert_eq!(linear_space.score(), global.score());
        assert!(linear_space.matrices().is_none());
        assert!(!linear_space.steps().is_empty());
    }

    #[rstest]
    fn test_general_gap_defaults_to_affine() {
        let mut builder = Builder::default();
        builder.match_score(0).mismatch_score(-1).base_cost(-3).enlargement(-1);
        let affine = builder
            .clone()
            .kind(EvaluationKind::AffineGlobal)
            .build_engine()
            .unwrap()
            .align(b"TGGA", b"GG");
        let general = builder
            .kind(EvaluationKind::GeneralGap)
            .build_engine()
            .unwrap()
            .align(b"TGGA", b"GG");
        assert_eq!(general.score(), affine.score());
        assert_eq!(aligned_pairs(&general), aligned_pairs(&affine));
    }

    #[rstest]
    fn test_general_gap_with_custom_function() {
        let engine = Builder::default()
            .kind(EvaluationKind::GeneralGap)
            .gap_function(GapFunction::new(|k| -10 - (k as i32)))
            .build_engine()
            .unwrap();
        let result = engine.align(b"ACGT", b"AT");
        // one gap run of two is cheaper than two runs of one
        assert_eq!(*result.score(), 1 + 1 - 12);
        assert_eq!(aligned_pairs(&result), vec![pair("ACGT", "A__T")]);
    }

    #[rstest]
    fn test_input_is_upper_cased() {
        let engine = Builder::default().build_engine().unwrap();
        let result = engine.align(b"agtc", b"atc");
        assert_eq!(*result.score(), 1);
        assert_eq!(aligned_pairs(&result), vec![pair("AGTC", "A_TC")]);
    }

    #[rstest]
    fn test_truncated_when_too_many_tracebacks() {
        // every path through a matrix of equal costs is co-optimal
        let engine = Builder::default()
            .match_score(0)
            .mismatch_score(0)
            .deletion(0)
            .insertion(0)
            .build_engine()
            .unwrap();
        let result = engine.align(b"AAAA", b"AAAA");
        assert!(*result.truncated());
        assert_eq!(result.paths().len(), MAX_NUMBER_TRACEBACKS);
        assert!(result.alignments().len() <= MAX_NUMBER_TRACEBACKS);
    }

    #[rstest]
    fn test_max_tracebacks_is_configurable() {
        let engine = Builder::default()
            .match_score(0)
            .mismatch_score(0)
            .deletion(0)
            .insertion(0)
            .max_tracebacks(3)
            .build_engine()
            .unwrap();
        let result = engine.align(b"AAA", b"AA");
        assert!(*result.truncated());
        assert_eq!(result.alignments().len(), 3);
    }

    #[rstest]
    fn test_validate_costs() {
        let result = Builder::default()
            .mode(CalculationMode::Distance)
            .validate_costs(true)
            .build_engine();
        assert!(result.is_err());
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("Invalid costs for global alignment"), "{message}");
    }

    #[rstest]
    #[case(EvaluationKind::Global, 1)]
    #[case(EvaluationKind::AffineGlobal, 1)]
    #[case(EvaluationKind::GeneralGap, 1)]
    #[case(EvaluationKind::LinearSpace, 1)]
    #[case(EvaluationKind::Local, 0)]
    #[case(EvaluationKind::AffineLocal, 0)]
    fn test_empty_sequences(#[case] kind: EvaluationKind, #[case] expected: usize) {
        let engine = Builder::default().kind(kind).build_engine().unwrap();
        let result = engine.align(b"", b"ACG");
        assert_eq!(result.alignments().len(), expected);
        if expected == 1 {
            assert_eq!(result.alignments()[0].aligned_a, "___");
            assert_eq!(result.alignments()[0].aligned_b, "ACG");
        } else {
            assert_eq!(*result.score(), 0);
        }

        let result = engine.align(b"", b"");
        assert_eq!(*result.score(), 0);
        assert_eq!(result.alignments().len(), expected);
    }

    #[rstest]
    fn test_truncated_counts_paths() {
        // two paths for the same alignment: the run of Q cells is entered by extension or by
        // opening from D
        let mut builder = Builder::default();
        builder
            .kind(EvaluationKind::AffineGlobal)
            .match_score(0)
            .mismatch_score(0)
            .base_cost(0)
            .enlargement(0);
        let result = builder.clone().build_engine().unwrap().align(b"AA", b"");
        assert!(!result.truncated());
        assert_eq!(result.paths().len(), 2);
        assert_eq!(aligned_pairs(&result), vec![pair("AA", "__")]);

        let result = builder
            .max_tracebacks(1)
            .build_engine()
            .unwrap()
            .align(b"AA", b"");
        assert!(*result.truncated());
        assert_eq!(result.paths().len(), 1);
        assert_eq!(aligned_pairs(&result), vec![pair("AA", "__")]);
    }

    const PAIRS: [(&str, &str); 7] = [
        ("AATCG", "ACG"),
        ("GATTACA", "GCATGCT"),
        ("TGGA", "GG"),
        ("ACGTTGCA", "CGTTAGCA"),
        ("", "ACG"),
        ("A", "T"),
        ("CCGA", "CG"),
    ];

    #[rstest]
    #[case(EvaluationKind::Global)]
    #[case(EvaluationKind::AffineGlobal)]
    #[case(EvaluationKind::GeneralGap)]
    #[case(EvaluationKind::LinearSpace)]
    fn test_global_score_is_symmetric(#[case] kind: EvaluationKind) {
        for mode in [CalculationMode::Similarity, CalculationMode::Distance] {
            let (matching, mismatching, deletion, insertion, base_cost) = match mode {
                CalculationMode::Similarity => (1, -1, -3, -1, -3),
                CalculationMode::Distance => (0, 1, 3, 1, 3),
            };
            let mut builder = Builder::default();
            builder
                .kind(kind)
                .mode(mode)
                .match_score(matching)
                .mismatch_score(mismatching)
                .base_cost(base_cost)
                .enlargement(insertion);
            let forward = builder
                .clone()
                .deletion(deletion)
                .insertion(insertion)
                .build_engine()
                .unwrap();
            let swapped = builder
                .deletion(insertion)
                .insertion(deletion)
                .build_engine()
                .unwrap();
            for (a, b) in PAIRS {
                let (a, b) = (a.as_bytes(), b.as_bytes());
                assert_eq!(
                    forward.align(a, b).score(),
                    swapped.align(b, a).score(),
                    "{kind} {mode}: {a:?} vs {b:?}"
                );
            }
        }
    }

    #[rstest]
    #[case(EvaluationKind::Global)]
    #[case(EvaluationKind::AffineGlobal)]
    #[case(EvaluationKind::GeneralGap)]
    #[case(EvaluationKind::LinearSpace)]
    #[case(EvaluationKind::Local)]
    #[case(EvaluationKind::AffineLocal)]
    fn test_alignments_rebuild_inputs_and_rescore(#[case] kind: EvaluationKind) {
        let local = kind.is_local();
        let engine = Builder::default().kind(kind).build_engine().unwrap();
        for (a, b) in PAIRS {
            let result = engine.align(a.as_bytes(), b.as_bytes());
            if !local {
                assert!(!result.alignments().is_empty(), "{kind}: {a} vs {b}");
            }
            for alignment in result.alignments() {
                assert_eq!(
                    engine.costs().score_alignment(alignment),
                    *result.score(),
                    "{kind}:\n{alignment}"
                );
                if local {
                    assert!(a.contains(alignment.ungapped_a().as_str()), "{alignment}");
                    assert!(b.contains(alignment.ungapped_b().as_str()), "{alignment}");
                } else {
                    assert_eq!(alignment.ungapped_a(), a);
                    assert_eq!(alignment.ungapped_b(), b);
                }
            }
        }
    }
}
