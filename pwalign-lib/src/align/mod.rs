pub mod aligners;
pub mod alignment;
pub mod scoring;
pub mod traceback;

pub use aligners::{
    AlignmentResult, Builder, CalculationMode, Engine, EvaluationKind, LinearSpace, SplitStep,
};
pub use alignment::{reconstruct_alignments, Alignment, AlignmentStats};
pub use scoring::{CostModel, GapCost, GapFunction};
