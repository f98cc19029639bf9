use anyhow::{anyhow, Error};
use serde::Serialize;
use std::{fmt::Display, str::FromStr};

/// The maximum number of co-optimal traceback paths enumerated before the search stops and the
/// result is flagged as truncated.
pub const MAX_NUMBER_TRACEBACKS: usize = 10;

/// The symbol used for a gap in an aligned sequence.
pub const GAP: char = '_';

/// Marker line symbol for a column where both symbols are equal.
pub const MATCH_MARKER: char = '|';

/// Marker line symbol for a column where the symbols differ.
pub const MISMATCH_MARKER: char = '.';

/// Marker line symbol for a column containing a gap.
pub const GAP_MARKER: char = ' ';

/// Selects the optimum operator used by every recursion: distances are minimized, similarities
/// are maximized.  The sign conventions of the costs themselves are left to the caller.
#[derive(Default, Debug, PartialEq, Eq, Copy, Clone, Hash, Serialize)]
pub enum CalculationMode {
    /// Costs are distances, the optimum is the minimum.
    Distance,
    /// Costs are similarities, the optimum is the maximum.
    #[default]
    Similarity,
}

impl CalculationMode {
    /// Returns the optimum of the given values (`min` for distances, `max` for similarities), or
    /// `None` when there are no values.
    pub fn optimum<I: IntoIterator<Item = i32>>(&self, values: I) -> Option<i32> {
        let values = values.into_iter();
        match self {
            Self::Distance => values.min(),
            Self::Similarity => values.max(),
        }
    }

    /// The optimum of two values.
    #[inline(always)]
    pub fn pick(&self, a: i32, b: i32) -> i32 {
        match self {
            Self::Distance => a.min(b),
            Self::Similarity => a.max(b),
        }
    }

    /// True if `a` is strictly better than `b` under this mode.
    #[inline(always)]
    pub fn is_better(&self, a: i32, b: i32) -> bool {
        match self {
            Self::Distance => a < b,
            Self::Similarity => a > b,
        }
    }
}

impl Display for CalculationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Distance => write!(f, "distance"),
            Self::Similarity => write!(f, "similarity"),
        }
    }
}

impl FromStr for CalculationMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "distance" | "min" => Ok(CalculationMode::Distance),
            "similarity" | "max" => Ok(CalculationMode::Similarity),
            _ => Err(anyhow!("Invalid calculation mode: {}", s)),
        }
    }
}

/// The kinds of evaluation supported by the engine.  Each kind selects the matrix recursion,
/// the boundary initialization, the terminal cells and the origin of a traceback.
///
/// The default evaluation kind is Global.
#[derive(Default, Debug, PartialEq, Eq, Copy, Clone, Hash, Serialize)]
pub enum EvaluationKind {
    /// Needleman-Wunsch with a linear gap cost.
    #[default]
    Global,
    /// Smith-Waterman with a linear gap cost.
    Local,
    /// Gotoh with an affine gap cost.
    AffineGlobal,
    /// Gotoh with an affine gap cost, clamped at zero.
    AffineLocal,
    /// Waterman-Smith-Beyer with an arbitrary gap cost function.
    GeneralGap,
    /// Hirschberg's linear-space divide and conquer with a linear gap cost.
    LinearSpace,
}

impl EvaluationKind {
    /// True for the kinds whose alignments may start and end anywhere.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local | Self::AffineLocal)
    }
}

impl Display for EvaluationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::Local => write!(f, "local"),
            Self::AffineGlobal => write!(f, "affine-global"),
            Self::AffineLocal => write!(f, "affine-local"),
            Self::GeneralGap => write!(f, "general-gap"),
            Self::LinearSpace => write!(f, "linear-space"),
        }
    }
}

impl FromStr for EvaluationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "global" | "needleman-wunsch" => Ok(EvaluationKind::Global),
            "local" | "smith-waterman" => Ok(EvaluationKind::Local),
            "affine-global" | "affine" | "gotoh" => Ok(EvaluationKind::AffineGlobal),
            "affine-local" | "gotoh-local" => Ok(EvaluationKind::AffineLocal),
            "general-gap" | "general" | "waterman-smith-beyer" => Ok(EvaluationKind::GeneralGap),
            "linear-space" | "hirschberg" => Ok(EvaluationKind::LinearSpace),
            _ => Err(anyhow!("Invalid evaluation kind: {}", s)),
        }
    }
}

/// Identifies which of the co-indexed grids a traceback position occupies.  Affine and general
/// gap tracebacks switch grids at gap boundaries.
#[derive(Default, Debug, PartialEq, Eq, Copy, Clone, Hash, PartialOrd, Ord, Serialize)]
pub enum MatrixLabel {
    /// The main matrix (`D`).
    #[default]
    Default,
    /// The matrix of alignments ending in a vertical gap run (`P`), i.e. a gap in A.
    Vertical,
    /// The matrix of alignments ending in a horizontal gap run (`Q`), i.e. a gap in B.
    Horizontal,
}
