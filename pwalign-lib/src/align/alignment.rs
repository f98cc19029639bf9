use std::fmt;

use itertools::Itertools;
use serde::Serialize;

use crate::align::{
    aligners::constants::{GAP, GAP_MARKER, MATCH_MARKER, MISMATCH_MARKER},
    traceback::Position,
};

/// A pairwise alignment as three strings of equal length: sequence A with gaps, the column
/// markers, and sequence B with gaps.
#[derive(Debug, Eq, PartialEq, Hash, Clone, Default, Serialize)]
pub struct Alignment {
    pub aligned_a: String,
    /// `|` for a match, `.` for a mismatch and a space where either side is a gap.
    pub markers: String,
    pub aligned_b: String,
}

/// Column counts of an alignment.
#[derive(Debug, Eq, PartialEq, Clone, Copy, Default, Serialize)]
pub struct AlignmentStats {
    pub length: usize,
    pub matches: usize,
    pub mismatches: usize,
    /// Columns with a gap on either side.
    pub gaps: usize,
    /// Maximal runs of gaps, counted separately for A and B.
    pub gap_opens: usize,
}

impl AlignmentStats {
    /// Matching columns as a percentage of all columns, `0` for an empty alignment.
    pub fn identity(&self) -> f64 {
        if self.length == 0 {
            0.0
        } else {
            100.0 * self.matches as f64 / self.length as f64
        }
    }
}

fn marker(a: char, b: char) -> char {
    if a == GAP || b == GAP {
        GAP_MARKER
    } else if a == b {
        MATCH_MARKER
    } else {
        MISMATCH_MARKER
    }
}

impl Alignment {
    /// Builds an alignment from its two gapped strings, computing the markers.  Only ASCII
    /// letters are upper-cased.
    pub fn new(aligned_a: &str, aligned_b: &str) -> Self {
        assert_eq!(
            aligned_a.chars().count(),
            aligned_b.chars().count(),
            "Aligned strings differ in length"
        );
        let aligned_a = aligned_a.to_ascii_uppercase();
        let aligned_b = aligned_b.to_ascii_uppercase();
        let markers = aligned_a
            .chars()
            .zip(aligned_b.chars())
            .map(|(a, b)| marker(a, b))
            .collect();
        Self {
            aligned_a,
            markers,
            aligned_b,
        }
    }

    /// Replays a traceback path, given from the terminal cell back to the origin, over the
    /// sequences.  Panics if two consecutive positions are not a single move or a label switch.
    ///
    /// Sequences are expected to be ASCII.  Each byte becomes one column, so any other byte is
    /// read as the Latin-1 character of the same value.
    pub fn from_path(a: &[u8], b: &[u8], path: &[Position]) -> Self {
        let mut aligned_a = String::with_capacity(path.len());
        let mut aligned_b = String::with_capacity(path.len());
        let gap = GAP as u8;

        for (from, to) in path.iter().rev().tuple_windows() {
            let (column_a, column_b) = match (to.i.checked_sub(from.i), to.j.checked_sub(from.j)) {
                (Some(1), Some(1)) => (a[to.j - 1], b[to.i - 1]),
                (Some(0), Some(1)) => (a[to.j - 1], gap),
                (Some(1), Some(0)) => (gap, b[to.i - 1]),
                (Some(0), Some(0)) if from.label != to.label => continue,
                _ => panic!("Bug: malformed traceback step from {from:?} to {to:?}"),
            };
            aligned_a.push(column_a.to_ascii_uppercase() as char);
            aligned_b.push(column_b.to_ascii_uppercase() as char);
        }
        Self::new(&aligned_a, &aligned_b)
    }

    /// The number of columns.
    pub fn len(&self) -> usize {
        self.markers.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Sequence A without gaps.
    pub fn ungapped_a(&self) -> String {
        self.aligned_a.chars().filter(|c| *c != GAP).collect()
    }

    /// Sequence B without gaps.
    pub fn ungapped_b(&self) -> String {
        self.aligned_b.chars().filter(|c| *c != GAP).collect()
    }

    /// The number of gap symbols in both strings.
    pub fn gap_count(&self) -> usize {
        self.aligned_a
            .chars()
            .chain(self.aligned_b.chars())
            .filter(|c| *c == GAP)
            .count()
    }

    pub fn stats(&self) -> AlignmentStats {
        let runs = |s: &str| {
            s.chars()
                .dedup_with_count()
                .filter(|(_, c)| *c == GAP)
                .count()
        };
        AlignmentStats {
            length: self.len(),
            matches: self.markers.chars().filter(|c| *c == MATCH_MARKER).count(),
            mismatches: self
                .markers
                .chars()
                .filter(|c| *c == MISMATCH_MARKER)
                .count(),
            gaps: self.markers.chars().filter(|c| *c == GAP_MARKER).count(),
            gap_opens: runs(&self.aligned_a) + runs(&self.aligned_b),
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.aligned_a)?;
        writeln!(f, "{}", self.markers)?;
        write!(f, "{}", self.aligned_b)
    }
}

/// Reconstructs the alignment of every path, dropping repeats while keeping the order of first
/// appearance.  Distinct paths give the same strings when they differ only in label switches.
pub fn reconstruct_alignments(a: &[u8], b: &[u8], paths: &[Vec<Position>]) -> Vec<Alignment> {
    paths
        .iter()
        .map(|path| Alignment::from_path(a, b, path))
        .unique()
        .collect()
}
