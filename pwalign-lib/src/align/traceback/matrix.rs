use serde::Serialize;

use crate::align::aligners::constants::MatrixLabel;

/// A dense `rows x cols` grid stored row-major.
#[derive(Default, Clone, Eq, PartialEq, Hash, Debug, Serialize)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    matrix: Vec<T>,
}

impl<T: Clone> Matrix<T> {
    /// A matrix for prefixes of sequences of length `m` (rows) and `n` (columns), i.e. with
    /// `m + 1` rows and `n + 1` columns, every cell set to `v`.
    pub fn new(m: usize, n: usize, v: T) -> Self {
        let rows = m + 1;
        let cols = n + 1;
        Matrix {
            rows,
            cols,
            matrix: vec![v; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline(always)]
    pub fn set(&mut self, i: usize, j: usize, v: T) {
        debug_assert!(i < self.rows);
        debug_assert!(j < self.cols);
        self.matrix[i * self.cols + j] = v;
    }

    #[inline(always)]
    pub fn get(&self, i: usize, j: usize) -> &T {
        debug_assert!(i < self.rows);
        debug_assert!(j < self.cols);
        &self.matrix[i * self.cols + j]
    }

    /// The cells of row `i`.
    pub fn row(&self, i: usize) -> &[T] {
        assert!(i < self.rows);
        &self.matrix[i * self.cols..(i + 1) * self.cols]
    }

    /// Iterates over all cells as `(i, j, value)`, row by row.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &T)> + '_ {
        self.matrix
            .iter()
            .enumerate()
            .map(move |(index, v)| (index / self.cols, index % self.cols, v))
    }
}

/// The filled grid(s) of a computation.  `p` and `q` exist only for affine models; their cells
/// are `None` where no alignment can end in the corresponding gap state.
#[derive(Default, Clone, Eq, PartialEq, Hash, Debug, Serialize)]
pub struct ScoreMatrices {
    /// Best overall score for every pair of prefixes.
    pub d: Matrix<i32>,
    /// Best score ending in a vertical gap run (a gap in A).
    pub p: Option<Matrix<Option<i32>>>,
    /// Best score ending in a horizontal gap run (a gap in B).
    pub q: Option<Matrix<Option<i32>>>,
}

impl ScoreMatrices {
    /// A single grid, as used by the linear and general gap builders.
    pub fn single(m: usize, n: usize) -> Self {
        Self {
            d: Matrix::new(m, n, 0),
            p: None,
            q: None,
        }
    }

    /// The three co-indexed grids of the affine builders.
    pub fn affine(m: usize, n: usize) -> Self {
        Self {
            d: Matrix::new(m, n, 0),
            p: Some(Matrix::new(m, n, None)),
            q: Some(Matrix::new(m, n, None)),
        }
    }

    pub fn rows(&self) -> usize {
        self.d.rows()
    }

    pub fn cols(&self) -> usize {
        self.d.cols()
    }

    /// The value of the cell at `(i, j)` in the grid named by `label`, or `None` if that grid does
    /// not exist or holds no valid entry.
    pub fn value(&self, i: usize, j: usize, label: MatrixLabel) -> Option<i32> {
        match label {
            MatrixLabel::Default => Some(*self.d.get(i, j)),
            MatrixLabel::Vertical => self.p.as_ref().and_then(|p| *p.get(i, j)),
            MatrixLabel::Horizontal => self.q.as_ref().and_then(|q| *q.get(i, j)),
        }
    }

    /// The value of the gap state grid at `(i, j)`.  Panics if the grid does not exist.
    #[inline(always)]
    pub fn gap_value(&self, i: usize, j: usize, label: MatrixLabel) -> Option<i32> {
        let grid = match label {
            MatrixLabel::Vertical => self.p.as_ref(),
            MatrixLabel::Horizontal => self.q.as_ref(),
            MatrixLabel::Default => panic!("The default grid is not a gap state grid"),
        };
        *grid.expect("Bug: gap state grid is missing").get(i, j)
    }

    pub fn set_gap_value(&mut self, i: usize, j: usize, label: MatrixLabel, v: Option<i32>) {
        let grid = match label {
            MatrixLabel::Vertical => self.p.as_mut(),
            MatrixLabel::Horizontal => self.q.as_mut(),
            MatrixLabel::Default => panic!("The default grid is not a gap state grid"),
        };
        grid.expect("Bug: gap state grid is missing").set(i, j, v);
    }
}

#[cfg(test)]
pub mod tests {
    use itertools::Itertools;
    use rstest::rstest;

    use super::{Matrix, ScoreMatrices};
    use crate::align::aligners::constants::MatrixLabel;

    #[rstest]
    fn test_new_and_set() {
        let mut matrix = Matrix::new(2, 3, 0);
        assert_eq!(matrix.rows(), 3);
        assert_eq!(matrix.cols(), 4);
        matrix.set(1, 2, 7);
        assert_eq!(*matrix.get(1, 2), 7);
        assert_eq!(matrix.row(1), &[0, 0, 7, 0]);
        let non_zero = matrix.cells().filter(|(_, _, v)| **v != 0).collect_vec();
        assert_eq!(non_zero, vec![(1, 2, &7)]);
    }

    #[rstest]
    fn test_values_by_label() {
        let mut single = ScoreMatrices::single(1, 1);
        single.d.set(1, 1, 3);
        assert_eq!(single.value(1, 1, MatrixLabel::Default), Some(3));
        assert_eq!(single.value(1, 1, MatrixLabel::Vertical), None);

        let mut affine = ScoreMatrices::affine(1, 1);
        affine.set_gap_value(1, 0, MatrixLabel::Vertical, Some(-4));
        assert_eq!(affine.value(1, 0, MatrixLabel::Vertical), Some(-4));
        assert_eq!(affine.gap_value(1, 0, MatrixLabel::Horizontal), None);
    }

    #[rstest]
    #[should_panic(expected = "gap state grid is missing")]
    fn test_gap_value_without_gap_grids() {
        ScoreMatrices::single(1, 1).gap_value(0, 0, MatrixLabel::Vertical);
    }
}
