//! Core traits for the SMO solver

use crate::core::Sample;

/// Access to the matrix `Q` of the dual problem.
///
/// For C-SVC, `Q[i][j] = y_i * y_j * K(x_i, x_j)`. Indices are the solver's
/// working positions: after `swap(i, j)` every later `row` and `diagonal`
/// call must reflect the exchanged order.
///
/// Implementations usually cache rows, so a single instance must not be
/// shared between concurrent solves.
pub trait QMatrix {
    /// Return `Q[i][0..len)` under the current index order
    fn row(&mut self, i: usize, len: usize) -> &[f64];

    /// Return the diagonal `Q[i][i]` for all `l` positions
    fn diagonal(&self) -> &[f64];

    /// Exchange positions `i` and `j`
    fn swap(&mut self, i: usize, j: usize);
}

/// Dataset abstraction for labeled samples
pub trait Dataset: Send + Sync {
    /// Number of samples in the dataset
    fn len(&self) -> usize;

    /// Number of features (dimensionality)
    fn dim(&self) -> usize;

    /// Get a single sample by index
    ///
    /// # Panics
    /// Panics if index >= len()
    fn get_sample(&self, i: usize) -> Sample;
}
