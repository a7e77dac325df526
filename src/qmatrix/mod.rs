//! `QMatrix` implementations
//!
//! - [`KernelQMatrix`]: C-SVC matrix `Q[i][j] = y_i y_j K(x_i, x_j)` evaluated
//!   on demand from samples and a [`Kernel`], with an LRU row cache.
//! - [`PrecomputedQMatrix`]: a dense, caller-supplied matrix.

use crate::cache::{CacheStats, RowCache};
use crate::core::{QMatrix, Result, Sample, SolverError, SparseVector};
use crate::kernel::Kernel;

/// Classification Q matrix backed by a kernel function
pub struct KernelQMatrix<K: Kernel> {
    kernel: K,
    features: Vec<SparseVector>,
    signs: Vec<f64>,
    diagonal: Vec<f64>,
    cache: RowCache,
}

impl<K: Kernel> KernelQMatrix<K> {
    /// Build the matrix for `samples`, caching rows within `cache_size` bytes
    pub fn new(kernel: K, samples: &[Sample], cache_size: usize) -> Result<Self> {
        let signs = samples
            .iter()
            .map(|s| {
                if s.label == 1.0 || s.label == -1.0 {
                    Ok(s.label)
                } else {
                    Err(SolverError::InvalidLabel(s.label))
                }
            })
            .collect::<Result<Vec<f64>>>()?;
        let features: Vec<SparseVector> = samples.iter().map(|s| s.features.clone()).collect();
        let diagonal = features.iter().map(|x| kernel.compute(x, x)).collect();
        let cache = RowCache::with_memory_limit(cache_size, features.len());

        Ok(Self {
            kernel,
            features,
            signs,
            diagonal,
            cache,
        })
    }

    /// Number of examples
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Kernel used to fill rows
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Row cache statistics
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl<K: Kernel> QMatrix for KernelQMatrix<K> {
    fn row(&mut self, i: usize, len: usize) -> &[f64] {
        let Self {
            kernel,
            features,
            signs,
            cache,
            ..
        } = self;
        let (x_i, y_i) = (&features[i], signs[i]);
        cache.get_or_fill(i, len, |j| y_i * signs[j] * kernel.compute(x_i, &features[j]))
    }

    fn diagonal(&self) -> &[f64] {
        &self.diagonal
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.cache.swap_index(i, j);
        self.features.swap(i, j);
        self.signs.swap(i, j);
        self.diagonal.swap(i, j);
    }
}

/// Dense, caller-supplied Q matrix
#[derive(Debug, Clone)]
pub struct PrecomputedQMatrix {
    l: usize,
    /// Row-major values in the original order
    values: Vec<f64>,
    /// Original index at each working position
    order: Vec<usize>,
    diagonal: Vec<f64>,
    buffer: Vec<f64>,
}

impl PrecomputedQMatrix {
    /// Wrap a square matrix given as rows
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self> {
        let l = rows.len();
        if l == 0 {
            return Err(SolverError::EmptyProblem);
        }
        let mut values = Vec::with_capacity(l * l);
        for row in rows {
            if row.len() != l {
                return Err(SolverError::DimensionMismatch {
                    what: "precomputed matrix row",
                    expected: l,
                    actual: row.len(),
                });
            }
            values.extend(row);
        }
        let diagonal = (0..l).map(|i| values[i * l + i]).collect();

        Ok(Self {
            l,
            values,
            order: (0..l).collect(),
            diagonal,
            buffer: Vec::with_capacity(l),
        })
    }

    /// Build `Q[i][j] = y_i y_j G[i][j]` from a Gram matrix and labels
    pub fn from_gram(gram: Vec<Vec<f64>>, labels: &[f64]) -> Result<Self> {
        if gram.len() != labels.len() {
            return Err(SolverError::DimensionMismatch {
                what: "labels",
                expected: gram.len(),
                actual: labels.len(),
            });
        }
        let rows = gram
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                row.into_iter()
                    .zip(labels)
                    .map(|(g, &y_j)| labels[i] * y_j * g)
                    .collect()
            })
            .collect();
        Self::new(rows)
    }

    /// Number of examples
    pub fn len(&self) -> usize {
        self.l
    }

    pub fn is_empty(&self) -> bool {
        self.l == 0
    }
}

impl QMatrix for PrecomputedQMatrix {
    fn row(&mut self, i: usize, len: usize) -> &[f64] {
        let base = self.order[i] * self.l;
        self.buffer.clear();
        self.buffer
            .extend(self.order[..len].iter().map(|&j| self.values[base + j]));
        &self.buffer
    }

    fn diagonal(&self) -> &[f64] {
        &self.diagonal
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.order.swap(i, j);
        self.diagonal.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::LinearKernel;

    fn samples() -> Vec<Sample> {
        vec![
            Sample::new(SparseVector::from_dense(&[1.0, 0.0]), 1.0),
            Sample::new(SparseVector::from_dense(&[0.0, 2.0]), -1.0),
            Sample::new(SparseVector::from_dense(&[1.0, 1.0]), -1.0),
        ]
    }

    #[test]
    fn test_kernel_q_matrix_rows() {
        let mut q = KernelQMatrix::new(LinearKernel::new(), &samples(), 1 << 20)
            .expect("Should build matrix");

        assert_eq!(q.len(), 3);
        assert_eq!(q.diagonal(), &[1.0, 4.0, 2.0]);
        // Q[0][j] = y_0 y_j <x_0, x_j>
        assert_eq!(q.row(0, 3), &[1.0, 0.0, -1.0]);
        assert_eq!(q.row(1, 3), &[0.0, 4.0, 2.0]);
    }

    #[test]
    fn test_kernel_q_matrix_swap() {
        let mut q = KernelQMatrix::new(LinearKernel::new(), &samples(), 1 << 20)
            .expect("Should build matrix");
        q.row(0, 3);
        q.row(2, 3);

        q.swap(0, 2);

        assert_eq!(q.diagonal(), &[2.0, 4.0, 1.0]);
        assert_eq!(q.row(0, 3), &[2.0, 2.0, -1.0]);
        assert_eq!(q.row(2, 3), &[-1.0, 0.0, 1.0]);
        assert_eq!(q.row(1, 3), &[2.0, 4.0, 0.0]);
    }

    #[test]
    fn test_kernel_q_matrix_rejects_bad_label() {
        let bad = vec![Sample::new(SparseVector::from_dense(&[1.0]), 2.0)];
        assert!(matches!(
            KernelQMatrix::new(LinearKernel::new(), &bad, 1024),
            Err(SolverError::InvalidLabel(l)) if l == 2.0
        ));
    }

    #[test]
    fn test_precomputed_q_matrix() {
        let mut q = PrecomputedQMatrix::from_gram(
            vec![vec![1.0, 0.5], vec![0.5, 2.0]],
            &[1.0, -1.0],
        )
        .expect("Should build matrix");

        assert_eq!(q.diagonal(), &[1.0, 2.0]);
        assert_eq!(q.row(0, 2), &[1.0, -0.5]);

        q.swap(0, 1);
        assert_eq!(q.diagonal(), &[2.0, 1.0]);
        assert_eq!(q.row(0, 2), &[2.0, -0.5]);
        assert_eq!(q.row(1, 1), &[-0.5]);
    }

    #[test]
    fn test_precomputed_q_matrix_not_square() {
        assert!(matches!(
            PrecomputedQMatrix::new(vec![vec![1.0, 0.0], vec![0.0]]),
            Err(SolverError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            PrecomputedQMatrix::new(Vec::new()),
            Err(SolverError::EmptyProblem)
        ));
    }
}
