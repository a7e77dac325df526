//! Gaussian kernel: K(x, y) = exp(-gamma * ||x - y||^2)

use crate::core::SparseVector;
use crate::kernel::linear::dot_product_sparse;
use crate::kernel::Kernel;

#[derive(Debug, Clone, Copy)]
pub struct RBFKernel {
    gamma: f64,
}

impl RBFKernel {
    /// # Panics
    /// Panics unless `gamma > 0`
    pub fn new(gamma: f64) -> Self {
        assert!(gamma > 0.0, "Gamma must be positive, got: {}", gamma);
        Self { gamma }
    }

    /// `gamma = 1 / n_features`, the usual LIBSVM default
    pub fn with_auto_gamma(n_features: usize) -> Self {
        Self::new(1.0 / n_features.max(1) as f64)
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

impl Default for RBFKernel {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Kernel for RBFKernel {
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        (-self.gamma * squared_distance_sparse(x, y)).exp()
    }

    fn name(&self) -> &'static str {
        "rbf"
    }
}

/// `||x - y||^2` expanded as `|x|^2 + |y|^2 - 2 <x, y>`, clamped at zero
fn squared_distance_sparse(x: &SparseVector, y: &SparseVector) -> f64 {
    let d = x.norm_squared() + y.norm_squared() - 2.0 * dot_product_sparse(x, y);
    d.max(0.0)
}
