//! Polynomial kernel: K(x, y) = (gamma * <x, y> + coef0)^degree

use crate::core::SparseVector;
use crate::kernel::linear::dot_product_sparse;
use crate::kernel::Kernel;

#[derive(Debug, Clone)]
pub struct PolynomialKernel {
    pub gamma: f64,
    pub coef0: f64,
    pub degree: u32,
}

impl PolynomialKernel {
    /// # Panics
    /// Panics if `degree` is zero or `gamma` is not positive
    pub fn new(degree: u32, gamma: f64, coef0: f64) -> Self {
        assert!(degree > 0, "Polynomial degree must be positive");
        assert!(gamma > 0.0, "Gamma must be positive, got: {}", gamma);
        Self {
            gamma,
            coef0,
            degree,
        }
    }

    /// `(gamma * <x, y> + 1)^2`
    pub fn quadratic(gamma: f64) -> Self {
        Self::new(2, gamma, 1.0)
    }
}

impl Kernel for PolynomialKernel {
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        (self.gamma * dot_product_sparse(x, y) + self.coef0).powi(self.degree as i32)
    }

    fn name(&self) -> &'static str {
        "polynomial"
    }
}
