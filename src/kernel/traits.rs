//! Kernel trait definition

use crate::core::SparseVector;

/// Kernel function trait
///
/// A kernel function K(x, y) must satisfy Mercer's condition for the dual
/// matrix built from it to be positive semi-definite. The solver itself
/// tolerates indefinite matrices through its curvature clamp.
pub trait Kernel: Send + Sync {
    /// Compute kernel value K(x, y)
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64;

    /// Short identifier used in logs and reports
    fn name(&self) -> &'static str;
}
