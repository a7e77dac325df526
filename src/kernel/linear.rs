//! Linear kernel: K(x, y) = <x, y>

use crate::core::SparseVector;
use crate::kernel::Kernel;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, Default)]
pub struct LinearKernel;

impl LinearKernel {
    pub fn new() -> Self {
        Self
    }
}

impl Kernel for LinearKernel {
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        dot_product_sparse(x, y)
    }

    fn name(&self) -> &'static str {
        "linear"
    }
}

/// Inner product of two sparse vectors with sorted indices
pub(crate) fn dot_product_sparse(x: &SparseVector, y: &SparseVector) -> f64 {
    let mut xs = x.indices.iter().zip(&x.values).peekable();
    let mut ys = y.indices.iter().zip(&y.values).peekable();
    let mut sum = 0.0;

    while let (Some(&(xi, xv)), Some(&(yi, yv))) = (xs.peek(), ys.peek()) {
        match xi.cmp(yi) {
            Ordering::Less => {
                xs.next();
            }
            Ordering::Greater => {
                ys.next();
            }
            Ordering::Equal => {
                sum += xv * yv;
                xs.next();
                ys.next();
            }
        }
    }

    sum
}
