//! SMO solver for the dual problem of support vector machines
//!
//! Implements Sequential Minimal Optimization with second-order working set
//! selection and shrinking, as used by LIBSVM for C-SVC training.

pub mod api;
pub mod cache;
pub mod core;
pub mod data;
pub mod kernel;
pub mod qmatrix;
pub mod solver;

// Re-export main types for convenience
pub use crate::api::Solution;
pub use crate::cache::{CacheStats, RowCache};
pub use crate::core::error::{Result, SolverError};
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::data::LibSVMDataset;
pub use crate::kernel::{Kernel, LinearKernel, PolynomialKernel, RBFKernel};
pub use crate::qmatrix::{KernelQMatrix, PrecomputedQMatrix};
pub use crate::solver::Solver;
