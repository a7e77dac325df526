//! SMO solver for the SVM dual problem
//!
//! [`Solver`] implements second-order working set selection, the analytic
//! two-variable update, and the shrinking heuristic with gradient
//! reconstruction.

pub mod shrinking;
pub mod smo;

pub use self::smo::*;
