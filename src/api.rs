//! High-level entry points for C-SVC problems
//!
//! Builds the classification dual (`p = -1`, zero initial alpha) for a set of
//! labeled samples and a kernel, and runs [`Solver`] on it.
//!
//! ```rust,no_run
//! use rsmo::api;
//! use rsmo::{LibSVMDataset, RBFKernel, SolverConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dataset = LibSVMDataset::from_file("train.libsvm")?;
//! let config = SolverConfig::default().with_c(10.0);
//! let solution = api::solve_dataset(RBFKernel::new(0.5), &dataset, &config)?;
//! println!("rho = {}, #SV = {}", solution.info.rho, solution.support_vectors().len());
//! # Ok(())
//! # }
//! ```

use crate::core::{Dataset, Result, Sample, SolutionInfo, SolverConfig};
use crate::kernel::Kernel;
use crate::qmatrix::KernelQMatrix;
use crate::solver::Solver;
use log::debug;
use serde::Serialize;

/// Dual solution of a C-SVC problem
#[derive(Debug, Clone, Serialize)]
pub struct Solution {
    pub info: SolutionInfo,
    /// Multipliers in sample order
    pub alpha: Vec<f64>,
    #[serde(skip)]
    labels: Vec<f64>,
}

impl Solution {
    /// Indices of samples with `alpha > 0`
    pub fn support_vectors(&self) -> Vec<usize> {
        self.alpha
            .iter()
            .enumerate()
            .filter(|(_, &a)| a > 0.0)
            .map(|(i, _)| i)
            .collect()
    }

    /// Number of multipliers at their class bound
    pub fn n_bounded_support_vectors(&self) -> usize {
        self.alpha
            .iter()
            .zip(&self.labels)
            .filter(|(&a, &y)| {
                let c = if y > 0.0 {
                    self.info.upper_bound_p
                } else {
                    self.info.upper_bound_n
                };
                a >= c
            })
            .count()
    }

    /// Signed coefficients `y_i * alpha_i` of the decision function
    pub fn coefficients(&self) -> Vec<f64> {
        self.alpha
            .iter()
            .zip(&self.labels)
            .map(|(a, y)| a * y)
            .collect()
    }
}

/// Solve the C-SVC dual for `samples`
pub fn solve_samples<K: Kernel>(
    kernel: K,
    samples: &[Sample],
    config: &SolverConfig,
) -> Result<Solution> {
    config.validate()?;
    let l = samples.len();
    let labels: Vec<f64> = samples.iter().map(|s| s.label).collect();
    let mut q = KernelQMatrix::new(kernel, samples, config.cache_size)?;

    debug!(
        "solving C-SVC dual: {} samples, kernel = {}, Cp = {}, Cn = {}",
        l,
        q.kernel().name(),
        config.cp,
        config.cn
    );

    let mut alpha = vec![0.0; l];
    let info = Solver::solve(l, &mut q, &vec![-1.0; l], &labels, &mut alpha, config)?;

    let stats = q.cache_stats();
    debug!(
        "row cache: {} hits, {} misses ({:.1}%), {}/{} rows",
        stats.hits,
        stats.misses,
        100.0 * stats.hit_rate(),
        stats.size,
        stats.capacity
    );

    Ok(Solution {
        info,
        alpha,
        labels,
    })
}

/// Solve the C-SVC dual for every sample of `dataset`
pub fn solve_dataset<K: Kernel, D: Dataset>(
    kernel: K,
    dataset: &D,
    config: &SolverConfig,
) -> Result<Solution> {
    let samples: Vec<Sample> = (0..dataset.len()).map(|i| dataset.get_sample(i)).collect();
    solve_samples(kernel, &samples, config)
}
