//! Core type definitions for the SMO solver

use crate::core::{Result, SolverError};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Sparse vector representation with sorted indices
#[derive(Clone, Debug, PartialEq)]
pub struct SparseVector {
    /// Sorted indices of non-zero elements
    pub indices: Vec<usize>,
    /// Values corresponding to indices
    pub values: Vec<f64>,
}

impl SparseVector {
    /// Create a new sparse vector, ensuring indices are sorted
    pub fn new(indices: Vec<usize>, values: Vec<f64>) -> Self {
        assert_eq!(
            indices.len(),
            values.len(),
            "Indices and values must have same length"
        );

        let mut pairs: Vec<_> = indices.into_iter().zip(values).collect();
        pairs.sort_by_key(|&(idx, _)| idx);

        let (indices, values): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        Self { indices, values }
    }

    /// Create a dense-style vector from consecutive values
    pub fn from_dense(values: &[f64]) -> Self {
        Self {
            indices: (0..values.len()).collect(),
            values: values.to_vec(),
        }
    }

    /// Create an empty sparse vector
    pub fn empty() -> Self {
        Self {
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Get the value at a specific index (0 if not present)
    pub fn get(&self, index: usize) -> f64 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Compute squared L2 norm
    pub fn norm_squared(&self) -> f64 {
        self.values.iter().map(|&v| v * v).sum()
    }

    /// Check if vector is empty
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Training sample with features and label
#[derive(Clone, Debug)]
pub struct Sample {
    /// Feature vector (sparse representation)
    pub features: SparseVector,
    /// Class label (+1 or -1)
    pub label: f64,
}

impl Sample {
    /// Create a new sample
    pub fn new(features: SparseVector, label: f64) -> Self {
        Self { features, label }
    }
}

/// Position of a multiplier relative to its box `[0, C]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlphaStatus {
    LowerBound,
    UpperBound,
    Free,
}

impl AlphaStatus {
    /// Bucket `alpha` against the box `[0, c]`
    #[inline]
    pub fn classify(alpha: f64, c: f64) -> Self {
        if alpha >= c {
            AlphaStatus::UpperBound
        } else if alpha <= 0.0 {
            AlphaStatus::LowerBound
        } else {
            AlphaStatus::Free
        }
    }
}

/// Result of a solver run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionInfo {
    /// Dual objective value `1/2 a^T Q a + p^T a` at the solution
    pub obj: f64,
    /// Bias term, the decision function is `sum_i y_i a_i K(x_i, x) - rho`
    pub rho: f64,
    /// Box bound used for positive examples
    pub upper_bound_p: f64,
    /// Box bound used for negative examples
    pub upper_bound_n: f64,
    /// Free-variable average of `y_i G_i`; equals `rho` for this solver
    pub r: f64,
    /// Number of pairwise updates performed
    pub iterations: usize,
}

/// Configuration for the solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Upper bound for multipliers of positive examples
    pub cp: f64,
    /// Upper bound for multipliers of negative examples
    pub cn: f64,
    /// Tolerance on the maximal KKT violation
    pub epsilon: f64,
    /// Enable shrinking heuristic
    pub shrinking: bool,
    /// Maximum number of pairwise updates, 0 means unbounded
    pub max_iterations: usize,
    /// Kernel row cache size in bytes
    pub cache_size: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            cp: 1.0,
            cn: 1.0,
            epsilon: 0.001,
            shrinking: true,
            max_iterations: 0,
            cache_size: 100_000_000, // 100MB
        }
    }
}

impl SolverConfig {
    /// Set both box bounds to `c`
    pub fn with_c(mut self, c: f64) -> Self {
        self.cp = c;
        self.cn = c;
        self
    }

    /// Set per-class box bounds
    pub fn with_class_bounds(mut self, cp: f64, cn: f64) -> Self {
        self.cp = cp;
        self.cn = cn;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_shrinking(mut self, shrinking: bool) -> Self {
        self.shrinking = shrinking;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.cache_size = cache_size;
        self
    }

    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that bounds and tolerance are positive and finite
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("cp", self.cp), ("cn", self.cn), ("epsilon", self.epsilon)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SolverError::InvalidParameter(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        Ok(())
    }
}
