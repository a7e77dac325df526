//! Sequential Minimal Optimization (SMO) solver
//!
//! Solves the SVM dual problem
//!
//! ```text
//! min_a  1/2 a^T Q a + p^T a
//! s.t.   y^T a = const,  0 <= a_i <= C_i
//! ```
//!
//! by repeatedly optimizing a pair of multipliers. The pair is chosen with
//! second-order working set selection (Fan, Chen and Lin, "Working Set
//! Selection Using Second Order Information for Training SVM", JMLR 2005).

use crate::core::{AlphaStatus, QMatrix, Result, SolutionInfo, SolverConfig, SolverError};
use log::{debug, info, warn};

/// Curvature used in place of a non-positive `quad_coef`
pub const TAU: f64 = 1e-12;

pub(super) const INF: f64 = f64::INFINITY;

/// SMO solver state for one run
///
/// All per-example arrays are indexed by working position. Shrinking and
/// index swaps reorder them in place; `active_set` remembers the original
/// index stored at each position.
pub struct Solver<'a, Q: QMatrix + ?Sized> {
    pub(super) q: &'a mut Q,
    pub(super) l: usize,
    pub(super) active_size: usize,
    pub(super) y: Vec<i8>,
    pub(super) g: Vec<f64>,
    pub(super) g_bar: Vec<f64>,
    pub(super) alpha: Vec<f64>,
    pub(super) alpha_status: Vec<AlphaStatus>,
    pub(super) p: Vec<f64>,
    pub(super) qd: Vec<f64>,
    pub(super) active_set: Vec<usize>,
    pub(super) cp: f64,
    pub(super) cn: f64,
    pub(super) eps: f64,
    pub(super) unshrink: bool,
    row_i: Vec<f64>,
    row_j: Vec<f64>,
}

impl<'a, Q: QMatrix + ?Sized> Solver<'a, Q> {
    /// Solve the dual problem of size `l`
    ///
    /// `p`, `y` and the initial `alpha` are copied; on success `alpha` is
    /// overwritten with the solution in the original index order. `q` is
    /// returned to its original index order as well.
    pub fn solve(
        l: usize,
        q: &'a mut Q,
        p: &[f64],
        y: &[f64],
        alpha: &mut [f64],
        config: &SolverConfig,
    ) -> Result<SolutionInfo> {
        let mut solver = Self::new(l, q, p, y, alpha, config)?;
        let iterations = solver.optimize(config.shrinking, config.max_iterations);
        Ok(solver.finish(alpha, iterations))
    }

    /// Validate the inputs and compute the initial gradient
    pub(super) fn new(
        l: usize,
        q: &'a mut Q,
        p: &[f64],
        y: &[f64],
        alpha: &[f64],
        config: &SolverConfig,
    ) -> Result<Self> {
        config.validate()?;
        if l == 0 {
            return Err(SolverError::EmptyProblem);
        }
        check_len("linear term", l, p.len())?;
        check_len("labels", l, y.len())?;
        check_len("alpha", l, alpha.len())?;
        check_len("kernel diagonal", l, q.diagonal().len())?;

        let y = y
            .iter()
            .map(|&label| match label {
                v if v == 1.0 => Ok(1),
                v if v == -1.0 => Ok(-1),
                v => Err(SolverError::InvalidLabel(v)),
            })
            .collect::<Result<Vec<i8>>>()?;

        let qd = q.diagonal().to_vec();
        let mut solver = Self {
            q,
            l,
            active_size: l,
            y,
            g: p.to_vec(),
            g_bar: vec![0.0; l],
            alpha: alpha.to_vec(),
            alpha_status: Vec::with_capacity(l),
            p: p.to_vec(),
            qd,
            active_set: (0..l).collect(),
            cp: config.cp,
            cn: config.cn,
            eps: config.epsilon,
            unshrink: false,
            row_i: Vec::with_capacity(l),
            row_j: Vec::with_capacity(l),
        };

        for i in 0..l {
            let c = solver.c(i);
            let a = solver.alpha[i];
            if !(0.0..=c).contains(&a) {
                return Err(SolverError::InvalidParameter(format!(
                    "initial alpha[{i}] = {a} is outside [0, {c}]"
                )));
            }
            solver.alpha_status.push(AlphaStatus::classify(a, c));
        }

        for i in 0..l {
            if solver.is_lower_bound(i) {
                continue;
            }
            let alpha_i = solver.alpha[i];
            let c_i = solver.c(i);
            let upper = solver.is_upper_bound(i);
            let q_i = solver.q.row(i, l);
            for (g, &q_ij) in solver.g.iter_mut().zip(q_i) {
                *g += alpha_i * q_ij;
            }
            if upper {
                for (g_bar, &q_ij) in solver.g_bar.iter_mut().zip(q_i) {
                    *g_bar += c_i * q_ij;
                }
            }
        }

        Ok(solver)
    }

    /// Run the main loop; returns the number of pairwise updates
    pub(super) fn optimize(&mut self, shrinking: bool, max_iterations: usize) -> usize {
        let l = self.l;
        let mut counter = l.min(1000) + 1;
        let mut iter = 0;

        while max_iterations == 0 || iter < max_iterations {
            counter -= 1;
            if counter == 0 {
                counter = l.min(1000);
                if shrinking {
                    self.do_shrinking();
                }
            }

            let (i, j) = match self.select_working_set() {
                Some(pair) => pair,
                None if self.active_size == l => break,
                None => {
                    // Optimal on the shrunk problem; check the full one
                    self.reconstruct_gradient();
                    self.active_size = l;
                    debug!("iteration {iter}: unshrinking all {l} examples");
                    match self.select_working_set() {
                        Some(pair) => {
                            counter = 1;
                            pair
                        }
                        None => break,
                    }
                }
            };

            iter += 1;
            self.update_pair(i, j);
        }

        if max_iterations > 0 && iter >= max_iterations {
            if self.active_size < l {
                self.reconstruct_gradient();
                self.active_size = l;
            }
            warn!("reached maximum number of iterations ({max_iterations})");
        }

        iter
    }

    /// Box bound of position `i`
    #[inline]
    pub(super) fn c(&self, i: usize) -> f64 {
        if self.y[i] > 0 {
            self.cp
        } else {
            self.cn
        }
    }

    #[inline]
    fn update_alpha_status(&mut self, i: usize) {
        self.alpha_status[i] = AlphaStatus::classify(self.alpha[i], self.c(i));
    }

    #[inline]
    pub(super) fn is_upper_bound(&self, i: usize) -> bool {
        self.alpha_status[i] == AlphaStatus::UpperBound
    }

    #[inline]
    pub(super) fn is_lower_bound(&self, i: usize) -> bool {
        self.alpha_status[i] == AlphaStatus::LowerBound
    }

    #[inline]
    pub(super) fn is_free(&self, i: usize) -> bool {
        self.alpha_status[i] == AlphaStatus::Free
    }

    /// Exchange working positions `i` and `j` in every array and in `Q`
    pub(super) fn swap_index(&mut self, i: usize, j: usize) {
        self.q.swap(i, j);
        self.y.swap(i, j);
        self.g.swap(i, j);
        self.alpha_status.swap(i, j);
        self.alpha.swap(i, j);
        self.p.swap(i, j);
        self.active_set.swap(i, j);
        self.g_bar.swap(i, j);
        self.qd.swap(i, j);
    }

    /// Second-order working set selection
    ///
    /// Returns `None` when the maximal violation `Gmax + Gmax2` is below
    /// `eps` on the active set.
    pub(super) fn select_working_set(&mut self) -> Option<(usize, usize)> {
        let n = self.active_size;
        let mut gmax = -INF;
        let mut gmax2 = -INF;
        let mut gmax_idx = None;
        let mut gmin_idx = None;
        let mut obj_diff_min = INF;

        for t in 0..n {
            if self.y[t] == 1 {
                if !self.is_upper_bound(t) && -self.g[t] >= gmax {
                    gmax = -self.g[t];
                    gmax_idx = Some(t);
                }
            } else if !self.is_lower_bound(t) && self.g[t] >= gmax {
                gmax = self.g[t];
                gmax_idx = Some(t);
            }
        }

        let i = gmax_idx?;
        load_row(&mut *self.q, i, n, &mut self.row_i);
        let y_i = f64::from(self.y[i]);

        for j in 0..n {
            let (grad_diff, quad_coef) = if self.y[j] == 1 {
                if self.is_lower_bound(j) {
                    continue;
                }
                gmax2 = gmax2.max(self.g[j]);
                (
                    gmax + self.g[j],
                    self.qd[i] + self.qd[j] - 2.0 * y_i * self.row_i[j],
                )
            } else {
                if self.is_upper_bound(j) {
                    continue;
                }
                gmax2 = gmax2.max(-self.g[j]);
                (
                    gmax - self.g[j],
                    self.qd[i] + self.qd[j] + 2.0 * y_i * self.row_i[j],
                )
            };

            if grad_diff > 0.0 {
                let obj_diff = -(grad_diff * grad_diff) / positive_or_tau(quad_coef);
                if obj_diff <= obj_diff_min {
                    gmin_idx = Some(j);
                    obj_diff_min = obj_diff;
                }
            }
        }

        if gmax + gmax2 < self.eps {
            return None;
        }
        gmin_idx.map(|j| (i, j))
    }

    /// Solve the two-variable subproblem for `(i, j)` and update the
    /// gradient, statuses and `G_bar`
    pub(super) fn update_pair(&mut self, i: usize, j: usize) {
        let n = self.active_size;
        load_row(&mut *self.q, i, n, &mut self.row_i);
        load_row(&mut *self.q, j, n, &mut self.row_j);

        let c_i = self.c(i);
        let c_j = self.c(j);
        let old_alpha_i = self.alpha[i];
        let old_alpha_j = self.alpha[j];

        let same_label = self.y[i] == self.y[j];
        let quad_coef = if same_label {
            self.qd[i] + self.qd[j] - 2.0 * self.row_i[j]
        } else {
            self.qd[i] + self.qd[j] + 2.0 * self.row_i[j]
        };
        let (alpha_i, alpha_j) = two_variable_step(
            same_label,
            (old_alpha_i, old_alpha_j),
            (self.g[i], self.g[j]),
            positive_or_tau(quad_coef),
            (c_i, c_j),
        );
        self.alpha[i] = alpha_i;
        self.alpha[j] = alpha_j;

        let delta_alpha_i = alpha_i - old_alpha_i;
        let delta_alpha_j = alpha_j - old_alpha_j;
        for ((g, &q_ik), &q_jk) in self.g[..n]
            .iter_mut()
            .zip(&self.row_i)
            .zip(&self.row_j)
        {
            *g += q_ik * delta_alpha_i + q_jk * delta_alpha_j;
        }

        let was_upper_i = self.is_upper_bound(i);
        let was_upper_j = self.is_upper_bound(j);
        self.update_alpha_status(i);
        self.update_alpha_status(j);

        if was_upper_i != self.is_upper_bound(i) {
            self.update_g_bar(i, if was_upper_i { -c_i } else { c_i });
        }
        if was_upper_j != self.is_upper_bound(j) {
            self.update_g_bar(j, if was_upper_j { -c_j } else { c_j });
        }
    }

    /// `G_bar += scale * Q_i` over the full index range
    fn update_g_bar(&mut self, i: usize, scale: f64) {
        let q_i = self.q.row(i, self.l);
        for (g_bar, &q_ik) in self.g_bar.iter_mut().zip(q_i) {
            *g_bar += scale * q_ik;
        }
    }

    /// Bias term from the KKT conditions
    pub(super) fn calculate_rho(&self) -> f64 {
        let mut nr_free = 0;
        let mut ub = INF;
        let mut lb = -INF;
        let mut sum_free = 0.0;

        for i in 0..self.active_size {
            let yg = f64::from(self.y[i]) * self.g[i];

            match (self.alpha_status[i], self.y[i] > 0) {
                (AlphaStatus::UpperBound, false) | (AlphaStatus::LowerBound, true) => {
                    ub = ub.min(yg);
                }
                (AlphaStatus::UpperBound, true) | (AlphaStatus::LowerBound, false) => {
                    lb = lb.max(yg);
                }
                (AlphaStatus::Free, _) => {
                    nr_free += 1;
                    sum_free += yg;
                }
            }
        }

        if nr_free > 0 {
            sum_free / nr_free as f64
        } else {
            (ub + lb) / 2.0
        }
    }

    /// Dual objective `1/2 a^T Q a + p^T a`, exact when `G` is exact
    pub(super) fn objective(&self) -> f64 {
        let v: f64 = self
            .alpha
            .iter()
            .zip(&self.g)
            .zip(&self.p)
            .map(|((&a, &g), &p)| a * (g + p))
            .sum();
        v / 2.0
    }

    /// Put `Q` and the working arrays back into the original index order
    fn restore_order(&mut self) {
        for pos in 0..self.l {
            while self.active_set[pos] != pos {
                let target = self.active_set[pos];
                self.swap_index(pos, target);
            }
        }
    }

    /// Compute rho and the objective, write the solution back
    pub(super) fn finish(mut self, alpha_out: &mut [f64], iterations: usize) -> SolutionInfo {
        let rho = self.calculate_rho();
        let obj = self.objective();

        self.restore_order();
        alpha_out.copy_from_slice(&self.alpha);

        info!("optimization finished, #iter = {iterations}, obj = {obj:.6}, rho = {rho:.6}");
        debug!(
            "#SV = {}, #BSV = {}",
            self.alpha.iter().filter(|&&a| a > 0.0).count(),
            self.alpha_status
                .iter()
                .filter(|&&s| s == AlphaStatus::UpperBound)
                .count()
        );

        SolutionInfo {
            obj,
            rho,
            upper_bound_p: self.cp,
            upper_bound_n: self.cn,
            r: rho,
            iterations,
        }
    }
}

/// Exact minimizer of the two-variable subproblem along the feasible line
///
/// Opposite labels move along `(1, 1)` keeping `alpha_i - alpha_j` fixed;
/// equal labels move along `(1, -1)` keeping `alpha_i + alpha_j` fixed. The
/// unconstrained step is then clipped back into both boxes; the branch order
/// decides which corner is taken.
pub(super) fn two_variable_step(
    same_label: bool,
    (alpha_i, alpha_j): (f64, f64),
    (g_i, g_j): (f64, f64),
    quad_coef: f64,
    (c_i, c_j): (f64, f64),
) -> (f64, f64) {
    if !same_label {
        let delta = (-g_i - g_j) / quad_coef;
        let diff = alpha_i - alpha_j;
        let mut ai = alpha_i + delta;
        let mut aj = alpha_j + delta;

        if diff > 0.0 {
            if aj < 0.0 {
                aj = 0.0;
                ai = diff;
            }
        } else if ai < 0.0 {
            ai = 0.0;
            aj = -diff;
        }
        if diff > c_i - c_j {
            if ai > c_i {
                ai = c_i;
                aj = c_i - diff;
            }
        } else if aj > c_j {
            aj = c_j;
            ai = c_j + diff;
        }
        (ai, aj)
    } else {
        let delta = (g_i - g_j) / quad_coef;
        let sum = alpha_i + alpha_j;
        let mut ai = alpha_i - delta;
        let mut aj = alpha_j + delta;

        if sum > c_i {
            if ai > c_i {
                ai = c_i;
                aj = sum - c_i;
            }
        } else if aj < 0.0 {
            aj = 0.0;
            ai = sum;
        }
        if sum > c_j {
            if aj > c_j {
                aj = c_j;
                ai = sum - c_j;
            }
        } else if ai < 0.0 {
            ai = 0.0;
            aj = sum;
        }
        (ai, aj)
    }
}

#[inline]
fn positive_or_tau(quad_coef: f64) -> f64 {
    if quad_coef > 0.0 {
        quad_coef
    } else {
        TAU
    }
}

fn load_row<Q: QMatrix + ?Sized>(q: &mut Q, i: usize, len: usize, buf: &mut Vec<f64>) {
    buf.clear();
    buf.extend_from_slice(q.row(i, len));
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(SolverError::DimensionMismatch {
            what,
            expected,
            actual,
        })
    }
}
