//! Shrinking heuristic and gradient reconstruction
//!
//! Bounded variables that are unlikely to move are moved to the tail of the
//! working arrays and excluded from selection and gradient updates. The
//! gradient of the excluded tail is rebuilt from `G_bar` before the final
//! optimality check.

use super::smo::{Solver, INF};
use crate::core::{AlphaStatus, QMatrix};
use log::debug;

impl<'a, Q: QMatrix + ?Sized> Solver<'a, Q> {
    /// Move variables that satisfy [`Self::be_shrunk`] out of the active set
    ///
    /// The first time the maximal violation drops to `10 * eps` the full
    /// gradient is reconstructed and every variable is reconsidered.
    pub(super) fn do_shrinking(&mut self) {
        let mut gmax1 = -INF; // max { -y_i G_i | i in I_up }
        let mut gmax2 = -INF; // max { y_i G_i | i in I_low }

        for i in 0..self.active_size {
            let g = self.g[i];
            if self.y[i] == 1 {
                if !self.is_upper_bound(i) {
                    gmax1 = gmax1.max(-g);
                }
                if !self.is_lower_bound(i) {
                    gmax2 = gmax2.max(g);
                }
            } else {
                if !self.is_upper_bound(i) {
                    gmax2 = gmax2.max(-g);
                }
                if !self.is_lower_bound(i) {
                    gmax1 = gmax1.max(g);
                }
            }
        }

        if !self.unshrink && gmax1 + gmax2 <= self.eps * 10.0 {
            self.unshrink = true;
            self.reconstruct_gradient();
            self.active_size = self.l;
            debug!("close to optimum, reconsidering all {} examples", self.l);
        }

        let before = self.active_size;
        let mut i = 0;
        while i < self.active_size {
            if self.be_shrunk(i, gmax1, gmax2) {
                self.active_size -= 1;
                while self.active_size > i {
                    if !self.be_shrunk(self.active_size, gmax1, gmax2) {
                        self.swap_index(i, self.active_size);
                        break;
                    }
                    self.active_size -= 1;
                }
            }
            i += 1;
        }

        if self.active_size < before {
            debug!(
                "shrinking: active set {} -> {} of {}",
                before, self.active_size, self.l
            );
        }
    }

    /// Whether bounded variable `i` cannot improve the current violation
    pub(super) fn be_shrunk(&self, i: usize, gmax1: f64, gmax2: f64) -> bool {
        let g = self.g[i];
        match self.alpha_status[i] {
            AlphaStatus::UpperBound if self.y[i] == 1 => -g > gmax1,
            AlphaStatus::UpperBound => -g > gmax2,
            AlphaStatus::LowerBound if self.y[i] == 1 => g > gmax2,
            AlphaStatus::LowerBound => g > gmax1,
            AlphaStatus::Free => false,
        }
    }

    /// Rebuild `G` for the inactive positions `[active_size, l)`
    ///
    /// Uses `G_j = G_bar_j + p_j + sum_{i free} alpha_i Q_ij`, traversing
    /// whichever set of rows touches fewer kernel entries.
    pub(super) fn reconstruct_gradient(&mut self) {
        let (n, l) = (self.active_size, self.l);
        if n == l {
            return;
        }

        for j in n..l {
            self.g[j] = self.g_bar[j] + self.p[j];
        }

        let nr_free = (0..n).filter(|&j| self.is_free(j)).count();
        if 2 * nr_free < n {
            debug!("only {nr_free} of {n} active variables are free, shrinking may not pay off");
        }

        if nr_free * l > 2 * n * (l - n) {
            self.reconstruct_from_inactive_rows();
        } else {
            self.reconstruct_from_free_rows();
        }
        debug!("reconstructed gradient for {} inactive examples", l - n);
    }

    /// For each inactive `i`, read `Q_i` over the active prefix
    pub(super) fn reconstruct_from_inactive_rows(&mut self) {
        let (n, l) = (self.active_size, self.l);
        for i in n..l {
            let q_i = self.q.row(i, n);
            let mut sum = 0.0;
            for (j, &q_ij) in q_i.iter().enumerate() {
                if self.alpha_status[j] == AlphaStatus::Free {
                    sum += self.alpha[j] * q_ij;
                }
            }
            self.g[i] += sum;
        }
    }

    /// For each free active `i`, read the full row `Q_i`
    pub(super) fn reconstruct_from_free_rows(&mut self) {
        let (n, l) = (self.active_size, self.l);
        for i in 0..n {
            if self.alpha_status[i] != AlphaStatus::Free {
                continue;
            }
            let alpha_i = self.alpha[i];
            let q_i = self.q.row(i, l);
            for (g, &q_ij) in self.g[n..].iter_mut().zip(&q_i[n..]) {
                *g += alpha_i * q_ij;
            }
        }
    }
}
