use log::{debug, warn};
use nalgebra::{Vector3, Vector6};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Second-order ODE kernels: y'' = f(t, y)
// ---------------------------------------------------------------------------

/// Right-hand side of y'' = f(t, y).
pub type Acceleration<'a> = dyn FnMut(f64, &Vector3<f64>) -> Vector3<f64> + 'a;

/// A kernel that advances position and velocity jointly from an
/// acceleration-only right-hand side.
pub trait SecondOrderSolver {
    /// Advance `(y, dy)` from `t` to `t + dt` in place.
    fn advance(
        &mut self,
        t: f64,
        y: &mut Vector3<f64>,
        dy: &mut Vector3<f64>,
        dt: f64,
        accel: &mut Acceleration<'_>,
    );

    /// Highest order of accuracy the kernel can reach.
    fn order(&self) -> usize;
}

/// Tolerances and step bounds of [`StormerExtrapolation`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub abs_tolerance: f64, // m and m/s
    pub rel_tolerance: f64,
    pub min_step: f64, // s
    pub max_step: f64, // s
    /// Rows of the extrapolation tableau; row j uses 2(j+1) substeps.
    pub max_columns: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            abs_tolerance: 1e-6,
            rel_tolerance: 1e-12,
            min_step: 1e-6,
            max_step: 300.0,
            max_columns: 8,
        }
    }
}

/// Step bookkeeping, cumulative over the life of a solver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolverStats {
    pub accepted: usize,
    pub rejected: usize,
    pub evaluations: usize,
}

// ---------------------------------------------------------------------------
// Gragg-Bulirsch-Stoer extrapolation of Stoermer's rule
// ---------------------------------------------------------------------------

/// Bulirsch-Stoer extrapolation built on Stoermer's rule for special
/// second-order systems (Numerical Recipes `stoerm`).
///
/// Each internal step of length H is integrated with n = 2, 4, 6, ... Stoermer
/// substeps and the results are extrapolated to zero substep length with a
/// polynomial in h^2. The difference between the last two extrapolation
/// columns is the error estimate. A step that does not converge is halved;
/// a converged step lets the next one double, up to `max_step`.
#[derive(Debug, Clone)]
pub struct StormerExtrapolation {
    config: SolverConfig,
    step: f64,
    stats: SolverStats,
}

struct Attempt {
    estimate: Vector6<f64>,
    converged: bool,
}

impl StormerExtrapolation {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            step: config.max_step,
            config,
            stats: SolverStats::default(),
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn stats(&self) -> SolverStats {
        self.stats
    }

    /// Internal step length the next call will start from, s.
    pub fn next_step(&self) -> f64 {
        self.step
    }

    fn rows(&self) -> usize {
        self.config.max_columns.max(3)
    }

    fn substeps(row: usize) -> usize {
        2 * (row + 1)
    }

    /// One Stoermer pass of `n` substeps over `big_step`.
    /// Returns position and velocity packed as (y, y').
    #[allow(clippy::too_many_arguments)]
    fn stoermer(
        &mut self,
        t0: f64,
        y0: &Vector3<f64>,
        dy0: &Vector3<f64>,
        a0: &Vector3<f64>,
        big_step: f64,
        n: usize,
        accel: &mut Acceleration<'_>,
    ) -> Vector6<f64> {
        let h = big_step / n as f64;
        let h2 = h * h;

        let mut delta = h * (dy0 + 0.5 * h * a0);
        let mut y = y0 + delta;
        for k in 1..n {
            delta += h2 * accel(t0 + k as f64 * h, &y);
            y += delta;
        }
        let dy = delta / h + 0.5 * h * accel(t0 + big_step, &y);
        self.stats.evaluations += n;

        let mut packed = Vector6::zeros();
        packed.fixed_rows_mut::<3>(0).copy_from(&y);
        packed.fixed_rows_mut::<3>(3).copy_from(&dy);
        packed
    }

    fn attempt(
        &mut self,
        t0: f64,
        y0: &Vector3<f64>,
        dy0: &Vector3<f64>,
        big_step: f64,
        accel: &mut Acceleration<'_>,
    ) -> Attempt {
        let a0 = accel(t0, y0);
        self.stats.evaluations += 1;

        let rows = self.rows();
        let mut previous: Vec<Vector6<f64>> = Vec::with_capacity(rows);
        for j in 0..rows {
            let n_j = Self::substeps(j) as f64;
            let mut current = Vec::with_capacity(j + 1);
            current.push(self.stoermer(t0, y0, dy0, &a0, big_step, Self::substeps(j), accel));
            for k in 1..=j {
                let n_jk = Self::substeps(j - k) as f64;
                let ratio = (n_j / n_jk).powi(2);
                let refined = current[k - 1] + (current[k - 1] - previous[k - 1]) / (ratio - 1.0);
                current.push(refined);
            }

            if j >= 2 {
                let best = current[j];
                let error = self.error_norm(&best, &current[j - 1]);
                if error <= 1.0 {
                    return Attempt {
                        estimate: best,
                        converged: true,
                    };
                }
            }
            previous = current;
        }

        Attempt {
            estimate: previous[rows - 1],
            converged: false,
        }
    }

    /// Largest component error scaled by its tolerance. Any non-finite
    /// component makes the whole estimate infinite.
    fn error_norm(&self, best: &Vector6<f64>, coarse: &Vector6<f64>) -> f64 {
        best.iter()
            .zip(coarse.iter())
            .map(|(b, c)| {
                (b - c).abs() / (self.config.abs_tolerance + self.config.rel_tolerance * b.abs())
            })
            .fold(0.0, |worst: f64, e| if e.is_finite() { worst.max(e) } else { f64::INFINITY })
    }
}

impl Default for StormerExtrapolation {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

impl SecondOrderSolver for StormerExtrapolation {
    fn advance(
        &mut self,
        t: f64,
        y: &mut Vector3<f64>,
        dy: &mut Vector3<f64>,
        dt: f64,
        accel: &mut Acceleration<'_>,
    ) {
        if !(dt > 0.0 && dt.is_finite()) {
            return;
        }
        let end = t + dt;
        let mut t = t;
        let mut h = self.step.min(self.config.max_step);

        while t < end {
            let remaining = end - t;
            let span = h.min(remaining);
            let attempt = self.attempt(t, y, dy, span, accel);

            if !attempt.converged {
                if 0.5 * span >= self.config.min_step {
                    debug!("stoermer: step {span:.3e} s at t={t:.3} rejected, halving");
                    self.stats.rejected += 1;
                    h = 0.5 * span;
                    continue;
                }
                warn!("stoermer: accepting unconverged step {span:.3e} s at t={t:.3}");
            }

            *y = attempt.estimate.fixed_rows::<3>(0).into_owned();
            *dy = attempt.estimate.fixed_rows::<3>(3).into_owned();
            self.stats.accepted += 1;
            if !attempt.estimate.iter().all(|v| v.is_finite()) {
                warn!("stoermer: non-finite state at t={t:.3}, abandoning the remaining {remaining:.3e} s");
                h = self.config.max_step;
                break;
            }
            t = if span >= remaining { end } else { t + span };

            if attempt.converged && span == h {
                h = (2.0 * h).min(self.config.max_step);
            }
        }
        self.step = h;
    }

    fn order(&self) -> usize {
        2 * self.rows()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn constant_acceleration_is_exact() {
        let mut solver = StormerExtrapolation::default();
        let g = Vector3::new(0.0, 0.0, -9.81);
        let mut y = Vector3::new(1.0, 2.0, 3.0);
        let mut dy = Vector3::new(10.0, 0.0, 20.0);
        let (y0, dy0) = (y, dy);
        solver.advance(0.0, &mut y, &mut dy, 4.0, &mut |_, _| g);

        assert_abs_diff_eq!(y, y0 + dy0 * 4.0 + 0.5 * g * 16.0, epsilon = 1e-9);
        assert_abs_diff_eq!(dy, dy0 + g * 4.0, epsilon = 1e-9);
        assert_eq!(solver.stats().rejected, 0);
    }

    #[test]
    fn harmonic_oscillator() {
        let mut solver = StormerExtrapolation::new(SolverConfig {
            max_step: 1.0,
            ..SolverConfig::default()
        });
        let mut y = Vector3::new(1.0, 0.0, 0.0);
        let mut dy = Vector3::new(0.0, 1.0, 0.0);
        let mut t = 0.0;
        for _ in 0..10 {
            solver.advance(t, &mut y, &mut dy, 1.0, &mut |_, p| -p);
            t += 1.0;
        }
        assert_abs_diff_eq!(y.x, 10f64.cos(), epsilon = 1e-6);
        assert_abs_diff_eq!(y.y, 10f64.sin(), epsilon = 1e-6);
        assert_abs_diff_eq!(dy.x, -10f64.sin(), epsilon = 1e-6);
    }

    #[test]
    fn time_dependent_forcing() {
        // y'' = t has y = t^3 / 6 from rest.
        let mut solver = StormerExtrapolation::default();
        let mut y = Vector3::zeros();
        let mut dy = Vector3::zeros();
        solver.advance(0.0, &mut y, &mut dy, 3.0, &mut |t, _| Vector3::new(t, 0.0, 0.0));
        assert_abs_diff_eq!(y.x, 27.0 / 6.0, epsilon = 1e-9);
        assert_abs_diff_eq!(dy.x, 4.5, epsilon = 1e-9);
    }

    #[test]
    fn long_request_is_split_at_max_step() {
        let mut solver = StormerExtrapolation::new(SolverConfig {
            max_step: 10.0,
            ..SolverConfig::default()
        });
        let mut y = Vector3::zeros();
        let mut dy = Vector3::new(1.0, 0.0, 0.0);
        solver.advance(0.0, &mut y, &mut dy, 35.0, &mut |_, _| Vector3::zeros());
        assert_abs_diff_eq!(y.x, 35.0, epsilon = 1e-9);
        assert_eq!(solver.stats().accepted, 4);
        assert!(solver.next_step() <= 10.0);
    }

    #[test]
    fn zero_step_is_a_no_op() {
        let mut solver = StormerExtrapolation::default();
        let mut y = Vector3::new(1.0, 1.0, 1.0);
        let mut dy = Vector3::new(5.0, 0.0, 0.0);
        solver.advance(0.0, &mut y, &mut dy, 0.0, &mut |_, _| Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(y, Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(solver.stats().evaluations, 0);
    }

    #[test]
    fn non_finite_acceleration_is_rejected_before_acceptance() {
        let mut solver = StormerExtrapolation::default();
        let mut y = Vector3::new(1.0, 0.0, 0.0);
        let mut dy = Vector3::zeros();
        solver.advance(0.0, &mut y, &mut dy, 1.0, &mut |_, _| Vector3::new(f64::NAN, 0.0, 0.0));

        let stats = solver.stats();
        // Halved from 1 s until the next halving would drop below min_step.
        assert_eq!(stats.rejected, 19);
        assert_eq!(stats.accepted, 1);
        assert!(y.x.is_nan());
    }

    #[test]
    fn nan_step_is_a_no_op() {
        let mut solver = StormerExtrapolation::default();
        let mut y = Vector3::new(1.0, 1.0, 1.0);
        let mut dy = Vector3::zeros();
        solver.advance(0.0, &mut y, &mut dy, f64::NAN, &mut |_, _| Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(y, Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(solver.stats(), SolverStats::default());
    }

    #[test]
    fn config_from_partial_json() {
        let config: SolverConfig = serde_json::from_str(r#"{"max_step": 60.0}"#).unwrap();
        assert_eq!(config.max_step, 60.0);
        assert_eq!(config.max_columns, SolverConfig::default().max_columns);
        assert_eq!(StormerExtrapolation::new(config).order(), 16);
    }
}
