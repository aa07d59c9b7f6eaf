use log::debug;

/// Newton-Raphson iteration from `guess`.
///
/// `f_and_f_prime` returns the function value and its derivative. Converges
/// when a Newton step is strictly smaller than `tolerance`, so a tolerance of
/// zero always runs out of iterations. Returns `None` when the derivative
/// vanishes, the iterate stops being finite, or `max_iterations` is exhausted.
pub fn newton_raphson(
    f_and_f_prime: impl Fn(f64) -> (f64, f64),
    guess: f64,
    tolerance: f64,
    max_iterations: usize,
) -> Option<f64> {
    let mut x = guess;
    for _ in 0..max_iterations {
        let (f, f_prime) = f_and_f_prime(x);
        if f_prime == 0.0 || !f_prime.is_finite() {
            debug!("newton: zero or non-finite derivative at x={x}");
            return None;
        }
        let step = f / f_prime;
        x -= step;
        if !x.is_finite() {
            return None;
        }
        if step.abs() < tolerance {
            return Some(x);
        }
    }
    debug!("newton: no convergence after {max_iterations} iterations, last x={x}");
    None
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_cubics() {
        for a in [2.0, 50.0, -1.0, 0.1].iter() {
            let root = newton_raphson(|x| (x * x * x - a, 3.0 * x * x), 1.0, 1e-14, 100).unwrap();
            assert_relative_eq!(root, a.cbrt(), max_relative = 1e-12);
        }
    }

    #[test]
    fn test_trig() {
        // There's a unique fixed point cos(x) = x
        let root = newton_raphson(|x| (x.cos() - x, -x.sin() - 1.0), 0.5, 1e-15, 100).unwrap();
        assert_relative_eq!(root, 0.73908513321516064, max_relative = 1e-14);
    }

    #[test]
    fn gives_up_on_flat_functions() {
        assert_eq!(newton_raphson(|x| (x * x + 1.0, 2.0 * x), 0.0, 1e-12, 50), None);
        // No real root: iterates wander without converging.
        assert_eq!(newton_raphson(|x| (x * x + 1.0, 2.0 * x), 3.0, 1e-12, 50), None);
    }

    #[test]
    fn exact_root_still_needs_a_step_below_tolerance() {
        let line = |x: f64| (x - 2.0, 1.0);
        assert_eq!(newton_raphson(line, 2.0, 1e-12, 5), Some(2.0));
        assert_eq!(newton_raphson(line, 2.0, 0.0, 5), None);
    }
}
