//! Derivative-free minimization (Nelder–Mead simplex).

use ordered_float::OrderedFloat;

/// Stopping rules for [`nelder_mead`].
#[derive(Debug, Clone, Copy)]
pub struct SimplexOptions {
    /// Initial simplex edge length along each axis.
    pub step: f64,
    pub max_iter: usize,
    /// Stop when the spread of function values across the simplex falls below this.
    pub tol: f64,
}

impl Default for SimplexOptions {
    fn default() -> Self {
        Self {
            step: 0.5,
            max_iter: 2000,
            tol: 1e-10,
        }
    }
}

/// Best point found and its objective value.
#[derive(Debug, Clone)]
pub struct Minimum {
    pub x: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
}

/// Minimize `f` starting from `x0`. Non-finite objective values are treated
/// as +inf so the simplex moves away from them.
pub fn nelder_mead<F>(f: F, x0: &[f64], options: SimplexOptions) -> Minimum
where
    F: Fn(&[f64]) -> f64,
{
    let n = x0.len();
    let eval = |x: &[f64]| {
        let v = f(x);
        if v.is_finite() {
            v
        } else {
            f64::INFINITY
        }
    };

    let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
    simplex.push((x0.to_vec(), eval(x0)));
    for i in 0..n {
        let mut x = x0.to_vec();
        x[i] += options.step;
        let v = eval(&x);
        simplex.push((x, v));
    }

    let mut iterations = 0;
    while iterations < options.max_iter {
        simplex.sort_by_key(|(_, v)| OrderedFloat(*v));
        let best = simplex[0].1;
        let worst = simplex[n].1;
        if (worst - best).abs() <= options.tol * (1.0 + best.abs()) {
            break;
        }
        iterations += 1;

        let centroid: Vec<f64> = (0..n)
            .map(|j| simplex[..n].iter().map(|(x, _)| x[j]).sum::<f64>() / n as f64)
            .collect();
        let towards = |coef: f64| -> Vec<f64> {
            centroid
                .iter()
                .zip(&simplex[n].0)
                .map(|(c, w)| c + coef * (w - c))
                .collect()
        };

        let reflected = towards(-1.0);
        let fr = eval(&reflected);
        if fr < simplex[0].1 {
            let expanded = towards(-2.0);
            let fe = eval(&expanded);
            simplex[n] = if fe < fr { (expanded, fe) } else { (reflected, fr) };
        } else if fr < simplex[n - 1].1 {
            simplex[n] = (reflected, fr);
        } else {
            let contracted = if fr < worst { towards(-0.5) } else { towards(0.5) };
            let fc = eval(&contracted);
            if fc < worst.min(fr) {
                simplex[n] = (contracted, fc);
            } else {
                // Shrink towards the best vertex.
                let best_x = simplex[0].0.clone();
                for (x, v) in simplex.iter_mut().skip(1) {
                    for (xi, bi) in x.iter_mut().zip(&best_x) {
                        *xi = bi + 0.5 * (*xi - bi);
                    }
                    *v = eval(x);
                }
            }
        }
    }

    simplex.sort_by_key(|(_, v)| OrderedFloat(*v));
    let (x, value) = simplex.swap_remove(0);
    Minimum { x, value, iterations }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_quadratic() {
        let f = |x: &[f64]| (x[0] - 3.0).powi(2) + 2.0 * (x[1] + 1.0).powi(2);
        let min = nelder_mead(f, &[0.0, 0.0], SimplexOptions::default());
        assert_relative_eq!(min.x[0], 3.0, epsilon = 1e-4);
        assert_relative_eq!(min.x[1], -1.0, epsilon = 1e-4);
        assert!(min.value < 1e-8);
    }

    #[test]
    fn test_rosenbrock() {
        let f = |x: &[f64]| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2);
        let options = SimplexOptions {
            max_iter: 10_000,
            tol: 1e-14,
            ..SimplexOptions::default()
        };
        let min = nelder_mead(f, &[-1.2, 1.0], options);
        assert_relative_eq!(min.x[0], 1.0, epsilon = 1e-2);
        assert_relative_eq!(min.x[1], 1.0, epsilon = 1e-2);
    }

    #[test]
    fn test_non_finite_region_avoided() {
        // Undefined for x <= 0; minimum of x - ln(x) at x = 1.
        let f = |x: &[f64]| x[0] - x[0].ln();
        let min = nelder_mead(f, &[2.0], SimplexOptions::default());
        assert_relative_eq!(min.x[0], 1.0, epsilon = 1e-4);
    }
}
