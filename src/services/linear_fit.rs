//! Ordinary least-squares line fitting

use serde::{Deserialize, Serialize};

/// Below this the x values carry no usable variance
const DEGENERATE_DENOMINATOR: f64 = 1e-9;

/// y ≈ slope·x + intercept
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LineFit {
    #[inline]
    pub fn eval(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit a line through `(xs[i], ys[i])`.
///
/// Never fails: fewer than two points give a flat line through the first y
/// (or zero), and x values without variance give a flat line through mean(y).
pub fn fit_linear(xs: &[f64], ys: &[f64]) -> LineFit {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return LineFit {
            slope: 0.0,
            intercept: ys.first().copied().unwrap_or(0.0),
        };
    }

    let (mut sx, mut sy, mut sxx, mut sxy) = (0.0, 0.0, 0.0, 0.0);
    for (&x, &y) in xs.iter().zip(ys).take(n) {
        sx += x;
        sy += y;
        sxx += x * x;
        sxy += x * y;
    }

    let n = n as f64;
    let denom = n * sxx - sx * sx;
    if denom.abs() < DEGENERATE_DENOMINATOR {
        return LineFit {
            slope: 0.0,
            intercept: sy / n,
        };
    }

    let slope = (n * sxy - sx * sy) / denom;
    LineFit {
        slope,
        intercept: (sy - slope * sx) / n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_single_point() {
        assert_eq!(fit_linear(&[], &[]), LineFit::default());
        assert_eq!(
            fit_linear(&[0.4], &[3.5]),
            LineFit {
                slope: 0.0,
                intercept: 3.5
            }
        );
    }

    #[test]
    fn two_points_give_exact_line() {
        let fit = fit_linear(&[0.2, 0.6], &[1.0, 3.0]);
        assert!((fit.slope - 5.0).abs() < 1e-12);
        assert!(fit.intercept.abs() < 1e-12);
        assert!((fit.eval(0.6) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn no_x_variance_falls_back_to_mean() {
        let fit = fit_linear(&[0.5, 0.5, 0.5], &[1.0, 2.0, 6.0]);
        assert_eq!(fit.slope, 0.0);
        assert!((fit.intercept - 3.0).abs() < 1e-12);
    }

    #[test]
    fn noisy_points_minimise_squared_error() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [1.1, 2.9, 5.1, 6.9];
        let fit = fit_linear(&xs, &ys);
        assert!((fit.slope - 1.96).abs() < 1e-9);
        assert!((fit.intercept - 1.06).abs() < 1e-9);
    }
}
