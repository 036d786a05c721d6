//! Lagrange and Hermite interpolation of tabulated states.
//!
//! Both methods build the interpolating polynomial in Newton form
//! (divided differences). Velocity and acceleration are the analytic
//! derivatives of the position polynomial, so an interpolated state
//! is always self consistent.
use std::ops::Range;

use itertools::Itertools;
use nalgebra::Vector3;

#[cfg(feature = "log")]
use log::debug;

use crate::{epoch::EpochTime, error::Error, metadata::Interpolation, state::State};

/// Interpolating polynomial, in Newton form:
/// p(x) = c0 + c1 (x - z0) + c2 (x - z0)(x - z1) + ...
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    nodes: Vec<f64>,
    coefficients: Vec<f64>,
}

fn distinct(xs: &[f64]) -> bool {
    xs.iter().tuple_combinations().all(|(a, b)| a != b)
}

impl Polynomial {
    /// Lagrange polynomial going through every (x, y) point.
    /// Abscissas must be distinct.
    pub fn lagrange(xs: &[f64], ys: &[f64]) -> Option<Self> {
        let n = xs.len();
        if n == 0 || ys.len() != n || !distinct(xs) {
            return None;
        }
        let mut coefficients = ys.to_vec();
        for j in 1..n {
            for i in (j..n).rev() {
                coefficients[i] = (coefficients[i] - coefficients[i - 1]) / (xs[i] - xs[i - j]);
            }
        }
        Some(Self {
            nodes: xs.to_vec(),
            coefficients,
        })
    }

    /// Hermite polynomial matching values (ys) and first
    /// derivatives (dys) at every abscissa. Abscissas must be distinct.
    pub fn hermite(xs: &[f64], ys: &[f64], dys: &[f64]) -> Option<Self> {
        let n = xs.len();
        if n == 0 || ys.len() != n || dys.len() != n || !distinct(xs) {
            return None;
        }

        let m = 2 * n;
        let mut z = vec![0.0_f64; m];
        let mut q = vec![vec![0.0_f64; m]; m];

        for i in 0..n {
            z[2 * i] = xs[i];
            z[2 * i + 1] = xs[i];
            q[2 * i][0] = ys[i];
            q[2 * i + 1][0] = ys[i];
            q[2 * i + 1][1] = dys[i];
            if i > 0 {
                q[2 * i][1] = (q[2 * i][0] - q[2 * i - 1][0]) / (z[2 * i] - z[2 * i - 1]);
            }
        }

        for i in 2..m {
            for j in 2..=i {
                q[i][j] = (q[i][j - 1] - q[i - 1][j - 1]) / (z[i] - z[i - j]);
            }
        }

        Some(Self {
            coefficients: (0..m).map(|i| q[i][i]).collect(),
            nodes: z,
        })
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// Evaluates p(x)
    pub fn eval(&self, x: f64) -> f64 {
        self.eval_derivatives(x).0
    }

    /// Evaluates p(x), p'(x) and p''(x), in one nested pass
    pub fn eval_derivatives(&self, x: f64) -> (f64, f64, f64) {
        let n = self.coefficients.len();
        if n == 0 {
            return (0.0, 0.0, 0.0);
        }
        let (mut p, mut dp, mut d2p) = (self.coefficients[n - 1], 0.0, 0.0);
        for k in (0..n - 1).rev() {
            let dx = x - self.nodes[k];
            d2p = d2p * dx + 2.0 * dp;
            dp = dp * dx + p;
            p = p * dx + self.coefficients[k];
        }
        (p, dp, d2p)
    }
}

/// Selects `count` consecutive nodes among `len`, centered on the target:
/// `ceil(count/2)` nodes at or before it (`after` of them are), clamped
/// to the available range.
pub(crate) fn window(len: usize, after: usize, count: usize) -> Range<usize> {
    let count = count.min(len);
    let before = (count + 1) / 2;
    let start = after.saturating_sub(before).min(len - count);
    start..start + count
}

/// Number of nodes a method needs for a given degree
pub(crate) fn nodes_count(method: &Interpolation, degree: u8) -> Option<usize> {
    match method {
        Interpolation::Lagrange => Some(degree as usize + 1),
        Interpolation::Linear => Some(2),
        Interpolation::Hermite => Some((degree as usize / 2 + 1).max(2)),
        Interpolation::None | Interpolation::Other(_) => None,
    }
}

/// Interpolates `states` (sorted by epoch) at `epoch`
pub(crate) fn interpolate(
    states: &[State],
    epoch: &EpochTime,
    method: &Interpolation,
    degree: u8,
) -> Result<State, Error> {
    if degree == 0 && *method != Interpolation::Linear {
        return Err(Error::InterpolationUnsupported(format!(
            "{} interpolation of degree 0",
            method
        )));
    }

    let count = nodes_count(method, degree).ok_or(Error::InterpolationUnsupported(format!(
        "\"{}\" interpolation",
        method
    )))?;

    if states.len() < 2 {
        return Err(Error::InterpolationUnsupported(format!(
            "{} interpolation requires at least 2 states",
            method
        )));
    }

    let after = states.partition_point(|s| s.epoch <= *epoch);
    let range = window(states.len(), after, count);
    let nodes = &states[range];

    #[cfg(feature = "log")]
    debug!(
        "{} interpolation at {}: [{}, {}] ({} nodes)",
        method,
        epoch,
        nodes[0].epoch,
        nodes[nodes.len() - 1].epoch,
        nodes.len()
    );

    // relative time, target being 0
    let xs = nodes
        .iter()
        .map(|s| (&s.epoch - epoch).to_seconds())
        .collect::<Vec<_>>();

    let mut position = Vector3::<f64>::zeros();
    let mut velocity = Vector3::<f64>::zeros();
    let mut acceleration = Vector3::<f64>::zeros();

    for axis in 0..3 {
        let ys = nodes.iter().map(|s| s.position[axis]).collect::<Vec<_>>();
        let polynomial = match method {
            Interpolation::Hermite => {
                let dys = nodes.iter().map(|s| s.velocity[axis]).collect::<Vec<_>>();
                Polynomial::hermite(&xs, &ys, &dys).or_else(|| Polynomial::lagrange(&xs, &ys))
            },
            _ => Polynomial::lagrange(&xs, &ys),
        }
        .ok_or(Error::InterpolationUnsupported(
            "duplicate interpolation nodes".to_string(),
        ))?;

        let (p, dp, d2p) = polynomial.eval_derivatives(0.0);
        position[axis] = p;
        velocity[axis] = dp;
        acceleration[axis] = d2p;
    }

    Ok(State {
        epoch: epoch.clone(),
        position,
        velocity,
        acceleration: if nodes[0].has_accel() {
            Some(acceleration)
        } else {
            None
        },
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lagrange_polynomial() {
        // p(x) = 2x^3 - x + 1
        let p = |x: f64| 2.0 * x.powi(3) - x + 1.0;
        let xs = [-2.0, -0.5, 1.0, 3.0];
        let ys = xs.iter().map(|x| p(*x)).collect::<Vec<_>>();

        let polynomial = Polynomial::lagrange(&xs, &ys).unwrap();
        assert_eq!(polynomial.degree(), 3);

        for x in [-1.5, 0.0, 0.25, 2.0] {
            let (value, first, second) = polynomial.eval_derivatives(x);
            assert!((value - p(x)).abs() < 1.0E-9);
            assert!((first - (6.0 * x * x - 1.0)).abs() < 1.0E-9);
            assert!((second - 12.0 * x).abs() < 1.0E-9);
        }

        assert!(Polynomial::lagrange(&[0.0, 0.0], &[1.0, 2.0]).is_none());
        assert!(Polynomial::lagrange(&[0.0, 1.0], &[1.0]).is_none());
    }

    #[test]
    fn hermite_polynomial() {
        // p(x) = x^5 - 3x^2, matched with 3 nodes (degree 5)
        let p = |x: f64| x.powi(5) - 3.0 * x * x;
        let dp = |x: f64| 5.0 * x.powi(4) - 6.0 * x;
        let xs = [0.0, 1.0, 2.5];
        let ys = xs.iter().map(|x| p(*x)).collect::<Vec<_>>();
        let dys = xs.iter().map(|x| dp(*x)).collect::<Vec<_>>();

        let polynomial = Polynomial::hermite(&xs, &ys, &dys).unwrap();
        assert_eq!(polynomial.degree(), 5);

        for x in [0.0, 0.5, 1.75, 2.5] {
            let (value, first, second) = polynomial.eval_derivatives(x);
            assert!((value - p(x)).abs() < 1.0E-9, "p({})={} != {}", x, value, p(x));
            assert!((first - dp(x)).abs() < 1.0E-9);
            assert!((second - (20.0 * x.powi(3) - 6.0)).abs() < 1.0E-9);
        }
    }

    #[test]
    fn window_selection() {
        // centered
        assert_eq!(window(10, 5, 4), 3..7);
        assert_eq!(window(10, 5, 5), 2..7);
        // clamped at both ends
        assert_eq!(window(10, 0, 4), 0..4);
        assert_eq!(window(10, 1, 6), 0..6);
        assert_eq!(window(10, 10, 4), 6..10);
        // fewer states than requested
        assert_eq!(window(3, 2, 8), 0..3);
    }

    #[test]
    fn nodes_per_method() {
        assert_eq!(nodes_count(&Interpolation::Lagrange, 5), Some(6));
        assert_eq!(nodes_count(&Interpolation::Hermite, 7), Some(4));
        assert_eq!(nodes_count(&Interpolation::Hermite, 1), Some(2));
        assert_eq!(nodes_count(&Interpolation::Linear, 9), Some(2));
        assert_eq!(nodes_count(&Interpolation::None, 5), None);
    }
}
