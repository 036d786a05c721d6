//! State covariance matrices
use nalgebra::DMatrix;

use crate::epoch::EpochTime;

/// Symmetric threshold applied when checking a [Covariance]
pub(crate) const SYMMETRY_TOLERANCE: f64 = 1.0E-12;

/// Position / velocity (6x6), or position / velocity / acceleration (9x9)
/// covariance matrix, at a given epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct Covariance {
    /// [EpochTime] of this covariance
    pub epoch: EpochTime,
    /// COV_REF_FRAME, when it differs from the segment frame
    pub frame: Option<String>,
    /// Square symmetric matrix
    pub matrix: DMatrix<f64>,
}

impl Covariance {
    /// Builds a new [Covariance]
    pub fn new(epoch: EpochTime, frame: Option<String>, matrix: DMatrix<f64>) -> Self {
        Self {
            epoch,
            frame,
            matrix,
        }
    }

    /// Builds a symmetric [Covariance] from its lower triangle, row major:
    /// 21 values (6x6) or 45 values (9x9).
    pub fn from_lower_triangle(
        epoch: EpochTime,
        frame: Option<String>,
        values: &[f64],
    ) -> Option<Self> {
        let dim = match values.len() {
            21 => 6,
            45 => 9,
            _ => return None,
        };
        let mut matrix = DMatrix::<f64>::zeros(dim, dim);
        let mut values = values.iter();
        for i in 0..dim {
            for j in 0..=i {
                let value = *values.next()?;
                matrix[(i, j)] = value;
                matrix[(j, i)] = value;
            }
        }
        Some(Self::new(epoch, frame, matrix))
    }

    /// Returns the lower triangle, row major
    pub fn lower_triangle(&self) -> Vec<f64> {
        let dim = self.dimension();
        let mut values = Vec::with_capacity(dim * (dim + 1) / 2);
        for i in 0..dim {
            for j in 0..=i {
                values.push(self.matrix[(i, j)]);
            }
        }
        values
    }

    /// Matrix dimension
    pub fn dimension(&self) -> usize {
        self.matrix.nrows()
    }

    pub(crate) fn is_square(&self) -> bool {
        self.matrix.nrows() == self.matrix.ncols()
    }

    pub(crate) fn is_symmetric(&self) -> bool {
        self.is_square()
            && (0..self.dimension()).all(|i| {
                (0..i).all(|j| {
                    let (a, b) = (self.matrix[(i, j)], self.matrix[(j, i)]);
                    (a - b).abs() <= SYMMETRY_TOLERANCE * a.abs().max(b.abs()).max(1.0)
                })
            })
    }

    /// Compares two covariances: same epoch, frame and dimension,
    /// all terms within `tolerance`.
    pub fn approx_eq(&self, rhs: &Self, tolerance: f64) -> bool {
        self.epoch == rhs.epoch
            && self.frame == rhs.frame
            && self.matrix.shape() == rhs.matrix.shape()
            && self
                .matrix
                .iter()
                .zip(rhs.matrix.iter())
                .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn lower_triangle() {
        let t = EpochTime::from_str("2020-01-01T00:00:00 UTC").unwrap();
        let values = (1..=21).map(|v| v as f64).collect::<Vec<_>>();

        let cov = Covariance::from_lower_triangle(t.clone(), None, &values).unwrap();
        assert_eq!(cov.dimension(), 6);
        assert!(cov.is_symmetric());
        assert_eq!(cov.matrix[(0, 0)], 1.0);
        assert_eq!(cov.matrix[(1, 0)], 2.0);
        assert_eq!(cov.matrix[(0, 1)], 2.0);
        assert_eq!(cov.matrix[(5, 5)], 21.0);
        assert_eq!(cov.matrix[(5, 0)], 16.0);
        assert_eq!(cov.lower_triangle(), values);

        let values = (1..=45).map(|v| v as f64).collect::<Vec<_>>();
        let cov = Covariance::from_lower_triangle(t.clone(), Some("RTN".to_string()), &values)
            .unwrap();
        assert_eq!(cov.dimension(), 9);
        assert_eq!(cov.lower_triangle(), values);

        assert!(Covariance::from_lower_triangle(t, None, &[1.0; 20]).is_none());
    }

    #[test]
    fn symmetry() {
        let t = EpochTime::from_str("2020-01-01T00:00:00 UTC").unwrap();
        let mut matrix = DMatrix::<f64>::identity(6, 6);
        matrix[(1, 0)] = 0.5;
        let cov = Covariance::new(t, None, matrix);
        assert!(!cov.is_symmetric());
    }
}
