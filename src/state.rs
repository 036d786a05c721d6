//! Spacecraft state vectors
use nalgebra::Vector3;

use crate::epoch::EpochTime;

/// [State] is a tabulated (or interpolated) spacecraft state:
/// position in km, velocity in km/s and optional acceleration in km/s².
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    /// [EpochTime] of this state
    pub epoch: EpochTime,
    /// Position (km)
    pub position: Vector3<f64>,
    /// Velocity (km/s)
    pub velocity: Vector3<f64>,
    /// Acceleration (km/s²), when provided
    pub acceleration: Option<Vector3<f64>>,
}

impl State {
    /// Builds a new [State] from position (km) and velocity (km/s)
    pub fn new(epoch: EpochTime, position: (f64, f64, f64), velocity: (f64, f64, f64)) -> Self {
        Self {
            epoch,
            position: Vector3::new(position.0, position.1, position.2),
            velocity: Vector3::new(velocity.0, velocity.1, velocity.2),
            acceleration: None,
        }
    }

    /// Copies and returns [State] with acceleration (km/s²)
    pub fn with_acceleration(&self, acceleration: (f64, f64, f64)) -> Self {
        let mut s = self.clone();
        s.acceleration = Some(Vector3::new(
            acceleration.0,
            acceleration.1,
            acceleration.2,
        ));
        s
    }

    /// Builds a [State] from a 6 or 9 components vector
    pub(crate) fn from_slice(epoch: EpochTime, values: &[f64]) -> Option<Self> {
        match values.len() {
            6 => Some(Self {
                epoch,
                position: Vector3::new(values[0], values[1], values[2]),
                velocity: Vector3::new(values[3], values[4], values[5]),
                acceleration: None,
            }),
            9 => Some(Self {
                epoch,
                position: Vector3::new(values[0], values[1], values[2]),
                velocity: Vector3::new(values[3], values[4], values[5]),
                acceleration: Some(Vector3::new(values[6], values[7], values[8])),
            }),
            _ => None,
        }
    }

    /// True if this [State] carries acceleration
    pub fn has_accel(&self) -> bool {
        self.acceleration.is_some()
    }

    /// Returns the 6 (or 9, with acceleration) components state vector
    pub fn vector(&self) -> Vec<f64> {
        let mut vector = self
            .position
            .iter()
            .chain(self.velocity.iter())
            .copied()
            .collect::<Vec<_>>();
        if let Some(acceleration) = &self.acceleration {
            vector.extend(acceleration.iter());
        }
        vector
    }

    /// Compares two states: same epoch and acceleration presence,
    /// all components within `tolerance`.
    pub fn approx_eq(&self, rhs: &Self, tolerance: f64) -> bool {
        if self.epoch != rhs.epoch || self.has_accel() != rhs.has_accel() {
            return false;
        }
        self.vector()
            .iter()
            .zip(rhs.vector().iter())
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}
