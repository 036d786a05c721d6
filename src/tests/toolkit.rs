use std::path::{Path, PathBuf};

use rand::{distributions::Alphanumeric, Rng};

use crate::prelude::*;

/*
 * Tool to generate random names when we need to produce a file
 */
pub fn random_name(size: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(size)
        .map(char::from)
        .collect()
}

/// test_resources/OEM/`validity` directory
pub fn resources(validity: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("test_resources")
        .join("OEM")
        .join(validity)
}

/// Every sample file of `validity`, sorted by name
pub fn sample_files(validity: &str) -> Vec<PathBuf> {
    let mut files = std::fs::read_dir(resources(validity))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.is_file())
        .collect::<Vec<_>>();
    files.sort();
    files
}

pub fn utc(year: i32, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> EpochTime {
    EpochTime::from_gregorian(year, month, day, hour, minute, second, 0, TimeSystem::UTC).unwrap()
}

/// Evaluates sum(coefficients[k] * t^k) and its first two derivatives
pub fn polynomial(coefficients: &[f64], t: f64) -> (f64, f64, f64) {
    let (mut p, mut dp, mut d2p) = (0.0, 0.0, 0.0);
    for (k, c) in coefficients.iter().enumerate() {
        let k = k as i32;
        p += c * t.powi(k);
        if k > 0 {
            dp += c * k as f64 * t.powi(k - 1);
        }
        if k > 1 {
            d2p += c * (k * (k - 1)) as f64 * t.powi(k - 2);
        }
    }
    (p, dp, d2p)
}

/// Exact [State] of a trajectory where x follows the polynomial,
/// y twice the polynomial and z its opposite, `t` seconds after t0.
pub fn polynomial_state(t0: &EpochTime, coefficients: &[f64], t: f64, accel: bool) -> State {
    let (p, dp, d2p) = polynomial(coefficients, t);
    let epoch = t0 + Duration::from_seconds(t);
    let state = State::new(epoch, (p, 2.0 * p, -p), (dp, 2.0 * dp, -dp));
    if accel {
        state.with_acceleration((d2p, 2.0 * d2p, -d2p))
    } else {
        state
    }
}

/// `count` states of the polynomial trajectory, every `step` seconds
pub fn polynomial_states(
    t0: &EpochTime,
    coefficients: &[f64],
    step: f64,
    count: usize,
    accel: bool,
) -> Vec<State> {
    (0..count)
        .map(|k| polynomial_state(t0, coefficients, step * k as f64, accel))
        .collect()
}

/// Builds a single segment sampling the polynomial trajectory
pub fn polynomial_segment(
    t0: &EpochTime,
    coefficients: &[f64],
    step: f64,
    count: usize,
    method: Interpolation,
    degree: u8,
    accel: bool,
) -> EphemerisSegment {
    let states = polynomial_states(t0, coefficients, step, count, accel);
    let start = states[0].epoch.clone();
    let stop = states[count - 1].epoch.clone();
    let metadata = MetaData::new("POLY", "2020-999A", "EARTH", "EME2000", start, stop)
        .with_interpolation(method, degree);
    EphemerisSegment::new(metadata, states, Vec::new()).unwrap()
}

pub fn header(version: Version) -> Header {
    Header::new(version, utc(2020, 1, 1, 0, 0, 0), "TEST")
}

/// Identity scaled 6x6 covariance
pub fn covariance(epoch: EpochTime, scale: f64) -> Covariance {
    Covariance::new(
        epoch,
        None,
        nalgebra::DMatrix::<f64>::identity(6, 6) * scale,
    )
}

/// Asserts two vectors are equal within `tolerance`
pub fn assert_vector_eq(lhs: &nalgebra::Vector3<f64>, rhs: &nalgebra::Vector3<f64>, tolerance: f64) {
    for axis in 0..3 {
        assert!(
            (lhs[axis] - rhs[axis]).abs() <= tolerance,
            "axis {}: {} != {} (tolerance {})",
            axis,
            lhs[axis],
            rhs[axis],
            tolerance
        );
    }
}
