use crate::{
    prelude::*,
    tests::toolkit::{assert_vector_eq, polynomial_segment, polynomial_state, utc},
};

const CUBIC: [f64; 4] = [7000.0, 7.5, -1.0E-3, 2.0E-6];

const QUINTIC: [f64; 6] = [7000.0, 7.5, -1.0E-3, 2.0E-6, -1.0E-9, 1.0E-12];

/// Interpolates every half step and compares to the exact trajectory
fn testbench(
    coefficients: &[f64],
    method: Interpolation,
    degree: u8,
    accel: bool,
    tolerance: (f64, f64, f64),
) {
    let t0 = utc(2020, 1, 1, 0, 0, 0);
    let segment = polynomial_segment(&t0, coefficients, 60.0, 10, method.clone(), degree, accel);

    for k in 0..18 {
        let dt = 30.0 * k as f64 + 15.0;
        let expected = polynomial_state(&t0, coefficients, dt, accel);
        let state = segment.state_at(&expected.epoch).unwrap();

        assert_eq!(state.epoch, expected.epoch);
        assert_vector_eq(&state.position, &expected.position, tolerance.0);
        assert_vector_eq(&state.velocity, &expected.velocity, tolerance.1);

        if accel {
            let acceleration = state.acceleration.unwrap();
            assert_vector_eq(&acceleration, &expected.acceleration.unwrap(), tolerance.2);
        } else {
            assert!(state.acceleration.is_none(), "{} {}", method, degree);
        }
    }
}

#[test]
fn lagrange() {
    testbench(&CUBIC, Interpolation::Lagrange, 3, false, (1.0E-6, 1.0E-8, 0.0));
    testbench(&CUBIC, Interpolation::Lagrange, 3, true, (1.0E-6, 1.0E-8, 1.0E-9));
    testbench(&CUBIC, Interpolation::Lagrange, 7, true, (1.0E-6, 1.0E-8, 1.0E-9));
    testbench(&QUINTIC, Interpolation::Lagrange, 5, true, (1.0E-6, 1.0E-8, 1.0E-9));
}

#[test]
fn lagrange_with_fewer_states() {
    // 4 states only: the window shrinks, a cubic is still recovered
    let t0 = utc(2020, 1, 1, 0, 0, 0);
    let segment = polynomial_segment(&t0, &CUBIC, 60.0, 4, Interpolation::Lagrange, 9, false);
    let expected = polynomial_state(&t0, &CUBIC, 100.0, false);
    let state = segment.state_at(&expected.epoch).unwrap();
    assert_vector_eq(&state.position, &expected.position, 1.0E-6);
    assert_vector_eq(&state.velocity, &expected.velocity, 1.0E-8);
}

#[test]
fn hermite() {
    testbench(&CUBIC, Interpolation::Hermite, 3, false, (1.0E-6, 1.0E-8, 0.0));
    testbench(&QUINTIC, Interpolation::Hermite, 5, true, (1.0E-6, 1.0E-8, 1.0E-9));
    testbench(&QUINTIC, Interpolation::Hermite, 7, true, (1.0E-6, 1.0E-8, 1.0E-9));
}

#[test]
fn linear() {
    let line = [7000.0, 7.5];
    testbench(&line, Interpolation::Linear, 1, false, (1.0E-6, 1.0E-9, 0.0));
}

#[test]
fn tabulated_states() {
    let t0 = utc(2020, 1, 1, 0, 0, 0);
    let segment = polynomial_segment(&t0, &CUBIC, 60.0, 10, Interpolation::Lagrange, 5, true);
    for state in segment.states() {
        assert_eq!(segment.state_at(&state.epoch).unwrap(), *state);
    }

    // within tolerance: tabulated state is returned as is
    let state = &segment.states()[3];
    let epoch = &state.epoch + Duration::from_total_nanoseconds(500);
    assert_eq!(segment.state_at(&epoch).unwrap(), *state);
}

#[test]
fn unsupported_methods() {
    let t0 = utc(2020, 1, 1, 0, 0, 0);
    let epoch = &t0 + Duration::from_seconds(90.0);

    for method in [
        Interpolation::None,
        Interpolation::Other("SPLINE".to_string()),
    ] {
        let segment = polynomial_segment(&t0, &CUBIC, 60.0, 10, method, 5, false);
        assert!(matches!(
            segment.state_at(&epoch),
            Err(Error::InterpolationUnsupported(_))
        ));
        // tabulated epochs remain accessible
        assert!(segment.state_at(&t0).is_ok());
    }

    // no interpolation at all
    let states = crate::tests::toolkit::polynomial_states(&t0, &CUBIC, 60.0, 10, false);
    let metadata = MetaData::new(
        "POLY",
        "2020-999A",
        "EARTH",
        "EME2000",
        states[0].epoch.clone(),
        states[9].epoch.clone(),
    );
    let segment = EphemerisSegment::new(metadata, states, Vec::new()).unwrap();
    assert!(matches!(
        segment.state_at(&epoch),
        Err(Error::InterpolationUnsupported(_))
    ));
}

#[test]
fn single_state() {
    let t0 = utc(2020, 1, 1, 0, 0, 0);
    let cfg = Config::default().with_extrapolation(true);
    let segment = polynomial_segment(&t0, &CUBIC, 60.0, 1, Interpolation::Hermite, 3, false)
        .with_config(cfg);
    assert!(segment.state_at(&t0).is_ok());
    assert!(matches!(
        segment.state_at(&(&t0 + Duration::from_seconds(10.0))),
        Err(Error::InterpolationUnsupported(_))
    ));
}

#[test]
fn extrapolation() {
    let t0 = utc(2020, 1, 1, 0, 0, 0);
    let segment = polynomial_segment(&t0, &CUBIC, 60.0, 10, Interpolation::Lagrange, 3, false);
    let expected = polynomial_state(&t0, &CUBIC, 600.0, false);

    assert!(matches!(
        segment.state_at(&expected.epoch),
        Err(Error::OutOfBounds(_))
    ));

    let segment = segment.with_config(Config::default().with_extrapolation(true));
    let state = segment.state_at(&expected.epoch).unwrap();
    // cubic trajectory, cubic interpolant
    assert_vector_eq(&state.position, &expected.position, 1.0E-5);
}

#[test]
fn polynomials() {
    let xs = [-2.0, -1.0, 0.5, 3.0];
    let ys = xs.iter().map(|x| 1.0 - 2.0 * x + x * x * x).collect::<Vec<_>>();
    let polynomial = crate::interpolation::Polynomial::lagrange(&xs, &ys).unwrap();
    assert_eq!(polynomial.degree(), 3);
    for x in [-1.5, 0.0, 1.0, 2.5] {
        let (p, dp, d2p) = polynomial.eval_derivatives(x);
        assert!((p - (1.0 - 2.0 * x + x * x * x)).abs() < 1.0E-12);
        assert!((dp - (-2.0 + 3.0 * x * x)).abs() < 1.0E-12);
        assert!((d2p - 6.0 * x).abs() < 1.0E-12);
        assert_eq!(polynomial.eval(x), p);
    }

    // duplicate nodes
    assert!(crate::interpolation::Polynomial::lagrange(&[0.0, 0.0], &[1.0, 2.0]).is_none());

    let xs = [0.0, 1.0];
    let ys = [1.0, 0.0];
    let dys = [0.0, 0.0];
    let hermite = crate::interpolation::Polynomial::hermite(&xs, &ys, &dys).unwrap();
    assert_eq!(hermite.degree(), 3);
    // smoothstep: 1 - 3x² + 2x³
    let (p, dp, _) = hermite.eval_derivatives(0.5);
    assert!((p - 0.5).abs() < 1.0E-12);
    assert!((dp + 1.5).abs() < 1.0E-12);
}
