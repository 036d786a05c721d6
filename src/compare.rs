//! Differences between two ephemerides.
//!
//! Only segments sharing the same reference frame and center body
//! are compared, over their common useable span, in that frame.
//! Velocity based and RIC quantities require an inertial frame.
use hifitime::Duration;
use nalgebra::{Matrix3, Vector3};

#[cfg(feature = "log")]
use log::warn;

use crate::{
    epoch::EpochTime,
    error::Error,
    segment::{EphemerisSegment, Epochs},
    state::State,
    OrbitEphemerisMessage,
};

const INERTIAL_FRAMES: [&str; 7] = ["EME2000", "GCRF", "ICRF", "MCI", "TEME", "TOD", "J2000"];

const ROTATING_FRAMES: [&str; 5] = ["GRC", "ITRF2000", "ITRF-93", "ITRF-97", "TDR"];

/// Returns true if `frame` is inertial. Non standard frames
/// are assumed inertial.
pub fn is_inertial(frame: &str) -> bool {
    !ROTATING_FRAMES.contains(&frame.trim().to_uppercase().as_str())
}

fn is_standard(frame: &str) -> bool {
    let frame = frame.trim().to_uppercase();
    INERTIAL_FRAMES.contains(&frame.as_str()) || ROTATING_FRAMES.contains(&frame.as_str())
}

/// [StateCompare] is the difference of a target [State]
/// relative to an origin [State], at the same epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct StateCompare {
    origin: State,
    target: State,
    frame: String,
    inertial: bool,
}

impl StateCompare {
    /// Compares `target` to `origin`, both expressed in `frame`.
    /// Fails if epochs differ by more than `tolerance`.
    pub fn new(
        origin: &State,
        target: &State,
        frame: &str,
        tolerance: Duration,
    ) -> Result<Self, Error> {
        if !origin.epoch.approx_eq(&target.epoch, tolerance) {
            return Err(Error::IncompatibleSegments(format!(
                "epoch {} differs from {}",
                target.epoch, origin.epoch
            )));
        }
        Ok(Self {
            origin: origin.clone(),
            target: target.clone(),
            frame: frame.to_string(),
            inertial: is_inertial(frame),
        })
    }

    pub fn epoch(&self) -> &EpochTime {
        &self.origin.epoch
    }

    pub fn frame(&self) -> &str {
        &self.frame
    }

    fn require_inertial(&self) -> Result<(), Error> {
        if self.inertial {
            Ok(())
        } else {
            Err(Error::NonInertialFrame(self.frame.clone()))
        }
    }

    /// Rotation from the compare frame to the origin RIC frame
    /// (radial, in-track, cross-track).
    fn ric_rotation(&self) -> Result<Matrix3<f64>, Error> {
        self.require_inertial()?;
        let r = self.origin.position;
        let cross_track = r.cross(&self.origin.velocity);
        let in_track = cross_track.cross(&r);
        Ok(Matrix3::from_rows(&[
            r.normalize().transpose(),
            in_track.normalize().transpose(),
            cross_track.normalize().transpose(),
        ]))
    }

    /// Relative position (km)
    pub fn position(&self) -> Vector3<f64> {
        self.target.position - self.origin.position
    }

    /// Relative velocity (km/s)
    pub fn velocity(&self) -> Result<Vector3<f64>, Error> {
        self.require_inertial()?;
        Ok(self.target.velocity - self.origin.velocity)
    }

    /// Distance between both states (km)
    pub fn range(&self) -> f64 {
        self.position().norm()
    }

    /// Magnitude of the relative velocity (km/s)
    pub fn range_rate(&self) -> Result<f64, Error> {
        Ok(self.velocity()?.norm())
    }

    /// Relative position in the origin RIC frame
    pub fn position_ric(&self) -> Result<Vector3<f64>, Error> {
        Ok(self.ric_rotation()? * self.position())
    }

    /// Relative velocity in the origin RIC frame,
    /// which rotates with the origin orbit.
    pub fn velocity_ric(&self) -> Result<Vector3<f64>, Error> {
        let rotation = self.ric_rotation()?;
        let r = self.origin.position;
        let omega = rotation * (r.cross(&self.origin.velocity) / r.norm_squared());
        let position = rotation * self.position();
        Ok(rotation * self.velocity()? - omega.cross(&position))
    }
}

/// [SegmentCompare] compares two [EphemerisSegment]s over their
/// common useable span.
#[derive(Debug, Clone)]
pub struct SegmentCompare<'a> {
    origin: &'a EphemerisSegment,
    target: &'a EphemerisSegment,
    span: Option<(EpochTime, EpochTime)>,
}

impl<'a> SegmentCompare<'a> {
    /// Fails when frames, center bodies or time systems differ
    pub fn new(origin: &'a EphemerisSegment, target: &'a EphemerisSegment) -> Result<Self, Error> {
        let (lhs, rhs) = (origin.metadata(), target.metadata());

        if lhs.ref_frame != rhs.ref_frame {
            return Err(Error::IncompatibleSegments(format!(
                "{} frame differs from {}",
                rhs.ref_frame, lhs.ref_frame
            )));
        }
        if lhs.center_name != rhs.center_name {
            return Err(Error::IncompatibleSegments(format!(
                "{} center differs from {}",
                rhs.center_name, lhs.center_name
            )));
        }
        if lhs.time_system != rhs.time_system {
            return Err(Error::UnsupportedTimeSystem {
                expected: lhs.time_system.clone(),
                found: rhs.time_system.clone(),
            });
        }

        if !is_standard(&lhs.ref_frame) {
            #[cfg(feature = "log")]
            warn!("non standard frame \"{}\": assumed inertial", lhs.ref_frame);
        }

        let (origin_start, origin_stop) = origin.span();
        let (target_start, target_stop) = target.span();

        let start = origin_start.max(target_start);
        let stop = origin_stop.min(target_stop);

        let span = if start <= stop {
            Some((start.clone(), stop.clone()))
        } else {
            None
        };

        Ok(Self {
            origin,
            target,
            span,
        })
    }

    /// True when both segments do not overlap
    pub fn is_empty(&self) -> bool {
        self.span.is_none()
    }

    /// Common useable span
    pub fn span(&self) -> Option<(&EpochTime, &EpochTime)> {
        self.span.as_ref().map(|(start, stop)| (start, stop))
    }

    pub fn contains(&self, epoch: &EpochTime) -> bool {
        let tol = self.origin.config().epoch_tolerance;
        match &self.span {
            Some((start, stop)) => epoch.within(start, stop, tol),
            None => false,
        }
    }

    /// Compares both segments at `epoch`
    pub fn state_at(&self, epoch: &EpochTime) -> Result<StateCompare, Error> {
        if !self.contains(epoch) {
            return Err(Error::OutOfBounds(epoch.clone()));
        }
        let origin = self.origin.state_at(epoch)?;
        let target = self.target.state_at(epoch)?;
        StateCompare::new(
            &origin,
            &target,
            &self.origin.metadata().ref_frame,
            self.origin.config().epoch_tolerance,
        )
    }

    /// Iterates evenly spaced comparisons over the common span.
    /// The last step is clipped to the end of the span.
    pub fn steps(
        &self,
        interval: Duration,
    ) -> Result<impl Iterator<Item = Result<StateCompare, Error>> + '_, Error> {
        if interval <= Duration::ZERO {
            return Err(Error::InvalidInterval(interval));
        }
        let epochs = self.span.as_ref().map(|(start, stop)| {
            Epochs::new(start, stop, interval, self.origin.config().epoch_tolerance)
        });
        Ok(epochs
            .into_iter()
            .flatten()
            .map(move |epoch| self.state_at(&epoch)))
    }
}

/// [EphemerisCompare] gathers every overlapping and comparable
/// pair of segments of two [OrbitEphemerisMessage]s.
#[derive(Debug, Clone)]
pub struct EphemerisCompare<'a> {
    segments: Vec<SegmentCompare<'a>>,
}

impl<'a> EphemerisCompare<'a> {
    /// Compares `target` to `origin`. Incompatible or
    /// non overlapping segment pairs are skipped.
    pub fn new(
        origin: &'a OrbitEphemerisMessage,
        target: &'a OrbitEphemerisMessage,
    ) -> Result<Self, Error> {
        let mut segments = Vec::new();
        for lhs in origin.segments() {
            for rhs in target.segments() {
                match SegmentCompare::new(lhs, rhs) {
                    Ok(compare) if !compare.is_empty() => segments.push(compare),
                    Ok(_) => {},
                    Err(Error::UnsupportedTimeSystem { expected, found }) => {
                        return Err(Error::UnsupportedTimeSystem { expected, found });
                    },
                    Err(_) => {},
                }
            }
        }
        Ok(Self { segments })
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[SegmentCompare<'a>] {
        &self.segments
    }

    pub fn contains(&self, epoch: &EpochTime) -> bool {
        self.segments.iter().any(|segment| segment.contains(epoch))
    }

    /// Compares both ephemerides at `epoch`,
    /// using the first segment pair that covers it.
    pub fn state_at(&self, epoch: &EpochTime) -> Result<StateCompare, Error> {
        self.segments
            .iter()
            .find(|segment| segment.contains(epoch))
            .ok_or(Error::NoMatchingSegment(epoch.clone()))?
            .state_at(epoch)
    }

    /// Iterates evenly spaced comparisons, segment pair after segment pair
    pub fn steps(
        &self,
        interval: Duration,
    ) -> Result<impl Iterator<Item = Result<StateCompare, Error>> + '_, Error> {
        let steps = self
            .segments
            .iter()
            .map(|segment| segment.steps(interval))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(steps.into_iter().flatten())
    }
}

impl<'a, 'b> IntoIterator for &'b EphemerisCompare<'a> {
    type Item = &'b SegmentCompare<'a>;
    type IntoIter = std::slice::Iter<'b, SegmentCompare<'a>>;
    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}
