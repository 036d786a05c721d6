//! Structural and semantic checks.
//!
//! Every rule reports into a [ValidationReport] instead of stopping
//! at the first problem. Fatal violations prevent construction,
//! warnings are attached to the constructed message.
use std::fmt;

use hifitime::Duration;
use itertools::Itertools;

#[cfg(feature = "log")]
use log::{error, warn};

use crate::{
    cfg::Config,
    covariance::Covariance,
    epoch::{EpochTime, TimeSystem},
    error::Error,
    header::Header,
    metadata::{MetaData, INTERPOLATION_DEGREE},
    segment::EphemerisSegment,
    state::State,
    version::Version,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
}

/// Where a [Violation] was found
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    Message,
    Header,
    Segment(usize),
    Metadata(usize),
    State { segment: usize, index: usize },
    Covariance { segment: usize, index: usize },
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Message => write!(f, "message"),
            Self::Header => write!(f, "header"),
            Self::Segment(segment) => write!(f, "segment #{}", segment),
            Self::Metadata(segment) => write!(f, "segment #{} metadata", segment),
            Self::State { segment, index } => write!(f, "segment #{} state #{}", segment, index),
            Self::Covariance { segment, index } => {
                write!(f, "segment #{} covariance #{}", segment, index)
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViolationKind {
    #[error("missing {0}")]
    MissingField(&'static str),
    #[error("unknown keyword {0}")]
    UnknownKeyword(String),
    #[error("duplicate keyword {0}")]
    DuplicateKeyword(String),
    #[error("malformed {key} \"{value}\": {reason}")]
    MalformedValue {
        key: String,
        value: String,
        reason: String,
    },
    #[error("{0} is not permitted in OEM v{1}")]
    NotSupportedInVersion(&'static str, Version),
    #[error("START_TIME is after STOP_TIME")]
    StartAfterStop,
    #[error("{0}")]
    UseableRange(&'static str),
    #[error("invalid INTERPOLATION_DEGREE \"{0}\"")]
    InterpolationDegree(String),
    #[error("{found} epoch within a {expected} segment")]
    TimeSystemMismatch {
        expected: TimeSystem,
        found: TimeSystem,
    },
    #[error("epoch {0} does not follow {1}")]
    NonMonotonic(EpochTime, EpochTime),
    #[error("epoch {0} lies outside [{1}, {2}]")]
    EpochOutOfRange(EpochTime, EpochTime, EpochTime),
    #[error("states mix presence and absence of acceleration")]
    MixedAcceleration,
    #[error("{0}x{1} covariance (expecting 6x6 or 9x9)")]
    CovarianceDimension(usize, usize),
    #[error("covariance matrix is not symmetric")]
    CovarianceNotSymmetric,
    #[error("9x9 covariance requires accelerations")]
    CovarianceWithoutAcceleration,
    #[error("segment without state")]
    EmptySegment,
    #[error("message without segment")]
    NoSegment,
    #[error("TIME_SYSTEM {found} differs from {expected}")]
    MixedTimeSystems {
        expected: TimeSystem,
        found: TimeSystem,
    },
    #[error("{key} \"{found}\" differs from \"{expected}\"")]
    ObjectMismatch {
        key: &'static str,
        expected: String,
        found: String,
    },
    #[error("segment starts before the previous one")]
    UnorderedSegments,
    #[error("{0} gap with previous segment")]
    Gap(Duration),
    #[error("{0} overlap with previous segment")]
    Overlap(Duration),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub severity: Severity,
    pub location: Location,
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.severity {
            Severity::Error => write!(f, "{}: {}", self.location, self.kind),
            Severity::Warning => write!(f, "{} (warning): {}", self.location, self.kind),
        }
    }
}

/// Every [Violation] found while building a message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let fatal = self.fatal_count();
        write!(f, "{} error(s)", fatal)?;
        for (nth, violation) in self.violations.iter().enumerate() {
            if nth == 0 {
                write!(f, ": {}", violation)?;
            } else {
                write!(f, "; {}", violation)?;
            }
        }
        Ok(())
    }
}

impl ValidationReport {
    pub(crate) fn error(&mut self, location: Location, kind: ViolationKind) {
        #[cfg(feature = "log")]
        error!("{}: {}", location, kind);
        self.violations.push(Violation {
            severity: Severity::Error,
            location,
            kind,
        });
    }

    pub(crate) fn warning(&mut self, location: Location, kind: ViolationKind) {
        #[cfg(feature = "log")]
        warn!("{}: {}", location, kind);
        self.violations.push(Violation {
            severity: Severity::Warning,
            location,
            kind,
        });
    }

    /// Iterates over every [Violation]
    pub fn iter(&self) -> impl Iterator<Item = &Violation> + '_ {
        self.violations.iter()
    }

    /// Iterates over fatal violations
    pub fn errors(&self) -> impl Iterator<Item = &Violation> + '_ {
        self.violations
            .iter()
            .filter(|v| v.severity == Severity::Error)
    }

    /// Iterates over warnings
    pub fn warnings(&self) -> impl Iterator<Item = &Violation> + '_ {
        self.violations
            .iter()
            .filter(|v| v.severity == Severity::Warning)
    }

    pub fn fatal_count(&self) -> usize {
        self.errors().count()
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal_count() > 0
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Fails with [Error::Validation] when any violation is fatal,
    /// returns the warnings otherwise.
    pub fn into_result(self) -> Result<Vec<Violation>, Error> {
        if self.is_fatal() {
            Err(Error::Validation(self))
        } else {
            Ok(self.violations)
        }
    }
}

fn check_system(
    epoch: &EpochTime,
    expected: &TimeSystem,
    location: &Location,
    report: &mut ValidationReport,
) {
    if epoch.system() != expected {
        report.error(
            location.clone(),
            ViolationKind::TimeSystemMismatch {
                expected: expected.clone(),
                found: epoch.system().clone(),
            },
        );
    }
}

fn check_range(
    epoch: &EpochTime,
    metadata: &MetaData,
    cfg: &Config,
    location: &Location,
    report: &mut ValidationReport,
) {
    let tol = cfg.epoch_tolerance;
    if !epoch.within(&metadata.start_time, &metadata.stop_time, tol) {
        report.error(
            location.clone(),
            ViolationKind::EpochOutOfRange(
                epoch.clone(),
                metadata.start_time.clone(),
                metadata.stop_time.clone(),
            ),
        );
    }
}

pub(crate) fn validate_header(header: &Header, report: &mut ValidationReport) {
    if header.message_id.is_some() && !header.version.supports_message_id() {
        report.error(
            Location::Header,
            ViolationKind::NotSupportedInVersion("MESSAGE_ID", header.version),
        );
    }
    if header.originator.trim().is_empty() {
        report.error(Location::Header, ViolationKind::MissingField("ORIGINATOR"));
    }
    check_system(
        &header.creation_date,
        &TimeSystem::UTC,
        &Location::Header,
        report,
    );
}

pub(crate) fn validate_metadata(
    metadata: &MetaData,
    version: Version,
    cfg: &Config,
    segment: usize,
    report: &mut ValidationReport,
) {
    let location = Location::Metadata(segment);
    let system = &metadata.time_system;

    for (key, value) in [
        ("OBJECT_NAME", &metadata.object_name),
        ("OBJECT_ID", &metadata.object_id),
        ("CENTER_NAME", &metadata.center_name),
        ("REF_FRAME", &metadata.ref_frame),
    ] {
        if value.trim().is_empty() {
            report.error(location.clone(), ViolationKind::MissingField(key));
        }
    }

    for epoch in [
        Some(&metadata.start_time),
        Some(&metadata.stop_time),
        metadata.useable_start_time.as_ref(),
        metadata.useable_stop_time.as_ref(),
        metadata.ref_frame_epoch.as_ref(),
    ]
    .into_iter()
    .flatten()
    {
        check_system(epoch, system, &location, report);
    }

    if metadata.ref_frame_epoch.is_some() && !version.supports_ref_frame_epoch() {
        report.error(
            location.clone(),
            ViolationKind::NotSupportedInVersion("REF_FRAME_EPOCH", version),
        );
    }

    if metadata.start_time > metadata.stop_time {
        report.error(location.clone(), ViolationKind::StartAfterStop);
    }

    match (&metadata.useable_start_time, &metadata.useable_stop_time) {
        (Some(start), Some(stop)) => {
            let tol = cfg.epoch_tolerance;
            if start > stop {
                report.error(
                    location.clone(),
                    ViolationKind::UseableRange(
                        "USEABLE_START_TIME is after USEABLE_STOP_TIME",
                    ),
                );
            }
            if !start.within(&metadata.start_time, &metadata.stop_time, tol)
                || !stop.within(&metadata.start_time, &metadata.stop_time, tol)
            {
                report.error(
                    location.clone(),
                    ViolationKind::UseableRange(
                        "useable range exceeds [START_TIME, STOP_TIME]",
                    ),
                );
            }
        },
        (None, None) => {},
        _ => {
            report.error(
                location.clone(),
                ViolationKind::UseableRange(
                    "USEABLE_START_TIME and USEABLE_STOP_TIME come as a pair",
                ),
            );
        },
    }

    if metadata.interpolation.is_some() {
        match metadata.interpolation_degree {
            None => report.error(
                location.clone(),
                ViolationKind::MissingField(INTERPOLATION_DEGREE),
            ),
            Some(0) => report.error(
                location.clone(),
                ViolationKind::InterpolationDegree("0".to_string()),
            ),
            Some(_) => {},
        }
    }
}

pub(crate) fn validate_states(
    metadata: &MetaData,
    states: &[State],
    version: Version,
    cfg: &Config,
    segment: usize,
    report: &mut ValidationReport,
) {
    if states.is_empty() {
        report.error(Location::Segment(segment), ViolationKind::EmptySegment);
        return;
    }

    let has_accel = states[0].has_accel();

    if states.iter().any(|s| s.has_accel() != has_accel) {
        report.error(Location::Segment(segment), ViolationKind::MixedAcceleration);
    }

    if has_accel && !version.supports_acceleration() {
        report.error(
            Location::Segment(segment),
            ViolationKind::NotSupportedInVersion("acceleration", version),
        );
    }

    for (index, state) in states.iter().enumerate() {
        let location = Location::State { segment, index };
        check_system(&state.epoch, &metadata.time_system, &location, report);
        check_range(&state.epoch, metadata, cfg, &location, report);
    }

    for (index, (prev, next)) in states.iter().tuple_windows().enumerate() {
        if next.epoch <= prev.epoch {
            report.error(
                Location::State {
                    segment,
                    index: index + 1,
                },
                ViolationKind::NonMonotonic(next.epoch.clone(), prev.epoch.clone()),
            );
        }
    }
}

pub(crate) fn validate_covariances(
    metadata: &MetaData,
    covariances: &[Covariance],
    has_accel: bool,
    version: Version,
    cfg: &Config,
    segment: usize,
    report: &mut ValidationReport,
) {
    if !covariances.is_empty() && !version.supports_covariance() {
        report.error(
            Location::Segment(segment),
            ViolationKind::NotSupportedInVersion("covariance", version),
        );
    }

    for (index, covariance) in covariances.iter().enumerate() {
        let location = Location::Covariance { segment, index };
        let (rows, cols) = covariance.matrix.shape();

        if rows != cols || (rows != 6 && rows != 9) {
            report.error(
                location.clone(),
                ViolationKind::CovarianceDimension(rows, cols),
            );
        } else if !covariance.is_symmetric() {
            report.error(location.clone(), ViolationKind::CovarianceNotSymmetric);
        } else if rows == 9 && !has_accel {
            report.error(
                location.clone(),
                ViolationKind::CovarianceWithoutAcceleration,
            );
        }

        check_system(&covariance.epoch, &metadata.time_system, &location, report);
        check_range(&covariance.epoch, metadata, cfg, &location, report);
    }

    for (index, (prev, next)) in covariances.iter().tuple_windows().enumerate() {
        if next.epoch <= prev.epoch {
            report.error(
                Location::Covariance {
                    segment,
                    index: index + 1,
                },
                ViolationKind::NonMonotonic(next.epoch.clone(), prev.epoch.clone()),
            );
        }
    }
}

/// Cross segment rules
pub(crate) fn validate_segments(
    segments: &[EphemerisSegment],
    cfg: &Config,
    report: &mut ValidationReport,
) {
    let Some(first) = segments.first() else {
        report.error(Location::Message, ViolationKind::NoSegment);
        return;
    };

    let first = first.metadata();

    for (index, segment) in segments.iter().enumerate().skip(1) {
        let metadata = segment.metadata();
        let location = Location::Segment(index);

        if metadata.time_system != first.time_system {
            report.error(
                location.clone(),
                ViolationKind::MixedTimeSystems {
                    expected: first.time_system.clone(),
                    found: metadata.time_system.clone(),
                },
            );
        }
        if metadata.object_name != first.object_name {
            report.warning(
                location.clone(),
                ViolationKind::ObjectMismatch {
                    key: "OBJECT_NAME",
                    expected: first.object_name.clone(),
                    found: metadata.object_name.clone(),
                },
            );
        }
        if metadata.object_id != first.object_id {
            report.warning(
                location.clone(),
                ViolationKind::ObjectMismatch {
                    key: "OBJECT_ID",
                    expected: first.object_id.clone(),
                    found: metadata.object_id.clone(),
                },
            );
        }
    }

    for (index, (prev, next)) in segments.iter().tuple_windows().enumerate() {
        let location = Location::Segment(index + 1);
        let (prev, next) = (prev.metadata(), next.metadata());

        if prev.time_system != next.time_system {
            continue;
        }

        if next.start_time < prev.start_time {
            report.error(location, ViolationKind::UnorderedSegments);
            continue;
        }

        let dt = next.useable_start() - prev.useable_stop();
        if dt > Duration::ZERO && dt >= cfg.gap_tolerance {
            report.warning(location, ViolationKind::Gap(dt));
        } else if dt < Duration::ZERO && dt.abs() >= cfg.gap_tolerance {
            report.warning(location, ViolationKind::Overlap(dt.abs()));
        }
    }
}
