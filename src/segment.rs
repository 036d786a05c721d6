//! Ephemeris segments: one metadata block, its states and covariances
use hifitime::Duration;

#[cfg(feature = "log")]
use log::debug;

use crate::{
    cfg::Config,
    covariance::Covariance,
    epoch::EpochTime,
    error::Error,
    interpolation,
    metadata::MetaData,
    records::{RawCovariance, RawSegment, RawState},
    state::State,
    validation::{self, Location, ValidationReport, ViolationKind},
    version::Version,
};

/// [EphemerisSegment] is a contiguous time ordered series of [State]s
/// (and optional [Covariance]s) described by a single [MetaData].
/// It is validated at construction and immutable afterwards.
#[derive(Debug, Clone)]
pub struct EphemerisSegment {
    metadata: MetaData,
    states: Vec<State>,
    covariances: Vec<Covariance>,
    data_comments: Vec<String>,
    covariance_comments: Vec<String>,
    cfg: Config,
}

impl PartialEq for EphemerisSegment {
    fn eq(&self, rhs: &Self) -> bool {
        self.metadata == rhs.metadata
            && self.states == rhs.states
            && self.covariances == rhs.covariances
            && self.data_comments == rhs.data_comments
            && self.covariance_comments == rhs.covariance_comments
    }
}

fn malformed(key: &str, value: &str, reason: String) -> ViolationKind {
    ViolationKind::MalformedValue {
        key: key.to_string(),
        value: value.to_string(),
        reason,
    }
}

impl EphemerisSegment {
    /// Builds a new [EphemerisSegment], validated with default [Config]
    /// and the latest revision rules.
    pub fn new(
        metadata: MetaData,
        states: Vec<State>,
        covariances: Vec<Covariance>,
    ) -> Result<Self, Error> {
        Self::new_with_config(metadata, states, covariances, Config::default())
    }

    /// Builds a new [EphemerisSegment] with given [Config]
    pub fn new_with_config(
        metadata: MetaData,
        states: Vec<State>,
        covariances: Vec<Covariance>,
        cfg: Config,
    ) -> Result<Self, Error> {
        let mut report = ValidationReport::default();
        let segment = Self {
            metadata,
            states,
            covariances,
            data_comments: Vec::new(),
            covariance_comments: Vec::new(),
            cfg,
        };
        segment.validate(Version::V3, 0, &mut report);
        report.into_result()?;
        Ok(segment)
    }

    /// Copies and returns [EphemerisSegment] with one more data comment
    pub fn with_comment(&self, comment: &str) -> Self {
        let mut s = self.clone();
        s.data_comments.push(comment.to_string());
        s
    }

    /// Copies and returns [EphemerisSegment] with one more [State],
    /// which must follow every existing state.
    pub fn with_state(&self, state: State) -> Result<Self, Error> {
        let mut states = self.states.clone();
        states.push(state);
        self.rebuild(self.metadata.clone(), states, self.covariances.clone())
    }

    /// Copies and returns [EphemerisSegment] with one more [Covariance],
    /// which must follow every existing covariance.
    pub fn with_covariance(&self, covariance: Covariance) -> Result<Self, Error> {
        let mut covariances = self.covariances.clone();
        covariances.push(covariance);
        self.rebuild(self.metadata.clone(), self.states.clone(), covariances)
    }

    /// Copies and returns [EphemerisSegment] with updated [Config]
    pub fn with_config(&self, cfg: Config) -> Self {
        let mut s = self.clone();
        s.cfg = cfg;
        s
    }

    fn rebuild(
        &self,
        metadata: MetaData,
        states: Vec<State>,
        covariances: Vec<Covariance>,
    ) -> Result<Self, Error> {
        let mut report = ValidationReport::default();
        let segment = Self {
            metadata,
            states,
            covariances,
            data_comments: self.data_comments.clone(),
            covariance_comments: self.covariance_comments.clone(),
            cfg: self.cfg,
        };
        segment.validate(Version::V3, 0, &mut report);
        report.into_result()?;
        Ok(segment)
    }

    /// Runs every segment level rule
    pub(crate) fn validate(&self, version: Version, index: usize, report: &mut ValidationReport) {
        validation::validate_metadata(&self.metadata, version, &self.cfg, index, report);
        validation::validate_states(
            &self.metadata,
            &self.states,
            version,
            &self.cfg,
            index,
            report,
        );
        validation::validate_covariances(
            &self.metadata,
            &self.covariances,
            self.has_accel(),
            version,
            &self.cfg,
            index,
            report,
        );
    }

    /// Interprets a raw segment. Every problem is reported,
    /// the segment is only returned when none was fatal.
    pub(crate) fn from_raw(
        raw: &RawSegment,
        version: Version,
        cfg: Config,
        index: usize,
        report: &mut ValidationReport,
    ) -> Option<Self> {
        let fatal = report.fatal_count();

        let metadata = MetaData::from_raw(&raw.metadata, index, report)?;
        let system = &metadata.time_system;

        let mut states = Vec::with_capacity(raw.states.len());
        for (nth, RawState { epoch, values }) in raw.states.iter().enumerate() {
            let location = Location::State {
                segment: index,
                index: nth,
            };
            match EpochTime::parse(epoch, system.clone()) {
                Ok(t) => match State::from_slice(t, values) {
                    Some(state) => states.push(state),
                    None => report.error(
                        location,
                        malformed(
                            "state vector",
                            epoch,
                            format!("{} components, expecting 6 or 9", values.len()),
                        ),
                    ),
                },
                Err(e) => report.error(location, malformed("EPOCH", epoch, e.to_string())),
            }
        }

        let mut covariances = Vec::with_capacity(raw.covariances.len());
        for (
            nth,
            RawCovariance {
                epoch,
                frame,
                values,
            },
        ) in raw.covariances.iter().enumerate()
        {
            let location = Location::Covariance {
                segment: index,
                index: nth,
            };
            match EpochTime::parse(epoch, system.clone()) {
                Ok(epoch) => {
                    match Covariance::from_lower_triangle(epoch, frame.clone(), values) {
                        Some(covariance) => covariances.push(covariance),
                        None => report.error(
                            location,
                            malformed(
                                "covariance",
                                &format!("{} terms", values.len()),
                                "expecting 21 or 45 terms".to_string(),
                            ),
                        ),
                    }
                },
                Err(e) => report.error(location, malformed("EPOCH", epoch, e.to_string())),
            }
        }

        let segment = Self {
            metadata,
            states,
            covariances,
            data_comments: raw.data_comments.clone(),
            covariance_comments: raw.covariance_comments.clone(),
            cfg,
        };

        segment.validate(version, index, report);

        if report.fatal_count() > fatal {
            None
        } else {
            Some(segment)
        }
    }

    pub(crate) fn to_raw(&self) -> RawSegment {
        RawSegment {
            metadata: self.metadata.to_raw(),
            data_comments: self.data_comments.clone(),
            states: self
                .states
                .iter()
                .map(|state| RawState {
                    epoch: state.epoch.to_string(),
                    values: state.vector(),
                })
                .collect(),
            covariance_comments: self.covariance_comments.clone(),
            covariances: self
                .covariances
                .iter()
                .map(|covariance| RawCovariance {
                    epoch: covariance.epoch.to_string(),
                    frame: covariance.frame.clone(),
                    values: covariance.lower_triangle(),
                })
                .collect(),
        }
    }

    pub fn metadata(&self) -> &MetaData {
        &self.metadata
    }

    /// Tabulated states
    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn covariances(&self) -> &[Covariance] {
        &self.covariances
    }

    pub fn comments(&self) -> &[String] {
        &self.data_comments
    }

    pub fn covariance_comments(&self) -> &[String] {
        &self.covariance_comments
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// True if states carry accelerations
    pub fn has_accel(&self) -> bool {
        self.states.first().map(|s| s.has_accel()).unwrap_or(false)
    }

    pub fn has_covariance(&self) -> bool {
        !self.covariances.is_empty()
    }

    /// Useable time range: (useable start, useable stop)
    pub fn span(&self) -> (&EpochTime, &EpochTime) {
        (self.metadata.useable_start(), self.metadata.useable_stop())
    }

    /// True if `epoch` lies within the useable time range
    pub fn contains(&self, epoch: &EpochTime) -> bool {
        let (start, stop) = self.span();
        epoch.within(start, stop, self.cfg.epoch_tolerance)
    }

    fn check_system(&self, epoch: &EpochTime) -> Result<(), Error> {
        if *epoch.system() != self.metadata.time_system {
            Err(Error::UnsupportedTimeSystem {
                expected: self.metadata.time_system.clone(),
                found: epoch.system().clone(),
            })
        } else {
            Ok(())
        }
    }

    /// Returns [State] at `epoch`: either the tabulated state
    /// (within tolerance), or interpolated with the method
    /// and degree the metadata describes.
    pub fn state_at(&self, epoch: &EpochTime) -> Result<State, Error> {
        self.check_system(epoch)?;

        if !self.cfg.extrapolation && !self.contains(epoch) {
            return Err(Error::OutOfBounds(epoch.clone()));
        }

        let tol = self.cfg.epoch_tolerance;
        let idx = self.states.partition_point(|s| s.epoch < *epoch);

        for candidate in [idx.checked_sub(1), Some(idx)].into_iter().flatten() {
            if let Some(state) = self.states.get(candidate) {
                if state.epoch.approx_eq(epoch, tol) {
                    return Ok(state.clone());
                }
            }
        }

        let method = self.metadata.interpolation.as_ref().ok_or_else(|| {
            Error::InterpolationUnsupported(format!(
                "no interpolation method and {} is not tabulated",
                epoch
            ))
        })?;

        let degree = self.metadata.interpolation_degree.unwrap_or(0);

        interpolation::interpolate(&self.states, epoch, method, degree)
    }

    /// Iterates evenly spaced states over the useable time range,
    /// starting at useable start. The last step is clipped to useable stop.
    pub fn steps(&self, interval: Duration) -> Result<StepIter<'_>, Error> {
        if interval <= Duration::ZERO {
            return Err(Error::InvalidInterval(interval));
        }
        Ok(StepIter::new(self, interval))
    }

    /// Returns the [Covariance] closest to `epoch` (earliest on ties).
    /// With [Config::strict_covariance], only an exact match is returned.
    pub fn covariance_at(&self, epoch: &EpochTime) -> Result<&Covariance, Error> {
        self.check_system(epoch)?;

        let tol = self.cfg.epoch_tolerance;

        if self.covariances.is_empty()
            || !epoch.within(&self.metadata.start_time, &self.metadata.stop_time, tol)
        {
            return Err(Error::OutOfBounds(epoch.clone()));
        }

        let idx = self.covariances.partition_point(|c| c.epoch < *epoch);

        let nearest = [idx.checked_sub(1), Some(idx)]
            .into_iter()
            .flatten()
            .filter_map(|i| self.covariances.get(i))
            .min_by_key(|c| (&c.epoch - epoch).abs())
            .ok_or(Error::OutOfBounds(epoch.clone()))?;

        if self.cfg.strict_covariance && !nearest.epoch.approx_eq(epoch, tol) {
            return Err(Error::OutOfBounds(epoch.clone()));
        }

        Ok(nearest)
    }

    /// Returns a new [EphemerisSegment], resampled at `interval`
    /// over the useable time range.
    pub fn resample(&self, interval: Duration) -> Result<Self, Error> {
        let states = self.steps(interval)?.collect::<Result<Vec<_>, _>>()?;

        #[cfg(feature = "log")]
        debug!(
            "{}: resampled {} states into {}",
            self.metadata.object_name,
            self.states.len(),
            states.len()
        );

        let (start, stop) = self.span();
        let tol = self.cfg.epoch_tolerance;

        let mut metadata = self.metadata.clone();
        metadata.start_time = start.clone();
        metadata.stop_time = stop.clone();

        let covariances = self
            .covariances
            .iter()
            .filter(|c| c.epoch.within(start, stop, tol))
            .cloned()
            .collect();

        self.rebuild(metadata, states, covariances)
    }

    /// Compares two segments: same metadata and comments, and
    /// states and covariances within `tolerance`.
    pub fn approx_eq(&self, rhs: &Self, tolerance: f64) -> bool {
        self.metadata == rhs.metadata
            && self.states.len() == rhs.states.len()
            && self.covariances.len() == rhs.covariances.len()
            && self
                .states
                .iter()
                .zip(rhs.states.iter())
                .all(|(a, b)| a.approx_eq(b, tolerance))
            && self
                .covariances
                .iter()
                .zip(rhs.covariances.iter())
                .all(|(a, b)| a.approx_eq(b, tolerance))
    }
}

/// Evenly spaced epochs over [start, stop], last step clipped to stop
#[derive(Debug, Clone)]
pub(crate) struct Epochs {
    next: Option<EpochTime>,
    stop: EpochTime,
    interval: Duration,
    tolerance: Duration,
}

impl Epochs {
    pub(crate) fn new(
        start: &EpochTime,
        stop: &EpochTime,
        interval: Duration,
        tolerance: Duration,
    ) -> Self {
        Self {
            next: Some(start.clone()),
            stop: stop.clone(),
            interval,
            tolerance,
        }
    }
}

impl Iterator for Epochs {
    type Item = EpochTime;
    fn next(&mut self) -> Option<Self::Item> {
        let epoch = self.next.take()?;
        if epoch < self.stop {
            let following = &epoch + self.interval;
            if following >= &self.stop - self.tolerance {
                self.next = Some(self.stop.clone());
            } else {
                self.next = Some(following);
            }
        }
        Some(epoch)
    }
}

/// Lazy iterator over evenly spaced states of an [EphemerisSegment].
/// It can be recreated at will: nothing is cached.
pub struct StepIter<'a> {
    segment: &'a EphemerisSegment,
    epochs: Epochs,
}

impl<'a> StepIter<'a> {
    pub(crate) fn new(segment: &'a EphemerisSegment, interval: Duration) -> Self {
        let (start, stop) = segment.span();
        Self {
            segment,
            epochs: Epochs::new(start, stop, interval, segment.cfg.epoch_tolerance),
        }
    }
}

impl Iterator for StepIter<'_> {
    type Item = Result<State, Error>;
    fn next(&mut self) -> Option<Self::Item> {
        let epoch = self.epochs.next()?;
        Some(self.segment.state_at(&epoch))
    }
}
