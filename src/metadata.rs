//! Segment metadata
use std::str::FromStr;

use crate::{
    epoch::{EpochTime, TimeSystem},
    records::RawSection,
    validation::{Location, ValidationReport, ViolationKind},
};

pub(crate) const OBJECT_NAME: &str = "OBJECT_NAME";
pub(crate) const OBJECT_ID: &str = "OBJECT_ID";
pub(crate) const CENTER_NAME: &str = "CENTER_NAME";
pub(crate) const REF_FRAME: &str = "REF_FRAME";
pub(crate) const REF_FRAME_EPOCH: &str = "REF_FRAME_EPOCH";
pub(crate) const TIME_SYSTEM: &str = "TIME_SYSTEM";
pub(crate) const START_TIME: &str = "START_TIME";
pub(crate) const USEABLE_START_TIME: &str = "USEABLE_START_TIME";
pub(crate) const USEABLE_STOP_TIME: &str = "USEABLE_STOP_TIME";
pub(crate) const STOP_TIME: &str = "STOP_TIME";
pub(crate) const INTERPOLATION: &str = "INTERPOLATION";
pub(crate) const INTERPOLATION_DEGREE: &str = "INTERPOLATION_DEGREE";

/// Metadata keywords, in production order
pub(crate) const KEYWORDS: [&str; 12] = [
    OBJECT_NAME,
    OBJECT_ID,
    CENTER_NAME,
    REF_FRAME,
    REF_FRAME_EPOCH,
    TIME_SYSTEM,
    START_TIME,
    USEABLE_START_TIME,
    USEABLE_STOP_TIME,
    STOP_TIME,
    INTERPOLATION,
    INTERPOLATION_DEGREE,
];

/// Interpolation method recommended by the data provider
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Interpolation {
    Lagrange,
    Hermite,
    /// Lagrange of degree 1
    Linear,
    /// Explicit absence of interpolation
    None,
    /// Unknown method, preserved as is
    Other(String),
}

impl std::fmt::Display for Interpolation {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Lagrange => f.write_str("LAGRANGE"),
            Self::Hermite => f.write_str("HERMITE"),
            Self::Linear => f.write_str("LINEAR"),
            Self::None => f.write_str("NONE"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

impl FromStr for Interpolation {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.to_uppercase().as_str() {
            "LAGRANGE" => Self::Lagrange,
            "HERMITE" => Self::Hermite,
            "LINEAR" => Self::Linear,
            "NONE" => Self::None,
            _ => Self::Other(s.to_string()),
        })
    }
}

/// [MetaData] describes one segment. Every epoch it holds
/// is expressed in its [TimeSystem].
#[derive(Debug, Clone, PartialEq)]
pub struct MetaData {
    pub object_name: String,
    /// International designator, preferably
    pub object_id: String,
    pub center_name: String,
    pub ref_frame: String,
    /// Epoch of the reference frame, if not intrinsic to it
    pub ref_frame_epoch: Option<EpochTime>,
    pub time_system: TimeSystem,
    pub start_time: EpochTime,
    pub stop_time: EpochTime,
    pub useable_start_time: Option<EpochTime>,
    pub useable_stop_time: Option<EpochTime>,
    pub interpolation: Option<Interpolation>,
    pub interpolation_degree: Option<u8>,
    pub comments: Vec<String>,
}

fn required<'a>(
    raw: &'a RawSection,
    key: &'static str,
    location: &Location,
    report: &mut ValidationReport,
) -> Option<&'a str> {
    match raw.get(key).map(|v| v.trim()) {
        Some(value) if !value.is_empty() => Some(value),
        _ => {
            report.error(location.clone(), ViolationKind::MissingField(key));
            None
        },
    }
}

fn epoch(
    value: &str,
    key: &str,
    system: &TimeSystem,
    location: &Location,
    report: &mut ValidationReport,
) -> Option<EpochTime> {
    match EpochTime::parse(value, system.clone()) {
        Ok(epoch) => Some(epoch),
        Err(e) => {
            report.error(
                location.clone(),
                ViolationKind::MalformedValue {
                    key: key.to_string(),
                    value: value.to_string(),
                    reason: e.to_string(),
                },
            );
            None
        },
    }
}

impl MetaData {
    /// Builds [MetaData] with all mandatory fields
    pub fn new(
        object_name: &str,
        object_id: &str,
        center_name: &str,
        ref_frame: &str,
        start_time: EpochTime,
        stop_time: EpochTime,
    ) -> Self {
        Self {
            object_name: object_name.to_string(),
            object_id: object_id.to_string(),
            center_name: center_name.to_string(),
            ref_frame: ref_frame.to_string(),
            ref_frame_epoch: None,
            time_system: start_time.system().clone(),
            start_time,
            stop_time,
            useable_start_time: None,
            useable_stop_time: None,
            interpolation: None,
            interpolation_degree: None,
            comments: Vec::new(),
        }
    }

    /// Copies and returns [MetaData] with useable time range
    pub fn with_useable_range(&self, start: EpochTime, stop: EpochTime) -> Self {
        let mut s = self.clone();
        s.useable_start_time = Some(start);
        s.useable_stop_time = Some(stop);
        s
    }

    /// Copies and returns [MetaData] with interpolation method and degree
    pub fn with_interpolation(&self, method: Interpolation, degree: u8) -> Self {
        let mut s = self.clone();
        s.interpolation = Some(method);
        s.interpolation_degree = Some(degree);
        s
    }

    /// Copies and returns [MetaData] with reference frame epoch
    pub fn with_ref_frame_epoch(&self, epoch: EpochTime) -> Self {
        let mut s = self.clone();
        s.ref_frame_epoch = Some(epoch);
        s
    }

    /// Copies and returns [MetaData] with one more comment
    pub fn with_comment(&self, comment: &str) -> Self {
        let mut s = self.clone();
        s.comments.push(comment.to_string());
        s
    }

    /// Start of the useable range (START_TIME by default)
    pub fn useable_start(&self) -> &EpochTime {
        self.useable_start_time.as_ref().unwrap_or(&self.start_time)
    }

    /// End of the useable range (STOP_TIME by default)
    pub fn useable_stop(&self) -> &EpochTime {
        self.useable_stop_time.as_ref().unwrap_or(&self.stop_time)
    }

    /// Interprets a metadata section. Every problem is reported,
    /// [MetaData] is only returned when none was fatal.
    pub(crate) fn from_raw(
        raw: &RawSection,
        segment: usize,
        report: &mut ValidationReport,
    ) -> Option<Self> {
        let location = Location::Metadata(segment);
        let fatal = report.fatal_count();

        for (key, _) in raw.fields.iter() {
            if !KEYWORDS.contains(&key.as_str()) {
                report.error(location.clone(), ViolationKind::UnknownKeyword(key.clone()));
            }
        }

        for key in raw.duplicates() {
            report.error(
                location.clone(),
                ViolationKind::DuplicateKeyword(key.to_string()),
            );
        }

        let object_name = required(raw, OBJECT_NAME, &location, report);
        let object_id = required(raw, OBJECT_ID, &location, report);
        let center_name = required(raw, CENTER_NAME, &location, report);
        let ref_frame = required(raw, REF_FRAME, &location, report);

        let time_system = required(raw, TIME_SYSTEM, &location, report)
            .map(|s| TimeSystem::from_str(s).unwrap_or_default());

        let start_time = required(raw, START_TIME, &location, report);
        let stop_time = required(raw, STOP_TIME, &location, report);

        let interpolation = raw
            .get(INTERPOLATION)
            .map(|s| Interpolation::from_str(s).unwrap_or(Interpolation::None));

        let interpolation_degree = match raw.get(INTERPOLATION_DEGREE) {
            Some(value) => match value.trim().parse::<f64>() {
                Ok(degree) if degree.fract() == 0.0 && (1.0..=255.0).contains(&degree) => {
                    Some(degree as u8)
                },
                _ => {
                    report.error(
                        location.clone(),
                        ViolationKind::InterpolationDegree(value.to_string()),
                    );
                    None
                },
            },
            None => None,
        };

        let time_system = time_system?;

        let mut parse = |key: &str| {
            raw.get(key)
                .and_then(|value| epoch(value, key, &time_system, &location, report))
        };

        let ref_frame_epoch = parse(REF_FRAME_EPOCH);
        let useable_start_time = parse(USEABLE_START_TIME);
        let useable_stop_time = parse(USEABLE_STOP_TIME);

        let start_time = epoch(start_time?, START_TIME, &time_system, &location, report);
        let stop_time = epoch(stop_time?, STOP_TIME, &time_system, &location, report);

        if report.fatal_count() > fatal {
            return None;
        }

        Some(Self {
            object_name: object_name?.to_string(),
            object_id: object_id?.to_string(),
            center_name: center_name?.to_string(),
            ref_frame: ref_frame?.to_string(),
            ref_frame_epoch,
            time_system,
            start_time: start_time?,
            stop_time: stop_time?,
            useable_start_time,
            useable_stop_time,
            interpolation,
            interpolation_degree,
            comments: raw.comments.clone(),
        })
    }

    pub(crate) fn to_raw(&self) -> RawSection {
        let mut raw = RawSection {
            comments: self.comments.clone(),
            fields: Vec::with_capacity(KEYWORDS.len()),
        };
        raw.push(OBJECT_NAME, &self.object_name);
        raw.push(OBJECT_ID, &self.object_id);
        raw.push(CENTER_NAME, &self.center_name);
        raw.push(REF_FRAME, &self.ref_frame);
        raw.push_opt(
            REF_FRAME_EPOCH,
            self.ref_frame_epoch.as_ref().map(|t| t.to_string()),
        );
        raw.push(TIME_SYSTEM, &self.time_system.to_string());
        raw.push(START_TIME, &self.start_time.to_string());
        raw.push_opt(
            USEABLE_START_TIME,
            self.useable_start_time.as_ref().map(|t| t.to_string()),
        );
        raw.push_opt(
            USEABLE_STOP_TIME,
            self.useable_stop_time.as_ref().map(|t| t.to_string()),
        );
        raw.push(STOP_TIME, &self.stop_time.to_string());
        raw.push_opt(
            INTERPOLATION,
            self.interpolation.as_ref().map(|i| i.to_string()),
        );
        raw.push_opt(
            INTERPOLATION_DEGREE,
            self.interpolation_degree.map(|d| d.to_string()),
        );
        raw
    }
}
