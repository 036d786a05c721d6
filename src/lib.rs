#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod cfg;
pub mod compare;
pub mod covariance;
pub mod epoch;
pub mod error;
pub mod format;
pub mod header;
pub mod interpolation;
pub mod kvn;
pub mod metadata;
pub mod reader;
pub mod records;
pub mod segment;
pub mod state;
pub mod validation;
pub mod version;
pub mod writer;
pub mod xml;

#[cfg(test)]
mod tests;

use std::{
    io::{self, Read, Write},
    path::Path,
    str::FromStr,
};

#[cfg(feature = "flate2")]
use std::fs::File;

use hifitime::Duration;

#[cfg(feature = "log")]
use log::debug;

use crate::{
    cfg::Config,
    compare::EphemerisCompare,
    covariance::Covariance,
    epoch::EpochTime,
    error::Error,
    format::FileFormat,
    header::Header,
    reader::BufferedReader,
    records::RawMessage,
    segment::{EphemerisSegment, StepIter},
    state::State,
    validation::{Location, ValidationReport, Violation, ViolationKind},
    version::Version,
    writer::BufferedWriter,
};

/// Package to include all basic structures
pub mod prelude {
    pub use crate::{
        cfg::Config,
        compare::{EphemerisCompare, SegmentCompare, StateCompare},
        covariance::Covariance,
        epoch::{EpochTime, TimeSystem},
        error::{Error, FormatError, ParsingError},
        format::FileFormat,
        header::Header,
        metadata::{Interpolation, MetaData},
        segment::{EphemerisSegment, StepIter},
        state::State,
        validation::{Location, Severity, ValidationReport, Violation, ViolationKind},
        version::Version,
        MessageStepIter, OrbitEphemerisMessage, OEM,
    };

    // pub re-export
    pub use hifitime::{Duration, Epoch, TimeScale, Unit};
}

/// [OrbitEphemerisMessage] is one [Header] followed by time ordered
/// [EphemerisSegment]s. It is fully validated at construction:
/// fatal problems prevent construction, non fatal ones are kept
/// and exposed by [Self::warnings].
#[derive(Debug, Clone)]
pub struct OrbitEphemerisMessage {
    header: Header,
    segments: Vec<EphemerisSegment>,
    warnings: Vec<Violation>,
    cfg: Config,
}

/// Shorter name for [OrbitEphemerisMessage]
pub type OEM = OrbitEphemerisMessage;

impl PartialEq for OrbitEphemerisMessage {
    fn eq(&self, rhs: &Self) -> bool {
        self.header == rhs.header && self.segments == rhs.segments
    }
}

impl OrbitEphemerisMessage {
    /// Builds a new [OrbitEphemerisMessage] from a [Header] and its segments,
    /// validated against the header revision, with default [Config].
    pub fn new(header: Header, segments: Vec<EphemerisSegment>) -> Result<Self, Error> {
        Self::new_with_config(header, segments, Config::default())
    }

    /// Builds a new [OrbitEphemerisMessage] with given [Config],
    /// which applies to every segment.
    pub fn new_with_config(
        header: Header,
        segments: Vec<EphemerisSegment>,
        cfg: Config,
    ) -> Result<Self, Error> {
        let mut report = ValidationReport::default();

        crate::validation::validate_header(&header, &mut report);

        let segments = segments
            .iter()
            .map(|segment| segment.with_config(cfg))
            .collect::<Vec<_>>();

        for (index, segment) in segments.iter().enumerate() {
            segment.validate(header.version, index, &mut report);
        }

        crate::validation::validate_segments(&segments, &cfg, &mut report);

        let warnings = report.into_result()?;

        Ok(Self {
            header,
            segments,
            warnings,
            cfg,
        })
    }

    /// Interprets [RawMessage] (from any tokenizer) into a validated
    /// [OrbitEphemerisMessage]. Every violation is collected before failing.
    pub fn from_records(raw: &RawMessage, cfg: Config) -> Result<Self, Error> {
        let mut report = ValidationReport::default();

        let version = match Version::from_str(&raw.version) {
            Ok(version) => version,
            Err(e) => {
                report.error(
                    Location::Header,
                    ViolationKind::MalformedValue {
                        key: kvn::VERSION_KEY.to_string(),
                        value: raw.version.clone(),
                        reason: e.to_string(),
                    },
                );
                return Err(Error::Validation(report));
            },
        };

        let header = Header::from_raw(version, &raw.header, &mut report);

        if let Some(header) = &header {
            crate::validation::validate_header(header, &mut report);
        }

        let segments = raw
            .segments
            .iter()
            .enumerate()
            .filter_map(|(index, segment)| {
                EphemerisSegment::from_raw(segment, version, cfg, index, &mut report)
            })
            .collect::<Vec<_>>();

        // cross segment rules only make sense on a complete series
        if segments.len() == raw.segments.len() {
            crate::validation::validate_segments(&segments, &cfg, &mut report);
        }

        match header {
            Some(header) if !report.is_fatal() => {
                #[cfg(feature = "log")]
                debug!(
                    "oem v{}: {} segment(s), {} warning(s)",
                    version,
                    segments.len(),
                    report.len()
                );
                Ok(Self {
                    header,
                    segments,
                    warnings: report.into_result()?,
                    cfg,
                })
            },
            _ => Err(Error::Validation(report)),
        }
    }

    /// Converts [OrbitEphemerisMessage] to format neutral [RawMessage]
    pub fn to_records(&self) -> RawMessage {
        RawMessage {
            version: self.header.version.to_string(),
            header: self.header.to_raw(),
            segments: self.segments.iter().map(|s| s.to_raw()).collect(),
        }
    }

    /// Parses [OrbitEphemerisMessage] from string content,
    /// format being detected from the content itself.
    pub fn parse(content: &str) -> Result<Self, Error> {
        Self::parse_with_config(content, Config::default())
    }

    /// Parses [OrbitEphemerisMessage] from string content, with given [Config]
    pub fn parse_with_config(content: &str, cfg: Config) -> Result<Self, Error> {
        let format = FileFormat::detect(content);
        let raw = format.parse(content)?;
        Self::from_records(&raw, cfg)
    }

    /// Parses [OrbitEphemerisMessage] from any [Read]able interface,
    /// in given [FileFormat].
    pub fn from_reader<R: Read>(mut reader: R, format: FileFormat) -> Result<Self, Error> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        let raw = format.parse(&content)?;
        Self::from_records(&raw, Config::default())
    }

    /// Parses [OrbitEphemerisMessage] from local file, either KVN or XML.
    /// ```
    /// use oem::prelude::*;
    /// let oem = OEM::from_file("test_resources/OEM/valid/v2_example.oem")
    ///     .unwrap();
    /// assert_eq!(oem.version(), Version::V2);
    /// assert_eq!(oem.segments().len(), 1);
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::from_file_with_config(path, Config::default())
    }

    /// Parses [OrbitEphemerisMessage] from local file, with given [Config].
    /// Files terminated by .gz are decompressed on the fly, when
    /// the `flate2` feature is enabled.
    pub fn from_file_with_config<P: AsRef<Path>>(path: P, cfg: Config) -> Result<Self, Error> {
        let path = path.as_ref();

        #[cfg(feature = "flate2")]
        {
            if path.extension().map(|ext| ext == "gz").unwrap_or(false) {
                let content = BufferedReader::gzip(path)?.read_content()?;
                return Self::parse_with_config(&content, cfg);
            }
        }

        let content = BufferedReader::plain(path)?.read_content()?;
        Self::parse_with_config(&content, cfg)
    }

    /// Parses [OrbitEphemerisMessage] from gzip compressed local file.
    #[cfg(feature = "flate2")]
    #[cfg_attr(docsrs, doc(cfg(feature = "flate2")))]
    pub fn from_gzip_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let content = BufferedReader::gzip(path)?.read_content()?;
        Self::parse(&content)
    }

    /// Formats [OrbitEphemerisMessage] into any [Write]able interface
    pub fn to_writer<W: Write>(&self, w: &mut W, format: FileFormat) -> Result<(), Error> {
        format.format(&self.to_records(), w)
    }

    /// Formats [OrbitEphemerisMessage] as a string
    pub fn to_string_as(&self, format: FileFormat) -> Result<String, Error> {
        let mut buf = Vec::<u8>::new();
        self.to_writer(&mut buf, format)?;
        String::from_utf8(buf).map_err(|e| Error::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
    }

    /// Dumps [OrbitEphemerisMessage] into local file, in given [FileFormat].
    /// This is the mirror operation of [Self::from_file].
    pub fn to_file<P: AsRef<Path>>(&self, path: P, format: FileFormat) -> Result<(), Error> {
        let mut writer = BufferedWriter::create(path)?;
        self.to_writer(&mut writer, format)?;
        writer.finish()?;
        Ok(())
    }

    /// Dumps [OrbitEphemerisMessage] into local file,
    /// format being deduced from the file extension (.xml or KVN otherwise).
    pub fn save_as<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| FileFormat::from_str(ext).ok())
            .unwrap_or_default();
        self.to_file(path, format)
    }

    /// Dumps and gzip encodes [OrbitEphemerisMessage] into local file,
    /// with desired compression level (0-9).
    /// This is the mirror operation of [Self::from_gzip_file].
    #[cfg(feature = "flate2")]
    #[cfg_attr(docsrs, doc(cfg(feature = "flate2")))]
    pub fn to_gzip_file<P: AsRef<Path>>(
        &self,
        path: P,
        format: FileFormat,
        compression_level: u32,
    ) -> Result<(), Error> {
        let fd = File::create(path)?;
        let mut writer = BufferedWriter::gzip(fd, compression_level);
        self.to_writer(&mut writer, format)?;
        writer.finish()?;
        Ok(())
    }

    /// Reads `src` (any format) and writes it to `dst` in given [FileFormat]
    pub fn convert<P: AsRef<Path>, Q: AsRef<Path>>(
        src: P,
        dst: Q,
        format: FileFormat,
    ) -> Result<(), Error> {
        let oem = Self::from_file(src)?;
        oem.to_file(dst, format)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn version(&self) -> Version {
        self.header.version
    }

    /// Returns every [EphemerisSegment], in chronological order
    pub fn segments(&self) -> &[EphemerisSegment] {
        &self.segments
    }

    /// Non fatal violations found at construction
    pub fn warnings(&self) -> &[Violation] {
        &self.warnings
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Copies and returns [OrbitEphemerisMessage] with updated [Config],
    /// applied to every segment. Validation is not replayed.
    pub fn with_config(&self, cfg: Config) -> Self {
        let mut s = self.clone();
        s.segments = s.segments.iter().map(|segment| segment.with_config(cfg)).collect();
        s.cfg = cfg;
        s
    }

    /// Tabulated states of a single segment message.
    /// Fails with [Error::MultiSegment] otherwise.
    pub fn states(&self) -> Result<&[State], Error> {
        match self.segments.as_slice() {
            [segment] => Ok(segment.states()),
            segments => Err(Error::MultiSegment(segments.len())),
        }
    }

    /// Covariances of a single segment message.
    /// Fails with [Error::MultiSegment] otherwise.
    pub fn covariances(&self) -> Result<&[Covariance], Error> {
        match self.segments.as_slice() {
            [segment] => Ok(segment.covariances()),
            segments => Err(Error::MultiSegment(segments.len())),
        }
    }

    /// Iterates over every tabulated [State], segment after segment
    pub fn all_states(&self) -> impl Iterator<Item = &State> + '_ {
        self.segments.iter().flat_map(|segment| segment.states().iter())
    }

    /// Returns (earliest useable start, latest useable stop).
    /// A message always holds at least one segment.
    pub fn span(&self) -> (&EpochTime, &EpochTime) {
        let start = self.segments[0].span().0;
        let stop = self
            .segments
            .iter()
            .map(|segment| segment.span().1)
            .max()
            .unwrap_or(self.segments[0].span().1);
        (start, stop)
    }

    /// True if one segment covers `epoch`
    pub fn contains(&self, epoch: &EpochTime) -> bool {
        self.segments.iter().any(|segment| segment.contains(epoch))
    }

    /// Returns [State] at `epoch`, from the segment whose useable range
    /// covers it. When several segments cover `epoch` (shared boundary,
    /// overlap), the earlier one in the message is used.
    pub fn sample_at(&self, epoch: &EpochTime) -> Result<State, Error> {
        let first = &self.segments[0];
        let system = &first.metadata().time_system;

        if epoch.system() != system {
            return Err(Error::UnsupportedTimeSystem {
                expected: system.clone(),
                found: epoch.system().clone(),
            });
        }

        // useable ranges may nest or overlap and are not sorted:
        // the first covering segment, in message order, wins
        if let Some(segment) = self.segments.iter().find(|segment| segment.contains(epoch)) {
            return segment.state_at(epoch);
        }

        if self.cfg.extrapolation {
            let (start, stop) = self.span();
            if epoch < start {
                return first.state_at(epoch);
            }
            if epoch > stop {
                if let Some(last) = self.segments.last() {
                    return last.state_at(epoch);
                }
            }
        }

        Err(Error::NoMatchingSegment(epoch.clone()))
    }

    /// Iterates evenly spaced states over every segment.
    /// The cadence restarts at each segment useable start.
    pub fn steps(&self, interval: Duration) -> Result<MessageStepIter<'_>, Error> {
        if interval <= Duration::ZERO {
            return Err(Error::InvalidInterval(interval));
        }
        Ok(MessageStepIter {
            segments: self.segments.iter(),
            current: None,
            interval,
        })
    }

    /// Returns a new [OrbitEphemerisMessage] where each segment
    /// is resampled at `interval`.
    pub fn resample(&self, interval: Duration) -> Result<Self, Error> {
        let segments = self
            .segments
            .iter()
            .map(|segment| segment.resample(interval))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new_with_config(self.header.clone(), segments, self.cfg)
    }

    /// Compares two messages: same header, and segments
    /// equal within `tolerance` (see [EphemerisSegment::approx_eq]).
    pub fn approx_eq(&self, rhs: &Self, tolerance: f64) -> bool {
        self.header == rhs.header
            && self.segments.len() == rhs.segments.len()
            && self
                .segments
                .iter()
                .zip(rhs.segments.iter())
                .all(|(a, b)| a.approx_eq(b, tolerance))
    }

    /// Compares this (target) ephemeris to `origin`, over their
    /// common time span.
    pub fn compare<'a>(&'a self, origin: &'a Self) -> Result<EphemerisCompare<'a>, Error> {
        EphemerisCompare::new(origin, self)
    }
}

impl FromStr for OrbitEphemerisMessage {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'a> IntoIterator for &'a OrbitEphemerisMessage {
    type Item = &'a EphemerisSegment;
    type IntoIter = std::slice::Iter<'a, EphemerisSegment>;
    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

/// Lazy iterator over evenly spaced states of every segment
pub struct MessageStepIter<'a> {
    segments: std::slice::Iter<'a, EphemerisSegment>,
    current: Option<StepIter<'a>>,
    interval: Duration,
}

impl Iterator for MessageStepIter<'_> {
    type Item = Result<State, Error>;
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(state) = self.current.as_mut().and_then(|steps| steps.next()) {
                return Some(state);
            }
            let segment = self.segments.next()?;
            self.current = Some(StepIter::new(segment, self.interval));
        }
    }
}
