//! Epochs tied to a CCSDS time system
use std::{
    cmp::Ordering,
    fmt,
    ops::{Add, Sub},
    str::FromStr,
};

use hifitime::{Duration, Epoch, TimeScale};

use crate::error::Error;

/// Default tolerance, under which two epochs are considered identical
/// (exact state lookup, boundary inclusion, gap detection).
/// Boundaries are exclusive at the tolerance: an epoch one full
/// tolerance past a range boundary lies outside that range.
pub const EPOCH_TOLERANCE_NANOS: i64 = 1_000;

/// [EPOCH_TOLERANCE_NANOS] as a [Duration]
pub fn epoch_tolerance() -> Duration {
    Duration::from_total_nanoseconds(EPOCH_TOLERANCE_NANOS as i128)
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParsingError {
    #[error("expecting \"YYYY-MM-DDThh:mm:ss[.f]\" or \"YYYY-DDDThh:mm:ss[.f]\" format")]
    FormatError,
    #[error("failed to parse year from \"{0}\"")]
    YearField(String),
    #[error("failed to parse month from \"{0}\"")]
    MonthField(String),
    #[error("failed to parse day from \"{0}\"")]
    DayField(String),
    #[error("failed to parse day of year from \"{0}\"")]
    DayOfYearField(String),
    #[error("failed to parse hours from \"{0}\"")]
    HoursField(String),
    #[error("failed to parse minutes from \"{0}\"")]
    MinutesField(String),
    #[error("failed to parse seconds from \"{0}\"")]
    SecondsField(String),
    #[error("failed to parse fraction of seconds from \"{0}\"")]
    NanosecondsField(String),
    #[error("invalid calendar date: {0}")]
    Calendar(String),
}

/// CCSDS time systems (TIME_SYSTEM keyword)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum TimeSystem {
    /// Coordinated Universal Time
    #[default]
    UTC,
    /// International Atomic Time
    TAI,
    /// Terrestrial Time
    TT,
    /// GPS Time
    GPS,
    /// Barycentric Dynamical Time
    TDB,
    /// Barycentric Coordinate Time
    TCB,
    /// Geocentric Coordinate Time
    TCG,
    /// Universal Time
    UT1,
    /// Greenwich Mean Sidereal Time
    GMST,
    /// Mission Elapsed Time
    MET,
    /// Mission Relative Time
    MRT,
    /// Spacecraft Clock
    SCLK,
    /// Any other label, preserved as is
    Other(String),
}

impl TimeSystem {
    /// Returns the [TimeScale] we can convert through, if any.
    /// Other systems are opaque labels: valid within themselves only.
    pub fn timescale(&self) -> Option<TimeScale> {
        match self {
            Self::UTC => Some(TimeScale::UTC),
            Self::TAI => Some(TimeScale::TAI),
            Self::TT => Some(TimeScale::TT),
            Self::GPS => Some(TimeScale::GPST),
            Self::TDB => Some(TimeScale::TDB),
            _ => None,
        }
    }
    /// True if explicit conversion is supported
    pub fn is_convertible(&self) -> bool {
        self.timescale().is_some()
    }
}

impl fmt::Display for TimeSystem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UTC => write!(f, "UTC"),
            Self::TAI => write!(f, "TAI"),
            Self::TT => write!(f, "TT"),
            Self::GPS => write!(f, "GPS"),
            Self::TDB => write!(f, "TDB"),
            Self::TCB => write!(f, "TCB"),
            Self::TCG => write!(f, "TCG"),
            Self::UT1 => write!(f, "UT1"),
            Self::GMST => write!(f, "GMST"),
            Self::MET => write!(f, "MET"),
            Self::MRT => write!(f, "MRT"),
            Self::SCLK => write!(f, "SCLK"),
            Self::Other(s) => write!(f, "{}", s),
        }
    }
}

impl FromStr for TimeSystem {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.to_uppercase().as_str() {
            "UTC" => Self::UTC,
            "TAI" => Self::TAI,
            "TT" => Self::TT,
            "GPS" => Self::GPS,
            "TDB" => Self::TDB,
            "TCB" => Self::TCB,
            "TCG" => Self::TCG,
            "UT1" => Self::UT1,
            "GMST" => Self::GMST,
            "MET" => Self::MET,
            "MRT" => Self::MRT,
            "SCLK" => Self::SCLK,
            _ => Self::Other(s.to_string()),
        })
    }
}

/// [EpochTime] is a calendar epoch expressed in a [TimeSystem].
///
/// UTC epochs are true hifitime UTC epochs. Every other system is
/// stored as a calendar label (TAI calendar arithmetic), which keeps
/// parsing and formatting exact, and subtraction correct within
/// the system. Use [EpochTime::to_system] to move between systems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpochTime {
    system: TimeSystem,
    epoch: Epoch,
}

fn calendar(
    year: i32,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    nanos: u32,
    system: &TimeSystem,
) -> Result<Epoch, ParsingError> {
    let epoch = match system {
        TimeSystem::UTC => {
            Epoch::maybe_from_gregorian_utc(year, month, day, hour, minute, second, nanos)
        },
        _ => Epoch::maybe_from_gregorian_tai(year, month, day, hour, minute, second, nanos),
    };
    epoch.map_err(|e| ParsingError::Calendar(e.to_string()))
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Converts a day of year to (month, day of month)
fn month_day(year: i32, doy: u16) -> Option<(u8, u8)> {
    let mut days = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    if is_leap_year(year) {
        days[1] = 29;
    }
    let mut remaining = doy;
    if remaining == 0 {
        return None;
    }
    for (month, len) in days.iter().enumerate() {
        if remaining <= *len {
            return Some((month as u8 + 1, remaining as u8));
        }
        remaining -= len;
    }
    None
}

/// Parses "hh:mm:ss[.fffffffff]" into (h, m, s, nanos)
fn parse_time(content: &str) -> Result<(u8, u8, u8, u32), ParsingError> {
    let mut items = content.split(':');
    let (Some(hh), Some(mm), Some(ss), None) =
        (items.next(), items.next(), items.next(), items.next())
    else {
        return Err(ParsingError::FormatError);
    };

    let hour = hh
        .parse::<u8>()
        .map_err(|_| ParsingError::HoursField(hh.to_string()))?;
    let minute = mm
        .parse::<u8>()
        .map_err(|_| ParsingError::MinutesField(mm.to_string()))?;

    let (secs, frac) = match ss.split_once('.') {
        Some((secs, frac)) => (secs, frac),
        None => (ss, ""),
    };

    let second = secs
        .parse::<u8>()
        .map_err(|_| ParsingError::SecondsField(ss.to_string()))?;

    if !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParsingError::NanosecondsField(frac.to_string()));
    }

    // nanosecond resolution: extra digits are truncated
    let mut nanos = 0_u32;
    for i in 0..9 {
        let digit = frac.as_bytes().get(i).map(|b| (b - b'0') as u32).unwrap_or(0);
        nanos = nanos * 10 + digit;
    }

    if hour > 23 {
        return Err(ParsingError::HoursField(hh.to_string()));
    }
    if minute > 59 {
        return Err(ParsingError::MinutesField(mm.to_string()));
    }
    if second > 60 {
        return Err(ParsingError::SecondsField(ss.to_string()));
    }
    Ok((hour, minute, second, nanos))
}

impl EpochTime {
    /// Builds [EpochTime] from calendar fields, in given [TimeSystem]
    #[allow(clippy::too_many_arguments)]
    pub fn from_gregorian(
        year: i32,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        nanos: u32,
        system: TimeSystem,
    ) -> Result<Self, ParsingError> {
        let epoch = calendar(year, month, day, hour, minute, second, nanos, &system)?;
        Ok(Self { system, epoch })
    }

    /// Parses a CCSDS epoch, `YYYY-MM-DDThh:mm:ss[.f][Z]`
    /// or `YYYY-DDDThh:mm:ss[.f][Z]`, in given [TimeSystem].
    pub fn parse(content: &str, system: TimeSystem) -> Result<Self, ParsingError> {
        let content = content.trim();
        let content = content.strip_suffix('Z').unwrap_or(content);

        let (date, time) = content.split_once('T').ok_or(ParsingError::FormatError)?;

        let mut items = date.split('-');
        let (year, month, day) = match (items.next(), items.next(), items.next(), items.next()) {
            (Some(yyyy), Some(mm), Some(dd), None) => {
                if yyyy.len() != 4 {
                    return Err(ParsingError::YearField(yyyy.to_string()));
                }
                let year = yyyy
                    .parse::<i32>()
                    .map_err(|_| ParsingError::YearField(yyyy.to_string()))?;
                let month = mm
                    .parse::<u8>()
                    .map_err(|_| ParsingError::MonthField(mm.to_string()))?;
                let day = dd
                    .parse::<u8>()
                    .map_err(|_| ParsingError::DayField(dd.to_string()))?;
                (year, month, day)
            },
            (Some(yyyy), Some(ddd), None, None) => {
                if yyyy.len() != 4 {
                    return Err(ParsingError::YearField(yyyy.to_string()));
                }
                let year = yyyy
                    .parse::<i32>()
                    .map_err(|_| ParsingError::YearField(yyyy.to_string()))?;
                if ddd.len() != 3 {
                    return Err(ParsingError::DayOfYearField(ddd.to_string()));
                }
                let doy = ddd
                    .parse::<u16>()
                    .map_err(|_| ParsingError::DayOfYearField(ddd.to_string()))?;
                let (month, day) = month_day(year, doy)
                    .ok_or(ParsingError::DayOfYearField(ddd.to_string()))?;
                (year, month, day)
            },
            _ => return Err(ParsingError::FormatError),
        };

        if !(1..=12).contains(&month) {
            return Err(ParsingError::MonthField(month.to_string()));
        }
        if !(1..=31).contains(&day) {
            return Err(ParsingError::DayField(day.to_string()));
        }

        let (hour, minute, second, nanos) = parse_time(time)?;
        Self::from_gregorian(year, month, day, hour, minute, second, nanos, system)
    }

    /// Returns the [TimeSystem] this epoch is expressed in
    pub fn system(&self) -> &TimeSystem {
        &self.system
    }

    /// Decomposes this epoch into its calendar fields
    pub fn to_gregorian(&self) -> (i32, u8, u8, u8, u8, u8, u32) {
        match self.system {
            TimeSystem::UTC => self.epoch.to_gregorian_utc(),
            _ => self.epoch.to_gregorian_tai(),
        }
    }

    /// Returns the physical instant, for convertible systems only
    pub fn instant(&self) -> Result<Epoch, Error> {
        let timescale = self.system.timescale().ok_or(Error::UnsupportedTimeSystem {
            expected: TimeSystem::TAI,
            found: self.system.clone(),
        })?;
        match timescale {
            TimeScale::UTC | TimeScale::TAI => Ok(self.epoch),
            timescale => {
                let (y, m, d, hh, mm, ss, ns) = self.epoch.to_gregorian_tai();
                Epoch::maybe_from_gregorian(y, m, d, hh, mm, ss, ns, timescale).map_err(|_| {
                    Error::UnsupportedTimeSystem {
                        expected: TimeSystem::TAI,
                        found: self.system.clone(),
                    }
                })
            },
        }
    }

    /// Expresses the same instant in another [TimeSystem].
    /// Fails with [Error::UnsupportedTimeSystem] if either system
    /// is an opaque label.
    pub fn to_system(&self, target: TimeSystem) -> Result<Self, Error> {
        if self.system == target {
            return Ok(self.clone());
        }

        let unsupported = || Error::UnsupportedTimeSystem {
            expected: target.clone(),
            found: self.system.clone(),
        };

        let timescale = target.timescale().ok_or_else(unsupported)?;
        let instant = self.instant().map_err(|_| unsupported())?;

        let epoch = match timescale {
            TimeScale::UTC => instant.to_time_scale(TimeScale::UTC),
            TimeScale::TAI => instant.to_time_scale(TimeScale::TAI),
            timescale => {
                // find the TAI calendar label L such that
                // L read as a `timescale` calendar is this instant
                let mut label = instant.to_time_scale(TimeScale::TAI);
                for _ in 0..3 {
                    let (y, m, d, hh, mm, ss, ns) = label.to_gregorian_tai();
                    let read = Epoch::maybe_from_gregorian(y, m, d, hh, mm, ss, ns, timescale)
                        .map_err(|_| unsupported())?;
                    let correction = instant - read;
                    if correction == Duration::ZERO {
                        break;
                    }
                    label += correction;
                }
                label
            },
        };

        Ok(Self {
            system: target,
            epoch,
        })
    }

    /// Compares two epochs of the same system, within tolerance
    pub fn approx_eq(&self, rhs: &Self, tolerance: Duration) -> bool {
        self.system == rhs.system && (self.epoch - rhs.epoch).abs() <= tolerance
    }

    /// True if `self` lies within [start, stop], either boundary being
    /// extended by strictly less than `tolerance`.
    pub fn within(&self, start: &Self, stop: &Self, tolerance: Duration) -> bool {
        self.system == start.system
            && self.system == stop.system
            && (self.epoch >= start.epoch || start.epoch - self.epoch < tolerance)
            && (self.epoch <= stop.epoch || self.epoch - stop.epoch < tolerance)
    }

    /// Signed duration to `rhs`, failing if systems differ
    pub fn checked_sub(&self, rhs: &Self) -> Result<Duration, Error> {
        if self.system != rhs.system {
            return Err(Error::UnsupportedTimeSystem {
                expected: self.system.clone(),
                found: rhs.system.clone(),
            });
        }
        Ok(self.epoch - rhs.epoch)
    }
}

impl PartialOrd for EpochTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EpochTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.system
            .cmp(&other.system)
            .then_with(|| self.epoch.cmp(&other.epoch))
    }
}

impl Sub for &EpochTime {
    type Output = Duration;
    fn sub(self, rhs: Self) -> Duration {
        self.epoch - rhs.epoch
    }
}

impl Sub for EpochTime {
    type Output = Duration;
    fn sub(self, rhs: Self) -> Duration {
        &self - &rhs
    }
}

impl Add<Duration> for &EpochTime {
    type Output = EpochTime;
    fn add(self, rhs: Duration) -> EpochTime {
        EpochTime {
            system: self.system.clone(),
            epoch: self.epoch + rhs,
        }
    }
}

impl Add<Duration> for EpochTime {
    type Output = EpochTime;
    fn add(self, rhs: Duration) -> EpochTime {
        &self + rhs
    }
}

impl Sub<Duration> for &EpochTime {
    type Output = EpochTime;
    fn sub(self, rhs: Duration) -> EpochTime {
        EpochTime {
            system: self.system.clone(),
            epoch: self.epoch - rhs,
        }
    }
}

impl Sub<Duration> for EpochTime {
    type Output = EpochTime;
    fn sub(self, rhs: Duration) -> EpochTime {
        &self - rhs
    }
}

impl fmt::Display for EpochTime {
    /// Formats as `YYYY-MM-DDThh:mm:ss.ffffff`, extended
    /// to nanoseconds when sub microsecond digits exist.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (y, m, d, hh, mm, ss, nanos) = self.to_gregorian();
        write!(f, "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}", y, m, d, hh, mm, ss)?;
        if nanos % 1_000 == 0 {
            write!(f, ".{:06}", nanos / 1_000)
        } else {
            write!(f, ".{:09}", nanos)
        }
    }
}

impl FromStr for EpochTime {
    type Err = ParsingError;
    /// Parses "`epoch` [`system`]", UTC being assumed when omitted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once(char::is_whitespace) {
            Some((epoch, system)) => {
                let system = TimeSystem::from_str(system).unwrap_or_default();
                Self::parse(epoch, system)
            },
            None => Self::parse(s, TimeSystem::UTC),
        }
    }
}
