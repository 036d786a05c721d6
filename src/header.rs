//! OEM header
use crate::{
    epoch::{EpochTime, TimeSystem},
    records::RawSection,
    validation::{Location, ValidationReport, ViolationKind},
    version::Version,
};

pub(crate) const CREATION_DATE: &str = "CREATION_DATE";
pub(crate) const ORIGINATOR: &str = "ORIGINATOR";
pub(crate) const MESSAGE_ID: &str = "MESSAGE_ID";

/// Message [Header]
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    /// Revision
    pub version: Version,
    /// File creation date, always UTC
    pub creation_date: EpochTime,
    /// Creating agency
    pub originator: String,
    /// Message identifier, V3 only
    pub message_id: Option<String>,
    pub comments: Vec<String>,
}

impl Header {
    /// Builds a new [Header]
    pub fn new(version: Version, creation_date: EpochTime, originator: &str) -> Self {
        Self {
            version,
            creation_date,
            originator: originator.to_string(),
            message_id: None,
            comments: Vec::new(),
        }
    }

    /// Copies and returns [Header] with MESSAGE_ID
    pub fn with_message_id(&self, message_id: &str) -> Self {
        let mut s = self.clone();
        s.message_id = Some(message_id.to_string());
        s
    }

    /// Copies and returns [Header] with one more comment
    pub fn with_comment(&self, comment: &str) -> Self {
        let mut s = self.clone();
        s.comments.push(comment.to_string());
        s
    }

    pub(crate) fn from_raw(
        version: Version,
        raw: &RawSection,
        report: &mut ValidationReport,
    ) -> Option<Self> {
        let fatal = report.fatal_count();

        for (key, _) in raw.fields.iter() {
            if ![CREATION_DATE, ORIGINATOR, MESSAGE_ID].contains(&key.as_str()) {
                report.error(Location::Header, ViolationKind::UnknownKeyword(key.clone()));
            }
        }

        for key in raw.duplicates() {
            report.error(
                Location::Header,
                ViolationKind::DuplicateKeyword(key.to_string()),
            );
        }

        let creation_date = match raw.get(CREATION_DATE) {
            Some(value) => match EpochTime::parse(value, TimeSystem::UTC) {
                Ok(epoch) => Some(epoch),
                Err(e) => {
                    report.error(
                        Location::Header,
                        ViolationKind::MalformedValue {
                            key: CREATION_DATE.to_string(),
                            value: value.to_string(),
                            reason: e.to_string(),
                        },
                    );
                    None
                },
            },
            None => {
                report.error(Location::Header, ViolationKind::MissingField(CREATION_DATE));
                None
            },
        };

        let originator = match raw.get(ORIGINATOR).map(|s| s.trim()) {
            Some(value) if !value.is_empty() => Some(value.to_string()),
            _ => {
                report.error(Location::Header, ViolationKind::MissingField(ORIGINATOR));
                None
            },
        };

        if report.fatal_count() > fatal {
            return None;
        }

        Some(Self {
            version,
            creation_date: creation_date?,
            originator: originator?,
            message_id: raw.get(MESSAGE_ID).map(|s| s.trim().to_string()),
            comments: raw.comments.clone(),
        })
    }

    pub(crate) fn to_raw(&self) -> RawSection {
        let mut raw = RawSection {
            comments: self.comments.clone(),
            fields: Vec::with_capacity(3),
        };
        raw.push(CREATION_DATE, &self.creation_date.to_string());
        raw.push(ORIGINATOR, &self.originator);
        raw.push_opt(MESSAGE_ID, self.message_id.clone());
        raw
    }
}
