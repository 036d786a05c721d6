use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;

#[cfg(feature = "log")]
use log::debug;

use crate::{
    error::{FormatError, ParsingError},
    kvn::{
        COMMENT, COVARIANCE_START, COVARIANCE_STOP, COV_REF_FRAME, EPOCH, META_START, META_STOP,
        VERSION_KEY,
    },
    records::{RawCovariance, RawMessage, RawSegment, RawState},
    version::Version,
};

lazy_static! {
    static ref KEY_VALUE: Regex = Regex::new(r"^([A-Z][A-Z0-9_]*)\s*=\s*(.*?)\s*$").unwrap();
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum Section {
    Header,
    Metadata,
    Data,
    Covariance,
    /// COVARIANCE_STOP was found: a new segment must follow
    Done,
}

/// Covariance matrix being gathered, row by row
struct PendingCovariance {
    line: usize,
    epoch: String,
    frame: Option<String>,
    rows: usize,
    values: Vec<f64>,
}

impl PendingCovariance {
    fn new(line: usize, epoch: &str) -> Self {
        Self {
            line,
            epoch: epoch.to_string(),
            frame: None,
            rows: 0,
            values: Vec::with_capacity(45),
        }
    }
    fn finish(self) -> Result<RawCovariance, FormatError> {
        if self.rows != 6 && self.rows != 9 {
            return Err(FormatError::kvn(
                self.line,
                ParsingError::Covariance(format!(
                    "{} rows (expecting 6 or 9)",
                    self.rows
                )),
            ));
        }
        Ok(RawCovariance {
            epoch: self.epoch,
            frame: self.frame,
            values: self.values,
        })
    }
}

fn comment(line: &str) -> Option<String> {
    let content = line.strip_prefix(COMMENT)?;
    if content.is_empty() || content.starts_with(char::is_whitespace) {
        Some(content.trim().to_string())
    } else {
        None
    }
}

fn key_value(line: &str) -> Option<(&str, &str)> {
    let captures = KEY_VALUE.captures(line)?;
    Some((captures.get(1)?.as_str(), captures.get(2)?.as_str()))
}

fn numbers(items: &[&str], line: usize) -> Result<Vec<f64>, FormatError> {
    items
        .iter()
        .map(|item| {
            item.parse::<f64>()
                .map_err(|_| FormatError::kvn(line, ParsingError::Number(item.to_string())))
        })
        .collect()
}

fn current<'a>(
    segments: &'a mut [RawSegment],
    line: usize,
    content: &str,
) -> Result<&'a mut RawSegment, FormatError> {
    segments
        .last_mut()
        .ok_or_else(|| FormatError::kvn(line, ParsingError::Unexpected(content.to_string())))
}

/// Splits KVN content into [RawMessage]. Only the grammar is verified
/// here: values are interpreted (and validated) by the data model.
pub fn parse(content: &str) -> Result<RawMessage, FormatError> {
    let mut raw = RawMessage::default();
    let mut section = Section::Header;
    let mut pending: Option<PendingCovariance> = None;
    let mut version_found = false;
    let mut last_line = 0;

    for (nth, line) in content.lines().enumerate() {
        let line_number = nth + 1;
        let line = line.trim();
        last_line = line_number;

        if line.is_empty() {
            continue;
        }

        if !version_found {
            match key_value(line) {
                Some((VERSION_KEY, version)) => {
                    Version::from_str(version).map_err(|e| FormatError::kvn(line_number, e))?;
                    raw.version = version.to_string();
                    version_found = true;
                    continue;
                },
                _ => return Err(FormatError::kvn(line_number, ParsingError::MissingVersion)),
            }
        }

        match section {
            Section::Header | Section::Done => {
                if line == META_START {
                    raw.segments.push(RawSegment::default());
                    section = Section::Metadata;
                } else if section == Section::Header {
                    if let Some(comment) = comment(line) {
                        raw.header.comments.push(comment);
                        continue;
                    }
                    let (key, value) = key_value(line).ok_or_else(|| {
                        FormatError::kvn(line_number, ParsingError::MalformedLine(line.to_string()))
                    })?;
                    raw.header.push(key, value);
                } else {
                    return Err(FormatError::kvn(
                        line_number,
                        ParsingError::Unexpected(line.to_string()),
                    ));
                }
            },
            Section::Metadata => {
                if line == META_STOP {
                    section = Section::Data;
                } else {
                    let segment = current(&mut raw.segments, line_number, line)?;
                    if let Some(comment) = comment(line) {
                        segment.metadata.comments.push(comment);
                    } else {
                        let (key, value) = key_value(line).ok_or_else(|| {
                            FormatError::kvn(
                                line_number,
                                ParsingError::MalformedLine(line.to_string()),
                            )
                        })?;
                        segment.metadata.push(key, value);
                    }
                }
            },
            Section::Data => {
                if line == META_START {
                    raw.segments.push(RawSegment::default());
                    section = Section::Metadata;
                } else if line == COVARIANCE_START {
                    section = Section::Covariance;
                } else {
                    let segment = current(&mut raw.segments, line_number, line)?;
                    if let Some(comment) = comment(line) {
                        segment.data_comments.push(comment);
                    } else if line.contains('=') {
                        return Err(FormatError::kvn(
                            line_number,
                            ParsingError::Unexpected(line.to_string()),
                        ));
                    } else {
                        let items = line.split_ascii_whitespace().collect::<Vec<_>>();
                        let width = items.len() - 1;
                        if width != 6 && width != 9 {
                            return Err(FormatError::kvn(
                                line_number,
                                ParsingError::StateVectorWidth(width),
                            ));
                        }
                        segment.states.push(RawState {
                            epoch: items[0].to_string(),
                            values: numbers(&items[1..], line_number)?,
                        });
                    }
                }
            },
            Section::Covariance => {
                let segment = current(&mut raw.segments, line_number, line)?;
                if line == COVARIANCE_STOP {
                    if let Some(pending) = pending.take() {
                        segment.covariances.push(pending.finish()?);
                    }
                    section = Section::Done;
                } else if let Some(comment) = comment(line) {
                    segment.covariance_comments.push(comment);
                } else if let Some((key, value)) = key_value(line) {
                    match key {
                        EPOCH => {
                            if let Some(pending) = pending.take() {
                                segment.covariances.push(pending.finish()?);
                            }
                            pending = Some(PendingCovariance::new(line_number, value));
                        },
                        COV_REF_FRAME => match pending.as_mut() {
                            Some(pending) if pending.rows == 0 && pending.frame.is_none() => {
                                pending.frame = Some(value.to_string());
                            },
                            _ => {
                                return Err(FormatError::kvn(
                                    line_number,
                                    ParsingError::Unexpected(line.to_string()),
                                ))
                            },
                        },
                        _ => {
                            return Err(FormatError::kvn(
                                line_number,
                                ParsingError::Unexpected(line.to_string()),
                            ))
                        },
                    }
                } else {
                    let pending = pending.as_mut().ok_or_else(|| {
                        FormatError::kvn(
                            line_number,
                            ParsingError::Covariance("matrix row without EPOCH".to_string()),
                        )
                    })?;
                    let items = line.split_ascii_whitespace().collect::<Vec<_>>();
                    if items.len() != pending.rows + 1 || pending.rows == 9 {
                        return Err(FormatError::kvn(
                            line_number,
                            ParsingError::Covariance(format!(
                                "row #{} has {} terms",
                                pending.rows + 1,
                                items.len()
                            )),
                        ));
                    }
                    pending.values.extend(numbers(&items, line_number)?);
                    pending.rows += 1;
                }
            },
        }
    }

    if !version_found {
        return Err(FormatError::kvn(last_line.max(1), ParsingError::MissingVersion));
    }

    match section {
        Section::Metadata => Err(FormatError::kvn(
            last_line,
            ParsingError::Unterminated("META"),
        )),
        Section::Covariance => Err(FormatError::kvn(
            last_line,
            ParsingError::Unterminated("COVARIANCE"),
        )),
        _ => {
            #[cfg(feature = "log")]
            debug!(
                "kvn: v{} - {} segment(s)",
                raw.version,
                raw.segments.len()
            );
            Ok(raw)
        },
    }
}
