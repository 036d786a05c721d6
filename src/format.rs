//! Supported wire formats
use std::{io::Write, str::FromStr};

use crate::{
    error::{Error, FormatError, ParsingError},
    kvn,
    records::RawMessage,
    xml,
};

/// [FileFormat] is only chosen when reading or writing:
/// the data model does not depend on it.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FileFormat {
    /// Keyword = value notation
    #[default]
    KVN,
    /// NDM/XML
    XML,
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::KVN => f.write_str("KVN"),
            Self::XML => f.write_str("XML"),
        }
    }
}

impl FromStr for FileFormat {
    type Err = ParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kvn" | "oem" | "txt" => Ok(Self::KVN),
            "xml" => Ok(Self::XML),
            _ => Err(ParsingError::UnknownFormat(s.to_string())),
        }
    }
}

impl FileFormat {
    /// Guesses format from content: XML documents open with a tag
    pub fn detect(content: &str) -> Self {
        match content.lines().map(|l| l.trim()).find(|l| !l.is_empty()) {
            Some(line) if line.starts_with('<') => Self::XML,
            _ => Self::KVN,
        }
    }

    /// Splits content into [RawMessage]
    pub fn parse(&self, content: &str) -> Result<RawMessage, FormatError> {
        match self {
            Self::KVN => kvn::parse(content),
            Self::XML => xml::parse(content),
        }
    }

    /// Writes [RawMessage] in this format
    pub fn format<W: Write>(&self, raw: &RawMessage, w: &mut W) -> Result<(), Error> {
        match self {
            Self::KVN => Ok(kvn::format(raw, w)?),
            Self::XML => xml::format(raw, w),
        }
    }
}
