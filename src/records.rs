//! Raw records, exchanged between the tokenizers and the data model.
//! Values are kept as found in the document: interpreting them
//! is the job of the data model and its validation.

/// Keyword = value section, with its comments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSection {
    pub comments: Vec<String>,
    pub fields: Vec<(String, String)>,
}

impl RawSection {
    /// Returns value of given keyword, if it exists
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// True if this keyword exists
    pub fn contains(&self, key: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == key)
    }

    /// Keywords found more than once
    pub(crate) fn duplicates(&self) -> Vec<&str> {
        let mut duplicates = Vec::new();
        for (nth, (key, _)) in self.fields.iter().enumerate() {
            if self.fields[..nth].iter().any(|(k, _)| k == key)
                && !duplicates.contains(&key.as_str())
            {
                duplicates.push(key.as_str());
            }
        }
        duplicates
    }

    pub fn push(&mut self, key: &str, value: &str) {
        self.fields.push((key.to_string(), value.to_string()));
    }

    pub(crate) fn push_opt(&mut self, key: &str, value: Option<String>) {
        if let Some(value) = value {
            self.fields.push((key.to_string(), value));
        }
    }
}

/// State vector line
#[derive(Debug, Clone, PartialEq)]
pub struct RawState {
    pub epoch: String,
    /// 6 or 9 components
    pub values: Vec<f64>,
}

/// Covariance block entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCovariance {
    pub epoch: String,
    pub frame: Option<String>,
    /// Lower triangle, row major
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSegment {
    pub metadata: RawSection,
    pub data_comments: Vec<String>,
    pub states: Vec<RawState>,
    pub covariance_comments: Vec<String>,
    pub covariances: Vec<RawCovariance>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMessage {
    /// CCSDS_OEM_VERS
    pub version: String,
    pub header: RawSection,
    pub segments: Vec<RawSegment>,
}
