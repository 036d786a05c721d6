//! OEM revision (CCSDS_OEM_VERS)
use crate::error::ParsingError;

#[derive(Default, Copy, Clone, Debug, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub enum Version {
    /// CCSDS 502.0-B-1
    V1,
    /// CCSDS 502.0-B-2
    #[default]
    V2,
    /// CCSDS 502.0-B-3
    V3,
}

impl Version {
    /// Covariance blocks and accelerations are not defined in V1
    pub fn supports_covariance(&self) -> bool {
        *self > Self::V1
    }
    /// Accelerations appeared in V2
    pub fn supports_acceleration(&self) -> bool {
        *self > Self::V1
    }
    /// REF_FRAME_EPOCH appeared in V2
    pub fn supports_ref_frame_epoch(&self) -> bool {
        *self > Self::V1
    }
    /// MESSAGE_ID appeared in V3
    pub fn supports_message_id(&self) -> bool {
        *self > Self::V2
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::V1 => f.write_str("1.0"),
            Self::V2 => f.write_str("2.0"),
            Self::V3 => f.write_str("3.0"),
        }
    }
}

impl std::str::FromStr for Version {
    type Err = ParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1.0" | "1" => Ok(Self::V1),
            "2.0" | "2" => Ok(Self::V2),
            "3.0" | "3" => Ok(Self::V3),
            _ => Err(ParsingError::UnknownVersion(s.to_string())),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn version() {
        for (desc, expected) in [
            ("1.0", Version::V1),
            ("2.0", Version::V2),
            (" 3.0 ", Version::V3),
            ("2", Version::V2),
        ] {
            let version = Version::from_str(desc).unwrap();
            assert_eq!(version, expected);
        }
        assert!(Version::from_str("4.0").is_err());
        assert!(Version::from_str("2.1").is_err());
        assert_eq!(Version::V1.to_string(), "1.0");
        assert_eq!(Version::default(), Version::V2);
    }

    #[test]
    fn version_features() {
        assert!(!Version::V1.supports_covariance());
        assert!(Version::V2.supports_acceleration());
        assert!(!Version::V2.supports_message_id());
        assert!(Version::V3.supports_message_id());
        assert!(Version::V1 < Version::V3);
    }
}
