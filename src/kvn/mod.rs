//! KVN (keyword = value notation) tokenizer
mod formatting;
mod parsing;

pub use formatting::format;
pub use parsing::parse;

pub(crate) const VERSION_KEY: &str = "CCSDS_OEM_VERS";
pub(crate) const COMMENT: &str = "COMMENT";
pub(crate) const META_START: &str = "META_START";
pub(crate) const META_STOP: &str = "META_STOP";
pub(crate) const COVARIANCE_START: &str = "COVARIANCE_START";
pub(crate) const COVARIANCE_STOP: &str = "COVARIANCE_STOP";
pub(crate) const EPOCH: &str = "EPOCH";
pub(crate) const COV_REF_FRAME: &str = "COV_REF_FRAME";

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ParsingError;

    const CONTENT: &str = "CCSDS_OEM_VERS = 2.0
COMMENT header comment
CREATION_DATE = 2020-01-01T00:00:00
ORIGINATOR    = ME

META_START
OBJECT_NAME = SAT
OBJECT_ID = 2020-001A
CENTER_NAME = EARTH
REF_FRAME = EME2000
TIME_SYSTEM = UTC
START_TIME = 2020-01-01T00:00:00
STOP_TIME = 2020-01-01T00:02:00
META_STOP

COMMENT data comment
2020-01-01T00:00:00 7000.0 0.0 0.0 0.0 7.5 0.0
2020-01-01T00:01:00 6999.0 450.0 0.0 -0.1 7.5 0.0
2020-01-01T00:02:00 6996.0 900.0 0.0 -0.2 7.5 0.0

COVARIANCE_START
EPOCH = 2020-01-01T00:00:00
COV_REF_FRAME = RTN
1.0
0.1 2.0
0.1 0.2 3.0
0.1 0.2 0.3 4.0
0.1 0.2 0.3 0.4 5.0
0.1 0.2 0.3 0.4 0.5 6.0
COVARIANCE_STOP
";

    #[test]
    fn kvn_tokenizer() {
        let raw = parse(CONTENT).unwrap();
        assert_eq!(raw.version, "2.0");
        assert_eq!(raw.header.comments, vec!["header comment".to_string()]);
        assert_eq!(raw.header.get("ORIGINATOR"), Some("ME"));
        assert_eq!(raw.segments.len(), 1);

        let segment = &raw.segments[0];
        assert_eq!(segment.metadata.fields.len(), 7);
        assert_eq!(segment.data_comments, vec!["data comment".to_string()]);
        assert_eq!(segment.states.len(), 3);
        assert_eq!(segment.states[1].epoch, "2020-01-01T00:01:00");
        assert_eq!(segment.states[1].values[1], 450.0);

        assert_eq!(segment.covariances.len(), 1);
        assert_eq!(segment.covariances[0].frame, Some("RTN".to_string()));
        assert_eq!(segment.covariances[0].values.len(), 21);
        assert_eq!(segment.covariances[0].values[20], 6.0);
    }

    #[test]
    fn kvn_reciprocal() {
        let raw = parse(CONTENT).unwrap();
        let mut buf = Vec::<u8>::new();
        format(&raw, &mut buf).unwrap();
        let content = String::from_utf8(buf).unwrap();
        let parsed = parse(&content).unwrap();
        assert_eq!(parsed, raw);
    }

    #[test]
    fn kvn_syntax_errors() {
        for (content, line, expected) in [
            (
                "CREATION_DATE = 2020-01-01T00:00:00\n",
                1,
                ParsingError::MissingVersion,
            ),
            (
                "CCSDS_OEM_VERS = 2.0\nMETA_START\nOBJECT_NAME = SAT\n",
                3,
                ParsingError::Unterminated("META"),
            ),
            (
                "CCSDS_OEM_VERS = 2.0\nMETA_START\nMETA_STOP\n2020-01-01T00:00:00 1 2 3 4 5\n",
                4,
                ParsingError::StateVectorWidth(5),
            ),
            (
                "CCSDS_OEM_VERS = 2.0\nMETA_START\nMETA_STOP\n2020-01-01T00:00:00 1 2 3 4 5 x\n",
                4,
                ParsingError::Number("x".to_string()),
            ),
            (
                "CCSDS_OEM_VERS = 2.0\nMETA_START\nthis is not a keyword\n",
                3,
                ParsingError::MalformedLine("this is not a keyword".to_string()),
            ),
            (
                "CCSDS_OEM_VERS = 2.0\nMETA_START\nMETA_STOP\nCOVARIANCE_START\nCOVARIANCE_STOP\nCOMMENT orphan\nMETA_START\nMETA_STOP\n",
                6,
                ParsingError::Unexpected("COMMENT orphan".to_string()),
            ),
        ] {
            match parse(content) {
                Err(e) => {
                    assert_eq!(e.line(), Some(line), "wrong line for {:?}", e);
                    assert_eq!(e.error(), &expected);
                },
                Ok(_) => panic!("should have failed: \"{}\"", content),
            }
        }
    }

    #[test]
    fn kvn_covariance_errors() {
        let header = "CCSDS_OEM_VERS = 2.0\nMETA_START\nMETA_STOP\nCOVARIANCE_START\n";
        for body in [
            // missing EPOCH
            "1.0\n",
            // bad row width
            "EPOCH = 2020-01-01T00:00:00\n1.0\n1.0 2.0 3.0\n",
            // incomplete matrix
            "EPOCH = 2020-01-01T00:00:00\n1.0\n1.0 2.0\nCOVARIANCE_STOP\n",
            // missing stop
            "EPOCH = 2020-01-01T00:00:00\n",
        ] {
            let content = format!("{}{}", header, body);
            assert!(parse(&content).is_err(), "should have failed: \"{}\"", body);
        }
    }
}
