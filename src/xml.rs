//! CCSDS NDM/XML OEM tokenizer
use std::{io::Write, str::FromStr};

use quick_xml::{de::from_str, se::Serializer};
use serde::{Deserialize, Serialize};

#[cfg(feature = "log")]
use log::debug;

use crate::{
    error::{Error, FormatError, ParsingError},
    header::{CREATION_DATE, MESSAGE_ID, ORIGINATOR},
    metadata::{KEYWORDS, OBJECT_NAME},
    records::{RawCovariance, RawMessage, RawSection, RawSegment, RawState},
    version::Version,
};

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";
const ROOT: &str = "oem";
const SCHEMA_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
const SCHEMA_LOCATION: &str =
    "http://sanaregistry.org/r/ndmxml_unqualified/ndmxml-2.0.0-master-2.0.xsd";

fn default_id() -> String {
    "CCSDS_OEM_VERS".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlOem {
    #[serde(rename = "@xmlns:xsi", default, skip_serializing_if = "Option::is_none")]
    xsi: Option<String>,
    #[serde(
        rename = "@xsi:noNamespaceSchemaLocation",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    schema: Option<String>,
    #[serde(rename = "@id", default = "default_id")]
    id: String,
    #[serde(rename = "@version")]
    version: String,
    header: XmlHeader,
    body: XmlBody,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct XmlHeader {
    #[serde(rename = "COMMENT", default, skip_serializing_if = "Vec::is_empty")]
    comments: Vec<String>,
    #[serde(rename = "CREATION_DATE", default, skip_serializing_if = "Option::is_none")]
    creation_date: Option<String>,
    #[serde(rename = "ORIGINATOR", default, skip_serializing_if = "Option::is_none")]
    originator: Option<String>,
    #[serde(rename = "MESSAGE_ID", default, skip_serializing_if = "Option::is_none")]
    message_id: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct XmlBody {
    #[serde(rename = "segment", default)]
    segments: Vec<XmlSegment>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct XmlSegment {
    metadata: XmlMetadata,
    data: XmlData,
}

/// Declares [XmlMetadata], one optional text element per keyword
macro_rules! xml_metadata {
    ($($field:ident => $key:literal),* $(,)?) => {
        #[derive(Debug, Default, Serialize, Deserialize)]
        #[serde(deny_unknown_fields)]
        struct XmlMetadata {
            #[serde(rename = "COMMENT", default, skip_serializing_if = "Vec::is_empty")]
            comments: Vec<String>,
            $(
                #[serde(rename = $key, default, skip_serializing_if = "Option::is_none")]
                $field: Option<String>,
            )*
        }

        impl XmlMetadata {
            fn to_raw(&self) -> RawSection {
                let mut raw = RawSection {
                    comments: self.comments.clone(),
                    fields: Vec::new(),
                };
                $(
                    raw.push_opt($key, self.$field.clone());
                )*
                raw
            }

            fn from_raw(raw: &RawSection) -> Result<Self, Error> {
                for (key, _) in raw.fields.iter() {
                    if !KEYWORDS.contains(&key.as_str()) {
                        return Err(Error::Xml(format!("{} has no XML counterpart", key)));
                    }
                }
                Ok(Self {
                    comments: raw.comments.clone(),
                    $(
                        $field: raw.get($key).map(|s| s.to_string()),
                    )*
                })
            }
        }
    };
}

xml_metadata!(
    object_name => "OBJECT_NAME",
    object_id => "OBJECT_ID",
    center_name => "CENTER_NAME",
    ref_frame => "REF_FRAME",
    ref_frame_epoch => "REF_FRAME_EPOCH",
    time_system => "TIME_SYSTEM",
    start_time => "START_TIME",
    useable_start_time => "USEABLE_START_TIME",
    useable_stop_time => "USEABLE_STOP_TIME",
    stop_time => "STOP_TIME",
    interpolation => "INTERPOLATION",
    interpolation_degree => "INTERPOLATION_DEGREE",
);

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct XmlData {
    #[serde(rename = "COMMENT", default, skip_serializing_if = "Vec::is_empty")]
    comments: Vec<String>,
    #[serde(rename = "stateVector", default)]
    states: Vec<XmlState>,
    #[serde(rename = "covarianceMatrix", default, skip_serializing_if = "Vec::is_empty")]
    covariances: Vec<XmlCovariance>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct XmlState {
    #[serde(rename = "EPOCH")]
    epoch: String,
    #[serde(rename = "X")]
    x: f64,
    #[serde(rename = "Y")]
    y: f64,
    #[serde(rename = "Z")]
    z: f64,
    #[serde(rename = "X_DOT")]
    x_dot: f64,
    #[serde(rename = "Y_DOT")]
    y_dot: f64,
    #[serde(rename = "Z_DOT")]
    z_dot: f64,
    #[serde(rename = "X_DDOT", default, skip_serializing_if = "Option::is_none")]
    x_ddot: Option<f64>,
    #[serde(rename = "Y_DDOT", default, skip_serializing_if = "Option::is_none")]
    y_ddot: Option<f64>,
    #[serde(rename = "Z_DDOT", default, skip_serializing_if = "Option::is_none")]
    z_ddot: Option<f64>,
}

impl XmlState {
    fn to_raw(&self) -> Result<RawState, FormatError> {
        let mut values = vec![self.x, self.y, self.z, self.x_dot, self.y_dot, self.z_dot];
        match (self.x_ddot, self.y_ddot, self.z_ddot) {
            (Some(x), Some(y), Some(z)) => values.extend([x, y, z]),
            (None, None, None) => {},
            _ => {
                return Err(FormatError::xml(ParsingError::StateVectorWidth(
                    6 + [self.x_ddot, self.y_ddot, self.z_ddot]
                        .iter()
                        .filter(|v| v.is_some())
                        .count(),
                )))
            },
        }
        Ok(RawState {
            epoch: self.epoch.clone(),
            values,
        })
    }

    fn from_raw(raw: &RawState) -> Result<Self, Error> {
        let v = &raw.values;
        if v.len() != 6 && v.len() != 9 {
            return Err(Error::Xml(format!("{} components state vector", v.len())));
        }
        Ok(Self {
            epoch: raw.epoch.clone(),
            x: v[0],
            y: v[1],
            z: v[2],
            x_dot: v[3],
            y_dot: v[4],
            z_dot: v[5],
            x_ddot: v.get(6).copied(),
            y_ddot: v.get(7).copied(),
            z_ddot: v.get(8).copied(),
        })
    }
}

/// Declares [XmlCovariance], lower triangle terms in row major order
macro_rules! xml_covariance {
    ($($field:ident => $tag:literal),* $(,)?) => {
        #[derive(Debug, Default, Serialize, Deserialize)]
        #[serde(deny_unknown_fields)]
        struct XmlCovariance {
            #[serde(rename = "COMMENT", default, skip_serializing_if = "Vec::is_empty")]
            comments: Vec<String>,
            #[serde(rename = "EPOCH")]
            epoch: String,
            #[serde(rename = "COV_REF_FRAME", default, skip_serializing_if = "Option::is_none")]
            frame: Option<String>,
            $(
                #[serde(rename = $tag)]
                $field: f64,
            )*
        }

        impl XmlCovariance {
            fn values(&self) -> Vec<f64> {
                vec![$(self.$field),*]
            }

            fn from_values(
                epoch: &str,
                frame: Option<String>,
                comments: Vec<String>,
                values: &[f64],
            ) -> Option<Self> {
                let mut values = values.iter();
                Some(Self {
                    comments,
                    epoch: epoch.to_string(),
                    frame,
                    $(
                        $field: *values.next()?,
                    )*
                })
            }
        }
    };
}

xml_covariance!(
    cx_x => "CX_X",
    cy_x => "CY_X",
    cy_y => "CY_Y",
    cz_x => "CZ_X",
    cz_y => "CZ_Y",
    cz_z => "CZ_Z",
    cx_dot_x => "CX_DOT_X",
    cx_dot_y => "CX_DOT_Y",
    cx_dot_z => "CX_DOT_Z",
    cx_dot_x_dot => "CX_DOT_X_DOT",
    cy_dot_x => "CY_DOT_X",
    cy_dot_y => "CY_DOT_Y",
    cy_dot_z => "CY_DOT_Z",
    cy_dot_x_dot => "CY_DOT_X_DOT",
    cy_dot_y_dot => "CY_DOT_Y_DOT",
    cz_dot_x => "CZ_DOT_X",
    cz_dot_y => "CZ_DOT_Y",
    cz_dot_z => "CZ_DOT_Z",
    cz_dot_x_dot => "CZ_DOT_X_DOT",
    cz_dot_y_dot => "CZ_DOT_Y_DOT",
    cz_dot_z_dot => "CZ_DOT_Z_DOT",
);

/// Number of lower triangle terms of a 6x6 matrix
const COVARIANCE_TERMS: usize = 21;

/// Parses NDM/XML content into [RawMessage]
pub fn parse(content: &str) -> Result<RawMessage, FormatError> {
    let oem: XmlOem =
        from_str(content).map_err(|e| FormatError::xml(ParsingError::Xml(e.to_string())))?;

    Version::from_str(&oem.version).map_err(FormatError::xml)?;

    let mut header = RawSection {
        comments: oem.header.comments,
        fields: Vec::with_capacity(3),
    };
    header.push_opt(CREATION_DATE, oem.header.creation_date);
    header.push_opt(ORIGINATOR, oem.header.originator);
    header.push_opt(MESSAGE_ID, oem.header.message_id);

    let mut segments = Vec::with_capacity(oem.body.segments.len());

    for segment in oem.body.segments.iter() {
        let states = segment
            .data
            .states
            .iter()
            .map(|state| state.to_raw())
            .collect::<Result<Vec<_>, _>>()?;

        let mut covariance_comments = Vec::new();
        let mut covariances = Vec::with_capacity(segment.data.covariances.len());

        for covariance in segment.data.covariances.iter() {
            covariance_comments.extend(covariance.comments.iter().cloned());
            covariances.push(RawCovariance {
                epoch: covariance.epoch.clone(),
                frame: covariance.frame.clone(),
                values: covariance.values(),
            });
        }

        segments.push(RawSegment {
            metadata: segment.metadata.to_raw(),
            data_comments: segment.data.comments.clone(),
            states,
            covariance_comments,
            covariances,
        });
    }

    #[cfg(feature = "log")]
    debug!("xml: v{} - {} segment(s)", oem.version, segments.len());

    Ok(RawMessage {
        version: oem.version,
        header,
        segments,
    })
}

/// Formats [RawMessage] as NDM/XML
pub fn format<W: Write>(raw: &RawMessage, w: &mut W) -> Result<(), Error> {
    let mut segments = Vec::with_capacity(raw.segments.len());

    for segment in raw.segments.iter() {
        let states = segment
            .states
            .iter()
            .map(XmlState::from_raw)
            .collect::<Result<Vec<_>, _>>()?;

        let mut covariances = Vec::with_capacity(segment.covariances.len());
        for (nth, covariance) in segment.covariances.iter().enumerate() {
            if covariance.values.len() != COVARIANCE_TERMS {
                return Err(Error::Xml(format!(
                    "{} terms covariance has no XML counterpart",
                    covariance.values.len()
                )));
            }
            let comments = if nth == 0 {
                segment.covariance_comments.clone()
            } else {
                Vec::new()
            };
            let covariance = XmlCovariance::from_values(
                &covariance.epoch,
                covariance.frame.clone(),
                comments,
                &covariance.values,
            )
            .ok_or(Error::Xml("incomplete covariance".to_string()))?;
            covariances.push(covariance);
        }

        segments.push(XmlSegment {
            metadata: XmlMetadata::from_raw(&segment.metadata)?,
            data: XmlData {
                comments: segment.data_comments.clone(),
                states,
                covariances,
            },
        });
    }

    let oem = XmlOem {
        xsi: Some(SCHEMA_NAMESPACE.to_string()),
        schema: Some(SCHEMA_LOCATION.to_string()),
        id: default_id(),
        version: raw.version.clone(),
        header: XmlHeader {
            comments: raw.header.comments.clone(),
            creation_date: raw.header.get(CREATION_DATE).map(|s| s.to_string()),
            originator: raw.header.get(ORIGINATOR).map(|s| s.to_string()),
            message_id: raw.header.get(MESSAGE_ID).map(|s| s.to_string()),
        },
        body: XmlBody { segments },
    };

    let mut content = String::new();
    let mut serializer =
        Serializer::with_root(&mut content, Some(ROOT)).map_err(|e| Error::Xml(e.to_string()))?;
    serializer.indent(' ', 2);
    oem.serialize(serializer)
        .map_err(|e| Error::Xml(e.to_string()))?;

    writeln!(w, "{}", XML_DECLARATION)?;
    writeln!(w, "{}", content)?;
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    const CONTENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<oem xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" id="CCSDS_OEM_VERS" version="2.0">
  <header>
    <COMMENT>xml sample</COMMENT>
    <CREATION_DATE>2020-01-01T00:00:00</CREATION_DATE>
    <ORIGINATOR>ME</ORIGINATOR>
  </header>
  <body>
    <segment>
      <metadata>
        <OBJECT_NAME>SAT</OBJECT_NAME>
        <OBJECT_ID>2020-001A</OBJECT_ID>
        <CENTER_NAME>EARTH</CENTER_NAME>
        <REF_FRAME>EME2000</REF_FRAME>
        <TIME_SYSTEM>UTC</TIME_SYSTEM>
        <START_TIME>2020-01-01T00:00:00</START_TIME>
        <STOP_TIME>2020-01-01T00:01:00</STOP_TIME>
      </metadata>
      <data>
        <stateVector>
          <EPOCH>2020-01-01T00:00:00</EPOCH>
          <X>7000.0</X><Y>0.0</Y><Z>0.0</Z>
          <X_DOT>0.0</X_DOT><Y_DOT>7.5</Y_DOT><Z_DOT>0.0</Z_DOT>
        </stateVector>
        <stateVector>
          <EPOCH>2020-01-01T00:01:00</EPOCH>
          <X>6999.0</X><Y>450.0</Y><Z>0.0</Z>
          <X_DOT>-0.1</X_DOT><Y_DOT>7.5</Y_DOT><Z_DOT>0.0</Z_DOT>
        </stateVector>
      </data>
    </segment>
  </body>
</oem>
"#;

    #[test]
    fn xml_tokenizer() {
        let raw = parse(CONTENT).unwrap();
        assert_eq!(raw.version, "2.0");
        assert_eq!(raw.header.comments, vec!["xml sample".to_string()]);
        assert_eq!(raw.header.get(ORIGINATOR), Some("ME"));
        assert_eq!(raw.segments.len(), 1);

        let segment = &raw.segments[0];
        assert_eq!(segment.metadata.get(OBJECT_NAME), Some("SAT"));
        assert_eq!(segment.states.len(), 2);
        assert_eq!(segment.states[1].values, vec![6999.0, 450.0, 0.0, -0.1, 7.5, 0.0]);
        assert!(segment.covariances.is_empty());
    }

    #[test]
    fn xml_reciprocal() {
        let mut raw = parse(CONTENT).unwrap();
        raw.segments[0].covariances.push(RawCovariance {
            epoch: "2020-01-01T00:00:00".to_string(),
            frame: Some("RTN".to_string()),
            values: (1..=21).map(|v| v as f64 * 1.0E-3).collect(),
        });

        let mut buf = Vec::<u8>::new();
        format(&raw, &mut buf).unwrap();

        let content = String::from_utf8(buf).unwrap();
        assert!(content.starts_with(XML_DECLARATION));

        let parsed = parse(&content).unwrap();
        assert_eq!(parsed, raw);
    }

    #[test]
    fn xml_errors() {
        assert!(parse("<oem version=\"2.0\"><header>").is_err());

        let unknown = CONTENT.replace("<ORIGINATOR>ME</ORIGINATOR>", "<AGENCY>ME</AGENCY>");
        assert!(parse(&unknown).is_err());

        let partial = CONTENT.replace(
            "<Z_DOT>0.0</Z_DOT>\n        </stateVector>\n        <stateVector>",
            "<Z_DOT>0.0</Z_DOT><X_DDOT>0.0</X_DDOT>\n        </stateVector>\n        <stateVector>",
        );
        assert!(parse(&partial).is_err());
    }
}
