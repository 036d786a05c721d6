use std::io::{Result, Write};

use itertools::Itertools;

use crate::{
    kvn::{
        COMMENT, COVARIANCE_START, COVARIANCE_STOP, COV_REF_FRAME, EPOCH, META_START, META_STOP,
        VERSION_KEY,
    },
    records::{RawMessage, RawSection},
};

/// Formats a float with the shortest representation that
/// parses back to the exact same value.
pub(crate) fn format_float(value: f64) -> String {
    let magnitude = value.abs();
    if value == 0.0 || (1.0E-3..1.0E7).contains(&magnitude) {
        format!("{}", value)
    } else {
        format!("{:e}", value)
    }
}

fn format_comments<W: Write>(w: &mut W, comments: &[String]) -> Result<()> {
    for comment in comments {
        writeln!(w, "{} {}", COMMENT, comment)?;
    }
    Ok(())
}

fn format_key_value<W: Write>(w: &mut W, key: &str, value: &str) -> Result<()> {
    writeln!(w, "{:<20} = {}", key, value)
}

fn format_section<W: Write>(w: &mut W, section: &RawSection) -> Result<()> {
    format_comments(w, &section.comments)?;
    for (key, value) in section.fields.iter() {
        format_key_value(w, key, value)?;
    }
    Ok(())
}

/// Formats [RawMessage] as KVN
pub fn format<W: Write>(raw: &RawMessage, w: &mut W) -> Result<()> {
    format_key_value(w, VERSION_KEY, &raw.version)?;
    format_section(w, &raw.header)?;

    for segment in raw.segments.iter() {
        writeln!(w)?;
        writeln!(w, "{}", META_START)?;
        format_section(w, &segment.metadata)?;
        writeln!(w, "{}", META_STOP)?;
        writeln!(w)?;

        format_comments(w, &segment.data_comments)?;
        for state in segment.states.iter() {
            writeln!(
                w,
                "{} {}",
                state.epoch,
                state.values.iter().map(|v| format_float(*v)).join(" ")
            )?;
        }

        if segment.covariances.is_empty() && segment.covariance_comments.is_empty() {
            continue;
        }

        writeln!(w)?;
        writeln!(w, "{}", COVARIANCE_START)?;
        format_comments(w, &segment.covariance_comments)?;

        for covariance in segment.covariances.iter() {
            format_key_value(w, EPOCH, &covariance.epoch)?;
            if let Some(frame) = &covariance.frame {
                format_key_value(w, COV_REF_FRAME, frame)?;
            }
            let mut values = covariance.values.iter();
            let mut row = 1;
            loop {
                let terms = values.by_ref().take(row).map(|v| format_float(*v)).collect::<Vec<_>>();
                if terms.is_empty() {
                    break;
                }
                writeln!(w, "{}", terms.join(" "))?;
                row += 1;
            }
        }

        writeln!(w, "{}", COVARIANCE_STOP)?;
    }

    w.flush()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn float_formatting() {
        for value in [
            0.0,
            1.0,
            -2789.6190000001,
            7.123456789012345,
            1.0E-9,
            -3.3313494e-04,
            6.7e10,
            f64::MIN_POSITIVE,
        ] {
            let formatted = format_float(value);
            assert_eq!(formatted.parse::<f64>().unwrap(), value, "{}", formatted);
        }
        assert_eq!(format_float(1.5), "1.5");
        assert_eq!(format_float(1.0E-9), "1e-9");
    }
}
