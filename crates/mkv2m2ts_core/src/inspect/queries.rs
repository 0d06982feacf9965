//! Field queries over report tracks.
//!
//! Each query distinguishes a field that is absent from one whose text does
//! not have the expected shape, so errors can say which it was.

use crate::errors::{ConvertError, ConvertResult};
use crate::models::VideoLevel;

use super::report::ReportTrack;

/// Result of looking up and parsing one report field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query<T> {
    /// Field present and parsed.
    Found(T),
    /// Field absent or empty.
    Missing,
    /// Field present but unparseable; carries the raw text.
    Malformed(String),
}

impl<T> Query<T> {
    /// Convert into a result, failing with `ParseError(field)`.
    pub fn require(self, field: &str) -> ConvertResult<T> {
        match self {
            Query::Found(value) => Ok(value),
            Query::Missing => Err(ConvertError::parse_error(field, "field is missing")),
            Query::Malformed(raw) => Err(ConvertError::parse_error(
                field,
                format!("unexpected value '{}'", raw),
            )),
        }
    }
}

/// Look up `field` on `track` and run `parse` over its text.
pub fn query<T, F>(track: &ReportTrack, field: &str, parse: F) -> Query<T>
where
    F: FnOnce(&str) -> Option<T>,
{
    match track.field(field).map(str::trim).filter(|v| !v.is_empty()) {
        None => Query::Missing,
        Some(raw) => match parse(raw) {
            Some(value) => Query::Found(value),
            None => Query::Malformed(raw.to_string()),
        },
    }
}

/// Raw text of a field.
pub fn query_text(track: &ReportTrack, field: &str) -> Query<String> {
    query(track, field, |raw| Some(raw.to_string()))
}

/// Report `ID` (1-based) to a 0-based extraction index.
///
/// Only the leading digits count, so `"2 (0x2)"` is track index 1.
pub fn parse_track_index(raw: &str) -> Option<usize> {
    let digits: String = raw.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    let id: usize = digits.parse().ok()?;
    id.checked_sub(1)
}

/// `@L<1-9>.<0-9>` inside a format profile such as `High@L4.1`.
pub fn parse_level(raw: &str) -> Option<VideoLevel> {
    let bytes = raw.as_bytes();
    bytes.windows(5).find_map(|w| match w {
        [b'@', b'L' | b'l', major @ b'1'..=b'9', b'.', minor @ b'0'..=b'9'] => {
            Some(VideoLevel::new(major - b'0', minor - b'0'))
        }
        _ => None,
    })
}

/// `<digits>.<digits> fps`, returning the number exactly as written.
pub fn parse_fps(raw: &str) -> Option<String> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    tokens.windows(2).find_map(|pair| {
        let (number, unit) = (pair[0], pair[1]);
        (unit.eq_ignore_ascii_case("fps") && is_decimal(number)).then(|| number.to_string())
    })
}

/// Bitrate in kbps from text such as `1 509 Kbps` or `768 kb/s`.
///
/// DTS-HD tracks list several values separated by `/`, e.g.
/// `Unknown / 1 509 Kbps`; the first number followed by a kbps unit wins.
/// mediainfo groups thousands with spaces, so the digit groups directly
/// before the unit belong to the number.
pub fn parse_bitrate_kbps(raw: &str) -> Option<u32> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    tokens.iter().enumerate().find_map(|(i, unit)| {
        let unit = unit.to_ascii_lowercase();
        if unit != "kbps" && unit != "kb/s" {
            return None;
        }
        let groups = tokens[..i]
            .iter()
            .rev()
            .take_while(|t| t.chars().all(|c| c.is_ascii_digit()))
            .collect::<Vec<_>>();
        if groups.is_empty() {
            return None;
        }
        let digits: String = groups.into_iter().rev().copied().collect();
        digits.parse().ok()
    })
}

/// Channel count from text such as `6 channels` or `8 / 6 channels`.
///
/// The first single digit directly followed by `channel` or `channels`
/// is the count.
pub fn parse_channels(raw: &str) -> Option<u8> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    tokens.windows(2).find_map(|pair| {
        let (count, unit) = (pair[0], pair[1]);
        let unit = unit.to_ascii_lowercase();
        let is_unit = unit == "channel" || unit == "channels";
        (is_unit && count.len() == 1).then(|| count.parse().ok()).flatten()
    })
}

/// Whether a track language is acceptable: absent, empty or English.
pub fn is_english_or_unspecified(language: Option<&str>) -> bool {
    match language.map(str::trim) {
        None => true,
        Some(lang) => lang.is_empty() || lang.eq_ignore_ascii_case("english"),
    }
}

fn is_decimal(text: &str) -> bool {
    match text.split_once('.') {
        Some((int, frac)) => {
            !int.is_empty()
                && !frac.is_empty()
                && int.chars().all(|c| c.is_ascii_digit())
                && frac.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::report::TrackKind;

    #[test]
    fn track_index_is_id_minus_one() {
        assert_eq!(parse_track_index("1"), Some(0));
        assert_eq!(parse_track_index(" 3 "), Some(2));
        assert_eq!(parse_track_index("2 (0x2)"), Some(1));
        assert_eq!(parse_track_index("0"), None);
        assert_eq!(parse_track_index("abc"), None);
    }

    #[test]
    fn level_from_profile() {
        assert_eq!(parse_level("High@L4.1"), Some(VideoLevel::new(4, 1)));
        assert_eq!(parse_level("High 10@L5.1"), Some(VideoLevel::new(5, 1)));
        assert_eq!(parse_level("Main@L3.0"), Some(VideoLevel::new(3, 0)));
        assert_eq!(parse_level("High"), None);
        assert_eq!(parse_level("High@L0.9"), None);
        assert_eq!(parse_level("High@L4"), None);
    }

    #[test]
    fn fps_kept_verbatim() {
        assert_eq!(parse_fps("23.976 fps"), Some("23.976".to_string()));
        assert_eq!(parse_fps("25.000 FPS"), Some("25.000".to_string()));
        assert_eq!(parse_fps("24 fps"), None);
        assert_eq!(parse_fps("Variable"), None);
    }

    #[test]
    fn bitrate_joins_digit_groups() {
        assert_eq!(parse_bitrate_kbps("1 509 Kbps"), Some(1509));
        assert_eq!(parse_bitrate_kbps("768 KBPS"), Some(768));
        assert_eq!(parse_bitrate_kbps("1536 kb/s"), Some(1536));
        assert_eq!(parse_bitrate_kbps("1.5 Mbps"), None);
        assert_eq!(parse_bitrate_kbps("Kbps"), None);
    }

    #[test]
    fn bitrate_from_multi_value_fields() {
        assert_eq!(parse_bitrate_kbps("Unknown / 1 509 Kbps"), Some(1509));
        assert_eq!(parse_bitrate_kbps("3 573 kb/s / 1 509 kb/s"), Some(3573));
        assert_eq!(parse_bitrate_kbps("Variable / 1509 KBPS"), Some(1509));
        assert_eq!(parse_bitrate_kbps("Unknown / Variable"), None);
        assert_eq!(parse_bitrate_kbps("1 509 Kbps (approx.)"), Some(1509));
    }

    #[test]
    fn channels_from_text() {
        assert_eq!(parse_channels("6 channels"), Some(6));
        assert_eq!(parse_channels("1 channel"), Some(1));
        assert_eq!(parse_channels("6 CHANNELS"), Some(6));
        assert_eq!(parse_channels("6"), None);
        assert_eq!(parse_channels("six channels"), None);
    }

    #[test]
    fn channels_from_multi_value_fields() {
        assert_eq!(parse_channels("8 / 6 channels"), Some(6));
        assert_eq!(parse_channels("Object Based / 6 channels"), Some(6));
        assert_eq!(parse_channels("8 channels / 6 channels"), Some(8));
        assert_eq!(parse_channels("8 / 6"), None);
        assert_eq!(parse_channels("10 channels"), None);
    }

    #[test]
    fn language_filter() {
        assert!(is_english_or_unspecified(None));
        assert!(is_english_or_unspecified(Some("")));
        assert!(is_english_or_unspecified(Some("ENGLISH")));
        assert!(!is_english_or_unspecified(Some("French")));
    }

    #[test]
    fn query_distinguishes_missing_and_malformed() {
        let track = ReportTrack::new(
            TrackKind::Video,
            [("Format_profile", "High"), ("Frame_rate", "")],
        );

        assert_eq!(query(&track, "Format_profile", parse_level), Query::Malformed("High".into()));
        assert_eq!(query(&track, "Frame_rate", parse_fps), Query::Missing);
        assert_eq!(query(&track, "ID", parse_track_index), Query::Missing);

        let err = query(&track, "Format_profile", parse_level)
            .require("Format_profile")
            .unwrap_err();
        assert!(err.to_string().contains("'High'"));
    }
}
