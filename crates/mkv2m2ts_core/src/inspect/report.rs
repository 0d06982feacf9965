//! Typed view of the mediainfo XML report.
//!
//! The report is parsed once into a list of tracks, each carrying its
//! `type` attribute and the text of its child elements:
//! ```xml
//! <Mediainfo version="0.7.64">
//!   <File>
//!     <track type="General">
//!       <Format>Matroska</Format>
//!     </track>
//!     <track type="Video">
//!       <ID>1</ID>
//!       <Codec_ID>V_MPEG4/ISO/AVC</Codec_ID>
//!       <Format_profile>High@L4.1</Format_profile>
//!       <Frame_rate>23.976 fps</Frame_rate>
//!     </track>
//!   </File>
//! </Mediainfo>
//! ```

use std::fmt;

use crate::errors::{ConvertError, ConvertResult};

/// Kind of a report track, from its `type` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackKind {
    General,
    Video,
    Audio,
    Text,
    Menu,
    Other(String),
}

impl TrackKind {
    fn from_attr(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "general" => TrackKind::General,
            "video" => TrackKind::Video,
            "audio" => TrackKind::Audio,
            "text" => TrackKind::Text,
            "menu" => TrackKind::Menu,
            _ => TrackKind::Other(value.trim().to_string()),
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::General => f.write_str("General"),
            TrackKind::Video => f.write_str("Video"),
            TrackKind::Audio => f.write_str("Audio"),
            TrackKind::Text => f.write_str("Text"),
            TrackKind::Menu => f.write_str("Menu"),
            TrackKind::Other(name) => f.write_str(name),
        }
    }
}

/// One `<track>` element with its named fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTrack {
    pub kind: TrackKind,
    fields: Vec<(String, String)>,
}

impl ReportTrack {
    /// Create a track from `(name, value)` pairs.
    pub fn new<I, K, V>(kind: TrackKind, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            kind,
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Text of a field, matched case-insensitively; the first occurrence wins.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Parsed mediainfo report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaReport {
    tracks: Vec<ReportTrack>,
}

impl MediaReport {
    /// Parse the XML text produced by `mediainfo --Output=XML`.
    pub fn parse(xml: &str) -> ConvertResult<Self> {
        let doc = roxmltree::Document::parse(xml)
            .map_err(|e| ConvertError::parse_error("report", format!("XML parse error: {}", e)))?;

        let tracks = doc
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name().eq_ignore_ascii_case("track"))
            .filter_map(|node| {
                let kind = TrackKind::from_attr(node.attribute("type")?);
                let fields = node
                    .children()
                    .filter(|c| c.is_element())
                    .map(|c| {
                        let value = c.text().map(str::trim).unwrap_or_default();
                        (c.tag_name().name().to_string(), value.to_string())
                    })
                    .collect::<Vec<_>>();
                Some(ReportTrack { kind, fields })
            })
            .collect::<Vec<_>>();

        if tracks.is_empty() {
            return Err(ConvertError::parse_error("report", "no tracks in report"));
        }

        Ok(Self { tracks })
    }

    /// Build a report from already typed tracks.
    pub fn from_tracks(tracks: Vec<ReportTrack>) -> Self {
        Self { tracks }
    }

    /// All tracks in report order.
    pub fn tracks(&self) -> &[ReportTrack] {
        &self.tracks
    }

    /// Tracks of one kind, in report order.
    pub fn tracks_of(&self, kind: TrackKind) -> impl Iterator<Item = &ReportTrack> + '_ {
        self.tracks.iter().filter(move |t| t.kind == kind)
    }

    /// The General track, if present.
    pub fn general(&self) -> Option<&ReportTrack> {
        self.tracks_of(TrackKind::General).next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Mediainfo version="0.7.64">
<File>
<track type="General">
<Format>Matroska</Format>
<File_size>4.37 GiB</File_size>
</track>
<track type="Video">
<ID>1</ID>
<Format>AVC</Format>
<Codec_ID>V_MPEG4/ISO/AVC</Codec_ID>
<Format_profile>High@L4.1</Format_profile>
<Frame_rate>23.976 fps</Frame_rate>
</track>
<track type="Audio">
<ID>2</ID>
<Codec_ID>A_DTS</Codec_ID>
<Bit_rate>1 509 Kbps</Bit_rate>
<Channel_s_>6 channels</Channel_s_>
<Language>English</Language>
</track>
</File>
</Mediainfo>"#;

    #[test]
    fn parses_tracks_and_fields() {
        let report = MediaReport::parse(SAMPLE).unwrap();
        assert_eq!(report.tracks().len(), 3);

        let general = report.general().unwrap();
        assert_eq!(general.field("Format"), Some("Matroska"));

        let video = report.tracks_of(TrackKind::Video).next().unwrap();
        assert_eq!(video.field("codec_id"), Some("V_MPEG4/ISO/AVC"));
        assert_eq!(video.field("Language"), None);

        let audio = report.tracks_of(TrackKind::Audio).next().unwrap();
        assert_eq!(audio.field("Bit_rate"), Some("1 509 Kbps"));
    }

    #[test]
    fn malformed_xml_is_parse_error() {
        let err = MediaReport::parse("<Mediainfo><File>").unwrap_err();
        assert!(matches!(err, ConvertError::ParseError { ref field, .. } if field == "report"));
    }

    #[test]
    fn report_without_tracks_is_parse_error() {
        let err = MediaReport::parse("<Mediainfo><File/></Mediainfo>").unwrap_err();
        assert!(matches!(err, ConvertError::ParseError { .. }));
    }

    #[test]
    fn unknown_track_kind_is_kept() {
        let xml = r#"<Mediainfo><File><track type="Image"><ID>5</ID></track></File></Mediainfo>"#;
        let report = MediaReport::parse(xml).unwrap();
        assert_eq!(report.tracks()[0].kind, TrackKind::Other("Image".to_string()));
    }
}
