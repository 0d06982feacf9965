//! Running mediainfo and deriving the stream selection from its report.

use std::path::Path;

use crate::errors::{ConvertError, ConvertResult};
use crate::logging::RunLogger;
use crate::models::{
    AudioCodec, AudioSelection, AudioStream, DtsDetails, MediaSummary, VideoStream, AVC_CODEC_ID,
};
use crate::tools::{CommandRunner, Invocation, Tool, Toolchain};

use super::queries::{
    is_english_or_unspecified, parse_bitrate_kbps, parse_channels, parse_fps, parse_level,
    parse_track_index, query, query_text,
};
use super::report::{MediaReport, ReportTrack, TrackKind};

const CONTAINER_FORMAT: &str = "Matroska";

/// Build the `mediainfo --Output=XML <input>` invocation.
pub fn build_mediainfo_invocation(mediainfo: &Path, input: &Path) -> Invocation {
    Invocation::new(mediainfo).arg("--Output=XML").path_arg(input)
}

/// Run mediainfo on `input` and parse its report.
pub fn run_mediainfo<R: CommandRunner + ?Sized>(
    runner: &R,
    tools: &Toolchain,
    input: &Path,
    logger: &RunLogger,
) -> ConvertResult<MediaReport> {
    let invocation = build_mediainfo_invocation(tools.require(Tool::MediaInfo)?, input);
    logger.command(&invocation.display());

    let output = runner
        .run(&invocation)
        .map_err(|e| ConvertError::io_error("running mediainfo", e))?;

    if !output.success() {
        logger.tool_output(&output.combined());
        return Err(ConvertError::InspectionFailed {
            message: format!("mediainfo exited with code {}", output.code()),
            output,
        });
    }

    MediaReport::parse(&output.stdout)
}

/// Run mediainfo and select the streams to convert.
pub fn inspect<R: CommandRunner + ?Sized>(
    runner: &R,
    tools: &Toolchain,
    input: &Path,
    selection: AudioSelection,
    logger: &RunLogger,
) -> ConvertResult<MediaSummary> {
    let report = run_mediainfo(runner, tools, input, logger)?;
    summarize(&report, selection, logger)
}

/// Derive the stream selection from a parsed report.
///
/// Checks run in a fixed order: container, video, then audio. The first
/// failing check decides the error.
pub fn summarize(
    report: &MediaReport,
    selection: AudioSelection,
    logger: &RunLogger,
) -> ConvertResult<MediaSummary> {
    let container = check_container(report)?;
    let video = select_video(report, logger)?;
    let audio = select_audio(report, selection, logger)?;

    logger.info(&format!(
        "Video: track {} level {} at {} fps",
        video.track_index, video.level, video.fps
    ));
    logger.info(&format!(
        "Audio: track {} {} ({})",
        audio.track_index,
        audio.codec,
        audio.language.as_deref().unwrap_or("unspecified language")
    ));

    Ok(MediaSummary {
        container,
        video,
        audio,
    })
}

fn check_container(report: &MediaReport) -> ConvertResult<String> {
    let general = report
        .general()
        .ok_or_else(|| ConvertError::parse_error("General", "no General track in report"))?;

    let format = query_text(general, "Format").require("Format")?;
    if !format.eq_ignore_ascii_case(CONTAINER_FORMAT) {
        return Err(ConvertError::UnsupportedContainer(format));
    }
    Ok(format)
}

fn select_video(report: &MediaReport, logger: &RunLogger) -> ConvertResult<VideoStream> {
    let videos: Vec<&ReportTrack> = report.tracks_of(TrackKind::Video).collect();
    let track = match videos.as_slice() {
        [] => return Err(ConvertError::parse_error("Video", "no video track in report")),
        [only] => *only,
        [first, ..] => {
            logger.warn(&format!(
                "{} video tracks found, using the first one",
                videos.len()
            ));
            *first
        }
    };

    let track_index = query(track, "ID", parse_track_index).require("ID")?;

    let codec_id = query_text(track, "Codec_ID").require("Codec_ID")?;
    if codec_id != AVC_CODEC_ID {
        return Err(ConvertError::UnsupportedVideoCodec(codec_id));
    }

    let level = query(track, "Format_profile", parse_level).require("Format_profile")?;
    let fps = query(track, "Frame_rate", parse_fps).require("Frame_rate")?;

    Ok(VideoStream {
        track_index,
        codec_id,
        level,
        fps,
    })
}

fn select_audio(
    report: &MediaReport,
    selection: AudioSelection,
    logger: &RunLogger,
) -> ConvertResult<AudioStream> {
    let candidates: Vec<(&ReportTrack, AudioCodec)> = report
        .tracks_of(TrackKind::Audio)
        .filter_map(|track| {
            let codec_id = track.field("Codec_ID")?;
            let Some(codec) = AudioCodec::from_codec_id(codec_id) else {
                logger.debug(&format!("Skipping audio track with codec {}", codec_id));
                return None;
            };
            let language = track.field("Language");
            if !is_english_or_unspecified(language) {
                logger.debug(&format!(
                    "Skipping {} audio track in {}",
                    codec,
                    language.unwrap_or_default()
                ));
                return None;
            }
            Some((track, codec))
        })
        .collect();

    let chosen = match selection {
        AudioSelection::FirstMatch => candidates.first(),
        AudioSelection::CodecPriority => candidates.iter().min_by_key(|(_, c)| c.priority()),
    };
    let (track, codec) = *chosen.ok_or(ConvertError::NoSupportedAudioTrack)?;

    let track_index = query(track, "ID", parse_track_index).require("ID")?;
    let language = track
        .field("Language")
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string);

    let dts = if codec == AudioCodec::Dts {
        Some(DtsDetails {
            bitrate_kbps: query(track, "Bit_rate", parse_bitrate_kbps).require("Bit_rate")?,
            channels: query(track, "Channel_s_", parse_channels).require("Channel_s_")?,
        })
    } else {
        None
    };

    Ok(AudioStream {
        track_index,
        codec,
        language,
        dts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VideoLevel;

    fn report(general_format: &str, audio: &[(&str, &str, Option<&str>)]) -> MediaReport {
        let mut tracks = vec![
            ReportTrack::new(TrackKind::General, [("Format", general_format)]),
            ReportTrack::new(
                TrackKind::Video,
                [
                    ("ID", "1"),
                    ("Codec_ID", AVC_CODEC_ID),
                    ("Format_profile", "High@L4.1"),
                    ("Frame_rate", "23.976 fps"),
                ],
            ),
        ];
        for (id, codec, language) in audio {
            let mut fields = vec![
                ("ID", id.to_string()),
                ("Codec_ID", codec.to_string()),
                ("Bit_rate", "1 509 Kbps".to_string()),
                ("Channel_s_", "6 channels".to_string()),
            ];
            if let Some(lang) = language {
                fields.push(("Language", lang.to_string()));
            }
            tracks.push(ReportTrack::new(TrackKind::Audio, fields));
        }
        MediaReport::from_tracks(tracks)
    }

    #[test]
    fn non_matroska_is_rejected_first() {
        let report = report("MPEG-4", &[]);
        let err = summarize(&report, AudioSelection::FirstMatch, &RunLogger::default()).unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedContainer(ref f) if f == "MPEG-4"));
    }

    #[test]
    fn video_fields_are_derived() {
        let report = report("Matroska", &[("2", "A_AC3", None)]);
        let summary = summarize(&report, AudioSelection::FirstMatch, &RunLogger::default()).unwrap();

        assert_eq!(summary.video.track_index, 0);
        assert_eq!(summary.video.level, VideoLevel::new(4, 1));
        assert!(summary.video.level.needs_override());
        assert_eq!(summary.video.fps, "23.976");
    }

    #[test]
    fn non_english_audio_is_filtered() {
        let report = report(
            "Matroska",
            &[("2", "A_AC3", Some("French")), ("3", "A_DTS", Some("English"))],
        );
        let summary = summarize(&report, AudioSelection::FirstMatch, &RunLogger::default()).unwrap();

        assert_eq!(summary.audio.codec, AudioCodec::Dts);
        assert_eq!(summary.audio.track_index, 2);
        assert_eq!(
            summary.audio.dts,
            Some(DtsDetails {
                bitrate_kbps: 1509,
                channels: 6
            })
        );
    }

    #[test]
    fn first_match_follows_report_order() {
        let report = report(
            "Matroska",
            &[("2", "A_AC3", Some("English")), ("3", "A_DTS", Some("English"))],
        );
        let summary = summarize(&report, AudioSelection::FirstMatch, &RunLogger::default()).unwrap();
        assert_eq!(summary.audio.codec, AudioCodec::Ac3);
        assert_eq!(summary.audio.track_index, 1);
        assert!(summary.audio.dts.is_none());
    }

    #[test]
    fn codec_priority_prefers_dts() {
        let report = report(
            "Matroska",
            &[
                ("2", "A_AAC", None),
                ("3", "A_AC3", Some("English")),
                ("4", "A_DTS", Some("English")),
            ],
        );
        let summary =
            summarize(&report, AudioSelection::CodecPriority, &RunLogger::default()).unwrap();
        assert_eq!(summary.audio.codec, AudioCodec::Dts);
        assert_eq!(summary.audio.track_index, 3);
    }

    #[test]
    fn unsupported_or_foreign_audio_only_fails() {
        let report = report(
            "Matroska",
            &[("2", "A_TRUEHD", None), ("3", "A_AC3", Some("German"))],
        );
        let err = summarize(&report, AudioSelection::FirstMatch, &RunLogger::default()).unwrap_err();
        assert!(matches!(err, ConvertError::NoSupportedAudioTrack));
    }

    #[test]
    fn wrong_video_codec_is_rejected() {
        let report = MediaReport::from_tracks(vec![
            ReportTrack::new(TrackKind::General, [("Format", "Matroska")]),
            ReportTrack::new(
                TrackKind::Video,
                [
                    ("ID", "1"),
                    ("Codec_ID", "V_MPEGH/ISO/HEVC"),
                    ("Format_profile", "Main@L4.1"),
                    ("Frame_rate", "23.976 fps"),
                ],
            ),
        ]);
        let err = summarize(&report, AudioSelection::FirstMatch, &RunLogger::default()).unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedVideoCodec(ref c) if c == "V_MPEGH/ISO/HEVC"));
    }

    #[test]
    fn dts_without_bitrate_is_parse_error() {
        let report = MediaReport::from_tracks(vec![
            ReportTrack::new(TrackKind::General, [("Format", "Matroska")]),
            ReportTrack::new(
                TrackKind::Video,
                [
                    ("ID", "1"),
                    ("Codec_ID", AVC_CODEC_ID),
                    ("Format_profile", "High@L4.0"),
                    ("Frame_rate", "24.000 fps"),
                ],
            ),
            ReportTrack::new(
                TrackKind::Audio,
                [("ID", "2"), ("Codec_ID", "A_DTS"), ("Channel_s_", "6 channels")],
            ),
        ]);
        let err = summarize(&report, AudioSelection::FirstMatch, &RunLogger::default()).unwrap_err();
        assert!(matches!(err, ConvertError::ParseError { ref field, .. } if field == "Bit_rate"));
    }

    #[test]
    fn missing_video_track_is_parse_error() {
        let report = MediaReport::from_tracks(vec![ReportTrack::new(
            TrackKind::General,
            [("Format", "Matroska")],
        )]);
        let err = summarize(&report, AudioSelection::FirstMatch, &RunLogger::default()).unwrap_err();
        assert!(matches!(err, ConvertError::ParseError { ref field, .. } if field == "Video"));
    }
}
