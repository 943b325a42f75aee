//! Core type definitions for scenes, containers, codecs, and streams.
//!
//! This module defines enums used throughout scenevault for classifying probed
//! media and playback strategies. All enums serialize in lowercase for stable
//! storage and API output.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Container format of a probed video file.
///
/// Parsed from ffprobe's `format_name`, which reports demuxer groups such as
/// `matroska,webm` or `mov,mp4,m4a,3gp,3g2,mj2`. Formats outside the known set
/// map to [`Container::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Mp4,
    Mkv,
    Webm,
    Avi,
    Mov,
    Ts,
    Unknown,
}

impl Container {
    /// Parse a container from an ffprobe `format_name` value.
    ///
    /// ffprobe reports comma-separated demuxer aliases; the first recognized
    /// alias wins. Matroska and WebM share a demuxer, so the file extension is
    /// consulted to split them.
    pub fn from_format_name(format_name: &str, extension: Option<&str>) -> Self {
        for name in format_name.split(',') {
            match name.trim() {
                "matroska" | "webm" => {
                    return if extension == Some("webm") {
                        Self::Webm
                    } else {
                        Self::Mkv
                    };
                }
                "mp4" | "mov" => {
                    return if extension == Some("mov") {
                        Self::Mov
                    } else {
                        Self::Mp4
                    };
                }
                "avi" => return Self::Avi,
                "mpegts" => return Self::Ts,
                _ => continue,
            }
        }
        Self::Unknown
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mp4 => write!(f, "mp4"),
            Self::Mkv => write!(f, "mkv"),
            Self::Webm => write!(f, "webm"),
            Self::Avi => write!(f, "avi"),
            Self::Mov => write!(f, "mov"),
            Self::Ts => write!(f, "ts"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl FromStr for Container {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "mp4" => Self::Mp4,
            "mkv" => Self::Mkv,
            "webm" => Self::Webm,
            "avi" => Self::Avi,
            "mov" => Self::Mov,
            "ts" => Self::Ts,
            _ => Self::Unknown,
        })
    }
}

/// Video codec of a probed video track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    H264,
    Hevc,
    Vp8,
    Vp9,
    Av1,
    Mpeg4,
    Mpeg2,
    Other,
}

impl VideoCodec {
    /// Parse a codec from an ffprobe `codec_name` value.
    pub fn from_codec_name(codec_name: &str) -> Self {
        match codec_name {
            "h264" | "avc" => Self::H264,
            "hevc" | "h265" => Self::Hevc,
            "vp8" => Self::Vp8,
            "vp9" => Self::Vp9,
            "av1" => Self::Av1,
            "mpeg4" | "msmpeg4v3" => Self::Mpeg4,
            "mpeg2video" => Self::Mpeg2,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::H264 => write!(f, "h264"),
            Self::Hevc => write!(f, "hevc"),
            Self::Vp8 => write!(f, "vp8"),
            Self::Vp9 => write!(f, "vp9"),
            Self::Av1 => write!(f, "av1"),
            Self::Mpeg4 => write!(f, "mpeg4"),
            Self::Mpeg2 => write!(f, "mpeg2"),
            Self::Other => write!(f, "other"),
        }
    }
}

impl FromStr for VideoCodec {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "h264" => Self::H264,
            "hevc" => Self::Hevc,
            "vp8" => Self::Vp8,
            "vp9" => Self::Vp9,
            "av1" => Self::Av1,
            "mpeg4" => Self::Mpeg4,
            "mpeg2" => Self::Mpeg2,
            _ => Self::Other,
        })
    }
}

/// Playback strategy offered for a scene.
///
/// Kinds are ordered by serving cost: direct play serves raw bytes, remux
/// repackages without re-encoding, and the WEBM transcode re-encodes fully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    /// Serve the original file bytes unmodified.
    Direct,
    /// Repackage into an MP4 container without re-encoding.
    Remux,
    /// Re-encode into WEBM as the universal fallback.
    TranscodeWebm,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::Remux => write!(f, "remux"),
            Self::TranscodeWebm => write!(f, "transcodewebm"),
        }
    }
}

/// Kind of derived image attached to a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Thumbnail,
    Preview,
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Thumbnail => write!(f, "thumbnail"),
            Self::Preview => write!(f, "preview"),
        }
    }
}

impl FromStr for ImageKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "thumbnail" => Ok(Self::Thumbnail),
            "preview" => Ok(Self::Preview),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_from_format_name() {
        assert_eq!(
            Container::from_format_name("matroska,webm", Some("mkv")),
            Container::Mkv
        );
        assert_eq!(
            Container::from_format_name("matroska,webm", Some("webm")),
            Container::Webm
        );
        assert_eq!(
            Container::from_format_name("mov,mp4,m4a,3gp,3g2,mj2", Some("mp4")),
            Container::Mp4
        );
        assert_eq!(
            Container::from_format_name("mov,mp4,m4a,3gp,3g2,mj2", Some("mov")),
            Container::Mov
        );
        assert_eq!(Container::from_format_name("avi", Some("avi")), Container::Avi);
        assert_eq!(
            Container::from_format_name("ogg", Some("ogv")),
            Container::Unknown
        );
    }

    #[test]
    fn test_container_display_parse_roundtrip() {
        for c in [
            Container::Mp4,
            Container::Mkv,
            Container::Webm,
            Container::Avi,
            Container::Mov,
            Container::Ts,
        ] {
            assert_eq!(c.to_string().parse::<Container>().unwrap(), c);
        }
    }

    #[test]
    fn test_video_codec_from_codec_name() {
        assert_eq!(VideoCodec::from_codec_name("h264"), VideoCodec::H264);
        assert_eq!(VideoCodec::from_codec_name("hevc"), VideoCodec::Hevc);
        assert_eq!(VideoCodec::from_codec_name("h265"), VideoCodec::Hevc);
        assert_eq!(VideoCodec::from_codec_name("vp9"), VideoCodec::Vp9);
        assert_eq!(VideoCodec::from_codec_name("wmv3"), VideoCodec::Other);
    }

    #[test]
    fn test_stream_kind_serialization() {
        let json = serde_json::to_string(&StreamKind::TranscodeWebm).unwrap();
        assert_eq!(json, "\"transcodewebm\"");
        let kind: StreamKind = serde_json::from_str("\"direct\"").unwrap();
        assert_eq!(kind, StreamKind::Direct);
    }

    #[test]
    fn test_image_kind_roundtrip() {
        assert_eq!(
            ImageKind::Thumbnail.to_string().parse::<ImageKind>().unwrap(),
            ImageKind::Thumbnail
        );
        assert!("poster".parse::<ImageKind>().is_err());
    }
}
