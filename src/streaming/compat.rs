//! Codec/container compatibility table.
//!
//! Which video codecs each container format can legally carry. Kept as static
//! data so the remux decision is a lookup, not scattered conditionals.

use scenevault_common::{Container, VideoCodec};

/// Video codecs an MP4 container can carry.
const MP4_VIDEO_CODECS: &[VideoCodec] = &[
    VideoCodec::H264,
    VideoCodec::Hevc,
    VideoCodec::Vp9,
    VideoCodec::Av1,
];

/// Video codecs a WEBM container can carry.
const WEBM_VIDEO_CODECS: &[VideoCodec] = &[VideoCodec::Vp8, VideoCodec::Vp9, VideoCodec::Av1];

/// Video codecs an MPEG transport stream can carry.
const TS_VIDEO_CODECS: &[VideoCodec] = &[VideoCodec::H264, VideoCodec::Hevc, VideoCodec::Mpeg2];

/// Video codecs an AVI container can carry.
const AVI_VIDEO_CODECS: &[VideoCodec] = &[VideoCodec::Mpeg4, VideoCodec::H264, VideoCodec::Mpeg2];

/// Whether `codec` is valid inside `container`.
pub fn video_codec_fits_container(container: Container, codec: VideoCodec) -> bool {
    match container {
        Container::Mp4 | Container::Mov => MP4_VIDEO_CODECS.contains(&codec),
        Container::Webm => WEBM_VIDEO_CODECS.contains(&codec),
        Container::Ts => TS_VIDEO_CODECS.contains(&codec),
        Container::Avi => AVI_VIDEO_CODECS.contains(&codec),
        // Matroska carries effectively any video codec.
        Container::Mkv => codec != VideoCodec::Other,
        Container::Unknown => false,
    }
}
