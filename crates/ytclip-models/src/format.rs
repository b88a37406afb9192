//! Format listing entries derived from `yt-dlp -F` output.

use serde::{Deserialize, Serialize};

/// Bitrate placeholder when the listing carries no size/bitrate token.
pub const BITRATE_NOT_AVAILABLE: &str = "N/A";

/// What kind of streams a format carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatType {
    #[serde(rename = "audio and video")]
    AudioAndVideo,
    #[serde(rename = "audio only")]
    AudioOnly,
    #[serde(rename = "video only")]
    VideoOnly,
}

impl FormatType {
    /// Derive the type from a listing label (`audio only`, `video only`, or a resolution).
    pub fn from_label(label: &str) -> Self {
        match label {
            "audio only" => FormatType::AudioOnly,
            "video only" => FormatType::VideoOnly,
            _ => FormatType::AudioAndVideo,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FormatType::AudioAndVideo => "audio and video",
            FormatType::AudioOnly => "audio only",
            FormatType::VideoOnly => "video only",
        }
    }
}

/// One row of a format listing. Recomputed on every listing, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatRecord {
    pub id: String,
    pub extension: String,
    /// Resolution (`1920x1080`, `720p`) or `audio only` / `video only`
    pub label: String,
    pub codec: String,
    /// Size/bitrate token, or [`BITRATE_NOT_AVAILABLE`]
    pub bitrate: String,
    pub format_type: FormatType,
    /// Free-form text after the `|` separator
    pub raw_remainder: String,
}

impl FormatRecord {
    /// File extension with a leading dot, as used for output paths.
    pub fn dotted_extension(&self) -> String {
        format!(".{}", self.extension)
    }
}
