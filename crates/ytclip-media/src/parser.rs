//! Parsers for yt-dlp's human-readable output.
//!
//! - `-F` format tables into [`FormatRecord`]s
//! - `--get-duration` strings into seconds

use std::sync::OnceLock;

use regex::Regex;
use ytclip_models::{FormatRecord, FormatType, BITRATE_NOT_AVAILABLE};

use crate::error::{MediaError, MediaResult};

/// Marker yt-dlp puts in the remainder of formats it could only fetch throttled.
const THROTTLED_MARKER: &str = "THROTTLED";

fn format_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\s*(\d+)\s+(\w+)\s+(audio only|video only|\d+x\d+|\d+p)\s+([a-zA-Z0-9._-]+)?\s*([~\d.]+(?:[kKM]i?B)?)?.*?\|\s+(.*?)$",
        )
        .expect("valid format line regex")
    })
}

fn bitrate_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([~\d.]+[kKM]i?B)").expect("valid bitrate regex"))
}

fn duration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+:\d{2}(?::\d{2})?").expect("valid duration regex"))
}

/// Parse a `yt-dlp -F` listing.
///
/// Lines that don't match the table grammar (headers, separators, warnings)
/// are skipped. Throttled formats are dropped.
pub fn parse_formats(text: &str) -> Vec<FormatRecord> {
    text.lines()
        .filter_map(|line| parse_format_line(line.trim_end_matches('\r')))
        .collect()
}

fn parse_format_line(line: &str) -> Option<FormatRecord> {
    let caps = format_line_regex().captures(line)?;
    let remainder = caps.get(6).map_or("", |m| m.as_str()).trim();

    if remainder.contains(THROTTLED_MARKER) {
        return None;
    }

    let label = caps.get(3).map_or("", |m| m.as_str());

    Some(FormatRecord {
        id: caps.get(1)?.as_str().to_string(),
        extension: caps.get(2)?.as_str().to_string(),
        label: label.to_string(),
        codec: caps.get(4).map_or("", |m| m.as_str()).trim().to_string(),
        bitrate: extract_bitrate(remainder),
        format_type: FormatType::from_label(label),
        raw_remainder: remainder.to_string(),
    })
}

/// First size/bitrate token (`128KiB`, `~1.2MiB`) in `text`, or `"N/A"`.
pub fn extract_bitrate(text: &str) -> String {
    bitrate_regex()
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| BITRATE_NOT_AVAILABLE.to_string())
}

/// First `H:MM` or `H:MM:SS` substring in `text`, or an empty string.
pub fn extract_duration_substring(text: &str) -> &str {
    duration_regex().find(text).map_or("", |m| m.as_str())
}

/// Convert `HH:MM:SS`, `MM:SS`, or `SS` into seconds.
///
/// Minute and second components must be within 0-59; hours are unbounded.
pub fn parse_duration(text: &str) -> MediaResult<u64> {
    let parts: Vec<&str> = text.trim().split(':').collect();

    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (
            parse_component(h, "hours", None)?,
            parse_component(m, "minutes", Some(59))?,
            parse_component(s, "seconds", Some(59))?,
        ),
        [m, s] => (
            0,
            parse_component(m, "minutes", Some(59))?,
            parse_component(s, "seconds", Some(59))?,
        ),
        [s] => (0, 0, parse_component(s, "seconds", Some(59))?),
        _ => {
            return Err(MediaError::invalid_duration(
                "invalid duration format: must be HH:MM:SS, MM:SS, or SS",
            ))
        }
    };

    Ok(hours * 3600 + minutes * 60 + seconds)
}

fn parse_component(value: &str, name: &str, max: Option<u64>) -> MediaResult<u64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MediaError::invalid_duration(format!(
            "invalid {name} value: {value:?}"
        )));
    }

    let parsed: u64 = value
        .parse()
        .map_err(|_| MediaError::invalid_duration(format!("invalid {name} value: {value:?}")))?;

    match max {
        Some(max) if parsed > max => Err(MediaError::invalid_duration(format!(
            "{name} out of range: {parsed}"
        ))),
        _ => Ok(parsed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
[youtube] Extracting URL: https://www.youtube.com/watch?v=dQw4w9WgXcQ
[info] Available formats for dQw4w9WgXcQ:
ID  EXT   RESOLUTION FPS CH |   FILESIZE   TBR PROTO | VCODEC        VBR ACODEC      ABR ASR MORE INFO
----------------------------------------------------------------------------------------------------
139 m4a   audio only      2 |    1.23MiB   49k https | audio only        mp4a.40.5   49k 22k [en] low, m4a_dash
140 m4a   audio only      2 |    3.27MiB  130k https | audio only        mp4a.40.2  130k 44k [en] medium, THROTTLED
18  mp4   640x360     30  2 |   10.50MiB  361k https | avc1.42001E       mp4a.40.2       44k [en] 360p
137 mp4   1920x1080   25    |  ~80.12MiB 4400k https | avc1.640028 4400k video only          1080p, mp4_dash
";

    #[test]
    fn test_parse_formats_skips_noise_and_throttled() {
        let formats = parse_formats(LISTING);
        let ids: Vec<&str> = formats.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["139", "18", "137"]);

        let audio = &formats[0];
        assert_eq!(audio.extension, "m4a");
        assert_eq!(audio.label, "audio only");
        assert_eq!(audio.format_type, FormatType::AudioOnly);
        assert_eq!(audio.bitrate, "1.23MiB");

        let muxed = &formats[1];
        assert_eq!(muxed.label, "640x360");
        assert_eq!(muxed.format_type, FormatType::AudioAndVideo);
        assert_eq!(muxed.bitrate, "10.50MiB");

        assert_eq!(formats[2].bitrate, "~80.12MiB");
    }

    #[test]
    fn test_parse_formats_without_bitrate() {
        let formats = parse_formats("22  mp4   1280x720    30 | https | avc1 mp4a");
        assert_eq!(formats.len(), 1);
        assert_eq!(formats[0].bitrate, BITRATE_NOT_AVAILABLE);
        assert_eq!(formats[0].raw_remainder, "https | avc1 mp4a");
    }

    #[test]
    fn test_parse_formats_empty() {
        assert!(parse_formats("").is_empty());
        assert!(parse_formats("ERROR: Sign in to confirm you're not a bot").is_empty());
    }

    #[test]
    fn test_extract_bitrate() {
        assert_eq!(extract_bitrate("128KiB"), "128KiB");
        assert_eq!(extract_bitrate("1.2MiB"), "1.2MiB");
        assert_eq!(extract_bitrate("~192KiB"), "~192KiB");
        assert_eq!(extract_bitrate("no data"), "N/A");
        assert_eq!(extract_bitrate(""), "N/A");
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("00:01:30").unwrap(), 90);
        assert_eq!(parse_duration("1:30").unwrap(), 90);
        assert_eq!(parse_duration("30").unwrap(), 30);
        assert_eq!(parse_duration("2:00:05").unwrap(), 7205);
        assert_eq!(parse_duration("120:00:00").unwrap(), 432_000);
    }

    #[test]
    fn test_parse_duration_rejects_out_of_range() {
        assert!(matches!(
            parse_duration("12:34:60"),
            Err(MediaError::InvalidDuration(_))
        ));
        assert!(parse_duration("12:60:00").is_err());
        assert!(parse_duration("60:00").is_err());
        assert!(parse_duration("75").is_err());
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("-1:30").is_err());
        assert!(parse_duration("+5").is_err());
        assert!(parse_duration("1:2:3:4").is_err());
        assert!(parse_duration("1::30").is_err());
    }

    #[test]
    fn test_extract_duration_substring() {
        assert_eq!(extract_duration_substring("Duration: 00:01:30"), "00:01:30");
        assert_eq!(extract_duration_substring("3:33\n"), "3:33");
        assert_eq!(extract_duration_substring("1:02:03 then 4:05"), "1:02:03");
        assert_eq!(extract_duration_substring("no duration here"), "");
    }
}
