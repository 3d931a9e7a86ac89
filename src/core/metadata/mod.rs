//! # Metadata Module
//!
//! Reads creation dates from photos and videos with `exiftool -G -j`.
//!
//! ## Date Keys
//! Grouped tag names are looked up in order, depending on the MIME type that
//! exiftool reports in `File:MIMEType`:
//! - `image/` - SubSec composites first, then the raw EXIF tags
//! - `video/` - QuickTime creation dates
//!
//! exiftool prints dates as `YYYY:MM:DD HH:MM:SS[.sss][+zz:zz]`; only the
//! first 19 characters are used once the date part is normalized.

use crate::core::external::ExternalTool;
use crate::error::{ExternalError, MetadataError, Result};
use chrono::NaiveDateTime;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

const DATE_KEYS_BY_PREFIX: &[(&str, &[&str])] = &[
    (
        "image/",
        &[
            "Composite:SubSecDateTimeOriginal",
            "Composite:SubSecCreateDate",
            "EXIF:DateTimeOriginal",
            "EXIF:CreateDate",
        ],
    ),
    (
        "video/",
        &[
            "QuickTime:CreationDate",
            "QuickTime:CreateDate",
            "QuickTime:MediaCreateDate",
        ],
    ),
];

const DATE_LENGTH: usize = 19;

/// Parse an exiftool date, ignoring sub-seconds and timezone
pub fn parse_date(text: &str) -> std::result::Result<NaiveDateTime, MetadataError> {
    let invalid = || MetadataError::InvalidDate {
        text: text.to_string(),
    };
    let normalized = text.replacen(':', "-", 2);
    let head = normalized.get(..DATE_LENGTH).ok_or_else(invalid)?;
    NaiveDateTime::parse_from_str(head, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(head, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| invalid())
}

/// Pick the creation date out of one exiftool record
pub fn date_from_tags(
    tags: &Map<String, Value>,
    path: &Path,
) -> std::result::Result<NaiveDateTime, MetadataError> {
    let mime = tags
        .get("File:MIMEType")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let Some((_, keys)) = DATE_KEYS_BY_PREFIX
        .iter()
        .find(|(prefix, _)| mime.starts_with(prefix))
    else {
        return Err(MetadataError::UnsupportedType {
            mime: mime.to_string(),
            path: path.to_path_buf(),
        });
    };

    for key in keys.iter() {
        if let Some(value) = tags.get(*key).and_then(Value::as_str) {
            debug!(path = %path.display(), key, value, "creation date found");
            return parse_date(value);
        }
    }
    Err(MetadataError::NoDate {
        path: path.to_path_buf(),
    })
}

/// Run exiftool on `path` and return its creation date
pub fn get_create_date(exiftool: &ExternalTool, path: &Path) -> Result<NaiveDateTime> {
    if !path.exists() {
        return Err(MetadataError::Missing {
            path: path.to_path_buf(),
        }
        .into());
    }

    let command = exiftool.command([path])?;
    let stdout = command.output()?;
    let invalid = |reason: String| ExternalError::InvalidOutput {
        command: command.to_string(),
        reason,
    };

    let payload: Vec<Map<String, Value>> =
        serde_json::from_str(&stdout).map_err(|e| invalid(e.to_string()))?;
    let [tags] = payload.as_slice() else {
        return Err(invalid(format!("expected one record, got {}", payload.len())).into());
    };

    Ok(date_from_tags(tags, path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn tags(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn parse_date_drops_subseconds() {
        let date = parse_date("2023:07:04 10:20:30.500").unwrap();
        let expected = NaiveDate::from_ymd_opt(2023, 7, 4)
            .unwrap()
            .and_hms_opt(10, 20, 30)
            .unwrap();
        assert_eq!(date, expected);
    }

    #[test]
    fn parse_date_drops_timezone() {
        let date = parse_date("2021:12:31 23:59:58+01:00").unwrap();
        assert_eq!(date.to_string(), "2021-12-31 23:59:58");
    }

    #[test]
    fn short_dates_are_invalid() {
        assert!(matches!(
            parse_date("2023:07:04"),
            Err(MetadataError::InvalidDate { .. })
        ));
        assert!(parse_date("not a date at all, really").is_err());
    }

    #[test]
    fn image_keys_follow_precedence() {
        let record = tags(json!({
            "File:MIMEType": "image/jpeg",
            "EXIF:CreateDate": "2020:01:01 00:00:00",
            "EXIF:DateTimeOriginal": "2019:05:06 07:08:09",
        }));

        let date = date_from_tags(&record, Path::new("a.jpg")).unwrap();

        assert_eq!(date.to_string(), "2019-05-06 07:08:09");
    }

    #[test]
    fn video_keys() {
        let record = tags(json!({
            "File:MIMEType": "video/mp4",
            "QuickTime:MediaCreateDate": "2022:02:03 04:05:06",
        }));

        let date = date_from_tags(&record, Path::new("a.mp4")).unwrap();

        assert_eq!(date.to_string(), "2022-02-03 04:05:06");
    }

    #[test]
    fn missing_date_and_unsupported_type() {
        let no_date = tags(json!({ "File:MIMEType": "image/png" }));
        assert!(matches!(
            date_from_tags(&no_date, Path::new("a.png")),
            Err(MetadataError::NoDate { .. })
        ));

        let text = tags(json!({ "File:MIMEType": "text/plain" }));
        assert!(matches!(
            date_from_tags(&text, Path::new("a.txt")),
            Err(MetadataError::UnsupportedType { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn get_create_date_reads_json_from_the_tool() {
        use std::io::Write;

        let temp = tempfile::tempdir().unwrap();
        let photo = temp.path().join("photo.jpg");
        std::fs::write(&photo, b"").unwrap();

        // A stand-in exiftool printing a fixed record, run through sh
        let script = temp.path().join("fake-exiftool");
        let mut file = std::fs::File::create(&script).unwrap();
        writeln!(
            file,
            "echo '[{{\"File:MIMEType\":\"image/jpeg\",\"EXIF:DateTimeOriginal\":\"2023:07:04 10:20:30\"}}]'"
        )
        .unwrap();
        drop(file);

        let tool = ExternalTool::new("sh").common_args([&script]);
        let date = get_create_date(&tool, &photo).unwrap();

        assert_eq!(date.to_string(), "2023-07-04 10:20:30");
    }

    #[test]
    fn missing_file_is_reported_before_running_the_tool() {
        let tool = ExternalTool::new("exiftool-that-does-not-exist");
        let result = get_create_date(&tool, Path::new("/nonexistent/photo.jpg"));
        assert!(matches!(
            result,
            Err(crate::error::ToolError::Metadata(MetadataError::Missing { .. }))
        ));
    }
}
