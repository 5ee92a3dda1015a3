//! Payload and line formatting

use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

/// Timestamp layout for file records: date, time, microseconds
pub const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S%.6f";

/// Suffix layout appended to archived log files
pub const ARCHIVE_SUFFIX_FORMAT: &str = "%Y%m%d%H%M%S";

/// Join values into a single payload, separated by spaces
///
/// ```
/// use simplelog_core::format::format_values;
/// assert_eq!(format_values(&[&"answer", &42]), "answer 42");
/// ```
pub fn format_values(values: &[&dyn fmt::Display]) -> String {
    let mut payload = String::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            payload.push(' ');
        }
        let _ = write!(payload, "{}", value);
    }
    payload
}

/// Line written to stdout: prefix and payload, no timestamp
pub fn stdout_line(prefix: &str, payload: &str) -> String {
    format!("{prefix}{payload}\n")
}

/// Line written to a log file: prefix, timestamp, payload
pub fn file_line(prefix: &str, at: DateTime<Local>, payload: &str) -> String {
    format!("{prefix}{} {payload}\n", at.format(TIMESTAMP_FORMAT))
}

/// Name an old log file is renamed to when it is archived
pub fn archive_path(path: &Path, at: DateTime<Local>) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!("_{}", at.format(ARCHIVE_SUFFIX_FORMAT)));
    PathBuf::from(name)
}

/// Check that a file line starts with a well-formed timestamp
pub fn parse_timestamp(line: &str) -> Option<chrono::NaiveDateTime> {
    // "2024/01/02 03:04:05.123456" is 26 chars
    let stamp = line.get(..26)?;
    chrono::NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap()
    }

    #[test]
    fn test_format_values_joins_with_spaces() {
        assert_eq!(
            format_values(&[&"The answer to all questions is", &42]),
            "The answer to all questions is 42"
        );
        assert_eq!(format_values(&[&1.5, &true, &'c']), "1.5 true c");
    }

    #[test]
    fn test_format_values_empty() {
        assert_eq!(format_values(&[]), "");
    }

    #[test]
    fn test_stdout_line_has_no_timestamp() {
        assert_eq!(stdout_line("", "x"), "x\n");
        assert_eq!(stdout_line("[app] ", "x"), "[app] x\n");
    }

    #[test]
    fn test_file_line_layout() {
        let line = file_line("", fixed_time(), "answer 42");
        assert_eq!(line, "2024/03/09 07:05:01.000000 answer 42\n");

        let line = file_line("[app] ", fixed_time(), "x");
        assert_eq!(line, "[app] 2024/03/09 07:05:01.000000 x\n");
    }

    #[test]
    fn test_archive_path_suffix() {
        let archived = archive_path(Path::new("/tmp/app.log"), fixed_time());
        assert_eq!(archived, PathBuf::from("/tmp/app.log_20240309070501"));
    }

    #[test]
    fn test_parse_timestamp() {
        let line = file_line("", fixed_time(), "hello");
        assert!(parse_timestamp(&line).is_some());
        assert!(parse_timestamp("hello").is_none());
        assert!(parse_timestamp("not a timestamp at all, but long enough").is_none());
    }
}
