//! Line formatting for both log streams
//!
//! Everything here is pure: the timestamp and the call site are passed in,
//! nothing touches the filesystem.

use chrono::{DateTime, Local};
use oxidelog_core::{Level, RequestMeta, TIMESTAMP_FORMAT};
use std::fmt::Display;
use std::panic::Location;
use std::time::Duration;

/// Render an application log line, or `None` when `level` is below
/// `threshold`.
///
/// Layout: `timestamp LEVEL message[ at file:line]\n`
pub fn app_line(
    threshold: Level,
    level: Level,
    timestamp: &DateTime<Local>,
    message: impl Display,
    location: Option<&Location<'_>>,
) -> Option<String> {
    if !threshold.allows(level) {
        return None;
    }

    let mut line = format!(
        "{} {} {}",
        timestamp.format(TIMESTAMP_FORMAT),
        level,
        message
    );
    if let Some(loc) = location {
        line.push_str(&format!(" at {}:{}", loc.file(), loc.line()));
    }
    line.push('\n');
    Some(line)
}

/// Render an access log line.
///
/// Layout: `timestamp METHOD URL PROTOCOL from [client] with agent [agent]
/// in <N><unit> => status with <bytes> bytes \n`
pub fn access_line(
    timestamp: &DateTime<Local>,
    request: &RequestMeta,
    status: u16,
    content_length: u64,
    duration: Duration,
) -> String {
    format!(
        "{} {} {} {} from [{}] with agent [{}] in {} => {} with {} bytes \n",
        timestamp.format(TIMESTAMP_FORMAT),
        request.method,
        request.url,
        request.protocol,
        request.client_address(),
        request.user_agent(),
        format_duration(duration),
        status,
        content_length
    )
}

/// Largest unit with a non-zero magnitude among ms, μs and ns, truncated
pub fn format_duration(duration: Duration) -> String {
    let ms = duration.as_millis();
    if ms > 0 {
        return format!("{}ms", ms);
    }
    let us = duration.as_micros();
    if us > 0 {
        return format!("{}μs", us);
    }
    format!("{}ns", duration.as_nanos())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    #[test]
    fn test_app_line_layout() {
        let line = app_line(Level::Info, Level::Warn, &fixed_time(), "disk almost full", None);
        assert_eq!(line.as_deref(), Some("2024-03-09 14:05:07 WARN disk almost full\n"));
    }

    #[test]
    fn test_app_line_suppressed_below_threshold() {
        assert!(app_line(Level::Error, Level::Warn, &fixed_time(), "x", None).is_none());
        assert!(app_line(Level::Info, Level::Debug, &fixed_time(), "x", None).is_none());
    }

    #[test]
    fn test_level_matrix() {
        for threshold in Level::FILTERABLE {
            for level in Level::FILTERABLE {
                let rendered = app_line(threshold, level, &fixed_time(), "m", None).is_some();
                assert_eq!(
                    rendered,
                    level >= threshold,
                    "threshold {} level {}",
                    threshold,
                    level
                );
            }
        }
    }

    #[test]
    fn test_fatal_always_rendered() {
        for threshold in Level::FILTERABLE {
            let line = app_line(threshold, Level::Fatal, &fixed_time(), "boom", None).unwrap();
            assert!(line.contains(" FATAL boom"));
        }
    }

    #[test]
    fn test_app_line_with_location() {
        let here = Location::caller();
        let line = app_line(Level::Debug, Level::Error, &fixed_time(), "failed", Some(here)).unwrap();
        let expected_suffix = format!(" at {}:{}\n", here.file(), here.line());
        assert!(line.starts_with("2024-03-09 14:05:07 ERROR failed at "));
        assert!(line.ends_with(&expected_suffix));
    }

    #[test]
    fn test_access_line_layout() {
        let request = RequestMeta::new("GET", "http://www.deal.com/abc?p=xys", "HTTP/1.1", "10.1.1.1:3456")
            .with_user_agent("curl/8.0");

        let line = access_line(&fixed_time(), &request, 200, 10, Duration::from_millis(1));
        assert_eq!(
            line,
            "2024-03-09 14:05:07 GET http://www.deal.com/abc?p=xys HTTP/1.1 from [10.1.1.1:3456] \
             with agent [curl/8.0] in 1ms => 200 with 10 bytes \n"
        );
    }

    #[test]
    fn test_access_line_uses_forwarded_for() {
        let request = RequestMeta::new("POST", "/login", "HTTP/2.0", "10.1.1.1:3456")
            .with_forwarded_for("203.0.113.9");

        let line = access_line(&fixed_time(), &request, 401, 0, Duration::from_micros(15));
        assert!(line.contains("from [203.0.113.9] with agent []"));
        assert!(line.contains("in 15μs => 401 with 0 bytes \n"));
    }

    #[test]
    fn test_format_duration_units() {
        assert_eq!(format_duration(Duration::from_millis(1)), "1ms");
        assert_eq!(format_duration(Duration::from_micros(2500)), "2ms");
        assert_eq!(format_duration(Duration::from_micros(999)), "999μs");
        assert_eq!(format_duration(Duration::from_nanos(1000)), "1μs");
        assert_eq!(format_duration(Duration::from_nanos(999)), "999ns");
        assert_eq!(format_duration(Duration::ZERO), "0ns");
    }
}
