use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use std::time::Duration;

/// Bytes that cannot appear raw inside one path segment. `/` is included so a
/// repository name or ref can never open a new segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

const POLL_GROWTH: f64 = 1.5;
const MIN_POLL: Duration = Duration::from_secs(1);

/// Grows a poll delay by half, never below one second and never above `max`.
pub(crate) fn next_poll_interval(current: Duration, max: Duration) -> Duration {
    Duration::try_from_secs_f64(current.as_secs_f64() * POLL_GROWTH)
        .unwrap_or(max)
        .max(MIN_POLL)
        .min(max)
}

/// Appends an endpoint path to the base URL with exactly one `/` between them.
pub(crate) fn endpoint_url(base: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

pub(crate) fn is_json_content_type(content_type: &str) -> bool {
    content_type
        .trim()
        .to_ascii_lowercase()
        .starts_with("application/json")
}

/// Percent-encodes a single path segment, `/` included.
pub(crate) fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

/// Encodes a file path segment by segment, keeping `/` as the separator.
/// Outer and repeated slashes are dropped so `a/b`, `/a/b/` and `a//b` agree.
pub(crate) fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(encode_segment)
        .collect::<Vec<_>>()
        .join("/")
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
