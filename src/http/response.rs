use chrono::{DateTime, TimeDelta, Utc};
use std::time::SystemTime;

use crate::fs::FileInfo;

/// Value of the `Server` header.
pub const SERVER_NAME: &str = concat!("fileserve/", env!("CARGO_PKG_VERSION"));

/// How far in the future `Expires` is set for served files.
pub const EXPIRES_AFTER_HOURS: i64 = 12;

/// Timestamp layout used by `Date`, `Last-Modified` and `Expires`.
///
/// Deliberately not RFC 1123: there is no month token and no colon between
/// minutes and seconds, e.g. `Thu, 06, 1998 12:0015 GMT`.
pub const HTTP_DATE_FORMAT: &str = "%a, %d, %Y %H:%M%S GMT";

const HTTP_VERSION: &str = "HTTP/1.1";

/// HTTP status codes the server can send.
///
/// - `Ok` (200): File found
/// - `NotFound` (404): No such file under the base directory
/// - `NotImplemented` (501): Request had no usable GET/HEAD line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 404 Not Found
    NotFound,
    /// 501 Not Implemented
    NotImplemented,
}

impl StatusCode {
    /// Maps a numeric code onto a supported status.
    ///
    /// Anything other than 200 or 404 becomes 501.
    ///
    /// # Example
    ///
    /// ```
    /// # use fileserve::http::response::StatusCode;
    /// assert_eq!(StatusCode::from_u16(404), StatusCode::NotFound);
    /// assert_eq!(StatusCode::from_u16(302), StatusCode::NotImplemented);
    /// ```
    pub fn from_u16(code: u16) -> Self {
        match code {
            200 => StatusCode::Ok,
            404 => StatusCode::NotFound,
            _ => StatusCode::NotImplemented,
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::NotFound => 404,
            StatusCode::NotImplemented => 501,
        }
    }

    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::NotFound => "Not Found",
            StatusCode::NotImplemented => "Not Implemented",
        }
    }
}

/// Entity headers sent with a 200 response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub content_type: &'static str,
    pub content_length: u64,
    pub last_modified: SystemTime,
}

impl From<&FileInfo> for Entity {
    fn from(info: &FileInfo) -> Self {
        Self {
            content_type: info.content_type,
            content_length: info.size,
            last_modified: info.last_modified,
        }
    }
}

/// Status line and headers of one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: StatusCode,
    /// Present only for 200 responses
    pub entity: Option<Entity>,
    /// Echoed in the second `Connection` header
    pub keep_alive: bool,
}

impl ResponseHead {
    /// 200 response describing `info`.
    pub fn ok(info: &FileInfo, keep_alive: bool) -> Self {
        Self {
            status: StatusCode::Ok,
            entity: Some(Entity::from(info)),
            keep_alive,
        }
    }

    pub fn not_found(keep_alive: bool) -> Self {
        Self {
            status: StatusCode::NotFound,
            entity: None,
            keep_alive,
        }
    }

    pub fn not_implemented(keep_alive: bool) -> Self {
        Self {
            status: StatusCode::NotImplemented,
            entity: None,
            keep_alive,
        }
    }

    /// Serializes the head, stamped with the current time, followed by `body`.
    pub fn render(&self, body: Option<&[u8]>) -> Vec<u8> {
        self.render_at(Utc::now(), body)
    }

    /// Serializes the head as of `now`, followed by `body`.
    ///
    /// Header order is fixed. A `Connection: close` line always follows the
    /// status line and the real keep-alive decision is repeated after
    /// `Server`. The body is only appended to 200 responses.
    pub fn render_at(&self, now: DateTime<Utc>, body: Option<&[u8]>) -> Vec<u8> {
        let mut head = format!(
            "{} {} {}\r\n",
            HTTP_VERSION,
            self.status.as_u16(),
            self.status.reason_phrase()
        );

        head.push_str("Connection: close\r\n");
        push_header(&mut head, "Date", &format_http_date(now));
        push_header(&mut head, "Server", SERVER_NAME);
        push_header(
            &mut head,
            "Connection",
            if self.keep_alive { "keep-alive" } else { "close" },
        );

        let is_ok = self.status == StatusCode::Ok;

        if let (true, Some(entity)) = (is_ok, &self.entity) {
            let expires = now + TimeDelta::hours(EXPIRES_AFTER_HOURS);

            push_header(&mut head, "Content-Length", &entity.content_length.to_string());
            push_header(&mut head, "Content-Type", entity.content_type);
            push_header(
                &mut head,
                "Last-Modified",
                &format_http_date(entity.last_modified.into()),
            );
            push_header(&mut head, "Expires", &format_http_date(expires));
        }

        head.push_str("\r\n");

        let mut buf = head.into_bytes();

        if let (true, Some(body)) = (is_ok, body) {
            buf.extend_from_slice(body);
        }

        buf
    }
}

/// Formats a timestamp with [`HTTP_DATE_FORMAT`].
///
/// # Example
///
/// ```
/// # use chrono::{TimeZone, Utc};
/// # use fileserve::http::response::format_http_date;
/// let t = Utc.with_ymd_and_hms(1998, 8, 6, 12, 0, 15).unwrap();
/// assert_eq!(format_http_date(t), "Thu, 06, 1998 12:0015 GMT");
/// ```
pub fn format_http_date(time: DateTime<Utc>) -> String {
    time.format(HTTP_DATE_FORMAT).to_string()
}

fn push_header(buf: &mut String, name: &str, value: &str) {
    buf.push_str(name);
    buf.push_str(": ");
    buf.push_str(value);
    buf.push_str("\r\n");
}
