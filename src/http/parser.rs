use crate::http::request::{Method, Request, normalize_path};
use std::collections::HashMap;

/// The `Connection` header, the only header the server acts on.
pub const CONNECTION: &str = "Connection";

/// Headers kept by the tokenizer. Everything else is dropped.
const RECOGNIZED_HEADERS: &[&str] = &[CONNECTION];

/// Parses one framed request message.
///
/// Every CRLF-separated line is examined: a `GET ` or `HEAD ` line sets the
/// method and target, a recognized header line sets that header. Later lines
/// override earlier ones. Parsing never fails; a message without a usable
/// start line comes back with `Method::UNKNOWN` and no path.
pub fn parse_http_request(text: &str) -> Request {
    if text.is_empty() {
        return Request::empty();
    }

    let mut method = Method::UNKNOWN;
    let mut path = None;
    let mut headers = HashMap::new();

    for line in text.split("\r\n") {
        if let Some((m, target)) = parse_start_line(line) {
            method = m;
            path = Some(normalize_path(target));
            continue;
        }

        if let Some((name, value)) = parse_header_line(line) {
            headers.insert(name, value);
        }
    }

    Request {
        method,
        path,
        keep_alive: keep_alive(&headers),
    }
}

/// Recognizes `GET <target> ...` and `HEAD <target> ...` lines.
///
/// The target is the second whitespace-separated token, empty if missing.
/// The version token is not checked.
pub fn parse_start_line(line: &str) -> Option<(Method, &str)> {
    let (token, _) = line.split_once(' ')?;
    let method = Method::from_token(token)?;

    let target = line.split_whitespace().nth(1).unwrap_or("");
    Some((method, target))
}

/// Splits a `Name: value` line, keeping only recognized header names.
///
/// Names are matched case-sensitively. The value is everything after the
/// `": "` separator, untrimmed. A recognized header without that exact
/// separator still counts, with an empty value.
pub fn parse_header_line(line: &str) -> Option<(&str, &str)> {
    let (name, rest) = line.split_once(':')?;

    if !RECOGNIZED_HEADERS.contains(&name) {
        return None;
    }

    Some((name, rest.strip_prefix(' ').unwrap_or("")))
}

fn keep_alive(headers: &HashMap<&str, &str>) -> bool {
    headers
        .get(CONNECTION)
        .is_some_and(|v| *v == "keep-alive")
}
