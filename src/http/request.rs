/// Target served when the request path is empty or just `/`.
pub const DEFAULT_PATH: &str = "/index.html";

/// HTTP request methods understood by the server.
///
/// Only GET and HEAD are served. Every other start line leaves the method
/// as `UNKNOWN`, which the connection answers with 501 Not Implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// No recognized start line was seen
    #[default]
    UNKNOWN,
}

impl Method {
    /// Parses an HTTP method token.
    ///
    /// # Arguments
    ///
    /// * `s` - Method token (case-sensitive, uppercase)
    ///
    /// # Returns
    ///
    /// `Some(Method)` for GET or HEAD, `None` for anything else.
    ///
    /// # Example
    ///
    /// ```
    /// # use fileserve::http::request::Method;
    /// assert_eq!(Method::from_token("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_token("get"), None);
    /// assert_eq!(Method::from_token("POST"), None);
    /// ```
    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            "HEAD" => Some(Method::HEAD),
            _ => None,
        }
    }
}

/// A request as seen by the connection handler.
///
/// Built from one framed message and dropped once the response is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// GET, HEAD, or UNKNOWN when no recognized start line was present
    pub method: Method,
    /// Normalized target path, `None` when no start line carried one
    pub path: Option<String>,
    /// Whether the client asked for `Connection: keep-alive`
    pub keep_alive: bool,
}

impl Request {
    /// The request produced by an empty message.
    ///
    /// Nothing is served, but the connection is kept open.
    pub fn empty() -> Self {
        Self {
            method: Method::UNKNOWN,
            path: None,
            keep_alive: true,
        }
    }

    pub fn is_head(&self) -> bool {
        self.method == Method::HEAD
    }
}

/// Maps a raw request target to the path that is actually served.
///
/// Targets of two bytes or less (`""`, `"/"`) become [`DEFAULT_PATH`].
pub fn normalize_path(target: &str) -> String {
    if target.len() <= 2 {
        DEFAULT_PATH.to_string()
    } else {
        target.to_string()
    }
}
