//! HTTP operation carriers embedded in batch payload trees.

use std::fmt;

use crate::element::PayloadElement;

/// Request verbs the batch dialect accepts. Anything else on a request line
/// is malformed input, not an extension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Delete,
    Merge,
    Patch,
}

impl HttpVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVerb::Get => "GET",
            HttpVerb::Post => "POST",
            HttpVerb::Put => "PUT",
            HttpVerb::Delete => "DELETE",
            HttpVerb::Merge => "MERGE",
            HttpVerb::Patch => "PATCH",
        }
    }

    pub fn parse(text: &str) -> Option<HttpVerb> {
        match text {
            "GET" => Some(HttpVerb::Get),
            "POST" => Some(HttpVerb::Post),
            "PUT" => Some(HttpVerb::Put),
            "DELETE" => Some(HttpVerb::Delete),
            "MERGE" => Some(HttpVerb::Merge),
            "PATCH" => Some(HttpVerb::Patch),
            _ => None,
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request operation inside a batch part: the request line, its headers
/// in wire order, and the decoded body.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequestOperation {
    pub verb: HttpVerb,
    pub uri: String,
    pub http_version: String,
    pub headers: Vec<(String, String)>,
    pub body: Box<PayloadElement>,
}

impl HttpRequestOperation {
    pub fn new(verb: HttpVerb, uri: impl Into<String>, body: PayloadElement) -> Self {
        Self {
            verb,
            uri: uri.into(),
            http_version: "HTTP/1.1".to_string(),
            headers: Vec::new(),
            body: Box::new(body),
        }
    }

    /// Case-insensitive header lookup, first match wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// One response operation: the status line, headers in wire order, and the
/// decoded body.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponseOperation {
    pub http_version: String,
    pub status_code: u16,
    pub reason_phrase: String,
    pub headers: Vec<(String, String)>,
    pub body: Box<PayloadElement>,
}

impl HttpResponseOperation {
    pub fn new(status_code: u16, reason_phrase: impl Into<String>, body: PayloadElement) -> Self {
        Self {
            http_version: "HTTP/1.1".to_string(),
            status_code,
            reason_phrase: reason_phrase.into(),
            headers: Vec::new(),
            body: Box::new(body),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

pub(crate) fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
