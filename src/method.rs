//! Request methods, matched by prefix against the request line
//! (SPEC_FULL.md §4.2).

/// HTTP request method, as recognised by the method table.
///
/// `Bad` stands in for the original's `_BAD_REQ`: an unrecognised leading
/// token on the request line. A request carrying `Bad` always gets a 400
/// response (SPEC_FULL.md §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Bad,
    /// Requests a representation of the specified resource. GET requests
    /// should only retrieve data and should have no other effect.
    Get,
    /// Identical to GET but without the response body, useful for
    /// retrieving headers without transferring the whole entity.
    Head,
    /// Submits an entity to be processed by the resource identified by
    /// the URI, e.g. a web form or a file upload.
    Post,
    /// Requests that the enclosed entity be stored under the supplied URI.
    Put,
    /// Deletes the specified resource.
    Delete,
    /// Echoes back the received request for diagnostic purposes.
    Trace,
    /// Returns the methods the server supports for the given URI.
    Options,
    /// Converts the request connection into a transparent tunnel.
    Connect,
    /// Applies partial modifications to a resource.
    Patch,
}

/// Method table, in prefix-match priority order (SPEC_FULL.md §4.2).
const TABLE: &[(&str, Method)] = &[
    ("GET", Method::Get),
    ("HEAD", Method::Head),
    ("POST", Method::Post),
    ("PUT", Method::Put),
    ("DELETE", Method::Delete),
    ("TRACE", Method::Trace),
    ("OPTIONS", Method::Options),
    ("CONNECT", Method::Connect),
    ("PATCH", Method::Patch),
];

impl Method {
    /// Matches `line` (the request line, e.g. `"GET / HTTP/1.1"`) against
    /// the method table by prefix, returning the matched method and the
    /// byte offset just past the matched token. `Method::Bad` is returned
    /// with offset `0` if nothing matches.
    pub fn parse_prefix(line: &[u8]) -> (Method, usize) {
        for &(name, method) in TABLE {
            if line.starts_with(name.as_bytes()) {
                return (method, name.len());
            }
        }
        (Method::Bad, 0)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Bad => "<BAD>",
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Trace => "TRACE",
            Method::Options => "OPTIONS",
            Method::Connect => "CONNECT",
            Method::Patch => "PATCH",
        }
    }
}

#[cfg(test)]
mod test {
    use super::Method;

    #[test]
    fn matches_known_methods() {
        assert_eq!(Method::parse_prefix(b"GET / HTTP/1.1"), (Method::Get, 3));
        assert_eq!(Method::parse_prefix(b"DELETE /x HTTP/1.1"), (Method::Delete, 6));
    }

    #[test]
    fn unknown_method_is_bad() {
        assert_eq!(Method::parse_prefix(b"BAD / HTTP/1.1"), (Method::Bad, 0));
    }

    #[test]
    fn prefers_first_matching_entry() {
        // "HEAD" is checked before anything that could share a prefix.
        assert_eq!(Method::parse_prefix(b"HEAD /x HTTP/1.1"), (Method::Head, 4));
    }
}
