//! Multipart boundary extraction (SPEC_FULL.md §4.2).
//!
//! The rolling byte-by-byte boundary scan itself lives in
//! [`crate::parser`], alongside the rest of the body-progress scratch
//! state it shares fields with (SPEC_FULL.md §3). This module only
//! extracts the boundary token out of a `Content-Type` header value, the
//! one part of multipart handling that is a pure, testable function of
//! its input.

use crate::bounded::BoundedString;
use crate::limits::MAX_CONTENT_TYPE_LEN;

/// The boundary delimiter declared by a `multipart/form-data`
/// `Content-Type` header, copied out of the header value (the original
/// keeps a raw pointer into `content_type`; SPEC_FULL.md §9 replaces that
/// with an owned, bounded copy to avoid aliasing the header field).
pub struct Boundary(BoundedString<MAX_CONTENT_TYPE_LEN>);

impl Boundary {
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Finds `boundary` in `content_type`, skips to the token after `=`
    /// (stripping surrounding whitespace), and takes the remainder of the
    /// header value as the boundary string. Returns `None` if no
    /// `boundary=<value>` token is present.
    pub fn parse(content_type: &[u8]) -> Option<Boundary> {
        let pos = find_subslice(content_type, b"boundary")?;
        let rest = &content_type[pos + b"boundary".len()..];
        let rest = crate::fields::strip_leading_space(rest);
        let rest = rest.strip_prefix(b"=")?;
        let rest = crate::fields::strip_leading_space(rest);
        if rest.is_empty() {
            return None;
        }
        let mut boundary = BoundedString::new();
        boundary.assign(rest);
        Some(Boundary(boundary))
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod test {
    use super::Boundary;

    #[test]
    fn extracts_boundary_after_equals() {
        let b = Boundary::parse(b"multipart/form-data; boundary=----abc123").unwrap();
        assert_eq!(b.as_bytes(), b"----abc123");
    }

    #[test]
    fn tolerates_whitespace_around_equals() {
        let b = Boundary::parse(b"multipart/form-data; boundary = xyz").unwrap();
        assert_eq!(b.as_bytes(), b"xyz");
    }

    #[test]
    fn missing_boundary_token_is_none() {
        assert!(Boundary::parse(b"multipart/form-data").is_none());
    }

    #[test]
    fn empty_boundary_value_is_none() {
        assert!(Boundary::parse(b"multipart/form-data; boundary=").is_none());
    }
}
