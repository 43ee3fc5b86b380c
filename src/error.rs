//! Error taxonomy (SPEC_FULL.md §4.6, §7).
//!
//! Most parsing faults never reach application code as a `Result::Err` --
//! they are reported to the client as an HTTP response instead, and
//! recorded internally as a [`RequestFault`] so tests and logging can
//! observe which path fired. Only genuine transport failures propagate as
//! [`ParserError`], following the same split the teacher crate draws
//! between `RequestError` (reported via `bad_request`/error pages) and a
//! hard `Err` from the stream layer.

use std::io;

use quick_error::quick_error;

quick_error! {
    /// Failure that prevents the parser from continuing at all -- as
    /// opposed to a malformed request, which is handled by emitting an
    /// HTTP error response and resuming (see [`RequestFault`]).
    #[derive(Debug)]
    pub enum ParserError {
        /// The underlying `ByteStream` returned an I/O error.
        Io(err: io::Error) {
            from()
            display("stream I/O error: {}", err)
            source(err)
        }
        /// No response producer was registered. Unreachable through the
        /// public `Parser::new` constructor (the producer is mandatory),
        /// but retained so the 501 wire path documented in SPEC_FULL.md
        /// §7 has a corresponding internal value.
        NoResponseCallback {
            display("no response callback registered")
        }
    }
}

/// Why a 4xx/5xx response was emitted for the current request.
///
/// This is not a `Result::Err`: every variant corresponds to a completed,
/// well-formed HTTP response being written to the output stream. It exists
/// purely so callers (and tests) can assert on *why* without re-parsing
/// emitted bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestFault {
    /// Request line did not match any known method.
    BadMethod,
    /// Both `Transfer-Encoding: chunked` and `Content-Length` were present.
    ChunkedWithContentLength,
    /// `multipart/form-data` without a parseable `boundary=` token.
    MissingBoundary,
    /// No response producer registered (see [`ParserError::NoResponseCallback`]).
    NoResponseCallback,
    /// The parser was mid-request when [`crate::parser::Parser::timeout`]
    /// was called.
    Timeout,
}

impl RequestFault {
    pub fn status(&self) -> crate::status::Status {
        use crate::status::Status;
        match self {
            RequestFault::BadMethod => Status::BadRequest,
            RequestFault::ChunkedWithContentLength => Status::BadRequest,
            RequestFault::MissingBoundary => Status::BadRequest,
            RequestFault::NoResponseCallback => Status::NotImplemented,
            RequestFault::Timeout => Status::RequestTimeout,
        }
    }
}
