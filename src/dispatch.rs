//! The application callback contract (SPEC_FULL.md §4.1).
//!
//! The original takes two bare function pointers plus a `void*` user
//! pointer. We use two traits instead (`ResponseProducer`, `DataSink`),
//! following the teacher's `Server<C>` trait (`server/protocol.rs`): an
//! application can carry its own state behind `self` without an unsafe
//! cast.

use crate::bounded::BoundedString;
use crate::limits::MAX_CONTENT_TYPE_LEN;
use crate::request::RequestHeader;
use crate::status::Status;
use crate::stream::ByteStream;

/// Result of one call to [`ResponseProducer::respond`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The body assigned via [`ResponseContext::set_body`] is the entire
    /// response; emit it with a `Content-Length` header.
    Complete,
    /// The body assigned is one chunk of a `Transfer-Encoding: chunked`
    /// response; `respond` will be invoked again for the next chunk. A
    /// round whose body has zero bytes available signals end-of-body.
    Chunked,
}

/// Mutable handle the response producer uses to shape the outgoing
/// response: status, content type, any extra headers, and the stream the
/// response emitter will read the body from.
pub struct ResponseContext {
    pub status: Status,
    pub content_type: BoundedString<MAX_CONTENT_TYPE_LEN>,
    /// Extra header lines, inserted verbatim; each entry must not include
    /// its own line terminator (the emitter appends `\n`).
    pub extra_headers: Vec<String>,
    body: Option<Box<dyn ByteStream>>,
}

impl ResponseContext {
    pub(crate) fn new() -> Self {
        let mut content_type = BoundedString::new();
        content_type.assign(b"text/html; charset=utf-8");
        ResponseContext {
            status: Status::Ok,
            content_type,
            extra_headers: Vec::new(),
            body: None,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.status = Status::Ok;
        self.content_type.clear();
        self.content_type.assign(b"text/html; charset=utf-8");
        self.extra_headers.clear();
        self.body = None;
    }

    /// Assigns the stream the emitter reads this round's body from.
    pub fn set_body(&mut self, stream: impl ByteStream + 'static) {
        self.body = Some(Box::new(stream));
    }

    pub(crate) fn take_body(&mut self) -> Option<Box<dyn ByteStream>> {
        self.body.take()
    }
}

/// Produces response content. Invoked once after the request headers are
/// fully parsed, and again for each subsequent round if the first call
/// returned [`Outcome::Chunked`].
pub trait ResponseProducer {
    fn respond(&mut self, req: &RequestHeader, ctx: &mut ResponseContext) -> Outcome;
}

/// Allows a plain closure-like `FnMut` to serve as a [`ResponseProducer`],
/// matching the original function-pointer call site directly.
impl<F> ResponseProducer for F
where
    F: FnMut(&RequestHeader, &mut ResponseContext) -> Outcome,
{
    fn respond(&mut self, req: &RequestHeader, ctx: &mut ResponseContext) -> Outcome {
        self(req, ctx)
    }
}

/// Tags which body the bytes passed to [`DataSink::data`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    /// A `Content-Length`-delimited request body.
    Content,
    /// One fragment of a chunked request body.
    Chunk,
    /// Bytes of one multipart section's payload.
    Multipart,
}

/// Consumes inbound request body bytes, delivered in arrival order.
/// `offset` is the running byte count within the current body/part; it
/// resets to zero at the start of each multipart section and each
/// inbound chunk.
pub trait DataSink {
    fn data(&mut self, req: &RequestHeader, kind: DataKind, offset: u32, data: &[u8]);
}

impl<F> DataSink for F
where
    F: FnMut(&RequestHeader, DataKind, u32, &[u8]),
{
    fn data(&mut self, req: &RequestHeader, kind: DataKind, offset: u32, data: &[u8]) {
        self(req, kind, offset, data)
    }
}
