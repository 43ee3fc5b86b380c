//! Request metadata accumulated across one request's lifetime
//! (SPEC_FULL.md §3).

use crate::bounded::BoundedString;
use crate::limits::{
    MAX_CONNECTION_LEN, MAX_CONTENT_DISP_LEN, MAX_CONTENT_TYPE_LEN, MAX_HOST_LEN,
    MAX_RESOURCE_LEN,
};
use crate::method::Method;

/// Metadata for the multipart section currently being parsed.
#[derive(Default)]
pub struct MultipartInfo {
    /// Count of parts seen so far in this request (0-based while the
    /// current part's header block is being read).
    pub multipart_nbr: u32,
    pub content_type: BoundedString<MAX_CONTENT_TYPE_LEN>,
    pub content_disp: BoundedString<MAX_CONTENT_DISP_LEN>,
}

impl MultipartInfo {
    fn reset(&mut self) {
        self.multipart_nbr = 0;
        self.content_type.clear();
        self.content_disp.clear();
    }
}

/// Parsed request-line and header metadata, valid for the lifetime of one
/// request. Zeroed (via [`RequestHeader::reset`]) on entry to the
/// `HeaderMethod` state.
#[derive(Default)]
pub struct RequestHeader {
    pub method: Method,
    pub resource: BoundedString<MAX_RESOURCE_LEN>,
    pub host: BoundedString<MAX_HOST_LEN>,
    pub connection: BoundedString<MAX_CONNECTION_LEN>,
    pub content_type: BoundedString<MAX_CONTENT_TYPE_LEN>,
    pub content_length: u32,
    pub chunked: bool,
    /// Incremented by the response emitter as it writes chunks. Exposed
    /// here (rather than on the emitter) for callback compatibility with
    /// the original, which reads this field back out of the request
    /// record (SPEC_FULL.md §9).
    pub chunk_nbr: u32,
    pub cur_multipart: MultipartInfo,
}

impl RequestHeader {
    pub fn reset(&mut self) {
        self.method = Method::Bad;
        self.resource.clear();
        self.host.clear();
        self.connection.clear();
        self.content_type.clear();
        self.content_length = 0;
        self.chunked = false;
        self.chunk_nbr = 0;
        self.cur_multipart.reset();
    }
}
