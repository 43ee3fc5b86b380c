//! The Request State Machine (SPEC_FULL.md §4.2) -- the central
//! component, and the bulk of this crate.
//!
//! [`Parser`] owns everything the original kept in a module-level
//! `static struct uweb` singleton: the current state, the accumulated
//! line buffer, multipart/chunk progress counters, and the transmit
//! scratch buffer used by the response emitter. Making it an explicit,
//! owned struct rather than a singleton is the one structural change
//! from the original (SPEC_FULL.md §9): a host can now run one `Parser`
//! per connection.

use std::io;

use crate::dispatch::{DataKind, DataSink, Outcome, ResponseContext, ResponseProducer};
use crate::error::RequestFault;
use crate::fields::{match_field, strip_leading_space, Field};
use crate::limits::{REQ_BUF_MAX_LEN, TX_MAX_LEN};
use crate::line::LineAccumulator;
use crate::method::Method;
use crate::multipart::Boundary;
use crate::request::RequestHeader;
use crate::response;
use crate::response::BodyLength;
use crate::stream::{ByteStream, MemoryStream};

/// The nine parser states (SPEC_FULL.md §4.2). `HeaderMethod` is both the
/// initial and the terminal state: every request, successful or faulted,
/// ends back here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    HeaderMethod,
    HeaderFields,
    Content,
    MultiContentHeader,
    MultiContentData,
    ChunkDataHeader,
    ChunkData,
    ChunkDataEnd,
    ChunkFooter,
}

/// States read one line at a time, sharing the same per-byte
/// accumulation loop (SPEC_FULL.md §4.2: "Line parsing rules").
fn is_line_state(state: State) -> bool {
    matches!(
        state,
        State::HeaderMethod
            | State::HeaderFields
            | State::MultiContentHeader
            | State::ChunkDataHeader
            | State::ChunkDataEnd
            | State::ChunkFooter
    )
}

/// The incremental HTTP/1.1 request parser and response emitter.
///
/// One instance handles exactly one request at a time; `parse` may be
/// called repeatedly as more bytes become available on `input`; it
/// returns as soon as `input` has nothing left to read (SPEC_FULL.md
/// §5: suspension points).
pub struct Parser<P, D> {
    responder: P,
    sink: D,

    state: State,
    req: RequestHeader,
    header_line: u32,
    line_buf: LineAccumulator<REQ_BUF_MAX_LEN>,

    boundary: Option<Boundary>,
    multipart_boundary_ix: usize,
    multipart_delim: u8,
    received_multipart_len: u32,

    received_content_len: u32,
    chunk_len: u32,
    chunk_ix: u32,

    tx_buf: [u8; TX_MAX_LEN],

    last_fault: Option<RequestFault>,
    truncated_line_count: u32,
}

impl<P: ResponseProducer, D: DataSink> Parser<P, D> {
    pub fn new(responder: P, sink: D) -> Self {
        Parser {
            responder,
            sink,
            state: State::HeaderMethod,
            req: RequestHeader::default(),
            header_line: 0,
            line_buf: LineAccumulator::new(),
            boundary: None,
            multipart_boundary_ix: 0,
            multipart_delim: 0,
            received_multipart_len: 0,
            received_content_len: 0,
            chunk_len: 0,
            chunk_ix: 0,
            tx_buf: [0; TX_MAX_LEN],
            last_fault: None,
            truncated_line_count: 0,
        }
    }

    /// The request currently (or most recently) being parsed.
    pub fn request(&self) -> &RequestHeader {
        &self.req
    }

    /// Why the last 4xx/5xx response was emitted, if any request has
    /// faulted yet.
    pub fn last_fault(&self) -> Option<RequestFault> {
        self.last_fault
    }

    /// Count of header/boundary lines silently truncated at
    /// [`REQ_BUF_MAX_LEN`] bytes (SPEC_FULL.md §3, §9). The wire behaviour
    /// for truncation never changes; this is purely observable bookkeeping.
    pub fn truncated_line_count(&self) -> u32 {
        self.truncated_line_count
    }

    /// Drains `input.avail()` bytes, advancing the state machine and
    /// writing any response bytes to `output`. Returns once `input` has
    /// nothing left to read right away.
    pub fn parse(
        &mut self,
        input: &mut dyn ByteStream,
        output: &mut dyn ByteStream,
    ) -> io::Result<()> {
        loop {
            if input.avail() == 0 {
                return Ok(());
            }
            if is_line_state(self.state) {
                self.step_line(input, output)?;
            } else if self.state == State::MultiContentData {
                self.step_multipart_byte(input, output)?;
            } else {
                self.step_body(input)?;
            }
        }
    }

    /// Forces a 408 response if mid-request; otherwise a no-op
    /// (SPEC_FULL.md §5, §7).
    pub fn timeout(&mut self, output: &mut dyn ByteStream) -> io::Result<()> {
        if self.state != State::HeaderMethod {
            log::error!("request timeout in state {:?}", self.state);
            self.emit_fault(output, RequestFault::Timeout)?;
        }
        Ok(())
    }

    // -- line-granularity states -----------------------------------------

    fn step_line(
        &mut self,
        input: &mut dyn ByteStream,
        output: &mut dyn ByteStream,
    ) -> io::Result<()> {
        let mut c = [0u8; 1];
        if input.read(&mut c)? < 1 {
            return Ok(());
        }
        let c = c[0];
        log::trace!("byte {:?} consumed in state {:?}", c, self.state);
        let overflow = c != b'\r' && c != b'\n' && self.line_buf.len() >= REQ_BUF_MAX_LEN;
        let mut line: Option<Vec<u8>> = None;
        self.line_buf.push(c, |l| line = Some(l.to_vec()));
        if let Some(line) = line {
            if overflow {
                self.truncated_line_count += 1;
                log::warn!(
                    "header line exceeded {} bytes, truncating",
                    REQ_BUF_MAX_LEN
                );
            }
            self.header_line += 1;
            self.dispatch_line(output, &line)?;
        }
        Ok(())
    }

    fn dispatch_line(&mut self, output: &mut dyn ByteStream, line: &[u8]) -> io::Result<()> {
        match self.state {
            State::HeaderMethod => self.handle_method_line(line),
            State::HeaderFields => self.handle_field_line(output, line)?,
            State::MultiContentHeader => self.handle_multipart_header_line(line),
            State::ChunkDataHeader => self.handle_chunk_header_line(line),
            State::ChunkDataEnd => {
                self.set_state(State::ChunkDataHeader);
                self.header_line = 0;
                self.received_content_len = 0;
            }
            State::ChunkFooter => {
                if line.is_empty() {
                    self.req.reset();
                    self.set_state(State::HeaderMethod);
                }
            }
            _ => unreachable!("dispatch_line only called for line-granularity states"),
        }
        Ok(())
    }

    fn handle_method_line(&mut self, line: &[u8]) {
        let (method, matched_len) = Method::parse_prefix(line);
        self.req.method = method;
        if matched_len > 0 {
            let rest = strip_leading_space(&line[matched_len..]);
            let resource = match rest.iter().position(|&b| b == b' ') {
                Some(sp) => &rest[..sp],
                None => rest,
            };
            self.req.resource.assign(resource);
        }
        log::debug!("request line: {:?} {:?}", method, self.req.resource);
        self.set_state(State::HeaderFields);
    }

    fn handle_field_line(&mut self, output: &mut dyn ByteStream, line: &[u8]) -> io::Result<()> {
        if line.is_empty() {
            return self.dispatch_after_headers(output);
        }
        if let Some((field, rest)) = match_field(line) {
            let value = strip_leading_space(rest);
            match field {
                Field::Connection => {
                    self.req.connection.assign(value);
                }
                Field::Host => {
                    self.req.host.assign(value);
                }
                Field::ContentType => {
                    self.req.content_type.assign(value);
                }
                Field::ContentLength => {
                    self.req.content_length = parse_u32(value);
                }
                Field::TransferEncoding => {
                    self.req.chunked = value == b"chunked";
                }
                Field::ContentDisposition => {
                    // Not meaningful outside a multipart part header, but
                    // the original matches the field table unconditionally;
                    // harmless to record and never read back here.
                    self.req.cur_multipart.content_disp.assign(value);
                }
            }
        }
        Ok(())
    }

    fn handle_multipart_header_line(&mut self, line: &[u8]) {
        if line.starts_with(b"--") {
            if let Some(pos) = find(&line[2..], self.boundary_bytes()) {
                let after = 2 + pos + self.boundary_bytes().len();
                if line[after..].starts_with(b"--") {
                    log::debug!("multipart message finished");
                    self.req.reset();
                    self.set_state(State::HeaderMethod);
                } else {
                    log::debug!(
                        "multipart section {} header",
                        self.req.cur_multipart.multipart_nbr
                    );
                }
                return;
            }
        }
        if line.is_empty() {
            log::debug!(
                "multipart data section {} starts",
                self.req.cur_multipart.multipart_nbr
            );
            self.set_state(State::MultiContentData);
            self.multipart_boundary_ix = 0;
            self.multipart_delim = 0;
            self.received_multipart_len = 0;
            return;
        }
        if let Some((field, rest)) = match_field(line) {
            let value = strip_leading_space(rest);
            match field {
                Field::ContentDisposition => {
                    self.req.cur_multipart.content_disp.assign(value);
                }
                Field::ContentType => {
                    self.req.cur_multipart.content_type.assign(value);
                }
                _ => {}
            }
        }
    }

    fn handle_chunk_header_line(&mut self, line: &[u8]) {
        let start = strip_leading_space(line);
        let hex = match start.iter().position(|&b| b == b';') {
            Some(p) => &start[..p],
            None => start,
        };
        self.chunk_len = parse_hex_u32(hex);
        if self.chunk_len > 0 {
            log::debug!("chunk {} length {}", self.chunk_ix, self.chunk_len);
            self.set_state(State::ChunkData);
        } else {
            log::debug!("chunks finished, reading footer");
            self.set_state(State::ChunkFooter);
            self.header_line = 0;
        }
    }

    fn boundary_bytes(&self) -> &[u8] {
        self.boundary.as_ref().map(Boundary::as_bytes).unwrap_or(b"")
    }

    /// Transitions to `state`, tracing the move (SPEC_FULL.md §4.6: "state
    /// entered" is part of the per-byte/per-chunk trace-level progress log).
    fn set_state(&mut self, state: State) {
        log::trace!("state {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    // -- header dispatch (blank line ending HeaderFields) -----------------

    fn dispatch_after_headers(&mut self, output: &mut dyn ByteStream) -> io::Result<()> {
        if self.req.method == Method::Bad {
            log::error!("bad request method");
            return self.emit_fault(output, RequestFault::BadMethod);
        }
        if self.req.chunked && self.req.content_length > 0 {
            log::error!("chunked request also specified Content-Length");
            return self.emit_fault(output, RequestFault::ChunkedWithContentLength);
        }
        let boundary = if !self.req.chunked
            && self.req.content_length > 0
            && self.req.content_type.as_bytes().starts_with(b"multipart/form-data")
        {
            match Boundary::parse(self.req.content_type.as_bytes()) {
                Some(b) => Some(b),
                None => {
                    log::error!("multipart request without a boundary token");
                    return self.emit_fault(output, RequestFault::MissingBoundary);
                }
            }
        } else {
            None
        };

        self.emit_response(output)?;

        if self.req.chunked {
            self.set_state(State::ChunkDataHeader);
            self.chunk_ix = 0;
            self.chunk_len = 0;
            self.received_content_len = 0;
        } else if self.req.content_length > 0 {
            self.received_content_len = 0;
            if let Some(boundary) = boundary {
                self.boundary = Some(boundary);
                self.multipart_boundary_ix = 0;
                self.multipart_delim = 0;
                self.req.cur_multipart.multipart_nbr = 0;
                self.set_state(State::MultiContentHeader);
                self.header_line = 0;
            } else {
                self.set_state(State::Content);
            }
        } else {
            self.req.reset();
            self.set_state(State::HeaderMethod);
        }
        Ok(())
    }

    fn emit_fault(&mut self, output: &mut dyn ByteStream, fault: RequestFault) -> io::Result<()> {
        response::emit_error(output, fault)?;
        self.last_fault = Some(fault);
        self.req.reset();
        self.set_state(State::HeaderMethod);
        Ok(())
    }

    fn emit_response(&mut self, output: &mut dyn ByteStream) -> io::Result<()> {
        let mut ctx = ResponseContext::new();
        let outcome = self.responder.respond(&self.req, &mut ctx);
        match outcome {
            Outcome::Complete => {
                let mut body = ctx.take_body().unwrap_or_else(|| Box::new(MemoryStream::empty()));
                response::write_head(
                    output,
                    ctx.status,
                    ctx.content_type.as_bytes(),
                    BodyLength::Fixed(body.total_size()),
                    &ctx.extra_headers,
                )?;
                if self.req.method != Method::Head {
                    response::pump_all(output, body.as_mut(), &mut self.tx_buf)?;
                }
            }
            Outcome::Chunked => {
                response::write_head(
                    output,
                    ctx.status,
                    ctx.content_type.as_bytes(),
                    BodyLength::Chunked,
                    &ctx.extra_headers,
                )?;
                if self.req.method != Method::Head {
                    let mut body =
                        ctx.take_body().unwrap_or_else(|| Box::new(MemoryStream::empty()));
                    loop {
                        let avail = body.avail();
                        if avail == 0 {
                            break;
                        }
                        response::write_chunk(
                            output,
                            body.as_mut(),
                            &mut self.tx_buf,
                            avail,
                            self.req.chunk_nbr,
                        )?;
                        self.req.chunk_nbr += 1;
                        ctx.reset();
                        let _ = self.responder.respond(&self.req, &mut ctx);
                        body = ctx.take_body().unwrap_or_else(|| Box::new(MemoryStream::empty()));
                    }
                    response::write_chunk_terminator(output)?;
                }
            }
        }
        Ok(())
    }

    // -- raw byte-run states (Content, ChunkData) --------------------------

    fn step_body(&mut self, input: &mut dyn ByteStream) -> io::Result<()> {
        let total = if self.state == State::Content {
            self.req.content_length
        } else {
            self.chunk_len
        };
        let remaining = total.saturating_sub(self.received_content_len);
        let want = (input.avail() as u32).min(remaining).min(REQ_BUF_MAX_LEN as u32) as usize;
        if want == 0 {
            return Ok(());
        }
        let mut buf = [0u8; REQ_BUF_MAX_LEN];
        let n = input.read(&mut buf[..want])?;
        if n == 0 {
            return Ok(());
        }
        let kind = if self.state == State::Content {
            DataKind::Content
        } else {
            DataKind::Chunk
        };
        self.sink.data(&self.req, kind, self.received_content_len, &buf[..n]);
        self.received_content_len += n as u32;
        log::trace!(
            "{} bytes consumed in state {:?}, {} of {} so far",
            n,
            self.state,
            self.received_content_len,
            total
        );

        if self.state == State::ChunkData {
            if self.received_content_len == self.chunk_len {
                log::debug!("chunk {} received", self.chunk_ix);
                self.chunk_ix += 1;
                self.set_state(State::ChunkDataEnd);
                self.header_line = 0;
            }
        } else if self.received_content_len == self.req.content_length {
            log::debug!("all content received");
            self.req.reset();
            self.set_state(State::HeaderMethod);
        }
        Ok(())
    }

    // -- multipart body byte-at-a-time scan --------------------------------

    fn step_multipart_byte(
        &mut self,
        input: &mut dyn ByteStream,
        _output: &mut dyn ByteStream,
    ) -> io::Result<()> {
        let mut c = [0u8; 1];
        if input.read(&mut c)? < 1 {
            return Ok(());
        }
        let c = c[0];
        log::trace!(
            "byte {:?} consumed in state {:?}, {} of {} so far",
            c,
            self.state,
            self.received_content_len + 1,
            self.req.content_length
        );

        let full = self.line_buf.push_body_byte(c);
        if c == b'\n' {
            self.flush_multipart_buffer();
        }

        let boundary_len = self.boundary_bytes().len();
        if c == b'-' && self.multipart_delim < 2 {
            self.multipart_delim += 1;
        } else if self.multipart_delim == 2 && self.boundary_bytes().get(self.multipart_boundary_ix) == Some(&c)
        {
            self.multipart_boundary_ix += 1;
            if self.multipart_boundary_ix == boundary_len {
                self.multipart_boundary_ix = 0;
                self.multipart_delim = 0;
                self.req.cur_multipart.multipart_nbr += 1;
                self.set_state(State::MultiContentHeader);
                log::debug!("multipart boundary matched, part {}", self.req.cur_multipart.multipart_nbr);
                return Ok(());
            }
        } else {
            if self.multipart_delim > 0 || self.multipart_boundary_ix > 0 {
                self.flush_multipart_buffer();
            }
            self.multipart_delim = 0;
            self.multipart_boundary_ix = 0;
        }

        if full {
            self.flush_multipart_buffer();
        }

        self.received_content_len += 1;
        if self.received_content_len == self.req.content_length {
            self.flush_multipart_buffer();
            log::debug!("all multipart content received");
            self.req.reset();
            self.set_state(State::HeaderMethod);
        }
        Ok(())
    }

    fn flush_multipart_buffer(&mut self) {
        if self.line_buf.is_empty() {
            return;
        }
        let bytes = self.line_buf.as_bytes().to_vec();
        self.sink
            .data(&self.req, DataKind::Multipart, self.received_multipart_len, &bytes);
        self.received_multipart_len += bytes.len() as u32;
        self.line_buf.clear();
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// `atoi`-style parse: leading decimal digits, `0` if none.
fn parse_u32(value: &[u8]) -> u32 {
    let mut n: u32 = 0;
    let mut any = false;
    for &b in value {
        if b.is_ascii_digit() {
            any = true;
            n = n.saturating_mul(10).saturating_add((b - b'0') as u32);
        } else {
            break;
        }
    }
    if any {
        n
    } else {
        0
    }
}

/// `strtol(..., 16)`-style parse: leading hex digits, `0` if none.
fn parse_hex_u32(value: &[u8]) -> u32 {
    let mut n: u32 = 0;
    let mut any = false;
    for &b in value {
        let digit = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => break,
        };
        any = true;
        n = n.saturating_mul(16).saturating_add(digit as u32);
    }
    if any {
        n
    } else {
        0
    }
}
