//! Response emission: status line, headers, and body/chunk framing
//! (SPEC_FULL.md §4.3).
//!
//! Status-line and header terminators are `\n` only; chunk framing uses
//! `\r\n`. This asymmetry is intentional and preserved from the original
//! (SPEC_FULL.md §9) -- the wire fixtures in `tests/scenarios.rs` encode
//! it as ground truth.

use std::io;

use crate::error::RequestFault;
use crate::limits::{SERVER_NAME, TX_MAX_LEN};
use crate::status::Status;
use crate::stream::ByteStream;

pub(crate) enum BodyLength {
    Fixed(i64),
    Chunked,
}

/// Writes the status line and header block. Returns before any body
/// bytes.
pub(crate) fn write_head(
    out: &mut dyn ByteStream,
    status: Status,
    content_type: &[u8],
    body_length: BodyLength,
    extra_headers: &[String],
) -> io::Result<()> {
    let mut head = format!(
        "HTTP/1.1 {} {}\nServer: {}\nContent-Type: {}\n",
        status.code(),
        status.reason(),
        SERVER_NAME,
        String::from_utf8_lossy(content_type),
    );
    match body_length {
        BodyLength::Fixed(n) => head.push_str(&format!("Content-Length: {}\n", n)),
        BodyLength::Chunked => head.push_str("Transfer-Encoding: chunked\n"),
    }
    for line in extra_headers {
        head.push_str(line);
        head.push('\n');
    }
    if let BodyLength::Fixed(_) = body_length {
        head.push_str("Connection: close\n");
    }
    head.push('\n');
    out.write(head.as_bytes())
}

/// Pumps all currently-available bytes of `body` through `tx_buf` to
/// `out`, in `TX_MAX_LEN`-sized passes.
pub(crate) fn pump_all(
    out: &mut dyn ByteStream,
    body: &mut dyn ByteStream,
    tx_buf: &mut [u8; TX_MAX_LEN],
) -> io::Result<()> {
    loop {
        let avail = body.avail();
        if avail == 0 {
            return Ok(());
        }
        let want = avail.min(tx_buf.len());
        let n = body.read(&mut tx_buf[..want])?;
        if n == 0 {
            return Ok(());
        }
        out.write(&tx_buf[..n])?;
    }
}

/// Pumps at most `len` bytes of `body` through `tx_buf` to `out`, used to
/// push exactly one chunk's declared length.
pub(crate) fn pump_fixed(
    out: &mut dyn ByteStream,
    body: &mut dyn ByteStream,
    tx_buf: &mut [u8; TX_MAX_LEN],
    mut remaining: usize,
) -> io::Result<()> {
    while remaining > 0 {
        let avail = body.avail().min(remaining);
        if avail == 0 {
            return Ok(());
        }
        let want = avail.min(tx_buf.len());
        let n = body.read(&mut tx_buf[..want])?;
        if n == 0 {
            return Ok(());
        }
        out.write(&tx_buf[..n])?;
        remaining -= n;
    }
    Ok(())
}

/// Writes one chunk frame: `<hex-length>; chunk <n>\r\n<bytes>\r\n`.
pub(crate) fn write_chunk(
    out: &mut dyn ByteStream,
    body: &mut dyn ByteStream,
    tx_buf: &mut [u8; TX_MAX_LEN],
    len: usize,
    chunk_nbr: u32,
) -> io::Result<()> {
    out.write(format!("{:x}; chunk {}\r\n", len, chunk_nbr).as_bytes())?;
    pump_fixed(out, body, tx_buf, len)?;
    out.write(b"\r\n")
}

/// Writes the terminating zero-length chunk frame.
pub(crate) fn write_chunk_terminator(out: &mut dyn ByteStream) -> io::Result<()> {
    out.write(b"0\r\n\r\n")
}

/// Error page body text, carried over verbatim from `uweb_cfg.h`'s
/// default messages.
fn fault_message(fault: RequestFault) -> &'static str {
    match fault {
        RequestFault::Timeout => "Request timed out\n",
        RequestFault::NoResponseCallback => "Not implemented\n",
        RequestFault::BadMethod
        | RequestFault::ChunkedWithContentLength
        | RequestFault::MissingBoundary => "Bad request\n",
    }
}

/// Emits a complete error response for `fault` and returns it so the
/// caller can record it (SPEC_FULL.md §7: faults are observable, not
/// silent).
pub(crate) fn emit_error(out: &mut dyn ByteStream, fault: RequestFault) -> io::Result<()> {
    let body = fault_message(fault);
    write_head(
        out,
        fault.status(),
        b"text/html; charset=UTF-8",
        BodyLength::Fixed(body.len() as i64),
        &[],
    )?;
    out.write(body.as_bytes())
}
