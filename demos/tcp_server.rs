//! A thin reference socket host, analogous to the `hello_world_server`
//! example in the crate this one is built on. Binds a TCP port, accepts
//! one connection at a time, feeds bytes through [`uweb::Parser`], and
//! closes the socket after each response. Not part of the crate's test
//! surface (SPEC_FULL.md §6): it exists to show how a transport wires up
//! to [`uweb::ByteStream`], not to be a production server.

use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};

use uweb::{ByteStream, DataKind, MemoryStream, Outcome, Parser, RequestHeader, ResponseContext};

/// Wraps a blocking [`TcpStream`] as a [`ByteStream`], reading into a
/// small internal buffer so `avail()` can report what is already on
/// hand without blocking again.
struct TcpByteStream {
    conn: TcpStream,
    pending: Vec<u8>,
}

impl TcpByteStream {
    fn new(conn: TcpStream) -> Self {
        TcpByteStream { conn, pending: Vec::new() }
    }

    fn fill(&mut self) -> io::Result<()> {
        let mut buf = [0u8; 4096];
        let n = self.conn.read(&mut buf)?;
        self.pending.extend_from_slice(&buf[..n]);
        Ok(())
    }
}

impl ByteStream for TcpByteStream {
    fn avail(&self) -> usize {
        self.pending.len()
    }

    fn read(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            self.fill()?;
        }
        let n = dst.len().min(self.pending.len());
        dst[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }

    fn write(&mut self, src: &[u8]) -> io::Result<()> {
        self.conn.write_all(src)
    }
}

fn respond_hello(_req: &RequestHeader, ctx: &mut ResponseContext) -> Outcome {
    ctx.set_body(MemoryStream::new(b"Hello world!".to_vec()));
    Outcome::Complete
}

fn discard_body(_req: &RequestHeader, _kind: DataKind, _offset: u32, _data: &[u8]) {}

fn serve_one(conn: TcpStream) -> io::Result<()> {
    conn.set_nodelay(true)?;
    let mut input = TcpByteStream::new(conn.try_clone()?);
    let mut output = TcpByteStream::new(conn);
    let mut parser = Parser::new(respond_hello, discard_body);
    loop {
        input.fill()?;
        if input.avail() == 0 {
            return Ok(());
        }
        parser.parse(&mut input, &mut output)?;
    }
}

fn main() -> io::Result<()> {
    env_logger::init();
    let listener = TcpListener::bind("127.0.0.1:3000")?;
    log::info!("listening on {}", listener.local_addr()?);
    for conn in listener.incoming() {
        let conn = conn?;
        if let Err(err) = serve_one(conn) {
            log::warn!("connection error: {}", err);
        }
    }
    Ok(())
}
