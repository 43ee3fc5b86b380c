//! A minimal, single-threaded HTTP/1.1 server-side request parser and
//! response emitter for constrained environments.
//!
//! The core type is [`Parser`], an incremental state machine: feed it
//! whatever bytes are currently available on a [`ByteStream`] and it parses
//! as far as it can, calling back into application code (a
//! [`ResponseProducer`] and a [`DataSink`]) as request data becomes
//! available, then suspends. There is no blocking I/O anywhere in this
//! crate -- a host application supplies the transport and drives `parse`
//! from its own event loop.

mod bounded;
mod codec;
mod dispatch;
mod error;
mod fields;
mod limits;
mod line;
mod method;
mod multipart;
mod parser;
mod request;
mod response;
mod status;
mod stream;

pub use bounded::BoundedString;
pub use codec::{urlndecode, urlnencode};
pub use dispatch::{DataKind, DataSink, Outcome, ResponseContext, ResponseProducer};
pub use error::{ParserError, RequestFault};
pub use limits::{
    MAX_CONNECTION_LEN, MAX_CONTENT_DISP_LEN, MAX_CONTENT_TYPE_LEN, MAX_HOST_LEN,
    MAX_RESOURCE_LEN, REQ_BUF_MAX_LEN, SERVER_NAME, TX_MAX_LEN,
};
pub use method::Method;
pub use parser::Parser;
pub use request::{MultipartInfo, RequestHeader};
pub use status::Status;
pub use stream::{ByteStream, MemoryStream, UNKNOWN_SIZE};
