//! Compile-time-knob equivalents (SPEC_FULL.md §6).
//!
//! The original exposes these as preprocessor overrides
//! (`UWEB_TX_MAX_LEN` and friends). We keep them as plain constants rather
//! than a runtime-configurable struct: they size the stack-allocated
//! scratch buffers of [`crate::parser::Parser`], so they have to be known
//! at compile time anyway.

/// Maximum bytes pumped through the transmit scratch buffer per read/write
/// pass when streaming a response body.
pub const TX_MAX_LEN: usize = 2048;
/// Maximum length of one accumulated request line (header line or
/// multipart boundary scan line) before silent truncation.
pub const REQ_BUF_MAX_LEN: usize = 512;
/// Capacity of [`crate::request::RequestHeader::resource`].
pub const MAX_RESOURCE_LEN: usize = 256;
/// Capacity of [`crate::request::RequestHeader::host`].
pub const MAX_HOST_LEN: usize = 64;
/// Capacity of [`crate::request::RequestHeader::content_type`] and
/// [`crate::request::MultipartInfo::content_type`].
pub const MAX_CONTENT_TYPE_LEN: usize = 128;
/// Capacity of [`crate::request::RequestHeader::connection`].
pub const MAX_CONNECTION_LEN: usize = 64;
/// Capacity of [`crate::request::MultipartInfo::content_disp`].
pub const MAX_CONTENT_DISP_LEN: usize = 256;

/// Name reported in the `Server:` response header.
pub const SERVER_NAME: &str = "uWeb";
