//! Transparent compression for byte streams.
//!
//! Hand an opened stream, or the error from opening it, to
//! [`decompressing_reader`] or [`compressing_writer`] together with a format
//! tag, usually the file extension:
//!
//! ```no_run
//! use cio::format::tag_of;
//! use cio::ReadClose;
//! use std::fs::File;
//! use std::io::Read;
//!
//! let path = "access.log.gz";
//! let mut r = cio::decompressing_reader(File::open(path), tag_of(path))?;
//! let mut text = String::new();
//! r.read_to_string(&mut text)?;
//! r.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Recognised tags are `""` (no compression), `".gz"` and `".bz2"`. bzip2 can
//! only be read.

pub mod close;
pub mod compat;
pub mod compression;
pub mod error;
pub mod format;

pub use close::{NopCloser, ReadClose, WriteClose};
pub use compression::{
    compressing_writer, compressing_writer_with_level, create_writer, decompressing_reader,
    open_reader, DEFAULT_LEVEL,
};
pub use error::{Error, ErrorKind, Result};
pub use format::Format;
