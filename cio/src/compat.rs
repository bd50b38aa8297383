//! Option-returning wrappers around the factories, for callers that only care
//! whether they got a stream. The reason for a `None` has already been logged
//! by the time it is returned.

use crate::close::{ReadClose, WriteClose};
use crate::compression;
use std::io;

fn upstream<T>(handle: Option<T>, err: Option<io::Error>) -> io::Result<T> {
    match (handle, err) {
        (_, Some(err)) => Err(err),
        (None, None) => Err(io::Error::new(
            io::ErrorKind::NotFound,
            "no stream supplied",
        )),
        (Some(handle), None) => Ok(handle),
    }
}

pub fn new_reader<'a, R: ReadClose + 'a>(
    input: Option<R>,
    err: Option<io::Error>,
    tag: &str,
) -> Option<Box<dyn ReadClose + 'a>> {
    compression::decompressing_reader(upstream(input, err), tag).ok()
}

pub fn new_writer<'a, W: WriteClose + 'a>(
    output: Option<W>,
    err: Option<io::Error>,
    tag: &str,
) -> Option<Box<dyn WriteClose + 'a>> {
    compression::compressing_writer(upstream(output, err), tag).ok()
}

#[cfg(test)]
use crate::close::NopCloser;
#[cfg(test)]
use std::io::{Read, Write};

#[test]
fn test_missing_handle() {
    assert!(new_reader::<NopCloser<&[u8]>>(None, None, "").is_none());
    assert!(new_writer::<NopCloser<Vec<u8>>>(None, None, ".gz").is_none());
}

#[test]
fn test_prior_error_wins() {
    let err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
    assert!(new_reader(Some(NopCloser::new(&b"abc"[..])), Some(err), "").is_none());

    let err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
    assert!(new_writer(Some(NopCloser::new(Vec::new())), Some(err), "").is_none());
}

#[test]
fn test_failures_collapse_to_none() {
    assert!(new_reader(Some(NopCloser::new(&b"abc"[..])), None, ".xyz").is_none());
    assert!(new_reader(Some(NopCloser::new(&b"abc"[..])), None, ".gz").is_none());
    assert!(new_writer(Some(NopCloser::new(Vec::new())), None, ".bz2").is_none());
    assert!(new_writer(Some(NopCloser::new(Vec::new())), None, ".xyz").is_none());
}

#[test]
fn test_write_and_read() {
    for tag in ["", ".gz"] {
        let mut buf = Vec::new();
        let mut w = new_writer(Some(NopCloser::new(&mut buf)), None, tag).unwrap();
        w.write_all(b"compat").unwrap();
        w.close().unwrap();

        let mut r = new_reader(Some(NopCloser::new(&buf[..])), None, tag).unwrap();
        let mut out = String::new();
        r.read_to_string(&mut out).unwrap();
        r.close().unwrap();
        assert_eq!(out, "compat");
    }
}
