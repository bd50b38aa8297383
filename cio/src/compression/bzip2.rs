use crate::close::ReadClose;
use bzip2;
use std::io::{self, Read};

// Reading comes from the decoder, closing from the stream it wraps.
pub struct Bzip2Decompressor<R: Read> {
    r: bzip2::read::MultiBzDecoder<R>,
}

impl<R: Read> Bzip2Decompressor<R> {
    pub fn new(r: R) -> Self {
        Self {
            r: bzip2::read::MultiBzDecoder::new(r),
        }
    }

    pub fn into_inner(self) -> R {
        self.r.into_inner()
    }
}

impl<R: Read> Read for Bzip2Decompressor<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.r.read(buf)
    }
}

impl<R: ReadClose> ReadClose for Bzip2Decompressor<R> {
    fn close(self: Box<Self>) -> io::Result<()> {
        let r = self.into_inner();
        ReadClose::close(Box::new(r))
    }
}

#[cfg(test)]
fn compress(data: &[u8]) -> Vec<u8> {
    use std::io::Write;

    let mut w = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::best());
    w.write_all(data).unwrap();
    w.finish().unwrap()
}

#[test]
fn test_decode() {
    let compressed = compress(b"bzip2 payload");
    let mut r = Bzip2Decompressor::new(&compressed[..]);
    let mut out = String::new();
    r.read_to_string(&mut out).unwrap();
    assert_eq!(out, "bzip2 payload");
}

#[test]
fn test_concatenated_streams() {
    let mut compressed = compress(b"one,");
    compressed.extend(compress(b"two"));

    let mut r = Bzip2Decompressor::new(&compressed[..]);
    let mut out = String::new();
    r.read_to_string(&mut out).unwrap();
    assert_eq!(out, "one,two");
}

#[test]
fn test_garbage_fails_lazily() {
    let data = b"definitely not bzip2";
    // Construction never looks at the data.
    let mut r = Bzip2Decompressor::new(&data[..]);
    let mut out = Vec::new();
    assert!(r.read_to_end(&mut out).is_err());
}

#[test]
fn test_into_inner_returns_stream() {
    let data = b"untouched";
    let r = Bzip2Decompressor::new(&data[..]);
    assert_eq!(r.into_inner(), &data[..]);
}
