use crate::close::{ReadClose, WriteClose};
use flate2;
use std::io::{self, Read, Write};

pub struct GzipCompressor<W: Write> {
    w: flate2::write::GzEncoder<W>,
}

impl<W: Write> GzipCompressor<W> {
    pub fn new(w: W, level: u32) -> Self {
        Self {
            w: flate2::write::GzEncoder::new(w, flate2::Compression::new(level)),
        }
    }

    /// Writes the gzip trailer and hands back the wrapped writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.w.try_finish()?;
        self.w.finish()
    }
}

impl<W: Write> Write for GzipCompressor<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.w.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.w.flush()
    }
}

impl<W: WriteClose> WriteClose for GzipCompressor<W> {
    fn close(self: Box<Self>) -> io::Result<()> {
        let w = self.finish()?;
        WriteClose::close(Box::new(w))
    }
}

pub struct GzipDecompressor<R: Read> {
    r: flate2::read::MultiGzDecoder<R>,
}

impl<R: Read> GzipDecompressor<R> {
    /// Parses the whole header of the first member, optional fields and
    /// header CRC included, before returning. On failure the reader is handed
    /// back together with the error so the caller can dispose of it.
    pub fn new(r: R) -> Result<Self, (io::Error, R)> {
        let r = flate2::read::MultiGzDecoder::new(r);
        if r.header().is_none() {
            return Err((
                io::Error::new(io::ErrorKind::InvalidData, "invalid gzip header"),
                r.into_inner(),
            ));
        }

        Ok(Self { r })
    }

    pub fn into_inner(self) -> R {
        self.r.into_inner()
    }
}

impl<R: Read> Read for GzipDecompressor<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.r.read(buf)
    }
}

impl<R: ReadClose> ReadClose for GzipDecompressor<R> {
    fn close(self: Box<Self>) -> io::Result<()> {
        let r = self.into_inner();
        ReadClose::close(Box::new(r))
    }
}

#[cfg(test)]
const FIXED_HEADER_LEN: usize = 10;

#[cfg(test)]
fn compress(data: &[u8]) -> Vec<u8> {
    let mut w = GzipCompressor::new(Vec::new(), 6);
    w.write_all(data).unwrap();
    w.finish().unwrap()
}

// Sets FHCRC on a plain member and inserts the given CRC16 after the fixed header.
#[cfg(test)]
fn with_header_crc(member: &[u8], crc16: Option<u16>) -> Vec<u8> {
    let mut header = member[..FIXED_HEADER_LEN].to_vec();
    header[3] |= 0x02;
    let mut crc = flate2::Crc::new();
    crc.update(&header);
    let crc16 = crc16.unwrap_or(crc.sum() as u16);

    let mut out = header;
    out.extend_from_slice(&crc16.to_le_bytes());
    out.extend_from_slice(&member[FIXED_HEADER_LEN..]);
    out
}

#[cfg(test)]
fn expect_header_error(data: &[u8]) {
    match GzipDecompressor::new(data) {
        Ok(_) => panic!("expected failure for {:?}", data),
        Err((err, _)) => assert_eq!(err.kind(), io::ErrorKind::InvalidData),
    }
}

#[test]
fn test_round_trip() {
    let data = b"the quick brown fox jumps over the lazy dog";
    let compressed = compress(data);
    assert_eq!(&compressed[0..2], &[0x1f, 0x8b]);

    let mut r = GzipDecompressor::new(&compressed[..]).ok().unwrap();
    let mut out = Vec::new();
    r.read_to_end(&mut out).unwrap();
    assert_eq!(out, data);
}

#[test]
fn test_concatenated_members() {
    let mut compressed = compress(b"first ");
    compressed.extend(compress(b"second"));

    let mut r = GzipDecompressor::new(&compressed[..]).ok().unwrap();
    let mut out = String::new();
    r.read_to_string(&mut out).unwrap();
    assert_eq!(out, "first second");
}

#[test]
fn test_rejects_bad_magic() {
    expect_header_error(b"this is not gzip at all");
}

#[test]
fn test_rejects_short_input() {
    for data in [&b""[..], &b"\x1f\x8b"[..], &b"\x1f\x8b\x08\x00"[..]] {
        expect_header_error(data);
    }
}

#[test]
fn test_rejects_unknown_method() {
    let mut compressed = compress(b"abc");
    compressed[2] = 0x07;
    expect_header_error(&compressed);
}

#[test]
fn test_rejects_truncated_file_name() {
    // FNAME set, name never terminated.
    expect_header_error(b"\x1f\x8b\x08\x08\x00\x00\x00\x00\x00\x03ab");
}

#[test]
fn test_rejects_truncated_extra_field() {
    // FEXTRA announces 16 bytes, only 2 follow.
    expect_header_error(b"\x1f\x8b\x08\x04\x00\x00\x00\x00\x00\x03\x10\x00ab");
}

#[test]
fn test_header_crc() {
    let member = compress(b"checked header");

    let good = with_header_crc(&member, None);
    let mut r = GzipDecompressor::new(&good[..]).ok().unwrap();
    let mut out = String::new();
    r.read_to_string(&mut out).unwrap();
    assert_eq!(out, "checked header");

    let crc16 = u16::from_le_bytes([good[FIXED_HEADER_LEN], good[FIXED_HEADER_LEN + 1]]);
    expect_header_error(&with_header_crc(&member, Some(crc16 ^ 0xffff)));
}

#[test]
fn test_corrupt_body_fails_on_read() {
    let mut compressed = compress(b"some payload that is long enough to matter");
    let len = compressed.len();
    for b in &mut compressed[FIXED_HEADER_LEN..len - 8] {
        *b = 0xff;
    }

    let mut r = GzipDecompressor::new(&compressed[..]).ok().unwrap();
    let mut out = Vec::new();
    assert!(r.read_to_end(&mut out).is_err());
}
