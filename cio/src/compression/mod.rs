use crate::close::{ReadClose, WriteClose};
use crate::error::{Error, Result};
use crate::format::{self, Format};
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

pub mod gzip;
pub use self::gzip::{GzipCompressor, GzipDecompressor};

pub mod bzip2;
pub use self::bzip2::Bzip2Decompressor;

pub const DEFAULT_LEVEL: u32 = 6;
pub const MAX_LEVEL: u32 = 9;

/// Wraps `input` so that reading from the result yields the decompressed
/// content, picking the codec from `tag` ("", ".gz" or ".bz2").
///
/// `input` is normally the direct result of opening the stream, e.g.
/// `decompressing_reader(File::open(path), tag_of(path))`. An `Err` there is
/// reported as [`ErrorKind::Upstream`](crate::ErrorKind::Upstream) and nothing
/// else happens. Once a stream has been handed over the function owns it: if
/// it fails afterwards the stream is closed before the error is returned.
///
/// gzip input is checked eagerly, so a stream that does not start with a
/// gzip header fails here. bzip2 input is only checked on the first read.
pub fn decompressing_reader<'a, R: ReadClose + 'a>(
    input: io::Result<R>,
    tag: &str,
) -> Result<Box<dyn ReadClose + 'a>> {
    let r = match input {
        Ok(r) => r,
        Err(err) => {
            warn!(format = tag, error = %err, "cannot decompress, no usable input stream");
            return Err(Error::Upstream(err));
        }
    };

    let fmt = match Format::from_tag(tag) {
        Ok(fmt) => fmt,
        Err(err) => {
            warn!(format = tag, "unknown format");
            release_reader(r);
            return Err(err);
        }
    };

    match fmt {
        Format::Plain => Ok(Box::new(r)),
        Format::Bzip2 => {
            debug!(codec = %fmt, "decompressing input");
            Ok(Box::new(Bzip2Decompressor::new(r)))
        }
        Format::Gzip => match GzipDecompressor::new(r) {
            Ok(r) => {
                debug!(codec = %fmt, "decompressing input");
                Ok(Box::new(r))
            }
            Err((err, r)) => {
                warn!(format = tag, error = %err, "cannot create gzip reader");
                release_reader(r);
                Err(Error::Codec {
                    format: fmt,
                    source: err,
                })
            }
        },
    }
}

/// Wraps `output` so that bytes written to the result are compressed with the
/// codec picked from `tag` ("" or ".gz"). Closing the result finishes the
/// compressed stream and then closes `output`.
///
/// ".bz2" is recognised but always fails: there is no bzip2 encoder here.
pub fn compressing_writer<'a, W: WriteClose + 'a>(
    output: io::Result<W>,
    tag: &str,
) -> Result<Box<dyn WriteClose + 'a>> {
    compressing_writer_with_level(output, tag, DEFAULT_LEVEL)
}

/// Like [`compressing_writer`], with an explicit gzip level (0 to 9, larger
/// values are clamped). The level is ignored for other formats.
pub fn compressing_writer_with_level<'a, W: WriteClose + 'a>(
    output: io::Result<W>,
    tag: &str,
    level: u32,
) -> Result<Box<dyn WriteClose + 'a>> {
    let w = match output {
        Ok(w) => w,
        Err(err) => {
            warn!(format = tag, error = %err, "cannot compress, no usable output stream");
            return Err(Error::Upstream(err));
        }
    };

    let fmt = match Format::from_tag(tag) {
        Ok(fmt) => fmt,
        Err(err) => {
            warn!(format = tag, "unknown format");
            release_writer(w);
            return Err(err);
        }
    };

    match fmt {
        Format::Plain => Ok(Box::new(w)),
        Format::Gzip => {
            let level = level.min(MAX_LEVEL);
            debug!(codec = %fmt, level, "compressing output");
            Ok(Box::new(GzipCompressor::new(w, level)))
        }
        // bzip2 is decode-only.
        Format::Bzip2 => {
            warn!(format = tag, "{} compression not supported", fmt);
            release_writer(w);
            Err(Error::Unsupported(fmt))
        }
    }
}

/// Opens `path` and decompresses it according to its extension.
pub fn open_reader<P: AsRef<Path>>(path: P) -> Result<Box<dyn ReadClose>> {
    let path = path.as_ref();
    decompressing_reader(File::open(path), format::tag_of(path))
}

/// Creates `path` and compresses what is written according to its extension.
pub fn create_writer<P: AsRef<Path>>(path: P) -> Result<Box<dyn WriteClose>> {
    let path = path.as_ref();
    compressing_writer(File::create(path), format::tag_of(path))
}

fn release_reader<R: ReadClose>(r: R) {
    if let Err(err) = ReadClose::close(Box::new(r)) {
        debug!(error = %err, "closing rejected input failed");
    }
}

fn release_writer<W: WriteClose>(w: W) {
    if let Err(err) = WriteClose::close(Box::new(w)) {
        debug!(error = %err, "closing rejected output failed");
    }
}

#[cfg(test)]
mod testutil {
    use super::*;
    use std::cell::Cell;
    use std::io::{Read, Write};
    use std::rc::Rc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    pub const TEXT: &str =
        "Hello, world or 你好，世界 or καλημ ́ρα κóσμ or こんにちはせかい\n";

    // Counts diagnostics, i.e. events at WARN or above.
    struct CountWarnings(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for CountWarnings {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() <= Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    pub fn count_warnings<T>(f: impl FnOnce() -> T) -> (T, usize) {
        let count = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(CountWarnings(count.clone()));
        let out = tracing::subscriber::with_default(subscriber, f);
        (out, count.load(Ordering::SeqCst))
    }

    // Records how often close was called on the wrapped stream.
    pub struct Tracked<T> {
        pub inner: T,
        pub closed: Rc<Cell<usize>>,
    }

    impl<T> Tracked<T> {
        pub fn new(inner: T) -> (Self, Rc<Cell<usize>>) {
            let closed = Rc::new(Cell::new(0));
            (
                Self {
                    inner,
                    closed: closed.clone(),
                },
                closed,
            )
        }
    }

    impl<T: Read> Read for Tracked<T> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl<T: Write> Write for Tracked<T> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.inner.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            self.inner.flush()
        }
    }

    impl<T: Read> ReadClose for Tracked<T> {
        fn close(self: Box<Self>) -> io::Result<()> {
            self.closed.set(self.closed.get() + 1);
            Ok(())
        }
    }

    impl<T: Write> WriteClose for Tracked<T> {
        fn close(mut self: Box<Self>) -> io::Result<()> {
            self.inner.flush()?;
            self.closed.set(self.closed.get() + 1);
            Ok(())
        }
    }

    pub fn not_found() -> io::Error {
        io::Error::new(io::ErrorKind::NotFound, "no such file")
    }

    pub fn gzip(data: &[u8]) -> Vec<u8> {
        let mut w = GzipCompressor::new(Vec::new(), DEFAULT_LEVEL);
        w.write_all(data).unwrap();
        w.finish().unwrap()
    }

    pub fn bzip2(data: &[u8]) -> Vec<u8> {
        let mut w = ::bzip2::write::BzEncoder::new(Vec::new(), ::bzip2::Compression::default());
        w.write_all(data).unwrap();
        w.finish().unwrap()
    }

    pub fn read_all(mut r: Box<dyn ReadClose + '_>) -> Vec<u8> {
        let mut out = Vec::new();
        r.read_to_end(&mut out).unwrap();
        r.close().unwrap();
        out
    }
}

#[cfg(test)]
use self::testutil::*;
#[cfg(test)]
use crate::close::NopCloser;
#[cfg(test)]
use crate::error::ErrorKind;
#[cfg(test)]
use proptest::prelude::*;
#[cfg(test)]
use std::io::{Read, Write};

#[cfg(test)]
fn write_and_read(tag: &str) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut w = compressing_writer(Ok(NopCloser::new(&mut buf)), tag).unwrap();
    w.write_all(TEXT.as_bytes()).unwrap();
    w.close().unwrap();

    read_all(decompressing_reader(Ok(NopCloser::new(&buf[..])), tag).unwrap())
}

#[test]
fn test_plain_round_trip() {
    assert_eq!(write_and_read(""), TEXT.as_bytes());
}

#[test]
fn test_gzip_round_trip() {
    assert_eq!(write_and_read(".gz"), TEXT.as_bytes());
}

#[test]
fn test_gzip_round_trip_binary() {
    let data: Vec<u8> = (0..100_000u32).map(|i| (i * 7 % 251) as u8).collect();
    let mut buf = Vec::new();
    let mut w = compressing_writer(Ok(NopCloser::new(&mut buf)), ".gz").unwrap();
    w.write_all(&data).unwrap();
    w.close().unwrap();

    assert!(buf.len() < data.len());
    let out = read_all(decompressing_reader(Ok(NopCloser::new(&buf[..])), ".gz").unwrap());
    assert_eq!(out, data);
}

#[test]
fn test_gzip_round_trip_empty() {
    let mut buf = Vec::new();
    let w = compressing_writer(Ok(NopCloser::new(&mut buf)), ".gz").unwrap();
    w.close().unwrap();

    // Even an empty payload produces a complete gzip stream.
    assert_eq!(&buf[0..2], &[0x1f, 0x8b]);
    let out = read_all(decompressing_reader(Ok(NopCloser::new(&buf[..])), ".gz").unwrap());
    assert!(out.is_empty());
}

#[cfg(test)]
proptest! {
    #![proptest_config(ProptestConfig {
        cases: 50,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_round_trip_any_bytes(
        data in prop::collection::vec(any::<u8>(), 0..4096),
        compressed in any::<bool>(),
    ) {
        let tag = if compressed { ".gz" } else { "" };
        let mut buf = Vec::new();
        let mut w = compressing_writer(Ok(NopCloser::new(&mut buf)), tag).unwrap();
        w.write_all(&data).unwrap();
        w.close().unwrap();

        let out = read_all(decompressing_reader(Ok(NopCloser::new(&buf[..])), tag).unwrap());
        prop_assert_eq!(out, data);
    }
}

#[test]
fn test_read_plain() {
    let (r, _) = Tracked::new(TEXT.as_bytes());
    let out = read_all(decompressing_reader(Ok(r), "").unwrap());
    assert_eq!(out, TEXT.as_bytes());
}

#[test]
fn test_read_gzip() {
    let compressed = gzip(TEXT.as_bytes());
    let out = read_all(decompressing_reader(Ok(NopCloser::new(&compressed[..])), ".gz").unwrap());
    assert_eq!(out, TEXT.as_bytes());
}

#[test]
fn test_read_bzip2() {
    let compressed = bzip2(TEXT.as_bytes());
    let out = read_all(decompressing_reader(Ok(NopCloser::new(&compressed[..])), ".bz2").unwrap());
    assert_eq!(out, TEXT.as_bytes());
}

#[test]
fn test_read_concatenated_gzip() {
    let mut compressed = gzip(b"Hello, ");
    compressed.extend(gzip(b"world"));
    let out = read_all(decompressing_reader(Ok(NopCloser::new(&compressed[..])), ".gz").unwrap());
    assert_eq!(out, b"Hello, world");
}

#[test]
fn test_close_reaches_original_reader() {
    let gz = gzip(b"x");
    let bz = bzip2(b"x");
    for (tag, data) in [("", &b"x"[..]), (".gz", &gz[..]), (".bz2", &bz[..])] {
        let (r, closed) = Tracked::new(data);
        let out = read_all(decompressing_reader(Ok(r), tag).unwrap());
        assert_eq!(out, b"x");
        assert_eq!(closed.get(), 1, "tag {:?}", tag);
    }
}

#[test]
fn test_close_reaches_original_writer() {
    for tag in ["", ".gz"] {
        let (w, closed) = Tracked::new(Vec::new());
        let mut w = compressing_writer(Ok(w), tag).unwrap();
        w.write_all(b"x").unwrap();
        w.close().unwrap();
        assert_eq!(closed.get(), 1, "tag {:?}", tag);
    }
}

#[test]
fn test_gzip_close_writes_trailer() {
    let mut buf = Vec::new();
    let mut w = compressing_writer(Ok(NopCloser::new(&mut buf)), ".gz").unwrap();
    w.write_all(b"abc").unwrap();
    w.close().unwrap();

    // CRC32 and ISIZE make up the last eight bytes.
    let n = buf.len();
    assert_eq!(&buf[n - 4..], &3u32.to_le_bytes());
}

#[test]
fn test_upstream_error() {
    for tag in ["", ".gz", ".bz2", ".xyz"] {
        let (res, warnings) =
            count_warnings(|| decompressing_reader::<NopCloser<&[u8]>>(Err(not_found()), tag));
        assert_eq!(res.err().unwrap().kind(), ErrorKind::Upstream);
        assert_eq!(warnings, 1);

        let (res, warnings) =
            count_warnings(|| compressing_writer::<NopCloser<Vec<u8>>>(Err(not_found()), tag));
        assert_eq!(res.err().unwrap().kind(), ErrorKind::Upstream);
        assert_eq!(warnings, 1);
    }
}

#[test]
fn test_unknown_format() {
    let (r, closed) = Tracked::new(&b"data"[..]);
    let (res, warnings) = count_warnings(|| decompressing_reader(Ok(r), ".xyz"));
    assert_eq!(res.err().unwrap().kind(), ErrorKind::UnknownFormat);
    assert_eq!(warnings, 1);
    assert_eq!(closed.get(), 1);

    let (w, closed) = Tracked::new(Vec::new());
    let (res, warnings) = count_warnings(|| compressing_writer(Ok(w), ".xyz"));
    assert_eq!(res.err().unwrap().kind(), ErrorKind::UnknownFormat);
    assert_eq!(warnings, 1);
    assert_eq!(closed.get(), 1);
}

#[test]
fn test_tags_are_exact() {
    for tag in [".GZ", "gz", ".gz ", ".bz"] {
        let res = decompressing_reader(Ok(NopCloser::new(&b""[..])), tag);
        assert_eq!(res.err().unwrap().kind(), ErrorKind::UnknownFormat);
    }
}

#[test]
fn test_bzip2_compression_unsupported() {
    let (w, closed) = Tracked::new(Vec::new());
    let (res, warnings) = count_warnings(|| compressing_writer(Ok(w), ".bz2"));
    let err = res.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Unsupported);
    assert_eq!(err.to_string(), "bzip2 compression not supported");
    assert_eq!(warnings, 1);
    assert_eq!(closed.get(), 1);

    let res = compressing_writer_with_level(Ok(NopCloser::new(Vec::new())), ".bz2", 1);
    assert_eq!(res.err().unwrap().kind(), ErrorKind::Unsupported);
}

#[test]
fn test_gzip_rejects_invalid_input() {
    let (r, closed) = Tracked::new(TEXT.as_bytes());
    let (res, warnings) = count_warnings(|| decompressing_reader(Ok(r), ".gz"));
    assert_eq!(res.err().unwrap().kind(), ErrorKind::Codec);
    assert_eq!(warnings, 1);
    assert_eq!(closed.get(), 1);

    let res = decompressing_reader(Ok(NopCloser::new(&b""[..])), ".gz");
    assert_eq!(res.err().unwrap().kind(), ErrorKind::Codec);
}

#[test]
fn test_gzip_rejects_truncated_header() {
    // FNAME flag set, name cut off before its terminator.
    let data = b"\x1f\x8b\x08\x08\x00\x00\x00\x00\x00\x03ab";
    let (r, closed) = Tracked::new(&data[..]);
    let (res, warnings) = count_warnings(|| decompressing_reader(Ok(r), ".gz"));
    assert_eq!(res.err().unwrap().kind(), ErrorKind::Codec);
    assert_eq!(warnings, 1);
    assert_eq!(closed.get(), 1);
}

#[test]
fn test_writer_formats() {
    for (tag, ok) in [("", true), (".gz", true), (".bz2", false)] {
        let (w, closed) = Tracked::new(Vec::new());
        let (res, warnings) = count_warnings(|| compressing_writer(Ok(w), tag));
        assert_eq!(res.is_ok(), ok, "tag {:?}", tag);
        if let Ok(w) = res {
            w.close().unwrap();
        }
        assert_eq!(warnings, if ok { 0 } else { 1 }, "tag {:?}", tag);
        assert_eq!(closed.get(), 1, "tag {:?}", tag);
    }
}

#[test]
fn test_bzip2_fails_on_read() {
    let mut r = decompressing_reader(Ok(NopCloser::new(TEXT.as_bytes())), ".bz2").unwrap();
    let mut out = Vec::new();
    assert!(r.read_to_end(&mut out).is_err());
}

#[test]
fn test_success_is_quiet() {
    let compressed = gzip(b"quiet");
    let (res, warnings) =
        count_warnings(|| decompressing_reader(Ok(NopCloser::new(&compressed[..])), ".gz"));
    assert!(res.is_ok());
    assert_eq!(warnings, 0);
}

#[test]
fn test_levels() {
    let data = TEXT.repeat(200);
    let mut sizes = Vec::new();
    for level in [0, 9, 100] {
        let mut buf = Vec::new();
        let mut w =
            compressing_writer_with_level(Ok(NopCloser::new(&mut buf)), ".gz", level).unwrap();
        w.write_all(data.as_bytes()).unwrap();
        w.close().unwrap();

        let out = read_all(decompressing_reader(Ok(NopCloser::new(&buf[..])), ".gz").unwrap());
        assert_eq!(out, data.as_bytes());
        sizes.push(buf.len());
    }

    assert!(sizes[1] < sizes[0]);
    // Out of range levels behave like the maximum.
    assert_eq!(sizes[1], sizes[2]);
}
