use std::fs::File;
use std::io::{self, Read, Write};

/// A readable stream that owns some resource which has to be released.
pub trait ReadClose: Read {
    fn close(self: Box<Self>) -> io::Result<()>;
}

/// A writable stream that owns some resource which has to be released.
/// Closing flushes whatever the stream still buffers.
pub trait WriteClose: Write {
    fn close(self: Box<Self>) -> io::Result<()>;
}

impl<T: ReadClose + ?Sized> ReadClose for Box<T> {
    fn close(self: Box<Self>) -> io::Result<()> {
        T::close(*self)
    }
}

impl<T: WriteClose + ?Sized> WriteClose for Box<T> {
    fn close(self: Box<Self>) -> io::Result<()> {
        T::close(*self)
    }
}

impl ReadClose for File {
    fn close(self: Box<Self>) -> io::Result<()> {
        Ok(())
    }
}

impl WriteClose for File {
    fn close(mut self: Box<Self>) -> io::Result<()> {
        self.flush()
    }
}

impl ReadClose for io::Stdin {
    fn close(self: Box<Self>) -> io::Result<()> {
        Ok(())
    }
}

impl WriteClose for io::Stdout {
    fn close(mut self: Box<Self>) -> io::Result<()> {
        self.flush()
    }
}

impl WriteClose for io::Stderr {
    fn close(mut self: Box<Self>) -> io::Result<()> {
        self.flush()
    }
}

/// Gives any reader or writer a close that releases nothing, e.g. to hand an
/// in-memory buffer to the factories.
pub struct NopCloser<T> {
    inner: T,
}

impl<T> NopCloser<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read> Read for NopCloser<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<T: Write> Write for NopCloser<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<T: Read> ReadClose for NopCloser<T> {
    fn close(self: Box<Self>) -> io::Result<()> {
        Ok(())
    }
}

impl<T: Write> WriteClose for NopCloser<T> {
    fn close(mut self: Box<Self>) -> io::Result<()> {
        self.inner.flush()
    }
}

#[test]
fn test_nop_closer_read() {
    let mut r = NopCloser::new(&b"hello"[..]);
    let mut s = String::new();
    r.read_to_string(&mut s).unwrap();
    assert_eq!(s, "hello");
    ReadClose::close(Box::new(r)).unwrap();
}

#[test]
fn test_nop_closer_write() {
    let mut buf = Vec::new();
    let mut w = NopCloser::new(&mut buf);
    w.write_all(b"hello").unwrap();
    WriteClose::close(Box::new(w)).unwrap();
    assert_eq!(buf, b"hello");
}

#[test]
fn test_boxed_close_delegates() {
    let mut buf = Vec::new();
    {
        let w: Box<dyn WriteClose + '_> = Box::new(NopCloser::new(&mut buf));
        let mut outer = Box::new(w);
        outer.write_all(b"abc").unwrap();
        outer.close().unwrap();
    }
    assert_eq!(buf, b"abc");
}
