use crate::format::Format;
use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Whatever produced the stream had already failed.
    Upstream,
    UnknownFormat,
    /// The format is known but has no codec for the requested direction.
    Unsupported,
    /// The codec rejected the stream while being set up.
    Codec,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("no usable stream: {0}")]
    Upstream(#[source] io::Error),

    #[error("unknown format: {0:?}")]
    UnknownFormat(String),

    #[error("{0} compression not supported")]
    Unsupported(Format),

    #[error("cannot create {format} decoder: {source}")]
    Codec {
        format: Format,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Upstream(_) => ErrorKind::Upstream,
            Error::UnknownFormat(_) => ErrorKind::UnknownFormat,
            Error::Unsupported(_) => ErrorKind::Unsupported,
            Error::Codec { .. } => ErrorKind::Codec,
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        let kind = match &err {
            Error::Upstream(e) => e.kind(),
            Error::UnknownFormat(_) => io::ErrorKind::InvalidInput,
            Error::Unsupported(_) => io::ErrorKind::Unsupported,
            Error::Codec { .. } => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, err)
    }
}

#[test]
fn test_kinds() {
    let err = Error::Upstream(io::Error::new(io::ErrorKind::NotFound, "gone"));
    assert_eq!(err.kind(), ErrorKind::Upstream);
    assert_eq!(io::Error::from(err).kind(), io::ErrorKind::NotFound);

    let err = Error::UnknownFormat(".xyz".into());
    assert_eq!(err.kind(), ErrorKind::UnknownFormat);
    assert_eq!(err.to_string(), "unknown format: \".xyz\"");
    assert_eq!(io::Error::from(err).kind(), io::ErrorKind::InvalidInput);

    let err = Error::Unsupported(Format::Bzip2);
    assert_eq!(err.kind(), ErrorKind::Unsupported);
    assert_eq!(err.to_string(), "bzip2 compression not supported");

    let err = Error::Codec {
        format: Format::Gzip,
        source: io::Error::new(io::ErrorKind::InvalidData, "bad magic"),
    };
    assert_eq!(err.kind(), ErrorKind::Codec);
    assert_eq!(err.to_string(), "cannot create gzip decoder: bad magic");
    assert_eq!(io::Error::from(err).kind(), io::ErrorKind::InvalidData);
}

#[test]
fn test_source_chain() {
    use std::error::Error as _;

    let err = Error::Upstream(io::Error::new(io::ErrorKind::PermissionDenied, "nope"));
    let source = err.source().unwrap();
    assert_eq!(source.to_string(), "nope");
    assert!(Error::UnknownFormat("".into()).source().is_none());
}
