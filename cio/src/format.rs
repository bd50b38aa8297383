use crate::error::{Error, Result};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Plain,
    Gzip,
    Bzip2,
}

impl Format {
    /// Tags are matched exactly: no case folding, no trimming.
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "" => Ok(Format::Plain),
            ".gz" => Ok(Format::Gzip),
            ".bz2" => Ok(Format::Bzip2),
            _ => Err(Error::UnknownFormat(tag.to_owned())),
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Format::Plain => "",
            Format::Gzip => ".gz",
            Format::Bzip2 => ".bz2",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Plain => "plain",
            Format::Gzip => "gzip",
            Format::Bzip2 => "bzip2",
        })
    }
}

/// Extension of the last path component, leading dot included, or "" when
/// there is none. Suitable for passing straight to the factories.
pub fn tag_of<P: AsRef<Path> + ?Sized>(path: &P) -> &str {
    let name = match path.as_ref().file_name().and_then(|n| n.to_str()) {
        Some(name) => name,
        None => return "",
    };

    match name.rfind('.') {
        Some(idx) => &name[idx..],
        None => "",
    }
}

#[test]
fn test_from_tag() {
    assert_eq!(Format::from_tag("").unwrap(), Format::Plain);
    assert_eq!(Format::from_tag(".gz").unwrap(), Format::Gzip);
    assert_eq!(Format::from_tag(".bz2").unwrap(), Format::Bzip2);

    for tag in [".GZ", "gz", " .gz", ".gz ", ".bz", ".xyz", "."] {
        let err = Format::from_tag(tag).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::UnknownFormat, "{:?}", tag);
    }
}

#[test]
fn test_tag_inverse() {
    for format in [Format::Plain, Format::Gzip, Format::Bzip2] {
        assert_eq!(Format::from_tag(format.tag()).unwrap(), format);
    }
}

#[test]
fn test_tag_of() {
    assert_eq!(tag_of("a_file_not_there"), "");
    assert_eq!(tag_of("/tmp/not_exist_dir/not_there_file"), "");
    assert_eq!(tag_of("data.tar.gz"), ".gz");
    assert_eq!(tag_of("logs/x.bz2"), ".bz2");
    assert_eq!(tag_of("dir.d/file"), "");
    assert_eq!(tag_of("file."), ".");
    assert_eq!(tag_of(".bashrc"), ".bashrc");
    assert_eq!(tag_of(Path::new("/var/log/syslog.1.gz")), ".gz");
}
