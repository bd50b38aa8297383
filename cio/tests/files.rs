use cio::format::tag_of;
use cio::{ErrorKind, ReadClose, WriteClose};
use std::fs::{self, File};
use std::io::{Read, Write};
use tempfile::tempdir;

const TEXT: &str = "Hello, world or 你好，世界 or καλημ ́ρα κóσμ or こんにちはせかい\n";

fn read_path(path: &std::path::Path) -> cio::Result<String> {
    let mut r = cio::decompressing_reader(File::open(path), tag_of(path))?;
    let mut s = String::new();
    r.read_to_string(&mut s).unwrap();
    r.close().unwrap();
    Ok(s)
}

#[test]
fn test_open_missing_file() {
    let path = "a_file_not_there";
    let err = cio::decompressing_reader(File::open(path), tag_of(path))
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::Upstream);

    let err = cio::open_reader("a_file_not_there.gz").err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Upstream);
}

#[test]
fn test_create_in_missing_dir() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("not_exist_dir").join("not_there_file.gz");
    let err = cio::compressing_writer(File::create(&path), tag_of(&path))
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::Upstream);
}

#[test]
fn test_gzip_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("greeting.txt.gz");

    let mut w = cio::create_writer(&path).unwrap();
    w.write_all(TEXT.as_bytes()).unwrap();
    w.close().unwrap();

    let raw = fs::read(&path).unwrap();
    assert_eq!(&raw[0..2], &[0x1f, 0x8b]);
    assert_ne!(raw, TEXT.as_bytes());

    assert_eq!(read_path(&path).unwrap(), TEXT);
}

#[test]
fn test_plain_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("greeting");

    let mut w = cio::create_writer(&path).unwrap();
    w.write_all(TEXT.as_bytes()).unwrap();
    w.close().unwrap();

    assert_eq!(fs::read(&path).unwrap(), TEXT.as_bytes());
    assert_eq!(read_path(&path).unwrap(), TEXT);
}

#[test]
fn test_bzip2_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("greeting.bz2");

    let mut enc = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
    enc.write_all(TEXT.as_bytes()).unwrap();
    fs::write(&path, enc.finish().unwrap()).unwrap();

    let mut r = cio::open_reader(&path).unwrap();
    let mut s = String::new();
    r.read_to_string(&mut s).unwrap();
    r.close().unwrap();
    assert_eq!(s, TEXT);

    let err = cio::create_writer(dir.path().join("out.bz2")).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Unsupported);
}

#[test]
fn test_plain_file_named_gz() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("lies.gz");
    fs::write(&path, TEXT).unwrap();

    let err = cio::open_reader(&path).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Codec);
}

#[test]
fn test_unknown_extension() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.xyz");
    fs::write(&path, TEXT).unwrap();

    assert_eq!(
        cio::open_reader(&path).err().unwrap().kind(),
        ErrorKind::UnknownFormat
    );
    assert_eq!(
        cio::create_writer(dir.path().join("out.xyz"))
            .err()
            .unwrap()
            .kind(),
        ErrorKind::UnknownFormat
    );
}

#[test]
fn test_compat_missing_file() {
    let path = "a_file_not_there";
    let (f, e) = match File::open(path) {
        Ok(f) => (Some(f), None),
        Err(e) => (None, Some(e)),
    };
    assert!(cio::compat::new_reader(f, e, tag_of(path)).is_none());
}
