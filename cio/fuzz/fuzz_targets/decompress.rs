#![no_main]

use cio::{NopCloser, ReadClose};
use libfuzzer_sys::fuzz_target;
use std::io::Read;

fuzz_target!(|data: &[u8]| {
    for tag in ["", ".gz", ".bz2"] {
        let mut r = match cio::decompressing_reader(Ok(NopCloser::new(data)), tag) {
            Ok(r) => r,
            Err(_) => continue,
        };

        let mut buf = [0u8; 4096];
        loop {
            match r.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => (),
            }
        }

        let _ = r.close();
    }
});
