//! Maps raw keys to filesystem-safe filenames, and raw values to a small human-readable
//! CSV encoding, the way [kivis-fs] maps record keys and CSV-serialized records to files.
//!
//! Unlike kivis-fs, a key here is an arbitrary byte string (a bucket identity prefix plus
//! whatever bytes the caller's encoding produced), not already a UTF-8 string, so encoding
//! goes through [`percent_encoding`] directly over the raw bytes rather than over a
//! pre-serialized string.
//!
//! [kivis-fs]: https://crates.io/crates/kivis-fs

use std::io;

use percent_encoding::{percent_decode_str, percent_encode, AsciiSet, CONTROLS};

use buckdb::{Error, Result};

/// Everything but unreserved filename characters gets escaped; this keeps short ASCII
/// keys (bucket identities, small integers, short names) readable in a directory listing.
const FILENAME_SAFE: &AsciiSet = &CONTROLS
    .add(b'/')
    .add(b'\\')
    .add(b':')
    .add(b'*')
    .add(b'?')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'|')
    .add(b'%')
    .add(b'.');

const FILE_SUFFIX: &str = ".dat";

pub fn key_to_filename(key: &[u8]) -> String {
    format!("{}{FILE_SUFFIX}", percent_encode(key, FILENAME_SAFE))
}

pub fn filename_to_key(filename: &str) -> Option<Vec<u8>> {
    let stem = filename.strip_suffix(FILE_SUFFIX)?;
    Some(percent_decode_str(stem).collect())
}

/// Encodes a raw value as a single-row, single-column CSV record holding its hex text, so
/// an entry's file can be opened in a text editor.
pub fn encode_value(value: &[u8]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer
        .write_record([hex::encode(value)])
        .map_err(Error::from_driver)?;
    let bytes = writer.into_inner().map_err(Error::from_driver)?;
    String::from_utf8(bytes).map_err(Error::from_driver)
}

/// Inverse of [`encode_value`].
pub fn decode_value(text: &str) -> Result<Vec<u8>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(text.as_bytes());
    let record = reader
        .records()
        .next()
        .ok_or_else(|| Error::internal("entry file has no csv record"))?
        .map_err(Error::from_driver)?;
    let hex_field = record
        .get(0)
        .ok_or_else(|| Error::internal("entry file's csv record is empty"))?;
    hex::decode(hex_field).map_err(Error::from_driver)
}

pub fn io_not_found(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_round_trips_arbitrary_bytes() {
        let key = vec![0xffu8, 0x00, b'/', b'.', 1, 2, 3];
        let filename = key_to_filename(&key);
        assert!(filename.ends_with(".dat"));
        assert_eq!(filename_to_key(&filename).unwrap(), key);
    }

    #[test]
    fn value_round_trips() {
        let value = vec![1u8, 2, 3, 255, 0];
        let text = encode_value(&value).unwrap();
        assert_eq!(decode_value(&text).unwrap(), value);
    }
}
