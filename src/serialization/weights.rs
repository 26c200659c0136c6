//! Binary weight files.
//!
//! Versioned layout (little-endian):
//! - magic: [u8;4] = b"NTW1"
//! - version: u8 = 1
//! - endian: u8 = 0 (little-endian)
//! - tables: u32
//! - per table: entries u64, then `entries` f32 values
//! - trailer: CRC32C u32 of all preceding bytes
//!
//! The legacy, pre-versioned layout is a `u32` table
//! count followed by the same per-table records, with no trailer.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

const MAGIC: &[u8; 4] = b"NTW1";
const VERSION: u8 = 1;
const ENDIAN_LE: u8 = 0;

/// magic + version + endian + table count
const HEADER_LEN: usize = 4 + 1 + 1 + 4;
const TRAILER_LEN: usize = 4;

#[derive(thiserror::Error, Debug)]
pub enum WeightFileError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid magic or version")]
    MagicOrVersion,
    #[error("unsupported endianness")]
    Endianness,
    #[error("corrupt weight file: {0}")]
    Corrupt(&'static str),
    #[error("checksum mismatch")]
    Checksum,
}

#[inline]
fn read_u32_le(bytes: &[u8]) -> Option<u32> {
    Some(u32::from_le_bytes(bytes.get(..4)?.try_into().ok()?))
}

#[inline]
fn read_u64_le(bytes: &[u8]) -> Option<u64> {
    Some(u64::from_le_bytes(bytes.get(..8)?.try_into().ok()?))
}

/// Append one per-table record: entry count, then the values.
pub fn write_record(buf: &mut Vec<u8>, values: &[f32]) {
    buf.reserve(8 + 4 * values.len());
    buf.extend_from_slice(&(values.len() as u64).to_le_bytes());
    for v in values {
        buf.extend_from_slice(&v.to_bits().to_le_bytes());
    }
}

/// Decode one per-table record starting at `bytes[0]`.
///
/// Returns the values and the number of bytes consumed. The declared entry
/// count is checked against the bytes actually present before anything is
/// allocated.
pub fn read_record(bytes: &[u8]) -> Result<(Vec<f32>, usize), WeightFileError> {
    let entries = read_u64_le(bytes).ok_or(WeightFileError::Corrupt("truncated entry count"))?;
    let body_len = usize::try_from(entries)
        .ok()
        .and_then(|n| n.checked_mul(4))
        .ok_or(WeightFileError::Corrupt("entry count overflows"))?;
    let body = bytes
        .get(8..)
        .and_then(|rest| rest.get(..body_len))
        .ok_or(WeightFileError::Corrupt("declared entries exceed file size"))?;
    let values = body
        .chunks_exact(4)
        .map(|c| f32::from_bits(u32::from_le_bytes([c[0], c[1], c[2], c[3]])))
        .collect();
    Ok((values, 8 + body_len))
}

fn read_records(mut bytes: &[u8], tables: u32) -> Result<Vec<Vec<f32>>, WeightFileError> {
    let mut out = Vec::new();
    for _ in 0..tables {
        let (values, used) = read_record(bytes)?;
        out.push(values);
        bytes = &bytes[used..];
    }
    if !bytes.is_empty() {
        return Err(WeightFileError::Corrupt("trailing bytes after last table"));
    }
    Ok(out)
}

/// Encode tables into the versioned format.
pub fn encode_weights(tables: &[&[f32]]) -> Vec<u8> {
    let payload: usize = tables.iter().map(|t| 8 + 4 * t.len()).sum();
    let mut buf = Vec::with_capacity(HEADER_LEN + payload + TRAILER_LEN);
    buf.extend_from_slice(MAGIC);
    buf.push(VERSION);
    buf.push(ENDIAN_LE);
    buf.extend_from_slice(&(tables.len() as u32).to_le_bytes());
    for t in tables {
        write_record(&mut buf, t);
    }
    let checksum = crc32c::crc32c(&buf);
    buf.extend_from_slice(&checksum.to_le_bytes());
    buf
}

/// Decode the versioned format.
pub fn decode_weights(bytes: &[u8]) -> Result<Vec<Vec<f32>>, WeightFileError> {
    if bytes.len() < HEADER_LEN + TRAILER_LEN {
        return Err(WeightFileError::Corrupt("file shorter than header"));
    }
    // Validate checksum first so field parsing only sees intact bytes
    let (content, trailer) = bytes.split_at(bytes.len() - TRAILER_LEN);
    let file_crc = read_u32_le(trailer).ok_or(WeightFileError::Corrupt("missing checksum"))?;
    if file_crc != crc32c::crc32c(content) {
        return Err(WeightFileError::Checksum);
    }

    if &content[..4] != MAGIC || content[4] != VERSION {
        return Err(WeightFileError::MagicOrVersion);
    }
    if content[5] != ENDIAN_LE {
        return Err(WeightFileError::Endianness);
    }
    let tables = read_u32_le(&content[6..]).ok_or(WeightFileError::Corrupt("missing table count"))?;
    read_records(&content[HEADER_LEN..], tables)
}

/// Encode tables into the legacy layout.
pub fn encode_legacy_weights(tables: &[&[f32]]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(tables.len() as u32).to_le_bytes());
    for t in tables {
        write_record(&mut buf, t);
    }
    buf
}

/// Decode the legacy layout. Without a checksum only the structure can be
/// validated: every declared record must be fully present and nothing may
/// follow the last one.
pub fn decode_legacy_weights(bytes: &[u8]) -> Result<Vec<Vec<f32>>, WeightFileError> {
    let tables = read_u32_le(bytes).ok_or(WeightFileError::Corrupt("missing table count"))?;
    read_records(&bytes[4..], tables)
}

pub fn write_weights_to_path<P: AsRef<Path>>(path: P, tables: &[&[f32]]) -> Result<(), WeightFileError> {
    let data = encode_weights(tables);
    let mut f = fs::File::create(path)?;
    f.write_all(&data)?;
    f.sync_all()?;
    Ok(())
}

pub fn read_weights_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<f32>>, WeightFileError> {
    let data = fs::read(path)?;
    decode_weights(&data)
}

pub fn write_legacy_weights_to_path<P: AsRef<Path>>(path: P, tables: &[&[f32]]) -> Result<(), WeightFileError> {
    fs::write(path, encode_legacy_weights(tables))?;
    Ok(())
}

pub fn read_legacy_weights_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<f32>>, WeightFileError> {
    let data = fs::read(path)?;
    decode_legacy_weights(&data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn bits(tables: &[Vec<f32>]) -> Vec<Vec<u32>> {
        tables.iter().map(|t| t.iter().map(|v| v.to_bits()).collect()).collect()
    }

    #[test]
    fn record_round_trip_is_bit_exact() {
        let values = vec![0.0, -0.0, 1.5, f32::MIN_POSITIVE, f32::NAN, -1234.5678, f32::INFINITY];
        let mut buf = Vec::new();
        write_record(&mut buf, &values);
        assert_eq!(buf.len(), 8 + 4 * values.len());
        let (back, used) = read_record(&buf).unwrap();
        assert_eq!(used, buf.len());
        assert_eq!(bits(&[back]), bits(&[values]));
    }

    #[test]
    fn file_round_trip() {
        let a = vec![1.0f32, 2.0, 3.0];
        let b: Vec<f32> = (0..4096).map(|i| i as f32 * 0.01).collect();
        let tmp = NamedTempFile::new().unwrap();
        write_weights_to_path(tmp.path(), &[a.as_slice(), b.as_slice()]).unwrap();
        let loaded = read_weights_from_path(tmp.path()).unwrap();
        assert_eq!(bits(&loaded), bits(&[a, b]));
    }

    #[test]
    fn empty_network_file_is_valid() {
        let bytes = encode_weights(&[]);
        assert_eq!(bytes.len(), HEADER_LEN + TRAILER_LEN);
        assert!(decode_weights(&bytes).unwrap().is_empty());
    }

    #[test]
    fn checksum_mismatch() {
        let mut bytes = encode_weights(&[[1.0f32, 2.0].as_slice()]);
        bytes[HEADER_LEN + 9] ^= 0xFF;
        assert!(matches!(decode_weights(&bytes), Err(WeightFileError::Checksum)));
    }

    #[test]
    fn bad_magic() {
        let mut bytes = encode_weights(&[[1.0f32].as_slice()]);
        bytes[0] = b'X';
        let n = bytes.len() - TRAILER_LEN;
        let crc = crc32c::crc32c(&bytes[..n]);
        bytes[n..].copy_from_slice(&crc.to_le_bytes());
        assert!(matches!(decode_weights(&bytes), Err(WeightFileError::MagicOrVersion)));
    }

    #[test]
    fn truncated_file_is_corrupt() {
        let bytes = encode_weights(&[[1.0f32, 2.0, 3.0].as_slice()]);
        let err = decode_weights(&bytes[..HEADER_LEN + 2]).unwrap_err();
        assert!(matches!(err, WeightFileError::Corrupt(_) | WeightFileError::Checksum));
    }

    #[test]
    fn oversized_entry_count_is_corrupt() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&(u64::MAX / 2).to_le_bytes());
        buf.extend_from_slice(&[0u8; 16]);
        assert!(matches!(decode_legacy_weights(&buf), Err(WeightFileError::Corrupt(_))));
    }

    #[test]
    fn legacy_round_trip_and_validation() {
        let a = vec![0.5f32; 16];
        let bytes = encode_legacy_weights(&[a.as_slice()]);
        assert_eq!(bits(&decode_legacy_weights(&bytes).unwrap()), bits(&[a]));

        let short = &bytes[..bytes.len() - 1];
        assert!(matches!(decode_legacy_weights(short), Err(WeightFileError::Corrupt(_))));

        let mut long = bytes.clone();
        long.push(0);
        assert!(matches!(decode_legacy_weights(&long), Err(WeightFileError::Corrupt(_))));

        assert!(matches!(decode_legacy_weights(&[1, 0]), Err(WeightFileError::Corrupt(_))));
    }
}
