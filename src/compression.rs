//! Per-sector codec dispatch.
//!
//! A compressed sector or single-unit payload carries a one-byte codec tag
//! ahead of the compressed stream. Only the codecs used by replay archives
//! are supported; anything else is refused with the offending byte.

use super::consts::*;
use super::error::Error;

/// Decodes one compressed sector. `expected_size` is the decompressed size
/// upper bound used to size the output buffer.
///
/// A stored payload (codec `0x00`) is returned whole, codec byte included.
/// The original tooling never stripped the byte and replay consumers rely on
/// seeing it, so the quirk is part of the format contract.
pub(crate) fn decompress_sector(raw: &[u8], expected_size: usize) -> Result<Vec<u8>, Error> {
    if raw.is_empty() {
        return Err(Error::CorruptPayload);
    }

    match raw[0] {
        COMPRESSION_STORED => Ok(raw.to_vec()),
        COMPRESSION_ZLIB => inflate(&raw[1..], expected_size),
        COMPRESSION_BZIP2 => bunzip(&raw[1..], expected_size),
        kind => Err(Error::UnsupportedCompression { kind }),
    }
}

fn inflate(data: &[u8], expected_size: usize) -> Result<Vec<u8>, Error> {
    let mut decompressed = vec![0u8; expected_size];
    let mut decompressor = flate2::Decompress::new(true);
    let status = decompressor.decompress(data, &mut decompressed, flate2::FlushDecompress::Finish);

    match status {
        Ok(status) if status != flate2::Status::BufError => {
            decompressed.resize(decompressor.total_out() as usize, 0);
            Ok(decompressed)
        }
        _ => Err(Error::CorruptPayload),
    }
}

fn bunzip(data: &[u8], expected_size: usize) -> Result<Vec<u8>, Error> {
    let mut decompressed = vec![0u8; expected_size];
    let mut decompressor = bzip2::Decompress::new(false);
    let status = decompressor.decompress(data, &mut decompressed);

    match status {
        Ok(bzip2::Status::Ok) | Ok(bzip2::Status::StreamEnd) => {
            decompressed.resize(decompressor.total_out() as usize, 0);
            Ok(decompressed)
        }
        _ => Err(Error::CorruptPayload),
    }
}
