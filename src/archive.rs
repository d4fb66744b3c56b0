use std::borrow::Cow;
use std::cmp::min;
use std::fs;
use std::path::Path;

use super::compression::decompress_sector;
use super::consts::*;
use super::error::Error;
use super::header::Header;
use super::seeker::Seeker;
use super::table::*;

/// A read-only view over a MoPaQ archive held in memory.
///
/// Opening parses the header and decrypts both metadata tables up front;
/// file payloads are decoded on demand. Nothing is cached or mutated after
/// construction, so a shared reference can serve any number of concurrent
/// readers, and every returned payload is a fresh allocation independent of
/// the archive's backing buffer.
#[derive(Debug)]
pub struct Archive {
    seeker: Seeker,
    hash_table: FileHashTable,
    block_table: FileBlockTable,
    listfile: Option<Vec<String>>,
}

impl Archive {
    /// Opens an archive from a file on disk.
    ///
    /// With `with_listfile` set, the `(listfile)` entry is read through the
    /// regular file pipeline to populate [`files`](Archive::files); pass
    /// `false` to skip it for archives known not to carry one.
    pub fn open<P: AsRef<Path>>(path: P, with_listfile: bool) -> Result<Archive, Error> {
        let data = fs::read(path)?;

        Archive::from_bytes(data, with_listfile)
    }

    /// Opens an archive from an in-memory buffer. See [`open`](Archive::open).
    pub fn from_bytes(data: Vec<u8>, with_listfile: bool) -> Result<Archive, Error> {
        let seeker = Seeker::new(data)?;

        let hash_table = FileHashTable::from_seeker(&seeker)?;
        let block_table = FileBlockTable::from_seeker(&seeker)?;

        let mut archive = Archive {
            seeker,
            hash_table,
            block_table,
            listfile: None,
        };

        if with_listfile {
            archive.listfile = archive
                .read_file(LISTFILE_NAME)?
                .map(|data| parse_listfile(&data));
        }

        Ok(archive)
    }

    /// Reads a file's reassembled contents.
    ///
    /// Returns `Ok(None)` when the name is not in the archive, or when its
    /// block entry is a tombstone (exists flag clear, or nothing stored).
    pub fn read_file(&self, name: &str) -> Result<Option<Vec<u8>>, Error> {
        self.read_file_with(name, false)
    }

    /// Like [`read_file`](Archive::read_file), but with `force_decompress`
    /// set the codec dispatch runs even when the stored size does not
    /// indicate compression. Matches the behavior replay tooling expects
    /// for files whose payload shrank to exactly its logical size.
    pub fn read_file_with(&self, name: &str, force_decompress: bool) -> Result<Option<Vec<u8>>, Error> {
        let hash_entry = match self.hash_table.find_entry(name) {
            Some(entry) => entry,
            None => return Ok(None),
        };

        // a live hash entry pointing outside the block table means the
        // tables contradict each other
        let block_entry = self
            .block_table
            .get(hash_entry.block_index as usize)
            .ok_or(Error::InvalidFormat)?;

        if !block_entry.exists() {
            return Ok(None);
        }
        if block_entry.archived_size == 0 {
            return Ok(None);
        }
        if block_entry.is_encrypted() {
            return Err(Error::UnsupportedFeature {
                feature: "encrypted file",
            });
        }
        if block_entry.is_imploded() {
            return Err(Error::UnsupportedFeature {
                feature: "PKWare imploded file",
            });
        }

        let payload = self
            .seeker
            .read(block_entry.offset, block_entry.archived_size)?;

        let contents = if block_entry.is_single_unit() {
            self.read_single_unit(block_entry, payload, force_decompress)?
        } else {
            self.read_sectors(block_entry, payload, force_decompress)?
        };

        Ok(Some(contents))
    }

    fn read_single_unit(
        &self,
        block_entry: &BlockEntry,
        payload: &[u8],
        force_decompress: bool,
    ) -> Result<Vec<u8>, Error> {
        if block_entry.is_compressed()
            && (force_decompress || block_entry.size > block_entry.archived_size)
        {
            decompress_sector(payload, block_entry.size as usize)
        } else {
            Ok(payload.to_vec())
        }
    }

    fn read_sectors(
        &self,
        block_entry: &BlockEntry,
        payload: &[u8],
        force_decompress: bool,
    ) -> Result<Vec<u8>, Error> {
        let sector_size = self.seeker.sector_size();

        // The on-disk layout always carries one sector more than the
        // division suggests; when the size is an exact multiple, the extra
        // sector is empty and its offset equals the payload end.
        let mut sector_count = block_entry.size / sector_size + 1;
        if block_entry.has_sector_crc() {
            sector_count += 1;
        }

        let offsets = SectorOffsets::from_payload(payload, sector_count)?;

        // the last offset (or two, with a CRC sector) is an end marker, not
        // a data sector
        let effective_sectors = if block_entry.has_sector_crc() {
            offsets.count() - 1
        } else {
            offsets.count()
        };

        let mut result = Vec::with_capacity(block_entry.size as usize);
        let mut remaining = block_entry.size;

        for i in 0..effective_sectors {
            let (start, length) = offsets.one(i).ok_or(Error::CorruptPayload)?;
            let raw = &payload[start as usize..(start + length) as usize];

            let decoded: Cow<[u8]> = if block_entry.is_compressed()
                && (force_decompress || remaining > raw.len() as u64)
            {
                Cow::Owned(decompress_sector(
                    raw,
                    min(remaining, sector_size) as usize,
                )?)
            } else {
                Cow::Borrowed(raw)
            };

            if decoded.len() as u64 > remaining {
                return Err(Error::CorruptPayload);
            }
            remaining -= decoded.len() as u64;

            result.extend_from_slice(&decoded);
        }

        Ok(result)
    }

    /// The filenames enumerated by the `(listfile)`, when one was read at
    /// open time.
    pub fn files(&self) -> Option<&[String]> {
        self.listfile.as_deref()
    }

    /// Reads every listfile entry, pairing each name with its contents (or
    /// `None` for tombstones). Fails with [`Error::NoListfile`] when the
    /// archive was opened without a listfile.
    pub fn extract_all(&self) -> Result<Vec<(String, Option<Vec<u8>>)>, Error> {
        let names = self.listfile.as_ref().ok_or(Error::NoListfile)?;

        let mut extracted = Vec::with_capacity(names.len());
        for name in names {
            extracted.push((name.clone(), self.read_file(name)?));
        }

        Ok(extracted)
    }

    pub fn header(&self) -> &Header {
        self.seeker.header()
    }

    pub fn hash_table(&self) -> &FileHashTable {
        &self.hash_table
    }

    pub fn block_table(&self) -> &FileBlockTable {
        &self.block_table
    }
}

/// Splits decoded listfile contents on CRLF, dropping blank lines.
fn parse_listfile(data: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(data)
        .split("\r\n")
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
