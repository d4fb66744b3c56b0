//! The two metadata tables and the sector offset array.
//!
//! Both tables are stored encrypted under keys derived from fixed strings.
//! Decrypted records read back big-endian: the decryptor emits big-endian
//! words and every existing fixture assumes the resulting byte order, so the
//! parsers here must not "fix" it.

use std::io::Read;

use byteorder::{ByteOrder, ReadBytesExt, BE, LE};

use super::consts::*;
use super::crypto::*;
use super::error::Error;
use super::seeker::Seeker;

#[derive(Debug)]
pub struct FileHashTable {
    entries: Vec<HashEntry>,
}

impl FileHashTable {
    pub(crate) fn from_seeker(seeker: &Seeker) -> Result<FileHashTable, Error> {
        let header = seeker.header();
        let entry_count = u64::from(header.hash_table_entries);
        let raw = seeker.read(
            u64::from(header.hash_table_offset),
            entry_count * HASH_TABLE_ENTRY_SIZE,
        )?;

        let mut decoded = raw.to_vec();
        decrypt_block(&mut decoded, HASH_TABLE_KEY);

        let mut entries = Vec::with_capacity(entry_count as usize);
        let mut slice = &decoded[..];
        for _ in 0..entry_count {
            entries.push(HashEntry::from_reader(&mut slice)?);
        }

        Ok(FileHashTable { entries })
    }

    /// Resolves a filename to its hash entry: the first entry whose pair of
    /// name fingerprints matches.
    pub fn find_entry(&self, name: &str) -> Option<&HashEntry> {
        let part_a = hash_string(name.as_bytes(), MPQ_HASH_NAME_A);
        let part_b = hash_string(name.as_bytes(), MPQ_HASH_NAME_B);

        self.entries
            .iter()
            .find(|entry| entry.hash_a == part_a && entry.hash_b == part_b)
    }

    pub fn entries(&self) -> &[HashEntry] {
        &self.entries
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HashEntry {
    pub hash_a: u32,
    pub hash_b: u32,
    pub locale: u16,
    pub platform: u16,
    pub block_index: u32,
}

impl HashEntry {
    fn from_reader<R: Read>(mut reader: R) -> Result<HashEntry, Error> {
        let hash_a = reader.read_u32::<BE>()?;
        let hash_b = reader.read_u32::<BE>()?;
        let locale = reader.read_u16::<BE>()?;
        let platform = reader.read_u16::<BE>()?;
        let block_index = reader.read_u32::<BE>()?;

        Ok(HashEntry {
            hash_a,
            hash_b,
            locale,
            platform,
            block_index,
        })
    }
}

#[derive(Debug)]
pub struct FileBlockTable {
    entries: Vec<BlockEntry>,
}

impl FileBlockTable {
    pub(crate) fn from_seeker(seeker: &Seeker) -> Result<FileBlockTable, Error> {
        let header = seeker.header();
        let entry_count = u64::from(header.block_table_entries);
        let raw = seeker.read(
            u64::from(header.block_table_offset),
            entry_count * BLOCK_TABLE_ENTRY_SIZE,
        )?;

        let mut decoded = raw.to_vec();
        decrypt_block(&mut decoded, BLOCK_TABLE_KEY);

        let mut entries = Vec::with_capacity(entry_count as usize);
        let mut slice = &decoded[..];
        for _ in 0..entry_count {
            entries.push(BlockEntry::from_reader(&mut slice)?);
        }

        Ok(FileBlockTable { entries })
    }

    pub fn get(&self, index: usize) -> Option<&BlockEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[BlockEntry] {
        &self.entries
    }
}

/// One file's metadata record. Numeric fields are widened from the on-disk
/// u32s so offset arithmetic never wraps.
#[derive(Debug, Clone, Copy)]
pub struct BlockEntry {
    /// Payload position, relative to the archive header.
    pub offset: u64,
    /// Bytes occupied inside the archive.
    pub archived_size: u64,
    /// Logical size after reassembly.
    pub size: u64,
    pub flags: u32,
}

impl BlockEntry {
    fn from_reader<R: Read>(mut reader: R) -> Result<BlockEntry, Error> {
        let offset = u64::from(reader.read_u32::<BE>()?);
        let archived_size = u64::from(reader.read_u32::<BE>()?);
        let size = u64::from(reader.read_u32::<BE>()?);
        let flags = reader.read_u32::<BE>()?;

        Ok(BlockEntry {
            offset,
            archived_size,
            size,
            flags,
        })
    }

    pub fn exists(&self) -> bool {
        (self.flags & MPQ_FILE_EXISTS) != 0
    }

    pub fn is_imploded(&self) -> bool {
        (self.flags & MPQ_FILE_IMPLODE) != 0
    }

    pub fn is_compressed(&self) -> bool {
        (self.flags & MPQ_FILE_COMPRESS) != 0
    }

    pub fn is_encrypted(&self) -> bool {
        (self.flags & MPQ_FILE_ENCRYPTED) != 0
    }

    pub fn is_single_unit(&self) -> bool {
        (self.flags & MPQ_FILE_SINGLE_UNIT) != 0
    }

    pub fn has_sector_crc(&self) -> bool {
        (self.flags & MPQ_FILE_SECTOR_CRC) != 0
    }
}

/// The little-endian offset array leading a multi-sector payload.
/// `offsets[i]` delimits sector `i`; the final entry marks the payload end.
#[derive(Debug)]
pub(crate) struct SectorOffsets {
    offsets: Vec<u32>,
}

impl SectorOffsets {
    /// Reads `sector_count + 1` offsets from the front of `payload`,
    /// rejecting any that run backwards or past the payload end.
    pub(crate) fn from_payload(payload: &[u8], sector_count: u64) -> Result<SectorOffsets, Error> {
        let table_len = (sector_count + 1) * 4;
        if table_len > payload.len() as u64 {
            return Err(Error::CorruptPayload);
        }

        let mut offsets = Vec::with_capacity(sector_count as usize + 1);
        let mut previous = 0u32;
        for i in 0..=sector_count {
            let offset = LE::read_u32(&payload[(i * 4) as usize..(i * 4 + 4) as usize]);

            if offset < previous || u64::from(offset) > payload.len() as u64 {
                return Err(Error::CorruptPayload);
            }

            offsets.push(offset);
            previous = offset;
        }

        Ok(SectorOffsets { offsets })
    }

    /// Start and length of sector `index`.
    pub(crate) fn one(&self, index: usize) -> Option<(u32, u32)> {
        if index >= self.offsets.len() - 1 {
            None
        } else {
            Some((
                self.offsets[index],
                self.offsets[index + 1] - self.offsets[index],
            ))
        }
    }

    pub(crate) fn count(&self) -> usize {
        self.offsets.len() - 1
    }
}
