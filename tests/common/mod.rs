//! A minimal in-memory archive writer used to build test fixtures.
//!
//! The library itself is read-only, so the tests carry their own writer:
//! it lays files out back-to-back after the header, builds the encrypted
//! hash and block tables, and finishes with the fixed header, optionally
//! behind a user data prefix the way replay files are laid out.

use std::io::Write;

use byteorder::{ByteOrder, WriteBytesExt, BE, LE};

use replay_mpq::consts::*;
use replay_mpq::crypto::{encrypt_block, hash_string};

pub const SECTOR_SHIFT: u16 = 3;
pub const SECTOR_SIZE: usize = 512 << SECTOR_SHIFT;

/// How a fixture file's payload is laid out on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Sector-split, each sector deflated when that shrinks it.
    Sectored,
    /// As `Sectored`, plus a trailing checksum sector and the CRC flag.
    SectoredCrc,
    /// Single unit, deflated.
    SingleUnitDeflate,
    /// Single unit, bzip2-compressed.
    SingleUnitBzip2,
    /// Single unit, stored verbatim without the compression flag.
    SingleUnitStored,
    /// Single unit flagged compressed whose payload is the stored-codec
    /// marker byte followed by the contents.
    StoredMarker,
    /// Flagged encrypted; payload is garbage since readers must refuse it.
    Encrypted,
    /// Flagged as PKWare-imploded.
    Imploded,
    /// Single unit flagged compressed, carrying an unknown codec byte and a
    /// logical size larger than the stored size.
    BadCodec,
    /// Block entry with nothing stored behind it.
    Empty,
    /// Exists flag clear; a tombstone.
    Deleted,
}

pub struct FixtureFile {
    pub name: String,
    pub contents: Vec<u8>,
    pub layout: Layout,
}

pub struct FixtureBuilder {
    files: Vec<FixtureFile>,
    header_offset: usize,
    format_version: u16,
    hash_entries: usize,
    user_content: Vec<u8>,
    with_listfile: bool,
}

impl FixtureBuilder {
    /// A version 1 archive behind a 1024-byte user data prefix, the shape
    /// SC2 replays use.
    pub fn replay() -> FixtureBuilder {
        FixtureBuilder {
            files: Vec::new(),
            header_offset: 1024,
            format_version: 1,
            hash_entries: 16,
            user_content: b"fixture user data".to_vec(),
            with_listfile: true,
        }
    }

    /// A bare version 0 archive with the header at offset zero.
    pub fn bare() -> FixtureBuilder {
        FixtureBuilder {
            files: Vec::new(),
            header_offset: 0,
            format_version: 0,
            hash_entries: 16,
            user_content: Vec::new(),
            with_listfile: true,
        }
    }

    pub fn without_listfile(mut self) -> FixtureBuilder {
        self.with_listfile = false;
        self
    }

    pub fn add(mut self, name: &str, contents: &[u8], layout: Layout) -> FixtureBuilder {
        self.files.push(FixtureFile {
            name: name.to_string(),
            contents: contents.to_vec(),
            layout,
        });
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        if self.with_listfile {
            let mut listfile = Vec::new();
            for file in &self.files {
                listfile.extend_from_slice(file.name.as_bytes());
                listfile.extend_from_slice(b"\r\n");
            }
            self.files.push(FixtureFile {
                name: LISTFILE_NAME.to_string(),
                contents: listfile,
                layout: Layout::Sectored,
            });
        }

        let mut blob = Vec::new();

        if self.header_offset > 0 {
            blob.extend_from_slice(b"MPQ\x1b");
            blob.write_u32::<LE>(self.header_offset as u32).unwrap();
            blob.write_u32::<LE>(self.header_offset as u32).unwrap();
            blob.write_u32::<LE>(self.user_content.len() as u32).unwrap();
            blob.extend_from_slice(&self.user_content);
            blob.resize(self.header_offset, 0);
        }

        let header_size = if self.format_version == 1 { 44usize } else { 32 };
        let header_pos = blob.len();
        blob.resize(header_pos + header_size, 0);

        // payloads, back-to-back
        let mut blocks = Vec::new();
        let mut hash_rows: Vec<Option<(u32, u32, u32)>> = vec![None; self.hash_entries];
        for (block_index, file) in self.files.iter().enumerate() {
            let offset = (blob.len() - header_pos) as u32;
            let (payload, flags, size) = encode_payload(file);
            blob.extend_from_slice(&payload);
            blocks.push((offset, payload.len() as u32, size, flags));

            // conventional open-addressed placement; the reader's linear
            // scan does not depend on it, but real archives look like this
            let mask = self.hash_entries - 1;
            let mut slot = hash_string(file.name.as_bytes(), MPQ_HASH_TABLE_INDEX) as usize & mask;
            while hash_rows[slot].is_some() {
                slot = (slot + 1) & mask;
            }
            hash_rows[slot] = Some((
                hash_string(file.name.as_bytes(), MPQ_HASH_NAME_A),
                hash_string(file.name.as_bytes(), MPQ_HASH_NAME_B),
                block_index as u32,
            ));
        }

        // hash table: big-endian records, encrypted
        let hash_table_offset = (blob.len() - header_pos) as u32;
        let mut hash_table = Vec::with_capacity(self.hash_entries * 16);
        for row in &hash_rows {
            match row {
                Some((hash_a, hash_b, block_index)) => {
                    hash_table.write_u32::<BE>(*hash_a).unwrap();
                    hash_table.write_u32::<BE>(*hash_b).unwrap();
                    hash_table.write_u16::<BE>(0).unwrap();
                    hash_table.write_u16::<BE>(0).unwrap();
                    hash_table.write_u32::<BE>(*block_index).unwrap();
                }
                None => {
                    hash_table.write_u32::<BE>(0xFFFF_FFFF).unwrap();
                    hash_table.write_u32::<BE>(0xFFFF_FFFF).unwrap();
                    hash_table.write_u16::<BE>(0xFFFF).unwrap();
                    hash_table.write_u16::<BE>(0x00FF).unwrap();
                    hash_table.write_u32::<BE>(0xFFFF_FFFF).unwrap();
                }
            }
        }
        encrypt_block(&mut hash_table, HASH_TABLE_KEY);
        blob.extend_from_slice(&hash_table);

        // block table, likewise
        let block_table_offset = (blob.len() - header_pos) as u32;
        let mut block_table = Vec::with_capacity(blocks.len() * 16);
        for (offset, archived_size, size, flags) in &blocks {
            block_table.write_u32::<BE>(*offset).unwrap();
            block_table.write_u32::<BE>(*archived_size).unwrap();
            block_table.write_u32::<BE>(*size).unwrap();
            block_table.write_u32::<BE>(*flags).unwrap();
        }
        encrypt_block(&mut block_table, BLOCK_TABLE_KEY);
        blob.extend_from_slice(&block_table);

        // now the header is fully determined
        let archive_size = (blob.len() - header_pos) as u32;
        let header = &mut blob[header_pos..header_pos + header_size];
        header[0..4].copy_from_slice(b"MPQ\x1a");
        LE::write_u32(&mut header[4..8], header_size as u32);
        LE::write_u32(&mut header[8..12], archive_size);
        LE::write_u16(&mut header[12..14], self.format_version);
        LE::write_u16(&mut header[14..16], SECTOR_SHIFT);
        LE::write_u32(&mut header[16..20], hash_table_offset);
        LE::write_u32(&mut header[20..24], block_table_offset);
        LE::write_u32(&mut header[24..28], self.hash_entries as u32);
        LE::write_u32(&mut header[28..32], blocks.len() as u32);
        // v1 extended tail stays zero

        blob
    }
}

fn encode_payload(file: &FixtureFile) -> (Vec<u8>, u32, u32) {
    let contents = &file.contents;
    let size = contents.len() as u32;

    match file.layout {
        Layout::Sectored => (
            sectored_payload(contents, false),
            MPQ_FILE_EXISTS | MPQ_FILE_COMPRESS,
            size,
        ),
        Layout::SectoredCrc => (
            sectored_payload(contents, true),
            MPQ_FILE_EXISTS | MPQ_FILE_COMPRESS | MPQ_FILE_SECTOR_CRC,
            size,
        ),
        Layout::SingleUnitDeflate => {
            let payload = deflate(contents, COMPRESSION_ZLIB);
            assert!(
                payload.len() < contents.len(),
                "fixture contents must be compressible"
            );
            (
                payload,
                MPQ_FILE_EXISTS | MPQ_FILE_SINGLE_UNIT | MPQ_FILE_COMPRESS,
                size,
            )
        }
        Layout::SingleUnitBzip2 => {
            let mut encoder =
                bzip2::write::BzEncoder::new(vec![COMPRESSION_BZIP2], bzip2::Compression::default());
            encoder.write_all(contents).unwrap();
            let payload = encoder.finish().unwrap();
            assert!(
                payload.len() < contents.len(),
                "fixture contents must be compressible"
            );
            (
                payload,
                MPQ_FILE_EXISTS | MPQ_FILE_SINGLE_UNIT | MPQ_FILE_COMPRESS,
                size,
            )
        }
        Layout::SingleUnitStored => (
            contents.clone(),
            MPQ_FILE_EXISTS | MPQ_FILE_SINGLE_UNIT,
            size,
        ),
        Layout::StoredMarker => {
            let mut payload = vec![COMPRESSION_STORED];
            payload.extend_from_slice(contents);
            (
                payload,
                MPQ_FILE_EXISTS | MPQ_FILE_SINGLE_UNIT | MPQ_FILE_COMPRESS,
                size,
            )
        }
        Layout::Encrypted => (
            contents.clone(),
            MPQ_FILE_EXISTS | MPQ_FILE_SINGLE_UNIT | MPQ_FILE_ENCRYPTED,
            size,
        ),
        Layout::Imploded => (
            contents.clone(),
            MPQ_FILE_EXISTS | MPQ_FILE_SINGLE_UNIT | MPQ_FILE_IMPLODE,
            size,
        ),
        Layout::BadCodec => {
            let mut payload = vec![0x05u8];
            payload.extend_from_slice(&contents[..contents.len().min(9)]);
            let claimed_size = size.max(payload.len() as u32 + 1);
            (
                payload,
                MPQ_FILE_EXISTS | MPQ_FILE_SINGLE_UNIT | MPQ_FILE_COMPRESS,
                // claim more than is stored so the codec dispatch runs
                claimed_size,
            )
        }
        Layout::Empty => (Vec::new(), MPQ_FILE_EXISTS | MPQ_FILE_SINGLE_UNIT, 0),
        Layout::Deleted => (contents.clone(), MPQ_FILE_SINGLE_UNIT, size),
    }
}

/// Sector-splits `contents`, deflating each sector that shrinks. The layout
/// always carries one sector more than the division suggests, so an
/// exact-multiple file ends with an empty sector, and a checksum payload
/// appends one dummy CRC word per data sector.
fn sectored_payload(contents: &[u8], with_crc: bool) -> Vec<u8> {
    let data_sectors = contents.len() / SECTOR_SIZE + 1;
    let sector_count = data_sectors + if with_crc { 1 } else { 0 };

    let mut chunks = Vec::with_capacity(sector_count);
    for i in 0..data_sectors {
        let chunk = &contents[i * SECTOR_SIZE..((i + 1) * SECTOR_SIZE).min(contents.len())];
        if chunk.is_empty() {
            chunks.push(Vec::new());
            continue;
        }
        let compressed = deflate(chunk, COMPRESSION_ZLIB);
        if compressed.len() < chunk.len() {
            chunks.push(compressed);
        } else {
            chunks.push(chunk.to_vec());
        }
    }
    if with_crc {
        chunks.push(vec![0u8; data_sectors * 4]);
    }

    let mut payload = Vec::new();
    let mut position = ((sector_count + 1) * 4) as u32;
    payload.write_u32::<LE>(position).unwrap();
    for chunk in &chunks {
        position += chunk.len() as u32;
        payload.write_u32::<LE>(position).unwrap();
    }
    for chunk in &chunks {
        payload.extend_from_slice(chunk);
    }

    payload
}

fn deflate(data: &[u8], codec: u8) -> Vec<u8> {
    let mut encoder = flate2::write::ZlibEncoder::new(vec![codec], flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Compressible pseudo-payload for a named stream.
pub fn stream_contents(name: &str, size: usize) -> Vec<u8> {
    let base = format!("{} event stream data with plenty of repetition; ", name);
    base.as_bytes()
        .iter()
        .cycle()
        .take(size)
        .copied()
        .collect()
}
