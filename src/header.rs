use std::io::Read;

use byteorder::{ReadBytesExt, LE};

use super::error::Error;

/// The parsed archive header.
///
/// `offset` is the absolute position of the header within the backing
/// buffer: zero for a bare archive, or wherever the user data prefix points
/// for replay files. Table offsets inside the header are relative to it.
///
/// For format version 0 the extended fields are zero.
#[derive(Debug, Clone)]
pub struct Header {
    pub offset: u64,
    pub header_size: u32,
    pub archive_size: u32,
    pub format_version: u16,
    pub sector_size_shift: u16,
    pub hash_table_offset: u32,
    pub block_table_offset: u32,
    pub hash_table_entries: u32,
    pub block_table_entries: u32,
    pub extended_block_table_offset: i64,
    pub hash_table_offset_high: i16,
    pub block_table_offset_high: i16,
    pub user_data: Option<UserDataHeader>,
}

impl Header {
    /// Reads the fixed header and, for format version 1, the extended tail.
    /// The reader must be positioned just past the header magic.
    pub(crate) fn from_reader<R: Read>(
        mut reader: R,
        offset: u64,
        user_data: Option<UserDataHeader>,
    ) -> Result<Header, Error> {
        let header_size = reader.read_u32::<LE>()?;
        let archive_size = reader.read_u32::<LE>()?;
        let format_version = reader.read_u16::<LE>()?;
        let sector_size_shift = reader.read_u16::<LE>()?;
        let hash_table_offset = reader.read_u32::<LE>()?;
        let block_table_offset = reader.read_u32::<LE>()?;
        let hash_table_entries = reader.read_u32::<LE>()?;
        let block_table_entries = reader.read_u32::<LE>()?;

        if format_version > 1 {
            return Err(Error::UnsupportedVersion {
                version: format_version,
            });
        }

        // 512 << 23 already exceeds any real archive; larger shifts only
        // appear in corrupted or hostile headers.
        if sector_size_shift > 23 {
            return Err(Error::InvalidFormat);
        }

        let (extended_block_table_offset, hash_table_offset_high, block_table_offset_high) =
            if format_version == 1 {
                (
                    reader.read_i64::<LE>()?,
                    reader.read_i16::<LE>()?,
                    reader.read_i16::<LE>()?,
                )
            } else {
                (0, 0, 0)
            };

        Ok(Header {
            offset,
            header_size,
            archive_size,
            format_version,
            sector_size_shift,
            hash_table_offset,
            block_table_offset,
            hash_table_entries,
            block_table_entries,
            extended_block_table_offset,
            hash_table_offset_high,
            block_table_offset_high,
            user_data,
        })
    }

    /// Size in bytes of one sector of a multi-sector file.
    pub fn sector_size(&self) -> u64 {
        512 * 2u64.pow(u32::from(self.sector_size_shift))
    }
}

/// The user data prefix found ahead of the archive header in replay files.
/// Its `content` is opaque to the container; SC2 tooling parses the replay
/// summary out of it.
#[derive(Debug, Clone)]
pub struct UserDataHeader {
    pub user_data_size: u32,
    pub mpq_header_offset: u32,
    pub user_data_header_size: u32,
    pub content: Vec<u8>,
}

impl UserDataHeader {
    /// Reads the user data header. The reader must be positioned just past
    /// the user data magic.
    pub(crate) fn from_reader<R: Read>(mut reader: R) -> Result<UserDataHeader, Error> {
        let user_data_size = reader.read_u32::<LE>()?;
        let mpq_header_offset = reader.read_u32::<LE>()?;
        let user_data_header_size = reader.read_u32::<LE>()?;

        if user_data_header_size > user_data_size {
            return Err(Error::InvalidFormat);
        }

        let mut content = vec![0u8; user_data_header_size as usize];
        reader.read_exact(&mut content)?;

        Ok(UserDataHeader {
            user_data_size,
            mpq_header_offset,
            user_data_header_size,
            content,
        })
    }
}
