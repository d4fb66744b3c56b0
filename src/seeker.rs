use std::io::Cursor;

use byteorder::{ReadBytesExt, LE};

use super::consts::*;
use super::error::Error;
use super::header::*;

/// Owns the backing buffer and resolves header-relative offsets into it.
///
/// The buffer is never mutated after construction, so reads hand out
/// borrowed slices and the archive stays shareable between readers.
#[derive(Debug)]
pub(crate) struct Seeker {
    data: Vec<u8>,
    header: Header,
}

impl Seeker {
    pub(crate) fn new(data: Vec<u8>) -> Result<Seeker, Error> {
        let header = find_header(&data)?;

        Ok(Seeker { data, header })
    }

    pub(crate) fn header(&self) -> &Header {
        &self.header
    }

    pub(crate) fn sector_size(&self) -> u64 {
        self.header.sector_size()
    }

    /// Slices `size` bytes starting at `offset` past the archive header.
    /// A slice that overflows the backing buffer means the header or a
    /// table entry lied about its geometry.
    pub(crate) fn read(&self, offset: u64, size: u64) -> Result<&[u8], Error> {
        let start = offset
            .checked_add(self.header.offset)
            .ok_or(Error::InvalidFormat)?;
        let end = start.checked_add(size).ok_or(Error::InvalidFormat)?;

        if end > self.data.len() as u64 {
            return Err(Error::InvalidFormat);
        }

        Ok(&self.data[start as usize..end as usize])
    }
}

/// Classifies the buffer by its leading magic and parses the archive header,
/// following the user data prefix to it when one is present.
fn find_header(data: &[u8]) -> Result<Header, Error> {
    let mut reader = Cursor::new(data);
    let magic = reader.read_u32::<LE>()?;

    if magic == HEADER_MPQ_MAGIC {
        return Header::from_reader(&mut reader, 0, None);
    }

    if magic != HEADER_USER_MAGIC {
        return Err(Error::InvalidFormat);
    }

    let user_data = UserDataHeader::from_reader(&mut reader)?;
    let header_offset = u64::from(user_data.mpq_header_offset);

    if header_offset + 4 > data.len() as u64 {
        return Err(Error::InvalidFormat);
    }

    reader.set_position(header_offset);
    let magic = reader.read_u32::<LE>()?;

    if magic != HEADER_MPQ_MAGIC {
        return Err(Error::InvalidFormat);
    }

    Header::from_reader(&mut reader, header_offset, Some(user_data))
}
