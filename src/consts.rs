//! Fixed constants of the MoPaQ container format.

/// `"MPQ\x1a"` interpreted as a little-endian u32. Marks the archive header.
pub const HEADER_MPQ_MAGIC: u32 = 0x1A51_504D;
/// `"MPQ\x1b"` interpreted as a little-endian u32. Marks a user data prefix.
pub const HEADER_USER_MAGIC: u32 = 0x1B51_504D;

/// Size of the fixed archive header, format version 0.
pub const HEADER_SIZE_V0: u32 = 32;
/// Size of the archive header including the version 1 extension.
pub const HEADER_SIZE_V1: u32 = 44;
/// Size of the user data header, excluding its opaque content.
pub const USER_HEADER_SIZE: u32 = 16;

pub const HASH_TABLE_ENTRY_SIZE: u64 = 16;
pub const BLOCK_TABLE_ENTRY_SIZE: u64 = 16;

/// Hash roles. Each role selects a distinct 256-entry window of the
/// encryption table, producing domain-separated fingerprints.
pub const MPQ_HASH_TABLE_INDEX: u32 = 0x000;
pub const MPQ_HASH_NAME_A: u32 = 0x100;
pub const MPQ_HASH_NAME_B: u32 = 0x200;
pub const MPQ_HASH_TABLE_KEY: u32 = 0x300;
pub const MPQ_HASH_KEY2_MIX: u32 = 0x400;

/// `hash_string(b"(hash table)", MPQ_HASH_TABLE_KEY)`
pub const HASH_TABLE_KEY: u32 = 0xC3AF_3770;
/// `hash_string(b"(block table)", MPQ_HASH_TABLE_KEY)`
pub const BLOCK_TABLE_KEY: u32 = 0xEC83_B3A3;

pub const MPQ_FILE_IMPLODE: u32 = 0x0000_0100;
pub const MPQ_FILE_COMPRESS: u32 = 0x0000_0200;
pub const MPQ_FILE_ENCRYPTED: u32 = 0x0001_0000;
pub const MPQ_FILE_ADJUST_KEY: u32 = 0x0002_0000;
pub const MPQ_FILE_SINGLE_UNIT: u32 = 0x0100_0000;
pub const MPQ_FILE_DELETE_MARKER: u32 = 0x0200_0000;
pub const MPQ_FILE_SECTOR_CRC: u32 = 0x0400_0000;
pub const MPQ_FILE_EXISTS: u32 = 0x8000_0000;

/// Codec byte prefixing a compressed sector or single-unit payload.
pub const COMPRESSION_STORED: u8 = 0x00;
pub const COMPRESSION_ZLIB: u8 = 0x02;
pub const COMPRESSION_BZIP2: u8 = 0x10;

/// Name of the conventional in-archive file enumeration.
pub const LISTFILE_NAME: &str = "(listfile)";
