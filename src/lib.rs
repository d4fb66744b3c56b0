//! A library for reading Blizzard's proprietary MoPaQ archive format, as
//! found in StarCraft II replay files.
//!
//! A replay is a MoPaQ archive with a user data prefix ahead of the real
//! header; the archive bundles the replay event streams as compressed,
//! sector-split files. This crate parses the container, decrypts the
//! metadata tables, and reassembles file payloads into plain byte buffers.
//! The whole archive is held in memory for its lifetime.
//!
//! # Supported features
//!
//! Format versions 0 and 1 are read, including the version 1 extended
//! header. Not the whole range of MPQ features is supported:
//!
//! * Encrypted file payloads are recognized and refused.
//! * PKWare DCL compression (implode) is refused.
//! * Only the DEFLATE and bzip2 sector codecs are decoded; replay archives
//!   use nothing else.
//! * Sector checksums are not verified.
//! * Archives are read-only; there is no support for writing.
//!
//! # Example
//!
//! ```no_run
//! # use std::error::Error;
//! use replay_mpq::Archive;
//!
//! # fn main() -> Result<(), Box<dyn Error>> {
//! let archive = Archive::open("replay.SC2Replay", true)?;
//!
//! for name in archive.files().unwrap_or(&[]) {
//!     println!("{}", name);
//! }
//!
//! let details = archive.read_file("replay.details")?;
//! # Ok(())
//! # }
//! ```

pub(crate) mod compression;
pub(crate) mod seeker;

pub mod archive;
pub mod consts;
pub mod crypto;
pub mod error;
pub mod header;
pub mod table;

pub use archive::Archive;
pub use error::Error;
pub use header::{Header, UserDataHeader};
pub use table::{BlockEntry, FileBlockTable, FileHashTable, HashEntry};
