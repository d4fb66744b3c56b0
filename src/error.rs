use std::io::Error as IoError;

use err_derive::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(display = "Not a valid MPQ archive")]
    InvalidFormat,
    #[error(display = "Unsupported MPQ version: {}", version)]
    UnsupportedVersion { version: u16 },
    #[error(display = "Unsupported feature: {}", feature)]
    UnsupportedFeature { feature: &'static str },
    #[error(display = "Compression type unsupported: {:#04x}", kind)]
    UnsupportedCompression { kind: u8 },
    #[error(display = "Corrupted file payload")]
    CorruptPayload,
    #[error(display = "Archive has no listfile")]
    NoListfile,
    #[error(display = "IO Error: {}", cause)]
    IoError { cause: IoError },
}

impl From<IoError> for Error {
    fn from(other: IoError) -> Self {
        Error::IoError { cause: other }
    }
}
