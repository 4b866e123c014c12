use crate::fs::block_device::DiskError;
use core::fmt;

/// Filesystem error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    /// Sector I/O failed underneath us.
    Disk(DiskError),
    /// LBA 0 did not hold a parseable boot sector.
    BadBootSector,
    /// No matching root-directory entry.
    NotFound,
    /// Operation on a handle that was never opened or already closed.
    NotOpen,
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FsError::Disk(e) => write!(f, "Disk error: {}", e),
            FsError::BadBootSector => write!(f, "Invalid boot sector"),
            FsError::NotFound => write!(f, "No such file"),
            FsError::NotOpen => write!(f, "File not open"),
        }
    }
}

impl From<DiskError> for FsError {
    fn from(e: DiskError) -> Self {
        FsError::Disk(e)
    }
}

pub type FsResult<T> = Result<T, FsError>;
