use crate::drivers::ata::pio::AtaError;
use core::fmt;

pub const SECTOR_SIZE: usize = 512;

/// Device-neutral error for sector I/O. The ATA driver maps its own error
/// type into this; a RAM-backed disk only ever reports `OutOfRange`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskError {
    NotReady,
    Timeout,
    Fault,
    Io,
    OutOfRange,
}

impl fmt::Display for DiskError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DiskError::NotReady   => write!(f, "Device not ready"),
            DiskError::Timeout    => write!(f, "Operation timed out"),
            DiskError::Fault      => write!(f, "Device fault"),
            DiskError::Io         => write!(f, "I/O error"),
            DiskError::OutOfRange => write!(f, "Sector out of range"),
        }
    }
}

impl From<AtaError> for DiskError {
    fn from(e: AtaError) -> Self {
        match e {
            AtaError::DeviceNotFound => DiskError::NotReady,
            AtaError::BusyTimeout | AtaError::DrqTimeout => DiskError::Timeout,
            AtaError::DeviceFault => DiskError::Fault,
            AtaError::IoError => DiskError::Io,
        }
    }
}

pub type DiskResult<T> = Result<T, DiskError>;

/// Sector-addressed device interface used by the FAT modules. Everything
/// is keyed by a 32-bit LBA and fixed 512-byte buffers.
pub trait BlockDevice {
    /// Read exactly one sector at `lba` into `buf`.
    fn read_sector(&mut self, lba: u32, buf: &mut [u8; SECTOR_SIZE]) -> DiskResult<()>;
    /// Write exactly one sector at `lba` from `data`.
    fn write_sector(&mut self, lba: u32, data: &[u8; SECTOR_SIZE]) -> DiskResult<()>;
    /// Number of 512-byte sectors on this device.
    fn sector_count(&self) -> u32;

    /// Sequential per-sector read; aborts on the first failing sector.
    fn read_sectors(&mut self, lba: u32, count: u32, buf: &mut [u8]) -> DiskResult<()> {
        let chunks = buf.chunks_exact_mut(SECTOR_SIZE).take(count as usize);
        for (i, chunk) in chunks.enumerate() {
            let sector: &mut [u8; SECTOR_SIZE] =
                chunk.try_into().map_err(|_| DiskError::OutOfRange)?;
            self.read_sector(lba + i as u32, sector)?;
        }
        Ok(())
    }

    /// Sequential per-sector write; aborts on the first failing sector.
    fn write_sectors(&mut self, lba: u32, count: u32, buf: &[u8]) -> DiskResult<()> {
        let chunks = buf.chunks_exact(SECTOR_SIZE).take(count as usize);
        for (i, chunk) in chunks.enumerate() {
            let sector: &[u8; SECTOR_SIZE] =
                chunk.try_into().map_err(|_| DiskError::OutOfRange)?;
            self.write_sector(lba + i as u32, sector)?;
        }
        Ok(())
    }
}
