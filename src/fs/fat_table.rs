use crate::fs::block_device::{BlockDevice, DiskResult, SECTOR_SIZE};
use bit_field::BitField;

/// End-of-chain sentinel. Decoded entries at or above this value, and any
/// cluster the table cannot answer for, report as end of file.
pub const FAT12_CLUSTER_EOF: u32 = 0xFF8;
pub const FAT12_CLUSTER_FREE: u32 = 0x000;

/// Upper bound on the in-memory FAT copy. Nine sectors cover a 1.44MB
/// floppy's full table; larger tables are truncated at load, never
/// overflowed.
pub const FAT_MAX_SECTORS: usize = 9;
const FAT_BUFFER_SIZE: usize = FAT_MAX_SECTORS * SECTOR_SIZE;

/// First FAT copy, loaded whole at mount time and immutable afterwards.
/// Each 12-bit entry packs two entries per three bytes; entry `n` starts
/// at bit offset `12 * n`.
pub struct FatTable {
    buf: [u8; FAT_BUFFER_SIZE],
    len: usize,
}

impl FatTable {
    /// Read `sectors_per_fat` sectors of FAT copy 0 from `start_lba`,
    /// capped at the buffer bound.
    pub fn load<D: BlockDevice>(
        device: &mut D,
        start_lba: u32,
        sectors_per_fat: u16,
    ) -> DiskResult<Self> {
        let mut table = FatTable {
            buf: [0u8; FAT_BUFFER_SIZE],
            len: 0,
        };
        let sectors = (sectors_per_fat as usize).min(FAT_MAX_SECTORS);
        for i in 0..sectors {
            let mut sector = [0u8; SECTOR_SIZE];
            device.read_sector(start_lba + i as u32, &mut sector)?;
            table.buf[i * SECTOR_SIZE..(i + 1) * SECTOR_SIZE].copy_from_slice(&sector);
        }
        table.len = sectors * SECTOR_SIZE;
        Ok(table)
    }

    /// Build a table from raw FAT bytes (test images, preloaded buffers).
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut table = FatTable {
            buf: [0u8; FAT_BUFFER_SIZE],
            len: 0,
        };
        let len = bytes.len().min(FAT_BUFFER_SIZE);
        table.buf[..len].copy_from_slice(&bytes[..len]);
        table.len = len;
        table
    }

    /// Next cluster in the chain after `cluster`.
    ///
    /// The 12-bit entry lives at byte offset `cluster + cluster/2`; an even
    /// cluster takes the low 12 bits of the little-endian word there, an odd
    /// cluster the high 12. Reserved clusters (< 2) and offsets past the
    /// loaded table answer end-of-chain.
    pub fn next_cluster(&self, cluster: u32) -> u32 {
        if cluster < 2 {
            return FAT12_CLUSTER_EOF;
        }
        let offset = (cluster + cluster / 2) as usize;
        if offset + 1 >= self.len {
            return FAT12_CLUSTER_EOF;
        }
        let word = u16::from_le_bytes([self.buf[offset], self.buf[offset + 1]]);
        let entry = if cluster & 1 == 1 {
            word.get_bits(4..16)
        } else {
            word.get_bits(0..12)
        } as u32;
        if entry >= FAT12_CLUSTER_EOF {
            FAT12_CLUSTER_EOF
        } else {
            entry
        }
    }
}
