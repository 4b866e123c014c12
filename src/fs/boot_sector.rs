use crate::fs::block_device::SECTOR_SIZE;
use crate::fs::error::{FsError, FsResult};

// Boot signature trailer
const BOOT_SIG_OFFSET: usize = 510;
const BOOT_SIG_LEAD: u8 = 0x55;
const BOOT_SIG_TRAIL: u8 = 0xAA;

/// FAT12 BIOS Parameter Block, decoded from sector 0.
///
/// All multi-byte fields are little-endian at fixed offsets; the layout is
/// what real floppy media carries, so it must not drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootSector {
    pub oem_name: [u8; 8],
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub fat_count: u8,
    pub root_entries: u16,
    pub total_sectors_16: u16,
    pub media_descriptor: u8,
    pub sectors_per_fat: u16,
    pub sectors_per_track: u16,
    pub heads: u16,
    pub hidden_sectors: u32,
    pub total_sectors_32: u32,
    pub drive_number: u8,
    pub ext_boot_signature: u8,
    pub volume_serial: u32,
    pub volume_label: [u8; 11],
    pub filesystem_type: [u8; 8],
}

impl BootSector {
    pub fn parse(buf: &[u8; SECTOR_SIZE]) -> FsResult<Self> {
        if buf[BOOT_SIG_OFFSET] != BOOT_SIG_LEAD || buf[BOOT_SIG_OFFSET + 1] != BOOT_SIG_TRAIL {
            return Err(FsError::BadBootSector);
        }

        let mut oem_name = [0u8; 8];
        oem_name.copy_from_slice(&buf[3..11]);
        let mut volume_label = [0u8; 11];
        volume_label.copy_from_slice(&buf[43..54]);
        let mut filesystem_type = [0u8; 8];
        filesystem_type.copy_from_slice(&buf[54..62]);

        Ok(BootSector {
            oem_name,
            bytes_per_sector: u16::from_le_bytes([buf[11], buf[12]]),
            sectors_per_cluster: buf[13],
            reserved_sectors: u16::from_le_bytes([buf[14], buf[15]]),
            fat_count: buf[16],
            root_entries: u16::from_le_bytes([buf[17], buf[18]]),
            total_sectors_16: u16::from_le_bytes([buf[19], buf[20]]),
            media_descriptor: buf[21],
            sectors_per_fat: u16::from_le_bytes([buf[22], buf[23]]),
            sectors_per_track: u16::from_le_bytes([buf[24], buf[25]]),
            heads: u16::from_le_bytes([buf[26], buf[27]]),
            hidden_sectors: u32::from_le_bytes([buf[28], buf[29], buf[30], buf[31]]),
            total_sectors_32: u32::from_le_bytes([buf[32], buf[33], buf[34], buf[35]]),
            drive_number: buf[36],
            ext_boot_signature: buf[38],
            volume_serial: u32::from_le_bytes([buf[39], buf[40], buf[41], buf[42]]),
            volume_label,
            filesystem_type,
        })
    }

    /// Write the BPB back into a 512-byte sector image. Used when
    /// formatting scratch volumes and for building test images.
    pub fn serialize(&self, buf: &mut [u8; SECTOR_SIZE]) {
        buf[3..11].copy_from_slice(&self.oem_name);
        buf[11..13].copy_from_slice(&self.bytes_per_sector.to_le_bytes());
        buf[13] = self.sectors_per_cluster;
        buf[14..16].copy_from_slice(&self.reserved_sectors.to_le_bytes());
        buf[16] = self.fat_count;
        buf[17..19].copy_from_slice(&self.root_entries.to_le_bytes());
        buf[19..21].copy_from_slice(&self.total_sectors_16.to_le_bytes());
        buf[21] = self.media_descriptor;
        buf[22..24].copy_from_slice(&self.sectors_per_fat.to_le_bytes());
        buf[24..26].copy_from_slice(&self.sectors_per_track.to_le_bytes());
        buf[26..28].copy_from_slice(&self.heads.to_le_bytes());
        buf[28..32].copy_from_slice(&self.hidden_sectors.to_le_bytes());
        buf[32..36].copy_from_slice(&self.total_sectors_32.to_le_bytes());
        buf[36] = self.drive_number;
        buf[38] = self.ext_boot_signature;
        buf[39..43].copy_from_slice(&self.volume_serial.to_le_bytes());
        buf[43..54].copy_from_slice(&self.volume_label);
        buf[54..62].copy_from_slice(&self.filesystem_type);
        buf[BOOT_SIG_OFFSET] = BOOT_SIG_LEAD;
        buf[BOOT_SIG_OFFSET + 1] = BOOT_SIG_TRAIL;
    }

    /// Total sector count, picking the 16- or 32-bit field.
    pub fn total_sectors(&self) -> u32 {
        if self.total_sectors_16 != 0 {
            self.total_sectors_16 as u32
        } else {
            self.total_sectors_32
        }
    }

    pub fn fat_start_lba(&self) -> u32 {
        self.reserved_sectors as u32
    }

    pub fn root_dir_start_lba(&self) -> u32 {
        self.fat_start_lba() + self.fat_count as u32 * self.sectors_per_fat as u32
    }

    /// Sectors occupied by the root directory, rounded up.
    pub fn root_dir_sectors(&self) -> u32 {
        (self.root_entries as u32 * 32 + self.bytes_per_sector as u32 - 1)
            / self.bytes_per_sector as u32
    }

    pub fn data_start_lba(&self) -> u32 {
        self.root_dir_start_lba() + self.root_dir_sectors()
    }

    pub fn bytes_per_cluster(&self) -> u32 {
        self.bytes_per_sector as u32 * self.sectors_per_cluster as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floppy_1440() -> BootSector {
        BootSector {
            oem_name: *b"MSDOS5.0",
            bytes_per_sector: 512,
            sectors_per_cluster: 1,
            reserved_sectors: 1,
            fat_count: 2,
            root_entries: 224,
            total_sectors_16: 2880,
            media_descriptor: 0xF0,
            sectors_per_fat: 9,
            sectors_per_track: 18,
            heads: 2,
            hidden_sectors: 0,
            total_sectors_32: 0,
            drive_number: 0,
            ext_boot_signature: 0x29,
            volume_serial: 0x1234_5678,
            volume_label: *b"NO NAME    ",
            filesystem_type: *b"FAT12   ",
        }
    }

    #[test]
    fn serialize_parse_round_trip() {
        let bs = floppy_1440();
        let mut buf = [0u8; SECTOR_SIZE];
        bs.serialize(&mut buf);
        let parsed = BootSector::parse(&buf).expect("parse failed");
        assert_eq!(parsed, bs);
    }

    #[test]
    fn layout_derivation() {
        let bs = floppy_1440();
        assert_eq!(bs.fat_start_lba(), 1);
        assert_eq!(bs.root_dir_start_lba(), 1 + 2 * 9);
        assert_eq!(bs.root_dir_sectors(), 14); // 224 entries * 32 bytes
        assert_eq!(bs.data_start_lba(), 19 + 14);
        assert_eq!(bs.total_sectors(), 2880);
        assert_eq!(bs.bytes_per_cluster(), 512);
    }

    #[test]
    fn missing_trailer_rejected() {
        let bs = floppy_1440();
        let mut buf = [0u8; SECTOR_SIZE];
        bs.serialize(&mut buf);
        buf[511] = 0;
        assert_eq!(BootSector::parse(&buf), Err(FsError::BadBootSector));
    }

    #[test]
    fn total_sectors_32bit_fallback() {
        let mut bs = floppy_1440();
        bs.total_sectors_16 = 0;
        bs.total_sectors_32 = 65_536;
        assert_eq!(bs.total_sectors(), 65_536);
    }
}
