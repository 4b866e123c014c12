use alloc::format;
use alloc::string::String;
use bitflags::bitflags;

pub const DIR_ENTRY_SIZE: usize = 32;

/// First name byte of the terminating entry: nothing follows it.
pub const ENTRY_END: u8 = 0x00;
/// First name byte of a deleted entry: skip it, keep scanning.
pub const ENTRY_DELETED: u8 = 0xE5;

bitflags! {
    /// Directory entry attribute bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FileAttributes: u8 {
        const READ_ONLY    = 0x01;
        const HIDDEN       = 0x02;
        const SYSTEM       = 0x04;
        const VOLUME_LABEL = 0x08;
        const DIRECTORY    = 0x10;
        const ARCHIVE      = 0x20;
    }
}

/// Raw 32-byte FAT directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry {
    pub name: [u8; 8],
    pub ext: [u8; 3],
    pub attributes: FileAttributes,
    pub creation_time_fine: u8,
    pub creation_time: u16,
    pub creation_date: u16,
    pub last_access_date: u16,
    pub first_cluster_high: u16,
    pub last_write_time: u16,
    pub last_write_date: u16,
    pub first_cluster_low: u16,
    pub file_size: u32,
}

impl DirEntry {
    /// Decode one entry from 32 raw bytes at fixed little-endian offsets.
    pub fn parse(raw: &[u8]) -> Self {
        let mut name = [0u8; 8];
        name.copy_from_slice(&raw[0..8]);
        let mut ext = [0u8; 3];
        ext.copy_from_slice(&raw[8..11]);
        DirEntry {
            name,
            ext,
            attributes: FileAttributes::from_bits_truncate(raw[11]),
            creation_time_fine: raw[13],
            creation_time: u16::from_le_bytes([raw[14], raw[15]]),
            creation_date: u16::from_le_bytes([raw[16], raw[17]]),
            last_access_date: u16::from_le_bytes([raw[18], raw[19]]),
            first_cluster_high: u16::from_le_bytes([raw[20], raw[21]]),
            last_write_time: u16::from_le_bytes([raw[22], raw[23]]),
            last_write_date: u16::from_le_bytes([raw[24], raw[25]]),
            first_cluster_low: u16::from_le_bytes([raw[26], raw[27]]),
            file_size: u32::from_le_bytes([raw[28], raw[29], raw[30], raw[31]]),
        }
    }

    pub fn serialize(&self) -> [u8; DIR_ENTRY_SIZE] {
        let mut buf = [0u8; DIR_ENTRY_SIZE];
        buf[0..8].copy_from_slice(&self.name);
        buf[8..11].copy_from_slice(&self.ext);
        buf[11] = self.attributes.bits();
        buf[13] = self.creation_time_fine;
        buf[14..16].copy_from_slice(&self.creation_time.to_le_bytes());
        buf[16..18].copy_from_slice(&self.creation_date.to_le_bytes());
        buf[18..20].copy_from_slice(&self.last_access_date.to_le_bytes());
        buf[20..22].copy_from_slice(&self.first_cluster_high.to_le_bytes());
        buf[22..24].copy_from_slice(&self.last_write_time.to_le_bytes());
        buf[24..26].copy_from_slice(&self.last_write_date.to_le_bytes());
        buf[26..28].copy_from_slice(&self.first_cluster_low.to_le_bytes());
        buf[28..32].copy_from_slice(&self.file_size.to_le_bytes());
        buf
    }

    pub fn is_end(&self) -> bool {
        self.name[0] == ENTRY_END
    }

    pub fn is_deleted(&self) -> bool {
        self.name[0] == ENTRY_DELETED
    }

    pub fn is_dir(&self) -> bool {
        self.attributes.contains(FileAttributes::DIRECTORY)
    }

    pub fn is_volume_label(&self) -> bool {
        self.attributes.contains(FileAttributes::VOLUME_LABEL)
    }

    /// Starting cluster. Only the low 16 bits exist on FAT12; the high
    /// field is meaningful on FAT32 alone.
    pub fn first_cluster(&self) -> u32 {
        self.first_cluster_low as u32
    }

    /// The canonical 11-byte name, as stored on disk.
    pub fn raw_name(&self) -> [u8; 11] {
        let mut out = [0u8; 11];
        out[0..8].copy_from_slice(&self.name);
        out[8..11].copy_from_slice(&self.ext);
        out
    }

    /// Human-readable name: trailing pad spaces trimmed, extension joined
    /// with a dot when non-blank.
    pub fn display_name(&self) -> String {
        let base = core::str::from_utf8(&self.name)
            .unwrap_or("")
            .trim_end_matches(' ');
        let ext = core::str::from_utf8(&self.ext)
            .unwrap_or("")
            .trim_end_matches(' ');
        if ext.is_empty() {
            String::from(base)
        } else {
            format!("{}.{}", base, ext)
        }
    }
}

/// Canonicalize a filename into the on-disk 8.3 form: uppercase,
/// space-padded, split at the first '.'.
pub fn to_fat_name(name: &str) -> [u8; 11] {
    let mut out = [b' '; 11];
    let mut parts = name.splitn(2, '.');
    let base = parts.next().unwrap_or("");
    let ext = parts.next().unwrap_or("");
    for (i, b) in base.bytes().take(8).enumerate() {
        out[i] = b.to_ascii_uppercase();
    }
    for (i, b) in ext.bytes().take(3).enumerate() {
        out[8 + i] = b.to_ascii_uppercase();
    }
    out
}
