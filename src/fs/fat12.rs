use crate::fs::block_device::{BlockDevice, SECTOR_SIZE};
use crate::fs::boot_sector::BootSector;
use crate::fs::dir_entry::{to_fat_name, DirEntry, FileAttributes, DIR_ENTRY_SIZE};
use crate::fs::error::{FsError, FsResult};
use crate::fs::fat_table::{FatTable, FAT12_CLUSTER_EOF};
use alloc::vec::Vec;
use spin::Mutex;

// ══════════════════════════════════════════════════════════════
//  File handle
// ══════════════════════════════════════════════════════════════

/// Per-open-file cursor. Handles are plain value copies: opening the same
/// file twice yields two independent positions, and nothing tracks the
/// underlying entry changing between operations.
#[derive(Debug, Clone, Copy)]
pub struct FileHandle {
    name: [u8; 11],
    size: u32,
    current_cluster: u32,
    position: u32,
    is_open: bool,
}

impl FileHandle {
    pub fn name(&self) -> &[u8; 11] {
        &self.name
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }
}

// ══════════════════════════════════════════════════════════════
//  Fat12Fs — mounted volume
// ══════════════════════════════════════════════════════════════

struct Fat12Inner<D: BlockDevice> {
    device: D,
    boot_sector: BootSector,
    fat: FatTable,
}

/// Read-only FAT12 volume. Mounting reads the boot sector and pulls the
/// first FAT copy into memory; after that every operation goes through the
/// root directory scan and the in-memory table.
pub struct Fat12Fs<D: BlockDevice> {
    inner: Mutex<Fat12Inner<D>>,
}

impl<D: BlockDevice> Fat12Fs<D> {
    /// Mount the volume on `device`.
    ///
    /// Runs the full sequence (boot sector read, BPB parse, FAT load)
    /// every call, so mounting the same device twice produces identical
    /// state. Each stage failure is terminal for this attempt; the caller
    /// may simply call `mount` again.
    pub fn mount(mut device: D) -> FsResult<Self> {
        let mut sector = [0u8; SECTOR_SIZE];
        device.read_sector(0, &mut sector)?;
        let boot_sector = BootSector::parse(&sector)?;
        let fat = FatTable::load(&mut device, boot_sector.fat_start_lba(), boot_sector.sectors_per_fat)?;
        Ok(Fat12Fs {
            inner: Mutex::new(Fat12Inner {
                device,
                boot_sector,
                fat,
            }),
        })
    }

    /// Copy of the parsed boot sector, for the volume-info command.
    pub fn boot_sector(&self) -> BootSector {
        self.inner.lock().boot_sector
    }

    /// Locate `name` (any case, with or without padding) in the root
    /// directory.
    pub fn find_file(&self, name: &str) -> FsResult<DirEntry> {
        let target = to_fat_name(name);
        self.inner.lock().find(&target)
    }

    /// Open a file for reading.
    pub fn open(&self, name: &str) -> FsResult<FileHandle> {
        let entry = self.find_file(name)?;
        Ok(FileHandle {
            name: entry.raw_name(),
            size: entry.file_size,
            current_cluster: entry.first_cluster(),
            position: 0,
            is_open: true,
        })
    }

    /// Copy up to `buf.len()` bytes from the handle's position. Returns
    /// the number of bytes copied; a short count means end of file, never
    /// an error.
    pub fn read(&self, handle: &mut FileHandle, buf: &mut [u8]) -> FsResult<u32> {
        if !handle.is_open {
            return Err(FsError::NotOpen);
        }
        self.inner.lock().read(handle, buf)
    }

    /// Close the handle. Further reads fail with `NotOpen`.
    pub fn close(&self, handle: &mut FileHandle) {
        handle.is_open = false;
    }

    /// Every live root-directory entry except the volume label.
    /// Directories are included; callers render them with a `<DIR>` tag.
    pub fn list_root(&self) -> FsResult<Vec<DirEntry>> {
        self.inner.lock().list_root()
    }

    /// Number of live root-directory entries.
    pub fn file_count(&self) -> FsResult<usize> {
        Ok(self.list_root()?.len())
    }
}

impl<D: BlockDevice> Fat12Inner<D> {
    /// Linear scan of the root directory for an exact 11-byte name match.
    /// Stops at the end marker; deleted, volume-label and directory
    /// entries never match.
    fn find(&mut self, target: &[u8; 11]) -> FsResult<DirEntry> {
        let root_start = self.boot_sector.root_dir_start_lba();
        let mut sector = [0u8; SECTOR_SIZE];
        for s in 0..self.boot_sector.root_dir_sectors() {
            self.device.read_sector(root_start + s, &mut sector)?;
            for raw in sector.chunks_exact(DIR_ENTRY_SIZE) {
                let entry = DirEntry::parse(raw);
                if entry.is_end() {
                    return Err(FsError::NotFound);
                }
                if entry.is_deleted() {
                    continue;
                }
                if entry
                    .attributes
                    .intersects(FileAttributes::VOLUME_LABEL | FileAttributes::DIRECTORY)
                {
                    continue;
                }
                if entry.raw_name() == *target {
                    return Ok(entry);
                }
            }
        }
        Err(FsError::NotFound)
    }

    fn list_root(&mut self) -> FsResult<Vec<DirEntry>> {
        let root_start = self.boot_sector.root_dir_start_lba();
        let mut sector = [0u8; SECTOR_SIZE];
        let mut out = Vec::new();
        for s in 0..self.boot_sector.root_dir_sectors() {
            self.device.read_sector(root_start + s, &mut sector)?;
            for raw in sector.chunks_exact(DIR_ENTRY_SIZE) {
                let entry = DirEntry::parse(raw);
                if entry.is_end() {
                    return Ok(out);
                }
                if entry.is_deleted() || entry.is_volume_label() {
                    continue;
                }
                out.push(entry);
            }
        }
        Ok(out)
    }

    fn read(&mut self, handle: &mut FileHandle, buf: &mut [u8]) -> FsResult<u32> {
        let bps = self.boot_sector.bytes_per_sector as u32;
        let spc = self.boot_sector.sectors_per_cluster as u32;
        let bytes_per_cluster = self.boot_sector.bytes_per_cluster();
        let data_start = self.boot_sector.data_start_lba();

        let want = buf.len() as u32;
        let mut copied = 0u32;
        let mut sector = [0u8; SECTOR_SIZE];

        while copied < want
            && handle.position < handle.size
            && handle.current_cluster < FAT12_CLUSTER_EOF
        {
            if handle.current_cluster < 2 {
                break;
            }
            // The sector inside the cluster follows from the position, so
            // clusters spanning several sectors read through correctly.
            let sector_in_cluster = (handle.position % bytes_per_cluster) / bps;
            let lba = data_start + (handle.current_cluster - 2) * spc + sector_in_cluster;
            self.device.read_sector(lba, &mut sector)?;

            // Bounded by the request, the sector remainder and the file
            // remainder, whichever is smallest.
            let sector_offset = handle.position % bps;
            let n = (want - copied)
                .min(bps - sector_offset)
                .min(handle.size - handle.position);

            buf[copied as usize..(copied + n) as usize]
                .copy_from_slice(&sector[sector_offset as usize..(sector_offset + n) as usize]);

            copied += n;
            handle.position += n;

            // The chain only advances when a whole cluster has been
            // consumed.
            if handle.position % bytes_per_cluster == 0 {
                handle.current_cluster = self.fat.next_cluster(handle.current_cluster);
            }
        }

        Ok(copied)
    }
}
