//! Whole-volume scenario: build a 1.44MB floppy image in memory, mount it,
//! and drive the public filesystem API end to end.

use ferrite_os::fs::block_device::{BlockDevice, SECTOR_SIZE};
use ferrite_os::fs::boot_sector::BootSector;
use ferrite_os::fs::dir_entry::{DirEntry, FileAttributes, ENTRY_DELETED};
use ferrite_os::fs::error::FsError;
use ferrite_os::fs::fat12::Fat12Fs;
use ferrite_os::fs::ram_disk::RamDisk;

struct ImageBuilder {
    disk: RamDisk,
    boot: BootSector,
    next_cluster: u32,
    next_entry: usize,
    fat: Vec<u8>,
    root: Vec<u8>,
}

impl ImageBuilder {
    fn new() -> Self {
        let boot = BootSector {
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
            volume_serial: 0x2A2A_2A2A,
            volume_label: *b"FLOPPY     ",
            filesystem_type: *b"FAT12   ",
        };
        let mut fat = vec![0u8; 9 * SECTOR_SIZE];
        fat[0] = 0xF0;
        fat[1] = 0xFF;
        fat[2] = 0xFF;
        ImageBuilder {
            disk: RamDisk::new(2880),
            boot,
            next_cluster: 2,
            next_entry: 0,
            fat,
            root: vec![0u8; 14 * SECTOR_SIZE],
        }
    }

    fn set_fat_entry(&mut self, cluster: u32, value: u16) {
        let off = (cluster + cluster / 2) as usize;
        let word = u16::from_le_bytes([self.fat[off], self.fat[off + 1]]);
        let word = if cluster & 1 == 1 {
            (word & 0x000F) | (value << 4)
        } else {
            (word & 0xF000) | (value & 0x0FFF)
        };
        self.fat[off..off + 2].copy_from_slice(&word.to_le_bytes());
    }

    fn push_entry(&mut self, entry: &DirEntry) {
        let raw = entry.serialize();
        let at = self.next_entry * 32;
        self.root[at..at + 32].copy_from_slice(&raw);
        self.next_entry += 1;
    }

    fn add_file(&mut self, name: [u8; 8], ext: [u8; 3], data: &[u8]) {
        let clusters = data.len().div_ceil(SECTOR_SIZE).max(1) as u32;
        let first = self.next_cluster;
        for c in 0..clusters {
            let cluster = first + c;
            let value = if c + 1 == clusters {
                0xFFF
            } else {
                (cluster + 1) as u16
            };
            self.set_fat_entry(cluster, value);
            let lba = self.boot.data_start_lba() + (cluster - 2);
            let start = c as usize * SECTOR_SIZE;
            let end = data.len().min(start + SECTOR_SIZE);
            let mut sector = [0u8; SECTOR_SIZE];
            sector[..end - start].copy_from_slice(&data[start..end]);
            self.disk.write_sector(lba, &sector).unwrap();
        }
        self.next_cluster = first + clusters;

        let mut entry = DirEntry::parse(&[0u8; 32]);
        entry.name = name;
        entry.ext = ext;
        entry.attributes = FileAttributes::ARCHIVE;
        entry.first_cluster_low = first as u16;
        entry.file_size = data.len() as u32;
        self.push_entry(&entry);
    }

    fn add_volume_label(&mut self) {
        let mut entry = DirEntry::parse(&[0u8; 32]);
        entry.name = *b"FLOPPY  ";
        entry.ext = *b"   ";
        entry.attributes = FileAttributes::VOLUME_LABEL;
        self.push_entry(&entry);
    }

    fn add_directory(&mut self, name: [u8; 8]) {
        let mut entry = DirEntry::parse(&[0u8; 32]);
        entry.name = name;
        entry.ext = *b"   ";
        entry.attributes = FileAttributes::DIRECTORY;
        entry.first_cluster_low = self.next_cluster as u16;
        self.set_fat_entry(self.next_cluster, 0xFFF);
        self.next_cluster += 1;
        self.push_entry(&entry);
    }

    fn add_deleted(&mut self, data_name: [u8; 8]) {
        let mut entry = DirEntry::parse(&[0u8; 32]);
        entry.name = data_name;
        entry.name[0] = ENTRY_DELETED;
        entry.ext = *b"TXT";
        entry.attributes = FileAttributes::ARCHIVE;
        self.push_entry(&entry);
    }

    fn build(mut self) -> RamDisk {
        let mut sector = [0u8; SECTOR_SIZE];
        self.boot.serialize(&mut sector);
        self.disk.write_sector(0, &sector).unwrap();
        // both FAT copies
        for copy in 0..self.boot.fat_count as u32 {
            let start = self.boot.fat_start_lba() + copy * self.boot.sectors_per_fat as u32;
            self.disk
                .write_sectors(start, self.boot.sectors_per_fat as u32, &self.fat)
                .unwrap();
        }
        let root = self.root.clone();
        self.disk
            .write_sectors(self.boot.root_dir_start_lba(), 14, &root)
            .unwrap();
        self.disk
    }
}

fn sample_floppy() -> RamDisk {
    let mut image = ImageBuilder::new();
    image.add_volume_label();
    image.add_file(*b"README  ", *b"TXT", b"FerriteOS demo floppy.\n");
    image.add_deleted(*b"OLDNOTE ");
    let kernel_blob: Vec<u8> = (0..4000u32).map(|i| (i % 253) as u8).collect();
    image.add_file(*b"KERNEL  ", *b"BIN", &kernel_blob);
    image.add_directory(*b"DOCS    ");
    image.build()
}

#[test]
fn mount_reads_the_bpb() {
    let fs = Fat12Fs::mount(sample_floppy()).expect("mount failed");
    let bs = fs.boot_sector();
    assert_eq!(bs.bytes_per_sector, 512);
    assert_eq!(bs.total_sectors(), 2880);
    assert_eq!(bs.root_dir_start_lba(), 19);
    assert_eq!(bs.data_start_lba(), 33);
    assert_eq!(&bs.volume_label, b"FLOPPY     ");
}

#[test]
fn listing_skips_label_and_deleted_but_keeps_directories() {
    let fs = Fat12Fs::mount(sample_floppy()).unwrap();
    let entries = fs.list_root().unwrap();
    let names: Vec<String> = entries.iter().map(|e| e.display_name()).collect();
    assert_eq!(names, ["README.TXT", "KERNEL.BIN", "DOCS"]);
    assert!(entries[2].is_dir());
    assert_eq!(fs.file_count().unwrap(), 3);
}

#[test]
fn find_is_case_insensitive_and_skips_directories() {
    let fs = Fat12Fs::mount(sample_floppy()).unwrap();
    assert!(fs.find_file("readme.txt").is_ok());
    assert!(fs.find_file("ReAdMe.TxT").is_ok());
    assert_eq!(fs.find_file("oldnote.txt"), Err(FsError::NotFound));
    // directory entries are not openable files
    assert_eq!(fs.find_file("docs"), Err(FsError::NotFound));
}

#[test]
fn read_whole_file_across_clusters() {
    let fs = Fat12Fs::mount(sample_floppy()).unwrap();
    let mut handle = fs.open("kernel.bin").unwrap();
    assert_eq!(handle.size(), 4000);

    let mut data = vec![0u8; 4096];
    let n = fs.read(&mut handle, &mut data).unwrap();
    assert_eq!(n, 4000);
    for (i, b) in data[..4000].iter().enumerate() {
        assert_eq!(*b, (i % 253) as u8, "byte {}", i);
    }
    // EOF: a further read copies nothing and is not an error
    assert_eq!(fs.read(&mut handle, &mut data).unwrap(), 0);
}

#[test]
fn chunked_reads_reassemble_the_file() {
    let fs = Fat12Fs::mount(sample_floppy()).unwrap();
    let mut handle = fs.open("kernel.bin").unwrap();
    let mut collected = Vec::new();
    let mut chunk = [0u8; 100];
    loop {
        let n = fs.read(&mut handle, &mut chunk).unwrap() as usize;
        if n == 0 {
            break;
        }
        collected.extend_from_slice(&chunk[..n]);
    }
    assert_eq!(collected.len(), 4000);
    assert_eq!(handle.position(), 4000);
}

#[test]
fn independent_handles_do_not_interfere() {
    let fs = Fat12Fs::mount(sample_floppy()).unwrap();
    let mut a = fs.open("readme.txt").unwrap();
    let mut b = fs.open("readme.txt").unwrap();
    let mut buf = [0u8; 7];
    fs.read(&mut a, &mut buf).unwrap();
    assert_eq!(a.position(), 7);
    assert_eq!(b.position(), 0);
    let mut all = [0u8; 64];
    let n = fs.read(&mut b, &mut all).unwrap();
    assert_eq!(&all[..n as usize], b"FerriteOS demo floppy.\n");
}

#[test]
fn close_invalidates_the_handle() {
    let fs = Fat12Fs::mount(sample_floppy()).unwrap();
    let mut handle = fs.open("readme.txt").unwrap();
    fs.close(&mut handle);
    let mut buf = [0u8; 4];
    assert_eq!(fs.read(&mut handle, &mut buf), Err(FsError::NotOpen));
}
