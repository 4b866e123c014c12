use crate::fs::block_device::{BlockDevice, DiskError, SECTOR_SIZE};
use bit_field::BitField;
use core::fmt;
use x86_64::instructions::port::Port;

// ──────────────────────────────────────────────────────────────
//  ATA PIO port offsets (relative to io_base)
// ──────────────────────────────────────────────────────────────

const DATA_REG: u16        = 0; // R/W data (16-bit)
const ERROR_REG: u16       = 1; // R: error / W: features
const SECTOR_COUNT: u16    = 2;
const LBA_LOW: u16         = 3;
const LBA_MID: u16         = 4;
const LBA_HIGH: u16        = 5;
const DRIVE_HEAD: u16      = 6;
const CMD_STATUS: u16      = 7; // R: status / W: command

// Status register bits
const STATUS_BSY: u8  = 0x80;
const STATUS_DRQ: u8  = 0x08;
const STATUS_ERR: u8  = 0x01;
const STATUS_DF: u8   = 0x20;

// ATA commands
const CMD_IDENTIFY: u8      = 0xEC;
const CMD_READ_SECTORS: u8  = 0x20;
const CMD_WRITE_SECTORS: u8 = 0x30;
const CMD_CACHE_FLUSH: u8   = 0xE7;

/// Bound on the polling loops. Iterations, not wall-clock time; the
/// driver runs before any timer exists.
pub const DISK_TIMEOUT: u32 = 10_000;

// ──────────────────────────────────────────────────────────────
//  Error type
// ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtaError {
    DeviceNotFound,
    DeviceFault,
    BusyTimeout,
    DrqTimeout,
    IoError,
}

impl fmt::Display for AtaError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AtaError::DeviceNotFound => write!(f, "Device not found"),
            AtaError::DeviceFault    => write!(f, "Device fault"),
            AtaError::BusyTimeout    => write!(f, "BSY timeout"),
            AtaError::DrqTimeout     => write!(f, "DRQ timeout"),
            AtaError::IoError        => write!(f, "I/O error"),
        }
    }
}

pub type AtaResult<T> = Result<T, AtaError>;

// ──────────────────────────────────────────────────────────────
//  ATA Device
// ──────────────────────────────────────────────────────────────

pub struct AtaDevice {
    io_base: u16,
    ctrl_base: u16,
    is_master: bool,
    timeout: u32,
    detected: bool,
}

impl AtaDevice {
    pub fn new(io_base: u16, ctrl_base: u16, is_master: bool) -> Self {
        AtaDevice {
            io_base,
            ctrl_base,
            is_master,
            timeout: DISK_TIMEOUT,
            detected: false,
        }
    }

    /// Same device with a custom polling bound.
    pub fn with_timeout(mut self, timeout: u32) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_detected(&self) -> bool {
        self.detected
    }

    // ── Port I/O helpers ─────────────────────────────────────

    fn read_port(&self, offset: u16) -> u8 {
        let mut port = Port::<u8>::new(self.io_base + offset);
        unsafe { port.read() }
    }

    fn write_port(&self, offset: u16, val: u8) {
        let mut port = Port::<u8>::new(self.io_base + offset);
        unsafe { port.write(val) }
    }

    fn read_data16(&self) -> u16 {
        let mut port = Port::<u16>::new(self.io_base + DATA_REG);
        unsafe { port.read() }
    }

    fn write_data16(&self, val: u16) {
        let mut port = Port::<u16>::new(self.io_base + DATA_REG);
        unsafe { port.write(val) }
    }

    fn read_ctrl(&self) -> u8 {
        let mut port = Port::<u8>::new(self.ctrl_base);
        unsafe { port.read() }
    }

    // ── Status polling ───────────────────────────────────────

    /// Wait until BSY clears. Returns Err on timeout.
    fn wait_bsy(&self) -> AtaResult<()> {
        for _ in 0..self.timeout {
            let status = self.read_port(CMD_STATUS);
            if status & STATUS_BSY == 0 {
                return Ok(());
            }
            core::hint::spin_loop();
        }
        Err(AtaError::BusyTimeout)
    }

    /// Wait until DRQ is set (data ready). ERR reports as an I/O error,
    /// DF as a device fault.
    fn wait_drq(&self) -> AtaResult<()> {
        for _ in 0..self.timeout {
            let status = self.read_port(CMD_STATUS);
            if status & STATUS_ERR != 0 {
                return Err(AtaError::IoError);
            }
            if status & STATUS_DF != 0 {
                return Err(AtaError::DeviceFault);
            }
            if status & STATUS_DRQ != 0 {
                return Ok(());
            }
            core::hint::spin_loop();
        }
        Err(AtaError::DrqTimeout)
    }

    /// Perform the 400ns delay by reading the alternate status register 4 times.
    fn delay_400ns(&self) {
        for _ in 0..4 {
            let _ = self.read_ctrl();
        }
    }

    /// Select drive (master or slave).
    fn select_drive(&self) {
        let val = if self.is_master { 0xA0 } else { 0xB0 };
        self.write_port(DRIVE_HEAD, val);
        self.delay_400ns();
    }

    /// Program the task file for a one-sector LBA28 transfer: LBA mode bit
    /// set, top four LBA bits in the low nibble of drive/head.
    fn select_lba(&self, lba: u32) {
        let head = if self.is_master { 0xE0 } else { 0xF0 };
        self.write_port(DRIVE_HEAD, head | lba.get_bits(24..28) as u8);
        self.delay_400ns();

        self.write_port(ERROR_REG, 0);    // features = 0
        self.write_port(SECTOR_COUNT, 1); // one sector per command
        self.write_port(LBA_LOW, lba as u8);
        self.write_port(LBA_MID, (lba >> 8) as u8);
        self.write_port(LBA_HIGH, (lba >> 16) as u8);
    }

    // ── IDENTIFY ─────────────────────────────────────────────

    /// Identify the disk. Sets `detected` on success.
    pub fn identify(&mut self) -> AtaResult<()> {
        self.select_drive();
        self.write_port(SECTOR_COUNT, 0);
        self.write_port(LBA_LOW, 0);
        self.write_port(LBA_MID, 0);
        self.write_port(LBA_HIGH, 0);
        self.write_port(CMD_STATUS, CMD_IDENTIFY);

        // Status of 0 means nothing is attached to the bus.
        let status = self.read_port(CMD_STATUS);
        if status == 0 {
            return Err(AtaError::DeviceNotFound);
        }

        self.wait_bsy()?;

        // Non-zero LBA mid/high after IDENTIFY: not ATA (possibly ATAPI).
        if self.read_port(LBA_MID) != 0 || self.read_port(LBA_HIGH) != 0 {
            return Err(AtaError::DeviceNotFound);
        }

        self.wait_drq()?;

        // Read the 256-word identify block. The contents are discarded; we
        // only care that the exchange completes.
        for _ in 0..256 {
            let _ = self.read_data16();
        }

        self.detected = true;
        Ok(())
    }

    // ── READ SECTOR (LBA28) ─────────────────────────────────

    /// Read one 512-byte sector at the given LBA.
    pub fn read_sector(&self, lba: u32, buf: &mut [u8; SECTOR_SIZE]) -> AtaResult<()> {
        if !self.detected {
            return Err(AtaError::DeviceNotFound);
        }

        self.wait_bsy()?;
        self.select_lba(lba);
        self.write_port(CMD_STATUS, CMD_READ_SECTORS);
        self.wait_drq()?;

        // Transfer 256 words (512 bytes) in
        for i in 0..256 {
            let word = self.read_data16();
            buf[i * 2]     = (word & 0xFF) as u8;
            buf[i * 2 + 1] = (word >> 8) as u8;
        }

        Ok(())
    }

    // ── WRITE SECTOR (LBA28) ────────────────────────────────

    /// Write one 512-byte sector at the given LBA.
    pub fn write_sector(&self, lba: u32, buf: &[u8; SECTOR_SIZE]) -> AtaResult<()> {
        if !self.detected {
            return Err(AtaError::DeviceNotFound);
        }

        self.wait_bsy()?;
        self.select_lba(lba);
        self.write_port(CMD_STATUS, CMD_WRITE_SECTORS);
        self.wait_drq()?;

        // Transfer 256 words (512 bytes) out
        for i in 0..256 {
            let word = (buf[i * 2] as u16) | ((buf[i * 2 + 1] as u16) << 8);
            self.write_data16(word);
        }

        // Flush the write cache and wait for the device to settle.
        self.write_port(CMD_STATUS, CMD_CACHE_FLUSH);
        self.wait_bsy()?;

        Ok(())
    }

    // ── Multi-sector operations ─────────────────────────────

    /// Read `count` consecutive sectors starting at `lba` into `buf`
    /// (`count * 512` bytes). Aborts on the first failing sector.
    pub fn read_sectors(&self, lba: u32, count: u32, buf: &mut [u8]) -> AtaResult<()> {
        let chunks = buf.chunks_exact_mut(SECTOR_SIZE).take(count as usize);
        for (i, chunk) in chunks.enumerate() {
            let sector: &mut [u8; SECTOR_SIZE] =
                chunk.try_into().map_err(|_| AtaError::IoError)?;
            self.read_sector(lba + i as u32, sector)?;
        }
        Ok(())
    }

    /// Write `count` consecutive sectors starting at `lba` from `buf`.
    /// Aborts on the first failing sector; earlier sectors stay written.
    pub fn write_sectors(&self, lba: u32, count: u32, buf: &[u8]) -> AtaResult<()> {
        let chunks = buf.chunks_exact(SECTOR_SIZE).take(count as usize);
        for (i, chunk) in chunks.enumerate() {
            let sector: &[u8; SECTOR_SIZE] =
                chunk.try_into().map_err(|_| AtaError::IoError)?;
            self.write_sector(lba + i as u32, sector)?;
        }
        Ok(())
    }
}

impl BlockDevice for AtaDevice {
    fn read_sector(&mut self, lba: u32, buf: &mut [u8; SECTOR_SIZE]) -> Result<(), DiskError> {
        AtaDevice::read_sector(self, lba, buf).map_err(DiskError::from)
    }

    fn write_sector(&mut self, lba: u32, buf: &[u8; SECTOR_SIZE]) -> Result<(), DiskError> {
        AtaDevice::write_sector(self, lba, buf).map_err(DiskError::from)
    }

    fn sector_count(&self) -> u32 {
        // LBA28 addressing ceiling; the IDENTIFY block would refine this.
        1 << 28
    }
}
