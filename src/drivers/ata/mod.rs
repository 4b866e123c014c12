pub mod pio;

use crate::console::Console;
use crate::log_info;
use crate::log_warn;
use core::fmt;
use pio::{AtaDevice, AtaResult};
use x86_64::instructions::port::Port;

const PRIMARY_IO: u16   = 0x1F0;
const PRIMARY_CTRL: u16 = 0x3F6;
const SECONDARY_CTRL: u16 = 0x376;

/// Probe the primary master and hand back the owned device.
///
/// Disables ATA interrupts (nIEN) on both buses BEFORE issuing any
/// command; prevents unhandled IRQ 14/15 double faults on boot.
pub fn init<W: fmt::Write>(console: &mut Console<W>) -> AtaResult<AtaDevice> {
    unsafe {
        Port::<u8>::new(PRIMARY_CTRL).write(0x02); // Primary control: nIEN = 1
        Port::<u8>::new(SECONDARY_CTRL).write(0x02); // Secondary control: nIEN = 1
    }

    let mut dev = AtaDevice::new(PRIMARY_IO, PRIMARY_CTRL, true);
    match dev.identify() {
        Ok(()) => {
            log_info!(console, "ATA PIO: Primary master disk detected.");
            Ok(dev)
        }
        Err(e) => {
            log_warn!(console, "ATA PIO: No disk detected ({}).", e);
            Err(e)
        }
    }
}
