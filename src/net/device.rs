use crate::net::addr::MacAddr;
use alloc::boxed::Box;
use core::fmt;

pub type NetResult<T> = Result<T, NetError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetError {
    /// Interface is configured down; nothing can be sent.
    InterfaceDown,
    /// Address resolution is in flight; resend after the cache fills.
    ArpPending,
    /// Frame would not fit the transmit buffer.
    FrameTooLarge,
    /// No frame waiting (receive side).
    WouldBlock,
    /// The hardware rejected the operation or is absent.
    DeviceFailure,
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NetError::InterfaceDown => write!(f, "Interface down"),
            NetError::ArpPending    => write!(f, "ARP resolution pending, retry"),
            NetError::FrameTooLarge => write!(f, "Frame too large"),
            NetError::WouldBlock    => write!(f, "No data available"),
            NetError::DeviceFailure => write!(f, "Network device failure"),
        }
    }
}

/// Device ↔ stack interface. The stack builds whole Ethernet frames and
/// hands them down; the driver owns descriptor rings and interrupts.
pub trait NetworkDevice {
    /// Transmit a complete frame (copy-based).
    fn transmit(&mut self, frame: &[u8]) -> NetResult<()>;

    /// Try to receive a frame into `buf`. Returns the byte count written,
    /// or `WouldBlock` when nothing is pending.
    fn receive(&mut self, buf: &mut [u8]) -> NetResult<usize>;

    /// Hardware address of this device.
    fn mac_addr(&self) -> MacAddr;

    /// MTU in bytes.
    fn mtu(&self) -> usize;
}

impl<T: NetworkDevice + ?Sized> NetworkDevice for Box<T> {
    fn transmit(&mut self, frame: &[u8]) -> NetResult<()> {
        (**self).transmit(frame)
    }

    fn receive(&mut self, buf: &mut [u8]) -> NetResult<usize> {
        (**self).receive(buf)
    }

    fn mac_addr(&self) -> MacAddr {
        (**self).mac_addr()
    }

    fn mtu(&self) -> usize {
        (**self).mtu()
    }
}

/// Transmit double standing in for absent hardware: every frame "sends"
/// successfully and the receive side stays silent. Keeps the send path's
/// layering honest until a real driver takes this seat.
pub struct NullDevice {
    mac: MacAddr,
}

impl NullDevice {
    pub fn new(mac: MacAddr) -> Self {
        NullDevice { mac }
    }
}

impl NetworkDevice for NullDevice {
    fn transmit(&mut self, _frame: &[u8]) -> NetResult<()> {
        Ok(())
    }

    fn receive(&mut self, _buf: &mut [u8]) -> NetResult<usize> {
        Err(NetError::WouldBlock)
    }

    fn mac_addr(&self) -> MacAddr {
        self.mac
    }

    fn mtu(&self) -> usize {
        1500
    }
}
