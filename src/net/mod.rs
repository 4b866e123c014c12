pub mod addr;
pub mod arp;
pub mod checksum;
pub mod device;
pub mod ethernet;
pub mod icmp;
pub mod ipv4;
pub mod rtl8139;

use crate::console::Console;
use crate::log_info;
use crate::log_warn;
use addr::{Ipv4Addr, MacAddr};
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use arp::ArpTable;
use core::fmt;
use device::{NetError, NetResult, NetworkDevice, NullDevice};
use ethernet::ETHERTYPE_IPV4;
use ipv4::{Ipv4Header, IPPROTO_ICMP, IPV4_HEADER_LEN};
use rtl8139::Rtl8139;

/// Transmit arena: one maximum-size frame. Oversized sends are rejected,
/// never truncated.
pub const TX_BUFFER_SIZE: usize = 1536;
/// Receive arena: one frame drained from the device per `poll` pass.
pub const RX_BUFFER_SIZE: usize = 1536;

// ══════════════════════════════════════════════════════════════
//  Interface configuration
// ══════════════════════════════════════════════════════════════

/// Single network interface record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetInterface {
    pub mac: MacAddr,
    pub ip: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub enabled: bool,
    pub name: String,
}

impl NetInterface {
    /// The demonstration profile used when no hardware turns up.
    pub fn simulated() -> Self {
        NetInterface {
            mac: MacAddr([0x52, 0x54, 0x00, 0x12, 0x34, 0x56]),
            ip: Ipv4Addr([192, 168, 1, 100]),
            netmask: Ipv4Addr([255, 255, 255, 0]),
            gateway: Ipv4Addr([192, 168, 1, 1]),
            enabled: true,
            name: String::from("eth0"),
        }
    }
}

// ══════════════════════════════════════════════════════════════
//  NetStack
// ══════════════════════════════════════════════════════════════

/// The network stack: one device, one interface, one ARP cache, fixed
/// frame arenas, and the diagnostic console they all report through.
pub struct NetStack<D: NetworkDevice, W: fmt::Write> {
    device: D,
    console: Console<W>,
    pub iface: NetInterface,
    pub arp: ArpTable,
    tx_buffer: [u8; TX_BUFFER_SIZE],
    rx_buffer: [u8; RX_BUFFER_SIZE],
}

/// Bring the subsystem up: probe for a supported card, fall back to the
/// simulated device when none answers.
pub fn init<W: fmt::Write>(mut console: Console<W>) -> NetStack<Box<dyn NetworkDevice>, W> {
    log_info!(console, "Initializing network subsystem...");
    match Rtl8139::probe() {
        Ok(nic) => {
            log_info!(console, "RTL8139 network card detected");
            let mut iface = NetInterface::simulated();
            iface.mac = nic.mac_addr();
            NetStack::new(Box::new(nic) as Box<dyn NetworkDevice>, console, iface)
        }
        Err(_) => {
            log_warn!(console, "No compatible network card found");
            log_info!(console, "Simulated network mode enabled");
            let iface = NetInterface::simulated();
            let device = NullDevice::new(iface.mac);
            NetStack::new(Box::new(device) as Box<dyn NetworkDevice>, console, iface)
        }
    }
}

impl<D: NetworkDevice, W: fmt::Write> NetStack<D, W> {
    pub fn new(device: D, console: Console<W>, iface: NetInterface) -> Self {
        NetStack {
            device,
            console,
            iface,
            arp: ArpTable::new(),
            tx_buffer: [0u8; TX_BUFFER_SIZE],
            rx_buffer: [0u8; RX_BUFFER_SIZE],
        }
    }

    pub fn console(&mut self) -> &mut Console<W> {
        &mut self.console
    }

    /// Frame a payload and hand it to the device.
    pub fn eth_send_frame(
        &mut self,
        dst: MacAddr,
        ethertype: u16,
        payload: &[u8],
    ) -> NetResult<usize> {
        if !self.iface.enabled {
            return Err(NetError::InterfaceDown);
        }
        if payload.len() > self.device.mtu() {
            return Err(NetError::FrameTooLarge);
        }
        let len = ethernet::build_frame(dst, self.iface.mac, ethertype, payload, &mut self.tx_buffer)
            .ok_or(NetError::FrameTooLarge)?;
        log_info!(self.console, "Sending Ethernet frame ({} bytes)", len);
        self.device.transmit(&self.tx_buffer[..len])?;
        Ok(len)
    }

    /// Send an IP packet. A cache miss kicks off resolution and reports
    /// `ArpPending`; the caller resends once the cache has filled.
    pub fn ip_send(&mut self, dst: Ipv4Addr, protocol: u8, payload: &[u8]) -> NetResult<usize> {
        if !self.iface.enabled {
            return Err(NetError::InterfaceDown);
        }
        log_info!(self.console, "Sending IP packet to {}", dst);

        let dst_mac = match self.arp.lookup(dst) {
            Some(mac) => mac,
            None => {
                self.arp.request(dst, &mut self.console);
                return Err(NetError::ArpPending);
            }
        };

        let header = Ipv4Header::new(self.iface.ip, dst, protocol, payload.len()).serialize();
        let mut packet = Vec::with_capacity(IPV4_HEADER_LEN + payload.len());
        packet.extend_from_slice(&header);
        packet.extend_from_slice(payload);
        self.eth_send_frame(dst_mac, ETHERTYPE_IPV4, &packet)
    }

    /// Send one echo request and report the (simulated) reply.
    pub fn ping_send(&mut self, dst: Ipv4Addr, ident: u16, seq: u16) -> NetResult<()> {
        let payload = [0u8; icmp::PING_PAYLOAD_LEN];
        let echo = icmp::build_echo_request(ident, seq, &payload);
        self.console
            .print(format_args!("PING {} ({}:{})\n", dst, ident, seq));
        self.ip_send(dst, IPPROTO_ICMP, &echo)?;
        // No receive path exists yet, so the reply is synthesized.
        self.console.print(format_args!(
            "64 bytes from {}: icmp_seq={} ttl=64 time=1ms\n",
            dst, seq
        ));
        Ok(())
    }

    /// Drain pending frames from the device. ARP traffic is learned and
    /// answered; everything else is dropped on the floor for now.
    pub fn poll(&mut self) {
        loop {
            let len = match self.device.receive(&mut self.rx_buffer) {
                Ok(len) => len,
                Err(_) => break,
            };
            let reply = arp::handle_packet(
                &mut self.arp,
                &self.rx_buffer[..len],
                self.iface.ip,
                self.iface.mac,
            );
            if let Some(frame) = reply {
                log_info!(self.console, "Sending ARP reply ({} bytes)", frame.len());
                let _ = self.device.transmit(&frame);
            }
        }
    }
}
