use crate::console::Console;
use crate::log_info;
use crate::net::addr::{Ipv4Addr, MacAddr};
use crate::net::ethernet::{self, ETHERTYPE_ARP, ETH_HEADER_LEN};
use alloc::vec::Vec;
use core::fmt;

/// Fixed cache capacity. Entries never age out; they only leave by being
/// overwritten.
pub const ARP_TABLE_SIZE: usize = 32;

/// ARP payload size for Ethernet/IPv4: fixed 28 bytes.
pub const ARP_PACKET_LEN: usize = 28;

const ARP_HTYPE_ETHERNET: u16 = 1;
const ARP_PTYPE_IPV4: u16 = 0x0800;
const ARP_OP_REQUEST: u16 = 1;
const ARP_OP_REPLY: u16 = 2;

/// MAC fabricated for simulated resolutions while no transmit hardware
/// exists. One above the interface's own simulated address.
const SIMULATED_PEER_MAC: MacAddr = MacAddr([0x52, 0x54, 0x00, 0x12, 0x34, 0x57]);

#[derive(Clone, Copy)]
struct ArpEntry {
    ip: Ipv4Addr,
    mac: MacAddr,
    valid: bool,
}

impl ArpEntry {
    const EMPTY: ArpEntry = ArpEntry {
        ip: Ipv4Addr([0; 4]),
        mac: MacAddr([0; 6]),
        valid: false,
    };
}

/// Fixed-capacity IP → MAC cache.
pub struct ArpTable {
    entries: [ArpEntry; ARP_TABLE_SIZE],
}

impl ArpTable {
    pub fn new() -> Self {
        ArpTable {
            entries: [ArpEntry::EMPTY; ARP_TABLE_SIZE],
        }
    }

    /// Linear scan of the valid entries for an exact address match.
    pub fn lookup(&self, ip: Ipv4Addr) -> Option<MacAddr> {
        self.entries
            .iter()
            .find(|e| e.valid && e.ip == ip)
            .map(|e| e.mac)
    }

    /// Write into the first invalid slot; with the table full, slot 0 is
    /// overwritten unconditionally. No LRU, no aging.
    pub fn insert(&mut self, ip: Ipv4Addr, mac: MacAddr) {
        for entry in self.entries.iter_mut() {
            if !entry.valid {
                *entry = ArpEntry { ip, mac, valid: true };
                return;
            }
        }
        self.entries[0] = ArpEntry { ip, mac, valid: true };
    }

    /// Resolve `ip` by asking the network. With no transmit hardware the
    /// answer is synthesized on the spot; a real driver would send the
    /// request frame built by `build_request` and learn from the reply.
    pub fn request<W: fmt::Write>(&mut self, ip: Ipv4Addr, console: &mut Console<W>) {
        log_info!(console, "Sending ARP request for {}", ip);
        self.insert(ip, SIMULATED_PEER_MAC);
    }

    /// Valid entries, for the table dump command.
    pub fn entries(&self) -> impl Iterator<Item = (Ipv4Addr, MacAddr)> + '_ {
        self.entries
            .iter()
            .filter(|e| e.valid)
            .map(|e| (e.ip, e.mac))
    }

    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.valid).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ArpTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode one ARP payload (no Ethernet header).
fn build_payload(
    opcode: u16,
    sender_mac: MacAddr,
    sender_ip: Ipv4Addr,
    target_mac: MacAddr,
    target_ip: Ipv4Addr,
) -> [u8; ARP_PACKET_LEN] {
    let mut out = [0u8; ARP_PACKET_LEN];
    out[0..2].copy_from_slice(&ARP_HTYPE_ETHERNET.to_be_bytes());
    out[2..4].copy_from_slice(&ARP_PTYPE_IPV4.to_be_bytes());
    out[4] = 6; // hardware address length
    out[5] = 4; // protocol address length
    out[6..8].copy_from_slice(&opcode.to_be_bytes());
    out[8..14].copy_from_slice(&sender_mac.0);
    out[14..18].copy_from_slice(&sender_ip.0);
    out[18..24].copy_from_slice(&target_mac.0);
    out[24..28].copy_from_slice(&target_ip.0);
    out
}

/// Broadcast request frame asking who holds `target_ip`.
pub fn build_request(our_mac: MacAddr, our_ip: Ipv4Addr, target_ip: Ipv4Addr) -> Vec<u8> {
    let payload = build_payload(ARP_OP_REQUEST, our_mac, our_ip, MacAddr([0; 6]), target_ip);
    let mut frame = alloc::vec![0u8; ETH_HEADER_LEN + ARP_PACKET_LEN];
    // The build cannot fail: the buffer is sized for exactly this payload.
    let _ = ethernet::build_frame(MacAddr::BROADCAST, our_mac, ETHERTYPE_ARP, &payload, &mut frame);
    frame
}

/// Handle one incoming ARP frame.
///
/// The sender mapping is learned into `table` regardless of opcode; a
/// request aimed at `our_ip` additionally yields the reply frame to
/// transmit. Anything that is not Ethernet/IPv4 ARP is ignored.
pub fn handle_packet(
    table: &mut ArpTable,
    frame: &[u8],
    our_ip: Ipv4Addr,
    our_mac: MacAddr,
) -> Option<Vec<u8>> {
    let (header, payload) = ethernet::parse_frame(frame)?;
    if header.ethertype != ETHERTYPE_ARP || payload.len() < ARP_PACKET_LEN {
        return None;
    }

    let htype = u16::from_be_bytes([payload[0], payload[1]]);
    let ptype = u16::from_be_bytes([payload[2], payload[3]]);
    if htype != ARP_HTYPE_ETHERNET || ptype != ARP_PTYPE_IPV4 {
        return None;
    }

    let opcode = u16::from_be_bytes([payload[6], payload[7]]);
    let mut sender_mac = [0u8; 6];
    sender_mac.copy_from_slice(&payload[8..14]);
    let mut sender_ip = [0u8; 4];
    sender_ip.copy_from_slice(&payload[14..18]);
    let mut target_ip = [0u8; 4];
    target_ip.copy_from_slice(&payload[24..28]);

    let sender_mac = MacAddr(sender_mac);
    let sender_ip = Ipv4Addr(sender_ip);
    table.insert(sender_ip, sender_mac);

    if opcode == ARP_OP_REQUEST && Ipv4Addr(target_ip) == our_ip {
        let reply = build_payload(ARP_OP_REPLY, our_mac, our_ip, sender_mac, sender_ip);
        let mut frame = alloc::vec![0u8; ETH_HEADER_LEN + ARP_PACKET_LEN];
        let _ = ethernet::build_frame(sender_mac, our_mac, ETHERTYPE_ARP, &reply, &mut frame);
        return Some(frame);
    }
    None
}
