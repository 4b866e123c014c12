use crate::net::addr::MacAddr;

pub const ETH_HEADER_LEN: usize = 14;
/// Largest frame the stack will build: 1500-byte payload plus header and FCS room.
pub const ETH_FRAME_MAX: usize = 1518;

pub const ETHERTYPE_IPV4: u16 = 0x0800;
pub const ETHERTYPE_ARP: u16 = 0x0806;

/// Ethernet II header. Field order is the wire layout: destination,
/// source, big-endian ethertype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthHeader {
    pub dst: MacAddr,
    pub src: MacAddr,
    pub ethertype: u16,
}

/// Split a raw frame into header and payload. None for runt frames.
pub fn parse_frame(frame: &[u8]) -> Option<(EthHeader, &[u8])> {
    if frame.len() < ETH_HEADER_LEN {
        return None;
    }
    let mut dst = [0u8; 6];
    dst.copy_from_slice(&frame[0..6]);
    let mut src = [0u8; 6];
    src.copy_from_slice(&frame[6..12]);
    let header = EthHeader {
        dst: MacAddr(dst),
        src: MacAddr(src),
        ethertype: u16::from_be_bytes([frame[12], frame[13]]),
    };
    Some((header, &frame[ETH_HEADER_LEN..]))
}

/// Serialize header + payload into `out`. Returns the frame length, or
/// None when the buffer cannot hold it.
pub fn build_frame(
    dst: MacAddr,
    src: MacAddr,
    ethertype: u16,
    payload: &[u8],
    out: &mut [u8],
) -> Option<usize> {
    let total = ETH_HEADER_LEN + payload.len();
    if out.len() < total {
        return None;
    }
    out[0..6].copy_from_slice(&dst.0);
    out[6..12].copy_from_slice(&src.0);
    out[12..14].copy_from_slice(&ethertype.to_be_bytes());
    out[ETH_HEADER_LEN..total].copy_from_slice(payload);
    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_parse_round_trip() {
        let dst = MacAddr([1, 2, 3, 4, 5, 6]);
        let src = MacAddr([7, 8, 9, 10, 11, 12]);
        let payload = b"payload bytes";
        let mut buf = [0u8; 64];
        let len = build_frame(dst, src, ETHERTYPE_IPV4, payload, &mut buf).unwrap();
        assert_eq!(len, ETH_HEADER_LEN + payload.len());

        let (header, body) = parse_frame(&buf[..len]).unwrap();
        assert_eq!(header.dst, dst);
        assert_eq!(header.src, src);
        assert_eq!(header.ethertype, ETHERTYPE_IPV4);
        assert_eq!(body, payload);
    }

    #[test]
    fn ethertype_is_big_endian_on_wire() {
        let mut buf = [0u8; 32];
        build_frame(
            MacAddr::BROADCAST,
            MacAddr([0; 6]),
            ETHERTYPE_ARP,
            &[],
            &mut buf,
        )
        .unwrap();
        assert_eq!(buf[12], 0x08);
        assert_eq!(buf[13], 0x06);
    }

    #[test]
    fn runt_frame_rejected() {
        assert!(parse_frame(&[0u8; 13]).is_none());
    }

    #[test]
    fn undersized_buffer_rejected() {
        let mut buf = [0u8; 16];
        assert!(build_frame(
            MacAddr::BROADCAST,
            MacAddr([0; 6]),
            ETHERTYPE_IPV4,
            &[0u8; 8],
            &mut buf
        )
        .is_none());
    }
}
