use crate::error::{Error, Result};
use byteorder::{BigEndian, ByteOrder};

const IPPROTO_TCP: u8 = 6;
const IPPROTO_UDP: u8 = 17;
const IPV4_HEADER_LEN: usize = 20;
const IPV6_HEADER_LEN: usize = 40;
const IPV4_SRC_ADDR_OFFSET: usize = 12;
const IPV6_SRC_ADDR_OFFSET: usize = 8;
const TCP_HEADER_LEN: usize = 20;
const UDP_HEADER_LEN: usize = 8;

/// Transport protocols eligible for receive aggregation.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Transport {
    Tcp,
    Udp,
}

/// flowKey identifies the packets that may be aggregated together.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct FlowKey {
    src_addr: [u8; 16],
    dst_addr: [u8; 16],
    src_port: u16,
    dst_port: u16,
    rx_ack: u32, // varying ack values should not be coalesced. Treat them as separate flows.
    transport: Transport,
    is_v6: bool,
}

impl FlowKey {
    /// Classify an IP packet.
    ///
    /// Returns `None` for packets that are well formed but can never be
    /// aggregated: other transports and IPv4 fragments.
    pub fn classify(pkt: &[u8]) -> Result<Option<FlowKey>> {
        if pkt.is_empty() {
            return Err(Error::Unclassified("empty packet"));
        }
        let (iph_len, protocol, src_addr_offset, addr_len) = match pkt[0] >> 4 {
            4 => {
                if pkt.len() < IPV4_HEADER_LEN {
                    return Err(Error::Unclassified("ipv4 header truncated"));
                }
                let iph_len = ((pkt[0] & 0x0f) as usize) * 4;
                if iph_len < IPV4_HEADER_LEN || pkt.len() < iph_len {
                    return Err(Error::Unclassified("invalid ipv4 header length"));
                }
                // MF set or a nonzero fragment offset
                if BigEndian::read_u16(&pkt[6..8]) & 0x3fff != 0 {
                    return Ok(None);
                }
                (iph_len, pkt[9], IPV4_SRC_ADDR_OFFSET, 4)
            }
            6 => {
                if pkt.len() < IPV6_HEADER_LEN {
                    return Err(Error::Unclassified("ipv6 header truncated"));
                }
                (IPV6_HEADER_LEN, pkt[6], IPV6_SRC_ADDR_OFFSET, 16)
            }
            _ => return Err(Error::Unclassified("invalid ip header version")),
        };
        let transport = match protocol {
            IPPROTO_TCP => {
                if pkt.len() < iph_len + TCP_HEADER_LEN {
                    return Err(Error::Unclassified("tcp header truncated"));
                }
                Transport::Tcp
            }
            IPPROTO_UDP => {
                if pkt.len() < iph_len + UDP_HEADER_LEN {
                    return Err(Error::Unclassified("udp header truncated"));
                }
                Transport::Udp
            }
            _ => return Ok(None),
        };

        let dst_addr_offset = src_addr_offset + addr_len;
        let mut key = FlowKey {
            src_addr: [0; 16],
            dst_addr: [0; 16],
            src_port: BigEndian::read_u16(&pkt[iph_len..]),
            dst_port: BigEndian::read_u16(&pkt[iph_len + 2..]),
            rx_ack: 0,
            transport,
            is_v6: addr_len == 16,
        };
        key.src_addr[..addr_len].copy_from_slice(&pkt[src_addr_offset..dst_addr_offset]);
        key.dst_addr[..addr_len]
            .copy_from_slice(&pkt[dst_addr_offset..dst_addr_offset + addr_len]);
        if transport == Transport::Tcp {
            key.rx_ack = BigEndian::read_u32(&pkt[iph_len + 8..]);
        }
        Ok(Some(key))
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }
    pub fn is_v6(&self) -> bool {
        self.is_v6
    }
    pub fn src_port(&self) -> u16 {
        self.src_port
    }
    pub fn dst_port(&self) -> u16 {
        self.dst_port
    }
}
