use crate::error::{Error, Result};
use crate::offload::{GsoOptions, GsoType};
use byteorder::{ByteOrder, NativeEndian};
use std::io;

pub const VIRTIO_NET_HDR_GSO_NONE: u8 = 0;
pub const VIRTIO_NET_HDR_F_NEEDS_CSUM: u8 = 1;
pub const VIRTIO_NET_HDR_GSO_TCPV4: u8 = 1;
pub const VIRTIO_NET_HDR_GSO_TCPV6: u8 = 4;
pub const VIRTIO_NET_HDR_GSO_UDP_L4: u8 = 5;

/// virtio_net_hdr as defined in include/uapi/linux/virtio_net.h. A Tun device
/// opened with IFF_VNET_HDR prepends it to every packet, in host byte order.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct VirtioNetHdr {
    pub flags: u8,
    pub gso_type: u8,
    pub hdr_len: u16,
    pub gso_size: u16,
    pub csum_start: u16,
    pub csum_offset: u16,
}

// sizeof(virtio_net_hdr)
pub const VIRTIO_NET_HDR_LEN: usize = 10;

impl VirtioNetHdr {
    pub fn decode(buf: &[u8]) -> Result<VirtioNetHdr> {
        if buf.len() < VIRTIO_NET_HDR_LEN {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "too short").into());
        }
        Ok(VirtioNetHdr {
            flags: buf[0],
            gso_type: buf[1],
            hdr_len: NativeEndian::read_u16(&buf[2..4]),
            gso_size: NativeEndian::read_u16(&buf[4..6]),
            csum_start: NativeEndian::read_u16(&buf[6..8]),
            csum_offset: NativeEndian::read_u16(&buf[8..10]),
        })
    }

    pub fn encode(&self, buf: &mut [u8]) -> Result<()> {
        if buf.len() < VIRTIO_NET_HDR_LEN {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "too short").into());
        }
        buf[0] = self.flags;
        buf[1] = self.gso_type;
        NativeEndian::write_u16(&mut buf[2..4], self.hdr_len);
        NativeEndian::write_u16(&mut buf[4..6], self.gso_size);
        NativeEndian::write_u16(&mut buf[6..8], self.csum_start);
        NativeEndian::write_u16(&mut buf[8..10], self.csum_offset);
        Ok(())
    }
}

impl TryFrom<&GsoOptions> for VirtioNetHdr {
    type Error = Error;

    fn try_from(opts: &GsoOptions) -> Result<Self> {
        let gso_type = match opts.gso_type {
            GsoType::None => VIRTIO_NET_HDR_GSO_NONE,
            GsoType::TcpV4 => VIRTIO_NET_HDR_GSO_TCPV4,
            GsoType::TcpV6 => VIRTIO_NET_HDR_GSO_TCPV6,
            GsoType::Gvisor => {
                return Err(Error::InvalidOffloadParameters(
                    "gvisor GSO has no virtio representation".to_string(),
                ))
            }
        };
        Ok(VirtioNetHdr {
            flags: if opts.needs_csum {
                VIRTIO_NET_HDR_F_NEEDS_CSUM
            } else {
                0
            },
            gso_type,
            hdr_len: opts.hdr_len,
            gso_size: opts.gso_size,
            csum_start: opts.csum_start,
            csum_offset: opts.csum_offset,
        })
    }
}

impl TryFrom<VirtioNetHdr> for GsoOptions {
    type Error = Error;

    fn try_from(hdr: VirtioNetHdr) -> Result<Self> {
        let gso_type = match hdr.gso_type {
            VIRTIO_NET_HDR_GSO_NONE => GsoType::None,
            VIRTIO_NET_HDR_GSO_TCPV4 => GsoType::TcpV4,
            VIRTIO_NET_HDR_GSO_TCPV6 => GsoType::TcpV6,
            gso_type => {
                return Err(Error::InvalidOffloadParameters(format!(
                    "unsupported virtio GSO type: {gso_type}"
                )))
            }
        };
        Ok(GsoOptions {
            gso_type,
            gso_size: hdr.gso_size,
            csum_start: hdr.csum_start,
            csum_offset: hdr.csum_offset,
            needs_csum: hdr.flags & VIRTIO_NET_HDR_F_NEEDS_CSUM != 0,
            hdr_len: hdr.hdr_len,
        })
    }
}
