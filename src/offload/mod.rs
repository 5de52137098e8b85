//! Egress offload: the segmentation descriptor attached to an outbound packet
//! and the split operation that consumes it.

mod split;
mod virtio;

pub use self::split::{gso_split, GsoSplitter, OutputBuffers, PassthroughSplitter};
pub use self::virtio::{
    VirtioNetHdr, VIRTIO_NET_HDR_F_NEEDS_CSUM, VIRTIO_NET_HDR_GSO_NONE,
    VIRTIO_NET_HDR_GSO_TCPV4, VIRTIO_NET_HDR_GSO_TCPV6, VIRTIO_NET_HDR_GSO_UDP_L4,
    VIRTIO_NET_HDR_LEN,
};

use crate::error::{Error, Result};

/// The segmentation scheme the sender intended for a packet.
#[derive(Clone, Copy, Default, Debug, Eq, PartialEq, Hash)]
pub enum GsoType {
    /// No segmentation requested.
    #[default]
    None,
    TcpV4,
    TcpV6,
    /// Segmentation is left to a userspace network stack.
    Gvisor,
}

impl GsoType {
    /// Whether a real offload implementation is expected to act on the packet.
    pub fn is_offload(&self) -> bool {
        *self != GsoType::None
    }
}

/// Generic segmentation offload options for one outbound packet.
///
/// The fields are carried through untouched for implementations that perform
/// real segmentation. `csum_offset` is relative to `csum_start`.
#[derive(Clone, Copy, Default, Debug, Eq, PartialEq)]
pub struct GsoOptions {
    pub gso_type: GsoType,
    pub gso_size: u16,
    pub csum_start: u16,
    pub csum_offset: u16,
    pub needs_csum: bool,
    pub hdr_len: u16,
}

impl GsoOptions {
    /// Check that `gso_size` describes a usable split of a packet of
    /// `packet_len` bytes.
    pub fn check_segmentable(&self, packet_len: usize) -> Result<()> {
        if self.gso_size == 0 {
            return Err(Error::InvalidOffloadParameters(
                "gso_size is zero".to_string(),
            ));
        }
        if self.gso_size as usize > packet_len {
            return Err(Error::InvalidOffloadParameters(format!(
                "gso_size ({}) larger than packet ({packet_len})",
                self.gso_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_is_none() {
        let opts = GsoOptions::default();
        assert_eq!(opts.gso_type, GsoType::None);
        assert!(!opts.gso_type.is_offload());
        assert!(GsoType::TcpV6.is_offload());
    }

    #[test]
    fn segmentable() {
        let mut opts = GsoOptions {
            gso_type: GsoType::TcpV4,
            gso_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            opts.check_segmentable(100),
            Err(Error::InvalidOffloadParameters(_))
        ));
        opts.gso_size = 101;
        assert!(matches!(
            opts.check_segmentable(100),
            Err(Error::InvalidOffloadParameters(_))
        ));
        opts.gso_size = 100;
        assert!(opts.check_segmentable(100).is_ok());
    }
}
