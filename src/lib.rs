/*!
Offload compatibility for Tun devices that implement neither GSO nor GRO.

Packet pipelines written against an offload-aware device keep working: a
pass-through split reports every packet as one segment without touching the
caller's buffers, and receive aggregation is either skipped or done by
batching packets per flow in userspace.

# Example:
```rust
use std::sync::Mutex;
use tun_offload::{GroDevice, GroMode, GsoOptions, GsoType, OffloadBuilder};

let dev = OffloadBuilder::new()
    .gro_mode(GroMode::Batching)
    .build(Mutex::new(Vec::<u8>::new()))?;

let packet = [0x45u8; 40];
let offset = 16;
let mut buf = vec![0u8; 1500];
buf[offset..offset + packet.len()].copy_from_slice(&packet);
let mut bufs = [buf.as_mut_slice()];
let mut sizes = [0usize];
let opts = GsoOptions {
    gso_type: GsoType::TcpV4,
    gso_size: 1400,
    ..Default::default()
};
let n = dev.split(&packet, &opts, &mut bufs, &mut sizes, offset)?;
assert_eq!(n, 1);
assert_eq!(sizes[0], packet.len());

dev.flush()?;
dev.close()?;
# Ok::<(), tun_offload::Error>(())
```
*/

#![cfg_attr(docsrs, feature(doc_cfg))]
pub use crate::builder::{GroMode, OffloadBuilder};
pub use crate::device::OffloadDevice;
pub use crate::error::{Error, Result};
pub use crate::gro::{BatchingGro, FlowKey, GroDevice, GroFlags, PassthroughGro, Transport};
pub use crate::offload::{
    gso_split, GsoOptions, GsoSplitter, GsoType, OutputBuffers, PassthroughSplitter,
    VirtioNetHdr, VIRTIO_NET_HDR_LEN,
};
pub use crate::transport::PacketWriter;

mod builder;
mod device;
mod error;
pub mod gro;
pub mod offload;
mod transport;

/// Default upper bound on packets handled in one batch.
pub const IDEAL_BATCH_SIZE: usize = 128;
