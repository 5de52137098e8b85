//! Ingress offload: devices that aggregate received packets before writing
//! them out.

mod batching;
mod flow;
mod passthrough;

pub use self::batching::BatchingGro;
pub use self::flow::{FlowKey, Transport};
pub use self::passthrough::PassthroughGro;

use crate::error::Result;
use bytes::Bytes;

bitflags::bitflags! {
    /// Protocols for which aggregation is enabled.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct GroFlags: u8 {
        const UDP = 1;
        const TCP = 1 << 1;
    }
}

impl GroFlags {
    pub(crate) fn allows(&self, transport: Transport) -> bool {
        match transport {
            Transport::Tcp => self.contains(GroFlags::TCP),
            Transport::Udp => self.contains(GroFlags::UDP),
        }
    }
}

/// A device backend taking part in receive-side aggregation.
///
/// A session starts open and ends with [`GroDevice::close`], which is
/// terminal. Afterwards `write`, `enqueue` and `flush` fail with
/// [`Error::SessionClosed`](crate::Error::SessionClosed) and `close` returns
/// `Ok(())` again. Implementations serialize every call on one session.
pub trait GroDevice: Send + Sync {
    /// Stop aggregating UDP packets enqueued from now on.
    fn disable_udp_gro(&self);
    /// Stop aggregating TCP packets enqueued from now on.
    fn disable_tcp_gro(&self);
    /// Write already assembled packets, each starting at `offset` in its
    /// buffer. Returns the number of packets written.
    fn write(&self, bufs: &[&[u8]], offset: usize) -> Result<usize>;
    /// Hand one received IP packet to the session.
    fn enqueue(&self, packet: Bytes) -> Result<()>;
    /// Emit every packet held for aggregation.
    fn flush(&self) -> Result<()>;
    fn close(&self) -> Result<()>;
}

impl<T: GroDevice + ?Sized> GroDevice for Box<T> {
    fn disable_udp_gro(&self) {
        (**self).disable_udp_gro()
    }
    fn disable_tcp_gro(&self) {
        (**self).disable_tcp_gro()
    }
    fn write(&self, bufs: &[&[u8]], offset: usize) -> Result<usize> {
        (**self).write(bufs, offset)
    }
    fn enqueue(&self, packet: Bytes) -> Result<()> {
        (**self).enqueue(packet)
    }
    fn flush(&self) -> Result<()> {
        (**self).flush()
    }
    fn close(&self) -> Result<()> {
        (**self).close()
    }
}
