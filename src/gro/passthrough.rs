use crate::error::{Error, Result};
use crate::gro::{FlowKey, GroDevice, GroFlags};
use crate::transport::PacketWriter;
use bytes::Bytes;
use std::sync::{Mutex, MutexGuard};

/// A device without receive offload. Every enqueued packet is written out on
/// its own straight away, so there is never anything to flush.
pub struct PassthroughGro<W> {
    writer: W,
    // None once closed
    flags: Mutex<Option<GroFlags>>,
}

impl<W: PacketWriter> PassthroughGro<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            flags: Mutex::new(Some(GroFlags::all())),
        }
    }
    fn lock(&self) -> MutexGuard<'_, Option<GroFlags>> {
        self.flags
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
    /// The protocols still flagged for aggregation, or `None` once closed.
    pub fn flags(&self) -> Option<GroFlags> {
        *self.lock()
    }
    pub fn writer(&self) -> &W {
        &self.writer
    }
}

impl<W: PacketWriter> GroDevice for PassthroughGro<W> {
    fn disable_udp_gro(&self) {
        if let Some(flags) = self.lock().as_mut() {
            flags.remove(GroFlags::UDP);
        }
    }
    fn disable_tcp_gro(&self) {
        if let Some(flags) = self.lock().as_mut() {
            flags.remove(GroFlags::TCP);
        }
    }
    fn write(&self, bufs: &[&[u8]], offset: usize) -> Result<usize> {
        let guard = self.lock();
        if guard.is_none() {
            return Err(Error::SessionClosed);
        }
        self.writer
            .send_multiple(bufs, offset)
            .map_err(Error::TransportWrite)
    }
    fn enqueue(&self, packet: Bytes) -> Result<()> {
        let guard = self.lock();
        if guard.is_none() {
            return Err(Error::SessionClosed);
        }
        FlowKey::classify(&packet)?;
        log::trace!("gro passthrough: {} bytes", packet.len());
        self.writer
            .send(&packet)
            .map(|_| ())
            .map_err(Error::TransportWrite)
    }
    fn flush(&self) -> Result<()> {
        if self.lock().is_none() {
            return Err(Error::SessionClosed);
        }
        Ok(())
    }
    fn close(&self) -> Result<()> {
        if self.lock().take().is_some() {
            log::debug!("gro passthrough session closed");
        }
        Ok(())
    }
}
