use crate::error::{Error, Result};
use crate::gro::{FlowKey, GroDevice, GroFlags, Transport};
use crate::transport::PacketWriter;
use crate::IDEAL_BATCH_SIZE;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Receive aggregation in userspace.
///
/// Packets of one TCP or UDP flow are held until [`GroDevice::flush`] and then
/// handed to the writer together, in a single `send_multiple` call. Packets
/// that cannot be aggregated still wait for the flush but go out in a call of
/// their own. Batches leave in the order their first packet arrived.
pub struct BatchingGro<W> {
    writer: W,
    max_batch: usize,
    // None once closed
    session: Mutex<Option<Session>>,
}

struct Session {
    flags: GroFlags,
    batches: Vec<Vec<Bytes>>,
    /// batches still accepting packets, by flow
    open: HashMap<FlowKey, usize>,
    batch_pool: Vec<Vec<Bytes>>,
}

impl Session {
    fn new(flags: GroFlags) -> Self {
        Session {
            flags,
            batches: Vec::with_capacity(IDEAL_BATCH_SIZE),
            open: HashMap::with_capacity(IDEAL_BATCH_SIZE),
            batch_pool: Vec::new(),
        }
    }
    fn new_batch(&mut self, packet: Bytes) -> usize {
        let mut batch = self.batch_pool.pop().unwrap_or_default();
        batch.push(packet);
        self.batches.push(batch);
        self.batches.len() - 1
    }
    fn push(&mut self, key: Option<FlowKey>, packet: Bytes, max_batch: usize) {
        let Some(key) = key else {
            self.new_batch(packet);
            return;
        };
        match self.open.get(&key) {
            Some(&index) => {
                let batch = &mut self.batches[index];
                batch.push(packet);
                if batch.len() >= max_batch {
                    self.open.remove(&key);
                }
            }
            None => {
                let index = self.new_batch(packet);
                if max_batch > 1 {
                    self.open.insert(key, index);
                }
            }
        }
    }
    fn disable(&mut self, flag: GroFlags, transport: Transport) {
        self.flags.remove(flag);
        self.open.retain(|key, _| key.transport() != transport);
    }
    fn recycle(&mut self, batches: Vec<Vec<Bytes>>) {
        for mut batch in batches {
            if self.batch_pool.len() == IDEAL_BATCH_SIZE {
                break;
            }
            batch.clear();
            self.batch_pool.push(batch);
        }
    }
    fn pending(&self) -> usize {
        self.batches.iter().map(Vec::len).sum()
    }
}

impl<W: PacketWriter> BatchingGro<W> {
    /// UDP and TCP aggregation enabled, batches of up to [`IDEAL_BATCH_SIZE`].
    pub fn new(writer: W) -> Self {
        Self::with_config(writer, GroFlags::all(), IDEAL_BATCH_SIZE)
    }
    pub(crate) fn with_config(writer: W, flags: GroFlags, max_batch: usize) -> Self {
        Self {
            writer,
            max_batch,
            session: Mutex::new(Some(Session::new(flags))),
        }
    }
    fn lock(&self) -> MutexGuard<'_, Option<Session>> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
    /// The protocols being aggregated, or `None` once closed.
    pub fn flags(&self) -> Option<GroFlags> {
        self.lock().as_ref().map(|session| session.flags)
    }
    /// Number of packets waiting for a flush.
    pub fn pending(&self) -> usize {
        self.lock().as_ref().map_or(0, Session::pending)
    }
    pub fn max_batch(&self) -> usize {
        self.max_batch
    }
    pub fn writer(&self) -> &W {
        &self.writer
    }
}

impl<W: PacketWriter> GroDevice for BatchingGro<W> {
    fn disable_udp_gro(&self) {
        if let Some(session) = self.lock().as_mut() {
            session.disable(GroFlags::UDP, Transport::Udp);
            log::debug!("udp gro disabled");
        }
    }
    fn disable_tcp_gro(&self) {
        if let Some(session) = self.lock().as_mut() {
            session.disable(GroFlags::TCP, Transport::Tcp);
            log::debug!("tcp gro disabled");
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
        let mut guard = self.lock();
        let session = guard.as_mut().ok_or(Error::SessionClosed)?;
        let key = FlowKey::classify(&packet)?.filter(|key| session.flags.allows(key.transport()));
        log::trace!("gro enqueue: {} bytes, flow {key:?}", packet.len());
        session.push(key, packet, self.max_batch);
        Ok(())
    }
    fn flush(&self) -> Result<()> {
        let mut guard = self.lock();
        let session = guard.as_mut().ok_or(Error::SessionClosed)?;
        session.open.clear();
        let batches = std::mem::take(&mut session.batches);
        let mut bufs: Vec<&[u8]> = Vec::with_capacity(IDEAL_BATCH_SIZE);
        let mut err = Ok(());
        for batch in &batches {
            bufs.clear();
            bufs.extend(batch.iter().map(|packet| packet.as_ref()));
            if let Err(e) = self.writer.send_multiple(&bufs, 0) {
                log::warn!("flush of {} packets failed: {e}", bufs.len());
                if err.is_ok() {
                    err = Err(Error::TransportWrite(e));
                }
            }
        }
        log::debug!("gro flush: {} batches", batches.len());
        drop(bufs);
        session.recycle(batches);
        err
    }
    fn close(&self) -> Result<()> {
        if let Some(session) = self.lock().take() {
            let pending = session.pending();
            if pending > 0 {
                log::warn!("gro session closed with {pending} unflushed packets, discarding");
            }
            log::debug!("gro session closed");
        }
        Ok(())
    }
}
