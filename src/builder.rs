use crate::device::OffloadDevice;
use crate::error::{Error, Result};
use crate::gro::{BatchingGro, GroDevice, GroFlags, PassthroughGro};
use crate::offload::{GsoSplitter, PassthroughSplitter};
use crate::transport::PacketWriter;
use crate::IDEAL_BATCH_SIZE;

/// Receive aggregation strategy of a device.
#[derive(Clone, Copy, Default, Debug, Eq, PartialEq)]
pub enum GroMode {
    /// Write every packet as soon as it is enqueued.
    #[default]
    Passthrough,
    /// Hold packets per flow until flushed, see [`BatchingGro`].
    Batching,
}

/// Resolved receive aggregation settings.
#[derive(Clone, Copy, Debug)]
pub(crate) struct GroConfig {
    pub mode: GroMode,
    pub flags: GroFlags,
    pub max_batch: usize,
}

/// Builder for the offload strategies of one device.
#[derive(Default)]
pub struct OffloadBuilder {
    gro_mode: Option<GroMode>,
    udp_gro: Option<bool>,
    tcp_gro: Option<bool>,
    max_batch: Option<usize>,
    splitter: Option<Box<dyn GsoSplitter>>,
}

impl OffloadBuilder {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn gro_mode(mut self, mode: GroMode) -> Self {
        self.gro_mode = Some(mode);
        self
    }
    /// UDP aggregation, enabled by default.
    pub fn udp_gro(mut self, enable: bool) -> Self {
        self.udp_gro = Some(enable);
        self
    }
    /// TCP aggregation, enabled by default.
    pub fn tcp_gro(mut self, enable: bool) -> Self {
        self.tcp_gro = Some(enable);
        self
    }
    /// Most packets written in one batch. Defaults to [`IDEAL_BATCH_SIZE`].
    pub fn max_batch(mut self, max_batch: usize) -> Self {
        self.max_batch = Some(max_batch);
        self
    }
    /// Replace the pass-through splitter, for backends that really segment.
    pub fn splitter<S: GsoSplitter + 'static>(mut self, splitter: S) -> Self {
        self.splitter = Some(Box::new(splitter));
        self
    }
    pub(crate) fn build_config(&mut self) -> Result<GroConfig> {
        let max_batch = self.max_batch.unwrap_or(IDEAL_BATCH_SIZE);
        if max_batch == 0 {
            return Err(Error::InvalidConfig("max_batch must be nonzero".to_string()));
        }
        let mut flags = GroFlags::empty();
        flags.set(GroFlags::UDP, self.udp_gro.unwrap_or(true));
        flags.set(GroFlags::TCP, self.tcp_gro.unwrap_or(true));
        Ok(GroConfig {
            mode: self.gro_mode.unwrap_or_default(),
            flags,
            max_batch,
        })
    }
    /// Build only the receive aggregation side.
    pub fn build_gro<W: PacketWriter + 'static>(mut self, writer: W) -> Result<Box<dyn GroDevice>> {
        let config = self.build_config()?;
        log::debug!("gro config: {config:?}");
        let gro: Box<dyn GroDevice> = match config.mode {
            GroMode::Passthrough => Box::new(PassthroughGro::new(writer)),
            GroMode::Batching => Box::new(BatchingGro::with_config(
                writer,
                config.flags,
                config.max_batch,
            )),
        };
        if !config.flags.contains(GroFlags::UDP) {
            gro.disable_udp_gro();
        }
        if !config.flags.contains(GroFlags::TCP) {
            gro.disable_tcp_gro();
        }
        Ok(gro)
    }
    pub fn build<W: PacketWriter + 'static>(mut self, writer: W) -> Result<OffloadDevice> {
        let splitter: Box<dyn GsoSplitter> = match self.splitter.take() {
            Some(splitter) => splitter,
            None => Box::new(PassthroughSplitter),
        };
        let gro = self.build_gro(writer)?;
        Ok(OffloadDevice::new(splitter, gro))
    }
}
