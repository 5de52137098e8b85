use crate::error::Result;
use crate::gro::GroDevice;
use crate::offload::{GsoOptions, GsoSplitter, OutputBuffers};
use std::ops::Deref;

/// The offload strategies of one device, chosen when it is built.
///
/// Derefs to its [`GroDevice`].
pub struct OffloadDevice {
    splitter: Box<dyn GsoSplitter>,
    gro: Box<dyn GroDevice>,
}

impl OffloadDevice {
    pub fn new(splitter: Box<dyn GsoSplitter>, gro: Box<dyn GroDevice>) -> Self {
        Self { splitter, gro }
    }
    /// Split `packet` into `bufs`, recording each segment length in `sizes`.
    /// The caller must already have copied the packet into `bufs[0][offset..]`.
    pub fn split(
        &self,
        packet: &[u8],
        options: &GsoOptions,
        bufs: &mut [&mut [u8]],
        sizes: &mut [usize],
        offset: usize,
    ) -> Result<usize> {
        let mut out = OutputBuffers::new(bufs, sizes, offset)?;
        self.splitter.split(packet, options, &mut out)
    }
    pub fn splitter(&self) -> &dyn GsoSplitter {
        &*self.splitter
    }
    pub fn gro(&self) -> &dyn GroDevice {
        &*self.gro
    }
}

impl Deref for OffloadDevice {
    type Target = dyn GroDevice;
    fn deref(&self) -> &Self::Target {
        &*self.gro
    }
}
