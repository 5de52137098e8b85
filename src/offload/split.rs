use crate::error::{Error, Result};
use crate::offload::GsoOptions;

/// A caller-owned set of output buffers and their parallel size slots.
///
/// Segments are written into `bufs[i][offset..]`. The view only hands out the
/// contents of each buffer, never the slot holding it, so an implementation
/// cannot swap a caller's buffer for another one. Callers on a drop path may
/// skip reassigning their buffers and rely on that.
pub struct OutputBuffers<'a, 'b> {
    bufs: &'a mut [&'b mut [u8]],
    sizes: &'a mut [usize],
    offset: usize,
}

impl<'a, 'b> OutputBuffers<'a, 'b> {
    /// Pairs buffer `i` with `sizes[i]`. Buffers without a size slot, and
    /// size slots without a buffer, are left out of the view.
    ///
    /// Fails with [`Error::MismatchedBuffers`] only when there are buffers but
    /// no size slot at all.
    pub fn new(
        bufs: &'a mut [&'b mut [u8]],
        sizes: &'a mut [usize],
        offset: usize,
    ) -> Result<Self> {
        if !bufs.is_empty() && sizes.is_empty() {
            return Err(Error::MismatchedBuffers {
                bufs: bufs.len(),
                sizes: 0,
            });
        }
        Ok(Self { bufs, sizes, offset })
    }
    /// Number of usable segments: buffers that have a size slot.
    pub fn len(&self) -> usize {
        self.bufs.len().min(self.sizes.len())
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    pub fn offset(&self) -> usize {
        self.offset
    }
    /// Bytes available in buffer `index` past the offset.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`. So do the other per-segment accessors.
    pub fn capacity(&self, index: usize) -> usize {
        self.buf(index).len().saturating_sub(self.offset)
    }
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn check_capacity(&self, index: usize, len: usize) -> Result<()> {
        let capacity = self.capacity(index);
        if len > capacity {
            return Err(Error::BufferTooSmall {
                index,
                needed: len,
                capacity,
            });
        }
        Ok(())
    }
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn segment(&self, index: usize) -> &[u8] {
        let buf = self.buf(index);
        &buf[self.offset.min(buf.len())..]
    }
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn segment_mut(&mut self, index: usize) -> &mut [u8] {
        let len = self.len();
        let buf = &mut *self.bufs[..len][index];
        let start = self.offset.min(buf.len());
        &mut buf[start..]
    }
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn size(&self, index: usize) -> usize {
        self.sizes[..self.len()][index]
    }
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn set_size(&mut self, index: usize, len: usize) {
        let n = self.len();
        self.sizes[..n][index] = len;
    }
    fn buf(&self, index: usize) -> &[u8] {
        &self.bufs[..self.len()][index]
    }
}

/// Splits one outbound packet into wire-sized segments.
///
/// An implementation writes segment `i` into `out.segment_mut(i)` and its
/// length into `out.set_size(i, ..)`, returning the number of segments.
/// Implementations that really segment should reject unusable options with
/// [`Error::InvalidOffloadParameters`] and short buffers with
/// [`Error::BufferTooSmall`].
pub trait GsoSplitter: Send + Sync {
    fn split(
        &self,
        packet: &[u8],
        options: &GsoOptions,
        out: &mut OutputBuffers<'_, '_>,
    ) -> Result<usize>;
}

/// The splitter for devices without offload support: every packet is a single
/// segment, whatever `GsoType` was requested.
#[derive(Clone, Copy, Default, Debug)]
pub struct PassthroughSplitter;

impl GsoSplitter for PassthroughSplitter {
    fn split(
        &self,
        packet: &[u8],
        options: &GsoOptions,
        out: &mut OutputBuffers<'_, '_>,
    ) -> Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        // The caller already copied the packet into bufs[0][offset..]; only
        // the size is ours to record.
        out.set_size(0, packet.len());
        log::trace!(
            "gso passthrough: {} bytes, requested {:?}",
            packet.len(),
            options.gso_type
        );
        Ok(1)
    }
}

/// gsoSplit for devices without offload support. `bufs[0][offset..]` must
/// already hold `packet`; only `sizes[0]` is written. Any number of size slots
/// from one upwards is accepted.
pub fn gso_split(
    packet: &[u8],
    options: &GsoOptions,
    bufs: &mut [&mut [u8]],
    sizes: &mut [usize],
    offset: usize,
) -> Result<usize> {
    let mut out = OutputBuffers::new(bufs, sizes, offset)?;
    PassthroughSplitter.split(packet, options, &mut out)
}
