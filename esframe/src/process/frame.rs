use crate::utils::errors::DecodeError;

/// Caller-owned output buffer shared by every codec and the dispatcher.
///
/// The usable capacity is `buffer.len()`. A codec that cannot fit its output
/// sets [`needed_size`](Self::needed_size), returns
/// [`DecodeError::BufferNotEnough`] and writes nothing. The caller grows the
/// buffer with [`grow_to`](Self::grow_to) and retries with the same input.
///
/// ```rust
/// use esframe::process::frame::OutputFrame;
///
/// let mut out = OutputFrame::with_capacity(10);
/// out.needed_size = 40;
/// out.grow_to(out.needed_size);
/// assert_eq!(out.capacity(), 40);
/// ```
#[derive(Debug, Default, Clone)]
pub struct OutputFrame {
    pub buffer: Vec<u8>,
    /// Valid bytes at the front of `buffer` after a successful call.
    pub decoded_size: usize,
    /// Sufficient capacity, meaningful only after `BufferNotEnough`.
    pub needed_size: usize,
}

impl OutputFrame {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: vec![0; capacity],
            decoded_size: 0,
            needed_size: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Decoded bytes of the last successful call.
    pub fn decoded(&self) -> &[u8] {
        &self.buffer[..self.decoded_size.min(self.buffer.len())]
    }

    /// Grows the buffer to at least `capacity` bytes. Never shrinks.
    pub fn grow_to(&mut self, capacity: usize) {
        if capacity > self.buffer.len() {
            self.buffer.resize(capacity, 0);
        }
    }

    /// Checks that `needed` bytes fit, recording the shortfall otherwise.
    ///
    /// Codec wrappers call this before writing so that an undersized buffer
    /// is never partially written.
    pub fn reserve(&mut self, needed: usize) -> Result<&mut [u8], DecodeError> {
        if needed > self.buffer.len() {
            self.needed_size = needed;
            self.decoded_size = 0;
            return Err(DecodeError::BufferNotEnough { needed });
        }
        self.needed_size = 0;
        Ok(&mut self.buffer[..needed])
    }
}

/// Result of one successful codec call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DecodeInfo {
    /// Input bytes used by this call, never more than were offered.
    pub consumed: usize,
    pub decoded_size: usize,
    pub sample_rate: u32,
    pub channels: u8,
    pub bits_per_sample: u8,
}

/// Input of one dispatcher call.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawInput<'a> {
    pub data: &'a [u8],
    /// No bytes follow `data`; flush whatever can still be extracted.
    pub end_of_stream: bool,
    /// The next frame is known lost; ask the codec to conceal it.
    pub frame_recover: bool,
}

impl<'a> RawInput<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            ..Default::default()
        }
    }

    pub fn eos(data: &'a [u8]) -> Self {
        Self {
            data,
            end_of_stream: true,
            frame_recover: false,
        }
    }

    pub fn recover() -> Self {
        Self {
            data: &[],
            end_of_stream: false,
            frame_recover: true,
        }
    }
}

#[test]
fn reserve_reports_needed_size() {
    let mut out = OutputFrame::with_capacity(10);
    assert_eq!(
        out.reserve(40).unwrap_err(),
        DecodeError::BufferNotEnough { needed: 40 }
    );
    assert_eq!(out.needed_size, 40);

    out.grow_to(out.needed_size);
    assert_eq!(out.reserve(40).unwrap().len(), 40);
    assert_eq!(out.needed_size, 0);

    out.grow_to(8);
    assert_eq!(out.capacity(), 40);
}
