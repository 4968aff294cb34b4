/// Frame boundary detection.
///
/// Defines the [`FrameParser`](parse::FrameParser) protocol and the
/// [`RawCursor`](parse::RawCursor) / [`FrameInfo`](parse::FrameInfo) types it
/// exchanges with the dispatcher.
pub mod parse;

/// Buffers shared between codecs and callers.
pub mod frame;

/// The chunk-in, frame-out decode loop.
///
/// Provides [`SimpleDecoder`](dispatch::SimpleDecoder), which joins a parser,
/// a codec from the registry and a carry-over cache.
pub mod dispatch;

/// A 16-bit mono 8 kHz WAVE file holding four samples.
pub const EXAMPLE_DATA: &[u8] = &[
    0x52, 0x49, 0x46, 0x46, 0x2C, 0x00, 0x00, 0x00, 0x57, 0x41, 0x56, 0x45, 0x66, 0x6D, 0x74, 0x20,
    0x10, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x40, 0x1F, 0x00, 0x00, 0x80, 0x3E, 0x00, 0x00,
    0x02, 0x00, 0x10, 0x00, 0x64, 0x61, 0x74, 0x61, 0x08, 0x00, 0x00, 0x00, 0x01, 0x00, 0x02, 0x00,
    0x03, 0x00, 0x04, 0x00,
];
