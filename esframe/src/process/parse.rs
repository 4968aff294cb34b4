use crate::codec::CodecType;
use crate::utils::errors::StreamError;

/// Borrowed view of the bytes a parser may inspect.
///
/// `bytes` always starts at the position being parsed. The flags select the
/// one-time file header check and the final flush.
#[derive(Debug, Clone, Copy)]
pub struct RawCursor<'a> {
    pub bytes: &'a [u8],
    pub begin_of_stream: bool,
    pub end_of_stream: bool,
}

impl<'a> RawCursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            begin_of_stream: false,
            end_of_stream: false,
        }
    }

    pub fn begin_of_stream(mut self, bos: bool) -> Self {
        self.begin_of_stream = bos;
        self
    }

    pub fn end_of_stream(mut self, eos: bool) -> Self {
        self.end_of_stream = eos;
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the first `n` bytes or [`StreamError::DataNotEnough`].
    pub fn peek(&self, n: usize) -> Result<&'a [u8], StreamError> {
        self.bytes.get(..n).ok_or(StreamError::DataNotEnough)
    }
}

/// Length decision of a successful parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameLen {
    /// Nothing to decode; drop `skipped_size` bytes and parse again.
    Skip,
    /// One frame of this many bytes starts at the cursor.
    Frame(usize),
    /// Header matched but the length is only known once more bytes arrive.
    Reparse,
}

/// Audio properties discovered while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    pub codec: CodecType,
    pub sample_rate: u32,
    pub channels: u8,
    pub bits_per_sample: u8,
    /// Bits per second, 0 when unknown or variable.
    pub bitrate: u32,
    /// Samples per channel carried by one frame, 0 when variable.
    pub frame_samples: u32,
}

/// Parser output for one position in the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameInfo {
    pub frame: FrameLen,
    /// Upper bound on the frame when `frame` is [`FrameLen::Reparse`], 0 if unknown.
    pub max_frame_size: usize,
    pub skipped_size: usize,
    /// Container payload length announced by a file header, 0 if unknown.
    pub total_size: u64,
    pub codec_config: Option<Vec<u8>>,
    pub stream_info: Option<StreamInfo>,
}

impl FrameInfo {
    pub fn frame(size: usize) -> Self {
        Self {
            frame: FrameLen::Frame(size),
            max_frame_size: 0,
            skipped_size: 0,
            total_size: 0,
            codec_config: None,
            stream_info: None,
        }
    }

    pub fn skip(size: usize) -> Self {
        Self {
            frame: FrameLen::Skip,
            skipped_size: size,
            ..Self::frame(0)
        }
    }

    pub fn reparse(max_frame_size: usize) -> Self {
        Self {
            frame: FrameLen::Reparse,
            max_frame_size,
            ..Self::frame(0)
        }
    }

    pub fn with_stream_info(mut self, info: StreamInfo) -> Self {
        self.stream_info = Some(info);
        self
    }

    pub fn with_codec_config(mut self, config: Vec<u8>) -> Self {
        self.codec_config = Some(config);
        self
    }

    pub fn with_total_size(mut self, total_size: u64) -> Self {
        self.total_size = total_size;
        self
    }
}

/// Finds frame boundaries in a byte stream.
///
/// Implementations inspect the cursor and decide whether a frame starts
/// there, how much to skip, or whether more data is needed. They never
/// buffer input themselves; cross-chunk buffering is the dispatcher's job.
///
/// A parser may remember facts learned from the file header on the
/// begin-of-stream call (block alignment, for instance), but parsing the same
/// bytes with the same flags must always give the same [`FrameInfo`].
///
/// # Errors
///
/// * [`StreamError::DataNotEnough`] - too few bytes to evaluate the header
/// * [`StreamError::WrongHeader`] - no frame signature at the cursor
/// * [`StreamError::NotContinue`] - mandatory file header missing
/// * [`StreamError::NotSupported`] - recognised but unsupported stream
pub trait FrameParser: Send {
    fn parse(&mut self, cursor: &RawCursor<'_>) -> Result<FrameInfo, StreamError>;

    fn name(&self) -> &'static str;
}

/// Size of an ID3v2 tag starting at `bytes`, including header and footer.
pub(crate) fn id3v2_tag_len(bytes: &[u8]) -> Result<Option<usize>, StreamError> {
    if bytes.len() < 3 {
        return if b"ID3".starts_with(bytes) {
            Err(StreamError::DataNotEnough)
        } else {
            Ok(None)
        };
    }
    if &bytes[..3] != b"ID3" {
        return Ok(None);
    }
    let header = bytes.get(..10).ok_or(StreamError::DataNotEnough)?;
    if header[6..10].iter().any(|b| b & 0x80 != 0) {
        return Err(StreamError::WrongHeader);
    }
    let size = header[6..10]
        .iter()
        .fold(0usize, |acc, &b| (acc << 7) | b as usize);
    let footer = if header[5] & 0x10 != 0 { 10 } else { 0 };

    Ok(Some(10 + size + footer))
}

#[test]
fn id3v2_len() {
    let tag = [b'I', b'D', b'3', 4, 0, 0x10, 0, 0, 0x01, 0x7F];
    assert_eq!(id3v2_tag_len(&tag).unwrap(), Some(10 + 255 + 10));
    assert_eq!(id3v2_tag_len(b"ID").unwrap_err(), StreamError::DataNotEnough);
    assert_eq!(id3v2_tag_len(b"ID3\x04").unwrap_err(), StreamError::DataNotEnough);
    assert_eq!(id3v2_tag_len(&[0xFF, 0xFB, 0x90]).unwrap(), None);
}
