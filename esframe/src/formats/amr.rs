//! AMR-NB / AMR-WB storage format (RFC 4867 §5).
//!
//! A file starts with a magic line followed by frames of one TOC byte plus
//! speech bits whose length depends only on the frame type.

use crate::codec::CodecType;
use crate::process::parse::{FrameInfo, FrameParser, RawCursor, StreamInfo};
use crate::utils::errors::StreamError;

pub const AMR_NB_MAGIC: &[u8] = b"#!AMR\n";
pub const AMR_WB_MAGIC: &[u8] = b"#!AMR-WB\n";

/// Frame size in bytes (TOC included) per frame type, 0 for reserved types.
const NB_FRAME_BYTES: [usize; 16] = [13, 14, 16, 18, 20, 21, 27, 32, 6, 0, 0, 0, 0, 0, 0, 1];
const WB_FRAME_BYTES: [usize; 16] = [18, 24, 33, 37, 41, 47, 51, 59, 61, 6, 0, 0, 0, 0, 1, 1];

const NB_BITRATES: [u32; 8] = [4750, 5150, 5900, 6700, 7400, 7950, 10200, 12200];
const WB_BITRATES: [u32; 9] = [6600, 8850, 12650, 14250, 15850, 18250, 19850, 23050, 23850];

#[derive(Debug, Clone, Copy)]
pub struct AmrParser {
    wideband: bool,
    expect_magic: bool,
}

impl AmrParser {
    pub fn narrowband() -> Self {
        Self {
            wideband: false,
            expect_magic: true,
        }
    }

    pub fn wideband() -> Self {
        Self {
            wideband: true,
            expect_magic: true,
        }
    }

    /// Accepts bare frames without the file magic.
    pub fn without_magic(mut self) -> Self {
        self.expect_magic = false;
        self
    }

    fn magic(&self) -> &'static [u8] {
        if self.wideband { AMR_WB_MAGIC } else { AMR_NB_MAGIC }
    }

    fn stream_info(&self, frame_type: usize) -> StreamInfo {
        let (codec, sample_rate, frame_samples, bitrate) = if self.wideband {
            (CodecType::AmrWb, 16_000, 320, WB_BITRATES.get(frame_type))
        } else {
            (CodecType::AmrNb, 8_000, 160, NB_BITRATES.get(frame_type))
        };
        StreamInfo {
            codec,
            sample_rate,
            channels: 1,
            bits_per_sample: 16,
            bitrate: bitrate.copied().unwrap_or(0),
            frame_samples,
        }
    }
}

impl FrameParser for AmrParser {
    fn parse(&mut self, cursor: &RawCursor<'_>) -> Result<FrameInfo, StreamError> {
        if cursor.begin_of_stream && self.expect_magic {
            let magic = self.magic();
            return match cursor.peek(magic.len()) {
                Ok(head) if head == magic => {
                    Ok(FrameInfo::skip(magic.len()).with_stream_info(self.stream_info(usize::MAX)))
                }
                Err(_) if magic.starts_with(cursor.bytes) => Err(StreamError::DataNotEnough),
                _ => Err(StreamError::NotContinue),
            };
        }

        let toc = cursor.peek(1)?[0];
        if toc & 0x83 != 0 {
            return Err(StreamError::WrongHeader);
        }
        let frame_type = ((toc >> 3) & 0x0F) as usize;
        let table = if self.wideband {
            &WB_FRAME_BYTES
        } else {
            &NB_FRAME_BYTES
        };
        let size = table[frame_type];
        if size == 0 {
            return Err(StreamError::WrongHeader);
        }
        cursor.peek(size)?;

        Ok(FrameInfo::frame(size).with_stream_info(self.stream_info(frame_type)))
    }

    fn name(&self) -> &'static str {
        if self.wideband { "amr-wb" } else { "amr-nb" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::parse::FrameLen;

    fn stream() -> Vec<u8> {
        let mut data = AMR_NB_MAGIC.to_vec();
        data.push(0x04);
        data.extend_from_slice(&[0xAB; 12]);
        data
    }

    #[test]
    fn header_then_frame() {
        let data = stream();
        let mut parser = AmrParser::narrowband();

        let info = parser
            .parse(&RawCursor::new(&data).begin_of_stream(true))
            .unwrap();
        assert_eq!(info.frame, FrameLen::Skip);
        assert_eq!(info.skipped_size, 6);

        let info = parser.parse(&RawCursor::new(&data[6..])).unwrap();
        assert_eq!(info.frame, FrameLen::Frame(13));
        assert_eq!(info.stream_info.unwrap().bitrate, 4750);
    }

    #[test]
    fn missing_magic_stops_stream() {
        let mut parser = AmrParser::wideband();
        let cursor = RawCursor::new(AMR_NB_MAGIC).begin_of_stream(true);
        assert_eq!(parser.parse(&cursor).unwrap_err(), StreamError::NotContinue);

        let cursor = RawCursor::new(b"#!AMR").begin_of_stream(true);
        assert_eq!(parser.parse(&cursor).unwrap_err(), StreamError::DataNotEnough);
    }

    #[test]
    fn partial_and_invalid_frames() {
        let mut parser = AmrParser::wideband().without_magic();
        let cursor = RawCursor::new(&[0x44, 0, 0]).begin_of_stream(true);
        assert_eq!(parser.parse(&cursor).unwrap_err(), StreamError::DataNotEnough);

        let cursor = RawCursor::new(&[0x84]);
        assert_eq!(parser.parse(&cursor).unwrap_err(), StreamError::WrongHeader);

        let cursor = RawCursor::new(&[0x7C]);
        assert_eq!(parser.parse(&cursor).unwrap().frame, FrameLen::Frame(1));
    }
}
