//! MPEG-1/2/2.5 audio layer I/II/III frames.

use crate::codec::CodecType;
use crate::process::parse::{FrameInfo, FrameParser, RawCursor, StreamInfo, id3v2_tag_len};
use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::StreamError;

/// Upper bound of a free-format frame (layer III, 640 kbit/s at 32 kHz).
pub const MAX_FREE_FORMAT_BYTES: usize = 2881;

const ID3V1_LEN: usize = 128;

/// Compares sync, version, layer, bitrate index and sampling rate.
const FREE_FORMAT_MASK: u32 = 0xFFFE_FC00;

const BITRATES_V1: [[u32; 15]; 3] = [
    [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448],
    [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384],
    [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320],
];

const BITRATES_V2: [[u32; 15]; 2] = [
    [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256],
    [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpegVersion {
    V1,
    V2,
    V25,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mp3Header {
    pub raw: u32,
    pub version: MpegVersion,
    /// 1, 2 or 3.
    pub layer: u8,
    pub bitrate_kbps: u32,
    pub sample_rate: u32,
    pub padding: bool,
    pub channels: u8,
}

impl Mp3Header {
    pub fn read(bytes: &[u8]) -> Result<Self, StreamError> {
        let head = bytes.get(..4).ok_or(StreamError::DataNotEnough)?;
        let raw = u32::from_be_bytes([head[0], head[1], head[2], head[3]]);
        let reader = &mut BsIoSliceReader::from_slice(head);
        let mut bits = |n: u32| -> Result<u32, StreamError> {
            reader.get_n::<u32>(n).map_err(|_| StreamError::DataNotEnough)
        };

        if bits(11)? != 0x7FF {
            return Err(StreamError::WrongHeader);
        }
        let version = match bits(2)? {
            0 => MpegVersion::V25,
            2 => MpegVersion::V2,
            3 => MpegVersion::V1,
            _ => return Err(StreamError::WrongHeader),
        };
        let layer = match bits(2)? {
            1 => 3,
            2 => 2,
            3 => 1,
            _ => return Err(StreamError::WrongHeader),
        };
        let _protection = bits(1)?;
        let bitrate_index = bits(4)? as usize;
        let rate_index = bits(2)? as usize;
        let padding = bits(1)? == 1;
        let _private = bits(1)?;
        let mode = bits(2)?;

        if bitrate_index == 15 || rate_index == 3 {
            return Err(StreamError::WrongHeader);
        }

        let bitrate_kbps = match (version, layer) {
            (MpegVersion::V1, l) => BITRATES_V1[l as usize - 1][bitrate_index],
            (_, 1) => BITRATES_V2[0][bitrate_index],
            _ => BITRATES_V2[1][bitrate_index],
        };
        let base_rate = [44100, 48000, 32000][rate_index];
        let sample_rate = match version {
            MpegVersion::V1 => base_rate,
            MpegVersion::V2 => base_rate / 2,
            MpegVersion::V25 => base_rate / 4,
        };

        Ok(Self {
            raw,
            version,
            layer,
            bitrate_kbps,
            sample_rate,
            padding,
            channels: if mode == 3 { 1 } else { 2 },
        })
    }

    pub fn is_free_format(&self) -> bool {
        self.bitrate_kbps == 0
    }

    pub fn frame_samples(&self) -> u32 {
        match (self.layer, self.version) {
            (1, _) => 384,
            (2, _) | (3, MpegVersion::V1) => 1152,
            _ => 576,
        }
    }

    /// Frame length in bytes, `None` for free-format frames.
    pub fn frame_len(&self) -> Option<usize> {
        if self.is_free_format() {
            return None;
        }
        let bitrate = self.bitrate_kbps as usize * 1000;
        let rate = self.sample_rate as usize;
        let pad = self.padding as usize;
        let len = match (self.layer, self.version) {
            (1, _) => (12 * bitrate / rate + pad) * 4,
            (3, MpegVersion::V2 | MpegVersion::V25) => 72 * bitrate / rate + pad,
            _ => 144 * bitrate / rate + pad,
        };
        Some(len)
    }

    /// Whether `other` can be the next frame of a free-format stream.
    fn continues_free_format(&self, other: u32) -> bool {
        other & FREE_FORMAT_MASK == self.raw & FREE_FORMAT_MASK
    }

    fn stream_info(&self, frame_len: usize) -> StreamInfo {
        let bitrate = if self.is_free_format() {
            (frame_len as u64 * 8 * self.sample_rate as u64 / self.frame_samples() as u64) as u32
        } else {
            self.bitrate_kbps * 1000
        };
        StreamInfo {
            codec: CodecType::Mp3,
            sample_rate: self.sample_rate,
            channels: self.channels,
            bits_per_sample: 16,
            bitrate,
            frame_samples: self.frame_samples(),
        }
    }
}

/// Frame parser for MP3 (and MP1/MP2) elementary streams.
///
/// Free-format frames carry no length, so the parser asks for a reparse until
/// the next matching header shows where the frame ends.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mp3Parser;

impl FrameParser for Mp3Parser {
    fn parse(&mut self, cursor: &RawCursor<'_>) -> Result<FrameInfo, StreamError> {
        let bytes = cursor.bytes;
        if cursor.begin_of_stream {
            if let Some(len) = id3v2_tag_len(bytes)? {
                return Ok(FrameInfo::skip(len));
            }
        }

        if bytes.starts_with(b"TAG") {
            return match cursor.peek(ID3V1_LEN) {
                Ok(_) => Ok(FrameInfo::skip(ID3V1_LEN)),
                Err(_) if cursor.end_of_stream => Ok(FrameInfo::skip(bytes.len())),
                Err(e) => Err(e),
            };
        }

        let header = Mp3Header::read(bytes)?;
        let frame_len = match header.frame_len() {
            Some(len) => len,
            None => return free_format_len(&header, cursor),
        };
        cursor.peek(frame_len)?;

        Ok(FrameInfo::frame(frame_len).with_stream_info(header.stream_info(frame_len)))
    }

    fn name(&self) -> &'static str {
        "mp3"
    }
}

fn free_format_len(header: &Mp3Header, cursor: &RawCursor<'_>) -> Result<FrameInfo, StreamError> {
    let bytes = cursor.bytes;
    let limit = bytes.len().min(MAX_FREE_FORMAT_BYTES + 4);
    let next = (4..limit.saturating_sub(3)).find(|&i| {
        let word = u32::from_be_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        header.continues_free_format(word)
    });

    match next {
        Some(len) => Ok(FrameInfo::frame(len).with_stream_info(header.stream_info(len))),
        None if cursor.end_of_stream => {
            let len = bytes.len().min(MAX_FREE_FORMAT_BYTES);
            Ok(FrameInfo::frame(len).with_stream_info(header.stream_info(len)))
        }
        None if bytes.len() >= MAX_FREE_FORMAT_BYTES + 4 => Err(StreamError::WrongHeader),
        None => Ok(FrameInfo::reparse(MAX_FREE_FORMAT_BYTES + 4)),
    }
}

#[cfg(test)]
pub(crate) fn mp3_frame(padding: bool) -> Vec<u8> {
    // MPEG-1 layer III, 128 kbit/s, 44.1 kHz, joint stereo.
    let mut frame = vec![0xFF, 0xFB, 0x90 | if padding { 0x02 } else { 0 }, 0x64];
    frame.resize(if padding { 418 } else { 417 }, 0x55);
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::parse::FrameLen;

    #[test]
    fn fixed_length_frames() {
        let mut parser = Mp3Parser;
        let frame = mp3_frame(false);
        let info = parser.parse(&RawCursor::new(&frame)).unwrap();
        assert_eq!(info.frame, FrameLen::Frame(417));
        let stream = info.stream_info.unwrap();
        assert_eq!(stream.sample_rate, 44100);
        assert_eq!(stream.bitrate, 128_000);

        let frame = mp3_frame(true);
        assert_eq!(
            parser.parse(&RawCursor::new(&frame)).unwrap().frame,
            FrameLen::Frame(418)
        );
        assert_eq!(
            parser.parse(&RawCursor::new(&frame[..100])).unwrap_err(),
            StreamError::DataNotEnough
        );
    }

    #[test]
    fn free_format_reparses_until_next_sync() {
        let header = [0xFF, 0xFB, 0x04, 0x64];
        let mut data = header.to_vec();
        data.resize(300, 0x11);

        let mut parser = Mp3Parser;
        let info = parser.parse(&RawCursor::new(&data)).unwrap();
        assert_eq!(info.frame, FrameLen::Reparse);
        assert_eq!(info.max_frame_size, MAX_FREE_FORMAT_BYTES + 4);

        data.extend_from_slice(&header);
        let info = parser.parse(&RawCursor::new(&data)).unwrap();
        assert_eq!(info.frame, FrameLen::Frame(300));

        let info = parser
            .parse(&RawCursor::new(&data[..250]).end_of_stream(true))
            .unwrap();
        assert_eq!(info.frame, FrameLen::Frame(250));
    }

    #[test]
    fn tags_are_skipped() {
        let mut parser = Mp3Parser;
        let mut tag = b"TAG".to_vec();
        tag.resize(ID3V1_LEN, b' ');
        assert_eq!(
            parser.parse(&RawCursor::new(&tag)).unwrap().skipped_size,
            ID3V1_LEN
        );
        assert_eq!(
            parser
                .parse(&RawCursor::new(&tag[..20]).end_of_stream(true))
                .unwrap()
                .skipped_size,
            20
        );
    }

    #[test]
    fn invalid_headers() {
        let mut parser = Mp3Parser;
        for head in [[0xFF, 0xEB, 0x90, 0x64], [0xFF, 0xF9, 0x90, 0x64], [0xFF, 0xFB, 0xF0, 0x64]] {
            assert_eq!(
                parser.parse(&RawCursor::new(&head)).unwrap_err(),
                StreamError::WrongHeader
            );
        }
    }
}
