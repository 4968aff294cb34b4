//! AAC in ADTS framing (ISO/IEC 13818-7 §6.2).

use crate::codec::CodecType;
use crate::process::parse::{FrameInfo, FrameParser, RawCursor, StreamInfo, id3v2_tag_len};
use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::StreamError;

pub const SAMPLE_RATES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdtsHeader {
    pub protection_absent: bool,
    pub profile: u8,
    pub sampling_index: u8,
    pub channel_config: u8,
    pub frame_length: usize,
    pub raw_blocks: u8,
}

impl AdtsHeader {
    pub fn read(bytes: &[u8]) -> Result<Self, StreamError> {
        if bytes.len() < 7 {
            return Err(StreamError::DataNotEnough);
        }
        let reader = &mut BsIoSliceReader::from_slice(&bytes[..7]);

        if bits(reader, 12)? != 0xFFF {
            return Err(StreamError::WrongHeader);
        }
        let _mpeg_version = bits(reader, 1)?;
        if bits(reader, 2)? != 0 {
            return Err(StreamError::WrongHeader);
        }
        let protection_absent = bits(reader, 1)? == 1;
        let profile = bits(reader, 2)? as u8;
        let sampling_index = bits(reader, 4)? as u8;
        let _private = bits(reader, 1)?;
        let channel_config = bits(reader, 3)? as u8;
        let _originality = bits(reader, 4)?;
        let frame_length = bits(reader, 13)? as usize;
        let _buffer_fullness = bits(reader, 11)?;
        let raw_blocks = bits(reader, 2)? as u8;

        let header = Self {
            protection_absent,
            profile,
            sampling_index,
            channel_config,
            frame_length,
            raw_blocks,
        };
        if sampling_index as usize >= SAMPLE_RATES.len() || frame_length < header.header_len() {
            return Err(StreamError::WrongHeader);
        }
        Ok(header)
    }

    pub fn header_len(&self) -> usize {
        if self.protection_absent { 7 } else { 9 }
    }

    pub fn sample_rate(&self) -> u32 {
        SAMPLE_RATES[self.sampling_index as usize]
    }

    pub fn frame_samples(&self) -> u32 {
        1024 * (self.raw_blocks as u32 + 1)
    }

    /// Two-byte AudioSpecificConfig equivalent to this header.
    pub fn audio_specific_config(&self) -> Vec<u8> {
        let object_type = self.profile + 1;
        vec![
            (object_type << 3) | (self.sampling_index >> 1),
            ((self.sampling_index & 1) << 7) | (self.channel_config << 3),
        ]
    }

    fn stream_info(&self) -> StreamInfo {
        let frame_samples = self.frame_samples();
        StreamInfo {
            codec: CodecType::Aac,
            sample_rate: self.sample_rate(),
            channels: self.channel_config,
            bits_per_sample: 16,
            bitrate: (self.frame_length as u64 * 8 * self.sample_rate() as u64
                / frame_samples as u64) as u32,
            frame_samples,
        }
    }
}

fn bits(reader: &mut BsIoSliceReader<'_>, n: u32) -> Result<u32, StreamError> {
    reader
        .get_n::<u32>(n)
        .map_err(|_| StreamError::DataNotEnough)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AdtsParser;

impl FrameParser for AdtsParser {
    fn parse(&mut self, cursor: &RawCursor<'_>) -> Result<FrameInfo, StreamError> {
        if cursor.begin_of_stream {
            if let Some(len) = id3v2_tag_len(cursor.bytes)? {
                return Ok(FrameInfo::skip(len));
            }
        }

        let header = AdtsHeader::read(cursor.bytes)?;
        cursor.peek(header.frame_length)?;

        Ok(FrameInfo::frame(header.frame_length)
            .with_codec_config(header.audio_specific_config())
            .with_stream_info(header.stream_info()))
    }

    fn name(&self) -> &'static str {
        "adts"
    }
}

#[cfg(test)]
pub(crate) fn adts_frame(frame_length: usize) -> Vec<u8> {
    // AAC-LC, 44.1 kHz, stereo, no CRC.
    let mut frame = vec![
        0xFF,
        0xF1,
        0x50,
        0x80 | ((frame_length >> 11) & 0x03) as u8,
        ((frame_length >> 3) & 0xFF) as u8,
        (((frame_length & 0x07) << 5) as u8) | 0x1F,
        0xFC,
    ];
    frame.resize(frame_length, 0x21);
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::parse::FrameLen;

    #[test]
    fn header_fields() {
        let frame = adts_frame(371);
        let header = AdtsHeader::read(&frame).unwrap();
        assert_eq!(header.frame_length, 371);
        assert_eq!(header.sample_rate(), 44100);
        assert_eq!(header.channel_config, 2);
        assert_eq!(header.audio_specific_config(), vec![0x12, 0x10]);
    }

    #[test]
    fn needs_whole_frame() {
        let frame = adts_frame(200);
        let mut parser = AdtsParser;
        assert_eq!(
            parser.parse(&RawCursor::new(&frame[..150])).unwrap_err(),
            StreamError::DataNotEnough
        );
        let info = parser.parse(&RawCursor::new(&frame)).unwrap();
        assert_eq!(info.frame, FrameLen::Frame(200));
        assert_eq!(info.codec_config.as_deref(), Some(&[0x12, 0x10][..]));
    }

    #[test]
    fn rejects_garbage_and_skips_id3() {
        let mut parser = AdtsParser;
        assert_eq!(
            parser.parse(&RawCursor::new(&[0xFF, 0xF7, 0, 0, 0, 0, 0])).unwrap_err(),
            StreamError::WrongHeader
        );

        let mut data = vec![b'I', b'D', b'3', 4, 0, 0, 0, 0, 0, 5];
        data.extend_from_slice(&[0; 5]);
        data.extend(adts_frame(64));
        let info = parser
            .parse(&RawCursor::new(&data).begin_of_stream(true))
            .unwrap();
        assert_eq!(info.skipped_size, 15);
    }
}
