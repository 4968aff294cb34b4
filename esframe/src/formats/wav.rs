//! RIFF/WAVE container with PCM or G.711 payload.

use crate::codec::CodecType;
use crate::process::parse::{FrameInfo, FrameParser, RawCursor, StreamInfo};
use crate::utils::errors::StreamError;

const WAVE_FORMAT_PCM: u16 = 0x0001;
const WAVE_FORMAT_ALAW: u16 = 0x0006;
const WAVE_FORMAT_MULAW: u16 = 0x0007;
const WAVE_FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// Container-level description taken from the `fmt ` chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavFormat {
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    /// Raw `fmt ` chunk body.
    pub payload: Vec<u8>,
}

impl WavFormat {
    fn read(payload: &[u8]) -> Result<Self, StreamError> {
        if payload.len() < 16 {
            return Err(StreamError::NotSupported);
        }
        let u16_at = |i: usize| u16::from_le_bytes([payload[i], payload[i + 1]]);
        let mut format_tag = u16_at(0);
        if format_tag == WAVE_FORMAT_EXTENSIBLE {
            // Sub-format GUID starts at byte 24; its first two bytes carry the tag.
            if payload.len() < 40 {
                return Err(StreamError::NotSupported);
            }
            format_tag = u16_at(24);
        }

        let format = Self {
            format_tag,
            channels: u16_at(2),
            sample_rate: u32::from_le_bytes([payload[4], payload[5], payload[6], payload[7]]),
            block_align: u16_at(12),
            bits_per_sample: u16_at(14),
            payload: payload.to_vec(),
        };
        if format.channels == 0
            || format.channels > u8::MAX as u16
            || format.block_align == 0
            || format.sample_rate == 0
        {
            return Err(StreamError::NotSupported);
        }
        format.codec()?;
        Ok(format)
    }

    pub fn codec(&self) -> Result<CodecType, StreamError> {
        match self.format_tag {
            WAVE_FORMAT_PCM => Ok(CodecType::Pcm),
            WAVE_FORMAT_ALAW => Ok(CodecType::G711A),
            WAVE_FORMAT_MULAW => Ok(CodecType::G711U),
            _ => Err(StreamError::NotSupported),
        }
    }

    fn stream_info(&self, frame_samples: u32) -> StreamInfo {
        let codec = self.codec().unwrap_or(CodecType::Pcm);
        let bits_per_sample = match codec {
            CodecType::G711A | CodecType::G711U => 16,
            _ if self.bits_per_sample == 8 => 16,
            _ => self.bits_per_sample as u8,
        };
        StreamInfo {
            codec,
            sample_rate: self.sample_rate,
            channels: self.channels as u8,
            bits_per_sample,
            bitrate: (self.sample_rate as u64 * self.block_align as u64 * 8).min(u32::MAX as u64)
                as u32,
            frame_samples,
        }
    }
}

/// Splits the `data` chunk of a WAVE file into fixed-duration frames.
///
/// The begin-of-stream call walks the chunk list up to `data` and reports the
/// whole header as skipped, with the payload length in `total_size`.
#[derive(Debug, Clone)]
pub struct WavParser {
    frame_samples: u32,
    format: Option<WavFormat>,
}

impl WavParser {
    pub fn new(frame_samples: u32) -> Self {
        Self {
            frame_samples: frame_samples.max(1),
            format: None,
        }
    }

    pub fn format(&self) -> Option<&WavFormat> {
        self.format.as_ref()
    }

    fn parse_header(&mut self, cursor: &RawCursor<'_>) -> Result<FrameInfo, StreamError> {
        let bytes = cursor.bytes;
        match bytes.get(..12) {
            Some(riff) if &riff[..4] == b"RIFF" && &riff[8..12] == b"WAVE" => {}
            Some(_) => return Err(StreamError::NotContinue),
            None if b"RIFF".starts_with(&bytes[..bytes.len().min(4)]) => {
                return Err(StreamError::DataNotEnough);
            }
            None => return Err(StreamError::NotContinue),
        }

        let mut offset = 12;
        let mut format = None;
        loop {
            let chunk = cursor.peek(offset + 8)?;
            let id = &chunk[offset..offset + 4];
            let size = u32::from_le_bytes([
                chunk[offset + 4],
                chunk[offset + 5],
                chunk[offset + 6],
                chunk[offset + 7],
            ]);
            let body = offset + 8;

            match id {
                b"data" => {
                    let format: WavFormat = format.ok_or(StreamError::NotSupported)?;
                    let total_size = match size {
                        0 | u32::MAX => 0,
                        size => size as u64,
                    };
                    let info = FrameInfo::skip(body)
                        .with_total_size(total_size)
                        .with_stream_info(format.stream_info(self.frame_samples))
                        .with_codec_config(format.payload.clone());
                    self.format = Some(format);
                    return Ok(info);
                }
                b"fmt " => {
                    let payload = cursor.peek(body + size as usize)?;
                    format = Some(WavFormat::read(&payload[body..])?);
                }
                _ => {}
            }
            offset = body + size as usize + (size as usize & 1);
        }
    }
}

impl FrameParser for WavParser {
    fn parse(&mut self, cursor: &RawCursor<'_>) -> Result<FrameInfo, StreamError> {
        if cursor.begin_of_stream {
            return self.parse_header(cursor);
        }
        let format = self.format.as_ref().ok_or(StreamError::InvalidArg)?;

        let block_align = format.block_align as usize;
        let wanted = block_align * self.frame_samples as usize;
        let available = cursor.len() - cursor.len() % block_align;
        if available >= wanted {
            Ok(FrameInfo::frame(wanted))
        } else if cursor.end_of_stream && available > 0 {
            Ok(FrameInfo::frame(available))
        } else {
            Err(StreamError::DataNotEnough)
        }
    }

    fn name(&self) -> &'static str {
        "wav"
    }
}

/// Builds a canonical 44-byte WAVE header followed by `payload`.
#[cfg(test)]
pub(crate) fn wav_file(format_tag: u16, channels: u16, bits: u16, payload: &[u8]) -> Vec<u8> {
    let block_align = channels * bits.max(8) / 8;
    let mut data = Vec::new();
    data.extend_from_slice(b"RIFF");
    data.extend_from_slice(&(36 + payload.len() as u32).to_le_bytes());
    data.extend_from_slice(b"WAVEfmt ");
    data.extend_from_slice(&16u32.to_le_bytes());
    data.extend_from_slice(&format_tag.to_le_bytes());
    data.extend_from_slice(&channels.to_le_bytes());
    data.extend_from_slice(&8000u32.to_le_bytes());
    data.extend_from_slice(&(8000 * block_align as u32).to_le_bytes());
    data.extend_from_slice(&block_align.to_le_bytes());
    data.extend_from_slice(&bits.to_le_bytes());
    data.extend_from_slice(b"data");
    data.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    data.extend_from_slice(payload);
    data
}
