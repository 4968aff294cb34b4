#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use esframe::codec::{CodecConfig, CodecHandle, CodecOps, CodecRegistry, CodecType};
use esframe::process::dispatch::{ProcessInfo, ProcessStatus, SimpleDecoder};
use esframe::process::frame::{DecodeInfo, OutputFrame, RawInput};
use esframe::utils::errors::DecodeError;

/// Copies each frame to the output; frames ending in `reject` fail.
pub struct EchoOps {
    pub codec: CodecType,
    pub reject: Option<u8>,
    pub closed: Arc<AtomicUsize>,
}

impl EchoOps {
    pub fn new(codec: CodecType) -> Self {
        Self {
            codec,
            reject: None,
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn rejecting(codec: CodecType, last_byte: u8) -> Self {
        Self {
            reject: Some(last_byte),
            ..Self::new(codec)
        }
    }
}

impl CodecOps for EchoOps {
    fn codec_type(&self) -> CodecType {
        self.codec
    }

    fn open(&self, _cfg: &CodecConfig) -> Result<Box<dyn CodecHandle>, DecodeError> {
        Ok(Box::new(Echo {
            reject: self.reject,
            closed: self.closed.clone(),
            last: 0,
        }))
    }
}

struct Echo {
    reject: Option<u8>,
    closed: Arc<AtomicUsize>,
    last: usize,
}

impl CodecHandle for Echo {
    fn decode(&mut self, input: &[u8], out: &mut OutputFrame) -> Result<DecodeInfo, DecodeError> {
        if self.reject.is_some() && input.last().copied() == self.reject {
            return Err(DecodeError::Fail("rejected frame".into()));
        }
        out.reserve(input.len())?.copy_from_slice(input);
        out.decoded_size = input.len();
        self.last = input.len();
        Ok(DecodeInfo {
            consumed: input.len(),
            decoded_size: input.len(),
            ..Default::default()
        })
    }

    fn recover(&mut self, out: &mut OutputFrame) -> Result<DecodeInfo, DecodeError> {
        out.reserve(self.last)?.fill(0);
        out.decoded_size = self.last;
        Ok(DecodeInfo {
            decoded_size: self.last,
            ..Default::default()
        })
    }

    fn close(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn registry_with(ops: impl CodecOps + 'static) -> CodecRegistry {
    let registry = CodecRegistry::default();
    registry
        .register(Arc::new(ops))
        .expect("fresh registry accepts the codec");
    registry
}

/// Output of a full decode run.
#[derive(Debug, Default)]
pub struct Run {
    pub pcm: Vec<u8>,
    pub consumed: usize,
    pub infos: Vec<ProcessInfo>,
}

/// Feeds `data` in windows of `chunk` bytes, growing `out` on demand, until
/// the decoder reports end of stream.
pub fn run_chunked(
    decoder: &mut SimpleDecoder,
    data: &[u8],
    chunk: usize,
    out: &mut OutputFrame,
) -> Result<Run, DecodeError> {
    let mut run = Run::default();
    let mut pos = 0;

    for _ in 0..100_000 {
        let end = (pos + chunk).min(data.len());
        let input = RawInput {
            data: &data[pos..end],
            end_of_stream: end == data.len(),
            frame_recover: false,
        };
        let info = match decoder.process(&input, out) {
            Ok(info) => info,
            Err(DecodeError::BufferNotEnough { needed }) => {
                out.grow_to(needed);
                continue;
            }
            Err(e) => return Err(e),
        };
        assert!(info.consumed <= end - pos);
        pos += info.consumed;
        run.consumed += info.consumed;
        run.pcm.extend_from_slice(out.decoded());
        let done = info.status == ProcessStatus::EndOfStream;
        run.infos.push(info);
        if done {
            return Ok(run);
        }
    }
    panic!("decoder did not reach end of stream");
}

pub fn amr_nb_stream(frames: usize) -> Vec<u8> {
    let mut data = b"#!AMR\n".to_vec();
    for i in 0..frames {
        // 4.75 kbit/s, Q bit set.
        data.push(0x04);
        data.extend(std::iter::repeat_n(i as u8 + 1, 12));
    }
    data
}

/// AAC-LC, 44.1 kHz, stereo ADTS frame filled with `fill`.
pub fn adts_frame(frame_length: usize, fill: u8) -> Vec<u8> {
    let mut frame = vec![
        0xFF,
        0xF1,
        0x50,
        0x80 | ((frame_length >> 11) & 0x03) as u8,
        ((frame_length >> 3) & 0xFF) as u8,
        (((frame_length & 0x07) << 5) as u8) | 0x1F,
        0xFC,
    ];
    frame.resize(frame_length, fill);
    frame
}

pub fn adts_stream(lengths: &[usize]) -> Vec<u8> {
    lengths
        .iter()
        .enumerate()
        .flat_map(|(i, &len)| adts_frame(len, 0x20 + i as u8))
        .collect()
}

/// MPEG-1 layer III, 128 kbit/s, 44.1 kHz: 417 bytes, 418 with padding.
pub fn mp3_frame(padding: bool) -> Vec<u8> {
    let mut frame = vec![0xFF, 0xFB, 0x90 | if padding { 0x02 } else { 0 }, 0x64];
    frame.resize(if padding { 418 } else { 417 }, 0x55);
    frame
}

/// Free-format layer III frame of `len` bytes.
pub fn free_format_frame(len: usize) -> Vec<u8> {
    let mut frame = vec![0xFF, 0xFB, 0x04, 0x64];
    frame.resize(len, 0x11);
    frame
}

pub fn id3v2_tag(body: usize) -> Vec<u8> {
    let size = [
        (body >> 21) as u8 & 0x7F,
        (body >> 14) as u8 & 0x7F,
        (body >> 7) as u8 & 0x7F,
        body as u8 & 0x7F,
    ];
    let mut tag = vec![b'I', b'D', b'3', 4, 0, 0];
    tag.extend_from_slice(&size);
    tag.resize(10 + body, 0);
    tag
}

/// Canonical 44-byte WAVE header at 8 kHz followed by `payload`.
pub fn wav_file(format_tag: u16, channels: u16, bits: u16, payload: &[u8]) -> Vec<u8> {
    let block_align = channels * bits / 8;
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
