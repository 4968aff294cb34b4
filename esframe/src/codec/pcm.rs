use crate::codec::{CodecConfig, CodecHandle, CodecOps, CodecType, PcmConfig};
use crate::process::frame::{DecodeInfo, OutputFrame};
use crate::utils::errors::DecodeError;

/// Linear PCM engine.
///
/// Little-endian signed samples pass through unchanged; unsigned 8-bit
/// samples are widened to signed 16-bit.
#[derive(Debug, Default, Clone, Copy)]
pub struct PcmOps;

impl CodecOps for PcmOps {
    fn codec_type(&self) -> CodecType {
        CodecType::Pcm
    }

    fn open(&self, cfg: &CodecConfig) -> Result<Box<dyn CodecHandle>, DecodeError> {
        let config = match cfg {
            CodecConfig::Pcm(config) => *config,
            CodecConfig::Default => PcmConfig::default(),
            other => {
                return Err(DecodeError::InvalidParameter(format!(
                    "PCM decoder cannot use {other:?}"
                )));
            }
        };
        Ok(Box::new(PcmDecoder::new(config)?))
    }
}

#[derive(Debug)]
pub struct PcmDecoder {
    config: PcmConfig,
    last_decoded: usize,
}

impl PcmDecoder {
    pub fn new(config: PcmConfig) -> Result<Self, DecodeError> {
        validate(&config)?;
        Ok(Self {
            config,
            last_decoded: 0,
        })
    }

    fn output_bits(&self) -> u8 {
        if self.config.bits_per_sample == 8 {
            16
        } else {
            self.config.bits_per_sample
        }
    }

    fn info(&self, consumed: usize, decoded_size: usize) -> DecodeInfo {
        DecodeInfo {
            consumed,
            decoded_size,
            sample_rate: self.config.sample_rate,
            channels: self.config.channels,
            bits_per_sample: self.output_bits(),
        }
    }
}

fn validate(config: &PcmConfig) -> Result<(), DecodeError> {
    if !matches!(config.bits_per_sample, 8 | 16 | 24 | 32) {
        return Err(DecodeError::InvalidParameter(format!(
            "unsupported PCM sample width {}",
            config.bits_per_sample
        )));
    }
    if config.channels == 0 || config.sample_rate == 0 {
        return Err(DecodeError::InvalidParameter(
            "PCM needs a sample rate and at least one channel".into(),
        ));
    }
    Ok(())
}

impl CodecHandle for PcmDecoder {
    fn decode(&mut self, input: &[u8], out: &mut OutputFrame) -> Result<DecodeInfo, DecodeError> {
        let block_align = self.config.channels as usize * (self.config.bits_per_sample as usize / 8);
        let consumed = input.len() - input.len() % block_align;
        if consumed == 0 {
            return Err(DecodeError::DataLack);
        }
        let input = &input[..consumed];

        let decoded_size = if self.config.bits_per_sample == 8 {
            let dst = out.reserve(consumed * 2)?;
            for (pair, &byte) in dst.chunks_exact_mut(2).zip(input) {
                let sample = ((byte as i16) - 128) << 8;
                pair.copy_from_slice(&sample.to_le_bytes());
            }
            consumed * 2
        } else {
            out.reserve(consumed)?.copy_from_slice(input);
            consumed
        };

        out.decoded_size = decoded_size;
        self.last_decoded = decoded_size;
        Ok(self.info(consumed, decoded_size))
    }

    fn recover(&mut self, out: &mut OutputFrame) -> Result<DecodeInfo, DecodeError> {
        let len = if self.last_decoded > 0 {
            self.last_decoded
        } else {
            let frame_bytes = self.config.channels as usize * (self.output_bits() as usize / 8);
            self.config.sample_rate as usize / 100 * frame_bytes
        };
        out.reserve(len)?.fill(0);
        out.decoded_size = len;
        Ok(self.info(0, len))
    }

    /// Accepts a `WAVEFORMAT` payload (the body of a RIFF `fmt ` chunk).
    fn set_codec_config(&mut self, config: &[u8]) -> Result<(), DecodeError> {
        if config.len() < 16 {
            return Err(DecodeError::InvalidParameter(format!(
                "fmt payload too short: {} bytes",
                config.len()
            )));
        }
        let next = PcmConfig {
            channels: u16::from_le_bytes([config[2], config[3]]) as u8,
            sample_rate: u32::from_le_bytes([config[4], config[5], config[6], config[7]]),
            bits_per_sample: u16::from_le_bytes([config[14], config[15]]) as u8,
        };
        validate(&next)?;
        self.config = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_with_negotiation() {
        let mut decoder = PcmOps.open(&CodecConfig::Default).unwrap();
        let input = [1u8, 2, 3, 4, 5, 6, 7, 8, 9];
        let mut out = OutputFrame::with_capacity(4);

        let err = decoder.decode(&input, &mut out).unwrap_err();
        assert_eq!(err, DecodeError::BufferNotEnough { needed: 8 });
        assert_eq!(out.decoded_size, 0);

        out.grow_to(out.needed_size);
        let info = decoder.decode(&input, &mut out).unwrap();
        assert_eq!(info.consumed, 8);
        assert_eq!(out.decoded(), &input[..8]);
    }

    #[test]
    fn unsigned_8bit_is_widened() {
        let mut decoder = PcmDecoder::new(PcmConfig {
            sample_rate: 8000,
            channels: 1,
            bits_per_sample: 8,
        })
        .unwrap();
        let mut out = OutputFrame::with_capacity(6);
        let info = decoder.decode(&[0x80, 0xFF, 0x00], &mut out).unwrap();
        assert_eq!(info.decoded_size, 6);
        assert_eq!(info.bits_per_sample, 16);
        assert_eq!(out.decoded(), &[0x00, 0x00, 0x00, 0x7F, 0x00, 0x80]);
    }

    #[test]
    fn recover_emits_silence() {
        let mut decoder = PcmOps.open(&CodecConfig::Default).unwrap();
        let mut out = OutputFrame::with_capacity(16);
        decoder.decode(&[9; 12], &mut out).unwrap();

        let info = decoder.recover(&mut out).unwrap();
        assert_eq!(info.decoded_size, 12);
        assert!(out.decoded().iter().all(|&b| b == 0));
    }

    #[test]
    fn rejects_foreign_config() {
        let err = PcmOps
            .open(&CodecConfig::G711(Default::default()))
            .err()
            .unwrap();
        assert!(matches!(err, DecodeError::InvalidParameter(_)));
    }
}
