use crate::codec::{CodecConfig, CodecHandle, CodecOps, CodecType, G711Config};
use crate::process::frame::{DecodeInfo, OutputFrame};
use crate::utils::errors::DecodeError;

/// Consecutive concealed frames before the output fades to silence.
const MAX_CONCEALED: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Law {
    A,
    Mu,
}

/// G.711 engine producing signed 16-bit little-endian samples.
#[derive(Debug, Clone, Copy)]
pub struct G711Ops {
    law: Law,
}

impl G711Ops {
    pub const fn alaw() -> Self {
        Self { law: Law::A }
    }

    pub const fn ulaw() -> Self {
        Self { law: Law::Mu }
    }
}

impl CodecOps for G711Ops {
    fn codec_type(&self) -> CodecType {
        match self.law {
            Law::A => CodecType::G711A,
            Law::Mu => CodecType::G711U,
        }
    }

    fn open(&self, cfg: &CodecConfig) -> Result<Box<dyn CodecHandle>, DecodeError> {
        let config = match cfg {
            CodecConfig::G711(config) => *config,
            CodecConfig::Default => G711Config::default(),
            other => {
                return Err(DecodeError::InvalidParameter(format!(
                    "G.711 decoder cannot use {other:?}"
                )));
            }
        };
        if config.channels == 0 || config.sample_rate == 0 {
            return Err(DecodeError::InvalidParameter(
                "G.711 needs a sample rate and at least one channel".into(),
            ));
        }
        Ok(Box::new(G711Decoder {
            law: self.law,
            config,
            history: Vec::new(),
            concealed: 0,
        }))
    }
}

#[derive(Debug)]
pub struct G711Decoder {
    law: Law,
    config: G711Config,
    history: Vec<i16>,
    concealed: u32,
}

impl G711Decoder {
    fn info(&self, consumed: usize, decoded_size: usize) -> DecodeInfo {
        DecodeInfo {
            consumed,
            decoded_size,
            sample_rate: self.config.sample_rate,
            channels: self.config.channels,
            bits_per_sample: 16,
        }
    }
}

impl CodecHandle for G711Decoder {
    fn decode(&mut self, input: &[u8], out: &mut OutputFrame) -> Result<DecodeInfo, DecodeError> {
        if input.is_empty() {
            return Err(DecodeError::DataLack);
        }
        let dst = out.reserve(input.len() * 2)?;

        self.history.clear();
        for (pair, &code) in dst.chunks_exact_mut(2).zip(input) {
            let sample = match self.law {
                Law::A => alaw_to_linear(code),
                Law::Mu => ulaw_to_linear(code),
            };
            pair.copy_from_slice(&sample.to_le_bytes());
            self.history.push(sample);
        }
        self.concealed = 0;

        out.decoded_size = input.len() * 2;
        Ok(self.info(input.len(), input.len() * 2))
    }

    /// Repeats the last good frame, halving its level on every further loss.
    fn recover(&mut self, out: &mut OutputFrame) -> Result<DecodeInfo, DecodeError> {
        let samples = if self.history.is_empty() {
            (self.config.sample_rate / 100) as usize * self.config.channels as usize
        } else {
            self.history.len()
        };
        let dst = out.reserve(samples * 2)?;

        self.concealed += 1;
        for (i, pair) in dst.chunks_exact_mut(2).enumerate() {
            let sample = match self.history.get(i) {
                Some(&s) if self.concealed <= MAX_CONCEALED => s >> self.concealed,
                _ => 0,
            };
            pair.copy_from_slice(&sample.to_le_bytes());
        }

        out.decoded_size = samples * 2;
        Ok(self.info(0, samples * 2))
    }

    fn set_codec_config(&mut self, config: &[u8]) -> Result<(), DecodeError> {
        if config.len() >= 8 {
            self.config.channels = u16::from_le_bytes([config[2], config[3]]) as u8;
            self.config.sample_rate =
                u32::from_le_bytes([config[4], config[5], config[6], config[7]]);
        }
        Ok(())
    }
}

pub fn alaw_to_linear(code: u8) -> i16 {
    let a = code ^ 0x55;
    let mut t = ((a & 0x0F) as i16) << 4;
    let seg = (a & 0x70) >> 4;
    match seg {
        0 => t += 8,
        1 => t += 0x108,
        _ => {
            t += 0x108;
            t <<= seg - 1;
        }
    }
    if a & 0x80 != 0 { t } else { -t }
}

pub fn ulaw_to_linear(code: u8) -> i16 {
    let u = !code;
    let mut t = (((u & 0x0F) as i16) << 3) + 0x84;
    t <<= (u & 0x70) >> 4;
    if u & 0x80 != 0 { 0x84 - t } else { t - 0x84 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn law_tables() {
        assert_eq!(ulaw_to_linear(0xFF), 0);
        assert_eq!(ulaw_to_linear(0x00), -32124);
        assert_eq!(ulaw_to_linear(0x80), 32124);
        assert_eq!(alaw_to_linear(0xD5), 8);
        assert_eq!(alaw_to_linear(0x55), -8);
        assert_eq!(alaw_to_linear(0xAA), 32256);
    }

    #[test]
    fn needed_size_is_stable_across_retries() {
        let mut decoder = G711Ops::ulaw().open(&CodecConfig::Default).unwrap();
        let input = [0xFFu8; 20];
        let mut out = OutputFrame::with_capacity(10);

        for _ in 0..2 {
            assert_eq!(
                decoder.decode(&input, &mut out).unwrap_err(),
                DecodeError::BufferNotEnough { needed: 40 }
            );
            assert_eq!(out.needed_size, 40);
        }

        out.grow_to(out.needed_size);
        let info = decoder.decode(&input, &mut out).unwrap();
        assert_eq!(info.consumed, 20);
        assert_eq!(info.decoded_size, 40);
    }

    #[test]
    fn concealment_fades_out() {
        let mut decoder = G711Ops::alaw().open(&CodecConfig::Default).unwrap();
        let mut out = OutputFrame::with_capacity(8);
        decoder.decode(&[0xAA; 4], &mut out).unwrap();

        let level = |out: &OutputFrame| i16::from_le_bytes([out.buffer[0], out.buffer[1]]);
        decoder.recover(&mut out).unwrap();
        assert_eq!(level(&out), 32256 >> 1);
        decoder.recover(&mut out).unwrap();
        assert_eq!(level(&out), 32256 >> 2);
        for _ in 0..MAX_CONCEALED {
            decoder.recover(&mut out).unwrap();
        }
        assert_eq!(level(&out), 0);
        assert_eq!(out.decoded_size, 8);
    }
}
