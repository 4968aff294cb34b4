//! Frame parsers for the stream formats the dispatcher understands.

use std::fmt::Display;

use crate::codec::{CodecConfig, CodecType};
use crate::process::parse::FrameParser;

pub mod adts;
pub mod amr;
pub mod mp3;
pub mod wav;

/// Samples per channel in one WAV frame unless configured otherwise.
pub const DEFAULT_WAV_FRAME_SAMPLES: u32 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFormat {
    /// AAC in ADTS framing.
    Aac,
    Mp3,
    Amr,
    AmrWb,
    Wav,
}

impl StreamFormat {
    pub fn parser(self, wav_frame_samples: u32) -> Box<dyn FrameParser> {
        match self {
            StreamFormat::Aac => Box::new(adts::AdtsParser),
            StreamFormat::Mp3 => Box::new(mp3::Mp3Parser),
            StreamFormat::Amr => Box::new(amr::AmrParser::narrowband()),
            StreamFormat::AmrWb => Box::new(amr::AmrParser::wideband()),
            StreamFormat::Wav => Box::new(wav::WavParser::new(wav_frame_samples)),
        }
    }

    /// Like [`parser`](Self::parser), honouring stream options carried in
    /// `codec_config` (bare AMR frames without the file magic).
    pub fn configured_parser(
        self,
        wav_frame_samples: u32,
        codec_config: &CodecConfig,
    ) -> Box<dyn FrameParser> {
        match (self, codec_config) {
            (StreamFormat::Amr, CodecConfig::Amr(amr)) if amr.no_file_header => {
                Box::new(amr::AmrParser::narrowband().without_magic())
            }
            (StreamFormat::AmrWb, CodecConfig::Amr(amr)) if amr.no_file_header => {
                Box::new(amr::AmrParser::wideband().without_magic())
            }
            _ => self.parser(wav_frame_samples),
        }
    }

    /// Codec fed by this format, `None` when the container header decides.
    pub fn codec_type(self) -> Option<CodecType> {
        match self {
            StreamFormat::Aac => Some(CodecType::Aac),
            StreamFormat::Mp3 => Some(CodecType::Mp3),
            StreamFormat::Amr => Some(CodecType::AmrNb),
            StreamFormat::AmrWb => Some(CodecType::AmrWb),
            StreamFormat::Wav => None,
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "aac" | "adts" => Some(StreamFormat::Aac),
            "mp3" | "mp2" | "mpa" => Some(StreamFormat::Mp3),
            "amr" => Some(StreamFormat::Amr),
            "awb" => Some(StreamFormat::AmrWb),
            "wav" | "wave" => Some(StreamFormat::Wav),
            _ => None,
        }
    }

    /// Guesses the format from the first bytes of a stream.
    pub fn probe(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"RIFF") {
            return Some(StreamFormat::Wav);
        }
        if bytes.starts_with(amr::AMR_WB_MAGIC) {
            return Some(StreamFormat::AmrWb);
        }
        if bytes.starts_with(amr::AMR_NB_MAGIC) {
            return Some(StreamFormat::Amr);
        }
        if bytes.starts_with(b"ID3") {
            return Some(StreamFormat::Mp3);
        }
        if adts::AdtsHeader::read(bytes).is_ok() {
            return Some(StreamFormat::Aac);
        }
        if mp3::Mp3Header::read(bytes).is_ok() {
            return Some(StreamFormat::Mp3);
        }
        None
    }
}

impl Display for StreamFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamFormat::Aac => write!(f, "AAC (ADTS)"),
            StreamFormat::Mp3 => write!(f, "MPEG audio"),
            StreamFormat::Amr => write!(f, "AMR-NB"),
            StreamFormat::AmrWb => write!(f, "AMR-WB"),
            StreamFormat::Wav => write!(f, "WAVE"),
        }
    }
}

#[test]
fn probe_formats() {
    assert_eq!(
        StreamFormat::probe(b"#!AMR-WB\n\x04"),
        Some(StreamFormat::AmrWb)
    );
    assert_eq!(StreamFormat::probe(b"#!AMR\n\x04"), Some(StreamFormat::Amr));
    assert_eq!(
        StreamFormat::probe(&adts::adts_frame(32)),
        Some(StreamFormat::Aac)
    );
    assert_eq!(
        StreamFormat::probe(&mp3::mp3_frame(false)),
        Some(StreamFormat::Mp3)
    );
    assert_eq!(StreamFormat::probe(b"OggS"), None);
    assert_eq!(StreamFormat::from_extension("WAV"), Some(StreamFormat::Wav));
}
