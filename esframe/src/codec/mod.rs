use std::fmt::Display;

use crate::process::frame::{DecodeInfo, OutputFrame};
use crate::utils::errors::DecodeError;

/// Linear PCM engine.
pub mod pcm;

/// ITU-T G.711 A-law and µ-law engines.
pub mod g711;

/// Process-wide codec lookup.
///
/// Provides [`CodecRegistry`](registry::CodecRegistry) and the shared instance
/// returned by [`registry()`](registry::registry).
pub mod registry;

pub use registry::{CodecRegistry, register_default_codecs, registry};

/// Codec identifier used as the registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecType {
    Pcm,
    G711A,
    G711U,
    Aac,
    Mp3,
    AmrNb,
    AmrWb,
    Opus,
    Sbc,
    Lc3,
    Flac,
    Vorbis,
    Alac,
    /// Application-defined engine, keyed by its own id.
    Custom(u16),
}

const CUSTOM_ID_BASE: u32 = 0x1_0000;

impl CodecType {
    /// Stable integer id of the codec type.
    pub const fn id(self) -> u32 {
        match self {
            CodecType::Pcm => 1,
            CodecType::G711A => 2,
            CodecType::G711U => 3,
            CodecType::Aac => 4,
            CodecType::Mp3 => 5,
            CodecType::AmrNb => 6,
            CodecType::AmrWb => 7,
            CodecType::Opus => 8,
            CodecType::Sbc => 9,
            CodecType::Lc3 => 10,
            CodecType::Flac => 11,
            CodecType::Vorbis => 12,
            CodecType::Alac => 13,
            CodecType::Custom(id) => CUSTOM_ID_BASE + id as u32,
        }
    }

    pub fn from_id(id: u32) -> Option<Self> {
        let codec = match id {
            1 => CodecType::Pcm,
            2 => CodecType::G711A,
            3 => CodecType::G711U,
            4 => CodecType::Aac,
            5 => CodecType::Mp3,
            6 => CodecType::AmrNb,
            7 => CodecType::AmrWb,
            8 => CodecType::Opus,
            9 => CodecType::Sbc,
            10 => CodecType::Lc3,
            11 => CodecType::Flac,
            12 => CodecType::Vorbis,
            13 => CodecType::Alac,
            id if (CUSTOM_ID_BASE..CUSTOM_ID_BASE + 0x1_0000).contains(&id) => {
                CodecType::Custom((id - CUSTOM_ID_BASE) as u16)
            }
            _ => return None,
        };
        Some(codec)
    }
}

impl Display for CodecType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecType::Pcm => write!(f, "PCM"),
            CodecType::G711A => write!(f, "G711A"),
            CodecType::G711U => write!(f, "G711U"),
            CodecType::Aac => write!(f, "AAC"),
            CodecType::Mp3 => write!(f, "MP3"),
            CodecType::AmrNb => write!(f, "AMR-NB"),
            CodecType::AmrWb => write!(f, "AMR-WB"),
            CodecType::Opus => write!(f, "Opus"),
            CodecType::Sbc => write!(f, "SBC"),
            CodecType::Lc3 => write!(f, "LC3"),
            CodecType::Flac => write!(f, "FLAC"),
            CodecType::Vorbis => write!(f, "Vorbis"),
            CodecType::Alac => write!(f, "ALAC"),
            CodecType::Custom(id) => write!(f, "Custom({id})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmConfig {
    pub sample_rate: u32,
    pub channels: u8,
    pub bits_per_sample: u8,
}

impl Default for PcmConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            channels: 2,
            bits_per_sample: 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct G711Config {
    pub sample_rate: u32,
    pub channels: u8,
}

impl Default for G711Config {
    fn default() -> Self {
        Self {
            sample_rate: 8_000,
            channels: 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AacConfig {
    pub sample_rate: u32,
    pub channels: u8,
    /// AudioSpecificConfig for raw (non-ADTS) streams.
    pub audio_specific_config: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AmrConfig {
    pub wideband: bool,
    /// Raw frames without the `#!AMR` file magic.
    pub no_file_header: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpusConfig {
    pub sample_rate: u32,
    pub channels: u8,
    pub frame_duration_us: u32,
}

impl Default for OpusConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 2,
            frame_duration_us: 20_000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SbcConfig {
    /// Wide-band speech variant with fixed 57-byte frames.
    pub msbc: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lc3Config {
    pub sample_rate: u32,
    pub channels: u8,
    pub frame_duration_us: u32,
    pub frame_bytes: u16,
}

impl Default for Lc3Config {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 1,
            frame_duration_us: 10_000,
            frame_bytes: 120,
        }
    }
}

/// Per-codec configuration passed to [`CodecOps::open`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CodecConfig {
    /// The engine picks its own defaults or learns them from the stream.
    #[default]
    Default,
    Pcm(PcmConfig),
    G711(G711Config),
    Aac(AacConfig),
    Amr(AmrConfig),
    Opus(OpusConfig),
    Sbc(SbcConfig),
    Lc3(Lc3Config),
}

/// Operation table of one codec engine, stored in the registry.
///
/// ```rust
/// use esframe::codec::{CodecConfig, CodecOps, CodecType, CodecRegistry};
/// use esframe::codec::pcm::PcmOps;
/// use std::sync::Arc;
///
/// let registry = CodecRegistry::default();
/// registry.register(Arc::new(PcmOps))?;
///
/// let ops = registry.get(CodecType::Pcm).expect("registered");
/// let mut handle = ops.open(&CodecConfig::Default)?;
/// handle.close();
/// # Ok::<(), esframe::utils::errors::DecodeError>(())
/// ```
pub trait CodecOps: Send + Sync {
    fn codec_type(&self) -> CodecType;

    /// Creates an independent decoder instance.
    fn open(&self, cfg: &CodecConfig) -> Result<Box<dyn CodecHandle>, DecodeError>;
}

/// State of one open decoder.
///
/// Every method follows the buffer negotiation rules of
/// [`OutputFrame`]: on [`DecodeError::BufferNotEnough`] nothing is written and
/// no input is consumed.
pub trait CodecHandle: Send {
    /// Decodes one frame from the front of `input`.
    fn decode(&mut self, input: &[u8], out: &mut OutputFrame) -> Result<DecodeInfo, DecodeError>;

    /// Synthesizes a replacement for a lost frame.
    fn recover(&mut self, out: &mut OutputFrame) -> Result<DecodeInfo, DecodeError> {
        let _ = out;
        Err(DecodeError::NotSupport)
    }

    /// Applies out-of-band configuration found in the stream.
    fn set_codec_config(&mut self, config: &[u8]) -> Result<(), DecodeError> {
        let _ = config;
        Ok(())
    }

    /// Releases engine resources. Further calls are undefined.
    fn close(&mut self) {}
}

#[test]
fn codec_type_ids_round_trip() {
    for codec in [
        CodecType::Pcm,
        CodecType::Lc3,
        CodecType::Alac,
        CodecType::Custom(0),
        CodecType::Custom(u16::MAX),
    ] {
        assert_eq!(CodecType::from_id(codec.id()), Some(codec));
    }
    assert_eq!(CodecType::from_id(0), None);
    assert_eq!(CodecType::from_id(99), None);
}
