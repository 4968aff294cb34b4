use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};
use esframe::formats::{DEFAULT_WAV_FRAME_SAMPLES, StreamFormat};
use esframe::process::dispatch::{FailPolicy, SimpleDecoderConfig};
use log::Level;

#[derive(Debug, ClapParser)]
#[command(
    name       = env!("CARGO_PKG_NAME"),
    version    = env!("CARGO_PKG_VERSION"),
    author     = env!("CARGO_PKG_AUTHORS"),
    about      = "Tools for inspecting and decoding elementary audio streams",
    long_about = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Treat warnings as fatal errors (fail on first lost sync or bad frame).
    #[arg(long, global = true)]
    pub strict: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show progress bars during operations.
    #[arg(long, global = true)]
    pub progress: bool,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Decode the specified stream into PCM audio.
    Decode(DecodeArgs),

    /// Print stream information
    Info(InfoArgs),
}

#[derive(Debug, Args)]
pub struct StreamArgs {
    /// Input stream (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Input stream format; guessed from the extension or content if omitted.
    #[arg(long, value_enum)]
    pub format: Option<InputFormat>,

    /// Bytes read from the input per call.
    #[arg(long, value_name = "BYTES", default_value_t = 64 * 1024)]
    pub chunk_size: usize,

    /// Bytes that may be discarded while searching for a frame header.
    #[arg(long, value_name = "BYTES", default_value_t = 64 * 1024)]
    pub resync_limit: usize,

    /// Samples per channel in one WAV frame.
    #[arg(long, value_name = "SAMPLES", default_value_t = DEFAULT_WAV_FRAME_SAMPLES)]
    pub frame_samples: u32,
}

impl StreamArgs {
    pub fn decoder_config(&self, strict: bool) -> SimpleDecoderConfig {
        let (fail_policy, fail_level) = if strict {
            (FailPolicy::Abort, Level::Warn)
        } else {
            (FailPolicy::SkipFrame, Level::Error)
        };
        SimpleDecoderConfig {
            resync_limit: self.resync_limit,
            fail_policy,
            fail_level,
            wav_frame_samples: self.frame_samples.max(1),
            ..Default::default()
        }
    }

    /// `--format`, then the file extension, then the first bytes.
    pub fn resolve_format(&self, head: &[u8]) -> Result<StreamFormat> {
        if let Some(format) = self.format {
            return Ok(format.into());
        }
        if let Some(format) = extension_format(&self.input) {
            return Ok(format);
        }
        let format = StreamFormat::probe(head).ok_or_else(|| {
            anyhow!(
                "Cannot detect the format of {}, pass --format",
                self.input.display()
            )
        })?;
        log::debug!("Detected {format} from stream content");
        Ok(format)
    }
}

fn extension_format(path: &Path) -> Option<StreamFormat> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(StreamFormat::from_extension)
}

#[derive(Debug, Args)]
pub struct DecodeArgs {
    #[command(flatten)]
    pub stream: StreamArgs,

    /// Output file; `.pcm` writes raw samples, anything else a WAV file.
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    #[command(flatten)]
    pub stream: StreamArgs,

    /// Print the report as YAML.
    #[arg(long)]
    pub yaml: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    /// Convert LogLevel to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Colorized human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum InputFormat {
    /// AAC in ADTS framing.
    Aac,
    /// MPEG audio layer I/II/III.
    Mp3,
    /// AMR-NB storage format.
    Amr,
    /// AMR-WB storage format.
    AmrWb,
    /// RIFF/WAVE with PCM or G.711 payload.
    Wav,
}

impl From<InputFormat> for StreamFormat {
    fn from(format: InputFormat) -> Self {
        match format {
            InputFormat::Aac => StreamFormat::Aac,
            InputFormat::Mp3 => StreamFormat::Mp3,
            InputFormat::Amr => StreamFormat::Amr,
            InputFormat::AmrWb => StreamFormat::AmrWb,
            InputFormat::Wav => StreamFormat::Wav,
        }
    }
}
