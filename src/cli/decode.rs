use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use esframe::codec::{CodecRegistry, register_default_codecs, registry};
use esframe::formats::StreamFormat;
use esframe::process::dispatch::{ProcessInfo, ProcessStatus, SimpleDecoder};
use esframe::process::frame::{OutputFrame, RawInput};
use esframe::process::parse::StreamInfo;
use esframe::utils::errors::DecodeError;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, info, warn};

use super::command::{Cli, DecodeArgs, StreamArgs};
use crate::input::InputReader;
use crate::timestamp::{samples_to_secs, time_str};
use crate::wav::{FormatChunk, WavWriter};

/// Initial output buffer; the decoder asks for more when a frame needs it.
const INITIAL_OUTPUT: usize = 4096;

pub fn cmd_decode(args: &DecodeArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!(
        "Decoding stream: {} (strict mode: {})",
        args.stream.input.display(),
        cli.strict
    );
    register_default_codecs(registry());

    let pb = multi.map(create_progress_bar).transpose()?;
    let mut sink: Option<AudioSink> = None;
    let mut pcm_format = None;

    let input = StreamInput::open(&args.stream)?;
    let stats = run_stream(input, registry(), &args.stream, cli.strict, |decoder, step, pcm| {
        if let Some(pb) = &pb {
            pb.set_position(decoder.stats().frames_decoded);
        }
        if pcm.is_empty() {
            return Ok(());
        }
        let Some(path) = args.output.as_deref() else {
            return Ok(());
        };
        if sink.is_none() {
            let stream_info = decoder
                .stream_info()
                .context("decoded a frame before the stream format was known")?;
            let format = output_format(stream_info);
            if let Some(pb) = &pb {
                pb.set_message(format!(
                    "{} Hz, {} ch -> {}",
                    format.sample_rate,
                    format.channels,
                    path.display()
                ));
            }
            sink = Some(AudioSink::create(path, format)?);
            pcm_format = Some(format);
        }
        if let (Some(sink), ProcessStatus::Decoded | ProcessStatus::Recovered) =
            (sink.as_mut(), &step.status)
        {
            sink.write_pcm(pcm)?;
        }
        Ok(())
    })?;

    if let Some(sink) = sink {
        sink.finish()?;
    }
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let duration = pcm_format
        .filter(|f| f.block_align > 0)
        .map(|f| {
            let samples = stats.bytes_decoded / f.block_align as u64;
            time_str(samples_to_secs(samples, f.sample_rate))
        })
        .unwrap_or_else(|| "unknown".into());
    info!(
        "Decoded {} frames ({duration}), {} recovered, {} dropped, {} bytes skipped in {} resyncs",
        stats.frames_decoded,
        stats.frames_recovered,
        stats.frames_dropped,
        stats.bytes_skipped,
        stats.resyncs
    );
    if args.output.is_none() {
        info!("No output path given, decoded audio was discarded");
    }
    Ok(())
}

/// Final counters of a [`run_stream`] pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunStats {
    pub frames_decoded: u64,
    pub frames_dropped: u64,
    pub frames_recovered: u64,
    pub bytes_decoded: u64,
    pub bytes_skipped: u64,
    pub resyncs: u64,
    pub bytes_read: u64,
}

/// Input file with its first chunk already read and its format resolved.
pub struct StreamInput {
    reader: InputReader,
    head: Vec<u8>,
    pub format: StreamFormat,
}

impl StreamInput {
    pub fn open(args: &StreamArgs) -> Result<Self> {
        let mut reader = InputReader::new(&args.input)
            .with_context(|| format!("cannot open {}", args.input.display()))?;
        if reader.is_pipe() {
            debug!("Reading from stdin");
        }
        let mut head = vec![0u8; args.chunk_size.max(16)];
        let head_len = reader.read_chunk(&mut head)?;
        head.truncate(head_len);

        let format = args.resolve_format(&head)?;
        info!("Input format: {format}");
        Ok(Self {
            reader,
            head,
            format,
        })
    }
}

/// Drives one [`SimpleDecoder`] over `input`, chunk by chunk.
///
/// `on_step` sees every successful step together with the PCM it produced.
pub fn run_stream<F>(
    input: StreamInput,
    registry: &CodecRegistry,
    args: &StreamArgs,
    strict: bool,
    mut on_step: F,
) -> Result<RunStats>
where
    F: FnMut(&SimpleDecoder, &ProcessInfo, &[u8]) -> Result<()>,
{
    let StreamInput {
        mut reader,
        head,
        format,
    } = input;
    let mut decoder = SimpleDecoder::open_in(registry, format, args.decoder_config(strict))?;
    let mut out = OutputFrame::with_capacity(INITIAL_OUTPUT);
    let mut bytes_read = head.len() as u64;

    let mut running = feed(&mut decoder, &mut out, &head, false, &mut on_step)?;
    if running {
        reader.process_chunks(args.chunk_size.max(1), |chunk| {
            bytes_read += chunk.len() as u64;
            running = feed(&mut decoder, &mut out, chunk, false, &mut on_step)?;
            Ok(running)
        })?;
    }
    if running {
        feed(&mut decoder, &mut out, &[], true, &mut on_step)?;
    }

    let stats = decoder.stats();
    decoder.close();
    Ok(RunStats {
        frames_decoded: stats.frames_decoded,
        frames_dropped: stats.frames_dropped,
        frames_recovered: stats.frames_recovered,
        bytes_decoded: stats.bytes_decoded,
        bytes_skipped: stats.bytes_skipped,
        resyncs: stats.resyncs,
        bytes_read,
    })
}

/// Pushes `data` through the decoder until it is used up.
///
/// Returns `false` once the decoder reported the end of the stream.
fn feed<F>(
    decoder: &mut SimpleDecoder,
    out: &mut OutputFrame,
    mut data: &[u8],
    end_of_stream: bool,
    on_step: &mut F,
) -> Result<bool>
where
    F: FnMut(&SimpleDecoder, &ProcessInfo, &[u8]) -> Result<()>,
{
    loop {
        let input = RawInput {
            data,
            end_of_stream,
            frame_recover: false,
        };
        let step = match process_growing(decoder, &input, out) {
            Ok(step) => step,
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("decoding stopped after {} frames", decoder.stats().frames_decoded)
                });
            }
        };
        data = &data[step.consumed..];
        on_step(decoder, &step, out.decoded())?;

        match step.status {
            ProcessStatus::EndOfStream => return Ok(false),
            ProcessStatus::FrameDropped(_) => conceal(decoder, out, on_step)?,
            ProcessStatus::NeedMoreInput if data.is_empty() && !end_of_stream => return Ok(true),
            _ => {}
        }
    }
}

/// Fills the gap of a dropped frame when the codec can conceal it.
fn conceal<F>(decoder: &mut SimpleDecoder, out: &mut OutputFrame, on_step: &mut F) -> Result<()>
where
    F: FnMut(&SimpleDecoder, &ProcessInfo, &[u8]) -> Result<()>,
{
    match process_growing(decoder, &RawInput::recover(), out) {
        Ok(step) => on_step(decoder, &step, out.decoded()),
        Err(DecodeError::NotSupport) => {
            debug!("Codec cannot conceal lost frames");
            Ok(())
        }
        Err(e) => {
            warn!("Concealing a dropped frame failed: {e}");
            Ok(())
        }
    }
}

fn process_growing(
    decoder: &mut SimpleDecoder,
    input: &RawInput<'_>,
    out: &mut OutputFrame,
) -> Result<ProcessInfo, DecodeError> {
    match decoder.process(input, out) {
        Err(DecodeError::BufferNotEnough { needed }) => {
            debug!("Growing output buffer to {needed} bytes");
            out.grow_to(needed);
            decoder.process(input, out)
        }
        result => result,
    }
}

/// Layout of the PCM the shipped codecs produce: 8-bit and G.711 input is
/// widened to 16 bits.
fn output_format(info: &StreamInfo) -> FormatChunk {
    let bits = if info.bits_per_sample <= 8 {
        16
    } else {
        info.bits_per_sample
    };
    FormatChunk::pcm(info.sample_rate, info.channels.into(), bits.into())
}

enum AudioSink {
    Pcm(BufWriter<File>),
    Wav(WavWriter<File>),
}

impl AudioSink {
    /// `.pcm` and `.raw` get headerless samples, anything else a WAV file.
    fn create(path: &Path, format: FormatChunk) -> Result<Self> {
        let file =
            File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
        let raw = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pcm") || ext.eq_ignore_ascii_case("raw"));
        if raw {
            info!("Writing raw PCM to {}", path.display());
            return Ok(AudioSink::Pcm(BufWriter::new(file)));
        }

        let mut writer = WavWriter::new(file, format);
        writer.write_header()?;
        info!(
            "Writing WAV to {} ({} Hz, {} ch, {} bit)",
            path.display(),
            format.sample_rate,
            format.channels,
            format.bits_per_sample
        );
        Ok(AudioSink::Wav(writer))
    }

    fn write_pcm(&mut self, pcm: &[u8]) -> Result<()> {
        match self {
            AudioSink::Pcm(w) => w.write_all(pcm)?,
            AudioSink::Wav(w) => w.write_pcm(pcm)?,
        }
        Ok(())
    }

    fn finish(self) -> Result<()> {
        match self {
            AudioSink::Pcm(mut w) => w.flush()?,
            AudioSink::Wav(mut w) => w.finish()?,
        }
        Ok(())
    }
}

fn create_progress_bar(multi: &MultiProgress) -> Result<ProgressBar> {
    let pb = multi.add(ProgressBar::new_spinner());
    pb.set_style(ProgressStyle::with_template(
        "{spinner:.green} {pos} frames\n{msg} | elapsed: {elapsed_precise}",
    )?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("waiting for the first frame");
    Ok(pb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::command::Commands;
    use clap::Parser as ClapParser;

    fn wav_bytes(samples: &[i16]) -> Vec<u8> {
        let pcm = samples.iter().flat_map(|s| s.to_le_bytes()).collect::<Vec<_>>();
        let mut writer = WavWriter::new(std::io::Cursor::new(Vec::new()), FormatChunk::pcm(8000, 1, 16));
        writer.write_header().unwrap();
        writer.write_pcm(&pcm).unwrap();
        writer.finish().unwrap();
        writer.into_inner().unwrap().into_inner()
    }

    #[test]
    fn wav_round_trips_through_the_decoder() {
        let dir = std::env::temp_dir().join(format!("esdec-decode-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let input = dir.join("in.wav");
        let output = dir.join("out.wav");
        let samples = (0..3000).map(|i| (i * 7) as i16).collect::<Vec<_>>();
        std::fs::write(&input, wav_bytes(&samples)).unwrap();

        let cli = Cli::parse_from([
            "esdec",
            "decode",
            input.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
            "--chunk-size",
            "333",
            "--frame-samples",
            "100",
        ]);
        let Commands::Decode(args) = &cli.command else {
            panic!("expected decode");
        };
        cmd_decode(args, &cli, None).unwrap();

        assert_eq!(std::fs::read(&output).unwrap(), wav_bytes(&samples));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn run_stream_counts_frames() {
        let dir = std::env::temp_dir().join(format!("esdec-run-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let input = dir.join("tone.wav");
        std::fs::write(&input, wav_bytes(&[5; 250])).unwrap();

        let cli = Cli::parse_from(["esdec", "info", input.to_str().unwrap(), "--frame-samples", "100"]);
        let Commands::Info(args) = &cli.command else {
            panic!("expected info");
        };
        let registry = CodecRegistry::default();
        register_default_codecs(&registry);
        let mut sizes = Vec::new();
        let input = StreamInput::open(&args.stream).unwrap();
        assert_eq!(input.format, StreamFormat::Wav);
        let stats = run_stream(input, &registry, &args.stream, false, |_, step, _| {
            if step.status == ProcessStatus::Decoded {
                sizes.push(step.frame_size);
            }
            Ok(())
        })
        .unwrap();

        assert_eq!(sizes, vec![200, 200, 100]);
        assert_eq!(stats.frames_decoded, 3);
        assert_eq!(stats.bytes_read, 544);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
