use std::sync::Arc;

use anyhow::Result;
use esframe::codec::{CodecConfig, CodecHandle, CodecOps, CodecRegistry, CodecType};
use esframe::formats::StreamFormat;
use esframe::process::dispatch::ProcessStatus;
use esframe::process::frame::{DecodeInfo, OutputFrame};
use esframe::utils::errors::DecodeError;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use serde::Serialize;

use super::command::{Cli, InfoArgs};
use super::decode::{StreamInput, run_stream};
use crate::timestamp::{samples_to_secs, time_str};

pub fn cmd_info(args: &InfoArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!("Analyzing stream: {}", args.stream.input.display());

    let report = analyze_stream(args, cli, multi)?;
    if args.yaml {
        print!("{}", serde_yaml_ng::to_string(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

/// Codec stand-in that accepts every frame and produces no audio, so the
/// stream can be measured without a real engine.
struct Measure(CodecType);

struct MeasureHandle;

impl CodecOps for Measure {
    fn codec_type(&self) -> CodecType {
        self.0
    }

    fn open(&self, _cfg: &CodecConfig) -> Result<Box<dyn CodecHandle>, DecodeError> {
        Ok(Box::new(MeasureHandle))
    }
}

impl CodecHandle for MeasureHandle {
    fn decode(&mut self, input: &[u8], out: &mut OutputFrame) -> Result<DecodeInfo, DecodeError> {
        out.decoded_size = 0;
        Ok(DecodeInfo {
            consumed: input.len(),
            ..Default::default()
        })
    }
}

/// Registry measuring every codec `format` can carry.
fn measuring_registry(format: StreamFormat) -> Result<CodecRegistry> {
    let registry = CodecRegistry::default();
    let codecs = match format.codec_type() {
        Some(codec) => vec![codec],
        None => vec![CodecType::Pcm, CodecType::G711A, CodecType::G711U],
    };
    for codec in codecs {
        registry.register(Arc::new(Measure(codec)))?;
    }
    Ok(registry)
}

#[derive(Debug, Default, Serialize)]
pub struct StreamReport {
    pub format: String,
    pub codec: Option<String>,
    pub sample_rate: u32,
    pub channels: u8,
    pub bits_per_sample: u8,
    /// Nominal rate announced by the last header, bits per second.
    pub bitrate: u32,
    pub frames: u64,
    pub min_frame_bytes: usize,
    pub max_frame_bytes: usize,
    pub avg_frame_bytes: f64,
    pub duration_secs: f64,
    pub total_bytes: u64,
    pub skipped_bytes: u64,
    pub resyncs: u64,
}

#[derive(Default)]
struct FrameSizes {
    count: u64,
    total: u64,
    min: Option<usize>,
    max: usize,
}

impl FrameSizes {
    fn push(&mut self, size: usize) {
        self.count += 1;
        self.total += size as u64;
        self.min = Some(self.min.map_or(size, |min| min.min(size)));
        self.max = self.max.max(size);
    }
}

fn analyze_stream(
    args: &InfoArgs,
    cli: &Cli,
    multi: Option<&MultiProgress>,
) -> Result<StreamReport> {
    let pb = match multi {
        Some(multi) => {
            let pb = multi.add(ProgressBar::new_spinner());
            pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
            pb.enable_steady_tick(std::time::Duration::from_millis(100));
            pb.set_message("Analyzing frames...");
            Some(pb)
        }
        None => None,
    };

    let input = StreamInput::open(&args.stream)?;
    let format = input.format;
    let registry = measuring_registry(format)?;

    let mut sizes = FrameSizes::default();
    let mut stream_info = None;
    let stats = run_stream(input, &registry, &args.stream, cli.strict, |decoder, step, _| {
        if matches!(
            step.status,
            ProcessStatus::Decoded | ProcessStatus::FrameDropped(_)
        ) {
            sizes.push(step.frame_size);
            if let Some(pb) = &pb {
                pb.set_message(format!("{} frames", sizes.count));
            }
        }
        if let Some(info) = decoder.stream_info() {
            stream_info = Some(*info);
        }
        Ok(())
    })?;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let mut report = StreamReport {
        format: format.to_string(),
        frames: sizes.count,
        min_frame_bytes: sizes.min.unwrap_or(0),
        max_frame_bytes: sizes.max,
        avg_frame_bytes: if sizes.count > 0 {
            sizes.total as f64 / sizes.count as f64
        } else {
            0.0
        },
        total_bytes: stats.bytes_read,
        skipped_bytes: stats.bytes_skipped,
        resyncs: stats.resyncs,
        ..Default::default()
    };

    if let Some(info) = stream_info {
        report.codec = Some(info.codec.to_string());
        report.sample_rate = info.sample_rate;
        report.channels = info.channels;
        report.bits_per_sample = info.bits_per_sample;
        report.bitrate = info.bitrate;
        report.duration_secs = match info.codec {
            CodecType::Pcm | CodecType::G711A | CodecType::G711U if info.bitrate > 0 => {
                sizes.total as f64 * 8.0 / info.bitrate as f64
            }
            _ => samples_to_secs(sizes.count * info.frame_samples as u64, info.sample_rate),
        };
    }
    Ok(report)
}

fn print_report(report: &StreamReport) {
    println!();
    println!("Stream Information");
    println!("  Format                    {}", report.format);
    match &report.codec {
        Some(codec) => {
            println!("  Codec                     {codec}");
            println!("  Sampling rate             {} Hz", report.sample_rate);
            println!("  Channels                  {}", report.channels);
            if report.bits_per_sample > 0 {
                println!("  Bits per sample           {}", report.bits_per_sample);
            }
            if report.bitrate > 0 {
                println!("  Nominal bitrate           {:.1} kbps", report.bitrate as f64 / 1000.0);
            }
        }
        None => println!("  No frame found in the stream."),
    }
    println!();

    println!("Analysis Summary");
    println!("  Frames                    {}", report.frames);
    if report.frames > 0 {
        println!(
            "  Frame size                {}..{} bytes (avg {:.1})",
            report.min_frame_bytes, report.max_frame_bytes, report.avg_frame_bytes
        );
    }
    let size_mb = report.total_bytes as f64 / 1_000_000.0;
    println!(
        "  Size                      {size_mb:.2} MB ({} bytes)",
        report.total_bytes
    );
    if report.duration_secs > 0.0 {
        println!("  Duration                  {}", time_str(report.duration_secs));
        let payload = report.avg_frame_bytes * report.frames as f64;
        println!(
            "  Average data rate         {:.1} kbps",
            payload * 8.0 / report.duration_secs / 1000.0
        );
    }
    println!("  Skipped bytes             {}", report.skipped_bytes);
    println!("  Resyncs                   {}", report.resyncs);
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::command::Commands;
    use clap::Parser as ClapParser;

    #[test]
    fn measures_amr_without_a_codec() {
        let dir = std::env::temp_dir().join(format!("esdec-info-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let input = dir.join("speech.amr");
        // MR475 frames: TOC 0x04 followed by 12 bytes.
        let mut data = b"#!AMR\n".to_vec();
        for i in 0..50u8 {
            data.push(0x04);
            data.extend([i; 12]);
        }
        std::fs::write(&input, &data).unwrap();

        let cli = Cli::parse_from(["esdec", "info", input.to_str().unwrap(), "--yaml"]);
        let Commands::Info(args) = &cli.command else {
            panic!("expected info");
        };
        let report = analyze_stream(args, &cli, None).unwrap();

        assert_eq!(report.frames, 50);
        assert_eq!(report.min_frame_bytes, 13);
        assert_eq!(report.max_frame_bytes, 13);
        assert_eq!(report.sample_rate, 8000);
        assert_eq!(report.skipped_bytes, 6);
        assert!((report.duration_secs - 1.0).abs() < 1e-9);
        assert!(serde_yaml_ng::to_string(&report).unwrap().contains("frames: 50"));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
