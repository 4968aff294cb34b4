mod common;

use common::*;
use esframe::codec::{CodecRegistry, CodecType, register_default_codecs};
use esframe::formats::StreamFormat;
use esframe::process::dispatch::{ProcessStatus, SimpleDecoder, SimpleDecoderConfig};
use esframe::process::frame::{OutputFrame, RawInput};
use esframe::process::parse::{FrameLen, RawCursor};
use esframe::utils::errors::DecodeError;
use proptest::prelude::*;

fn streams() -> Vec<(StreamFormat, CodecType, Vec<u8>, Vec<u8>)> {
    let amr = amr_nb_stream(20);
    let adts = adts_stream(&[100, 7, 513, 64, 64, 2000, 9]);
    let mp3 = [mp3_frame(false), mp3_frame(true), mp3_frame(false)].concat();
    vec![
        (StreamFormat::Amr, CodecType::AmrNb, amr[6..].to_vec(), amr),
        (StreamFormat::Aac, CodecType::Aac, adts.clone(), adts),
        (StreamFormat::Mp3, CodecType::Mp3, mp3.clone(), mp3),
    ]
}

proptest! {
    /// Advancing by `consumed` walks the whole input exactly once, whatever
    /// the window sizes, and every frame comes out once.
    #[test]
    fn consumption_adds_up_for_any_chunking(
        stream in 0usize..3,
        windows in prop::collection::vec(1usize..700, 1..32),
        capacity in 0usize..64,
    ) {
        let (format, codec, frames, data) = streams().swap_remove(stream);
        let registry = registry_with(EchoOps::new(codec));
        let mut decoder = SimpleDecoder::open_in(&registry, format, SimpleDecoderConfig::default())?;
        let mut out = OutputFrame::with_capacity(capacity);
        let mut pos = 0;
        let mut pcm = Vec::new();

        for window in windows.iter().cycle() {
            let end = (pos + window).min(data.len());
            let input = RawInput {
                data: &data[pos..end],
                end_of_stream: end == data.len(),
                frame_recover: false,
            };
            let info = match decoder.process(&input, &mut out) {
                Ok(info) => info,
                Err(DecodeError::BufferNotEnough { needed }) => {
                    out.grow_to(needed);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            prop_assert!(info.consumed <= end - pos, "{}", format);
            pos += info.consumed;
            pcm.extend_from_slice(out.decoded());
            if info.status == ProcessStatus::EndOfStream {
                break;
            }
        }

        prop_assert_eq!(pos, data.len());
        prop_assert_eq!(pcm, frames);
    }

    /// Growing to `needed_size` is always enough for the retry to succeed.
    #[test]
    fn grown_buffer_always_satisfies_the_retry(
        frame_samples in 1u32..400,
        capacity in 0usize..32,
        payload in prop::collection::vec(any::<u8>(), 1..3000),
    ) {
        let registry = CodecRegistry::default();
        register_default_codecs(&registry);
        let data = wav_file(6, 1, 8, &payload);
        let config = SimpleDecoderConfig {
            wav_frame_samples: frame_samples,
            ..Default::default()
        };
        let mut decoder = SimpleDecoder::open_in(&registry, StreamFormat::Wav, config)?;
        let mut out = OutputFrame::with_capacity(capacity);
        let mut input = &data[..];

        loop {
            let info = match decoder.process(&RawInput::eos(input), &mut out) {
                Ok(info) => info,
                Err(DecodeError::BufferNotEnough { needed }) => {
                    prop_assert_eq!(out.needed_size, needed);
                    out.grow_to(needed);
                    let info = decoder.process(&RawInput::eos(input), &mut out)?;
                    prop_assert_eq!(&info.status, &ProcessStatus::Decoded);
                    info
                }
                Err(e) => return Err(e.into()),
            };
            input = &input[info.consumed..];
            if info.status == ProcessStatus::EndOfStream {
                break;
            }
        }
        prop_assert!(input.is_empty());
        prop_assert_eq!(decoder.stats().bytes_decoded, 2 * payload.len() as u64);
    }

    /// Noise between frames is skipped and counted, never decoded.
    #[test]
    fn garbage_never_breaks_conservation(
        segments in prop::collection::vec(
            (prop::collection::vec(0u8..0x40, 0..20), 8usize..300),
            1..8,
        ),
        window in 1usize..128,
    ) {
        let registry = registry_with(EchoOps::new(CodecType::Aac));
        let mut data = Vec::new();
        let mut frames = Vec::new();
        for (i, (noise, len)) in segments.iter().enumerate() {
            data.extend_from_slice(noise);
            let frame = adts_frame(*len, i as u8);
            frames.extend_from_slice(&frame);
            data.extend(frame);
        }

        let mut decoder =
            SimpleDecoder::open_in(&registry, StreamFormat::Aac, SimpleDecoderConfig::default())?;
        let mut out = OutputFrame::with_capacity(512);
        let run = run_chunked(&mut decoder, &data, window, &mut out)?;

        prop_assert_eq!(run.consumed, data.len());
        prop_assert_eq!(&run.pcm, &frames);
        prop_assert_eq!(
            decoder.stats().bytes_skipped as usize,
            data.len() - frames.len()
        );
    }
}

#[test]
fn parsing_is_repeatable() {
    for (format, _, _, data) in streams() {
        let mut parser = format.parser(1024);
        let mut pos = 0;
        let mut begin = true;

        while pos < data.len() {
            let cursor = RawCursor::new(&data[pos..]).begin_of_stream(begin);
            let first = parser.parse(&cursor);
            let second = parser.parse(&cursor);
            assert_eq!(first, second, "{format} at {pos}");

            let info = first.expect("well-formed stream");
            let step = match info.frame {
                FrameLen::Frame(len) => len + info.skipped_size,
                FrameLen::Skip => info.skipped_size,
                FrameLen::Reparse => panic!("{format} asked to reparse"),
            };
            assert!(step > 0);
            pos += step;
            begin = false;
        }
    }
}
