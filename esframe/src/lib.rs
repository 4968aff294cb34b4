//! Elementary-stream frame synchronisation and decode dispatch.
//!
//! ## Technical Overview
//!
//! Audio elementary streams arrive in arbitrary chunks. Turning them into PCM
//! takes three cooperating pieces:
//!
//! - A **frame parser** per stream format that finds frame boundaries,
//!   skips file headers and tags, and re-synchronises after corruption.
//! - A **codec registry** mapping codec types to decoder engines.
//! - A **dispatcher** that feeds complete frames from the parser to the
//!   codec, holding partial frames across chunk boundaries.
//!
//! ### Buffer Negotiation
//!
//! Output buffers belong to the caller. When a frame does not fit, the call
//! fails with [`DecodeError::BufferNotEnough`](utils::errors::DecodeError)
//! carrying the required size, consumes nothing and can be retried verbatim
//! once the buffer has grown.
//!
//! ### Supported Streams
//!
//! - AMR-NB / AMR-WB storage format (RFC 4867 §5)
//! - AAC in ADTS framing
//! - MPEG audio layers I-III, including free-format bitrates
//! - RIFF/WAVE with PCM or G.711 payload
//!
//! ## Quick Start
//!
//! 1. Register engines with [`codec::register_default_codecs`] or
//!    [`codec::CodecRegistry::register`]
//! 2. Open a [`process::dispatch::SimpleDecoder`] for a
//!    [`formats::StreamFormat`]
//! 3. Call `process` in a loop, advancing the input by `consumed`
//!
//! ```rust
//! use esframe::codec::register_default_codecs;
//! use esframe::codec::registry;
//! use esframe::formats::StreamFormat;
//! use esframe::process::dispatch::{ProcessStatus, SimpleDecoder, SimpleDecoderConfig};
//! use esframe::process::frame::{OutputFrame, RawInput};
//! use esframe::process::EXAMPLE_DATA;
//! use esframe::utils::errors::DecodeError;
//!
//! register_default_codecs(registry());
//! let mut decoder = SimpleDecoder::open(StreamFormat::Wav, SimpleDecoderConfig::default())?;
//! let mut out = OutputFrame::with_capacity(4096);
//! let mut input = EXAMPLE_DATA;
//!
//! loop {
//!     match decoder.process(&RawInput::eos(input), &mut out) {
//!         Ok(info) if info.status == ProcessStatus::EndOfStream => break,
//!         Ok(info) => {
//!             input = &input[info.consumed..];
//!             assert_eq!(out.decoded(), [1, 0, 2, 0, 3, 0, 4, 0]);
//!         }
//!         Err(DecodeError::BufferNotEnough { needed }) => out.grow_to(needed),
//!         Err(e) => return Err(e.into()),
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Codec registry and the built-in engines.
///
/// - **Registry** ([`codec::registry`]): Type-to-engine table
/// - **PCM** ([`codec::pcm`]): Linear PCM pass-through
/// - **G.711** ([`codec::g711`]): A-law and μ-law expansion
pub mod codec;

/// Frame parsers for each supported stream format.
pub mod formats;

/// Parsing, buffer handling and the decode loop.
///
/// 1. **Parsing** ([`process::parse`]): Parser protocol and result types.
///
/// 2. **Frames** ([`process::frame`]): Caller-owned input and output buffers.
///
/// 3. **Dispatch** ([`process::dispatch`]): The simple decoder.
pub mod process;

/// Utility functions and supporting infrastructure.
///
/// - **Bitstream I/O** ([`utils::bitstream_io`]): Bit-level reading
/// - **Error Handling** ([`utils::errors`]): Error types and status codes
/// - **Frame Cache** ([`utils::frame_cache`]): Bounded carry-over buffer
pub mod utils;
