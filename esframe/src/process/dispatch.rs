use std::collections::HashMap;
use std::sync::Arc;

use log::{Level, debug, error, warn};

use crate::codec::{CodecConfig, CodecHandle, CodecOps, CodecRegistry, CodecType, registry};
use crate::formats::{DEFAULT_WAV_FRAME_SAMPLES, StreamFormat};
use crate::log_or_err;
use crate::process::frame::{OutputFrame, RawInput};
use crate::process::parse::{FrameInfo, FrameLen, FrameParser, RawCursor, StreamInfo};
use crate::utils::errors::{DecodeError, StreamError};
use crate::utils::frame_cache::FrameCache;

/// What to do when the codec rejects a frame the parser accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailPolicy {
    /// Return the codec error; the frame stays unconsumed.
    #[default]
    Abort,
    /// Log the error, drop the frame and carry on with the next one.
    SkipFrame,
}

#[derive(Debug, Clone)]
pub struct SimpleDecoderConfig {
    /// Passed to the codec's `open`.
    pub codec_config: CodecConfig,
    /// Bytes that may be discarded while hunting for a frame header.
    pub resync_limit: usize,
    /// Hard bound of the carry-over cache.
    pub cache_limit: usize,
    pub fail_policy: FailPolicy,
    /// Losing sync after the first frame is fatal at or below this level.
    pub fail_level: Level,
    pub wav_frame_samples: u32,
}

impl Default for SimpleDecoderConfig {
    fn default() -> Self {
        Self {
            codec_config: CodecConfig::Default,
            resync_limit: 64 * 1024,
            cache_limit: 1024 * 1024,
            fail_policy: FailPolicy::Abort,
            fail_level: Level::Error,
            wav_frame_samples: DEFAULT_WAV_FRAME_SAMPLES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    Ready,
    AwaitingMoreInput,
    Flushing,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessStatus {
    /// A frame was decoded into the output buffer.
    Decoded,
    /// A lost frame was concealed by the codec.
    Recovered,
    /// Input was absorbed but no full frame is available yet.
    NeedMoreInput,
    /// The codec rejected a frame and [`FailPolicy::SkipFrame`] dropped it.
    FrameDropped(DecodeError),
    /// Nothing further can be extracted.
    EndOfStream,
}

/// Outcome of one [`SimpleDecoder::process`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    /// Input bytes used by this call; the caller advances by exactly this.
    pub consumed: usize,
    pub decoded_size: usize,
    pub frame_size: usize,
    pub skipped_size: usize,
    pub status: ProcessStatus,
}

impl ProcessInfo {
    fn new(consumed: usize, status: ProcessStatus) -> Self {
        Self {
            consumed,
            decoded_size: 0,
            frame_size: 0,
            skipped_size: 0,
            status,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DecoderStats {
    pub frames_decoded: u64,
    pub frames_dropped: u64,
    pub frames_recovered: u64,
    pub bytes_decoded: u64,
    pub bytes_skipped: u64,
    pub resyncs: u64,
}

/// Drives a frame parser and a codec over a chunked byte stream.
///
/// Each [`process`](Self::process) call decodes at most one frame. Bytes that
/// do not yet form a frame are moved into an internal cache and reported as
/// consumed, so the caller's loop is always "advance by `consumed`, feed more
/// when the input is used up, then flush with `end_of_stream`".
///
/// # Example
///
/// ```rust
/// use esframe::codec::{CodecRegistry, register_default_codecs};
/// use esframe::formats::StreamFormat;
/// use esframe::process::dispatch::{ProcessStatus, SimpleDecoder, SimpleDecoderConfig};
/// use esframe::process::frame::{OutputFrame, RawInput};
/// use esframe::process::EXAMPLE_DATA;
/// use esframe::utils::errors::DecodeError;
///
/// let registry = CodecRegistry::default();
/// register_default_codecs(&registry);
///
/// let mut decoder =
///     SimpleDecoder::open_in(&registry, StreamFormat::Wav, SimpleDecoderConfig::default())?;
/// let mut out = OutputFrame::with_capacity(4);
/// let mut input = EXAMPLE_DATA;
/// let mut pcm = Vec::new();
///
/// loop {
///     match decoder.process(&RawInput::eos(input), &mut out) {
///         Ok(info) => {
///             input = &input[info.consumed..];
///             pcm.extend_from_slice(out.decoded());
///             if info.status == ProcessStatus::EndOfStream {
///                 break;
///             }
///         }
///         Err(DecodeError::BufferNotEnough { needed }) => out.grow_to(needed),
///         Err(e) => return Err(e),
///     }
/// }
/// assert_eq!(pcm, [1, 0, 2, 0, 3, 0, 4, 0]);
/// # Ok::<(), DecodeError>(())
/// ```
pub struct SimpleDecoder {
    parser: Box<dyn FrameParser>,
    codec: Option<Box<dyn CodecHandle>>,
    codec_type: Option<CodecType>,
    /// Engines a container header may select, captured at open.
    candidates: HashMap<CodecType, Arc<dyn CodecOps>>,
    cache: FrameCache,
    state: DecoderState,
    begin_of_stream: bool,
    pending_skip: usize,
    remaining_payload: Option<u64>,
    resyncs_since_frame: usize,
    locked: bool,
    stream_info: Option<StreamInfo>,
    applied_codec_config: Option<Vec<u8>>,
    config: SimpleDecoderConfig,
    stats: DecoderStats,
}

impl std::fmt::Debug for SimpleDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleDecoder")
            .field("parser", &self.parser.name())
            .field("codec_type", &self.codec_type)
            .field("state", &self.state)
            .field("cached", &self.cache.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl SimpleDecoder {
    /// Opens a decoder for `format` using the process-wide registry.
    pub fn open(format: StreamFormat, config: SimpleDecoderConfig) -> Result<Self, DecodeError> {
        Self::open_in(registry(), format, config)
    }

    pub fn open_in(
        registry: &CodecRegistry,
        format: StreamFormat,
        config: SimpleDecoderConfig,
    ) -> Result<Self, DecodeError> {
        let parser = format.configured_parser(config.wav_frame_samples, &config.codec_config);
        Self::with_parser(registry, parser, format.codec_type(), config)
    }

    /// Opens a decoder around a caller-supplied parser.
    ///
    /// With `codec_type` set the codec is opened immediately. Otherwise it is
    /// opened on the first frame, from the codec named in the parser's
    /// [`StreamInfo`].
    pub fn with_parser(
        registry: &CodecRegistry,
        parser: Box<dyn FrameParser>,
        codec_type: Option<CodecType>,
        config: SimpleDecoderConfig,
    ) -> Result<Self, DecodeError> {
        let (codec, candidates) = match codec_type {
            Some(codec_type) => {
                let ops = registry
                    .get(codec_type)
                    .ok_or(DecodeError::NotFound(codec_type))?;
                (Some(ops.open(&config.codec_config)?), HashMap::new())
            }
            None => (None, registry.snapshot()),
        };
        debug!(
            "Opened {} decoder (codec {})",
            parser.name(),
            codec_type.map_or_else(|| "from header".to_string(), |c| c.to_string())
        );

        Ok(Self {
            parser,
            codec,
            codec_type,
            candidates,
            cache: FrameCache::new(config.cache_limit, 8 * 1024),
            state: DecoderState::Ready,
            begin_of_stream: true,
            pending_skip: 0,
            remaining_payload: None,
            resyncs_since_frame: 0,
            locked: false,
            stream_info: None,
            applied_codec_config: None,
            config,
            stats: DecoderStats::default(),
        })
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn codec_type(&self) -> Option<CodecType> {
        self.codec_type
    }

    pub fn stream_info(&self) -> Option<&StreamInfo> {
        self.stream_info.as_ref()
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Bytes held in the carry-over cache.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Runs one step of the decode loop.
    ///
    /// # Errors
    ///
    /// * [`DecodeError::BufferNotEnough`] - `out.needed_size` holds a
    ///   sufficient capacity; nothing was consumed, retry with the same input
    /// * [`DecodeError::Stream`] - the stream does not match the format
    /// * [`DecodeError::MemLack`] - a frame would outgrow the cache limit
    /// * any codec error when [`FailPolicy::Abort`] is configured
    pub fn process(
        &mut self,
        input: &RawInput<'_>,
        out: &mut OutputFrame,
    ) -> Result<ProcessInfo, DecodeError> {
        if self.state == DecoderState::Closed {
            return Err(DecodeError::InvalidParameter(
                "process called on a closed decoder".into(),
            ));
        }
        out.decoded_size = 0;

        if input.frame_recover {
            return self.recover(out);
        }
        // Remainder of a skip that ran past the previous input.
        let pre_skip = self.pending_skip.min(input.data.len());
        let data = &input.data[pre_skip..];
        if self.pending_skip > pre_skip {
            self.stats.bytes_skipped += pre_skip as u64;
            let status = if input.end_of_stream {
                debug!(
                    "Stream ended {} bytes short of a skipped region",
                    self.pending_skip - pre_skip
                );
                self.pending_skip = 0;
                self.cache.clear();
                self.state = DecoderState::Flushing;
                ProcessStatus::EndOfStream
            } else {
                self.pending_skip -= pre_skip;
                ProcessStatus::NeedMoreInput
            };
            return Ok(ProcessInfo {
                skipped_size: pre_skip,
                ..ProcessInfo::new(pre_skip, status)
            });
        }

        let cached = self.cache.len();
        let appended = if cached > 0 {
            let room = self.cache.limit().saturating_sub(cached);
            let take = data.len().min(room);
            self.cache.extend(&data[..take])?;
            take
        } else {
            0
        };

        let params = ScanParams {
            begin_of_stream: self.begin_of_stream,
            end_of_stream: input.end_of_stream && (cached == 0 || appended == data.len()),
            resync_limit: self.config.resync_limit,
            resyncs: self.resyncs_since_frame,
            locked: self.locked,
            fail_level: self.config.fail_level,
            remaining: self.remaining_payload,
        };
        let view = if cached > 0 { self.cache.as_slice() } else { data };
        let scan = match scan_frames(self.parser.as_mut(), view, params) {
            Ok(scan) => scan,
            Err(e) => {
                self.cache.truncate(cached);
                error!("{} stream cannot continue: {e}", self.parser.name());
                return Err(e);
            }
        };

        match scan.outcome {
            Outcome::Frame { start, len } => {
                let end = start + len;
                if let Err(e) = self.prepare_codec(&scan) {
                    self.cache.truncate(cached);
                    return Err(e);
                }
                let view = if cached > 0 { self.cache.as_slice() } else { data };
                let Some(codec) = self.codec.as_mut() else {
                    self.cache.truncate(cached);
                    return Err(DecodeError::InvalidParameter("no codec open".into()));
                };

                match codec.decode(&view[start..end], out) {
                    Ok(decoded) => {
                        let consumed = pre_skip + self.commit_frame(&scan, pre_skip, cached, end);
                        self.pending_skip = 0;
                        self.state = if input.end_of_stream {
                            DecoderState::Flushing
                        } else {
                            DecoderState::Ready
                        };
                        self.stats.frames_decoded += 1;
                        self.stats.bytes_decoded += decoded.decoded_size as u64;
                        out.decoded_size = decoded.decoded_size;

                        Ok(ProcessInfo {
                            consumed,
                            decoded_size: decoded.decoded_size,
                            frame_size: len,
                            skipped_size: pre_skip + scan.skipped,
                            status: ProcessStatus::Decoded,
                        })
                    }
                    Err(DecodeError::BufferNotEnough { needed }) => {
                        self.cache.truncate(cached);
                        out.needed_size = needed;
                        out.decoded_size = 0;
                        debug!("Output buffer too small, {needed} bytes needed");
                        Err(DecodeError::BufferNotEnough { needed })
                    }
                    Err(e) if self.config.fail_policy == FailPolicy::SkipFrame => {
                        warn!("Dropping {len}-byte frame: {e}");
                        let consumed = pre_skip + self.commit_frame(&scan, pre_skip, cached, end);
                        self.pending_skip = 0;
                        self.stats.frames_dropped += 1;
                        out.decoded_size = 0;

                        Ok(ProcessInfo {
                            consumed,
                            decoded_size: 0,
                            frame_size: len,
                            skipped_size: pre_skip + scan.skipped,
                            status: ProcessStatus::FrameDropped(e),
                        })
                    }
                    Err(e) => {
                        self.cache.truncate(cached);
                        error!("Decoding {len}-byte frame failed: {e}");
                        Err(e)
                    }
                }
            }
            Outcome::NeedMore { start } => {
                if cached == 0 {
                    self.cache.extend(&data[start..])?;
                } else {
                    self.cache.consume_front(start);
                    if appended == 0 && self.cache.len() >= self.cache.limit() {
                        return Err(DecodeError::MemLack);
                    }
                }
                let consumed = pre_skip + if cached > 0 { appended } else { data.len() };
                self.commit_scan(&scan, pre_skip);
                self.pending_skip = scan.pending_skip;
                self.state = DecoderState::AwaitingMoreInput;

                Ok(ProcessInfo {
                    skipped_size: pre_skip + scan.skipped,
                    ..ProcessInfo::new(consumed, ProcessStatus::NeedMoreInput)
                })
            }
            Outcome::Exhausted => {
                let consumed = pre_skip + if cached > 0 { appended } else { data.len() };
                let dropped = view.len().saturating_sub(scan.skipped) as u64;
                self.cache.clear();
                self.commit_scan(&scan, pre_skip);
                self.pending_skip = 0;
                self.stats.bytes_skipped += dropped;
                self.state = DecoderState::Flushing;
                if dropped > 0 {
                    debug!("Discarding {dropped} trailing bytes at end of stream");
                }

                Ok(ProcessInfo {
                    skipped_size: pre_skip + scan.skipped,
                    ..ProcessInfo::new(consumed, ProcessStatus::EndOfStream)
                })
            }
        }
    }

    /// Releases the codec and the cache. Later calls fail.
    pub fn close(&mut self) {
        if self.state == DecoderState::Closed {
            return;
        }
        if let Some(mut codec) = self.codec.take() {
            codec.close();
        }
        self.cache.release();
        self.candidates.clear();
        self.state = DecoderState::Closed;
        debug!(
            "Closed {} decoder after {} frames",
            self.parser.name(),
            self.stats.frames_decoded
        );
    }

    fn recover(&mut self, out: &mut OutputFrame) -> Result<ProcessInfo, DecodeError> {
        let codec = self.codec.as_mut().ok_or_else(|| {
            DecodeError::InvalidParameter("cannot conceal a frame before the codec is known".into())
        })?;
        let info = codec.recover(out)?;
        out.decoded_size = info.decoded_size;
        self.stats.frames_recovered += 1;

        Ok(ProcessInfo {
            decoded_size: info.decoded_size,
            ..ProcessInfo::new(0, ProcessStatus::Recovered)
        })
    }

    /// Opens the codec chosen by the container header and hands it any
    /// configuration bytes it has not seen yet.
    fn prepare_codec(&mut self, scan: &Scan) -> Result<(), DecodeError> {
        let stream_info = scan.stream_info.or(self.stream_info);

        if self.codec.is_none() {
            let codec_type = stream_info
                .map(|info| info.codec)
                .ok_or(DecodeError::Stream(StreamError::NotFound))?;
            let ops = self
                .candidates
                .get(&codec_type)
                .ok_or(DecodeError::NotFound(codec_type))?;
            self.codec = Some(ops.open(&self.config.codec_config)?);
            self.codec_type = Some(codec_type);
            self.applied_codec_config = None;
            debug!("Opened codec {codec_type} from stream header");
        }

        if let (Some(config), Some(codec)) = (scan.codec_config.as_ref(), self.codec.as_mut()) {
            if self.applied_codec_config.as_ref() != Some(config) {
                codec.set_codec_config(config)?;
                self.applied_codec_config = Some(config.clone());
            }
        }
        Ok(())
    }

    /// Applies header facts and resync bookkeeping learned by a scan.
    fn commit_scan(&mut self, scan: &Scan, pre_skip: usize) {
        self.begin_of_stream = scan.begin_of_stream;
        self.resyncs_since_frame = scan.resyncs;
        self.stats.resyncs += scan.resynced as u64;
        self.stats.bytes_skipped += (pre_skip + scan.skipped) as u64;
        if scan.stream_info.is_some() {
            self.stream_info = scan.stream_info;
        }
        if scan.remaining.is_some() {
            self.remaining_payload = scan.remaining;
        }
    }

    /// Drops the decoded frame from the cache and returns how much of the
    /// current input it used.
    fn commit_frame(&mut self, scan: &Scan, pre_skip: usize, cached: usize, end: usize) -> usize {
        self.commit_scan(scan, pre_skip);
        self.resyncs_since_frame = 0;
        self.locked = true;
        if let (Some(remaining), Outcome::Frame { len, .. }) =
            (self.remaining_payload.as_mut(), &scan.outcome)
        {
            *remaining -= (*len as u64).min(*remaining);
        }

        if cached == 0 {
            end
        } else if end >= cached {
            self.cache.clear();
            end - cached
        } else {
            self.cache.truncate(cached);
            self.cache.consume_front(end);
            0
        }
    }
}

impl Drop for SimpleDecoder {
    fn drop(&mut self) {
        self.close();
    }
}

#[derive(Debug, Clone, Copy)]
struct ScanParams {
    begin_of_stream: bool,
    end_of_stream: bool,
    resync_limit: usize,
    resyncs: usize,
    locked: bool,
    fail_level: Level,
    remaining: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Frame { start: usize, len: usize },
    NeedMore { start: usize },
    Exhausted,
}

#[derive(Debug)]
struct Scan {
    outcome: Outcome,
    begin_of_stream: bool,
    skipped: usize,
    pending_skip: usize,
    resyncs: usize,
    resynced: usize,
    remaining: Option<u64>,
    stream_info: Option<StreamInfo>,
    codec_config: Option<Vec<u8>>,
}

/// Walks the parser over `view` until it yields a frame, needs more data or
/// runs out of stream. Touches no dispatcher state.
fn scan_frames(
    parser: &mut dyn FrameParser,
    view: &[u8],
    params: ScanParams,
) -> Result<Scan, DecodeError> {
    let mut scan = Scan {
        outcome: Outcome::Exhausted,
        begin_of_stream: params.begin_of_stream,
        skipped: 0,
        pending_skip: 0,
        resyncs: params.resyncs,
        resynced: 0,
        remaining: params.remaining,
        stream_info: None,
        codec_config: None,
    };
    let mut pos = 0;
    let starve = |scan: Scan, start: usize| -> Scan {
        Scan {
            outcome: if params.end_of_stream {
                Outcome::Exhausted
            } else {
                Outcome::NeedMore { start }
            },
            ..scan
        }
    };

    loop {
        if scan.remaining == Some(0) {
            return Ok(Scan {
                outcome: Outcome::Exhausted,
                ..scan
            });
        }
        let rest = &view[pos..];
        if rest.is_empty() {
            return Ok(starve(scan, pos));
        }

        let cursor = RawCursor::new(rest)
            .begin_of_stream(scan.begin_of_stream)
            .end_of_stream(params.end_of_stream);
        let result = parser.parse(&cursor);

        let info = match result {
            Ok(info) => info,
            Err(StreamError::DataNotEnough) => return Ok(starve(scan, pos)),
            Err(StreamError::WrongHeader) => {
                resync(&mut scan, &params)?;
                pos += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let was_begin = scan.begin_of_stream;
        scan.begin_of_stream = false;
        absorb_header(&mut scan, &info, was_begin);

        match info.frame {
            FrameLen::Skip => {
                if info.skipped_size == 0 {
                    return Err(DecodeError::Fail(format!(
                        "{} parser made no progress",
                        parser.name()
                    )));
                }
                if info.skipped_size > rest.len() {
                    scan.skipped += rest.len();
                    if params.end_of_stream {
                        return Ok(Scan {
                            outcome: Outcome::Exhausted,
                            ..scan
                        });
                    }
                    scan.pending_skip = info.skipped_size - rest.len();
                    return Ok(Scan {
                        outcome: Outcome::NeedMore { start: view.len() },
                        ..scan
                    });
                }
                debug!("{} parser skipped {} bytes", parser.name(), info.skipped_size);
                scan.skipped += info.skipped_size;
                pos += info.skipped_size;
            }
            FrameLen::Frame(size) => {
                let start = pos + info.skipped_size;
                if size == 0 || start + size > view.len() {
                    return Err(DecodeError::Fail(format!(
                        "{} parser reported a {size}-byte frame with {} bytes available",
                        parser.name(),
                        view.len() - start.min(view.len())
                    )));
                }
                scan.skipped += info.skipped_size;
                let len = match scan.remaining {
                    Some(remaining) => size.min(remaining as usize),
                    None => size,
                };
                return Ok(Scan {
                    outcome: Outcome::Frame { start, len },
                    ..scan
                });
            }
            FrameLen::Reparse => {
                if info.max_frame_size > 0 && rest.len() >= info.max_frame_size {
                    debug!(
                        "No frame end within {} bytes, resyncing",
                        info.max_frame_size
                    );
                    resync(&mut scan, &params)?;
                    pos += 1;
                    continue;
                }
                return Ok(starve(scan, pos));
            }
        }
    }
}

/// Counts one byte discarded while hunting for a header.
fn resync(scan: &mut Scan, params: &ScanParams) -> Result<(), DecodeError> {
    if params.locked && scan.resyncs == 0 {
        log_or_err!(params, Level::Warn, DecodeError::Stream(StreamError::WrongHeader));
    }
    scan.resyncs += 1;
    scan.resynced += 1;
    scan.skipped += 1;
    if scan.resyncs > params.resync_limit {
        return Err(DecodeError::Stream(StreamError::WrongHeader));
    }
    Ok(())
}

fn absorb_header(scan: &mut Scan, info: &FrameInfo, begin_of_stream: bool) {
    if info.stream_info.is_some() {
        scan.stream_info = info.stream_info;
    }
    if info.codec_config.is_some() {
        scan.codec_config = info.codec_config.clone();
    }
    if begin_of_stream && info.total_size > 0 {
        scan.remaining = Some(info.total_size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `0xA5` is a one-byte frame, `0x00` starts a two-byte filler.
    struct ByteFrames;

    impl FrameParser for ByteFrames {
        fn parse(&mut self, cursor: &RawCursor<'_>) -> Result<FrameInfo, StreamError> {
            match cursor.peek(1)?[0] {
                0xA5 => Ok(FrameInfo::frame(1)),
                0x00 => Ok(FrameInfo::skip(2)),
                _ => Err(StreamError::WrongHeader),
            }
        }

        fn name(&self) -> &'static str {
            "bytes"
        }
    }

    fn params() -> ScanParams {
        ScanParams {
            begin_of_stream: false,
            end_of_stream: false,
            resync_limit: 8,
            resyncs: 0,
            locked: false,
            fail_level: Level::Error,
            remaining: None,
        }
    }

    #[test]
    fn scan_skips_and_resyncs_before_frame() {
        let scan = scan_frames(&mut ByteFrames, &[0x00, 0x01, 0x33, 0xA5], params()).unwrap();
        assert_eq!(scan.outcome, Outcome::Frame { start: 3, len: 1 });
        assert_eq!((scan.skipped, scan.resynced), (3, 1));
        assert!(!scan.begin_of_stream);
    }

    #[test]
    fn scan_starves_or_exhausts() {
        let scan = scan_frames(&mut ByteFrames, &[0x33, 0x00], params()).unwrap();
        assert_eq!(scan.outcome, Outcome::NeedMore { start: 2 });
        assert_eq!(scan.pending_skip, 1);

        let eos = ScanParams {
            end_of_stream: true,
            ..params()
        };
        let scan = scan_frames(&mut ByteFrames, &[0x33, 0x44], eos).unwrap();
        assert_eq!(scan.outcome, Outcome::Exhausted);
    }

    #[test]
    fn scan_enforces_limits() {
        let few = ScanParams {
            resync_limit: 2,
            ..params()
        };
        assert_eq!(
            scan_frames(&mut ByteFrames, &[1, 2, 3, 0xA5], few).unwrap_err(),
            DecodeError::Stream(StreamError::WrongHeader)
        );

        let done = ScanParams {
            remaining: Some(0),
            ..params()
        };
        assert_eq!(
            scan_frames(&mut ByteFrames, &[0xA5], done).unwrap().outcome,
            Outcome::Exhausted
        );
    }
}
