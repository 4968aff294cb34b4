use std::io::{self, BufWriter, Seek, SeekFrom, Write};

use esdec_macros::{ToBytes, riff_chunk};

use crate::byteorder::WriteBytesLe;
use crate::join_bytes_le;

const WAVE_FORMAT_PCM: u16 = 1;

/// RIFF sizes are 32-bit; longer outputs keep the maximum.
const MAX_RIFF_SIZE: u64 = u32::MAX as u64;

pub trait RiffChunk {
    fn chunk_id(&self) -> &[u8; 4];
    fn chunk_data(&self) -> Vec<u8>;

    fn write_all<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let data = self.chunk_data();
        writer.write_all(self.chunk_id())?;
        writer.write_all(&(data.len() as u32).to_le_bytes())?;
        writer.write_all(&data)?;
        if data.len() % 2 == 1 {
            writer.write_all(&[0])?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ToBytes)]
#[riff_chunk(b"fmt ")]
pub struct FormatChunk {
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl FormatChunk {
    pub fn pcm(sample_rate: u32, channels: u16, bits_per_sample: u16) -> Self {
        let block_align = channels * (bits_per_sample / 8);
        Self {
            format_tag: WAVE_FORMAT_PCM,
            channels,
            sample_rate,
            byte_rate: (sample_rate as u64 * block_align as u64).min(u32::MAX as u64) as u32,
            block_align,
            bits_per_sample,
        }
    }
}

/// Canonical RIFF/WAVE writer for interleaved little-endian PCM.
pub struct WavWriter<W: Write + Seek> {
    writer: BufWriter<W>,
    format: FormatChunk,
    riff_size_position: u64,
    data_size_position: u64,
    data_written: u64,
}

impl<W: Write + Seek> WavWriter<W> {
    pub fn new(writer: W, format: FormatChunk) -> Self {
        Self {
            writer: BufWriter::new(writer),
            format,
            riff_size_position: 0,
            data_size_position: 0,
            data_written: 0,
        }
    }

    /// Writes `RIFF`, `fmt ` and the `data` chunk header with placeholder sizes.
    pub fn write_header(&mut self) -> io::Result<()> {
        self.riff_size_position = self.writer.stream_position()? + 4;
        self.writer
            .write_all(&join_bytes_le!(*b"RIFF", 0u32, *b"WAVE"))?;
        self.format.write_all(&mut self.writer)?;

        self.data_size_position = self.writer.stream_position()? + 4;
        self.writer.write_all(&join_bytes_le!(*b"data", 0u32))?;
        Ok(())
    }

    pub fn write_pcm(&mut self, pcm: &[u8]) -> io::Result<()> {
        self.writer.write_all(pcm)?;
        self.data_written += pcm.len() as u64;
        Ok(())
    }

    /// Pads the data chunk and patches both size fields.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.data_written % 2 == 1 {
            self.writer.write_all(&[0])?;
        }
        let end = self.writer.stream_position()?;

        let data_size = self.data_written.min(MAX_RIFF_SIZE) as u32;
        self.writer.seek(SeekFrom::Start(self.data_size_position))?;
        self.writer.write_all(&data_size.to_le_bytes())?;

        let riff_size = (end - self.riff_size_position - 4).min(MAX_RIFF_SIZE) as u32;
        self.writer.seek(SeekFrom::Start(self.riff_size_position))?;
        self.writer.write_all(&riff_size.to_le_bytes())?;

        self.writer.seek(SeekFrom::Start(end))?;
        self.writer.flush()
    }

    pub fn into_inner(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn header_and_sizes() -> io::Result<()> {
        let mut writer = WavWriter::new(Cursor::new(Vec::new()), FormatChunk::pcm(8000, 1, 16));
        writer.write_header()?;
        writer.write_pcm(&[1, 0, 2, 0, 3])?;
        writer.finish()?;

        let buffer = writer.into_inner()?.into_inner();
        assert_eq!(buffer.len(), 44 + 6);
        assert_eq!(&buffer[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes(buffer[4..8].try_into().unwrap()), 42);
        assert_eq!(&buffer[8..16], b"WAVEfmt ");
        assert_eq!(u32::from_le_bytes(buffer[16..20].try_into().unwrap()), 16);
        assert_eq!(u32::from_le_bytes(buffer[28..32].try_into().unwrap()), 16000);
        assert_eq!(&buffer[36..40], b"data");
        assert_eq!(u32::from_le_bytes(buffer[40..44].try_into().unwrap()), 5);
        Ok(())
    }

    #[test]
    fn byte_rate_saturates() {
        let format = FormatChunk::pcm(0x4000_0000, 8, 32);
        assert_eq!(format.block_align, 32);
        assert_eq!(format.byte_rate, u32::MAX);
    }

    #[test]
    fn written_file_parses_back() -> io::Result<()> {
        use esframe::formats::wav::WavParser;
        use esframe::process::parse::{FrameParser, RawCursor};

        let mut writer = WavWriter::new(Cursor::new(Vec::new()), FormatChunk::pcm(48000, 2, 24));
        writer.write_header()?;
        writer.write_pcm(&[0; 12])?;
        writer.finish()?;
        let buffer = writer.into_inner()?.into_inner();

        let mut parser = WavParser::new(2);
        let info = parser
            .parse(&RawCursor::new(&buffer).begin_of_stream(true))
            .unwrap();
        assert_eq!(info.skipped_size, 44);
        assert_eq!(info.total_size, 12);
        assert_eq!(parser.format().map(|f| f.block_align), Some(6));
        Ok(())
    }
}
