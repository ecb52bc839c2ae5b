//! Big-endian scalar encoding onto a chunk-flushed buffer

use crate::error::{ExportError, Result, count_u32};
use crate::sink::DataSink;
use byteorder::{BigEndian, ByteOrder};

/// Buffer size at which pending bytes are handed to the sink.
pub const DEFAULT_FLUSH_THRESHOLD: usize = 4096;

/// Encodes fixed-width integers and byte strings into a buffer that is
/// drained to a sink whenever it reaches the flush threshold.
///
/// The threshold check happens before each byte is buffered, so the buffer
/// never holds more than `threshold` bytes between flushes.
pub struct ScalarEncoder {
    buffer: Vec<u8>,
    threshold: usize,
    sink: Box<dyn DataSink>,
    flush_count: u64,
}

impl ScalarEncoder {
    pub fn new(sink: Box<dyn DataSink>) -> Self {
        Self::with_threshold(sink, DEFAULT_FLUSH_THRESHOLD)
    }

    pub fn with_threshold(sink: Box<dyn DataSink>, threshold: usize) -> Self {
        let threshold = threshold.max(1);
        ScalarEncoder {
            buffer: Vec::with_capacity(threshold),
            threshold,
            sink,
            flush_count: 0,
        }
    }

    pub fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.put(&[byte])
    }

    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        let mut scratch = [0u8; 2];
        BigEndian::write_i16(&mut scratch, value);
        self.put(&scratch)
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        let mut scratch = [0u8; 2];
        BigEndian::write_u16(&mut scratch, value);
        self.put(&scratch)
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        let mut scratch = [0u8; 4];
        BigEndian::write_i32(&mut scratch, value);
        self.put(&scratch)
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        let mut scratch = [0u8; 4];
        BigEndian::write_u32(&mut scratch, value);
        self.put(&scratch)
    }

    /// 4-byte length followed by the raw bytes. No terminator; embedded
    /// zero bytes are kept.
    pub fn write_length_prefixed(&mut self, bytes: &[u8]) -> Result<()> {
        let len = count_u32("string length", bytes.len())?;
        self.write_u32(len)?;
        self.put(bytes)
    }

    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.put(bytes)
    }

    /// Hand buffered bytes to the sink. Without `force`, only drains a buffer
    /// that has reached the threshold.
    pub fn flush(&mut self, force: bool) -> Result<()> {
        if !force && self.buffer.len() < self.threshold {
            return Ok(());
        }

        let expected = self.buffer.len();
        if expected > 0 {
            let written = self.sink.write_bytes(&self.buffer)?;
            if written < expected {
                return Err(ExportError::ShortWrite { written, expected });
            }
        }
        self.sink.flush()?;
        self.buffer.clear();
        self.flush_count += 1;

        tracing::trace!("Flushed {} bytes (flush #{})", expected, self.flush_count);
        Ok(())
    }

    /// Bytes waiting to be flushed.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn flush_count(&self) -> u64 {
        self.flush_count
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    fn put(&mut self, mut bytes: &[u8]) -> Result<()> {
        while !bytes.is_empty() {
            self.flush(false)?;
            let room = self.threshold - self.buffer.len();
            let take = room.min(bytes.len());
            self.buffer.extend_from_slice(&bytes[..take]);
            bytes = &bytes[take..];
        }
        Ok(())
    }
}

impl std::fmt::Debug for ScalarEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScalarEncoder")
            .field("buffered", &self.buffer.len())
            .field("threshold", &self.threshold)
            .field("flush_count", &self.flush_count)
            .finish()
    }
}
