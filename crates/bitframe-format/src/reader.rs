use std::io::{ErrorKind, Read};

use bitframe_bits::{pack_bits, unpack_bits};
use bytes::Bytes;

use crate::error::{FormatError, Result};
use crate::formatter::HeaderFormatter;
use crate::metadata::Metadata;

const DEFAULT_CHUNK_SIZE: usize = 4 * 1024;

/// Stream reader configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReaderConfig {
    /// Bytes requested from the source per read.
    pub chunk_size: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// A header record and the payload that followed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFrame {
    pub metadata: Metadata,
    /// Payload items, packed MSB first for bit layouts, one unit per byte
    /// for unit layouts.
    pub payload: Bytes,
    /// Stream position of the first payload item.
    pub offset: u64,
}

struct PendingFrame {
    metadata: Metadata,
    offset: u64,
    items: Vec<u8>,
    remaining: u64,
}

/// Recovers framed payloads from any `Read` stream.
///
/// Bytes are expanded to items before parsing: eight bits MSB first for
/// layouts carrying one bit per item, one unit per byte (low bits) for the
/// variable-bits layouts. Garbage between frames is skipped.
pub struct FrameReader<R> {
    inner: R,
    formatter: HeaderFormatter,
    config: ReaderConfig,
    items: Vec<u8>,
    pending: Option<PendingFrame>,
}

impl<R: Read> FrameReader<R> {
    pub fn new(inner: R, formatter: HeaderFormatter) -> Self {
        Self::with_config(inner, formatter, ReaderConfig::default())
    }

    pub fn with_config(inner: R, formatter: HeaderFormatter, config: ReaderConfig) -> Self {
        Self {
            inner,
            formatter,
            config,
            items: Vec::new(),
            pending: None,
        }
    }

    /// Read until the next complete frame.
    ///
    /// Returns `Err(FormatError::StreamClosed)` at end of stream, including
    /// when the stream ends in the middle of a payload.
    pub fn read_frame(&mut self) -> Result<ParsedFrame> {
        loop {
            if let Some(frame) = self.advance() {
                return Ok(frame);
            }
            if !self.fill()? {
                return Err(FormatError::StreamClosed);
            }
        }
    }

    /// Consume buffered items; returns a frame once one is complete.
    fn advance(&mut self) -> Option<ParsedFrame> {
        loop {
            if let Some(pending) = self.pending.as_mut() {
                let take = pending.remaining.min(self.items.len() as u64) as usize;
                self.formatter.parse(&self.items[..take], &mut Vec::new());
                pending.items.extend(self.items.drain(..take));
                pending.remaining -= take as u64;
                if pending.remaining > 0 {
                    return None;
                }
                return self.pending.take().map(|p| self.finish(p));
            }

            if self.items.is_empty() {
                return None;
            }
            let (consumed, record) = self.formatter.parse_next(&self.items);
            self.items.drain(..consumed);
            let metadata = record?;
            self.pending = Some(PendingFrame {
                metadata,
                offset: self.formatter.position(),
                items: Vec::new(),
                remaining: self.formatter.payload_remaining(),
            });
        }
    }

    fn finish(&self, pending: PendingFrame) -> ParsedFrame {
        let payload = if self.formatter.layout().carries_units() {
            pending.items
        } else {
            pack_bits(&pending.items)
        };
        ParsedFrame {
            metadata: pending.metadata,
            payload: Bytes::from(payload),
            offset: pending.offset,
        }
    }

    /// Read one chunk into the item buffer. `false` at end of stream.
    fn fill(&mut self) -> Result<bool> {
        let mut chunk = vec![0u8; self.config.chunk_size.max(1)];
        let read = loop {
            match self.inner.read(&mut chunk) {
                Ok(n) => break n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FormatError::Io(err)),
            }
        };
        if read == 0 {
            return Ok(false);
        }

        if self.formatter.layout().carries_units() {
            self.items.extend_from_slice(&chunk[..read]);
        } else {
            self.items.extend(unpack_bits(&chunk[..read]));
        }
        Ok(true)
    }

    pub fn formatter(&self) -> &HeaderFormatter {
        &self.formatter
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }
}

impl<R: Read> Iterator for FrameReader<R> {
    type Item = Result<ParsedFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_frame() {
            Err(FormatError::StreamClosed) => None,
            other => Some(other),
        }
    }
}
