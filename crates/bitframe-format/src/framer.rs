use bytes::{BufMut, Bytes, BytesMut};

use crate::error::Result;
use crate::formatter::HeaderFormatter;
use crate::metadata::Metadata;

/// Framer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FramerConfig {
    /// Zero bytes appended after the payload.
    pub padding: usize,
    /// Return the header on its own instead of prepending it.
    pub separate_header: bool,
}

/// A payload ready for transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramedPdu {
    /// Input metadata plus whatever the layout recorded.
    pub metadata: Metadata,
    /// The header, when framing with `separate_header`.
    pub header: Option<Bytes>,
    /// Payload plus padding, preceded by the header unless it is separate.
    pub payload: Bytes,
}

impl FramedPdu {
    /// Total bytes on the wire.
    pub fn wire_len(&self) -> usize {
        self.header.as_ref().map_or(0, Bytes::len) + self.payload.len()
    }
}

/// Turns payloads into framed PDUs with a formatter's header.
#[derive(Debug, Clone)]
pub struct PduFramer {
    formatter: HeaderFormatter,
    config: FramerConfig,
}

impl PduFramer {
    pub fn new(formatter: HeaderFormatter) -> Self {
        Self::with_config(formatter, FramerConfig::default())
    }

    pub fn with_config(formatter: HeaderFormatter, config: FramerConfig) -> Self {
        Self { formatter, config }
    }

    pub fn frame(&mut self, payload: &[u8], metadata: &Metadata) -> Result<FramedPdu> {
        let (header, metadata) = self.formatter.format(payload, metadata)?;
        let padding = self.config.padding;

        if self.config.separate_header {
            let mut body = BytesMut::with_capacity(payload.len() + padding);
            body.put_slice(payload);
            body.put_bytes(0, padding);
            return Ok(FramedPdu {
                metadata,
                header: Some(header),
                payload: body.freeze(),
            });
        }

        let mut body = BytesMut::with_capacity(header.len() + payload.len() + padding);
        body.put_slice(&header);
        body.put_slice(payload);
        body.put_bytes(0, padding);
        Ok(FramedPdu {
            metadata,
            header: None,
            payload: body.freeze(),
        })
    }

    pub fn set_padding(&mut self, padding: usize) {
        self.config.padding = padding;
    }

    pub fn padding(&self) -> usize {
        self.config.padding
    }

    pub fn config(&self) -> &FramerConfig {
        &self.config
    }

    pub fn formatter(&self) -> &HeaderFormatter {
        &self.formatter
    }

    pub fn formatter_mut(&mut self) -> &mut HeaderFormatter {
        &mut self.formatter
    }
}
