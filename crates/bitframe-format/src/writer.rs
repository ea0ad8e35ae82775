use std::io::{ErrorKind, Write};

use crate::error::{FormatError, Result};
use crate::framer::{FramedPdu, PduFramer};
use crate::metadata::Metadata;

/// Frames payloads and writes them to any `Write` stream.
pub struct FrameWriter<W> {
    inner: W,
    framer: PduFramer,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(inner: W, framer: PduFramer) -> Self {
        Self { inner, framer }
    }

    /// Frame `payload` and write header, payload and padding (blocking).
    ///
    /// Returns the metadata the layout produced for this frame.
    pub fn send(&mut self, payload: &[u8], metadata: &Metadata) -> Result<Metadata> {
        let pdu = self.framer.frame(payload, metadata)?;
        self.write_pdu(&pdu)?;
        Ok(pdu.metadata)
    }

    /// Write an already framed PDU.
    pub fn write_pdu(&mut self, pdu: &FramedPdu) -> Result<()> {
        if let Some(header) = &pdu.header {
            self.write_all(header)?;
        }
        self.write_all(&pdu.payload)?;
        self.flush()
    }

    fn write_all(&mut self, mut buf: &[u8]) -> Result<()> {
        while !buf.is_empty() {
            match self.inner.write(buf) {
                Ok(0) => return Err(FormatError::Io(ErrorKind::WriteZero.into())),
                Ok(n) => buf = &buf[n..],
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FormatError::Io(err)),
            }
        }
        Ok(())
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FormatError::Io(err)),
            }
        }
    }

    pub fn framer(&self) -> &PduFramer {
        &self.framer
    }

    pub fn framer_mut(&mut self) -> &mut PduFramer {
        &mut self.framer
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> W {
        self.inner
    }
}
