//! Streaming header recovery.
//!
//! [`HeaderFormatter`] owns a [`HeaderLayout`] plus the receive-side state:
//! the access code correlator, the header register and the payload
//! countdown. It runs the same `SyncSearch -> HaveSync -> HaveHeader` loop
//! for every layout.

use bitframe_bits::{slice_soft, AccessCodeCorrelator, HeaderRegister};
use bytes::Bytes;
use tracing::{debug, trace};

use crate::error::Result;
use crate::layout::{HeaderLayout, LayoutConfig};
use crate::metadata::{Metadata, SKIP_SAMPS};

/// Where the receive loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramingState {
    /// Correlating input against the access code.
    SyncSearch,
    /// Access code found, filling the header register.
    HaveSync,
    /// Header accepted, skipping payload items.
    HaveHeader,
}

/// Header encoder and streaming decoder for one stream.
#[derive(Debug, Clone)]
pub struct HeaderFormatter {
    layout: HeaderLayout,
    correlator: AccessCodeCorrelator,
    register: HeaderRegister,
    state: FramingState,
    /// Header bits following the access code.
    body_nbits: usize,
    payload_items: u64,
    payload_seen: u64,
    skip_count: u64,
    position: u64,
}

impl HeaderFormatter {
    pub fn new(layout: impl Into<HeaderLayout>) -> Self {
        let layout = layout.into();
        let access_code = layout.access_code();
        let body_nbits = layout.header_nbits() - access_code.len();
        let mut formatter = Self {
            correlator: AccessCodeCorrelator::new(access_code),
            register: HeaderRegister::with_capacity(body_nbits),
            layout,
            state: FramingState::SyncSearch,
            body_nbits,
            payload_items: 0,
            payload_seen: 0,
            skip_count: 0,
            position: 0,
        };
        formatter.enter_search();
        formatter
    }

    /// Build a formatter tolerating `threshold` access code bit errors.
    pub fn with_threshold(layout: impl Into<HeaderLayout>, threshold: u32) -> Result<Self> {
        let mut formatter = Self::new(layout);
        formatter.set_threshold(threshold)?;
        Ok(formatter)
    }

    pub fn from_config(config: &LayoutConfig) -> Result<Self> {
        Self::with_threshold(config.build()?, config.threshold())
    }

    pub fn layout(&self) -> &HeaderLayout {
        &self.layout
    }

    pub fn header_nbits(&self) -> usize {
        self.layout.header_nbits()
    }

    pub fn header_nbytes(&self) -> usize {
        self.layout.header_nbytes()
    }

    /// Fails if `threshold` exceeds the access code length.
    pub fn set_threshold(&mut self, threshold: u32) -> Result<()> {
        self.correlator.set_threshold(threshold)?;
        Ok(())
    }

    pub fn threshold(&self) -> u32 {
        self.correlator.threshold()
    }

    pub fn state(&self) -> FramingState {
        self.state
    }

    /// Total items consumed since construction or the last reset.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Payload items still to skip before searching again.
    pub fn payload_remaining(&self) -> u64 {
        match self.state {
            FramingState::HaveHeader => self.payload_items - self.payload_seen,
            _ => 0,
        }
    }

    /// Drop all receive state and go back to searching.
    pub fn reset(&mut self) {
        self.skip_count = 0;
        self.position = 0;
        self.payload_items = 0;
        self.payload_seen = 0;
        self.enter_search();
    }

    /// Build the header for `payload`.
    pub fn format(&mut self, payload: &[u8], metadata: &Metadata) -> Result<(Bytes, Metadata)> {
        self.format_len(payload.len(), metadata)
    }

    /// Build the header for a payload of `payload_len` bytes.
    pub fn format_len(
        &mut self,
        payload_len: usize,
        metadata: &Metadata,
    ) -> Result<(Bytes, Metadata)> {
        self.layout.format(payload_len, metadata)
    }

    /// Feed hard-decision items, appending one record per accepted header.
    ///
    /// Every item is consumed; the return value is always `items.len()`.
    pub fn parse(&mut self, items: &[u8], results: &mut Vec<Metadata>) -> usize {
        self.drive(items.len(), |i| items[i], results, false)
    }

    /// Feed soft values, slicing each at zero before parsing.
    pub fn parse_soft(&mut self, values: &[f32], results: &mut Vec<Metadata>) -> usize {
        self.drive(values.len(), |i| slice_soft(values[i]), results, false)
    }

    /// Like [`parse`](Self::parse) but stops right after the first accepted
    /// header. Returns the items consumed and the header record, if any.
    pub fn parse_next(&mut self, items: &[u8]) -> (usize, Option<Metadata>) {
        let mut results = Vec::with_capacity(1);
        let consumed = self.drive(items.len(), |i| items[i], &mut results, true);
        (consumed, results.pop())
    }

    fn drive(
        &mut self,
        n: usize,
        item: impl Fn(usize) -> u8,
        results: &mut Vec<Metadata>,
        stop_at_header: bool,
    ) -> usize {
        let units = self.layout.carries_units();
        let bits_per_item = self.layout.bits_per_item();
        let mut i = 0;
        while i < n {
            match self.state {
                FramingState::SyncSearch => {
                    let bit = item(i) & 1;
                    i += 1;
                    self.skip_count += 1;
                    self.position += 1;
                    if let Some(distance) = self.correlator.push_bit(bit) {
                        debug!(
                            layout = self.layout.name(),
                            distance,
                            position = self.position,
                            "access code found"
                        );
                        self.register.clear();
                        self.state = FramingState::HaveSync;
                    }
                }
                FramingState::HaveSync => {
                    let value = item(i);
                    i += 1;
                    self.skip_count += 1;
                    self.position += 1;
                    if units {
                        self.register.insert_unit(value, bits_per_item);
                    } else {
                        self.register.insert_bit(value);
                    }
                    if self.register.len() >= self.body_nbits
                        && self.finish_header(results)
                        && stop_at_header
                    {
                        break;
                    }
                }
                FramingState::HaveHeader => {
                    let remaining = self.payload_items - self.payload_seen;
                    let take = remaining.min((n - i) as u64);
                    i += take as usize;
                    self.position += take;
                    self.payload_seen += take;
                    if self.payload_seen == self.payload_items {
                        trace!(
                            items = self.payload_items,
                            position = self.position,
                            "payload complete"
                        );
                        self.enter_search();
                    }
                }
            }
        }
        i
    }

    /// Validate the filled register. Returns whether a record was emitted.
    fn finish_header(&mut self, results: &mut Vec<Metadata>) -> bool {
        let decoded = if self.layout.header_ok(&self.register) {
            self.layout.header_payload(&self.register)
        } else {
            None
        };

        let Some(decoded) = decoded else {
            debug!(
                layout = self.layout.name(),
                position = self.position,
                "header rejected"
            );
            self.enter_search();
            return false;
        };

        let mut record = decoded.metadata;
        record.insert(SKIP_SAMPS, self.skip_count);
        debug!(
            layout = self.layout.name(),
            skip = self.skip_count,
            payload_items = decoded.payload_items,
            "header accepted"
        );
        results.push(record);

        self.skip_count = 0;
        self.payload_items = decoded.payload_items;
        self.payload_seen = 0;
        if decoded.payload_items == 0 {
            self.enter_search();
        } else {
            self.state = FramingState::HaveHeader;
        }
        true
    }

    fn enter_search(&mut self) {
        self.correlator.reset();
        self.register.clear();
        self.state = if self.correlator.access_code().is_empty() {
            FramingState::HaveSync
        } else {
            FramingState::SyncSearch
        };
    }
}
