//! Packet header layouts and streaming header recovery.
//!
//! A [`HeaderFormatter`] pairs one [`HeaderLayout`] with the receive state
//! machine. On transmit it serializes a header for a payload length; on
//! receive it scans a bit or unit stream for headers and reports one
//! [`Metadata`] record per valid header:
//! - `SyncSearch` correlates items against the layout's access code
//! - `HaveSync` fills the header register and validates it
//! - `HaveHeader` skips the announced payload
//!
//! [`PduFramer`], [`FrameWriter`] and [`FrameReader`] wrap a formatter for
//! byte-oriented use.

pub mod error;
pub mod formatter;
pub mod framer;
pub mod layout;
pub mod metadata;
pub mod reader;
pub mod writer;

pub use error::{FormatError, Result};
pub use formatter::{FramingState, HeaderFormatter};
pub use framer::{FramedPdu, FramerConfig, PduFramer};
pub use layout::{
    CounterConfig, CounterLayout, CrcConfig, CrcLayout, DecodedHeader, DefaultConfig,
    DefaultLayout, HeaderLayout, LayoutConfig, OfdmConfig, OfdmLayout, VariableBitsConfig,
    VariableBitsLayout, DEFAULT_ACCESS_CODE,
};
pub use metadata::{MetaValue, Metadata};
pub use reader::{FrameReader, ParsedFrame, ReaderConfig};
pub use writer::FrameWriter;
