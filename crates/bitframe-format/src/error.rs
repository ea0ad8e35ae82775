use bitframe_bits::BitsError;

/// Errors raised while configuring formatters or driving stream adapters.
///
/// Malformed headers are never errors: the state machine drops them and
/// goes back to searching.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// A bit-level primitive rejected its configuration.
    #[error(transparent)]
    Bits(#[from] BitsError),

    /// The payload length does not fit the layout's length field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// Bits per symbol must be between 1 and 8.
    #[error("bits per symbol must be in [1, 8], got {0}")]
    InvalidBitsPerSymbol(u32),

    /// A variable-bits header needs at least one unit.
    #[error("header length must be at least one unit")]
    EmptyHeader,

    /// The OFDM carrier table has no occupied carriers.
    #[error("occupied carrier table is empty")]
    EmptyCarrierTable,

    /// More header symbols were requested than the carrier table describes.
    #[error("header spans {n_syms} symbols but the carrier table has {rows} rows")]
    HeaderSymbolsOutOfRange { n_syms: usize, rows: usize },

    /// An I/O error occurred while reading or writing a stream.
    #[error("stream I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended before another header was decoded.
    #[error("stream closed (no further headers)")]
    StreamClosed,
}

pub type Result<T> = std::result::Result<T, FormatError>;
