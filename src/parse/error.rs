//! Error types used to report failure in low-level parsing
//!
//! This module contains a hierarchy of types representing specific
//! classes of error that may arise while a [`PacketParser`](super::PacketParser)
//! walks a bitstream. Some of these may also be returned by lower-level
//! operations on [`BitView`](super::BitView).
//!
//! # Layout
//!
//! This module defines the primary type `ParseError` and the alias
//! `ParseResult<T>`; it additionally defines various type-level refinements of
//! `ParseError`, grouped according to similar provenance or nature.

use std::error::Error;
use std::fmt::{Display, Formatter, Result};

use crate::error::{ErrorKind, HexConvError};

/// Enumeration type over all errors that may be encountered when decoding
/// a packet tree from a hex-string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Error class encountered when the input string is not valid hex
    Hex(HexConvError),
    /// Error class encountered when a field would extend past the end of
    /// the bitstream.
    Window(WindowError),
    /// Error class encountered when the sub-packets of an operator do not
    /// agree with the framing field that delimits them.
    Frame(FrameError),
    /// Error class encountered when low-level parsing is unsuccessful due
    /// to a failure of expectation in terms of the bit-level contents of the
    /// stream outside of any packet.
    Token(TokenError),
    /// Packets are nested more deeply than the parser was configured to allow
    Nesting { limit: usize },
}

impl ParseError {
    /// Classifies the error according to [`ErrorKind`]
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::Hex(_) => ErrorKind::InvalidCharacter,
            ParseError::Window(_) => ErrorKind::TruncatedStream,
            ParseError::Frame(_) => ErrorKind::MalformedOperator,
            ParseError::Token(TokenError::NonZeroPadding { .. }) => ErrorKind::NonZeroPadding,
            ParseError::Nesting { .. } => ErrorKind::NestingTooDeep,
        }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            ParseError::Hex(err) => Display::fmt(err, f),
            ParseError::Window(err) => Display::fmt(err, f),
            ParseError::Frame(err) => Display::fmt(err, f),
            ParseError::Token(err) => Display::fmt(err, f),
            ParseError::Nesting { limit } => {
                write!(f, "packet nesting exceeds the limit of {limit} levels")
            }
        }
    }
}

impl Error for ParseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ParseError::Hex(err) => Some(err),
            ParseError::Window(err) => Some(err),
            ParseError::Frame(err) => Some(err),
            ParseError::Token(err) => Some(err),
            ParseError::Nesting { .. } => None,
        }
    }
}

impl From<HexConvError> for ParseError {
    fn from(err: HexConvError) -> Self {
        Self::Hex(err)
    }
}

/// Type alias for Result with an error type of [`ParseError`]
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Errors related to the bounds of the bitstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowError {
    /// Error case when reading a fixed-width field starting at `offset`
    /// would run past `limit`, the total number of bits in the stream.
    ConsumeWouldExceedLimit {
        offset: usize,
        requested: usize,
        limit: usize,
    },
    /// Error case when a length-framed operator declares a sub-packet region
    /// wider than the rest of the stream.
    OpenWouldExceedBuffer { bits_left: usize, request: usize },
}

impl From<WindowError> for ParseError {
    fn from(err: WindowError) -> Self {
        Self::Window(err)
    }
}

impl Display for WindowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match *self {
            WindowError::ConsumeWouldExceedLimit {
                offset,
                requested,
                limit,
            } => {
                write!(
                    f,
                    "cannot read {} bits at offset {} (stream holds {} bits)",
                    requested, offset, limit
                )
            }
            WindowError::OpenWouldExceedBuffer { bits_left, request } => {
                if bits_left == 0 {
                    write!(
                        f,
                        "cannot frame {}-bit sub-packet region: stream has been fully consumed",
                        request
                    )
                } else {
                    write!(
                        f,
                        "cannot frame {}-bit sub-packet region: stream has only {} bits remaining",
                        request, bits_left
                    )
                }
            }
        }
    }
}

impl Error for WindowError {}

/// Errors arising from a mismatch between an operator's framing field and
/// its sub-packets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// The sub-packets of a length-framed operator consumed more bits than
    /// the 15-bit length field declared.
    Overrun { declared: usize, consumed: usize },
    /// A recorded bit-length does not match the encoded width of the children
    LengthMismatch { declared: usize, actual: usize },
    /// A recorded sub-packet count does not match the number of children
    CountMismatch { declared: usize, actual: usize },
    /// A framing value does not fit in its fixed-width field
    FieldOverflow { width: usize, value: usize },
}

impl From<FrameError> for ParseError {
    fn from(err: FrameError) -> Self {
        Self::Frame(err)
    }
}

impl Display for FrameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match *self {
            FrameError::Overrun { declared, consumed } => write!(
                f,
                "sub-packets consumed {consumed} bits, overrunning the declared length of {declared}"
            ),
            FrameError::LengthMismatch { declared, actual } => write!(
                f,
                "declared sub-packet length {declared} does not match encoded length {actual}"
            ),
            FrameError::CountMismatch { declared, actual } => write!(
                f,
                "declared sub-packet count {declared} does not match {actual} sub-packets"
            ),
            FrameError::FieldOverflow { width, value } => {
                write!(f, "framing value {value} does not fit in {width} bits")
            }
        }
    }
}

impl Error for FrameError {}

/// Errors arising from unexpected bits outside of any packet
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TokenError {
    /// Trailing padding after the outermost packet contained a set bit
    NonZeroPadding { offset: usize, padding: usize },
}

impl From<TokenError> for ParseError {
    fn from(tok_e: TokenError) -> Self {
        Self::Token(tok_e)
    }
}

impl Display for TokenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Self::NonZeroPadding { offset, padding } => {
                write!(
                    f,
                    "non-zero bit found in {padding}-bit padding starting at offset {offset}"
                )
            }
        }
    }
}

impl Error for TokenError {}
