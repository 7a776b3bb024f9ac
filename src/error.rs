//! General error types
//!
//! This module contains the error types that are not specific to the
//! low-level parsing model, namely hex-conversion failures and arity
//! violations found during evaluation, as well as the umbrella [`Error`]
//! type returned by the high-level decoding pipeline.
//!
//! Errors that arise while consuming bits from a [`BitView`](crate::parse::BitView)
//! live in [`parse::error`](crate::parse::error) instead.

use std::error::Error as StdError;
use std::fmt::{Debug, Display, Formatter};

use crate::packet::Operator;
use crate::parse::error::ParseError;

/// Error type representing all possible conditions for invalidity
/// encountered when attempting to convert a string into a sequence
/// of bits, four per hex-digit.
///
/// Unlike byte-oriented hex decoding, any number of digits is acceptable,
/// so the only failure case is an out-of-alphabet character.
#[derive(Clone, PartialEq, Eq, Ord, PartialOrd)]
#[non_exhaustive]
pub enum HexConvError {
    /// Error case for strings containing a character outside of `[0-9A-F]`
    /// (or `[0-9a-fA-F]` when the `lowercase_hex` feature is enabled).
    NonHex { index: usize, found: char },
}

impl Debug for HexConvError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonHex { index, found } => {
                write!(f, "non-hex character {found:?} found at index {index}")
            }
        }
    }
}

impl Display for HexConvError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonHex { index, found } => {
                write!(
                    f,
                    "hex-conversion failed on non-hex character {found:?} at index {index}"
                )
            }
        }
    }
}

impl StdError for HexConvError {}

/// Enumerated error type for operator packets whose number of sub-packets
/// is incompatible with the operation they denote.
///
/// Comparison operators require exactly two operands, while `minimum`
/// and `maximum` require at least one.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ArityError {
    /// Requirement of a precise operand-count not satisfied
    WrongArity {
        op: Operator,
        exact: usize,
        actual: usize,
    },
    /// Requirement of a minimum operand-count not satisfied
    TooFew {
        op: Operator,
        min: usize,
        actual: usize,
    },
}

impl Display for ArityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ArityError::WrongArity { op, exact, actual } => {
                write!(
                    f,
                    "`{op}` packet has {actual} sub-packets, requires exactly {exact}"
                )
            }
            ArityError::TooFew { op, min, actual } => {
                write!(
                    f,
                    "`{op}` packet has {actual} sub-packets, requires at least {min}"
                )
            }
        }
    }
}

impl StdError for ArityError {}

/// Error raised by the expression evaluator
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EvalError {
    Arity(ArityError),
}

impl From<ArityError> for EvalError {
    fn from(err: ArityError) -> Self {
        Self::Arity(err)
    }
}

impl Display for EvalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EvalError::Arity(err) => write!(f, "malformed operator: {err}"),
        }
    }
}

impl StdError for EvalError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            EvalError::Arity(err) => Some(err),
        }
    }
}

/// Coarse classification of every failure the decoding pipeline can report.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum ErrorKind {
    /// A character outside the hex alphabet appeared in the input
    InvalidCharacter,
    /// A field required more bits than remained in the stream
    TruncatedStream,
    /// An operator packet had the wrong number of operands, or its
    /// sub-packets over- or under-ran the declared bit-length
    MalformedOperator,
    /// Packets were nested more deeply than the configured limit
    NestingTooDeep,
    /// Trailing padding after the outermost packet contained a set bit
    NonZeroPadding,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ErrorKind::InvalidCharacter => "invalid character",
            ErrorKind::TruncatedStream => "truncated stream",
            ErrorKind::MalformedOperator => "malformed operator",
            ErrorKind::NestingTooDeep => "nesting too deep",
            ErrorKind::NonZeroPadding => "non-zero padding",
        })
    }
}

/// Umbrella error for the full hex-to-result pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    Parse(ParseError),
    Eval(EvalError),
}

impl Error {
    /// Classifies the error according to [`ErrorKind`]
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Parse(err) => err.kind(),
            Error::Eval(EvalError::Arity(_)) => ErrorKind::MalformedOperator,
        }
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Self::Parse(err)
    }
}

impl From<HexConvError> for Error {
    fn from(err: HexConvError) -> Self {
        Self::Parse(ParseError::Hex(err))
    }
}

impl From<EvalError> for Error {
    fn from(err: EvalError) -> Self {
        Self::Eval(err)
    }
}

impl From<ArityError> for Error {
    fn from(err: ArityError) -> Self {
        Self::Eval(EvalError::Arity(err))
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Parse(err) => write!(f, "decoding failed ({}): {}", err.kind(), err),
            Error::Eval(err) => write!(f, "evaluation failed: {}", err),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Parse(err) => Some(err),
            Error::Eval(err) => Some(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod test {
    use super::*;

    fn dummy<T: Send + Sync>() {}

    #[test]
    fn errors_threadsafe() {
        dummy::<Error>();
        dummy::<ParseError>();
        dummy::<EvalError>();
    }

    #[test]
    fn kinds() {
        let hex: Error = HexConvError::NonHex {
            index: 2,
            found: 'x',
        }
        .into();
        assert_eq!(hex.kind(), ErrorKind::InvalidCharacter);

        let arity: Error = ArityError::WrongArity {
            op: Operator::LessThan,
            exact: 2,
            actual: 3,
        }
        .into();
        assert_eq!(arity.kind(), ErrorKind::MalformedOperator);
        assert_eq!(
            arity.to_string(),
            "evaluation failed: malformed operator: `less-than` packet has 3 sub-packets, requires exactly 2"
        );
    }
}
