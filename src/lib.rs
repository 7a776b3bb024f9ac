//! Decoder and evaluator for BITS packet transmissions
//!
//! # Overview
//!
//! A BITS transmission is a hexadecimal string encoding a bitstream, which in
//! turn holds a single outermost packet. Packets carry no delimiters: every
//! field has a fixed width except literal values, which are self-terminating,
//! and the sub-packets of operators, which are delimited either by their total
//! bit-length or by their count. Recovering the tree therefore requires exact
//! accounting of the bits consumed by every packet, so that a parent knows
//! where each of its sub-packets ends and the next begins.
//!
//! This library offers:
//!
//!   * [`BitString`], the hex-to-bit converter
//!   * [`PacketParser`], a parser that threads explicit offsets and returns
//!     consumed bit-counts, rather than mutating a shared cursor, and whose
//!     nesting depth is bounded by [`ParseOptions`] rather than by the call
//!     stack
//!   * [`Packet`], the owned tree, whose payload is a sum type of literal and
//!     operator content
//!   * [`sum_versions`] and [`evaluate`], the two read-only aggregates over a tree
//!
//! The traits [`Decode`] and [`Encode`] tie these together, so that a tree can
//! be decoded from a hex-string and re-encoded to one.
//!
//! ```
//! use bitsy::{Decode, Packet};
//!
//! let packet = Packet::decode("9C0141080250320F1802104A08").unwrap();
//! assert_eq!(packet.to_string(), "(equal-to (sum 1 3) (product 2 2))");
//! assert_eq!(packet.sum_versions(), 20);
//! assert_eq!(packet.evaluate().unwrap().to_string(), "1");
//! ```
//!
//! # Features
//!
//!   * `check_padding`: reject trailing padding that contains a set bit
//!   * `lowercase_hex`: accept `a-f` as well as `A-F`
//!   * `serde_impls`: derive `serde::Serialize` for the packet tree, and add a
//!     `--json` flag to the `bitsy` binary

pub mod bits;
pub mod conv;
pub mod error;
pub mod eval;
pub mod literal;
pub mod packet;
pub mod parse;
pub mod prelude;

pub use crate::bits::BitString;
pub use crate::conv::{
    target::{BitCounter, Target},
    Decode, Encode,
};
pub use crate::error::{ArityError, Error, ErrorKind, EvalError, HexConvError};
pub use crate::eval::{decode_summary, evaluate, sum_versions, Summary};
pub use crate::literal::Literal;
pub use crate::packet::{Framing, Operator, Packet, Payload};
pub use crate::parse::{
    error::{ParseError, ParseResult},
    BitView, PacketParser, ParseOptions,
};
