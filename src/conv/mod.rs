//! Core of the bit-level conversion API
//!
//! This module contains definitions for the high-level transcoding traits
//! `Encode` and `Decode`, which are motivationally equivalent to the
//! `Serialize` and `Deserialize` traits defined in `serde`, specialized to
//! the bit-granular, length-prefixed BITS format.
//!
//! `Decode` is the interface the packet parser is written against: every
//! decodable type reads from an immutable [`PacketParser`] at an explicit
//! offset, and reports how many bits it consumed, so that the caller knows
//! where the next sibling begins. No cursor is ever shared between calls.
//!
//! The submodule [`target`] offers the [`target::Target`] trait, the dual of
//! [`crate::parse::BitView`], acting as the generic bound for serialization in
//! [`Encode::write_to`].

use crate::bits::BitString;
use crate::parse::{error::ParseResult, PacketParser, ParseOptions};

use self::target::{BitCounter, Target};

pub mod target;

/// Trait for types that support serialization into the BITS binary form
pub trait Encode {
    /// Appends the serialized bits of this value to a generic buffer,
    /// returning the exact number of bits written
    fn write_to<U: Target>(&self, buf: &mut U) -> usize;

    /// Creates a new buffer and fills it with the serialized bits of this value.
    #[must_use]
    #[inline]
    fn encode<U: Target>(&self) -> U {
        let mut buf: U = U::create();
        let _ = self.write_to::<U>(&mut buf);
        buf
    }

    /// Computes, without allocation, the number of bits in the serialized
    /// form of `self`.
    #[must_use]
    fn bit_len(&self) -> usize {
        let mut counter = BitCounter::create();
        self.write_to(&mut counter)
    }

    /// Serializes `self` and renders it as uppercase hex, padding the final
    /// digit with zero bits.
    #[must_use]
    fn to_hex(&self) -> String {
        let mut bits: BitString = self.encode();
        bits.pad_to_multiple(4);
        bits.to_hex()
    }
}

/// Trait for types that can be parsed from a BITS bitstream
pub trait Decode: Sized {
    /// Parses a single value starting at `offset`, returning it along with
    /// the number of bits it spans.
    ///
    /// `depth` is the nesting depth of the value being parsed, with the
    /// outermost packet at depth `0`.
    fn parse_at(p: &PacketParser<'_>, offset: usize, depth: usize) -> ParseResult<(Self, usize)>;

    /// Parses a value from the start of a bitstream, subject to the trailing
    /// padding policy of [`PacketParser::finish`].
    fn decode_bits(bits: &BitString, opts: ParseOptions) -> ParseResult<Self> {
        let p = PacketParser::new(bits, opts);
        let (val, consumed) = Self::parse_at(&p, 0, 0)?;
        p.finish(consumed)?;
        Ok(val)
    }

    /// Converts a hex-string into bits and parses a value from it using the
    /// default [`ParseOptions`].
    fn decode<S: AsRef<str>>(hex: S) -> ParseResult<Self> {
        Self::decode_with(hex, ParseOptions::default())
    }

    /// Converts a hex-string into bits and parses a value from it.
    fn decode_with<S: AsRef<str>>(hex: S, opts: ParseOptions) -> ParseResult<Self> {
        let bits = BitString::from_hex(hex)?;
        Self::decode_bits(&bits, opts)
    }
}
