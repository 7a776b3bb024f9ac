//! Parsing of packet trees with bit-level precision
//!
//! # Model
//!
//! The parser operates over an immutable, fully materialized bitstream.
//! Rather than threading a mutable cursor through every call, each parse
//! function receives an explicit starting offset and returns the value it
//! parsed together with the number of bits it consumed; the caller is
//! responsible for advancing its own local cursor by that amount.
//!
//! A packet begins with a 6-bit header (3-bit version, 3-bit type id).
//! Type id `4` marks a literal, whose payload is a run of 5-bit groups (see
//! [`crate::literal`]). Every other type id marks an operator, whose header is
//! followed by a single length-type bit selecting one of two framings for its
//! sub-packets:
//!
//!   * `0`: a 15-bit field holding the total number of bits the sub-packets occupy
//!   * `1`: an 11-bit field holding the number of sub-packets
//!
//! Any bits after the outermost packet are padding, and are ignored unless
//! the `check_padding` feature is enabled.
//!
//! # Layout
//!
//! This module defines [`BitView`], a bounds-checked read-only view of a
//! bitstream, [`ParseOptions`], and [`PacketParser`], which descends into
//! sub-packets using a heap-allocated stack of open operators. The error
//! hierarchy lives in [`error`].

pub mod error;

use std::cmp::Ordering;

use cfg_if::cfg_if;
use tracing::trace;

use crate::bits::BitString;
use crate::conv::Decode;
use crate::literal::Literal;
use crate::packet::{
    Framing, Operator, Packet, Payload, COUNT_FIELD_WIDTH, LENGTH_FIELD_WIDTH, TYPE_ID_WIDTH,
    VERSION_WIDTH,
};

use self::error::{FrameError, ParseError, ParseResult, WindowError};

/// Default upper bound on packet nesting depth
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Read-only, bounds-checked view over a sequence of bits.
///
/// All reads take an absolute offset; the view itself holds no position.
#[derive(Clone, Copy, Debug)]
pub struct BitView<'a> {
    bits: &'a [bool],
}

impl<'a> BitView<'a> {
    #[inline]
    #[must_use]
    pub fn new(bits: &'a [bool]) -> Self {
        Self { bits }
    }

    /// Total number of bits in the view
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Number of bits at or after `offset`
    #[inline]
    #[must_use]
    pub fn remaining(&self, offset: usize) -> usize {
        self.bits.len().saturating_sub(offset)
    }

    /// Returns the `width` bits starting at `offset`, failing rather than
    /// reading past the end of the stream.
    pub fn slice(&self, offset: usize, width: usize) -> ParseResult<&'a [bool]> {
        match offset.checked_add(width) {
            Some(end) if end <= self.bits.len() => Ok(&self.bits[offset..end]),
            _ => Err(WindowError::ConsumeWouldExceedLimit {
                offset,
                requested: width,
                limit: self.bits.len(),
            }
            .into()),
        }
    }

    /// Reads a single bit at `offset`
    #[inline]
    pub fn take_bit(&self, offset: usize) -> ParseResult<bool> {
        Ok(self.slice(offset, 1)?[0])
    }

    /// Reads `width` bits starting at `offset` as an unsigned big-endian
    /// integer.
    ///
    /// `width` must not exceed 64.
    pub fn take_uint(&self, offset: usize, width: usize) -> ParseResult<u64> {
        debug_assert!(width <= 64);
        Ok(self
            .slice(offset, width)?
            .iter()
            .fold(0u64, |acc, &bit| (acc << 1) | u64::from(bit)))
    }
}

/// Run-time configuration for a [`PacketParser`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum nesting depth of sub-packets, with the outermost packet at
    /// depth `0`.
    pub max_depth: usize,
}

impl ParseOptions {
    #[must_use]
    pub const fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Stateless parser over a borrowed bitstream.
#[derive(Clone, Copy, Debug)]
pub struct PacketParser<'a> {
    view: BitView<'a>,
    opts: ParseOptions,
}

impl<'a> PacketParser<'a> {
    #[must_use]
    pub fn new(bits: &'a BitString, opts: ParseOptions) -> Self {
        Self {
            view: BitView::new(bits.as_slice()),
            opts,
        }
    }

    #[inline]
    #[must_use]
    pub fn view(&self) -> &BitView<'a> {
        &self.view
    }

    #[inline]
    #[must_use]
    pub fn options(&self) -> &ParseOptions {
        &self.opts
    }

    /// Parses the outermost packet at offset `0`, returning it and the
    /// number of bits it spans, after checking the trailing padding.
    pub fn parse_root(&self) -> ParseResult<(Packet, usize)> {
        let (packet, consumed) = self.parse_packet(0, 0)?;
        self.finish(consumed)?;
        tracing::debug!(
            consumed,
            padding = self.view.remaining(consumed),
            "parsed outermost packet"
        );
        Ok((packet, consumed))
    }

    /// Applies the trailing-padding policy to the bits after `consumed`.
    ///
    /// Padding is ignored by default; with the `check_padding` feature, any
    /// set bit in it is an error.
    pub fn finish(&self, consumed: usize) -> ParseResult<()> {
        cfg_if! {
            if #[cfg(feature = "check_padding")] {
                let padding = self.view.remaining(consumed);
                let tail = self.view.slice(consumed, padding)?;
                if tail.iter().any(|&bit| bit) {
                    return Err(error::TokenError::NonZeroPadding { offset: consumed, padding }.into());
                }
                Ok(())
            } else {
                let _ = consumed;
                Ok(())
            }
        }
    }

    /// Parses one complete packet, including all of its descendants,
    /// starting at `offset`, where `depth` is the nesting depth of that
    /// packet.
    ///
    /// Returns the packet and the number of bits from `offset` to the end of
    /// its final group or final sub-packet.
    ///
    /// Operators whose sub-packets are still being read are kept on an
    /// explicit stack, so the depth this accepts is limited only by
    /// [`ParseOptions::max_depth`] and never by the stack of the calling
    /// thread.
    pub fn parse_packet(&self, offset: usize, depth: usize) -> ParseResult<(Packet, usize)> {
        let mut open: Vec<Pending> = Vec::new();
        let mut cursor = offset;

        loop {
            let level = depth + open.len();
            if level > self.opts.max_depth {
                return Err(ParseError::Nesting {
                    limit: self.opts.max_depth,
                });
            }

            let version = self.view.take_uint(cursor, VERSION_WIDTH)? as u8;
            let type_id = self.view.take_uint(cursor + VERSION_WIDTH, TYPE_ID_WIDTH)? as u8;
            let body = cursor + VERSION_WIDTH + TYPE_ID_WIDTH;
            trace!(offset = cursor, depth = level, version, type_id, "packet header");

            // the only 3-bit type id without an operator is the literal tag
            let mut packet = match Operator::try_from(type_id) {
                Ok(op) => {
                    let pending = self.open_operator(version, op, body)?;
                    cursor = pending.start;
                    if !pending.is_complete(cursor)? {
                        open.push(pending);
                        continue;
                    }
                    pending.into_packet()
                }
                Err(_) => {
                    let (value, used) = Literal::parse_at(self, body, level)?;
                    trace!(offset = body, %value, "literal");
                    cursor = body + used;
                    Packet::from_parts(version, Payload::Literal(value))
                }
            };

            loop {
                let mut parent = match open.pop() {
                    Some(parent) => parent,
                    None => return Ok((packet, cursor - offset)),
                };
                parent.children.push(packet);
                if !parent.is_complete(cursor)? {
                    open.push(parent);
                    break;
                }
                trace!(op = %parent.op, children = parent.children.len(), "closed operator");
                packet = parent.into_packet();
            }
        }
    }

    /// Reads the length-type bit and framing field of an operator packet
    /// whose body begins at `offset`.
    fn open_operator(&self, version: u8, op: Operator, offset: usize) -> ParseResult<Pending> {
        let length_type = self.view.take_bit(offset)?;
        let field = offset + 1;

        let framing = if length_type {
            let declared = self.view.take_uint(field, COUNT_FIELD_WIDTH)? as u16;
            trace!(offset, %op, declared, "operator framed by sub-packet count");
            Framing::Count(declared)
        } else {
            let declared = self.view.take_uint(field, LENGTH_FIELD_WIDTH)? as u16;
            trace!(offset, %op, declared, "operator framed by bit-length");
            let bits_left = self.view.remaining(field + LENGTH_FIELD_WIDTH);
            if usize::from(declared) > bits_left {
                return Err(WindowError::OpenWouldExceedBuffer {
                    bits_left,
                    request: usize::from(declared),
                }
                .into());
            }
            Framing::BitLength(declared)
        };

        Ok(Pending {
            version,
            op,
            framing,
            start: field + framing.field_width(),
            children: Vec::new(),
        })
    }
}

/// An operator packet whose sub-packets have not all been read yet
struct Pending {
    version: u8,
    op: Operator,
    framing: Framing,
    /// Offset of the first sub-packet
    start: usize,
    children: Vec<Packet>,
}

impl Pending {
    /// Whether the sub-packets read so far, ending at `cursor`, satisfy the
    /// framing.
    fn is_complete(&self, cursor: usize) -> ParseResult<bool> {
        match self.framing {
            Framing::Count(declared) => Ok(self.children.len() == usize::from(declared)),
            Framing::BitLength(declared) => {
                let declared = usize::from(declared);
                let consumed = cursor - self.start;
                match consumed.cmp(&declared) {
                    Ordering::Less => Ok(false),
                    Ordering::Equal => Ok(true),
                    Ordering::Greater => Err(FrameError::Overrun { declared, consumed }.into()),
                }
            }
        }
    }

    fn into_packet(self) -> Packet {
        Packet::from_parts(
            self.version,
            Payload::Operator {
                op: self.op,
                framing: self.framing,
                children: self.children,
            },
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorKind;

    fn parse(hex: &str) -> ParseResult<(Packet, usize)> {
        let bits = crate::bits!(hex);
        PacketParser::new(&bits, ParseOptions::default()).parse_root()
    }

    fn bits_of(s: &str) -> BitString {
        s.chars().filter(|c| !c.is_whitespace()).map(|c| c == '1').collect()
    }

    #[test]
    fn view_bounds() {
        let bits = bits_of("1101 0010");
        let view = BitView::new(bits.as_slice());
        assert_eq!(view.take_uint(0, 3), Ok(0b110));
        assert_eq!(view.take_uint(3, 3), Ok(0b100));
        assert_eq!(view.take_uint(0, 0), Ok(0));
        assert_eq!(view.take_bit(7), Ok(false));
        assert_eq!(
            view.take_uint(6, 3),
            Err(ParseError::Window(WindowError::ConsumeWouldExceedLimit {
                offset: 6,
                requested: 3,
                limit: 8
            }))
        );
        assert!(view.take_uint(usize::MAX, 2).is_err());
        assert_eq!(view.remaining(6), 2);
        assert_eq!(view.remaining(10), 0);
    }

    #[test]
    fn literal_packet() {
        let (packet, consumed) = parse("D2FE28").unwrap();
        assert_eq!(consumed, 21);
        assert_eq!(packet.version(), 6);
        assert_eq!(packet.type_id(), 4);
        assert_eq!(packet.value().map(ToString::to_string).as_deref(), Some("2021"));
        assert!(packet.children().is_empty());
    }

    #[test]
    fn length_framed_operator() {
        let (packet, consumed) = parse("38006F45291200").unwrap();
        assert_eq!(consumed, 49);
        assert_eq!(packet.version(), 1);
        assert_eq!(packet.type_id(), 6);
        assert_eq!(packet.framing(), Some(Framing::BitLength(27)));
        let values: Vec<String> = packet
            .children()
            .iter()
            .map(|c| c.value().unwrap().to_string())
            .collect();
        assert_eq!(values, ["10", "20"]);
    }

    #[test]
    fn count_framed_operator() {
        let (packet, consumed) = parse("EE00D40C823060").unwrap();
        assert_eq!(consumed, 51);
        assert_eq!(packet.version(), 7);
        assert_eq!(packet.type_id(), 3);
        assert_eq!(packet.framing(), Some(Framing::Count(3)));
        let values: Vec<String> = packet
            .children()
            .iter()
            .map(|c| c.value().unwrap().to_string())
            .collect();
        assert_eq!(values, ["1", "2", "3"]);
    }

    #[test]
    fn nested_operators() {
        // 4 -> 1 -> 5 -> literal
        let (packet, _) = parse("8A004A801A8002F478").unwrap();
        assert_eq!(packet.depth(), 3);
        assert_eq!(packet.count(), 4);
        let versions: Vec<u8> = packet.iter().map(Packet::version).collect();
        assert_eq!(versions, [4, 1, 5, 6]);
    }

    #[test]
    fn truncated_header() {
        let err = parse("D").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedStream);
        assert_eq!(
            err,
            ParseError::Window(WindowError::ConsumeWouldExceedLimit {
                offset: 3,
                requested: 3,
                limit: 4
            })
        );
        assert_eq!(parse("").unwrap_err().kind(), ErrorKind::TruncatedStream);
    }

    #[test]
    fn truncated_literal() {
        // "D2FE28" with its final group cut short
        assert_eq!(parse("D2FE").unwrap_err().kind(), ErrorKind::TruncatedStream);
    }

    #[test]
    fn truncated_sub_packets() {
        // declares three sub-packets but only carries two
        let err = parse("EE00D40C8230").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedStream);

        // declares a 27-bit region that the stream cannot hold
        let err = parse("38006F452912").unwrap_err();
        assert_eq!(
            err,
            ParseError::Window(WindowError::OpenWouldExceedBuffer {
                bits_left: 26,
                request: 27
            })
        );
    }

    #[test]
    fn length_overrun() {
        // sum operator declaring 10 bits, holding an 11-bit literal
        let bits = bits_of("000 000 0 000000000001010 000 100 00001 00000");
        let err = PacketParser::new(&bits, ParseOptions::default())
            .parse_root()
            .unwrap_err();
        assert_eq!(
            err,
            ParseError::Frame(FrameError::Overrun {
                declared: 10,
                consumed: 11
            })
        );
        assert_eq!(err.kind(), ErrorKind::MalformedOperator);
    }

    #[test]
    fn empty_operators() {
        let bits = bits_of("001 000 0 000000000000000");
        let (packet, consumed) = PacketParser::new(&bits, ParseOptions::default())
            .parse_root()
            .unwrap();
        assert_eq!(consumed, 22);
        assert!(packet.children().is_empty());

        let bits = bits_of("001 001 1 00000000000");
        let (packet, consumed) = PacketParser::new(&bits, ParseOptions::default())
            .parse_root()
            .unwrap();
        assert_eq!(consumed, 18);
        assert_eq!(packet.framing(), Some(Framing::Count(0)));
    }

    #[test]
    fn offset_parsing() {
        let bits = bits_of("11 110 100 00101");
        let p = PacketParser::new(&bits, ParseOptions::default());
        let (packet, consumed) = p.parse_packet(2, 0).unwrap();
        assert_eq!(consumed, 11);
        assert_eq!(packet.version(), 6);
        assert_eq!(packet.value().unwrap().to_string(), "5");
    }

    #[test]
    fn nesting_limit() {
        let bits = crate::bits!("8A004A801A8002F478");
        let shallow = PacketParser::new(&bits, ParseOptions::with_max_depth(2));
        assert_eq!(
            shallow.parse_root().unwrap_err(),
            ParseError::Nesting { limit: 2 }
        );
        let exact = PacketParser::new(&bits, ParseOptions::with_max_depth(3));
        assert!(exact.parse_root().is_ok());
    }

    /// `wrappers` single-child `sum` operators around the literal `1`
    fn nested_sums(wrappers: usize) -> BitString {
        use crate::conv::Encode;

        let mut packet = Packet::literal(0, 1u8);
        for _ in 0..wrappers {
            packet = Packet::count_framed(0, Operator::Sum, vec![packet]).unwrap();
        }
        packet.encode()
    }

    /// Runs `f` on a thread with the 2 MiB stack that spawned threads get by
    /// default.
    fn on_small_stack<F, T>(f: F) -> T
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(f)
            .unwrap()
            .join()
            .unwrap()
    }

    #[test]
    fn default_nesting_limit() {
        on_small_stack(|| {
            let bits = nested_sums(DEFAULT_MAX_DEPTH);
            let (packet, consumed) = PacketParser::new(&bits, ParseOptions::default())
                .parse_root()
                .unwrap();
            assert_eq!(consumed, 18 * DEFAULT_MAX_DEPTH + 11);
            assert_eq!(packet.depth(), DEFAULT_MAX_DEPTH);
            assert_eq!(packet.sum_versions(), 0);
            assert_eq!(packet.evaluate().unwrap().to_string(), "1");

            let bits = nested_sums(DEFAULT_MAX_DEPTH + 1);
            let err = PacketParser::new(&bits, ParseOptions::default())
                .parse_root()
                .unwrap_err();
            assert_eq!(
                err,
                ParseError::Nesting {
                    limit: DEFAULT_MAX_DEPTH
                }
            );
            assert_eq!(err.kind(), ErrorKind::NestingTooDeep);
        });
    }

    #[cfg(not(feature = "check_padding"))]
    #[test]
    fn padding_ignored() {
        let (packet, consumed) = parse("D2FE2F").unwrap();
        assert_eq!(consumed, 21);
        assert_eq!(packet.value().unwrap().to_string(), "2021");
    }

    #[cfg(feature = "check_padding")]
    #[test]
    fn padding_checked() {
        assert!(parse("D2FE28").is_ok());
        assert_eq!(
            parse("D2FE2F").unwrap_err(),
            ParseError::Token(error::TokenError::NonZeroPadding {
                offset: 21,
                padding: 3
            })
        );
    }
}
