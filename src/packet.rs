//! The in-memory packet tree
//!
//! A decoded transmission is a single root [`Packet`] that exclusively owns
//! its sub-packets. The payload of each packet is a sum type, so that a
//! literal value can only be read from a literal packet, and sub-packets can
//! only be attached to an operator.
//!
//! Operators also record the [`Framing`] they were decoded with, so a tree
//! can be re-encoded bit-for-bit, and so callers can inspect which of the two
//! length disciplines the transmitter chose.

use std::convert::TryFrom;
use std::fmt::{Display, Formatter};

use crate::conv::{target::Target, Decode, Encode};
use crate::literal::Literal;
use crate::parse::error::{FrameError, ParseResult};
use crate::parse::PacketParser;

/// Width of the version field at the start of every packet
pub const VERSION_WIDTH: usize = 3;

/// Width of the type id field that follows the version
pub const TYPE_ID_WIDTH: usize = 3;

/// Type id marking a literal packet
pub const LITERAL_TYPE_ID: u8 = 4;

/// Width of the sub-packet bit-length field (length type `0`)
pub const LENGTH_FIELD_WIDTH: usize = 15;

/// Width of the sub-packet count field (length type `1`)
pub const COUNT_FIELD_WIDTH: usize = 11;

/// The operation an operator packet applies to the values of its sub-packets
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize))]
#[repr(u8)]
pub enum Operator {
    Sum = 0,
    Product = 1,
    Minimum = 2,
    Maximum = 3,
    GreaterThan = 5,
    LessThan = 6,
    EqualTo = 7,
}

impl Operator {
    /// Returns the 3-bit type id of this operator
    #[inline]
    #[must_use]
    pub const fn type_id(self) -> u8 {
        self as u8
    }

    /// Returns `true` for the three binary comparison operators
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Operator::GreaterThan | Operator::LessThan | Operator::EqualTo
        )
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Operator::Sum => "sum",
            Operator::Product => "product",
            Operator::Minimum => "minimum",
            Operator::Maximum => "maximum",
            Operator::GreaterThan => "greater-than",
            Operator::LessThan => "less-than",
            Operator::EqualTo => "equal-to",
        }
    }
}

impl TryFrom<u8> for Operator {
    /// The rejected type id, which is either [`LITERAL_TYPE_ID`] or wider
    /// than three bits
    type Error = u8;

    fn try_from(type_id: u8) -> Result<Self, Self::Error> {
        match type_id {
            0 => Ok(Operator::Sum),
            1 => Ok(Operator::Product),
            2 => Ok(Operator::Minimum),
            3 => Ok(Operator::Maximum),
            5 => Ok(Operator::GreaterThan),
            6 => Ok(Operator::LessThan),
            7 => Ok(Operator::EqualTo),
            other => Err(other),
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How the sub-packet region of an operator is delimited
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize))]
pub enum Framing {
    /// Length type `0`: total bits occupied by the sub-packets
    BitLength(u16),
    /// Length type `1`: number of sub-packets
    Count(u16),
}

impl Framing {
    /// The single length-type bit that selects this framing
    #[must_use]
    pub const fn length_type(self) -> bool {
        matches!(self, Framing::Count(_))
    }

    /// Width of the framing field, excluding the length-type bit
    #[must_use]
    pub const fn field_width(self) -> usize {
        match self {
            Framing::BitLength(_) => LENGTH_FIELD_WIDTH,
            Framing::Count(_) => COUNT_FIELD_WIDTH,
        }
    }

    /// The declared value of the framing field
    #[must_use]
    pub const fn declared(self) -> usize {
        match self {
            Framing::BitLength(n) | Framing::Count(n) => n as usize,
        }
    }

    /// Framing by bit-length, checking that `bits` fits in the 15-bit field
    pub fn bit_length(bits: usize) -> Result<Self, FrameError> {
        Self::checked(bits, LENGTH_FIELD_WIDTH).map(Framing::BitLength)
    }

    /// Framing by count, checking that `count` fits in the 11-bit field
    pub fn count(count: usize) -> Result<Self, FrameError> {
        Self::checked(count, COUNT_FIELD_WIDTH).map(Framing::Count)
    }

    fn checked(value: usize, width: usize) -> Result<u16, FrameError> {
        if value < (1 << width) {
            Ok(value as u16)
        } else {
            Err(FrameError::FieldOverflow { width, value })
        }
    }
}

/// Content of a packet, discriminated by its type id
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize))]
pub enum Payload {
    Literal(Literal),
    Operator {
        op: Operator,
        framing: Framing,
        children: Vec<Packet>,
    },
}

#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize))]
pub struct Packet {
    version: u8,
    payload: Payload,
}

impl Packet {
    /// Assembles a packet from a version and payload.
    ///
    /// Only the low three bits of `version` are kept.
    #[must_use]
    pub fn from_parts(version: u8, payload: Payload) -> Self {
        Self {
            version: version & 0b111,
            payload,
        }
    }

    #[must_use]
    pub fn literal(version: u8, value: impl Into<Literal>) -> Self {
        Self::from_parts(version, Payload::Literal(value.into()))
    }

    /// Builds an operator packet framed by the total encoded bit-length of
    /// `children`.
    pub fn length_framed(version: u8, op: Operator, children: Vec<Packet>) -> Result<Self, FrameError> {
        let bits = children.iter().map(Encode::bit_len).sum();
        let framing = Framing::bit_length(bits)?;
        Ok(Self::from_parts(
            version,
            Payload::Operator {
                op,
                framing,
                children,
            },
        ))
    }

    /// Builds an operator packet framed by the number of `children`.
    pub fn count_framed(version: u8, op: Operator, children: Vec<Packet>) -> Result<Self, FrameError> {
        let framing = Framing::count(children.len())?;
        Ok(Self::from_parts(
            version,
            Payload::Operator {
                op,
                framing,
                children,
            },
        ))
    }

    #[inline]
    #[must_use]
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Returns the 3-bit type id, `4` for literals
    #[must_use]
    pub fn type_id(&self) -> u8 {
        match &self.payload {
            Payload::Literal(_) => LITERAL_TYPE_ID,
            Payload::Operator { op, .. } => op.type_id(),
        }
    }

    #[inline]
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    #[must_use]
    pub fn is_literal(&self) -> bool {
        matches!(self.payload, Payload::Literal(_))
    }

    /// The value of a literal packet, or `None` for an operator
    #[must_use]
    pub fn value(&self) -> Option<&Literal> {
        match &self.payload {
            Payload::Literal(value) => Some(value),
            Payload::Operator { .. } => None,
        }
    }

    #[must_use]
    pub fn operator(&self) -> Option<Operator> {
        match &self.payload {
            Payload::Literal(_) => None,
            Payload::Operator { op, .. } => Some(*op),
        }
    }

    #[must_use]
    pub fn framing(&self) -> Option<Framing> {
        match &self.payload {
            Payload::Literal(_) => None,
            Payload::Operator { framing, .. } => Some(*framing),
        }
    }

    /// Sub-packets in transmission order; empty for literals
    #[must_use]
    pub fn children(&self) -> &[Packet] {
        match &self.payload {
            Payload::Literal(_) => &[],
            Payload::Operator { children, .. } => children.as_slice(),
        }
    }

    /// Iterates over this packet and all of its descendants in pre-order
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }

    /// Number of packets in the tree rooted at `self`
    #[must_use]
    pub fn count(&self) -> usize {
        self.iter().count()
    }

    /// Nesting depth of the tree rooted at `self`, where a packet with no
    /// sub-packets has depth `0`
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self, 0usize)];
        while let Some((packet, depth)) = stack.pop() {
            max = max.max(depth);
            stack.extend(packet.children().iter().map(|c| (c, depth + 1)));
        }
        max
    }

    /// Checks that the recorded framing of every operator in the tree agrees
    /// with its sub-packets, so that re-encoding reproduces a decodable
    /// stream.
    pub fn validate_framing(&self) -> Result<(), FrameError> {
        for packet in self.iter() {
            if let Payload::Operator {
                framing, children, ..
            } = &packet.payload
            {
                match *framing {
                    Framing::BitLength(n) => {
                        let actual: usize = children.iter().map(Encode::bit_len).sum();
                        if actual != n as usize {
                            return Err(FrameError::LengthMismatch {
                                declared: n as usize,
                                actual,
                            });
                        }
                    }
                    Framing::Count(n) => {
                        if children.len() != n as usize {
                            return Err(FrameError::CountMismatch {
                                declared: n as usize,
                                actual: children.len(),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Pre-order iterator over a packet tree, see [`Packet::iter`]
pub struct Iter<'a> {
    stack: Vec<&'a Packet>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Packet;

    fn next(&mut self) -> Option<Self::Item> {
        let packet = self.stack.pop()?;
        self.stack.extend(packet.children().iter().rev());
        Some(packet)
    }
}

impl<'a> IntoIterator for &'a Packet {
    type Item = &'a Packet;

    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Renders the tree as an S-expression, e.g. `(sum 1 (product 2 3))`
impl Display for Packet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.payload {
            Payload::Literal(value) => Display::fmt(value, f),
            Payload::Operator { op, children, .. } => {
                write!(f, "({op}")?;
                for child in children {
                    write!(f, " {child}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl Decode for Packet {
    fn parse_at(p: &PacketParser<'_>, offset: usize, depth: usize) -> ParseResult<(Self, usize)> {
        p.parse_packet(offset, depth)
    }
}

impl Encode for Packet {
    fn write_to<U: Target>(&self, buf: &mut U) -> usize {
        let header = buf.push_uint(u64::from(self.version), VERSION_WIDTH)
            + buf.push_uint(u64::from(self.type_id()), TYPE_ID_WIDTH);
        match &self.payload {
            Payload::Literal(value) => header + value.write_to(buf),
            Payload::Operator {
                framing, children, ..
            } => {
                let frame = buf.push_bit(framing.length_type())
                    + buf.push_uint(framing.declared() as u64, framing.field_width());
                header + frame + children.iter().map(|c| c.write_to(buf)).sum::<usize>()
            }
        }
    }
}
