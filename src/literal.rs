//! Arbitrary-precision literal values and their group encoding
//!
//! A literal packet carries a single non-negative integer, split into
//! 4-bit nibbles from most to least significant. Each nibble is prefixed
//! by a continuation flag, forming a 5-bit group; the flag is set on every
//! group except the last.
//!
//! ```text
//! 2021 = 0111 1110 0101  ~  10111 11110 00101
//! ```
//!
//! The encoding places no bound on the number of groups, so values are held
//! as [`BigUint`] rather than a fixed-width integer.

use std::{convert::TryFrom, fmt::Display, ops::Deref};

use ::num_bigint::BigUint;
use ::num_integer::Integer;

use crate::conv::{target::Target, Decode, Encode};
use crate::parse::{error::ParseResult, PacketParser};

/// Width of a single literal group, including its continuation flag
pub const GROUP_WIDTH: usize = 5;

/// Number of value bits carried by each literal group
pub const NIBBLE_WIDTH: usize = 4;

/// A literal value, together with the number of groups it was written in.
///
/// Nothing forbids an encoder from emitting leading all-zero groups, so the
/// group count is kept alongside the value in order that re-encoding a
/// decoded literal reproduces its original span. Two literals are equal only
/// if they agree on both.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize))]
pub struct Literal {
    value: BigUint,
    groups: usize,
}

/// Fewest groups that can hold `value`
fn min_groups(value: &BigUint) -> usize {
    let n: usize = value.bits() as usize;
    Integer::div_ceil(&n, &NIBBLE_WIDTH).max(1)
}

impl Literal {
    pub fn into_inner(self) -> BigUint {
        self.value
    }

    pub const fn as_inner(&self) -> &BigUint {
        &self.value
    }

    /// Literal holding `nat` in the fewest groups possible
    pub fn new(nat: BigUint) -> Self {
        let groups = min_groups(&nat);
        Self { value: nat, groups }
    }

    /// Assembles a value from its nibbles, most significant first, keeping
    /// one group per nibble even where the leading nibbles are zero.
    ///
    /// Only the low four bits of each item are used.
    #[must_use]
    pub fn from_nibbles(nibbles: impl IntoIterator<Item = u8>) -> Self {
        let mut value = BigUint::default();
        let mut groups = 0;
        for nib in nibbles {
            value <<= NIBBLE_WIDTH;
            value |= BigUint::from(nib & 0xf);
            groups += 1;
        }
        Self {
            value,
            groups: groups.max(1),
        }
    }

    /// Splits the value into nibbles, most significant first, zero-extended
    /// to the group count.
    #[must_use]
    pub fn to_nibbles(&self) -> Vec<u8> {
        let digits = self.value.to_radix_be(16);
        let mut nibbles = vec![0; self.groups.saturating_sub(digits.len())];
        nibbles.extend(digits);
        nibbles
    }

    /// Number of 5-bit groups in the encoded form of this value
    #[must_use]
    pub const fn group_count(&self) -> usize {
        self.groups
    }
}

impl Default for Literal {
    fn default() -> Self {
        Self::new(BigUint::default())
    }
}

impl std::fmt::Debug for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.groups == min_groups(&self.value) {
            write!(f, "Literal({})", &self.value)
        } else {
            write!(f, "Literal({}; {} groups)", &self.value, self.groups)
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        <BigUint as Display>::fmt(&self.value, f)
    }
}

impl From<Literal> for BigUint {
    fn from(val: Literal) -> Self {
        val.value
    }
}

impl From<BigUint> for Literal {
    fn from(value: BigUint) -> Self {
        Self::new(value)
    }
}

macro_rules! impl_literal_from {
    ($src:ty) => {
        impl From<$src> for Literal {
            fn from(val: $src) -> Self {
                Self::new(BigUint::from(val))
            }
        }
    };
}

impl_literal_from!(u8);
impl_literal_from!(u16);
impl_literal_from!(u32);
impl_literal_from!(u64);

macro_rules! impl_literal_coerce {
    ($tgt:ty) => {
        impl TryFrom<Literal> for $tgt {
            type Error = <$tgt as TryFrom<BigUint>>::Error;

            fn try_from(val: Literal) -> Result<$tgt, Self::Error> {
                <$tgt as TryFrom<BigUint>>::try_from(val.value)
            }
        }
    };
}

impl_literal_coerce!(u8);
impl_literal_coerce!(u16);
impl_literal_coerce!(u32);
impl_literal_coerce!(u64);

impl Deref for Literal {
    type Target = BigUint;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl Decode for Literal {
    /// Reads 5-bit groups from `offset` until one with a clear continuation
    /// flag has been read, returning the value and the number of bits spanned.
    fn parse_at(p: &PacketParser<'_>, offset: usize, _depth: usize) -> ParseResult<(Self, usize)> {
        let view = p.view();
        let mut cursor = offset;
        let mut nibbles = Vec::new();
        loop {
            let group = view.take_uint(cursor, GROUP_WIDTH)?;
            cursor += GROUP_WIDTH;
            nibbles.push((group & 0xf) as u8);
            if group & 0x10 == 0 {
                break;
            }
        }
        Ok((Self::from_nibbles(nibbles), cursor - offset))
    }
}

impl Encode for Literal {
    fn write_to<U: Target>(&self, buf: &mut U) -> usize {
        let nibbles = self.to_nibbles();
        buf.anticipate(nibbles.len() * GROUP_WIDTH);
        let last = nibbles.len() - 1;
        nibbles
            .iter()
            .enumerate()
            .map(|(ix, &nib)| {
                let flag = if ix == last { 0 } else { 0x10 };
                buf.push_uint(u64::from(flag | nib), GROUP_WIDTH)
            })
            .sum()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bits::BitString;
    use crate::parse::{error::WindowError, ParseOptions};

    static LIT: fn(u64) -> Literal = |i: u64| Literal::from(i);

    fn groups(s: &str) -> BitString {
        s.chars().filter(|c| !c.is_whitespace()).map(|c| c == '1').collect()
    }

    #[test]
    fn group_decoding() {
        let bits = groups("10111 11110 00101 000");
        let p = PacketParser::new(&bits, ParseOptions::default());
        assert_eq!(Literal::parse_at(&p, 0, 0), Ok((LIT(2021), 15)));

        let bits = groups("01010");
        let p = PacketParser::new(&bits, ParseOptions::default());
        assert_eq!(Literal::parse_at(&p, 0, 0), Ok((LIT(10), 5)));
    }

    #[test]
    fn unterminated_groups() {
        let bits = groups("10111 1111");
        let p = PacketParser::new(&bits, ParseOptions::default());
        assert_eq!(
            Literal::parse_at(&p, 0, 0),
            Err(WindowError::ConsumeWouldExceedLimit {
                offset: 5,
                requested: 5,
                limit: 9
            }
            .into())
        );
    }

    #[test]
    fn group_encoding() {
        assert_eq!(LIT(2021).encode::<BitString>(), groups("10111 11110 00101"));
        assert_eq!(LIT(0).encode::<BitString>(), groups("00000"));
        assert_eq!(LIT(0).group_count(), 1);
        assert_eq!(LIT(15).group_count(), 1);
        assert_eq!(LIT(16).group_count(), 2);
    }

    #[test]
    fn wide_values() {
        let big = Literal::from_nibbles(std::iter::repeat(0xf).take(40));
        assert_eq!(big.group_count(), 40);
        assert!(u64::try_from(big.clone()).is_err());
        assert_eq!(big.bit_len(), 200);
    }

    #[test]
    fn leading_zero_groups() {
        let bits = groups("10000 00001");
        let p = PacketParser::new(&bits, ParseOptions::default());
        let (lit, used) = Literal::parse_at(&p, 0, 0).unwrap();
        assert_eq!(used, 10);
        assert_eq!(lit.to_string(), "1");
        assert_eq!(lit.group_count(), 2);
        assert_eq!(lit.to_nibbles(), [0, 1]);
        assert_eq!(lit.encode::<BitString>(), bits);
        assert_ne!(lit, LIT(1));
        assert_eq!(format!("{:?}", lit), "Literal(1; 2 groups)");

        let zeros = Literal::from_nibbles([0, 0, 0]);
        assert_eq!(zeros.encode::<BitString>(), groups("10000 10000 00000"));
        assert_eq!(Literal::from_nibbles(std::iter::empty()).group_count(), 1);
    }
}
