//! Validated conversion from hex-encoded strings to bit-level buffers
//!
//! # Background
//!
//! Transmissions in the BITS format are exchanged as *hex-strings*, but the
//! packets they carry are not byte-aligned: headers are 3 bits wide, length
//! fields 11 or 15 bits, and literal groups 5 bits. Before any parsing can
//! happen, the hex-string is therefore expanded into its exact sequence of
//! binary digits, four per hex-digit, most significant bit first:
//!
//! ```text
//! "D2FE28" ~ 1101 0010 1111 1110 0010 1000
//! ```
//!
//! There is no parity requirement, as a lone hex-digit encodes a complete
//! nibble. The only possible failure is a character outside of the hex
//! alphabet, which is reported rather than skipped, since silently dropping
//! four bits would shift every subsequent field.
//!
//! # `BitString`
//!
//! The struct `BitString` defined in this module is the owned, immutable
//! bitstream that the parser reads from. It can be created from:
//!
//!   * hex-encoded string-like types, via [`BitString::from_hex`], `TryFrom` or `FromStr`
//!   * raw sequences of `bool`, via `From<Vec<bool>>` or `FromIterator<bool>`
//!
//! For lightweight construction in tests, the [`bits`] macro is also provided.
//!
//! By default only uppercase digits are accepted; the `lowercase_hex`
//! feature relaxes this to case-insensitive parsing.

use crate::conv::target::Target;
use crate::error::HexConvError;
use std::{convert::TryFrom, iter::FromIterator};

pub type Iter<'a> = std::iter::Copied<std::slice::Iter<'a, bool>>;

pub(crate) mod util {
    use crate::error::HexConvError;

    /// Returns the 4-bit value of a single hex-digit, or `None` if the
    /// character is outside the accepted alphabet.
    #[inline]
    #[must_use]
    pub const fn nibble_of_char(c: char) -> Option<u8> {
        match c {
            '0'..='9' => Some(c as u8 - b'0'),
            'A'..='F' => Some(c as u8 - b'A' + 10),
            #[cfg(feature = "lowercase_hex")]
            'a'..='f' => Some(c as u8 - b'a' + 10),
            _ => None,
        }
    }

    /// Returns the uppercase hex-digit for the low four bits of `nib`
    #[inline]
    #[must_use]
    pub const fn char_of_nibble(nib: u8) -> char {
        const DIGITS: &[u8; 16] = b"0123456789ABCDEF";
        DIGITS[(nib & 0xf) as usize] as char
    }

    /// Expands a hex-encoded string into its binary digits, most significant
    /// bit of each hex-digit first.
    ///
    /// # Errors
    ///
    /// Returns `Err(NonHex { .. })` on the first character that is not a
    /// valid hex-digit, indicating its character index and value.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bitsy::bits::BitString;
    /// assert_eq!(BitString::from_hex("A").unwrap().to_string(), "1010");
    /// ```
    pub fn bits_of_hex(src: &str) -> Result<Vec<bool>, HexConvError> {
        let mut dst = Vec::with_capacity(src.len() * 4);

        for (index, found) in src.chars().enumerate() {
            match nibble_of_char(found) {
                Some(nib) => {
                    for shift in (0..4).rev() {
                        dst.push((nib >> shift) & 1 == 1);
                    }
                }
                None => return Err(HexConvError::NonHex { index, found }),
            }
        }
        Ok(dst)
    }

    /// Formats a sequence of bits as an undelimited uppercase hex `String`.
    ///
    /// When the number of bits is not a multiple of four, the final nibble is
    /// right-padded with zero bits.
    #[must_use]
    pub fn hex_of_bits(bits: &[bool]) -> String {
        bits.chunks(4)
            .map(|chunk| {
                let nib = chunk
                    .iter()
                    .chain(std::iter::repeat(&false))
                    .take(4)
                    .fold(0u8, |acc, &bit| (acc << 1) | bit as u8);
                char_of_nibble(nib)
            })
            .collect()
    }
}

/// Newtype representing bitstreams that are parsed from hexadecimally
/// encoded `String` values, but stored in memory as one `bool` per
/// binary digit.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
#[repr(transparent)]
pub struct BitString {
    bits: Vec<bool>,
}

impl BitString {
    /// Constructs a new, empty `BitString`
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { bits: Vec::new() }
    }

    /// Extracts a slice containing the entirety of the underlying bits
    #[inline(always)]
    #[must_use]
    pub fn as_slice(&self) -> &[bool] {
        self.bits.as_slice()
    }

    /// Destructs a `BitString` into its underlying vector
    #[inline]
    #[must_use]
    pub fn into_vec(self) -> Vec<bool> {
        self.bits
    }

    /// Returns `true` if the `BitString` contains no bits
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Returns the number of bits in `self`
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Returns an iterator over the bits of `self`
    pub fn iter(&self) -> Iter<'_> {
        self.bits.iter().copied()
    }

    /// Attempt to parse a hexadecimally encoded string into the sequence of
    /// bits it represents.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bitsy::bits::BitString;
    /// let bits = BitString::from_hex("D2FE28").unwrap();
    /// assert_eq!(bits.len(), 24);
    /// assert_eq!(bits.to_string(), "110100101111111000101000");
    /// ```
    pub fn from_hex<S>(hex: S) -> Result<Self, HexConvError>
    where
        S: AsRef<str>,
    {
        Ok(Self {
            bits: util::bits_of_hex(hex.as_ref())?,
        })
    }

    /// Returns an uppercase hex-encoding of `self`, zero-padding the final
    /// digit if the bit-length is not a multiple of four.
    #[inline]
    #[must_use]
    pub fn to_hex(&self) -> String {
        util::hex_of_bits(&self.bits)
    }

    /// Appends zero bits until the length is a multiple of `n`.
    pub fn pad_to_multiple(&mut self, n: usize) {
        if n > 0 {
            let rem = self.bits.len() % n;
            if rem != 0 {
                self.bits.resize(self.bits.len() + (n - rem), false);
            }
        }
    }
}

impl AsRef<[bool]> for BitString {
    fn as_ref(&self) -> &[bool] {
        self.bits.as_ref()
    }
}

impl std::fmt::Debug for BitString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("BitString").field(&self.to_string()).finish()
    }
}

impl std::fmt::Display for BitString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s: String = self.bits.iter().map(|&b| if b { '1' } else { '0' }).collect();
        f.write_str(&s)
    }
}

impl FromIterator<bool> for BitString {
    fn from_iter<T: IntoIterator<Item = bool>>(iter: T) -> Self {
        Self {
            bits: <Vec<bool> as FromIterator<bool>>::from_iter(iter),
        }
    }
}

impl Extend<bool> for BitString {
    fn extend<T: IntoIterator<Item = bool>>(&mut self, iter: T) {
        self.bits.extend(iter)
    }
}

impl<'a> IntoIterator for &'a BitString {
    type Item = bool;

    type IntoIter = Iter<'a>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl From<Vec<bool>> for BitString {
    fn from(bits: Vec<bool>) -> Self {
        Self { bits }
    }
}

impl From<BitString> for Vec<bool> {
    fn from(val: BitString) -> Self {
        val.bits
    }
}

impl Target for BitString {
    fn anticipate(&mut self, extra: usize) {
        self.bits.anticipate(extra)
    }

    fn create() -> Self {
        BitString { bits: Vec::new() }
    }

    fn push_bit(&mut self, bit: bool) -> usize {
        self.bits.push_bit(bit)
    }

    fn push_uint(&mut self, value: u64, width: usize) -> usize {
        self.bits.push_uint(value, width)
    }
}

macro_rules! impl_try_from {
    ( $src:ty ) => {
        impl TryFrom<$src> for BitString {
            type Error = HexConvError;

            fn try_from(s: $src) -> Result<Self, Self::Error> {
                Self::from_hex(s)
            }
        }
    };
}

impl_try_from!(&str);
impl_try_from!(String);
impl_try_from!(std::borrow::Cow<'_, str>);

impl std::str::FromStr for BitString {
    type Err = HexConvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// Converts a string-like literal or expression into a `BitString` by parsing
/// it as hexadecimal
///
/// Will panic if the argument is not a valid hex-string and therefore cannot be
/// converted.
#[macro_export]
macro_rules! bits {
    ($s : expr) => {{
        $crate::bits::BitString::from_hex($s).expect("bits! macro encountered error")
    }};
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn nibble_expansion() {
        assert_eq!(bits!("A").to_string(), "1010");
        assert_eq!(bits!("0").to_string(), "0000");
        assert_eq!(bits!("F0").to_string(), "11110000");
        assert_eq!(bits!("").len(), 0);
    }

    #[test]
    fn length_is_four_per_digit() {
        for hex in ["D2FE28", "38006F45291200", "9C0141080250320F1802104A08", "7"] {
            assert_eq!(bits!(hex).len(), hex.len() * 4);
        }
    }

    #[test]
    fn hex_roundtrip() {
        let all = "0123456789ABCDEF";
        assert_eq!(bits!(all).to_hex(), all);
        assert_eq!(bits!("C0015000016115A2E0802F182340").to_hex(), "C0015000016115A2E0802F182340");
    }

    #[test]
    fn rejects_non_hex() {
        assert_eq!(
            BitString::from_hex("D2G"),
            Err(HexConvError::NonHex {
                index: 2,
                found: 'G'
            })
        );
        assert!(BitString::from_hex("D2 FE").is_err());
        assert!(BitString::from_hex("D2\n").is_err());
    }

    #[cfg(not(feature = "lowercase_hex"))]
    #[test]
    fn rejects_lowercase() {
        assert_eq!(
            "d2fe28".parse::<BitString>(),
            Err(HexConvError::NonHex {
                index: 0,
                found: 'd'
            })
        );
    }

    #[cfg(feature = "lowercase_hex")]
    #[test]
    fn accepts_lowercase() {
        assert_eq!(bits!("d2fe28"), bits!("D2FE28"));
        assert_eq!(bits!("d2fe28").to_hex(), "D2FE28");
    }

    #[test]
    fn padding() {
        let mut b: BitString = vec![true, false, true].into();
        assert_eq!(b.to_hex(), "A");
        b.pad_to_multiple(4);
        assert_eq!(b.to_string(), "1010");
        b.pad_to_multiple(4);
        assert_eq!(b.len(), 4);
    }
}
