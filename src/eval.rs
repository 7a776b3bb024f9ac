//! Read-only computations over a decoded packet tree
//!
//! Two aggregates are defined over a tree: the sum of every packet's version
//! field, and the value of the expression the tree denotes, where each
//! operator is applied to the values of its sub-packets:
//!
//! | type id | operator       | operands | result                          |
//! |---------|----------------|----------|---------------------------------|
//! | 0       | `sum`          | any      | sum of operands (0 if none)     |
//! | 1       | `product`      | any      | product of operands (1 if none) |
//! | 2       | `minimum`      | >= 1     | least operand                   |
//! | 3       | `maximum`      | >= 1     | greatest operand                |
//! | 4       | literal        | 0        | the literal value               |
//! | 5       | `greater-than` | 2        | 1 if first > second, else 0     |
//! | 6       | `less-than`    | 2        | 1 if first < second, else 0     |
//! | 7       | `equal-to`     | 2        | 1 if first == second, else 0    |
//!
//! Values are arbitrary precision, so neither sums nor products can overflow.

use num_bigint::BigUint;
use num_traits::{One, Zero};
use tracing::trace;

use crate::conv::Decode;
use crate::error::{ArityError, EvalError, Result};
use crate::packet::{Operator, Packet, Payload};
use crate::parse::ParseOptions;

pub type EvalResult<T> = std::result::Result<T, EvalError>;

/// Sum of the version field of `packet` and every one of its descendants
#[must_use]
pub fn sum_versions(packet: &Packet) -> u64 {
    packet.iter().map(|p| u64::from(p.version())).sum()
}

/// Evaluates the expression rooted at `packet`, evaluating sub-packets first.
///
/// The traversal keeps its own stack, so any tree the parser accepts can be
/// evaluated regardless of its depth.
///
/// # Errors
///
/// Fails with [`ArityError`] when a comparison operator does not have exactly
/// two sub-packets, or when `minimum` or `maximum` has none.
pub fn evaluate(packet: &Packet) -> EvalResult<BigUint> {
    let mut work = vec![Visit::Enter(packet)];
    let mut values: Vec<BigUint> = Vec::new();

    while let Some(visit) = work.pop() {
        match visit {
            Visit::Enter(packet) => match packet.payload() {
                Payload::Literal(value) => values.push(value.as_inner().clone()),
                Payload::Operator { op, children, .. } => {
                    work.push(Visit::Exit(*op, children.len()));
                    work.extend(children.iter().rev().map(Visit::Enter));
                }
            },
            Visit::Exit(op, arity) => {
                let operands = values.split_off(values.len() - arity);
                let result = apply(op, operands)?;
                trace!(%op, %result, "evaluated operator");
                values.push(result);
            }
        }
    }

    debug_assert_eq!(values.len(), 1);
    Ok(values.pop().unwrap_or_default())
}

/// Step of the post-order walk in [`evaluate`]
enum Visit<'a> {
    Enter(&'a Packet),
    /// Apply the operator to the values of its last `usize` operands
    Exit(Operator, usize),
}

/// Applies `op` to already-evaluated operands
pub fn apply(op: Operator, operands: Vec<BigUint>) -> EvalResult<BigUint> {
    let actual = operands.len();
    match op {
        Operator::Sum => Ok(operands.into_iter().fold(BigUint::zero(), |acc, x| acc + x)),
        Operator::Product => Ok(operands.into_iter().fold(BigUint::one(), |acc, x| acc * x)),
        Operator::Minimum => operands
            .into_iter()
            .min()
            .ok_or_else(|| ArityError::TooFew { op, min: 1, actual }.into()),
        Operator::Maximum => operands
            .into_iter()
            .max()
            .ok_or_else(|| ArityError::TooFew { op, min: 1, actual }.into()),
        Operator::GreaterThan | Operator::LessThan | Operator::EqualTo => match operands.as_slice() {
            [lhs, rhs] => {
                let holds = match op {
                    Operator::GreaterThan => lhs > rhs,
                    Operator::LessThan => lhs < rhs,
                    _ => lhs == rhs,
                };
                Ok(BigUint::from(u8::from(holds)))
            }
            _ => Err(ArityError::WrongArity { op, exact: 2, actual }.into()),
        },
    }
}

impl Packet {
    /// See [`sum_versions`]
    #[must_use]
    pub fn sum_versions(&self) -> u64 {
        sum_versions(self)
    }

    /// See [`evaluate`]
    pub fn evaluate(&self) -> EvalResult<BigUint> {
        evaluate(self)
    }
}

/// The two aggregates computed over a decoded transmission
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Summary {
    pub version_sum: u64,
    pub value: BigUint,
}

impl Summary {
    pub fn of(packet: &Packet) -> EvalResult<Self> {
        Ok(Self {
            version_sum: sum_versions(packet),
            value: evaluate(packet)?,
        })
    }
}

/// Decodes a hex-encoded transmission and computes both aggregates over it.
///
/// Any failure aborts the whole pipeline; no partial results are returned.
pub fn decode_summary(hex: &str, opts: ParseOptions) -> Result<Summary> {
    let packet = Packet::decode_with(hex, opts)?;
    let summary = Summary::of(&packet)?;
    tracing::debug!(
        packets = packet.count(),
        depth = packet.depth(),
        version_sum = summary.version_sum,
        "decoded transmission"
    );
    Ok(summary)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::conv::Encode;
    use crate::error::ErrorKind;
    use crate::packet::Framing;

    fn value(hex: &str) -> BigUint {
        Packet::decode(hex).unwrap().evaluate().unwrap()
    }

    fn versions(hex: &str) -> u64 {
        Packet::decode(hex).unwrap().sum_versions()
    }

    #[test]
    fn version_sums() {
        assert_eq!(versions("D2FE28"), 6);
        assert_eq!(versions("38006F45291200"), 9);
        assert_eq!(versions("EE00D40C823060"), 14);
        assert_eq!(versions("8A004A801A8002F478"), 16);
        assert_eq!(versions("620080001611562C8802118E34"), 12);
        assert_eq!(versions("C0015000016115A2E0802F182340"), 23);
        assert_eq!(versions("A0016C880162017C3686B18A3D4780"), 31);
    }

    #[test]
    fn literal_value() {
        assert_eq!(value("D2FE28"), BigUint::from(2021u32));
    }

    #[test]
    fn operators() {
        assert_eq!(value("C200B40A82"), BigUint::from(3u8));
        assert_eq!(value("04005AC33890"), BigUint::from(54u8));
        assert_eq!(value("880086C3E88112"), BigUint::from(7u8));
        assert_eq!(value("CE00C43D881120"), BigUint::from(9u8));
        assert_eq!(value("D8005AC2A8F0"), BigUint::from(1u8));
        assert_eq!(value("F600BC2D8F"), BigUint::from(0u8));
        assert_eq!(value("9C005AC2F8F0"), BigUint::from(0u8));
        assert_eq!(value("9C0141080250320F1802104A08"), BigUint::from(1u8));
    }

    #[test]
    fn empty_sum_and_product() {
        assert_eq!(apply(Operator::Sum, vec![]), Ok(BigUint::zero()));
        assert_eq!(apply(Operator::Product, vec![]), Ok(BigUint::one()));
        assert_eq!(
            apply(Operator::Minimum, vec![]),
            Err(ArityError::TooFew {
                op: Operator::Minimum,
                min: 1,
                actual: 0
            }
            .into())
        );
    }

    #[test]
    fn no_overflow() {
        let big = Packet::literal(0, u64::MAX);
        let tree = Packet::count_framed(0, Operator::Product, vec![big.clone(), big]).unwrap();
        let expected = BigUint::from(u64::MAX) * BigUint::from(u64::MAX);
        assert_eq!(tree.evaluate(), Ok(expected));
    }

    fn comparison(children: usize) -> Packet {
        let operands = (0..children as u8).map(|i| Packet::literal(0, i)).collect();
        Packet::count_framed(0, Operator::LessThan, operands).unwrap()
    }

    #[test]
    fn comparison_arity() {
        assert_eq!(comparison(2).evaluate(), Ok(BigUint::one()));
        for n in [0, 1, 3] {
            assert_eq!(
                comparison(n).evaluate(),
                Err(ArityError::WrongArity {
                    op: Operator::LessThan,
                    exact: 2,
                    actual: n
                }
                .into())
            );
        }
    }

    #[test]
    fn comparison_arity_from_hex() {
        let hex = comparison(3).to_hex();
        let err = decode_summary(&hex, ParseOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedOperator);
        assert_eq!(comparison(3).framing(), Some(Framing::Count(3)));
    }

    #[test]
    fn summary() {
        let summary = decode_summary("9C0141080250320F1802104A08", ParseOptions::default()).unwrap();
        assert_eq!(summary.value, BigUint::one());
        assert_eq!(
            summary,
            Summary::of(&Packet::decode("9C0141080250320F1802104A08").unwrap()).unwrap()
        );
        assert_eq!(
            decode_summary("9C01X", ParseOptions::default()).unwrap_err().kind(),
            ErrorKind::InvalidCharacter
        );
        assert_eq!(
            decode_summary("9C01", ParseOptions::default()).unwrap_err().kind(),
            ErrorKind::TruncatedStream
        );
    }
}
