//! Assorted imports for downstream users of the decoder
//!
//! ```
//! use bitsy::prelude::*;
//!
//! let packet = Packet::decode("C200B40A82").unwrap();
//! assert_eq!(packet.operator(), Some(Operator::Sum));
//! ```

#[doc(inline)]
pub use crate::{
    BitString, Decode, Encode, ErrorKind, Framing, Literal, Operator, Packet, ParseOptions,
    Payload,
};
