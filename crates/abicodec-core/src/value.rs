//! Decoded value representation.
//!
//! Consumers always deal with `NormalizedValue`, whatever ABI type produced it.
//! Integers are exact 256-bit values (`U256` / `I256`, four 64-bit limbs).

use alloy_primitives::{Address, I256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A decoded, normalized ABI value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum NormalizedValue {
    /// Any `uintN`
    #[serde(rename = "uint")]
    UInt(U256),
    /// Any `intN`
    Int(I256),
    Address(Address),
    Bool(bool),
    /// `bytes` and `bytesN` (exactly `N` bytes)
    Bytes(Vec<u8>),
    String(String),
    /// Dynamic and fixed-size arrays
    Array(Vec<NormalizedValue>),
    /// Tuples / structs with named components, in declaration order
    Tuple(Vec<(String, NormalizedValue)>),
}

impl NormalizedValue {
    /// Short name of the variant, used in type-mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            NormalizedValue::UInt(_) => "uint",
            NormalizedValue::Int(_) => "int",
            NormalizedValue::Address(_) => "address",
            NormalizedValue::Bool(_) => "bool",
            NormalizedValue::Bytes(_) => "bytes",
            NormalizedValue::String(_) => "string",
            NormalizedValue::Array(_) => "array",
            NormalizedValue::Tuple(_) => "tuple",
        }
    }

    pub fn as_u256(&self) -> Option<U256> {
        match self {
            NormalizedValue::UInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i256(&self) -> Option<I256> {
        match self {
            NormalizedValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<Address> {
        match self {
            NormalizedValue::Address(a) => Some(*a),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            NormalizedValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            NormalizedValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            NormalizedValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[NormalizedValue]> {
        match self {
            NormalizedValue::Array(v) => Some(v),
            _ => None,
        }
    }

    /// Look up a tuple component by name.
    pub fn field(&self, name: &str) -> Option<&NormalizedValue> {
        match self {
            NormalizedValue::Tuple(fields) => {
                fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
            }
            _ => None,
        }
    }
}

/// `true` if `value` fits in an unsigned integer of `bits` bits.
pub fn uint_fits(value: &U256, bits: u16) -> bool {
    bits >= 256 || (*value >> usize::from(bits)).is_zero()
}

/// `true` if `value` fits in a two's-complement integer of `bits` bits.
pub fn int_fits(value: &I256, bits: u16) -> bool {
    if bits >= 256 {
        return true;
    }
    if bits == 0 {
        return value.is_zero();
    }
    let raw = value.into_raw();
    let shift = usize::from(bits - 1);
    if value.is_negative() {
        (!raw >> shift).is_zero()
    } else {
        (raw >> shift).is_zero()
    }
}

impl From<U256> for NormalizedValue {
    fn from(v: U256) -> Self {
        NormalizedValue::UInt(v)
    }
}

impl From<u64> for NormalizedValue {
    fn from(v: u64) -> Self {
        NormalizedValue::UInt(U256::from(v))
    }
}

impl From<I256> for NormalizedValue {
    fn from(v: I256) -> Self {
        NormalizedValue::Int(v)
    }
}

impl From<Address> for NormalizedValue {
    fn from(a: Address) -> Self {
        NormalizedValue::Address(a)
    }
}

impl From<bool> for NormalizedValue {
    fn from(b: bool) -> Self {
        NormalizedValue::Bool(b)
    }
}

impl From<Vec<u8>> for NormalizedValue {
    fn from(b: Vec<u8>) -> Self {
        NormalizedValue::Bytes(b)
    }
}

impl From<String> for NormalizedValue {
    fn from(s: String) -> Self {
        NormalizedValue::String(s)
    }
}

impl From<&str> for NormalizedValue {
    fn from(s: &str) -> Self {
        NormalizedValue::String(s.to_string())
    }
}

impl fmt::Display for NormalizedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizedValue::UInt(v) => write!(f, "{v}"),
            NormalizedValue::Int(v) => write!(f, "{v}"),
            // EIP-55 checksummed
            NormalizedValue::Address(a) => write!(f, "{a}"),
            NormalizedValue::Bool(b) => write!(f, "{b}"),
            NormalizedValue::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            NormalizedValue::String(s) => write!(f, "{s}"),
            NormalizedValue::Array(v) => {
                let parts: Vec<_> = v.iter().map(|x| x.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            NormalizedValue::Tuple(fields) => {
                let parts: Vec<_> = fields.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}
