//! ABI encoding, the inverse of `decode`.
//!
//! Values must match their descriptors exactly: the variant, tuple arity,
//! fixed array length and `bytesN` length are all checked, and integers must
//! fit the declared width.

use abicodec_core::{
    config::CodecConfig,
    error::EncodeError,
    fingerprint::keccak256,
    types::{TypeDescriptor, WORD},
    value::{int_fits, uint_fits, NormalizedValue},
};
use alloy_primitives::{B256, U256};

/// Encodes `NormalizedValue`s into ABI parameter blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbiEncoder {
    config: CodecConfig,
}

impl AbiEncoder {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    /// Encode a bare parameter tuple (no selector).
    pub fn encode_params<'t, I>(
        &self,
        types: I,
        values: &[NormalizedValue],
    ) -> Result<Vec<u8>, EncodeError>
    where
        I: IntoIterator<Item = &'t TypeDescriptor>,
    {
        let types: Vec<&TypeDescriptor> = types.into_iter().collect();
        if types.len() != values.len() {
            return Err(EncodeError::TypeMismatch {
                expected: format!("{} arguments", types.len()),
                got: format!("{} arguments", values.len()),
            });
        }
        for ty in &types {
            check_type(ty)?;
        }
        self.block(types.into_iter().zip(values), 0)
    }

    /// The 32-byte word of a value type.
    pub fn encode_word(
        &self,
        ty: &TypeDescriptor,
        value: &NormalizedValue,
    ) -> Result<[u8; 32], EncodeError> {
        check_type(ty)?;
        word(ty, value)
    }

    /// The topic an indexed parameter is stored in: value types verbatim,
    /// reference types as the keccak-256 of their in-place encoding.
    pub fn encode_topic(
        &self,
        ty: &TypeDescriptor,
        value: &NormalizedValue,
    ) -> Result<B256, EncodeError> {
        check_type(ty)?;
        if ty.is_value_type() {
            return word(ty, value).map(B256::from);
        }
        let mut out = Vec::new();
        self.in_place(ty, value, false, 0, &mut out)?;
        Ok(keccak256(out))
    }

    fn enter(&self, depth: usize) -> Result<usize, EncodeError> {
        let depth = depth + 1;
        if depth > self.config.max_depth {
            return Err(EncodeError::DepthExceeded {
                max: self.config.max_depth,
            });
        }
        Ok(depth)
    }

    /// Heads followed by tails. Offsets are relative to the start of the block.
    fn block<'v, I>(&self, items: I, depth: usize) -> Result<Vec<u8>, EncodeError>
    where
        I: Iterator<Item = (&'v TypeDescriptor, &'v NormalizedValue)> + Clone,
    {
        let heads_len = items
            .clone()
            .try_fold(0usize, |acc, (ty, _)| acc.checked_add(ty.head_size()))
            .ok_or_else(|| EncodeError::TypeMismatch {
                expected: "a block that fits in memory".into(),
                got: "an overflowing head size".into(),
            })?;

        let mut head = Vec::new();
        let mut tail = Vec::new();
        for (ty, value) in items {
            let encoded = self.value(ty, value, depth)?;
            if ty.is_dynamic() {
                head.extend_from_slice(&usize_word(heads_len + tail.len()));
                tail.extend_from_slice(&encoded);
            } else {
                head.extend_from_slice(&encoded);
            }
        }
        head.extend_from_slice(&tail);
        Ok(head)
    }

    /// Full encoding of one value: inline bytes for a static type, tail bytes
    /// for a dynamic one.
    fn value(
        &self,
        ty: &TypeDescriptor,
        value: &NormalizedValue,
        depth: usize,
    ) -> Result<Vec<u8>, EncodeError> {
        match ty {
            TypeDescriptor::Bytes => {
                let bytes = expect_bytes(ty, value)?;
                Ok(length_prefixed(bytes))
            }
            TypeDescriptor::String => match value {
                NormalizedValue::String(s) => Ok(length_prefixed(s.as_bytes())),
                other => Err(mismatch(ty, other)),
            },
            TypeDescriptor::Array(elem) => {
                let items = expect_array(ty, value)?;
                let depth = self.enter(depth)?;
                let mut out = usize_word(items.len()).to_vec();
                out.extend(self.block(std::iter::repeat(elem.as_ref()).zip(items), depth)?);
                Ok(out)
            }
            TypeDescriptor::FixedArray(elem, len) => {
                let items = expect_array(ty, value)?;
                if items.len() != *len {
                    return Err(EncodeError::TypeMismatch {
                        expected: ty.to_string(),
                        got: format!("array of {} elements", items.len()),
                    });
                }
                let depth = self.enter(depth)?;
                self.block(std::iter::repeat(elem.as_ref()).zip(items), depth)
            }
            TypeDescriptor::Tuple(fields) => {
                let components = expect_tuple(ty, fields.len(), value)?;
                let depth = self.enter(depth)?;
                self.block(
                    fields.iter().map(|(_, t)| t).zip(components.iter().map(|(_, v)| v)),
                    depth,
                )
            }
            _ => word(ty, value).map(|w| w.to_vec()),
        }
    }

    /// Solidity's in-place encoding of an indexed reference type: no offsets
    /// or length prefixes; members padded to whole words. A top-level
    /// `bytes` / `string` is hashed unpadded.
    fn in_place(
        &self,
        ty: &TypeDescriptor,
        value: &NormalizedValue,
        nested: bool,
        depth: usize,
        out: &mut Vec<u8>,
    ) -> Result<(), EncodeError> {
        match ty {
            TypeDescriptor::Bytes | TypeDescriptor::String => {
                let bytes = match (ty, value) {
                    (TypeDescriptor::String, NormalizedValue::String(s)) => s.as_bytes(),
                    (TypeDescriptor::Bytes, _) => expect_bytes(ty, value)?,
                    (_, other) => return Err(mismatch(ty, other)),
                };
                out.extend_from_slice(bytes);
                if nested {
                    out.resize(out.len() + padding(bytes.len()), 0);
                }
            }
            TypeDescriptor::Array(elem) => {
                let depth = self.enter(depth)?;
                for item in expect_array(ty, value)? {
                    self.in_place(elem, item, true, depth, out)?;
                }
            }
            TypeDescriptor::FixedArray(elem, len) => {
                let items = expect_array(ty, value)?;
                if items.len() != *len {
                    return Err(EncodeError::TypeMismatch {
                        expected: ty.to_string(),
                        got: format!("array of {} elements", items.len()),
                    });
                }
                let depth = self.enter(depth)?;
                for item in items {
                    self.in_place(elem, item, true, depth, out)?;
                }
            }
            TypeDescriptor::Tuple(fields) => {
                let components = expect_tuple(ty, fields.len(), value)?;
                let depth = self.enter(depth)?;
                for ((_, fty), (_, v)) in fields.iter().zip(components) {
                    self.in_place(fty, v, true, depth, out)?;
                }
            }
            _ => out.extend_from_slice(&word(ty, value)?),
        }
        Ok(())
    }
}

fn check_type(ty: &TypeDescriptor) -> Result<(), EncodeError> {
    ty.validate().map_err(|_| EncodeError::TypeMismatch {
        expected: "a valid ABI type".into(),
        got: ty.to_string(),
    })
}

fn mismatch(ty: &TypeDescriptor, value: &NormalizedValue) -> EncodeError {
    EncodeError::TypeMismatch {
        expected: ty.to_string(),
        got: value.kind().to_string(),
    }
}

fn overflow(ty: &TypeDescriptor, value: &NormalizedValue) -> EncodeError {
    EncodeError::IntegerOverflow {
        ty: ty.to_string(),
        value: value.to_string(),
    }
}

fn expect_bytes<'v>(
    ty: &TypeDescriptor,
    value: &'v NormalizedValue,
) -> Result<&'v [u8], EncodeError> {
    value.as_bytes().ok_or_else(|| mismatch(ty, value))
}

fn expect_array<'v>(
    ty: &TypeDescriptor,
    value: &'v NormalizedValue,
) -> Result<&'v [NormalizedValue], EncodeError> {
    value.as_array().ok_or_else(|| mismatch(ty, value))
}

fn expect_tuple<'v>(
    ty: &TypeDescriptor,
    arity: usize,
    value: &'v NormalizedValue,
) -> Result<&'v [(String, NormalizedValue)], EncodeError> {
    match value {
        NormalizedValue::Tuple(components) if components.len() == arity => Ok(components),
        NormalizedValue::Tuple(components) => Err(EncodeError::TypeMismatch {
            expected: ty.to_string(),
            got: format!("tuple of {} components", components.len()),
        }),
        other => Err(mismatch(ty, other)),
    }
}

/// Word encoding of a value type.
fn word(ty: &TypeDescriptor, value: &NormalizedValue) -> Result<[u8; 32], EncodeError> {
    let mut out = [0u8; 32];
    match (ty, value) {
        (TypeDescriptor::Uint(bits), NormalizedValue::UInt(v)) => {
            if !uint_fits(v, *bits) {
                return Err(overflow(ty, value));
            }
            out = v.to_be_bytes();
        }
        (TypeDescriptor::Int(bits), NormalizedValue::Int(v)) => {
            if !int_fits(v, *bits) {
                return Err(overflow(ty, value));
            }
            // two's complement, sign-extended to 256 bits
            out = v.into_raw().to_be_bytes();
        }
        (TypeDescriptor::Address, NormalizedValue::Address(a)) => {
            out[12..].copy_from_slice(a.as_slice());
        }
        (TypeDescriptor::Bool, NormalizedValue::Bool(b)) => {
            out[31] = u8::from(*b);
        }
        (TypeDescriptor::FixedBytes(n), NormalizedValue::Bytes(b)) => {
            if b.len() != usize::from(*n) {
                return Err(EncodeError::TypeMismatch {
                    expected: ty.to_string(),
                    got: format!("{} bytes", b.len()),
                });
            }
            out[..b.len()].copy_from_slice(b);
        }
        (
            TypeDescriptor::Uint(_)
            | TypeDescriptor::Int(_)
            | TypeDescriptor::Address
            | TypeDescriptor::Bool
            | TypeDescriptor::FixedBytes(_),
            other,
        ) => return Err(mismatch(ty, other)),
        _ => {
            return Err(EncodeError::TypeMismatch {
                expected: "a value type".into(),
                got: ty.to_string(),
            })
        }
    }
    Ok(out)
}

fn usize_word(n: usize) -> [u8; 32] {
    U256::from(n).to_be_bytes()
}

fn padding(len: usize) -> usize {
    (WORD - len % WORD) % WORD
}

fn length_prefixed(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(WORD + bytes.len() + padding(bytes.len()));
    out.extend_from_slice(&usize_word(bytes.len()));
    out.extend_from_slice(bytes);
    out.resize(out.len() + padding(bytes.len()), 0);
    out
}
