//! ABI decoding.
//!
//! Every read goes through a bounds-checked slice of the input buffer.
//! Offsets and lengths are converted from 256-bit words with `try_from`, and
//! element counts are checked against the remaining buffer before any
//! allocation, so a hostile payload cannot make the decoder panic or reserve
//! memory it does not back with bytes.
//!
//! Offsets may legally point anywhere, so several heads can share one tail.
//! Each decoded leaf, length word and payload word is charged against a budget
//! of `ALIAS_FACTOR` words per input word; output therefore stays linear in the
//! input even when tails are aliased.

use abicodec_core::{
    config::CodecConfig,
    error::DecodeError,
    types::{TypeDescriptor, WORD},
    value::{int_fits, uint_fits, NormalizedValue},
};
use alloy_primitives::{Address, B256, I256, U256};
use std::cell::Cell;

/// Decoded words allowed per input word. A non-aliased encoding never uses
/// more than one.
const ALIAS_FACTOR: usize = 4;

/// Decodes ABI-encoded parameter blocks into `NormalizedValue`s.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbiDecoder {
    config: CodecConfig,
}

impl AbiDecoder {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Decode a bare parameter tuple: call arguments after the selector,
    /// event data, constructor arguments or return data.
    pub fn decode_params<'t, I>(
        &self,
        types: I,
        data: &[u8],
    ) -> Result<Vec<NormalizedValue>, DecodeError>
    where
        I: IntoIterator<Item = &'t TypeDescriptor>,
    {
        let reader = Reader::new(data, &self.config);
        let mut out = Vec::new();
        let mut pos = 0usize;
        for ty in types {
            check_type(ty)?;
            out.push(reader.value(ty, 0, pos, 0)?);
            pos = pos.saturating_add(ty.head_size());
        }
        Ok(out)
    }

    /// Decode a value type from a single word, e.g. an indexed event topic.
    pub fn decode_word(
        &self,
        ty: &TypeDescriptor,
        word: &B256,
    ) -> Result<NormalizedValue, DecodeError> {
        check_type(ty)?;
        if !ty.is_value_type() {
            return Err(DecodeError::TypeMismatch {
                expected: "a value type".into(),
                got: ty.to_string(),
            });
        }
        let reader = Reader::new(word.as_slice(), &self.config);
        reader.value(ty, 0, 0, 0)
    }
}

fn check_type(ty: &TypeDescriptor) -> Result<(), DecodeError> {
    ty.validate().map_err(|_| DecodeError::TypeMismatch {
        expected: "a valid ABI type".into(),
        got: ty.to_string(),
    })
}

struct Reader<'a> {
    buf: &'a [u8],
    config: &'a CodecConfig,
    budget: usize,
    remaining: Cell<usize>,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8], config: &'a CodecConfig) -> Self {
        let budget = buf.len().div_ceil(WORD).max(1).saturating_mul(ALIAS_FACTOR);
        Self {
            buf,
            config,
            budget,
            remaining: Cell::new(budget),
        }
    }

    fn charge(&self, words: usize) -> Result<(), DecodeError> {
        match self.remaining.get().checked_sub(words) {
            Some(left) => {
                self.remaining.set(left);
                Ok(())
            }
            None => Err(DecodeError::ResourceLimit {
                budget: self.budget,
                len: self.buf.len(),
            }),
        }
    }

    fn truncated(&self, offset: usize, needed: usize) -> DecodeError {
        DecodeError::TruncatedData {
            offset,
            needed,
            available: self.buf.len().saturating_sub(offset),
        }
    }

    fn slice(&self, at: usize, len: usize) -> Result<&'a [u8], DecodeError> {
        at.checked_add(len)
            .filter(|&end| end <= self.buf.len())
            .map(|end| &self.buf[at..end])
            .ok_or_else(|| self.truncated(at, len))
    }

    fn word(&self, at: usize) -> Result<B256, DecodeError> {
        self.slice(at, WORD).map(B256::from_slice)
    }

    /// Follow the offset stored at `at`, relative to the block starting at `block`.
    fn offset(&self, at: usize, block: usize) -> Result<usize, DecodeError> {
        let raw = U256::from_be_bytes(self.word(at)?.0);
        usize::try_from(raw)
            .ok()
            .and_then(|rel| block.checked_add(rel))
            .filter(|&target| target < self.buf.len())
            .ok_or(DecodeError::OutOfBoundsOffset {
                offset: raw,
                len: self.buf.len().saturating_sub(block),
            })
    }

    fn length(&self, at: usize) -> Result<usize, DecodeError> {
        let raw = U256::from_be_bytes(self.word(at)?.0);
        usize::try_from(raw).map_err(|_| self.truncated(at + WORD, usize::MAX))
    }

    fn enter(&self, depth: usize) -> Result<usize, DecodeError> {
        let depth = depth + 1;
        if depth > self.config.max_depth {
            return Err(DecodeError::DepthExceeded {
                max: self.config.max_depth,
            });
        }
        Ok(depth)
    }

    /// Decode the value whose head slot is at `pos` inside the block at `block`.
    fn value(
        &self,
        ty: &TypeDescriptor,
        block: usize,
        pos: usize,
        depth: usize,
    ) -> Result<NormalizedValue, DecodeError> {
        if ty.is_dynamic() {
            let at = self.offset(pos, block)?;
            return self.tail(ty, at, depth);
        }

        if ty.is_value_type() {
            self.charge(1)?;
        }

        match ty {
            TypeDescriptor::Uint(bits) => {
                let word = self.word(pos)?;
                let v = U256::from_be_bytes(word.0);
                if !uint_fits(&v, *bits) {
                    return Err(DecodeError::IntegerOutOfRange {
                        ty: ty.to_string(),
                        word,
                    });
                }
                Ok(NormalizedValue::UInt(v))
            }
            TypeDescriptor::Int(bits) => {
                let word = self.word(pos)?;
                let v = I256::from_raw(U256::from_be_bytes(word.0));
                // a narrower intN must be sign-extended to the full word
                if !int_fits(&v, *bits) {
                    return Err(DecodeError::IntegerOutOfRange {
                        ty: ty.to_string(),
                        word,
                    });
                }
                Ok(NormalizedValue::Int(v))
            }
            TypeDescriptor::Address => {
                let word = self.word(pos)?;
                if self.config.address_padding.is_strict() && word[..12].iter().any(|b| *b != 0)
                {
                    return Err(DecodeError::InvalidAddressPadding { word });
                }
                Ok(NormalizedValue::Address(Address::from_slice(&word[12..])))
            }
            TypeDescriptor::Bool => {
                let word = self.word(pos)?;
                let v = U256::from_be_bytes(word.0);
                if v == U256::ZERO {
                    Ok(NormalizedValue::Bool(false))
                } else if v == U256::from(1u8) || !self.config.bool_encoding.is_strict() {
                    Ok(NormalizedValue::Bool(true))
                } else {
                    Err(DecodeError::InvalidBoolEncoding { word })
                }
            }
            TypeDescriptor::FixedBytes(size) => {
                let word = self.word(pos)?;
                let n = usize::from(*size);
                if self.config.fixed_bytes_padding.is_strict() && word[n..].iter().any(|b| *b != 0)
                {
                    return Err(DecodeError::InvalidFixedBytesPadding { size: *size, word });
                }
                Ok(NormalizedValue::Bytes(word[..n].to_vec()))
            }
            TypeDescriptor::FixedArray(elem, len) => self
                .elements(elem, *len, pos, depth)
                .map(NormalizedValue::Array),
            TypeDescriptor::Tuple(fields) => self
                .components(fields, pos, depth)
                .map(NormalizedValue::Tuple),
            TypeDescriptor::Bytes | TypeDescriptor::String | TypeDescriptor::Array(_) => {
                Err(DecodeError::TypeMismatch {
                    expected: "a static type".into(),
                    got: ty.to_string(),
                })
            }
        }
    }

    /// Decode a dynamic value whose tail starts at `at`.
    fn tail(
        &self,
        ty: &TypeDescriptor,
        at: usize,
        depth: usize,
    ) -> Result<NormalizedValue, DecodeError> {
        match ty {
            TypeDescriptor::Bytes => self
                .payload(at)
                .map(|b| NormalizedValue::Bytes(b.to_vec())),
            TypeDescriptor::String => {
                let bytes = self.payload(at)?;
                std::str::from_utf8(bytes)
                    .map(|s| NormalizedValue::String(s.to_owned()))
                    .map_err(|e| DecodeError::InvalidUtf8 {
                        reason: e.to_string(),
                    })
            }
            TypeDescriptor::Array(elem) => {
                let len = self.length(at)?;
                self.charge(1)?;
                self.elements(elem, len, at + WORD, depth)
                    .map(NormalizedValue::Array)
            }
            TypeDescriptor::FixedArray(elem, len) => self
                .elements(elem, *len, at, depth)
                .map(NormalizedValue::Array),
            TypeDescriptor::Tuple(fields) => self
                .components(fields, at, depth)
                .map(NormalizedValue::Tuple),
            _ => self.value(ty, at, at, depth),
        }
    }

    /// Length-prefixed byte payload of `bytes` / `string`.
    fn payload(&self, at: usize) -> Result<&'a [u8], DecodeError> {
        let len = self.length(at)?;
        let payload = self.slice(at + WORD, len)?;
        self.charge(1 + len.div_ceil(WORD))?;
        Ok(payload)
    }

    /// `len` elements whose heads start at `start`; `start` is also the block
    /// their offsets are relative to.
    fn elements(
        &self,
        elem: &TypeDescriptor,
        len: usize,
        start: usize,
        depth: usize,
    ) -> Result<Vec<NormalizedValue>, DecodeError> {
        let depth = self.enter(depth)?;
        let stride = elem.head_size();
        self.slice(start, len.checked_mul(stride).unwrap_or(usize::MAX))?;

        let mut out = Vec::with_capacity(len);
        for i in 0..len {
            out.push(self.value(elem, start, start + i * stride, depth)?);
        }
        Ok(out)
    }

    fn components(
        &self,
        fields: &[(String, TypeDescriptor)],
        start: usize,
        depth: usize,
    ) -> Result<Vec<(String, NormalizedValue)>, DecodeError> {
        let depth = self.enter(depth)?;
        let mut out = Vec::with_capacity(fields.len());
        let mut pos = start;
        for (name, ty) in fields {
            out.push((name.clone(), self.value(ty, start, pos, depth)?));
            pos = pos.saturating_add(ty.head_size());
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(s: &str) -> TypeDescriptor {
        TypeDescriptor::parse(s).unwrap()
    }

    fn uint_word(n: u64) -> [u8; 32] {
        U256::from(n).to_be_bytes()
    }

    fn padded(bytes: &[u8]) -> Vec<u8> {
        let mut out = bytes.to_vec();
        out.resize(bytes.len().div_ceil(WORD) * WORD, 0);
        out
    }

    fn concat(parts: &[&[u8]]) -> Vec<u8> {
        parts.concat()
    }

    fn strict() -> AbiDecoder {
        AbiDecoder::default()
    }

    #[test]
    fn static_params() {
        let mut addr_word = [0u8; 32];
        addr_word[12..].copy_from_slice(&[0xaa; 20]);
        let data = concat(&[&uint_word(1000), &addr_word, &uint_word(1)]);
        let types = [ty("uint256"), ty("address"), ty("bool")];
        let vals = strict().decode_params(&types, &data).unwrap();
        assert_eq!(vals[0], NormalizedValue::UInt(U256::from(1000u64)));
        assert_eq!(vals[1], NormalizedValue::Address(Address::repeat_byte(0xaa)));
        assert_eq!(vals[2], NormalizedValue::Bool(true));
    }

    #[test]
    fn head_tail_layout() {
        // f(uint256,uint32[],bytes10,bytes) with
        // (0x123, [0x456, 0x789], "1234567890", "Hello, world!")
        let data = concat(&[
            &uint_word(0x123),
            &uint_word(0x80),
            &padded(b"1234567890"),
            &uint_word(0xe0),
            &uint_word(2),
            &uint_word(0x456),
            &uint_word(0x789),
            &uint_word(13),
            &padded(b"Hello, world!"),
        ]);
        let types = [ty("uint256"), ty("uint32[]"), ty("bytes10"), ty("bytes")];
        let vals = strict().decode_params(&types, &data).unwrap();
        assert_eq!(vals[0], NormalizedValue::UInt(U256::from(0x123u64)));
        assert_eq!(
            vals[1],
            NormalizedValue::Array(vec![0x456u64.into(), 0x789u64.into()])
        );
        assert_eq!(vals[2], NormalizedValue::Bytes(b"1234567890".to_vec()));
        assert_eq!(vals[3], NormalizedValue::Bytes(b"Hello, world!".to_vec()));
    }

    #[test]
    fn nested_dynamic_arrays() {
        // g(uint256[][]) with [[1, 2], [3]]
        let data = concat(&[
            &uint_word(0x20),
            &uint_word(2),
            &uint_word(0x40),
            &uint_word(0xa0),
            &uint_word(2),
            &uint_word(1),
            &uint_word(2),
            &uint_word(1),
            &uint_word(3),
        ]);
        let vals = strict().decode_params(&[ty("uint256[][]")], &data).unwrap();
        assert_eq!(
            vals[0],
            NormalizedValue::Array(vec![
                NormalizedValue::Array(vec![1u64.into(), 2u64.into()]),
                NormalizedValue::Array(vec![3u64.into()]),
            ])
        );
    }

    #[test]
    fn strictness_is_configurable() {
        let mut dirty_addr = [0u8; 32];
        dirty_addr[0] = 1;
        let mut dirty_bytes4 = [0u8; 32];
        dirty_bytes4[31] = 1;

        assert!(matches!(
            strict().decode_params(&[ty("address")], &dirty_addr),
            Err(DecodeError::InvalidAddressPadding { .. })
        ));
        assert!(matches!(
            strict().decode_params(&[ty("bool")], &uint_word(2)),
            Err(DecodeError::InvalidBoolEncoding { .. })
        ));
        assert!(matches!(
            strict().decode_params(&[ty("bytes4")], &dirty_bytes4),
            Err(DecodeError::InvalidFixedBytesPadding { size: 4, .. })
        ));

        let lenient = AbiDecoder::new(CodecConfig::lenient());
        assert!(lenient.decode_params(&[ty("address")], &dirty_addr).is_ok());
        assert_eq!(
            lenient.decode_params(&[ty("bool")], &uint_word(2)).unwrap()[0],
            NormalizedValue::Bool(true)
        );
        assert_eq!(
            lenient.decode_params(&[ty("bytes4")], &dirty_bytes4).unwrap()[0],
            NormalizedValue::Bytes(vec![0; 4])
        );
    }

    #[test]
    fn integer_width_enforced() {
        assert!(matches!(
            strict().decode_params(&[ty("uint8")], &uint_word(256)),
            Err(DecodeError::IntegerOutOfRange { .. })
        ));
        let minus_one = [0xffu8; 32];
        assert_eq!(
            strict().decode_params(&[ty("int8")], &minus_one).unwrap()[0],
            NormalizedValue::Int(I256::MINUS_ONE)
        );
        // 0x80 without sign extension is 128, which does not fit int8
        assert!(matches!(
            strict().decode_params(&[ty("int8")], &uint_word(0x80)),
            Err(DecodeError::IntegerOutOfRange { .. })
        ));
    }

    #[test]
    fn truncated_head() {
        let err = strict()
            .decode_params(&[ty("uint256"), ty("uint256")], &uint_word(1))
            .unwrap_err();
        assert_eq!(
            err,
            DecodeError::TruncatedData {
                offset: 32,
                needed: 32,
                available: 0
            }
        );
    }

    #[test]
    fn offset_outside_buffer() {
        let err = strict()
            .decode_params(&[ty("bytes")], &uint_word(0x1000))
            .unwrap_err();
        assert!(matches!(err, DecodeError::OutOfBoundsOffset { .. }));

        let mut huge = [0xffu8; 32];
        huge[0] = 0x7f;
        let err = strict().decode_params(&[ty("string")], &huge).unwrap_err();
        assert!(matches!(err, DecodeError::OutOfBoundsOffset { .. }));
    }

    #[test]
    fn huge_length_rejected_before_allocation() {
        let data = concat(&[&uint_word(0x20), &[0xffu8; 32]]);
        for t in ["uint256[]", "bytes", "string[]"] {
            let err = strict().decode_params(&[ty(t)], &data).unwrap_err();
            assert!(
                matches!(err, DecodeError::TruncatedData { .. }),
                "{t}: {err:?}"
            );
        }
        let data = concat(&[&uint_word(0x20), &uint_word(1_000_000)]);
        assert!(matches!(
            strict().decode_params(&[ty("uint256[]")], &data),
            Err(DecodeError::TruncatedData { .. })
        ));
    }

    #[test]
    fn depth_limit() {
        let data = concat(&[&uint_word(0x20), &uint_word(1), &uint_word(0x20), &uint_word(0)]);
        let shallow = AbiDecoder::new(CodecConfig::default().with_max_depth(1));
        assert_eq!(
            shallow.decode_params(&[ty("uint8[][]")], &data),
            Err(DecodeError::DepthExceeded { max: 1 })
        );
        assert!(strict().decode_params(&[ty("uint8[][]")], &data).is_ok());
    }

    #[test]
    fn invalid_utf8_string() {
        let data = concat(&[&uint_word(0x20), &uint_word(2), &padded(&[0xff, 0xfe])]);
        assert!(matches!(
            strict().decode_params(&[ty("string")], &data),
            Err(DecodeError::InvalidUtf8 { .. })
        ));
    }

    #[test]
    fn decode_word_rejects_reference_types() {
        let word = B256::ZERO;
        assert!(strict().decode_word(&ty("uint256"), &word).is_ok());
        assert!(matches!(
            strict().decode_word(&ty("string"), &word),
            Err(DecodeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn hand_built_invalid_types_do_not_panic() {
        let word = uint_word(0);
        for bad in [
            TypeDescriptor::FixedBytes(0),
            TypeDescriptor::FixedBytes(40),
            TypeDescriptor::Uint(7),
            TypeDescriptor::Tuple(vec![]),
        ] {
            assert!(matches!(
                strict().decode_params(&[bad], &word),
                Err(DecodeError::TypeMismatch { .. })
            ));
        }
    }
}
