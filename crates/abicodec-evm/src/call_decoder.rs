//! EVM function-call and constructor calldata decoder.
//!
//! # How it works
//! - First 4 bytes of calldata = keccak256(function_signature)[:4] (the selector)
//! - Remaining bytes = ABI-encoded inputs tuple
//! - Constructor: no selector prefix; all bytes = ABI-encoded constructor args

use abicodec_core::{
    call::DecodedCall,
    config::CodecConfig,
    error::DecodeError,
    schema::{Parameter, Schema, SchemaKind},
    value::NormalizedValue,
};
use alloy_primitives::{Bytes, Selector};
use std::sync::Arc;

use crate::abi::AbiDecoder;

/// EVM function-call decoder.
#[derive(Debug, Default, Clone, Copy)]
pub struct EvmCallDecoder {
    abi: AbiDecoder,
}

impl EvmCallDecoder {
    pub fn new(config: CodecConfig) -> Self {
        Self {
            abi: AbiDecoder::new(config),
        }
    }

    /// Decode a function call from raw calldata bytes.
    ///
    /// The selector must equal the schema's fingerprint.
    ///
    /// # Arguments
    /// * `calldata` - full calldata including the 4-byte selector prefix
    /// * `schema` - a function schema
    pub fn decode_call(
        &self,
        calldata: &[u8],
        schema: &Arc<Schema>,
    ) -> Result<DecodedCall, DecodeError> {
        let expected = match (schema.kind(), schema.selector()) {
            (SchemaKind::Function, Some(selector)) => selector,
            _ => {
                return Err(DecodeError::TypeMismatch {
                    expected: "a function schema".into(),
                    got: format!("event `{}`", schema.signature()),
                })
            }
        };

        if calldata.len() < 4 {
            return Err(DecodeError::TruncatedData {
                offset: 0,
                needed: 4,
                available: calldata.len(),
            });
        }
        let (head, args) = calldata.split_at(4);
        let selector = Selector::from_slice(head);
        if selector != expected {
            return Err(DecodeError::SelectorMismatch {
                expected,
                got: selector,
            });
        }

        let inputs = self.decode_args(args, schema.params())?;
        Ok(DecodedCall {
            schema: Arc::clone(schema),
            inputs,
            calldata: Bytes::copy_from_slice(calldata),
        })
    }

    /// Decode constructor arguments (no selector prefix).
    pub fn decode_constructor(
        &self,
        args: &[u8],
        params: &[Parameter],
    ) -> Result<Vec<(String, NormalizedValue)>, DecodeError> {
        self.decode_args(args, params)
    }

    fn decode_args(
        &self,
        args: &[u8],
        params: &[Parameter],
    ) -> Result<Vec<(String, NormalizedValue)>, DecodeError> {
        let values = self.abi.decode_params(params.iter().map(|p| &p.ty), args)?;
        Ok(params
            .iter()
            .enumerate()
            .zip(values)
            .map(|((i, p), v)| {
                let name = if p.name.is_empty() {
                    format!("arg{i}")
                } else {
                    p.name.clone()
                };
                (name, v)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abicodec_core::types::TypeDescriptor;
    use alloy_primitives::{Address, U256};

    fn transfer_schema() -> Arc<Schema> {
        Arc::new(
            Schema::function(
                "transfer",
                vec![
                    Parameter::new("to", TypeDescriptor::Address),
                    Parameter::new("amount", TypeDescriptor::Uint(256)),
                ],
            )
            .unwrap(),
        )
    }

    fn transfer_calldata() -> Vec<u8> {
        let mut data = vec![0xa9, 0x05, 0x9c, 0xbb];
        data.extend_from_slice(&Address::repeat_byte(0x22).into_word()[..]);
        data.extend_from_slice(&U256::from(1_000_000u64).to_be_bytes::<32>());
        data
    }

    #[test]
    fn decodes_transfer() {
        let call = EvmCallDecoder::default()
            .decode_call(&transfer_calldata(), &transfer_schema())
            .unwrap();
        assert_eq!(call.function_name(), "transfer");
        assert_eq!(call.selector_hex().as_deref(), Some("0xa9059cbb"));
        assert_eq!(
            call.input("to").and_then(|v| v.as_address()),
            Some(Address::repeat_byte(0x22))
        );
        assert_eq!(
            call.input("amount").and_then(|v| v.as_u256()),
            Some(U256::from(1_000_000u64))
        );
        assert_eq!(call.calldata.len(), 68);
    }

    #[test]
    fn short_calldata_is_truncated() {
        let err = EvmCallDecoder::default()
            .decode_call(&[0xa9, 0x05], &transfer_schema())
            .unwrap_err();
        assert_eq!(
            err,
            DecodeError::TruncatedData {
                offset: 0,
                needed: 4,
                available: 2
            }
        );
    }

    #[test]
    fn wrong_selector_rejected() {
        let mut data = transfer_calldata();
        data[0] = 0x00;
        assert!(matches!(
            EvmCallDecoder::default().decode_call(&data, &transfer_schema()),
            Err(DecodeError::SelectorMismatch { .. })
        ));
    }

    #[test]
    fn constructor_args() {
        let params = vec![Parameter::new("", TypeDescriptor::Uint(8))];
        let args = U256::from(7u64).to_be_bytes::<32>();
        let out = EvmCallDecoder::default()
            .decode_constructor(&args, &params)
            .unwrap();
        assert_eq!(out[0].0, "arg0");
    }
}
