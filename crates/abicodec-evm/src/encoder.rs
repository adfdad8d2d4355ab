//! Schema-level encoding: calldata and event logs.
//!
//! # Usage
//! ```ignore
//! let encoder = EvmEncoder::default();
//! let calldata = encoder.encode_call(&transfer_schema, &[
//!     NormalizedValue::Address(to),
//!     NormalizedValue::UInt(U256::from(1_000_000u64)),
//! ])?;
//! ```

use abicodec_core::{
    config::CodecConfig,
    error::EncodeError,
    event::RawLog,
    schema::{Parameter, Schema, SchemaKind},
    value::NormalizedValue,
};

use crate::abi::AbiEncoder;

/// ABI encoder for EVM function calls and logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct EvmEncoder {
    abi: AbiEncoder,
}

impl EvmEncoder {
    pub fn new(config: CodecConfig) -> Self {
        Self {
            abi: AbiEncoder::new(config),
        }
    }

    pub fn abi(&self) -> &AbiEncoder {
        &self.abi
    }

    /// Encode a function call: `selector ‖ encode_params(args)`.
    ///
    /// # Arguments
    /// * `schema` - a function schema
    /// * `args` - values in declaration order
    pub fn encode_call(
        &self,
        schema: &Schema,
        args: &[NormalizedValue],
    ) -> Result<Vec<u8>, EncodeError> {
        let selector = match (schema.kind(), schema.selector()) {
            (SchemaKind::Function, Some(selector)) => selector,
            _ => return Err(kind_mismatch(schema, SchemaKind::Function)),
        };
        let encoded = self
            .abi
            .encode_params(schema.params().iter().map(|p| &p.ty), args)?;

        let mut calldata = Vec::with_capacity(4 + encoded.len());
        calldata.extend_from_slice(selector.as_slice());
        calldata.extend_from_slice(&encoded);
        Ok(calldata)
    }

    /// Encode constructor arguments (no selector).
    pub fn encode_constructor(
        &self,
        params: &[Parameter],
        args: &[NormalizedValue],
    ) -> Result<Vec<u8>, EncodeError> {
        self.abi.encode_params(params.iter().map(|p| &p.ty), args)
    }

    /// Build the log an event emission with these values would produce.
    ///
    /// topics[0] is the fingerprint unless the event is anonymous; indexed
    /// parameters follow in declaration order; the rest are encoded into `data`.
    pub fn encode_event(
        &self,
        schema: &Schema,
        values: &[NormalizedValue],
    ) -> Result<RawLog, EncodeError> {
        if schema.kind() != SchemaKind::Event {
            return Err(kind_mismatch(schema, SchemaKind::Event));
        }
        if values.len() != schema.params().len() {
            return Err(EncodeError::TypeMismatch {
                expected: format!("{} arguments", schema.params().len()),
                got: format!("{} arguments", values.len()),
            });
        }

        let mut topics = Vec::with_capacity(schema.indexed_params().count() + 1);
        topics.extend(schema.topic0());

        let mut data_types = Vec::new();
        let mut data_values = Vec::new();
        for (param, value) in schema.params().iter().zip(values) {
            if param.indexed {
                topics.push(self.abi.encode_topic(&param.ty, value)?);
            } else {
                data_types.push(&param.ty);
                data_values.push(value.clone());
            }
        }

        let data = self.abi.encode_params(data_types, &data_values)?;
        Ok(RawLog::new(topics, data))
    }
}

fn kind_mismatch(schema: &Schema, wanted: SchemaKind) -> EncodeError {
    EncodeError::TypeMismatch {
        expected: format!("a {wanted} schema"),
        got: format!("{} `{}`", schema.kind(), schema.signature()),
    }
}
