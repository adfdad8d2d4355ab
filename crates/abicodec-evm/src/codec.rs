//! `Codec`: registry lookup plus decode/encode in one call.
//!
//! ```ignore
//! let codec = Codec::new(registry);
//! let event = codec.decode_log(&log)?;
//! println!("{}", event.summary());
//! ```

use abicodec_core::{
    call::DecodedCall,
    config::CodecConfig,
    decoder::{BatchDecodeResult, ErrorMode, EventDecoder},
    error::{BatchDecodeError, CodecError, DecodeError, SchemaError},
    event::{DecodedEvent, RawLog},
    fingerprint::Fingerprint,
    schema::{Schema, SchemaKind, SchemaRegistry},
    value::NormalizedValue,
};
use std::sync::Arc;

use crate::{
    call_decoder::EvmCallDecoder, decoder::EvmDecoder, encoder::EvmEncoder, fingerprint,
};

/// Decoders and encoders bound to one registry.
#[derive(Debug, Clone)]
pub struct Codec<R> {
    registry: R,
    config: CodecConfig,
    events: EvmDecoder,
    calls: EvmCallDecoder,
    encoder: EvmEncoder,
}

impl<R: SchemaRegistry> Codec<R> {
    pub fn new(registry: R) -> Self {
        Self::with_config(registry, CodecConfig::default())
    }

    pub fn with_config(registry: R, config: CodecConfig) -> Self {
        Self {
            registry,
            config,
            events: EvmDecoder::new(config),
            calls: EvmCallDecoder::new(config),
            encoder: EvmEncoder::new(config),
        }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Decode a log, resolving its schema from topic 0.
    pub fn decode_log(&self, log: &RawLog) -> Result<DecodedEvent, CodecError> {
        self.events.decode_with(log, &self.registry)
    }

    /// Decode many logs in parallel; see [`EventDecoder::decode_batch`].
    pub fn decode_logs(
        &self,
        logs: &[RawLog],
        mode: ErrorMode,
    ) -> Result<BatchDecodeResult, BatchDecodeError> {
        self.events.decode_batch(logs, &self.registry, mode, None)
    }

    /// Decode calldata, resolving its schema from the 4-byte selector.
    pub fn decode_call(&self, calldata: &[u8]) -> Result<DecodedCall, CodecError> {
        let Some(fp) = fingerprint::from_calldata(calldata) else {
            return Err(DecodeError::TruncatedData {
                offset: 0,
                needed: 4,
                available: calldata.len(),
            }
            .into());
        };
        let schema = self.lookup(&fp)?;
        Ok(self.calls.decode_call(calldata, &schema)?)
    }

    /// Encode a call to the function with this signature, e.g. `transfer(address,uint256)`.
    pub fn encode_call(
        &self,
        signature: &str,
        values: &[NormalizedValue],
    ) -> Result<Vec<u8>, CodecError> {
        let schema = self.resolve(SchemaKind::Function, signature)?;
        Ok(self.encoder.encode_call(&schema, values)?)
    }

    /// Build the log the event with this signature would emit.
    pub fn encode_event(
        &self,
        signature: &str,
        values: &[NormalizedValue],
    ) -> Result<RawLog, CodecError> {
        let schema = self.resolve(SchemaKind::Event, signature)?;
        Ok(self.encoder.encode_event(&schema, values)?)
    }

    fn lookup(&self, fp: &Fingerprint) -> Result<Arc<Schema>, SchemaError> {
        self.registry.get_by_fingerprint(fp).ok_or_else(|| {
            tracing::trace!(fingerprint = %fp, "no schema for fingerprint");
            SchemaError::UnknownFingerprint { fingerprint: *fp }
        })
    }

    /// The schema a signature refers to: by canonical signature, then by its fingerprint.
    pub fn resolve(&self, kind: SchemaKind, signature: &str) -> Result<Arc<Schema>, SchemaError> {
        if let Some(schema) = self.registry.get_by_signature(kind, signature) {
            return Ok(schema);
        }
        let fp = match kind {
            SchemaKind::Event => Fingerprint::event(signature),
            SchemaKind::Function => Fingerprint::function(signature),
        };
        self.lookup(&fp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abicodec_core::{schema::Parameter, types::TypeDescriptor};
    use alloy_primitives::{Address, U256};
    use std::collections::HashMap;

    /// Minimal registry keyed by fingerprint.
    #[derive(Default)]
    struct Schemas(HashMap<Fingerprint, Arc<Schema>>);

    impl Schemas {
        fn with(mut self, schema: Schema) -> Self {
            self.0.insert(schema.fingerprint(), Arc::new(schema));
            self
        }
    }

    impl SchemaRegistry for Schemas {
        fn get_by_fingerprint(&self, fp: &Fingerprint) -> Option<Arc<Schema>> {
            self.0.get(fp).cloned()
        }

        fn fingerprint_of(&self, kind: SchemaKind, signature: &str) -> Option<Fingerprint> {
            self.0
                .values()
                .find(|s| s.kind() == kind && s.signature() == signature)
                .map(|s| s.fingerprint())
        }

        fn len(&self) -> usize {
            self.0.len()
        }
    }

    fn codec() -> Codec<Schemas> {
        let registry = Schemas::default()
            .with(
                Schema::function(
                    "transfer",
                    vec![
                        Parameter::new("to", TypeDescriptor::Address),
                        Parameter::new("amount", TypeDescriptor::Uint(256)),
                    ],
                )
                .unwrap(),
            )
            .with(
                Schema::event(
                    "Transfer",
                    vec![
                        Parameter::indexed("from", TypeDescriptor::Address),
                        Parameter::indexed("to", TypeDescriptor::Address),
                        Parameter::new("value", TypeDescriptor::Uint(256)),
                    ],
                    false,
                )
                .unwrap(),
            );
        Codec::new(registry)
    }

    #[test]
    fn call_through_the_registry() {
        let codec = codec();
        let args = [
            NormalizedValue::Address(Address::repeat_byte(0xbb)),
            NormalizedValue::from(1000u64),
        ];
        let calldata = codec.encode_call("transfer(address,uint256)", &args).unwrap();
        let call = codec.decode_call(&calldata).unwrap();
        assert_eq!(call.function_name(), "transfer");
        assert_eq!(call.input("amount").and_then(|v| v.as_u256()), Some(U256::from(1000u64)));
    }

    #[test]
    fn event_through_the_registry() {
        let codec = codec();
        let log = codec
            .encode_event(
                "Transfer(address,address,uint256)",
                &[
                    NormalizedValue::Address(Address::repeat_byte(0xaa)),
                    NormalizedValue::Address(Address::repeat_byte(0xbb)),
                    NormalizedValue::from(1000u64),
                ],
            )
            .unwrap();
        let event = codec.decode_log(&log).unwrap();
        assert_eq!(event.name(), "Transfer");
        assert_eq!(
            event.field("to").and_then(|v| v.as_address()),
            Some(Address::repeat_byte(0xbb))
        );
    }

    #[test]
    fn unknown_schemas() {
        let codec = codec();
        assert!(matches!(
            codec.decode_call(&[0xde, 0xad, 0xbe, 0xef]),
            Err(CodecError::Schema(SchemaError::UnknownFingerprint { .. }))
        ));
        assert!(matches!(
            codec.encode_call("approve(address,uint256)", &[]),
            Err(CodecError::Schema(SchemaError::UnknownFingerprint { .. }))
        ));
        assert!(matches!(
            codec.decode_call(&[0xa9]),
            Err(CodecError::Decode(DecodeError::TruncatedData { .. }))
        ));
    }
}
