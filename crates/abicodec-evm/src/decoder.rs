//! `EvmDecoder`, the `EventDecoder` implementation for EVM logs.

use abicodec_core::{
    config::CodecConfig,
    decoder::{BatchDecodeResult, ErrorMode, EventDecoder, ProgressCallback},
    error::{BatchDecodeError, CodecError, DecodeError},
    event::{DecodedEvent, RawLog},
    fingerprint::Fingerprint,
    schema::{Parameter, Schema, SchemaKind, SchemaRegistry},
    value::NormalizedValue,
};
use alloy_primitives::B256;
use rayon::prelude::*;
use std::sync::Arc;

use crate::abi::AbiDecoder;
use crate::fingerprint;

/// The EVM log decoder.
/// Thread-safe and cheap to copy; holds only its configuration.
#[derive(Debug, Default, Clone, Copy)]
pub struct EvmDecoder {
    abi: AbiDecoder,
}

impl EvmDecoder {
    pub fn new(config: CodecConfig) -> Self {
        Self {
            abi: AbiDecoder::new(config),
        }
    }

    pub fn abi(&self) -> &AbiDecoder {
        &self.abi
    }

    /// Decode a single indexed topic.
    ///
    /// Value types (uint, int, bool, address, bytes1–bytes32) are stored
    /// padded in the topic and decode normally. Reference types (string,
    /// bytes, arrays, tuples) are stored as the keccak256 of their encoding,
    /// so the value is unrecoverable and the raw hash is returned as `Bytes`.
    fn decode_topic(&self, param: &Parameter, topic: &B256) -> Result<NormalizedValue, DecodeError> {
        if param.ty.is_value_type() {
            self.abi.decode_word(&param.ty, topic)
        } else {
            Ok(NormalizedValue::Bytes(topic.to_vec()))
        }
    }
}

impl EventDecoder for EvmDecoder {
    fn fingerprint(&self, log: &RawLog) -> Option<Fingerprint> {
        fingerprint::from_topics(&log.topics)
    }

    fn decode_event(&self, log: &RawLog, schema: &Arc<Schema>) -> Result<DecodedEvent, DecodeError> {
        if schema.kind() != SchemaKind::Event {
            return Err(DecodeError::TypeMismatch {
                expected: "an event schema".into(),
                got: format!("function `{}`", schema.signature()),
            });
        }

        let indexed = schema.indexed_params().count();
        let expected_topics = indexed + usize::from(schema.topic0().is_some());
        if log.topics.len() != expected_topics {
            return Err(DecodeError::TopicCountMismatch {
                expected: expected_topics,
                got: log.topics.len(),
            });
        }

        let mut topics = log.topics.iter();
        if let Some(expected) = schema.topic0() {
            // length checked above
            if let Some(got) = topics.next() {
                if *got != expected {
                    return Err(DecodeError::TopicMismatch {
                        expected,
                        got: *got,
                    });
                }
            }
        }

        // Non-indexed fields → data payload
        let mut data_values = self
            .abi
            .decode_params(schema.data_params().map(|p| &p.ty), &log.data)?
            .into_iter();

        let mut fields = Vec::with_capacity(schema.params().len());
        for param in schema.params() {
            let value = if param.indexed {
                let topic = topics.next().ok_or(DecodeError::TopicCountMismatch {
                    expected: expected_topics,
                    got: log.topics.len(),
                })?;
                self.decode_topic(param, topic)?
            } else {
                data_values.next().ok_or(DecodeError::TruncatedData {
                    offset: 0,
                    needed: schema.data_params().count(),
                    available: 0,
                })?
            };
            fields.push((param.name.clone(), value));
        }

        Ok(DecodedEvent {
            schema: Arc::clone(schema),
            fields,
            log: log.clone(),
        })
    }

    /// Rayon parallel decode. Falls back to the sequential default when a
    /// progress callback is supplied. Output order follows input order.
    fn decode_batch(
        &self,
        logs: &[RawLog],
        registry: &dyn SchemaRegistry,
        mode: ErrorMode,
        progress: Option<&dyn ProgressCallback>,
    ) -> Result<BatchDecodeResult, BatchDecodeError> {
        if progress.is_some() {
            return sequential_batch(self, logs, registry, mode, progress);
        }

        tracing::debug!(logs = logs.len(), ?mode, "parallel batch decode");

        let results: Vec<(usize, Result<DecodedEvent, CodecError>)> = logs
            .par_iter()
            .enumerate()
            .map(|(idx, log)| (idx, self.decode_with(log, registry)))
            .collect();

        let mut events = Vec::with_capacity(logs.len());
        let mut errors = Vec::new();

        for (idx, result) in results {
            match result {
                Ok(event) => events.push(event),
                Err(err) => match mode {
                    ErrorMode::Skip => {}
                    ErrorMode::Collect => errors.push((idx, err)),
                    ErrorMode::Throw => {
                        return Err(BatchDecodeError::ItemFailed {
                            index: idx,
                            source: err,
                        });
                    }
                },
            }
        }

        Ok(BatchDecodeResult { events, errors })
    }
}

/// The trait's provided sequential implementation, reachable from the override.
fn sequential_batch(
    decoder: &EvmDecoder,
    logs: &[RawLog],
    registry: &dyn SchemaRegistry,
    mode: ErrorMode,
    progress: Option<&dyn ProgressCallback>,
) -> Result<BatchDecodeResult, BatchDecodeError> {
    struct Sequential<'a>(&'a EvmDecoder);

    impl EventDecoder for Sequential<'_> {
        fn fingerprint(&self, log: &RawLog) -> Option<Fingerprint> {
            self.0.fingerprint(log)
        }

        fn decode_event(
            &self,
            log: &RawLog,
            schema: &Arc<Schema>,
        ) -> Result<DecodedEvent, DecodeError> {
            self.0.decode_event(log, schema)
        }
    }

    Sequential(decoder).decode_batch(logs, registry, mode, progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use abicodec_core::types::TypeDescriptor;
    use alloy_primitives::{Address, U256};

    fn transfer_schema() -> Arc<Schema> {
        Arc::new(
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
        )
    }

    fn address_topic(a: Address) -> B256 {
        a.into_word()
    }

    fn erc20_transfer_log() -> RawLog {
        let from: Address = "0xd8da6bf26964af9d7eed9e03e53415d37aa96045".parse().unwrap();
        let to: Address = "0xab5801a7d398351b8be11c439e05c5b3259aec9b".parse().unwrap();
        // value: 1 ETH in wei
        let value = U256::from(1_000_000_000_000_000_000u64);
        RawLog::new(
            vec![
                transfer_schema().topic0().unwrap(),
                address_topic(from),
                address_topic(to),
            ],
            value.to_be_bytes::<32>().to_vec(),
        )
    }

    #[test]
    fn decodes_erc20_transfer() {
        let event = EvmDecoder::default()
            .decode_event(&erc20_transfer_log(), &transfer_schema())
            .unwrap();
        let names: Vec<&str> = event.fields.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["from", "to", "value"]);
        assert_eq!(
            event.field("value").and_then(|v| v.as_u256()),
            Some(U256::from(1_000_000_000_000_000_000u64))
        );
    }

    #[test]
    fn topic_checks() {
        let dec = EvmDecoder::default();
        let mut log = erc20_transfer_log();
        log.topics[0] = B256::repeat_byte(1);
        assert!(matches!(
            dec.decode_event(&log, &transfer_schema()),
            Err(DecodeError::TopicMismatch { .. })
        ));

        let mut log = erc20_transfer_log();
        log.topics.pop();
        assert_eq!(
            dec.decode_event(&log, &transfer_schema()).unwrap_err(),
            DecodeError::TopicCountMismatch {
                expected: 3,
                got: 2
            }
        );
    }

    #[test]
    fn indexed_string_returns_hash() {
        let schema = Arc::new(
            Schema::event(
                "Named",
                vec![Parameter::indexed("name", TypeDescriptor::String)],
                false,
            )
            .unwrap(),
        );
        let hash = B256::repeat_byte(0xab);
        let log = RawLog::new(vec![schema.topic0().unwrap(), hash], Vec::new());
        let event = EvmDecoder::default().decode_event(&log, &schema).unwrap();
        assert_eq!(event.field("name"), Some(&NormalizedValue::Bytes(hash.to_vec())));
    }

    #[test]
    fn anonymous_event_has_no_signature_topic() {
        let schema = Arc::new(
            Schema::event(
                "Anon",
                vec![Parameter::indexed("who", TypeDescriptor::Address)],
                true,
            )
            .unwrap(),
        );
        let who = Address::repeat_byte(0x42);
        let log = RawLog::new(vec![address_topic(who)], Vec::new());
        let event = EvmDecoder::default().decode_event(&log, &schema).unwrap();
        assert_eq!(event.field("who").and_then(|v| v.as_address()), Some(who));
    }

    #[test]
    fn function_schema_rejected() {
        let schema = Arc::new(Schema::function("f", vec![]).unwrap());
        assert!(matches!(
            EvmDecoder::default().decode_event(&RawLog::default(), &schema),
            Err(DecodeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn evm_decoder_fingerprint() {
        let fp = EvmDecoder::default().fingerprint(&erc20_transfer_log()).unwrap();
        assert_eq!(
            fp.to_hex(),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
        assert!(EvmDecoder::default().fingerprint(&RawLog::default()).is_none());
    }
}
