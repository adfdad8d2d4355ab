//! Raw and decoded event types.

use crate::schema::Schema;
use crate::value::NormalizedValue;
use alloy_primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A raw, undecoded EVM log as received from a node. This is the input to
/// every event decoder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLog {
    /// Contract that emitted the log
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    /// topics[0] is the event signature hash unless the event is anonymous;
    /// the remaining topics carry indexed parameters.
    pub topics: Vec<B256>,
    /// ABI-encoded non-indexed parameters.
    #[serde(default)]
    pub data: Bytes,
}

impl RawLog {
    pub fn new(topics: Vec<B256>, data: impl Into<Bytes>) -> Self {
        Self {
            address: None,
            topics,
            data: data.into(),
        }
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    /// topics[0], if present.
    pub fn signature_topic(&self) -> Option<&B256> {
        self.topics.first()
    }
}

/// A fully decoded event.
#[derive(Debug, Clone, Serialize)]
pub struct DecodedEvent {
    /// The schema that matched this log
    pub schema: Arc<Schema>,
    /// Every parameter, indexed or not, in declaration order
    pub fields: Vec<(String, NormalizedValue)>,
    /// The log that was decoded
    pub log: RawLog,
}

impl DecodedEvent {
    pub fn name(&self) -> &str {
        self.schema.name()
    }

    /// Get a field value by name.
    pub fn field(&self, name: &str) -> Option<&NormalizedValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// e.g. `Transfer(from=0x…, to=0x…, value=1000)`
    pub fn summary(&self) -> String {
        let args: Vec<String> = self
            .fields
            .iter()
            .map(|(n, v)| format!("{n}={v}"))
            .collect();
        format!("{}({})", self.schema.name(), args.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Parameter;
    use crate::types::TypeDescriptor;
    use alloy_primitives::U256;

    #[test]
    fn raw_log_json_shape() {
        let json = r#"{
            "topics": ["0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"],
            "data": "0x01"
        }"#;
        let log: RawLog = serde_json::from_str(json).unwrap();
        assert!(log.address.is_none());
        assert_eq!(log.data.as_ref(), &[1u8]);
        assert!(log.signature_topic().is_some());
    }

    #[test]
    fn field_lookup_and_summary() {
        let schema = Schema::event(
            "Ping",
            vec![Parameter::new("n", TypeDescriptor::Uint(8))],
            false,
        )
        .unwrap();
        let event = DecodedEvent {
            schema: Arc::new(schema),
            fields: vec![("n".into(), NormalizedValue::UInt(U256::from(3u64)))],
            log: RawLog::default(),
        };
        assert_eq!(event.name(), "Ping");
        assert_eq!(event.field("n").and_then(|v| v.as_u256()), Some(U256::from(3u64)));
        assert_eq!(event.summary(), "Ping(n=3)");
    }
}
