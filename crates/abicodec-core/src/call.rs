//! Decoded function calls.
//!
//! The output type when decoding transaction calldata, as opposed to event
//! logs which produce `DecodedEvent`.

use crate::schema::Schema;
use crate::value::NormalizedValue;
use alloy_primitives::Bytes;
use serde::Serialize;
use std::sync::Arc;

/// Result of decoding a function call's calldata.
#[derive(Debug, Clone, Serialize)]
pub struct DecodedCall {
    /// The function schema the selector resolved to
    pub schema: Arc<Schema>,
    /// Decoded input parameters in declaration order
    pub inputs: Vec<(String, NormalizedValue)>,
    /// Raw calldata (including the selector)
    pub calldata: Bytes,
}

impl DecodedCall {
    pub fn function_name(&self) -> &str {
        self.schema.name()
    }

    /// Selector as a hex string ("0xaabbccdd")
    pub fn selector_hex(&self) -> Option<String> {
        self.schema
            .selector()
            .map(|s| format!("0x{}", hex::encode(s)))
    }

    /// Look up a decoded input by name
    pub fn input(&self, name: &str) -> Option<&NormalizedValue> {
        self.inputs.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// e.g. `transfer(to=0x…, amount=1000000)`
    pub fn summary(&self) -> String {
        let args: Vec<String> = self
            .inputs
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
    use alloy_primitives::{Address, U256};

    fn transfer_call() -> DecodedCall {
        let schema = Schema::function(
            "transfer",
            vec![
                Parameter::new("to", TypeDescriptor::Address),
                Parameter::new("amount", TypeDescriptor::Uint(256)),
            ],
        )
        .unwrap();
        DecodedCall {
            schema: Arc::new(schema),
            inputs: vec![
                ("to".into(), NormalizedValue::Address(Address::ZERO)),
                ("amount".into(), NormalizedValue::UInt(U256::from(1000u64))),
            ],
            calldata: Bytes::new(),
        }
    }

    #[test]
    fn selector_hex_format() {
        assert_eq!(transfer_call().selector_hex(), Some("0xa9059cbb".to_string()));
    }

    #[test]
    fn input_lookup() {
        let call = transfer_call();
        assert!(call.input("to").is_some());
        assert!(call.input("nonexistent").is_none());
        assert!(call.summary().starts_with("transfer(to=0x"));
        assert!(call.summary().ends_with("amount=1000)"));
    }
}
