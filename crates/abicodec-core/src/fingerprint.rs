//! Schema fingerprints.
//!
//! The fingerprint of an event is the keccak256 hash of its canonical signature:
//!   keccak256("Transfer(address,address,uint256)")
//!   → 0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef
//!
//! A function's fingerprint is the first four bytes of the same hash (the selector).

use alloy_primitives::{Selector, B256};
use serde::{Deserialize, Serialize};
use std::fmt;
use tiny_keccak::{Hasher, Keccak};

/// keccak256 of `data`.
pub fn keccak256(data: impl AsRef<[u8]>) -> B256 {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data.as_ref());
    hasher.finalize(&mut output);
    B256::from(output)
}

/// Lookup key of a schema in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "hash", rename_all = "lowercase")]
pub enum Fingerprint {
    /// Full 32-byte hash (topic 0 of a non-anonymous log)
    Event(B256),
    /// 4-byte function selector
    Function(Selector),
}

impl Fingerprint {
    /// Fingerprint of an event signature such as `"Transfer(address,address,uint256)"`.
    pub fn event(signature: &str) -> Self {
        Fingerprint::Event(keccak256(signature))
    }

    /// Selector of a function signature such as `"transfer(address,uint256)"`.
    pub fn function(signature: &str) -> Self {
        let hash = keccak256(signature);
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&hash[..4]);
        Fingerprint::Function(Selector::from(selector))
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Fingerprint::Event(h) => h.as_slice(),
            Fingerprint::Function(s) => s.as_slice(),
        }
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.as_bytes()))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
