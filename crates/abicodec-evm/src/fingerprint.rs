//! Fingerprint extraction from raw EVM inputs.
//!
//! For raw logs, topics[0] IS the fingerprint; for calldata the first four
//! bytes are. Nothing is recomputed here; schema-side fingerprints come from
//! `Fingerprint::event` / `Fingerprint::function`.

use abicodec_core::fingerprint::Fingerprint;
use alloy_primitives::{Selector, B256};

/// The registry key of a log: its first topic.
/// Returns `None` if `topics` is empty.
pub fn from_topics(topics: &[B256]) -> Option<Fingerprint> {
    topics.first().copied().map(Fingerprint::Event)
}

/// The registry key of a call: its 4-byte selector.
/// Returns `None` if `calldata` is shorter than a selector.
pub fn from_calldata(calldata: &[u8]) -> Option<Fingerprint> {
    let selector = calldata.get(..4)?;
    Some(Fingerprint::Function(Selector::from_slice(selector)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;

    #[test]
    fn from_topics_valid() {
        let topic = b256!("c42079f94a6350d7e6235f29174924f928cc2ac818eb64fed8004e115fbcca67");
        assert_eq!(from_topics(&[topic]), Some(Fingerprint::Event(topic)));
    }

    #[test]
    fn from_topics_empty() {
        assert!(from_topics(&[]).is_none());
    }

    #[test]
    fn selector_from_calldata() {
        let fp = from_calldata(&[0xa9, 0x05, 0x9c, 0xbb, 0x00]).unwrap();
        assert_eq!(fp.to_hex(), "0xa9059cbb");
        assert!(from_calldata(&[0xa9, 0x05]).is_none());
    }
}
