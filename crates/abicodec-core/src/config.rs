//! Codec configuration.

use crate::types::DEFAULT_MAX_DEPTH;
use serde::{Deserialize, Serialize};

/// How a non-canonical but recoverable encoding is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Reject with a decode error.
    #[default]
    Strict,
    /// Accept and normalize.
    Lenient,
}

impl Strictness {
    pub fn is_strict(self) -> bool {
        self == Strictness::Strict
    }
}

/// Options shared by the decoder, the encoder and the EIP-712 engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Non-zero upper 12 bytes in an address word
    #[serde(default)]
    pub address_padding: Strictness,
    /// Bool words other than 0 or 1 (lenient: any non-zero word is `true`)
    #[serde(default)]
    pub bool_encoding: Strictness,
    /// Non-zero trailing bytes after a `bytesN` value
    #[serde(default)]
    pub fixed_bytes_padding: Strictness,
    /// Maximum composite nesting (arrays / tuples / structs)
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self::strict()
    }
}

impl CodecConfig {
    /// Reject every non-canonical encoding.
    pub fn strict() -> Self {
        Self {
            address_padding: Strictness::Strict,
            bool_encoding: Strictness::Strict,
            fixed_bytes_padding: Strictness::Strict,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Accept dirty address / bool / bytesN padding.
    pub fn lenient() -> Self {
        Self {
            address_padding: Strictness::Lenient,
            bool_encoding: Strictness::Lenient,
            fixed_bytes_padding: Strictness::Lenient,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
