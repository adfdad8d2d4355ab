//! Error types for the abicodec pipeline.

use crate::fingerprint::Fingerprint;
use alloy_primitives::{Selector, B256, U256};
use thiserror::Error;

/// Errors raised while building schemas or loading a registry.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("no schema registered for fingerprint {fingerprint}")]
    UnknownFingerprint { fingerprint: Fingerprint },

    #[error("fingerprint {fingerprint} is already bound to `{existing}`; cannot register `{incoming}`")]
    DuplicateFingerprint {
        fingerprint: Fingerprint,
        existing: String,
        incoming: String,
    },

    #[error("schema `{name}` version {version} is already registered")]
    DuplicateVersion { name: String, version: u32 },

    #[error("malformed signature `{signature}`: {reason}")]
    MalformedSignature { signature: String, reason: String },

    #[error("fingerprint mismatch for `{signature}`: declared {declared}, computed {computed}")]
    FingerprintMismatch {
        signature: String,
        declared: String,
        computed: Fingerprint,
    },

    #[error("schema source parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while decoding ABI data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("truncated data: need {needed} bytes at offset {offset}, only {available} available")]
    TruncatedData {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("offset {offset} points outside a {len}-byte block")]
    OutOfBoundsOffset { offset: U256, len: usize },

    #[error("selector mismatch: expected {expected}, got {got}")]
    SelectorMismatch { expected: Selector, got: Selector },

    #[error("event signature mismatch: expected topic {expected}, got {got}")]
    TopicMismatch { expected: B256, got: B256 },

    #[error("expected {expected} topics, got {got}")]
    TopicCountMismatch { expected: usize, got: usize },

    #[error("invalid bool encoding {word}")]
    InvalidBoolEncoding { word: B256 },

    #[error("non-zero address padding in {word}")]
    InvalidAddressPadding { word: B256 },

    #[error("non-zero padding after bytes{size} in {word}")]
    InvalidFixedBytesPadding { size: u8, word: B256 },

    #[error("{ty} out of range: {word}")]
    IntegerOutOfRange { ty: String, word: B256 },

    #[error("string payload is not valid UTF-8: {reason}")]
    InvalidUtf8 { reason: String },

    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("nesting exceeds the maximum depth of {max}")]
    DepthExceeded { max: usize },

    #[error("decoded output exceeds {budget} words for a {len}-byte input (aliased offsets)")]
    ResourceLimit { budget: usize, len: usize },
}

/// Errors that can occur while encoding values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("{value} overflows {ty}")]
    IntegerOverflow { ty: String, value: String },

    #[error("nesting exceeds the maximum depth of {max}")]
    DepthExceeded { max: usize },
}

/// Errors from EIP-712 type resolution, parsing and hashing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Eip712Error {
    #[error("unknown EIP-712 type `{name}`")]
    UnknownType { name: String },

    #[error("circular type reference: {path}")]
    CircularTypeReference { path: String },

    #[error("struct `{ty}` is missing field `{field}`")]
    MissingField { ty: String, field: String },

    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("type mismatch for `{field}`: expected {expected}, got {got}")]
    TypeMismatch {
        field: String,
        expected: String,
        got: String,
    },

    #[error("nesting exceeds the maximum depth of {max}")]
    DepthExceeded { max: usize },

    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("invalid typed data document: {0}")]
    Json(String),
}

/// A JSON value could not be read as the requested ABI type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot read {expected} from JSON: {reason}")]
pub struct JsonValueError {
    pub expected: String,
    pub reason: String,
}

/// Unified error for operations that combine registry lookup with the codec.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Eip712(#[from] Eip712Error),
}

/// Errors that can occur during batch decoding.
#[derive(Debug, Error)]
pub enum BatchDecodeError {
    #[error("decode error at index {index}: {source}")]
    ItemFailed {
        index: usize,
        #[source]
        source: CodecError,
    },
}
