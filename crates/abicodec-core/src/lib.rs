//! # abicodec-core
//!
//! Core types shared across the abicodec crates: the ABI type grammar,
//! normalized values, schemas and their fingerprints, the registry and
//! decoder traits, configuration and the error taxonomy.

pub mod call;
pub mod config;
pub mod decoder;
pub mod error;
pub mod event;
pub mod fingerprint;
pub mod json;
pub mod schema;
pub mod types;
pub mod value;

pub use call::DecodedCall;
pub use config::{CodecConfig, Strictness};
pub use decoder::{BatchDecodeResult, ErrorMode, EventDecoder, ProgressCallback};
pub use error::{
    BatchDecodeError, CodecError, DecodeError, Eip712Error, EncodeError, JsonValueError,
    SchemaError,
};
pub use event::{DecodedEvent, RawLog};
pub use fingerprint::{keccak256, Fingerprint};
pub use schema::{Parameter, Schema, SchemaKind, SchemaMeta, SchemaRegistry, TrustLevel};
pub use types::{TypeDescriptor, DEFAULT_MAX_DEPTH, WORD};
pub use value::NormalizedValue;
