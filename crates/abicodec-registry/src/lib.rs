//! # abicodec-registry
//!
//! Schema registry for abicodec.
//!
//! ## Pieces
//! 1. **`MemoryRegistry`**: an immutable arena snapshot, built by `RegistryBuilder`
//! 2. **`SharedRegistry`**: publishes snapshots; reload is copy-on-write
//! 3. **Sources**: CSDL (YAML), Solidity JSON ABI, human-readable declarations
//!
//! The public-facing lookup API is the `SchemaRegistry` trait from `abicodec-core`.

pub mod csdl;
pub mod human;
pub mod json_abi;
pub mod memory;
pub mod shared;
pub mod source;

pub use csdl::{CsdlParser, CsdlSource};
pub use human::Declarations;
pub use json_abi::JsonAbiSource;
pub use memory::{
    DuplicatePolicy, InsertOutcome, MemoryRegistry, RegistryBuilder, RegistryState, SchemaId,
};
pub use shared::SharedRegistry;
pub use source::SchemaSource;
