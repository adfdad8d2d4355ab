//! # abicodec-evm
//!
//! Ethereum ABI codec: the head/tail decoder and encoder, log and calldata
//! decoders, EIP-712 hashing and the registry-backed [`Codec`] facade.
//!
//! ## Implementation notes
//! - Topics[0] → event signature fingerprint (keccak256)
//! - Topics[1..] → indexed parameters (each 32 bytes)
//! - `data` → non-indexed parameters (ABI-encoded tuple)
//! - Calldata[..4] → function selector, the rest an ABI-encoded tuple

pub mod abi;
pub mod batch;
pub mod call_decoder;
pub mod codec;
pub mod decoder;
pub mod eip712;
pub mod encoder;
pub mod fingerprint;

pub use abi::{AbiDecoder, AbiEncoder};
pub use call_decoder::EvmCallDecoder;
pub use codec::Codec;
pub use decoder::EvmDecoder;
pub use eip712::{
    domain_separator, parse_typed_data, sign_hash, Eip712Domain, Eip712Engine, Eip712Field,
    Eip712Types, TypedData,
};
pub use encoder::EvmEncoder;
