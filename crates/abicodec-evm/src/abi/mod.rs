//! The ABI head/tail codec.
//!
//! A parameter list is encoded as a block: one head slot per parameter, then
//! the tails. Static values live in their head slot; a dynamic value's slot
//! holds a 32-byte offset, relative to the start of the enclosing block, to
//! its tail. `bytes`, `string` and `T[]` tails start with a length word.

pub mod decode;
pub mod encode;

pub use decode::AbiDecoder;
pub use encode::AbiEncoder;
