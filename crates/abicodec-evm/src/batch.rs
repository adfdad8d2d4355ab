//! Rayon-powered batch decode helpers.
//! `EvmDecoder::decode_batch` covers the common case; these return successes
//! and failures side by side and can bound the working set by chunking.

use abicodec_core::{
    decoder::EventDecoder,
    error::CodecError,
    event::{DecodedEvent, RawLog},
    schema::SchemaRegistry,
};
use rayon::prelude::*;

use crate::decoder::EvmDecoder;

/// Decoded events and the failures, each tagged with its input index.
pub type BatchOutput = (Vec<DecodedEvent>, Vec<(usize, CodecError)>);

/// Decode a slice of logs in parallel. Events keep input order.
pub fn parallel_decode(
    decoder: &EvmDecoder,
    logs: &[RawLog],
    registry: &dyn SchemaRegistry,
) -> BatchOutput {
    let results: Vec<(usize, Result<DecodedEvent, CodecError>)> = logs
        .par_iter()
        .enumerate()
        .map(|(idx, log)| (idx, decoder.decode_with(log, registry)))
        .collect();

    let mut events = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for (idx, r) in results {
        match r {
            Ok(e) => events.push(e),
            Err(e) => errors.push((idx, e)),
        }
    }
    (events, errors)
}

/// Decode `logs` in slices of at most `chunk_size`, each slice in parallel.
/// Error indices refer to the whole input. A zero `chunk_size` is treated as one.
pub fn chunked_decode(
    decoder: &EvmDecoder,
    logs: &[RawLog],
    registry: &dyn SchemaRegistry,
    chunk_size: usize,
) -> BatchOutput {
    let mut all_events = Vec::with_capacity(logs.len());
    let mut all_errors = Vec::new();
    let mut offset = 0;

    for chunk in logs.chunks(chunk_size.max(1)) {
        let (mut events, errors) = parallel_decode(decoder, chunk, registry);
        tracing::debug!(
            offset,
            decoded = events.len(),
            failed = errors.len(),
            "decoded chunk"
        );
        all_events.append(&mut events);
        all_errors.extend(errors.into_iter().map(|(idx, err)| (offset + idx, err)));
        offset += chunk.len();
    }

    (all_events, all_errors)
}
