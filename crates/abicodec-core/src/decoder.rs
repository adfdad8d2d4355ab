//! The `EventDecoder` trait and associated progress/batch types.
//!
//! The trait is object-safe so decoders can be stored as
//! `Arc<dyn EventDecoder>` and shared by the batch engine.

use crate::error::{BatchDecodeError, CodecError, DecodeError, SchemaError};
use crate::event::{DecodedEvent, RawLog};
use crate::fingerprint::Fingerprint;
use crate::schema::{Schema, SchemaRegistry};
use std::sync::Arc;

/// Callback invoked by the batch engine during long-running decodes.
/// `decoded` is the number of events successfully decoded so far;
/// `total` is the total count in the current batch.
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, decoded: usize, total: usize);
}

/// Blanket impl so closures can be used as progress callbacks.
impl<F: Fn(usize, usize) + Send + Sync> ProgressCallback for F {
    fn on_progress(&self, decoded: usize, total: usize) {
        self(decoded, total)
    }
}

/// Controls how the batch engine reacts to individual decode failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Silently skip logs that fail to decode.
    #[default]
    Skip,
    /// Collect errors alongside successes and return both at the end.
    Collect,
    /// Abort the entire batch on first error.
    Throw,
}

/// The output of a batch decode: successful events plus any collected errors.
#[derive(Debug)]
pub struct BatchDecodeResult {
    pub events: Vec<DecodedEvent>,
    /// Populated only when `ErrorMode::Collect` is used. Indices refer to the input slice.
    pub errors: Vec<(usize, CodecError)>,
}

/// Decodes EVM logs against a schema.
///
/// Implementations must be `Send + Sync` so they can be shared across
/// Rayon threads without additional locking.
pub trait EventDecoder: Send + Sync {
    /// Registry key of a log: `topics[0]`, or `None` when the log has no topics.
    fn fingerprint(&self, log: &RawLog) -> Option<Fingerprint>;

    /// Decode a single log using the provided schema.
    fn decode_event(&self, log: &RawLog, schema: &Arc<Schema>) -> Result<DecodedEvent, DecodeError>;

    /// Resolve the schema for `log` and decode it.
    fn decode_with(
        &self,
        log: &RawLog,
        registry: &dyn SchemaRegistry,
    ) -> Result<DecodedEvent, CodecError> {
        let fp = self
            .fingerprint(log)
            .ok_or(DecodeError::TopicCountMismatch {
                expected: 1,
                got: 0,
            })?;
        let schema = registry
            .get_by_fingerprint(&fp)
            .ok_or(SchemaError::UnknownFingerprint { fingerprint: fp })?;
        Ok(self.decode_event(log, &schema)?)
    }

    /// Decode a batch of logs.
    ///
    /// The default implementation is sequential; implementations may override
    /// it for parallelism.
    fn decode_batch(
        &self,
        logs: &[RawLog],
        registry: &dyn SchemaRegistry,
        mode: ErrorMode,
        progress: Option<&dyn ProgressCallback>,
    ) -> Result<BatchDecodeResult, BatchDecodeError> {
        let mut events = Vec::with_capacity(logs.len());
        let mut errors = Vec::new();

        for (idx, log) in logs.iter().enumerate() {
            match self.decode_with(log, registry) {
                Ok(event) => events.push(event),
                Err(err) => match mode {
                    ErrorMode::Skip => {}
                    ErrorMode::Collect => errors.push((idx, err)),
                    ErrorMode::Throw => {
                        return Err(BatchDecodeError::ItemFailed {
                            index: idx,
                            source: err,
                        });
                    }
                },
            }

            if let Some(cb) = progress {
                cb.on_progress(events.len(), logs.len());
            }
        }

        Ok(BatchDecodeResult { events, errors })
    }
}
