// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The pipeline depends on two collaborators it does not own:
//
//   RecordSource   — random access to parsed records
//                    (JsonlRecordSource in the data layer)
//   TextTokenizer  — text → token ids, plus special ids
//                    (HfTokenizer in the infra layer)
//
// Programming against these traits keeps the transformer and
// collator testable with in-memory fakes.
//
// Both traits require Send + Sync so one instance can be shared
// by every data-loading worker.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use crate::domain::error::Result;
use crate::domain::record::RawRecord;

// ─── RecordSource ─────────────────────────────────────────────────────────────
/// A random-access, read-only sequence of raw records.
pub trait RecordSource: Send + Sync {
    /// Number of records available
    fn len(&self) -> usize;

    /// Fetch and parse the record at `offset`.
    /// Fails with IndexOutOfRange or MalformedRecord.
    fn record(&self, offset: usize) -> Result<RawRecord>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Human-readable origin, used in error logs
    fn describe(&self) -> String;
}

// ─── TextTokenizer ────────────────────────────────────────────────────────────
/// Converts text to token ids and exposes the fixed special ids.
pub trait TextTokenizer: Send + Sync {
    fn text_to_ids(&self, text: &str) -> Result<Vec<u32>>;

    fn bos_id(&self) -> u32;

    fn eos_id(&self) -> u32;

    /// None when the vocabulary has no dedicated padding token
    fn pad_id(&self) -> Option<u32>;
}
