// ============================================================
// Layer 3 — Record and Example Types
// ============================================================
// RawRecord is one parsed line of the input file:
//
//   {"query": "...", "pos_doc": "...", "neg_doc": ["...", ...],
//    "query_id": ..., "doc_id": ..., <anything else>}
//
// The fields are held in an insertion-ordered JSON map so any
// extra metadata survives untouched all the way to the batch.
//
// ShapedExample is what the transformer makes of a record:
// token id sequences ready for collation, plus the metadata.
//
// Reference: Rust Book §5 (Structs)
//            serde_json documentation (Map, Value)

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::error::{DatasetError, Result};

/// Open key-value bag carried from record to batch.
pub type Metadata = Map<String, Value>;

// ─── RawRecord ────────────────────────────────────────────────────────────────
/// One (query, positive, negatives) record plus arbitrary fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: Metadata,
}

impl RawRecord {
    pub fn new(fields: Metadata) -> Self {
        Self { fields }
    }

    /// `index` is only used to make error messages point at the record.
    pub fn text(&self, field: &str, index: usize) -> Result<&str> {
        match self.fields.get(field) {
            Some(Value::String(s)) => Ok(s.as_str()),
            Some(_) => Err(invalid(field, index, "a string")),
            None => Err(missing(field, index)),
        }
    }

    /// The hard negative texts, in file order.
    pub fn neg_docs(&self, index: usize) -> Result<Vec<&str>> {
        let values = match self.fields.get("neg_doc") {
            Some(Value::Array(values)) => values,
            Some(_) => return Err(invalid("neg_doc", index, "an array of strings")),
            None => return Err(missing("neg_doc", index)),
        };

        values
            .iter()
            .map(|v| {
                v.as_str()
                    .ok_or_else(|| invalid("neg_doc", index, "an array of strings"))
            })
            .collect()
    }

    /// Fail with MissingField unless `field` is present (any type).
    pub fn require(&self, field: &str, index: usize) -> Result<()> {
        if self.fields.contains_key(field) {
            Ok(())
        } else {
            Err(missing(field, index))
        }
    }

    pub fn into_fields(self) -> Metadata {
        self.fields
    }
}

fn missing(field: &str, index: usize) -> DatasetError {
    DatasetError::MissingField { index, field: field.to_string() }
}

fn invalid(field: &str, index: usize, expected: &'static str) -> DatasetError {
    DatasetError::InvalidField { index, field: field.to_string(), expected }
}

// ─── ShapedExample ────────────────────────────────────────────────────────────
/// Token ids for one record, ready for the collator.
///
/// Which sequences are filled depends on the data type:
///   train → query, pos_doc and exactly K neg_doc
///   query → query only
///   doc   → pos_doc only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapedExample {
    pub query: Vec<u32>,
    pub pos_doc: Vec<u32>,
    pub neg_doc: Vec<Vec<u32>>,
    /// Every field of the source record, verbatim
    pub metadata: Metadata,
    /// True when the example was produced for a wrapped (padding) ordinal
    pub autogenerated: bool,
}
