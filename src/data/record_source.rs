// ============================================================
// Layer 4 — JSONL Record Source
// ============================================================
// Random access over a line-oriented JSON file without loading
// every record into memory.
//
// How it works:
//   1. The file is memory-mapped read-only (memmap2).
//   2. One pass over the bytes records the (start, end) offset
//      of every non-blank line. This is the only full scan.
//   3. record(i) slices line i out of the map and parses it
//      with serde_json on demand.
//
//   file bytes:  {"query":..}\n{"query":..}\n\n{"query":..}\n
//   line index:  [(0, 14), (15, 29), (31, 45)]
//
// Blank lines are skipped, so record offsets are dense.
// The map and index are immutable after open(), which makes
// the source safe to share across loader workers.
//
// Reference: memmap2 crate documentation
//            Rust Book §8 (Slices), §16 (Send and Sync)

use memmap2::Mmap;
use serde_json::Value;
use std::{
    fs::File,
    path::{Path, PathBuf},
};

use crate::domain::error::{DatasetError, Result};
use crate::domain::record::RawRecord;
use crate::domain::traits::RecordSource;

/// Memory-mapped JSONL file with a precomputed line index.
pub struct JsonlRecordSource {
    path: PathBuf,
    /// None for an empty file (zero-length files cannot be mapped)
    mmap: Option<Mmap>,
    /// Byte range of each non-blank line
    lines: Vec<(usize, usize)>,
    /// 1-based line number of each indexed line, for error messages
    line_numbers: Vec<usize>,
}

impl JsonlRecordSource {
    /// Map `path` and index its lines.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let size = file.metadata()?.len();

        let mmap = if size == 0 {
            None
        } else {
            // SAFETY: the map is read-only and the file is not modified while mapped
            Some(unsafe { Mmap::map(&file) }?)
        };

        let (lines, line_numbers) = match &mmap {
            Some(m) => index_lines(m),
            None => (Vec::new(), Vec::new()),
        };

        tracing::debug!(
            "Indexed {} records in '{}' ({} bytes)",
            lines.len(),
            path.display(),
            size
        );

        Ok(Self { path, mmap, lines, line_numbers })
    }

    fn line_bytes(&self, offset: usize) -> &[u8] {
        let (start, end) = self.lines[offset];
        match &self.mmap {
            Some(m) => &m[start..end],
            None => &[],
        }
    }
}

/// Scan once for newline-delimited, non-blank lines.
fn index_lines(bytes: &[u8]) -> (Vec<(usize, usize)>, Vec<usize>) {
    let mut lines        = Vec::new();
    let mut line_numbers = Vec::new();
    let mut start        = 0usize;

    for (line_no, chunk) in bytes.split(|&b| b == b'\n').enumerate() {
        let end = start + chunk.len();
        if !chunk.iter().all(|b| b.is_ascii_whitespace()) {
            lines.push((start, end));
            line_numbers.push(line_no + 1);
        }
        // +1 skips the newline itself
        start = end + 1;
    }

    (lines, line_numbers)
}

impl RecordSource for JsonlRecordSource {
    fn len(&self) -> usize {
        self.lines.len()
    }

    fn record(&self, offset: usize) -> Result<RawRecord> {
        if offset >= self.lines.len() {
            return Err(DatasetError::IndexOutOfRange {
                ordinal: offset as i64,
                len: self.lines.len(),
            });
        }

        let line = self.line_numbers[offset];
        let value: Value = serde_json::from_slice(self.line_bytes(offset)).map_err(|e| {
            DatasetError::MalformedRecord { line, reason: e.to_string() }
        })?;

        match value {
            Value::Object(fields) => Ok(RawRecord::new(fields)),
            _ => Err(DatasetError::MalformedRecord {
                line,
                reason: "expected a JSON object".to_string(),
            }),
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.jsonl");
        let mut f = File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn test_reads_records_by_offset() {
        let (_dir, path) = write_file(
            "{\"query\": \"a\"}\n{\"query\": \"b\"}\n{\"query\": \"c\"}\n",
        );
        let src = JsonlRecordSource::open(&path).unwrap();
        assert_eq!(src.len(), 3);
        assert_eq!(src.record(1).unwrap().text("query", 1).unwrap(), "b");
        assert_eq!(src.record(2).unwrap().text("query", 2).unwrap(), "c");
    }

    #[test]
    fn test_skips_blank_lines_and_handles_missing_trailing_newline() {
        let (_dir, path) = write_file("{\"query\": \"a\"}\n\n   \n{\"query\": \"b\"}");
        let src = JsonlRecordSource::open(&path).unwrap();
        assert_eq!(src.len(), 2);
        assert_eq!(src.record(1).unwrap().text("query", 1).unwrap(), "b");
    }

    #[test]
    fn test_crlf_lines_parse() {
        let (_dir, path) = write_file("{\"query\": \"a\"}\r\n{\"query\": \"b\"}\r\n");
        let src = JsonlRecordSource::open(&path).unwrap();
        assert_eq!(src.len(), 2);
        assert!(src.record(0).is_ok());
    }

    #[test]
    fn test_out_of_range() {
        let (_dir, path) = write_file("{\"query\": \"a\"}\n");
        let src = JsonlRecordSource::open(&path).unwrap();
        assert!(matches!(
            src.record(5),
            Err(DatasetError::IndexOutOfRange { ordinal: 5, len: 1 })
        ));
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let (_dir, path) = write_file("{\"query\": \"a\"}\n\n[1, 2]\nnot json\n");
        let src = JsonlRecordSource::open(&path).unwrap();
        assert!(matches!(src.record(1), Err(DatasetError::MalformedRecord { line: 3, .. })));
        assert!(matches!(src.record(2), Err(DatasetError::MalformedRecord { line: 4, .. })));
    }

    #[test]
    fn test_empty_file() {
        let (_dir, path) = write_file("");
        let src = JsonlRecordSource::open(&path).unwrap();
        assert!(src.is_empty());
        assert!(src.record(0).is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = JsonlRecordSource::open(dir.path().join("nope.jsonl")).err();
        assert!(matches!(err, Some(DatasetError::Io(_))));
    }
}
