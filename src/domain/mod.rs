// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that define what the pipeline talks about:
// records, shaped examples, configuration, errors, and the two
// collaborator traits.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Dataset options and their enum-valued settings
pub mod config;

// DatasetError and the Result alias
pub mod error;

// Raw records and shaped examples
pub mod record;

// RecordSource and TextTokenizer abstractions
pub mod traits;
