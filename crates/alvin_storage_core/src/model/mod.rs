//! Hierarchical record model shared by every storage backend.
//!
//! # Responsibility
//! - Define the record tree passed through the storage contract.
//! - Provide lookup helpers used by converters and adapters.
//!
//! # Invariants
//! - Records are plain values; no backend keeps them between calls.
//! - Record identity for storage is the `(type, id)` pair, never the tree.
//!
//! # See also
//! - docs/architecture/data-model.md

pub mod collected_terms;
pub mod record;
