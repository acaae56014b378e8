//! Test utilities for tagarena development.
//!
//! - [`compliance`]: assertion helpers that check allocator invariants
//!   through the public API only.
//! - [`workload`]: deterministic allocate/free scripts for churn tests and
//!   benchmarks.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod compliance;
pub mod workload;

pub use compliance::assert_all_invariants;
pub use workload::{drain, run_script, script, ChurnOp, ScriptOutcome};
