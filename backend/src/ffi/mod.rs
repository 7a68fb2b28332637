//! FFI module - PyO3 bindings for the Python charm
//!
//! The charm collects options, relation data and workload state with the
//! operator framework, hands them over as dicts, and applies the returned
//! effects itself.

pub mod core;
pub mod types;
