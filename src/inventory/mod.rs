//! Dependency inventory domain.
//!
//! Canonical component model, per-scan and per-organization result
//! structures, and the merge rules that reconcile what the ecosystem
//! scanners report.

pub mod domain;
pub mod policies;
pub mod services;
