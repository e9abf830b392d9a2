// src/core/mod.rs

/// Data structures shared across the scanner: sections, header findings and
/// the aggregate `ScanResult`.
pub mod models;

/// The header fetch and grading, the finding providers, and the aggregator
/// that runs them for a target.
pub mod scanner;

/// The static header table, weights, remediations and grade explanations.
pub mod knowledge_base;

/// Report layout, PDF output and the reports directory.
pub mod report;
