//! Library exports for reuse in integration tests and benches.
/// Application directory helpers.
pub mod app_dirs;
/// CLI command implementations.
pub mod commands;
/// Text embedding providers and the on-disk embedding cache.
pub mod embedding;
/// Feedback merge engine for reviewed predictions.
pub mod feedback;
/// Logging setup.
pub mod logging;
/// Project configuration and directory layout.
pub mod project;
/// Nearest-neighbor retrieval model.
pub mod retrieval;
/// Example, review, and model stores.
pub mod store;
/// Classifier training orchestration.
pub mod train;
