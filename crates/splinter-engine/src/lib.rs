//! The Splinter pipeline orchestrator.
//!
//! [`SplinterEngine`] owns the fragment store and metadata store and
//! exposes the full ingest / retrieve / remove pipeline. Protocol adapters
//! (CLI, HTTP, ...) depend on the [`FileGateway`] trait rather than the
//! concrete struct, making them interchangeable.

pub mod engine;
pub mod error;
pub mod gateway;
mod reconstruct;

pub use engine::SplinterEngine;
pub use error::EngineError;
pub use gateway::FileGateway;

#[cfg(test)]
mod tests;
