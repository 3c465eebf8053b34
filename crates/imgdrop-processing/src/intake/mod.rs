//! Batch intake

pub mod pipeline;

pub use pipeline::{IntakeError, IntakeOutcome, IntakePipeline, Route};
