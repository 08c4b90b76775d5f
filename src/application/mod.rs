//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement the
//! inference request pipeline.

pub mod advice;
mod inference;

pub use inference::InferenceService;
