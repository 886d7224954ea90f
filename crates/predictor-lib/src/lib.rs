//! Core library for course-schedule auto-fill prediction
//!
//! This crate provides:
//! - Pure feature transforms shared by training and inference
//! - Term indexing against a persisted baseline
//! - CSV batch loading and feature engineering
//! - Synthetic negative sampling for the plausibility scenario
//! - Classifier pipelines, training, and artifact persistence
//! - The load-once inference service

pub mod artifact;
pub mod dataset;
pub mod error;
pub mod features;
pub mod inference;
pub mod model;
pub mod models;
pub mod sampler;
pub mod schema;
pub mod term;
pub mod trainer;

pub use error::RequestError;
pub use inference::{InferenceService, DEFAULT_TOP_K};
pub use models::*;
pub use term::TermBaseline;
pub use trainer::{TrainerConfig, TrainingReport};
