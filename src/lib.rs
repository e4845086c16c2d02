//! Diet Predictor - per-nutrient regression for personalized diet plans
//!
//! This crate provides both halves of the system:
//! - An offline training pipeline that detects nutrition targets in a CSV,
//!   preprocesses features and fits one boosted tree model per target
//! - An HTTP service that loads those artifacts and answers predictions
//!
//! # Modules
//!
//! - [`targets`] - Target column detection
//! - [`preprocessing`] - Imputation, one-hot encoding, schema alignment
//! - [`training`] - Gradient boosted trees, metrics, training pipeline
//! - [`artifacts`] - Model directory layout and run records
//! - [`inference`] - Request conversion and the loaded predictor
//! - [`server`] - HTTP server
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Data handling
pub mod utils;
pub mod targets;
pub mod preprocessing;

// Models
pub mod training;
pub mod artifacts;
pub mod inference;

// Services
pub mod server;
pub mod cli;

pub use error::{DietError, Result};
