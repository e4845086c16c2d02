//! Inference module
//!
//! Turns JSON records into aligned feature rows and runs every per-target
//! model on them.

mod predictor;
pub mod request;

pub use predictor::Predictor;
pub use request::{inject_bmi, record_to_frame, sample_profile, Record};
