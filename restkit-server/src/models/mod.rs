//! Domain models with validation
//!
//! Request bodies are checked by their `Validate` impl before they reach a
//! store or service. Invalid input returns ValidationError, not panic.

pub mod sample;
pub mod validation;

pub use sample::{CreateSample, Sample, UpdateSample};
pub use validation::{Validate, ValidationError};
