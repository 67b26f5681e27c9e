//! Tower Layer implementations for agent messaging

pub mod validation;

pub use validation::{MessageValidationLayer, MessageValidationService};
