pub mod wire;

pub use wire::{ErrorBody, HealthStatus, PredictionInput, PredictionOutput};
