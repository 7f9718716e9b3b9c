//! Purchase Intent - классификация сессий интернет-магазина

pub mod api;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod models;
pub mod preprocessing;
pub mod state;
pub mod types;

pub use types::*;
pub use config::Config;
pub use state::ServiceContext;

// Re-export для удобства
pub use api::router;
pub use models::{predict, LoadedModel, ModelRegistry, Prediction};
pub use preprocessing::FeatureEncoder;
