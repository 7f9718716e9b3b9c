/// Модуль предобработки данных

pub mod feature_engineering;
pub mod normalization;

pub use feature_engineering::{EncoderLayout, FeatureEncoder};
pub use normalization::{DataNormalizer, ScalingParams};
