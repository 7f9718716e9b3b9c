//! Ошибки компонентов сервиса

use thiserror::Error;

use crate::types::{ModelKind, ModelName};

/// Ошибки клиентского ввода (HTTP 400)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("No session data provided")]
    EmptyBody,

    #[error("Invalid JSON body: {0}")]
    MalformedJson(String),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Invalid model_name '{given}'. Allowed: [{}]", .allowed.join(", "))]
    InvalidModelName {
        given: String,
        allowed: Vec<&'static str>,
    },
}

/// Ошибки кодирования признаков
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodingError {
    #[error("Unknown category for {field}: {value}")]
    UnknownCategory { field: &'static str, value: String },

    #[error("Value for {field} is out of range after scaling: {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("Invalid encoder layout: {0}")]
    InvalidLayout(String),
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Failed to read artifact for {name} from {path}")]
    Io {
        name: ModelName,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse artifact for {name}")]
    Parse {
        name: ModelName,
        #[source]
        source: serde_json::Error,
    },

    #[error("Artifact for {name} not found")]
    NotFound { name: ModelName },

    #[error("Artifact for {name} is a {found} model, registered as {expected}")]
    KindMismatch {
        name: ModelName,
        expected: ModelKind,
        found: ModelKind,
    },

    #[error("Artifact for {name} is invalid: {reason}")]
    Invalid { name: ModelName, reason: String },

    #[error("Artifact load task for {name} failed: {reason}")]
    Join { name: ModelName, reason: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error("Feature vector has {found} values, model expects {expected}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Feature vector contains a non-finite value at index {index}")]
    NonFinite { index: usize },
}

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("Prediction on test row {row} failed")]
    Predict {
        row: usize,
        #[source]
        source: PredictError,
    },

    #[error("Failed to render ROC curve: {0}")]
    Render(String),

    #[error("Evaluation task failed: {0}")]
    Join(String),
}

/// Ошибки загрузки тестовой выборки
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read test set")]
    Csv(#[from] csv::Error),

    #[error("Test set is missing column {0}")]
    MissingColumn(String),

    #[error("Test set row {row} is invalid")]
    Row {
        row: usize,
        #[source]
        source: ValidationError,
    },

    #[error("Test set row {row} cannot be encoded")]
    Encoding {
        row: usize,
        #[source]
        source: EncodingError,
    },

    #[error("Test set row {row} has an invalid label: {value}")]
    Label { row: usize, value: String },

    #[error("Test set has {rows} feature rows but {labels} labels")]
    LengthMismatch { rows: usize, labels: usize },

    #[error("Test set is empty")]
    Empty,

    #[error("Test set contains a single class; ROC-AUC is undefined")]
    SingleClass,
}
