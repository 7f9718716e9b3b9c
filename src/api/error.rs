//! Ответы об ошибках API

use std::any::Any;
use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use crate::error::{EncodingError, ValidationError};

#[derive(Debug)]
pub enum ApiError {
    /// 400: ошибка во входных данных клиента
    BadRequest(String),
    /// 500: непредвиденная ошибка при обработке
    Internal {
        error: String,
        message: &'static str,
        traceback: Option<String>,
    },
}

impl ApiError {
    /// `traceback`: цепочка причин ошибки, если ее разрешено отдавать клиенту
    pub fn internal(err: &(dyn StdError + 'static), message: &'static str, expose_traceback: bool) -> Self {
        let chain: Vec<String> = std::iter::successors(Some(err), |&e| e.source())
            .map(|e| e.to_string())
            .collect();

        tracing::error!("{}: {}", message, chain.join(": "));

        ApiError::Internal {
            error: err.to_string(),
            message,
            traceback: expose_traceback.then(|| format_traceback(&chain)),
        }
    }
}

fn format_traceback(chain: &[String]) -> String {
    let mut lines = Vec::with_capacity(chain.len());
    for (i, cause) in chain.iter().enumerate() {
        if i == 0 {
            lines.push(format!("Error: {}", cause));
        } else {
            lines.push(format!("  {}: caused by: {}", i, cause));
        }
    }
    lines.join("\n")
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<EncodingError> for ApiError {
    fn from(err: EncodingError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(error) => {
                tracing::warn!("Rejected request: {}", error);
                (StatusCode::BAD_REQUEST, Json(json!({ "error": error }))).into_response()
            }
            ApiError::Internal {
                error,
                message,
                traceback,
            } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": error,
                    "message": message,
                    "traceback": traceback,
                })),
            )
                .into_response(),
        }
    }
}

/// Паника в обработчике превращается в ответ 500 того же формата
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    };

    tracing::error!("Handler panicked: {}", detail);

    ApiError::Internal {
        error: detail,
        message: "Unexpected error while processing request",
        traceback: None,
    }
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;
    use crate::types::ModelName;

    #[test]
    fn internal_error_carries_cause_chain_when_exposed() {
        let err = RegistryError::Io {
            name: ModelName::XGBoost,
            path: "model/XGBoost.json".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };

        match ApiError::internal(&err, "Error processing prediction request", true) {
            ApiError::Internal { error, traceback, .. } => {
                assert!(error.contains("XGBoost"));
                let traceback = traceback.unwrap();
                assert!(traceback.contains("caused by: no such file"));
            }
            other => panic!("unexpected {:?}", other),
        }

        match ApiError::internal(&err, "Error processing prediction request", false) {
            ApiError::Internal { traceback, .. } => assert!(traceback.is_none()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn client_errors_map_to_bad_request() {
        let response = ApiError::from(ValidationError::MissingField("Month")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
