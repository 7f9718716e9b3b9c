//! Обработчики HTTP-эндпоинтов

use axum::body::Bytes;
use axum::extract::State;
use axum::response::Json;
use serde_json::{json, Map, Value};

use crate::api::error::ApiError;
use crate::error::ValidationError;
use crate::models::predict as run_prediction;
use crate::state::ServiceContext;
use crate::types::{
    FeaturesOutput, HealthOutput, MetricsOutput, ModelInfo, ModelName, ModelsOutput,
    PredictionOutput, SessionRecord, FEATURE_NAMES,
};

const PREDICT_FAILED: &str = "Error processing prediction request";
const METRICS_FAILED: &str = "Error computing model metrics";

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Purchase Intent Prediction API",
        "status": "success",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/": "GET - service information",
            "/health": "GET - health check",
            "/predict": "POST - predict purchase intent for a session",
            "/metrics": "GET - accuracy and ROC AUC of every model",
            "/api/features": "GET - required session fields",
            "/api/models": "GET - available models",
        }
    }))
}

pub async fn health(State(ctx): State<ServiceContext>) -> Json<HealthOutput> {
    Json(HealthOutput {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        model_loaded: ctx.registry.is_loaded(ModelName::DEFAULT),
    })
}

/// Тело запроса: объект с 17 полями сессии и необязательным `model_name`
fn parse_request(body: &[u8]) -> Result<(ModelName, SessionRecord, Map<String, Value>), ValidationError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ValidationError::EmptyBody);
    }

    let mut fields = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) => return Err(ValidationError::MalformedJson("expected a JSON object".to_string())),
        Err(e) => return Err(ValidationError::MalformedJson(e.to_string())),
    };
    if fields.is_empty() {
        return Err(ValidationError::EmptyBody);
    }

    let requested = fields.remove("model_name");

    // Поля сессии проверяются раньше имени модели
    let record = SessionRecord::from_fields(&fields)?;
    let model_name = match requested {
        None | Some(Value::Null) => ModelName::DEFAULT,
        Some(Value::String(name)) => name.parse::<ModelName>()?,
        Some(other) => {
            return Err(ValidationError::InvalidModelName {
                given: other.to_string(),
                allowed: ModelName::allowed(),
            })
        }
    };

    Ok((model_name, record, fields))
}

pub async fn predict(
    State(ctx): State<ServiceContext>,
    body: Bytes,
) -> Result<Json<PredictionOutput>, ApiError> {
    let (model_name, record, session_data) = parse_request(&body)?;
    let vector = ctx.encoder.encode(&record)?;

    let traceback = ctx.expose_traceback;

    let model = ctx
        .registry
        .get(model_name)
        .await
        .map_err(|e| ApiError::internal(&e, PREDICT_FAILED, traceback))?;
    let prediction = run_prediction(vector.view(), &model)
        .map_err(|e| ApiError::internal(&e, PREDICT_FAILED, traceback))?;
    let evaluation = ctx
        .evaluations
        .get_or_evaluate(model, ctx.test_set.clone())
        .await
        .map_err(|e| ApiError::internal(&e, PREDICT_FAILED, traceback))?;

    tracing::info!(
        "Prediction with {}: label={}, confidence={:.4}",
        model_name,
        prediction.label,
        prediction.confidence
    );

    Ok(Json(PredictionOutput {
        prediction: prediction.label,
        confidence: prediction.confidence,
        result: prediction.verdict().to_string(),
        session_data,
        model_name,
        accuracy: evaluation.accuracy,
        roc_auc: evaluation.roc_auc,
        roc_curve_base64: evaluation.roc_curve_base64.clone(),
        feature_importance: evaluation.feature_importance.clone(),
    }))
}

pub async fn metrics(State(ctx): State<ServiceContext>) -> Result<Json<MetricsOutput>, ApiError> {
    let mut output = MetricsOutput::new();

    for name in ModelName::ALL {
        let model = ctx
            .registry
            .get(name)
            .await
            .map_err(|e| ApiError::internal(&e, METRICS_FAILED, ctx.expose_traceback))?;
        let evaluation = ctx
            .evaluations
            .get_or_evaluate(model, ctx.test_set.clone())
            .await
            .map_err(|e| ApiError::internal(&e, METRICS_FAILED, ctx.expose_traceback))?;
        output.insert(name.to_string(), evaluation.metrics());
    }

    Ok(Json(output))
}

pub async fn features() -> Json<FeaturesOutput> {
    Json(FeaturesOutput {
        features: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
    })
}

pub async fn models(State(ctx): State<ServiceContext>) -> Json<ModelsOutput> {
    let models = ModelName::ALL
        .iter()
        .map(|&name| ModelInfo {
            name,
            kind: ctx.registry.kind(name),
            capability: ctx.registry.capability(name),
            loaded: ctx.registry.is_loaded(name),
        })
        .collect();

    Json(ModelsOutput {
        default: ModelName::DEFAULT,
        models,
        feature_names: ctx.encoder.feature_names().to_vec(),
    })
}
