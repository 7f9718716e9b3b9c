//! Предсказание по закодированному вектору

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::error::PredictError;
use crate::models::artifact::LoadedModel;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: u8,
    /// Вероятность предсказанного класса (не обязательно положительного)
    pub confidence: f64,
    pub probabilities: [f64; 2],
}

impl Prediction {
    pub fn verdict(&self) -> &'static str {
        if self.label == 1 {
            "Purchase Likely ✅"
        } else {
            "Not Likely ❌"
        }
    }
}

pub fn predict(vector: ArrayView1<f64>, model: &LoadedModel) -> Result<Prediction, PredictError> {
    let expected = model.n_features();
    if vector.len() != expected {
        return Err(PredictError::DimensionMismatch {
            expected,
            found: vector.len(),
        });
    }
    if let Some(index) = vector.iter().position(|v| !v.is_finite()) {
        return Err(PredictError::NonFinite { index });
    }

    let label = model.predict(vector);
    let probabilities = model.predict_proba(vector);
    let confidence = if label == 1 {
        probabilities[1]
    } else {
        probabilities[0]
    };

    Ok(Prediction {
        label,
        confidence,
        probabilities,
    })
}
