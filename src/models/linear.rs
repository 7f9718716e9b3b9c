//! Логистическая регрессия

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::models::{sigmoid, Classifier};

/// Коэффициенты в форме (n_classes_or_1, n_features); для двух классов
/// используется первая строка.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub n_features: usize,
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
}

impl LogisticRegression {
    pub fn coefficients(&self) -> &[f64] {
        self.coef.first().map(|row| row.as_slice()).unwrap_or(&[])
    }

    pub fn decision_function(&self, x: ArrayView1<f64>) -> f64 {
        let bias = self.intercept.first().copied().unwrap_or(0.0);
        self.coefficients()
            .iter()
            .zip(x.iter())
            .map(|(w, v)| w * v)
            .sum::<f64>()
            + bias
    }
}

impl Classifier for LogisticRegression {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn positive_proba(&self, x: ArrayView1<f64>) -> f64 {
        sigmoid(self.decision_function(x))
    }

    fn validate(&self) -> Result<(), String> {
        let first = self.coef.first().ok_or("coef is empty")?;
        if first.len() != self.n_features {
            return Err(format!(
                "coef has {} columns, expected {}",
                first.len(),
                self.n_features
            ));
        }
        if self.intercept.is_empty() {
            return Err("intercept is empty".to_string());
        }
        if first.iter().chain(self.intercept.iter()).any(|v| !v.is_finite()) {
            return Err("coef and intercept must be finite".to_string());
        }
        Ok(())
    }
}
