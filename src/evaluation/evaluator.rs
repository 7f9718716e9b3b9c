//! Оценка модели на тестовой выборке и кэш результатов

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use crate::error::EvaluationError;
use crate::evaluation::dataset::TestSet;
use crate::evaluation::metrics::{accuracy_score, auc, roc_curve, RocCurve};
use crate::evaluation::plot::render_roc_curve_base64;
use crate::models::{predict, LoadedModel};
use crate::types::{ModelMetrics, ModelName};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub accuracy: f64,
    pub roc_auc: f64,
    pub roc_curve: RocCurve,
    /// В порядке закодированных признаков
    pub feature_importance: Option<Vec<f64>>,
    pub roc_curve_base64: String,
}

impl EvaluationResult {
    pub fn metrics(&self) -> ModelMetrics {
        ModelMetrics {
            accuracy: self.accuracy,
            roc_auc: self.roc_auc,
        }
    }
}

pub fn evaluate(model: &LoadedModel, test_set: &TestSet) -> Result<EvaluationResult, EvaluationError> {
    let mut y_pred = Vec::with_capacity(test_set.len());
    let mut y_score = Vec::with_capacity(test_set.len());

    for (row, x) in test_set.rows().enumerate() {
        let prediction = predict(x, model).map_err(|source| EvaluationError::Predict { row, source })?;
        y_pred.push(prediction.label);
        y_score.push(prediction.probabilities[1]);
    }

    let accuracy = accuracy_score(test_set.labels(), &y_pred);
    let roc = roc_curve(test_set.labels(), &y_score);
    let roc_auc = auc(&roc.fpr, &roc.tpr).clamp(0.0, 1.0);
    let roc_curve_base64 = render_roc_curve_base64(&roc)?;

    tracing::info!(
        "Evaluated {} on {} test rows: accuracy={:.4}, roc_auc={:.4}",
        model.name,
        test_set.len(),
        accuracy,
        roc_auc
    );

    Ok(EvaluationResult {
        accuracy,
        roc_auc,
        roc_curve: roc,
        feature_importance: model.feature_importance(),
        roc_curve_base64,
    })
}

/// Оценка детерминирована для пары (модель, выборка), поэтому считается один раз
pub struct EvaluationCache {
    results: HashMap<ModelName, OnceCell<Arc<EvaluationResult>>>,
}

impl EvaluationCache {
    pub fn new() -> Self {
        Self {
            results: ModelName::ALL.iter().map(|n| (*n, OnceCell::new())).collect(),
        }
    }

    pub async fn get_or_evaluate(
        &self,
        model: Arc<LoadedModel>,
        test_set: Arc<TestSet>,
    ) -> Result<Arc<EvaluationResult>, EvaluationError> {
        let cell = &self.results[&model.name];
        cell.get_or_try_init(|| async move {
            tokio::task::spawn_blocking(move || evaluate(&model, &test_set))
                .await
                .map_err(|e| EvaluationError::Join(e.to_string()))?
                .map(Arc::new)
        })
        .await
        .cloned()
    }
}

impl Default for EvaluationCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ensemble::RandomForest;
    use crate::models::linear::LogisticRegression;
    use crate::models::tree::TreeNode;
    use crate::models::ModelArtifact;
    use crate::types::Capability;
    use ndarray::array;

    fn test_set() -> TestSet {
        TestSet::new(
            array![[0.0, 1.0], [0.2, 0.0], [0.7, 1.0], [0.9, 0.0]],
            vec![0, 0, 1, 1],
        )
        .unwrap()
    }

    fn linear() -> LoadedModel {
        LoadedModel::new(
            ModelName::LogisticRegression,
            Capability::LinearBased,
            ModelArtifact::LogisticRegression(LogisticRegression {
                n_features: 2,
                coef: vec![vec![10.0, 0.0]],
                intercept: vec![-5.0],
            }),
        )
    }

    #[test]
    fn separable_model_scores_perfectly() {
        let result = evaluate(&linear(), &test_set()).unwrap();
        assert_eq!(result.accuracy, 1.0);
        assert!((result.roc_auc - 1.0).abs() < 1e-12);
        assert_eq!(result.feature_importance, Some(vec![10.0, 0.0]));
        assert!(!result.roc_curve_base64.is_empty());
    }

    #[test]
    fn tree_model_reports_importances() {
        let model = LoadedModel::new(
            ModelName::RandomForest,
            Capability::TreeBased,
            ModelArtifact::RandomForest(RandomForest {
                n_features: 2,
                trees: vec![TreeNode::split(1, 0.5, TreeNode::leaf(0.6), TreeNode::leaf(0.4))],
                feature_importances: None,
            }),
        );
        let result = evaluate(&model, &test_set()).unwrap();
        assert_eq!(result.accuracy, 0.5);
        assert!((0.0..=1.0).contains(&result.roc_auc));
        assert_eq!(result.feature_importance, Some(vec![0.0, 1.0]));
    }

    #[test]
    fn wrong_width_is_reported_with_row() {
        let narrow = TestSet::new(array![[0.0], [1.0]], vec![0, 1]).unwrap();
        assert!(matches!(
            evaluate(&linear(), &narrow),
            Err(EvaluationError::Predict { row: 0, .. })
        ));
    }

    #[tokio::test]
    async fn cache_returns_the_same_result() {
        let cache = EvaluationCache::new();
        let model = Arc::new(linear());
        let data = Arc::new(test_set());
        let first = cache
            .get_or_evaluate(Arc::clone(&model), Arc::clone(&data))
            .await
            .unwrap();
        let second = cache.get_or_evaluate(model, data).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
