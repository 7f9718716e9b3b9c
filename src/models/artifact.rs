//! Артефакты моделей: формат файла и загруженная модель

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::models::ensemble::{AdaBoost, GradientBoosting, RandomForest, XGBoost};
use crate::models::linear::LogisticRegression;
use crate::models::Classifier;
use crate::types::{Capability, ModelKind, ModelName};

/// Содержимое `<model_dir>/<Name>.json`, тип задается полем `kind`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    GradientBoosting(GradientBoosting),
    RandomForest(RandomForest),
    #[serde(rename = "xgboost")]
    XGBoost(XGBoost),
    #[serde(rename = "adaboost")]
    AdaBoost(AdaBoost),
    LogisticRegression(LogisticRegression),
}

impl ModelArtifact {
    pub fn kind(&self) -> ModelKind {
        match self {
            ModelArtifact::GradientBoosting(_) => ModelKind::GradientBoosting,
            ModelArtifact::RandomForest(_) => ModelKind::RandomForest,
            ModelArtifact::XGBoost(_) => ModelKind::XGBoost,
            ModelArtifact::AdaBoost(_) => ModelKind::AdaBoost,
            ModelArtifact::LogisticRegression(_) => ModelKind::LogisticRegression,
        }
    }

    fn classifier(&self) -> &dyn Classifier {
        match self {
            ModelArtifact::GradientBoosting(m) => m,
            ModelArtifact::RandomForest(m) => m,
            ModelArtifact::XGBoost(m) => m,
            ModelArtifact::AdaBoost(m) => m,
            ModelArtifact::LogisticRegression(m) => m,
        }
    }

    /// Вектор важностей ансамбля (None для линейной модели)
    pub fn importance_vector(&self) -> Option<Vec<f64>> {
        match self {
            ModelArtifact::GradientBoosting(m) => Some(m.feature_importances()),
            ModelArtifact::RandomForest(m) => Some(m.feature_importances()),
            ModelArtifact::XGBoost(m) => Some(m.feature_importances()),
            ModelArtifact::AdaBoost(m) => Some(m.feature_importances()),
            ModelArtifact::LogisticRegression(_) => None,
        }
    }

    /// Коэффициенты первого класса (только для линейной модели)
    pub fn first_coefficients(&self) -> Option<&[f64]> {
        match self {
            ModelArtifact::LogisticRegression(m) => Some(m.coefficients()),
            _ => None,
        }
    }
}

impl Classifier for ModelArtifact {
    fn n_features(&self) -> usize {
        self.classifier().n_features()
    }

    fn positive_proba(&self, x: ArrayView1<f64>) -> f64 {
        self.classifier().positive_proba(x)
    }

    fn validate(&self) -> Result<(), String> {
        self.classifier().validate()
    }
}

/// Модель из реестра: артефакт плюс метаданные регистрации
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub name: ModelName,
    pub capability: Capability,
    pub artifact: ModelArtifact,
}

impl LoadedModel {
    pub fn new(name: ModelName, capability: Capability, artifact: ModelArtifact) -> Self {
        Self {
            name,
            capability,
            artifact,
        }
    }

    pub fn kind(&self) -> ModelKind {
        self.artifact.kind()
    }

    pub fn n_features(&self) -> usize {
        self.artifact.n_features()
    }

    pub fn predict(&self, x: ArrayView1<f64>) -> u8 {
        self.artifact.predict(x)
    }

    pub fn predict_proba(&self, x: ArrayView1<f64>) -> [f64; 2] {
        self.artifact.predict_proba(x)
    }

    /// Важность признаков по тегу возможностей, без интроспекции артефакта
    pub fn feature_importance(&self) -> Option<Vec<f64>> {
        match self.capability {
            Capability::TreeBased => self.artifact.importance_vector(),
            Capability::LinearBased => self.artifact.first_coefficients().map(|c| c.to_vec()),
            Capability::Other => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tree::TreeNode;
    use ndarray::array;

    #[test]
    fn parses_tagged_artifacts() {
        let json = r#"{
            "kind": "logistic_regression",
            "n_features": 2,
            "coef": [[0.5, -0.25]],
            "intercept": [0.1]
        }"#;
        let artifact: ModelArtifact = serde_json::from_str(json).unwrap();
        assert_eq!(artifact.kind(), ModelKind::LogisticRegression);
        assert_eq!(artifact.n_features(), 2);
        assert_eq!(artifact.first_coefficients(), Some(&[0.5, -0.25][..]));

        let json = r#"{
            "kind": "xgboost",
            "n_features": 1,
            "trees": [{"feature": 0, "threshold": 0.5, "left": {"value": -1}, "right": {"value": 1}}]
        }"#;
        let artifact: ModelArtifact = serde_json::from_str(json).unwrap();
        assert_eq!(artifact.kind(), ModelKind::XGBoost);
        assert!(artifact.validate().is_ok());
    }

    #[test]
    fn importance_follows_capability_tag() {
        let artifact = ModelArtifact::RandomForest(RandomForest {
            n_features: 2,
            trees: vec![TreeNode::split(1, 0.5, TreeNode::leaf(0.0), TreeNode::leaf(1.0))],
            feature_importances: None,
        });

        let tree_based = LoadedModel::new(ModelName::RandomForest, Capability::TreeBased, artifact.clone());
        assert_eq!(tree_based.feature_importance(), Some(vec![0.0, 1.0]));

        let other = LoadedModel::new(ModelName::RandomForest, Capability::Other, artifact);
        assert_eq!(other.feature_importance(), None);
        assert_eq!(other.predict(array![0.0, 1.0].view()), 1);
    }
}
