//! Ансамбли деревьев: градиентный бустинг, случайный лес, XGBoost, AdaBoost

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::models::tree::{gain_importances, TreeNode};
use crate::models::{sigmoid, Classifier};

/// Градиентный бустинг: p1 = sigmoid(init + learning_rate * Σ tree(x))
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoosting {
    pub n_features: usize,
    /// Начальное приближение в log-odds
    pub init: f64,
    pub learning_rate: f64,
    pub trees: Vec<TreeNode>,
    #[serde(default)]
    pub feature_importances: Option<Vec<f64>>,
}

/// Случайный лес: листья хранят долю положительного класса, ответ усредняется
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    pub trees: Vec<TreeNode>,
    #[serde(default)]
    pub feature_importances: Option<Vec<f64>>,
}

/// XGBoost: p1 = sigmoid(base_margin + Σ tree(x)), eta уже учтен в листьях
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XGBoost {
    pub n_features: usize,
    #[serde(default)]
    pub base_margin: f64,
    pub trees: Vec<TreeNode>,
    #[serde(default)]
    pub feature_importances: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedEstimator {
    pub weight: f64,
    /// Листья содержат предсказанный класс (0 или 1)
    pub tree: TreeNode,
}

/// AdaBoost (SAMME, два класса)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaBoost {
    pub n_features: usize,
    pub estimators: Vec<WeightedEstimator>,
    #[serde(default)]
    pub feature_importances: Option<Vec<f64>>,
}

fn validate_trees<'a>(
    trees: impl IntoIterator<Item = &'a TreeNode>,
    n_features: usize,
) -> Result<(), String> {
    let mut count = 0;
    for (i, tree) in trees.into_iter().enumerate() {
        tree.validate(n_features).map_err(|e| format!("tree {}: {}", i, e))?;
        count += 1;
    }
    if count == 0 {
        return Err("ensemble has no trees".to_string());
    }
    Ok(())
}

fn validate_importances(importances: &Option<Vec<f64>>, n_features: usize) -> Result<(), String> {
    match importances {
        Some(values) if values.len() != n_features => Err(format!(
            "feature_importances has {} values, expected {}",
            values.len(),
            n_features
        )),
        Some(values) if values.iter().any(|v| !v.is_finite()) => {
            Err("feature_importances must be finite".to_string())
        }
        _ => Ok(()),
    }
}

/// Явные важности из артефакта или нормированный прирост по деревьям
fn importances_or_gain<'a>(
    explicit: &Option<Vec<f64>>,
    trees: impl IntoIterator<Item = &'a TreeNode>,
    n_features: usize,
) -> Vec<f64> {
    match explicit {
        Some(values) => values.clone(),
        None => gain_importances(trees, n_features),
    }
}

impl GradientBoosting {
    pub fn feature_importances(&self) -> Vec<f64> {
        importances_or_gain(&self.feature_importances, &self.trees, self.n_features)
    }
}

impl Classifier for GradientBoosting {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn positive_proba(&self, x: ArrayView1<f64>) -> f64 {
        let raw: f64 = self.trees.iter().map(|t| t.predict_single(x)).sum();
        sigmoid(self.init + self.learning_rate * raw)
    }

    fn validate(&self) -> Result<(), String> {
        if !self.init.is_finite() || !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err("init and learning_rate must be finite, learning_rate > 0".to_string());
        }
        validate_trees(&self.trees, self.n_features)?;
        validate_importances(&self.feature_importances, self.n_features)
    }
}

impl RandomForest {
    pub fn feature_importances(&self) -> Vec<f64> {
        importances_or_gain(&self.feature_importances, &self.trees, self.n_features)
    }
}

impl Classifier for RandomForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn positive_proba(&self, x: ArrayView1<f64>) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.predict_single(x)).sum();
        total / self.trees.len() as f64
    }

    fn validate(&self) -> Result<(), String> {
        validate_trees(&self.trees, self.n_features)?;
        validate_importances(&self.feature_importances, self.n_features)
    }
}

impl XGBoost {
    pub fn feature_importances(&self) -> Vec<f64> {
        importances_or_gain(&self.feature_importances, &self.trees, self.n_features)
    }
}

impl Classifier for XGBoost {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn positive_proba(&self, x: ArrayView1<f64>) -> f64 {
        let margin: f64 = self.trees.iter().map(|t| t.predict_single(x)).sum();
        sigmoid(self.base_margin + margin)
    }

    fn validate(&self) -> Result<(), String> {
        if !self.base_margin.is_finite() {
            return Err("base_margin must be finite".to_string());
        }
        validate_trees(&self.trees, self.n_features)?;
        validate_importances(&self.feature_importances, self.n_features)
    }
}

impl AdaBoost {
    pub fn feature_importances(&self) -> Vec<f64> {
        match self.feature_importances {
            Some(ref values) => values.clone(),
            None => {
                // Прирост каждого дерева взвешивается весом оценщика
                let mut totals = vec![0.0; self.n_features];
                for estimator in &self.estimators {
                    let tree_importances = gain_importances([&estimator.tree], self.n_features);
                    for (total, v) in totals.iter_mut().zip(tree_importances) {
                        *total += estimator.weight * v;
                    }
                }
                let sum: f64 = totals.iter().sum();
                if sum > 0.0 {
                    for v in &mut totals {
                        *v /= sum;
                    }
                }
                totals
            }
        }
    }

    /// Взвешенное голосование, нормированное на сумму весов: Σ w·(±1) / Σ w
    pub fn decision_function(&self, x: ArrayView1<f64>) -> f64 {
        let weight_sum: f64 = self.estimators.iter().map(|e| e.weight).sum();
        let votes: f64 = self
            .estimators
            .iter()
            .map(|e| {
                let vote = if e.tree.predict_single(x) >= 0.5 { 1.0 } else { -1.0 };
                e.weight * vote
            })
            .sum();
        votes / weight_sum
    }
}

impl Classifier for AdaBoost {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn positive_proba(&self, x: ArrayView1<f64>) -> f64 {
        // softmax([-d/2, d/2]) для двух классов
        sigmoid(self.decision_function(x))
    }

    fn validate(&self) -> Result<(), String> {
        if self.estimators.is_empty() {
            return Err("ensemble has no estimators".to_string());
        }
        for (i, estimator) in self.estimators.iter().enumerate() {
            if !estimator.weight.is_finite() || estimator.weight <= 0.0 {
                return Err(format!("estimator {} has a non-positive weight", i));
            }
            estimator
                .tree
                .validate(self.n_features)
                .and_then(|_| estimator.tree.validate_class_leaves())
                .map_err(|e| format!("estimator {}: {}", i, e))?;
        }
        validate_importances(&self.feature_importances, self.n_features)
    }
}
