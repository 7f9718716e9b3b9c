//! Дерево решений из артефакта

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

fn default_gain() -> f64 {
    1.0
}

/// Узел дерева: `x[feature] <= threshold` уходит влево.
///
/// Разбиение пробуется первым: узел с потомками остается разбиением,
/// даже если экспорт записал в него и `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        /// Прирост качества от разбиения (для важности признаков)
        #[serde(default = "default_gain")]
        gain: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
    Leaf {
        value: f64,
    },
}

impl TreeNode {
    pub fn leaf(value: f64) -> Self {
        TreeNode::Leaf { value }
    }

    pub fn split(feature: usize, threshold: f64, left: TreeNode, right: TreeNode) -> Self {
        TreeNode::Split {
            feature,
            threshold,
            gain: default_gain(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Значение листа, в который попадает образец
    pub fn predict_single(&self, sample: ArrayView1<f64>) -> f64 {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if sample[*feature] <= *threshold {
                        &**left
                    } else {
                        &**right
                    };
                }
            }
        }
    }

    /// Суммирует прирост по признакам в `totals`
    pub fn accumulate_gain(&self, totals: &mut [f64]) {
        if let TreeNode::Split {
            feature,
            gain,
            left,
            right,
            ..
        } = self
        {
            if let Some(total) = totals.get_mut(*feature) {
                *total += gain.max(0.0);
            }
            left.accumulate_gain(totals);
            right.accumulate_gain(totals);
        }
    }

    /// Проверка индексов признаков и конечности чисел
    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        match self {
            TreeNode::Leaf { value } => {
                if value.is_finite() {
                    Ok(())
                } else {
                    Err("leaf value must be finite".to_string())
                }
            }
            TreeNode::Split {
                feature,
                threshold,
                gain,
                left,
                right,
            } => {
                if *feature >= n_features {
                    return Err(format!(
                        "split on feature {} but the model has {} features",
                        feature, n_features
                    ));
                }
                if threshold.is_nan() || !gain.is_finite() {
                    return Err(format!("split on feature {} has an invalid threshold or gain", feature));
                }
                left.validate(n_features)?;
                right.validate(n_features)
            }
        }
    }

    /// Проверка для деревьев-классификаторов: листья содержат метку 0 или 1
    pub fn validate_class_leaves(&self) -> Result<(), String> {
        match self {
            TreeNode::Leaf { value } if *value == 0.0 || *value == 1.0 => Ok(()),
            TreeNode::Leaf { value } => Err(format!("leaf class must be 0 or 1, got {}", value)),
            TreeNode::Split { left, right, .. } => {
                left.validate_class_leaves()?;
                right.validate_class_leaves()
            }
        }
    }
}

/// Нормированная сумма прироста по всем деревьям ансамбля
pub fn gain_importances<'a>(trees: impl IntoIterator<Item = &'a TreeNode>, n_features: usize) -> Vec<f64> {
    let mut totals = vec![0.0; n_features];
    for tree in trees {
        tree.accumulate_gain(&mut totals);
    }
    let sum: f64 = totals.iter().sum();
    if sum > 0.0 {
        for v in &mut totals {
            *v /= sum;
        }
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn stump() -> TreeNode {
        TreeNode::split(1, 0.5, TreeNode::leaf(-1.0), TreeNode::leaf(2.0))
    }

    #[test]
    fn threshold_is_inclusive_on_the_left() {
        let tree = stump();
        assert_eq!(tree.predict_single(array![9.0, 0.5].view()), -1.0);
        assert_eq!(tree.predict_single(array![9.0, 0.51].view()), 2.0);
    }

    #[test]
    fn parses_nested_json_nodes() {
        let json = r#"{
            "feature": 0, "threshold": 1.5, "gain": 4.0,
            "left": {"value": 0.1},
            "right": {"feature": 1, "threshold": 0.0, "left": {"value": 0.2}, "right": {"value": 0.3}}
        }"#;
        let tree: TreeNode = serde_json::from_str(json).unwrap();
        assert_eq!(tree.predict_single(array![2.0, 1.0].view()), 0.3);
        assert!(tree.validate(2).is_ok());
        assert!(tree.validate(1).is_err());
    }

    #[test]
    fn gain_importances_are_normalized() {
        let json = r#"{
            "feature": 0, "threshold": 1.5, "gain": 3.0,
            "left": {"value": 0.0},
            "right": {"feature": 2, "threshold": 0.0, "gain": 1.0, "left": {"value": 0.0}, "right": {"value": 1.0}}
        }"#;
        let tree: TreeNode = serde_json::from_str(json).unwrap();
        let importances = gain_importances([&tree], 3);
        assert_eq!(importances, vec![0.75, 0.0, 0.25]);
    }

    #[test]
    fn split_with_value_key_stays_a_split() {
        let json = r#"{
            "feature": 0, "threshold": 0.5, "value": 0.37,
            "left": {"value": 0.1}, "right": {"value": 0.9}
        }"#;
        let tree: TreeNode = serde_json::from_str(json).unwrap();
        assert!(matches!(tree, TreeNode::Split { feature: 0, .. }));
        assert_eq!(tree.predict_single(array![1.0].view()), 0.9);
    }

    #[test]
    fn class_leaves_must_be_binary() {
        assert!(TreeNode::split(0, 0.0, TreeNode::leaf(0.0), TreeNode::leaf(1.0))
            .validate_class_leaves()
            .is_ok());
        assert!(stump().validate_class_leaves().is_err());
    }
}
