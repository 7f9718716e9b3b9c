//! Стандартизация числовых признаков

use ndarray::{Array1, ArrayViewMut1};
use serde::{Deserialize, Serialize};

use crate::error::EncodingError;

/// Параметры, сохраненные при обучении: (x - mean) / scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingParams {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

pub struct DataNormalizer {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl DataNormalizer {
    pub fn from_params(params: &ScalingParams, n_features: usize) -> Result<Self, EncodingError> {
        if params.mean.len() != n_features || params.scale.len() != n_features {
            return Err(EncodingError::InvalidLayout(format!(
                "scaling expects {} means and scales, got {} and {}",
                n_features,
                params.mean.len(),
                params.scale.len()
            )));
        }

        // Нулевой масштаб недопустим: деление на ноль
        if let Some(i) = params
            .scale
            .iter()
            .position(|s| !s.is_finite() || s.abs() < 1e-12)
        {
            return Err(EncodingError::InvalidLayout(format!(
                "scale for feature {} must be a non-zero finite number",
                i
            )));
        }
        if params.mean.iter().any(|m| !m.is_finite()) {
            return Err(EncodingError::InvalidLayout("scaling means must be finite".to_string()));
        }

        Ok(Self {
            mean: Array1::from(params.mean.clone()),
            scale: Array1::from(params.scale.clone()),
        })
    }

    pub fn transform_in_place(&self, mut row: ArrayViewMut1<f64>) {
        for (i, val) in row.iter_mut().enumerate() {
            *val = (*val - self.mean[i]) / self.scale[i];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn standardizes_each_column() {
        let params = ScalingParams {
            mean: vec![1.0, 10.0],
            scale: vec![2.0, 5.0],
        };
        let normalizer = DataNormalizer::from_params(&params, 2).unwrap();
        let mut row = array![3.0, 0.0];
        normalizer.transform_in_place(row.view_mut());
        assert_eq!(row, array![1.0, -2.0]);
    }

    #[test]
    fn rejects_zero_scale_and_wrong_length() {
        let zero = ScalingParams {
            mean: vec![0.0],
            scale: vec![0.0],
        };
        assert!(DataNormalizer::from_params(&zero, 1).is_err());

        let short = ScalingParams {
            mean: vec![0.0],
            scale: vec![1.0],
        };
        assert!(DataNormalizer::from_params(&short, 2).is_err());
    }
}
