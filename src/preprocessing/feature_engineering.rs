//! Кодирование сессии в вектор признаков модели

use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;

use ndarray::{s, Array1};
use serde::{Deserialize, Serialize};

use crate::error::EncodingError;
use crate::preprocessing::normalization::{DataNormalizer, ScalingParams};
use crate::types::{SessionRecord, NUMERIC_FEATURES};

/// Словари категорий, с которыми обучались модели (preprocessor.json).
///
/// Порядок блоков в векторе фиксирован: числовые признаки, затем one-hot
/// для Month, OperatingSystems, Browser, Region, TrafficType, VisitorType,
/// последним идет Weekend (0/1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderLayout {
    #[serde(default)]
    pub scaling: Option<ScalingParams>,
    pub month: Vec<String>,
    pub operating_systems: Vec<i64>,
    pub browser: Vec<i64>,
    pub region: Vec<i64>,
    pub traffic_type: Vec<i64>,
    pub visitor_type: Vec<String>,
}

impl Default for EncoderLayout {
    fn default() -> Self {
        let month = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];
        Self {
            scaling: None,
            month: month.iter().map(|m| m.to_string()).collect(),
            operating_systems: (1..=8).collect(),
            browser: (1..=13).collect(),
            region: (1..=9).collect(),
            traffic_type: (1..=20).collect(),
            visitor_type: vec![
                "New_Visitor".to_string(),
                "Other".to_string(),
                "Returning_Visitor".to_string(),
            ],
        }
    }
}

pub struct FeatureEncoder {
    layout: EncoderLayout,
    normalizer: Option<DataNormalizer>,
    feature_names: Vec<String>,
}

impl FeatureEncoder {
    pub fn new(layout: EncoderLayout) -> Result<Self, EncodingError> {
        check_vocabulary("Month", &layout.month)?;
        check_vocabulary("OperatingSystems", &layout.operating_systems)?;
        check_vocabulary("Browser", &layout.browser)?;
        check_vocabulary("Region", &layout.region)?;
        check_vocabulary("TrafficType", &layout.traffic_type)?;
        check_vocabulary("VisitorType", &layout.visitor_type)?;

        let normalizer = layout
            .scaling
            .as_ref()
            .map(|params| DataNormalizer::from_params(params, NUMERIC_FEATURES.len()))
            .transpose()?;

        let mut feature_names: Vec<String> = NUMERIC_FEATURES.iter().map(|f| f.to_string()).collect();
        push_names(&mut feature_names, "Month", &layout.month);
        push_names(&mut feature_names, "OperatingSystems", &layout.operating_systems);
        push_names(&mut feature_names, "Browser", &layout.browser);
        push_names(&mut feature_names, "Region", &layout.region);
        push_names(&mut feature_names, "TrafficType", &layout.traffic_type);
        push_names(&mut feature_names, "VisitorType", &layout.visitor_type);
        feature_names.push("Weekend".to_string());

        Ok(Self {
            layout,
            normalizer,
            feature_names,
        })
    }

    /// Длина выходного вектора
    pub fn dim(&self) -> usize {
        self.feature_names.len()
    }

    /// Имена закодированных признаков (например, `Month_Feb`)
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn layout(&self) -> &EncoderLayout {
        &self.layout
    }

    pub fn encode(&self, record: &SessionRecord) -> Result<Array1<f64>, EncodingError> {
        let mut features = Array1::<f64>::zeros(self.dim());

        let numeric = record.numeric_values();
        for (i, value) in numeric.iter().enumerate() {
            features[i] = *value;
        }
        if let Some(ref normalizer) = self.normalizer {
            normalizer.transform_in_place(features.slice_mut(s![..numeric.len()]));

            // Масштабирование огромных значений дает бесконечность
            if let Some(i) = (0..numeric.len()).find(|&i| !features[i].is_finite()) {
                return Err(EncodingError::OutOfRange {
                    field: NUMERIC_FEATURES[i],
                    value: numeric[i],
                });
            }
        }

        let mut offset = numeric.len();
        offset = one_hot(&mut features, offset, "Month", &self.layout.month, &record.month)?;
        offset = one_hot(
            &mut features,
            offset,
            "OperatingSystems",
            &self.layout.operating_systems,
            &record.operating_systems,
        )?;
        offset = one_hot(&mut features, offset, "Browser", &self.layout.browser, &record.browser)?;
        offset = one_hot(&mut features, offset, "Region", &self.layout.region, &record.region)?;
        offset = one_hot(
            &mut features,
            offset,
            "TrafficType",
            &self.layout.traffic_type,
            &record.traffic_type,
        )?;
        offset = one_hot(
            &mut features,
            offset,
            "VisitorType",
            &self.layout.visitor_type,
            &record.visitor_type,
        )?;

        features[offset] = if record.weekend { 1.0 } else { 0.0 };

        Ok(features)
    }
}

fn check_vocabulary<T: Eq + Hash>(field: &str, vocabulary: &[T]) -> Result<(), EncodingError> {
    if vocabulary.is_empty() {
        return Err(EncodingError::InvalidLayout(format!("{} vocabulary is empty", field)));
    }
    let unique: HashSet<&T> = vocabulary.iter().collect();
    if unique.len() != vocabulary.len() {
        return Err(EncodingError::InvalidLayout(format!(
            "{} vocabulary contains duplicates",
            field
        )));
    }
    Ok(())
}

fn push_names<T: Display>(names: &mut Vec<String>, field: &str, vocabulary: &[T]) {
    names.extend(vocabulary.iter().map(|v| format!("{}_{}", field, v)));
}

/// Записывает единицу в позицию категории, возвращает смещение следующего блока
fn one_hot<T: PartialEq + Display>(
    features: &mut Array1<f64>,
    offset: usize,
    field: &'static str,
    vocabulary: &[T],
    value: &T,
) -> Result<usize, EncodingError> {
    let position = vocabulary
        .iter()
        .position(|v| v == value)
        .ok_or_else(|| EncodingError::UnknownCategory {
            field,
            value: value.to_string(),
        })?;
    features[offset + position] = 1.0;
    Ok(offset + vocabulary.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> SessionRecord {
        SessionRecord {
            administrative: 2.0,
            administrative_duration: 30.0,
            informational: 0.0,
            informational_duration: 0.0,
            product_related: 12.0,
            product_related_duration: 400.0,
            bounce_rates: 0.01,
            exit_rates: 0.03,
            page_values: 15.5,
            special_day: 0.0,
            month: "Nov".to_string(),
            operating_systems: 2,
            browser: 2,
            region: 3,
            traffic_type: 4,
            visitor_type: "New_Visitor".to_string(),
            weekend: true,
        }
    }

    #[test]
    fn default_layout_has_expected_width() {
        let encoder = FeatureEncoder::new(EncoderLayout::default()).unwrap();
        assert_eq!(encoder.dim(), 10 + 12 + 8 + 13 + 9 + 20 + 3 + 1);
        assert_eq!(encoder.feature_names()[0], "Administrative");
        assert_eq!(encoder.feature_names()[11], "Month_Feb");
        assert_eq!(encoder.feature_names().last().unwrap(), "Weekend");
    }

    #[test]
    fn encodes_blocks_in_fixed_order() {
        let encoder = FeatureEncoder::new(EncoderLayout::default()).unwrap();
        let x = encoder.encode(&record()).unwrap();
        let names = encoder.feature_names();

        assert_eq!(x[8], 15.5);
        let hot: Vec<&str> = x
            .iter()
            .enumerate()
            .skip(10)
            .filter(|(_, v)| **v == 1.0)
            .map(|(i, _)| names[i].as_str())
            .collect();
        assert_eq!(
            hot,
            vec![
                "Month_Nov",
                "OperatingSystems_2",
                "Browser_2",
                "Region_3",
                "TrafficType_4",
                "VisitorType_New_Visitor",
                "Weekend"
            ]
        );
        assert_eq!(x.iter().skip(10).sum::<f64>(), 7.0);
    }

    #[test]
    fn unseen_category_is_an_error() {
        let encoder = FeatureEncoder::new(EncoderLayout::default()).unwrap();

        let mut unknown_month = record();
        unknown_month.month = "Smarch".to_string();
        assert_eq!(
            encoder.encode(&unknown_month),
            Err(EncodingError::UnknownCategory {
                field: "Month",
                value: "Smarch".to_string()
            })
        );

        let mut unknown_browser = record();
        unknown_browser.browser = 99;
        assert!(matches!(
            encoder.encode(&unknown_browser),
            Err(EncodingError::UnknownCategory { field: "Browser", .. })
        ));
    }

    #[test]
    fn applies_fitted_scaling_to_numeric_block_only() {
        let layout = EncoderLayout {
            scaling: Some(ScalingParams {
                mean: vec![2.0; 10],
                scale: vec![2.0; 10],
            }),
            ..EncoderLayout::default()
        };
        let encoder = FeatureEncoder::new(layout).unwrap();
        let x = encoder.encode(&record()).unwrap();
        assert_eq!(x[0], 0.0);
        assert_eq!(x[4], 5.0);
        assert_eq!(x[encoder.dim() - 1], 1.0);
    }

    #[test]
    fn scaled_overflow_is_reported_by_field() {
        let layout = EncoderLayout {
            scaling: Some(ScalingParams {
                mean: vec![0.0; 10],
                scale: vec![0.5; 10],
            }),
            ..EncoderLayout::default()
        };
        let encoder = FeatureEncoder::new(layout).unwrap();

        let mut huge = record();
        huge.administrative_duration = 1.5e308;
        assert_eq!(
            encoder.encode(&huge),
            Err(EncodingError::OutOfRange {
                field: "Administrative_Duration",
                value: 1.5e308
            })
        );
    }

    #[test]
    fn rejects_duplicate_vocabulary() {
        let layout = EncoderLayout {
            region: vec![1, 1, 2],
            ..EncoderLayout::default()
        };
        assert!(matches!(
            FeatureEncoder::new(layout),
            Err(EncodingError::InvalidLayout(_))
        ));
    }
}
