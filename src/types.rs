/// Типы данных сервиса

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;

/// Поля сессии в том порядке, в котором их ожидает API
pub const FEATURE_NAMES: [&str; 17] = [
    "Administrative",
    "Administrative_Duration",
    "Informational",
    "Informational_Duration",
    "ProductRelated",
    "ProductRelated_Duration",
    "BounceRates",
    "ExitRates",
    "PageValues",
    "SpecialDay",
    "Month",
    "OperatingSystems",
    "Browser",
    "Region",
    "TrafficType",
    "VisitorType",
    "Weekend",
];

/// Числовые поля (первые 10 в FEATURE_NAMES)
pub const NUMERIC_FEATURES: [&str; 10] = [
    "Administrative",
    "Administrative_Duration",
    "Informational",
    "Informational_Duration",
    "ProductRelated",
    "ProductRelated_Duration",
    "BounceRates",
    "ExitRates",
    "PageValues",
    "SpecialDay",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(rename = "Administrative")]
    pub administrative: f64,
    #[serde(rename = "Administrative_Duration")]
    pub administrative_duration: f64,
    #[serde(rename = "Informational")]
    pub informational: f64,
    #[serde(rename = "Informational_Duration")]
    pub informational_duration: f64,
    #[serde(rename = "ProductRelated")]
    pub product_related: f64,
    #[serde(rename = "ProductRelated_Duration")]
    pub product_related_duration: f64,
    #[serde(rename = "BounceRates")]
    pub bounce_rates: f64, // 0-1
    #[serde(rename = "ExitRates")]
    pub exit_rates: f64, // 0-1
    #[serde(rename = "PageValues")]
    pub page_values: f64,
    #[serde(rename = "SpecialDay")]
    pub special_day: f64, // 0-1
    #[serde(rename = "Month")]
    pub month: String,
    #[serde(rename = "OperatingSystems")]
    pub operating_systems: i64,
    #[serde(rename = "Browser")]
    pub browser: i64,
    #[serde(rename = "Region")]
    pub region: i64,
    #[serde(rename = "TrafficType")]
    pub traffic_type: i64,
    #[serde(rename = "VisitorType")]
    pub visitor_type: String,
    #[serde(rename = "Weekend")]
    pub weekend: bool,
}

impl SessionRecord {
    /// Разбор записи из JSON-объекта с приведением типов.
    ///
    /// Сначала проверяется наличие всех 17 полей (в документированном порядке),
    /// затем значения и их диапазоны.
    pub fn from_fields(fields: &Map<String, Value>) -> Result<Self, ValidationError> {
        if let Some(missing) = FEATURE_NAMES.iter().find(|name| !fields.contains_key(**name)) {
            return Err(ValidationError::MissingField(*missing));
        }

        Ok(Self {
            administrative: non_negative(fields, "Administrative")?,
            administrative_duration: non_negative(fields, "Administrative_Duration")?,
            informational: non_negative(fields, "Informational")?,
            informational_duration: non_negative(fields, "Informational_Duration")?,
            product_related: non_negative(fields, "ProductRelated")?,
            product_related_duration: non_negative(fields, "ProductRelated_Duration")?,
            bounce_rates: fraction(fields, "BounceRates")?,
            exit_rates: fraction(fields, "ExitRates")?,
            page_values: non_negative(fields, "PageValues")?,
            special_day: fraction(fields, "SpecialDay")?,
            month: text(fields, "Month")?,
            operating_systems: code(fields, "OperatingSystems")?,
            browser: code(fields, "Browser")?,
            region: code(fields, "Region")?,
            traffic_type: code(fields, "TrafficType")?,
            visitor_type: text(fields, "VisitorType")?,
            weekend: flag(fields, "Weekend")?,
        })
    }

    /// Числовые признаки в порядке NUMERIC_FEATURES
    pub fn numeric_values(&self) -> [f64; 10] {
        [
            self.administrative,
            self.administrative_duration,
            self.informational,
            self.informational_duration,
            self.product_related,
            self.product_related_duration,
            self.bounce_rates,
            self.exit_rates,
            self.page_values,
            self.special_day,
        ]
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidField {
        field,
        reason: reason.into(),
    }
}

fn value<'a>(fields: &'a Map<String, Value>, field: &'static str) -> Result<&'a Value, ValidationError> {
    match fields.get(field) {
        None => Err(ValidationError::MissingField(field)),
        Some(Value::Null) => Err(invalid(field, "must not be null")),
        Some(v) => Ok(v),
    }
}

fn number(fields: &Map<String, Value>, field: &'static str) -> Result<f64, ValidationError> {
    let parsed = match value(fields, field)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        Some(_) => Err(invalid(field, "must be a finite number")),
        None => Err(invalid(field, "expected a number")),
    }
}

fn non_negative(fields: &Map<String, Value>, field: &'static str) -> Result<f64, ValidationError> {
    let v = number(fields, field)?;
    if v < 0.0 {
        return Err(invalid(field, format!("must be >= 0, got {}", v)));
    }
    Ok(v)
}

fn fraction(fields: &Map<String, Value>, field: &'static str) -> Result<f64, ValidationError> {
    let v = number(fields, field)?;
    if !(0.0..=1.0).contains(&v) {
        return Err(invalid(field, format!("must be within [0, 1], got {}", v)));
    }
    Ok(v)
}

fn code(fields: &Map<String, Value>, field: &'static str) -> Result<i64, ValidationError> {
    let v = number(fields, field)?;
    if v.fract() != 0.0 {
        return Err(invalid(field, format!("expected an integer code, got {}", v)));
    }
    Ok(v as i64)
}

fn text(fields: &Map<String, Value>, field: &'static str) -> Result<String, ValidationError> {
    match value(fields, field)? {
        Value::String(s) => Ok(s.trim().to_string()),
        _ => Err(invalid(field, "expected a string")),
    }
}

fn flag(fields: &Map<String, Value>, field: &'static str) -> Result<bool, ValidationError> {
    match value(fields, field)? {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_f64() {
            Some(v) if v == 0.0 => Ok(false),
            Some(v) if v == 1.0 => Ok(true),
            _ => Err(invalid(field, "expected a boolean")),
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(invalid(field, "expected a boolean")),
        },
        _ => Err(invalid(field, "expected a boolean")),
    }
}

/// Имена моделей из фиксированного списка
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelName {
    #[serde(rename = "Gradient_Boosting")]
    GradientBoosting,
    #[serde(rename = "Random_Forest")]
    RandomForest,
    #[serde(rename = "XGBoost")]
    XGBoost,
    #[serde(rename = "Adaboost")]
    Adaboost,
    #[serde(rename = "Logistic_Regression")]
    LogisticRegression,
}

impl ModelName {
    pub const ALL: [ModelName; 5] = [
        ModelName::GradientBoosting,
        ModelName::RandomForest,
        ModelName::XGBoost,
        ModelName::Adaboost,
        ModelName::LogisticRegression,
    ];

    pub const DEFAULT: ModelName = ModelName::GradientBoosting;

    pub fn as_str(self) -> &'static str {
        match self {
            ModelName::GradientBoosting => "Gradient_Boosting",
            ModelName::RandomForest => "Random_Forest",
            ModelName::XGBoost => "XGBoost",
            ModelName::Adaboost => "Adaboost",
            ModelName::LogisticRegression => "Logistic_Regression",
        }
    }

    pub fn allowed() -> Vec<&'static str> {
        Self::ALL.iter().map(|n| n.as_str()).collect()
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|n| n.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidModelName {
                given: s.to_string(),
                allowed: Self::allowed(),
            })
    }
}

/// Семейство модели, фиксируется при регистрации артефакта
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    GradientBoosting,
    RandomForest,
    #[serde(rename = "xgboost")]
    XGBoost,
    #[serde(rename = "adaboost")]
    AdaBoost,
    LogisticRegression,
}

impl ModelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelKind::GradientBoosting => "gradient_boosting",
            ModelKind::RandomForest => "random_forest",
            ModelKind::XGBoost => "xgboost",
            ModelKind::AdaBoost => "adaboost",
            ModelKind::LogisticRegression => "logistic_regression",
        }
    }

    pub fn capability(self) -> Capability {
        match self {
            ModelKind::GradientBoosting
            | ModelKind::RandomForest
            | ModelKind::XGBoost
            | ModelKind::AdaBoost => Capability::TreeBased,
            ModelKind::LogisticRegression => Capability::LinearBased,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Откуда берется важность признаков
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Вектор важностей деревьев
    TreeBased,
    /// Коэффициенты линейной модели (первый класс)
    LinearBased,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionOutput {
    pub prediction: u8,
    pub confidence: f64,
    pub result: String,
    pub session_data: Map<String, Value>,
    pub model_name: ModelName,
    pub accuracy: f64,
    pub roc_auc: f64,
    pub roc_curve_base64: String,
    pub feature_importance: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub roc_auc: f64,
}

pub type MetricsOutput = BTreeMap<String, ModelMetrics>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthOutput {
    pub status: String,
    pub timestamp: String,
    pub model_loaded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturesOutput {
    pub features: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: ModelName,
    pub kind: ModelKind,
    pub capability: Capability,
    pub loaded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsOutput {
    pub default: ModelName,
    pub models: Vec<ModelInfo>,
    /// Имена закодированных признаков, в порядке `feature_importance`
    pub feature_names: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Map<String, Value> {
        json!({
            "Administrative": 0, "Administrative_Duration": 0, "Informational": 0,
            "Informational_Duration": 0, "ProductRelated": 1, "ProductRelated_Duration": 0,
            "BounceRates": 0.2, "ExitRates": 0.2, "PageValues": 0, "SpecialDay": 0,
            "Month": "Feb", "OperatingSystems": 1, "Browser": 1, "Region": 1,
            "TrafficType": 1, "VisitorType": "Returning_Visitor", "Weekend": false
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn parses_complete_record() {
        let record = SessionRecord::from_fields(&sample()).unwrap();
        assert_eq!(record.product_related, 1.0);
        assert_eq!(record.month, "Feb");
        assert_eq!(record.operating_systems, 1);
        assert!(!record.weekend);
        assert_eq!(record.numeric_values()[6], 0.2);
    }

    #[test]
    fn reports_each_missing_field_by_name() {
        for name in FEATURE_NAMES {
            let mut fields = sample();
            fields.remove(name);
            assert_eq!(
                SessionRecord::from_fields(&fields),
                Err(ValidationError::MissingField(name))
            );
        }
    }

    #[test]
    fn coerces_strings_and_numeric_flags() {
        let mut fields = sample();
        fields.insert("PageValues".into(), json!("12.5"));
        fields.insert("Browser".into(), json!("2"));
        fields.insert("Weekend".into(), json!("TRUE"));
        let record = SessionRecord::from_fields(&fields).unwrap();
        assert_eq!(record.page_values, 12.5);
        assert_eq!(record.browser, 2);
        assert!(record.weekend);

        fields.insert("Weekend".into(), json!(0));
        assert!(!SessionRecord::from_fields(&fields).unwrap().weekend);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut fields = sample();
        fields.insert("ExitRates".into(), json!(1.5));
        assert!(matches!(
            SessionRecord::from_fields(&fields),
            Err(ValidationError::InvalidField { field: "ExitRates", .. })
        ));

        let mut fields = sample();
        fields.insert("Administrative".into(), json!(-1));
        assert!(matches!(
            SessionRecord::from_fields(&fields),
            Err(ValidationError::InvalidField { field: "Administrative", .. })
        ));

        let mut fields = sample();
        fields.insert("Region".into(), json!(1.5));
        assert!(matches!(
            SessionRecord::from_fields(&fields),
            Err(ValidationError::InvalidField { field: "Region", .. })
        ));

        let mut fields = sample();
        fields.insert("Month".into(), Value::Null);
        assert!(matches!(
            SessionRecord::from_fields(&fields),
            Err(ValidationError::InvalidField { field: "Month", .. })
        ));
    }

    #[test]
    fn model_names_round_trip_and_reject_unknown() {
        for name in ModelName::ALL {
            assert_eq!(name.as_str().parse::<ModelName>(), Ok(name));
        }
        let err = "SVM".parse::<ModelName>().unwrap_err();
        let message = err.to_string();
        for allowed in ModelName::allowed() {
            assert!(message.contains(allowed), "{} not listed in {}", allowed, message);
        }
    }

    #[test]
    fn capability_follows_kind() {
        assert_eq!(ModelKind::XGBoost.capability(), Capability::TreeBased);
        assert_eq!(ModelKind::LogisticRegression.capability(), Capability::LinearBased);
        assert_eq!(serde_json::to_value(ModelKind::AdaBoost).unwrap(), json!("adaboost"));
    }
}
