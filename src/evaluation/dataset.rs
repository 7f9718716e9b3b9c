//! Отложенная тестовая выборка

use std::io::Read;
use std::path::Path;

use ndarray::{Array2, ArrayView1};
use serde_json::{Map, Value};

use crate::error::DatasetError;
use crate::preprocessing::FeatureEncoder;
use crate::types::{SessionRecord, FEATURE_NAMES};

/// Колонка с целевой переменной
pub const LABEL_COLUMN: &str = "Revenue";

/// Тестовая выборка, закодированная тем же энкодером, что и запросы API
#[derive(Debug, Clone)]
pub struct TestSet {
    features: Array2<f64>,
    labels: Vec<u8>,
}

impl TestSet {
    pub fn new(features: Array2<f64>, labels: Vec<u8>) -> Result<Self, DatasetError> {
        if labels.is_empty() || features.nrows() == 0 {
            return Err(DatasetError::Empty);
        }
        if features.nrows() != labels.len() {
            return Err(DatasetError::LengthMismatch {
                rows: features.nrows(),
                labels: labels.len(),
            });
        }

        let positives = labels.iter().filter(|&&y| y == 1).count();
        if positives == 0 || positives == labels.len() {
            return Err(DatasetError::SingleClass);
        }

        Ok(Self { features, labels })
    }

    pub fn from_records(
        records: &[(SessionRecord, u8)],
        encoder: &FeatureEncoder,
    ) -> Result<Self, DatasetError> {
        let mut features = Array2::zeros((records.len(), encoder.dim()));
        let mut labels = Vec::with_capacity(records.len());

        for (row, (record, label)) in records.iter().enumerate() {
            let encoded = encoder
                .encode(record)
                .map_err(|source| DatasetError::Encoding { row, source })?;
            features.row_mut(row).assign(&encoded);
            labels.push(*label);
        }

        Self::new(features, labels)
    }

    /// CSV с заголовком: 17 полей сессии и `Revenue` (true/false или 1/0)
    pub fn from_csv<R: Read>(reader: R, encoder: &FeatureEncoder) -> Result<Self, DatasetError> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = csv_reader.headers()?.clone();

        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
        };
        let feature_columns = FEATURE_NAMES
            .iter()
            .map(|&name| column(name).map(|idx| (name, idx)))
            .collect::<Result<Vec<_>, _>>()?;
        let label_column = column(LABEL_COLUMN)?;

        let mut records = Vec::new();
        for (row, result) in csv_reader.records().enumerate() {
            let csv_record = result?;

            // Значения идут через тот же разбор, что и JSON запросов
            let fields: Map<String, Value> = feature_columns
                .iter()
                .map(|(name, idx)| {
                    (
                        name.to_string(),
                        Value::String(csv_record.get(*idx).unwrap_or_default().to_string()),
                    )
                })
                .collect();
            let record = SessionRecord::from_fields(&fields)
                .map_err(|source| DatasetError::Row { row, source })?;

            let raw_label = csv_record.get(label_column).unwrap_or_default();
            let label = parse_label(raw_label).ok_or_else(|| DatasetError::Label {
                row,
                value: raw_label.to_string(),
            })?;

            records.push((record, label));
        }

        Self::from_records(&records, encoder)
    }

    pub fn load(path: &Path, encoder: &FeatureEncoder) -> Result<Self, DatasetError> {
        let file = std::fs::File::open(path).map_err(csv::Error::from)?;
        Self::from_csv(file, encoder)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    pub fn rows(&self) -> impl Iterator<Item = ArrayView1<'_, f64>> {
        self.features.rows().into_iter()
    }
}

fn parse_label(raw: &str) -> Option<u8> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "1.0" => Some(1),
        "false" | "0" | "0.0" => Some(0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::EncoderLayout;

    const HEADER: &str = "Administrative,Administrative_Duration,Informational,Informational_Duration,\
ProductRelated,ProductRelated_Duration,BounceRates,ExitRates,PageValues,SpecialDay,Month,\
OperatingSystems,Browser,Region,TrafficType,VisitorType,Weekend,Revenue";

    fn encoder() -> FeatureEncoder {
        FeatureEncoder::new(EncoderLayout::default()).unwrap()
    }

    #[test]
    fn loads_and_encodes_rows() {
        let csv = format!(
            "{}\n0,0,0,0,1,0,0.2,0.2,0,0,Feb,1,1,1,1,Returning_Visitor,FALSE,FALSE\n\
             3,120.5,1,10,40,1500,0.01,0.02,35.2,0,Nov,2,2,3,2,New_Visitor,TRUE,TRUE\n",
            HEADER
        );
        let test_set = TestSet::from_csv(csv.as_bytes(), &encoder()).unwrap();
        assert_eq!(test_set.len(), 2);
        assert_eq!(test_set.labels(), &[0, 1]);
        assert_eq!(test_set.n_features(), encoder().dim());

        let second = test_set.rows().nth(1).unwrap();
        assert_eq!(second[8], 35.2);
        assert_eq!(second[test_set.n_features() - 1], 1.0);
    }

    #[test]
    fn rejects_single_class_and_missing_columns() {
        let csv = format!(
            "{}\n0,0,0,0,1,0,0.2,0.2,0,0,Feb,1,1,1,1,Returning_Visitor,false,0\n",
            HEADER
        );
        assert!(matches!(
            TestSet::from_csv(csv.as_bytes(), &encoder()),
            Err(DatasetError::SingleClass)
        ));

        let csv = "Administrative,Revenue\n0,1\n";
        assert!(matches!(
            TestSet::from_csv(csv.as_bytes(), &encoder()),
            Err(DatasetError::MissingColumn(column)) if column == "Administrative_Duration"
        ));
    }

    #[test]
    fn reports_row_of_unencodable_value() {
        let csv = format!(
            "{}\n0,0,0,0,1,0,0.2,0.2,0,0,Feb,1,1,1,1,Returning_Visitor,false,0\n\
             0,0,0,0,1,0,0.2,0.2,0,0,Smarch,1,1,1,1,Returning_Visitor,false,1\n",
            HEADER
        );
        assert!(matches!(
            TestSet::from_csv(csv.as_bytes(), &encoder()),
            Err(DatasetError::Encoding { row: 1, .. })
        ));
    }
}
