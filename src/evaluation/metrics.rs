//! Метрики качества бинарного классификатора

use serde::{Deserialize, Serialize};

/// Точки ROC кривой; первая точка (0, 0) с порогом +inf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    pub thresholds: Vec<f64>,
}

impl RocCurve {
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.fpr.iter().copied().zip(self.tpr.iter().copied())
    }
}

/// Доля точных совпадений
pub fn accuracy_score(y_true: &[u8], y_pred: &[u8]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    correct as f64 / y_true.len() as f64
}

/// Перебор всех различных порогов по убыванию оценки.
///
/// Если в выборке нет одного из классов, соответствующая ось остается нулевой.
pub fn roc_curve(y_true: &[u8], scores: &[f64]) -> RocCurve {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let positives = y_true.iter().filter(|&&y| y == 1).count() as f64;
    let negatives = y_true.len() as f64 - positives;

    let mut fpr = vec![0.0];
    let mut tpr = vec![0.0];
    let mut thresholds = vec![f64::INFINITY];

    let mut tp = 0.0;
    let mut fp = 0.0;
    for (pos, &i) in order.iter().enumerate() {
        if y_true[i] == 1 {
            tp += 1.0;
        } else {
            fp += 1.0;
        }

        // Точка добавляется только на границе группы одинаковых оценок
        let last_of_group = order
            .get(pos + 1)
            .map_or(true, |&next| scores[next] != scores[i]);
        if last_of_group {
            fpr.push(if negatives > 0.0 { fp / negatives } else { 0.0 });
            tpr.push(if positives > 0.0 { tp / positives } else { 0.0 });
            thresholds.push(scores[i]);
        }
    }

    RocCurve {
        fpr,
        tpr,
        thresholds,
    }
}

/// Площадь методом трапеций
pub fn auc(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[1] + ys[0]) / 2.0)
        .sum()
}
