/// Оценка моделей на отложенной выборке

pub mod dataset;
pub mod evaluator;
pub mod metrics;
pub mod plot;

pub use dataset::TestSet;
pub use evaluator::{evaluate, EvaluationCache, EvaluationResult};
pub use metrics::{accuracy_score, auc, roc_curve, RocCurve};
pub use plot::render_roc_curve_base64;
