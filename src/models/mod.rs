/// Модели классификации и их реестр

pub mod artifact;
pub mod ensemble;
pub mod linear;
pub mod predictor;
pub mod registry;
pub mod tree;

use ndarray::ArrayView1;

pub use artifact::{LoadedModel, ModelArtifact};
pub use predictor::{predict, Prediction};
pub use registry::{ArtifactSource, FsArtifactSource, ModelRegistry, StaticArtifactSource};

/// Бинарный классификатор над закодированным вектором признаков
pub trait Classifier {
    fn n_features(&self) -> usize;

    /// Вероятность положительного класса
    fn positive_proba(&self, x: ArrayView1<f64>) -> f64;

    /// Проверка согласованности артефакта после загрузки
    fn validate(&self) -> Result<(), String>;

    fn predict_proba(&self, x: ArrayView1<f64>) -> [f64; 2] {
        let p1 = self.positive_proba(x).clamp(0.0, 1.0);
        [1.0 - p1, p1]
    }

    /// argmax по вероятностям, при равенстве класс 0
    fn predict(&self, x: ArrayView1<f64>) -> u8 {
        let [p0, p1] = self.predict_proba(x);
        if p1 > p0 {
            1
        } else {
            0
        }
    }
}

/// Численно устойчивая логистическая функция
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}
