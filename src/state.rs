//! Контекст сервиса: создается один раз при старте, далее только чтение

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::evaluation::{EvaluationCache, TestSet};
use crate::models::{ArtifactSource, FsArtifactSource, ModelRegistry};
use crate::preprocessing::{EncoderLayout, FeatureEncoder};
use crate::types::ModelName;

#[derive(Clone)]
pub struct ServiceContext {
    pub encoder: Arc<FeatureEncoder>,
    pub registry: Arc<ModelRegistry>,
    pub test_set: Arc<TestSet>,
    pub evaluations: Arc<EvaluationCache>,
    pub expose_traceback: bool,
}

impl ServiceContext {
    pub fn new(
        encoder: FeatureEncoder,
        source: Arc<dyn ArtifactSource>,
        test_set: TestSet,
        expose_traceback: bool,
    ) -> Self {
        let registry = ModelRegistry::new(source, encoder.dim());
        Self {
            encoder: Arc::new(encoder),
            registry: Arc::new(registry),
            test_set: Arc::new(test_set),
            evaluations: Arc::new(EvaluationCache::new()),
            expose_traceback,
        }
    }

    /// Энкодер, тестовая выборка и модель по умолчанию из каталога моделей
    pub async fn from_config(config: &Config) -> Result<Self> {
        let encoder = load_encoder(&config.preprocessor_path)?;
        tracing::info!("Feature encoder ready: {} features", encoder.dim());

        let test_set = TestSet::load(&config.test_set_path, &encoder).with_context(|| {
            format!("Failed to load test set from {}", config.test_set_path.display())
        })?;
        tracing::info!("Test set loaded: {} rows", test_set.len());

        let source = Arc::new(FsArtifactSource::new(&config.model_dir));
        let context = Self::new(encoder, source, test_set, config.expose_traceback());

        // Модель по умолчанию загружается сразу; остальные по первому запросу
        if let Err(e) = context.registry.get(ModelName::DEFAULT).await {
            tracing::warn!("Default model {} failed to load: {:#}", ModelName::DEFAULT, anyhow::Error::new(e));
        }

        Ok(context)
    }
}

fn load_encoder(path: &Path) -> Result<FeatureEncoder> {
    let layout = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str::<EncoderLayout>(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?
    } else {
        tracing::info!(
            "{} not found, using built-in category vocabularies",
            path.display()
        );
        EncoderLayout::default()
    };

    FeatureEncoder::new(layout).context("Invalid encoder layout")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_preprocessor_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let encoder = load_encoder(&dir.path().join("preprocessor.json")).unwrap();
        assert_eq!(encoder.layout(), &EncoderLayout::default());
    }

    #[test]
    fn broken_preprocessor_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preprocessor.json");
        std::fs::write(&path, r#"{"month": []}"#).unwrap();
        assert!(load_encoder(&path).is_err());
    }

    #[tokio::test]
    async fn missing_test_set_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::for_model_dir(dir.path());
        assert!(ServiceContext::from_config(&config).await.is_err());
    }
}
