//! Реестр моделей: фиксированный список имен, ленивая загрузка, кэш на процесс

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::error::RegistryError;
use crate::models::artifact::{LoadedModel, ModelArtifact};
use crate::models::Classifier;
use crate::types::{Capability, ModelKind, ModelName};

/// Ожидаемый тип артефакта для каждого имени
pub const REGISTRATIONS: [(ModelName, ModelKind); 5] = [
    (ModelName::GradientBoosting, ModelKind::GradientBoosting),
    (ModelName::RandomForest, ModelKind::RandomForest),
    (ModelName::XGBoost, ModelKind::XGBoost),
    (ModelName::Adaboost, ModelKind::AdaBoost),
    (ModelName::LogisticRegression, ModelKind::LogisticRegression),
];

/// Источник артефактов (файловая система или память)
pub trait ArtifactSource: Send + Sync {
    fn load(&self, name: ModelName) -> Result<ModelArtifact, RegistryError>;
}

/// `<dir>/<Name>.json`
pub struct FsArtifactSource {
    dir: PathBuf,
}

impl FsArtifactSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, name: ModelName) -> PathBuf {
        self.dir.join(format!("{}.json", name.as_str()))
    }
}

impl ArtifactSource for FsArtifactSource {
    fn load(&self, name: ModelName) -> Result<ModelArtifact, RegistryError> {
        let path = self.path_for(name);
        let bytes = std::fs::read(&path).map_err(|source| RegistryError::Io {
            name,
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| RegistryError::Parse { name, source })
    }
}

/// Артефакты, собранные в памяти
pub struct StaticArtifactSource {
    artifacts: HashMap<ModelName, ModelArtifact>,
}

impl StaticArtifactSource {
    pub fn new(artifacts: impl IntoIterator<Item = (ModelName, ModelArtifact)>) -> Self {
        Self {
            artifacts: artifacts.into_iter().collect(),
        }
    }
}

impl ArtifactSource for StaticArtifactSource {
    fn load(&self, name: ModelName) -> Result<ModelArtifact, RegistryError> {
        self.artifacts
            .get(&name)
            .cloned()
            .ok_or(RegistryError::NotFound { name })
    }
}

struct RegistryEntry {
    kind: ModelKind,
    capability: Capability,
    model: OnceCell<Arc<LoadedModel>>,
}

pub struct ModelRegistry {
    source: Arc<dyn ArtifactSource>,
    n_features: usize,
    entries: HashMap<ModelName, RegistryEntry>,
}

impl ModelRegistry {
    /// `n_features`: ширина вектора энкодера, с которой должен совпадать артефакт
    pub fn new(source: Arc<dyn ArtifactSource>, n_features: usize) -> Self {
        let entries = REGISTRATIONS
            .iter()
            .map(|(name, kind)| {
                (
                    *name,
                    RegistryEntry {
                        kind: *kind,
                        capability: kind.capability(),
                        model: OnceCell::new(),
                    },
                )
            })
            .collect();

        Self {
            source,
            n_features,
            entries,
        }
    }

    fn entry(&self, name: ModelName) -> &RegistryEntry {
        // REGISTRATIONS покрывает все варианты ModelName
        &self.entries[&name]
    }

    pub fn kind(&self, name: ModelName) -> ModelKind {
        self.entry(name).kind
    }

    pub fn capability(&self, name: ModelName) -> Capability {
        self.entry(name).capability
    }

    pub fn is_loaded(&self, name: ModelName) -> bool {
        self.entry(name).model.initialized()
    }

    /// Загрузка с кэшированием; параллельные запросы ждут одну загрузку
    pub async fn get(&self, name: ModelName) -> Result<Arc<LoadedModel>, RegistryError> {
        let entry = self.entry(name);
        entry
            .model
            .get_or_try_init(|| self.load(name, entry.kind, entry.capability))
            .await
            .cloned()
    }

    async fn load(
        &self,
        name: ModelName,
        kind: ModelKind,
        capability: Capability,
    ) -> Result<Arc<LoadedModel>, RegistryError> {
        tracing::info!("Loading model artifact: {}", name);

        let source = Arc::clone(&self.source);
        let artifact = tokio::task::spawn_blocking(move || source.load(name))
            .await
            .map_err(|e| RegistryError::Join {
                name,
                reason: e.to_string(),
            })??;

        if artifact.kind() != kind {
            return Err(RegistryError::KindMismatch {
                name,
                expected: kind,
                found: artifact.kind(),
            });
        }
        if artifact.n_features() != self.n_features {
            return Err(RegistryError::Invalid {
                name,
                reason: format!(
                    "artifact expects {} features, encoder produces {}",
                    artifact.n_features(),
                    self.n_features
                ),
            });
        }
        artifact
            .validate()
            .map_err(|reason| RegistryError::Invalid { name, reason })?;

        tracing::info!("Model {} loaded ({}, {:?})", name, kind, capability);
        Ok(Arc::new(LoadedModel::new(name, capability, artifact)))
    }
}
