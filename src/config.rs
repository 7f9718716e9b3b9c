//! Настройки сервиса из переменных окружения

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl FromStr for AppEnv {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(AppEnv::Development),
            "production" | "prod" => Ok(AppEnv::Production),
            other => bail!("unknown APP_ENV '{}', expected development or production", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    /// Каталог с артефактами `<Name>.json`
    pub model_dir: PathBuf,
    pub test_set_path: PathBuf,
    /// Необязательный файл; без него используются встроенные словари
    pub preprocessor_path: PathBuf,
    pub app_env: AppEnv,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Разбор из произвольного источника пар ключ-значение
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = lookup("HOST")
            .unwrap_or_else(|| "0.0.0.0".to_string())
            .parse::<IpAddr>()
            .context("Invalid HOST")?;

        let port = lookup("PORT")
            .unwrap_or_else(|| "5000".to_string())
            .parse::<u16>()
            .context("Invalid PORT")?;

        let model_dir = PathBuf::from(lookup("MODEL_DIR").unwrap_or_else(|| "model".to_string()));

        let test_set_path = lookup("TEST_SET_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| model_dir.join("test_set.csv"));

        let preprocessor_path = lookup("PREPROCESSOR_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| model_dir.join("preprocessor.json"));

        let app_env = lookup("APP_ENV")
            .map(|v| v.parse::<AppEnv>())
            .transpose()
            .context("Invalid APP_ENV")?
            .unwrap_or(AppEnv::Development);

        Ok(Config {
            host,
            port,
            model_dir,
            test_set_path,
            preprocessor_path,
            app_env,
        })
    }

    /// Настройки по умолчанию для каталога моделей
    pub fn for_model_dir(model_dir: impl Into<PathBuf>) -> Self {
        let model_dir = model_dir.into();
        Config {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 5000,
            test_set_path: model_dir.join("test_set.csv"),
            preprocessor_path: model_dir.join("preprocessor.json"),
            model_dir,
            app_env: AppEnv::Development,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Трассировка ошибок отдается клиенту только вне production
    pub fn expose_traceback(&self) -> bool {
        self.app_env != AppEnv::Production
    }
}
