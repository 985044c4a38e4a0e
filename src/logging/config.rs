use std::{io, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Формат консольного вывода логов.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

/// Запись логов в файл с ежедневной ротацией.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub dir: PathBuf,
    pub prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Директива уровня, например `info` или `stockwatch=debug,warn`.
    pub level: String,
    pub format: LogFormat,
    pub with_ansi: bool,
    pub with_target: bool,
    /// Файловый вывод; `None` — только консоль.
    pub file: Option<FileConfig>,
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter directive '{directive}': {reason}")]
    InvalidDirective { directive: String, reason: String },

    #[error("cannot create log directory {}: {source}", path.display())]
    LogDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("logging already initialized: {0}")]
    AlreadyInitialized(String),
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            prefix: "stockwatch.log".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            with_ansi: true,
            with_target: true,
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Заменяет директиву уровня (флаги `-v`/`-q` CLI).
    pub fn with_level(
        mut self,
        level: impl Into<String>,
    ) -> Self {
        self.level = level.into();
        self
    }

    pub fn build_filter_directive(&self) -> String {
        self.level.trim().to_string()
    }

    /// Проверяет, что директива разбирается `EnvFilter`.
    pub fn validate(&self) -> Result<(), LoggingError> {
        let directive = self.build_filter_directive();
        EnvFilter::try_new(&directive)
            .map(|_| ())
            .map_err(|e| LoggingError::InvalidDirective {
                directive,
                reason: e.to_string(),
            })
    }

    /// Создаёт каталог для файловых логов, если он включён.
    pub fn ensure_log_dir(&self) -> Result<(), LoggingError> {
        if let Some(file) = &self.file {
            std::fs::create_dir_all(&file.dir).map_err(|source| LoggingError::LogDir {
                path: file.dir.clone(),
                source,
            })?;
        }
        Ok(())
    }
}
