use std::path::Path;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use stockwatch_error::{ensure, StatusCode, StockwatchResult};

use crate::{
    logging::LoggingConfig,
    observer::{DeliveryPolicy, RemovePolicy, DEFAULT_ALERT_MESSAGE},
};

/// Префикс переменных окружения: `STOCKWATCH_ITEM`,
/// `STOCKWATCH_LOGGING__LEVEL` и т.д.
pub const ENV_PREFIX: &str = "STOCKWATCH";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Имя наблюдаемого товара (имя реестра).
    pub item: String,
    /// Текст уведомления для email/push подписчиков.
    pub alert_message: String,
    pub remove_policy: RemovePolicy,
    pub delivery_policy: DeliveryPolicy,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Settings {
    /// Загружает настройки: значения по умолчанию, затем TOML-файл (если
    /// указан), затем переменные окружения с префиксом `STOCKWATCH_`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("item", "iPhone")?
            .set_default("alert_message", DEFAULT_ALERT_MESSAGE)?
            .set_default("remove_policy", "lenient")?
            .set_default("delivery_policy", "isolate")?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        let cfg = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        cfg.try_deserialize()
    }

    /// Проверяет значения, которые нельзя выразить типами.
    pub fn validate(&self) -> StockwatchResult<()> {
        ensure!(
            !self.item.trim().is_empty(),
            StatusCode::InvalidConfig,
            "item name cannot be empty"
        );
        ensure!(
            !self.alert_message.trim().is_empty(),
            StatusCode::InvalidConfig,
            "alert message cannot be empty"
        );
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            item: "iPhone".to_string(),
            alert_message: DEFAULT_ALERT_MESSAGE.to_string(),
            remove_policy: RemovePolicy::default(),
            delivery_policy: DeliveryPolicy::default(),
            logging: LoggingConfig::default(),
        }
    }
}
