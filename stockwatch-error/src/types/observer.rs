use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибки реестра наблюдателей и его подписчиков.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObserverError {
    /// Строгий `remove` не нашёл подписчика.
    #[error("subscriber not registered: {subscriber}")]
    SubscriberNotFound { subscriber: String },

    /// Рассылка прервана на первом упавшем подписчике (fail-fast).
    #[error("delivery to {subscriber} (position {position}) failed: {reason}")]
    DeliveryFailed {
        subscriber: String,
        position: usize,
        reason: String,
    },

    /// Подписчик отклонён при создании.
    #[error("invalid subscriber: {reason}")]
    InvalidSubscriber { reason: String },

    /// Ошибка, которую вернул сам обработчик `update()`.
    #[error("handler failed: {reason}")]
    Handler { reason: String },
}

pub type ObserverResult<T> = Result<T, ObserverError>;

impl ObserverError {
    pub fn handler(reason: impl Into<String>) -> Self {
        Self::Handler {
            reason: reason.into(),
        }
    }

    pub fn invalid_subscriber(reason: impl Into<String>) -> Self {
        Self::InvalidSubscriber {
            reason: reason.into(),
        }
    }
}

impl ErrorExt for ObserverError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::SubscriberNotFound { .. } => StatusCode::NotFound,
            Self::DeliveryFailed { .. } => StatusCode::DeliveryFailed,
            Self::InvalidSubscriber { .. } => StatusCode::InvalidArgs,
            Self::Handler { .. } => StatusCode::HandlerFailed,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
