use std::{any::Any, error::Error};

use crate::StatusCode;

/// Расширение для ошибок библиотеки (object-safe).
///
/// Даёт единый доступ к статус-коду и сообщению для пользователя.
pub trait ErrorExt: Error + Send + Sync + 'static {
    /// Статус ошибки. По умолчанию [`StatusCode::Internal`].
    fn status_code(&self) -> StatusCode {
        StatusCode::Internal
    }

    /// Возвращает ошибку как [`Any`](std::any::Any) для downcast.
    fn as_any(&self) -> &dyn Any;

    /// Сообщение для вывода пользователю (CLI).
    ///
    /// Для внутренних ошибок детали скрываются.
    fn user_message(&self) -> String {
        match self.status_code() {
            StatusCode::Internal => "internal error".to_string(),
            _ => self.to_string(),
        }
    }
}
