//! Готовые подписчики «товар снова в наличии»: письмо и push на устройство.
//!
//! Оба варианта форматируют строку и отдают её в [`AlertSink`]. Реальная
//! доставка (SMTP, push-шлюз) остаётся за пределами крейта; получатель
//! строки не может вернуть ошибку, поэтому `update()` здесь всегда `Ok`.

use std::{fmt, sync::Arc};

use stockwatch_error::{ObserverError, ObserverResult};
use tracing::trace;

use super::{AlertSink, Subscriber, SubscriberRef};

/// Текст уведомления по умолчанию.
pub const DEFAULT_ALERT_MESSAGE: &str = "Product is in stock Hurry Up!";

/// Подписчик, отправляющий письмо на адрес.
pub struct EmailAlert {
    email: String,
    message: String,
    /// Имя реестра, для которого создан подписчик. Только для логов.
    source: Arc<str>,
    sink: Arc<dyn AlertSink>,
}

/// Подписчик, отправляющий push-уведомление пользователю устройства.
pub struct DeviceAlert {
    user: String,
    message: String,
    /// Имя реестра, для которого создан подписчик. Только для логов.
    source: Arc<str>,
    sink: Arc<dyn AlertSink>,
}

impl EmailAlert {
    /// Создаёт подписчика с текстом по умолчанию.
    ///
    /// Адрес не может быть пустым и должен содержать `@`.
    pub fn new(
        email: impl Into<String>,
        source: impl Into<Arc<str>>,
        sink: Arc<dyn AlertSink>,
    ) -> ObserverResult<Self> {
        let email = email.into().trim().to_string();
        if email.is_empty() {
            return Err(ObserverError::invalid_subscriber("email address is empty"));
        }
        if !email.contains('@') {
            return Err(ObserverError::invalid_subscriber(format!(
                "'{email}' is not an email address"
            )));
        }
        Ok(Self {
            email,
            message: DEFAULT_ALERT_MESSAGE.to_string(),
            source: source.into(),
            sink,
        })
    }

    /// Заменяет текст уведомления.
    pub fn with_message(
        mut self,
        message: impl Into<String>,
    ) -> Self {
        self.message = message.into();
        self
    }

    pub fn into_shared(self) -> SubscriberRef {
        Arc::new(self)
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    fn send_mail(&self) {
        let line = format!("Mail sent to: {}, {}", self.email, self.message);
        trace!(source = %self.source, to = %self.email, "sending mail alert");
        self.sink.deliver(&line);
    }
}

impl DeviceAlert {
    /// Создаёт подписчика с текстом по умолчанию. Метка пользователя не
    /// может быть пустой.
    pub fn new(
        user: impl Into<String>,
        source: impl Into<Arc<str>>,
        sink: Arc<dyn AlertSink>,
    ) -> ObserverResult<Self> {
        let user = user.into().trim().to_string();
        if user.is_empty() {
            return Err(ObserverError::invalid_subscriber("device user label is empty"));
        }
        Ok(Self {
            user,
            message: DEFAULT_ALERT_MESSAGE.to_string(),
            source: source.into(),
            sink,
        })
    }

    pub fn with_message(
        mut self,
        message: impl Into<String>,
    ) -> Self {
        self.message = message.into();
        self
    }

    pub fn into_shared(self) -> SubscriberRef {
        Arc::new(self)
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    fn send_push(&self) {
        let line = format!("Push sent to: {}, {}", self.user, self.message);
        trace!(source = %self.source, to = %self.user, "sending device alert");
        self.sink.deliver(&line);
    }
}

impl Subscriber for EmailAlert {
    fn update(&self) -> ObserverResult<()> {
        self.send_mail();
        Ok(())
    }

    fn label(&self) -> String {
        format!("email:{}", self.email)
    }
}

impl Subscriber for DeviceAlert {
    fn update(&self) -> ObserverResult<()> {
        self.send_push();
        Ok(())
    }

    fn label(&self) -> String {
        format!("device:{}", self.user)
    }
}

impl fmt::Debug for EmailAlert {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("EmailAlert")
            .field("email", &self.email)
            .field("message", &self.message)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for DeviceAlert {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("DeviceAlert")
            .field("user", &self.user)
            .field("message", &self.message)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
