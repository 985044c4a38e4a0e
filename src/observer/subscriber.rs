use std::{fmt, sync::Arc};

use stockwatch_error::ObserverResult;

/// Подписчик реестра: получает уведомление без полезной нагрузки.
///
/// Реестр вызывает `update()` синхронно, в порядке регистрации. Ошибка,
/// возвращённая обработчиком, обрабатывается согласно
/// [`DeliveryPolicy`](super::DeliveryPolicy) реестра. Паника в `update()`
/// перехватывается реестром и считается ошибкой обработчика.
pub trait Subscriber: Send + Sync {
    /// Обработать уведомление.
    fn update(&self) -> ObserverResult<()>;

    /// Метка подписчика для логов и отчётов, например `email:user1@example.com`.
    fn label(&self) -> String;
}

/// Разделяемый дескриптор подписчика.
///
/// Идентичность подписчика — адрес общей аллокации (`Arc::ptr_eq`), а не
/// содержимое: два `EmailAlert` с одним адресом — разные подписчики.
pub type SubscriberRef = Arc<dyn Subscriber>;

/// Сравнивает два дескриптора по идентичности.
pub fn same_subscriber(
    a: &SubscriberRef,
    b: &SubscriberRef,
) -> bool {
    Arc::ptr_eq(a, b)
}

type Handler = Box<dyn Fn() -> ObserverResult<()> + Send + Sync>;

/// Подписчик, действие которого задано замыканием.
pub struct FnSubscriber {
    label: String,
    handler: Handler,
}

impl FnSubscriber {
    pub fn new<F>(
        label: impl Into<String>,
        handler: F,
    ) -> Self
    where
        F: Fn() -> ObserverResult<()> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            handler: Box::new(handler),
        }
    }

    /// Сразу упаковывает подписчика в [`SubscriberRef`].
    pub fn shared<F>(
        label: impl Into<String>,
        handler: F,
    ) -> SubscriberRef
    where
        F: Fn() -> ObserverResult<()> + Send + Sync + 'static,
    {
        Arc::new(Self::new(label, handler))
    }
}

impl Subscriber for FnSubscriber {
    fn update(&self) -> ObserverResult<()> {
        (self.handler)()
    }

    fn label(&self) -> String {
        format!("fn:{}", self.label)
    }
}

impl fmt::Debug for FnSubscriber {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("FnSubscriber")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}
