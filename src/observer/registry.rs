use std::{
    any::Any,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use stockwatch_error::{ErrorExt, ObserverError, ObserverResult};
use tracing::{debug, info, trace, warn};

use super::{same_subscriber, DeliveryFailure, NotifyReport, SubscriberRef};
use crate::config::Settings;

/// Что делать, если `remove` не нашёл подписчика.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovePolicy {
    /// Молча ничего не делать.
    #[default]
    Lenient,
    /// Вернуть [`ObserverError::SubscriberNotFound`].
    Strict,
}

/// Что делать, если обработчик подписчика вернул ошибку.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryPolicy {
    /// Записать ошибку в отчёт и продолжить рассылку. Паника обработчика
    /// считается такой же ошибкой.
    #[default]
    Isolate,
    /// Прервать рассылку на первой ошибке.
    FailFast,
}

/// Реестр наблюдателей за количеством товара.
///
/// Хранит количество и упорядоченный список подписчиков. При установке
/// положительного количества синхронно уведомляет всех подписчиков в
/// порядке регистрации.
///
/// Реестр однопоточный и не содержит блокировок: изменяющие методы
/// принимают `&mut self`. Если реестр разделяется между потоками,
/// синхронизация (например, `Mutex<ObservableRegistry>`) лежит на
/// вызывающей стороне.
pub struct ObservableRegistry {
    name: Arc<str>,
    subscribers: Vec<SubscriberRef>,
    quantity: i64,
    remove_policy: RemovePolicy,
    delivery_policy: DeliveryPolicy,
}

impl ObservableRegistry {
    /// Создаёт пустой реестр с политиками по умолчанию и количеством 0.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self::with_policies(name, RemovePolicy::default(), DeliveryPolicy::default())
    }

    pub fn with_policies(
        name: impl Into<Arc<str>>,
        remove_policy: RemovePolicy,
        delivery_policy: DeliveryPolicy,
    ) -> Self {
        Self {
            name: name.into(),
            subscribers: Vec::new(),
            quantity: 0,
            remove_policy,
            delivery_policy,
        }
    }

    /// Создаёт реестр по настройкам: имя товара и обе политики.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_policies(
            settings.item.as_str(),
            settings.remove_policy,
            settings.delivery_policy,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Разделяемое имя реестра, удобно для меток подписчиков.
    pub fn source(&self) -> Arc<str> {
        self.name.clone()
    }

    pub fn remove_policy(&self) -> RemovePolicy {
        self.remove_policy
    }

    pub fn delivery_policy(&self) -> DeliveryPolicy {
        self.delivery_policy
    }

    /// Добавляет подписчика в конец последовательности.
    ///
    /// Дубликаты допускаются. Уведомление не отправляется.
    pub fn add(
        &mut self,
        subscriber: SubscriberRef,
    ) {
        debug!(
            registry = %self.name,
            subscriber = %subscriber.label(),
            position = self.subscribers.len(),
            "subscriber added"
        );
        self.subscribers.push(subscriber);
    }

    /// Удаляет первое вхождение подписчика (по идентичности).
    ///
    /// Если подписчика нет: при [`RemovePolicy::Lenient`] возвращает
    /// `Ok(())`, при [`RemovePolicy::Strict`] —
    /// [`ObserverError::SubscriberNotFound`].
    pub fn remove(
        &mut self,
        subscriber: &SubscriberRef,
    ) -> ObserverResult<()> {
        match self
            .subscribers
            .iter()
            .position(|s| same_subscriber(s, subscriber))
        {
            Some(idx) => {
                self.subscribers.remove(idx);
                debug!(
                    registry = %self.name,
                    subscriber = %subscriber.label(),
                    position = idx,
                    "subscriber removed"
                );
                Ok(())
            }
            None => match self.remove_policy {
                RemovePolicy::Lenient => {
                    debug!(
                        registry = %self.name,
                        subscriber = %subscriber.label(),
                        "remove of unregistered subscriber ignored"
                    );
                    Ok(())
                }
                RemovePolicy::Strict => Err(ObserverError::SubscriberNotFound {
                    subscriber: subscriber.label(),
                }),
            },
        }
    }

    /// Устанавливает количество (перезапись, не приращение).
    ///
    /// При `quantity > 0` синхронно вызывает [`notify_all`](Self::notify_all)
    /// и возвращает его отчёт, даже если значение не изменилось. При
    /// `quantity <= 0` никто не уведомляется.
    pub fn set_quantity(
        &mut self,
        quantity: i64,
    ) -> ObserverResult<NotifyReport> {
        trace!(registry = %self.name, from = self.quantity, to = quantity, "quantity set");
        self.quantity = quantity;
        if quantity > 0 {
            self.notify_all()
        } else {
            Ok(NotifyReport::silent(quantity))
        }
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    /// Вызывает `update()` у каждого подписчика в порядке регистрации.
    ///
    /// Паника внутри `update()` перехватывается и обрабатывается как
    /// [`ObserverError::Handler`] по текущей [`DeliveryPolicy`].
    pub fn notify_all(&self) -> ObserverResult<NotifyReport> {
        info!(
            registry = %self.name,
            quantity = self.quantity,
            subscribers = self.subscribers.len(),
            "notifying subscribers"
        );

        let mut report = NotifyReport::silent(self.quantity);
        for (position, subscriber) in self.subscribers.iter().enumerate() {
            match deliver(subscriber) {
                Ok(()) => {
                    trace!(registry = %self.name, subscriber = %subscriber.label(), position, "delivered");
                    report.notified += 1;
                }
                Err(err) => match self.delivery_policy {
                    DeliveryPolicy::FailFast => {
                        warn!(
                            registry = %self.name,
                            subscriber = %subscriber.label(),
                            position,
                            code = %err.status_code(),
                            error = %err,
                            "delivery failed, aborting broadcast"
                        );
                        return Err(ObserverError::DeliveryFailed {
                            subscriber: subscriber.label(),
                            position,
                            reason: err.to_string(),
                        });
                    }
                    DeliveryPolicy::Isolate => {
                        warn!(
                            registry = %self.name,
                            subscriber = %subscriber.label(),
                            position,
                            code = %err.status_code(),
                            error = %err,
                            "delivery failed, continuing"
                        );
                        report.failures.push(DeliveryFailure {
                            position,
                            subscriber: subscriber.label(),
                            reason: err.to_string(),
                        });
                    }
                },
            }
        }

        info!(
            registry = %self.name,
            notified = report.notified,
            failed = report.failures.len(),
            "broadcast finished"
        );
        Ok(report)
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Зарегистрирован ли подписчик (по идентичности).
    pub fn contains(
        &self,
        subscriber: &SubscriberRef,
    ) -> bool {
        self.subscribers
            .iter()
            .any(|s| same_subscriber(s, subscriber))
    }

    /// Метки подписчиков в порядке регистрации.
    pub fn subscribers(&self) -> impl Iterator<Item = String> + '_ {
        self.subscribers.iter().map(|s| s.label())
    }
}

/// Один вызов `update()`; паника превращается в ошибку обработчика.
fn deliver(subscriber: &SubscriberRef) -> ObserverResult<()> {
    panic::catch_unwind(AssertUnwindSafe(|| subscriber.update()))
        .unwrap_or_else(|payload| {
            Err(ObserverError::handler(format!(
                "handler panicked: {}",
                panic_message(payload.as_ref())
            )))
        })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        *msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}

impl fmt::Debug for ObservableRegistry {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("ObservableRegistry")
            .field("name", &self.name)
            .field("quantity", &self.quantity)
            .field("subscribers", &self.subscribers().collect::<Vec<_>>())
            .field("remove_policy", &self.remove_policy)
            .field("delivery_policy", &self.delivery_policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use parking_lot::Mutex;

    use super::*;
    use crate::observer::FnSubscriber;

    /// Helper: подписчик, считающий свои вызовы.
    fn counting(label: &str) -> (SubscriberRef, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let sub = FnSubscriber::shared(label, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        (sub, calls)
    }

    /// Helper: подписчик, записывающий свою метку в общий журнал.
    fn recording(
        label: &'static str,
        journal: &Arc<Mutex<Vec<&'static str>>>,
    ) -> SubscriberRef {
        let journal = journal.clone();
        FnSubscriber::shared(label, move || {
            journal.lock().push(label);
            Ok(())
        })
    }

    /// Тест проверяет, что add не вызывает уведомлений.
    #[test]
    fn test_add_does_not_notify() {
        let mut reg = ObservableRegistry::new("iPhone");
        let (sub, calls) = counting("a");
        reg.add(sub);

        assert_eq!(reg.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(reg.quantity(), 0);
    }

    /// Тест проверяет порядок доставки — порядок регистрации.
    #[test]
    fn test_notify_in_registration_order() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let mut reg = ObservableRegistry::new("iPhone");
        reg.add(recording("first", &journal));
        reg.add(recording("second", &journal));
        reg.add(recording("third", &journal));

        let report = reg.set_quantity(3).unwrap();

        assert_eq!(*journal.lock(), vec!["first", "second", "third"]);
        assert_eq!(report.notified, 3);
        assert!(report.is_clean());
    }

    /// Тест проверяет, что нулевое и отрицательное количество не уведомляют,
    /// но значение всё равно сохраняется.
    #[test]
    fn test_non_positive_quantity_is_silent() {
        let mut reg = ObservableRegistry::new("iPhone");
        let (sub, calls) = counting("a");
        reg.add(sub);

        let report = reg.set_quantity(0).unwrap();
        assert!(report.is_silent());
        assert_eq!(reg.quantity(), 0);

        let report = reg.set_quantity(-4).unwrap();
        assert!(report.is_silent());
        assert_eq!(reg.quantity(), -4);

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    /// Тест проверяет, что повторная установка того же значения снова
    /// уведомляет (не edge-triggered).
    #[test]
    fn test_same_quantity_notifies_again() {
        let mut reg = ObservableRegistry::new("iPhone");
        let (sub, calls) = counting("a");
        reg.add(sub);

        reg.set_quantity(10).unwrap();
        reg.set_quantity(10).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    /// Тест проверяет, что remove удаляет только первое вхождение дубликата.
    #[test]
    fn test_remove_first_duplicate_only() {
        let mut reg = ObservableRegistry::new("iPhone");
        let (sub, calls) = counting("dup");
        reg.add(sub.clone());
        reg.add(sub.clone());
        assert_eq!(reg.len(), 2);

        reg.remove(&sub).unwrap();
        assert_eq!(reg.len(), 1);
        assert!(reg.contains(&sub));

        reg.set_quantity(1).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    /// Тест проверяет, что remove сохраняет порядок оставшихся подписчиков.
    #[test]
    fn test_remove_keeps_order() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let mut reg = ObservableRegistry::new("iPhone");
        let a = recording("a", &journal);
        let b = recording("b", &journal);
        let c = recording("c", &journal);
        reg.add(a);
        reg.add(b.clone());
        reg.add(c);

        reg.remove(&b).unwrap();
        reg.notify_all().unwrap();

        assert_eq!(*journal.lock(), vec!["a", "c"]);
        assert_eq!(
            reg.subscribers().collect::<Vec<_>>(),
            vec!["fn:a", "fn:c"]
        );
    }

    /// Тест проверяет lenient- и strict-поведение remove для отсутствующего
    /// подписчика.
    #[test]
    fn test_remove_absent_by_policy() {
        let (stranger, _) = counting("stranger");

        let mut lenient = ObservableRegistry::new("iPhone");
        assert_eq!(lenient.remove(&stranger), Ok(()));
        assert!(lenient.is_empty());

        let mut strict =
            ObservableRegistry::with_policies("iPhone", RemovePolicy::Strict, DeliveryPolicy::Isolate);
        assert_eq!(
            strict.remove(&stranger),
            Err(ObserverError::SubscriberNotFound {
                subscriber: "fn:stranger".to_string()
            })
        );
    }

    /// Тест проверяет изоляцию сбоев: упавший подписчик не мешает остальным.
    #[test]
    fn test_isolate_continues_after_failure() {
        let mut reg = ObservableRegistry::new("iPhone");
        let (a, a_calls) = counting("a");
        let (c, c_calls) = counting("c");
        reg.add(a);
        reg.add(FnSubscriber::shared("broken", || {
            Err(ObserverError::handler("smtp unavailable"))
        }));
        reg.add(c);

        let report = reg.set_quantity(7).unwrap();

        assert_eq!(report.notified, 2);
        assert_eq!(
            report.failures,
            vec![DeliveryFailure {
                position: 1,
                subscriber: "fn:broken".to_string(),
                reason: "handler failed: smtp unavailable".to_string(),
            }]
        );
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(c_calls.load(Ordering::SeqCst), 1);
    }

    /// Тест проверяет fail-fast: рассылка обрывается на первой ошибке,
    /// количество при этом уже сохранено.
    #[test]
    fn test_fail_fast_aborts_broadcast() {
        let mut reg = ObservableRegistry::with_policies(
            "iPhone",
            RemovePolicy::Lenient,
            DeliveryPolicy::FailFast,
        );
        let (a, a_calls) = counting("a");
        let (c, c_calls) = counting("c");
        reg.add(a);
        reg.add(FnSubscriber::shared("broken", || {
            Err(ObserverError::handler("offline"))
        }));
        reg.add(c);

        let err = reg.set_quantity(2).unwrap_err();

        assert_eq!(
            err,
            ObserverError::DeliveryFailed {
                subscriber: "fn:broken".to_string(),
                position: 1,
                reason: "handler failed: offline".to_string(),
            }
        );
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(c_calls.load(Ordering::SeqCst), 0);
        assert_eq!(reg.quantity(), 2);
    }

    #[test]
    fn test_notify_all_on_empty_registry() {
        let reg = ObservableRegistry::new("iPhone");
        let report = reg.notify_all().unwrap();
        assert!(report.is_silent());
        assert_eq!(report.quantity, 0);
    }

    /// Тест проверяет имена политик в настройках.
    #[test]
    fn test_policy_serde_names() {
        use serde::de::{value::Error as DeError, value::StrDeserializer, IntoDeserializer};

        let de: StrDeserializer<'_, DeError> = "strict".into_deserializer();
        assert_eq!(RemovePolicy::deserialize(de).unwrap(), RemovePolicy::Strict);

        let de: StrDeserializer<'_, DeError> = "fail-fast".into_deserializer();
        assert_eq!(
            DeliveryPolicy::deserialize(de).unwrap(),
            DeliveryPolicy::FailFast
        );
    }

    /// Тест проверяет, что паника обработчика при политике Isolate
    /// записывается в отчёт, а следующие подписчики получают уведомление.
    #[test]
    fn test_panicking_handler_is_isolated() {
        let mut reg = ObservableRegistry::new("iPhone");
        reg.add(FnSubscriber::shared("broken", || panic!("smtp client crashed")));
        let (sub, calls) = counting("after");
        reg.add(sub);

        let report = reg.set_quantity(1).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.notified, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].position, 0);
        assert_eq!(report.failures[0].subscriber, "fn:broken");
        assert!(report.failures[0].reason.contains("smtp client crashed"));
    }

    /// Тест проверяет, что при FailFast паника прерывает рассылку ошибкой
    /// DeliveryFailed, а не раскруткой стека.
    #[test]
    fn test_panicking_handler_fail_fast() {
        let mut reg =
            ObservableRegistry::with_policies("iPhone", RemovePolicy::Lenient, DeliveryPolicy::FailFast);
        let code = 503;
        reg.add(FnSubscriber::shared("broken", move || panic!("gateway returned {code}")));
        let (sub, calls) = counting("after");
        reg.add(sub);

        let err = reg.set_quantity(1).unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        match err {
            ObserverError::DeliveryFailed {
                subscriber,
                position,
                reason,
            } => {
                assert_eq!(subscriber, "fn:broken");
                assert_eq!(position, 0);
                assert!(reason.contains("gateway returned 503"), "got: {reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
