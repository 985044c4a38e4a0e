//! Реестр наблюдателей «товар снова в наличии».
//!
//! - `registry`: `ObservableRegistry`, политики удаления и доставки.
//! - `subscriber`: трейт `Subscriber`, дескриптор `SubscriberRef`,
//!   подписчик-замыкание `FnSubscriber`.
//! - `alerts`: готовые подписчики `EmailAlert` и `DeviceAlert`.
//! - `sink`: получатели строк уведомлений (`tracing`, stdout, память).
//! - `report`: итог рассылки `NotifyReport`.

pub mod alerts;
pub mod registry;
pub mod report;
pub mod sink;
pub mod subscriber;

pub use alerts::*;
pub use registry::*;
pub use report::*;
pub use sink::*;
pub use subscriber::*;
