use std::fmt;

/// Неудачная доставка одному подписчику.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    /// Позиция подписчика в последовательности на момент рассылки.
    pub position: usize,
    /// Метка подписчика.
    pub subscriber: String,
    /// Текст ошибки обработчика.
    pub reason: String,
}

/// Итог одной рассылки.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifyReport {
    /// Количество, вызвавшее рассылку.
    pub quantity: i64,
    /// Сколько вызовов `update()` завершились успешно.
    pub notified: usize,
    /// Неудачные доставки в порядке рассылки.
    pub failures: Vec<DeliveryFailure>,
}

impl NotifyReport {
    /// Пустой отчёт: рассылки не было.
    pub fn silent(quantity: i64) -> Self {
        Self {
            quantity,
            ..Default::default()
        }
    }

    /// Сколько подписчиков было вызвано всего.
    pub fn attempted(&self) -> usize {
        self.notified + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// `true`, если ни один подписчик не вызывался.
    pub fn is_silent(&self) -> bool {
        self.attempted() == 0
    }
}

impl fmt::Display for NotifyReport {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(
            f,
            "quantity={} notified={} failed={}",
            self.quantity,
            self.notified,
            self.failures.len()
        )
    }
}
