use std::{fmt, sync::Arc};

use parking_lot::Mutex;
use tracing::info;

/// Получатель готовой строки уведомления.
///
/// Принимает строку, ничего не возвращает; ошибки доставки игнорируются
/// на стороне реализации.
pub trait AlertSink: Send + Sync {
    fn deliver(
        &self,
        line: &str,
    );
}

/// Пишет строку уведомления как событие `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl AlertSink for TracingSink {
    fn deliver(
        &self,
        line: &str,
    ) {
        info!(target: "stockwatch::alert", alert = %line, "alert dispatched");
    }
}

/// Печатает строку уведомления в stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl AlertSink for StdoutSink {
    fn deliver(
        &self,
        line: &str,
    ) {
        println!("{line}");
    }
}

/// Запоминает все доставленные строки в памяти.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Копия доставленных строк в порядке доставки.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    /// Сколько строк начинается с `prefix`.
    pub fn count_prefixed(
        &self,
        prefix: &str,
    ) -> usize {
        self.lines
            .lock()
            .iter()
            .filter(|l| l.starts_with(prefix))
            .count()
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl AlertSink for MemorySink {
    fn deliver(
        &self,
        line: &str,
    ) {
        self.lines.lock().push(line.to_string());
    }
}

/// Доставляет строку сразу в несколько получателей, по порядку.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn AlertSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn AlertSink>>) -> Self {
        Self { sinks }
    }
}

impl fmt::Debug for FanoutSink {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("FanoutSink")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl AlertSink for FanoutSink {
    fn deliver(
        &self,
        line: &str,
    ) {
        for sink in &self.sinks {
            sink.deliver(line);
        }
    }
}
